//! SQL-facing virtual table surface: plan selection, session state, and the
//! cursor that materializes one resultset per filter call.
//!
//! The relation exposes sixteen fixed columns. A query binds either
//! From/To (routing), From/Cost (isochrone) or FromPoint/ToPoint
//! (point-to-point); everything else about a request lives in session state
//! set through UPDATE. Filtering resolves the bound values, runs exactly one
//! orchestrator and materializes the rows eagerly; the cursor then only
//! walks them. A request that cannot be dispatched yields a single row
//! echoing the session, except for point-to-point failures which yield zero
//! rows and a distinguishable error.

use geo::Point;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;

use crate::error::{NetworkFormatError, StoreError};
use crate::geometry::PathLine;
use crate::graph::Graph;
use crate::index::{RoutingIndex, SearchScratch};
use crate::multidest::{self, DestinationSet};
use crate::point2point::{self, P2pError, P2pSolution};
use crate::range;
use crate::solution::{RouteOutcome, RowOptions, Solution};
use crate::store::NetworkStore;
use crate::tsp::{self, TspOutcome};

pub const COLUMN_COUNT: usize = 16;

/// The fixed column roster, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Column {
    Algorithm = 0,
    Request = 1,
    Options = 2,
    Delimiter = 3,
    RouteId = 4,
    RouteRow = 5,
    Role = 6,
    LinkRowid = 7,
    NodeFrom = 8,
    NodeTo = 9,
    PointFrom = 10,
    PointTo = 11,
    Tolerance = 12,
    Cost = 13,
    Geometry = 14,
    Name = 15,
}

/// A materialized cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Point { x: f64, y: f64, srid: Option<i32> },
    Line(PathLine),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Le,
    Other,
}

/// One plan-time constraint against a column.
#[derive(Debug, Clone, Copy)]
pub struct Constraint {
    pub column: usize,
    pub op: ConstraintOp,
    pub usable: bool,
}

/// Selects the execution plan from the bound constraints.
///
/// Returns the plan number consumed by [`RoutingTable::filter`]: 1/2 for
/// From+To (odd when From is bound first), 3/4 for From+Cost, 5/6 for
/// FromPoint+ToPoint, and 0 when the constraint set is unsupported.
pub fn plan(constraints: &[Constraint]) -> i32 {
    let mut from = None;
    let mut to = None;
    let mut cost = None;
    let mut from_point = None;
    let mut to_point = None;
    let mut errors = false;
    for (i, c) in constraints.iter().enumerate() {
        // unusable constraints are simply invisible to the planner
        if !c.usable {
            continue;
        }
        match (c.column, c.op) {
            (8, ConstraintOp::Eq) => from = Some(i),
            (9, ConstraintOp::Eq) => to = Some(i),
            (10, ConstraintOp::Eq) => from_point = Some(i),
            (11, ConstraintOp::Eq) => to_point = Some(i),
            (13, ConstraintOp::Le) => cost = Some(i),
            _ => errors = true,
        }
    }
    if errors {
        return 0;
    }
    match (from, to, cost, from_point, to_point) {
        (Some(f), Some(t), None, None, None) => {
            if f < t {
                1
            } else {
                2
            }
        }
        (Some(f), None, Some(c), None, None) => {
            if f < c {
                3
            } else {
                4
            }
        }
        (None, None, None, Some(f), Some(t)) => {
            if f < t {
                5
            } else {
                6
            }
        }
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
}

impl Algorithm {
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::AStar => "A*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Request {
    #[default]
    ShortestPath,
    TspNn,
    TspGa,
}

impl Request {
    pub fn label(self) -> &'static str {
        match self {
            Request::ShortestPath => "Shortest Path",
            Request::TspNn => "TSP NN",
            Request::TspGa => "TSP GA",
        }
    }
}

/// Per-table session state, mutated through UPDATE only.
#[derive(Debug, Clone)]
pub struct Session {
    pub algorithm: Algorithm,
    pub request: Request,
    pub options: RowOptions,
    pub delimiter: char,
    pub tolerance: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Dijkstra,
            request: Request::ShortestPath,
            options: RowOptions::Full,
            delimiter: ',',
            tolerance: 20.0,
        }
    }
}

impl Session {
    fn delimiter_echo(&self) -> String {
        let c = self.delimiter;
        let dec = c as u32;
        if c.is_ascii() && !c.is_ascii_control() {
            format!("{c} [dec={dec}, hex={dec:02x}]")
        } else {
            format!("[dec={dec}, hex={dec:02x}]")
        }
    }
}

/// Values bound by one UPDATE statement; `None` leaves the field untouched
/// (except algorithm and delimiter, which every UPDATE resets first).
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate<'a> {
    pub algorithm: Option<&'a str>,
    pub request: Option<&'a str>,
    pub options: Option<&'a str>,
    pub delimiter: Option<&'a str>,
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum TableWrite<'a> {
    Insert,
    Delete,
    Update(SessionUpdate<'a>),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("table is read-only: only UPDATE is supported")]
    ReadOnly,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Format(#[from] NetworkFormatError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The routing virtual table: network graph, backing store and session.
pub struct RoutingTable<S: NetworkStore> {
    graph: Graph,
    index: RoutingIndex,
    store: S,
    session: Session,
    scratch: SearchScratch,
    rng: StdRng,
}

impl<S: NetworkStore> RoutingTable<S> {
    pub fn new<B: AsRef<[u8]>>(blobs: &[B], store: S) -> Result<Self, TableError> {
        let mut graph = Graph::from_blobs(blobs)?;
        graph.set_geometry_metadata(store.geometry_metadata()?);
        let index = RoutingIndex::build(&graph);
        let scratch = SearchScratch::new(&index);
        tracing::debug!(
            nodes = graph.len(),
            links = graph.link_count(),
            "routing table ready"
        );
        Ok(Self {
            graph,
            index,
            store,
            session: Session::default(),
            scratch,
            rng: StdRng::from_os_rng(),
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Applies a write operation. Only UPDATE is accepted; it rewrites the
    /// session, resetting the algorithm and delimiter before applying the
    /// bound values. Unrecognized values are ignored.
    pub fn write(&mut self, op: TableWrite) -> Result<(), WriteError> {
        let update = match op {
            TableWrite::Insert | TableWrite::Delete => return Err(WriteError::ReadOnly),
            TableWrite::Update(update) => update,
        };
        self.session.algorithm = Algorithm::Dijkstra;
        self.session.delimiter = ',';
        if let Some(text) = update.algorithm {
            if text.eq_ignore_ascii_case("A*") {
                self.session.algorithm = if self.graph.supports_astar() {
                    Algorithm::AStar
                } else {
                    Algorithm::Dijkstra
                };
            }
        }
        if let Some(text) = update.request {
            let text = text.to_ascii_uppercase();
            match text.as_str() {
                "TSP" | "TSP NN" => self.session.request = Request::TspNn,
                "TSP GA" => self.session.request = Request::TspGa,
                "SHORTEST PATH" => self.session.request = Request::ShortestPath,
                _ => {}
            }
        }
        if let Some(text) = update.options {
            let text = text.to_ascii_uppercase();
            match text.as_str() {
                "NO LINKS" => self.session.options = RowOptions::NoLinks,
                "NO GEOMETRIES" => self.session.options = RowOptions::NoGeometry,
                "SIMPLE" => self.session.options = RowOptions::Simple,
                "FULL" => self.session.options = RowOptions::Full,
                _ => {}
            }
        }
        if let Some(text) = update.delimiter {
            if let Some(c) = text.chars().next() {
                self.session.delimiter = c;
            }
        }
        if let Some(tolerance) = update.tolerance {
            self.session.tolerance = tolerance;
        }
        Ok(())
    }

    /// Runs one query: resolves the two bound values per the plan, invokes
    /// the matching orchestrator and returns a cursor over the materialized
    /// rows.
    pub fn filter(&mut self, plan: i32, mut args: [Value; 2]) -> Cursor {
        // even plans carry the constraints in swapped order
        let plan = match plan {
            2 | 4 | 6 => {
                args.swap(0, 1);
                plan - 1
            }
            other => other,
        };

        match plan {
            1 => self.filter_routing(&args[0], &args[1]),
            3 => self.filter_range(&args[0], &args[1]),
            5 => self.filter_point2point(&args[0], &args[1]),
            _ => Cursor::single(self.echo_row(1)),
        }
    }

    fn resolve_from(&self, value: &Value) -> Option<u32> {
        match value {
            Value::Text(code) => self.graph.find_by_code(code),
            Value::Integer(id) => self.graph.find_by_id(*id),
            _ => None,
        }
    }

    fn parse_destinations(&self, value: &Value) -> DestinationSet {
        match value {
            Value::Text(list) => multidest::parse_list(&self.graph, self.session.delimiter, list),
            Value::Integer(id) => multidest::from_id(&self.graph, *id),
            _ => DestinationSet::default(),
        }
    }

    fn filter_routing(&mut self, from: &Value, to: &Value) -> Cursor {
        let from = self.resolve_from(from);
        let dests = self.parse_destinations(to);
        let (from, items) = match (from, dests.is_empty()) {
            (Some(from), false) => (from, dests.len()),
            _ => return Cursor::single(self.echo_row(dests.len().max(1))),
        };

        match self.session.request {
            Request::ShortestPath => {
                let multi = multidest::solve(
                    &self.graph,
                    &self.index,
                    &self.store,
                    &mut self.scratch,
                    from,
                    &dests,
                    self.session.options,
                    self.session.algorithm == Algorithm::AStar,
                );
                Cursor::new(self.routing_rows(&multi.routes, items))
            }
            Request::TspNn | Request::TspGa => {
                // the single-target heuristic cannot drive a circuit
                if self.session.algorithm != Algorithm::Dijkstra {
                    return Cursor::single(self.echo_row(items));
                }
                let outcome = match self.session.request {
                    Request::TspNn => tsp::nn::solve(
                        &self.graph,
                        &self.index,
                        &self.store,
                        &mut self.scratch,
                        from,
                        &dests,
                        self.session.options,
                    ),
                    _ => tsp::ga::solve(
                        &self.graph,
                        &self.index,
                        &self.store,
                        &mut self.scratch,
                        &mut self.rng,
                        from,
                        &dests,
                        self.session.options,
                    ),
                };
                Cursor::new(self.tsp_rows(from, &outcome, items))
            }
        }
    }

    fn filter_range(&mut self, from: &Value, cost: &Value) -> Cursor {
        let max_cost = match cost {
            Value::Integer(v) => *v as f64,
            Value::Real(v) => *v,
            _ => 0.0,
        };
        let from = match self.resolve_from(from) {
            Some(from) if max_cost > 0.0 => from,
            _ => return Cursor::single(self.echo_row(1)),
        };
        let solution = range::solve(&self.index, &mut self.scratch, from, max_cost);
        Cursor::new(self.range_rows(&solution))
    }

    fn filter_point2point(&mut self, from: &Value, to: &Value) -> Cursor {
        let srid = self.graph.meta().srid;
        let point_of = |value: &Value| match value {
            Value::Point { x, y, srid: s } => {
                if self.graph.meta().geometry_column.is_some() && *s == srid {
                    Some(Point::new(*x, *y))
                } else {
                    None
                }
            }
            _ => None,
        };
        let (from_point, to_point) = match (point_of(from), point_of(to)) {
            (Some(f), Some(t)) => (f, t),
            _ => return Cursor::single(self.echo_row(1)),
        };
        match point2point::solve(
            &self.graph,
            &self.index,
            &self.store,
            &mut self.scratch,
            from_point,
            to_point,
            self.session.tolerance,
            self.session.options,
        ) {
            Ok(p2p) => Cursor::new(self.p2p_rows(&p2p)),
            Err(err) => {
                tracing::debug!(%err, "point-to-point resolution failed");
                Cursor::failed(err)
            }
        }
    }

    // --- row materialization ---------------------------------------------

    fn node_value(&self, node: u32) -> Value {
        match &self.graph.node(node).id {
            crate::graph::NodeId::Code(code) => Value::Text(code.clone()),
            crate::graph::NodeId::Id(id) => Value::Integer(*id),
        }
    }

    fn spec_value(&self, spec: &crate::graph::NodeId) -> Value {
        match spec {
            crate::graph::NodeId::Code(code) => Value::Text(code.clone()),
            crate::graph::NodeId::Id(id) => Value::Integer(*id),
        }
    }

    /// Echo columns shared by every resultset's first row. With more than
    /// one destination the algorithm always reads Dijkstra.
    fn echo_cells(&self, row: &mut [Value], items: usize) {
        let algorithm = if items > 1 {
            Algorithm::Dijkstra
        } else {
            self.session.algorithm
        };
        row[Column::Algorithm as usize] = Value::Text(algorithm.label().to_string());
        row[Column::Request as usize] = Value::Text(self.session.request.label().to_string());
        row[Column::Options as usize] = Value::Text(self.session.options.label().to_string());
        row[Column::Delimiter as usize] = Value::Text(self.session.delimiter_echo());
    }

    /// The single row produced by an undispatchable request.
    fn echo_row(&self, items: usize) -> Vec<Value> {
        let mut row = vec![Value::Null; COLUMN_COUNT];
        self.echo_cells(&mut row, items);
        row
    }

    fn link_rows(&self, rows: &mut Vec<Vec<Value>>, solution: &Solution, route_num: i64) {
        if self.session.options == RowOptions::NoLinks {
            return;
        }
        for (i, link) in solution.links.iter().enumerate() {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::RouteId as usize] = Value::Integer(route_num);
            row[Column::RouteRow as usize] = Value::Integer(i as i64 + 1);
            row[Column::Role as usize] = Value::Text("Link".to_string());
            row[Column::LinkRowid as usize] = Value::Integer(link.rowid);
            row[Column::NodeFrom as usize] = self.node_value(link.from);
            row[Column::NodeTo as usize] = self.node_value(link.to);
            row[Column::Cost as usize] = Value::Real(link.cost);
            if let Some(name) = &link.name {
                row[Column::Name as usize] = Value::Text(name.clone());
            }
            rows.push(row);
        }
    }

    fn routing_rows(&self, routes: &[RouteOutcome], items: usize) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        for (route_num, outcome) in routes.iter().enumerate() {
            let route_num = route_num as i64;
            match outcome {
                RouteOutcome::Route(solution) => {
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::RouteId as usize] = Value::Integer(route_num);
                    row[Column::RouteRow as usize] = Value::Integer(0);
                    row[Column::Role as usize] = Value::Text("Route".to_string());
                    row[Column::NodeFrom as usize] = self.node_value(solution.from);
                    row[Column::NodeTo as usize] = self.node_value(solution.to);
                    row[Column::Cost as usize] = Value::Real(solution.total_cost);
                    if let Some(geom) = &solution.geometry {
                        row[Column::Geometry as usize] = Value::Line(geom.clone());
                    }
                    rows.push(row);
                    self.link_rows(&mut rows, solution, route_num);
                }
                RouteOutcome::Undefined(spec) => {
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::Role as usize] = Value::Text("Undefined NodeTo".to_string());
                    row[Column::NodeFrom as usize] = self.spec_value(spec);
                    row[Column::NodeTo as usize] = self.spec_value(spec);
                    rows.push(row);
                }
                RouteOutcome::Unreachable { from, to } => {
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::Role as usize] = Value::Text("Unreachable NodeTo".to_string());
                    row[Column::NodeFrom as usize] = self.node_value(*from);
                    row[Column::NodeTo as usize] = self.node_value(*to);
                    rows.push(row);
                }
            }
        }
        if let Some(first) = rows.first_mut() {
            self.echo_cells(first, items);
        } else {
            rows.push(self.echo_row(items));
        }
        rows
    }

    fn tsp_rows(&self, from: u32, outcome: &TspOutcome, items: usize) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        match outcome {
            TspOutcome::Solved(tsp) => {
                let mut header = vec![Value::Null; COLUMN_COUNT];
                header[Column::RouteId as usize] = Value::Integer(0);
                header[Column::RouteRow as usize] = Value::Integer(0);
                header[Column::Role as usize] = Value::Text("TSP Solution".to_string());
                header[Column::NodeFrom as usize] = self.node_value(from);
                header[Column::NodeTo as usize] = self.node_value(from);
                header[Column::Cost as usize] = Value::Real(tsp.total_cost);
                if let Some(geom) = &tsp.geometry {
                    header[Column::Geometry as usize] = Value::Line(geom.clone());
                }
                rows.push(header);
                for (i, leg) in tsp.legs.iter().enumerate() {
                    let route_num = i as i64 + 1;
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::RouteId as usize] = Value::Integer(route_num);
                    row[Column::RouteRow as usize] = Value::Integer(0);
                    if leg.from == leg.to {
                        // degenerate leg, reported like an unreached node
                        row[Column::Role as usize] =
                            Value::Text("Unreachable NodeTo".to_string());
                    } else {
                        row[Column::Role as usize] = Value::Text("Route".to_string());
                        row[Column::Cost as usize] = Value::Real(leg.total_cost);
                    }
                    row[Column::NodeFrom as usize] = self.node_value(leg.from);
                    row[Column::NodeTo as usize] = self.node_value(leg.to);
                    if let Some(geom) = &leg.geometry {
                        row[Column::Geometry as usize] = Value::Line(geom.clone());
                    }
                    rows.push(row);
                    self.link_rows(&mut rows, leg, route_num);
                }
            }
            TspOutcome::Illegal {
                undefined,
                unreachable,
            } => {
                let mut header = vec![Value::Null; COLUMN_COUNT];
                header[Column::RouteId as usize] = Value::Integer(0);
                header[Column::RouteRow as usize] = Value::Integer(0);
                header[Column::Role as usize] = Value::Text("TSP Solution".to_string());
                header[Column::NodeFrom as usize] = self.node_value(from);
                header[Column::NodeTo as usize] = self.node_value(from);
                header[Column::Cost as usize] = Value::Real(0.0);
                rows.push(header);
                for spec in undefined {
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::Role as usize] = Value::Text("Undefined NodeTo".to_string());
                    row[Column::NodeFrom as usize] = self.spec_value(spec);
                    row[Column::NodeTo as usize] = self.spec_value(spec);
                    rows.push(row);
                }
                for (i, &node) in unreachable.iter().enumerate() {
                    let mut row = vec![Value::Null; COLUMN_COUNT];
                    row[Column::RouteId as usize] = Value::Integer(i as i64 + 1);
                    row[Column::RouteRow as usize] = Value::Integer(0);
                    row[Column::Role as usize] = Value::Text("Unreachable NodeTo".to_string());
                    row[Column::NodeFrom as usize] = self.node_value(node);
                    row[Column::NodeTo as usize] = self.node_value(node);
                    rows.push(row);
                }
            }
        }
        if let Some(first) = rows.first_mut() {
            self.echo_cells(first, items);
        }
        rows
    }

    fn range_rows(&self, solution: &range::RangeSolution) -> Vec<Vec<Value>> {
        let srid = self.graph.meta().srid;
        let mut rows = Vec::new();
        for node in &solution.nodes {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Solution".to_string());
            row[Column::NodeFrom as usize] = self.node_value(solution.from);
            row[Column::NodeTo as usize] = self.node_value(node.node);
            row[Column::Cost as usize] = Value::Real(node.cost);
            if let (Some(srid), Some(coord)) = (srid, self.index.coord(node.node)) {
                row[Column::Geometry as usize] = Value::Point {
                    x: coord[0],
                    y: coord[1],
                    srid: Some(srid),
                };
            }
            rows.push(row);
        }
        if let Some(first) = rows.first_mut() {
            // the isochrone echo is fixed, whatever the session says
            first[Column::Algorithm as usize] = Value::Text("Dijkstra".to_string());
            first[Column::Request as usize] = Value::Text("Isochrone".to_string());
            first[Column::Options as usize] = Value::Text("Full".to_string());
            first[Column::Delimiter as usize] = Value::Text(self.session.delimiter_echo());
        }
        rows
    }

    fn p2p_rows(&self, p2p: &P2pSolution) -> Vec<Vec<Value>> {
        let srid = self.graph.meta().srid;
        let mut rows = Vec::new();
        let mut route_row = 0i64;
        let mut push = |mut row: Vec<Value>, rows: &mut Vec<Vec<Value>>| {
            row[Column::RouteId as usize] = Value::Integer(0);
            row[Column::RouteRow as usize] = Value::Integer(route_row);
            route_row += 1;
            rows.push(row);
        };

        let mut summary = vec![Value::Null; COLUMN_COUNT];
        summary[Column::Algorithm as usize] = Value::Text("Dijkstra".to_string());
        summary[Column::Request as usize] = Value::Text("Point2Point Path".to_string());
        summary[Column::Options as usize] =
            Value::Text(self.session.options.label().to_string());
        summary[Column::Delimiter as usize] = Value::Text(self.session.delimiter_echo());
        summary[Column::Role as usize] = Value::Text("Point2Point Solution".to_string());
        summary[Column::PointFrom as usize] = Value::Point {
            x: p2p.from_point.x(),
            y: p2p.from_point.y(),
            srid,
        };
        summary[Column::PointTo as usize] = Value::Point {
            x: p2p.to_point.x(),
            y: p2p.to_point.y(),
            srid,
        };
        summary[Column::Tolerance as usize] = Value::Real(p2p.tolerance);
        summary[Column::Cost as usize] = Value::Real(p2p.total_cost);
        if let Some(geom) = &p2p.geometry {
            summary[Column::Geometry as usize] = Value::Line(geom.clone());
        }
        push(summary, &mut rows);

        // summary-only modes stop here
        if matches!(
            self.session.options,
            RowOptions::NoLinks | RowOptions::Simple
        ) {
            return rows;
        }

        if p2p.from_extra > 0.0 {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Ingress Path".to_string());
            row[Column::Cost as usize] = Value::Real(p2p.from_extra);
            push(row, &mut rows);
        }
        if let Some(start) = &p2p.start {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Partial Link (Start)".to_string());
            row[Column::LinkRowid as usize] = Value::Integer(start.rowid);
            row[Column::NodeTo as usize] = self.node_value(start.node);
            row[Column::Cost as usize] = Value::Real(start.length);
            if let Some(name) = &start.name {
                row[Column::Name as usize] = Value::Text(name.clone());
            }
            push(row, &mut rows);
        }
        for link in &p2p.route.links {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Link".to_string());
            row[Column::LinkRowid as usize] = Value::Integer(link.rowid);
            row[Column::NodeFrom as usize] = self.node_value(link.from);
            row[Column::NodeTo as usize] = self.node_value(link.to);
            row[Column::Cost as usize] = Value::Real(link.cost);
            if let Some(name) = &link.name {
                row[Column::Name as usize] = Value::Text(name.clone());
            }
            push(row, &mut rows);
        }
        if let Some(end) = &p2p.end {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Partial Link (End)".to_string());
            row[Column::LinkRowid as usize] = Value::Integer(end.rowid);
            row[Column::NodeFrom as usize] = self.node_value(end.node);
            row[Column::Cost as usize] = Value::Real(end.length);
            if let Some(name) = &end.name {
                row[Column::Name as usize] = Value::Text(name.clone());
            }
            push(row, &mut rows);
        }
        if p2p.to_extra > 0.0 {
            let mut row = vec![Value::Null; COLUMN_COUNT];
            row[Column::Role as usize] = Value::Text("Egress Path".to_string());
            row[Column::Cost as usize] = Value::Real(p2p.to_extra);
            push(row, &mut rows);
        }
        rows
    }
}

/// Cursor over an eagerly materialized resultset.
#[derive(Debug)]
pub struct Cursor {
    rows: Vec<Vec<Value>>,
    pos: usize,
    error: Option<P2pError>,
}

impl Cursor {
    fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows,
            pos: 0,
            error: None,
        }
    }

    fn single(row: Vec<Value>) -> Self {
        Self::new(vec![row])
    }

    /// Zero rows, but distinguishable from a valid empty resultset.
    fn failed(error: P2pError) -> Self {
        Self {
            rows: Vec::new(),
            pos: 0,
            error: Some(error),
        }
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.rows.len()
    }

    pub fn next(&mut self) {
        if !self.eof() {
            self.pos += 1;
        }
    }

    pub fn rowid(&self) -> i64 {
        self.pos as i64
    }

    pub fn column(&self, column: Column) -> &Value {
        self.rows
            .get(self.pos)
            .map(|row| &row[column as usize])
            .unwrap_or(&Value::Null)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn error(&self) -> Option<&P2pError> {
        self.error.as_ref()
    }
}
