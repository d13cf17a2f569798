//! Travelling-salesman orchestrators.
//!
//! Both solvers produce a closed circuit visiting every destination once and
//! returning to the source. `nn` chains live nearest-neighbour searches;
//! `ga` refines a cost matrix with a genetic algorithm. A request with
//! undefined or unreachable cities short-circuits into an illegal outcome
//! listing the offending targets; no partial circuit is produced.

pub mod ga;
pub mod nn;

use crate::geometry::PathLine;
use crate::graph::NodeId;
use crate::solution::Solution;

/// A solved closed circuit: legs in visit order, the last leg returning to
/// the source.
#[derive(Debug, Clone)]
pub struct TspSolution {
    pub from: u32,
    pub total_cost: f64,
    pub legs: Vec<Solution>,
    /// Whole-circuit geometry merged from the legs, M running continuously.
    pub geometry: Option<PathLine>,
}

#[derive(Debug, Clone)]
pub enum TspOutcome {
    Solved(TspSolution),
    /// At least one city is undefined or unreachable.
    Illegal {
        undefined: Vec<NodeId>,
        unreachable: Vec<u32>,
    },
}

/// Merges leg geometries into one circuit polyline with a continuous M
/// measure. Any leg without geometry disables the merged output.
fn merge_leg_geometry(legs: &[Solution]) -> Option<PathLine> {
    let mut merged: Option<PathLine> = None;
    let mut offset = 0.0;
    for leg in legs {
        if leg.links.is_empty() {
            // zero-length leg (city coincides with the previous one)
            continue;
        }
        let geom = leg.geometry.as_ref()?;
        let out = merged.get_or_insert_with(|| PathLine::new(geom.srid));
        for p in &geom.points {
            out.push_point(p.x, p.y, p.m + offset);
        }
        offset += leg.total_cost;
    }
    merged
}
