//! Array binary min-heap keyed on f64 cost.
//!
//! The standard `BinaryHeap` is unusable here: keys are f64 (not `Ord`) and
//! the search discipline pushes one entry per relaxed link, so the heap is
//! pre-sized to the network's link count and never reallocates mid-search.
//! Costs are finite by construction, so plain `<` comparison is sound.

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    key: f64,
    node: u32,
}

pub struct RoutingHeap {
    entries: Vec<HeapEntry>,
}

impl RoutingHeap {
    /// `capacity` should be the total link count plus one for the origin.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, key: f64, node: u32) {
        self.entries.push(HeapEntry { key, node });
        self.sift_up(self.entries.len() - 1);
    }

    pub fn pop(&mut self) -> Option<(f64, u32)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop()?;
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some((top.key, top.node))
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i].key < self.entries[parent].key {
                self.entries.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;
            if left < len && self.entries[left].key < self.entries[smallest].key {
                smallest = left;
            }
            if right < len && self.entries[right].key < self.entries[smallest].key {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.entries.swap(i, smallest);
            i = smallest;
        }
    }
}
