use crate::{grid::Neighbors, types::Coord};

/// Coordinates waiting for hardening, plus the render-dirty log.
///
/// The pending stack may hold the same coordinate many times; hardening
/// evaluates each entry independently, so duplicates only cost time.
///
/// Every coordinate that enters the stack is also recorded in the dirty log.
/// The log keeps one mark per grid cell and records a coordinate only the
/// first time it is marked after a drain, so it never exceeds `size * size`
/// entries even when nobody drains it.
#[derive(Debug, Clone)]
pub struct Worklist {
    pending: Vec<Coord>,
    dirty: Vec<Coord>,
    marked: Vec<bool>,
    size: u32,
}

impl Worklist {
    /// Creates an empty worklist for a `size`×`size` grid.
    pub fn new(size: u32) -> Self {
        Self {
            pending: Vec::with_capacity(256),
            dirty: Vec::new(),
            marked: vec![false; size as usize * size as usize],
            size,
        }
    }

    /// Queues one coordinate for reevaluation.
    #[inline]
    pub fn push(&mut self, c: Coord) {
        self.pending.push(c);
        self.mark_dirty(c);
    }

    /// Queues a coordinate together with its neighbors.
    pub fn push_with_neighbors(&mut self, c: Coord, neighbors: Neighbors) {
        self.push(c);
        for n in neighbors {
            self.push(n);
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Coord> {
        self.pending.pop()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Records `c` for the renderer without queuing it for hardening.
    pub fn mark_dirty(&mut self, c: Coord) {
        let i = c.y as usize * self.size as usize + c.x as usize;
        if !self.marked[i] {
            self.marked[i] = true;
            self.dirty.push(c);
        }
    }

    /// Number of coordinates waiting in the dirty log.
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Hands the dirty log to the caller and clears the marks.
    pub fn drain_dirty(&mut self) -> Vec<Coord> {
        let size = self.size as usize;
        for c in &self.dirty {
            self.marked[c.y as usize * size + c.x as usize] = false;
        }
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::neighbors;
    use glam::UVec2;

    #[test]
    fn pending_keeps_duplicates_but_dirty_does_not() {
        let mut wl = Worklist::new(4);
        let c = UVec2::new(1, 1);
        wl.push(c);
        wl.push(c);

        assert_eq!(wl.len(), 2);
        assert_eq!(wl.dirty_len(), 1);
    }

    #[test]
    fn push_with_neighbors_queues_the_neighborhood() {
        let mut wl = Worklist::new(4);
        let c = UVec2::new(0, 0);
        wl.push_with_neighbors(c, neighbors(c, 4));

        let mut popped = Vec::new();
        while let Some(p) = wl.pop() {
            popped.push(p);
        }
        assert_eq!(popped.len(), 3);
        assert!(popped.contains(&UVec2::new(1, 0)));
        assert!(popped.contains(&UVec2::new(0, 1)));
        assert!(wl.is_empty());
    }

    #[test]
    fn drain_dirty_resets_marks() {
        let mut wl = Worklist::new(4);
        let c = UVec2::new(3, 2);
        wl.push(c);

        assert_eq!(wl.drain_dirty(), vec![c]);
        assert_eq!(wl.dirty_len(), 0);

        // Marked again after the drain.
        wl.mark_dirty(c);
        assert_eq!(wl.drain_dirty(), vec![c]);
    }

    #[test]
    fn popping_does_not_touch_dirty_log() {
        let mut wl = Worklist::new(2);
        wl.push(UVec2::new(1, 1));
        wl.pop();
        assert_eq!(wl.dirty_len(), 1);
    }
}
