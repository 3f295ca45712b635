use glam::UVec2;

use crate::{
    error::{Result, SimError},
    types::{Cell, Coord},
};

/// Up to four von Neumann neighbors of a cell, yielded in the fixed order
/// left, up, right, down. Directions that would leave the grid are omitted.
#[derive(Clone, Copy, Debug)]
pub struct Neighbors {
    items: [Coord; 4],
    len: u8,
    next: u8,
}

impl Neighbors {
    #[inline]
    fn push(&mut self, c: Coord) {
        self.items[self.len as usize] = c;
        self.len += 1;
    }
}

impl Iterator for Neighbors {
    type Item = Coord;

    #[inline]
    fn next(&mut self) -> Option<Coord> {
        if self.next < self.len {
            let c = self.items[self.next as usize];
            self.next += 1;
            Some(c)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.len - self.next) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Neighbors {}

/// Returns the in-bounds 4-neighborhood of `c` on a `size`×`size` grid.
///
/// This is the only neighborhood definition in the crate; the walk, the
/// exclusion test and hardening all go through it.
#[inline]
pub fn neighbors(c: Coord, size: u32) -> Neighbors {
    let mut n = Neighbors {
        items: [UVec2::ZERO; 4],
        len: 0,
        next: 0,
    };
    if c.x > 0 {
        n.push(UVec2::new(c.x - 1, c.y));
    }
    if c.y > 0 {
        n.push(UVec2::new(c.x, c.y - 1));
    }
    if c.x + 1 < size {
        n.push(UVec2::new(c.x + 1, c.y));
    }
    if c.y + 1 < size {
        n.push(UVec2::new(c.x, c.y + 1));
    }
    n
}

/// Double-buffered square cell grid.
///
/// Two arenas of equal size are kept; `front` selects the committed one.
/// The engines read and write the back arena (the working state) and
/// [`Grid::commit`] publishes it by toggling `front`. Cells written since the
/// last commit are tracked so the new back arena can be brought back in line
/// with the freshly committed one.
#[derive(Debug, Clone)]
pub struct Grid {
    size: u32,
    arenas: [Vec<Cell>; 2],
    front: usize,
    written: Vec<usize>,
}

impl Grid {
    /// Creates an all-empty grid of side `size`.
    pub fn new(size: u32) -> Self {
        let len = (size as usize) * (size as usize);
        Self {
            size,
            arenas: [vec![Cell::Empty; len], vec![Cell::Empty; len]],
            front: 0,
            written: Vec::with_capacity(64),
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arenas[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.size && c.y < self.size
    }

    /// Returns `c` unchanged if it lies on the grid, otherwise a bounds error.
    pub fn check(&self, c: Coord) -> Result<Coord> {
        if self.contains(c) {
            Ok(c)
        } else {
            Err(SimError::out_of_bounds(c.x, c.y, self.size))
        }
    }

    #[inline]
    fn index(&self, c: Coord) -> usize {
        debug_assert!(self.contains(c), "({}, {}) is off a {} grid", c.x, c.y, self.size);
        c.y as usize * self.size as usize + c.x as usize
    }

    #[inline]
    fn coord(&self, i: usize) -> Coord {
        let s = self.size as usize;
        UVec2::new((i % s) as u32, (i / s) as u32)
    }

    #[inline]
    pub fn neighbors(&self, c: Coord) -> Neighbors {
        neighbors(c, self.size)
    }

    /// Working state of a cell (what the engines see).
    #[inline]
    pub fn get(&self, c: Coord) -> Cell {
        self.arenas[self.front ^ 1][self.index(c)]
    }

    /// Writes the working state of a cell.
    #[inline]
    pub fn set(&mut self, c: Coord, cell: Cell) {
        let i = self.index(c);
        self.arenas[self.front ^ 1][i] = cell;
        self.written.push(i);
    }

    /// Exchanges the working states of two cells.
    pub fn swap(&mut self, a: Coord, b: Coord) {
        let (ia, ib) = (self.index(a), self.index(b));
        self.arenas[self.front ^ 1].swap(ia, ib);
        self.written.push(ia);
        self.written.push(ib);
    }

    /// Publishes the working arena as the committed one.
    ///
    /// Returns the number of cell writes that were published.
    pub fn commit(&mut self) -> usize {
        if self.written.is_empty() {
            return 0;
        }
        self.front ^= 1;

        let [a, b] = &mut self.arenas;
        let (committed, working) = if self.front == 0 { (a, b) } else { (b, a) };
        let published = self.written.len();
        for i in self.written.drain(..) {
            working[i] = committed[i];
        }
        published
    }

    /// `true` when the working arena has writes that are not committed yet.
    pub fn has_pending_writes(&self) -> bool {
        !self.written.is_empty()
    }

    /// Committed state of a cell, or `None` off the grid.
    pub fn cell(&self, c: Coord) -> Option<Cell> {
        self.contains(c).then(|| self.arenas[self.front][self.index(c)])
    }

    /// Committed cells in row-major order (`y * size + x`).
    pub fn cells(&self) -> &[Cell] {
        &self.arenas[self.front]
    }

    /// Committed cells paired with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        self.cells()
            .iter()
            .enumerate()
            .map(|(i, &cell)| (self.coord(i), cell))
    }

    /// Number of committed cells in the given state.
    pub fn count(&self, state: Cell) -> usize {
        self.cells().iter().filter(|&&c| c == state).count()
    }

    /// Every coordinate of the grid in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| UVec2::new(x, y)))
    }

    /// Owned copy of the committed cells.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            size: self.size,
            cells: self.cells().to_vec(),
        }
    }
}

/// Owned copy of a committed grid, for renderers, tests and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSnapshot {
    pub size: u32,
    pub cells: Vec<Cell>,
}

impl GridSnapshot {
    pub fn get(&self, c: Coord) -> Option<Cell> {
        (c.x < self.size && c.y < self.size)
            .then(|| self.cells[c.y as usize * self.size as usize + c.x as usize])
    }
}
