//! Cell-level rules of the membrane automaton.
//!
//! A stimulation runs in two stages:
//! 1. [`bubble_walk`]: a hole of empty space is pulled out of a membrane
//!    cell and wanders through solid cells, leaving a trail of
//!    [`Cell::Bubble`] markers, until it reaches an open area, gets stuck, or
//!    runs out of moves. Every cell it touches is queued on the
//!    [`Worklist`].
//! 2. [`hardening_phase`]: the queued cells are settled to a fixed point:
//!    fully enclosed solid cells become [`Cell::Wall`], the rest become
//!    [`Cell::Membrane`]. The working grid is then committed.

use glam::UVec2;
use rand::Rng;

use crate::{
    grid::Grid,
    types::{Cell, Coord},
    worklist::Worklist,
};

/// Why a walk stopped moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStop {
    /// The hole reached a cell with enough empty neighbors.
    Excluded,
    /// No membrane or wall neighbor was left to move into.
    Stuck,
    /// The move counter went past the configured limit.
    MoveLimit,
}

/// Result of a walk that actually started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkOutcome {
    pub moves: u32,
    pub stop: WalkStop,
    pub hardening: HardenReport,
}

/// Bookkeeping from one hardening pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HardenReport {
    /// Worklist entries evaluated, duplicates included.
    pub evaluated: usize,
    /// Evaluations that changed a cell.
    pub changed: usize,
    /// Cell writes published by the buffer swap.
    pub committed: usize,
}

/// Number of in-bounds neighbors of `pos` that are empty in the working grid.
pub fn empty_neighbor_count(grid: &Grid, pos: Coord) -> usize {
    grid.neighbors(pos)
        .filter(|&n| grid.get(n) == Cell::Empty)
        .count()
}

/// Returns `true` when `pos` has at least `threshold` empty neighbors.
///
/// Only neighbors that exist are counted: a cell on the grid edge has fewer
/// candidates, and the missing ones count as neither empty nor solid.
pub fn is_excluded(grid: &Grid, pos: Coord, threshold: f32) -> bool {
    empty_neighbor_count(grid, pos) as f32 >= threshold
}

/// Picks one coordinate uniformly from at most four candidates.
fn pick<R: Rng>(candidates: impl Iterator<Item = Coord>, rng: &mut R) -> Option<Coord> {
    let mut buf = [UVec2::ZERO; 4];
    let mut n = 0;
    for c in candidates.take(4) {
        buf[n] = c;
        n += 1;
    }
    (n > 0).then(|| buf[rng.random_range(0..n)])
}

/// State a cell settles to given its current working neighborhood.
fn settled_state(grid: &Grid, c: Coord, state: Cell) -> Cell {
    if state == Cell::Empty {
        Cell::Empty
    } else if grid.neighbors(c).all(|n| grid.get(n).is_solid()) {
        Cell::Wall
    } else {
        Cell::Membrane
    }
}

/// Drains the worklist, settling every queued cell, then commits the grid.
///
/// For each popped coordinate:
///
/// 1. An empty cell stays empty.
/// 2. A non-empty cell whose in-bounds neighbors are all non-empty becomes
///    [`Cell::Wall`].
/// 3. Any other non-empty cell becomes [`Cell::Membrane`]. This resolves
///    bubble trail markers and reopens walls that gained an empty neighbor.
///
/// Every popped coordinate is recorded in the dirty log again, since the
/// committed value it will show only exists after this pass. When a cell
/// changes, its neighbors are pushed back onto the worklist.
/// Settling never changes whether a cell is empty, so each cell's result is
/// fixed for the whole pass and the loop terminates.
///
/// ### Parameters
/// - `grid` - Grid whose working arena is settled and then committed.
/// - `work` - Pending coordinates; empty when this returns.
///
/// ### Returns
/// Counters describing the pass.
pub fn hardening_phase(grid: &mut Grid, work: &mut Worklist) -> HardenReport {
    let mut report = HardenReport::default();

    while let Some(c) = work.pop() {
        // Re-mark: the log may have been drained since `c` was queued.
        work.mark_dirty(c);
        report.evaluated += 1;
        let state = grid.get(c);
        let next = settled_state(grid, c, state);
        if next != state {
            grid.set(c, next);
            report.changed += 1;
            for n in grid.neighbors(c) {
                work.push(n);
            }
        }
    }

    report.committed = grid.commit();
    report
}

/// Runs one bubble walk starting at `origin`.
///
/// The walk only starts when `origin` holds [`Cell::Membrane`] and has at
/// least one empty neighbor. It then:
///
/// 1. Swaps `origin` with a uniformly chosen empty neighbor, so the
///    membrane steps outwards and `origin` becomes the hole.
/// 2. Repeatedly queues the hole and its neighbors, stops if the hole is
///    excluded (see [`is_excluded`]) or the move counter exceeds
///    `max_moves`, and otherwise swaps the hole with a uniformly chosen
///    membrane or wall neighbor. The cell the hole leaves is marked
///    [`Cell::Bubble`] so the hole cannot step back into it.
/// 3. Settles and commits everything it touched via [`hardening_phase`].
///
/// ### Parameters
/// - `grid` - Grid to mutate.
/// - `work` - Worklist collecting touched cells.
/// - `origin` - Starting cell; must be on the grid.
/// - `exclusion_threshold` - Empty-neighbor count that ends the walk.
/// - `max_moves` - Move limit for this walk.
/// - `rng` - Source for every neighbor choice.
///
/// ### Returns
/// `None` if the walk could not start (the grid is untouched), otherwise a
/// [`WalkOutcome`]. After a returned outcome no [`Cell::Bubble`] remains.
pub fn bubble_walk<R: Rng>(
    grid: &mut Grid,
    work: &mut Worklist,
    origin: Coord,
    exclusion_threshold: f32,
    max_moves: u32,
    rng: &mut R,
) -> Option<WalkOutcome> {
    if grid.get(origin) != Cell::Membrane {
        return None;
    }

    let outward = pick(
        grid.neighbors(origin).filter(|&n| grid.get(n) == Cell::Empty),
        rng,
    )?;
    grid.swap(origin, outward);
    work.push_with_neighbors(outward, grid.neighbors(outward));

    let mut pos = origin;
    let mut moves: u32 = 0;
    let stop = loop {
        work.push_with_neighbors(pos, grid.neighbors(pos));

        if is_excluded(grid, pos, exclusion_threshold) {
            break WalkStop::Excluded;
        }
        if moves > max_moves {
            break WalkStop::MoveLimit;
        }

        let Some(next) = pick(
            grid.neighbors(pos).filter(|&n| grid.get(n).is_walkable()),
            rng,
        ) else {
            break WalkStop::Stuck;
        };

        grid.swap(pos, next);
        grid.set(pos, Cell::Bubble);
        moves += 1;
        pos = next;
    };

    let hardening = hardening_phase(grid, work);
    tracing::trace!(
        x = origin.x,
        y = origin.y,
        moves,
        ?stop,
        changed = hardening.changed,
        "bubble walk finished"
    );

    Some(WalkOutcome {
        moves,
        stop,
        hardening,
    })
}
