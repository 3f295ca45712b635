use glam::UVec2;

/// Position of a cell in a [`crate::grid::Grid`].
///
/// Both components are only meaningful when they are smaller than the
/// grid's `size`; entry points reject anything else.
pub type Coord = UVec2;

/// State of a single grid cell.
///
/// The discriminants are part of the rule set: hardening compares states by
/// their numeric order (`Empty < Wall < Membrane < Bubble`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Cell {
    #[default]
    Empty = 0,
    Wall = 1,
    Membrane = 2,
    /// Trail marker left behind by a walk; resolved before the walk returns.
    Bubble = 3,
}

impl Cell {
    /// `true` for every state except [`Cell::Empty`].
    #[inline]
    pub fn is_solid(self) -> bool {
        self != Cell::Empty
    }

    /// `true` for the states a bubble may move into.
    #[inline]
    pub fn is_walkable(self) -> bool {
        matches!(self, Cell::Membrane | Cell::Wall)
    }
}
