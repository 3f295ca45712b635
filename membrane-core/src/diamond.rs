use glam::{IVec2, UVec2};

use crate::types::Coord;

/// Cells of a diamond (L1 ball) clipped to a square grid.
///
/// A cell at Manhattan distance `d` from `center` belongs to the footprint
/// when `d == 0` or `d < radius`, so a radius of `1` or less covers only the
/// center. Cells off the grid are skipped; the center itself may lie off the
/// grid as long as part of the footprint does not.
///
/// The iterator is `Clone`, so a footprint can be walked more than once
/// (seeding, zone registration and rendering each consume their own copy).
#[derive(Clone, Debug)]
pub struct Diamond {
    center: IVec2,
    reach: i32,
    size: i32,
    dx: i32,
    dy: i32,
}

impl Diamond {
    pub fn new(center: IVec2, radius: f32, size: u32) -> Self {
        let size = size.min(i32::MAX as u32) as i32;
        let reach = if radius.is_finite() && radius > 1.0 {
            // Nothing beyond two grid sides can ever be on the grid.
            (radius.ceil() as i64 - 1).clamp(0, 2 * size as i64) as i32
        } else {
            0
        };
        Self {
            center,
            reach,
            size,
            dx: 0,
            dy: -reach,
        }
    }

    /// Diamond around an on-grid coordinate.
    pub fn around(center: Coord, radius: f32, size: u32) -> Self {
        Self::new(center.as_ivec2(), radius, size)
    }

    /// Largest Manhattan distance included in the footprint.
    pub fn reach(&self) -> i32 {
        self.reach
    }
}

impl Iterator for Diamond {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        loop {
            if self.dy > self.reach {
                return None;
            }
            let span = self.reach - self.dy.abs();
            if self.dx > span {
                self.dy += 1;
                self.dx = -(self.reach - self.dy.abs());
                continue;
            }

            let p = self.center + IVec2::new(self.dx, self.dy);
            self.dx += 1;
            if p.x >= 0 && p.y >= 0 && p.x < self.size && p.y < self.size {
                return Some(UVec2::new(p.x as u32, p.y as u32));
            }
        }
    }
}
