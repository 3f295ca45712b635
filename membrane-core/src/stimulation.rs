//! Where walks start.
//!
//! Walk origins come from two policies: [`select_uniform`] samples the whole
//! grid, [`select_from_points`] samples a [`StimulationField`]'s point set.
//! The field itself is either filled by hand ([`StimulationField::add_zone`])
//! or rebuilt periodically around moving [`SeedGenerator`]s.

use glam::{UVec2, Vec2};
use rand::Rng;

use crate::{config::GeneratorConfig, diamond::Diamond, types::Coord};

/// A moving centre that stimulation points are scattered around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedGenerator {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl SeedGenerator {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self { pos, vel }
    }

    /// Places a configured generator on a grid of side `size`.
    pub fn from_config(cfg: &GeneratorConfig, size: u32) -> Self {
        let max = (size.saturating_sub(1)) as f32;
        let pos = (Vec2::new(cfg.x, cfg.y) * size as f32)
            .floor()
            .clamp(Vec2::ZERO, Vec2::splat(max));
        Self::new(pos, Vec2::new(cfg.dx, cfg.dy))
    }

    /// Moves one step, bouncing off the grid edges, then perturbs the velocity.
    ///
    /// A velocity component is reflected when the step would leave
    /// `[0, size)` on that axis. The new position is floored to a whole cell
    /// and kept on the grid; each velocity component then receives a uniform
    /// delta in `[-volatility / 2, volatility / 2)`.
    pub fn advance<R: Rng>(&mut self, size: u32, volatility: f32, rng: &mut R) {
        let extent = size as f32;
        let next = self.pos + self.vel;
        if next.x >= extent || next.x < 0.0 {
            self.vel.x = -self.vel.x;
        }
        if next.y >= extent || next.y < 0.0 {
            self.vel.y = -self.vel.y;
        }

        let max = (size.saturating_sub(1)) as f32;
        self.pos = (self.pos + self.vel)
            .floor()
            .clamp(Vec2::ZERO, Vec2::splat(max));
        self.vel += Vec2::new(jitter(volatility, rng), jitter(volatility, rng));
    }
}

/// Uniform offset in `[-volatility / 2, volatility / 2)`.
#[inline]
fn jitter<R: Rng>(volatility: f32, rng: &mut R) -> f32 {
    rng.random::<f32>() * volatility - volatility / 2.0
}

/// Stimulation point set plus the generators that rebuild it.
#[derive(Clone, Debug, Default)]
pub struct StimulationField {
    pub points: Vec<Coord>,
    pub seeds: Vec<SeedGenerator>,
}

impl StimulationField {
    pub fn from_generators(generators: &[GeneratorConfig], size: u32) -> Self {
        Self {
            points: Vec::new(),
            seeds: generators
                .iter()
                .map(|g| SeedGenerator::from_config(g, size))
                .collect(),
        }
    }

    /// Appends every cell of a footprint to the point set.
    ///
    /// ### Returns
    /// Number of points added.
    pub fn add_zone(&mut self, footprint: Diamond) -> usize {
        let before = self.points.len();
        self.points.extend(footprint);
        self.points.len() - before
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Rebuilds the point set around every seed and moves the seeds.
    ///
    /// For each seed, every cell of the diamond of radius `radius` around it
    /// is jittered on both axes by `floor(v - volatility / 2 + U * volatility)`
    /// and clamped to the grid before being added. The seed then advances
    /// (see [`SeedGenerator::advance`]).
    ///
    /// ### Returns
    /// Number of points in the rebuilt set.
    pub fn regenerate<R: Rng>(
        &mut self,
        size: u32,
        radius: f32,
        volatility: f32,
        rng: &mut R,
    ) -> usize {
        self.points.clear();
        let max = size.saturating_sub(1) as f32;
        let scatter = |v: u32, rng: &mut R| {
            (v as f32 + jitter(volatility, rng)).floor().clamp(0.0, max) as u32
        };

        for seed in &mut self.seeds {
            let footprint = Diamond::new(seed.pos.floor().as_ivec2(), radius, size);
            for c in footprint {
                let x = scatter(c.x, rng);
                let y = scatter(c.y, rng);
                self.points.push(UVec2::new(x, y));
            }
            seed.advance(size, volatility, rng);
        }
        self.points.len()
    }
}

/// Tries uniformly random origins until one walk starts.
///
/// ### Parameters
/// - `size` - Grid side; origins are drawn from `[0, size)` on both axes.
/// - `max_attempts` - Upper bound on calls to `attempt`.
/// - `rng` - Source for the sampled coordinates; also lent to `attempt`.
/// - `attempt` - Runs a walk at the given origin and reports whether it started.
///
/// ### Returns
/// `true` if some attempt succeeded.
pub fn select_uniform<R: Rng>(
    size: u32,
    max_attempts: u32,
    rng: &mut R,
    mut attempt: impl FnMut(Coord, &mut R) -> bool,
) -> bool {
    if size == 0 {
        return false;
    }
    for _ in 0..max_attempts {
        let origin = UVec2::new(rng.random_range(0..size), rng.random_range(0..size));
        if attempt(origin, rng) {
            return true;
        }
    }
    false
}

/// Tries origins drawn from `points` until one walk starts.
///
/// An empty point set is a no-op. With `consume` set, the point whose walk
/// succeeded is removed from the set (order is not preserved).
///
/// ### Returns
/// `true` if some attempt succeeded.
pub fn select_from_points<R: Rng>(
    points: &mut Vec<Coord>,
    consume: bool,
    max_attempts: u32,
    rng: &mut R,
    mut attempt: impl FnMut(Coord, &mut R) -> bool,
) -> bool {
    if points.is_empty() {
        return false;
    }
    for _ in 0..max_attempts {
        let i = rng.random_range(0..points.len());
        if attempt(points[i], rng) {
            if consume {
                points.swap_remove(i);
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generator_config_is_scaled_to_grid() {
        let g = GeneratorConfig {
            x: 0.25,
            y: 0.5,
            dx: 4.0,
            dy: 1.0,
        };
        let seed = SeedGenerator::from_config(&g, 256);
        assert_eq!(seed.pos, Vec2::new(64.0, 128.0));
        assert_eq!(seed.vel, Vec2::new(4.0, 1.0));

        let edge = GeneratorConfig { x: 1.0, ..g };
        assert_eq!(SeedGenerator::from_config(&edge, 256).pos.x, 255.0);
    }

    #[test]
    fn seed_reflects_at_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut seed = SeedGenerator::new(Vec2::new(62.0, 1.0), Vec2::new(4.0, -3.0));

        // Zero volatility keeps the velocity magnitude fixed.
        seed.advance(64, 0.0, &mut rng);

        assert_eq!(seed.vel, Vec2::new(-4.0, 3.0));
        assert_eq!(seed.pos, Vec2::new(58.0, 4.0));
    }

    #[test]
    fn seed_stays_on_grid_under_volatility() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seed = SeedGenerator::new(Vec2::new(16.0, 16.0), Vec2::new(5.0, 7.0));
        for _ in 0..500 {
            seed.advance(32, 12.0, &mut rng);
            assert!(seed.pos.x >= 0.0 && seed.pos.x <= 31.0);
            assert!(seed.pos.y >= 0.0 && seed.pos.y <= 31.0);
            assert_eq!(seed.pos, seed.pos.floor());
        }
    }

    #[test]
    fn velocity_perturbation_is_bounded_by_half_volatility() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut seed = SeedGenerator::new(Vec2::new(50.0, 50.0), Vec2::new(1.0, 1.0));
        seed.advance(128, 4.0, &mut rng);
        assert!((seed.vel.x - 1.0).abs() <= 2.0);
        assert!((seed.vel.y - 1.0).abs() <= 2.0);
    }

    #[test]
    fn regenerate_replaces_points_and_moves_seeds() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut field = StimulationField {
            points: vec![UVec2::new(0, 0); 7],
            seeds: vec![
                SeedGenerator::new(Vec2::new(10.0, 10.0), Vec2::new(2.0, 0.0)),
                SeedGenerator::new(Vec2::new(40.0, 40.0), Vec2::new(0.0, -2.0)),
            ],
        };

        let n = field.regenerate(64, 3.0, 0.0, &mut rng);

        // Two interior diamonds of reach 2, no jitter.
        assert_eq!(n, 26);
        assert!(field.points.contains(&UVec2::new(10, 12)));
        assert!(field.points.contains(&UVec2::new(38, 40)));
        assert_eq!(field.seeds[0].pos, Vec2::new(12.0, 10.0));
        assert_eq!(field.seeds[1].pos, Vec2::new(40.0, 38.0));
    }

    #[test]
    fn regenerated_points_are_clamped_to_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let mut field = StimulationField {
            points: Vec::new(),
            seeds: vec![SeedGenerator::new(Vec2::new(0.0, 15.0), Vec2::new(1.0, 1.0))],
        };
        field.regenerate(16, 6.0, 12.0, &mut rng);
        assert!(!field.points.is_empty());
        assert!(field.points.iter().all(|p| p.x < 16 && p.y < 16));
    }

    #[test]
    fn uniform_selection_stops_at_first_success() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let mut calls = 0;
        let ok = select_uniform(8, 100, &mut rng, |c, _| {
            assert!(c.x < 8 && c.y < 8);
            calls += 1;
            calls == 3
        });
        assert!(ok);
        assert_eq!(calls, 3);
    }

    #[test]
    fn uniform_selection_respects_attempt_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(16);
        let mut calls = 0;
        let ok = select_uniform(8, 25, &mut rng, |_, _| {
            calls += 1;
            false
        });
        assert!(!ok);
        assert_eq!(calls, 25);
    }

    #[test]
    fn point_selection_on_empty_set_is_a_no_op() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut points = Vec::new();
        let ok = select_from_points(&mut points, true, 10, &mut rng, |_, _| {
            panic!("no attempt expected")
        });
        assert!(!ok);
    }

    #[test]
    fn consumed_point_is_removed_on_success() {
        let mut rng = ChaCha8Rng::seed_from_u64(18);
        let target = UVec2::new(2, 2);
        let mut points = vec![UVec2::new(0, 0), target, UVec2::new(1, 1)];

        let ok = select_from_points(&mut points, true, 1000, &mut rng, |c, _| c == target);

        assert!(ok);
        assert_eq!(points.len(), 2);
        assert!(!points.contains(&target));
    }

    #[test]
    fn unconsumed_points_are_kept() {
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        let mut points = vec![UVec2::new(3, 3)];
        assert!(select_from_points(&mut points, false, 5, &mut rng, |_, _| true));
        assert_eq!(points, vec![UVec2::new(3, 3)]);
    }

    #[test]
    fn add_zone_is_additive() {
        let mut field = StimulationField::default();
        let a = field.add_zone(Diamond::around(UVec2::new(5, 5), 2.0, 16));
        let b = field.add_zone(Diamond::around(UVec2::new(5, 5), 2.0, 16));
        assert_eq!(a, 5);
        assert_eq!(b, 5);
        assert_eq!(field.points.len(), 10);
    }
}
