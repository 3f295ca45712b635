use glam::UVec2;
use membrane_core::{
    grid::{self, GridSnapshot},
    phases, Cell, SimConfig, Simulation,
};
use proptest::prelude::*;

prop_compose! {
    fn arb_config()(
        size in 8u32..24,
        seed in any::<u64>(),
        consume in any::<bool>(),
    ) -> SimConfig {
        SimConfig {
            size,
            seed: Some(seed),
            max_walk_moves: 512,
            max_selection_attempts: 128,
            consume_stimulation_points: consume,
            ..SimConfig::default()
        }
    }
}

prop_compose! {
    /// Diamond seeds given as fractions of the grid side plus a radius.
    fn arb_regions()(
        regions in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0, 1u32..6), 1..4)
    ) -> Vec<(f32, f32, u32)> {
        regions
    }
}

fn build(config: SimConfig, regions: &[(f32, f32, u32)]) -> Simulation {
    let size = config.size;
    let mut sim = Simulation::new(config).unwrap();
    for &(fx, fy, radius) in regions {
        let at = UVec2::new((fx * size as f32) as u32, (fy * size as f32) as u32);
        sim.seed_region(at.min(UVec2::splat(size - 1)), radius).unwrap();
    }
    sim
}

fn solid_count(snapshot: &GridSnapshot) -> usize {
    snapshot.cells.iter().filter(|c| c.is_solid()).count()
}

fn walls_are_enclosed(snapshot: &GridSnapshot) -> bool {
    let size = snapshot.size;
    (0..size).flat_map(|y| (0..size).map(move |x| UVec2::new(x, y))).all(|p| {
        snapshot.get(p) != Some(Cell::Wall)
            || grid::neighbors(p, size).all(|n| snapshot.get(n).is_some_and(Cell::is_solid))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tick_boundaries_hold_no_bubbles_and_enclosed_walls(
        config in arb_config(),
        regions in arb_regions(),
        ticks in 1usize..4,
    ) {
        let mut sim = build(config, &regions);
        for _ in 0..ticks {
            sim.tick();
            let snap = sim.snapshot();
            prop_assert_eq!(sim.grid().count(Cell::Bubble), 0);
            prop_assert!(walls_are_enclosed(&snap), "wall with an empty neighbor");
            prop_assert!(!sim.grid().has_pending_writes());
        }
    }

    #[test]
    fn ticks_conserve_solid_cells(
        config in arb_config(),
        regions in arb_regions(),
    ) {
        let mut sim = build(config, &regions);
        let before = solid_count(&sim.snapshot());
        sim.tick();
        sim.tick();
        prop_assert_eq!(solid_count(&sim.snapshot()), before);
    }

    #[test]
    fn rehardening_a_settled_grid_changes_nothing(
        config in arb_config(),
        regions in arb_regions(),
    ) {
        let mut sim = build(config, &regions);
        sim.tick();
        let before = sim.snapshot();

        let report = sim.reharden_all();

        prop_assert_eq!(report.changed, 0);
        prop_assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn exclusion_matches_empty_neighbor_count(
        config in arb_config(),
        regions in arb_regions(),
        fx in 0.0f32..1.0,
        fy in 0.0f32..1.0,
    ) {
        let size = config.size;
        let sim = build(config, &regions);
        let at = UVec2::new((fx * size as f32) as u32, (fy * size as f32) as u32)
            .min(UVec2::splat(size - 1));

        let empty = phases::empty_neighbor_count(sim.grid(), at);
        let threshold = sim.constants().exclusion_threshold;
        prop_assert_eq!(sim.is_excluded(at).unwrap(), empty as f32 >= threshold);
    }

    #[test]
    fn same_seed_replays_identically(
        config in arb_config(),
        regions in arb_regions(),
    ) {
        let mut a = build(config.clone(), &regions);
        let mut b = build(config, &regions);
        for _ in 0..2 {
            prop_assert_eq!(a.tick(), b.tick());
        }
        prop_assert_eq!(a.snapshot(), b.snapshot());
        prop_assert_eq!(a.stimulation_points(), b.stimulation_points());
    }

    #[test]
    fn ambient_transition_stays_between_endpoints(
        t in 0.0f32..=1.0,
        p in 0.0f32..=1.0,
        m in 0.0f32..=1.0,
    ) {
        let config = SimConfig {
            size: 8,
            seed: Some(1),
            max_selection_attempts: 4,
            transition_step: 0.1,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.set_environment(t, p, m).unwrap();

        let mut last = sim.transition_progress();
        for _ in 0..12 {
            sim.tick();
            let progress = sim.transition_progress();
            prop_assert!(progress >= last && progress <= 1.0);
            let now = sim.ambient();
            prop_assert!(now.temperature >= t.min(0.5) - 1e-6 && now.temperature <= t.max(0.5) + 1e-6);
            prop_assert!(now.pressure >= p.min(0.5) - 1e-6 && now.pressure <= p.max(0.5) + 1e-6);
            prop_assert!(now.moisture >= m.min(0.5) - 1e-6 && now.moisture <= m.max(0.5) + 1e-6);
            last = progress;
        }
        prop_assert_eq!(sim.transition_progress(), 1.0);
    }
}
