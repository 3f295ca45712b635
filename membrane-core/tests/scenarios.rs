use std::{fs, thread};

use glam::UVec2;
use membrane_core::{Ambient, Cell, SimConfig, SimError, Simulation};

fn config(size: u32, seed: u64) -> SimConfig {
    SimConfig {
        size,
        seed: Some(seed),
        ..SimConfig::default()
    }
}

#[test]
fn blob_grows_under_default_conditions() {
    let mut sim = Simulation::new(config(64, 42)).unwrap();
    sim.seed_region(UVec2::new(32, 32), 10).unwrap();
    let before = sim.snapshot();
    let walls_before = sim.grid().count(Cell::Wall);

    let mut walks = 0;
    for _ in 0..20 {
        let report = sim.tick();
        walks += report.zone_walks + report.random_walks;
    }

    assert!(walks > 0);
    assert_ne!(sim.snapshot(), before);
    // Walks hollow the blob out and push membrane outwards.
    assert!(sim.grid().count(Cell::Wall) < walls_before);
    assert_eq!(sim.grid().count(Cell::Bubble), 0);
}

#[test]
fn hand_placed_zone_drives_walks_when_seeds_are_off() {
    let mut cfg = config(32, 7);
    cfg.dynamic_zones = false;
    cfg.initial_ambient = Ambient::splat(0.0);
    let mut sim = Simulation::new(cfg).unwrap();
    sim.seed_region(UVec2::new(16, 16), 6).unwrap();
    sim.add_stimulation_zone(UVec2::new(16, 16), 7).unwrap();

    let report = sim.tick();

    assert!(!report.zones_regenerated);
    assert!(report.zone_selections > 0);
    assert!(report.zone_walks > 0);
}

#[test]
fn consumed_points_shrink_the_zone() {
    let mut cfg = config(32, 8);
    cfg.dynamic_zones = false;
    cfg.consume_stimulation_points = true;
    let mut sim = Simulation::new(cfg).unwrap();
    sim.seed_region(UVec2::new(16, 16), 6).unwrap();
    let added = sim.add_stimulation_zone(UVec2::new(16, 16), 7).unwrap();

    let mut walks = 0;
    for _ in 0..3 {
        walks += sim.tick().zone_walks;
    }

    assert_eq!(sim.stimulation_points().len(), added - walks);
}

#[test]
fn feed_from_producer_thread_retargets_environment() {
    let mut sim = Simulation::new(config(16, 9)).unwrap();
    let feed = sim.feed();

    thread::spawn(move || {
        feed.set(Ambient::new(0.0, 1.0, 0.0));
        feed.nudge(Ambient::new(0.0, 0.0, 0.5));
    })
    .join()
    .unwrap();
    sim.tick();

    // The nudge is applied on top of the reading at the time it is drained.
    let target = sim.environment().target();
    assert_eq!(target, Ambient::new(0.5, 0.5, 1.0));
}

#[test]
fn config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("membrane-{}.toml", std::process::id()));
    let mut cfg = config(48, 11);
    cfg.max_walk_moves = 100;
    fs::write(&path, cfg.to_toml_string().unwrap()).unwrap();

    let loaded = SimConfig::load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(loaded, cfg);
    let sim = Simulation::new(loaded).unwrap();
    assert_eq!(sim.size(), 48);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = SimConfig::load("/nonexistent/membrane.toml").unwrap_err();
    assert!(matches!(err, SimError::Io(_)));
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let cfg = SimConfig {
        size: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        Simulation::new(cfg),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn dirty_log_reports_touched_cells_only() {
    let mut sim = Simulation::new(config(16, 12)).unwrap();
    assert_eq!(sim.drain_dirty().len(), 256);

    sim.edit_cell(UVec2::new(5, 5), Cell::Membrane).unwrap();
    sim.harden();
    let mut dirty = sim.drain_dirty();
    dirty.sort_by_key(|c| (c.y, c.x));

    assert_eq!(
        dirty,
        vec![
            UVec2::new(5, 4),
            UVec2::new(4, 5),
            UVec2::new(5, 5),
            UVec2::new(6, 5),
            UVec2::new(5, 6),
        ]
    );
}

#[test]
fn enclosed_membrane_cannot_be_stimulated() {
    let mut sim = Simulation::new(config(16, 13)).unwrap();
    sim.seed_region(UVec2::new(8, 8), 3).unwrap();
    // Unhardened edit: the centre holds membrane but every neighbor is solid.
    sim.edit_cell(UVec2::new(8, 8), Cell::Membrane).unwrap();
    let before = sim.snapshot();

    assert!(!sim.stimulate(UVec2::new(8, 8)).unwrap());
    assert_eq!(sim.snapshot(), before);
}
