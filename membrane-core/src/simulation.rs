//! The simulation object and its per-tick schedule.
//!
//! A [`Simulation`] owns everything the automaton needs: the double-buffered
//! grid, the worklist, the stimulation field, the environment and the random
//! source. Hosts drive it by calling [`Simulation::tick`] once per frame and
//! draining [`Simulation::drain_dirty`] to find out what to redraw.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::{
    config::SimConfig,
    diamond::Diamond,
    environment::{Ambient, EnvironmentState, RuleConstants},
    error::{Result, SimError},
    feed::{AmbientFeed, AmbientInbox, FeedMessage},
    grid::{Grid, GridSnapshot},
    phases::{self, HardenReport, WalkOutcome},
    stimulation::{self, SeedGenerator, StimulationField},
    types::{Cell, Coord},
    worklist::Worklist,
};

/// What one call to [`Simulation::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick counter value this report belongs to.
    pub tick: u64,
    /// The simulation was paused; only the environment advanced.
    pub paused: bool,
    pub zone_selections: usize,
    pub zone_walks: usize,
    pub random_selections: usize,
    pub random_walks: usize,
    /// Bubble moves summed over all walks of the tick.
    pub walk_moves: u64,
    pub zones_regenerated: bool,
}

/// A membrane automaton with its environment and stimulation state.
///
/// The random source is a type parameter so tests and replays can inject
/// their own; [`Simulation::new`] uses a seeded [`ChaCha8Rng`].
pub struct Simulation<R: Rng = ChaCha8Rng> {
    config: SimConfig,
    grid: Grid,
    work: Worklist,
    field: StimulationField,
    env: EnvironmentState,
    constants: RuleConstants,
    inbox: AmbientInbox,
    rng: R,
    tick: u64,
    paused: bool,
}

impl Simulation<ChaCha8Rng> {
    /// Builds a simulation seeded from `config.seed`, or from a fresh random
    /// seed (logged, so the run can be replayed) when none is given.
    pub fn new(config: SimConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let sim = Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))?;
        info!(size = sim.config.size, seed, "simulation created");
        Ok(sim)
    }
}

impl<R: Rng> Simulation<R> {
    /// Builds a simulation around a caller-provided random source.
    pub fn with_rng(config: SimConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let size = config.size;
        let env = EnvironmentState::new(config.initial_ambient, config.transition_step);
        let constants = RuleConstants::derive(&env.current(), &config.ranges);
        let field = StimulationField::from_generators(&config.generators, size);

        let mut sim = Self {
            grid: Grid::new(size),
            work: Worklist::new(size),
            field,
            env,
            constants,
            inbox: AmbientInbox::new(),
            rng,
            tick: 0,
            paused: false,
            config,
        };
        sim.mark_all_dirty();
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn size(&self) -> u32 {
        self.grid.size()
    }

    /// Committed grid state.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    pub fn constants(&self) -> &RuleConstants {
        &self.constants
    }

    pub fn ambient(&self) -> Ambient {
        self.env.current()
    }

    pub fn environment(&self) -> &EnvironmentState {
        &self.env
    }

    pub fn transition_progress(&self) -> f32 {
        self.env.progress()
    }

    pub fn stimulation_points(&self) -> &[Coord] {
        &self.field.points
    }

    pub fn seeds(&self) -> &[SeedGenerator] {
        &self.field.seeds
    }

    /// Number of un-paused ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Handle for delivering ambient targets from other threads.
    pub fn feed(&self) -> AmbientFeed {
        self.inbox.feed()
    }

    /// Starts a smoothed transition towards the given ambient reading.
    pub fn set_environment(&mut self, temperature: f32, pressure: f32, moisture: f32) -> Result<()> {
        self.begin_transition(Ambient::new(temperature, pressure, moisture))
    }

    /// Starts a smoothed transition towards the current reading plus `delta`.
    pub fn nudge_environment(&mut self, delta: Ambient) -> Result<()> {
        let target = self.env.current().nudged(delta);
        self.begin_transition(target)
    }

    fn begin_transition(&mut self, target: Ambient) -> Result<()> {
        self.env.begin_transition(target)?;
        info!(
            temperature = target.temperature,
            pressure = target.pressure,
            moisture = target.moisture,
            "ambient transition started"
        );
        Ok(())
    }

    fn apply_feed(&mut self) {
        let messages: Vec<FeedMessage> = self.inbox.drain().collect();
        for msg in messages {
            let applied = match msg {
                FeedMessage::Set(target) => self.begin_transition(target),
                FeedMessage::Nudge(delta) => self.nudge_environment(delta),
            };
            if let Err(e) = applied {
                warn!(error = %e, "ignoring ambient feed message");
            }
        }
    }

    /// Writes one cell of the working grid and queues it with its neighbors.
    ///
    /// The change becomes visible in [`Simulation::grid`] after the next
    /// [`Simulation::harden`] (or any walk, which hardens on exit).
    pub fn edit_cell(&mut self, at: Coord, state: Cell) -> Result<()> {
        let at = self.grid.check(at)?;
        if state == Cell::Bubble {
            return Err(SimError::TransientState);
        }
        self.grid.set(at, state);
        self.work.push_with_neighbors(at, self.grid.neighbors(at));
        Ok(())
    }

    /// Settles every queued cell and commits the grid.
    pub fn harden(&mut self) -> HardenReport {
        phases::hardening_phase(&mut self.grid, &mut self.work)
    }

    /// Queues every cell and hardens, re-deriving walls across the grid.
    pub fn reharden_all(&mut self) -> HardenReport {
        for c in self.grid.coords() {
            self.work.push(c);
        }
        self.harden()
    }

    /// Fills a diamond with membrane and hardens.
    pub fn seed_region(&mut self, center: Coord, radius: u32) -> Result<HardenReport> {
        let center = self.grid.check(center)?;
        let size = self.grid.size();
        for c in Diamond::around(center, radius as f32, size) {
            self.grid.set(c, Cell::Membrane);
            self.work.push_with_neighbors(c, self.grid.neighbors(c));
        }
        Ok(self.harden())
    }

    /// Adds a diamond of stimulation points.
    ///
    /// ### Returns
    /// Number of points added.
    pub fn add_stimulation_zone(&mut self, center: Coord, radius: u32) -> Result<usize> {
        let center = self.grid.check(center)?;
        let footprint = Diamond::around(center, radius as f32, self.grid.size());
        Ok(self.field.add_zone(footprint))
    }

    pub fn clear_stimulation_zones(&mut self) {
        self.field.clear();
    }

    /// `true` if `at` has at least `exclusion_threshold` empty neighbors.
    pub fn is_excluded(&self, at: Coord) -> Result<bool> {
        let at = self.grid.check(at)?;
        Ok(phases::is_excluded(
            &self.grid,
            at,
            self.constants.exclusion_threshold,
        ))
    }

    /// Runs one walk at `origin`. `Ok(false)` means the walk could not start.
    pub fn stimulate(&mut self, origin: Coord) -> Result<bool> {
        let origin = self.grid.check(origin)?;
        Ok(phases::bubble_walk(
            &mut self.grid,
            &mut self.work,
            origin,
            self.constants.exclusion_threshold,
            self.config.max_walk_moves,
            &mut self.rng,
        )
        .is_some())
    }

    /// Runs one walk from a uniformly random origin, if one can be found.
    pub fn stimulate_random(&mut self) -> bool {
        self.random_selection().is_some()
    }

    /// Runs one walk from a stimulation point, if one can be found.
    pub fn stimulate_zone(&mut self) -> bool {
        self.zone_selection().is_some()
    }

    fn random_selection(&mut self) -> Option<WalkOutcome> {
        let grid = &mut self.grid;
        let work = &mut self.work;
        let threshold = self.constants.exclusion_threshold;
        let max_moves = self.config.max_walk_moves;
        let mut outcome = None;

        stimulation::select_uniform(
            grid.size(),
            self.config.max_selection_attempts,
            &mut self.rng,
            |origin, rng| {
                outcome = phases::bubble_walk(grid, work, origin, threshold, max_moves, rng);
                outcome.is_some()
            },
        );
        outcome
    }

    fn zone_selection(&mut self) -> Option<WalkOutcome> {
        let grid = &mut self.grid;
        let work = &mut self.work;
        let threshold = self.constants.exclusion_threshold;
        let max_moves = self.config.max_walk_moves;
        let mut outcome = None;

        stimulation::select_from_points(
            &mut self.field.points,
            self.config.consume_stimulation_points,
            self.config.max_selection_attempts,
            &mut self.rng,
            |origin, rng| {
                outcome = phases::bubble_walk(grid, work, origin, threshold, max_moves, rng);
                outcome.is_some()
            },
        );
        outcome
    }

    /// Advances the simulation by one tick.
    ///
    /// 1. Apply queued feed messages and advance the ambient transition.
    /// 2. Re-derive the rule constants.
    /// 3. Spend `ceil(speed * (1 - random_factor))` selections on stimulation
    ///    points, then `ceil(speed * random_factor)` on random origins.
    /// 4. Every `rigidity` ticks, rebuild the stimulation points around the
    ///    moving seeds (when dynamic zones are enabled).
    ///
    /// While paused only steps 1 and 2 run: the environment keeps moving,
    /// the grid and the tick counter do not.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.apply_feed();
        self.env.advance();
        self.constants = RuleConstants::derive(&self.env.current(), &self.config.ranges);
        if self.paused {
            report.paused = true;
            return report;
        }

        let (zone_budget, random_budget) = self.constants.selection_budget();
        for _ in 0..zone_budget {
            report.zone_selections += 1;
            if let Some(o) = self.zone_selection() {
                report.zone_walks += 1;
                report.walk_moves += u64::from(o.moves);
            }
        }
        for _ in 0..random_budget {
            report.random_selections += 1;
            if let Some(o) = self.random_selection() {
                report.random_walks += 1;
                report.walk_moves += u64::from(o.moves);
            }
        }

        if self.config.dynamic_zones && self.tick % u64::from(self.constants.rigidity) == 0 {
            let points = self.field.regenerate(
                self.grid.size(),
                self.constants.stimulation_size,
                self.constants.volatility,
                &mut self.rng,
            );
            report.zones_regenerated = true;
            debug!(tick = self.tick, points, "stimulation zones regenerated");
        }

        debug!(
            tick = self.tick,
            zone_walks = report.zone_walks,
            random_walks = report.random_walks,
            moves = report.walk_moves,
            "tick finished"
        );
        self.tick += 1;
        report
    }

    /// Records every cell in the dirty log (first frame, full redraw).
    pub fn mark_all_dirty(&mut self) {
        for c in self.grid.coords() {
            self.work.mark_dirty(c);
        }
    }

    /// Coordinates touched since the previous drain.
    pub fn drain_dirty(&mut self) -> Vec<Coord> {
        self.work.drain_dirty()
    }
}
