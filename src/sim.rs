//! The simulation record and its per-tick update.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collision::{self, Crash, Hitbox};
use crate::config::GameConfig;
use crate::difficulty::Difficulty;
use crate::obstacles::{Obstacle, Obstacles};
use crate::phase::{Effect, Phase, PhaseEvent};
use crate::physics::Bird;

/// Things the sound layer may want to play. Fire and forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    Jump,
    Score,
    Crash,
}

/// Final numbers of a run, copied out at the crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Sequence number of the run within this process, starting at 1.
    pub run: u64,
    pub score: u32,
    pub best: u32,
    pub frames: u64,
    pub crash: Crash,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub sounds: Vec<SoundEvent>,
    /// Set on the tick that ended the run.
    pub ended: Option<RunSummary>,
}

/// Read-only view handed to the presentation layer after each tick.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub bird: Bird,
    pub obstacles: &'a VecDeque<Obstacle>,
    pub score: u32,
    pub best: u32,
    pub frame: u64,
    pub run: u64,
    pub speed: f64,
    pub config: &'a GameConfig,
}

pub struct Simulation<R = StdRng> {
    config: GameConfig,
    rng: R,
    phase: Phase,
    bird: Bird,
    obstacles: Obstacles,
    frame: u64,
    score: u32,
    best: u32,
    run: u64,
    difficulty: Difficulty,
    pending: Option<PhaseEvent>,
}

impl Simulation<StdRng> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    pub fn with_rng(config: GameConfig, rng: R) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid game config");
        Self {
            bird: Bird::at_rest(config.start_y()),
            difficulty: Difficulty::for_score(&config, 0),
            config,
            rng,
            phase: Phase::Idle,
            obstacles: Obstacles::new(),
            frame: 0,
            score: 0,
            best: 0,
            run: 0,
            pending: None,
        }
    }

    // ── Input ───────────────────────────────────────────────────────────────

    /// Jump, or start from the title screen. Takes effect at the start of
    /// the next tick; a later input before that tick replaces it.
    pub fn press(&mut self) {
        self.pending = Some(PhaseEvent::Activate);
    }

    /// Start over after a crash (or start from the title screen).
    pub fn request_restart(&mut self) {
        self.pending = Some(PhaseEvent::Restart);
    }

    // ── Tick ────────────────────────────────────────────────────────────────

    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if let Some(event) = self.pending.take() {
            self.apply_input(event, &mut report);
        }
        if self.phase.is_active() {
            self.step(&mut report);
        }
        report
    }

    fn apply_input(&mut self, event: PhaseEvent, report: &mut TickReport) {
        let (next, effect) = self.phase.on(event);
        match effect {
            Effect::StartRun => {
                self.start_run();
                self.bird.jump(self.config.jump_velocity);
                report.sounds.push(SoundEvent::Jump);
            }
            Effect::Jump => {
                self.bird.jump(self.config.jump_velocity);
                report.sounds.push(SoundEvent::Jump);
            }
            Effect::EndRun | Effect::None => {}
        }
        self.phase = next;
    }

    /// Resets every piece of run state and enters `Active` with the bird at
    /// rest. The best score survives.
    pub(crate) fn start_run(&mut self) {
        self.run += 1;
        self.phase = Phase::Active;
        self.bird = Bird::at_rest(self.config.start_y());
        self.obstacles.clear();
        self.frame = 0;
        self.score = 0;
        self.difficulty = Difficulty::for_score(&self.config, 0);
        tracing::info!(run = self.run, best = self.best, "run started");
    }

    fn step(&mut self, report: &mut TickReport) {
        let Difficulty { speed, cadence } = self.difficulty;

        self.bird.step(self.config.gravity);

        self.frame += 1;
        self.obstacles
            .maybe_spawn(&self.config, self.frame, cadence, &mut self.rng);
        self.obstacles.advance(speed);
        self.obstacles.evict_expired(self.config.obstacle_width);

        let hitbox = Hitbox::of(&self.bird, &self.config);
        let crash = collision::world_bounds(&hitbox, &self.config)
            .or_else(|| collision::first_obstacle_hit(&hitbox, &self.obstacles, &self.config));
        if let Some(crash) = crash {
            self.end_run(crash, report);
            return;
        }

        let points = collision::award_passes(&hitbox, &mut self.obstacles, &self.config);
        if points > 0 {
            self.score += points;
            report
                .sounds
                .extend(std::iter::repeat_n(SoundEvent::Score, points as usize));
            tracing::debug!(score = self.score, frame = self.frame, "scored");
        }

        self.difficulty = Difficulty::for_score(&self.config, self.score);
    }

    fn end_run(&mut self, crash: Crash, report: &mut TickReport) {
        let (next, effect) = self.phase.on(PhaseEvent::Collided);
        self.phase = next;
        if effect != Effect::EndRun {
            return;
        }
        self.best = self.best.max(self.score);
        report.sounds.push(SoundEvent::Crash);
        report.ended = Some(RunSummary {
            run: self.run,
            score: self.score,
            best: self.best,
            frames: self.frame,
            crash,
        });
        tracing::info!(
            run = self.run,
            score = self.score,
            best = self.best,
            frames = self.frame,
            ?crash,
            "run ended"
        );
    }

    // ── Read access ─────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            bird: self.bird,
            obstacles: self.obstacles.as_deque(),
            score: self.score,
            best: self.best,
            frame: self.frame,
            run: self.run,
            speed: self.difficulty.speed,
            config: &self.config,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bird(&self) -> Bird {
        self.bird
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut Obstacles {
        &mut self.obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn create_test_sim() -> Simulation<ChaCha8Rng> {
        Simulation::with_rng(GameConfig::default(), ChaCha8Rng::seed_from_u64(12345))
    }

    fn pipe(id: u64, x: f64, gap_top: u32) -> Obstacle {
        Obstacle {
            id,
            x,
            gap_top,
            scored: false,
        }
    }

    #[test]
    fn idle_does_not_tick() {
        let mut sim = create_test_sim();
        for _ in 0..10 {
            assert_eq!(sim.tick(), TickReport::default());
        }
        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.bird(), Bird::at_rest(300.0));
    }

    #[test]
    fn first_press_starts_and_jumps() {
        let mut sim = create_test_sim();
        sim.press();
        let report = sim.tick();

        assert_eq!(sim.phase(), Phase::Active);
        assert_eq!(report.sounds, vec![SoundEvent::Jump]);
        assert_eq!(sim.frame(), 1);
        assert_eq!(sim.bird().vy, -8.0 + 0.6);
        assert_eq!(sim.bird().y, 300.0 + (-8.0 + 0.6));
    }

    #[test]
    fn later_input_replaces_earlier() {
        let mut sim = create_test_sim();
        sim.press();
        sim.request_restart();
        sim.press();
        let report = sim.tick();
        assert_eq!(report.sounds, vec![SoundEvent::Jump]);
        assert_eq!(sim.run(), 1);
    }

    #[test]
    fn falls_to_the_ground_in_27_ticks() {
        let mut sim = create_test_sim();
        sim.start_run();

        let mut ticks = 0;
        let summary = loop {
            ticks += 1;
            if let Some(summary) = sim.tick().ended {
                break summary;
            }
            assert!(ticks < 1000, "run never ended");
        };

        assert_eq!(ticks, 27);
        assert_eq!(summary.crash, Crash::Ground);
        assert_eq!(summary.frames, 27);
        assert_eq!(sim.phase(), Phase::Ended);
    }

    #[test]
    fn gravity_integration_is_exact() {
        let mut sim = create_test_sim();
        sim.start_run();
        for _ in 0..20 {
            let before = sim.bird();
            sim.tick();
            let after = sim.bird();
            assert_eq!(after.vy, before.vy + 0.6);
            assert_eq!(after.y, before.y + after.vy);
        }
    }

    #[test]
    fn passing_an_obstacle_scores_once() {
        let mut sim = create_test_sim();
        sim.start_run();
        // Right edge at 50 is already behind the hitbox's left edge at 56.
        sim.obstacles_mut().push(pipe(1, 0.0, 200));

        let report = sim.tick();
        assert_eq!(report.sounds, vec![SoundEvent::Score]);
        assert_eq!(sim.score(), 1);

        for _ in 0..5 {
            let report = sim.tick();
            assert!(!report.sounds.contains(&SoundEvent::Score));
        }
        assert_eq!(sim.score(), 1);
    }

    #[test]
    fn crash_keeps_last_frame() {
        let mut sim = create_test_sim();
        sim.start_run();
        // Overlaps the hitbox with a gap far above the bird.
        sim.obstacles_mut().push(pipe(1, 60.0, 100));

        let report = sim.tick();
        let summary = report.ended.expect("should crash");
        assert_eq!(summary.crash, Crash::Obstacle(1));
        assert_eq!(report.sounds, vec![SoundEvent::Crash]);

        let snap = sim.snapshot();
        assert_eq!(snap.phase, Phase::Ended);
        assert_eq!(snap.obstacles.front().map(|o| o.x), Some(57.0));

        // Frozen from here on, and jumping doesn't restart.
        sim.press();
        assert_eq!(sim.tick(), TickReport::default());
        assert_eq!(sim.frame(), 1);
        assert_eq!(sim.obstacles_mut().iter().next().map(|o| o.x), Some(57.0));
    }

    #[test]
    fn crash_on_a_scoring_tick_does_not_score() {
        let mut sim = create_test_sim();
        sim.start_run();
        sim.obstacles_mut().push(pipe(1, 0.0, 200));
        sim.obstacles_mut().push(pipe(2, 60.0, 100));

        let summary = sim.tick().ended.expect("should crash");
        assert_eq!(summary.score, 0);
        assert_eq!(sim.score(), 0);
    }

    #[test]
    fn best_score_survives_restart() {
        let mut sim = create_test_sim();
        sim.start_run();
        sim.obstacles_mut().push(pipe(1, -20.0, 200));
        sim.obstacles_mut().push(pipe(2, 0.0, 200));
        while sim.tick().ended.is_none() {}
        assert_eq!(sim.score(), 2);
        assert_eq!(sim.best(), 2);

        sim.request_restart();
        let report = sim.tick();
        assert_eq!(report.sounds, vec![SoundEvent::Jump]);
        assert_eq!(sim.phase(), Phase::Active);
        assert_eq!(sim.run(), 2);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.best(), 2);
        assert_eq!(sim.frame(), 1);
        assert!(sim.snapshot().obstacles.is_empty());

        // A worse run leaves the best alone.
        while sim.tick().ended.is_none() {}
        assert_eq!(sim.best(), 2);
    }

    #[test]
    fn first_spawn_on_cadence_frame() {
        let mut sim = create_test_sim();
        sim.start_run();
        for _ in 0..99 {
            if sim.frame() % 26 == 0 {
                sim.press();
            }
            sim.tick();
            assert!(sim.snapshot().obstacles.is_empty());
        }
        sim.tick();
        let snap = sim.snapshot();
        assert_eq!(snap.obstacles.len(), 1);
        let spawned = &snap.obstacles[0];
        assert_eq!(spawned.id, 100);
        assert_eq!(spawned.x, 400.0 - 3.0);
    }

    #[test]
    fn expired_obstacle_is_gone_after_the_tick() {
        let mut sim = create_test_sim();
        sim.start_run();
        sim.obstacles_mut().push(pipe(1, -48.0, 200));
        sim.tick();
        assert!(sim.snapshot().obstacles.iter().all(|o| o.id != 1));
    }
}
