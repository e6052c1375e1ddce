//! Frame pacing and the start/stop switch around the tick.

use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::sim::{Simulation, TickReport};

/// Fixed-rate frame clock. Sleeps off whatever is left of the frame after
/// update and render.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_dur: Duration,
    frame_start: Instant,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            frame_dur: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            frame_start: Instant::now(),
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_dur
    }

    /// Time left in the current frame.
    pub fn remaining(&self) -> Duration {
        self.frame_dur.saturating_sub(self.frame_start.elapsed())
    }

    /// Blocks until the frame is over and starts the next one.
    pub fn wait(&mut self) {
        let left = self.remaining();
        if !left.is_zero() {
            thread::sleep(left);
        }
        self.frame_start = Instant::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Running,
    Stopped,
}

/// Calls [`Simulation::tick`] once per display refresh until stopped. Once
/// stopped no further tick runs, so nothing after [`Driver::stop`] can see
/// a half-applied update.
#[derive(Debug)]
pub struct Driver {
    clock: FrameClock,
    state: DriverState,
    ticks: u64,
}

impl Driver {
    pub fn new(fps: u32) -> Self {
        Self {
            clock: FrameClock::new(fps),
            state: DriverState::Stopped,
            ticks: 0,
        }
    }

    pub fn start(&mut self) {
        self.state = DriverState::Running;
        self.clock = FrameClock::new(self.fps());
    }

    pub fn stop(&mut self) {
        if self.state == DriverState::Running {
            tracing::debug!(ticks = self.ticks, "driver stopped");
        }
        self.state = DriverState::Stopped;
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Ticks driven since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Runs one tick if the driver is running.
    pub fn pump<R: Rng>(&mut self, sim: &mut Simulation<R>) -> Option<TickReport> {
        if !self.is_running() {
            return None;
        }
        self.ticks += 1;
        Some(sim.tick())
    }

    /// Sleeps until the next display refresh.
    pub fn pace(&mut self) {
        self.clock.wait();
    }

    fn fps(&self) -> u32 {
        (1.0 / self.clock.frame_duration().as_secs_f64()).round() as u32
    }
}
