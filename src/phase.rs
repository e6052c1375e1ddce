/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for the first jump. Nothing moves.
    #[default]
    Idle,
    Active,
    /// Crashed. The last frame is kept for display until a restart.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The jump/start key.
    Activate,
    /// Explicit "play again".
    Restart,
    Collided,
}

/// What the simulation has to do as a result of a phase event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Reset all run state, enter `Active`, then jump.
    StartRun,
    Jump,
    /// Freeze the run and settle the best score.
    EndRun,
    None,
}

impl Phase {
    pub fn on(self, event: PhaseEvent) -> (Phase, Effect) {
        use Phase::*;
        use PhaseEvent::*;

        match (self, event) {
            (Idle, Activate | Restart) => (Active, Effect::StartRun),
            (Active, Activate) => (Active, Effect::Jump),
            (Active, Collided) => (Ended, Effect::EndRun),
            (Ended, Restart) => (Active, Effect::StartRun),
            // Mashing jump through the crash shouldn't throw the result away.
            (Ended, Activate) => (Ended, Effect::None),
            (Active, Restart) => (Active, Effect::None),
            (Idle | Ended, Collided) => (self, Effect::None),
        }
    }

    pub fn is_active(self) -> bool {
        self == Phase::Active
    }
}
