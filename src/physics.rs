/// The player's sprite. Only the vertical axis moves; the horizontal
/// position is fixed by [`GameConfig::bird_x`](crate::config::GameConfig).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bird {
    /// Top of the sprite, world units from the top of the screen.
    pub y: f64,
    /// Positive is down.
    pub vy: f64,
}

impl Bird {
    pub fn at_rest(y: f64) -> Self {
        Self { y, vy: 0.0 }
    }

    /// Overrides the current velocity. Applied before integration.
    pub fn jump(&mut self, jump_velocity: f64) {
        self.vy = jump_velocity;
    }

    /// Semi-implicit Euler: velocity first, then position with the new
    /// velocity. No clamping; bounds are the collision check's job.
    pub fn step(&mut self, gravity: f64) {
        self.vy += gravity;
        self.y += self.vy;
    }
}
