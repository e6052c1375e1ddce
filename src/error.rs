use std::io;

/// Invalid gameplay constants. These are programmer errors, caught once at
/// startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("spawn cadence must be at least one frame")]
    NonPositiveCadence,

    #[error("cadence floor {floor} is above the base cadence {base}")]
    CadenceFloorAboveBase { floor: u32, base: u32 },

    #[error("gravity must be positive, got {0}")]
    NonPositiveGravity(f64),

    #[error("jump velocity must point up (negative), got {0}")]
    JumpNotUpward(f64),

    #[error("speed settings must be positive")]
    InvalidSpeed,

    #[error("hitbox inset swallows the whole sprite")]
    HitboxTooSmall,

    #[error("gap needs {needed} units of sky but only {available} are available")]
    GapDoesNotFit { needed: f64, available: f64 },
}

/// Why a commentary request produced no text.
#[derive(Debug, thiserror::Error)]
pub enum CommentaryError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("could not decode response: {0}")]
    Decode(#[from] io::Error),

    #[error("service returned no text")]
    EmptyResponse,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid game configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not set up logging: {0}")]
    Logging(String),
}
