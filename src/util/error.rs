use thiserror::Error;

/// Errors reported while building the optimiser's input models.
///
/// Everything else the crate can express (an unusable activation, a song
/// with no Star Power at all) is an ordinary return value, not an error.
#[derive(Debug, Error)]
pub enum PathingError {
    #[error("resolution must be positive, got {0}")]
    NonPositiveResolution(i32),

    #[error("{kind} ticks must be strictly increasing (offending tick {tick})")]
    NonMonotonicSync { kind: &'static str, tick: u32 },

    #[error("time signature at tick {tick} has a zero numerator or denominator")]
    DegenerateTimeSignature { tick: u32 },

    #[error("note colour does not match the track kind at tick {tick}")]
    ColourMismatch { tick: u32 },

    #[error("{name} must lie in [0, 1], got {value}")]
    ToleranceOutOfRange { name: &'static str, value: f64 },

    #[error("lazy whammy must be non-negative, got {0}")]
    NegativeLazyWhammy(f64),

    #[error("speed must be positive, got {0}%")]
    ZeroSpeed(u32),
}
