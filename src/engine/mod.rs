// The optimiser pipeline: points, SP accounting, validation, search.

pub mod optimiser;
pub mod points;
pub mod song;
pub mod sp;
pub mod summary;

pub use optimiser::{Activation, Optimiser, Path};
pub use points::{Point, PointSet};
pub use song::{ActResult, ActValidity, ActivationCandidate, ProcessedSong};
pub use sp::{SpBar, SpEngine, SP_GAIN_RATE};
pub use summary::path_summary;
