//! Star Power path optimisation for charted rhythm-game songs.
//!
//! Given a note track, a sync track, and tolerance settings, the crate
//! computes the sequence of non-overlapping Star Power activations that
//! maximises the score bonus, plus a textual summary. Parsing and
//! rendering are the embedding host's concern; the inputs here are
//! already-validated models.

pub mod config;
pub mod engine;
pub mod model;
pub mod util;

pub use config::SqueezeSettings;
pub use engine::{
    path_summary, ActResult, ActValidity, Activation, ActivationCandidate, Optimiser, Path,
    Point, PointSet, ProcessedSong, SpBar, SpEngine,
};
pub use model::{
    Beat, Bpm, ChartEvent, Colour, Difficulty, DrumColour, FiveFretColour, Instrument, Measure,
    Note, NoteTrack, Position, Second, SixFretColour, Solo, StarPower, SyncTrack, Tick,
    TimeConverter, TimeSignature, TrackKind,
};
pub use util::PathingError;
