// Data models for charts, timing, and the sync track.

pub mod time;
pub mod track;

pub use time::{Beat, Measure, Position, Second, Tick, TimeConverter};
pub use track::{
    Bpm, ChartEvent, Colour, Difficulty, DrumColour, FiveFretColour, Instrument, Note, NoteTrack,
    SixFretColour, Solo, StarPower, SyncTrack, TimeSignature, TrackKind,
};
