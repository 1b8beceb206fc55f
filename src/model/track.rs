use crate::model::time::Tick;
use crate::util::error::PathingError;

/// Fret colours for five-fret guitar and bass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FiveFretColour {
    Green,
    Red,
    Yellow,
    Blue,
    Orange,
    Open,
}

/// Fret colours for the six-button (GHL) fret space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SixFretColour {
    Open,
    WhiteLow,
    WhiteMid,
    WhiteHigh,
    BlackLow,
    BlackMid,
    BlackHigh,
}

/// Drum pads and the kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrumColour {
    Red,
    Yellow,
    Blue,
    Green,
    Kick,
}

/// A note colour tagged with its instrument family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Colour {
    FiveFret(FiveFretColour),
    SixFret(SixFretColour),
    Drums(DrumColour),
}

impl Colour {
    pub fn kind(self) -> TrackKind {
        match self {
            Colour::FiveFret(_) => TrackKind::FiveFret,
            Colour::SixFret(_) => TrackKind::SixFret,
            Colour::Drums(_) => TrackKind::Drums,
        }
    }
}

/// Instrument family a track belongs to. Drums emit no hold points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    FiveFret,
    SixFret,
    Drums,
}

/// Difficulty selector used by hosts to pick which track to feed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Instrument selector used by hosts to pick which track to feed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Guitar,
    Bass,
    GhlGuitar,
    GhlBass,
    Drums,
}

impl Instrument {
    pub fn track_kind(self) -> TrackKind {
        match self {
            Instrument::Guitar | Instrument::Bass => TrackKind::FiveFret,
            Instrument::GhlGuitar | Instrument::GhlBass => TrackKind::SixFret,
            Instrument::Drums => TrackKind::Drums,
        }
    }
}

/// A charted note. `length` is in ticks; zero means the note has no sustain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub position: Tick,
    pub length: u32,
    pub colour: Colour,
    pub is_forced: bool,
    pub is_tap: bool,
}

/// A Star Power phrase covering the half-open tick range
/// `[position, position + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarPower {
    pub position: Tick,
    pub length: u32,
}

impl StarPower {
    pub fn contains(&self, tick: Tick) -> bool {
        tick >= self.position && tick.0 < self.position.0 + self.length
    }
}

/// A named chart event the optimiser carries through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEvent {
    pub position: Tick,
    pub name: String,
}

/// A solo section with its precomputed bonus, awarded at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solo {
    pub start: Tick,
    pub end: Tick,
    pub value: u32,
}

/// The note data for one difficulty of one instrument.
///
/// Construction establishes the invariants the rest of the crate relies
/// on: notes stably sorted by `(tick, colour)` with `(tick, colour)`
/// duplicates collapsed to the last occurrence, phrases and solos sorted
/// by tick, and a positive resolution.
#[derive(Debug, Clone)]
pub struct NoteTrack {
    kind: TrackKind,
    notes: Vec<Note>,
    sp_phrases: Vec<StarPower>,
    solos: Vec<Solo>,
    events: Vec<ChartEvent>,
    resolution: i32,
}

impl NoteTrack {
    pub fn new(
        kind: TrackKind,
        mut notes: Vec<Note>,
        mut sp_phrases: Vec<StarPower>,
        mut solos: Vec<Solo>,
        events: Vec<ChartEvent>,
        resolution: i32,
    ) -> Result<Self, PathingError> {
        if resolution <= 0 {
            return Err(PathingError::NonPositiveResolution(resolution));
        }
        if let Some(note) = notes.iter().find(|n| n.colour.kind() != kind) {
            return Err(PathingError::ColourMismatch {
                tick: note.position.0,
            });
        }

        notes.sort_by_key(|n| (n.position, n.colour));
        notes.dedup_by(|later, earlier| {
            if later.position == earlier.position && later.colour == earlier.colour {
                *earlier = *later;
                true
            } else {
                false
            }
        });

        sp_phrases.sort_by_key(|p| p.position);
        solos.sort_by_key(|s| s.start);

        Ok(Self {
            kind,
            notes,
            sp_phrases,
            solos,
            events,
            resolution,
        })
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn sp_phrases(&self) -> &[StarPower] {
        &self.sp_phrases
    }

    pub fn solos(&self) -> &[Solo] {
        &self.solos
    }

    pub fn events(&self) -> &[ChartEvent] {
        &self.events
    }

    pub fn resolution(&self) -> i32 {
        self.resolution
    }
}

/// A time-signature change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub position: Tick,
    pub numerator: u32,
    pub denominator: u32,
}

/// A tempo change, in thousandths of a BPM (`120 BPM == 120_000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bpm {
    pub position: Tick,
    pub millibpm: u32,
}

pub const DEFAULT_MILLIBPM: u32 = 120_000;

/// The tempo and time-signature map for a song.
///
/// Both sequences are kept sorted by tick; a missing entry at tick 0 is
/// filled in with the 4/4 and 120 BPM defaults.
#[derive(Debug, Clone)]
pub struct SyncTrack {
    time_sigs: Vec<TimeSignature>,
    bpms: Vec<Bpm>,
}

impl SyncTrack {
    pub fn new(
        mut time_sigs: Vec<TimeSignature>,
        mut bpms: Vec<Bpm>,
    ) -> Result<Self, PathingError> {
        time_sigs.sort_by_key(|ts| ts.position);
        bpms.sort_by_key(|b| b.position);

        if let Some(pair) = time_sigs.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(PathingError::NonMonotonicSync {
                kind: "time signature",
                tick: pair[1].position.0,
            });
        }
        if let Some(pair) = bpms.windows(2).find(|w| w[0].position == w[1].position) {
            return Err(PathingError::NonMonotonicSync {
                kind: "tempo",
                tick: pair[1].position.0,
            });
        }
        if let Some(ts) = time_sigs
            .iter()
            .find(|ts| ts.numerator == 0 || ts.denominator == 0)
        {
            return Err(PathingError::DegenerateTimeSignature {
                tick: ts.position.0,
            });
        }

        if time_sigs.first().map(|ts| ts.position) != Some(Tick(0)) {
            time_sigs.insert(
                0,
                TimeSignature {
                    position: Tick(0),
                    numerator: 4,
                    denominator: 4,
                },
            );
        }
        if bpms.first().map(|b| b.position) != Some(Tick(0)) {
            bpms.insert(
                0,
                Bpm {
                    position: Tick(0),
                    millibpm: DEFAULT_MILLIBPM,
                },
            );
        }

        Ok(Self { time_sigs, bpms })
    }

    pub fn time_sigs(&self) -> &[TimeSignature] {
        &self.time_sigs
    }

    pub fn bpms(&self) -> &[Bpm] {
        &self.bpms
    }

    /// Returns a copy with every tempo scaled by `percent / 100`, the
    /// "speed" knob applied before any conversion tables are built.
    pub fn with_speed(&self, percent: u32) -> Result<SyncTrack, PathingError> {
        if percent == 0 {
            return Err(PathingError::ZeroSpeed(percent));
        }
        let bpms = self
            .bpms
            .iter()
            .map(|b| Bpm {
                position: b.position,
                millibpm: (u64::from(b.millibpm) * u64::from(percent) / 100) as u32,
            })
            .collect();
        Ok(SyncTrack {
            time_sigs: self.time_sigs.clone(),
            bpms,
        })
    }
}
