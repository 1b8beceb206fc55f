use std::ops::{Add, AddAssign, Mul, Sub};

use crate::model::track::SyncTrack;
use crate::util::error::PathingError;

/// Beats per measure in 4/4, and the tempo assumed before the first entry.
const DEFAULT_BEAT_RATE: f64 = 4.0;
const DEFAULT_BPM: f64 = 120.0;

/// Integer chart position in resolution units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u32);

impl Tick {
    pub fn to_beat(self, resolution: i32) -> Beat {
        Beat(f64::from(self.0) / f64::from(resolution))
    }
}

/// Chart position in beats (ticks divided by resolution).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Beat(pub f64);

impl Beat {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_measure(self, beat_rate: f64) -> Measure {
        Measure(self.0 / beat_rate)
    }

    pub fn to_second(self, bpm: f64) -> Second {
        Second(self.0 * 60.0 / bpm)
    }
}

impl Add for Beat {
    type Output = Beat;
    fn add(self, rhs: Beat) -> Beat {
        Beat(self.0 + rhs.0)
    }
}

impl Sub for Beat {
    type Output = Beat;
    fn sub(self, rhs: Beat) -> Beat {
        Beat(self.0 - rhs.0)
    }
}

impl Mul<f64> for Beat {
    type Output = Beat;
    fn mul(self, rhs: f64) -> Beat {
        Beat(self.0 * rhs)
    }
}

/// Chart position in measures, integrated under the time-signature map.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Measure(pub f64);

impl Measure {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_beat(self, beat_rate: f64) -> Beat {
        Beat(self.0 * beat_rate)
    }
}

impl Add for Measure {
    type Output = Measure;
    fn add(self, rhs: Measure) -> Measure {
        Measure(self.0 + rhs.0)
    }
}

impl Sub for Measure {
    type Output = Measure;
    fn sub(self, rhs: Measure) -> Measure {
        Measure(self.0 - rhs.0)
    }
}

impl Mul<f64> for Measure {
    type Output = Measure;
    fn mul(self, rhs: f64) -> Measure {
        Measure(self.0 * rhs)
    }
}

/// Wall-clock position in seconds, integrated under the tempo map.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Second(pub f64);

impl Second {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_beat(self, bpm: f64) -> Beat {
        Beat(self.0 * bpm / 60.0)
    }
}

impl Add for Second {
    type Output = Second;
    fn add(self, rhs: Second) -> Second {
        Second(self.0 + rhs.0)
    }
}

impl AddAssign for Second {
    fn add_assign(&mut self, rhs: Second) {
        self.0 += rhs.0;
    }
}

impl Sub for Second {
    type Output = Second;
    fn sub(self, rhs: Second) -> Second {
        Second(self.0 - rhs.0)
    }
}

/// A beat and its measure equivalent carried together, so hot paths never
/// re-run the conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub beat: Beat,
    pub measure: Measure,
}

impl Position {
    pub const ZERO: Position = Position {
        beat: Beat(0.0),
        measure: Measure(0.0),
    };

    pub const NEG_INFINITY: Position = Position {
        beat: Beat(f64::NEG_INFINITY),
        measure: Measure(f64::NEG_INFINITY),
    };

    pub const INFINITY: Position = Position {
        beat: Beat(f64::INFINITY),
        measure: Measure(f64::INFINITY),
    };
}

#[derive(Debug, Clone, Copy)]
struct MeasureAnchor {
    measure: Measure,
    beat: Beat,
}

#[derive(Debug, Clone, Copy)]
struct TempoAnchor {
    second: Second,
    beat: Beat,
}

/// Converts between beats, measures, and seconds under a piecewise-linear
/// tempo and time-signature map.
///
/// Anchors are precomputed at every time-signature change (for measures)
/// and tempo change (for seconds); lookups binary-search the bracketing
/// anchor and interpolate linearly. Past the last anchor the last-known
/// rate applies, before the first anchor the 4/4 and 120 BPM defaults do.
#[derive(Debug, Clone)]
pub struct TimeConverter {
    measure_anchors: Vec<MeasureAnchor>,
    tempo_anchors: Vec<TempoAnchor>,
    last_beat_rate: f64,
    last_bpm: f64,
}

impl TimeConverter {
    pub fn new(sync_track: &SyncTrack, resolution: i32) -> Result<Self, PathingError> {
        if resolution <= 0 {
            return Err(PathingError::NonPositiveResolution(resolution));
        }
        let resolution = f64::from(resolution);

        let mut measure_anchors = Vec::with_capacity(sync_track.time_sigs().len());
        let mut last_tick = 0.0;
        let mut last_beat_rate = DEFAULT_BEAT_RATE;
        let mut last_measure = 0.0;
        for ts in sync_track.time_sigs() {
            let tick = f64::from(ts.position.0);
            last_measure += (tick - last_tick) / (resolution * last_beat_rate);
            measure_anchors.push(MeasureAnchor {
                measure: Measure(last_measure),
                beat: Beat(tick / resolution),
            });
            last_beat_rate = f64::from(ts.numerator) * DEFAULT_BEAT_RATE / f64::from(ts.denominator);
            last_tick = tick;
        }

        let mut tempo_anchors = Vec::with_capacity(sync_track.bpms().len());
        let mut last_tick = 0.0;
        let mut last_bpm = DEFAULT_BPM;
        let mut last_second = 0.0;
        for bpm in sync_track.bpms() {
            let tick = f64::from(bpm.position.0);
            last_second += (tick - last_tick) * 60.0 / (resolution * last_bpm);
            tempo_anchors.push(TempoAnchor {
                second: Second(last_second),
                beat: Beat(tick / resolution),
            });
            last_bpm = f64::from(bpm.millibpm) / 1000.0;
            last_tick = tick;
        }

        Ok(Self {
            measure_anchors,
            tempo_anchors,
            last_beat_rate,
            last_bpm,
        })
    }

    /// Pairs a beat with its measure equivalent.
    pub fn position(&self, beat: Beat) -> Position {
        Position {
            beat,
            measure: self.beats_to_measures(beat),
        }
    }

    pub fn beats_to_measures(&self, beats: Beat) -> Measure {
        let anchors = &self.measure_anchors;
        let pos = anchors.partition_point(|a| a.beat < beats);
        if pos == anchors.len() {
            let back = anchors[pos - 1];
            return back.measure + (beats - back.beat).to_measure(self.last_beat_rate);
        }
        if pos == 0 {
            let front = anchors[0];
            return front.measure - (front.beat - beats).to_measure(DEFAULT_BEAT_RATE);
        }
        let prev = anchors[pos - 1];
        let next = anchors[pos];
        prev.measure
            + (next.measure - prev.measure)
                * ((beats - prev.beat).value() / (next.beat - prev.beat).value())
    }

    pub fn measures_to_beats(&self, measures: Measure) -> Beat {
        let anchors = &self.measure_anchors;
        let pos = anchors.partition_point(|a| a.measure < measures);
        if pos == anchors.len() {
            let back = anchors[pos - 1];
            return back.beat + (measures - back.measure).to_beat(self.last_beat_rate);
        }
        if pos == 0 {
            let front = anchors[0];
            return front.beat - (front.measure - measures).to_beat(DEFAULT_BEAT_RATE);
        }
        let prev = anchors[pos - 1];
        let next = anchors[pos];
        prev.beat
            + (next.beat - prev.beat)
                * ((measures - prev.measure).value() / (next.measure - prev.measure).value())
    }

    pub fn beats_to_seconds(&self, beats: Beat) -> Second {
        let anchors = &self.tempo_anchors;
        let pos = anchors.partition_point(|a| a.beat < beats);
        if pos == anchors.len() {
            let back = anchors[pos - 1];
            return back.second + (beats - back.beat).to_second(self.last_bpm);
        }
        if pos == 0 {
            let front = anchors[0];
            return front.second - (front.beat - beats).to_second(DEFAULT_BPM);
        }
        let prev = anchors[pos - 1];
        let next = anchors[pos];
        Second(
            prev.second.value()
                + (next.second - prev.second).value()
                    * ((beats - prev.beat).value() / (next.beat - prev.beat).value()),
        )
    }

    pub fn seconds_to_beats(&self, seconds: Second) -> Beat {
        let anchors = &self.tempo_anchors;
        let pos = anchors.partition_point(|a| a.second < seconds);
        if pos == anchors.len() {
            let back = anchors[pos - 1];
            return back.beat + (seconds - back.second).to_beat(self.last_bpm);
        }
        if pos == 0 {
            let front = anchors[0];
            return front.beat - (front.second - seconds).to_beat(DEFAULT_BPM);
        }
        let prev = anchors[pos - 1];
        let next = anchors[pos];
        prev.beat
            + (next.beat - prev.beat)
                * ((seconds - prev.second).value() / (next.second - prev.second).value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track::{Bpm, SyncTrack, TimeSignature};

    fn sync(time_sigs: Vec<TimeSignature>, bpms: Vec<Bpm>) -> SyncTrack {
        SyncTrack::new(time_sigs, bpms).expect("sync track should be valid")
    }

    #[test]
    fn beats_to_seconds_follows_tempo_changes() {
        let track = sync(
            vec![],
            vec![
                Bpm {
                    position: Tick(0),
                    millibpm: 120_000,
                },
                Bpm {
                    position: Tick(768),
                    millibpm: 240_000,
                },
            ],
        );
        let converter = TimeConverter::new(&track, 192).unwrap();

        // 4 beats at 120 BPM, then half-second beats.
        assert!((converter.beats_to_seconds(Beat(2.0)).value() - 1.0).abs() < 1e-9);
        assert!((converter.beats_to_seconds(Beat(4.0)).value() - 2.0).abs() < 1e-9);
        assert!((converter.beats_to_seconds(Beat(6.0)).value() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn beats_to_measures_follows_time_signatures() {
        let track = sync(
            vec![
                TimeSignature {
                    position: Tick(0),
                    numerator: 4,
                    denominator: 4,
                },
                TimeSignature {
                    position: Tick(768),
                    numerator: 3,
                    denominator: 4,
                },
            ],
            vec![],
        );
        let converter = TimeConverter::new(&track, 192).unwrap();

        assert!((converter.beats_to_measures(Beat(4.0)).value() - 1.0).abs() < 1e-9);
        assert!((converter.beats_to_measures(Beat(7.0)).value() - 2.0).abs() < 1e-9);
        assert!((converter.beats_to_measures(Beat(10.0)).value() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn measure_conversions_are_mutual_inverses() {
        let track = sync(
            vec![
                TimeSignature {
                    position: Tick(0),
                    numerator: 4,
                    denominator: 4,
                },
                TimeSignature {
                    position: Tick(960),
                    numerator: 7,
                    denominator: 8,
                },
                TimeSignature {
                    position: Tick(1920),
                    numerator: 3,
                    denominator: 4,
                },
            ],
            vec![],
        );
        let converter = TimeConverter::new(&track, 192).unwrap();

        for beat in [-1.0, 0.0, 2.5, 5.0, 7.75, 10.0, 25.0] {
            let round_trip = converter
                .measures_to_beats(converter.beats_to_measures(Beat(beat)))
                .value();
            assert!(
                (round_trip - beat).abs() < 1e-9,
                "beat {beat} round-tripped to {round_trip}"
            );
        }
    }

    #[test]
    fn conversions_before_tick_zero_use_defaults() {
        let track = sync(vec![], vec![]);
        let converter = TimeConverter::new(&track, 192).unwrap();

        assert!((converter.beats_to_measures(Beat(-2.0)).value() + 0.5).abs() < 1e-9);
        assert!((converter.beats_to_seconds(Beat(-2.0)).value() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let track = sync(vec![], vec![]);
        assert!(matches!(
            TimeConverter::new(&track, 0),
            Err(PathingError::NonPositiveResolution(0))
        ));
    }
}
