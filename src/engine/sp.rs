use crate::model::time::{Beat, Position, Second, TimeConverter};
use crate::model::track::{NoteTrack, SyncTrack};
use crate::util::error::PathingError;

/// SP gained per beat of whammy.
pub const SP_GAIN_RATE: f64 = 1.0 / 30.0;
/// One full bar lasts eight measures.
pub const MEASURES_PER_BAR: f64 = 8.0;
/// Net rate while whammying in 4/4, used before the first time signature.
const DEFAULT_NET_SP_GAIN_RATE: f64 = 1.0 / 480.0;
const DEFAULT_BEAT_RATE: f64 = 4.0;

/// The minimum and maximum SP possible at a given time, as fractions of a
/// full bar. The spread comes from player choices the optimiser does not
/// control: how much of the available whammy is actually collected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpBar {
    pub min: f64,
    pub max: f64,
}

impl SpBar {
    pub const SP_PHRASE_AMOUNT: f64 = 0.25;
    pub const MINIMUM_SP_AMOUNT: f64 = 0.5;

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn add_phrase(&mut self) {
        self.min = (self.min + Self::SP_PHRASE_AMOUNT).min(1.0);
        self.max = (self.max + Self::SP_PHRASE_AMOUNT).min(1.0);
    }

    pub fn full_enough_to_activate(&self) -> bool {
        self.max >= Self::MINIMUM_SP_AMOUNT
    }
}

#[derive(Debug, Clone, Copy)]
struct BeatRate {
    position: Beat,
    net_sp_gain_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct WhammyRange {
    start: Position,
    end: Position,
}

/// Tracks where whammy can be gained and how fast SP drains, and
/// integrates an SP balance forward through a region.
///
/// SP saturates at 1.0 on the way up but is not floored on the way down
/// during forward integration; a negative balance is how exhaustion is
/// detected.
#[derive(Debug)]
pub struct SpEngine {
    converter: TimeConverter,
    beat_rates: Vec<BeatRate>,
    whammy_ranges: Vec<WhammyRange>,
}

impl SpEngine {
    pub fn new(
        track: &NoteTrack,
        sync_track: &SyncTrack,
        early_whammy: f64,
        lazy_whammy: Second,
    ) -> Result<Self, PathingError> {
        let resolution = track.resolution();
        let converter = TimeConverter::new(sync_track, resolution)?;
        let beat_rates = Self::form_beat_rates(resolution, sync_track);

        let early_timing_window = Second(0.07 * early_whammy);

        let mut ranges: Vec<(Beat, Beat)> = Vec::new();
        for note in track.notes() {
            if note.length == 0 {
                continue;
            }
            if !track
                .sp_phrases()
                .iter()
                .any(|phrase| phrase.contains(note.position))
            {
                continue;
            }

            let head = note.position.to_beat(resolution);
            let mut start_second = converter.beats_to_seconds(head);
            start_second = start_second - early_timing_window + lazy_whammy;
            let start = converter.seconds_to_beats(start_second);
            let end = Beat(f64::from(note.position.0 + note.length) / f64::from(resolution));
            if start < end {
                ranges.push((start, end));
            }
        }

        ranges.sort_by(|a, b| {
            a.0.value()
                .total_cmp(&b.0.value())
                .then(a.1.value().total_cmp(&b.1.value()))
        });

        let mut whammy_ranges = Vec::with_capacity(ranges.len());
        let mut merged: Vec<(Beat, Beat)> = Vec::new();
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, last_end)) if start <= *last_end => {
                    if end > *last_end {
                        *last_end = end;
                    }
                }
                _ => merged.push((start, end)),
            }
        }
        for (start, end) in merged {
            whammy_ranges.push(WhammyRange {
                start: converter.position(start),
                end: converter.position(end),
            });
        }

        Ok(Self {
            converter,
            beat_rates,
            whammy_ranges,
        })
    }

    fn form_beat_rates(resolution: i32, sync_track: &SyncTrack) -> Vec<BeatRate> {
        sync_track
            .time_sigs()
            .iter()
            .map(|ts| {
                let position = Beat(f64::from(ts.position.0) / f64::from(resolution));
                let measure_rate =
                    f64::from(ts.numerator) * DEFAULT_BEAT_RATE / f64::from(ts.denominator);
                BeatRate {
                    position,
                    net_sp_gain_rate: SP_GAIN_RATE - 1.0 / (MEASURES_PER_BAR * measure_rate),
                }
            })
            .collect()
    }

    /// Maximum SP left at `end` after propagating from `start`, assuming
    /// every whammyable beat is whammied. Negative means SP ran out.
    pub fn propagate_sp_over_whammy_max(&self, mut start: Position, end: Position, mut sp: f64) -> f64 {
        let mut i = self
            .whammy_ranges
            .partition_point(|r| r.end.beat.value() <= start.beat.value());
        while i < self.whammy_ranges.len() && self.whammy_ranges[i].start.beat < end.beat {
            let range = self.whammy_ranges[i];
            if range.start.beat > start.beat {
                let meas_diff = range.start.measure - start.measure;
                sp -= meas_diff.value() / MEASURES_PER_BAR;
                if sp < 0.0 {
                    return sp;
                }
                start = range.start;
            }
            let range_end = if end.beat < range.end.beat {
                end.beat
            } else {
                range.end.beat
            };
            sp = self.propagate_over_whammy_range(start.beat, range_end, sp);
            if sp < 0.0 || range.end.beat >= end.beat {
                return sp;
            }
            start = range.end;
            i += 1;
        }

        let meas_diff = end.measure - start.measure;
        sp - meas_diff.value() / MEASURES_PER_BAR
    }

    /// Minimum SP left at `end`: whammy is only credited up to
    /// `required_whammy_end` (the earliest the player may stop), bare
    /// drain applies beyond it. Clamped to zero.
    pub fn propagate_sp_over_whammy_min(
        &self,
        mut start: Position,
        end: Position,
        mut sp: f64,
        required_whammy_end: Position,
    ) -> f64 {
        if required_whammy_end.beat > start.beat {
            let whammy_end = if required_whammy_end.beat < end.beat {
                required_whammy_end
            } else {
                end
            };
            sp = self.propagate_sp_over_whammy_max(start, whammy_end, sp);
            start = required_whammy_end;
        }
        if start.beat < end.beat {
            let meas_diff = end.measure - start.measure;
            sp -= meas_diff.value() / MEASURES_PER_BAR;
        }
        sp.max(0.0)
    }

    /// SP after whammying the whole of `[start, end)`, using the
    /// signature-dependent net rate per segment. Returns -1.0 on
    /// exhaustion.
    fn propagate_over_whammy_range(&self, mut start: Beat, end: Beat, mut sp: f64) -> f64 {
        let rates = &self.beat_rates;
        let mut i = rates.partition_point(|r| r.position < start);
        if i > 0 {
            i -= 1;
        } else {
            let subrange_end = if end < rates[0].position {
                end
            } else {
                rates[0].position
            };
            sp += (subrange_end - start).value() * DEFAULT_NET_SP_GAIN_RATE;
            sp = sp.min(1.0);
            start = subrange_end;
        }
        while start < end {
            let subrange_end = if i + 1 < rates.len() && rates[i + 1].position < end {
                rates[i + 1].position
            } else {
                end
            };
            sp += (subrange_end - start).value() * rates[i].net_sp_gain_rate;
            if sp < 0.0 {
                return -1.0;
            }
            sp = sp.min(1.0);
            start = subrange_end;
            i += 1;
        }
        sp
    }

    /// Beat at which SP runs out if all of `[start, end)` is whammied,
    /// or `end` if it survives.
    fn whammy_propagation_endpoint(&self, mut start: Beat, end: Beat, mut sp: f64) -> Beat {
        let rates = &self.beat_rates;
        let mut i = rates.partition_point(|r| r.position < start);
        if i > 0 {
            i -= 1;
        } else {
            let subrange_end = if end < rates[0].position {
                end
            } else {
                rates[0].position
            };
            sp += (subrange_end - start).value() * DEFAULT_NET_SP_GAIN_RATE;
            sp = sp.min(1.0);
            start = subrange_end;
        }
        while start < end {
            let subrange_end = if i + 1 < rates.len() && rates[i + 1].position < end {
                rates[i + 1].position
            } else {
                end
            };
            let sp_gain = (subrange_end - start).value() * rates[i].net_sp_gain_rate;
            if sp + sp_gain < 0.0 {
                return start + Beat(-sp / rates[i].net_sp_gain_rate);
            }
            sp += sp_gain;
            sp = sp.min(1.0);
            start = subrange_end;
            i += 1;
        }
        end
    }

    /// Earliest position at which SP hits zero while propagating from
    /// `start`, or `end` when it survives the whole way.
    pub fn activation_end_point(&self, mut start: Position, end: Position, mut sp: f64) -> Position {
        let mut i = self
            .whammy_ranges
            .partition_point(|r| r.end.beat.value() <= start.beat.value());
        while i < self.whammy_ranges.len() && self.whammy_ranges[i].start.beat < end.beat {
            let range = self.whammy_ranges[i];
            if range.start.beat > start.beat {
                let meas_diff = range.start.measure - start.measure;
                let deduction = meas_diff.value() / MEASURES_PER_BAR;
                if sp < deduction {
                    let end_measure = start.measure + crate::model::time::Measure(sp * MEASURES_PER_BAR);
                    let end_beat = self.converter.measures_to_beats(end_measure);
                    return Position {
                        beat: end_beat,
                        measure: end_measure,
                    };
                }
                sp -= deduction;
                start = range.start;
            }
            let range_end = if end.beat < range.end.beat {
                end.beat
            } else {
                range.end.beat
            };
            let propagated = self.propagate_over_whammy_range(start.beat, range_end, sp);
            if propagated < 0.0 {
                let end_beat = self.whammy_propagation_endpoint(start.beat, end.beat, sp);
                return self.converter.position(end_beat);
            }
            sp = propagated;
            if range.end.beat >= end.beat {
                return end;
            }
            start = range.end;
            i += 1;
        }

        let meas_diff = end.measure - start.measure;
        let deduction = meas_diff.value() / MEASURES_PER_BAR;
        if sp < deduction {
            let end_measure = start.measure + crate::model::time::Measure(sp * MEASURES_PER_BAR);
            let end_beat = self.converter.measures_to_beats(end_measure);
            return Position {
                beat: end_beat,
                measure: end_measure,
            };
        }
        end
    }

    /// Whammy obtainable across `[start, end)`, in SP.
    pub fn available_whammy(&self, start: Beat, end: Beat) -> f64 {
        let mut total = 0.0;
        let from = self
            .whammy_ranges
            .partition_point(|r| r.end.beat.value() <= start.value());
        for range in &self.whammy_ranges[from..] {
            if range.start.beat >= end {
                break;
            }
            let whammy_start = if range.start.beat > start {
                range.start.beat
            } else {
                start
            };
            let whammy_end = if range.end.beat < end {
                range.end.beat
            } else {
                end
            };
            total += (whammy_end - whammy_start).value() * SP_GAIN_RATE;
        }
        total
    }

    pub fn is_in_whammy_ranges(&self, beat: Beat) -> bool {
        let i = self
            .whammy_ranges
            .partition_point(|r| r.end.beat < beat);
        match self.whammy_ranges.get(i) {
            Some(range) => range.start.beat <= beat,
            None => false,
        }
    }
}
