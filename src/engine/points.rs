use crate::model::time::{Position, Second, TimeConverter};
use crate::model::track::{NoteTrack, TrackKind};

const BASE_NOTE_VALUE: u32 = 50;
const BASE_HOLD_VALUE: u32 = 1;

/// Half-width of a note's timing window at full squeeze, in seconds.
pub const HIT_WINDOW_HALF_WIDTH_S: f64 = 0.07;

/// A scoring atom: a note head (one per chord) or a sustain tick.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub position: Position,
    pub hit_window_start: Position,
    pub hit_window_end: Position,
    pub value: u32,
    pub base_value: u32,
    pub is_hold_point: bool,
    pub is_sp_granting_note: bool,
}

/// The ordered scoring points of a track, with the lookup tables the
/// optimiser runs on.
///
/// Points are referred to by index; indices stay valid for the lifetime
/// of the set.
#[derive(Debug)]
pub struct PointSet {
    points: Vec<Point>,
    next_non_hold_point: Vec<usize>,
    next_sp_granting_note: Vec<usize>,
    cumulative_score_totals: Vec<u32>,
    solo_boosts: Vec<(Position, u32)>,
}

impl PointSet {
    pub fn new(track: &NoteTrack, converter: &TimeConverter, squeeze: f64) -> Self {
        let resolution = track.resolution();
        let hold_gap = (resolution / 16).max(1) as u32;
        let emit_holds = track.kind() != TrackKind::Drums;

        // (tick, point) pairs; hold points of one chord may interleave
        // with later chords, so everything is collected then sorted.
        let mut staged: Vec<(u32, Point)> = Vec::new();

        let notes = track.notes();
        let mut i = 0;
        while i < notes.len() {
            let chord_tick = notes[i].position;
            let mut j = i;
            let mut max_length = 0;
            while j < notes.len() && notes[j].position == chord_tick {
                max_length = max_length.max(notes[j].length);
                j += 1;
            }
            let chord_size = (j - i) as u32;

            let beat = chord_tick.to_beat(resolution);
            let position = converter.position(beat);
            let early = converter.beats_to_seconds(beat)
                - Second(HIT_WINDOW_HALF_WIDTH_S * squeeze);
            let late = converter.beats_to_seconds(beat)
                + Second(HIT_WINDOW_HALF_WIDTH_S * squeeze);
            staged.push((
                chord_tick.0,
                Point {
                    position,
                    hit_window_start: converter.position(converter.seconds_to_beats(early)),
                    hit_window_end: converter.position(converter.seconds_to_beats(late)),
                    value: 0,
                    base_value: BASE_NOTE_VALUE * chord_size,
                    is_hold_point: false,
                    is_sp_granting_note: false,
                },
            ));

            if emit_holds && max_length > 0 {
                let mut tick = chord_tick.0 + hold_gap;
                while tick <= chord_tick.0 + max_length {
                    let hold_position =
                        converter.position(crate::model::time::Tick(tick).to_beat(resolution));
                    staged.push((
                        tick,
                        Point {
                            position: hold_position,
                            hit_window_start: hold_position,
                            hit_window_end: hold_position,
                            value: 0,
                            base_value: BASE_HOLD_VALUE,
                            is_hold_point: true,
                            is_sp_granting_note: false,
                        },
                    ));
                    tick += hold_gap;
                }
            }

            i = j;
        }

        staged.sort_by_key(|(tick, _)| *tick);

        // Multiplier pass: every point scores at the multiplier reached
        // before it, hold points read the counter without advancing it.
        let mut hits = 0u32;
        for (_, point) in &mut staged {
            let multiplier = 1 + (hits / 10).min(3);
            point.value = point.base_value * multiplier;
            if !point.is_hold_point {
                hits += 1;
            }
        }

        // The last non-hold point inside each phrase grants SP.
        for phrase in track.sp_phrases() {
            let start = staged.partition_point(|(tick, _)| *tick < phrase.position.0);
            let end =
                staged.partition_point(|(tick, _)| *tick < phrase.position.0 + phrase.length);
            if let Some((_, point)) = staged[start..end]
                .iter_mut()
                .rev()
                .find(|(_, p)| !p.is_hold_point)
            {
                point.is_sp_granting_note = true;
            }
        }

        let points: Vec<Point> = staged.into_iter().map(|(_, p)| p).collect();
        let len = points.len();

        let mut next_non_hold_point = vec![len; len];
        let mut next_sp_granting_note = vec![len; len];
        let mut non_hold = len;
        let mut granting = len;
        for i in (0..len).rev() {
            if !points[i].is_hold_point {
                non_hold = i;
            }
            if points[i].is_sp_granting_note {
                granting = i;
            }
            next_non_hold_point[i] = non_hold;
            next_sp_granting_note[i] = granting;
        }

        let mut cumulative_score_totals = Vec::with_capacity(len + 1);
        let mut total = 0u32;
        cumulative_score_totals.push(total);
        for point in &points {
            total += point.value;
            cumulative_score_totals.push(total);
        }

        let solo_boosts = track
            .solos()
            .iter()
            .map(|solo| {
                let position = converter.position(solo.end.to_beat(resolution));
                (position, solo.value)
            })
            .collect();

        Self {
            points,
            next_non_hold_point,
            next_sp_granting_note,
            cumulative_score_totals,
            solo_boosts,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First non-hold point at or after `index`, or `len()` if none.
    pub fn next_non_hold_point(&self, index: usize) -> usize {
        self.next_non_hold_point
            .get(index)
            .copied()
            .unwrap_or(self.points.len())
    }

    /// First SP-granting note at or after `index`, or `len()` if none.
    pub fn next_sp_granting_note(&self, index: usize) -> usize {
        self.next_sp_granting_note
            .get(index)
            .copied()
            .unwrap_or(self.points.len())
    }

    /// Combined value of points with index in `[start, end)`.
    pub fn range_score(&self, start: usize, end: usize) -> u32 {
        self.cumulative_score_totals[end] - self.cumulative_score_totals[start]
    }

    /// Value of every point in the set, without SP or solo bonuses.
    pub fn base_score(&self) -> u32 {
        *self.cumulative_score_totals.last().unwrap_or(&0)
    }

    pub fn solo_boosts(&self) -> &[(Position, u32)] {
        &self.solo_boosts
    }
}
