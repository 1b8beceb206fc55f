use crate::config::SqueezeSettings;
use crate::engine::points::{PointSet, HIT_WINDOW_HALF_WIDTH_S};
use crate::engine::sp::{SpBar, SpEngine};
use crate::model::time::{Beat, Position, Second, TimeConverter};
use crate::model::track::{NoteTrack, SyncTrack};
use crate::util::error::PathingError;

/// Whether an activation candidate works, and if not which way it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActValidity {
    Success,
    InsufficientSp,
    SurplusSp,
}

/// Result of validating a candidate: the verdict, and on success the
/// latest position the activation may end while remaining valid.
#[derive(Debug, Clone, Copy)]
pub struct ActResult {
    pub ending_position: Position,
    pub validity: ActValidity,
}

/// A possible activation interval under consideration by the optimiser.
///
/// `earliest_activation_point` is where SP accumulation started (the end
/// of the previous activation); the activation itself cannot begin before
/// it. `sp_bar` is the SP envelope available on arrival at `act_start`.
#[derive(Debug, Clone, Copy)]
pub struct ActivationCandidate {
    pub act_start: usize,
    pub act_end: usize,
    pub earliest_activation_point: Position,
    pub sp_bar: SpBar,
}

/// A song processed for Star Power optimisation: the time model, point
/// model, and SP engine built once and queried read-only.
#[derive(Debug)]
pub struct ProcessedSong {
    converter: TimeConverter,
    points: PointSet,
    sp_engine: SpEngine,
    squeeze: f64,
}

impl ProcessedSong {
    pub fn new(
        track: &NoteTrack,
        sync_track: &SyncTrack,
        settings: &SqueezeSettings,
    ) -> Result<Self, PathingError> {
        settings.validate()?;
        let sync_track = if settings.speed_percent == 100 {
            sync_track.clone()
        } else {
            sync_track.with_speed(settings.speed_percent)?
        };

        let converter = TimeConverter::new(&sync_track, track.resolution())?;
        let points = PointSet::new(track, &converter, settings.squeeze);
        let sp_engine = SpEngine::new(
            track,
            &sync_track,
            settings.early_whammy,
            Second(settings.lazy_whammy_s),
        )?;

        Ok(Self {
            converter,
            points,
            sp_engine,
            squeeze: settings.squeeze,
        })
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn sp_engine(&self) -> &SpEngine {
        &self.sp_engine
    }

    pub fn squeeze(&self) -> f64 {
        self.squeeze
    }

    /// Start of `point`'s timing window recomputed at the given squeeze.
    /// Hold points keep their zero-width windows.
    pub fn adjusted_hit_window_start(&self, point: usize, squeeze: f64) -> Position {
        let point = self.points.point(point);
        if point.is_hold_point {
            return point.position;
        }
        let second = self.converter.beats_to_seconds(point.position.beat)
            - Second(HIT_WINDOW_HALF_WIDTH_S * squeeze);
        self.converter.position(self.converter.seconds_to_beats(second))
    }

    /// End of `point`'s timing window recomputed at the given squeeze.
    pub fn adjusted_hit_window_end(&self, point: usize, squeeze: f64) -> Position {
        let point = self.points.point(point);
        if point.is_hold_point {
            return point.position;
        }
        let second = self.converter.beats_to_seconds(point.position.beat)
            + Second(HIT_WINDOW_HALF_WIDTH_S * squeeze);
        self.converter.position(self.converter.seconds_to_beats(second))
    }

    /// SP acquirable between `start` and arrival at `act_start`, as a
    /// min/max envelope. Phrase grants from SP-granting points in
    /// `[first_point, act_start)` count into both ends, except points the
    /// accumulation start has already passed. Whammy counts into the
    /// maximum; it counts into the minimum only up to
    /// `required_whammy_end` when one is given.
    pub fn total_available_sp(
        &self,
        start: Beat,
        first_point: usize,
        act_start: usize,
    ) -> SpBar {
        self.total_available_sp_with(start, first_point, act_start, None)
    }

    pub fn total_available_sp_with(
        &self,
        start: Beat,
        first_point: usize,
        act_start: usize,
        required_whammy_end: Option<Beat>,
    ) -> SpBar {
        let mut sp_bar = SpBar::new(0.0, 0.0);
        let mut p = self.points.next_sp_granting_note(first_point);
        while p < act_start {
            if self.points.point(p).position.beat >= start {
                sp_bar.add_phrase();
            }
            p = self.points.next_sp_granting_note(p + 1);
        }

        let act_beat = self.points.point(act_start).position.beat;
        if let Some(whammy_end) = required_whammy_end {
            let whammy_end = if whammy_end < act_beat { whammy_end } else { act_beat };
            if whammy_end > start {
                sp_bar.min = (sp_bar.min + self.sp_engine.available_whammy(start, whammy_end)).min(1.0);
            }
        }
        sp_bar.max = (sp_bar.max + self.sp_engine.available_whammy(start, act_beat)).min(1.0);
        sp_bar
    }

    /// Validates a candidate at the configured squeeze with no forced
    /// whammy.
    pub fn is_candidate_valid(&self, candidate: &ActivationCandidate) -> ActResult {
        self.is_candidate_valid_with(candidate, self.squeeze, None)
    }

    /// Validates a candidate with tightened hit windows and, optionally,
    /// a position up to which whammy is known to continue.
    ///
    /// The activation must reach `act_end`'s window end even in the best
    /// case for that to be creditable, and must be able to die before the
    /// following point's window start even in the worst case, otherwise
    /// that point is dragged into the activation.
    pub fn is_candidate_valid_with(
        &self,
        candidate: &ActivationCandidate,
        squeeze: f64,
        required_whammy_end: Option<Position>,
    ) -> ActResult {
        let null_result = |validity| ActResult {
            ending_position: Position::ZERO,
            validity,
        };

        if !candidate.sp_bar.full_enough_to_activate() {
            return null_result(ActValidity::InsufficientSp);
        }

        let whammy_end = required_whammy_end.unwrap_or(Position::NEG_INFINITY);

        let mut min_position = self.adjusted_hit_window_start(candidate.act_start, squeeze);
        if min_position.beat < candidate.earliest_activation_point.beat {
            min_position = candidate.earliest_activation_point;
        }
        let mut max_position = self.adjusted_hit_window_end(candidate.act_start, squeeze);
        if max_position.beat < candidate.earliest_activation_point.beat {
            max_position = candidate.earliest_activation_point;
        }

        // Below half a bar the activation cannot have started at all, so
        // the worst case conditional on activating is half a bar.
        let mut min_sp = candidate.sp_bar.min.max(SpBar::MINIMUM_SP_AMOUNT);
        let mut max_sp = candidate.sp_bar.max;

        // Collect phrases hit inside the activation; the player may top
        // the bar back up mid-flight.
        let mut p = self.points.next_sp_granting_note(candidate.act_start);
        while p < candidate.act_end {
            let note_position = self.points.point(p).position;
            if note_position.beat > max_position.beat {
                max_sp = self
                    .sp_engine
                    .propagate_sp_over_whammy_max(max_position, note_position, max_sp);
                if max_sp < 0.0 {
                    return null_result(ActValidity::InsufficientSp);
                }
                max_position = note_position;
            }
            if note_position.beat > min_position.beat {
                min_sp = self.sp_engine.propagate_sp_over_whammy_min(
                    min_position,
                    note_position,
                    min_sp,
                    whammy_end,
                );
                min_position = note_position;
            }
            max_sp = (max_sp + SpBar::SP_PHRASE_AMOUNT).min(1.0);
            min_sp = (min_sp + SpBar::SP_PHRASE_AMOUNT).min(1.0);
            p = self.points.next_sp_granting_note(p + 1);
        }

        let follower = candidate.act_end + 1;
        let cap = if follower < self.points.len() {
            self.adjusted_hit_window_start(follower, squeeze)
        } else {
            Position::INFINITY
        };

        let ending_position = self
            .sp_engine
            .activation_end_point(max_position, cap, max_sp);
        let act_end_window_end = self.adjusted_hit_window_end(candidate.act_end, squeeze);
        if ending_position.beat < act_end_window_end.beat {
            return null_result(ActValidity::InsufficientSp);
        }

        if follower < self.points.len() {
            if cap.beat <= min_position.beat {
                // The follower's window opens before the activation can
                // even begin.
                return null_result(ActValidity::SurplusSp);
            }
            let leftover =
                self.sp_engine
                    .propagate_sp_over_whammy_min(min_position, cap, min_sp, whammy_end);
            if leftover > 0.0 {
                return null_result(ActValidity::SurplusSp);
            }
        }

        ActResult {
            ending_position,
            validity: ActValidity::Success,
        }
    }
}
