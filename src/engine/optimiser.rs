use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::engine::song::{ActValidity, ActivationCandidate, ProcessedSong};
use crate::engine::sp::{SpBar, MEASURES_PER_BAR};
use crate::model::time::{Beat, Measure, Position};

/// A chosen activation interval, as indices into the song's point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub act_start: usize,
    pub act_end: usize,
}

/// The optimiser's answer: activations in song order and the total score
/// bonus they are worth, solo bonuses included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub activations: Vec<Activation>,
    pub score_boost: u32,
}

/// Beat wrapper with a total order, so cached subproblems can live in a
/// tree keyed on position without hashing floats.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedBeat(f64);

impl Eq for OrderedBeat {}

impl PartialOrd for OrderedBeat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedBeat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Subproblem identity: the best path whose first activation starts at
/// `point` or later, with SP accumulating from `position` (where the
/// previous activation ended). The measure is derived and not compared.
#[derive(Debug, Clone, Copy)]
struct CacheKey {
    point: usize,
    position: Position,
}

impl CacheKey {
    fn map_key(&self) -> (usize, OrderedBeat) {
        (self.point, OrderedBeat(self.position.beat.value()))
    }
}

#[derive(Debug, Clone)]
struct CacheValue {
    path: Path,
    /// Every successful candidate found while solving this subproblem,
    /// in enumeration order, paired with its continuation key.
    possible_next_acts: Vec<(Activation, CacheKey)>,
}

#[derive(Debug, Default)]
struct Cache {
    paths: BTreeMap<(usize, OrderedBeat), CacheValue>,
    full_sp_paths: BTreeMap<usize, CacheValue>,
}

/// Dynamic-programming search for the best Star Power path.
///
/// Borrows the processed song immutably for its whole lifetime; the memo
/// tables live only inside a single `optimal_path` call.
#[derive(Debug)]
pub struct Optimiser<'a> {
    song: &'a ProcessedSong,
    total_solo_boost: u32,
    next_candidate_points: Vec<usize>,
}

impl<'a> Optimiser<'a> {
    pub fn new(song: &'a ProcessedSong) -> Self {
        let total_solo_boost = song.points().solo_boosts().iter().map(|(_, v)| v).sum();

        // A point can only begin an activation if SP became obtainable
        // since the previous point: a phrase grant on the point itself,
        // or whammy in between. Everything else is skipped when a cache
        // key advances.
        let points = song.points();
        let n = points.len();
        let mut next_candidate_points = vec![n; n + 1];
        let mut next_candidate = n;
        for i in (0..n).rev() {
            let point = points.point(i);
            let previous_beat = if i == 0 {
                Beat(f64::NEG_INFINITY)
            } else {
                points.point(i - 1).position.beat
            };
            let is_candidate = point.is_sp_granting_note
                || song
                    .sp_engine()
                    .available_whammy(previous_beat, point.position.beat)
                    > 0.0;
            if is_candidate {
                next_candidate = i;
            }
            next_candidate_points[i] = next_candidate;
        }

        Self {
            song,
            total_solo_boost,
            next_candidate_points,
        }
    }

    pub fn total_solo_boost(&self) -> u32 {
        self.total_solo_boost
    }

    /// Returns the optimal Star Power path for the song.
    pub fn optimal_path(&self) -> Path {
        let mut cache = Cache::default();
        let start_key = self.advance_cache_key(CacheKey {
            point: 0,
            position: Position::NEG_INFINITY,
        });

        let mut path = self.get_partial_path(start_key, &mut cache);
        path.score_boost += self.total_solo_boost;

        tracing::debug!(
            subproblems = cache.paths.len(),
            full_sp_subproblems = cache.full_sp_paths.len(),
            activations = path.activations.len(),
            score_boost = path.score_boost,
            "optimal path computed"
        );
        path
    }

    fn next_candidate_point(&self, point: usize) -> usize {
        self.next_candidate_points
            .get(point)
            .copied()
            .unwrap_or(self.song.points().len())
    }

    fn advance_cache_key(&self, mut key: CacheKey) -> CacheKey {
        key.point = self.next_candidate_point(key.point);
        key
    }

    /// Skips activation ends that are settled before they start: while
    /// the follower's whole window sits inside the guaranteed reach of a
    /// half-bar activation, the follower is consumed no matter what and
    /// the end is surplus. The guaranteed reach is at least
    /// `8 * (sp - 0.5)` measures because the bar holds at most 1.0 and
    /// the pessimistic balance is at least 0.5.
    fn act_end_lower_bound(&self, point: usize, start: Measure, sp: f64) -> usize {
        let points = self.song.points();
        let bound = start.value() + MEASURES_PER_BAR * (sp - SpBar::MINIMUM_SP_AMOUNT);
        let first_reachable = point
            + points.points()[point..]
                .partition_point(|p| p.hit_window_end.measure.value() < bound);
        first_reachable.saturating_sub(1).max(point)
    }

    fn get_partial_path(&self, key: CacheKey, cache: &mut Cache) -> Path {
        if key.point >= self.song.points().len() {
            return Path::default();
        }
        if let Some(value) = cache.paths.get(&key.map_key()) {
            return value.path.clone();
        }

        let value = match self.try_previous_best_subpaths(key, cache, false) {
            Some(value) => value,
            None => self.find_best_subpaths(key, cache, false),
        };
        let path = value.path.clone();
        cache.paths.insert(key.map_key(), value);
        path
    }

    fn get_partial_full_sp_path(&self, point: usize, cache: &mut Cache) -> CacheValue {
        if let Some(value) = cache.full_sp_paths.get(&point) {
            return value.clone();
        }

        let key = CacheKey {
            point,
            position: Position::NEG_INFINITY,
        };
        let value = match self.try_previous_best_subpaths(key, cache, true) {
            Some(value) => value,
            None => self.find_best_subpaths(key, cache, true),
        };
        cache.full_sp_paths.insert(point, value.clone());
        value
    }

    /// Reuses an earlier subproblem at the same position: advancing the
    /// point within a fixed position only removes candidates, so the
    /// earlier enumeration filtered to starts at or after this key's
    /// point is exactly this key's candidate set.
    fn try_previous_best_subpaths(
        &self,
        key: CacheKey,
        cache: &mut Cache,
        has_full_sp: bool,
    ) -> Option<CacheValue> {
        let previous_acts: Vec<(Activation, CacheKey)> = if has_full_sp {
            let (_, value) = cache.full_sp_paths.range(..key.point).next_back()?;
            value.possible_next_acts.clone()
        } else {
            let (found, value) = cache.paths.range(..key.map_key()).next_back()?;
            if found.1 != OrderedBeat(key.position.beat.value()) || found.0 >= key.point {
                return None;
            }
            value.possible_next_acts.clone()
        };

        let feasible: Vec<(Activation, CacheKey)> = previous_acts
            .into_iter()
            .filter(|(act, _)| act.act_start >= key.point)
            .collect();
        Some(self.best_value_from_acts(feasible, cache))
    }

    fn find_best_subpaths(&self, key: CacheKey, cache: &mut Cache, has_full_sp: bool) -> CacheValue {
        let points = self.song.points();
        let n = points.len();
        let mut acts: Vec<(Activation, CacheKey)> = Vec::new();
        let mut deferred_full_sp: Option<CacheValue> = None;

        let mut p = key.point;
        while p < n {
            let sp_bar = if has_full_sp {
                SpBar::new(1.0, 1.0)
            } else {
                self.song
                    .total_available_sp(key.position.beat, key.point, p)
            };
            if !sp_bar.full_enough_to_activate() {
                p += 1;
                continue;
            }

            if !has_full_sp && sp_bar.min >= 1.0 {
                // Saturated: every later start sees a full bar no matter
                // where accumulation began, so the rest of the
                // enumeration is the position-independent subproblem.
                deferred_full_sp = Some(self.get_partial_full_sp_path(p, cache));
                break;
            }

            let window_start = self
                .song
                .adjusted_hit_window_start(p, self.song.squeeze());
            let start_measure = if key.position.measure > window_start.measure {
                key.position.measure
            } else {
                window_start.measure
            };

            let mut q = self.act_end_lower_bound(p, start_measure, sp_bar.max);
            while q < n {
                let candidate = ActivationCandidate {
                    act_start: p,
                    act_end: q,
                    earliest_activation_point: key.position,
                    sp_bar,
                };
                let result = self.song.is_candidate_valid(&candidate);
                match result.validity {
                    ActValidity::Success => acts.push((
                        Activation {
                            act_start: p,
                            act_end: q,
                        },
                        CacheKey {
                            point: q + 1,
                            position: result.ending_position,
                        },
                    )),
                    ActValidity::InsufficientSp => break,
                    ActValidity::SurplusSp => {}
                }
                q += 1;
            }

            p += 1;
        }

        if let Some(full) = deferred_full_sp {
            acts.extend(full.possible_next_acts.iter().copied());
        }

        self.best_value_from_acts(acts, cache)
    }

    /// Scores every recorded candidate against its memoised continuation
    /// and keeps the best; ties fall to the earliest start then earliest
    /// end because enumeration order is ascending and improvement is
    /// strict. Ending the path with no further activation is always an
    /// option.
    fn best_value_from_acts(
        &self,
        acts: Vec<(Activation, CacheKey)>,
        cache: &mut Cache,
    ) -> CacheValue {
        let points = self.song.points();
        let mut best_path = Path::default();

        for (act, next_key) in &acts {
            let act_boost = points.range_score(act.act_start, act.act_end + 1);
            let continuation = self.get_partial_path(self.advance_cache_key(*next_key), cache);
            let total = act_boost + continuation.score_boost;
            if total > best_path.score_boost {
                let mut activations = Vec::with_capacity(1 + continuation.activations.len());
                activations.push(*act);
                activations.extend_from_slice(&continuation.activations);
                best_path = Path {
                    activations,
                    score_boost: total,
                };
            }
        }

        CacheValue {
            path: best_path,
            possible_next_acts: acts,
        }
    }
}
