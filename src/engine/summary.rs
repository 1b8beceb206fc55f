use std::fmt::Write;

use crate::engine::optimiser::Path;
use crate::engine::song::ProcessedSong;
use crate::model::time::Measure;

/// Renders a path as the optimiser's one-true textual summary: one line
/// per activation with 1-indexed measures at quarter precision, then the
/// score line. Deterministic for identical inputs.
pub fn path_summary(path: &Path, song: &ProcessedSong) -> String {
    let mut out = String::new();
    for (index, activation) in path.activations.iter().enumerate() {
        let start = song.points().point(activation.act_start).position.measure;
        let end = song.points().point(activation.act_end).position.measure;
        writeln!(
            out,
            "Activation {}: measure {} \u{2192} measure {}",
            index + 1,
            display_measure(start),
            display_measure(end)
        )
        .expect("writing to a string cannot fail");
    }

    let base = song.points().base_score();
    write!(
        out,
        "Total score: {} + {} = {}",
        base,
        path.score_boost,
        base + path.score_boost
    )
    .expect("writing to a string cannot fail");
    out
}

/// 1-indexed measure rounded to the nearest quarter.
fn display_measure(measure: Measure) -> f64 {
    ((measure.value() + 1.0) * 4.0).round() / 4.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SqueezeSettings;
    use crate::engine::optimiser::Activation;
    use crate::model::time::Tick;
    use crate::model::track::{
        Colour, FiveFretColour, Note, NoteTrack, StarPower, SyncTrack, TrackKind,
    };

    fn note(tick: u32) -> Note {
        Note {
            position: Tick(tick),
            length: 0,
            colour: Colour::FiveFret(FiveFretColour::Green),
            is_forced: false,
            is_tap: false,
        }
    }

    fn song() -> ProcessedSong {
        let track = NoteTrack::new(
            TrackKind::FiveFret,
            vec![note(0), note(192), note(1536), note(1728)],
            vec![StarPower {
                position: Tick(0),
                length: 50,
            }],
            vec![],
            vec![],
            192,
        )
        .unwrap();
        let sync = SyncTrack::new(vec![], vec![]).unwrap();
        ProcessedSong::new(&track, &sync, &SqueezeSettings::default()).unwrap()
    }

    #[test]
    fn summary_lists_activations_and_totals() {
        let song = song();
        let path = Path {
            activations: vec![Activation {
                act_start: 2,
                act_end: 3,
            }],
            score_boost: 100,
        };

        let summary = path_summary(&path, &song);
        assert_eq!(
            summary,
            "Activation 1: measure 3 \u{2192} measure 3.25\nTotal score: 200 + 100 = 300"
        );
    }

    #[test]
    fn empty_paths_still_report_the_total() {
        let song = song();
        let path = Path::default();
        assert_eq!(path_summary(&path, &song), "Total score: 200 + 0 = 200");
    }
}
