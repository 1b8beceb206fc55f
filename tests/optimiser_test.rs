use starpath::{
    path_summary, ActValidity, ActivationCandidate, Bpm, Colour, FiveFretColour, Note, NoteTrack,
    Optimiser, Position, ProcessedSong, SqueezeSettings, StarPower, SyncTrack, Tick,
    TimeSignature, TrackKind,
};

fn note(tick: u32, length: u32) -> Note {
    Note {
        position: Tick(tick),
        length,
        colour: Colour::FiveFret(FiveFretColour::Green),
        is_forced: false,
        is_tap: false,
    }
}

fn phrase(tick: u32, length: u32) -> StarPower {
    StarPower {
        position: Tick(tick),
        length,
    }
}

/// A mid-sized chart: an intro riff with two phrases, a sustained bridge
/// inside a long phrase, and a dense outro behind two more phrases.
fn bridge_song() -> ProcessedSong {
    let mut notes: Vec<Note> = (0..8).map(|i| note(i * 192, 0)).collect();
    notes.push(note(1920, 768));
    notes.extend((0..12).map(|i| note(7680 + i * 96, 0)));

    let phrases = vec![
        phrase(0, 50),
        phrase(384, 50),
        phrase(1920, 800),
        phrase(7680, 50),
        phrase(7872, 50),
    ];

    let track = NoteTrack::new(TrackKind::FiveFret, notes, phrases, vec![], vec![], 192)
        .expect("track should be valid");
    let sync = SyncTrack::new(
        vec![
            TimeSignature {
                position: Tick(0),
                numerator: 4,
                denominator: 4,
            },
            TimeSignature {
                position: Tick(5760),
                numerator: 3,
                denominator: 4,
            },
        ],
        vec![
            Bpm {
                position: Tick(0),
                millibpm: 120_000,
            },
            Bpm {
                position: Tick(3840),
                millibpm: 150_000,
            },
        ],
    )
    .expect("sync track should be valid");
    ProcessedSong::new(&track, &sync, &SqueezeSettings::default()).expect("song should process")
}

#[test]
fn activations_never_overlap_and_all_validate() {
    let song = bridge_song();
    let optimiser = Optimiser::new(&song);
    let path = optimiser.optimal_path();

    assert!(!path.activations.is_empty(), "the chart has plenty of SP");
    for pair in path.activations.windows(2) {
        assert!(
            pair[0].act_end < pair[1].act_start,
            "activations {pair:?} overlap"
        );
    }

    // Replay the path: each activation must validate with the SP the
    // optimiser could actually have banked at that point.
    let mut start = Position::NEG_INFINITY;
    let mut first_point = 0;
    for activation in &path.activations {
        let sp_bar = song.total_available_sp(start.beat, first_point, activation.act_start);
        assert!(sp_bar.max >= sp_bar.min && sp_bar.min >= 0.0 && sp_bar.max <= 1.0);

        let result = song.is_candidate_valid(&ActivationCandidate {
            act_start: activation.act_start,
            act_end: activation.act_end,
            earliest_activation_point: start,
            sp_bar,
        });
        assert_eq!(result.validity, ActValidity::Success);
        start = result.ending_position;
        first_point = activation.act_end + 1;
    }
}

#[test]
fn score_boost_is_the_sum_of_covered_ranges() {
    let song = bridge_song();
    let path = Optimiser::new(&song).optimal_path();

    let expected: u32 = path
        .activations
        .iter()
        .map(|a| song.points().range_score(a.act_start, a.act_end + 1))
        .sum();
    assert_eq!(path.score_boost, expected);
}

#[test]
fn identical_inputs_give_identical_paths() {
    let first = Optimiser::new(&bridge_song()).optimal_path();
    let second = Optimiser::new(&bridge_song()).optimal_path();
    assert_eq!(first, second);

    let summary_a = path_summary(&first, &bridge_song());
    let summary_b = path_summary(&second, &bridge_song());
    assert_eq!(summary_a, summary_b);
}

#[test]
fn summary_round_trips_activation_boundaries() {
    let song = bridge_song();
    let path = Optimiser::new(&song).optimal_path();
    let summary = path_summary(&path, &song);

    let mut parsed = Vec::new();
    for line in summary.lines() {
        let Some(rest) = line.split_once(": measure ").map(|(_, rest)| rest) else {
            continue;
        };
        let (start, end) = rest
            .split_once(" \u{2192} measure ")
            .expect("activation lines name both boundaries");
        parsed.push((
            start.parse::<f64>().expect("start measure parses"),
            end.parse::<f64>().expect("end measure parses"),
        ));
    }

    assert_eq!(parsed.len(), path.activations.len());
    for (activation, (start, end)) in path.activations.iter().zip(parsed) {
        let quarter = |measure: f64| ((measure + 1.0) * 4.0).round() / 4.0;
        let expected_start =
            quarter(song.points().point(activation.act_start).position.measure.value());
        let expected_end =
            quarter(song.points().point(activation.act_end).position.measure.value());
        assert!((start - expected_start).abs() < 1e-9);
        assert!((end - expected_end).abs() < 1e-9);
    }

    let total_line = summary.lines().last().expect("summary has a total line");
    let base = song.points().base_score();
    assert_eq!(
        total_line,
        format!(
            "Total score: {} + {} = {}",
            base,
            path.score_boost,
            base + path.score_boost
        )
    );
}

#[test]
fn a_track_without_star_power_yields_the_empty_path() {
    let track = NoteTrack::new(
        TrackKind::FiveFret,
        (0..16).map(|i| note(i * 192, 0)).collect(),
        vec![],
        vec![],
        vec![],
        192,
    )
    .unwrap();
    let sync = SyncTrack::new(vec![], vec![]).unwrap();
    let song = ProcessedSong::new(&track, &sync, &SqueezeSettings::default()).unwrap();

    let path = Optimiser::new(&song).optimal_path();
    assert!(path.activations.is_empty());
    assert_eq!(path.score_boost, 0);
}

#[test]
fn zero_squeeze_still_finds_a_consistent_path() {
    let track = NoteTrack::new(
        TrackKind::FiveFret,
        (0..10)
            .map(|i| note(i * 192, 0))
            .chain([note(1920, 768)])
            .collect(),
        vec![phrase(0, 50), phrase(192, 50), phrase(1920, 800)],
        vec![],
        vec![],
        192,
    )
    .unwrap();
    let sync = SyncTrack::new(vec![], vec![]).unwrap();
    let song = ProcessedSong::new(
        &track,
        &sync,
        &SqueezeSettings {
            squeeze: 0.0,
            ..SqueezeSettings::default()
        },
    )
    .unwrap();

    // With point-width windows the search still runs and its answer
    // stays internally consistent.
    let path = Optimiser::new(&song).optimal_path();
    let expected: u32 = path
        .activations
        .iter()
        .map(|a| song.points().range_score(a.act_start, a.act_end + 1))
        .sum();
    assert_eq!(path.score_boost, expected);
    assert!(!path.activations.is_empty(), "half a bar is banked by the third note");
}
