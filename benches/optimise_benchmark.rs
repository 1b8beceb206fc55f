use criterion::{black_box, criterion_group, criterion_main, Criterion};
use starpath::{
    Colour, FiveFretColour, Note, NoteTrack, Optimiser, ProcessedSong, SqueezeSettings, StarPower,
    SyncTrack, Tick, TrackKind,
};

/// A synthetic four-minute chart: steady eighth notes, a phrase every two
/// measures, and a sustain every eighth phrase.
fn synthetic_song() -> ProcessedSong {
    let mut notes = Vec::new();
    let mut phrases = Vec::new();
    for i in 0..600u32 {
        let tick = i * 96;
        let length = if i % 64 == 0 { 384 } else { 0 };
        notes.push(Note {
            position: Tick(tick),
            length,
            colour: Colour::FiveFret(FiveFretColour::Green),
            is_forced: false,
            is_tap: false,
        });
        if i % 16 == 0 {
            phrases.push(StarPower {
                position: Tick(tick),
                length: 400,
            });
        }
    }

    let track = NoteTrack::new(TrackKind::FiveFret, notes, phrases, vec![], vec![], 192)
        .expect("track should be valid");
    let sync = SyncTrack::new(vec![], vec![]).expect("sync track should be valid");
    ProcessedSong::new(&track, &sync, &SqueezeSettings::default()).expect("song should process")
}

fn optimal_path_benchmark(c: &mut Criterion) {
    let song = synthetic_song();

    c.bench_function("optimal_path_600_notes", |b| {
        b.iter(|| {
            let optimiser = Optimiser::new(black_box(&song));
            black_box(optimiser.optimal_path())
        });
    });
}

fn processing_benchmark(c: &mut Criterion) {
    c.bench_function("process_song_600_notes", |b| {
        b.iter(|| black_box(synthetic_song()));
    });
}

criterion_group!(benches, optimal_path_benchmark, processing_benchmark);
criterion_main!(benches);
