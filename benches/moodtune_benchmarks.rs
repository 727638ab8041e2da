//! # MoodTune Performance Benchmarks
//!
//! Hot paths of the detection pipeline: every live tick aggregates a score
//! map, every synthetic tick generates one, and every mood change looks up a
//! profile and builds a catalog query.
//!
//! ```bash
//! cargo bench
//! cargo bench aggregate
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use moodtune::algorithm::{aggregate, rank_scores};
use moodtune::catalog::FallbackCatalog;
use moodtune::emotion::{EmotionLabel, EmotionScore, ScoreMap};
use moodtune::mood;
use moodtune::playback::{Direction, PlaybackSession};
use moodtune::synthetic::SyntheticEmotionGenerator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn random_scores(rng: &mut StdRng, labels: usize) -> ScoreMap {
    EmotionLabel::ALL
        .iter()
        .take(labels)
        .map(|label| (*label, rng.gen_range(0.0..1.0)))
        .collect()
}

fn benchmark_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let mut rng = StdRng::seed_from_u64(42);

    for labels in [1, 4, 7] {
        let scores = random_scores(&mut rng, labels);
        group.bench_with_input(BenchmarkId::new("score_map", labels), &scores, |b, scores| {
            b.iter(|| aggregate(black_box(scores)))
        });
    }

    let ranked: Vec<EmotionScore> = EmotionLabel::ALL
        .iter()
        .map(|label| EmotionScore {
            category: *label,
            confidence: rng.gen_range(0.0..1.0),
        })
        .collect();
    group.bench_function("rank_scores", |b| {
        b.iter_batched(|| ranked.clone(), |scores| rank_scores(black_box(scores)), BatchSize::SmallInput)
    });

    group.finish();
}

fn benchmark_synthetic(c: &mut Criterion) {
    let mut generator = SyntheticEmotionGenerator::with_seed(7);
    c.bench_function("synthetic_next_result", |b| b.iter(|| generator.next_result()));
}

fn benchmark_mood_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("mood");
    group.bench_function("targets_for_all", |b| {
        b.iter(|| {
            for label in EmotionLabel::ALL {
                black_box(mood::targets_for(label));
            }
        })
    });
    group.bench_function("targets_for_name", |b| b.iter(|| mood::targets_for_name(black_box("Surprised"))));
    group.bench_function("catalog_query", |b| {
        b.iter(|| mood::catalog_query(black_box(EmotionLabel::Angry), black_box(15)))
    });
    group.finish();
}

fn benchmark_playback(c: &mut Criterion) {
    let fallback = FallbackCatalog::default();
    let list = fallback.for_emotion(EmotionLabel::Sad);

    c.bench_function("playback_progress_cycle", |b| {
        b.iter_batched(
            || {
                let mut session = PlaybackSession::new();
                session.load_track_list(list.clone());
                session
            },
            |mut session| {
                for step in 1..=20 {
                    session.on_playback_progress(f64::from(step) * 0.05);
                }
                session.advance(Direction::Backward);
                session
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_synthetic,
    benchmark_mood_lookup,
    benchmark_playback
);

criterion_main!(benches);
