use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use threes_td::bag::plan_placement;
use threes_td::engine::{self as GameEngine, Board, Direction};
use threes_td::ntuple::FeatureExtractor;
use threes_td::weights::WeightStore;

fn warm() {
    GameEngine::new();
}

// Boards from one random walk: place, slide in rotation, repeat.
fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(1337);
    let mut boards = Vec::new();
    let mut b = Board::EMPTY;
    for _ in 0..9 {
        if let Some(action) = plan_placement(&b, &mut rng) {
            action.apply(&mut b);
        }
    }
    boards.push(b);
    for i in 0..64 {
        let dir = Direction::ALL[i % 4];
        if b.can_slide(dir) {
            b.slide(dir);
            if let Some(action) = plan_placement(&b, &mut rng) {
                action.apply(&mut b);
            }
        }
        boards.push(b);
    }
    boards
}

fn bench_engine(c: &mut Criterion) {
    warm();
    let boards = corpus();

    c.bench_function("engine/slide_all", |bch| {
        bch.iter(|| {
            let mut acc = 0i64;
            for &bd in &boards {
                for dir in Direction::ALL {
                    let mut probe = bd;
                    acc += probe.slide(dir) as i64;
                }
            }
            black_box(acc)
        })
    });

    c.bench_function("engine/transpose", |bch| {
        bch.iter(|| {
            let mut acc = 0u64;
            for &bd in &boards {
                let mut t = bd;
                t.transpose();
                acc ^= t.raw();
            }
            black_box(acc)
        })
    });

    c.bench_function("bag/plan_placement", |bch| {
        let mut rng = StdRng::seed_from_u64(7);
        bch.iter(|| {
            let mut placed = 0usize;
            for bd in &boards {
                placed += plan_placement(bd, &mut rng).is_some() as usize;
            }
            black_box(placed)
        })
    });
}

fn bench_features(c: &mut Criterion) {
    warm();
    let boards = corpus();
    let store = WeightStore::with_sizes(&[65536, 65536]).unwrap();
    let features = FeatureExtractor::for_store(FeatureExtractor::rows_and_columns(), &store).unwrap();
    c.bench_function("ntuple/value", |bch| {
        bch.iter(|| {
            let mut acc = 0f32;
            for bd in &boards {
                acc += features.value(bd, &store);
            }
            black_box(acc)
        })
    });
}

criterion_group!(engine_ops, bench_engine, bench_features);
criterion_main!(engine_ops);
