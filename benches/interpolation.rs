use camino::Utf8Path;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use oem::message::EphemerisMessage;
use oem::time::OemEpoch;

fn load_sample() -> EphemerisMessage {
    let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/circular_v2.oem");
    EphemerisMessage::open(&path).expect("sample OEM")
}

/// Random epochs over the message span
fn random_epochs(rng: &mut StdRng, message: &EphemerisMessage, count: usize) -> Vec<OemEpoch> {
    let (start, stop) = message.span();
    let duration = stop - start;
    (0..count)
        .map(|_| start.add_seconds(rng.random::<f64>() * duration))
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let message = load_sample();
    let mut rng = StdRng::seed_from_u64(0xDEADBEEF);

    // build the interpolators outside the timed section
    message.evaluate(message.span().0).expect("warm-up");
    message.evaluate(message.span().1).expect("warm-up");

    c.bench_function("interpolation/evaluate_1000", |b| {
        b.iter_batched(
            || random_epochs(&mut rng, &message, 1000),
            |epochs| {
                for epoch in epochs {
                    black_box(message.evaluate(black_box(epoch)).ok());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_resample(c: &mut Criterion) {
    let message = load_sample();

    c.bench_function("interpolation/resampled_10s", |b| {
        b.iter(|| black_box(message.resampled(black_box(10.0)).ok()))
    });
}

criterion_group!(benches, bench_evaluate, bench_resample);
criterion_main!(benches);
