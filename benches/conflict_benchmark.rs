use bath_schedule::{conflict, Booking, BookingFields, ResourceType};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

fn random_live_set(size: usize) -> Vec<Booking> {
    let mut rng = rand::thread_rng();
    let base = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    (0..size)
        .map(|i| Booking {
            id: format!("booking{i}"),
            name: format!("guest{i}"),
            resource: if rng.gen_bool(0.5) {
                ResourceType::Toilet
            } else {
                ResourceType::Bath
            },
            start: base + Duration::minutes(rng.gen_range(0..24 * 60)),
            duration_minutes: rng.gen_range(1..=25),
        })
        .collect()
}

// Conflict check against live sets of growing size
pub fn conflict_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("conflict_check");
    let candidate = BookingFields {
        name: "candidate".to_string(),
        resource: ResourceType::Toilet,
        start: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        duration_minutes: 25,
    };

    for size in [10, 100, 1000].iter() {
        let live = random_live_set(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &live, |b, live| {
            b.iter(|| black_box(conflict::has_conflict(black_box(&candidate), live)));
        });
    }

    group.finish();
}

criterion_group!(benches, conflict_benchmark);
criterion_main!(benches);
