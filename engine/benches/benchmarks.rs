//! Performance benchmarks for stampsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stampsync_engine::{
    find_duplicates, match_forward, resolve_anchor, FixedHeaderCodec, MemorySession,
    ResequenceConfig, Resequencer, StreamTimestamps, Timestamp,
};

// 30 Hz camera period
const FRAME_NS: i64 = 33_333_333;

fn frames(count: usize, jitter: i64) -> Vec<Timestamp> {
    (0..count as i64)
        .map(|i| Timestamp::from_nanos(i * FRAME_NS + (i % 3) * jitter))
        .collect()
}

fn recorded_session(frames_per_stream: usize) -> MemorySession {
    let mut session = MemorySession::new();
    for i in 0..frames_per_stream as i64 {
        let cam = Timestamp::from_nanos(i * FRAME_NS);
        for stream in ["/cam_mid", "/cam_left", "/cam_right"] {
            session.push(stream, FixedHeaderCodec::payload_at(cam, &[0u8; 64]), cam.as_nanos());
        }
        // Roughly 16 IMU samples per frame
        for k in 0..16 {
            let imu = Timestamp::from_nanos(i * FRAME_NS + k * 2_000_000 - 500);
            session.push("/imu/data", FixedHeaderCodec::payload_at(imu, &[0u8; 32]), imu.as_nanos());
        }
    }
    session
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    for size in [1_000, 10_000, 100_000] {
        let reference = frames(size, 0);
        let target = frames(size, 1_000);

        group.bench_with_input(BenchmarkId::new("match_forward", size), &size, |b, _| {
            b.iter(|| match_forward(black_box(&reference), black_box(&target), 500))
        });
    }

    // Unsorted input takes the full scan path
    let reference = frames(1_000, 0);
    let mut target = frames(1_000, 1_000);
    target.swap(10, 20);
    group.bench_function("match_forward_full_scan_1000", |b| {
        b.iter(|| match_forward(black_box(&reference), black_box(&target), 500))
    });

    group.finish();
}

fn bench_duplicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("duplicates");

    for size in [1_000, 10_000, 100_000] {
        let mut timestamps = frames(size, 0);
        // Every tenth frame repeated
        for i in (0..size).step_by(10) {
            timestamps.push(timestamps[i]);
        }

        group.bench_with_input(BenchmarkId::new("find_duplicates", size), &size, |b, _| {
            b.iter(|| find_duplicates(black_box(&timestamps)))
        });
    }

    group.finish();
}

fn bench_anchor(c: &mut Criterion) {
    let mut group = c.benchmark_group("anchor");

    for size in [1_000, 10_000] {
        // Common instants only start halfway through
        let streams = vec![
            StreamTimestamps::new("/cam_mid", frames(size, 0)),
            StreamTimestamps::new("/cam_left", frames(size, 0)[size / 2..].to_vec()),
            StreamTimestamps::new("/cam_right", frames(size, 0)),
        ];

        group.bench_with_input(BenchmarkId::new("resolve_anchor", size), &size, |b, _| {
            b.iter(|| resolve_anchor(black_box(&streams)))
        });
    }

    group.finish();
}

fn bench_resequence(c: &mut Criterion) {
    let mut group = c.benchmark_group("resequence");
    group.sample_size(20);

    let config = ResequenceConfig::new(["/cam_mid", "/cam_left", "/cam_right"])
        .with_offset_stream("/imu/data");

    for frames_per_stream in [100, 1_000] {
        let session = recorded_session(frames_per_stream);

        group.bench_with_input(
            BenchmarkId::new("run", frames_per_stream),
            &frames_per_stream,
            |b, _| {
                b.iter(|| {
                    let mut output = MemorySession::new();
                    Resequencer::new(black_box(&session), &FixedHeaderCodec, &config)
                        .run(&mut output)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_matching,
    bench_duplicates,
    bench_anchor,
    bench_resequence,
);
criterion_main!(benches);
