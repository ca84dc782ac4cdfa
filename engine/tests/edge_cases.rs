//! Edge case tests for stampsync-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use stampsync_engine::{
    analyze_cadence, find_duplicates, match_forward, resolve_anchor, run_audit, AuditConfig,
    CadenceConfig, Codec, DomainOffset, Error, FixedHeaderCodec, MemorySession, ResequenceConfig,
    ResequencePlan, Resequencer, SessionSink, Stamp, StreamMetadata, StreamTimestamps, Timestamp,
    NANOS_PER_SEC,
};

fn ns(values: &[i64]) -> Vec<Timestamp> {
    values.iter().map(|&n| Timestamp::from_nanos(n)).collect()
}

fn push(session: &mut MemorySession, stream: &str, nanos: i64) {
    session.push(
        stream,
        FixedHeaderCodec::payload_at(Timestamp::from_nanos(nanos), b"payload"),
        nanos,
    );
}

fn stream_times(session: &MemorySession, stream: &str) -> Vec<i64> {
    session
        .stream_messages(stream)
        .map(|m| {
            FixedHeaderCodec
                .timestamp(stream, &m.data)
                .unwrap()
                .as_nanos()
        })
        .collect()
}

// ============================================================================
// Timestamp Arithmetic
// ============================================================================

#[test]
fn delta_with_nanosecond_borrow() {
    let a = Stamp::new(5, 0);
    let b = Stamp::new(4, 999_999_999);
    assert_eq!(a.abs_delta(&b), 1);
    assert_eq!(b.abs_delta(&a), 1);
    assert_eq!(a.abs_delta(&a), 0);
}

#[test]
fn stamp_and_timestamp_deltas_agree() {
    let pairs = [
        (Stamp::new(0, 0), Stamp::new(0, 999_999_999)),
        (Stamp::new(-1, 500), Stamp::new(1, 400)),
        (Stamp::new(1_750_838_478, 817_840_000), Stamp::new(1_750_838_478, 819_840_000)),
    ];
    for (a, b) in pairs {
        let ta = Timestamp::try_from(a).unwrap();
        let tb = Timestamp::try_from(b).unwrap();
        assert_eq!(a.abs_delta(&b), ta.abs_delta(tb));
    }
}

#[test]
fn integer_boundaries() {
    let max = Timestamp::from_nanos(i64::MAX);
    let min = Timestamp::from_nanos(i64::MIN);

    assert_eq!(max.abs_delta(min), u64::MAX);
    assert_eq!(Timestamp::try_from(max.to_stamp()).unwrap(), max);
    assert_eq!(Timestamp::try_from(min.to_stamp()).unwrap(), min);
    assert_eq!(max.checked_shift(1), Err(Error::TimestampOverflow));
    assert_eq!(min.signed_delta(max), Err(Error::TimestampOverflow));
}

#[test]
fn out_of_range_seconds_overflow() {
    assert_eq!(
        Timestamp::from_parts(i64::MAX / NANOS_PER_SEC + 1, 0),
        Err(Error::TimestampOverflow)
    );
}

#[test]
fn negative_instants_keep_valid_nanoseconds() {
    let stamp = Timestamp::from_nanos(-1).to_stamp();
    assert_eq!(stamp, Stamp::new(-1, 999_999_999));
    assert!(stamp.validate().is_ok());
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn nanoseconds_out_of_range_are_decode_errors() {
    let data = FixedHeaderCodec::payload(Stamp::new(1, 1_000_000_000), b"");
    let err = FixedHeaderCodec.timestamp("/cam", &data).unwrap_err();
    assert!(matches!(err, Error::Decode { ref stream, .. } if stream == "/cam"));
}

#[test]
fn malformed_message_aborts_audit() {
    let mut session = MemorySession::new();
    push(&mut session, "/mid", 0);
    session.push("/left", FixedHeaderCodec::payload(Stamp::new(0, u32::MAX), b""), 0);

    let err = run_audit(&session, &FixedHeaderCodec, &AuditConfig::new("/mid", ["/left"], 0))
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn truncated_payload_on_managed_stream_aborts_rewrite() {
    let mut session = MemorySession::new();
    for stream in ["/a", "/b"] {
        push(&mut session, stream, 0);
    }
    session.push("/a", vec![0; 4], 1);

    let config = ResequenceConfig::new(["/a", "/b"]);
    let err = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut MemorySession::new())
        .unwrap_err();
    assert!(matches!(err, Error::Decode { ref stream, .. } if stream == "/a"));
}

#[test]
fn pass_through_payloads_are_never_decoded() {
    let mut session = MemorySession::new();
    for stream in ["/a", "/b"] {
        push(&mut session, stream, 0);
    }
    session.push("/rosout", b"not a header".to_vec(), 3);

    let config = ResequenceConfig::new(["/a", "/b"]);
    let mut output = MemorySession::new();
    let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();
    assert_eq!(report.stats.passed_through, 1);
    assert_eq!(output.stream_messages("/rosout").next().unwrap().log_time, 3);
}

// ============================================================================
// Duplicates And Matching
// ============================================================================

#[test]
fn repeated_values_point_to_first_occurrence() {
    let secs = [1, 2, 1, 3, 1];
    let timestamps: Vec<_> = secs
        .iter()
        .map(|&s| Timestamp::from_parts(s, 0).unwrap())
        .collect();

    let found = find_duplicates(&timestamps);
    let pairs: Vec<_> = found.iter().map(|d| (d.index, d.first_index)).collect();
    assert_eq!(pairs, vec![(2, 0), (4, 0)]);
    assert!(find_duplicates(&ns(&[1, 2, 3])).is_empty());
}

#[test]
fn matcher_reference_example() {
    let report = match_forward(&ns(&[0, 100, 200]), &ns(&[1, 99, 205]), 0);
    let got: Vec<_> = report
        .matches
        .iter()
        .map(|m| (m.reference.as_nanos(), m.target.as_nanos(), m.delta_ns, m.within_tolerance))
        .collect();
    assert_eq!(
        got,
        vec![(0, 1, 1, false), (100, 99, 1, false), (200, 205, 5, false)]
    );
}

#[test]
fn matching_at_large_absolute_times() {
    let base = 1_750_838_478_817_840_000;
    let reference = ns(&[base, base + 33_333_333, base + 66_666_666]);
    let target = ns(&[base + 2, base + 33_333_330, base + 66_666_667]);
    let report = match_forward(&reference, &target, 5);
    assert_eq!(report.exceeded, 0);
    assert_eq!(report.matches[1].delta_ns, 3);
}

#[test]
fn single_message_streams() {
    let report = match_forward(&ns(&[7]), &ns(&[7]), 0);
    assert_eq!(report.pairs_checked, 1);
    assert_eq!(report.exceeded, 0);
    assert!(find_duplicates(&ns(&[7])).is_empty());
    assert!(analyze_cadence(&ns(&[7]), &CadenceConfig::default()).is_none());
}

// ============================================================================
// Anchor And Offset
// ============================================================================

#[test]
fn anchor_is_minimum_of_intersection() {
    let streams = vec![
        StreamTimestamps::new("/a", ns(&[10, 20, 30])),
        StreamTimestamps::new("/b", ns(&[20, 30, 40])),
        StreamTimestamps::new("/c", ns(&[5, 20, 99])),
    ];
    assert_eq!(resolve_anchor(&streams).unwrap().timestamp.as_nanos(), 20);

    let disjoint = vec![
        StreamTimestamps::new("/a", ns(&[1, 2])),
        StreamTimestamps::new("/b", ns(&[3, 4])),
    ];
    assert!(matches!(
        resolve_anchor(&disjoint),
        Err(Error::NoCommonTimestamp(_))
    ));
}

#[test]
fn anchor_needs_two_streams() {
    let single = vec![StreamTimestamps::new("/a", ns(&[1]))];
    assert_eq!(
        resolve_anchor(&single),
        Err(Error::InsufficientStreams {
            required: 2,
            actual: 1
        })
    );
}

#[test]
fn offset_reproduces_anchor() {
    let anchor = Timestamp::from_nanos(1000);
    let first = Timestamp::from_nanos(750);
    let offset = DomainOffset::between(anchor, first).unwrap();
    assert_eq!(offset.as_nanos(), 250);
    assert_eq!(offset.apply(first).unwrap(), anchor);
}

// ============================================================================
// Resequencing
// ============================================================================

fn three_cameras_and_imu() -> MemorySession {
    let mut session = MemorySession::new();
    for (cam, imu) in [(0, -100), (1000, 900), (2000, 1900)] {
        push(&mut session, "/imu/data", imu);
        for stream in ["/cam_mid", "/cam_left", "/cam_right"] {
            push(&mut session, stream, cam);
        }
        push(&mut session, "/tf", cam + 1);
    }
    session
}

fn camera_config() -> ResequenceConfig {
    ResequenceConfig::new(["/cam_mid", "/cam_left", "/cam_right"]).with_offset_stream("/imu/data")
}

#[test]
fn end_to_end_alignment() {
    let session = three_cameras_and_imu();
    let config = camera_config();
    let mut output = MemorySession::new();
    let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();

    assert_eq!(report.anchor.timestamp.as_nanos(), 0);
    assert_eq!(report.offsets.len(), 1);
    assert_eq!(report.offsets[0].offset.as_nanos(), 100);
    assert_eq!(stream_times(&output, "/imu/data"), vec![0, 1000, 2000]);

    let log_times: Vec<_> = output
        .stream_messages("/imu/data")
        .map(|m| m.log_time)
        .collect();
    assert_eq!(log_times, vec![0, 1000, 2000]);
}

#[test]
fn output_preserves_arrival_order_and_bodies() {
    let session = three_cameras_and_imu();
    let config = camera_config();
    let mut output = MemorySession::new();
    Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();

    let input: Vec<_> = session.log().iter().map(|m| m.stream.as_str()).collect();
    let written: Vec<_> = output.log().iter().map(|m| m.stream.as_str()).collect();
    assert_eq!(input, written);

    for message in output.log() {
        if message.stream != "/tf" {
            let record = FixedHeaderCodec.decode(&message.stream, &message.data).unwrap();
            assert_eq!(record.body, b"payload");
        }
    }
}

#[test]
fn pass_through_and_offset_cardinality_is_preserved() {
    let mut session = three_cameras_and_imu();
    // Repeated header times on non-managed streams must all survive.
    push(&mut session, "/tf", 1);
    push(&mut session, "/imu/data", 1900);

    let config = camera_config();
    let mut output = MemorySession::new();
    let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();

    assert_eq!(output.stream_messages("/tf").count(), 4);
    assert_eq!(output.stream_messages("/imu/data").count(), 4);
    assert!(report.stats.dropped.is_empty());
}

#[test]
fn managed_duplicates_are_dropped_and_reported() {
    let mut session = three_cameras_and_imu();
    push(&mut session, "/cam_left", 2000);
    push(&mut session, "/cam_left", 2000);

    let config = camera_config();
    let mut output = MemorySession::new();
    let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();

    assert_eq!(report.stats.dropped.len(), 2);
    assert!(report
        .stats
        .dropped
        .iter()
        .all(|d| d.stream == "/cam_left" && d.timestamp.as_nanos() == 2000));
    assert_eq!(stream_times(&output, "/cam_left"), vec![0, 1000, 2000]);

    let left = report
        .sync_streams
        .iter()
        .find(|s| s.stream == "/cam_left")
        .unwrap();
    assert_eq!(left.duplicates.len(), 2);
}

#[test]
fn no_common_timestamp_aborts_before_writing() {
    let mut session = MemorySession::new();
    push(&mut session, "/a", 0);
    push(&mut session, "/b", 1);

    let config = ResequenceConfig::new(["/a", "/b"]);
    let mut output = MemorySession::new();
    let err = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap_err();
    assert!(matches!(err, Error::NoCommonTimestamp(_)));
    assert!(output.is_empty());
}

#[test]
fn empty_sync_stream_is_fatal() {
    let mut session = MemorySession::new().with_stream(StreamMetadata::untyped("/b"));
    push(&mut session, "/a", 0);

    let config = ResequenceConfig::new(["/a", "/b"]);
    let err = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut MemorySession::new())
        .unwrap_err();
    assert_eq!(err, Error::EmptyStream("/b".into()));
}

#[test]
fn multiple_offset_domains() {
    let mut session = MemorySession::new();
    for t in [0, 10, 20] {
        push(&mut session, "/a", t);
        push(&mut session, "/b", t);
        push(&mut session, "/imu", t + 5_000);
        push(&mut session, "/gps", t - 7);
    }
    let config = ResequenceConfig::new(["/a", "/b"])
        .with_offset_stream("/imu")
        .with_offset_stream("/gps");
    let mut output = MemorySession::new();
    let report = Resequencer::new(&session, &FixedHeaderCodec, &config)
        .run(&mut output)
        .unwrap();

    let offsets: Vec<_> = report.offsets.iter().map(|o| o.offset.as_nanos()).collect();
    assert_eq!(offsets, vec![-5_000, 7]);
    assert_eq!(stream_times(&output, "/imu"), vec![0, 10, 20]);
    assert_eq!(stream_times(&output, "/gps"), vec![0, 10, 20]);
}

#[test]
fn writer_rejects_undeclared_stream() {
    let mut sink = MemorySession::new();
    assert_eq!(
        sink.write("/nowhere", b"", 0),
        Err(Error::UndeclaredStream("/nowhere".into()))
    );
}

#[test]
fn empty_plan_copies_session() {
    let session = three_cameras_and_imu();
    let mut output = MemorySession::new();
    let stats = stampsync_engine::resequence(
        &session,
        &ResequencePlan::new(),
        &FixedHeaderCodec,
        &mut output,
    )
    .unwrap();

    assert_eq!(stats.passed_through, session.len());
    assert_eq!(output.log(), session.log());
}
