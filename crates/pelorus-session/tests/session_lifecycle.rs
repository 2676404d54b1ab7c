//! End-to-end session runs driven by scripted observation traces.

use std::time::Instant;

use pelorus_abr::{AbrPolicy, AbrReason};
use pelorus_session::{
    ProgressEvent, SegmentOutcome, SessionConfig, SessionController, SessionEvent, SessionState,
};
use pelorus_test_utils::{ladder_3_rung, partial, segment_done, MemorySink, ScriptedTrace};

fn threshold_session(total_segments: u64) -> (SessionController, pelorus_test_utils::MemorySinkHandle) {
    let (sink, handle) = MemorySink::new();
    let session = SessionController::new(
        ladder_3_rung(),
        AbrPolicy::threshold(),
        SessionConfig::new(total_segments),
        Box::new(sink),
    );
    (session, handle)
}

/// Drive one completed segment through the loop and return its outcome.
fn run_segment(
    session: &mut SessionController,
    bytes: u64,
    elapsed_secs: f64,
    now: Instant,
) -> SegmentOutcome {
    let request = session.begin_segment(now).unwrap();
    let event = segment_done(
        request.segment_index,
        &request.representation.id,
        bytes,
        elapsed_secs,
    );
    session.on_progress(&event, now).unwrap()
}

#[test]
fn threshold_session_switches_on_throughput_evidence() {
    let (mut session, handle) = threshold_session(3);
    let now = Instant::now();

    // 4 Mbps: budget 3.2 Mbps, jumps straight to the top rung
    let outcome = run_segment(&mut session, 500_000, 1.0, now);
    match outcome {
        SegmentOutcome::Advanced { decision } => {
            assert_eq!(decision.target.id, "1080p");
            assert_eq!(decision.reason, AbrReason::UpSwitch);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.current_representation().id, "1080p");

    // 2 Mbps: smoothed 3 Mbps, budget 2.4 Mbps, the top rung still qualifies
    let outcome = run_segment(&mut session, 250_000, 1.0, now);
    match outcome {
        SegmentOutcome::Advanced { decision } => {
            assert_eq!(decision.target.id, "1080p");
            assert!(!decision.changed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // 0.5 Mbps: smoothed drops, final decision steps down and finishes
    let outcome = run_segment(&mut session, 62_500, 1.0, now);
    match outcome {
        SegmentOutcome::Finished { decision, summary } => {
            assert_eq!(decision.target.id, "720p");
            assert_eq!(decision.reason, AbrReason::DownSwitch);
            assert_eq!(summary.records, 3);
            assert_eq!(summary.completed_segments, 3);
            assert_eq!(summary.bitrate_switches, 1);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Finished);

    // the summary reached the sink
    let persisted = handle.summary().expect("summary persisted at finish");
    assert_eq!(persisted.completed_segments, 3);
    assert_eq!(handle.record_count(), 3);
}

#[test]
fn metric_log_order_matches_injection_order() {
    let (mut session, handle) = threshold_session(1);
    let now = Instant::now();
    let request = session.begin_segment(now).unwrap();
    let rep = request.representation.id.clone();

    // chunked cadence: three partials then the final, all for segment 0
    let trace = ScriptedTrace::new()
        .then(50_000, 0.2)
        .then(120_000, 0.5)
        .then(200_000, 0.8)
        .then(250_000, 1.0);
    let (partials, last) = trace.steps().split_at(trace.len() - 1);
    for &(bytes, elapsed) in partials {
        let outcome = session.on_progress(&partial(0, &rep, bytes, elapsed), now).unwrap();
        assert!(matches!(outcome, SegmentOutcome::InFlight));
    }
    let (bytes, elapsed) = last[0];
    session
        .on_progress(&segment_done(0, &rep, bytes, elapsed), now)
        .unwrap();

    let records = handle.records();
    let byte_counts: Vec<u64> = records.iter().map(|r| r.bytes).collect();
    assert_eq!(byte_counts, vec![50_000, 120_000, 200_000, 250_000]);
    let completions: Vec<bool> = records.iter().map(|r| r.is_complete).collect();
    assert_eq!(completions, vec![false, false, false, true]);
}

#[test]
fn partial_observations_never_trigger_decisions() {
    let (mut session, _handle) = threshold_session(2);
    let now = Instant::now();
    let request = session.begin_segment(now).unwrap();
    let rep = request.representation.id.clone();

    // plenty of throughput in the partials, but no decision until the final
    for i in 1..=5u64 {
        let outcome = session
            .on_progress(&partial(0, &rep, i * 1_000_000, i as f64 * 0.1), now)
            .unwrap();
        assert!(matches!(outcome, SegmentOutcome::InFlight));
        assert_eq!(session.current_representation().id, "360p");
    }

    let outcome = session
        .on_progress(&segment_done(0, &rep, 5_000_000, 0.5), now)
        .unwrap();
    assert!(matches!(outcome, SegmentOutcome::Advanced { .. }));
    assert_ne!(session.current_representation().id, "360p");
}

#[test]
fn events_narrate_the_session() {
    let (mut session, _handle) = threshold_session(1);
    let mut events = session.subscribe();
    let now = Instant::now();

    run_segment(&mut session, 500_000, 1.0, now);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(
        seen.first(),
        Some(SessionEvent::SegmentRequested { segment_index: 0, .. })
    ));
    assert!(seen
        .iter()
        .any(|e| matches!(e, SessionEvent::RebufferStarted { segment_index: 0 })));
    assert!(seen
        .iter()
        .any(|e| matches!(e, SessionEvent::SegmentCompleted { segment_index: 0, .. })));
    assert!(seen.iter().any(|e| matches!(
        e,
        SessionEvent::RepresentationSwitched { reason: AbrReason::UpSwitch, .. }
    )));
    assert!(matches!(
        seen.last(),
        Some(SessionEvent::SessionFinished { .. })
    ));
}

#[test]
fn single_observation_cadence_and_chunked_cadence_agree_on_buffer_state() {
    // same bytes and total elapsed, reported two ways
    let (mut single, single_handle) = threshold_session(2);
    let (mut chunked, chunked_handle) = threshold_session(2);
    let now = Instant::now();

    for session in [&mut single, &mut chunked] {
        session.begin_segment(now).unwrap();
    }
    single
        .on_progress(&segment_done(0, "360p", 250_000, 1.0), now)
        .unwrap();
    chunked
        .on_progress(&partial(0, "360p", 100_000, 0.4).with_first_chunk(), now)
        .unwrap();
    chunked
        .on_progress(&segment_done(0, "360p", 250_000, 1.0), now)
        .unwrap();

    let single_last = single_handle.records().pop().unwrap();
    let chunked_last = chunked_handle.records().pop().unwrap();
    assert_eq!(single_last.buffer_level_secs, chunked_last.buffer_level_secs);
    assert_eq!(single_last.rebuffer_count, chunked_last.rebuffer_count);
}

#[test]
fn foreign_representation_id_never_reaches_the_metric_log() {
    let (mut session, handle) = threshold_session(2);
    let now = Instant::now();
    session.begin_segment(now).unwrap();

    // claims a representation the ladder has never heard of
    let bogus = segment_done(0, "not-in-ladder", 250_000, 1.0);
    assert!(session.on_progress(&bogus, now).is_err());
    assert_eq!(handle.record_count(), 0);

    // the segment is still in flight and a correct observation completes it
    let good = segment_done(0, "360p", 250_000, 1.0);
    session.on_progress(&good, now).unwrap();
    let records = handle.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].representation_id, "360p");
}

#[test]
fn empty_session_summary_is_well_defined() {
    let (mut session, handle) = threshold_session(1);
    let summary = session.abort(Instant::now()).unwrap();
    assert_eq!(summary, pelorus_session::SessionSummary::default());
    assert!(handle.summary().is_some());
}

#[test]
fn progress_event_constructors_mark_finality() {
    let done: ProgressEvent = segment_done(3, "720p", 1, 0.1);
    assert!(done.is_final);
    let chunk = partial(3, "720p", 1, 0.1);
    assert!(!chunk.is_final);
}
