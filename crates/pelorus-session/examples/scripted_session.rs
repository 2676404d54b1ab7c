//! Replays a scripted download trace through a session and prints the
//! summary. Run with `RUST_LOG=debug` to watch the decisions.

use std::time::{Duration, Instant};

use chrono::Utc;
use pelorus_abr::{AbrPolicy, Ladder, Representation};
use pelorus_session::{
    JsonlSink, ProgressEvent, SegmentOutcome, SessionConfig, SessionController,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let ladder = Ladder::new(vec![
        Representation::new("360p", 500_000),
        Representation::new("720p", 1_000_000),
        Representation::new("1080p", 2_000_000),
    ])?;

    // (bytes, elapsed_secs) per segment: a ramp up, a plateau, a congestion dip
    let trace: &[(u64, f64)] = &[
        (250_000, 1.0),
        (500_000, 1.0),
        (600_000, 0.9),
        (600_000, 0.8),
        (120_000, 1.6),
        (100_000, 1.8),
        (400_000, 1.0),
        (500_000, 0.9),
    ];

    let out_dir = std::env::temp_dir();
    let metrics_path = out_dir.join("pelorus-metrics.jsonl");
    let summary_path = out_dir.join("pelorus-summary.json");
    let sink = JsonlSink::create(&metrics_path, &summary_path)?;

    let mut session = SessionController::new(
        ladder,
        AbrPolicy::hysteresis(),
        SessionConfig::new(trace.len() as u64).with_segment_duration_secs(2.0),
        Box::new(sink),
    );

    let mut now = Instant::now();
    for &(bytes, elapsed_secs) in trace {
        let request = session.begin_segment(now)?;
        now += Duration::from_secs_f64(elapsed_secs);
        let event = ProgressEvent::completed(
            request.segment_index,
            request.representation.id.clone(),
            bytes,
            elapsed_secs,
            Utc::now(),
        );
        match session.on_progress(&event, now)? {
            SegmentOutcome::Advanced { decision } => {
                println!(
                    "segment {:>2} @ {:<6} -> next {:<6} ({:?})",
                    request.segment_index,
                    request.representation.id,
                    decision.target.id,
                    decision.reason
                );
            }
            SegmentOutcome::Finished { summary, .. } => {
                println!("session finished: {summary:#?}");
            }
            SegmentOutcome::InFlight => unreachable!("trace only sends final observations"),
        }
    }

    println!("metrics: {}", metrics_path.display());
    println!("summary: {}", summary_path.display());
    Ok(())
}
