use std::sync::Arc;

/// Adapter-supplied RTT heuristic.
///
/// The core never sees packets, so it accepts a numeric RTT estimate derived
/// from each observation's `(bytes, elapsed_secs)`. Transports plug in
/// whichever heuristic matches their delivery path.
pub type RttEstimator = Arc<dyn Fn(u64, f64) -> f64 + Send + Sync>;

/// Treat the whole download time as the RTT.
///
/// The chunked-HTTP path's heuristic: with one request per segment the
/// response time is the only latency signal available.
pub fn elapsed_as_rtt() -> RttEstimator {
    Arc::new(|_bytes, elapsed_secs| elapsed_secs)
}

/// Payload-aware heuristic used by the multiplexed-stream path.
///
/// Small payloads are dominated by round-trip latency, so their elapsed time
/// approximates RTT directly; for larger payloads only a fixed fraction of
/// the transfer time is attributed to latency.
pub fn payload_scaled(small_payload_bytes: u64, fraction: f64) -> RttEstimator {
    Arc::new(move |bytes, elapsed_secs| {
        if bytes < small_payload_bytes {
            elapsed_secs
        } else {
            elapsed_secs * fraction
        }
    })
}

/// Reference parameters for [`payload_scaled`].
pub const DEFAULT_SMALL_PAYLOAD_BYTES: u64 = 10_000;
pub const DEFAULT_RTT_FRACTION: f64 = 0.1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_heuristic_passes_through() {
        let rtt = elapsed_as_rtt();
        assert_eq!(rtt(1, 0.25), 0.25);
        assert_eq!(rtt(1_000_000, 0.25), 0.25);
    }

    #[test]
    fn payload_scaled_splits_on_threshold() {
        let rtt = payload_scaled(DEFAULT_SMALL_PAYLOAD_BYTES, DEFAULT_RTT_FRACTION);
        // below the threshold: elapsed is the estimate
        assert_eq!(rtt(9_999, 0.5), 0.5);
        // at or above: scaled by the fraction
        assert_eq!(rtt(10_000, 0.5), 0.05);
        assert_eq!(rtt(5_000_000, 2.0), 0.2);
    }
}
