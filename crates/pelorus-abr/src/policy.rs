use crate::{
    error::{AbrError, AbrResult},
    ladder::{Ladder, Representation},
};

/// Default affordability safety factor for the threshold policy.
pub const DEFAULT_SAFETY_FACTOR: f64 = 0.8;

/// Default up-switch ratio for the hysteresis policy.
pub const DEFAULT_UP_RATIO: f64 = 1.5;

/// Default down-switch ratio for the hysteresis policy.
pub const DEFAULT_DOWN_RATIO: f64 = 0.8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbrReason {
    UpSwitch,
    DownSwitch,
    Hold,
}

/// Outcome of one decision. `target` is the representation to request next;
/// `changed` is true when it differs from the current one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbrDecision {
    pub target: Representation,
    pub reason: AbrReason,
    pub changed: bool,
}

/// Interchangeable decision policies.
///
/// Both are pure functions of `(ladder, current, smoothed throughput)`; they
/// never touch buffer or window state. The chunked-HTTP transport uses
/// `Threshold`, the multiplexed-stream transport uses `Hysteresis`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbrPolicy {
    /// Pick the highest representation whose bitrate is strictly under
    /// `smoothed * safety_factor`; fall back to the lowest when none is.
    Threshold { safety_factor: f64 },

    /// Compare throughput against the current rung only and move at most one
    /// rung per decision: up past `current * up_ratio`, down past
    /// `current * down_ratio`, hold in between. The bounded step keeps a
    /// throughput spike from jumping the whole ladder.
    Hysteresis { up_ratio: f64, down_ratio: f64 },
}

impl Default for AbrPolicy {
    fn default() -> Self {
        Self::threshold()
    }
}

impl AbrPolicy {
    pub fn threshold() -> Self {
        Self::Threshold {
            safety_factor: DEFAULT_SAFETY_FACTOR,
        }
    }

    pub fn hysteresis() -> Self {
        Self::Hysteresis {
            up_ratio: DEFAULT_UP_RATIO,
            down_ratio: DEFAULT_DOWN_RATIO,
        }
    }

    /// Decide the next representation to request.
    ///
    /// `current` must be a rung of `ladder`; anything else signals a caller
    /// bug and is rejected.
    pub fn decide(
        &self,
        ladder: &Ladder,
        current: &Representation,
        smoothed_bps: f64,
    ) -> AbrResult<AbrDecision> {
        if ladder.get(&current.id).is_none() {
            return Err(AbrError::UnknownRepresentation(current.id.clone()));
        }

        let decision = match *self {
            Self::Threshold { safety_factor } => {
                let budget = smoothed_bps * safety_factor;
                let target = ladder.highest_affordable(budget).clone();
                let reason = if target.bitrate_bps > current.bitrate_bps {
                    AbrReason::UpSwitch
                } else if target.bitrate_bps < current.bitrate_bps {
                    AbrReason::DownSwitch
                } else {
                    AbrReason::Hold
                };
                let changed = target.id != current.id;
                AbrDecision {
                    target,
                    reason,
                    changed,
                }
            }
            Self::Hysteresis {
                up_ratio,
                down_ratio,
            } => {
                let current_bps = current.bitrate_bps as f64;
                if smoothed_bps > current_bps * up_ratio {
                    match ladder.step_up(&current.id) {
                        Some(up) => AbrDecision {
                            target: up.clone(),
                            reason: AbrReason::UpSwitch,
                            changed: true,
                        },
                        None => hold(current),
                    }
                } else if smoothed_bps < current_bps * down_ratio {
                    match ladder.step_down(&current.id) {
                        Some(down) => AbrDecision {
                            target: down.clone(),
                            reason: AbrReason::DownSwitch,
                            changed: true,
                        },
                        None => hold(current),
                    }
                } else {
                    // between thresholds: keep the current rung
                    hold(current)
                }
            }
        };

        tracing::debug!(
            current = %current.id,
            current_bps = current.bitrate_bps,
            smoothed_bps,
            target = %decision.target.id,
            reason = ?decision.reason,
            changed = decision.changed,
            "ABR decide"
        );

        Ok(decision)
    }
}

fn hold(current: &Representation) -> AbrDecision {
    AbrDecision {
        target: current.clone(),
        reason: AbrReason::Hold,
        changed: false,
    }
}
