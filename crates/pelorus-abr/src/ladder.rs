use crate::error::{AbrError, AbrResult};

/// One quality level in the ladder.
///
/// Immutable once loaded; identity is the `id` string supplied by the
/// manifest layer, `bitrate_bps` is the nominal encoding bitrate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Representation {
    pub id: String,
    pub bitrate_bps: u64,
}

impl Representation {
    pub fn new(id: impl Into<String>, bitrate_bps: u64) -> Self {
        Self {
            id: id.into(),
            bitrate_bps,
        }
    }
}

/// Ordered, immutable list of representations.
///
/// Sorted ascending by `bitrate_bps` at construction; the ordering is
/// load-bearing because the hysteresis policy does index arithmetic to step
/// one rung up or down.
#[derive(Clone, Debug)]
pub struct Ladder {
    reps: Vec<Representation>,
}

impl Ladder {
    /// Build a ladder from manifest-supplied representations.
    ///
    /// Rejects an empty list. Input order does not matter; the ladder sorts
    /// ascending by bitrate (stable, so equal-bitrate entries keep their
    /// relative order).
    pub fn new(mut reps: Vec<Representation>) -> AbrResult<Self> {
        if reps.is_empty() {
            return Err(AbrError::EmptyLadder);
        }
        reps.sort_by_key(|r| r.bitrate_bps);
        Ok(Self { reps })
    }

    pub fn len(&self) -> usize {
        self.reps.len()
    }

    /// Always false; construction rejects empty ladders.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Representation> {
        self.reps.iter()
    }

    /// Lowest-bitrate rung. The ladder is never empty.
    pub fn lowest(&self) -> &Representation {
        &self.reps[0]
    }

    pub fn highest(&self) -> &Representation {
        &self.reps[self.reps.len() - 1]
    }

    pub fn get(&self, id: &str) -> Option<&Representation> {
        self.reps.iter().find(|r| r.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.reps.iter().position(|r| r.id == id)
    }

    /// The rung one step above `id`, if a higher one exists.
    pub fn step_up(&self, id: &str) -> Option<&Representation> {
        let idx = self.index_of(id)?;
        self.reps.get(idx + 1)
    }

    /// The rung one step below `id`, if a lower one exists.
    pub fn step_down(&self, id: &str) -> Option<&Representation> {
        let idx = self.index_of(id)?;
        idx.checked_sub(1).map(|i| &self.reps[i])
    }

    /// Highest rung strictly affordable under `budget_bps`, or the lowest
    /// rung when none qualifies.
    ///
    /// Equally-affordable candidates resolve to the higher bitrate because
    /// the ladder is scanned in ascending order.
    pub fn highest_affordable(&self, budget_bps: f64) -> &Representation {
        self.reps
            .iter()
            .filter(|r| (r.bitrate_bps as f64) < budget_bps)
            .next_back()
            .unwrap_or_else(|| self.lowest())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn ladder() -> Ladder {
        Ladder::new(vec![
            Representation::new("2m", 2_000_000),
            Representation::new("500k", 500_000),
            Representation::new("4m", 4_000_000),
            Representation::new("1m", 1_000_000),
        ])
        .unwrap()
    }

    #[test]
    fn empty_ladder_rejected() {
        assert!(matches!(Ladder::new(vec![]), Err(AbrError::EmptyLadder)));
    }

    #[test]
    fn sorted_ascending_regardless_of_input_order() {
        let l = ladder();
        let bitrates: Vec<u64> = l.iter().map(|r| r.bitrate_bps).collect();
        assert_eq!(bitrates, vec![500_000, 1_000_000, 2_000_000, 4_000_000]);
        assert_eq!(l.lowest().id, "500k");
        assert_eq!(l.highest().id, "4m");
    }

    #[test]
    fn step_up_and_down_follow_bitrate_order() {
        let l = ladder();
        assert_eq!(l.step_up("500k").unwrap().id, "1m");
        assert_eq!(l.step_down("4m").unwrap().id, "2m");
        assert!(l.step_up("4m").is_none());
        assert!(l.step_down("500k").is_none());
        assert!(l.step_up("nope").is_none());
    }

    #[rstest]
    // budget strictly above a rung selects it
    #[case(1_200_000.0, "1m")]
    // budget below every rung falls back to the lowest
    #[case(80_000.0, "500k")]
    // budget equal to a rung's bitrate is not affordable (strict less-than)
    #[case(1_000_000.0, "500k")]
    #[case(10_000_000.0, "4m")]
    fn highest_affordable_selection(#[case] budget: f64, #[case] expected: &str) {
        assert_eq!(ladder().highest_affordable(budget).id, expected);
    }
}
