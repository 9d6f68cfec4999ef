use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::Rejection;
use super::round::RoundController;

/// One accepted buzz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuzzRecord {
    pub name: String,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Accepted buzzes of the current round, kept sorted by `elapsed_ms`.
///
/// Equal elapsed times keep their arrival order, so the earlier submission
/// wins the tie. Each name appears at most once.
#[derive(Debug, Default)]
pub struct BuzzLedger {
    records: Vec<BuzzRecord>,
}

impl BuzzLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a buzz for `name` at `now` and returns its 1-based rank.
    pub fn submit(
        &mut self,
        round: &RoundController,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, Rejection> {
        let started_at = round.started_at().ok_or(Rejection::NotActive)?;

        if self.contains(name) {
            return Err(Rejection::AlreadyBuzzed);
        }

        // A clock stepping backwards must not produce a negative offset
        let elapsed_ms = (now - started_at).num_milliseconds().max(0) as u64;

        let index = self
            .records
            .partition_point(|record| record.elapsed_ms <= elapsed_ms);
        self.records.insert(
            index,
            BuzzRecord {
                name: name.to_string(),
                elapsed_ms,
                timestamp: now,
            },
        );

        Ok(index + 1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|record| record.name == name)
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    /// Owned copy of the ordered records.
    pub fn snapshot(&self) -> Vec<BuzzRecord> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active_round() -> (RoundController, DateTime<Utc>) {
        let mut round = RoundController::new();
        let t0 = Utc::now();
        round.start(t0);
        (round, t0)
    }

    #[test]
    fn test_submit_requires_active_round() {
        let round = RoundController::new();
        let mut ledger = BuzzLedger::new();

        assert_eq!(
            ledger.submit(&round, "Alice", Utc::now()),
            Err(Rejection::NotActive)
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_second_buzz_rejected() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();

        assert_eq!(ledger.submit(&round, "Alice", t0 + Duration::milliseconds(50)), Ok(1));
        assert_eq!(
            ledger.submit(&round, "Alice", t0 + Duration::milliseconds(60)),
            Err(Rejection::AlreadyBuzzed)
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ranks_follow_elapsed_time() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();

        assert_eq!(ledger.submit(&round, "Alice", t0 + Duration::milliseconds(50)), Ok(1));
        assert_eq!(ledger.submit(&round, "Bob", t0 + Duration::milliseconds(80)), Ok(2));
        // Processed later but timed earlier, e.g. a skewed clock source
        assert_eq!(ledger.submit(&round, "Carol", t0 + Duration::milliseconds(20)), Ok(1));

        let snapshot = ledger.snapshot();
        let names: Vec<&str> = snapshot.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Carol", "Alice", "Bob"]);
        assert_eq!(snapshot[0].elapsed_ms, 20);
        assert!(snapshot.windows(2).all(|w| w[0].elapsed_ms <= w[1].elapsed_ms));
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();
        let at = t0 + Duration::milliseconds(42);

        assert_eq!(ledger.submit(&round, "Alice", at), Ok(1));
        assert_eq!(ledger.submit(&round, "Bob", at), Ok(2));
        assert_eq!(ledger.submit(&round, "Carol", at), Ok(3));

        let names: Vec<String> = ledger.snapshot().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_rank_matches_following_snapshot() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();
        let offsets = [70, 10, 40, 40, 5, 90, 10];

        for (i, offset) in offsets.iter().enumerate() {
            let name = format!("p{}", i);
            let rank = ledger
                .submit(&round, &name, t0 + Duration::milliseconds(*offset))
                .unwrap();
            let snapshot = ledger.snapshot();
            assert_eq!(snapshot[rank - 1].name, name);
        }
    }

    #[test]
    fn test_clock_before_anchor_clamps_to_zero() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();

        ledger.submit(&round, "Alice", t0 - Duration::milliseconds(3)).unwrap();
        assert_eq!(ledger.snapshot()[0].elapsed_ms, 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let (round, t0) = active_round();
        let mut ledger = BuzzLedger::new();
        ledger.submit(&round, "Alice", t0).unwrap();

        let mut snapshot = ledger.snapshot();
        snapshot.clear();
        assert_eq!(ledger.len(), 1);

        ledger.reset();
        assert!(ledger.snapshot().is_empty());
    }
}
