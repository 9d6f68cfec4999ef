use chrono::{DateTime, Utc};

/// Lifecycle of the single process-wide round.
///
/// `Idle` while `started_at` is `None`, `Active` otherwise.
#[derive(Debug, Default)]
pub struct RoundController {
    started_at: Option<DateTime<Utc>>,
}

impl RoundController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `Active` anchored at `now`. Restarting an active round re-anchors it.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.started_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.started_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_round_lifecycle() {
        let mut round = RoundController::new();
        assert!(!round.is_active());
        assert_eq!(round.started_at(), None);

        let t0 = Utc::now();
        round.start(t0);
        assert!(round.is_active());
        assert_eq!(round.started_at(), Some(t0));

        let t1 = t0 + Duration::seconds(5);
        round.start(t1);
        assert_eq!(round.started_at(), Some(t1));

        round.clear();
        assert!(!round.is_active());
        assert_eq!(round.started_at(), None);

        // Clearing an idle round is a no-op
        round.clear();
        assert!(!round.is_active());
    }
}
