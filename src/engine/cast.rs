/// Tracks the one manual cast that may be in flight.
#[derive(Debug)]
pub struct CastGuard {
    duration_ms: i64,
    started_at: Option<i64>,
}

impl CastGuard {
    pub fn new(duration_ms: i64) -> Self {
        Self { duration_ms: duration_ms.max(0), started_at: None }
    }

    pub fn in_flight(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn begin(&mut self, now_ms: i64) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now_ms);
        true
    }

    pub fn finish_if_due(&mut self, now_ms: i64) -> bool {
        match self.started_at {
            Some(start) if now_ms - start >= self.duration_ms => {
                self.started_at = None;
                true
            }
            _ => false,
        }
    }

    /// 0.0 when idle or just started, 1.0 when due.
    pub fn progress(&self, now_ms: i64) -> f64 {
        match self.started_at {
            Some(_) if self.duration_ms == 0 => 1.0,
            Some(start) => ((now_ms - start) as f64 / self.duration_ms as f64).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    pub fn cancel(&mut self) {
        self.started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_cast_rejected_while_in_flight() {
        let mut guard = CastGuard::new(2_500);
        assert!(guard.begin(0));
        assert!(!guard.begin(100));
        assert!(!guard.finish_if_due(2_499));
        assert!(guard.finish_if_due(2_500));
        assert!(!guard.in_flight());
        assert!(guard.begin(2_600));
    }

    #[test]
    fn test_progress() {
        let mut guard = CastGuard::new(2_000);
        assert_eq!(guard.progress(0), 0.0);
        guard.begin(1_000);
        assert_eq!(guard.progress(2_000), 0.5);
        assert_eq!(guard.progress(9_000), 1.0);
    }
}
