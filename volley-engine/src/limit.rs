//! Per-template batch gating: count, deadline, jitter, rate cap

use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;
use volley_core::RequestTemplate;

/// Bounds of the random inter-batch sleep when `Randomize` is set
const JITTER_MIN_MS: u64 = 50;
const JITTER_MAX_MS: u64 = 550;

/// Whether the template should produce another batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    Continue,
    Stop,
}

/// Gates batches of one template.
///
/// Consulted once between batches; enforces the batch count, the wall-clock
/// deadline, the random jitter, and the average-rate cap. Each template gets
/// its own checker, so rate shaping needs no global coordination.
pub struct LimitChecker {
    count: u64,
    max_duration: Duration,
    max_req_sec: f64,
    randomize: bool,
    started: Instant,
    batches: u32,
}

impl LimitChecker {
    pub fn new(template: &RequestTemplate) -> Self {
        Self {
            count: template.count,
            max_duration: template.max_duration,
            max_req_sec: template.max_req_sec,
            randomize: template.randomize,
            started: Instant::now(),
            batches: 0,
        }
    }

    /// Record a completed batch and decide whether to continue.
    pub async fn check(&mut self) -> LimitDecision {
        self.batches += 1;

        if self.count > 0 && u64::from(self.batches) >= self.count {
            return LimitDecision::Stop;
        }

        if !self.max_duration.is_zero() && self.started.elapsed() >= self.max_duration {
            debug!("template deadline reached");
            return LimitDecision::Stop;
        }

        if self.randomize {
            let jitter =
                Duration::from_millis(rand::thread_rng().gen_range(JITTER_MIN_MS..JITTER_MAX_MS));
            sleep(jitter).await;
        }

        if self.max_req_sec > 0.0 {
            // Hold the running average at one batch per 1/max_req_sec
            let target_avg = Duration::from_secs_f64(1.0 / self.max_req_sec);
            let actual_avg = self.started.elapsed() / self.batches;
            if actual_avg < target_avg {
                sleep(target_avg - actual_avg).await;
            }
        }

        LimitDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(count: u64) -> RequestTemplate {
        RequestTemplate {
            url: "http://svc.local/".to_string(),
            count,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_count_limit() {
        let mut checker = LimitChecker::new(&template(2));
        assert_eq!(checker.check().await, LimitDecision::Continue);
        assert_eq!(checker.check().await, LimitDecision::Stop);
    }

    #[tokio::test]
    async fn test_unbounded_count_continues() {
        let mut checker = LimitChecker::new(&template(0));
        for _ in 0..16 {
            assert_eq!(checker.check().await, LimitDecision::Continue);
        }
    }

    #[tokio::test]
    async fn test_deadline_stops() {
        let mut tmpl = template(0);
        tmpl.max_duration = Duration::from_millis(20);
        let mut checker = LimitChecker::new(&tmpl);

        assert_eq!(checker.check().await, LimitDecision::Continue);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(checker.check().await, LimitDecision::Stop);
    }

    #[tokio::test]
    async fn test_rate_cap_slows_batches() {
        let mut tmpl = template(0);
        tmpl.max_req_sec = 50.0; // one batch per 20ms
        let mut checker = LimitChecker::new(&tmpl);

        let started = Instant::now();
        for _ in 0..5 {
            assert_eq!(checker.check().await, LimitDecision::Continue);
        }
        // Five checks should have padded the elapsed time to ~5 * 20ms
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
