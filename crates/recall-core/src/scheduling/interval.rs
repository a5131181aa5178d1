//! Review interval strategies.
//!
//! The status updater asks a strategy for the next interval given how well
//! the review went and the resource's history. Three policies ship:
//!
//! - [`FixedInterval`]: 7 days on full credit, 1 day on any miss.
//! - [`ExponentialInterval`]: consecutive full-credit reviews grow the
//!   interval geometrically; any miss drops back to the short baseline.
//! - [`FsrsInterval`]: FSRS stability growth, with the interval equal to the
//!   estimated stability.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{RecallError, RecallResult};

/// What a strategy knows about a finished review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalInput {
    /// `score / total`, in `[0, 1]`.
    pub ratio: f64,
    /// Completed reviews before this one.
    pub prior_review_count: u32,
    /// Interval the resource was on before this review, if scheduled.
    pub prior_interval: Option<Duration>,
}

impl IntervalInput {
    pub fn new(score: u32, total: u32, prior_review_count: u32, prior_interval: Option<Duration>) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            (score as f64 / total as f64).clamp(0.0, 1.0)
        };
        Self {
            ratio,
            prior_review_count,
            prior_interval,
        }
    }

    pub fn is_full_credit(&self) -> bool {
        self.ratio >= 1.0
    }

    fn prior_days(&self) -> Option<f64> {
        self.prior_interval
            .map(|d| d.num_seconds() as f64 / 86_400.0)
            .filter(|d| *d > 0.0)
    }
}

/// Trait for review interval policies.
pub trait IntervalStrategy: Send + Sync {
    /// Policy name.
    fn name(&self) -> &str;

    /// Interval until the next review. Always at least one day.
    fn next_interval(&self, input: &IntervalInput) -> Duration;
}

/// Flat pass/miss rule.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    pub pass_days: u32,
    pub miss_days: u32,
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self {
            pass_days: 7,
            miss_days: 1,
        }
    }
}

impl IntervalStrategy for FixedInterval {
    fn name(&self) -> &str {
        "fixed"
    }

    fn next_interval(&self, input: &IntervalInput) -> Duration {
        let days = if input.is_full_credit() {
            self.pass_days
        } else {
            self.miss_days
        };
        Duration::days(days.max(1) as i64)
    }
}

/// Geometric growth on consecutive full-credit reviews.
#[derive(Debug, Clone)]
pub struct ExponentialInterval {
    /// First full-credit interval, and the floor growth starts from.
    pub pass_days: u32,
    /// Interval after any miss.
    pub miss_days: u32,
    /// Multiplier applied per consecutive full-credit review.
    pub growth: f64,
    /// Upper bound.
    pub max_days: u32,
}

impl Default for ExponentialInterval {
    fn default() -> Self {
        Self {
            pass_days: 7,
            miss_days: 1,
            growth: 2.0,
            max_days: 180,
        }
    }
}

impl IntervalStrategy for ExponentialInterval {
    fn name(&self) -> &str {
        "exponential"
    }

    fn next_interval(&self, input: &IntervalInput) -> Duration {
        if !input.is_full_credit() {
            return Duration::days(self.miss_days.max(1) as i64);
        }

        let pass = self.pass_days.max(1) as f64;
        let days = match input.prior_days() {
            // Coming off a pass interval: grow it.
            Some(prior) if input.prior_review_count > 0 && prior >= pass => prior * self.growth,
            // Never reviewed, or coming off a miss.
            _ => pass,
        };
        let days = if days.is_nan() { pass } else { days };

        let days = days.round().clamp(1.0, self.max_days.max(1) as f64);
        Duration::days(days as i64)
    }
}

/// FSRS-style stability growth.
///
/// The prior interval stands in for the last stability estimate: the
/// resource was scheduled to come due when recall probability reached 90%.
#[derive(Debug, Clone)]
pub struct FsrsInterval {
    decay: f32,
    initial_stability: [f32; 3],
    max_days: u32,
}

/// Recall quality derived from the score ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recall {
    Again,
    Hard,
    Good,
}

impl Recall {
    fn from_ratio(ratio: f64) -> Self {
        if ratio >= 1.0 {
            Recall::Good
        } else if ratio >= 0.6 {
            Recall::Hard
        } else {
            Recall::Again
        }
    }
}

impl FsrsInterval {
    pub fn new(max_days: u32) -> Self {
        Self {
            decay: fsrs::FSRS6_DEFAULT_DECAY,
            // Initial stability by grade (FSRS default parameters w[0..3])
            initial_stability: [
                fsrs::DEFAULT_PARAMETERS[0],
                fsrs::DEFAULT_PARAMETERS[1],
                fsrs::DEFAULT_PARAMETERS[2],
            ],
            max_days,
        }
    }

    /// Probability of recall after `days_elapsed` at the given stability.
    pub fn retrievability(&self, stability: f32, days_elapsed: f32) -> f32 {
        if days_elapsed <= 0.0 {
            return 1.0;
        }
        if stability <= 0.001 {
            return 0.0;
        }
        let state = fsrs::MemoryState {
            stability,
            difficulty: 5.0,
        };
        fsrs::current_retrievability(state, days_elapsed, self.decay)
    }

    fn next_stability(&self, recall: Recall, prior: Option<f32>) -> f32 {
        let Some(stability) = prior else {
            return match recall {
                Recall::Again => self.initial_stability[0],
                Recall::Hard => self.initial_stability[1],
                Recall::Good => self.initial_stability[2],
            };
        };

        // Reviewed on schedule, so elapsed time equals the prior interval.
        let retrievability = self.retrievability(stability, stability);
        match recall {
            Recall::Again => {
                let lapse_factor = 0.3 * (1.0 - retrievability).max(0.1);
                (stability * lapse_factor).max(0.1)
            }
            Recall::Hard | Recall::Good => {
                let multiplier = if recall == Recall::Good { 1.5 } else { 1.2 };
                let boost = ((1.0 - retrievability) * 0.5 + 1.0).min(1.5);
                stability * multiplier * boost
            }
        }
    }
}

impl Default for FsrsInterval {
    fn default() -> Self {
        Self::new(365)
    }
}

impl IntervalStrategy for FsrsInterval {
    fn name(&self) -> &str {
        "fsrs"
    }

    fn next_interval(&self, input: &IntervalInput) -> Duration {
        let recall = Recall::from_ratio(input.ratio);
        let prior = if input.prior_review_count > 0 {
            input.prior_days().map(|d| d as f32)
        } else {
            None
        };

        let stability = self.next_stability(recall, prior);
        let days = (stability.round() as i64).clamp(1, self.max_days.max(1) as i64);
        Duration::days(days)
    }
}

/// Interval policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntervalPolicy {
    #[default]
    Fixed,
    Exponential,
    Fsrs,
}

impl std::str::FromStr for IntervalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" | "binary" => Ok(IntervalPolicy::Fixed),
            "exponential" | "growth" => Ok(IntervalPolicy::Exponential),
            "fsrs" => Ok(IntervalPolicy::Fsrs),
            other => Err(format!("unknown interval policy '{}'", other)),
        }
    }
}

/// Interval policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Which policy to use.
    pub policy: IntervalPolicy,
    /// Full-credit interval (fixed) or first full-credit interval (exponential).
    pub pass_days: u32,
    /// Interval after any miss.
    pub miss_days: u32,
    /// Growth multiplier (exponential).
    pub growth: f64,
    /// Interval cap (exponential, fsrs).
    pub max_days: u32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            policy: IntervalPolicy::Fixed,
            pass_days: 7,
            miss_days: 1,
            growth: 2.0,
            max_days: 180,
        }
    }
}

impl IntervalConfig {
    /// Reject settings that would schedule zero-day or shrinking intervals.
    pub fn validate(&self) -> RecallResult<()> {
        if self.pass_days == 0 || self.miss_days == 0 || self.max_days == 0 {
            return Err(RecallError::Configuration(
                "interval days must be positive".to_string(),
            ));
        }
        if !self.growth.is_finite() || self.growth < 1.0 {
            return Err(RecallError::Configuration(format!(
                "interval growth must be a finite number of at least 1.0, got {}",
                self.growth
            )));
        }
        Ok(())
    }

    /// Build the configured strategy.
    pub fn build(&self) -> Arc<dyn IntervalStrategy> {
        match self.policy {
            IntervalPolicy::Fixed => Arc::new(FixedInterval {
                pass_days: self.pass_days,
                miss_days: self.miss_days,
            }),
            IntervalPolicy::Exponential => Arc::new(ExponentialInterval {
                pass_days: self.pass_days,
                miss_days: self.miss_days,
                growth: self.growth,
                max_days: self.max_days,
            }),
            IntervalPolicy::Fsrs => Arc::new(FsrsInterval::new(self.max_days)),
        }
    }
}
