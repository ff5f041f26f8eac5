use std::time::Duration;

use super::gesture::CoverageThreshold;

/// Tunable thresholds and timings shared by the built-in templates.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Pointer movement needed to clear the memory cloud fog
    pub fog_coverage: CoverageThreshold,

    /// Memory bubbles on screen, and how many must pop to move on
    pub bubble_count: usize,
    pub bubble_quota: usize,

    /// Pause after the last required bubble before the question appears
    pub bubble_settle: Duration,

    /// Pause after the bottom flap opens before the letter appears
    pub unfold_settle: Duration,

    /// Time between revealed words of the letter
    pub word_interval: Duration,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fog_coverage: CoverageThreshold::Samples(80),
            bubble_count: 8,
            bubble_quota: 5,
            bubble_settle: Duration::from_millis(600),
            unfold_settle: Duration::from_millis(500),
            word_interval: Duration::from_millis(120),
        }
    }
}

impl Tuning {
    /// Short timings for demos and smoke runs.
    pub fn fast() -> Self {
        Self {
            bubble_settle: Duration::from_millis(60),
            unfold_settle: Duration::from_millis(50),
            word_interval: Duration::from_millis(12),
            ..Self::default()
        }
    }

    /// `KEEPSAKE_FAST=1` (or `true`) selects [`Tuning::fast`].
    pub fn from_env() -> Self {
        let fast = std::env::var("KEEPSAKE_FAST")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if fast {
            Self::fast()
        } else {
            Self::default()
        }
    }
}
