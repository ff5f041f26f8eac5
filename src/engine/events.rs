use serde::Serialize;

use super::effects::Effect;
use super::rules::StageId;

/// Change notifications for presentation layers that subscribe instead of polling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExperienceEvent {
    #[serde(rename_all = "camelCase")]
    StageChanged {
        from: StageId,
        to: StageId,
        stage_name: String,
    },
    #[serde(rename_all = "camelCase")]
    TransitionScheduled { from: StageId, to: StageId, delay_ms: u64 },
    #[serde(rename_all = "camelCase")]
    GestureResolved { sample_count: usize },
    #[serde(rename_all = "camelCase")]
    TargetCompleted { target: usize, completed_count: usize },
    #[serde(rename_all = "camelCase")]
    QuotaReached { completed_count: usize },
    #[serde(rename_all = "camelCase")]
    RevealProgress { text: String, revealed: usize, total: usize },
    #[serde(rename_all = "camelCase")]
    RevealCompleted { text: String },
    #[serde(rename_all = "camelCase")]
    EffectFired { effect: Effect, count: u64 },
    Unmounted,
}
