//! "The Memory Cloud": clear the fog, pop memory bubbles, answer the question.

use crate::engine::{
    Blueprint, BlueprintError, Effect, Guard, Mechanic, StageSpec, TargetSpec, TransitionRule,
    TriggerKind, Tuning,
};

pub const INTRO: usize = 0;
pub const FOG: usize = 1;
pub const BUBBLES: usize = 2;
pub const QUESTION: usize = 3;

/// Photos shown under the fog.
pub const FOG_PHOTOS: usize = 6;

pub fn blueprint(tuning: &Tuning) -> Result<Blueprint, BlueprintError> {
    Blueprint::builder("memory-cloud")
        .stage(StageSpec::passive("intro"))
        .stage(StageSpec::new("fog", Mechanic::Gesture(tuning.fog_coverage)))
        .stage(StageSpec::new(
            "bubbles",
            Mechanic::Targets(TargetSpec::unordered(
                tuning.bubble_count,
                tuning.bubble_quota,
            )),
        ))
        .stage(StageSpec::passive("question"))
        .rule(TransitionRule::new(INTRO, TriggerKind::Click, FOG))
        // "Continue" only appears once the mist is gone.
        .rule(TransitionRule::new(FOG, TriggerKind::Click, BUBBLES).guarded(Guard::GestureResolved))
        .rule(
            TransitionRule::new(BUBBLES, TriggerKind::QuotaReached, QUESTION)
                .guarded(Guard::QuotaReached)
                .after(tuning.bubble_settle),
        )
        .effect(QUESTION, TriggerKind::Confirm, Effect::Confetti)
        .build()
}
