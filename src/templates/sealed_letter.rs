//! "The Sealed Letter": receive the envelope, break the seal, unfold the flaps,
//! read the letter as it is written, then sign.

use crate::engine::{
    Blueprint, BlueprintError, Effect, Guard, Mechanic, RevealSpec, StageSpec, TargetSpec,
    TransitionRule, TriggerKind, Tuning,
};

pub const INTRO: usize = 0;
pub const ENVELOPE: usize = 1;
pub const UNFOLD: usize = 2;
pub const LETTER: usize = 3;
pub const SIGNED: usize = 4;

/// Unfold targets, in the order they must be opened.
pub const SEAL: usize = 0;
pub const TOP_FLAP: usize = 1;
pub const BOTTOM_FLAP: usize = 2;

pub fn blueprint(tuning: &Tuning) -> Result<Blueprint, BlueprintError> {
    Blueprint::builder("sealed-letter")
        .stage(StageSpec::passive("intro"))
        .stage(StageSpec::passive("envelope"))
        .stage(StageSpec::new(
            "unfold",
            Mechanic::Targets(TargetSpec::ordered(3)),
        ))
        .stage(StageSpec::new(
            "letter",
            Mechanic::Reveal(RevealSpec {
                interval: tuning.word_interval,
            }),
        ))
        .stage(StageSpec::passive("signed"))
        .rule(TransitionRule::new(INTRO, TriggerKind::Click, ENVELOPE))
        .rule(TransitionRule::new(ENVELOPE, TriggerKind::Click, UNFOLD))
        .rule(
            TransitionRule::new(UNFOLD, TriggerKind::QuotaReached, LETTER)
                .guarded(Guard::QuotaReached)
                .after(tuning.unfold_settle),
        )
        .rule(
            TransitionRule::new(LETTER, TriggerKind::Confirm, SIGNED)
                .guarded(Guard::RevealComplete)
                .firing(Effect::Confetti),
        )
        .build()
}
