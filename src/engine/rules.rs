use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::completion::TargetSpec;
use super::effects::Effect;
use super::gesture::CoverageThreshold;

/// Position of a stage inside a template's linear narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub usize);

impl StageId {
    pub const INITIAL: StageId = StageId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealSpec {
    pub interval: Duration,
}

/// Interactive mechanic a stage embeds. The session builds a fresh component
/// for it every time the stage is entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mechanic {
    Passive,
    Gesture(CoverageThreshold),
    Targets(TargetSpec),
    Reveal(RevealSpec),
}

impl Default for Mechanic {
    fn default() -> Self {
        Mechanic::Passive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSpec {
    pub name: String,
    pub mechanic: Mechanic,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, mechanic: Mechanic) -> Self {
        Self {
            name: name.into(),
            mechanic,
        }
    }

    pub fn passive(name: impl Into<String>) -> Self {
        Self::new(name, Mechanic::Passive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    /// Explicit button press that moves the story along.
    Click,
    /// Affirmative answer on a closing stage.
    Confirm,
    GestureResolved,
    QuotaReached,
    RevealComplete,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Click => "click",
            TriggerKind::Confirm => "confirm",
            TriggerKind::GestureResolved => "gesture-resolved",
            TriggerKind::QuotaReached => "quota-reached",
            TriggerKind::RevealComplete => "reveal-complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Guard {
    Always,
    GestureResolved,
    QuotaReached,
    RevealComplete,
}

impl Guard {
    /// Whether a stage with `mechanic` can ever satisfy this guard.
    fn fits(&self, mechanic: &Mechanic) -> bool {
        matches!(
            (self, mechanic),
            (Guard::Always, _)
                | (Guard::GestureResolved, Mechanic::Gesture(_))
                | (Guard::QuotaReached, Mechanic::Targets(_))
                | (Guard::RevealComplete, Mechanic::Reveal(_))
        )
    }
}

/// Internally raised triggers only make sense from a stage with the mechanic
/// that raises them.
fn trigger_fits(on: TriggerKind, mechanic: &Mechanic) -> bool {
    match on {
        TriggerKind::Click | TriggerKind::Confirm => true,
        TriggerKind::GestureResolved => matches!(mechanic, Mechanic::Gesture(_)),
        TriggerKind::QuotaReached => matches!(mechanic, Mechanic::Targets(_)),
        TriggerKind::RevealComplete => matches!(mechanic, Mechanic::Reveal(_)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRule {
    pub from: StageId,
    pub on: TriggerKind,
    pub guard: Guard,
    pub delay: Option<Duration>,
    pub to: StageId,
    pub effect: Option<Effect>,
}

impl TransitionRule {
    pub fn new(from: usize, on: TriggerKind, to: usize) -> Self {
        Self {
            from: StageId(from),
            on,
            guard: Guard::Always,
            delay: None,
            to: StageId(to),
            effect: None,
        }
    }

    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn firing(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectBinding {
    pub stage: StageId,
    pub on: TriggerKind,
    pub effect: Effect,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("blueprint '{0}' has no stages")]
    NoStages(String),
    #[error("rule {index} references {stage}, but only {count} stages exist")]
    StageOutOfRange {
        index: usize,
        stage: StageId,
        count: usize,
    },
    #[error("rule {index} does not move forward from {from} to {to}")]
    NotForward {
        index: usize,
        from: StageId,
        to: StageId,
    },
    #[error("{stage} has more than one rule for trigger '{trigger}'")]
    DuplicateRule { stage: StageId, trigger: &'static str },
    #[error("rule {index} uses a guard or trigger that {stage} ('{name}') cannot satisfy")]
    MechanicMismatch {
        index: usize,
        stage: StageId,
        name: String,
    },
    #[error("{stage} requires {quota} of {total} targets")]
    InvalidQuota {
        stage: StageId,
        quota: usize,
        total: usize,
    },
    #[error("{stage} has a zero reveal interval")]
    ZeroInterval { stage: StageId },
    #[error("{stage} has a gesture cell size that is not a positive number")]
    InvalidCoverage { stage: StageId },
    #[error("{stage} has more than one delayed rule")]
    MultipleDelayed { stage: StageId },
    #[error("effect binding references {stage}, but only {count} stages exist")]
    EffectOutOfRange { stage: StageId, count: usize },
}

/// Static, validated description of one template's state machine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blueprint {
    name: String,
    stages: Vec<StageSpec>,
    rules: Vec<TransitionRule>,
    effects: Vec<EffectBinding>,
}

impl Blueprint {
    pub fn builder(name: impl Into<String>) -> BlueprintBuilder {
        BlueprintBuilder {
            name: name.into(),
            stages: Vec::new(),
            rules: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn stage(&self, id: StageId) -> &StageSpec {
        // Every StageId the session holds was checked by `build`.
        &self.stages[id.0]
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn terminal(&self) -> StageId {
        StageId(self.stages.len() - 1)
    }

    /// The rule leaving `stage` on `on`, along with its index.
    pub fn rule_for(&self, stage: StageId, on: TriggerKind) -> Option<(usize, &TransitionRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.from == stage && rule.on == on)
    }

    pub fn effect_for(&self, stage: StageId, on: TriggerKind) -> Option<Effect> {
        self.effects
            .iter()
            .find(|binding| binding.stage == stage && binding.on == on)
            .map(|binding| binding.effect)
    }
}

pub struct BlueprintBuilder {
    name: String,
    stages: Vec<StageSpec>,
    rules: Vec<TransitionRule>,
    effects: Vec<EffectBinding>,
}

impl BlueprintBuilder {
    pub fn stage(mut self, spec: StageSpec) -> Self {
        self.stages.push(spec);
        self
    }

    pub fn rule(mut self, rule: TransitionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn effect(mut self, stage: usize, on: TriggerKind, effect: Effect) -> Self {
        self.effects.push(EffectBinding {
            stage: StageId(stage),
            on,
            effect,
        });
        self
    }

    pub fn build(self) -> Result<Blueprint, BlueprintError> {
        let count = self.stages.len();
        if count == 0 {
            return Err(BlueprintError::NoStages(self.name));
        }

        for (index, spec) in self.stages.iter().enumerate() {
            let stage = StageId(index);
            match spec.mechanic {
                Mechanic::Targets(targets) => {
                    if targets.quota == 0 || targets.quota > targets.total {
                        return Err(BlueprintError::InvalidQuota {
                            stage,
                            quota: targets.quota,
                            total: targets.total,
                        });
                    }
                }
                Mechanic::Reveal(reveal) if reveal.interval.is_zero() => {
                    return Err(BlueprintError::ZeroInterval { stage });
                }
                Mechanic::Gesture(CoverageThreshold::Cells { cell_size, .. })
                    if !(cell_size.is_finite() && cell_size > 0.0) =>
                {
                    return Err(BlueprintError::InvalidCoverage { stage });
                }
                _ => {}
            }
        }

        let mut seen = HashSet::new();
        // A stage holds at most one pending transition.
        let mut delayed = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for stage in [rule.from, rule.to] {
                if stage.0 >= count {
                    return Err(BlueprintError::StageOutOfRange {
                        index,
                        stage,
                        count,
                    });
                }
            }
            if rule.to <= rule.from {
                return Err(BlueprintError::NotForward {
                    index,
                    from: rule.from,
                    to: rule.to,
                });
            }
            if !seen.insert((rule.from, rule.on)) {
                return Err(BlueprintError::DuplicateRule {
                    stage: rule.from,
                    trigger: rule.on.as_str(),
                });
            }
            if rule.delay.is_some() && !delayed.insert(rule.from) {
                return Err(BlueprintError::MultipleDelayed { stage: rule.from });
            }
            let source = &self.stages[rule.from.0];
            if !rule.guard.fits(&source.mechanic) || !trigger_fits(rule.on, &source.mechanic) {
                return Err(BlueprintError::MechanicMismatch {
                    index,
                    stage: rule.from,
                    name: source.name.clone(),
                });
            }
        }

        if let Some(binding) = self.effects.iter().find(|b| b.stage.0 >= count) {
            return Err(BlueprintError::EffectOutOfRange {
                stage: binding.stage,
                count,
            });
        }

        Ok(Blueprint {
            name: self.name,
            stages: self.stages,
            rules: self.rules,
            effects: self.effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_stages() -> BlueprintBuilder {
        Blueprint::builder("test")
            .stage(StageSpec::passive("intro"))
            .stage(StageSpec::new(
                "fog",
                Mechanic::Gesture(CoverageThreshold::Samples(3)),
            ))
            .stage(StageSpec::passive("end"))
    }

    #[test]
    fn builds_linear_chain() {
        let blueprint = three_stages()
            .rule(TransitionRule::new(0, TriggerKind::Click, 1))
            .rule(TransitionRule::new(1, TriggerKind::Click, 2).guarded(Guard::GestureResolved))
            .build()
            .unwrap();

        assert_eq!(blueprint.stage_count(), 3);
        assert_eq!(blueprint.terminal(), StageId(2));
        let (index, rule) = blueprint.rule_for(StageId(1), TriggerKind::Click).unwrap();
        assert_eq!(index, 1);
        assert_eq!(rule.guard, Guard::GestureResolved);
        assert!(blueprint.rule_for(StageId(2), TriggerKind::Click).is_none());
    }

    #[test]
    fn rejects_empty_blueprint() {
        let err = Blueprint::builder("empty").build().unwrap_err();
        assert_eq!(err, BlueprintError::NoStages("empty".into()));
    }

    #[test]
    fn rejects_out_of_range_stage() {
        let err = three_stages()
            .rule(TransitionRule::new(2, TriggerKind::Click, 3))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::StageOutOfRange { stage: StageId(3), .. }));
    }

    #[test]
    fn rejects_backward_and_self_rules() {
        let err = three_stages()
            .rule(TransitionRule::new(2, TriggerKind::Click, 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::NotForward { .. }));

        let err = three_stages()
            .rule(TransitionRule::new(1, TriggerKind::Click, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::NotForward { .. }));
    }

    #[test]
    fn rejects_duplicate_rule() {
        let err = three_stages()
            .rule(TransitionRule::new(0, TriggerKind::Click, 1))
            .rule(TransitionRule::new(0, TriggerKind::Click, 2))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::DuplicateRule { .. }));
    }

    #[test]
    fn rejects_guard_without_mechanic() {
        let err = three_stages()
            .rule(TransitionRule::new(0, TriggerKind::Click, 1).guarded(Guard::QuotaReached))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::MechanicMismatch { index: 0, .. }));

        let err = three_stages()
            .rule(TransitionRule::new(0, TriggerKind::RevealComplete, 1))
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::MechanicMismatch { .. }));
    }

    #[test]
    fn rejects_bad_quota() {
        let err = Blueprint::builder("bubbles")
            .stage(StageSpec::new(
                "pop",
                Mechanic::Targets(TargetSpec::unordered(8, 9)),
            ))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BlueprintError::InvalidQuota {
                stage: StageId(0),
                quota: 9,
                total: 8
            }
        );
    }

    #[test]
    fn rejects_bad_cell_size() {
        for cell_size in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let err = Blueprint::builder("fog")
                .stage(StageSpec::new(
                    "fog",
                    Mechanic::Gesture(CoverageThreshold::Cells {
                        cell_size,
                        required: 1,
                    }),
                ))
                .build()
                .unwrap_err();
            assert_eq!(err, BlueprintError::InvalidCoverage { stage: StageId(0) });
        }

        let ok = Blueprint::builder("fog")
            .stage(StageSpec::new(
                "fog",
                Mechanic::Gesture(CoverageThreshold::Cells {
                    cell_size: 60.0,
                    required: 4,
                }),
            ))
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_second_delayed_rule_from_one_stage() {
        let bubbles = || {
            Blueprint::builder("race")
                .stage(StageSpec::new(
                    "bubbles",
                    Mechanic::Targets(TargetSpec::unordered(2, 1)),
                ))
                .stage(StageSpec::passive("skip"))
                .stage(StageSpec::passive("question"))
                .rule(
                    TransitionRule::new(0, TriggerKind::QuotaReached, 2)
                        .after(Duration::from_millis(600)),
                )
        };

        let err = bubbles()
            .rule(TransitionRule::new(0, TriggerKind::Click, 1).after(Duration::from_millis(10)))
            .build()
            .unwrap_err();
        assert_eq!(err, BlueprintError::MultipleDelayed { stage: StageId(0) });

        // An immediate rule alongside the delayed one is fine.
        assert!(bubbles()
            .rule(TransitionRule::new(0, TriggerKind::Click, 1))
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_effect_on_missing_stage() {
        let err = three_stages()
            .effect(7, TriggerKind::Confirm, Effect::Confetti)
            .build()
            .unwrap_err();
        assert!(matches!(err, BlueprintError::EffectOutOfRange { .. }));
    }
}
