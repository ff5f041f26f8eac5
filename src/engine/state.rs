use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use super::completion::CompletionCounter;
use super::effects::{Effect, SideEffectDispatcher};
use super::gesture::GestureAccumulator;
use super::rules::{Blueprint, Guard, Mechanic, StageId};
use super::typewriter::TypewriterDriver;
use crate::settings::ExperienceContent;

/// A delayed transition waiting for its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransition {
    pub rule: usize,
    pub from: StageId,
    pub to: StageId,
    pub due: Instant,
}

/// Everything one mounted template knows about its progress.
///
/// Components are rebuilt when the stage that owns them is entered. The most
/// recent one of each kind stays readable afterwards so a later stage can
/// still render, say, the fully revealed letter.
pub struct SessionState {
    pub session_id: String,
    pub mounted_at: DateTime<Utc>,
    pub mounted: bool,
    pub stage: StageId,
    pub gesture: Option<GestureAccumulator>,
    pub targets: Option<CompletionCounter>,
    pub reveal: Option<TypewriterDriver>,
    pub pending: Option<PendingTransition>,
    pub effects: SideEffectDispatcher,
}

impl SessionState {
    pub fn new(effects: SideEffectDispatcher) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            mounted_at: Utc::now(),
            mounted: true,
            stage: StageId::INITIAL,
            gesture: None,
            targets: None,
            reveal: None,
            pending: None,
            effects,
        }
    }

    /// Moves to `stage` and gives it a fresh component. Any pending transition
    /// belonged to the stage being left, so it is dropped.
    pub fn enter(&mut self, stage: StageId, blueprint: &Blueprint, content: &ExperienceContent) {
        self.stage = stage;
        self.pending = None;

        match blueprint.stage(stage).mechanic {
            Mechanic::Passive => {}
            Mechanic::Gesture(threshold) => {
                self.gesture = Some(GestureAccumulator::new(threshold));
            }
            Mechanic::Targets(spec) => {
                self.targets = Some(CompletionCounter::new(spec));
            }
            Mechanic::Reveal(spec) => {
                let mut driver = TypewriterDriver::new();
                driver.start(&content.message, spec.interval);
                self.reveal = Some(driver);
            }
        }
    }

    pub fn guard_holds(&self, guard: Guard) -> bool {
        match guard {
            Guard::Always => true,
            Guard::GestureResolved => self.is_resolved(),
            Guard::QuotaReached => self.quota_reached(),
            Guard::RevealComplete => self.is_complete(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.gesture.as_ref().is_some_and(GestureAccumulator::is_resolved)
    }

    pub fn sample_count(&self) -> usize {
        self.gesture.as_ref().map_or(0, GestureAccumulator::sample_count)
    }

    pub fn completed_count(&self) -> usize {
        self.targets.as_ref().map_or(0, CompletionCounter::completed_count)
    }

    pub fn quota_reached(&self) -> bool {
        self.targets.as_ref().is_some_and(CompletionCounter::quota_reached)
    }

    pub fn current_text(&self) -> String {
        self.reveal
            .as_ref()
            .map(TypewriterDriver::current_text)
            .unwrap_or_default()
    }

    pub fn is_complete(&self) -> bool {
        self.reveal.as_ref().is_some_and(TypewriterDriver::is_complete)
    }

    pub fn snapshot(&self, blueprint: &Blueprint) -> ExperienceSnapshot {
        ExperienceSnapshot {
            session_id: self.session_id.clone(),
            mounted_at: self.mounted_at,
            mounted: self.mounted,
            template: blueprint.name().to_string(),
            stage: self.stage,
            stage_name: blueprint.stage(self.stage).name.clone(),
            terminal: self.stage == blueprint.terminal(),
            gesture_resolved: self.is_resolved(),
            sample_count: self.sample_count(),
            completed_count: self.completed_count(),
            quota_reached: self.quota_reached(),
            current_text: self.current_text(),
            reveal_complete: self.is_complete(),
            pending_stage: self.pending.map(|pending| pending.to),
            confetti_fired: self.effects.fired_count(Effect::Confetti),
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSnapshot {
    pub session_id: String,
    pub mounted_at: DateTime<Utc>,
    pub mounted: bool,
    pub template: String,
    pub stage: StageId,
    pub stage_name: String,
    pub terminal: bool,
    pub gesture_resolved: bool,
    pub sample_count: usize,
    pub completed_count: usize,
    pub quota_reached: bool,
    pub current_text: String,
    pub reveal_complete: bool,
    pub pending_stage: Option<StageId>,
    pub confetti_fired: u64,
}
