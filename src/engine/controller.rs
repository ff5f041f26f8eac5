use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use log::{debug, info};
use tokio::{
    runtime::Handle,
    sync::broadcast,
    task::JoinHandle,
    time::{self, Instant},
};

use super::completion::MarkOutcome;
use super::effects::{Effect, EffectSink, LogSink, SideEffectDispatcher};
use super::events::ExperienceEvent;
use super::gesture::GestureSample;
use super::rules::{Blueprint, Mechanic, StageId, TriggerKind};
use super::state::{ExperienceSnapshot, PendingTransition, SessionState};
use crate::settings::ExperienceContent;

const EVENT_CAPACITY: usize = 256;

/// What a trigger did. None of these are errors: an inapplicable trigger
/// simply has no effect yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied { from: StageId, to: StageId },
    Scheduled { to: StageId, delay: Duration },
    /// A delayed transition out of this stage is already waiting.
    AlreadyScheduled,
    GuardUnmet,
    NoRule,
    EffectOnly(Effect),
    Unmounted,
}

struct Inner {
    blueprint: Blueprint,
    content: ExperienceContent,
    state: Mutex<SessionState>,
    pending_timer: Mutex<Option<JoinHandle<()>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<ExperienceEvent>,
    runtime: Handle,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for slot in [&self.pending_timer, &self.ticker] {
            if let Some(handle) = lock(slot).take() {
                handle.abort();
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// One mounted template: the stage controller plus the components its
/// stages drive. Cloning yields another handle to the same session.
///
/// Lock order is state first, then a timer slot. Timer tasks hold only a weak
/// reference, so dropping the last handle tears the session down.
#[derive(Clone)]
pub struct Experience {
    inner: Arc<Inner>,
}

impl Experience {
    pub fn mount(blueprint: Blueprint, content: ExperienceContent) -> Result<Self> {
        Self::mount_with_sink(blueprint, content, Arc::new(LogSink))
    }

    pub fn mount_with_sink(
        blueprint: Blueprint,
        content: ExperienceContent,
        sink: Arc<dyn EffectSink>,
    ) -> Result<Self> {
        let runtime =
            Handle::try_current().context("mounting an experience requires a tokio runtime")?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let experience = Self {
            inner: Arc::new(Inner {
                blueprint,
                content,
                state: Mutex::new(SessionState::new(SideEffectDispatcher::new(sink))),
                pending_timer: Mutex::new(None),
                ticker: Mutex::new(None),
                events,
                runtime,
            }),
        };

        {
            let mut state = experience.lock_state();
            info!(
                "mounted '{}' as session {}",
                experience.inner.blueprint.name(),
                state.session_id
            );
            experience.enter_stage(&mut state, StageId::INITIAL);
        }

        Ok(experience)
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.inner.blueprint
    }

    pub fn content(&self) -> &ExperienceContent {
        &self.inner.content
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExperienceEvent> {
        self.inner.events.subscribe()
    }

    pub fn current_stage(&self) -> StageId {
        self.lock_state().stage
    }

    pub fn stage_name(&self) -> String {
        let stage = self.current_stage();
        self.inner.blueprint.stage(stage).name.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.lock_state().mounted
    }

    pub fn is_resolved(&self) -> bool {
        self.lock_state().is_resolved()
    }

    pub fn completed_count(&self) -> usize {
        self.lock_state().completed_count()
    }

    pub fn quota_reached(&self) -> bool {
        self.lock_state().quota_reached()
    }

    pub fn current_text(&self) -> String {
        self.lock_state().current_text()
    }

    pub fn is_complete(&self) -> bool {
        self.lock_state().is_complete()
    }

    pub fn pending_stage(&self) -> Option<StageId> {
        self.lock_state().pending.map(|pending| pending.to)
    }

    pub fn fired_count(&self, effect: Effect) -> u64 {
        self.lock_state().effects.fired_count(effect)
    }

    pub fn snapshot(&self) -> ExperienceSnapshot {
        self.lock_state().snapshot(&self.inner.blueprint)
    }

    /// Feeds a pointer sample to the active gesture stage. Returns whether the
    /// gesture is resolved; samples outside a gesture stage are inert.
    pub fn on_sample(&self, sample: GestureSample) -> bool {
        let mut state = self.lock_state();
        if !state.mounted || !self.stage_has(&state, |m| matches!(m, Mechanic::Gesture(_))) {
            debug!("ignoring pointer sample outside a gesture stage");
            return false;
        }

        let Some(gesture) = state.gesture.as_mut() else {
            return false;
        };
        if gesture.on_sample(sample) {
            let sample_count = gesture.sample_count();
            info!("gesture resolved after {sample_count} samples");
            self.emit(ExperienceEvent::GestureResolved { sample_count });
            self.handle_trigger(&mut state, TriggerKind::GestureResolved);
        }

        state.is_resolved()
    }

    pub fn mark_complete(&self, target: usize) -> MarkOutcome {
        let mut state = self.lock_state();
        if !state.mounted || !self.stage_has(&state, |m| matches!(m, Mechanic::Targets(_))) {
            debug!("ignoring target {target}: stage has no targets");
            return MarkOutcome::Inactive;
        }

        let Some(counter) = state.targets.as_mut() else {
            return MarkOutcome::Inactive;
        };
        let was_reached = counter.quota_reached();
        let outcome = counter.mark_complete(target);
        if !outcome.accepted() {
            debug!("target {target} not marked: {outcome:?}");
            return outcome;
        }

        let completed_count = counter.completed_count();
        let reached = counter.quota_reached();
        self.emit(ExperienceEvent::TargetCompleted {
            target,
            completed_count,
        });

        if reached {
            if !was_reached {
                info!("quota reached with {completed_count} targets");
                self.emit(ExperienceEvent::QuotaReached { completed_count });
            }
            self.handle_trigger(&mut state, TriggerKind::QuotaReached);
        }

        outcome
    }

    pub fn request_transition(&self, trigger: TriggerKind) -> TransitionOutcome {
        let mut state = self.lock_state();
        self.handle_trigger(&mut state, trigger)
    }

    /// Plays an effect directly. Every call is forwarded; nothing is deduplicated.
    pub fn fire(&self, effect: Effect) {
        let mut state = self.lock_state();
        if state.mounted {
            self.dispatch(&mut state, effect);
        }
    }

    /// Tears the session down: pending timers are cancelled and every later
    /// call becomes inert.
    pub fn unmount(&self) {
        let mut state = self.lock_state();
        if !state.mounted {
            return;
        }
        state.mounted = false;
        state.pending = None;
        self.cancel_pending_timer();
        self.cancel_ticker();

        info!(
            "unmounted '{}' session {}",
            self.inner.blueprint.name(),
            state.session_id
        );
        self.emit(ExperienceEvent::Unmounted);
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.inner.state)
    }

    fn stage_has(&self, state: &SessionState, check: impl Fn(&Mechanic) -> bool) -> bool {
        check(&self.inner.blueprint.stage(state.stage).mechanic)
    }

    fn emit(&self, event: ExperienceEvent) {
        // No subscribers is fine; the state is still queryable.
        let _ = self.inner.events.send(event);
    }

    fn dispatch(&self, state: &mut SessionState, effect: Effect) {
        state.effects.fire(effect);
        let count = state.effects.fired_count(effect);
        self.emit(ExperienceEvent::EffectFired { effect, count });
    }

    fn handle_trigger(&self, state: &mut SessionState, trigger: TriggerKind) -> TransitionOutcome {
        if !state.mounted {
            return TransitionOutcome::Unmounted;
        }

        let blueprint = &self.inner.blueprint;
        let stage = state.stage;
        let Some((index, rule)) = blueprint.rule_for(stage, trigger) else {
            if let Some(effect) = blueprint.effect_for(stage, trigger) {
                self.dispatch(state, effect);
                return TransitionOutcome::EffectOnly(effect);
            }
            debug!("no rule for '{}' in {}", trigger.as_str(), stage);
            return TransitionOutcome::NoRule;
        };

        if !state.guard_holds(rule.guard) {
            debug!(
                "'{}' in {} blocked by guard {:?}",
                trigger.as_str(),
                stage,
                rule.guard
            );
            return TransitionOutcome::GuardUnmet;
        }

        let scheduled = state.pending.is_some_and(|pending| pending.rule == index);
        match rule.delay {
            None => self.apply(state, index),
            Some(_) if scheduled => TransitionOutcome::AlreadyScheduled,
            Some(delay) => self.schedule(state, index, delay),
        }
    }

    fn apply(&self, state: &mut SessionState, index: usize) -> TransitionOutcome {
        let blueprint = &self.inner.blueprint;
        let rule = &blueprint.rules()[index];
        let from = state.stage;
        let to = rule.to;
        let stage_name = blueprint.stage(to).name.clone();

        info!(
            "'{}': {} -> {} ({})",
            blueprint.name(),
            from,
            to,
            stage_name
        );
        self.emit(ExperienceEvent::StageChanged {
            from,
            to,
            stage_name,
        });

        if let Some(effect) = rule.effect {
            self.dispatch(state, effect);
        }
        self.enter_stage(state, to);

        TransitionOutcome::Applied { from, to }
    }

    fn enter_stage(&self, state: &mut SessionState, stage: StageId) {
        let blueprint = &self.inner.blueprint;
        self.cancel_pending_timer();
        self.cancel_ticker();
        state.enter(stage, blueprint, &self.inner.content);

        match blueprint.stage(stage).mechanic {
            Mechanic::Gesture(_) if state.is_resolved() => {
                self.emit(ExperienceEvent::GestureResolved { sample_count: 0 });
                self.handle_trigger(state, TriggerKind::GestureResolved);
            }
            Mechanic::Reveal(_) if state.is_complete() => self.finish_reveal(state),
            Mechanic::Reveal(spec) => self.spawn_ticker(stage, spec.interval),
            _ => {}
        }
    }

    fn schedule(&self, state: &mut SessionState, index: usize, delay: Duration) -> TransitionOutcome {
        let from = state.stage;
        let to = self.inner.blueprint.rules()[index].to;
        let due = Instant::now() + delay;
        state.pending = Some(PendingTransition {
            rule: index,
            from,
            to,
            due,
        });

        let weak = Arc::downgrade(&self.inner);
        let handle = self.inner.runtime.spawn(async move {
            time::sleep_until(due).await;
            if let Some(inner) = weak.upgrade() {
                Experience { inner }.fire_pending(index, from);
            }
        });
        if let Some(previous) = lock(&self.inner.pending_timer).replace(handle) {
            previous.abort();
        }

        debug!("scheduled {} -> {} in {:?}", from, to, delay);
        self.emit(ExperienceEvent::TransitionScheduled {
            from,
            to,
            delay_ms: delay.as_millis() as u64,
        });
        TransitionOutcome::Scheduled { to, delay }
    }

    fn fire_pending(&self, index: usize, from: StageId) {
        let mut state = self.lock_state();
        let still_pending = state
            .pending
            .is_some_and(|pending| pending.rule == index && pending.from == from);

        // The stage that scheduled this may already be gone.
        if !state.mounted || !still_pending || state.stage != from {
            debug!("dropping stale transition scheduled from {from}");
            return;
        }

        // This task is the one running; detach rather than abort it.
        lock(&self.inner.pending_timer).take();
        state.pending = None;
        self.apply(&mut state, index);
    }

    fn spawn_ticker(&self, stage: StageId, interval: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let start = Instant::now() + interval;

        let handle = self.inner.runtime.spawn(async move {
            let mut ticker = time::interval_at(start, interval);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !(Experience { inner }).advance_reveal(stage) {
                    break;
                }
            }
        });

        if let Some(previous) = lock(&self.inner.ticker).replace(handle) {
            previous.abort();
        }
    }

    /// One typewriter tick. Returns whether the ticker should keep running.
    fn advance_reveal(&self, stage: StageId) -> bool {
        let mut state = self.lock_state();
        if !state.mounted || state.stage != stage {
            return false;
        }

        let Some(driver) = state.reveal.as_mut() else {
            return false;
        };
        if !driver.tick() {
            return false;
        }

        let complete = driver.is_complete();
        self.emit(ExperienceEvent::RevealProgress {
            text: driver.current_text(),
            revealed: driver.cursor(),
            total: driver.len(),
        });

        if complete {
            self.finish_reveal(&mut state);
            return false;
        }
        true
    }

    fn finish_reveal(&self, state: &mut SessionState) {
        self.emit(ExperienceEvent::RevealCompleted {
            text: state.current_text(),
        });
        self.handle_trigger(state, TriggerKind::RevealComplete);
    }

    fn cancel_pending_timer(&self) {
        if let Some(handle) = lock(&self.inner.pending_timer).take() {
            handle.abort();
        }
    }

    fn cancel_ticker(&self) {
        if let Some(handle) = lock(&self.inner.ticker).take() {
            handle.abort();
        }
    }
}
