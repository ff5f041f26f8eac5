use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

/// Celebratory side effects a template can ask the host to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Effect {
    Confetti,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Confetti => "confetti",
        }
    }
}

/// Host-side player for effects. Called with no expectation of a result.
pub trait EffectSink: Send + Sync {
    fn fire(&self, effect: Effect);
}

/// Sink used when the host does not provide one.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn fire(&self, effect: Effect) {
        info!("effect fired: {}", effect.as_str());
    }
}

/// Forwards every request to the sink. Repeated requests repeat the effect.
#[derive(Clone)]
pub struct SideEffectDispatcher {
    sink: Arc<dyn EffectSink>,
    fired: HashMap<Effect, u64>,
}

impl SideEffectDispatcher {
    pub fn new(sink: Arc<dyn EffectSink>) -> Self {
        Self {
            sink,
            fired: HashMap::new(),
        }
    }

    pub fn fire(&mut self, effect: Effect) {
        *self.fired.entry(effect).or_insert(0) += 1;
        self.sink.fire(effect);
    }

    pub fn fired_count(&self, effect: Effect) -> u64 {
        self.fired.get(&effect).copied().unwrap_or(0)
    }
}

impl Default for SideEffectDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(LogSink))
    }
}
