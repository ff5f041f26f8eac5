pub mod completion;
pub mod config;
pub mod controller;
pub mod effects;
pub mod events;
pub mod gesture;
pub mod rules;
pub mod state;
pub mod typewriter;

pub use completion::{CompletionCounter, MarkOutcome, TargetSpec};
pub use config::Tuning;
pub use controller::{Experience, TransitionOutcome};
pub use effects::{Effect, EffectSink, LogSink, SideEffectDispatcher};
pub use events::ExperienceEvent;
pub use gesture::{CoverageThreshold, GestureAccumulator, GestureSample};
pub use rules::{
    Blueprint, BlueprintBuilder, BlueprintError, Guard, Mechanic, RevealSpec, StageId, StageSpec,
    TransitionRule, TriggerKind,
};
pub use state::ExperienceSnapshot;
pub use typewriter::TypewriterDriver;
