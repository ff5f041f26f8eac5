//! Stage-progression engine behind the keepsake gallery.
//!
//! Each template is a linear chain of stages described by a [`engine::Blueprint`].
//! A mounted [`engine::Experience`] takes pointer samples, target completions and
//! clicks from the presentation layer. It moves through the chain, runs the
//! delayed transitions and typewriter reveals on tokio timers, and reports
//! changes through [`engine::ExperienceEvent`]s.

pub mod engine;
pub mod settings;
pub mod templates;

pub use engine::{
    Blueprint, Effect, EffectSink, Experience, ExperienceEvent, ExperienceSnapshot,
    GestureSample, MarkOutcome, StageId, TransitionOutcome, TriggerKind, Tuning,
};
pub use settings::ExperienceContent;
pub use templates::TemplateKind;

/// Initialize logging (reads RUST_LOG env var, defaults to info).
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
