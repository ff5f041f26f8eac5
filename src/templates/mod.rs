pub mod memory_cloud;
pub mod sealed_letter;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::engine::{Blueprint, BlueprintError, EffectSink, Experience, LogSink, Tuning};
use crate::settings::ExperienceContent;
use std::sync::Arc;

/// Every experience offered in the gallery, in gallery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    MemoryCloud,
    Mixtape,
    Desktop,
    Receipt,
    Rpg,
    #[serde(rename = "letter")]
    SealedLetter,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::MemoryCloud,
        TemplateKind::Mixtape,
        TemplateKind::Desktop,
        TemplateKind::Receipt,
        TemplateKind::Rpg,
        TemplateKind::SealedLetter,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            TemplateKind::MemoryCloud => "memory-cloud",
            TemplateKind::Mixtape => "mixtape",
            TemplateKind::Desktop => "desktop",
            TemplateKind::Receipt => "receipt",
            TemplateKind::Rpg => "rpg",
            TemplateKind::SealedLetter => "letter",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim_start_matches('/');
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    pub fn title(&self) -> &'static str {
        match self {
            TemplateKind::MemoryCloud => "The Memory Cloud",
            TemplateKind::Mixtape => "Mixtape",
            TemplateKind::Desktop => "Desktop Simulator",
            TemplateKind::Receipt => "Love Receipt",
            TemplateKind::Rpg => "RPG Quest",
            TemplateKind::SealedLetter => "The Sealed Letter",
        }
    }

    pub fn tagline(&self) -> Option<&'static str> {
        match self {
            TemplateKind::MemoryCloud => Some("A dreamy journey through your memories together"),
            TemplateKind::SealedLetter => Some("An elegant confession, sealed with care"),
            _ => None,
        }
    }

    /// Stage machine for this template, or `None` if it has no stage logic here.
    pub fn blueprint(&self, tuning: &Tuning) -> Option<Result<Blueprint, BlueprintError>> {
        match self {
            TemplateKind::MemoryCloud => Some(memory_cloud::blueprint(tuning)),
            TemplateKind::SealedLetter => Some(sealed_letter::blueprint(tuning)),
            _ => None,
        }
    }

    pub fn mount(&self, content: ExperienceContent, tuning: &Tuning) -> Result<Experience> {
        self.mount_with_sink(content, tuning, Arc::new(LogSink))
    }

    pub fn mount_with_sink(
        &self,
        content: ExperienceContent,
        tuning: &Tuning,
        sink: Arc<dyn EffectSink>,
    ) -> Result<Experience> {
        let blueprint = self
            .blueprint(tuning)
            .ok_or_else(|| anyhow!("template '{}' has no stage logic", self.slug()))??;
        Experience::mount_with_sink(blueprint, content, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for kind in TemplateKind::ALL {
            assert_eq!(TemplateKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(
            TemplateKind::from_slug("/letter"),
            Some(TemplateKind::SealedLetter)
        );
        assert_eq!(TemplateKind::from_slug("nope"), None);
    }

    #[test]
    fn only_fully_specified_templates_have_blueprints() {
        let tuning = Tuning::default();
        let with_logic: Vec<_> = TemplateKind::ALL
            .into_iter()
            .filter(|kind| kind.blueprint(&tuning).is_some())
            .collect();
        assert_eq!(
            with_logic,
            vec![TemplateKind::MemoryCloud, TemplateKind::SealedLetter]
        );
        for kind in with_logic {
            assert!(kind.blueprint(&tuning).unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn mounting_a_template_without_logic_fails() {
        let err = TemplateKind::Rpg
            .mount(ExperienceContent::default(), &Tuning::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("rpg"));
    }
}
