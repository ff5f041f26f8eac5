use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Per-template content supplied by whoever personalises the keepsake.
/// The engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceContent {
    pub photos: Vec<String>,
    pub recipient_name: String,
    pub sender_name: String,
    pub message: String,
}

impl Default for ExperienceContent {
    fn default() -> Self {
        Self {
            photos: Vec::new(),
            recipient_name: "My Love".into(),
            sender_name: "Me".into(),
            message: "Every moment with you feels like a page from my favourite story. \
                      I would choose you again in every chapter."
                .into(),
        }
    }
}

impl ExperienceContent {
    /// Reads content from a JSON file. A missing file yields the defaults;
    /// a file that exists but cannot be parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read content from {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse content in {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// First `count` photos, for stages that show a fixed number of slots.
    pub fn photos_for(&self, count: usize) -> &[String] {
        &self.photos[..self.photos.len().min(count)]
    }
}
