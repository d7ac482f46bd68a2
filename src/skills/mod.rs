// src/skills/mod.rs
//! Skills collection: typed rows, the backing store, AI generation and the
//! read-through cache tying them together

pub mod cache;
pub mod generation;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use cache::{SkillRequest, SkillsCache};
pub use generation::{CompletionPrompt, GenerationOutcome, SkillGenerator};
pub use store::{SkillStore, SqliteSkillStore};

/// Shown when the store has no categories (or cannot be reached)
pub const DEFAULT_CATEGORIES: &[&str] = &["technique", "transversale", "langues", "outils", "management"];

/// Upper bound on search results
pub const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    #[serde(rename = "débutant")]
    Debutant,
    #[serde(rename = "intermédiaire")]
    Intermediaire,
    #[serde(rename = "avancé")]
    Avance,
    #[serde(rename = "expert")]
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Debutant => "débutant",
            SkillLevel::Intermediaire => "intermédiaire",
            SkillLevel::Avance => "avancé",
            SkillLevel::Expert => "expert",
        }
    }

    /// Lenient parse: case and accents are ignored, unknown levels yield None
    pub fn parse(value: &str) -> Option<Self> {
        let folded: String = value
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'é' | 'è' | 'ê' => 'e',
                other => other,
            })
            .collect();

        match folded.as_str() {
            "debutant" => Some(SkillLevel::Debutant),
            "intermediaire" => Some(SkillLevel::Intermediaire),
            "avance" => Some(SkillLevel::Avance),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub is_ai_generated: bool,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_is_lenient() {
        assert_eq!(SkillLevel::parse("Débutant"), Some(SkillLevel::Debutant));
        assert_eq!(SkillLevel::parse("intermediaire"), Some(SkillLevel::Intermediaire));
        assert_eq!(SkillLevel::parse(" AVANCÉ "), Some(SkillLevel::Avance));
        assert_eq!(SkillLevel::parse("guru"), None);
    }

    #[test]
    fn test_level_serializes_in_french() {
        assert_eq!(
            serde_json::to_string(&SkillLevel::Intermediaire).unwrap(),
            "\"intermédiaire\""
        );
    }
}
