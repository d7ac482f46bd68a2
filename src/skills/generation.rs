// src/skills/generation.rs
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SkillsError;

pub const DEFAULT_GENERATION_COUNT: u32 = 5;
pub const MAX_GENERATION_COUNT: u32 = 20;

const SYSTEM_INSTRUCTION: &str = "Tu es un expert en recrutement et en ressources humaines. \
Tu réponds UNIQUEMENT avec un objet JSON valide, sans texte avant ni après.";

/// One call to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    pub model: String,
    pub system: String,
    pub user: String,
}

/// Text generation backend returning the raw completion text
#[async_trait]
pub trait SkillGenerator: Send + Sync {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, SkillsError>;
}

pub fn build_prompt(model: &str, category: &str, count: u32, context: Option<&str>) -> CompletionPrompt {
    let mut user = format!(
        "Génère {} compétences professionnelles pour la catégorie \"{}\".",
        count, category
    );

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        user.push_str(&format!("\nContexte professionnel du candidat : {}", context));
    }

    user.push_str(
        "\n\nRéponds avec un objet JSON de la forme :\n\
{\"skills\": [{\"name\": \"...\", \"subcategory\": \"...\", \"description\": \"...\", \
\"level\": \"débutant|intermédiaire|avancé|expert\", \"keywords\": [\"...\"]}]}",
    );

    CompletionPrompt {
        model: model.to_string(),
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedSkill {
    pub name: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Result of reading generator output: the skills, or the raw text it failed on
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Parsed(Vec<GeneratedSkill>),
    Malformed { raw: String, reason: String },
}

impl GenerationOutcome {
    pub fn into_result(self) -> Result<Vec<GeneratedSkill>, SkillsError> {
        match self {
            GenerationOutcome::Parsed(skills) => Ok(skills),
            GenerationOutcome::Malformed { raw, reason } => {
                Err(SkillsError::MalformedOutput { raw, reason })
            }
        }
    }
}

/// Drop a markdown code fence around the JSON, if any
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_generated_skills(raw: &str) -> GenerationOutcome {
    let malformed = |reason: String| GenerationOutcome::Malformed {
        raw: raw.to_string(),
        reason,
    };

    let value: Value = match serde_json::from_str(strip_code_fence(raw)) {
        Ok(value) => value,
        Err(e) => return malformed(format!("invalid JSON: {}", e)),
    };

    let Some(items) = value.get("skills").and_then(Value::as_array) else {
        return malformed("missing \"skills\" array".to_string());
    };

    let mut skills = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match GeneratedSkill::deserialize(item) {
            Ok(skill) if !skill.name.trim().is_empty() => skills.push(skill),
            Ok(_) => return malformed(format!("skill #{} has an empty name", index)),
            Err(e) => return malformed(format!("skill #{}: {}", index, e)),
        }
    }

    GenerationOutcome::Parsed(skills)
}
