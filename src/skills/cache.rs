// src/skills/cache.rs
//! Read-through cache over the skills store: serve cached rows, or generate,
//! persist (best effort) and return new ones on a miss

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::generation::{
    build_prompt, parse_generated_skills, DEFAULT_GENERATION_COUNT, MAX_GENERATION_COUNT,
};
use super::{Skill, SkillGenerator, SkillLevel, SkillStore, DEFAULT_CATEGORIES, SEARCH_LIMIT};
use crate::error::SkillsError;
use crate::utils::normalize_category;

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRequest {
    pub category: String,
    #[serde(default)]
    pub generate_if_empty: bool,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub context: Option<String>,
}

impl SkillRequest {
    pub fn lookup(category: &str) -> Self {
        Self {
            category: category.to_string(),
            generate_if_empty: false,
            count: None,
            context: None,
        }
    }

    pub fn generating(category: &str, count: u32) -> Self {
        Self {
            generate_if_empty: true,
            count: Some(count),
            ..Self::lookup(category)
        }
    }
}

pub struct SkillsCache {
    store: Arc<dyn SkillStore>,
    generator: Option<Arc<dyn SkillGenerator>>,
    model: String,
}

impl SkillsCache {
    pub fn new(
        store: Arc<dyn SkillStore>,
        generator: Option<Arc<dyn SkillGenerator>>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            generator,
            model: model.into(),
        }
    }

    pub async fn fetch(&self, request: &SkillRequest) -> Result<Vec<Skill>, SkillsError> {
        let category = normalize_category(&request.category);
        if category.is_empty() {
            return Err(SkillsError::EmptyCategory);
        }

        let cached = self.store.by_category(&category).await?;
        if !cached.is_empty() {
            info!("Skills cache hit for {}: {} rows", category, cached.len());
            self.spawn_usage_updates(&cached);
            return Ok(cached);
        }

        if !request.generate_if_empty {
            info!("Skills cache miss for {}, generation not requested", category);
            return Ok(Vec::new());
        }

        self.generate(&category, request).await
    }

    /// Detached counter increments; the caller never waits on them
    fn spawn_usage_updates(&self, skills: &[Skill]) {
        for skill in skills {
            let store = Arc::clone(&self.store);
            let skill_id = skill.id.clone();
            tokio::spawn(async move {
                if let Err(e) = store.record_usage(&skill_id).await {
                    warn!("Failed to record usage of skill {}: {}", skill_id, e);
                }
            });
        }
    }

    async fn generate(&self, category: &str, request: &SkillRequest) -> Result<Vec<Skill>, SkillsError> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            SkillsError::Configuration("no skill generator configured".to_string())
        })?;

        let count = request
            .count
            .unwrap_or(DEFAULT_GENERATION_COUNT)
            .clamp(1, MAX_GENERATION_COUNT);
        let prompt = build_prompt(&self.model, category, count, request.context.as_deref());

        info!("Generating {} skills for {}", count, category);
        let raw = generator.complete(&prompt).await?;

        let generated = parse_generated_skills(&raw).into_result().map_err(|e| {
            if let SkillsError::MalformedOutput { raw, reason } = &e {
                error!("Unreadable generation output ({}): {}", reason, raw);
            }
            e
        })?;

        let now = Utc::now();
        let skills: Vec<Skill> = generated
            .into_iter()
            .map(|g| Skill {
                id: Uuid::new_v4().to_string(),
                name: g.name.trim().to_string(),
                category: category.to_string(),
                subcategory: g.subcategory,
                description: g.description,
                level: g.level.as_deref().and_then(SkillLevel::parse),
                keywords: g.keywords,
                is_ai_generated: true,
                usage_count: 1,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if let Err(e) = self.store.insert_batch(&skills).await {
            warn!(
                "Generated {} skills for {} but could not store them: {}",
                skills.len(),
                category,
                e
            );
        }

        Ok(skills)
    }

    /// Distinct categories, or the default list when the store has none
    pub async fn list_categories(&self) -> Vec<String> {
        match self.store.categories().await {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => default_categories(),
            Err(e) => {
                warn!("Falling back to default categories: {}", e);
                default_categories()
            }
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Skill>, SkillsError> {
        Ok(self.store.search(query, SEARCH_LIMIT).await?)
    }
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}
