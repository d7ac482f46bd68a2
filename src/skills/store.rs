// src/skills/store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{Skill, SkillLevel};
use crate::core::Database;
use crate::error::StoreError;

/// Backing store for skill rows
#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Rows of one category, most used first
    async fn by_category(&self, category: &str) -> Result<Vec<Skill>, StoreError>;
    async fn insert_batch(&self, skills: &[Skill]) -> Result<(), StoreError>;
    /// Increment the usage counter of one row and touch its timestamp
    async fn record_usage(&self, skill_id: &str) -> Result<(), StoreError>;
    async fn categories(&self) -> Result<Vec<String>, StoreError>;
    /// Name/description substring or exact keyword match, most used first
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Skill>, StoreError>;
}

#[derive(sqlx::FromRow)]
struct SkillRow {
    id: String,
    name: String,
    category: String,
    subcategory: Option<String>,
    description: Option<String>,
    level: Option<String>,
    keywords: String,
    is_ai_generated: bool,
    usage_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SkillRow> for Skill {
    type Error = StoreError;

    fn try_from(row: SkillRow) -> Result<Self, Self::Error> {
        let keywords: Vec<String> = serde_json::from_str(&row.keywords).map_err(|e| {
            StoreError::InvalidRow(format!("keywords of skill {}: {}", row.id, e))
        })?;

        Ok(Skill {
            level: row.level.as_deref().and_then(SkillLevel::parse),
            id: row.id,
            name: row.name,
            category: row.category,
            subcategory: row.subcategory,
            description: row.description,
            keywords,
            is_ai_generated: row.is_ai_generated,
            usage_count: row.usage_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_skills(rows: Vec<SkillRow>) -> Result<Vec<Skill>, StoreError> {
    rows.into_iter().map(Skill::try_from).collect()
}

/// Escape LIKE wildcards so the query matches literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

const SELECT_COLUMNS: &str = "SELECT id, name, category, subcategory, description, level, keywords, \
     is_ai_generated, usage_count, created_at, updated_at FROM skills";

pub struct SqliteSkillStore {
    db: Database,
}

impl SqliteSkillStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SkillStore for SqliteSkillStore {
    async fn by_category(&self, category: &str) -> Result<Vec<Skill>, StoreError> {
        let sql = format!(
            "{} WHERE category = ? ORDER BY usage_count DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(category)
            .fetch_all(self.db.pool())
            .await?;

        debug!("Found {} skills in category {}", rows.len(), category);
        into_skills(rows)
    }

    async fn insert_batch(&self, skills: &[Skill]) -> Result<(), StoreError> {
        let mut tx = self.db.pool().begin().await?;

        for skill in skills {
            let keywords = serde_json::to_string(&skill.keywords)
                .map_err(|e| StoreError::InvalidRow(format!("keywords of {}: {}", skill.name, e)))?;

            sqlx::query(
                r#"
                INSERT INTO skills (id, name, category, subcategory, description, level, keywords,
                                    is_ai_generated, usage_count, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(skill.id.as_str())
            .bind(skill.name.as_str())
            .bind(skill.category.as_str())
            .bind(skill.subcategory.as_deref())
            .bind(skill.description.as_deref())
            .bind(skill.level.map(|l| l.as_str()))
            .bind(keywords)
            .bind(skill.is_ai_generated)
            .bind(skill.usage_count)
            .bind(skill.created_at)
            .bind(skill.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Stored {} skills", skills.len());
        Ok(())
    }

    async fn record_usage(&self, skill_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE skills
            SET usage_count = usage_count + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(skill_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvalidRow(format!("unknown skill {}", skill_id)));
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>, StoreError> {
        let categories =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM skills ORDER BY category")
                .fetch_all(self.db.pool())
                .await?;
        Ok(categories)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Skill>, StoreError> {
        let pattern = like_pattern(query.trim());
        let sql = format!(
            r#"{}
            WHERE name LIKE ?1 ESCAPE '\'
               OR description LIKE ?1 ESCAPE '\'
               OR EXISTS (
                    SELECT 1 FROM json_each(skills.keywords)
                    WHERE lower(json_each.value) = lower(?2)
               )
            ORDER BY usage_count DESC
            LIMIT ?3"#,
            SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<_, SkillRow>(&sql)
            .bind(pattern)
            .bind(query.trim())
            .bind(limit as i64)
            .fetch_all(self.db.pool())
            .await?;

        into_skills(rows)
    }
}
