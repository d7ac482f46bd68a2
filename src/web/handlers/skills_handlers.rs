// src/web/handlers/skills_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

use super::skills_error;
use crate::skills::{Skill, SkillRequest};
use crate::web::types::*;

/// Shorter queries are not sent to the store
pub const MIN_SEARCH_LENGTH: usize = 3;

pub async fn get_skills_handler(
    category: String,
    generate: Option<bool>,
    count: Option<u32>,
    context: Option<String>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<Vec<Skill>>>, Json<StandardErrorResponse>> {
    let request = SkillRequest {
        category,
        generate_if_empty: generate.unwrap_or(false),
        count,
        context,
    };

    let skills = state
        .skills
        .fetch(&request)
        .await
        .map_err(|e| skills_error(e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} skills for {}", skills.len(), request.category.trim()),
        skills,
        None,
    )))
}

pub async fn get_categories_handler(state: &State<ServerState>) -> Json<DataResponse<Vec<String>>> {
    let categories = state.skills.list_categories().await;
    Json(DataResponse::success(
        format!("{} categories", categories.len()),
        categories,
        None,
    ))
}

pub async fn search_skills_handler(
    q: String,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<Vec<Skill>>>, Json<StandardErrorResponse>> {
    let query = q.trim();
    if query.chars().count() < MIN_SEARCH_LENGTH {
        info!("Skipping skill search for short query '{}'", query);
        return Ok(Json(DataResponse::success(
            format!("Queries need at least {} characters", MIN_SEARCH_LENGTH),
            Vec::new(),
            None,
        )));
    }

    let skills = state
        .skills
        .search(query)
        .await
        .map_err(|e| skills_error(e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} skills match '{}'", skills.len(), query),
        skills,
        None,
    )))
}
