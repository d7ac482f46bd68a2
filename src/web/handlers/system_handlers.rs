// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::error;

use crate::notification::Notification;
use crate::web::types::*;

pub async fn health_handler(
    state: &State<ServerState>,
) -> Result<Json<TextResponse>, Json<StandardErrorResponse>> {
    if let Err(e) = state.database.health_check().await {
        error!("Health check failed: {:#}", e);
        return Err(Json(StandardErrorResponse::new(
            "Skills database unavailable".to_string(),
            "DATABASE_UNAVAILABLE".to_string(),
            vec!["Check the database path in config.yaml".to_string()],
            None,
        )));
    }

    Ok(Json(TextResponse::success(
        "Cover letter studio is running".to_string(),
        None,
    )))
}

pub async fn get_templates_handler(state: &State<ServerState>) -> Json<DataResponse<Vec<TemplateInfo>>> {
    let templates: Vec<TemplateInfo> = state
        .registry
        .list_templates()
        .iter()
        .map(TemplateInfo::from)
        .collect();

    Json(DataResponse::success(
        format!("{} templates available", templates.len()),
        templates,
        None,
    ))
}

pub async fn get_notifications_handler(
    state: &State<ServerState>,
) -> Json<DataResponse<Vec<Notification>>> {
    let active = state.notifications.active();
    Json(DataResponse::success(
        format!("{} active notifications", active.len()),
        active,
        None,
    ))
}

pub async fn dismiss_notification_handler(
    id: u64,
    state: &State<ServerState>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    if state.notifications.dismiss(id) {
        Ok(Json(ActionResponse::success(
            format!("Notification {} dismissed", id),
            "notification_dismissed".to_string(),
            None,
        )))
    } else {
        Err(Json(StandardErrorResponse::new(
            format!("Notification {} not found", id),
            "NOTIFICATION_NOT_FOUND".to_string(),
            vec!["It may already have expired".to_string()],
            None,
        )))
    }
}
