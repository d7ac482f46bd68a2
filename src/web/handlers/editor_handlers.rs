// src/web/handlers/editor_handlers.rs
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

use super::{editor_error, export_error};
use crate::editor::{CommandKind, EditorDocument};
use crate::error::EditorError;
use crate::web::types::*;

type EditorResult = Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>>;

pub async fn get_editor_handler(state: &State<ServerState>) -> Json<DataResponse<EditorDocument>> {
    let session = state.session.lock().await;
    Json(DataResponse::success(
        "Current document".to_string(),
        session.editor().document(),
        None,
    ))
}

pub async fn set_content_handler(
    request: Json<StandardRequest<SetContentRequest>>,
    state: &State<ServerState>,
) -> EditorResult {
    let conversation_id = request.conversation_id();
    let mut session = state.session.lock().await;

    if session.editor().is_preview() {
        return Err(editor_error(EditorError::ReadOnly, conversation_id));
    }
    session.editor_mut().set_content(&request.data.html);

    Ok(Json(DataResponse::success(
        "Content updated".to_string(),
        session.editor().document(),
        conversation_id,
    )))
}

pub async fn select_handler(
    request: Json<StandardRequest<SelectionRequest>>,
    state: &State<ServerState>,
) -> Json<DataResponse<EditorDocument>> {
    let conversation_id = request.conversation_id();
    let mut session = state.session.lock().await;
    session
        .editor_mut()
        .select(request.data.start, request.data.end);

    Json(DataResponse::success(
        "Selection updated".to_string(),
        session.editor().document(),
        conversation_id,
    ))
}

pub async fn command_handler(
    request: Json<StandardRequest<CommandRequest>>,
    state: &State<ServerState>,
) -> EditorResult {
    let conversation_id = request.conversation_id();
    let kind: CommandKind = request
        .data
        .command
        .parse()
        .map_err(|e| editor_error(e, conversation_id.clone()))?;

    let mut session = state.session.lock().await;
    session
        .editor_mut()
        .apply_inline_style(kind, request.data.value.as_deref())
        .map_err(|e| editor_error(e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        format!("Applied {}", kind),
        session.editor().document(),
        conversation_id,
    )))
}

pub async fn insert_link_handler(
    request: Json<StandardRequest<LinkRequest>>,
    state: &State<ServerState>,
) -> EditorResult {
    let conversation_id = request.conversation_id();
    let mut session = state.session.lock().await;
    session
        .editor_mut()
        .insert_link(&request.data.url, request.data.text.as_deref().unwrap_or(""))
        .map_err(|e| editor_error(e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        "Link inserted".to_string(),
        session.editor().document(),
        conversation_id,
    )))
}

pub async fn insert_image_handler(
    request: Json<StandardRequest<ImageRequest>>,
    state: &State<ServerState>,
) -> EditorResult {
    let conversation_id = request.conversation_id();
    let mut session = state.session.lock().await;
    session
        .editor_mut()
        .insert_image(&request.data.url, request.data.alt.as_deref().unwrap_or(""))
        .map_err(|e| editor_error(e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        "Image inserted".to_string(),
        session.editor().document(),
        conversation_id,
    )))
}

pub async fn load_template_handler(
    request: Json<StandardRequest<TemplateRequest>>,
    state: &State<ServerState>,
) -> EditorResult {
    let conversation_id = request.conversation_id();
    let StandardRequest { data, .. } = request.into_inner();

    let mut session = state.session.lock().await;
    let loaded = session
        .load_template(&data.template_id, data.fields)
        .map_err(|e| editor_error(e, conversation_id.clone()))?;

    info!("Template {} loaded into the editor", loaded.id);
    Ok(Json(DataResponse::success(
        format!("Template {} loaded", loaded.id),
        session.editor().document(),
        conversation_id,
    )))
}

pub async fn preview_handler(
    request: Json<StandardRequest<PreviewRequest>>,
    state: &State<ServerState>,
) -> Json<DataResponse<EditorDocument>> {
    let conversation_id = request.conversation_id();
    let mut session = state.session.lock().await;
    session.editor_mut().set_preview(request.data.enabled);

    let message = if request.data.enabled {
        "Preview enabled"
    } else {
        "Preview disabled"
    };
    Json(DataResponse::success(
        message.to_string(),
        session.editor().document(),
        conversation_id,
    ))
}

pub async fn save_handler(
    state: &State<ServerState>,
) -> Result<Json<DataResponse<SavedDraftData>>, Json<StandardErrorResponse>> {
    let session = state.session.lock().await;
    match session.save().await {
        Ok(snapshot) => Ok(Json(DataResponse::success(
            "Draft saved".to_string(),
            SavedDraftData {
                timestamp: snapshot.timestamp.to_rfc3339(),
                template_id: snapshot.template_id,
            },
            None,
        ))),
        Err(e) => {
            error!("Failed to save draft: {:#}", e);
            Err(Json(StandardErrorResponse::new(
                format!("Failed to save draft: {}", e),
                "SAVE_FAILED".to_string(),
                vec!["Check that the data directory is writable".to_string()],
                None,
            )))
        }
    }
}

pub async fn export_pdf_handler(
    state: &State<ServerState>,
) -> Result<FileResponse, Json<StandardErrorResponse>> {
    let session = state.session.lock().await;
    let file = session
        .export_pdf()
        .await
        .map_err(|e| export_error(e, None))?;
    Ok(FileResponse::from(file))
}

pub async fn export_html_handler(
    state: &State<ServerState>,
) -> Result<FileResponse, Json<StandardErrorResponse>> {
    let session = state.session.lock().await;
    let file = session
        .export_html()
        .await
        .map_err(|e| export_error(e, None))?;
    Ok(FileResponse::from(file))
}
