// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::{ConfigManager, Database, FileKeyValueStore, KeyValueStore, ServiceClient};
use crate::editor::EditorDocument;
use crate::export::{ExportPipeline, FileDownloads, LopdfRenderer};
use crate::notification::{Notification, NotificationCenter};
use crate::persistence::SnapshotStore;
use crate::session::LetterSession;
use crate::skills::{Skill, SkillGenerator, SkillsCache, SqliteSkillStore};
use crate::template_system::TemplateRegistry;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

#[get("/health")]
pub async fn health(
    state: &State<ServerState>,
) -> Result<Json<TextResponse>, Json<StandardErrorResponse>> {
    handlers::health_handler(state).await
}

#[get("/templates")]
pub async fn get_templates(state: &State<ServerState>) -> Json<DataResponse<Vec<TemplateInfo>>> {
    handlers::get_templates_handler(state).await
}

#[get("/notifications")]
pub async fn get_notifications(state: &State<ServerState>) -> Json<DataResponse<Vec<Notification>>> {
    handlers::get_notifications_handler(state).await
}

#[delete("/notifications/<id>")]
pub async fn dismiss_notification(
    id: u64,
    state: &State<ServerState>,
) -> Result<Json<ActionResponse>, Json<StandardErrorResponse>> {
    handlers::dismiss_notification_handler(id, state).await
}

#[get("/editor")]
pub async fn get_editor(state: &State<ServerState>) -> Json<DataResponse<EditorDocument>> {
    handlers::get_editor_handler(state).await
}

#[put("/editor/content", data = "<request>")]
pub async fn set_content(
    request: Json<StandardRequest<SetContentRequest>>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>> {
    handlers::set_content_handler(request, state).await
}

#[post("/editor/selection", data = "<request>")]
pub async fn select(
    request: Json<StandardRequest<SelectionRequest>>,
    state: &State<ServerState>,
) -> Json<DataResponse<EditorDocument>> {
    handlers::select_handler(request, state).await
}

#[post("/editor/command", data = "<request>")]
pub async fn apply_command(
    request: Json<StandardRequest<CommandRequest>>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>> {
    handlers::command_handler(request, state).await
}

#[post("/editor/link", data = "<request>")]
pub async fn insert_link(
    request: Json<StandardRequest<LinkRequest>>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>> {
    handlers::insert_link_handler(request, state).await
}

#[post("/editor/image", data = "<request>")]
pub async fn insert_image(
    request: Json<StandardRequest<ImageRequest>>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>> {
    handlers::insert_image_handler(request, state).await
}

#[post("/editor/template", data = "<request>")]
pub async fn load_template(
    request: Json<StandardRequest<TemplateRequest>>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<EditorDocument>>, Json<StandardErrorResponse>> {
    handlers::load_template_handler(request, state).await
}

#[post("/editor/preview", data = "<request>")]
pub async fn set_preview(
    request: Json<StandardRequest<PreviewRequest>>,
    state: &State<ServerState>,
) -> Json<DataResponse<EditorDocument>> {
    handlers::preview_handler(request, state).await
}

#[post("/editor/save")]
pub async fn save_draft(
    state: &State<ServerState>,
) -> Result<Json<DataResponse<SavedDraftData>>, Json<StandardErrorResponse>> {
    handlers::save_handler(state).await
}

#[post("/editor/export/pdf")]
pub async fn export_pdf(state: &State<ServerState>) -> Result<FileResponse, Json<StandardErrorResponse>> {
    handlers::export_pdf_handler(state).await
}

#[post("/editor/export/html")]
pub async fn export_html(state: &State<ServerState>) -> Result<FileResponse, Json<StandardErrorResponse>> {
    handlers::export_html_handler(state).await
}

#[get("/skills?<category>&<generate>&<count>&<context>")]
pub async fn get_skills(
    category: String,
    generate: Option<bool>,
    count: Option<u32>,
    context: Option<String>,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<Vec<Skill>>>, Json<StandardErrorResponse>> {
    handlers::get_skills_handler(category, generate, count, context, state).await
}

#[get("/skills/categories")]
pub async fn get_categories(state: &State<ServerState>) -> Json<DataResponse<Vec<String>>> {
    handlers::get_categories_handler(state).await
}

#[get("/skills/search?<q>")]
pub async fn search_skills(
    q: String,
    state: &State<ServerState>,
) -> Result<Json<DataResponse<Vec<Skill>>>, Json<StandardErrorResponse>> {
    handlers::search_skills_handler(q, state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {}", request.uri()),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path and its query parameters".to_string()],
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "INVALID_PAYLOAD".to_string(),
        vec!["Verify field names and types".to_string()],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

/// Wire the editing session, skills cache and export pipeline from configuration
pub async fn init_state(config: &ConfigManager) -> Result<ServerState> {
    config.ensure_directories().await?;

    let database = Database::new(&config.environment.database_path).await?;
    let settings: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(config.settings_path()));

    let generator: Option<Arc<dyn SkillGenerator>> =
        match ServiceClient::new(&config.generation, settings.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("Skill generation disabled: {:#}", e);
                None
            }
        };

    let skills = Arc::new(SkillsCache::new(
        Arc::new(SqliteSkillStore::new(database.clone())),
        generator,
        config.generation.model.clone(),
    ));

    let registry = Arc::new(TemplateRegistry::new());
    let notifications = Arc::new(NotificationCenter::default());
    let exports = ExportPipeline::new(
        Arc::new(LopdfRenderer),
        Arc::new(FileDownloads::new(config.environment.download_path.clone())),
        notifications.clone(),
    );

    let mut session = LetterSession::new(
        registry.clone(),
        SnapshotStore::new(settings),
        exports,
        notifications.clone(),
    );
    let source = session.mount(None)?;
    info!("Editor mounted from {:?}", source);

    Ok(ServerState {
        session: Mutex::new(session),
        skills,
        registry,
        notifications,
        database,
    })
}

pub fn build_rocket(state: ServerState, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment().merge(("port", port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                get_templates,
                get_notifications,
                dismiss_notification,
                get_editor,
                set_content,
                select,
                apply_command,
                insert_link,
                insert_image,
                load_template,
                set_preview,
                save_draft,
                export_pdf,
                export_html,
                get_skills,
                get_categories,
                search_skills,
                options,
            ],
        )
}

// Main server start function; tracing is initialised by the caller
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let state = init_state(&config).await?;

    info!("Starting cover letter studio API on port {}", config.port);
    info!("Downloads: {}", config.environment.download_path.display());
    info!("Database: {}", config.environment.database_path.display());

    build_rocket(state, config.port)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryKeyValueStore;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};

    async fn client(dir: &std::path::Path) -> Client {
        let database = Database::in_memory().await.unwrap();
        let registry = Arc::new(TemplateRegistry::new());
        let notifications = Arc::new(NotificationCenter::default());
        let exports = ExportPipeline::new(
            Arc::new(LopdfRenderer),
            Arc::new(FileDownloads::new(dir.to_path_buf())),
            notifications.clone(),
        );
        let mut session = LetterSession::new(
            registry.clone(),
            SnapshotStore::new(Arc::new(MemoryKeyValueStore::new())),
            exports,
            notifications.clone(),
        );
        session.mount(Some("<p>Bonjour Madame</p>")).unwrap();

        let state = ServerState {
            session: Mutex::new(session),
            skills: Arc::new(SkillsCache::new(
                Arc::new(SqliteSkillStore::new(database.clone())),
                None,
                "test-model",
            )),
            registry,
            notifications,
            database,
        };
        Client::tracked(build_rocket(state, 0)).await.unwrap()
    }

    async fn post_json(client: &Client, uri: &str, body: Value) -> Value {
        client
            .post(uri)
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await
            .into_json::<Value>()
            .await
            .unwrap()
    }

    #[rocket::async_test]
    async fn test_bold_command_over_selection() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        post_json(&client, "/api/editor/selection", json!({"start": 0, "end": 7})).await;
        let body = post_json(&client, "/api/editor/command", json!({"command": "bold"})).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["html"], "<p><b>Bonjour</b> Madame</p>");
        assert_eq!(body["data"]["word_count"], 2);
    }

    #[rocket::async_test]
    async fn test_preview_mode_rejects_commands() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        post_json(&client, "/api/editor/preview", json!({"enabled": true})).await;
        let body = post_json(
            &client,
            "/api/editor/command",
            json!({"command": "italic", "conversation_id": "conv-9"}),
        )
        .await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "READ_ONLY");
        assert_eq!(body["conversation_id"], "conv-9");
    }

    #[rocket::async_test]
    async fn test_unknown_command_and_template() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let body = post_json(&client, "/api/editor/command", json!({"command": "strikeThrough"})).await;
        assert_eq!(body["error_code"], "UNKNOWN_COMMAND");

        let body = post_json(&client, "/api/editor/template", json!({"template_id": "baroque"})).await;
        assert_eq!(body["error_code"], "TEMPLATE_NOT_FOUND");
    }

    #[rocket::async_test]
    async fn test_short_search_returns_empty_without_store() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let body: Value = client
            .get("/api/skills/search?q=ru")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], json!([]));
    }

    #[rocket::async_test]
    async fn test_categories_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let body: Value = client
            .get("/api/skills/categories")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["data"][0], "technique");
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
    }

    #[rocket::async_test]
    async fn test_pdf_export_is_an_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let response = client.post("/api/editor/export/pdf").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        assert_eq!(
            response.headers().get_one("Content-Disposition"),
            Some("attachment; filename=\"lettre-de-motivation.pdf\"")
        );
        let bytes = response.into_bytes().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(dir.path().join("lettre-de-motivation.pdf").exists());
    }

    #[rocket::async_test]
    async fn test_templates_and_notifications() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let body: Value = client.get("/api/templates").dispatch().await.into_json().await.unwrap();
        assert!(body["data"].as_array().unwrap().len() >= 3);

        post_json(&client, "/api/editor/template", json!({"template_id": "moderne"})).await;
        let body: Value = client
            .get("/api/notifications")
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let id = body["data"][0]["id"].as_u64().unwrap();
        assert_eq!(body["data"][0]["level"], "info");

        let body: Value = client
            .delete(format!("/api/notifications/{}", id))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(body["success"], true);
    }
}
