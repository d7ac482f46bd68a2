// src/web/types.rs
use rocket::http::ContentType;
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::Database;
use crate::export::ExportedFile;
use crate::notification::NotificationCenter;
use crate::session::LetterSession;
use crate::skills::SkillsCache;
use crate::template_processor::LetterFields;
use crate::template_system::{Template, TemplateRegistry, TemplateStyle};

/// Exported document sent back as an attachment
pub struct FileResponse {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: ContentType,
}

impl FileResponse {
    pub fn pdf(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            filename,
            content_type: ContentType::PDF,
        }
    }

    pub fn html(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            filename,
            content_type: ContentType::HTML,
        }
    }
}

impl From<ExportedFile> for FileResponse {
    fn from(file: ExportedFile) -> Self {
        if file.filename.ends_with(".pdf") {
            Self::pdf(file.bytes, file.filename)
        } else {
            Self::html(file.bytes, file.filename)
        }
    }
}

impl<'r> Responder<'r, 'static> for FileResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(self.content_type)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

/// Everything the routes share
pub struct ServerState {
    pub session: Mutex<LetterSession>,
    pub skills: Arc<SkillsCache>,
    pub registry: Arc<TemplateRegistry>,
    pub notifications: Arc<NotificationCenter>,
    pub database: Database,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SetContentRequest {
    pub html: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SelectionRequest {
    pub start: usize,
    pub end: usize,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LinkRequest {
    pub url: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ImageRequest {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct TemplateRequest {
    pub template_id: String,
    #[serde(default)]
    pub fields: Option<LetterFields>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct PreviewRequest {
    pub enabled: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub style: TemplateStyle,
}

impl From<&Template> for TemplateInfo {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            style: template.style.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SavedDraftData {
    pub timestamp: String,
    pub template_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

// Request types with conversation_id support
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

impl TextResponse {
    pub fn success(message: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
            conversation_id,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            conversation_id,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_request_flattens_payload() {
        let request: StandardRequest<CommandRequest> = serde_json::from_str(
            r#"{"command": "fontSize", "value": "14pt", "conversation_id": "c-1"}"#,
        )
        .unwrap();
        assert_eq!(request.data.command, "fontSize");
        assert_eq!(request.data.value.as_deref(), Some("14pt"));
        assert_eq!(request.conversation_id(), Some("c-1".to_string()));
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(StandardErrorResponse::new(
            "Editor is in preview mode".to_string(),
            "READ_ONLY".to_string(),
            vec![],
            None,
        ))
        .unwrap();
        assert_eq!(body["type"], "error");
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "READ_ONLY");
        assert!(body.get("conversation_id").is_none());
    }

    #[test]
    fn test_template_request_fields_are_optional() {
        let request: StandardRequest<TemplateRequest> =
            serde_json::from_str(r#"{"template_id": "moderne"}"#).unwrap();
        assert_eq!(request.data.template_id, "moderne");
        assert!(request.data.fields.is_none());
    }
}
