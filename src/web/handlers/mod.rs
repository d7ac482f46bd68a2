pub mod editor_handlers;
pub mod skills_handlers;
pub mod system_handlers;

pub use editor_handlers::*;
pub use skills_handlers::*;
pub use system_handlers::*;

use rocket::serde::json::Json;

use crate::error::{EditorError, ExportError, SkillsError, TemplateError};
use crate::web::types::StandardErrorResponse;

pub(crate) fn editor_error(e: EditorError, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    let (code, suggestions) = match &e {
        EditorError::ReadOnly => (
            "READ_ONLY",
            vec!["Disable preview mode before editing".to_string()],
        ),
        EditorError::UnknownCommand(_) => (
            "UNKNOWN_COMMAND",
            vec![
                "Use a browser command name such as bold, foreColor or insertOrderedList"
                    .to_string(),
            ],
        ),
        EditorError::MissingValue(_) => (
            "MISSING_VALUE",
            vec!["Provide a value for foreColor, fontName and fontSize".to_string()],
        ),
        EditorError::InvalidFontSize(_) => (
            "INVALID_FONT_SIZE",
            vec!["Send a point size such as 14 or 14pt".to_string()],
        ),
        EditorError::Template(TemplateError::NotFound(_)) => (
            "TEMPLATE_NOT_FOUND",
            vec!["List available templates with GET /api/templates".to_string()],
        ),
    };

    Json(StandardErrorResponse::new(
        e.to_string(),
        code.to_string(),
        suggestions,
        conversation_id,
    ))
}

pub(crate) fn export_error(e: ExportError, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    let code = match &e {
        ExportError::Render(_) | ExportError::Aborted(_) => "EXPORT_RENDER_FAILED",
        ExportError::Download(_) => "EXPORT_DOWNLOAD_FAILED",
    };

    Json(StandardErrorResponse::new(
        e.to_string(),
        code.to_string(),
        vec!["Try the export again".to_string()],
        conversation_id,
    ))
}

pub(crate) fn skills_error(e: SkillsError, conversation_id: Option<String>) -> Json<StandardErrorResponse> {
    let suggestions = match &e {
        SkillsError::Unauthorized | SkillsError::Configuration(_) => {
            vec!["Check the OpenAI API key in the settings".to_string()]
        }
        SkillsError::RateLimited => vec!["Wait a few moments before generating again".to_string()],
        SkillsError::EmptyCategory => {
            vec!["Pass a category such as technique or langues".to_string()]
        }
        _ => vec!["Try again in a few moments".to_string()],
    };

    Json(StandardErrorResponse::new(
        e.user_message(),
        e.error_code().to_string(),
        suggestions,
        conversation_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_codes() {
        let response = editor_error(EditorError::ReadOnly, Some("c".to_string()));
        assert_eq!(response.error_code, "READ_ONLY");
        assert_eq!(response.conversation_id.as_deref(), Some("c"));

        let response = editor_error(
            EditorError::Template(TemplateError::NotFound("inconnu".to_string())),
            None,
        );
        assert_eq!(response.error_code, "TEMPLATE_NOT_FOUND");
        assert!(response.error.contains("inconnu"));
    }

    #[test]
    fn test_skills_error_uses_user_message() {
        let response = skills_error(SkillsError::RateLimited, None);
        assert_eq!(response.error_code, "GENERATION_RATE_LIMITED");
        assert_eq!(response.error, SkillsError::RateLimited.user_message());
        assert!(!response.success);
    }
}
