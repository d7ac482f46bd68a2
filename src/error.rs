// src/error.rs
//! Error taxonomy shared by the editing session, the export pipeline and the skills cache

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Editor is in preview mode")]
    ReadOnly,
    #[error("Unknown editor command: {0}")]
    UnknownCommand(String),
    #[error("Command {0} requires a value")]
    MissingValue(&'static str),
    #[error("Invalid font size: {0}")]
    InvalidFontSize(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
    #[error("Rendering task aborted: {0}")]
    Aborted(String),
    #[error("Download failed: {0}")]
    Download(String),
}

/// Failure of the backing store for skill rows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SkillsError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Skill category is empty")]
    EmptyCategory,
    #[error("Skills store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Generation service rejected the credential")]
    Unauthorized,
    #[error("Generation service rate limit reached")]
    RateLimited,
    #[error("Generation service error (status {status:?}): {message}")]
    Service { status: Option<u16>, message: String },
    #[error("Malformed generation output: {reason}")]
    MalformedOutput { raw: String, reason: String },
}

impl SkillsError {
    /// Message shown to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(detail) => format!("Configuration incomplète : {}", detail),
            Self::EmptyCategory => "Indiquez une catégorie de compétences.".to_string(),
            Self::StoreUnavailable(_) => {
                "La base de compétences est indisponible. Réessayez plus tard.".to_string()
            }
            Self::Unauthorized => {
                "Clé API invalide. Vérifiez votre clé OpenAI dans les paramètres.".to_string()
            }
            Self::RateLimited => {
                "Limite de requêtes atteinte. Patientez quelques instants avant de réessayer."
                    .to_string()
            }
            Self::Service { .. } => {
                "Le service de génération a renvoyé une erreur.".to_string()
            }
            Self::MalformedOutput { .. } => {
                "La réponse générée est illisible. Relancez la génération.".to_string()
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::EmptyCategory => "INVALID_CATEGORY",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Unauthorized => "GENERATION_UNAUTHORIZED",
            Self::RateLimited => "GENERATION_RATE_LIMITED",
            Self::Service { .. } => "GENERATION_SERVICE_ERROR",
            Self::MalformedOutput { .. } => "MALFORMED_GENERATION_OUTPUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_have_distinct_codes() {
        let errors = [
            SkillsError::EmptyCategory,
            SkillsError::Unauthorized,
            SkillsError::RateLimited,
            SkillsError::Service {
                status: Some(500),
                message: "boom".to_string(),
            },
            SkillsError::MalformedOutput {
                raw: "nope".to_string(),
                reason: "not json".to_string(),
            },
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.error_code()).collect();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert_ne!(
            SkillsError::Unauthorized.user_message(),
            SkillsError::RateLimited.user_message()
        );
    }
}
