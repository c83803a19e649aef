use crate::schema::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Graph API error (HTTP {status}): {message}")]
    GraphApiError { status: u16, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration:\n{}", format_diagnostics(.0))]
    Validation(Vec<Diagnostic>),

    #[error("Conversion error at '{path}': {message}")]
    Conversion { path: String, message: String },

    #[error("Unknown resource type '{0}'")]
    UnknownResource(String),

    #[error("Unknown data source '{0}'")]
    UnknownDataSource(String),

    #[error("Access token not found. Set MSGRAPH_ACCESS_TOKEN or cache a token for the tenant")]
    TokenNotFound,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The entity exists in Graph but a follow-up write failed
    #[error("{source} ('{id}' was created but is not fully configured)")]
    IncompleteCreate {
        id: String,
        state: Box<serde_json::Value>,
        source: Box<ProviderError>,
    },
}

pub type Result<T> = std::result::Result<T, ProviderError>;

pub use ProviderError as Error;

impl ProviderError {
    pub fn conversion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            path: path.into(),
            message: message.into(),
        }
    }

    /// State to record for an entity that was created despite the error
    pub fn partial_state(&self) -> Option<&serde_json::Value> {
        match self {
            Self::IncompleteCreate { state, .. } => Some(state),
            _ => None,
        }
    }

    /// True for a Graph 404, which the engine treats as "resource gone"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
            || matches!(self, Self::GraphApiError { status: 404, .. })
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  - {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse Graph API error response and provide helpful context
pub fn enhance_graph_error(error_response: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<serde_json::Value>(error_response) {
        if let Some(error_obj) = error_json.get("error") {
            let code = error_obj
                .get("code")
                .and_then(|c| c.as_str())
                .unwrap_or("Unknown");
            let message = error_obj
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("No message");

            let hint = match code {
                "Unauthorized" | "InvalidAuthenticationToken" => {
                    "\nHint: the access token may have expired. Refresh MSGRAPH_ACCESS_TOKEN or the cached token."
                }
                "Forbidden" | "Authorization_RequestDenied" | "InsufficientPrivileges" => {
                    "\nHint: check that the app registration has the required Graph permissions and admin consent."
                }
                "BadRequest" | "Request_BadRequest" => {
                    if message.contains("Resource not found for the segment") {
                        "\nHint: this entity may only exist on the beta endpoint (set api_version = \"beta\")."
                    } else if message.contains("already exists") {
                        "\nHint: an object with this name already exists. Import it instead of creating it."
                    } else if message.contains("odata.type") {
                        "\nHint: the derived type in the payload does not match the entity. Check which type block is set."
                    } else {
                        "\nHint: the request payload may not match the entity schema."
                    }
                }
                "Request_ResourceNotFound" | "ResourceNotFound" | "NotFound" => {
                    "\nHint: the object no longer exists. It may have been deleted outside of this tool."
                }
                "TooManyRequests" => "\nHint: API rate limit exceeded. Wait a moment and try again.",
                _ => "",
            };

            return format!("{}: {}{}", code, message, hint);
        }
    }

    error_response.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_graph_error_with_hint() {
        let body = r#"{"error":{"code":"Forbidden","message":"Insufficient privileges"}}"#;
        let enhanced = enhance_graph_error(body);
        assert!(enhanced.starts_with("Forbidden: Insufficient privileges"));
        assert!(enhanced.contains("admin consent"));
    }

    #[test]
    fn test_enhance_graph_error_raw_passthrough() {
        assert_eq!(enhance_graph_error("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_is_not_found() {
        let err = ProviderError::GraphApiError {
            status: 404,
            message: "gone".into(),
        };
        assert!(err.is_not_found());
        assert!(!ProviderError::TokenNotFound.is_not_found());
    }
}
