//! Command Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::permissions::{ExpiryMarker, GrantError, Privilege};
use crate::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Bad arguments. Nothing was changed.
    #[error("{0}")]
    UserInput(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Refused by a moderation rule. Nothing was changed.
    #[error("{0}")]
    PolicyViolation(String),

    #[error("This command requires {required} privileges")]
    Forbidden { required: Privilege },

    #[error("This server is not authorized to use the bot")]
    ServerNotAuthorized,

    #[error("You are banned {}", describe_ban(.until))]
    Banned { until: Option<ExpiryMarker> },

    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_ban(until: &Option<ExpiryMarker>) -> String {
    match until {
        Some(marker @ ExpiryMarker::At(_)) => format!("until {marker}"),
        Some(ExpiryMarker::Never) | None => "forever".to_owned(),
    }
}

impl CommandError {
    /// Stable error code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UserInput(_) => "invalid_input",
            Self::UnknownCommand(_) => "unknown_command",
            Self::PolicyViolation(_) => "policy_violation",
            Self::Forbidden { .. } => "forbidden",
            Self::ServerNotAuthorized => "server_not_authorized",
            Self::Banned { .. } => "banned",
            Self::Grant(GrantError::InvalidDuration(_)) => "invalid_input",
            Self::Grant(_) | Self::Settings(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::UserInput(_)
            | Self::UnknownCommand(_)
            | Self::Grant(GrantError::InvalidDuration(_)) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::PolicyViolation(_)
            | Self::Forbidden { .. }
            | Self::ServerNotAuthorized
            | Self::Banned { .. } => (StatusCode::FORBIDDEN, self.to_string()),
            Self::Grant(e) => {
                tracing::error!(error = %e, "Grant store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save permissions, nothing was changed".to_string(),
                )
            }
            Self::Settings(e) => {
                tracing::error!(error = %e, "Settings store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not save settings, nothing was changed".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "Command execution failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": self.code(), "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_codes() {
        let cases = [
            (CommandError::UserInput("bad".into()), StatusCode::BAD_REQUEST),
            (CommandError::UnknownCommand("x".into()), StatusCode::BAD_REQUEST),
            (CommandError::PolicyViolation("no".into()), StatusCode::FORBIDDEN),
            (
                CommandError::Forbidden { required: Privilege::Owner },
                StatusCode::FORBIDDEN,
            ),
            (CommandError::ServerNotAuthorized, StatusCode::FORBIDDEN),
            (CommandError::Banned { until: None }, StatusCode::FORBIDDEN),
            (
                CommandError::Grant(GrantError::InvalidDuration(f64::NAN)),
                StatusCode::BAD_REQUEST,
            ),
            (
                CommandError::Grant(GrantError::Storage(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (CommandError::Internal("join".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let code = error.code();
            assert_eq!(error.into_response().status(), expected, "{code}");
        }
    }

    #[test]
    fn test_messages() {
        let forbidden = CommandError::Forbidden { required: Privilege::Admin };
        assert_eq!(forbidden.to_string(), "This command requires admin privileges");

        let until = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 0).unwrap();
        let banned = CommandError::Banned { until: Some(ExpiryMarker::At(until)) };
        assert_eq!(banned.to_string(), "You are banned until 2026-01-02 03:04 UTC");

        let forever = CommandError::Banned { until: Some(ExpiryMarker::Never) };
        assert_eq!(forever.to_string(), "You are banned forever");
    }
}
