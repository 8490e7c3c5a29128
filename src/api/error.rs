//! Mapping of domain failures onto HTTP responses

use crate::error::PeladaError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error returned by every handler, rendered as `{"error": <message>}`
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<PeladaError>() {
            Some(PeladaError::InvalidVote { .. })
            | Some(PeladaError::InvalidSettings { .. })
            | Some(PeladaError::InvalidRequest { .. }) => StatusCode::BAD_REQUEST,
            Some(PeladaError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            Some(PeladaError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(PeladaError::SeasonConflict { .. }) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self(error)
    }
}

impl From<PeladaError> for ApiError {
    fn from(error: PeladaError) -> Self {
        Self(error.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        PeladaError::InvalidRequest {
            reason: rejection.body_text(),
        }
        .into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        PeladaError::InvalidRequest {
            reason: rejection.body_text(),
        }
        .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {:#}", self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                PeladaError::InvalidVote {
                    reason: String::new(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PeladaError::InvalidSettings {
                    reason: String::new(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PeladaError::Forbidden {
                    reason: String::new(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                PeladaError::NotFound {
                    what: String::new(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                PeladaError::SeasonConflict { organization_id: 1 },
                StatusCode::CONFLICT,
            ),
            (
                PeladaError::StorageError {
                    message: String::new(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
