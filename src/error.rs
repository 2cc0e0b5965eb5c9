use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Which on-disk document failed to load or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Schedule,
    Progress,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Schedule => f.write_str("schedule"),
            StoreKind::Progress => f.write_str("progress"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid day")]
    InvalidDay,
    #[error("{store} store unavailable: {reason:#}")]
    StoreUnavailable {
        store: StoreKind,
        reason: anyhow::Error,
    },
}

impl Error {
    pub fn schedule(reason: impl Into<anyhow::Error>) -> Self {
        Error::StoreUnavailable {
            store: StoreKind::Schedule,
            reason: reason.into(),
        }
    }

    pub fn progress(reason: impl Into<anyhow::Error>) -> Self {
        Error::StoreUnavailable {
            store: StoreKind::Progress,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidDay => (StatusCode::NOT_FOUND, "Invalid day").into_response(),
            Error::StoreUnavailable { store, reason } => {
                error!("{} store unavailable: {:#}", store, reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("The {store} could not be loaded"),
                )
                    .into_response()
            }
        }
    }
}
