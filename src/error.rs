use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

/// Error taxonomy for both request pipelines.
///
/// The first two variants are expected chain conditions and map to 4xx
/// responses; everything else is a server-side failure reported as a
/// generic 500 (details are logged, never returned to the caller).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested slot is beyond the current head slot.
    #[error("slot {0} is in the future")]
    FutureSlot(u64),

    /// The slot is in the past but no block was ever proposed for it.
    #[error("slot {0} does not exist or was missed")]
    SlotMissed(u64),

    /// A fetch from the beacon or execution data source failed.
    #[error("upstream fetch failed: {0:#}")]
    Upstream(#[source] anyhow::Error),

    /// Reward arithmetic violated an invariant (underflow/overflow),
    /// which signals inconsistent upstream data.
    #[error("reward computation invariant violated: {0}")]
    Computation(String),

    /// One or more concurrent validator lookups failed.
    #[error("{failed} of {total} validator lookups failed")]
    Resolution { failed: usize, total: usize },
}

impl ApiError {
    pub fn upstream(err: impl Into<anyhow::Error>) -> Self {
        Self::Upstream(err.into())
    }

    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::FutureSlot(_) => StatusCode::BAD_REQUEST,
            Self::SlotMissed(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Computation(_) | Self::Resolution { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::FutureSlot(_) => "requested slot is in the future",
            Self::SlotMissed(_) => "slot does not exist / was missed",
            _ => {
                error!("request failed: {:#}", self);
                "internal server error"
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
