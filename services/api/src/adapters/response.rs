//! services/api/src/adapters/response.rs
//!
//! Response handling shared by both HTTP adapters.

use resume_tailor_core::ports::{PortError, PortResult};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

/// The analysis service reports its own failures as a success status with
/// this body.
#[derive(Deserialize)]
struct ServiceFailure {
    error: String,
}

/// Reads a JSON success payload, mapping every other outcome onto `PortError`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> PortResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PortError::Unavailable(e.to_string()))?;
    debug!(status = status.as_u16(), bytes = body.len(), "Gateway responded.");

    if !status.is_success() {
        return Err(PortError::Rejected {
            status: status.as_u16(),
            message: body,
        });
    }
    if let Ok(ServiceFailure { error }) = serde_json::from_str::<ServiceFailure>(&body) {
        return Err(PortError::Rejected {
            status: status.as_u16(),
            message: error,
        });
    }
    serde_json::from_str::<T>(&body).map_err(|e| PortError::Rejected {
        status: status.as_u16(),
        message: format!("Unexpected response body: {}", e),
    })
}
