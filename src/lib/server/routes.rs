use std::sync::Arc;

use alloy::primitives::{Bytes, B256};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::batcher::{AddOutcome, BatchStatus, BatcherError, CertificateBatcher};
use crate::domain::batch::SubmissionReceipt;
use crate::ports::chain::RootRegistry;

/// Shared application state for axum route handlers.
pub struct AppState<R: RootRegistry> {
    pub batcher: Arc<CertificateBatcher<R>>,
}

impl<R: RootRegistry> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            batcher: self.batcher.clone(),
        }
    }
}

pub const HEALTH_MESSAGE: &str = "✅ Merkle Root Generator API is running...";

// ── Request / response types ──

/// Body of POST /api/addCertificateHash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCertificateHashRequest {
    #[serde(default)]
    pub certificate_hash: Option<String>,
}

/// Response for a hash that was queued.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedResponse {
    pub message: String,
    pub current_count: usize,
}

/// Response for a batch whose root is confirmed on-chain.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedResponse {
    pub root: B256,
    pub proofs: Vec<Vec<Bytes>>,
    pub tx_hash: B256,
}

impl From<SubmissionReceipt> for SealedResponse {
    fn from(receipt: SubmissionReceipt) -> Self {
        Self {
            root: receipt.root,
            proofs: receipt.proofs,
            tx_hash: receipt.tx_hash,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddCertificateHashResponse {
    Sealed(SealedResponse),
    Queued(QueuedResponse),
}

/// Response for GET /api/status.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub pending: usize,
    pub batch_size: usize,
    pub sealed_batches: usize,
    pub last_root: Option<B256>,
}

impl From<BatchStatus> for StatusResponse {
    fn from(status: BatchStatus) -> Self {
        Self {
            pending: status.pending,
            batch_size: status.batch_size,
            sealed_batches: status.sealed_batches,
            last_root: status.last_root,
        }
    }
}

// ── Route handlers ──

/// GET /: liveness check.
pub async fn health_handler() -> &'static str {
    HEALTH_MESSAGE
}

/// POST /api/addCertificateHash queues a hash, sealing the batch when it fills.
pub async fn add_certificate_hash_handler<R: RootRegistry + 'static>(
    State(state): State<AppState<R>>,
    payload: Result<Json<AddCertificateHashRequest>, JsonRejection>,
) -> Result<Json<AddCertificateHashResponse>, AppError> {
    let certificate_hash = match payload {
        Ok(Json(request)) => request.certificate_hash,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable request body");
            None
        }
    };

    let outcome = state
        .batcher
        .add_certificate_hash(certificate_hash.as_deref())
        .await?;

    let response = match outcome {
        AddOutcome::Queued { count } => AddCertificateHashResponse::Queued(QueuedResponse {
            message: "Certificate hash added successfully".into(),
            current_count: count,
        }),
        AddOutcome::Sealed(receipt) => AddCertificateHashResponse::Sealed(receipt.into()),
    };
    Ok(Json(response))
}

/// POST /api/retrySubmission resubmits a batch kept after a chain failure.
pub async fn retry_submission_handler<R: RootRegistry + 'static>(
    State(state): State<AppState<R>>,
) -> Result<Json<SealedResponse>, AppError> {
    let receipt = state.batcher.retry_submission().await?;
    Ok(Json(receipt.into()))
}

/// GET /api/status reports pending count and sealing history.
pub async fn status_handler<R: RootRegistry + 'static>(
    State(state): State<AppState<R>>,
) -> Json<StatusResponse> {
    Json(state.batcher.status().await.into())
}

// ── Error handling ──

/// Application error type that maps to HTTP status codes.
pub enum AppError {
    BadRequest(String),
    Conflict { message: String, current_count: usize },
    ChainFailure(String),
    Internal(String),
}

impl From<BatcherError> for AppError {
    fn from(e: BatcherError) -> Self {
        match e {
            BatcherError::Validation(v) => AppError::BadRequest(v.to_string()),
            BatcherError::BatchFull { count } => AppError::Conflict {
                message: "Batch already full; retry the pending submission".into(),
                current_count: count,
            },
            BatcherError::NothingToRetry { count } => AppError::Conflict {
                message: "No full batch pending".into(),
                current_count: count,
            },
            BatcherError::Chain(c) => AppError::ChainFailure(c.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, serde_json::json!({ "message": m })),
            AppError::Conflict {
                message,
                current_count,
            } => (
                StatusCode::CONFLICT,
                serde_json::json!({ "message": message, "currentCount": current_count }),
            ),
            AppError::ChainFailure(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "message": "Failed to store root", "error": e }),
            ),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "message": "Internal server error", "error": e }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
