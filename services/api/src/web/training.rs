//! services/api/src/web/training.rs
//!
//! Admin endpoints for teaching the classifier new breeds and watching the
//! resulting training job.

use crate::error::{port_rejection, HandlerError};
use crate::web::{
    protocol::{BreedsView, TrainingJobView, TrainingStatusView},
    state::{AppState, TrainingMonitor},
    training_task::training_poll_process,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use smartstock_core::domain::BreedUpload;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

fn bad_request(message: impl Into<String>) -> HandlerError {
    (StatusCode::BAD_REQUEST, message.into())
}

async fn read_breed_upload(mut multipart: Multipart) -> Result<BreedUpload, HandlerError> {
    let mut breed_name = None;
    let mut product_type = None;
    let mut archive: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        match field.name() {
            Some("breed_name") => {
                breed_name = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            Some("product_type") => {
                product_type = Some(field.text().await.map_err(|e| bad_request(e.to_string()))?)
            }
            Some("images_zip") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
                archive = Some((name, bytes));
            }
            _ => {}
        }
    }

    let breed_name = breed_name
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| bad_request("Breed name is required"))?;
    let product_type = product_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| bad_request("Product type is required"))?;
    let (archive_name, archive) = archive.ok_or_else(|| bad_request("A ZIP file of images is required"))?;
    if !archive_name.to_ascii_lowercase().ends_with(".zip") {
        return Err(bad_request("File must be a ZIP archive"));
    }

    Ok(BreedUpload {
        breed_name,
        product_type,
        archive_name,
        archive,
    })
}

/// POST /admin/train - Upload breed images and start training
///
/// Accepts `breed_name`, `product_type` and an `images_zip` file part. Any
/// previous monitor is replaced by a poller for the new job.
#[utoipa::path(
    post,
    path = "/admin/train",
    request_body(content_type = "multipart/form-data", description = "`breed_name`, `product_type` and `images_zip`."),
    responses(
        (status = 202, description = "Training started", body = TrainingJobView),
        (status = 400, description = "Missing field or not a ZIP archive"),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer" = [])),
    tag = "training"
)]
pub async fn start_training_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let upload = read_breed_upload(multipart).await?;
    let job = state.training.submit_breed_images(&upload).await.map_err(|e| {
        error!(breed = %upload.breed_name, "Failed to start training: {}", e);
        port_rejection(e)
    })?;

    let view = TrainingJobView::from(&job);
    let latest = Arc::new(Mutex::new(None));
    let cancel = CancellationToken::new();

    {
        let mut slot = state.training_monitor.lock().await;
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            info!(breed = %previous.job.breed, "Replacing the previous training monitor");
        }
        *slot = Some(TrainingMonitor {
            job,
            latest: latest.clone(),
            cancel: cancel.clone(),
        });
    }

    tokio::spawn(training_poll_process(
        state.training.clone(),
        latest,
        state.config.training_poll_interval,
        cancel,
    ));

    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// GET /admin/train/status - The latest known training status
#[utoipa::path(
    get,
    path = "/admin/train/status",
    responses((status = 200, description = "Training status and recent log lines", body = TrainingStatusView)),
    security(("bearer" = [])),
    tag = "training"
)]
pub async fn training_status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrainingStatusView>, HandlerError> {
    let (seen, job) = {
        let slot = state.training_monitor.lock().await;
        match slot.as_ref() {
            Some(monitor) => (
                monitor.latest.lock().await.clone(),
                Some(TrainingJobView::from(&monitor.job)),
            ),
            None => (None, None),
        }
    };

    let snapshot = match seen {
        Some(snapshot) => snapshot,
        None => state.training.training_status().await.map_err(port_rejection)?,
    };
    let monitoring = job.is_some() && !snapshot.status.is_terminal();
    Ok(Json(TrainingStatusView::new(snapshot, monitoring, job)))
}

/// DELETE /admin/train/monitor - Stop watching the current job
#[utoipa::path(
    delete,
    path = "/admin/train/monitor",
    responses(
        (status = 204, description = "Monitor stopped"),
        (status = 404, description = "Nothing is being monitored")
    ),
    security(("bearer" = [])),
    tag = "training"
)]
pub async fn stop_monitor_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.stop_training_monitor().await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /admin/train/breeds/{product_type} - Breeds the classifier already knows
#[utoipa::path(
    get,
    path = "/admin/train/breeds/{product_type}",
    params(("product_type" = String, Path, description = "e.g. Dog or Cat")),
    responses((status = 200, description = "Known breeds, sorted", body = BreedsView)),
    security(("bearer" = [])),
    tag = "training"
)]
pub async fn list_breeds_handler(
    State(state): State<Arc<AppState>>,
    Path(product_type): Path<String>,
) -> Result<Json<BreedsView>, HandlerError> {
    let breeds = state
        .training
        .list_breeds(&product_type)
        .await
        .map_err(port_rejection)?;
    Ok(Json(BreedsView {
        product_type,
        breeds,
    }))
}
