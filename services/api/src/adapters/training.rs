//! services/api/src/adapters/training.rs
//!
//! This module contains the adapter for the backend's model-training endpoints.
//! It implements the `TrainingService` port from the `core` crate.

use super::backend::BackendClient;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use serde::Deserialize;
use smartstock_core::domain::{BreedUpload, TrainingJob, TrainingMode, TrainingSnapshot, TrainingStatus};
use smartstock_core::ports::{PortError, PortResult, TrainingService};
use tracing::{info, warn};

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
struct JobRecord {
    message: String,
    mode: String,
    breed: String,
    #[serde(rename = "type")]
    product_type: String,
}

impl JobRecord {
    fn to_domain(self) -> PortResult<TrainingJob> {
        let mode = match self.mode.as_str() {
            "add_breed" => TrainingMode::AddBreed,
            "fine_tune" => TrainingMode::FineTune,
            other => {
                return Err(PortError::Unexpected(format!(
                    "Unknown training mode '{}'",
                    other
                )))
            }
        };
        Ok(TrainingJob {
            mode,
            message: self.message,
            breed: self.breed,
            product_type: self.product_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusRecord {
    status: String,
    #[serde(default)]
    logs: Vec<String>,
}

impl From<StatusRecord> for TrainingSnapshot {
    fn from(record: StatusRecord) -> Self {
        let status = TrainingStatus::from_name(&record.status).unwrap_or_else(|| {
            warn!(status = %record.status, "Unknown training status, treating as running");
            TrainingStatus::Running
        });
        Self {
            status,
            logs: record.logs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BreedsRecord {
    #[serde(default)]
    breeds: Vec<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct HttpTrainingAdapter {
    backend: BackendClient,
}

impl HttpTrainingAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl TrainingService for HttpTrainingAdapter {
    async fn submit_breed_images(&self, upload: &BreedUpload) -> PortResult<TrainingJob> {
        let archive = Part::bytes(upload.archive.to_vec())
            .file_name(upload.archive_name.clone())
            .mime_str("application/zip")
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let form = Form::new()
            .text("breed_name", upload.breed_name.trim().to_string())
            .text("product_type", upload.product_type.trim().to_string())
            .part("images_zip", archive);

        let request = self
            .backend
            .request(Method::POST, &["train", "add-breed"])?
            .multipart(form);
        let job = BackendClient::send_json::<JobRecord>(request).await?.to_domain()?;
        info!(breed = %job.breed, mode = ?job.mode, "Training job started");
        Ok(job)
    }

    async fn training_status(&self) -> PortResult<TrainingSnapshot> {
        let request = self.backend.request(Method::GET, &["train", "status"])?;
        Ok(BackendClient::send_json::<StatusRecord>(request).await?.into())
    }

    async fn list_breeds(&self, product_type: &str) -> PortResult<Vec<String>> {
        let request = self
            .backend
            .request(Method::GET, &["train", "breeds", product_type])?;
        Ok(BackendClient::send_json::<BreedsRecord>(request).await?.breeds)
    }
}
