//! services/api/src/adapters/ml.rs
//!
//! Adapters for the backend's machine-learning endpoints: the image
//! classifier and the metadata-aware price predictor.

use super::backend::{image_part, BackendClient};
use async_trait::async_trait;
use reqwest::{multipart::Form, Method};
use serde::Deserialize;
use smartstock_core::domain::{AccessToken, Classification, ImageUpload, PriceRequest};
use smartstock_core::ports::{ClassifierService, PortResult, PricePredictionService};
use tracing::debug;

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Debug, Deserialize)]
struct ClassifyRecord {
    product_type: String,
    /// The classifier reports the breed as the product name.
    product_name: String,
    price_predicted: f64,
    confidence: f64,
    #[serde(default)]
    exists: bool,
}

impl From<ClassifyRecord> for Classification {
    fn from(record: ClassifyRecord) -> Self {
        Self {
            product_type: record.product_type,
            breed: record.product_name,
            price_predicted: record.price_predicted,
            confidence: record.confidence,
            exists: record.exists,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    predicted_price: f64,
}

//=========================================================================================
// Classifier
//=========================================================================================

#[derive(Clone)]
pub struct HttpClassifierAdapter {
    backend: BackendClient,
}

impl HttpClassifierAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ClassifierService for HttpClassifierAdapter {
    async fn classify(&self, image: &ImageUpload) -> PortResult<Classification> {
        let form = Form::new().part("file", image_part(image)?);
        let request = self
            .backend
            .request(Method::POST, &["ml", "classify-and-predict"])?
            .multipart(form);
        let record = BackendClient::send_json::<ClassifyRecord>(request).await?;
        debug!(
            product_type = %record.product_type,
            breed = %record.product_name,
            confidence = record.confidence,
            "Image classified"
        );
        Ok(record.into())
    }
}

//=========================================================================================
// Price Predictor
//=========================================================================================

#[derive(Clone)]
pub struct HttpPricingAdapter {
    backend: BackendClient,
}

impl HttpPricingAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl PricePredictionService for HttpPricingAdapter {
    async fn predict_price(&self, token: &AccessToken, request: PriceRequest<'_>) -> PortResult<f64> {
        let form = price_form(&request)?;
        let http = self
            .backend
            .authed(Method::POST, &["ml", "predict-price"], token)?
            .multipart(form);
        let record = BackendClient::send_json::<PriceRecord>(http).await?;
        Ok(record.predicted_price)
    }
}

fn price_form(request: &PriceRequest<'_>) -> PortResult<Form> {
    let metadata = request.metadata;
    Ok(Form::new()
        .part("image", image_part(request.image)?)
        .text("pet_type", request.pet_type.to_string())
        .text("breed", request.breed.to_string())
        .text("age_months", metadata.age_months.to_string())
        .text("weight_kg", metadata.weight_kg.to_string())
        .text("health_status", metadata.health_status.code().to_string())
        .text("vaccinated", metadata.vaccinated.to_string())
        .text("country", metadata.country.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_record_maps_product_name_to_breed() {
        let record: ClassifyRecord = serde_json::from_str(
            r#"{"product_type":"Dog","product_name":"Beagle","price_predicted":120.0,"confidence":0.92}"#,
        )
        .unwrap();
        let classification = Classification::from(record);
        assert_eq!(classification.breed, "Beagle");
        assert!(!classification.exists);
    }

    #[test]
    fn price_record_ignores_extra_metadata() {
        let record: PriceRecord = serde_json::from_str(
            r#"{"predicted_price":150.0,"metadata":{"breed":"Beagle","country":"USA"}}"#,
        )
        .unwrap();
        assert_eq!(record.predicted_price, 150.0);
    }
}
