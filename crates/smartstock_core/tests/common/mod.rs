//! In-memory port implementations shared by the core integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use smartstock_core::domain::{
    AccessToken, Classification, ImageUpload, InventorySummary, NewProduct, PriceRequest, Product,
    ProductPatch, ProductQuery, ShopQuery,
};
use smartstock_core::ports::{
    ClassifierService, PortError, PortResult, PricePredictionService, ProductCatalogService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn token() -> AccessToken {
    AccessToken::new("test-token")
}

pub fn beagle_photo() -> ImageUpload {
    ImageUpload::new("beagle.jpg", "image/jpeg", Bytes::from_static(b"\xff\xd8\xff\xe0"))
}

pub fn beagle_classification() -> Classification {
    Classification {
        product_type: "Dog".to_string(),
        breed: "Beagle".to_string(),
        price_predicted: 120.0,
        confidence: 0.92,
        exists: false,
    }
}

//=========================================================================================
// Classifier
//=========================================================================================

pub struct FakeClassifier {
    response: PortResult<Classification>,
    calls: AtomicUsize,
}

impl FakeClassifier {
    pub fn returning(result: Classification) -> Self {
        Self {
            response: Ok(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(PortError::Unexpected("classifier offline".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierService for FakeClassifier {
    async fn classify(&self, _image: &ImageUpload) -> PortResult<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

//=========================================================================================
// Price Predictor
//=========================================================================================

/// The arguments of the last price request, captured for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPriceRequest {
    pub pet_type: String,
    pub breed: String,
    pub age_months: u32,
    pub country: String,
}

pub struct FakePricer {
    response: PortResult<f64>,
    calls: AtomicUsize,
    last: Mutex<Option<RecordedPriceRequest>>,
}

impl FakePricer {
    pub fn returning(price: f64) -> Self {
        Self {
            response: Ok(price),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: Err(PortError::Unexpected("price model unavailable".to_string())),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedPriceRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl PricePredictionService for FakePricer {
    async fn predict_price(&self, _token: &AccessToken, request: PriceRequest<'_>) -> PortResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(RecordedPriceRequest {
            pet_type: request.pet_type.to_string(),
            breed: request.breed.to_string(),
            age_months: request.metadata.age_months,
            country: request.metadata.country.clone(),
        });
        self.response.clone()
    }
}

//=========================================================================================
// Product Catalog
//=========================================================================================

#[derive(Default)]
pub struct FakeCatalog {
    fail: bool,
    created: Mutex<Vec<NewProduct>>,
}

impl FakeCatalog {
    pub fn failing() -> Self {
        Self {
            fail: true,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<NewProduct> {
        self.created.lock().unwrap().clone()
    }
}

fn unused<T>() -> PortResult<T> {
    Err(PortError::Unexpected("not used in this test".to_string()))
}

#[async_trait]
impl ProductCatalogService for FakeCatalog {
    async fn create_product(&self, _token: &AccessToken, product: &NewProduct) -> PortResult<Product> {
        if self.fail {
            return Err(PortError::Unexpected("backend returned 500".to_string()));
        }
        self.created.lock().unwrap().push(product.clone());
        Ok(Product {
            id: "p-1".to_string(),
            product_id: "p-1".to_string(),
            product_name: product.product_name.clone(),
            product_type: product.product_type.clone(),
            price_predicted: product.price_predicted,
            price_modified: product.price_modified,
            quantity: product.quantity,
            published: false,
            has_image: product.image.is_some(),
            date_added: Utc::now(),
            age_months: product.metadata.as_ref().map(|m| m.age_months),
            weight_kg: product.metadata.as_ref().map(|m| m.weight_kg),
            health_status: product.metadata.as_ref().map(|m| m.health_status),
            vaccinated: product.metadata.as_ref().map(|m| m.vaccinated),
            country: product.metadata.as_ref().map(|m| m.country.clone()),
            predicted_breed: product.predicted_breed.clone(),
            prediction_confidence: product.prediction_confidence,
        })
    }

    async fn list_products(&self, _token: &AccessToken, _query: &ProductQuery) -> PortResult<Vec<Product>> {
        unused()
    }

    async fn update_product(&self, _token: &AccessToken, _id: &str, _patch: &ProductPatch) -> PortResult<Product> {
        unused()
    }

    async fn delete_product(&self, _token: &AccessToken, _id: &str) -> PortResult<()> {
        unused()
    }

    async fn inventory_summary(&self, _token: &AccessToken) -> PortResult<InventorySummary> {
        unused()
    }

    async fn get_product(&self, _id: &str) -> PortResult<Product> {
        unused()
    }

    async fn product_image(&self, _id: &str) -> PortResult<Bytes> {
        unused()
    }

    async fn list_published(&self, _query: &ShopQuery) -> PortResult<Vec<Product>> {
        unused()
    }
}
