//! Shared helpers for the gateway integration tests: in-memory ports, a test
//! config and small request/response helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::BodyExt;
use smartstock_api::config::Config;
use smartstock_api::web::router;
use smartstock_api::web::state::{AppState, Ports};
use smartstock_core::domain::{
    AccessToken, AuthGrant, BreedUpload, Classification, ImageUpload, InventorySummary,
    NewProduct, NewUser, PriceRequest, Product, ProductPatch, ProductQuery, ProductType,
    ShopQuery, TrainingJob, TrainingMode, TrainingSnapshot, TrainingStatus, User, UserRole,
};
use smartstock_core::ports::{
    AuthService, ClassifierService, PortError, PortResult, PricePredictionService,
    ProductCatalogService, ProductTypeService, TrainingService,
};
use smartstock_core::CountrySet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

pub const USER_TOKEN: &str = "user-token";
pub const OTHER_USER_TOKEN: &str = "other-user-token";
pub const ADMIN_TOKEN: &str = "admin-token";

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        backend_url: "http://backend.test".to_string(),
        log_level: tracing::Level::DEBUG,
        allowed_origin: "http://localhost:3000".to_string(),
        request_timeout: Duration::from_secs(5),
        max_upload_bytes: 1024 * 1024,
        training_poll_interval: Duration::from_millis(5),
        wizard_idle_timeout: Duration::from_secs(60),
        countries: CountrySet::default(),
    }
}

//=========================================================================================
// Fake Ports
//=========================================================================================

fn user(id: &str, role: UserRole) -> User {
    User {
        user_id: id.to_string(),
        email: format!("{}@smartstock.test", id),
        full_name: None,
        role,
        created_at: Utc::now(),
    }
}

pub struct FakeAuth;

#[async_trait]
impl AuthService for FakeAuth {
    async fn register(&self, new_user: &NewUser) -> PortResult<User> {
        Ok(User {
            email: new_user.email.clone(),
            full_name: new_user.full_name.clone(),
            ..user("new-user", UserRole::User)
        })
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<AuthGrant> {
        if password != "correct horse" {
            return Err(PortError::Unauthorized);
        }
        Ok(AuthGrant {
            access_token: AccessToken::new(USER_TOKEN),
            token_type: "bearer".to_string(),
            user: User {
                email: email.to_string(),
                ..user("user-1", UserRole::User)
            },
        })
    }

    async fn current_user(&self, token: &AccessToken) -> PortResult<User> {
        match token.as_str() {
            USER_TOKEN => Ok(user("user-1", UserRole::User)),
            OTHER_USER_TOKEN => Ok(user("user-2", UserRole::User)),
            ADMIN_TOKEN => Ok(user("admin-1", UserRole::Admin)),
            _ => Err(PortError::Unauthorized),
        }
    }
}

pub struct FakeClassifier;

#[async_trait]
impl ClassifierService for FakeClassifier {
    async fn classify(&self, _image: &ImageUpload) -> PortResult<Classification> {
        Ok(Classification {
            product_type: "Dog".to_string(),
            breed: "Beagle".to_string(),
            price_predicted: 120.0,
            confidence: 0.92,
            exists: false,
        })
    }
}

/// Returns a fixed price, or fails when built with `None`.
pub struct FakePricer {
    price: Option<f64>,
    pub calls: AtomicUsize,
}

impl FakePricer {
    pub fn returning(price: f64) -> Self {
        Self {
            price: Some(price),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            price: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PricePredictionService for FakePricer {
    async fn predict_price(&self, _token: &AccessToken, _request: PriceRequest<'_>) -> PortResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.price
            .ok_or_else(|| PortError::Unexpected("price model offline".to_string()))
    }
}

/// An in-memory product store.
#[derive(Default)]
pub struct FakeCatalog {
    pub products: Mutex<Vec<Product>>,
    pub fail_creates: bool,
    /// How long each create takes before it is stored.
    pub create_delay: Duration,
}

impl FakeCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    pub fn failing_creates() -> Self {
        Self {
            fail_creates: true,
            ..Self::default()
        }
    }

    pub fn slow_creates(create_delay: Duration) -> Self {
        Self {
            create_delay,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.products.lock().unwrap().len()
    }
}

pub fn product(name: &str, product_type: &str, predicted_breed: Option<&str>, price: f64) -> Product {
    Product {
        id: format!("oid-{}", name),
        product_id: format!("pid-{}", name),
        product_name: name.to_string(),
        product_type: product_type.to_string(),
        price_predicted: price,
        price_modified: None,
        quantity: 1,
        published: false,
        has_image: true,
        date_added: Utc::now(),
        age_months: None,
        weight_kg: None,
        health_status: None,
        vaccinated: None,
        country: None,
        predicted_breed: predicted_breed.map(str::to_string),
        prediction_confidence: predicted_breed.map(|_| 0.8),
    }
}

#[async_trait]
impl ProductCatalogService for FakeCatalog {
    async fn create_product(&self, _token: &AccessToken, new: &NewProduct) -> PortResult<Product> {
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        if self.fail_creates {
            return Err(PortError::Unexpected("database unavailable".to_string()));
        }
        let mut products = self.products.lock().unwrap();
        let created = Product {
            id: format!("oid-{}", products.len()),
            product_id: format!("pid-{}", products.len()),
            product_name: new.product_name.clone(),
            product_type: new.product_type.clone(),
            price_predicted: new.price_predicted,
            price_modified: new.price_modified,
            quantity: new.quantity,
            published: false,
            has_image: new.image.is_some(),
            date_added: Utc::now(),
            age_months: new.metadata.as_ref().map(|m| m.age_months),
            weight_kg: new.metadata.as_ref().map(|m| m.weight_kg),
            health_status: new.metadata.as_ref().map(|m| m.health_status),
            vaccinated: new.metadata.as_ref().map(|m| m.vaccinated),
            country: new.metadata.as_ref().map(|m| m.country.clone()),
            predicted_breed: new.predicted_breed.clone(),
            prediction_confidence: new.prediction_confidence,
        };
        products.push(created.clone());
        Ok(created)
    }

    async fn list_products(&self, _token: &AccessToken, query: &ProductQuery) -> PortResult<Vec<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .filter(|p| {
                query
                    .product_type
                    .as_ref()
                    .map_or(true, |t| &p.product_type == t)
            })
            .cloned()
            .collect())
    }

    async fn update_product(
        &self,
        _token: &AccessToken,
        product_id: &str,
        patch: &ProductPatch,
    ) -> PortResult<Product> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.product_id == product_id)
            .ok_or_else(|| PortError::NotFound(product_id.to_string()))?;
        if let Some(published) = patch.published {
            product.published = published;
        }
        if let Some(price) = patch.price_modified {
            product.price_modified = Some(price);
        }
        Ok(product.clone())
    }

    async fn delete_product(&self, _token: &AccessToken, product_id: &str) -> PortResult<()> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.product_id != product_id);
        if products.len() == before {
            return Err(PortError::NotFound(product_id.to_string()));
        }
        Ok(())
    }

    async fn inventory_summary(&self, _token: &AccessToken) -> PortResult<InventorySummary> {
        let products = self.products.lock().unwrap();
        Ok(InventorySummary {
            total_products: products.len() as u64,
            total_items: products.iter().map(|p| u64::from(p.quantity)).sum(),
            total_value: products
                .iter()
                .map(|p| p.effective_price() * f64::from(p.quantity))
                .sum(),
        })
    }

    async fn get_product(&self, product_id: &str) -> PortResult<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.product_id == product_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(product_id.to_string()))
    }

    async fn product_image(&self, _product_id: &str) -> PortResult<Bytes> {
        Ok(Bytes::from_static(b"\xff\xd8\xff"))
    }

    async fn list_published(&self, _query: &ShopQuery) -> PortResult<Vec<Product>> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.published)
            .cloned()
            .collect())
    }
}

pub struct FakeProductTypes;

#[async_trait]
impl ProductTypeService for FakeProductTypes {
    async fn list_types(&self) -> PortResult<Vec<ProductType>> {
        Ok(vec![ProductType {
            type_id: "t-1".to_string(),
            name: "Dog".to_string(),
            created_at: Utc::now(),
            product_count: 3,
        }])
    }

    async fn create_type(&self, _token: &AccessToken, name: &str) -> PortResult<ProductType> {
        Ok(ProductType {
            type_id: "t-2".to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            product_count: 0,
        })
    }

    async fn rename_type(&self, _token: &AccessToken, type_id: &str, _name: &str) -> PortResult<ProductType> {
        Err(PortError::NotFound(type_id.to_string()))
    }

    async fn delete_type(&self, _token: &AccessToken, _type_id: &str) -> PortResult<()> {
        Err(PortError::Forbidden("Admin access required".to_string()))
    }
}

/// Reports `training` until `polls_until_done` polls have happened, then `completed`.
pub struct FakeTraining {
    pub polls: AtomicUsize,
    pub polls_until_done: usize,
}

impl FakeTraining {
    pub fn finishing_after(polls_until_done: usize) -> Self {
        Self {
            polls: AtomicUsize::new(0),
            polls_until_done,
        }
    }
}

#[async_trait]
impl TrainingService for FakeTraining {
    async fn submit_breed_images(&self, upload: &BreedUpload) -> PortResult<TrainingJob> {
        Ok(TrainingJob {
            mode: TrainingMode::AddBreed,
            message: format!("New breed '{}' added", upload.breed_name),
            breed: upload.breed_name.clone(),
            product_type: upload.product_type.clone(),
        })
    }

    async fn training_status(&self) -> PortResult<TrainingSnapshot> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let status = if polls >= self.polls_until_done {
            TrainingStatus::Completed
        } else {
            TrainingStatus::Training
        };
        Ok(TrainingSnapshot {
            status,
            logs: vec![format!("Epoch {}", polls)],
        })
    }

    async fn list_breeds(&self, product_type: &str) -> PortResult<Vec<String>> {
        match product_type {
            "Dog" => Ok(vec!["Beagle".to_string(), "Pug".to_string()]),
            _ => Ok(vec![]),
        }
    }
}

//=========================================================================================
// App Builders
//=========================================================================================

pub struct TestPorts {
    pub pricer: Arc<FakePricer>,
    pub catalog: Arc<FakeCatalog>,
    pub training: Arc<FakeTraining>,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            pricer: Arc::new(FakePricer::returning(150.0)),
            catalog: Arc::new(FakeCatalog::default()),
            training: Arc::new(FakeTraining::finishing_after(3)),
        }
    }
}

pub fn build_state(ports: &TestPorts) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(test_config()),
        Ports {
            auth: Arc::new(FakeAuth),
            classifier: Arc::new(FakeClassifier),
            pricer: ports.pricer.clone(),
            catalog: ports.catalog.clone(),
            product_types: Arc::new(FakeProductTypes),
            training: ports.training.clone(),
        },
    ))
}

pub fn build_test_app(state: Arc<AppState>) -> Router {
    router(state).unwrap()
}

//=========================================================================================
// Request Helpers
//=========================================================================================

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

pub async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>) -> Response {
    send(app, request(method, uri, token).body(Body::empty()).unwrap()).await
}

pub async fn call_json(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = request(method, uri, Some(token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// One part of a hand-built multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

const BOUNDARY: &str = "smartstock-test-boundary";

pub async fn call_multipart(app: &Router, uri: &str, token: &str, parts: &[Part<'_>]) -> Response {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let request = request(Method::POST, uri, Some(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status for response");
}
