//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the gateway.
//! Domain types stay serialization-free; everything on the wire goes through here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smartstock_core::domain::{
    HealthStatus, InventorySummary, MetadataForm, PetMetadata, PriceQuote, PriceSource, Product,
    ProductPatch, ProductType, TrainingJob, TrainingMode, TrainingSnapshot, User, DEFAULT_COUNTRIES,
    MAX_AGE_MONTHS, MAX_WEIGHT_KG, MIN_AGE_MONTHS,
};
use smartstock_core::wizard::SelectedImage;
use smartstock_core::{
    AddProductForm, CheckoutInput, ClassificationDraft, CountrySet, ModelStats, UploadWizard,
    WizardStep,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Prices are shown with two decimals everywhere.
pub fn format_price(amount: f64) -> String {
    format!("{:.2}", amount)
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            role: user.role.as_str().to_string(),
            user_id: user.user_id,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserView,
}

//=========================================================================================
// Upload Wizard
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageView {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    pub preview_id: Uuid,
    /// Where the held image can be fetched while the wizard keeps it.
    pub preview_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassificationView {
    pub predicted_type: String,
    pub predicted_breed: String,
    pub predicted_price: f64,
    pub confidence: f64,
    pub edited_type: String,
    pub edited_breed: String,
}

impl From<&ClassificationDraft> for ClassificationView {
    fn from(draft: &ClassificationDraft) -> Self {
        Self {
            predicted_type: draft.predicted_type.clone(),
            predicted_breed: draft.predicted_breed.clone(),
            predicted_price: draft.predicted_price,
            confidence: draft.confidence,
            edited_type: draft.edited_type.clone(),
            edited_breed: draft.edited_breed.clone(),
        }
    }
}

/// Metadata as entered; also the request body of the price step.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetadataPayload {
    pub age_months: i64,
    pub weight_kg: f64,
    /// 0 = Normal, 1 = Good, 2 = Excellent.
    #[serde(default = "default_health_status")]
    pub health_status: u8,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_health_status() -> u8 {
    HealthStatus::default().code()
}

fn default_country() -> String {
    DEFAULT_COUNTRIES[0].to_string()
}

impl From<MetadataPayload> for MetadataForm {
    fn from(payload: MetadataPayload) -> Self {
        Self {
            age_months: payload.age_months,
            weight_kg: payload.weight_kg,
            health_status: payload.health_status,
            vaccinated: payload.vaccinated,
            country: payload.country,
        }
    }
}

impl From<MetadataForm> for MetadataPayload {
    fn from(form: MetadataForm) -> Self {
        Self {
            age_months: form.age_months,
            weight_kg: form.weight_kg,
            health_status: form.health_status,
            vaccinated: form.vaccinated,
            country: form.country,
        }
    }
}

impl From<&PetMetadata> for MetadataPayload {
    fn from(metadata: &PetMetadata) -> Self {
        MetadataForm::from(metadata).into()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteView {
    pub amount: f64,
    /// The amount with two decimals, e.g. `"150.00"`.
    pub display: String,
    /// `predicted` or `classifier_fallback`.
    pub source: String,
    pub fallback_reason: Option<String>,
}

impl From<&PriceQuote> for QuoteView {
    fn from(quote: &PriceQuote) -> Self {
        let (source, fallback_reason) = price_source(&quote.source);
        Self {
            amount: quote.amount,
            display: format_price(quote.amount),
            source,
            fallback_reason,
        }
    }
}

fn price_source(source: &PriceSource) -> (String, Option<String>) {
    match source {
        PriceSource::Predicted => ("predicted".to_string(), None),
        PriceSource::ClassifierFallback { reason } => {
            ("classifier_fallback".to_string(), Some(reason.clone()))
        }
    }
}

/// Everything the client needs to render the current wizard step.
#[derive(Debug, Serialize, ToSchema)]
pub struct WizardView {
    pub wizard_id: Uuid,
    /// One of `upload`, `classify`, `metadata`, `review`, `submitted`.
    pub step: String,
    pub image: Option<ImageView>,
    pub classification: Option<ClassificationView>,
    pub metadata: Option<MetadataPayload>,
    pub quote: Option<QuoteView>,
    /// Set once the draft has been handed to the add-product screen.
    pub draft_id: Option<Uuid>,
}

impl WizardView {
    pub fn new(wizard_id: Uuid, wizard: &UploadWizard) -> Self {
        let draft_id = match wizard.step() {
            WizardStep::Submitted { draft_id } => Some(*draft_id),
            _ => None,
        };
        Self {
            wizard_id,
            step: wizard.kind().as_str().to_string(),
            image: wizard.image().map(|image| image_view(wizard_id, image)),
            classification: wizard.classification().map(ClassificationView::from),
            metadata: wizard.metadata_form().map(MetadataPayload::from),
            quote: wizard.quote().map(QuoteView::from),
            draft_id,
        }
    }
}

fn image_view(wizard_id: Uuid, image: &SelectedImage) -> ImageView {
    ImageView {
        file_name: image.upload.file_name.clone(),
        content_type: image.upload.content_type.clone(),
        size_bytes: image.upload.bytes.len(),
        preview_id: image.preview.id(),
        preview_url: format!("/wizards/{}/preview", wizard_id),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassificationEdit {
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContinueResponse {
    pub draft_id: Uuid,
    /// Where the client goes next.
    pub next: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatusOption {
    pub code: u8,
    pub label: String,
}

/// Choices and limits for the metadata form.
#[derive(Debug, Serialize, ToSchema)]
pub struct WizardOptions {
    pub countries: Vec<String>,
    pub health_statuses: Vec<HealthStatusOption>,
    pub min_age_months: i64,
    pub max_age_months: i64,
    pub max_weight_kg: f64,
}

impl From<&CountrySet> for WizardOptions {
    fn from(countries: &CountrySet) -> Self {
        Self {
            countries: countries.as_slice().to_vec(),
            health_statuses: HealthStatus::ALL
                .iter()
                .map(|s| HealthStatusOption {
                    code: s.code(),
                    label: s.label().to_string(),
                })
                .collect(),
            min_age_months: MIN_AGE_MONTHS,
            max_age_months: MAX_AGE_MONTHS,
            max_weight_kg: MAX_WEIGHT_KG,
        }
    }
}

//=========================================================================================
// Add Product
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct AddProductView {
    pub draft_id: Uuid,
    pub product_type: String,
    pub product_name: String,
    pub predicted_price: f64,
    /// Initial value of the editable price field.
    pub suggested_price: String,
    pub price_source: String,
    pub fallback_reason: Option<String>,
    pub predicted_breed: String,
    pub prediction_confidence: f64,
    pub metadata: MetadataPayload,
    pub image_file_name: String,
}

impl From<&AddProductForm> for AddProductView {
    fn from(form: &AddProductForm) -> Self {
        let draft = form.draft();
        let (price_source, fallback_reason) = price_source(&draft.price_source);
        Self {
            draft_id: draft.id,
            product_type: draft.product_type.clone(),
            product_name: draft.product_name.clone(),
            predicted_price: form.predicted_price(),
            suggested_price: format_price(form.suggested_price()),
            price_source,
            fallback_reason,
            predicted_breed: draft.predicted_breed.clone(),
            prediction_confidence: draft.prediction_confidence,
            metadata: MetadataPayload::from(&draft.metadata),
            image_file_name: draft.image.file_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct AddProductRequest {
    pub price: f64,
    pub quantity: i64,
}

impl From<AddProductRequest> for CheckoutInput {
    fn from(request: AddProductRequest) -> Self {
        Self {
            price: request.price,
            quantity: request.quantity,
        }
    }
}

//=========================================================================================
// Products
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_type: String,
    pub price_predicted: f64,
    pub price_modified: Option<f64>,
    /// The modified price when present, otherwise the predicted one.
    pub effective_price: f64,
    pub quantity: u32,
    pub published: bool,
    pub has_image: bool,
    pub date_added: DateTime<Utc>,
    pub age_months: Option<u32>,
    pub weight_kg: Option<f64>,
    pub health_status: Option<String>,
    pub vaccinated: Option<bool>,
    pub country: Option<String>,
    pub predicted_breed: Option<String>,
    pub prediction_confidence: Option<f64>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            effective_price: product.effective_price(),
            health_status: product.health_status.map(|s| s.label().to_string()),
            id: product.id,
            product_id: product.product_id,
            product_name: product.product_name,
            product_type: product.product_type,
            price_predicted: product.price_predicted,
            price_modified: product.price_modified,
            quantity: product.quantity,
            published: product.published,
            has_image: product.has_image,
            date_added: product.date_added,
            age_months: product.age_months,
            weight_kg: product.weight_kg,
            vaccinated: product.vaccinated,
            country: product.country,
            predicted_breed: product.predicted_breed,
            prediction_confidence: product.prediction_confidence,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    /// Case-insensitive match on name or type.
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    /// Distinct product types in the unfiltered page, for the filter dropdown.
    pub types: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductUpdateRequest {
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub price_modified: Option<f64>,
    pub quantity: Option<u32>,
}

impl From<ProductUpdateRequest> for ProductPatch {
    fn from(request: ProductUpdateRequest) -> Self {
        Self {
            product_name: request.product_name,
            product_type: request.product_type,
            price_modified: request.price_modified,
            quantity: request.quantity,
            published: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub published: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShopParams {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub breed: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

//=========================================================================================
// Stats
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryView {
    pub total_products: u64,
    pub total_items: u64,
    pub total_value: f64,
}

impl From<InventorySummary> for SummaryView {
    fn from(summary: InventorySummary) -> Self {
        Self {
            total_products: summary.total_products,
            total_items: summary.total_items,
            total_value: summary.total_value,
        }
    }
}

/// Rates are fractions in `[0, 1]`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelStatsView {
    pub total_products: usize,
    pub total_predictions: usize,
    pub correct_predictions: usize,
    pub overrides: usize,
    pub accuracy: f64,
    pub override_rate: f64,
    pub mean_confidence: f64,
    pub mean_absolute_price_error: f64,
}

impl From<ModelStats> for ModelStatsView {
    fn from(stats: ModelStats) -> Self {
        Self {
            total_products: stats.total_products,
            total_predictions: stats.total_predictions,
            correct_predictions: stats.correct_predictions,
            overrides: stats.overrides,
            accuracy: stats.accuracy,
            override_rate: stats.override_rate,
            mean_confidence: stats.mean_confidence,
            mean_absolute_price_error: stats.mean_absolute_price_error,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelReport {
    pub model: ModelStatsView,
    pub inventory: SummaryView,
}

//=========================================================================================
// Product Types
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductTypeView {
    pub type_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub product_count: u32,
}

impl From<ProductType> for ProductTypeView {
    fn from(product_type: ProductType) -> Self {
        Self {
            type_id: product_type.type_id,
            name: product_type.name,
            created_at: product_type.created_at,
            product_count: product_type.product_count,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductTypeRequest {
    pub name: String,
}

//=========================================================================================
// Training
//=========================================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrainingJobView {
    /// `add_breed` or `fine_tune`.
    pub mode: String,
    pub message: String,
    pub breed: String,
    pub product_type: String,
}

impl From<&TrainingJob> for TrainingJobView {
    fn from(job: &TrainingJob) -> Self {
        Self {
            mode: match job.mode {
                TrainingMode::AddBreed => "add_breed",
                TrainingMode::FineTune => "fine_tune",
            }
            .to_string(),
            message: job.message.clone(),
            breed: job.breed.clone(),
            product_type: job.product_type.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrainingStatusView {
    pub status: String,
    pub logs: Vec<String>,
    /// Whether a background poller is currently watching a job.
    pub monitoring: bool,
    pub job: Option<TrainingJobView>,
}

impl TrainingStatusView {
    pub fn new(snapshot: TrainingSnapshot, monitoring: bool, job: Option<TrainingJobView>) -> Self {
        Self {
            status: snapshot.status.as_str().to_string(),
            logs: snapshot.logs,
            monitoring,
            job,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BreedsView {
    pub product_type: String,
    pub breeds: Vec<String>,
}
