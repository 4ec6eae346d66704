//! crates/smartstock_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Validation Limits
//=========================================================================================

pub const MIN_AGE_MONTHS: i64 = 1;
pub const MAX_AGE_MONTHS: i64 = 120;
/// Weight must be strictly greater than zero.
pub const MAX_WEIGHT_KG: f64 = 200.0;

/// Countries the price model was trained on.
pub const DEFAULT_COUNTRIES: [&str; 12] = [
    "USA",
    "Canada",
    "England",
    "Scotland",
    "France",
    "Germany",
    "Iran",
    "Thailand",
    "Russia",
    "Afghanistan",
    "Ethiopia",
    "Africa",
];

/// A local input that was rejected before any network call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid age between 1-120 months (got {0})")]
    AgeOutOfRange(i64),
    #[error("Please enter a valid weight between 0-200 kg (got {0})")]
    WeightOutOfRange(f64),
    #[error("Unknown health status code {0}; expected 0 (Normal), 1 (Good) or 2 (Excellent)")]
    UnknownHealthStatus(u8),
    #[error("Country '{0}' is not in the supported country list")]
    UnknownCountry(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Please enter a valid price greater than 0")]
    InvalidPrice,
    #[error("Please enter a valid quantity greater than 0")]
    InvalidQuantity,
}

//=========================================================================================
// Images
//=========================================================================================

/// An image file selected by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Opaque handle to the local preview of a selected image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewRef(Uuid);

impl PreviewRef {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

//=========================================================================================
// Pet Metadata
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthStatus {
    Normal,
    #[default]
    Good,
    Excellent,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 3] = [Self::Normal, Self::Good, Self::Excellent];

    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Good => 1,
            Self::Excellent => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

impl TryFrom<u8> for HealthStatus {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Good),
            2 => Ok(Self::Excellent),
            other => Err(ValidationError::UnknownHealthStatus(other)),
        }
    }
}

/// The set of countries accepted at the metadata step.
///
/// Seeded with [`DEFAULT_COUNTRIES`]; deployments can extend it with the
/// backend's own list.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySet {
    countries: Vec<String>,
}

impl Default for CountrySet {
    fn default() -> Self {
        Self {
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CountrySet {
    /// Adds countries not already present, keeping insertion order.
    pub fn extend<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for country in extra {
            let country: String = country.into();
            let country = country.trim();
            if !country.is_empty() && self.canonical(country).is_none() {
                self.countries.push(country.to_string());
            }
        }
    }

    /// Returns the canonical spelling of `name`, matched case-insensitively.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.countries
            .iter()
            .find(|c| c.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.countries
    }
}

/// Metadata exactly as the user entered it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataForm {
    pub age_months: i64,
    pub weight_kg: f64,
    pub health_status: u8,
    pub vaccinated: bool,
    pub country: String,
}

impl Default for MetadataForm {
    fn default() -> Self {
        Self {
            age_months: 0,
            weight_kg: 0.0,
            health_status: HealthStatus::default().code(),
            vaccinated: false,
            country: DEFAULT_COUNTRIES[0].to_string(),
        }
    }
}

/// Validated pet metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PetMetadata {
    pub age_months: u32,
    pub weight_kg: f64,
    pub health_status: HealthStatus,
    pub vaccinated: bool,
    pub country: String,
}

impl PetMetadata {
    /// Validates a form against the age/weight ranges and the allowed countries.
    pub fn validate(form: &MetadataForm, countries: &CountrySet) -> Result<Self, ValidationError> {
        if !(MIN_AGE_MONTHS..=MAX_AGE_MONTHS).contains(&form.age_months) {
            return Err(ValidationError::AgeOutOfRange(form.age_months));
        }
        if !form.weight_kg.is_finite() || form.weight_kg <= 0.0 || form.weight_kg > MAX_WEIGHT_KG {
            return Err(ValidationError::WeightOutOfRange(form.weight_kg));
        }
        let health_status = HealthStatus::try_from(form.health_status)?;
        let country = countries
            .canonical(&form.country)
            .ok_or_else(|| ValidationError::UnknownCountry(form.country.clone()))?;

        Ok(Self {
            age_months: form.age_months as u32,
            weight_kg: form.weight_kg,
            health_status,
            vaccinated: form.vaccinated,
            country: country.to_string(),
        })
    }
}

impl From<&PetMetadata> for MetadataForm {
    fn from(metadata: &PetMetadata) -> Self {
        Self {
            age_months: i64::from(metadata.age_months),
            weight_kg: metadata.weight_kg,
            health_status: metadata.health_status.code(),
            vaccinated: metadata.vaccinated,
            country: metadata.country.clone(),
        }
    }
}

//=========================================================================================
// Classification and Pricing
//=========================================================================================

/// What the external classifier returned for an image.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub product_type: String,
    pub breed: String,
    pub price_predicted: f64,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether the backend already stocks a product with this name.
    pub exists: bool,
}

/// The transient AI guess, plus the user's edits to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationDraft {
    pub predicted_type: String,
    pub predicted_breed: String,
    pub predicted_price: f64,
    pub confidence: f64,
    pub edited_type: String,
    pub edited_breed: String,
}

impl From<Classification> for ClassificationDraft {
    fn from(result: Classification) -> Self {
        Self {
            edited_type: result.product_type.clone(),
            edited_breed: result.breed.clone(),
            predicted_type: result.product_type,
            predicted_breed: result.breed,
            predicted_price: result.price_predicted,
            confidence: result.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    Predicted,
    /// The price predictor was unavailable; the classifier's baseline was used.
    ClassifierFallback { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub amount: f64,
    pub source: PriceSource,
}

impl PriceQuote {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PriceSource::ClassifierFallback { .. })
    }
}

/// Everything the price predictor needs for one estimate.
#[derive(Debug, Clone, Copy)]
pub struct PriceRequest<'a> {
    pub image: &'a ImageUpload,
    pub pet_type: &'a str,
    pub breed: &'a str,
    pub metadata: &'a PetMetadata,
}

/// The finalized draft handed from the wizard to the add-product screen.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffDraft {
    pub id: Uuid,
    pub product_type: String,
    pub product_name: String,
    pub predicted_price: f64,
    pub price_source: PriceSource,
    pub predicted_breed: String,
    pub prediction_confidence: f64,
    pub metadata: PetMetadata,
    pub image: ImageUpload,
}

//=========================================================================================
// Products
//=========================================================================================

/// A product record owned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_type: String,
    pub price_predicted: f64,
    pub price_modified: Option<f64>,
    pub quantity: u32,
    pub published: bool,
    pub has_image: bool,
    pub date_added: DateTime<Utc>,
    pub age_months: Option<u32>,
    pub weight_kg: Option<f64>,
    pub health_status: Option<HealthStatus>,
    pub vaccinated: Option<bool>,
    pub country: Option<String>,
    pub predicted_breed: Option<String>,
    pub prediction_confidence: Option<f64>,
}

impl Product {
    /// The user's price if they overrode it, otherwise the predicted one.
    pub fn effective_price(&self) -> f64 {
        self.price_modified.unwrap_or(self.price_predicted)
    }
}

/// The validated payload that creates a product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_type: String,
    pub product_name: String,
    pub price_predicted: f64,
    pub price_modified: Option<f64>,
    pub quantity: u32,
    pub metadata: Option<PetMetadata>,
    pub predicted_breed: Option<String>,
    pub prediction_confidence: Option<f64>,
    pub image: Option<ImageUpload>,
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub price_modified: Option<f64>,
    pub quantity: Option<u32>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub product_type: Option<String>,
    pub skip: u32,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopQuery {
    pub product_type: Option<String>,
    pub breed: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub skip: u32,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductType {
    pub type_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub product_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InventorySummary {
    pub total_products: u64,
    pub total_items: u64,
    pub total_value: f64,
}

//=========================================================================================
// Users and Auth
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Unknown roles are treated as regular users.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::User
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Only used for registration - contains the plain password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// A bearer token issued by the backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub access_token: AccessToken,
    pub token_type: String,
    pub user: User,
}

//=========================================================================================
// Model Training
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    Idle,
    Running,
    Training,
    Completed,
    Error,
}

impl TrainingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Training => "training",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "training" => Some(Self::Training),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Polling stops once a job reaches one of these.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSnapshot {
    pub status: TrainingStatus,
    pub logs: Vec<String>,
}

/// A zip archive of images for a new or existing breed.
#[derive(Debug, Clone)]
pub struct BreedUpload {
    pub breed_name: String,
    pub product_type: String,
    pub archive_name: String,
    pub archive: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingMode {
    AddBreed,
    FineTune,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingJob {
    pub mode: TrainingMode,
    pub message: String,
    pub breed: String,
    pub product_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn form(age: i64, weight: f64) -> MetadataForm {
        MetadataForm {
            age_months: age,
            weight_kg: weight,
            health_status: 1,
            vaccinated: true,
            country: "USA".to_string(),
        }
    }

    #[test]
    fn metadata_accepts_range_bounds() {
        let countries = CountrySet::default();
        assert!(PetMetadata::validate(&form(1, 0.1), &countries).is_ok());
        assert!(PetMetadata::validate(&form(120, 200.0), &countries).is_ok());
    }

    #[test]
    fn metadata_rejects_out_of_range_age_and_weight() {
        let countries = CountrySet::default();
        assert_matches!(
            PetMetadata::validate(&form(0, 10.0), &countries),
            Err(ValidationError::AgeOutOfRange(0))
        );
        assert_matches!(
            PetMetadata::validate(&form(121, 10.0), &countries),
            Err(ValidationError::AgeOutOfRange(121))
        );
        assert_matches!(
            PetMetadata::validate(&form(6, 0.0), &countries),
            Err(ValidationError::WeightOutOfRange(_))
        );
        assert_matches!(
            PetMetadata::validate(&form(6, 200.5), &countries),
            Err(ValidationError::WeightOutOfRange(_))
        );
        assert_matches!(
            PetMetadata::validate(&form(6, f64::NAN), &countries),
            Err(ValidationError::WeightOutOfRange(_))
        );
    }

    #[test]
    fn metadata_canonicalizes_country_case() {
        let mut input = form(6, 10.5);
        input.country = "usa".to_string();
        let metadata = PetMetadata::validate(&input, &CountrySet::default()).unwrap();
        assert_eq!(metadata.country, "USA");
    }

    #[test]
    fn country_set_can_be_extended() {
        let mut countries = CountrySet::default();
        let mut input = form(6, 10.5);
        input.country = "Japan".to_string();
        assert_matches!(
            PetMetadata::validate(&input, &countries),
            Err(ValidationError::UnknownCountry(_))
        );

        countries.extend(["Japan", "usa", " "]);
        assert_eq!(countries.as_slice().len(), DEFAULT_COUNTRIES.len() + 1);
        assert!(PetMetadata::validate(&input, &countries).is_ok());
    }

    #[test]
    fn health_status_codes() {
        for status in HealthStatus::ALL {
            assert_eq!(HealthStatus::try_from(status.code()).unwrap(), status);
        }
        assert_matches!(
            HealthStatus::try_from(3),
            Err(ValidationError::UnknownHealthStatus(3))
        );
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-jwt");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
    }
}
