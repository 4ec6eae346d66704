//! crates/smartstock_core/src/wizard.rs
//!
//! The upload wizard: a guarded, linear state machine that takes a pet image
//! through classification, metadata entry and price prediction before handing
//! a finalized draft to the add-product screen.
//!
//! ```text
//! upload ──classify──▶ classify ──confirm──▶ metadata ──predict price──▶ review ──continue──▶ submitted
//!                         ▲                    │  ▲                        │
//!                         └───────back─────────┘  └──────────back──────────┘
//! ```
//!
//! `reset` returns to an empty `upload` from anywhere.

use crate::domain::{
    AccessToken, ClassificationDraft, CountrySet, HandoffDraft, ImageUpload, MetadataForm,
    PetMetadata, PreviewRef, PriceQuote, PriceRequest, PriceSource, ValidationError,
};
use crate::handoff::TransferBuffer;
use crate::ports::{ClassifierService, PortError, PricePredictionService};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Invalid file type '{0}': please select an image file")]
    UnsupportedMediaType(String),
    #[error("No image selected")]
    MissingImage,
    #[error("Cannot {action} during the {step} step")]
    InvalidTransition { action: &'static str, step: StepKind },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unable to classify the product: {0}")]
    Classification(#[source] PortError),
}

//=========================================================================================
// States
//=========================================================================================

/// The name of a wizard step, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Upload,
    Classify,
    Metadata,
    Review,
    Submitted,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Classify => "classify",
            Self::Metadata => "metadata",
            Self::Review => "review",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image held by the wizard together with its local preview handle.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedImage {
    pub upload: ImageUpload,
    pub preview: PreviewRef,
}

/// Each step carries exactly the data that is valid in it.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardStep {
    Upload {
        image: Option<SelectedImage>,
    },
    Classify {
        image: SelectedImage,
        draft: ClassificationDraft,
        /// Metadata entered before the user went back, kept for the return trip.
        metadata: Option<MetadataForm>,
    },
    Metadata {
        image: SelectedImage,
        draft: ClassificationDraft,
        metadata: Option<MetadataForm>,
    },
    Review {
        image: SelectedImage,
        draft: ClassificationDraft,
        metadata: PetMetadata,
        quote: PriceQuote,
    },
    Submitted {
        draft_id: Uuid,
    },
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Upload { image: None }
    }
}

impl WizardStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Upload { .. } => StepKind::Upload,
            Self::Classify { .. } => StepKind::Classify,
            Self::Metadata { .. } => StepKind::Metadata,
            Self::Review { .. } => StepKind::Review,
            Self::Submitted { .. } => StepKind::Submitted,
        }
    }
}

//=========================================================================================
// The Wizard
//=========================================================================================

#[derive(Debug, Default)]
pub struct UploadWizard {
    step: WizardStep,
}

impl UploadWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> &WizardStep {
        &self.step
    }

    pub fn kind(&self) -> StepKind {
        self.step.kind()
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        match &self.step {
            WizardStep::Upload { image } => image.as_ref(),
            WizardStep::Classify { image, .. }
            | WizardStep::Metadata { image, .. }
            | WizardStep::Review { image, .. } => Some(image),
            WizardStep::Submitted { .. } => None,
        }
    }

    pub fn classification(&self) -> Option<&ClassificationDraft> {
        match &self.step {
            WizardStep::Classify { draft, .. }
            | WizardStep::Metadata { draft, .. }
            | WizardStep::Review { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// The metadata as last entered, if any.
    pub fn metadata_form(&self) -> Option<MetadataForm> {
        match &self.step {
            WizardStep::Classify { metadata, .. } | WizardStep::Metadata { metadata, .. } => {
                metadata.clone()
            }
            WizardStep::Review { metadata, .. } => Some(MetadataForm::from(metadata)),
            _ => None,
        }
    }

    pub fn quote(&self) -> Option<&PriceQuote> {
        match &self.step {
            WizardStep::Review { quote, .. } => Some(quote),
            _ => None,
        }
    }

    /// Selects a new image, discarding any draft built from a previous one.
    pub fn select_image(&mut self, upload: ImageUpload) -> Result<PreviewRef, WizardError> {
        if let WizardStep::Submitted { .. } = self.step {
            return Err(self.invalid("select an image"));
        }
        if !upload.is_image() {
            return Err(WizardError::UnsupportedMediaType(upload.content_type));
        }

        let preview = PreviewRef::generate();
        debug!(%preview, file_name = %upload.file_name, "Image selected");
        self.step = WizardStep::Upload {
            image: Some(SelectedImage { upload, preview }),
        };
        Ok(preview)
    }

    /// Sends the selected image to the classifier.
    ///
    /// On failure the wizard stays in `upload` with the image still selected.
    pub async fn classify(&mut self, classifier: &dyn ClassifierService) -> Result<(), WizardError> {
        let image = match &self.step {
            WizardStep::Upload { image: Some(image) } => image.clone(),
            WizardStep::Upload { image: None } => return Err(WizardError::MissingImage),
            _ => return Err(self.invalid("classify")),
        };

        let result = classifier.classify(&image.upload).await.map_err(|e| {
            warn!("Classification failed: {}", e);
            WizardError::Classification(e)
        })?;
        info!(
            product_type = %result.product_type,
            breed = %result.breed,
            confidence = result.confidence,
            "Classification complete"
        );

        self.step = WizardStep::Classify {
            image,
            draft: ClassificationDraft::from(result),
            metadata: None,
        };
        Ok(())
    }

    /// Replaces the editable type and/or breed.
    pub fn edit_classification(
        &mut self,
        product_type: Option<String>,
        breed: Option<String>,
    ) -> Result<(), WizardError> {
        match &mut self.step {
            WizardStep::Classify { draft, .. } => {
                if let Some(product_type) = product_type {
                    draft.edited_type = product_type;
                }
                if let Some(breed) = breed {
                    draft.edited_breed = breed;
                }
                Ok(())
            }
            _ => Err(self.invalid("edit the classification")),
        }
    }

    /// Accepts the (possibly edited) type and breed.
    pub fn confirm_classification(&mut self) -> Result<(), WizardError> {
        let WizardStep::Classify { draft, .. } = &mut self.step else {
            return Err(self.invalid("confirm the classification"));
        };
        let edited_type = draft.edited_type.trim().to_string();
        let edited_breed = draft.edited_breed.trim().to_string();
        if edited_type.is_empty() {
            return Err(ValidationError::MissingField("product type").into());
        }
        if edited_breed.is_empty() {
            return Err(ValidationError::MissingField("breed").into());
        }
        draft.edited_type = edited_type;
        draft.edited_breed = edited_breed;

        if let WizardStep::Classify { image, draft, metadata } = std::mem::take(&mut self.step) {
            self.step = WizardStep::Metadata { image, draft, metadata };
        }
        Ok(())
    }

    /// Validates the metadata and asks the predictor for a price.
    ///
    /// Invalid metadata is rejected before any network call and the wizard
    /// stays in `metadata` (the entered values are kept). A predictor failure
    /// falls back to the classifier's baseline price and still advances.
    pub async fn predict_price(
        &mut self,
        predictor: &dyn PricePredictionService,
        token: &AccessToken,
        form: MetadataForm,
        countries: &CountrySet,
    ) -> Result<PriceQuote, WizardError> {
        let WizardStep::Metadata { metadata: entered, .. } = &mut self.step else {
            return Err(self.invalid("predict a price"));
        };
        let validated = PetMetadata::validate(&form, countries);
        *entered = Some(form);
        let metadata = validated?;

        let WizardStep::Metadata { image, draft, .. } = &self.step else {
            return Err(self.invalid("predict a price"));
        };
        if draft.edited_type.is_empty() || draft.edited_breed.is_empty() {
            return Err(ValidationError::MissingField("product type and breed").into());
        }

        let request = PriceRequest {
            image: &image.upload,
            pet_type: &draft.edited_type,
            breed: &draft.edited_breed,
            metadata: &metadata,
        };
        let quote = match predictor.predict_price(token, request).await {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => {
                info!(amount, breed = %draft.edited_breed, "Price predicted");
                PriceQuote {
                    amount,
                    source: PriceSource::Predicted,
                }
            }
            Ok(amount) => fallback_quote(draft, format!("predictor returned an invalid price {}", amount)),
            Err(e) => fallback_quote(draft, e.to_string()),
        };

        if let WizardStep::Metadata { image, draft, .. } = std::mem::take(&mut self.step) {
            self.step = WizardStep::Review {
                image,
                draft,
                metadata,
                quote: quote.clone(),
            };
        }
        Ok(quote)
    }

    /// Steps back one stage without discarding anything the user entered.
    pub fn back(&mut self) -> Result<StepKind, WizardError> {
        self.step = match std::mem::take(&mut self.step) {
            WizardStep::Metadata { image, draft, metadata } => {
                WizardStep::Classify { image, draft, metadata }
            }
            WizardStep::Review { image, draft, metadata, .. } => WizardStep::Metadata {
                image,
                draft,
                metadata: Some(MetadataForm::from(&metadata)),
            },
            other => {
                self.step = other;
                return Err(self.invalid("go back"));
            }
        };
        Ok(self.kind())
    }

    /// Writes the finalized draft into the transfer buffer.
    pub fn continue_to_checkout(&mut self, buffer: &mut TransferBuffer) -> Result<Uuid, WizardError> {
        let WizardStep::Review { image, draft, metadata, quote } = &self.step else {
            return Err(self.invalid("continue"));
        };
        if !quote.amount.is_finite() {
            return Err(ValidationError::InvalidPrice.into());
        }

        let handoff = HandoffDraft {
            id: Uuid::new_v4(),
            product_type: draft.edited_type.clone(),
            product_name: draft.edited_breed.clone(),
            predicted_price: quote.amount,
            price_source: quote.source.clone(),
            predicted_breed: draft.predicted_breed.clone(),
            prediction_confidence: draft.confidence,
            metadata: metadata.clone(),
            image: image.upload.clone(),
        };
        let draft_id = handoff.id;
        buffer.put(handoff);
        info!(%draft_id, "Draft handed off to add-product");

        self.step = WizardStep::Submitted { draft_id };
        Ok(draft_id)
    }

    /// Clears everything and releases the preview.
    pub fn reset(&mut self) {
        if let Some(image) = self.image() {
            debug!(preview = %image.preview, "Releasing preview");
        }
        self.step = WizardStep::default();
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            action,
            step: self.kind(),
        }
    }
}

fn fallback_quote(draft: &ClassificationDraft, reason: String) -> PriceQuote {
    warn!(
        fallback = draft.predicted_price,
        "Price prediction failed, using the classifier's price: {}", reason
    );
    PriceQuote {
        amount: draft.predicted_price,
        source: PriceSource::ClassifierFallback { reason },
    }
}
