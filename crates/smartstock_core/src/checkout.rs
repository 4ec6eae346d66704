//! crates/smartstock_core/src/checkout.rs
//!
//! The add-product step: reads the finalized draft from the transfer buffer,
//! applies the user's final price and quantity, and persists the product.

use crate::domain::{AccessToken, HandoffDraft, NewProduct, Product, ValidationError};
use crate::handoff::{ClaimError, TransferBuffer};
use crate::ports::{PortError, ProductCatalogService};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("No product data found. Please upload a product image first")]
    MissingDraft,
    #[error("This product is already being saved")]
    AlreadySaving,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unable to save product: {0}")]
    Persistence(#[source] PortError),
}

/// The final inputs from the add-product screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutInput {
    pub price: f64,
    pub quantity: i64,
}

/// A snapshot of the handed-off draft, ready for final edits.
#[derive(Debug, Clone)]
pub struct AddProductForm {
    draft: HandoffDraft,
}

impl AddProductForm {
    /// Opens the form from the buffer without consuming it.
    pub fn open(buffer: &TransferBuffer) -> Result<Self, CheckoutError> {
        buffer
            .peek()
            .cloned()
            .map(|draft| Self { draft })
            .ok_or(CheckoutError::MissingDraft)
    }

    /// Opens the form and claims its draft so no other submit can save it
    /// concurrently. The caller consumes the draft on success and releases
    /// it on failure.
    pub fn claim(buffer: &mut TransferBuffer) -> Result<Self, CheckoutError> {
        match buffer.claim() {
            Ok(draft) => Ok(Self { draft }),
            Err(ClaimError::Empty) => Err(CheckoutError::MissingDraft),
            Err(ClaimError::InFlight(_)) => Err(CheckoutError::AlreadySaving),
        }
    }

    pub fn draft(&self) -> &HandoffDraft {
        &self.draft
    }

    pub fn predicted_price(&self) -> f64 {
        self.draft.predicted_price
    }

    /// The value the editable price field starts with.
    pub fn suggested_price(&self) -> f64 {
        self.draft.predicted_price
    }

    /// Builds the persistence payload. The user price is only recorded when it
    /// differs from the predicted one.
    pub fn build_product(&self, input: CheckoutInput) -> Result<NewProduct, ValidationError> {
        if !input.price.is_finite() || input.price <= 0.0 {
            return Err(ValidationError::InvalidPrice);
        }
        let quantity = u32::try_from(input.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(ValidationError::InvalidQuantity)?;

        let draft = &self.draft;
        if draft.product_type.trim().is_empty() {
            return Err(ValidationError::MissingField("product type"));
        }
        if draft.product_name.trim().is_empty() {
            return Err(ValidationError::MissingField("breed"));
        }

        let price_modified = ((input.price - draft.predicted_price).abs() > f64::EPSILON)
            .then_some(input.price);

        Ok(NewProduct {
            product_type: draft.product_type.clone(),
            product_name: draft.product_name.clone(),
            price_predicted: draft.predicted_price,
            price_modified,
            quantity,
            metadata: Some(draft.metadata.clone()),
            predicted_breed: Some(draft.predicted_breed.clone()),
            prediction_confidence: Some(draft.prediction_confidence),
            image: Some(draft.image.clone()),
        })
    }

    /// Persists the product. The caller clears the buffer on success with
    /// [`TransferBuffer::consume`] using this form's draft id.
    pub async fn submit(
        &self,
        catalog: &dyn ProductCatalogService,
        token: &AccessToken,
        input: CheckoutInput,
    ) -> Result<Product, CheckoutError> {
        let product = self.build_product(input)?;
        let created = catalog.create_product(token, &product).await.map_err(|e| {
            error!(draft_id = %self.draft.id, "Failed to save product: {}", e);
            CheckoutError::Persistence(e)
        })?;
        info!(product_id = %created.product_id, "Product added to inventory");
        Ok(created)
    }
}

/// Runs the whole add-product step against a buffer the caller owns.
///
/// On success the buffer is cleared so the draft cannot be replayed. On any
/// failure it is left untouched for a retry.
pub async fn checkout(
    buffer: &mut TransferBuffer,
    catalog: &dyn ProductCatalogService,
    token: &AccessToken,
    input: CheckoutInput,
) -> Result<Product, CheckoutError> {
    let form = AddProductForm::claim(buffer)?;
    match form.submit(catalog, token, input).await {
        Ok(product) => {
            buffer.consume(form.draft().id);
            Ok(product)
        }
        Err(e) => {
            buffer.release(form.draft().id);
            Err(e)
        }
    }
}
