//! Integration tests for the add-product handoff.

mod common;

use assert_matches::assert_matches;
use common::{beagle_photo, token, FakeCatalog};
use smartstock_core::domain::{HandoffDraft, HealthStatus, PetMetadata, PriceSource, ValidationError};
use smartstock_core::{checkout, AddProductForm, CheckoutError, CheckoutInput, TransferBuffer};
use uuid::Uuid;

fn buffered_draft() -> TransferBuffer {
    let mut buffer = TransferBuffer::new();
    buffer.put(HandoffDraft {
        id: Uuid::new_v4(),
        product_type: "Dog".to_string(),
        product_name: "Beagle".to_string(),
        predicted_price: 150.0,
        price_source: PriceSource::Predicted,
        predicted_breed: "Beagle".to_string(),
        prediction_confidence: 0.92,
        metadata: PetMetadata {
            age_months: 6,
            weight_kg: 10.5,
            health_status: HealthStatus::Good,
            vaccinated: true,
            country: "USA".to_string(),
        },
        image: beagle_photo(),
    });
    buffer
}

#[test]
fn opening_an_empty_buffer_is_an_error() {
    let buffer = TransferBuffer::new();
    assert_matches!(AddProductForm::open(&buffer), Err(CheckoutError::MissingDraft));
}

#[test]
fn opening_does_not_consume_the_draft() {
    let buffer = buffered_draft();
    let _form = AddProductForm::open(&buffer).unwrap();
    assert!(!buffer.is_empty());
}

#[test]
fn price_override_is_recorded_only_when_changed() {
    let buffer = buffered_draft();
    let form = AddProductForm::open(&buffer).unwrap();

    let unchanged = form
        .build_product(CheckoutInput { price: 150.0, quantity: 1 })
        .unwrap();
    assert_eq!(unchanged.price_modified, None);

    let overridden = form
        .build_product(CheckoutInput { price: 175.5, quantity: 1 })
        .unwrap();
    assert_eq!(overridden.price_predicted, 150.0);
    assert_eq!(overridden.price_modified, Some(175.5));
    assert_eq!(overridden.predicted_breed.as_deref(), Some("Beagle"));
    assert!(overridden.image.is_some());
}

#[test]
fn rejects_bad_price_and_quantity() {
    let buffer = buffered_draft();
    let form = AddProductForm::open(&buffer).unwrap();

    assert_matches!(
        form.build_product(CheckoutInput { price: 0.0, quantity: 1 }),
        Err(ValidationError::InvalidPrice)
    );
    assert_matches!(
        form.build_product(CheckoutInput { price: f64::INFINITY, quantity: 1 }),
        Err(ValidationError::InvalidPrice)
    );
    assert_matches!(
        form.build_product(CheckoutInput { price: 10.0, quantity: 0 }),
        Err(ValidationError::InvalidQuantity)
    );
    assert_matches!(
        form.build_product(CheckoutInput { price: 10.0, quantity: -4 }),
        Err(ValidationError::InvalidQuantity)
    );
}

#[tokio::test]
async fn persistence_failure_keeps_the_buffer() {
    let mut buffer = buffered_draft();
    let catalog = FakeCatalog::failing();

    let result = checkout(&mut buffer, &catalog, &token(), CheckoutInput { price: 150.0, quantity: 1 }).await;

    assert_matches!(result, Err(CheckoutError::Persistence(_)));
    assert!(!buffer.is_empty(), "draft must survive for a retry");
    assert!(!buffer.is_claimed());
}

#[tokio::test]
async fn claimed_draft_rejects_a_second_form() {
    let mut buffer = buffered_draft();

    let form = AddProductForm::claim(&mut buffer).unwrap();
    assert_matches!(AddProductForm::claim(&mut buffer), Err(CheckoutError::AlreadySaving));
    // The screen can still show it.
    assert!(AddProductForm::open(&buffer).is_ok());

    buffer.release(form.draft().id);
    assert!(AddProductForm::claim(&mut buffer).is_ok());
}

#[tokio::test]
async fn validation_failure_makes_no_call() {
    let mut buffer = buffered_draft();
    let catalog = FakeCatalog::default();

    let result = checkout(&mut buffer, &catalog, &token(), CheckoutInput { price: -1.0, quantity: 1 }).await;

    assert_matches!(result, Err(CheckoutError::Validation(ValidationError::InvalidPrice)));
    assert!(catalog.created().is_empty());
    assert!(!buffer.is_empty());
}

#[tokio::test]
async fn success_clears_the_buffer_once() {
    let mut buffer = buffered_draft();
    let catalog = FakeCatalog::default();
    let input = CheckoutInput { price: 150.0, quantity: 3 };

    checkout(&mut buffer, &catalog, &token(), input).await.unwrap();
    assert!(buffer.is_empty());

    assert_matches!(
        checkout(&mut buffer, &catalog, &token(), input).await,
        Err(CheckoutError::MissingDraft)
    );
    assert_eq!(catalog.created().len(), 1);
}
