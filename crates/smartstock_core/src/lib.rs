pub mod checkout;
pub mod domain;
pub mod handoff;
pub mod inventory;
pub mod ports;
pub mod stats;
pub mod wizard;

pub use checkout::{checkout, AddProductForm, CheckoutError, CheckoutInput};
pub use domain::{
    AccessToken, Classification, ClassificationDraft, CountrySet, HandoffDraft, HealthStatus,
    ImageUpload, MetadataForm, NewProduct, PetMetadata, PreviewRef, PriceQuote, PriceSource,
    Product, User, ValidationError,
};
pub use handoff::{ClaimError, TransferBuffer};
pub use inventory::InventoryFilter;
pub use ports::{
    AuthService, ClassifierService, PortError, PortResult, PricePredictionService,
    ProductCatalogService, ProductTypeService, TrainingService,
};
pub use stats::ModelStats;
pub use wizard::{StepKind, UploadWizard, WizardError, WizardStep};
