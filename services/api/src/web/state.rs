//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-wizard session state.

use crate::config::Config;
use crate::error::HandlerError;
use axum::http::StatusCode;
use smartstock_core::domain::{TrainingJob, TrainingSnapshot};
use smartstock_core::ports::{
    AuthService, ClassifierService, PricePredictionService, ProductCatalogService,
    ProductTypeService, TrainingService,
};
use smartstock_core::{TransferBuffer, UploadWizard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub classifier: Arc<dyn ClassifierService>,
    pub pricer: Arc<dyn PricePredictionService>,
    pub catalog: Arc<dyn ProductCatalogService>,
    pub product_types: Arc<dyn ProductTypeService>,
    pub training: Arc<dyn TrainingService>,
    pub wizards: WizardRegistry,
    /// One transfer buffer per user id.
    pub buffers: Mutex<HashMap<String, TransferBuffer>>,
    pub training_monitor: Mutex<Option<TrainingMonitor>>,
}

/// The port implementations the gateway talks to.
pub struct Ports {
    pub auth: Arc<dyn AuthService>,
    pub classifier: Arc<dyn ClassifierService>,
    pub pricer: Arc<dyn PricePredictionService>,
    pub catalog: Arc<dyn ProductCatalogService>,
    pub product_types: Arc<dyn ProductTypeService>,
    pub training: Arc<dyn TrainingService>,
}

impl AppState {
    pub fn new(config: Arc<Config>, ports: Ports) -> Self {
        let wizards = WizardRegistry::new(config.wizard_idle_timeout);
        Self {
            config,
            auth: ports.auth,
            classifier: ports.classifier,
            pricer: ports.pricer,
            catalog: ports.catalog,
            product_types: ports.product_types,
            training: ports.training,
            wizards,
            buffers: Mutex::new(HashMap::new()),
            training_monitor: Mutex::new(None),
        }
    }

    /// Stops the running training poller, if any.
    pub async fn stop_training_monitor(&self) -> bool {
        match self.training_monitor.lock().await.take() {
            Some(monitor) => {
                monitor.cancel.cancel();
                info!(breed = %monitor.job.breed, "Training monitor stopped");
                true
            }
            None => false,
        }
    }
}

//=========================================================================================
// Wizard Sessions
//=========================================================================================

/// One upload wizard and the user it belongs to.
#[derive(Debug)]
pub struct WizardSession {
    pub owner_id: String,
    pub wizard: Mutex<UploadWizard>,
}

/// All live wizards, keyed by wizard id.
///
/// The map lock is only held to look up or insert a session; the wizard's
/// own lock is what handlers hold across backend calls. Sessions idle for
/// longer than `idle_timeout` are swept whenever a new wizard is created.
pub struct WizardRegistry {
    sessions: Mutex<HashMap<Uuid, Tracked>>,
    idle_timeout: Duration,
}

struct Tracked {
    session: Arc<WizardSession>,
    last_touched: Instant,
}

impl WizardRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn create(&self, owner_id: &str) -> (Uuid, Arc<WizardSession>) {
        let wizard_id = Uuid::new_v4();
        let session = Arc::new(WizardSession {
            owner_id: owner_id.to_string(),
            wizard: Mutex::new(UploadWizard::new()),
        });

        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, tracked| now.duration_since(tracked.last_touched) < self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "Dropped idle wizards");
        }
        sessions.insert(
            wizard_id,
            Tracked {
                session: session.clone(),
                last_touched: now,
            },
        );
        info!(%wizard_id, %owner_id, "Wizard created");
        (wizard_id, session)
    }

    /// Looks up a wizard. Wizards owned by another user are reported as missing.
    pub async fn get(&self, wizard_id: Uuid, owner_id: &str) -> Result<Arc<WizardSession>, HandlerError> {
        let mut sessions = self.sessions.lock().await;
        let tracked = sessions
            .get_mut(&wizard_id)
            .filter(|tracked| tracked.session.owner_id == owner_id)
            .ok_or_else(|| not_found(wizard_id))?;
        tracked.last_touched = Instant::now();
        Ok(tracked.session.clone())
    }

    pub async fn remove(&self, wizard_id: Uuid, owner_id: &str) -> Result<(), HandlerError> {
        let mut sessions = self.sessions.lock().await;
        // Ownership is checked first so one user cannot drop another's wizard.
        match sessions.get(&wizard_id) {
            Some(tracked) if tracked.session.owner_id == owner_id => {
                sessions.remove(&wizard_id);
                Ok(())
            }
            _ => Err(not_found(wizard_id)),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn not_found(wizard_id: Uuid) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("Wizard {} not found", wizard_id))
}

//=========================================================================================
// Training Monitor
//=========================================================================================

/// The background poller watching the current training job.
pub struct TrainingMonitor {
    pub job: TrainingJob,
    /// Latest status seen by the poller.
    pub latest: Arc<Mutex<Option<TrainingSnapshot>>>,
    /// A token to gracefully cancel the polling task.
    pub cancel: CancellationToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn idle_wizards_are_swept_on_create() {
        let registry = WizardRegistry::new(Duration::from_secs(60));
        let (stale, _) = registry.create("user-1").await;
        let (active, _) = registry.create("user-1").await;

        tokio::time::advance(Duration::from_secs(45)).await;
        registry.get(active, "user-1").await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        registry.create("user-2").await;

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(stale, "user-1").await.is_err());
        assert!(registry.get(active, "user-1").await.is_ok());
    }

    #[tokio::test]
    async fn another_owner_cannot_remove_a_wizard() {
        let registry = WizardRegistry::new(Duration::from_secs(60));
        let (wizard_id, _) = registry.create("user-1").await;

        let (status, _) = registry.remove(wizard_id, "user-2").await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        registry.remove(wizard_id, "user-1").await.unwrap();
        assert_eq!(registry.len().await, 0);
    }
}
