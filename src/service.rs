//! Engine facade.
//!
//! Wires the lifecycle manager and the coordinator together and exposes the
//! operations surrounding UI/CLI layers call. Settings-change and navigation
//! notifications arrive here and turn into transition requests.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::catalog::EcosystemCatalog;
use crate::config::{ProfileConfig, SpoofMode};
use crate::coordinator::{HeaderRuleEngine, Injector, SurfaceStatus, SyncCoordinator};
use crate::error::{Error, Result};
use crate::generate::generate;
use crate::lifecycle::{PinnedStore, ProfileLifecycleManager};
use crate::profile::Profile;
use crate::rng::Randomness;
use crate::validate::validate;

/// A per-tab navigation event from the host's navigation source.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub tab_id: u32,
    pub url: String,
    pub is_main_frame: bool,
}

/// The spoofing engine: profile lifecycle plus surface coordination behind
/// one handle. Lifecycle mutations are serialized behind a single writer;
/// activation submissions never block beyond the request send.
pub struct SpoofEngine<S: PinnedStore> {
    catalog: Arc<EcosystemCatalog>,
    lifecycle: Mutex<ProfileLifecycleManager<S>>,
    rng: Mutex<Randomness>,
    config: Mutex<ProfileConfig>,
    coordinator: SyncCoordinator,
}

impl<S: PinnedStore> SpoofEngine<S> {
    /// Build an engine and spawn its coordination task.
    pub fn new(
        catalog: EcosystemCatalog,
        store: S,
        injector: Arc<dyn Injector>,
        header_engine: Arc<dyn HeaderRuleEngine>,
        config: ProfileConfig,
    ) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let lifecycle = ProfileLifecycleManager::new(catalog.clone(), store)?;
        Ok(Self {
            catalog,
            lifecycle: Mutex::new(lifecycle),
            rng: Mutex::new(Randomness::from_entropy()),
            config: Mutex::new(config),
            coordinator: SyncCoordinator::spawn(injector, header_engine),
        })
    }

    /// Same, but with a fixed randomness seed for reproducible runs.
    pub fn with_seed(
        catalog: EcosystemCatalog,
        store: S,
        injector: Arc<dyn Injector>,
        header_engine: Arc<dyn HeaderRuleEngine>,
        config: ProfileConfig,
        seed: u64,
    ) -> Result<Self> {
        let engine = Self::new(catalog, store, injector, header_engine, config)?;
        *engine.rng.lock().unwrap() = Randomness::from_seed(seed);
        Ok(engine)
    }

    /// Generate and validate a profile without activating anything.
    pub fn generate_profile(&self, config: &ProfileConfig) -> Result<Profile> {
        let mut rng = self.rng.lock().unwrap();
        let profile = generate(config, &self.catalog, &mut rng)?;
        validate(&profile, &self.catalog).map_err(Error::Validation)?;
        Ok(profile)
    }

    /// Ensure a session profile and activate the current profile.
    ///
    /// Returns `None` when spoofing is disabled; both surfaces are cleared
    /// in that case.
    pub fn activate_session(
        &self,
        config: &ProfileConfig,
        force_regenerate: bool,
    ) -> Result<Option<Profile>> {
        *self.config.lock().unwrap() = config.clone();
        if config.mode == SpoofMode::Disabled {
            debug!("spoofing disabled, clearing surfaces");
            self.lifecycle.lock().unwrap().clear_session();
            self.coordinator.clear()?;
            return Ok(None);
        }
        let current = {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            let mut rng = self.rng.lock().unwrap();
            lifecycle.ensure_session_profile(config, &mut rng, force_regenerate)?;
            lifecycle.get_current()?
        };
        self.coordinator.install(current.clone())?;
        Ok(Some(current))
    }

    /// Create a durable pinned profile (not selected automatically).
    pub fn create_pinned(&self, config: &ProfileConfig) -> Result<Profile> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        let mut rng = self.rng.lock().unwrap();
        lifecycle.create_pinned(config, &mut rng)
    }

    /// Delete a pinned profile; if it was the active selection the current
    /// profile falls back and the surfaces are re-synced.
    pub fn delete_pinned(&self, id: &str) -> Result<()> {
        let was_selected = {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            let was_selected = lifecycle.selected() == Some(id);
            lifecycle.delete_pinned(id)?;
            was_selected
        };
        if was_selected {
            self.sync_current()?;
        }
        Ok(())
    }

    /// Select a pinned profile (or `None` for the session profile) and
    /// re-sync the surfaces. Unknown ids error without touching the active
    /// profile.
    pub fn select_pinned(&self, id: Option<&str>) -> Result<()> {
        self.lifecycle.lock().unwrap().select_pinned(id)?;
        self.sync_current()
    }

    /// All pinned profiles, newest first.
    pub fn pinned_profiles(&self) -> Vec<Profile> {
        let lifecycle = self.lifecycle.lock().unwrap();
        let mut profiles = lifecycle.pinned().to_vec();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        profiles
    }

    /// Snapshot of the profile currently published on the surfaces.
    pub fn get_active_profile(&self) -> Option<Profile> {
        self.coordinator.active_profile()
    }

    /// Snapshot of coordinator state and per-surface health.
    pub fn get_degraded_status(&self) -> SurfaceStatus {
        self.coordinator.status()
    }

    /// React to a settings change: adopt the new configuration and issue a
    /// transition request for the resulting current profile.
    pub fn handle_settings_change(&self, config: ProfileConfig) -> Result<()> {
        self.activate_session(&config, false).map(|_| ())
    }

    /// React to a navigation event. Only main-frame commits re-assert the
    /// current profile; subframe noise is ignored.
    pub fn handle_navigation(&self, event: &NavigationEvent) -> Result<()> {
        if !event.is_main_frame {
            return Ok(());
        }
        debug!(tab = event.tab_id, url = %event.url, "main-frame navigation, re-asserting profile");
        let config = self.config.lock().unwrap().clone();
        if config.mode == SpoofMode::Disabled {
            return self.coordinator.clear();
        }
        {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            if lifecycle.session().is_none() {
                let mut rng = self.rng.lock().unwrap();
                lifecycle.ensure_session_profile(&config, &mut rng, false)?;
            }
        }
        self.sync_current()
    }

    /// Wait until all submitted transition requests have been applied.
    pub async fn settled(&self) -> Result<()> {
        self.coordinator.settled().await
    }

    /// Install whatever the lifecycle considers current, or clear both
    /// surfaces when there is nothing to install.
    fn sync_current(&self) -> Result<()> {
        let current = self.lifecycle.lock().unwrap().get_current();
        match current {
            Ok(profile) => self.coordinator.install(profile),
            Err(Error::NoProfileAvailable) => self.coordinator.clear(),
            Err(e) => Err(e),
        }
    }
}
