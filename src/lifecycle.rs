//! Profile lifecycle: which profile is "current", and creation/retirement
//! of the ephemeral session profile and the durable pinned set.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::EcosystemCatalog;
use crate::config::{ProfileConfig, SpoofMode};
use crate::error::{Error, Result};
use crate::generate::generate;
use crate::profile::{Profile, ProfileKind};
use crate::rng::Randomness;
use crate::validate::validate;

/// Maximum number of pinned profiles; oldest `created_at` is evicted first.
pub const MAX_PINNED: usize = 8;

/// Generation is retried this many times on validation failure before the
/// failure is treated as a catalog bug and propagated.
const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// Durable storage for pinned profiles. The host owns the format; the
/// lifecycle only issues save/delete/load calls.
pub trait PinnedStore: Send {
    fn save(&mut self, profile: &Profile) -> Result<()>;
    fn delete(&mut self, id: &str) -> Result<()>;
    fn load_all(&self) -> Result<Vec<Profile>>;
}

/// In-memory store for hosts without persistence, and for tests.
#[derive(Debug, Default)]
pub struct MemoryPinnedStore {
    profiles: Vec<Profile>,
}

impl MemoryPinnedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PinnedStore for MemoryPinnedStore {
    fn save(&mut self, profile: &Profile) -> Result<()> {
        self.profiles.retain(|p| p.id != profile.id);
        self.profiles.push(profile.clone());
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        self.profiles.retain(|p| p.id != id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.clone())
    }
}

/// Owns the session profile and the pinned set, and decides which profile
/// is current. Mutations go through the single writer that owns this value;
/// reads hand out cheap clones.
pub struct ProfileLifecycleManager<S: PinnedStore> {
    catalog: Arc<EcosystemCatalog>,
    store: S,
    session: Option<Profile>,
    pinned: Vec<Profile>,
    selected: Option<String>,
}

impl<S: PinnedStore> ProfileLifecycleManager<S> {
    /// Build a manager, loading the pinned set from the store.
    pub fn new(catalog: Arc<EcosystemCatalog>, store: S) -> Result<Self> {
        let pinned = store.load_all()?;
        debug!(count = pinned.len(), "loaded pinned profiles");
        Ok(Self {
            catalog,
            store,
            session: None,
            pinned,
            selected: None,
        })
    }

    /// Generate until validation passes, bounded.
    ///
    /// A failure after the retry bound means the catalog and generator
    /// disagree with each other; that is a bug to surface, not mask.
    fn generate_valid(&self, config: &ProfileConfig, rng: &mut Randomness) -> Result<Profile> {
        let mut last_violations = Vec::new();
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let profile = generate(config, &self.catalog, rng)?;
            match validate(&profile, &self.catalog) {
                Ok(()) => return Ok(profile),
                Err(violations) => {
                    warn!(?violations, attempt, "generated profile failed validation");
                    last_violations = violations;
                }
            }
        }
        Err(Error::Validation(last_violations))
    }

    /// Ensure a session profile exists, regenerating if `force` is set.
    /// Returns a clone of the (possibly new) session profile.
    pub fn ensure_session_profile(
        &mut self,
        config: &ProfileConfig,
        rng: &mut Randomness,
        force: bool,
    ) -> Result<Profile> {
        if config.mode == SpoofMode::Disabled {
            return Err(Error::NoProfileAvailable);
        }
        if !force {
            if let Some(existing) = &self.session {
                return Ok(existing.clone());
            }
        }
        let profile = self.generate_valid(config, rng)?;
        debug!(id = %profile.id, family = ?profile.family, platform = ?profile.platform,
               "session profile created");
        self.session = Some(profile.clone());
        Ok(profile)
    }

    /// Create and persist a pinned profile, evicting the oldest on overflow.
    pub fn create_pinned(
        &mut self,
        config: &ProfileConfig,
        rng: &mut Randomness,
    ) -> Result<Profile> {
        let mut profile = self.generate_valid(config, rng)?;
        profile.kind = ProfileKind::Pinned;

        if self.pinned.len() >= MAX_PINNED {
            if let Some(oldest_idx) = self
                .pinned
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(i, _)| i)
            {
                let evicted = self.pinned.remove(oldest_idx);
                warn!(id = %evicted.id, "pinned set full, evicting oldest");
                self.store.delete(&evicted.id)?;
                if self.selected.as_deref() == Some(evicted.id.as_str()) {
                    self.selected = None;
                }
            }
        }

        self.store.save(&profile)?;
        self.pinned.push(profile.clone());
        Ok(profile)
    }

    /// Delete a pinned profile. Clears the selection if it pointed here.
    pub fn delete_pinned(&mut self, id: &str) -> Result<()> {
        let before = self.pinned.len();
        self.pinned.retain(|p| p.id != id);
        if self.pinned.len() == before {
            return Err(Error::not_found(id));
        }
        self.store.delete(id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Select a pinned profile as the preferred current profile, or clear
    /// the selection with `None`. Selecting an unknown id is an error and
    /// leaves the current selection untouched.
    pub fn select_pinned(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => {
                if !self.pinned.iter().any(|p| p.id == id) {
                    return Err(Error::not_found(id));
                }
                self.selected = Some(id.to_string());
            }
            None => self.selected = None,
        }
        Ok(())
    }

    /// Resolve the current profile: the selected pinned profile when it is
    /// present and still valid against the catalog, else the session profile.
    ///
    /// A selected pinned profile that fails re-validation (the catalog may
    /// have evolved since it was persisted) is skipped, not deleted; the
    /// host decides what to do with it.
    pub fn get_current(&self) -> Result<Profile> {
        if let Some(id) = &self.selected {
            if let Some(pinned) = self.pinned.iter().find(|p| &p.id == id) {
                match validate(pinned, &self.catalog) {
                    Ok(()) => return Ok(pinned.clone()),
                    Err(violations) => {
                        warn!(id = %pinned.id, ?violations,
                              "selected pinned profile no longer valid, falling back to session");
                    }
                }
            }
        }
        self.session.clone().ok_or(Error::NoProfileAvailable)
    }

    /// Drop the session profile (protection disabled).
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    pub fn session(&self) -> Option<&Profile> {
        self.session.as_ref()
    }

    pub fn pinned(&self) -> &[Profile] {
        &self.pinned
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn manager() -> ProfileLifecycleManager<MemoryPinnedStore> {
        ProfileLifecycleManager::new(
            Arc::new(EcosystemCatalog::builtin()),
            MemoryPinnedStore::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_session_profile_is_reused_until_forced() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(1);
        let config = ProfileConfig::new();

        let first = mgr.ensure_session_profile(&config, &mut rng, false).unwrap();
        let same = mgr.ensure_session_profile(&config, &mut rng, false).unwrap();
        assert_eq!(first.id, same.id);

        let regenerated = mgr.ensure_session_profile(&config, &mut rng, true).unwrap();
        assert_ne!(first.id, regenerated.id);
    }

    #[test]
    fn test_disabled_mode_produces_nothing() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(1);
        let config = ProfileConfig::new().mode(SpoofMode::Disabled);
        assert!(matches!(
            mgr.ensure_session_profile(&config, &mut rng, false),
            Err(Error::NoProfileAvailable)
        ));
    }

    #[test]
    fn test_pinned_eviction_removes_oldest() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(2);
        let config = ProfileConfig::new();

        let mut ids = Vec::new();
        for i in 0..MAX_PINNED {
            let mut p = mgr.create_pinned(&config, &mut rng).unwrap();
            // Spread created_at so eviction order is unambiguous.
            p.created_at = p.created_at - Duration::seconds((MAX_PINNED - i) as i64);
            let id = p.id.clone();
            if let Some(stored) = mgr.pinned.iter_mut().find(|q| q.id == id) {
                stored.created_at = p.created_at;
            }
            ids.push(id);
        }
        assert_eq!(mgr.pinned().len(), MAX_PINNED);

        let newcomer = mgr.create_pinned(&config, &mut rng).unwrap();
        assert_eq!(mgr.pinned().len(), MAX_PINNED);
        // Exactly the oldest is gone, the newcomer is present.
        assert!(!mgr.pinned().iter().any(|p| p.id == ids[0]));
        assert!(mgr.pinned().iter().any(|p| p.id == newcomer.id));
        for id in &ids[1..] {
            assert!(mgr.pinned().iter().any(|p| &p.id == id));
        }
    }

    #[test]
    fn test_select_unknown_pinned_is_not_found_and_keeps_state() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(3);
        let config = ProfileConfig::new();
        let pinned = mgr.create_pinned(&config, &mut rng).unwrap();
        mgr.select_pinned(Some(&pinned.id)).unwrap();
        mgr.ensure_session_profile(&config, &mut rng, false).unwrap();

        let err = mgr.select_pinned(Some("p-does-not-exist")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(mgr.selected(), Some(pinned.id.as_str()));
        assert_eq!(mgr.get_current().unwrap().id, pinned.id);
    }

    #[test]
    fn test_invalid_pinned_falls_back_to_session() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(4);
        let config = ProfileConfig::new();
        let session = mgr.ensure_session_profile(&config, &mut rng, false).unwrap();
        let pinned = mgr.create_pinned(&config, &mut rng).unwrap();
        mgr.select_pinned(Some(&pinned.id)).unwrap();

        // Simulate a catalog evolution that outlawed this profile's hardware.
        if let Some(stored) = mgr.pinned.iter_mut().find(|p| p.id == pinned.id) {
            stored.navigator.hardware_concurrency = 999;
        }
        assert_eq!(mgr.get_current().unwrap().id, session.id);
        // The stale profile stays in the set for the host to surface.
        assert!(mgr.pinned().iter().any(|p| p.id == pinned.id));
    }

    #[test]
    fn test_delete_selected_pinned_clears_selection() {
        let mut mgr = manager();
        let mut rng = Randomness::from_seed(5);
        let config = ProfileConfig::new();
        let session = mgr.ensure_session_profile(&config, &mut rng, false).unwrap();
        let pinned = mgr.create_pinned(&config, &mut rng).unwrap();
        mgr.select_pinned(Some(&pinned.id)).unwrap();

        mgr.delete_pinned(&pinned.id).unwrap();
        assert_eq!(mgr.selected(), None);
        assert_eq!(mgr.get_current().unwrap().id, session.id);
        assert!(matches!(
            mgr.delete_pinned(&pinned.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_pinned_profiles_survive_reload() {
        let catalog = Arc::new(EcosystemCatalog::builtin());
        let mut store = MemoryPinnedStore::new();
        let id = {
            let mut mgr =
                ProfileLifecycleManager::new(catalog.clone(), MemoryPinnedStore::new()).unwrap();
            let p = mgr
                .create_pinned(&ProfileConfig::new(), &mut Randomness::from_seed(6))
                .unwrap();
            store.save(&p).unwrap();
            p.id
        };
        let mgr = ProfileLifecycleManager::new(catalog, store).unwrap();
        assert!(mgr.pinned().iter().any(|p| p.id == id));
    }
}
