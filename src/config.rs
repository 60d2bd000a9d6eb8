//! Generation configuration.
//!
//! Every spoofable dimension is either fixed to a concrete value by the user
//! or left for the generator to derive from the catalog. Configuration is an
//! explicit value threaded through generation calls, never ambient state.

use serde::{Deserialize, Serialize};

use crate::catalog::{BrowserFamily, OsPlatform};

/// Per-field choice: let the generator derive, or force a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preference<T> {
    /// Uniform draw from the catalog population.
    Derive,
    /// Use exactly this value (still validated against the catalog).
    Fixed(T),
}

// Manual impl: the derive would demand `T: Default` even though `Derive`
// carries no value.
impl<T> Default for Preference<T> {
    fn default() -> Self {
        Self::Derive
    }
}

impl<T: Copy> Preference<T> {
    /// The fixed value, if any.
    pub fn fixed(&self) -> Option<T> {
        match self {
            Self::Derive => None,
            Self::Fixed(v) => Some(*v),
        }
    }
}

/// Whether spoofing is active at all.
///
/// `Disabled` short-circuits the lifecycle: no profile is produced and the
/// coordinator clears both surfaces instead of installing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpoofMode {
    #[default]
    Spoof,
    Disabled,
}

/// User configuration a profile is derived from.
///
/// Stored on the resulting [`Profile`](crate::profile::Profile) as
/// `source_config` so a pinned profile records what produced it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub mode: SpoofMode,
    pub platform: Preference<OsPlatform>,
    pub family: Preference<BrowserFamily>,
    /// Lower bound on the major version draw, within the catalog range.
    pub min_version: Option<u32>,
    /// Upper bound on the major version draw, within the catalog range.
    pub max_version: Option<u32>,
    /// Primary language tag, validated against the platform population.
    pub language: Option<String>,
    pub hardware_concurrency: Preference<u32>,
    pub device_memory: Preference<u32>,
}

impl ProfileConfig {
    /// Everything derived, spoofing on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set spoof mode.
    pub fn mode(mut self, mode: SpoofMode) -> Self {
        self.mode = mode;
        self
    }

    /// Fix the OS platform.
    pub fn platform(mut self, platform: OsPlatform) -> Self {
        self.platform = Preference::Fixed(platform);
        self
    }

    /// Fix the browser family.
    pub fn family(mut self, family: BrowserFamily) -> Self {
        self.family = Preference::Fixed(family);
        self
    }

    /// Constrain the major-version draw to `min..=max`.
    pub fn version_between(mut self, min: u32, max: u32) -> Self {
        self.min_version = Some(min);
        self.max_version = Some(max);
        self
    }

    /// Fix the primary language.
    pub fn language(mut self, tag: impl Into<String>) -> Self {
        self.language = Some(tag.into());
        self
    }

    /// Fix hardwareConcurrency (clamped to the nearest population member).
    pub fn hardware_concurrency(mut self, n: u32) -> Self {
        self.hardware_concurrency = Preference::Fixed(n);
        self
    }

    /// Fix deviceMemory (clamped to the nearest population member).
    pub fn device_memory(mut self, gib: u32) -> Self {
        self.device_memory = Preference::Fixed(gib);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let config = ProfileConfig::new()
            .platform(OsPlatform::Windows)
            .family(BrowserFamily::Chrome)
            .version_between(118, 118)
            .language("en-US");

        assert_eq!(config.platform.fixed(), Some(OsPlatform::Windows));
        assert_eq!(config.family.fixed(), Some(BrowserFamily::Chrome));
        assert_eq!(config.min_version, Some(118));
        assert_eq!(config.max_version, Some(118));
        assert_eq!(config.language.as_deref(), Some("en-US"));
        assert_eq!(config.hardware_concurrency, Preference::Derive);
    }

    #[test]
    fn test_default_is_fully_derived() {
        let config = ProfileConfig::default();
        assert_eq!(config.mode, SpoofMode::Spoof);
        assert!(config.platform.fixed().is_none());
        assert!(config.family.fixed().is_none());
        assert!(config.min_version.is_none());
    }
}
