//! # Masquerade
//!
//! Coherent browser-identity spoofing: profile generation under real-world
//! OS/browser/hardware correlations, and atomic application of the active
//! profile across the two surfaces a page can observe it through:
//! script-visible object properties and HTTP request headers.
//!
//! A divergence between those surfaces is a stronger fingerprinting signal
//! than no spoofing at all, so generation derives every surface from one
//! typed identity and the coordinator serializes all transitions.

// Data model and generation
pub mod catalog;
pub mod config;
pub mod generate;
pub mod headers;
pub mod profile;
pub mod rng;
pub mod script;
pub mod validate;

// Lifecycle and surface coordination
pub mod coordinator;
pub mod lifecycle;
pub mod service;

pub mod error;

// Re-exports
pub use catalog::{BrowserFamily, EcosystemCatalog, OsPlatform};
pub use config::{Preference, ProfileConfig, SpoofMode};
pub use coordinator::{
    CoordinatorState, HeaderRuleEngine, Injector, SurfaceStatus, SyncCoordinator,
};
pub use error::{Error, Result, Surface};
pub use generate::generate;
pub use lifecycle::{MemoryPinnedStore, PinnedStore, ProfileLifecycleManager, MAX_PINNED};
pub use profile::{HeaderOp, HeaderRule, Profile, ProfileKind};
pub use rng::Randomness;
pub use service::{NavigationEvent, SpoofEngine};
pub use validate::{validate, Violation};
