//! Error types for the masquerade crate.

use crate::validate::Violation;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Which observation surface an apply failure occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Script-visible object properties (installed via the Injector).
    Script,
    /// HTTP request headers (installed via the HeaderRuleEngine).
    Headers,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Headers => "headers",
        }
    }
}

/// Errors that can occur during profile generation, lifecycle, and activation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied configuration is internally contradictory.
    ///
    /// Surfaced immediately, never masked: the two named fields cannot be
    /// honored together (e.g. a platform with a family never offered on it).
    #[error("Config conflict: {field_a} is incompatible with {field_b}")]
    ConfigConflict {
        field_a: &'static str,
        field_b: &'static str,
    },

    /// A generated or loaded profile violates one or more invariants.
    ///
    /// Triggers bounded regeneration; if regeneration keeps failing the
    /// catalog itself is broken and the error propagates.
    #[error("Profile validation failed: {0:?}")]
    Validation(Vec<Violation>),

    /// An Injector or HeaderRuleEngine call failed after retry.
    #[error("Surface apply failed on {} surface: {message}", .surface.as_str())]
    SurfaceApply { surface: Surface, message: String },

    /// The lifecycle has no profile to activate (protection disabled).
    #[error("No profile available")]
    NoProfileAvailable,

    /// A referenced profile id does not exist.
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// Pinned-profile storage error (host-owned persistence).
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Coordinator task is gone (shut down or panicked).
    #[error("Coordinator unavailable: {0}")]
    Coordinator(String),
}

impl Error {
    /// Create a config-conflict error naming the two offending fields.
    pub fn config_conflict(field_a: &'static str, field_b: &'static str) -> Self {
        Self::ConfigConflict { field_a, field_b }
    }

    /// Create a surface-apply error.
    pub fn surface_apply(surface: Surface, message: impl Into<String>) -> Self {
        Self::SurfaceApply {
            surface,
            message: message.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a coordinator error.
    pub fn coordinator(message: impl Into<String>) -> Self {
        Self::Coordinator(message.into())
    }
}
