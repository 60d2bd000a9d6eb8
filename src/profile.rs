//! The profile data model: one complete, internally consistent synthetic
//! browser identity, observable through script properties and request headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{BrowserFamily, OsPlatform};
use crate::config::ProfileConfig;

/// Ephemeral per-session vs. durable user-created profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    /// Regenerated each running session, never persisted.
    Session,
    /// Created explicitly by the user, persisted durably.
    Pinned,
}

/// Script-visible `navigator.*` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatorProperties {
    pub platform: String,
    pub user_agent: String,
    pub app_version: String,
    pub vendor: String,
    pub language: String,
    pub languages: Vec<String>,
    pub hardware_concurrency: u32,
    pub device_memory: u32,
    pub max_touch_points: u32,
    pub cookie_enabled: bool,
}

/// One `Sec-CH-UA` brand entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub version: String,
}

/// UA client-hint surface. Present only for families that ship it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientHints {
    /// Ordered brand list as exposed in `Sec-CH-UA` (major versions).
    pub brands: Vec<Brand>,
    pub mobile: bool,
    pub platform: String,
    pub platform_version: String,
    pub architecture: String,
    pub bitness: String,
    pub wow64: bool,
    /// Full build version of the primary browser brand.
    pub ua_full_version: String,
    /// Ordered brand list with full build versions.
    pub full_version_list: Vec<Brand>,
}

/// Script-visible `screen.*` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenProperties {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub color_depth: u32,
    pub pixel_depth: u32,
    pub device_pixel_ratio: f64,
}

/// WebGL debug-renderer-info strings, drawn as one atomic pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebGlStrings {
    pub vendor: String,
    pub renderer: String,
}

/// Operation a header rule performs on a request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderOp {
    Set(String),
    Remove,
}

/// One declarative request-header rewrite, keyed by a stable small id that
/// is reused across transitions so engine-side replacement is atomic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub id: u32,
    pub name: String,
    pub op: HeaderOp,
}

impl HeaderRule {
    pub fn set(id: u32, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            op: HeaderOp::Set(value.into()),
        }
    }

    pub fn remove(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            op: HeaderOp::Remove,
        }
    }

    /// The value this rule sets, if it is a set rule.
    pub fn set_value(&self) -> Option<&str> {
        match &self.op {
            HeaderOp::Set(v) => Some(v),
            HeaderOp::Remove => None,
        }
    }
}

/// A complete synthetic browser identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub kind: ProfileKind,
    pub created_at: DateTime<Utc>,
    /// The configuration this profile was derived from.
    pub source_config: ProfileConfig,
    /// Resolved platform and family, kept explicit so consumers never
    /// re-parse them out of the user-agent string.
    pub platform: OsPlatform,
    pub family: BrowserFamily,
    /// Major version the whole profile was derived from.
    pub version: u32,
    pub navigator: NavigatorProperties,
    /// `None` for families without client-hint support.
    pub client_hints: Option<ClientHints>,
    pub screen: ScreenProperties,
    pub webgl: WebGlStrings,
    /// Ordered header rewrites, derived from the fields above.
    pub header_rules: Vec<HeaderRule>,
}

impl Profile {
    /// Find a header rule by (case-insensitive) header name.
    pub fn header_rule(&self, name: &str) -> Option<&HeaderRule> {
        self.header_rules
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_rule_lookup_is_case_insensitive() {
        let rule = HeaderRule::set(1, "User-Agent", "Mozilla/5.0");
        let profile_rules = vec![rule.clone()];
        let found = profile_rules
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case("user-agent"));
        assert_eq!(found, Some(&rule));
    }

    #[test]
    fn test_set_value() {
        assert_eq!(
            HeaderRule::set(1, "User-Agent", "x").set_value(),
            Some("x")
        );
        assert_eq!(HeaderRule::remove(2, "Sec-CH-UA").set_value(), None);
    }
}
