//! Consistency validation.
//!
//! Safety net behind the generator (string assembly drifts easily) and the
//! gate for profiles loaded from persisted storage, which may predate catalog
//! changes. Pure and total: no I/O, no mutation, callable on every activation.

use serde::{Deserialize, Serialize};

use crate::catalog::{BrowserFamily, EcosystemCatalog, OsPlatform};
use crate::headers::{format_sec_ch_ua, SEC_CH_UA, SEC_CH_UA_MOBILE, SEC_CH_UA_PLATFORM};
use crate::profile::Profile;

/// One violated profile invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// User-agent family token, primary brand, and header family disagree,
    /// or a client-hint structure exists for a family that never ships one.
    FamilyCoherence,
    /// OS tokens across user-agent, navigator.platform and hint platform do
    /// not map to the same OS family.
    PlatformCoherence,
    /// Version strings across surfaces disagree or fall outside the
    /// catalog's range for the family.
    VersionCoherence,
    /// hardwareConcurrency/deviceMemory/WebGL strings are not members of the
    /// catalog populations for the platform.
    ResourceCoherence,
    /// Screen geometry is not one atomic population entry, or avail exceeds
    /// full, or devicePixelRatio is outside its class population.
    ScreenCoherence,
    /// A header rule whose value also exists as a script-visible property
    /// carries a different value.
    HeaderParity,
}

/// Version token embedded in the user-agent string for the given family.
fn ua_version_token(ua: &str, family: BrowserFamily) -> Option<&str> {
    let marker = match family {
        BrowserFamily::Chrome => "Chrome/",
        BrowserFamily::Edge => "Edg/",
        BrowserFamily::Firefox => "Firefox/",
        BrowserFamily::Safari => "Version/",
    };
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Check a profile against the full invariant set.
///
/// Returns every violated invariant, not just the first, so callers can log
/// a complete picture before regenerating or discarding.
pub fn validate(profile: &Profile, catalog: &EcosystemCatalog) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    let ua = &profile.navigator.user_agent;

    // Family coherence across UA, brands, and Sec-CH-UA header.
    let ua_family = BrowserFamily::parse_user_agent(ua);
    if ua_family != Some(profile.family) {
        violations.push(Violation::FamilyCoherence);
    }
    match &profile.client_hints {
        Some(hints) => {
            if !profile.family.supports_client_hints() {
                violations.push(Violation::FamilyCoherence);
            } else {
                let primary = hints
                    .brands
                    .first()
                    .and_then(|b| BrowserFamily::from_brand_name(&b.name));
                if primary != Some(profile.family) {
                    violations.push(Violation::FamilyCoherence);
                }
                if let Some(value) = profile
                    .header_rule(SEC_CH_UA)
                    .and_then(|r| r.set_value())
                {
                    if !value.contains(&format!("\"{}\"", profile.family.brand_name())) {
                        violations.push(Violation::FamilyCoherence);
                    }
                }
            }
        }
        None => {
            if profile.family.supports_client_hints() {
                violations.push(Violation::FamilyCoherence);
            }
            // No-support families must strip the hint headers, never set them.
            for name in [SEC_CH_UA, SEC_CH_UA_MOBILE, SEC_CH_UA_PLATFORM] {
                if profile
                    .header_rule(name)
                    .is_some_and(|r| r.set_value().is_some())
                {
                    violations.push(Violation::FamilyCoherence);
                    break;
                }
            }
        }
    }

    // Platform coherence across UA token, navigator.platform, hint platform.
    let ua_platform = OsPlatform::parse_user_agent(ua);
    if ua_platform != Some(profile.platform)
        || profile.navigator.platform != profile.platform.navigator_platform()
        || profile
            .client_hints
            .as_ref()
            .is_some_and(|h| h.platform != profile.platform.as_str())
    {
        violations.push(Violation::PlatformCoherence);
    }

    // Version coherence: UA token, hints, and catalog range.
    let version_ok = match ua_version_token(ua, profile.family) {
        Some(token) => {
            let major_matches = token
                .split('.')
                .next()
                .is_some_and(|m| m == profile.version.to_string());
            let hints_match = match &profile.client_hints {
                Some(hints) => {
                    token == hints.ua_full_version
                        && hints
                            .full_version_list
                            .iter()
                            .find(|b| b.name == profile.family.brand_name())
                            .is_some_and(|b| b.version == token)
                }
                None => true,
            };
            major_matches && hints_match
        }
        None => false,
    };
    let range_ok = catalog
        .version_range(profile.family)
        .is_some_and(|r| r.contains(profile.version));
    if !version_ok || !range_ok {
        violations.push(Violation::VersionCoherence);
    }

    // Resource coherence: populations for the platform.
    match catalog.entry(profile.platform) {
        Some(entry) => {
            if !entry
                .hardware_concurrency
                .contains(&profile.navigator.hardware_concurrency)
                || !entry.device_memory.contains(&profile.navigator.device_memory)
            {
                violations.push(Violation::ResourceCoherence);
            }
            if !entry.webgl.iter().any(|(v, r)| {
                *v == profile.webgl.vendor && *r == profile.webgl.renderer
            }) {
                violations.push(Violation::ResourceCoherence);
            }
            if !entry.allows(profile.family) {
                violations.push(Violation::PlatformCoherence);
            }
        }
        None => violations.push(Violation::ResourceCoherence),
    }

    // Screen coherence: atomic resolution pair, avail bounds, dpr class.
    let screen = &profile.screen;
    let pair_ok = catalog
        .resolutions()
        .contains(&(screen.width, screen.height));
    let dpr_ok = catalog
        .dpr_population(profile.platform.device_class())
        .contains(&screen.device_pixel_ratio);
    if !pair_ok
        || !dpr_ok
        || screen.avail_height > screen.height
        || screen.avail_width > screen.width
    {
        violations.push(Violation::ScreenCoherence);
    }

    // Header/script parity.
    let ua_rule_ok = profile
        .header_rule("User-Agent")
        .and_then(|r| r.set_value())
        .is_some_and(|v| v == profile.navigator.user_agent);
    if !ua_rule_ok {
        violations.push(Violation::HeaderParity);
    }
    if let Some(hints) = &profile.client_hints {
        let ch_ok = profile
            .header_rule(SEC_CH_UA)
            .and_then(|r| r.set_value())
            .is_some_and(|v| v == format_sec_ch_ua(&hints.brands));
        let mobile_ok = profile
            .header_rule(SEC_CH_UA_MOBILE)
            .and_then(|r| r.set_value())
            .is_some_and(|v| v == if hints.mobile { "?1" } else { "?0" });
        let platform_ok = profile
            .header_rule(SEC_CH_UA_PLATFORM)
            .and_then(|r| r.set_value())
            .is_some_and(|v| v == format!("\"{}\"", hints.platform));
        if !ch_ok || !mobile_ok || !platform_ok {
            violations.push(Violation::HeaderParity);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        violations.dedup();
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::generate::generate;
    use crate::profile::HeaderOp;
    use crate::rng::Randomness;

    fn generated(seed: u64) -> (Profile, EcosystemCatalog) {
        let catalog = EcosystemCatalog::builtin();
        let profile = generate(
            &ProfileConfig::new(),
            &catalog,
            &mut Randomness::from_seed(seed),
        )
        .unwrap();
        (profile, catalog)
    }

    #[test]
    fn test_generated_profiles_validate_clean() {
        for seed in 0..64 {
            let (profile, catalog) = generated(seed);
            assert_eq!(validate(&profile, &catalog), Ok(()), "seed {seed}");
        }
    }

    #[test]
    fn test_tampered_user_agent_rule_fails_parity() {
        let (mut profile, catalog) = generated(1);
        for rule in &mut profile.header_rules {
            if rule.name.eq_ignore_ascii_case("user-agent") {
                rule.op = HeaderOp::Set("Mozilla/5.0 (tampered)".to_string());
            }
        }
        let violations = validate(&profile, &catalog).unwrap_err();
        assert!(violations.contains(&Violation::HeaderParity));
    }

    #[test]
    fn test_mixed_resolution_axes_fail() {
        let (mut profile, catalog) = generated(2);
        // width from one population entry, height from another
        profile.screen.width = 1920;
        profile.screen.height = 900;
        profile.screen.avail_width = 1920;
        profile.screen.avail_height = 860;
        let violations = validate(&profile, &catalog).unwrap_err();
        assert!(violations.contains(&Violation::ScreenCoherence));
    }

    #[test]
    fn test_out_of_population_hardware_fails() {
        let (mut profile, catalog) = generated(3);
        profile.navigator.hardware_concurrency = 3;
        let violations = validate(&profile, &catalog).unwrap_err();
        assert!(violations.contains(&Violation::ResourceCoherence));
    }

    #[test]
    fn test_out_of_range_version_fails() {
        let (mut profile, catalog) = generated(4);
        profile.version = 999;
        let violations = validate(&profile, &catalog).unwrap_err();
        assert!(violations.contains(&Violation::VersionCoherence));
    }

    #[test]
    fn test_cross_family_user_agent_fails() {
        let catalog = EcosystemCatalog::builtin();
        let chrome = generate(
            &ProfileConfig::new().family(BrowserFamily::Chrome),
            &catalog,
            &mut Randomness::from_seed(7),
        )
        .unwrap();
        let firefox = generate(
            &ProfileConfig::new().family(BrowserFamily::Firefox),
            &catalog,
            &mut Randomness::from_seed(8),
        )
        .unwrap();

        let mut franken = chrome.clone();
        franken.navigator.user_agent = firefox.navigator.user_agent.clone();
        let violations = validate(&franken, &catalog).unwrap_err();
        assert!(violations.contains(&Violation::FamilyCoherence));
    }
}
