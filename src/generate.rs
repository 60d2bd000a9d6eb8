//! Profile generation.
//!
//! `generate` is a pure function of (config, catalog, randomness). All
//! derived strings (user-agent, appVersion, client hints, header rules)
//! are built from the same typed intermediates, so the surfaces cannot
//! silently diverge during assembly.

use chrono::Utc;

use crate::catalog::{BrowserFamily, EcosystemCatalog, OsPlatform};
use crate::config::{Preference, ProfileConfig};
use crate::error::{Error, Result};
use crate::headers::derive_header_rules;
use crate::profile::{
    Brand, ClientHints, NavigatorProperties, Profile, ProfileKind, ScreenProperties, WebGlStrings,
};
use crate::rng::Randomness;

/// The typed intermediate every derived string is built from.
///
/// One `Identity` is resolved per generation; the UA string, appVersion,
/// brands and full-version list all read the same fields.
struct Identity {
    platform: OsPlatform,
    family: BrowserFamily,
    major: u32,
    full_version: String,
}

impl Identity {
    fn new(platform: OsPlatform, family: BrowserFamily, major: u32) -> Self {
        Self {
            platform,
            family,
            major,
            full_version: full_version(family, major),
        }
    }

    fn user_agent(&self) -> String {
        match self.family {
            BrowserFamily::Chrome => format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                self.platform.ua_token(),
                self.full_version
            ),
            BrowserFamily::Edge => format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36 Edg/{}",
                self.platform.ua_token(),
                self.full_version,
                self.full_version
            ),
            BrowserFamily::Firefox => format!(
                "Mozilla/5.0 ({}; rv:{}.0) Gecko/20100101 Firefox/{}",
                self.platform.ua_token_gecko(),
                self.major,
                self.full_version
            ),
            BrowserFamily::Safari => format!(
                "Mozilla/5.0 ({}) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{} Safari/605.1.15",
                self.platform.ua_token(),
                self.full_version
            ),
        }
    }

    fn app_version(&self) -> String {
        let ua = self.user_agent();
        ua.strip_prefix("Mozilla/").unwrap_or(&ua).to_string()
    }

    /// Client hints, only for families that ship them.
    fn client_hints(&self) -> Option<ClientHints> {
        if !self.family.supports_client_hints() {
            return None;
        }
        // The family's own brand leads the list; consumers treat entry 0 as
        // the primary brand.
        let major = self.major.to_string();
        let brands = vec![
            Brand {
                name: self.family.brand_name().to_string(),
                version: major.clone(),
            },
            Brand {
                name: "Chromium".to_string(),
                version: major,
            },
            Brand {
                name: "Not_A Brand".to_string(),
                version: "24".to_string(),
            },
        ];
        let full_version_list = vec![
            Brand {
                name: self.family.brand_name().to_string(),
                version: self.full_version.clone(),
            },
            Brand {
                name: "Chromium".to_string(),
                version: self.full_version.clone(),
            },
            Brand {
                name: "Not_A Brand".to_string(),
                version: "24.0.0.0".to_string(),
            },
        ];
        Some(ClientHints {
            brands,
            mobile: false,
            platform: self.platform.as_str().to_string(),
            platform_version: self.platform.platform_version().to_string(),
            architecture: "x86".to_string(),
            bitness: "64".to_string(),
            wow64: false,
            ua_full_version: self.full_version.clone(),
            full_version_list,
        })
    }
}

/// Full build version derived deterministically from the major draw.
///
/// Subordinate version strings are never redrawn, so every surface that
/// embeds a version embeds this exact string.
fn full_version(family: BrowserFamily, major: u32) -> String {
    match family {
        BrowserFamily::Chrome | BrowserFamily::Edge => {
            let build = 5000 + (major * 97) % 2000;
            let patch = (major * 31) % 250;
            format!("{major}.0.{build}.{patch}")
        }
        BrowserFamily::Firefox => format!("{major}.0"),
        BrowserFamily::Safari => format!("{major}.6"),
    }
}

/// Clamp an explicit override to the nearest population member.
fn clamp_to_population(value: u32, population: &[u32]) -> u32 {
    population
        .iter()
        .copied()
        .min_by_key(|p| p.abs_diff(value))
        .unwrap_or(value)
}

/// Resolve the primary language: explicit override if present in the
/// population, else the nearest member by primary subtag, else a draw.
fn resolve_language(
    config: &ProfileConfig,
    population: &[&'static str],
    rng: &mut Randomness,
) -> String {
    if let Some(wanted) = &config.language {
        if population.iter().any(|l| *l == wanted.as_str()) {
            return wanted.clone();
        }
        let subtag = wanted.split('-').next().unwrap_or(wanted);
        if let Some(near) = population.iter().find(|l| l.starts_with(subtag)) {
            return (*near).to_string();
        }
    }
    (*rng.pick(population)).to_string()
}

/// Generate a candidate profile.
///
/// Fails with [`Error::ConfigConflict`] when the config fixes mutually
/// incompatible values; the generator never silently cross-wires them.
pub fn generate(
    config: &ProfileConfig,
    catalog: &EcosystemCatalog,
    rng: &mut Randomness,
) -> Result<Profile> {
    // 1+2. Platform and family. When the family is fixed and the platform is
    // derived, the platform draw is restricted to platforms that offer the
    // family; a conflict is only an error when both sides are explicit.
    let platform = match (config.platform, config.family) {
        (Preference::Fixed(p), Preference::Fixed(f)) => {
            let entry = catalog
                .entry(p)
                .ok_or_else(|| Error::config_conflict("platform", "catalog"))?;
            if !entry.allows(f) {
                return Err(Error::config_conflict("platform", "family"));
            }
            p
        }
        (Preference::Fixed(p), Preference::Derive) => {
            catalog
                .entry(p)
                .ok_or_else(|| Error::config_conflict("platform", "catalog"))?;
            p
        }
        (Preference::Derive, Preference::Fixed(f)) => {
            let candidates: Vec<OsPlatform> = catalog
                .platforms()
                .into_iter()
                .filter(|p| catalog.entry(*p).is_some_and(|e| e.allows(f)))
                .collect();
            if candidates.is_empty() {
                return Err(Error::config_conflict("family", "catalog"));
            }
            *rng.pick(&candidates)
        }
        (Preference::Derive, Preference::Derive) => *rng.pick(&catalog.platforms()),
    };
    let entry = catalog
        .entry(platform)
        .ok_or_else(|| Error::config_conflict("platform", "catalog"))?;

    let family = match config.family {
        Preference::Fixed(f) => f,
        Preference::Derive => *rng.pick(&entry.families),
    };

    // 3. Version: one draw; everything downstream derives from it.
    let range = catalog
        .version_range(family)
        .ok_or_else(|| Error::config_conflict("family", "catalog"))?;
    if let (Some(min), Some(max)) = (config.min_version, config.max_version) {
        if min > max {
            return Err(Error::config_conflict("min_version", "max_version"));
        }
    }
    let lo = config.min_version.map_or(range.min, |m| m.max(range.min));
    let hi = config.max_version.map_or(range.max, |m| m.min(range.max));
    if lo > hi {
        return Err(Error::config_conflict("family", "min_version"));
    }
    let major = rng.range_inclusive(lo, hi);

    let identity = Identity::new(platform, family, major);

    // 4. Hardware and language populations.
    let hardware_concurrency = match config.hardware_concurrency.fixed() {
        Some(v) => clamp_to_population(v, &entry.hardware_concurrency),
        None => *rng.pick(&entry.hardware_concurrency),
    };
    let device_memory = match config.device_memory.fixed() {
        Some(v) => clamp_to_population(v, &entry.device_memory),
        None => *rng.pick(&entry.device_memory),
    };
    let language = resolve_language(config, &entry.languages, rng);
    let subtag = language.split('-').next().unwrap_or(&language).to_string();
    let languages = if subtag == language {
        vec![language.clone()]
    } else {
        vec![language.clone(), subtag]
    };

    // 5+6. Derived strings from the one identity.
    let navigator = NavigatorProperties {
        platform: platform.navigator_platform().to_string(),
        user_agent: identity.user_agent(),
        app_version: identity.app_version(),
        vendor: family.vendor().to_string(),
        language,
        languages,
        hardware_concurrency,
        device_memory,
        max_touch_points: 0,
        cookie_enabled: true,
    };
    let client_hints = identity.client_hints();

    // 7. Screen geometry: the (width, height) pair is one atomic draw.
    let &(width, height) = rng.pick(catalog.resolutions());
    let device_pixel_ratio = *rng.pick(catalog.dpr_population(platform.device_class()));
    let inset = rng.range_inclusive(24, 48);
    let screen = ScreenProperties {
        width,
        height,
        avail_width: width,
        avail_height: height - inset,
        color_depth: 24,
        pixel_depth: 24,
        device_pixel_ratio,
    };

    // WebGL strings: one atomic (vendor, renderer) pair.
    let &(webgl_vendor, webgl_renderer) = rng.pick(&entry.webgl);
    let webgl = WebGlStrings {
        vendor: webgl_vendor.to_string(),
        renderer: webgl_renderer.to_string(),
    };

    // 8. Header rules derive from the fields above, never a fresh draw.
    let header_rules = derive_header_rules(&navigator, client_hints.as_ref());

    Ok(Profile {
        id: format!("p-{:016x}", rng.next_u64()),
        kind: ProfileKind::Session,
        created_at: Utc::now(),
        source_config: config.clone(),
        platform,
        family,
        version: major,
        navigator,
        client_hints,
        screen,
        webgl,
        header_rules,
    })
}
