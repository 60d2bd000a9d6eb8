//! Ecosystem correlation catalog.
//!
//! Static tables describing which browser families, version ranges, hardware
//! populations and screen geometries actually co-occur in the wild. The
//! generator only ever draws from these populations, so a generated profile
//! can never combine values no real device ships with.

use serde::{Deserialize, Serialize};

/// Operating-system platform of a spoofed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsPlatform {
    Windows,
    MacOs,
    Linux,
}

impl OsPlatform {
    /// Client-hint platform name (`Sec-CH-UA-Platform` value, unquoted).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
        }
    }

    /// OS token embedded in user-agent strings for Chromium-based families.
    pub fn ua_token(&self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10_15_7",
            Self::Linux => "X11; Linux x86_64",
        }
    }

    /// OS token embedded in Firefox user-agent strings.
    pub fn ua_token_gecko(&self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10.15",
            Self::Linux => "X11; Linux x86_64",
        }
    }

    /// `navigator.platform` value.
    pub fn navigator_platform(&self) -> &'static str {
        match self {
            Self::Windows => "Win32",
            Self::MacOs => "MacIntel",
            Self::Linux => "Linux x86_64",
        }
    }

    /// Client-hint `platformVersion` value.
    pub fn platform_version(&self) -> &'static str {
        match self {
            Self::Windows => "10.0.0",
            Self::MacOs => "13.2.1",
            Self::Linux => "6.5.0",
        }
    }

    /// Pixel-density class of typical hardware for this platform.
    pub fn device_class(&self) -> DeviceClass {
        match self {
            Self::MacOs => DeviceClass::HighDensity,
            _ => DeviceClass::Standard,
        }
    }

    /// Recover the platform from the OS token inside a user-agent string.
    pub fn parse_user_agent(ua: &str) -> Option<Self> {
        if ua.contains("Windows NT") {
            Some(Self::Windows)
        } else if ua.contains("Mac OS X") {
            Some(Self::MacOs)
        } else if ua.contains("Linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }
}

/// Browser family of a spoofed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

impl BrowserFamily {
    /// Primary brand name as it appears in `Sec-CH-UA`.
    pub fn brand_name(&self) -> &'static str {
        match self {
            Self::Chrome => "Google Chrome",
            Self::Edge => "Microsoft Edge",
            Self::Firefox => "Firefox",
            Self::Safari => "Safari",
        }
    }

    /// Whether this family ships the UA client-hint surface at all.
    ///
    /// Families without support omit the hint structure and headers entirely
    /// rather than emitting contradictory ones.
    pub fn supports_client_hints(&self) -> bool {
        matches!(self, Self::Chrome | Self::Edge)
    }

    /// `navigator.vendor` value.
    pub fn vendor(&self) -> &'static str {
        match self {
            Self::Chrome | Self::Edge => "Google Inc.",
            Self::Firefox => "",
            Self::Safari => "Apple Computer, Inc.",
        }
    }

    /// Recover the family from its token in a user-agent string.
    ///
    /// Edge must be checked before Chrome: Edge UAs carry both tokens.
    pub fn parse_user_agent(ua: &str) -> Option<Self> {
        if ua.contains("Edg/") {
            Some(Self::Edge)
        } else if ua.contains("Chrome/") {
            Some(Self::Chrome)
        } else if ua.contains("Firefox/") {
            Some(Self::Firefox)
        } else if ua.contains("Version/") && ua.contains("Safari/") {
            Some(Self::Safari)
        } else {
            None
        }
    }

    /// Map a `Sec-CH-UA` brand name back to a family.
    pub fn from_brand_name(name: &str) -> Option<Self> {
        match name {
            "Google Chrome" => Some(Self::Chrome),
            "Microsoft Edge" => Some(Self::Edge),
            "Firefox" => Some(Self::Firefox),
            "Safari" => Some(Self::Safari),
            _ => None,
        }
    }
}

/// Pixel-density class used to key the devicePixelRatio population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Standard,
    HighDensity,
}

/// Inclusive major-version range for a browser family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub min: u32,
    pub max: u32,
}

impl VersionRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, major: u32) -> bool {
        (self.min..=self.max).contains(&major)
    }
}

/// Catalog row for one OS platform.
#[derive(Debug, Clone)]
pub struct PlatformEntry {
    pub platform: OsPlatform,
    /// Families actually offered on this platform.
    pub families: Vec<BrowserFamily>,
    /// Observed `navigator.hardwareConcurrency` population.
    pub hardware_concurrency: Vec<u32>,
    /// Observed `navigator.deviceMemory` population (GiB).
    pub device_memory: Vec<u32>,
    /// Plausible primary languages.
    pub languages: Vec<&'static str>,
    /// Atomic (vendor, renderer) WebGL string pairs seen on this platform.
    pub webgl: Vec<(&'static str, &'static str)>,
}

impl PlatformEntry {
    pub fn allows(&self, family: BrowserFamily) -> bool {
        self.families.contains(&family)
    }
}

/// The full correlation catalog. Read-only, built once.
#[derive(Debug, Clone)]
pub struct EcosystemCatalog {
    entries: Vec<PlatformEntry>,
    versions: Vec<(BrowserFamily, VersionRange)>,
    /// Atomic (width, height) resolution population.
    resolutions: Vec<(u32, u32)>,
    dpr_standard: Vec<f64>,
    dpr_high_density: Vec<f64>,
}

impl EcosystemCatalog {
    /// Built-in catalog reflecting late-2025 desktop populations.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                PlatformEntry {
                    platform: OsPlatform::Windows,
                    families: vec![
                        BrowserFamily::Chrome,
                        BrowserFamily::Edge,
                        BrowserFamily::Firefox,
                    ],
                    hardware_concurrency: vec![4, 6, 8, 12, 16],
                    device_memory: vec![4, 8],
                    languages: vec!["en-US", "en-GB", "de-DE", "fr-FR", "es-ES"],
                    webgl: vec![
                        (
                            "Google Inc. (Intel)",
                            "ANGLE (Intel, Intel(R) UHD Graphics 630 Direct3D11 vs_5_0 ps_5_0, D3D11)",
                        ),
                        (
                            "Google Inc. (NVIDIA)",
                            "ANGLE (NVIDIA, NVIDIA GeForce GTX 1660 Direct3D11 vs_5_0 ps_5_0, D3D11)",
                        ),
                        (
                            "Google Inc. (AMD)",
                            "ANGLE (AMD, AMD Radeon RX 580 Direct3D11 vs_5_0 ps_5_0, D3D11)",
                        ),
                    ],
                },
                PlatformEntry {
                    platform: OsPlatform::MacOs,
                    families: vec![
                        BrowserFamily::Chrome,
                        BrowserFamily::Edge,
                        BrowserFamily::Firefox,
                        BrowserFamily::Safari,
                    ],
                    hardware_concurrency: vec![8, 10, 12],
                    device_memory: vec![8],
                    languages: vec!["en-US", "en-GB", "fr-FR"],
                    webgl: vec![
                        (
                            "Google Inc. (Apple)",
                            "ANGLE (Apple, Apple M2, OpenGL 4.1)",
                        ),
                        ("Apple Inc.", "Apple GPU"),
                    ],
                },
                PlatformEntry {
                    platform: OsPlatform::Linux,
                    families: vec![BrowserFamily::Chrome, BrowserFamily::Firefox],
                    hardware_concurrency: vec![4, 8, 16],
                    device_memory: vec![4, 8],
                    languages: vec!["en-US", "de-DE"],
                    webgl: vec![
                        (
                            "Google Inc. (Intel)",
                            "ANGLE (Intel, Mesa Intel(R) UHD Graphics 630, OpenGL 4.6)",
                        ),
                        (
                            "Google Inc. (NVIDIA)",
                            "ANGLE (NVIDIA Corporation, NVIDIA GeForce GTX 1660/PCIe/SSE2, OpenGL 4.6)",
                        ),
                    ],
                },
            ],
            versions: vec![
                (BrowserFamily::Chrome, VersionRange::new(118, 131)),
                (BrowserFamily::Edge, VersionRange::new(118, 131)),
                (BrowserFamily::Firefox, VersionRange::new(115, 133)),
                (BrowserFamily::Safari, VersionRange::new(16, 17)),
            ],
            resolutions: vec![
                (1920, 1080),
                (1366, 768),
                (1536, 864),
                (1440, 900),
                (2560, 1440),
                (3840, 2160),
            ],
            dpr_standard: vec![1.0, 1.25, 1.5],
            dpr_high_density: vec![2.0],
        }
    }

    /// All platforms the catalog knows about.
    pub fn platforms(&self) -> Vec<OsPlatform> {
        self.entries.iter().map(|e| e.platform).collect()
    }

    /// Catalog row for a platform.
    pub fn entry(&self, platform: OsPlatform) -> Option<&PlatformEntry> {
        self.entries.iter().find(|e| e.platform == platform)
    }

    /// Allowed major-version range for a family.
    pub fn version_range(&self, family: BrowserFamily) -> Option<VersionRange> {
        self.versions
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, r)| *r)
    }

    /// Atomic (width, height) resolution population.
    pub fn resolutions(&self) -> &[(u32, u32)] {
        &self.resolutions
    }

    /// devicePixelRatio population for a density class.
    pub fn dpr_population(&self, class: DeviceClass) -> &[f64] {
        match class {
            DeviceClass::Standard => &self.dpr_standard,
            DeviceClass::HighDensity => &self.dpr_high_density,
        }
    }
}

impl Default for EcosystemCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
