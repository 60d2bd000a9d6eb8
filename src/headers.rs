//! Header-rule derivation.
//!
//! The header surface is derived strictly from the already-resolved script
//! fields, never from a fresh random draw, so header/script parity holds by
//! construction.

use http::header::{ACCEPT_LANGUAGE, USER_AGENT};

use crate::profile::{Brand, ClientHints, HeaderRule, NavigatorProperties};

/// Stable rule ids, reused across transitions so the engine can replace the
/// whole set atomically.
pub const RULE_USER_AGENT: u32 = 1;
pub const RULE_SEC_CH_UA: u32 = 2;
pub const RULE_SEC_CH_UA_MOBILE: u32 = 3;
pub const RULE_SEC_CH_UA_PLATFORM: u32 = 4;
pub const RULE_ACCEPT_LANGUAGE: u32 = 5;

pub const SEC_CH_UA: &str = "Sec-CH-UA";
pub const SEC_CH_UA_MOBILE: &str = "Sec-CH-UA-Mobile";
pub const SEC_CH_UA_PLATFORM: &str = "Sec-CH-UA-Platform";

/// Render a brand list in `Sec-CH-UA` wire format:
/// `"Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24"`.
pub fn format_sec_ch_ua(brands: &[Brand]) -> String {
    brands
        .iter()
        .map(|b| format!("\"{}\";v=\"{}\"", b.name, b.version))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an `Accept-Language` value from the languages list:
/// `en-US,en;q=0.9`.
pub fn format_accept_language(languages: &[String]) -> String {
    languages
        .iter()
        .enumerate()
        .map(|(i, lang)| {
            if i == 0 {
                lang.clone()
            } else {
                // q decreases in 0.1 steps, floored at 0.1
                let q = (10 - i.min(9)) as f64 / 10.0;
                format!("{lang};q={q:.1}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Derive the ordered header rule set for a resolved identity.
///
/// Families without client-hint support get *remove* rules for the Sec-CH-UA
/// headers rather than set rules, so the real browser's own hints can never
/// leak through and contradict the spoofed user-agent.
pub fn derive_header_rules(
    navigator: &NavigatorProperties,
    hints: Option<&ClientHints>,
) -> Vec<HeaderRule> {
    let mut rules = vec![HeaderRule::set(
        RULE_USER_AGENT,
        USER_AGENT.as_str(),
        navigator.user_agent.clone(),
    )];

    match hints {
        Some(ch) => {
            rules.push(HeaderRule::set(
                RULE_SEC_CH_UA,
                SEC_CH_UA,
                format_sec_ch_ua(&ch.brands),
            ));
            rules.push(HeaderRule::set(
                RULE_SEC_CH_UA_MOBILE,
                SEC_CH_UA_MOBILE,
                if ch.mobile { "?1" } else { "?0" },
            ));
            rules.push(HeaderRule::set(
                RULE_SEC_CH_UA_PLATFORM,
                SEC_CH_UA_PLATFORM,
                format!("\"{}\"", ch.platform),
            ));
        }
        None => {
            rules.push(HeaderRule::remove(RULE_SEC_CH_UA, SEC_CH_UA));
            rules.push(HeaderRule::remove(RULE_SEC_CH_UA_MOBILE, SEC_CH_UA_MOBILE));
            rules.push(HeaderRule::remove(
                RULE_SEC_CH_UA_PLATFORM,
                SEC_CH_UA_PLATFORM,
            ));
        }
    }

    rules.push(HeaderRule::set(
        RULE_ACCEPT_LANGUAGE,
        ACCEPT_LANGUAGE.as_str(),
        format_accept_language(&navigator.languages),
    ));

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str, version: &str) -> Brand {
        Brand {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn test_sec_ch_ua_wire_format() {
        let brands = vec![
            brand("Chromium", "131"),
            brand("Google Chrome", "131"),
            brand("Not_A Brand", "24"),
        ];
        assert_eq!(
            format_sec_ch_ua(&brands),
            r#""Chromium";v="131", "Google Chrome";v="131", "Not_A Brand";v="24""#
        );
    }

    #[test]
    fn test_accept_language_q_values() {
        let langs = vec!["en-US".to_string(), "en".to_string()];
        assert_eq!(format_accept_language(&langs), "en-US,en;q=0.9");
    }
}
