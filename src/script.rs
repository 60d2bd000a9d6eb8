//! Page-world spoofing script rendering.
//!
//! Turns a [`Profile`] into the script source handed to the Injector. The
//! script only ever reads values already resolved on the profile, so the
//! script surface cannot drift from the header surface.

use serde_json::json;

use crate::profile::Profile;

/// Quote a Rust string as a JS string literal.
fn js(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// Render the page-world spoofing script for a profile.
///
/// The script is an IIFE that overrides navigator/screen getters, replaces
/// `navigator.userAgentData` (or deletes it for families without client-hint
/// support), and patches the WebGL debug-renderer-info strings.
pub fn render_spoof_script(profile: &Profile) -> String {
    let nav = &profile.navigator;
    let screen = &profile.screen;

    let languages = json!(nav.languages).to_string();

    let ua_data = match &profile.client_hints {
        Some(ch) => {
            let brands = json!(ch
                .brands
                .iter()
                .map(|b| json!({ "brand": b.name, "version": b.version }))
                .collect::<Vec<_>>())
            .to_string();
            let full_versions = json!(ch
                .full_version_list
                .iter()
                .map(|b| json!({ "brand": b.name, "version": b.version }))
                .collect::<Vec<_>>())
            .to_string();
            format!(
                r#"define(Navigator.prototype, 'userAgentData', {{
        brands: {brands},
        mobile: {mobile},
        platform: {platform},
        getHighEntropyValues: function(hints) {{
            return Promise.resolve({{
                brands: {brands},
                mobile: {mobile},
                platform: {platform},
                platformVersion: {platform_version},
                architecture: {architecture},
                bitness: {bitness},
                wow64: {wow64},
                uaFullVersion: {ua_full_version},
                fullVersionList: {full_versions}
            }});
        }},
        toJSON: function() {{
            return {{ brands: {brands}, mobile: {mobile}, platform: {platform} }};
        }}
    }});"#,
                mobile = ch.mobile,
                platform = js(&ch.platform),
                platform_version = js(&ch.platform_version),
                architecture = js(&ch.architecture),
                bitness = js(&ch.bitness),
                wow64 = ch.wow64,
                ua_full_version = js(&ch.ua_full_version),
            )
        }
        // Gecko/WebKit identities have no userAgentData at all.
        None => "define(Navigator.prototype, 'userAgentData', undefined);".to_string(),
    };

    format!(
        r#"(function() {{
    'use strict';
    const define = function(target, prop, value) {{
        try {{
            Object.defineProperty(target, prop, {{
                get: function() {{ return value; }},
                configurable: true
            }});
        }} catch (e) {{}}
    }};

    define(Navigator.prototype, 'platform', {platform});
    define(Navigator.prototype, 'userAgent', {user_agent});
    define(Navigator.prototype, 'appVersion', {app_version});
    define(Navigator.prototype, 'vendor', {vendor});
    define(Navigator.prototype, 'language', {language});
    define(Navigator.prototype, 'languages', Object.freeze({languages}));
    define(Navigator.prototype, 'hardwareConcurrency', {hardware_concurrency});
    define(Navigator.prototype, 'deviceMemory', {device_memory});
    define(Navigator.prototype, 'maxTouchPoints', {max_touch_points});
    define(Navigator.prototype, 'cookieEnabled', {cookie_enabled});
    {ua_data}

    define(Screen.prototype, 'width', {width});
    define(Screen.prototype, 'height', {height});
    define(Screen.prototype, 'availWidth', {avail_width});
    define(Screen.prototype, 'availHeight', {avail_height});
    define(Screen.prototype, 'colorDepth', {color_depth});
    define(Screen.prototype, 'pixelDepth', {pixel_depth});
    define(window, 'devicePixelRatio', {device_pixel_ratio});

    const patchWebgl = function(proto) {{
        if (!proto) return;
        const original = proto.getParameter;
        proto.getParameter = function(parameter) {{
            // 37445 = UNMASKED_VENDOR_WEBGL, 37446 = UNMASKED_RENDERER_WEBGL
            if (parameter === 37445) return {webgl_vendor};
            if (parameter === 37446) return {webgl_renderer};
            return original.apply(this, arguments);
        }};
    }};
    patchWebgl(typeof WebGLRenderingContext !== 'undefined' ? WebGLRenderingContext.prototype : null);
    patchWebgl(typeof WebGL2RenderingContext !== 'undefined' ? WebGL2RenderingContext.prototype : null);
}})();"#,
        platform = js(&nav.platform),
        user_agent = js(&nav.user_agent),
        app_version = js(&nav.app_version),
        vendor = js(&nav.vendor),
        language = js(&nav.language),
        languages = languages,
        hardware_concurrency = nav.hardware_concurrency,
        device_memory = nav.device_memory,
        max_touch_points = nav.max_touch_points,
        cookie_enabled = nav.cookie_enabled,
        ua_data = ua_data,
        width = screen.width,
        height = screen.height,
        avail_width = screen.avail_width,
        avail_height = screen.avail_height,
        color_depth = screen.color_depth,
        pixel_depth = screen.pixel_depth,
        device_pixel_ratio = screen.device_pixel_ratio,
        webgl_vendor = js(&profile.webgl.vendor),
        webgl_renderer = js(&profile.webgl.renderer),
    )
}
