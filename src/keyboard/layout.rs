//! Keyboard layout detection and definitions
//!
//! Names the supported logical layouts, resolves a layout from its name
//! (or from the system when asked for `auto`), and exposes the physical
//! letter rows each layout places on the keyboard.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while resolving a layout or looking up typos in it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout name is not one we have a table for
    #[error("unknown keyboard layout '{0}' (expected one of: qwerty, qwertz, azerty, dvorak, colemak, auto)")]
    UnknownLayout(String),
    /// The character has no neighbours in the active layout
    #[error("no typo mapping for character '{0}'")]
    NoMapping(char),
}

/// Logical keyboard layout variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardLayout {
    /// US/UK QWERTY (default)
    #[default]
    Qwerty,
    /// German and central European QWERTZ
    Qwertz,
    /// French and Belgian AZERTY
    Azerty,
    /// Dvorak simplified keyboard
    Dvorak,
    /// Colemak
    Colemak,
}

/// Horizontal offset of each letter row, in key widths, relative to the top row.
pub const ROW_STAGGER: [f32; 3] = [0.0, 0.25, 0.75];

impl KeyboardLayout {
    /// All supported layouts
    pub fn all() -> &'static [KeyboardLayout] {
        &[
            Self::Qwerty,
            Self::Qwertz,
            Self::Azerty,
            Self::Dvorak,
            Self::Colemak,
        ]
    }

    /// Resolve a layout from its name.
    ///
    /// Accepts any of the layout names case-insensitively, plus `auto`
    /// which detects the layout configured on this machine.
    pub fn from_name(name: &str) -> Result<Self, LayoutError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "qwerty" => Ok(Self::Qwerty),
            "qwertz" => Ok(Self::Qwertz),
            "azerty" => Ok(Self::Azerty),
            "dvorak" => Ok(Self::Dvorak),
            "colemak" => Ok(Self::Colemak),
            "auto" => Ok(Self::detect()),
            _ => Err(LayoutError::UnknownLayout(name.to_string())),
        }
    }

    /// Detect the keyboard layout from the system.
    ///
    /// On Linux: queries `setxkbmap`, reads `/etc/default/keyboard`, then
    /// asks `localectl`. Falls back to QWERTY if detection fails.
    pub fn detect() -> Self {
        #[cfg(target_os = "linux")]
        {
            detect_linux_layout()
        }
        #[cfg(not(target_os = "linux"))]
        {
            Self::Qwerty
        }
    }

    /// Lowercase name, as accepted by [`KeyboardLayout::from_name`]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qwerty => "qwerty",
            Self::Qwertz => "qwertz",
            Self::Azerty => "azerty",
            Self::Dvorak => "dvorak",
            Self::Colemak => "colemak",
        }
    }

    /// The three letter rows (top, home, bottom), left to right.
    ///
    /// Punctuation keys are kept so that letters sit at their physical
    /// column; they never become typo candidates.
    pub fn rows(&self) -> [&'static str; 3] {
        match self {
            Self::Qwerty => ["qwertyuiop", "asdfghjkl;", "zxcvbnm,./"],
            Self::Qwertz => ["qwertzuiop", "asdfghjkl", "yxcvbnm,.-"],
            Self::Azerty => ["azertyuiop", "qsdfghjklm", "wxcvbn,;:!"],
            Self::Dvorak => ["',.pyfgcrl", "aoeuidhtns", ";qjkxbmwvz"],
            Self::Colemak => ["qwfpgjluy;", "arstdhneio", "zxcvbkm,./"],
        }
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map an xkb layout code plus variant to one of our layouts
fn classify(layout: &str, variant: &str) -> KeyboardLayout {
    if variant.contains("dvorak") || layout == "dvorak" {
        return KeyboardLayout::Dvorak;
    }
    if variant.contains("colemak") {
        return KeyboardLayout::Colemak;
    }

    const QWERTZ_LAYOUTS: &[&str] = &["de", "at", "ch", "cz", "sk", "hu", "si", "hr"];
    const AZERTY_LAYOUTS: &[&str] = &["fr", "be"];

    if QWERTZ_LAYOUTS.contains(&layout) {
        KeyboardLayout::Qwertz
    } else if AZERTY_LAYOUTS.contains(&layout) {
        KeyboardLayout::Azerty
    } else {
        KeyboardLayout::Qwerty
    }
}

/// First entry of a possibly comma-separated xkb list
fn first_entry(value: &str) -> &str {
    value.split(',').next().unwrap_or(value).trim()
}

#[cfg(target_os = "linux")]
fn detect_linux_layout() -> KeyboardLayout {
    if let Ok(output) = std::process::Command::new("setxkbmap")
        .args(["-query"])
        .output()
    {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return parse_xkb_query(&stdout);
        }
    }

    if let Ok(contents) = std::fs::read_to_string("/etc/default/keyboard") {
        return parse_keyboard_config(&contents);
    }

    if let Ok(output) = std::process::Command::new("localectl")
        .args(["status"])
        .output()
    {
        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            return parse_localectl(&stdout);
        }
    }

    log::debug!("keyboard layout detection failed, using qwerty");
    KeyboardLayout::Qwerty
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_xkb_query(output: &str) -> KeyboardLayout {
    // Format: "model:      pc105\nlayout:     gb\nvariant:    ..."
    let mut layout = "";
    let mut variant = "";

    for line in output.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("layout:") {
            layout = first_entry(value);
        } else if let Some(value) = line.strip_prefix("variant:") {
            variant = first_entry(value);
        }
    }

    classify(layout, variant)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_keyboard_config(contents: &str) -> KeyboardLayout {
    // Format: XKBLAYOUT="de"
    let mut layout = "";
    let mut variant = "";

    for line in contents.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("XKBLAYOUT=") {
            layout = first_entry(value.trim_matches('"'));
        } else if let Some(value) = line.strip_prefix("XKBVARIANT=") {
            variant = first_entry(value.trim_matches('"'));
        }
    }

    classify(layout, variant)
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_localectl(output: &str) -> KeyboardLayout {
    // Format: "X11 Layout: de"
    let mut layout = "";
    let mut variant = "";

    for line in output.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("X11 Layout:") {
            layout = first_entry(value);
        } else if let Some(value) = line.strip_prefix("X11 Variant:") {
            variant = first_entry(value);
        }
    }

    classify(layout, variant)
}
