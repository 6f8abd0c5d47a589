//! Core key types with platform-aware display.
//!
//! This module provides:
//! - `KeyEvent` - The host's raw key press (name + modifier flags + timestamp)
//! - `KeyCombination` - A canonical key (modifiers + main key)
//! - `Modifiers` - Modifier key flags (ctrl, alt, shift, meta)
//! - `normalize_key_event` - Raw event to canonical combination
//! - Platform-aware display (⌘⇧K on macOS, Ctrl+Shift+K on Windows/Linux)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Modifier keys for a combination.
///
/// `meta` is Command (⌘) on macOS and the Windows/Super key elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }
    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Default::default()
        }
    }
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.meta
    }
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Platform enum for display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "mac")]
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Platform::Linux
        }
    }
}

/// A raw key press as delivered by the host input layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
    /// Monotonic timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            key: key.into(),
            timestamp_ms,
            ..Default::default()
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.ctrl = modifiers.ctrl;
        self.alt = modifiers.alt;
        self.shift = modifiers.shift;
        self.meta = modifiers.meta;
        self
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
            meta: self.meta,
        }
    }
}

/// A canonical key: lower-case main key plus modifier flags.
///
/// The key is never itself a modifier name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombination {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyCombination {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: canonicalize_key(&key.into()),
            modifiers,
        }
    }

    /// An unmodified key.
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::default())
    }

    /// Single unmodified ASCII digit, if this is one.
    pub fn digit(&self) -> Option<char> {
        if self.modifiers.any() {
            return None;
        }
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => Some(c),
            _ => None,
        }
    }

    pub fn is_decimal_point(&self) -> bool {
        self.modifiers.none() && self.key == "."
    }

    /// True for the unmodified named key (`enter`, `escape`, ...).
    pub fn is_plain(&self, key: &str) -> bool {
        self.modifiers.none() && self.key == key
    }

    pub fn display(&self) -> String {
        self.display_for_platform(Platform::current())
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        match platform {
            Platform::MacOS => self.display_macos(),
            Platform::Windows | Platform::Linux => self.display_other(),
        }
    }

    fn display_macos(&self) -> String {
        let mut s = String::new();
        if self.modifiers.ctrl {
            s.push('⌃');
        }
        if self.modifiers.alt {
            s.push('⌥');
        }
        if self.modifiers.shift {
            s.push('⇧');
        }
        if self.modifiers.meta {
            s.push('⌘');
        }
        s.push_str(&self.key_display());
        s
    }

    fn display_other(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.alt {
            parts.push("Alt".to_string());
        }
        if self.modifiers.shift {
            parts.push("Shift".to_string());
        }
        if self.modifiers.meta {
            parts.push("Meta".to_string());
        }
        parts.push(self.key_display_text());
        parts.join("+")
    }

    fn key_display(&self) -> String {
        match self.key.as_str() {
            "enter" => "↵",
            "escape" => "⎋",
            "tab" => "⇥",
            "space" => "␣",
            "backspace" => "⌫",
            "delete" => "⌦",
            "up" => "↑",
            "down" => "↓",
            "left" => "←",
            "right" => "→",
            "home" => "↖",
            "end" => "↘",
            "pageup" => "⇞",
            "pagedown" => "⇟",
            "plus" => "+",
            "backslash" => "\\",
            k => return k.to_uppercase(),
        }
        .to_string()
    }

    fn key_display_text(&self) -> String {
        match self.key.as_str() {
            "enter" => "Enter",
            "escape" => "Esc",
            "tab" => "Tab",
            "space" => "Space",
            "backspace" => "Backspace",
            "delete" => "Delete",
            "up" => "Up",
            "down" => "Down",
            "left" => "Left",
            "right" => "Right",
            "home" => "Home",
            "end" => "End",
            "pageup" => "PageUp",
            "pagedown" => "PageDown",
            "plus" => "Plus",
            "backslash" => "\\",
            k => return k.to_uppercase(),
        }
        .to_string()
    }

    /// Modifier-order-normalized id, e.g. `ctrl+shift+k`.
    pub fn to_canonical_string(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.modifiers.ctrl {
            parts.push("ctrl");
        }
        if self.modifiers.alt {
            parts.push("alt");
        }
        if self.modifiers.shift {
            parts.push("shift");
        }
        if self.modifiers.meta {
            parts.push("meta");
        }
        parts.push(&self.key);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Returns true if `key` names a modifier rather than a main key.
pub fn is_modifier_key(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "shift"
            | "control"
            | "ctrl"
            | "alt"
            | "altgraph"
            | "option"
            | "meta"
            | "os"
            | "super"
            | "hyper"
            | "cmd"
            | "command"
            | "capslock"
            | "fn"
    )
}

/// Canonicalize a raw key event into a `KeyCombination`.
///
/// Returns `None` for modifier-only presses so that tapping Shift never
/// advances a sequence.
pub fn normalize_key_event(event: &KeyEvent) -> Option<KeyCombination> {
    if event.key.is_empty() || is_modifier_key(&event.key) {
        return None;
    }

    let mut modifiers = event.modifiers();
    apply_implied_shift(&event.key, &mut modifiers);

    Some(KeyCombination {
        key: canonicalize_key(&event.key),
        modifiers,
    })
}

/// Fold the Shift state a single printed character already carries.
///
/// An upper-case letter implies Shift. Printable non-letters (`?`, `!`, `1`)
/// are the shifted or unshifted character itself, so Shift is dropped.
/// Key capture and pattern parsing both go through this.
pub(crate) fn apply_implied_shift(raw_key: &str, modifiers: &mut Modifiers) {
    let mut chars = raw_key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_alphabetic() {
            if c.is_uppercase() {
                modifiers.shift = true;
            }
        } else if !c.is_whitespace() && c != '+' && c != '\\' {
            modifiers.shift = false;
        }
    }
}

/// Canonicalize a key name to the internal standard form.
///
/// Printable characters map to themselves, except the three that clash with
/// pattern syntax: space, `+` and `\`.
pub fn canonicalize_key(key: &str) -> String {
    if key == " " {
        return "space".to_string();
    }
    let key_lower = key.to_lowercase();
    match key_lower.as_str() {
        "arrowup" | "uparrow" => "up",
        "arrowdown" | "downarrow" => "down",
        "arrowleft" | "leftarrow" => "left",
        "arrowright" | "rightarrow" => "right",
        "return" => "enter",
        "esc" => "escape",
        "back" => "backspace",
        "del" => "delete",
        "spacebar" => "space",
        "+" => "plus",
        "\\" => "backslash",
        "period" | "dot" | "decimal" => ".",
        "slash" | "forwardslash" => "/",
        "comma" => ",",
        "semicolon" => ";",
        "minus" | "dash" | "hyphen" => "-",
        "equal" | "equals" => "=",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        _ => return key_lower,
    }
    .to_string()
}

/// Check if a canonical key name is known/valid.
///
/// Any single printable character is a key; multi-character names must be in
/// the named-key table.
pub fn is_known_key(key: &str) -> bool {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return !c.is_whitespace() && !c.is_control() && c != '+' && c != '\\';
    }
    if let Some(n) = key.strip_prefix('f') {
        if let Ok(n) = n.parse::<u8>() {
            return (1..=24).contains(&n);
        }
    }
    matches!(
        key,
        "space"
            | "enter"
            | "tab"
            | "escape"
            | "backspace"
            | "delete"
            | "insert"
            | "up"
            | "down"
            | "left"
            | "right"
            | "home"
            | "end"
            | "pageup"
            | "pagedown"
            | "plus"
            | "backslash"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(key: &str, modifiers: Modifiers) -> KeyEvent {
        KeyEvent::new(key, 0).with_modifiers(modifiers)
    }

    #[test]
    fn modifier_only_press_yields_nothing() {
        assert!(normalize_key_event(&event("Shift", Modifiers::shift())).is_none());
        assert!(normalize_key_event(&event("Control", Modifiers::ctrl())).is_none());
        assert!(normalize_key_event(&event("Meta", Modifiers::meta())).is_none());
    }

    #[test]
    fn named_keys_are_canonical() {
        let cases = [
            ("Enter", "enter"),
            ("Escape", "escape"),
            ("ArrowUp", "up"),
            ("Tab", "tab"),
            ("Backspace", "backspace"),
            (" ", "space"),
        ];
        for (raw, canonical) in cases {
            let combo = normalize_key_event(&event(raw, Modifiers::default())).unwrap();
            assert_eq!(combo.key, canonical, "raw key {raw}");
        }
    }

    #[test]
    fn question_mark_is_its_own_key() {
        let combo = normalize_key_event(&event("?", Modifiers::shift())).unwrap();
        assert_eq!(combo.key, "?");
        assert!(combo.modifiers.none());
        assert_eq!(combo.to_canonical_string(), "?");
    }

    #[test]
    fn uppercase_letter_implies_shift() {
        let combo = normalize_key_event(&event("K", Modifiers::default())).unwrap();
        assert_eq!(combo.to_canonical_string(), "shift+k");
    }

    #[test]
    fn modifier_press_order_does_not_matter() {
        // The host reports flags, not order, but different event shapes for the
        // same physical chord must land on one id.
        let a = normalize_key_event(&event(
            "k",
            Modifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        ));
        let b = normalize_key_event(&event("K", Modifiers::ctrl()));
        assert_eq!(a, b);
        assert_eq!(a.unwrap().to_canonical_string(), "ctrl+shift+k");
    }

    #[test]
    fn display_macos_uses_glyphs_in_fixed_order() {
        let combo = KeyCombination::new(
            "k",
            Modifiers { meta: true, shift: true, ctrl: true, alt: true },
        );
        assert_eq!(combo.display_for_platform(Platform::MacOS), "⌃⌥⇧⌘K");
    }

    #[test]
    fn display_other_uses_text() {
        let combo = KeyCombination::new(
            "k",
            Modifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        );
        assert_eq!(combo.display_for_platform(Platform::Linux), "Ctrl+Shift+K");
        assert_eq!(KeyCombination::plain("escape").display_for_platform(Platform::Windows), "Esc");
    }

    #[test]
    fn digits_and_decimal_point() {
        assert_eq!(KeyCombination::plain("7").digit(), Some('7'));
        assert_eq!(KeyCombination::new("7", Modifiers::ctrl()).digit(), None);
        assert!(KeyCombination::plain("period").is_decimal_point());
        assert!(KeyCombination::plain(".").is_decimal_point());
    }

    #[test]
    fn known_keys() {
        assert!(is_known_key("a"));
        assert!(is_known_key("?"));
        assert!(is_known_key("f12"));
        assert!(is_known_key("pagedown"));
        assert!(!is_known_key("f25"));
        assert!(!is_known_key("banana"));
        assert!(!is_known_key("\\"));
    }
}
