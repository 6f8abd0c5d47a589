//! Hotkey pattern strings and their parsed token sequences.
//!
//! A pattern string is a whitespace-separated list of steps. Each step is
//! either a key combination (`ctrl+shift+k`, `g`, `?`) or a placeholder:
//!
//! - `\d+` - one or more digit keys, captured as an integer
//! - `\f`  - digits with at most one `.`, captured as a float
//!
//! Placeholders are only recognized as whole steps. A literal backslash key is
//! spelled `backslash`, so no literal key can be mistaken for placeholder
//! syntax and `Pattern::parse(&p.format().id) == p` holds for every pattern.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use super::types::{
    apply_implied_shift, canonicalize_key, is_known_key, KeyCombination, Modifiers, Platform,
};

/// Source syntax for a digit-run placeholder.
pub const DIGIT_RUN_SYNTAX: &str = "\\d+";
/// Source syntax for a float placeholder.
pub const FLOAT_SYNTAX: &str = "\\f";

/// Errors that can occur when parsing a pattern string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternParseError {
    #[error("pattern string is empty")]
    Empty,
    #[error("step '{0}' has no key, only modifiers")]
    MissingKey(String),
    #[error("empty segment in step '{0}'")]
    EmptySegment(String),
    #[error("unknown modifier '{modifier}' in step '{step}'")]
    UnknownModifier { step: String, modifier: String },
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("unknown placeholder '{0}' (expected \\d+ or \\f)")]
    InvalidPlaceholder(String),
    #[error("placeholder '{0}' cannot carry modifiers")]
    ModifiedPlaceholder(String),
    #[error("placeholders cannot follow each other directly in '{0}'")]
    AdjacentPlaceholders(String),
}

/// The kind of value a placeholder captures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    DigitRun,
    Float,
}

impl PlaceholderKind {
    pub fn syntax(&self) -> &'static str {
        match self {
            Self::DigitRun => DIGIT_RUN_SYNTAX,
            Self::Float => FLOAT_SYNTAX,
        }
    }

    /// Human glyph shown in place of the placeholder.
    pub fn display(&self) -> &'static str {
        match self {
            Self::DigitRun => "[##]",
            Self::Float => "[#.#]",
        }
    }
}

/// One step of a pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(KeyCombination),
    Placeholder(PlaceholderKind),
}

impl Token {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    pub fn id(&self) -> String {
        match self {
            Self::Literal(combo) => combo.to_canonical_string(),
            Self::Placeholder(kind) => kind.syntax().to_string(),
        }
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        match self {
            Self::Literal(combo) => combo.display_for_platform(platform),
            Self::Placeholder(kind) => kind.display().to_string(),
        }
    }
}

/// Both renderings of a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternFormat {
    /// Platform-aware, for people.
    pub display: String,
    /// Canonical, parseable id.
    pub id: String,
}

/// A parsed hotkey binding: an ordered sequence of tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    tokens: SmallVec<[Token; 4]>,
}

impl Pattern {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, PatternParseError> {
        let steps: Vec<&str> = s.split_whitespace().collect();
        if steps.is_empty() {
            return Err(PatternParseError::Empty);
        }

        let mut tokens: SmallVec<[Token; 4]> = SmallVec::new();
        for step in steps {
            let token = parse_step(step)?;
            if token.is_placeholder() && tokens.last().is_some_and(Token::is_placeholder) {
                return Err(PatternParseError::AdjacentPlaceholders(s.trim().to_string()));
            }
            tokens.push(token);
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn has_placeholder(&self) -> bool {
        self.tokens.iter().any(Token::is_placeholder)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = PlaceholderKind> + '_ {
        self.tokens.iter().filter_map(|t| match t {
            Token::Placeholder(kind) => Some(*kind),
            Token::Literal(_) => None,
        })
    }

    /// True if `self` is a strict, token-by-token prefix of `other`.
    pub fn is_strict_prefix_of(&self, other: &Pattern) -> bool {
        self.len() < other.len() && other.tokens.starts_with(&self.tokens)
    }

    pub fn id(&self) -> String {
        self.tokens.iter().map(Token::id).collect::<Vec<_>>().join(" ")
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        self.tokens
            .iter()
            .map(|t| t.display_for_platform(platform))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn format(&self) -> PatternFormat {
        self.format_for_platform(Platform::current())
    }

    pub fn format_for_platform(&self, platform: Platform) -> PatternFormat {
        PatternFormat {
            display: self.display_for_platform(platform),
            id: self.id(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for Pattern {
    type Err = PatternParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_step(step: &str) -> Result<Token, PatternParseError> {
    match step {
        DIGIT_RUN_SYNTAX => return Ok(Token::Placeholder(PlaceholderKind::DigitRun)),
        FLOAT_SYNTAX => return Ok(Token::Placeholder(PlaceholderKind::Float)),
        "+" => return Ok(Token::Literal(KeyCombination::plain("plus"))),
        _ => {}
    }

    if let Some(head) = step
        .strip_suffix(DIGIT_RUN_SYNTAX)
        .or_else(|| step.strip_suffix(FLOAT_SYNTAX))
    {
        if head.ends_with('+') {
            return Err(PatternParseError::ModifiedPlaceholder(step.to_string()));
        }
    }

    let segments: Vec<&str> = step.split('+').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PatternParseError::EmptySegment(step.to_string()));
    }
    let Some((key, modifier_parts)) = segments.split_last() else {
        return Err(PatternParseError::MissingKey(step.to_string()));
    };

    let mut modifiers = Modifiers::default();
    for part in modifier_parts {
        match part.to_lowercase().as_str() {
            "ctrl" | "control" | "ctl" | "^" | "⌃" => modifiers.ctrl = true,
            "alt" | "opt" | "option" | "⌥" => modifiers.alt = true,
            "shift" | "shft" | "⇧" => modifiers.shift = true,
            "meta" | "cmd" | "command" | "super" | "win" | "⌘" => modifiers.meta = true,
            _ => {
                return Err(PatternParseError::UnknownModifier {
                    step: step.to_string(),
                    modifier: part.to_string(),
                })
            }
        }
    }

    if key.starts_with('\\') && key.len() > 1 {
        return Err(PatternParseError::InvalidPlaceholder(key.to_string()));
    }

    if is_modifier_name(key) {
        return Err(PatternParseError::MissingKey(step.to_string()));
    }

    let canonical = canonicalize_key(key);
    if !is_known_key(&canonical) {
        return Err(PatternParseError::UnknownKey(key.to_string()));
    }

    // Same Shift folding as key capture: `shift+/` is the `/` key, `K` is shift+k.
    apply_implied_shift(key, &mut modifiers);

    Ok(Token::Literal(KeyCombination {
        key: canonical,
        modifiers,
    }))
}

fn is_modifier_name(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "ctrl" | "control" | "alt" | "option" | "shift" | "meta" | "cmd" | "command" | "super"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(key: &str, modifiers: Modifiers) -> Token {
        Token::Literal(KeyCombination::new(key, modifiers))
    }

    #[test]
    fn parses_sequence_steps() {
        let p = Pattern::parse("2 w").unwrap();
        assert_eq!(
            p.tokens(),
            &[literal("2", Modifiers::default()), literal("w", Modifiers::default())]
        );
        assert_eq!(p.id(), "2 w");
    }

    #[test]
    fn modifier_order_is_normalized() {
        let a = Pattern::parse("shift+ctrl+k").unwrap();
        let b = Pattern::parse("Ctrl+Shift+K").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id(), "ctrl+shift+k");
    }

    #[test]
    fn parses_placeholders() {
        let p = Pattern::parse("o \\f").unwrap();
        assert_eq!(p.tokens()[1], Token::Placeholder(PlaceholderKind::Float));
        assert_eq!(p.id(), "o \\f");

        let p = Pattern::parse("\\d+ d").unwrap();
        assert_eq!(p.tokens()[0], Token::Placeholder(PlaceholderKind::DigitRun));
        assert!(p.has_placeholder());
    }

    #[test]
    fn placeholder_display_uses_glyphs() {
        let p = Pattern::parse("ctrl+g \\d+").unwrap();
        let f = p.format_for_platform(Platform::Linux);
        assert_eq!(f.display, "Ctrl+G [##]");
        assert_eq!(f.id, "ctrl+g \\d+");
        let f = Pattern::parse("o \\f").unwrap().format_for_platform(Platform::MacOS);
        assert_eq!(f.display, "O [#.#]");
    }

    #[test]
    fn round_trips_through_id() {
        for source in [
            "g t",
            "ctrl+shift+k",
            "meta+alt+enter",
            "?",
            "/ g",
            "+ ctrl+plus",
            "backslash x",
            "o \\f",
            "\\d+ j",
            "space up pagedown",
        ] {
            let p = Pattern::parse(source).unwrap();
            assert_eq!(Pattern::parse(&p.format().id).unwrap(), p, "source {source}");
        }
    }

    #[test]
    fn shift_folds_like_key_capture() {
        assert_eq!(Pattern::parse("shift+/").unwrap().id(), "/");
        assert_eq!(Pattern::parse("shift+?").unwrap().id(), "?");
        assert_eq!(Pattern::parse("ctrl+shift+1").unwrap().id(), "ctrl+1");
        assert_eq!(Pattern::parse("K").unwrap().id(), "shift+k");
        assert_eq!(Pattern::parse("shift+plus").unwrap().id(), "shift+plus");
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!(Pattern::parse("   "), Err(PatternParseError::Empty));
        assert!(matches!(
            Pattern::parse("ctrl+"),
            Err(PatternParseError::EmptySegment(_))
        ));
        assert!(matches!(
            Pattern::parse("hyper+k"),
            Err(PatternParseError::UnknownModifier { .. })
        ));
        assert!(matches!(
            Pattern::parse("banana"),
            Err(PatternParseError::UnknownKey(_))
        ));
        assert!(matches!(
            Pattern::parse("x \\d"),
            Err(PatternParseError::InvalidPlaceholder(_))
        ));
        assert!(matches!(
            Pattern::parse("ctrl+\\d+"),
            Err(PatternParseError::ModifiedPlaceholder(_))
        ));
        assert!(matches!(
            Pattern::parse("\\d+ \\f"),
            Err(PatternParseError::AdjacentPlaceholders(_))
        ));
        assert!(matches!(
            Pattern::parse("ctrl+shift"),
            Err(PatternParseError::MissingKey(_))
        ));
    }

    #[test]
    fn strict_prefix() {
        let g = Pattern::parse("g").unwrap();
        let gt = Pattern::parse("g t").unwrap();
        assert!(g.is_strict_prefix_of(&gt));
        assert!(!gt.is_strict_prefix_of(&g));
        assert!(!g.is_strict_prefix_of(&g));
    }
}
