//! Matching pending keys against compiled patterns.
//!
//! Pending input is kept as the raw list of key combinations pressed so far.
//! Each pattern is walked against that list independently; placeholders
//! capture greedily and close on the first key they cannot take.

use smallvec::SmallVec;

use super::keymap::{Keymap, KeymapEntry};
use super::pattern::{PlaceholderKind, Token};
use super::types::{KeyCombination, Platform};

/// A value captured by a placeholder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CapturedValue {
    Integer(u64),
    Float(f64),
}

impl CapturedValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(n) => *n as f64,
            Self::Float(f) => *f,
        }
    }
}

pub type Captures = SmallVec<[CapturedValue; 2]>;

/// What a pattern needs next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    Literal(KeyCombination),
    /// Start a placeholder.
    Placeholder(PlaceholderKind),
    /// Keep feeding the placeholder currently being captured.
    MorePlaceholder(PlaceholderKind),
}

impl Expectation {
    pub fn display_for_platform(&self, platform: Platform) -> String {
        match self {
            Self::Literal(combo) => combo.display_for_platform(platform),
            Self::Placeholder(kind) | Self::MorePlaceholder(kind) => kind.display().to_string(),
        }
    }
}

/// Outcome of walking one pattern against pending keys.
///
/// `exact` and `next` are independent: a pattern ending in a placeholder can be
/// an exact match that still accepts more digits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatternProgress {
    pub exact: Option<Captures>,
    pub next: SmallVec<[Expectation; 2]>,
}

impl PatternProgress {
    fn no_match() -> Self {
        Self::default()
    }

    pub fn is_exact(&self) -> bool {
        self.exact.is_some()
    }

    /// True if more keys could still lead to a match (prefix-viable).
    pub fn continues(&self) -> bool {
        !self.next.is_empty()
    }

    pub fn is_match(&self) -> bool {
        self.is_exact() || self.continues()
    }
}

/// Walk `tokens` against `keys`.
pub fn match_pattern(tokens: &[Token], keys: &[KeyCombination]) -> PatternProgress {
    let mut captures = Captures::new();
    let mut ki = 0;

    for (ti, token) in tokens.iter().enumerate() {
        if ki == keys.len() {
            let mut progress = PatternProgress::no_match();
            progress.next.push(expectation_for(token));
            return progress;
        }

        match token {
            Token::Literal(combo) => {
                if keys[ki] != *combo {
                    return PatternProgress::no_match();
                }
                ki += 1;
            }
            Token::Placeholder(kind) => {
                let mut buf = String::new();
                while ki < keys.len() {
                    match accepted_char(*kind, &buf, &keys[ki]) {
                        Some(c) => buf.push(c),
                        None => break,
                    }
                    ki += 1;
                }
                if buf.is_empty() {
                    return PatternProgress::no_match();
                }

                let value = parse_capture(*kind, &buf);
                if ki < keys.len() {
                    match value {
                        Some(v) => captures.push(v),
                        None => return PatternProgress::no_match(),
                    }
                    continue;
                }

                // Input ends inside this placeholder.
                if *kind == PlaceholderKind::DigitRun && value.is_none() {
                    return PatternProgress::no_match();
                }
                let mut progress = PatternProgress::no_match();
                progress.next.push(Expectation::MorePlaceholder(*kind));
                if let Some(v) = value {
                    match tokens.get(ti + 1) {
                        Some(following) => progress.next.push(expectation_for(following)),
                        None => {
                            captures.push(v);
                            progress.exact = Some(captures);
                        }
                    }
                }
                return progress;
            }
        }
    }

    if ki == keys.len() {
        PatternProgress {
            exact: Some(captures),
            next: SmallVec::new(),
        }
    } else {
        PatternProgress::no_match()
    }
}

fn expectation_for(token: &Token) -> Expectation {
    match token {
        Token::Literal(combo) => Expectation::Literal(combo.clone()),
        Token::Placeholder(kind) => Expectation::Placeholder(*kind),
    }
}

fn accepted_char(kind: PlaceholderKind, buf: &str, key: &KeyCombination) -> Option<char> {
    if let Some(d) = key.digit() {
        return Some(d);
    }
    if kind == PlaceholderKind::Float && key.is_decimal_point() && !buf.contains('.') {
        return Some('.');
    }
    None
}

fn parse_capture(kind: PlaceholderKind, buf: &str) -> Option<CapturedValue> {
    match kind {
        PlaceholderKind::DigitRun => buf.parse::<u64>().ok().map(CapturedValue::Integer),
        PlaceholderKind::Float => {
            if buf == "." {
                return None;
            }
            // ".5" and "4." are both valid.
            let mut normalized = String::with_capacity(buf.len() + 2);
            if buf.starts_with('.') {
                normalized.push('0');
            }
            normalized.push_str(buf);
            if buf.ends_with('.') {
                normalized.push('0');
            }
            normalized.parse::<f64>().ok().map(CapturedValue::Float)
        }
    }
}

/// A keymap entry whose pattern equals the pending keys.
#[derive(Clone, Debug)]
pub struct ExactMatch<'k> {
    pub entry: &'k KeymapEntry,
    pub action_id: &'k str,
    pub params: Captures,
}

/// A keymap entry the pending keys are a strict prefix of.
#[derive(Clone, Debug)]
pub struct ContinuingMatch<'k> {
    pub entry: &'k KeymapEntry,
    pub next: SmallVec<[Expectation; 2]>,
}

/// Every live pattern's outcome for one pending key list.
#[derive(Clone, Debug, Default)]
pub struct MatchSet<'k> {
    pub exact: Vec<ExactMatch<'k>>,
    pub continuing: Vec<ContinuingMatch<'k>>,
}

impl<'k> MatchSet<'k> {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.continuing.is_empty()
    }

    pub fn has_continuation(&self) -> bool {
        !self.continuing.is_empty()
    }

    /// Exact match and nothing longer pending: safe to commit right away.
    pub fn is_terminal(&self) -> bool {
        !self.exact.is_empty() && self.continuing.is_empty()
    }

    /// The exact match a commit should dispatch.
    ///
    /// Placeholders are greedy, but a literal-only pattern wins when another
    /// literal-only pattern extends it. Otherwise placeholder patterns beat
    /// literal ones, then registration order decides.
    pub fn best_exact(&self, keymap: &Keymap) -> Option<&ExactMatch<'k>> {
        self.exact
            .iter()
            .min_by_key(|m| (exact_rank(m.entry, keymap), m.entry.order))
    }
}

fn exact_rank(entry: &KeymapEntry, keymap: &Keymap) -> u8 {
    if entry.pattern.has_placeholder() {
        return 1;
    }
    let extended = keymap.live_entries().any(|other| {
        !other.pattern.has_placeholder() && entry.pattern.is_strict_prefix_of(&other.pattern)
    });
    if extended {
        0
    } else {
        2
    }
}

/// Evaluate every live pattern in `keymap` against `keys`.
pub fn evaluate<'k>(keymap: &'k Keymap, keys: &[KeyCombination]) -> MatchSet<'k> {
    let mut set = MatchSet::default();
    if keys.is_empty() {
        return set;
    }
    for entry in keymap.live_entries() {
        let Some(action_id) = entry.action() else {
            continue;
        };
        let progress = match_pattern(entry.pattern.tokens(), keys);
        if let Some(params) = progress.exact {
            set.exact.push(ExactMatch {
                entry,
                action_id,
                params,
            });
        }
        if !progress.next.is_empty() {
            set.continuing.push(ContinuingMatch {
                entry,
                next: progress.next,
            });
        }
    }
    set
}

/// Display of pending keys, e.g. `G` or `O 2 .`.
pub fn pending_display(keys: &[KeyCombination], platform: Platform) -> String {
    keys.iter()
        .map(|k| k.display_for_platform(platform))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::pattern::Pattern;

    fn keys(s: &str) -> Vec<KeyCombination> {
        s.split_whitespace().map(KeyCombination::plain).collect()
    }

    fn progress(pattern: &str, input: &str) -> PatternProgress {
        match_pattern(Pattern::parse(pattern).unwrap().tokens(), &keys(input))
    }

    #[test]
    fn literal_exact_prefix_and_miss() {
        assert!(progress("g t", "g t").is_exact());
        let p = progress("g t", "g");
        assert!(!p.is_exact());
        assert_eq!(p.next.as_slice(), &[Expectation::Literal(KeyCombination::plain("t"))]);
        assert!(!progress("g t", "g x").is_match());
        assert!(!progress("g t", "g t t").is_match());
    }

    #[test]
    fn digit_run_accumulates() {
        let p = progress("\\d+ d", "1 2");
        assert!(!p.is_exact());
        assert_eq!(
            p.next.as_slice(),
            &[
                Expectation::MorePlaceholder(PlaceholderKind::DigitRun),
                Expectation::Literal(KeyCombination::plain("d"))
            ]
        );
        let p = progress("\\d+ d", "1 2 d");
        assert_eq!(p.exact.unwrap().as_slice(), &[CapturedValue::Integer(12)]);
        assert!(!progress("\\d+ d", "1 x").is_match());
    }

    #[test]
    fn trailing_placeholder_is_exact_and_extendable() {
        let p = progress("o \\f", "o 2");
        assert_eq!(p.exact.as_deref(), Some(&[CapturedValue::Float(2.0)][..]));
        assert!(p.continues());
    }

    #[test]
    fn float_leading_and_trailing_dot() {
        let p = progress("o \\f", "o . 5");
        assert_eq!(p.exact.as_deref(), Some(&[CapturedValue::Float(0.5)][..]));
        let p = progress("\\f x", "4 . x");
        assert_eq!(p.exact.as_deref(), Some(&[CapturedValue::Float(4.0)][..]));
    }

    #[test]
    fn lone_dot_is_not_a_value_yet() {
        let p = progress("o \\f", "o .");
        assert!(!p.is_exact());
        assert_eq!(
            p.next.as_slice(),
            &[Expectation::MorePlaceholder(PlaceholderKind::Float)]
        );
    }

    #[test]
    fn second_dot_closes_float() {
        let p = progress("\\f .", "1 . 5 .");
        assert_eq!(p.exact.as_deref(), Some(&[CapturedValue::Float(1.5)][..]));
        assert!(!progress("o \\f", "o 1 . 5 .").is_match());
    }

    #[test]
    fn digit_run_overflow_is_a_miss() {
        let input = vec!["9"; 25].join(" ");
        assert!(!progress("\\d+", &input).is_match());
    }

    #[test]
    fn best_exact_prefers_placeholder_unless_literal_extends() {
        let keymap = Keymap::from_pairs([("1", "one"), ("\\d+", "count")]).unwrap();
        let k = keys("1");
        let set = evaluate(&keymap, &k);
        assert_eq!(set.exact.len(), 2);
        assert_eq!(set.best_exact(&keymap).unwrap().action_id, "count");

        let keymap =
            Keymap::from_pairs([("1", "one"), ("1 w", "due:1w"), ("\\d+", "count")]).unwrap();
        let set = evaluate(&keymap, &k);
        assert_eq!(set.best_exact(&keymap).unwrap().action_id, "one");
    }

    #[test]
    fn terminal_only_without_continuation() {
        let keymap = Keymap::from_pairs([("g", "go"), ("g t", "table"), ("x", "close")]).unwrap();
        let g = keys("g");
        assert!(!evaluate(&keymap, &g).is_terminal());
        let x = keys("x");
        assert!(evaluate(&keymap, &x).is_terminal());
        let q = keys("q");
        assert!(evaluate(&keymap, &q).is_empty());
    }
}
