//! Fuzzy search for the command palette.
//!
//! `fuzzy_match` is a subsequence matcher that returns highlight ranges;
//! `search_actions` ranks registered actions by label, keywords, group and
//! description, folding in a nucleo score for the label and pre-filling
//! placeholder parameters from numbers in the query.

use std::cmp::Ordering;
use std::ops::Range;

use nucleo_matcher::pattern::Pattern;
use nucleo_matcher::{Matcher, Utf32Str};

use crate::config::SearchConfig;
use crate::shortcuts::{ActionDefinition, CapturedValue, Keymap, PlaceholderKind};

// ============================================
// SUBSEQUENCE MATCHING
// ============================================

const CHAR_SCORE: i32 = 16;
const CONSECUTIVE_BONUS: i32 = 20;
const BOUNDARY_BONUS: i32 = 24;
const START_BONUS: i32 = 10;
const MAX_GAP_PENALTY: usize = 10;
const MAX_EARLINESS_PENALTY: usize = 20;

/// Result of `fuzzy_match`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub matched: bool,
    /// `i32::MIN` when not matched.
    pub score: i32,
    /// Matched char positions, merged into half-open runs.
    pub ranges: Vec<Range<usize>>,
}

impl FuzzyMatch {
    fn no_match() -> Self {
        Self {
            matched: false,
            score: i32::MIN,
            ranges: Vec::new(),
        }
    }
}

/// Match `query` as a case-insensitive subsequence of `text`.
///
/// Every start position of the first query char is tried and the best
/// scoring alignment wins.
pub fn fuzzy_match(query: &str, text: &str) -> FuzzyMatch {
    let query: Vec<char> = query.chars().map(fold_case).collect();
    if query.is_empty() {
        return FuzzyMatch {
            matched: true,
            score: 0,
            ranges: Vec::new(),
        };
    }
    let chars: Vec<char> = text.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold_case).collect();

    let mut best: Option<(i32, Vec<usize>)> = None;
    for start in 0..folded.len() {
        if folded[start] != query[0] {
            continue;
        }
        let Some(indices) = align_from(&folded, &query, start) else {
            // No later start can succeed either.
            break;
        };
        let score = score_alignment(&chars, &indices);
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, indices));
        }
    }

    match best {
        Some((score, indices)) => FuzzyMatch {
            matched: true,
            score,
            ranges: merge_ranges(&indices),
        },
        None => FuzzyMatch::no_match(),
    }
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn align_from(folded: &[char], query: &[char], start: usize) -> Option<Vec<usize>> {
    let mut indices = Vec::with_capacity(query.len());
    indices.push(start);
    let mut qi = 1;
    for (pos, &c) in folded.iter().enumerate().skip(start + 1) {
        if qi == query.len() {
            break;
        }
        if c == query[qi] {
            indices.push(pos);
            qi += 1;
        }
    }
    (qi == query.len()).then_some(indices)
}

fn is_word_boundary(chars: &[char], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    let prev = chars[i - 1];
    !prev.is_alphanumeric() || (prev.is_lowercase() && chars[i].is_uppercase())
}

fn score_alignment(chars: &[char], indices: &[usize]) -> i32 {
    let mut score = 0;
    for (n, &i) in indices.iter().enumerate() {
        score += CHAR_SCORE;
        if is_word_boundary(chars, i) {
            score += BOUNDARY_BONUS;
        }
        if n > 0 {
            let gap = i - indices[n - 1] - 1;
            if gap == 0 {
                score += CONSECUTIVE_BONUS;
            } else {
                score -= gap.min(MAX_GAP_PENALTY) as i32;
            }
        }
    }
    let first = indices[0];
    if first == 0 {
        score += START_BONUS;
    }
    score - (first.min(MAX_EARLINESS_PENALTY) * 2) as i32
}

fn merge_ranges(indices: &[usize]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for &i in indices {
        match ranges.last_mut() {
            Some(last) if last.end == i => last.end = i + 1,
            _ => ranges.push(i..i + 1),
        }
    }
    ranges
}

// ============================================
// NUCLEO
// ============================================

/// Nucleo pattern plus a reused haystack buffer.
struct NucleoCtx {
    pattern: Pattern,
    matcher: Matcher,
    buf: Vec<char>,
}

impl NucleoCtx {
    fn new(query: &str) -> Self {
        let pattern = Pattern::parse(
            query,
            nucleo_matcher::pattern::CaseMatching::Ignore,
            nucleo_matcher::pattern::Normalization::Smart,
        );
        Self {
            pattern,
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            buf: Vec::with_capacity(64),
        }
    }

    #[inline]
    fn score(&mut self, haystack: &str) -> Option<u32> {
        self.buf.clear();
        let utf32 = Utf32Str::new(haystack, &mut self.buf);
        self.pattern.score(utf32, &mut self.matcher)
    }
}

/// Check if haystack contains needle using ASCII case-insensitive matching.
/// Returns the byte position of the first hit.
fn find_ignore_ascii_case(haystack: &str, needle_lower: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle_lower.as_bytes();
    if n.is_empty() {
        return Some(0);
    }
    if n.len() > h.len() {
        return None;
    }
    'outer: for i in 0..=(h.len() - n.len()) {
        for j in 0..n.len() {
            if h[i + j].to_ascii_lowercase() != n[j] {
                continue 'outer;
            }
        }
        return Some(i);
    }
    None
}

// ============================================
// ACTION SEARCH
// ============================================

/// Which field produced an action's best score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchedField {
    Label,
    Keyword,
    Group,
    Description,
    /// Only the number matched (placeholder action, no text left in the query).
    Parameter,
    /// Empty query.
    None,
}

/// Whether a palette hit can run immediately.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParameterHint {
    /// No placeholder in any bound pattern.
    NotRequired,
    /// The query carried a usable number.
    Prefilled(CapturedValue),
    /// A placeholder needs a value; prompt before executing.
    NeedsParameter(PlaceholderKind),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionSearchResult {
    pub action_id: String,
    pub label: String,
    pub score: i32,
    pub matched_field: MatchedField,
    /// Char ranges in the matched field's text.
    pub matched_ranges: Vec<Range<usize>>,
    /// Display strings of the live patterns bound to the action.
    pub bound_patterns: Vec<String>,
    pub parameter: ParameterHint,
}

/// A number token pulled out of a query.
#[derive(Clone, Debug, PartialEq)]
struct NumberToken {
    value: f64,
    integral: bool,
    rest: String,
}

/// The last whitespace token that reads as a decimal number.
fn extract_number(query: &str) -> Option<NumberToken> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let (pos, token) = tokens
        .iter()
        .enumerate()
        .rev()
        .find(|(_, t)| is_decimal(t))?;
    let normalized = if token.starts_with('.') {
        format!("0{token}")
    } else {
        token.trim_end_matches('.').to_string()
    };
    let value = normalized.parse::<f64>().ok()?;
    let rest = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pos)
        .map(|(_, t)| *t)
        .collect::<Vec<_>>()
        .join(" ");
    Some(NumberToken {
        value,
        integral: !token.contains('.'),
        rest,
    })
}

fn is_decimal(token: &str) -> bool {
    let digits = token.chars().filter(char::is_ascii_digit).count();
    let dots = token.chars().filter(|c| *c == '.').count();
    digits > 0 && dots <= 1 && digits + dots == token.chars().count()
}

fn prefill(kind: PlaceholderKind, number: &NumberToken) -> Option<CapturedValue> {
    match kind {
        PlaceholderKind::DigitRun if number.integral => integral_value(number.value),
        PlaceholderKind::DigitRun => None,
        PlaceholderKind::Float => Some(CapturedValue::Float(number.value)),
    }
}

fn integral_value(value: f64) -> Option<CapturedValue> {
    (value >= 0.0 && value <= u64::MAX as f64).then(|| CapturedValue::Integer(value as u64))
}

struct FieldScore {
    score: i32,
    field: MatchedField,
    ranges: Vec<Range<usize>>,
}

/// Field weights in percent: label > keywords > group > description.
const LABEL_WEIGHT: i32 = 100;
const KEYWORD_WEIGHT: i32 = 70;
const GROUP_WEIGHT: i32 = 50;
const DESCRIPTION_WEIGHT: i32 = 35;

fn score_fields(
    action: &ActionDefinition,
    query: &str,
    nucleo: &mut NucleoCtx,
) -> Option<FieldScore> {
    let query_lower = query.to_lowercase();
    let mut best: Option<FieldScore> = None;
    let mut consider = |candidate: FieldScore| {
        if best.as_ref().map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    };

    let label = fuzzy_match(query, &action.label);
    if label.matched {
        let mut score = label.score.max(0) * LABEL_WEIGHT / 100;
        if let Some(pos) = find_ignore_ascii_case(&action.label, &query_lower) {
            score += if pos == 0 { 100 } else { 75 };
        }
        if let Some(nucleo_s) = nucleo.score(&action.label) {
            score += 50 + (nucleo_s / 20) as i32;
        }
        consider(FieldScore {
            score,
            field: MatchedField::Label,
            ranges: label.ranges,
        });
    }

    let secondary = action
        .keywords
        .iter()
        .map(|k| (k.as_str(), MatchedField::Keyword, KEYWORD_WEIGHT))
        .chain(
            action
                .group
                .as_deref()
                .map(|g| (g, MatchedField::Group, GROUP_WEIGHT)),
        )
        .chain(
            action
                .description
                .as_deref()
                .map(|d| (d, MatchedField::Description, DESCRIPTION_WEIGHT)),
        );
    for (text, field, weight) in secondary {
        let m = fuzzy_match(query, text);
        if !m.matched {
            continue;
        }
        let mut score = m.score.max(0) * weight / 100;
        if find_ignore_ascii_case(text, &query_lower).is_some() {
            score += weight / 2;
        }
        consider(FieldScore {
            score,
            field,
            ranges: m.ranges,
        });
    }

    best
}

/// Rank `actions` against `query`.
///
/// Results are sorted by score (highest first), then by label.
pub fn search_actions<'a>(
    query: &str,
    actions: impl IntoIterator<Item = &'a ActionDefinition>,
    keymap: &Keymap,
    config: &SearchConfig,
) -> Vec<ActionSearchResult> {
    let query = query.trim();
    let number = extract_number(query);
    let mut full_ctx = NucleoCtx::new(query);
    let mut rest_ctx = number.as_ref().map(|n| NucleoCtx::new(&n.rest));

    let mut results = Vec::new();
    for action in actions {
        let entries = keymap.patterns_for(&action.id);
        let placeholder = entries
            .iter()
            .filter(|e| !e.disabled)
            .flat_map(|e| e.pattern.placeholders())
            .next();
        let bound_patterns: Vec<String> = entries.iter().map(|e| e.display.clone()).collect();

        let (hit, parameter) = match (placeholder, number.as_ref(), rest_ctx.as_mut()) {
            (Some(kind), Some(n), Some(ctx)) => {
                let hit = if n.rest.is_empty() {
                    Some(FieldScore {
                        score: 0,
                        field: MatchedField::Parameter,
                        ranges: Vec::new(),
                    })
                } else {
                    score_fields(action, &n.rest, ctx)
                };
                match prefill(kind, n) {
                    Some(value) => (
                        hit.map(|mut h| {
                            h.score += config.number_boost;
                            h
                        }),
                        ParameterHint::Prefilled(value),
                    ),
                    None => (hit, ParameterHint::NeedsParameter(kind)),
                }
            }
            (Some(kind), _, _) => (
                text_hit(action, query, &mut full_ctx),
                ParameterHint::NeedsParameter(kind),
            ),
            (None, _, _) => (text_hit(action, query, &mut full_ctx), ParameterHint::NotRequired),
        };

        if let Some(hit) = hit {
            results.push(ActionSearchResult {
                action_id: action.id.clone(),
                label: action.label.clone(),
                score: hit.score,
                matched_field: hit.field,
                matched_ranges: hit.ranges,
                bound_patterns,
                parameter,
            });
        }
    }

    results.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.label.cmp(&b.label),
        other => other,
    });
    if config.max_results > 0 {
        results.truncate(config.max_results);
    }
    results
}

fn text_hit(action: &ActionDefinition, query: &str, nucleo: &mut NucleoCtx) -> Option<FieldScore> {
    if query.is_empty() {
        return Some(FieldScore {
            score: 0,
            field: MatchedField::None,
            ranges: Vec::new(),
        });
    }
    score_fields(action, query, nucleo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::{Binding, BindingSource, KeymapOptions, Pattern, Platform};

    fn keymap(pairs: &[(&str, &str)]) -> Keymap {
        let bindings = pairs
            .iter()
            .map(|(p, a)| Binding::new(Pattern::parse(p).unwrap(), *a, BindingSource::Default))
            .collect();
        Keymap::build(
            bindings,
            KeymapOptions {
                disable_on_conflict: false,
                platform: Platform::Linux,
            },
        )
    }

    fn actions() -> Vec<ActionDefinition> {
        vec![
            ActionDefinition::new("table", "Go to table").with_group("Navigation"),
            ActionDefinition::new("calendar", "Go to calendar").with_group("Navigation"),
            ActionDefinition::new("down", "Move down")
                .with_keywords(["next", "row"])
                .with_description("Move the selection down by a number of rows"),
            ActionDefinition::new("scale", "Scale canvas").with_keywords(["zoom"]),
            ActionDefinition::new("close", "Close"),
        ]
    }

    fn bound() -> Keymap {
        keymap(&[
            ("g t", "table"),
            ("g c", "calendar"),
            ("\\d+ j", "down"),
            ("o \\f", "scale"),
            ("x", "close"),
        ])
    }

    #[test]
    fn fuzzy_match_prefers_word_boundaries() {
        let boundary = fuzzy_match("g t", "Go to table");
        assert!(boundary.matched);
        assert!(!fuzzy_match("g t", "Table").matched);

        let camel = fuzzy_match("gt", "goTable");
        let buried = fuzzy_match("gt", "bigot");
        assert!(camel.matched && buried.matched);
        assert!(camel.score > buried.score);
    }

    #[test]
    fn fuzzy_match_rewards_consecutive_and_early_hits() {
        let consecutive = fuzzy_match("tab", "table");
        let scattered = fuzzy_match("tab", "the alphabet");
        assert!(consecutive.score > scattered.score);

        let early = fuzzy_match("c", "calendar");
        let late = fuzzy_match("c", "open the calendar");
        assert!(early.score > late.score);
    }

    #[test]
    fn fuzzy_match_ranges_are_merged() {
        let m = fuzzy_match("tab", "Go to table");
        assert_eq!(m.ranges, vec![6..9]);
        let m = fuzzy_match("gt", "Go to");
        assert_eq!(m.ranges, vec![0..1, 3..4]);
    }

    #[test]
    fn fuzzy_match_unmatched_and_empty() {
        let miss = fuzzy_match("zz", "Go to table");
        assert!(!miss.matched);
        assert_eq!(miss.score, i32::MIN);
        assert!(fuzzy_match("", "anything").matched);
    }

    #[test]
    fn fuzzy_match_is_case_insensitive() {
        assert!(fuzzy_match("GT", "go to").matched);
    }

    #[test]
    fn label_ranks_above_other_fields() {
        let actions = vec![
            ActionDefinition::new("a", "Open canvas").with_description("zoom in"),
            ActionDefinition::new("b", "Zoom").with_group("View"),
        ];
        let results =
            search_actions("zoom", &actions, &Keymap::default(), &SearchConfig::default());
        assert_eq!(results[0].action_id, "b");
        assert_eq!(results[0].matched_field, MatchedField::Label);
        assert_eq!(results[1].matched_field, MatchedField::Description);
    }

    #[test]
    fn keywords_and_group_are_searched() {
        let results = search_actions("zoom", &actions(), &bound(), &SearchConfig::default());
        assert_eq!(results[0].action_id, "scale");
        assert_eq!(results[0].matched_field, MatchedField::Keyword);

        let results = search_actions("navigation", &actions(), &bound(), &SearchConfig::default());
        let ids: Vec<_> = results.iter().map(|r| r.action_id.as_str()).collect();
        assert_eq!(ids, vec!["calendar", "table"]);
    }

    #[test]
    fn empty_query_lists_everything_by_label() {
        let results = search_actions("", &actions(), &bound(), &SearchConfig::default());
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].label, "Close");
        let scale = results.iter().find(|r| r.action_id == "scale").unwrap();
        assert_eq!(
            scale.parameter,
            ParameterHint::NeedsParameter(PlaceholderKind::Float)
        );
        assert_eq!(scale.bound_patterns, vec!["O [#.#]"]);
    }

    #[test]
    fn number_in_query_prefills_parameter() {
        let results = search_actions("down 3", &actions(), &bound(), &SearchConfig::default());
        let down = &results[0];
        assert_eq!(down.action_id, "down");
        assert_eq!(down.parameter, ParameterHint::Prefilled(CapturedValue::Integer(3)));

        let results = search_actions("scale 2.5", &actions(), &bound(), &SearchConfig::default());
        assert_eq!(results[0].action_id, "scale");
        assert_eq!(
            results[0].parameter,
            ParameterHint::Prefilled(CapturedValue::Float(2.5))
        );
    }

    #[test]
    fn fractional_number_does_not_fill_digit_run() {
        let results = search_actions("down 2.5", &actions(), &bound(), &SearchConfig::default());
        let down = results.iter().find(|r| r.action_id == "down").unwrap();
        assert_eq!(
            down.parameter,
            ParameterHint::NeedsParameter(PlaceholderKind::DigitRun)
        );
    }

    #[test]
    fn placeholder_without_number_needs_parameter() {
        let results = search_actions("move down", &actions(), &bound(), &SearchConfig::default());
        assert_eq!(results[0].action_id, "down");
        assert_eq!(
            results[0].parameter,
            ParameterHint::NeedsParameter(PlaceholderKind::DigitRun)
        );
    }

    #[test]
    fn bare_number_surfaces_placeholder_actions() {
        let results = search_actions("4", &actions(), &bound(), &SearchConfig::default());
        let ids: Vec<_> = results.iter().map(|r| r.action_id.as_str()).collect();
        assert_eq!(ids, vec!["down", "scale"]);
        assert!(results
            .iter()
            .all(|r| matches!(r.parameter, ParameterHint::Prefilled(_))));
    }

    #[test]
    fn number_boost_is_configurable() {
        let config = SearchConfig {
            number_boost: 0,
            ..Default::default()
        };
        let boosted = search_actions("down 3", &actions(), &bound(), &SearchConfig::default());
        let plain = search_actions("down 3", &actions(), &bound(), &config);
        assert_eq!(boosted[0].score - plain[0].score, SearchConfig::default().number_boost);
    }

    #[test]
    fn max_results_truncates() {
        let config = SearchConfig {
            max_results: 2,
            ..Default::default()
        };
        assert_eq!(search_actions("", &actions(), &bound(), &config).len(), 2);
    }

    #[test]
    fn extracts_last_number_token() {
        let n = extract_number("scale 2.5").unwrap();
        assert_eq!(n.value, 2.5);
        assert!(!n.integral);
        assert_eq!(n.rest, "scale");
        let n = extract_number("down 3 rows").unwrap();
        assert_eq!(n.value, 3.0);
        assert_eq!(n.rest, "down rows");
        assert_eq!(extract_number(".5").unwrap().value, 0.5);
        assert!(extract_number("v1.2.3").is_none());
        assert!(extract_number("down").is_none());
    }
}
