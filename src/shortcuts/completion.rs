//! Next-key completions for an in-flight sequence.
//!
//! Drives the "which key" indicator: given the pending keys, list every live
//! pattern they could still become and what it needs next.

use smallvec::SmallVec;

use super::keymap::Keymap;
use super::matcher::{match_pattern, pending_display, Expectation};
use super::pattern::Token;
use super::types::{KeyCombination, Platform};

/// One pattern the pending keys may still complete to.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceCompletion {
    pub pattern_id: String,
    pub pattern_display: String,
    pub next: SmallVec<[Expectation; 2]>,
    /// Display of `next`, alternatives separated by ` / `.
    pub next_display: String,
    pub action_ids: Vec<String>,
}

/// Every live pattern `pending` is a strict prefix of, sorted by pattern id.
///
/// With no pending keys this lists the first step of every live pattern.
pub fn complete<F>(
    pending: &[KeyCombination],
    keymap: &Keymap,
    filter: F,
) -> Vec<SequenceCompletion>
where
    F: Fn(&SequenceCompletion) -> bool,
{
    let platform = keymap.platform();
    let mut completions: Vec<SequenceCompletion> = keymap
        .live_entries()
        .filter_map(|entry| {
            let next: SmallVec<[Expectation; 2]> = if pending.is_empty() {
                entry
                    .pattern
                    .tokens()
                    .first()
                    .map(|token| match token {
                        Token::Literal(combo) => Expectation::Literal(combo.clone()),
                        Token::Placeholder(kind) => Expectation::Placeholder(*kind),
                    })
                    .into_iter()
                    .collect()
            } else {
                match_pattern(entry.pattern.tokens(), pending).next
            };
            if next.is_empty() {
                return None;
            }
            Some(SequenceCompletion {
                pattern_id: entry.id.clone(),
                pattern_display: entry.display.clone(),
                next_display: next_display(&next, platform),
                next,
                action_ids: entry.actions.clone(),
            })
        })
        .filter(|c| filter(c))
        .collect();
    completions.sort_by(|a, b| a.pattern_id.cmp(&b.pattern_id));
    completions
}

/// The sequence indicator: at most `limit` completions, empty while idle.
pub fn indicator<F>(
    pending: &[KeyCombination],
    keymap: &Keymap,
    filter: F,
    limit: usize,
) -> SequenceIndicator
where
    F: Fn(&SequenceCompletion) -> bool,
{
    if pending.is_empty() {
        return SequenceIndicator::default();
    }
    let mut completions = complete(pending, keymap, filter);
    let total = completions.len();
    completions.truncate(limit);
    SequenceIndicator {
        pending_display: pending_display(pending, keymap.platform()),
        completions,
        hidden: total.saturating_sub(limit),
    }
}

/// What the indicator shows next to the pending keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceIndicator {
    pub pending_display: String,
    pub completions: Vec<SequenceCompletion>,
    /// Completions cut by the limit.
    pub hidden: usize,
}

impl SequenceIndicator {
    pub fn is_empty(&self) -> bool {
        self.completions.is_empty()
    }
}

fn next_display(next: &[Expectation], platform: Platform) -> String {
    next.iter()
        .map(|e| e.display_for_platform(platform))
        .collect::<Vec<_>>()
        .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::keymap::{Binding, BindingSource, KeymapOptions};
    use crate::shortcuts::pattern::{Pattern, PlaceholderKind};

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

    fn keys(s: &str) -> Vec<KeyCombination> {
        s.split_whitespace().map(KeyCombination::plain).collect()
    }

    #[test]
    fn lists_continuations_sorted_by_pattern() {
        let km = keymap(&[("g t", "table"), ("g c", "calendar"), ("x", "close")]);
        let completions = complete(&keys("g"), &km, |_| true);
        let ids: Vec<_> = completions.iter().map(|c| c.pattern_id.as_str()).collect();
        assert_eq!(ids, vec!["g c", "g t"]);
        assert_eq!(completions[0].next_display, "C");
        assert_eq!(completions[0].action_ids, vec!["calendar"]);
    }

    #[test]
    fn idle_lists_first_steps() {
        let km = keymap(&[("g t", "table"), ("\\d+ d", "due")]);
        let completions = complete(&[], &km, |_| true);
        assert_eq!(completions.len(), 2);
        assert_eq!(
            completions[0].next.as_slice(),
            &[Expectation::Placeholder(PlaceholderKind::DigitRun)]
        );
        assert_eq!(completions[0].next_display, "[##]");
    }

    #[test]
    fn placeholder_offers_more_digits_and_following_key() {
        let km = keymap(&[("\\d+ d", "due")]);
        let completions = complete(&keys("1"), &km, |_| true);
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].next_display, "[##] / D");
    }

    #[test]
    fn filter_is_applied() {
        let km = keymap(&[("g t", "table"), ("g c", "calendar")]);
        let completions = complete(&keys("g"), &km, |c| c.action_ids.iter().any(|a| a == "table"));
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].pattern_id, "g t");
    }

    #[test]
    fn indicator_is_empty_while_idle() {
        let km = keymap(&[("g t", "table")]);
        assert!(indicator(&[], &km, |_| true, 8).is_empty());
    }

    #[test]
    fn indicator_truncates_and_counts_hidden() {
        let km = keymap(&[("g a", "a"), ("g b", "b"), ("g c", "c")]);
        let shown = indicator(&keys("g"), &km, |_| true, 2);
        assert_eq!(shown.pending_display, "G");
        assert_eq!(shown.completions.len(), 2);
        assert_eq!(shown.hidden, 1);
    }
}
