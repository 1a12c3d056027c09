//! Deterministic fuzzy ranking of launcher commands.
//!
//! Every query token must match at least one searchable field as a
//! subsequence; per-token the best weighted field score wins, and the total
//! blends with the persisted usage model through a five-key sort.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::command::LauncherCommand;
use super::usage::UsageStore;

mod field_weight {
    pub const TITLE: f64 = 1.0;
    pub const KEYWORD: f64 = 0.75;
    pub const COMMAND_ID: f64 = 0.55;
}

mod score {
    pub const MATCHED_CHARACTER: i64 = 24;
    pub const PREFIX_BONUS: i64 = 120;
    pub const WORD_BOUNDARY_FIRST_BONUS: i64 = 80;
    pub const WORD_BOUNDARY_BONUS: i64 = 40;
    pub const CONSECUTIVE_BONUS: i64 = 48;
    pub const CONSECUTIVE_STREAK_BONUS: i64 = 8;
    pub const GAP_PENALTY: i64 = 6;
    pub const LATE_START_PENALTY: i64 = 3;
    pub const LENGTH_PENALTY: i64 = 1;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSortKey {
    pub match_score: i64,
    pub usage_score: f64,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub execution_count: u32,
    pub original_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub command: LauncherCommand,
    pub match_score: i64,
    pub usage_score: f64,
    pub sort_key: MatchSortKey,
}

struct SearchField {
    value: String,
    weight: f64,
}

/// Ranks `commands` against `query`. Usage scores are all evaluated at the
/// same instant so one ranking call sees one consistent "now".
pub fn rank(
    commands: &[LauncherCommand],
    query: &str,
    usage_store: &UsageStore,
) -> Vec<MatchResult> {
    let tokens = tokenize(query);

    if tokens.is_empty() {
        return rank_for_empty_query(commands, usage_store);
    }

    let now = usage_store.now();
    let mut matches: Vec<MatchResult> = commands
        .iter()
        .enumerate()
        .filter_map(|(index, command)| {
            let match_score = score_command(command, &tokens)?;
            Some(build_result(command, match_score, index, usage_store, now))
        })
        .collect();

    matches.sort_by(|lhs, rhs| rank_ordering(&lhs.sort_key, &rhs.sort_key));
    matches
}

fn rank_for_empty_query(
    commands: &[LauncherCommand],
    usage_store: &UsageStore,
) -> Vec<MatchResult> {
    let indexed: HashMap<&str, usize> = commands
        .iter()
        .enumerate()
        .map(|(index, command)| (command.id.as_str(), index))
        .collect();
    let now = usage_store.now();

    usage_store
        .sorted_for_empty_query(commands)
        .iter()
        .map(|command| {
            let index = indexed.get(command.id.as_str()).copied().unwrap_or(usize::MAX);
            build_result(command, 0, index, usage_store, now)
        })
        .collect()
}

fn build_result(
    command: &LauncherCommand,
    match_score: i64,
    original_index: usize,
    usage_store: &UsageStore,
    now: DateTime<Utc>,
) -> MatchResult {
    let usage = usage_store.usage(&command.id);
    let usage_score = usage_store.usage_score(&command.id, now);

    MatchResult {
        command: command.clone(),
        match_score,
        usage_score,
        sort_key: MatchSortKey {
            match_score,
            usage_score,
            last_executed_at: usage.last_executed_at,
            execution_count: usage.execution_count,
            original_index,
        },
    }
}

/// Descending on match score, usage score, recency (absent sorts last) and
/// execution count; ascending catalog index keeps the order deterministic.
fn rank_ordering(lhs: &MatchSortKey, rhs: &MatchSortKey) -> Ordering {
    rhs.match_score
        .cmp(&lhs.match_score)
        .then_with(|| rhs.usage_score.total_cmp(&lhs.usage_score))
        .then_with(|| rhs.last_executed_at.cmp(&lhs.last_executed_at))
        .then_with(|| rhs.execution_count.cmp(&lhs.execution_count))
        .then_with(|| lhs.original_index.cmp(&rhs.original_index))
}

fn score_command(command: &LauncherCommand, tokens: &[String]) -> Option<i64> {
    let fields = searchable_fields(command);
    let mut total_score = 0;

    for token in tokens {
        let best_token_score = fields
            .iter()
            .filter_map(|field| {
                subsequence_score(token, &field.value)
                    .map(|raw| (raw as f64 * field.weight).round() as i64)
            })
            .max()?;

        total_score += best_token_score;
    }

    Some(total_score)
}

fn searchable_fields(command: &LauncherCommand) -> Vec<SearchField> {
    let mut fields = vec![SearchField {
        value: normalize(&command.title),
        weight: field_weight::TITLE,
    }];

    fields.extend(command.keywords.iter().map(|keyword| SearchField {
        value: normalize(keyword),
        weight: field_weight::KEYWORD,
    }));

    fields.push(SearchField {
        value: normalize(&command.id),
        weight: field_weight::COMMAND_ID,
    });

    fields.retain(|field| !field.value.is_empty());
    fields
}

/// Greedy earliest-position subsequence match; `None` when any token
/// character cannot be found after the cursor.
fn subsequence_score(token: &str, candidate: &str) -> Option<i64> {
    if token.is_empty() || candidate.is_empty() {
        return None;
    }

    let token_chars: Vec<char> = token.chars().collect();
    let candidate_chars: Vec<char> = candidate.chars().collect();

    let mut positions: Vec<usize> = Vec::with_capacity(token_chars.len());
    let mut cursor = 0;

    for &character in &token_chars {
        let mut found_index = None;

        while cursor < candidate_chars.len() {
            if candidate_chars[cursor] == character {
                found_index = Some(cursor);
                cursor += 1;
                break;
            }
            cursor += 1;
        }

        positions.push(found_index?);
    }

    let mut total = token_chars.len() as i64 * score::MATCHED_CHARACTER;

    if let Some(&first) = positions.first() {
        if first == 0 {
            total += score::PREFIX_BONUS;
        }
        total -= first as i64 * score::LATE_START_PENALTY;
    }

    let mut total_gap: i64 = 0;
    let mut consecutive_streak: i64 = 0;

    for (index, &position) in positions.iter().enumerate() {
        if is_word_boundary(position, &candidate_chars) {
            total += if index == 0 {
                score::WORD_BOUNDARY_FIRST_BONUS
            } else {
                score::WORD_BOUNDARY_BONUS
            };
        }

        if index == 0 {
            continue;
        }

        let previous = positions[index - 1];
        let gap = position.saturating_sub(previous + 1) as i64;
        total_gap += gap;

        if gap == 0 {
            consecutive_streak += 1;
            total += score::CONSECUTIVE_BONUS + consecutive_streak * score::CONSECUTIVE_STREAK_BONUS;
        } else {
            consecutive_streak = 0;
        }
    }

    total -= total_gap * score::GAP_PENALTY;
    total -= (candidate_chars.len() as i64 - token_chars.len() as i64).max(0)
        * score::LENGTH_PENALTY;

    Some(total)
}

fn is_word_boundary(index: usize, characters: &[char]) -> bool {
    if index == 0 {
        return true;
    }

    matches!(characters[index - 1], ' ' | '-' | '_' | '/')
}

fn tokenize(query: &str) -> Vec<String> {
    normalize(query)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Trim, fold diacritics and width variants (NFKD, dropping combining
/// marks), lowercase.
fn normalize(text: &str) -> String {
    text.trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::command::builtin_commands;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(tag: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos();
        std::env::temp_dir().join(format!("keytally-fuzzy-{tag}-{unique}.json"))
    }

    fn empty_usage(tag: &str) -> UsageStore {
        UsageStore::new(temp_store_path(tag))
    }

    #[test]
    fn consecutive_matches_beat_gapped_matches() {
        let tight = subsequence_score("ab", "abc").unwrap();
        let gapped = subsequence_score("ab", "axbc").unwrap();
        assert!(tight > gapped);
    }

    #[test]
    fn prefix_match_beats_interior_match() {
        let prefix = subsequence_score("tile", "tile left half").unwrap();
        let interior = subsequence_score("tile", "retile left half").unwrap();
        assert!(prefix > interior);
    }

    #[test]
    fn word_boundary_positions_score_higher() {
        let boundary = subsequence_score("l", "tile left").unwrap();
        let interior = subsequence_score("l", "tixle").unwrap();
        assert!(boundary > interior);
    }

    #[test]
    fn unmatchable_token_yields_none() {
        assert_eq!(subsequence_score("xyz", "tile left half"), None);
        assert_eq!(subsequence_score("", "tile"), None);
        assert_eq!(subsequence_score("tile", ""), None);
    }

    #[test]
    fn out_of_order_characters_do_not_match() {
        assert_eq!(subsequence_score("lt", "tl"), None);
    }

    #[test]
    fn tl_prefers_tile_left_over_tile_right() {
        let usage = empty_usage("tl");
        let results = rank(&builtin_commands(), "tl", &usage);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].command.id, "tile-left-half");
        assert_eq!(results[1].command.id, "tile-right-half");
        assert!(results[0].match_score > results[1].match_score);
    }

    #[test]
    fn every_token_must_match_some_field() {
        let usage = empty_usage("all-tokens");
        let results = rank(&builtin_commands(), "left zebra", &usage);
        assert!(results.is_empty());
    }

    #[test]
    fn keyword_matches_rank_commands_too() {
        let usage = empty_usage("keyword");
        let results = rank(&builtin_commands(), "window", &usage);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn query_normalization_folds_case_whitespace_and_diacritics() {
        let usage = empty_usage("normalize");
        let ranked_plain = rank(&builtin_commands(), "tile left", &usage);
        let ranked_noisy = rank(&builtin_commands(), "  TÍLE   LÉFT  ", &usage);

        assert_eq!(ranked_plain.len(), ranked_noisy.len());
        assert_eq!(
            ranked_plain[0].match_score,
            ranked_noisy[0].match_score
        );
    }

    #[test]
    fn empty_query_returns_all_commands_with_zero_match_score() {
        let usage = empty_usage("empty-query");
        let results = rank(&builtin_commands(), "   ", &usage);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.match_score == 0));
        assert_eq!(results[0].command.id, "tile-left-half");
    }

    #[test]
    fn usage_breaks_match_score_ties() {
        let now = chrono::Utc::now();
        let path = temp_store_path("usage-tie");
        let usage = UsageStore::with_clock(path.clone(), Box::new(move || now));
        usage.record_execution("tile-right-half");

        // Both halves carry the "window" keyword, so the match scores tie
        // and usage must decide.
        let results = rank(&builtin_commands(), "window", &usage);
        assert_eq!(results[0].command.id, "tile-right-half");
        assert_eq!(results[0].match_score, results[1].match_score);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn full_tie_falls_back_to_catalog_index() {
        let usage = empty_usage("index-tie");
        let results = rank(&builtin_commands(), "half", &usage);

        assert_eq!(results[0].match_score, results[1].match_score);
        assert_eq!(results[0].sort_key.original_index, 0);
        assert_eq!(results[1].sort_key.original_index, 1);
    }
}
