//! Match and replace algorithms.
//!
//! Pure functions over a compiled pattern and a text. They run inside a
//! worker thread and report scan progress through a [`ProgressSink`];
//! deadlines and isolation are the executor's concern, not theirs.

use std::collections::HashSet;

use fancy_regex::{Captures, Expander, Regex};
use serde::{Deserialize, Serialize};

use crate::engine::limits::CONTEXT_WINDOW;
use crate::engine::progress::{ProgressSink, ProgressUpdate};
use crate::error::{EngineError, Result};

/// One capture group of a reported match. Positional and named groups are
/// listed together; `name` is set for named groups only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// 1-based group index in the pattern.
    pub index: usize,
    /// Group name, for named groups.
    pub name: Option<String>,
    /// Captured substring, or None if the group did not participate.
    pub value: Option<String>,
}

/// Fixed-width text window around a match, for human-readable previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchContext {
    /// Up to [`CONTEXT_WINDOW`] characters before the match.
    pub before: String,
    /// The matched substring.
    pub matched: String,
    /// Up to [`CONTEXT_WINDOW`] characters after the match.
    pub after: String,
}

/// One reported match occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRow {
    /// 1-based ordinal of the match within the scan.
    pub id: usize,
    /// The matched substring.
    pub value: String,
    /// Byte offset of the match start.
    pub start_index: usize,
    /// Byte offset one past the match end.
    pub end_index: usize,
    /// Match length in bytes.
    pub length: usize,
    /// Positional and named capture groups.
    pub groups: Vec<Group>,
    /// Context window around the match, independent of row truncation.
    pub context: MatchContext,
}

/// Result of a test task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Total matches found in the text.
    pub total_matches: usize,
    /// Number of materialized rows, `min(total_matches, max_matches)`.
    pub returned_matches: usize,
    /// True when rows were dropped to honor the cap.
    pub truncated: bool,
    /// Number of distinct matched substrings.
    pub unique_matches: usize,
    /// Capturing group census of the pattern.
    pub capturing_groups: usize,
    /// Materialized match rows.
    pub matches: Vec<MatchRow>,
}

/// Result of a replace task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    /// Number of substitutions that would occur.
    pub replacement_count: usize,
    /// Substituted text, capped at the preview ceiling.
    pub preview: String,
    /// True when the preview was capped.
    pub truncated: bool,
    /// Length of the (possibly truncated) preview in characters.
    pub preview_length: usize,
}

fn engine_fault(e: fancy_regex::Error) -> EngineError {
    EngineError::WorkerFault(anyhow::anyhow!("regex engine error: {e}"))
}

/// Extract the context window around `[start, end)`, clamped to char
/// boundaries.
fn context_window(text: &str, start: usize, end: usize) -> MatchContext {
    let mut before_start = start;
    for _ in 0..CONTEXT_WINDOW {
        match text[..before_start].chars().next_back() {
            Some(c) => before_start -= c.len_utf8(),
            None => break,
        }
    }
    let mut after_end = end;
    for _ in 0..CONTEXT_WINDOW {
        match text[after_end..].chars().next() {
            Some(c) => after_end += c.len_utf8(),
            None => break,
        }
    }
    MatchContext {
        before: text[before_start..start].to_string(),
        matched: text[start..end].to_string(),
        after: text[end..after_end].to_string(),
    }
}

/// Materialize the capture groups of one match.
fn collect_groups(caps: &Captures<'_>, names: &[Option<String>]) -> Vec<Group> {
    (1..caps.len())
        .map(|index| Group {
            index,
            name: names.get(index).cloned().flatten(),
            value: caps.get(index).map(|m| m.as_str().to_string()),
        })
        .collect()
}

/// Run a test task: iterate all matches from the text start, regardless of
/// the caller's `global` flag.
///
/// Every match bumps the totals and the uniqueness set; rows are only
/// materialized while under `max_matches`. Zero-length matches advance the
/// scan position by one character. A progress sample is emitted every
/// `progress_batch` matches and one final sample with `complete = true` is
/// always emitted, even for an empty scan.
pub fn run_test(
    re: &Regex,
    text: &str,
    capturing_groups: usize,
    max_matches: usize,
    progress_batch: usize,
    sink: ProgressSink<'_>,
) -> Result<TestResult> {
    let names: Vec<Option<String>> = re
        .capture_names()
        .map(|n| n.map(|s| s.to_string()))
        .collect();
    let total_len = text.len();

    let mut total_matches = 0;
    let mut unique = HashSet::new();
    let mut matches = Vec::new();
    let mut pos = 0;

    loop {
        let Some(caps) = re.captures_from_pos(text, pos).map_err(engine_fault)? else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };

        total_matches += 1;
        unique.insert(m.as_str().to_string());

        if matches.len() < max_matches {
            matches.push(MatchRow {
                id: total_matches,
                value: m.as_str().to_string(),
                start_index: m.start(),
                end_index: m.end(),
                length: m.end() - m.start(),
                groups: collect_groups(&caps, &names),
                context: context_window(text, m.start(), m.end()),
            });
        }

        if m.end() > m.start() {
            pos = m.end();
        } else {
            // Zero-length match: step over one character to avoid looping.
            match text[m.end()..].chars().next() {
                Some(c) => pos = m.end() + c.len_utf8(),
                None => break,
            }
        }

        if total_matches % progress_batch == 0 {
            sink(ProgressUpdate::new(pos, total_len, false));
        }
    }

    sink(ProgressUpdate::new(total_len, total_len, true));

    let returned_matches = matches.len();
    Ok(TestResult {
        total_matches,
        returned_matches,
        truncated: total_matches > returned_matches,
        unique_matches: unique.len(),
        capturing_groups,
        matches,
    })
}

/// Count the substitutions a replace would perform. Runs on its own compiled
/// instance so the count never depends on the substituted output, which may
/// itself contain matching substrings. Non-global patterns count 0 or 1.
fn count_replacements(
    counter: &Regex,
    text: &str,
    global: bool,
    progress_batch: usize,
    sink: ProgressSink<'_>,
) -> Result<usize> {
    if !global {
        return Ok(usize::from(counter.find(text).map_err(engine_fault)?.is_some()));
    }
    let total_len = text.len();
    let mut count = 0;
    for m in counter.find_iter(text) {
        let m = m.map_err(engine_fault)?;
        count += 1;
        if count % progress_batch == 0 {
            sink(ProgressUpdate::new(m.end(), total_len, false));
        }
    }
    Ok(count)
}

/// Perform the substitution, honoring `$1`-style numbered and `$name`-style
/// named backreferences in the replacement string.
fn substitute(substituter: &Regex, text: &str, replacement: &str, global: bool) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    loop {
        let Some(caps) = substituter
            .captures_from_pos(text, pos)
            .map_err(engine_fault)?
        else {
            break;
        };
        let Some(m) = caps.get(0) else {
            break;
        };
        out.push_str(&text[pos..m.start()]);
        Expander::default().append_expansion(&mut out, replacement, &caps);
        if m.end() > m.start() {
            pos = m.end();
        } else {
            // Zero-length match: emit the skipped character verbatim.
            match text[m.end()..].chars().next() {
                Some(c) => {
                    out.push(c);
                    pos = m.end() + c.len_utf8();
                }
                None => {
                    pos = m.end();
                    break;
                }
            }
        }
        if !global {
            break;
        }
    }
    out.push_str(&text[pos..]);
    Ok(out)
}

/// Run a replace task. `counter` and `substituter` must be separately
/// compiled instances of the same pattern.
pub fn run_replace(
    counter: &Regex,
    substituter: &Regex,
    text: &str,
    replacement: &str,
    global: bool,
    max_preview_length: usize,
    progress_batch: usize,
    sink: ProgressSink<'_>,
) -> Result<ReplaceResult> {
    let replacement_count = count_replacements(counter, text, global, progress_batch, sink)?;
    let substituted = substitute(substituter, text, replacement, global)?;

    let full_length = substituted.chars().count();
    let truncated = full_length > max_preview_length;
    let preview = if truncated {
        let cut = substituted
            .char_indices()
            .nth(max_preview_length)
            .map(|(i, _)| i)
            .unwrap_or(substituted.len());
        substituted[..cut].to_string()
    } else {
        substituted
    };

    Ok(ReplaceResult {
        replacement_count,
        preview,
        truncated,
        preview_length: full_length.min(max_preview_length),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::normalize::{compile, count_capturing_groups};

    fn re(pattern: &str, flags: &str) -> Regex {
        compile(pattern, flags, 1_000_000).unwrap()
    }

    fn test_run(pattern: &str, flags: &str, text: &str, max_matches: usize) -> TestResult {
        let mut sink = |_u: ProgressUpdate| {};
        run_test(
            &re(pattern, flags),
            text,
            count_capturing_groups(pattern),
            max_matches,
            200,
            &mut sink,
        )
        .unwrap()
    }

    fn replace_run(
        pattern: &str,
        flags: &str,
        text: &str,
        replacement: &str,
        max_preview: usize,
    ) -> ReplaceResult {
        let mut sink = |_u: ProgressUpdate| {};
        run_replace(
            &re(pattern, flags),
            &re(pattern, flags),
            text,
            replacement,
            flags.contains('g'),
            max_preview,
            200,
            &mut sink,
        )
        .unwrap()
    }

    #[test]
    fn test_scan_digits() {
        let result = test_run("\\d+", "", "a1 b22 c333", 500);
        assert_eq!(result.total_matches, 3);
        assert_eq!(result.returned_matches, 3);
        assert!(!result.truncated);
        assert_eq!(result.unique_matches, 3);

        let values: Vec<&str> = result.matches.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, ["1", "22", "333"]);
        let starts: Vec<usize> = result.matches.iter().map(|m| m.start_index).collect();
        assert_eq!(starts, [1, 4, 8]);
        assert_eq!(result.matches[2].end_index, 11);
        assert_eq!(result.matches[2].length, 3);
        assert_eq!(result.matches[0].id, 1);
    }

    #[test]
    fn test_scan_truncates_rows_not_totals() {
        let text = "ab ".repeat(300);
        let result = test_run("\\w", "", &text, 500);
        assert_eq!(result.total_matches, 600);
        assert_eq!(result.returned_matches, 500);
        assert!(result.truncated);
        assert_eq!(result.unique_matches, 2);
    }

    #[test]
    fn test_scan_unique_counts_substrings_not_positions() {
        let result = test_run("\\w+", "", "aa bb aa", 500);
        assert_eq!(result.total_matches, 3);
        assert_eq!(result.unique_matches, 2);
    }

    #[test]
    fn test_scan_zero_length_matches_advance() {
        let result = test_run("a*", "", "bbb", 500);
        // Empty match at every position including the end of text.
        assert_eq!(result.total_matches, 4);
        assert!(result.matches.iter().all(|m| m.value.is_empty()));
    }

    #[test]
    fn test_scan_collects_named_and_positional_groups() {
        let result = test_run("(?<word>\\w+)@(\\w+)", "", "alice@example", 500);
        assert_eq!(result.total_matches, 1);
        let groups = &result.matches[0].groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].index, 1);
        assert_eq!(groups[0].name.as_deref(), Some("word"));
        assert_eq!(groups[0].value.as_deref(), Some("alice"));
        assert_eq!(groups[1].index, 2);
        assert_eq!(groups[1].name, None);
        assert_eq!(groups[1].value.as_deref(), Some("example"));
    }

    #[test]
    fn test_scan_unmatched_group_is_none() {
        let result = test_run("(a)|(b)", "", "a", 500);
        let groups = &result.matches[0].groups;
        assert_eq!(groups[0].value.as_deref(), Some("a"));
        assert_eq!(groups[1].value, None);
    }

    #[test]
    fn test_scan_context_window() {
        let text = format!("{}NEEDLE{}", "x".repeat(40), "y".repeat(40));
        let result = test_run("NEEDLE", "", &text, 500);
        let ctx = &result.matches[0].context;
        assert_eq!(ctx.before, "x".repeat(28));
        assert_eq!(ctx.matched, "NEEDLE");
        assert_eq!(ctx.after, "y".repeat(28));

        // Near the start the window is simply shorter.
        let result = test_run("b", "", "aab", 500);
        assert_eq!(result.matches[0].context.before, "aa");
        assert_eq!(result.matches[0].context.after, "");
    }

    #[test]
    fn test_scan_deterministic() {
        let text = "one 2 three 44 five 666";
        let a = test_run("\\d+", "", text, 500);
        let b = test_run("\\d+", "", text, 500);
        assert_eq!(a, b);
    }

    #[test]
    fn test_scan_progress_batches_and_completes() {
        let text = "a".repeat(450);
        let mut updates = Vec::new();
        let mut sink = |u: ProgressUpdate| updates.push(u);
        run_test(&re("a", ""), &text, 0, 500, 200, &mut sink).unwrap();

        // 450 matches at batch 200: two interim samples plus the final one.
        assert_eq!(updates.len(), 3);
        assert!(!updates[0].complete);
        assert_eq!(updates[0].processed, 200);
        assert_eq!(updates[1].processed, 400);
        let last = updates.last().unwrap();
        assert!(last.complete);
        assert_eq!(last.processed, 450);
        assert_eq!(last.percent, 100.0);
        assert!(updates.windows(2).all(|w| w[0].processed <= w[1].processed));
    }

    #[test]
    fn test_scan_empty_result_still_completes() {
        let mut updates = Vec::new();
        let mut sink = |u: ProgressUpdate| updates.push(u);
        let result = run_test(&re("z", ""), "aaa", 0, 500, 200, &mut sink).unwrap();
        assert_eq!(result.total_matches, 0);
        assert_eq!(updates.len(), 1);
        assert!(updates[0].complete);
        assert_eq!(updates[0].processed, 3);
    }

    #[test]
    fn test_replace_global_whitespace() {
        let result = replace_run("\\s+", "g", "a  b   c", "_", 5_000);
        assert_eq!(result.preview, "a_b_c");
        assert_eq!(result.replacement_count, 2);
        assert!(!result.truncated);
        assert_eq!(result.preview_length, 5);
    }

    #[test]
    fn test_replace_non_global_is_first_match_only() {
        let result = replace_run("a", "", "aaa", "b", 5_000);
        assert_eq!(result.replacement_count, 1);
        assert_eq!(result.preview, "baa");

        let result = replace_run("z", "", "aaa", "b", 5_000);
        assert_eq!(result.replacement_count, 0);
        assert_eq!(result.preview, "aaa");
    }

    #[test]
    fn test_replace_count_ignores_matches_in_replacement() {
        // The replacement reintroduces the matched substring; the count must
        // come from the original text only.
        let result = replace_run("a", "g", "aaa", "aa", 5_000);
        assert_eq!(result.replacement_count, 3);
        assert_eq!(result.preview, "aaaaaa");
    }

    #[test]
    fn test_replace_numbered_and_named_backrefs() {
        let result = replace_run("(\\w+)@(\\w+)", "g", "alice@example", "$2.$1", 5_000);
        assert_eq!(result.preview, "example.alice");

        let result = replace_run("(?<user>\\w+)@(?<host>\\w+)", "g", "bob@mail", "$host/$user", 5_000);
        assert_eq!(result.preview, "mail/bob");
    }

    #[test]
    fn test_replace_whole_text_with_empty_yields_empty_preview() {
        let result = replace_run("a+", "", "aaaa", "", 5_000);
        assert_eq!(result.preview, "");
        assert_eq!(result.replacement_count, 1);
        assert_eq!(result.preview_length, 0);
    }

    #[test]
    fn test_replace_preview_truncation() {
        let text = "a ".repeat(100);
        let result = replace_run("a", "g", text.trim_end(), "bbbb", 50);
        assert!(result.truncated);
        assert_eq!(result.preview_length, 50);
        assert_eq!(result.preview.chars().count(), 50);
        // The count reflects the full substitution, not the capped preview.
        assert_eq!(result.replacement_count, 100);
    }

    #[test]
    fn test_replace_zero_length_matches_keep_text() {
        let result = replace_run("x*", "g", "ab", "-", 5_000);
        // Empty matches before each character and at the end.
        assert_eq!(result.preview, "-a-b-");
        assert_eq!(result.replacement_count, 3);
    }

    #[test]
    fn test_context_window_respects_char_boundaries() {
        let text = "é".repeat(40) + "X" + &"ü".repeat(40);
        let result = test_run("X", "", &text, 500);
        let ctx = &result.matches[0].context;
        assert_eq!(ctx.before.chars().count(), 28);
        assert_eq!(ctx.after.chars().count(), 28);
    }
}
