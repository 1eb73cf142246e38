//! Pattern and flag normalization.
//!
//! Everything here is pure validation: no task is dispatched and no text is
//! scanned. Flags are restricted to a fixed safe alphabet rather than relying
//! on the engine's own flag handling, since native engines differ in how they
//! treat unknown flag characters.

use fancy_regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::engine::config::EngineConfig;
use crate::error::{EngineError, Result};

/// The safe flag alphabet: global, ignore-case, multiline, dot-all,
/// unicode, sticky. Any other character is silently dropped.
const SAFE_FLAGS: &str = "gimsuy";

/// Decoded view of a sanitized flag string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagBits {
    /// `g`: iterate all matches instead of the first.
    pub global: bool,
    /// `i`: case-insensitive matching.
    pub ignore_case: bool,
    /// `m`: `^` and `$` match at line boundaries.
    pub multiline: bool,
    /// `s`: `.` matches newlines.
    pub dot_all: bool,
    /// `u`: unicode mode, always on in this engine; recorded for callers.
    pub unicode: bool,
    /// `y`: sticky anchoring, recorded for callers.
    pub sticky: bool,
}

impl FlagBits {
    /// Decode a sanitized flag string.
    pub fn from_flags(flags: &str) -> Self {
        Self {
            global: flags.contains('g'),
            ignore_case: flags.contains('i'),
            multiline: flags.contains('m'),
            dot_all: flags.contains('s'),
            unicode: flags.contains('u'),
            sticky: flags.contains('y'),
        }
    }
}

/// Sanitize a raw flag string: keep only the safe alphabet, drop
/// duplicates, preserve first-seen order.
pub fn sanitize_flags(raw: &str) -> String {
    let mut out = String::with_capacity(SAFE_FLAGS.len());
    for c in raw.chars() {
        if SAFE_FLAGS.contains(c) && !out.contains(c) {
            out.push(c);
        }
    }
    out
}

/// Validate a pattern against the size ceiling and the engine grammar.
///
/// This compiles a throwaway instance; workers always compile their own
/// fresh instance so no engine state crosses the task boundary.
pub fn validate_pattern(pattern: &str, flags: &str, config: &EngineConfig) -> Result<()> {
    if pattern.is_empty() {
        return Err(EngineError::InvalidPattern(
            "pattern must not be empty".to_string(),
        ));
    }
    let length = pattern.chars().count();
    if length > config.max_pattern_length {
        return Err(EngineError::PatternTooLong {
            length,
            max: config.max_pattern_length,
        });
    }
    compile(pattern, flags, config.backtrack_limit).map(|_| ())
}

/// Validate input text against the size ceiling, identical for test and
/// replace.
pub fn validate_text(text: &str, config: &EngineConfig) -> Result<()> {
    let length = text.chars().count();
    if length > config.max_text_length {
        return Err(EngineError::TextTooLong {
            length,
            max: config.max_text_length,
        });
    }
    Ok(())
}

/// Compile a pattern with sanitized flags applied as an inline prefix.
///
/// `g`, `u` and `y` do not map to compile-time options: iteration is driven
/// by the algorithms, and the engine is always in unicode mode.
pub fn compile(pattern: &str, flags: &str, backtrack_limit: usize) -> Result<Regex> {
    let mut inline = String::new();
    for flag in ['i', 'm', 's'] {
        if flags.contains(flag) {
            inline.push(flag);
        }
    }
    let source = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{inline}){pattern}")
    };
    RegexBuilder::new(&source)
        .backtrack_limit(backtrack_limit)
        .build()
        .map_err(|e| EngineError::InvalidPattern(e.to_string()))
}

/// Result of a validate task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResult {
    /// Always true on a successful validation; failures reject instead.
    pub ok: bool,
    /// The validated pattern source.
    pub normalized_source: String,
    /// The sanitized flag string.
    pub normalized_flags: String,
    /// Decoded view of the sanitized flags.
    pub flag_bits: FlagBits,
    /// Capturing group census of the pattern.
    pub capturing_groups: usize,
}

/// Run a validate task: compile a fresh instance and report the census.
/// Flags are expected to be sanitized already.
pub fn run_validate(pattern: &str, flags: &str, backtrack_limit: usize) -> Result<ValidateResult> {
    compile(pattern, flags, backtrack_limit)?;
    Ok(ValidateResult {
        ok: true,
        normalized_source: pattern.to_string(),
        normalized_flags: flags.to_string(),
        flag_bits: FlagBits::from_flags(flags),
        capturing_groups: count_capturing_groups(pattern),
    })
}

/// Count capturing groups by a character-level scan of the pattern source.
///
/// Counts `(` that open a capturing group, excluding escaped parentheses,
/// parentheses inside character classes, non-capturing groups `(?:` and all
/// lookaround forms. Named groups `(?<name>` and `(?P<name>` do count. This
/// is deliberately independent of the engine's own group bookkeeping so it
/// can serve `validate`, which never runs a match.
pub fn count_capturing_groups(pattern: &str) -> usize {
    let chars: Vec<char> = pattern.chars().collect();
    let mut count = 0;
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                // Escaped character: skip it entirely, even inside a class.
                i += 1;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.get(i + 1) == Some(&'?') {
                    match chars.get(i + 2) {
                        // (?<name> captures; (?<= and (?<! are lookbehinds.
                        Some('<') => {
                            if !matches!(chars.get(i + 3), Some('=') | Some('!')) {
                                count += 1;
                            }
                        }
                        // (?P<name> captures.
                        Some('P') if chars.get(i + 3) == Some(&'<') => count += 1,
                        // (?:, (?=, (?! and flag groups do not.
                        _ => {}
                    }
                } else {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count
}
