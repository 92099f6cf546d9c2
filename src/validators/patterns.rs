//! Regex construction from declarative length and case rules
//!
//! Every character-class validator compiles a single anchored expression of
//! the form `^[class]{quantifier}$`. The quantifier comes from the rule's
//! length constraint; case folding is on unless `matchCase` is set.

use crate::error::{Error, Result};
use crate::rules::{Length, Rule};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::Mutex;

/// Quantifier used when a character class has no length constraint
pub const ONE_OR_MORE: &str = "+";

/// Quantifier used by the standalone length validator without bounds
pub const ZERO_OR_MORE: &str = "*";

/// Letters
pub const ALPHA_CLASS: &str = "A-Z";

/// Letters and digits
pub const ALNUM_CLASS: &str = "A-Z0-9";

/// Digits
pub const NUMBER_CLASS: &str = "0-9";

/// Printable ASCII
pub const ASCII_CLASS: &str = r"\x20-\x7E";

/// Characters accepted by the standalone length validator
pub const LENGTH_CLASS: &str = r"A-Z0-9.\s_-";

/// Whitespace addition for classes that allow it
const WHITESPACE: &str = r"\s";

/// Largest bound written into a regex quantifier; wider windows are checked
/// by counting characters
pub const MAX_REGEX_REPETITION: usize = 1000;

/// Compiled patterns kept before the cache is flushed
pub const MAX_CACHED_PATTERNS: usize = 256;

static PATTERN_CACHE: Lazy<Mutex<HashMap<(String, bool), Regex>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Length window as `(min, max)`.
///
/// A bare number `n` reads as `(0, n)`. Bounds given the wrong way round are
/// swapped. `None` when no bound is set.
pub fn length_bounds(length: Option<&Length>) -> Option<(usize, Option<usize>)> {
    match length? {
        Length::Max(max) => Some((0, Some(*max))),
        Length::Bounds { min, max } => match (*min, *max) {
            (Some(min), Some(max)) if min > max => Some((max, Some(min))),
            (Some(min), max) => Some((min, max)),
            (None, Some(max)) => Some((0, Some(max))),
            (None, None) => None,
        },
    }
}

/// Repetition derived from a length constraint
pub fn length_quantifier(length: Option<&Length>, default: &str) -> String {
    match length_bounds(length) {
        None => default.to_string(),
        Some((low, Some(high))) => format!("{{{},{}}}", low, high),
        Some((low, None)) => format!("{{{},}}", low),
    }
}

fn exceeds_regex_repetition(bounds: (usize, Option<usize>)) -> bool {
    let (low, high) = bounds;
    low > MAX_REGEX_REPETITION || high.map_or(false, |high| high > MAX_REGEX_REPETITION)
}

/// Source of the anchored pattern for a character class
pub fn class_pattern(class: &str, allow_whitespace: bool, quantifier: &str) -> String {
    let whitespace = if allow_whitespace { WHITESPACE } else { "" };
    format!("^[{}{}]{}$", whitespace, class, quantifier)
}

/// Compile (or fetch from cache) the pattern for a class under a rule
pub fn build_class_regex(
    class: &str,
    rule: &Rule,
    allow_whitespace: bool,
    default_quantifier: &str,
) -> Result<Regex> {
    let quantifier = length_quantifier(rule.length.as_ref(), default_quantifier);
    let source = class_pattern(class, allow_whitespace, &quantifier);
    compile(&source, rule.match_case != Some(true))
}

/// Whether a value consists of the class under the rule's length window.
///
/// Windows too wide for a regex quantifier are checked by counting
/// characters; every class is ASCII, so characters and bytes agree.
pub fn match_class(
    value: &str,
    class: &str,
    rule: &Rule,
    allow_whitespace: bool,
    default_quantifier: &str,
) -> Result<bool> {
    let bounds = length_bounds(rule.length.as_ref());
    let Some((low, high)) = bounds.filter(|bounds| exceeds_regex_repetition(*bounds)) else {
        return Ok(build_class_regex(class, rule, allow_whitespace, default_quantifier)?
            .is_match(value));
    };

    let regex = compile(
        &class_pattern(class, allow_whitespace, ZERO_OR_MORE),
        rule.match_case != Some(true),
    )?;
    let count = value.chars().count();
    Ok(regex.is_match(value) && count >= low && high.map_or(true, |high| count <= high))
}

/// Compile a pattern with the given case folding
pub fn compile(source: &str, case_insensitive: bool) -> Result<Regex> {
    let key = (source.to_string(), case_insensitive);
    if let Ok(cache) = PATTERN_CACHE.lock() {
        if let Some(regex) = cache.get(&key) {
            return Ok(regex.clone());
        }
    }

    let regex = RegexBuilder::new(source)
        .case_insensitive(case_insensitive)
        .unicode(false)
        .build()
        .map_err(|e| Error::Value(format!("cannot compile '{}': {}", source, e)))?;

    if let Ok(mut cache) = PATTERN_CACHE.lock() {
        if cache.len() >= MAX_CACHED_PATTERNS {
            cache.clear();
        }
        cache.insert(key, regex.clone());
    }
    Ok(regex)
}
