//! Built-in value validators
//!
//! Each validator answers one question about a value. When the rule does not
//! ask that question (its discriminating key is absent or names another
//! type) the validator passes, so every validator can be chained and
//! AND-combined unconditionally.

use crate::limits::Limits;
use crate::rules::{FieldType, Rule};
use crate::validators::patterns::{
    match_class, ALNUM_CLASS, ALPHA_CLASS, ASCII_CLASS, LENGTH_CLASS, NUMBER_CLASS,
    ONE_OR_MORE, ZERO_OR_MORE,
};
use crate::validators::Extras;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::fmt;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r"^[A-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Z0-9](?:[A-Z0-9-]*[A-Z0-9])?\.)+[A-Z0-9](?:[A-Z0-9-]*[A-Z0-9])?$",
    )
    .case_insensitive(true)
    .unicode(false)
    .build()
    .unwrap()
});

/// Built-in validators, in chain precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinValidator {
    /// Value must be present
    Required,
    /// Letters only
    Alpha,
    /// Letters and digits
    Alnum,
    /// Printable ASCII
    AsciiText,
    /// Email address
    Email,
    /// Digits only
    Number,
    /// Length only, for untyped rules
    Length,
    /// Custom regular expression
    Regex,
}

/// Built-in validators in chain precedence
pub static BUILTIN_VALIDATORS: [BuiltinValidator; 8] = [
    BuiltinValidator::Required,
    BuiltinValidator::Alpha,
    BuiltinValidator::Alnum,
    BuiltinValidator::AsciiText,
    BuiltinValidator::Email,
    BuiltinValidator::Number,
    BuiltinValidator::Length,
    BuiltinValidator::Regex,
];

impl BuiltinValidator {
    /// Registry key
    pub fn key(&self) -> &'static str {
        match self {
            BuiltinValidator::Required => "required",
            BuiltinValidator::Alpha => "alpha",
            BuiltinValidator::Alnum => "alnum",
            BuiltinValidator::AsciiText => "ascii",
            BuiltinValidator::Email => "email",
            BuiltinValidator::Number => "number",
            BuiltinValidator::Length => "length",
            BuiltinValidator::Regex => "regex",
        }
    }

    /// Look up a built-in by key
    pub fn from_key(key: &str) -> Option<Self> {
        BUILTIN_VALIDATORS.iter().copied().find(|v| v.key() == key)
    }

    /// Whether this validator belongs in the chain for a rule.
    ///
    /// The chain holds `required` when requested, exactly one validator for
    /// the rule's type (the standalone length validator for untyped rules),
    /// and `regex` when a pattern is present.
    pub fn applies_to(&self, rule: &Rule) -> bool {
        match self {
            BuiltinValidator::Required => rule.is_required(),
            BuiltinValidator::Alpha => rule.field_type == Some(FieldType::Alpha),
            BuiltinValidator::Alnum => rule.field_type == Some(FieldType::Alnum),
            BuiltinValidator::AsciiText => matches!(
                rule.field_type,
                Some(FieldType::Ascii) | Some(FieldType::Text)
            ),
            BuiltinValidator::Email => rule.field_type == Some(FieldType::Email),
            BuiltinValidator::Number => rule.field_type == Some(FieldType::Number),
            BuiltinValidator::Length => rule.field_type.is_none() && rule.length.is_some(),
            BuiltinValidator::Regex => rule.regex.is_some(),
        }
    }

    /// Run the validator
    pub fn validate(
        &self,
        value: Option<&str>,
        rule: &Rule,
        previous: bool,
        extras: &Extras,
    ) -> bool {
        match self {
            BuiltinValidator::Required => required_validator(value, rule, previous, extras),
            BuiltinValidator::Alpha => alpha_validator(value, rule, previous, extras),
            BuiltinValidator::Alnum => alnum_validator(value, rule, previous, extras),
            BuiltinValidator::AsciiText => ascii_text_validator(value, rule, previous, extras),
            BuiltinValidator::Email => email_validator(value, rule, previous, extras),
            BuiltinValidator::Number => number_validator(value, rule, previous, extras),
            BuiltinValidator::Length => length_validator(value, rule, previous, extras),
            BuiltinValidator::Regex => regex_validator(value, rule, previous, extras),
        }
    }
}

impl fmt::Display for BuiltinValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

fn class_match(value: Option<&str>, class: &str, rule: &Rule, allow_whitespace: bool, default: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    match match_class(value, class, rule, allow_whitespace, default) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(error = %e, "length constraint produced an unusable pattern");
            false
        }
    }
}

fn whitespace_allowed(rule: &Rule) -> bool {
    rule.allow_whitespace == Some(true)
}

/// Letters only (whitespace when allowed)
pub fn alpha_validator(value: Option<&str>, rule: &Rule, _previous: bool, _extras: &Extras) -> bool {
    if rule.field_type != Some(FieldType::Alpha) {
        return true;
    }
    class_match(value, ALPHA_CLASS, rule, whitespace_allowed(rule), ONE_OR_MORE)
}

/// Letters and digits (whitespace when allowed)
pub fn alnum_validator(value: Option<&str>, rule: &Rule, _previous: bool, _extras: &Extras) -> bool {
    if rule.field_type != Some(FieldType::Alnum) {
        return true;
    }
    class_match(value, ALNUM_CLASS, rule, whitespace_allowed(rule), ONE_OR_MORE)
}

/// Printable ASCII; whitespace always accepted
pub fn ascii_text_validator(
    value: Option<&str>,
    rule: &Rule,
    _previous: bool,
    _extras: &Extras,
) -> bool {
    if !matches!(rule.field_type, Some(FieldType::Ascii) | Some(FieldType::Text)) {
        return true;
    }
    class_match(value, ASCII_CLASS, rule, true, ONE_OR_MORE)
}

/// Digits only (whitespace when allowed)
pub fn number_validator(value: Option<&str>, rule: &Rule, _previous: bool, _extras: &Extras) -> bool {
    if rule.field_type != Some(FieldType::Number) {
        return true;
    }
    class_match(value, NUMBER_CLASS, rule, whitespace_allowed(rule), ONE_OR_MORE)
}

/// Length alone, over a generic character class
pub fn length_validator(value: Option<&str>, rule: &Rule, _previous: bool, _extras: &Extras) -> bool {
    if rule.length.is_none() {
        return true;
    }
    class_match(value, LENGTH_CLASS, rule, false, ZERO_OR_MORE)
}

/// Email address, within the structural limits carried by `extras`
pub fn email_validator(value: Option<&str>, rule: &Rule, _previous: bool, extras: &Extras) -> bool {
    if rule.field_type != Some(FieldType::Email) {
        return true;
    }
    value
        .map(|v| is_valid_email(v, &extras.limits))
        .unwrap_or(false)
}

/// Check an email address: structure first, then the pattern
pub fn is_valid_email(value: &str, limits: &Limits) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if !limits.check_email_local_part(local) || !limits.check_email_domain(domain) {
        return false;
    }

    EMAIL_PATTERN.is_match(value)
}

/// Presence; a checkbox must be checked and carry the value `on`
pub fn required_validator(value: Option<&str>, rule: &Rule, _previous: bool, extras: &Extras) -> bool {
    if !rule.is_required() {
        return true;
    }

    let Some(value) = value else {
        return false;
    };
    if value.is_empty() {
        return false;
    }

    match rule.field_type {
        Some(FieldType::Checkbox) => extras.checked == Some(true) && value == "on",
        _ => !value.is_empty(),
    }
}

/// Custom regular expression; an absent value is tested as empty
pub fn regex_validator(value: Option<&str>, rule: &Rule, _previous: bool, _extras: &Extras) -> bool {
    match &rule.regex {
        None => true,
        Some(pattern) => pattern.is_match(value.unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Length;
    use proptest::prelude::*;

    fn none() -> Extras {
        Extras::default()
    }

    fn typed(field_type: FieldType) -> Rule {
        Rule::new().of_type(field_type)
    }

    #[test]
    fn test_alpha_validator() {
        let rule = typed(FieldType::Alpha);
        assert!(alpha_validator(Some("John"), &rule, true, &none()));
        assert!(!alpha_validator(Some("John1"), &rule, true, &none()));
        assert!(!alpha_validator(Some("John Doe"), &rule, true, &none()));
        assert!(!alpha_validator(Some(""), &rule, true, &none()));
        assert!(!alpha_validator(None, &rule, true, &none()));

        let rule = rule.allow_whitespace(true);
        assert!(alpha_validator(Some("John Doe"), &rule, true, &none()));
    }

    #[test]
    fn test_alnum_length_boundaries() {
        let rule = typed(FieldType::Alnum).length(Length::between(4, 5));
        assert!(alnum_validator(Some("John"), &rule, true, &none()));
        assert!(alnum_validator(Some("John5"), &rule, true, &none()));
        assert!(!alnum_validator(Some("Tom"), &rule, true, &none()));
        assert!(!alnum_validator(Some("Andrew"), &rule, true, &none()));
    }

    #[test]
    fn test_match_case() {
        let rule = typed(FieldType::Alpha).match_case(true);
        assert!(!alpha_validator(Some("john"), &rule, true, &none()));
        assert!(alpha_validator(Some("JOHN"), &rule, true, &none()));
    }

    #[test]
    fn test_ascii_text_validator() {
        let rule = typed(FieldType::Ascii);
        assert!(ascii_text_validator(Some("Hello, world! #1"), &rule, true, &none()));
        assert!(!ascii_text_validator(Some("héllo"), &rule, true, &none()));

        let rule = typed(FieldType::Text).length(Length::Max(3));
        assert!(ascii_text_validator(Some("a b"), &rule, true, &none()));
        assert!(!ascii_text_validator(Some("a b c"), &rule, true, &none()));
    }

    #[test]
    fn test_number_validator() {
        let rule = typed(FieldType::Number).length(Length::min(7));
        assert!(number_validator(Some("1234567"), &rule, true, &none()));
        assert!(!number_validator(Some("123456"), &rule, true, &none()));
        assert!(!number_validator(Some("123 4567"), &rule, true, &none()));

        let rule = rule.allow_whitespace(true);
        assert!(number_validator(Some("123 4567"), &rule, true, &none()));
    }

    #[test]
    fn test_length_validator() {
        assert!(length_validator(Some("anything @ all"), &Rule::new(), true, &none()));

        let rule = Rule::new().length(Length::Max(5));
        assert!(length_validator(Some(""), &rule, true, &none()));
        assert!(length_validator(Some("a.b_c"), &rule, true, &none()));
        assert!(!length_validator(Some("abcdef"), &rule, true, &none()));
    }

    #[test]
    fn test_email_validator() {
        let rule = typed(FieldType::Email);
        assert!(email_validator(Some("john-doe@doe-family.com"), &rule, true, &none()));
        assert!(!email_validator(Some("john-doe"), &rule, true, &none()));
        assert!(!email_validator(Some("a@b@c.com"), &rule, true, &none()));
        assert!(!email_validator(Some("john@"), &rule, true, &none()));
        assert!(!email_validator(None, &rule, true, &none()));
    }

    #[test]
    fn test_email_validator_uses_extras_limits() {
        let rule = typed(FieldType::Email);
        let address = format!("{}@example.com", "a".repeat(40));
        assert!(email_validator(Some(&address), &rule, true, &none()));

        let strict = Extras {
            limits: Limits::strict(),
            ..Extras::default()
        };
        assert!(!email_validator(Some(&address), &rule, true, &strict));
    }

    #[test]
    fn test_email_structural_limits() {
        let limits = Limits::default();
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(!is_valid_email(&long_local, &limits));
        let ok_local = format!("{}@example.com", "a".repeat(64));
        assert!(is_valid_email(&ok_local, &limits));

        let long_label = format!("john@{}.com", "a".repeat(64));
        assert!(!is_valid_email(&long_label, &limits));

        assert!(!is_valid_email(&ok_local, &Limits::strict()));
    }

    #[test]
    fn test_required_validator() {
        let rule = Rule::new().required(true);
        assert!(required_validator(Some("x"), &rule, true, &none()));
        assert!(!required_validator(Some(""), &rule, true, &none()));
        assert!(!required_validator(None, &rule, true, &none()));
        assert!(required_validator(None, &Rule::new(), true, &none()));
    }

    #[test]
    fn test_required_checkbox() {
        let rule = Rule::new().required(true).of_type(FieldType::Checkbox);
        let checked = Extras {
            checked: Some(true),
            ..Extras::default()
        };
        let unchecked = Extras {
            checked: Some(false),
            ..Extras::default()
        };

        assert!(required_validator(Some("on"), &rule, true, &checked));
        assert!(!required_validator(Some("yes"), &rule, true, &checked));
        assert!(!required_validator(Some("on"), &rule, true, &unchecked));
        assert!(!required_validator(Some("on"), &rule, true, &none()));
    }

    #[test]
    fn test_regex_validator() {
        let rule = Rule::new().regex(r"^\d{3}-\d{4}$").unwrap();
        assert!(regex_validator(Some("555-1234"), &rule, true, &none()));
        assert!(!regex_validator(Some("5551234"), &rule, true, &none()));
        assert!(!regex_validator(None, &rule, true, &none()));
        assert!(regex_validator(Some("anything"), &Rule::new(), true, &none()));

        let rule = Rule::new().pattern(Regex::new("^a*$").unwrap());
        assert!(regex_validator(None, &rule, true, &none()));
    }

    #[test]
    fn test_applies_to_picks_one_type_validator() {
        let rule = Rule::new()
            .required(true)
            .of_type(FieldType::Email)
            .length(Length::Max(10))
            .regex("@").unwrap();
        let chain: Vec<_> = BUILTIN_VALIDATORS
            .iter()
            .filter(|v| v.applies_to(&rule))
            .map(|v| v.key())
            .collect();
        assert_eq!(chain, vec!["required", "email", "regex"]);

        let rule = Rule::new().length(Length::Max(10));
        let chain: Vec<_> = BUILTIN_VALIDATORS
            .iter()
            .filter(|v| v.applies_to(&rule))
            .map(|v| v.key())
            .collect();
        assert_eq!(chain, vec!["length"]);
    }

    #[test]
    fn test_from_key() {
        assert_eq!(BuiltinValidator::from_key("email"), Some(BuiltinValidator::Email));
        assert_eq!(BuiltinValidator::from_key("ascii"), Some(BuiltinValidator::AsciiText));
        assert_eq!(BuiltinValidator::from_key("zip"), None);
    }

    proptest! {
        #[test]
        fn prop_type_validators_bypass_without_type(value in proptest::option::of(".*")) {
            let rule = Rule::new();
            let value = value.as_deref();
            for validator in [
                BuiltinValidator::Alpha,
                BuiltinValidator::Alnum,
                BuiltinValidator::AsciiText,
                BuiltinValidator::Email,
                BuiltinValidator::Number,
            ] {
                prop_assert!(validator.validate(value, &rule, false, &Extras::default()));
            }
        }

        #[test]
        fn prop_type_validators_bypass_on_other_type(value in "[a-z0-9@.]{0,12}") {
            let rule = Rule::new().of_type(FieldType::Checkbox);
            prop_assert!(alpha_validator(Some(&value), &rule, true, &Extras::default()));
            prop_assert!(email_validator(Some(&value), &rule, true, &Extras::default()));
            prop_assert!(number_validator(Some(&value), &rule, true, &Extras::default()));
        }

        #[test]
        fn prop_alnum_length_window(len in 0usize..12) {
            let rule = Rule::new().of_type(FieldType::Alnum).length(Length::between(4, 5));
            let value = "a".repeat(len);
            let expected = (4..=5).contains(&len);
            prop_assert_eq!(alnum_validator(Some(&value), &rule, true, &Extras::default()), expected);
        }
    }
}
