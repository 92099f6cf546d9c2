//! Declarative field rules
//!
//! A [`Rule`] is a bag of optional constraints. Rules for the same field are
//! merged by shallow extension: keys present in the newer rule replace the
//! older values, absent keys leave them untouched.

use crate::dom::ElementId;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Letters and digits
    Alnum,
    /// Letters only
    Alpha,
    /// Printable ASCII text
    Ascii,
    /// Email address
    Email,
    /// Digits only
    Number,
    /// Free text, validated as printable ASCII
    Text,
    /// Checkbox; only `required` applies
    Checkbox,
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alnum" => Ok(FieldType::Alnum),
            "alpha" => Ok(FieldType::Alpha),
            "ascii" => Ok(FieldType::Ascii),
            "email" => Ok(FieldType::Email),
            "number" => Ok(FieldType::Number),
            "text" => Ok(FieldType::Text),
            "checkbox" => Ok(FieldType::Checkbox),
            _ => Err(Error::Type(format!("unknown field type '{}'", s))),
        }
    }
}

impl FieldType {
    /// Get the type as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Alnum => "alnum",
            FieldType::Alpha => "alpha",
            FieldType::Ascii => "ascii",
            FieldType::Email => "email",
            FieldType::Number => "number",
            FieldType::Text => "text",
            FieldType::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Length constraint: a bare maximum or explicit bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    /// Bare number, read as "at most n"
    Max(usize),
    /// Explicit bounds, either side optional
    Bounds {
        /// Lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        /// Upper bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
}

impl Length {
    /// At least `min`
    pub fn min(min: usize) -> Self {
        Length::Bounds {
            min: Some(min),
            max: None,
        }
    }

    /// At most `max`
    pub fn max(max: usize) -> Self {
        Length::Bounds {
            min: None,
            max: Some(max),
        }
    }

    /// Between `min` and `max` inclusive
    pub fn between(min: usize, max: usize) -> Self {
        Length::Bounds {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Compiled regular expression carried by a rule
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern from source
    pub fn new(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Pattern)
            .map_err(|e| Error::Value(format!("invalid regex '{}': {}", source, e)))
    }

    /// Pattern source
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Test a value against the pattern
    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern(regex)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Rule keys, for targeted lookup and removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKey {
    /// `required`
    Required,
    /// `type`
    Type,
    /// `length`
    Length,
    /// `allowWhitespace`
    AllowWhitespace,
    /// `matchCase`
    MatchCase,
    /// `regex`
    Regex,
    /// `field`
    Field,
}

impl FromStr for RuleKey {
    type Err = Error;

    /// Parse from the JSON key name
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "required" => Ok(RuleKey::Required),
            "type" => Ok(RuleKey::Type),
            "length" => Ok(RuleKey::Length),
            "allowWhitespace" => Ok(RuleKey::AllowWhitespace),
            "matchCase" => Ok(RuleKey::MatchCase),
            "regex" => Ok(RuleKey::Regex),
            "field" | "fieldId" => Ok(RuleKey::Field),
            _ => Err(Error::Type(format!("unknown rule key '{}'", s))),
        }
    }
}

/// Value stored under a rule key
#[derive(Debug, Clone, PartialEq)]
pub enum RuleValue {
    /// Boolean flags
    Bool(bool),
    /// Field type
    Type(FieldType),
    /// Length constraint
    Length(Length),
    /// Regular expression
    Pattern(Pattern),
    /// Owning field
    Field(ElementId),
}

/// Declarative constraints for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Value must be present (checked, for checkboxes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Kind of value
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Length constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<Length>,

    /// Whether whitespace is accepted by the character-class validators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_whitespace: Option<bool>,

    /// Whether letter case is significant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_case: Option<bool>,

    /// Custom regular expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<Pattern>,

    /// Owning field
    #[serde(default, alias = "fieldId", skip_serializing_if = "Option::is_none")]
    pub field: Option<ElementId>,
}

impl Rule {
    /// Create an empty rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule targeting a field
    pub fn for_field(id: impl Into<ElementId>) -> Self {
        Self {
            field: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parse a rule from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set `required`
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set `type`
    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    /// Set `length`
    pub fn length(mut self, length: Length) -> Self {
        self.length = Some(length);
        self
    }

    /// Set `allowWhitespace`
    pub fn allow_whitespace(mut self, allow: bool) -> Self {
        self.allow_whitespace = Some(allow);
        self
    }

    /// Set `matchCase`
    pub fn match_case(mut self, match_case: bool) -> Self {
        self.match_case = Some(match_case);
        self
    }

    /// Compile and set `regex`
    pub fn regex(mut self, source: &str) -> Result<Self> {
        self.regex = Some(Pattern::new(source)?);
        Ok(self)
    }

    /// Set an already compiled `regex`
    pub fn pattern(mut self, regex: Regex) -> Self {
        self.regex = Some(Pattern::from(regex));
        self
    }

    /// Set the owning field
    pub fn field(mut self, id: impl Into<ElementId>) -> Self {
        self.field = Some(id.into());
        self
    }

    /// Whether `required` is set to true
    pub fn is_required(&self) -> bool {
        self.required == Some(true)
    }

    /// Whether the rule targets a checkbox
    pub fn is_checkbox(&self) -> bool {
        self.field_type == Some(FieldType::Checkbox)
    }

    /// Normalized id of the owning field
    pub fn field_id(&self) -> Option<String> {
        self.field.as_ref().map(ElementId::normalized)
    }

    /// Shallow-extend with another rule: present keys overwrite
    pub fn extend(&mut self, other: &Rule) {
        if other.required.is_some() {
            self.required = other.required;
        }
        if other.field_type.is_some() {
            self.field_type = other.field_type;
        }
        if other.length.is_some() {
            self.length = other.length;
        }
        if other.allow_whitespace.is_some() {
            self.allow_whitespace = other.allow_whitespace;
        }
        if other.match_case.is_some() {
            self.match_case = other.match_case;
        }
        if other.regex.is_some() {
            self.regex = other.regex.clone();
        }
        if other.field.is_some() {
            self.field = other.field.clone();
        }
    }

    /// Remove one key
    pub fn remove(&mut self, key: RuleKey) {
        match key {
            RuleKey::Required => self.required = None,
            RuleKey::Type => self.field_type = None,
            RuleKey::Length => self.length = None,
            RuleKey::AllowWhitespace => self.allow_whitespace = None,
            RuleKey::MatchCase => self.match_case = None,
            RuleKey::Regex => self.regex = None,
            RuleKey::Field => self.field = None,
        }
    }

    /// Value stored under a key, if any
    pub fn get(&self, key: RuleKey) -> Option<RuleValue> {
        match key {
            RuleKey::Required => self.required.map(RuleValue::Bool),
            RuleKey::Type => self.field_type.map(RuleValue::Type),
            RuleKey::Length => self.length.map(RuleValue::Length),
            RuleKey::AllowWhitespace => self.allow_whitespace.map(RuleValue::Bool),
            RuleKey::MatchCase => self.match_case.map(RuleValue::Bool),
            RuleKey::Regex => self.regex.clone().map(RuleValue::Pattern),
            RuleKey::Field => self.field.clone().map(RuleValue::Field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extend_is_shallow_override() {
        let mut rule = Rule::new().length(Length::Max(5));
        rule.extend(&Rule::new().of_type(FieldType::Ascii));
        assert_eq!(rule.length, Some(Length::Max(5)));
        assert_eq!(rule.field_type, Some(FieldType::Ascii));

        rule.extend(&Rule::new().length(Length::min(2)));
        assert_eq!(rule.length, Some(Length::min(2)));
        assert_eq!(rule.field_type, Some(FieldType::Ascii));
    }

    #[test]
    fn test_remove_and_get() {
        let mut rule = Rule::new().required(true).of_type(FieldType::Email);
        assert_eq!(rule.get(RuleKey::Required), Some(RuleValue::Bool(true)));
        rule.remove(RuleKey::Required);
        assert_eq!(rule.get(RuleKey::Required), None);
        assert_eq!(rule.get(RuleKey::Type), Some(RuleValue::Type(FieldType::Email)));
    }

    #[test]
    fn test_rule_from_json() {
        let rule = Rule::from_json(
            r#"{"fieldId": "phone", "type": "number", "length": {"min": 7}, "matchCase": true}"#,
        )
        .unwrap();
        assert_eq!(rule.field_id().as_deref(), Some("phone"));
        assert_eq!(rule.field_type, Some(FieldType::Number));
        assert_eq!(rule.length, Some(Length::min(7)));
        assert_eq!(rule.match_case, Some(true));

        let rule = Rule::from_json(r#"{"field": 3, "length": 5, "regex": "^a"}"#).unwrap();
        assert_eq!(rule.field_id().as_deref(), Some("3"));
        assert_eq!(rule.length, Some(Length::Max(5)));
        assert!(rule.regex.as_ref().unwrap().is_match("abc"));
    }

    #[test]
    fn test_rule_from_json_rejects_bad_input() {
        assert!(Rule::from_json(r#"{"type": "colour"}"#).is_err());
        assert!(Rule::from_json(r#"{"regex": "("}"#).is_err());
        assert!(Rule::from_json("5").is_err());
    }

    #[test]
    fn test_rule_serializes_camel_case() {
        let rule = Rule::for_field("name")
            .allow_whitespace(true)
            .length(Length::between(2, 4));
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allowWhitespace": true,
                "length": {"min": 2, "max": 4},
                "field": "name"
            })
        );
    }

    #[test]
    fn test_invalid_regex_is_value_error() {
        assert!(matches!(Rule::new().regex("[a-"), Err(Error::Value(_))));
    }

    #[test]
    fn test_rule_key_from_str() {
        assert_eq!("fieldId".parse::<RuleKey>().unwrap(), RuleKey::Field);
        assert_eq!(
            "allowWhitespace".parse::<RuleKey>().unwrap(),
            RuleKey::AllowWhitespace
        );
        assert!("colour".parse::<RuleKey>().is_err());
    }

    #[test]
    fn test_field_type_parse() {
        assert_eq!("number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert!(matches!("date".parse::<FieldType>(), Err(Error::Type(_))));
    }
}
