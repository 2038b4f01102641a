//! Field kinds, the lookups each of them supports, and bound fields.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LookupError, Query, Timestamp};

/// A filter value, parsed according to the lookup it is used with.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Time(Timestamp),
    Boolean(bool),
}

/// The way in which the value of a particular lookup must be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueParser {
    /// Any string is accepted as-is.
    String,
    /// A floating point number.
    Number,
    /// An ISO 8601 date or date/time. See [`Timestamp`].
    Time,
    /// `true` or `false`, case-insensitive.
    Boolean,
}

impl ValueParser {
    /// Attempt to parse the given raw value.
    pub fn parse(&self, value: &str) -> Result<Literal, LookupError> {
        match self {
            Self::String => Ok(Literal::String(value.to_string())),
            Self::Number => value.trim().parse::<f64>().map(Literal::Number).map_err(|_| {
                LookupError::InvalidValue(format!("could not convert string to float: '{}'", value))
            }),
            Self::Time => Timestamp::from_str(value).map(Literal::Time),
            Self::Boolean => parse_boolean(value).map(Literal::Boolean),
        }
    }
}

fn parse_boolean(value: &str) -> Result<bool, LookupError> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LookupError::InvalidValue(
            "Expected 'true' or 'false'".to_string(),
        )),
    }
}

/// An ordered table of the lookups supported by a kind of field, together with
/// how each lookup's value must be parsed.
pub type Lookups = &'static [(&'static str, ValueParser)];

/// Behaviour shared by every kind of field.
///
/// The first entry in a kind's lookup table is its default lookup.
pub trait FieldKind: Send + Sync {
    /// The name used when displaying fields of this kind, e.g. `StringField`.
    fn name(&self) -> &'static str;

    fn lookups(&self) -> Lookups;

    /// Whether values of this kind are stored, as opposed to being computed.
    fn is_concrete(&self) -> bool {
        true
    }

    /// Parse the given value for the given lookup, explaining why this
    /// combination is not well-formed if that is the case.
    fn check(&self, lookup: &str, value: &str) -> Result<Literal, LookupError> {
        let lookups = self.lookups();
        let parser = lookups
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, parser)| parser)
            .ok_or_else(|| LookupError::UnknownLookup {
                lookup: lookup.to_string(),
                expected: lookups.iter().map(|(name, _)| *name).collect(),
            })?;
        parser.parse(value)
    }

    fn validate(&self, lookup: &str, value: &str) -> bool {
        self.check(lookup, value).is_ok()
    }

    fn default_lookup(&self) -> Option<&'static str> {
        self.lookups().first().map(|(name, _)| *name)
    }
}

/// The kind used for fields whose declared type is not recognized. It
/// supports no lookups at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseField;

impl FieldKind for BaseField {
    fn name(&self) -> &'static str {
        "Field"
    }

    fn lookups(&self) -> Lookups {
        &[]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringField;

impl FieldKind for StringField {
    fn name(&self) -> &'static str {
        "StringField"
    }

    fn lookups(&self) -> Lookups {
        &[
            ("equals", ValueParser::String),
            ("contains", ValueParser::String),
            ("starts_with", ValueParser::String),
            ("ends_with", ValueParser::String),
            ("regex", ValueParser::String),
            ("not_equals", ValueParser::String),
            ("not_contains", ValueParser::String),
            ("not_starts_with", ValueParser::String),
            ("not_ends_with", ValueParser::String),
            ("not_regex", ValueParser::String),
            ("is_null", ValueParser::Boolean),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NumberField;

impl FieldKind for NumberField {
    fn name(&self) -> &'static str {
        "NumberField"
    }

    fn lookups(&self) -> Lookups {
        &[
            ("equal", ValueParser::Number),
            ("not_equal", ValueParser::Number),
            ("gt", ValueParser::Number),
            ("gte", ValueParser::Number),
            ("lt", ValueParser::Number),
            ("lte", ValueParser::Number),
            ("is_null", ValueParser::Boolean),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeField;

impl FieldKind for TimeField {
    fn name(&self) -> &'static str {
        "TimeField"
    }

    fn lookups(&self) -> Lookups {
        &[
            ("equal", ValueParser::Time),
            ("not_equal", ValueParser::Time),
            ("gt", ValueParser::Time),
            ("gte", ValueParser::Time),
            ("lt", ValueParser::Time),
            ("lte", ValueParser::Time),
            ("is_null", ValueParser::Boolean),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanField;

impl FieldKind for BooleanField {
    fn name(&self) -> &'static str {
        "BooleanField"
    }

    fn lookups(&self) -> Lookups {
        &[
            ("equal", ValueParser::Boolean),
            ("not_equal", ValueParser::Boolean),
            ("is_null", ValueParser::Boolean),
        ]
    }
}

/// A field whose value is computed rather than stored.
///
/// Values filtered against calculated fields are passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatedField;

impl FieldKind for CalculatedField {
    fn name(&self) -> &'static str {
        "CalculatedField"
    }

    fn lookups(&self) -> Lookups {
        &[]
    }

    fn is_concrete(&self) -> bool {
        false
    }

    fn check(&self, _lookup: &str, value: &str) -> Result<Literal, LookupError> {
        Ok(Literal::String(value.to_string()))
    }
}

/// The type tag with which a schema declares the kind of each field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Time,
    Boolean,
    Calculated,
    /// Any type tag we don't recognize.
    #[serde(other)]
    Base,
}

impl FieldType {
    /// The behaviour associated with this type of field.
    pub fn kind(&self) -> &'static dyn FieldKind {
        match self {
            Self::String => &StringField,
            Self::Number => &NumberField,
            Self::Time => &TimeField,
            Self::Boolean => &BooleanField,
            Self::Calculated => &CalculatedField,
            Self::Base => &BaseField,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind().name())
    }
}

/// A field path that has been resolved against a schema to a specific type of
/// field.
///
/// Two fields are equal if they have the same type and path, regardless of
/// which query they belong to.
#[derive(Debug, Clone)]
pub struct Field<'q> {
    field_type: FieldType,
    path: String,
    query: Option<&'q Query>,
}

impl<'q> Field<'q> {
    /// Constructor.
    pub fn new<P: AsRef<str>>(field_type: FieldType, path: P, query: Option<&'q Query>) -> Self {
        Self {
            field_type,
            path: path.as_ref().to_string(),
            query,
        }
    }

    /// The full `__`-separated path of this field, relative to the root model
    /// of the query.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn kind(&self) -> &'static dyn FieldKind {
        self.field_type.kind()
    }

    /// The query to which this field belongs, if any.
    pub fn query(&self) -> Option<&'q Query> {
        self.query
    }

    pub fn is_concrete(&self) -> bool {
        self.kind().is_concrete()
    }

    pub fn check(&self, lookup: &str, value: &str) -> Result<Literal, LookupError> {
        self.kind().check(lookup, value)
    }

    pub fn validate(&self, lookup: &str, value: &str) -> bool {
        self.kind().validate(lookup, value)
    }

    pub fn default_lookup(&self) -> Option<&'static str> {
        self.kind().default_lookup()
    }
}

impl<'q> PartialEq for Field<'q> {
    fn eq(&self, other: &Self) -> bool {
        self.field_type == other.field_type && self.path == other.path
    }
}

impl<'q> Eq for Field<'q> {}

impl<'q> Hash for Field<'q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field_type.hash(state);
        self.path.hash(state);
    }
}

impl<'q> fmt::Display for Field<'q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}('{}')", self.field_type, self.path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL_TYPES: &[FieldType] = &[
        FieldType::String,
        FieldType::Number,
        FieldType::Time,
        FieldType::Boolean,
        FieldType::Calculated,
        FieldType::Base,
    ];

    #[test]
    fn string_field_validation() {
        assert!(StringField.validate("contains", "hello"));
        assert!(StringField.validate("not_regex", "^h.*o$"));
        assert!(!StringField.validate("pontains", "hello"));
        assert!(!StringField.validate("gt", "hello"));
    }

    #[test]
    fn number_field_validation() {
        assert!(NumberField.validate("gt", "6.1"));
        assert!(NumberField.validate("lte", " -3 "));
        assert!(!NumberField.validate("pontains", "6.1"));
        assert!(!NumberField.validate("gt", "hello"));
        assert!(NumberField.validate("is_null", "True"));
        assert!(!NumberField.validate("is_null", "hello"));
    }

    #[test]
    fn time_field_validation() {
        assert!(TimeField.validate("gt", "2018-03-20T22:31:23"));
        assert!(!TimeField.validate("gt", "hello"));
        assert!(!TimeField.validate("gt", "-2018-03-20"));
        assert!(!TimeField.validate("pontains", "2018-03-20T22:31:23"));
        assert!(TimeField.validate("is_null", "True"));
        assert!(!TimeField.validate("is_null", "hello"));
    }

    #[test]
    fn boolean_field_validation() {
        assert!(BooleanField.validate("equal", "True"));
        assert!(BooleanField.validate("not_equal", "false"));
        assert!(!BooleanField.validate("equal", "hello"));
        assert!(!BooleanField.validate("pontains", "True"));
    }

    #[test]
    fn calculated_field_is_always_valid() {
        assert!(CalculatedField.validate("gt", "1"));
        assert!(CalculatedField.validate("pontains", "hello"));
        assert!(CalculatedField.validate("", ""));
        assert!(!CalculatedField.is_concrete());
    }

    #[test]
    fn base_field_supports_nothing() {
        assert!(!BaseField.validate("equals", "hello"));
        assert!(!BaseField.validate("is_null", "True"));
        assert_eq!(BaseField.default_lookup(), None);
    }

    #[test]
    fn unknown_lookups_are_rejected() {
        for field_type in ALL_TYPES {
            let expected = *field_type == FieldType::Calculated;
            assert_eq!(
                field_type.kind().validate("pontains", "hello"),
                expected,
                "{}",
                field_type
            );
        }
    }

    #[test]
    fn is_null_requires_boolean_literal() {
        for field_type in ALL_TYPES {
            let kind = field_type.kind();
            if !kind.lookups().iter().any(|(name, _)| *name == "is_null") {
                continue;
            }
            assert!(kind.validate("is_null", "True"), "{}", field_type);
            assert!(kind.validate("is_null", "false"), "{}", field_type);
            assert!(!kind.validate("is_null", "hello"), "{}", field_type);
        }
    }

    #[test]
    fn default_lookups() {
        assert_eq!(StringField.default_lookup(), Some("equals"));
        assert_eq!(NumberField.default_lookup(), Some("equal"));
        assert_eq!(TimeField.default_lookup(), Some("equal"));
        assert_eq!(BooleanField.default_lookup(), Some("equal"));
        assert_eq!(CalculatedField.default_lookup(), None);
    }

    #[test]
    fn check_distinguishes_failure_modes() {
        match NumberField.check("pontains", "6.1") {
            Err(LookupError::UnknownLookup { lookup, expected }) => {
                assert_eq!(lookup, "pontains");
                assert_eq!(
                    expected,
                    vec!["equal", "not_equal", "gt", "gte", "lt", "lte", "is_null"]
                );
            }
            other => panic!("expected an unknown lookup error, but got {:?}", other),
        }
        assert_eq!(
            NumberField.check("gt", "hello"),
            Err(LookupError::InvalidValue(
                "could not convert string to float: 'hello'".to_string()
            ))
        );
        assert_eq!(
            BooleanField.check("equal", "maybe"),
            Err(LookupError::InvalidValue("Expected 'true' or 'false'".to_string()))
        );
    }

    #[test]
    fn check_parses_values() {
        assert_eq!(NumberField.check("gt", "6.1"), Ok(Literal::Number(6.1)));
        assert_eq!(BooleanField.check("equal", "TRUE"), Ok(Literal::Boolean(true)));
        assert_eq!(
            StringField.check("is_null", "False"),
            Ok(Literal::Boolean(false))
        );
        assert_eq!(
            StringField.check("contains", "fred"),
            Ok(Literal::String("fred".to_string()))
        );
        match TimeField.check("gte", "2018-03-20") {
            Ok(Literal::Time(ts)) => assert_eq!(ts.to_string(), "2018-03-20T00:00:00Z"),
            other => panic!("expected a timestamp, but got {:?}", other),
        }
    }

    #[test]
    fn field_type_tags() {
        let parsed: Vec<FieldType> =
            serde_json::from_str(r#"["string", "number", "time", "boolean", "calculated", "uuid"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                FieldType::String,
                FieldType::Number,
                FieldType::Time,
                FieldType::Boolean,
                FieldType::Calculated,
                FieldType::Base,
            ]
        );
    }

    #[test]
    fn field_identity() {
        let query = Query::new("app", "model", Default::default(), "html", Vec::new());
        let a = Field::new(FieldType::String, "fa", Some(&query));
        let b = Field::new(FieldType::String, "fa", None);
        assert_eq!(a, b);
        assert_ne!(a, Field::new(FieldType::Number, "fa", None));
        assert_ne!(a, Field::new(FieldType::String, "fb", None));
        assert_eq!(a.to_string(), "StringField('fa')");
        assert_eq!(a.query(), Some(&query));
    }
}
