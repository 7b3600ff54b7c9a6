//! Filter expressions over listing attributes
//!
//! A [`FilterExpression`] is built from the `filters` document a language
//! model produces. Construction is the allow-list check that sits between the
//! interpreter and the store: only known fields, only the operators each
//! field type supports, only correctly typed operands. Anything else is
//! rejected with a [`FilterError`] instead of being forwarded.
//!
//! The accepted syntax is the MongoDB query subset below, and
//! [`FilterExpression::to_document`] renders the same syntax back:
//!
//! | field      | type   | conditions                                                   |
//! |------------|--------|--------------------------------------------------------------|
//! | `flatType` | text   | `"3BHK"`, `{"$eq": ..}`, `{"$in": [..]}`, `{"$regex": .., "$options": "i"}` |
//! | `locality` | text   | same as `flatType`                                            |
//! | `price`    | number | `20000`, or any mix of `$eq` `$lt` `$lte` `$gt` `$gte`        |

use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Listing attributes a filter may constrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterField {
    /// Unit type, e.g. "3BHK"
    FlatType,
    /// Area or neighbourhood
    Locality,
    /// Rent or sale price
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
}

impl FilterField {
    /// Every allowed field, in rendering order
    pub const ALL: [FilterField; 3] = [Self::FlatType, Self::Locality, Self::Price];

    /// Attribute name as stored in listing documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlatType => "flatType",
            Self::Locality => "locality",
            Self::Price => "price",
        }
    }

    /// Look up a field by its attribute name (exact match)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    fn kind(&self) -> FieldKind {
        match self {
            Self::FlatType | Self::Locality => FieldKind::Text,
            Self::Price => FieldKind::Number,
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `$eq`
    Eq,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
}

impl CompareOp {
    /// Operator key in query syntax
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "$eq" => Some(Self::Eq),
            "$lt" => Some(Self::Lt),
            "$lte" => Some(Self::Lte),
            "$gt" => Some(Self::Gt),
            "$gte" => Some(Self::Gte),
            _ => None,
        }
    }

    fn holds(&self, value: f64, operand: f64) -> bool {
        match self {
            Self::Eq => value == operand,
            Self::Lt => value < operand,
            Self::Lte => value <= operand,
            Self::Gt => value > operand,
            Self::Gte => value >= operand,
        }
    }
}

/// Substring pattern on a text attribute
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    case_insensitive: bool,
    regex: Regex,
}

impl Pattern {
    fn new(source: &str, case_insensitive: bool) -> std::result::Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            source: source.to_string(),
            case_insensitive,
            regex,
        })
    }

    /// Pattern text as the model wrote it
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether matching ignores case
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.case_insensitive == other.case_insensitive
    }
}

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact text equality
    Text(String),
    /// Text equal to any of the values
    AnyOf(Vec<String>),
    /// Unanchored pattern match on text
    Pattern(Pattern),
    /// Exact numeric equality
    Number(Number),
    /// Every comparison must hold
    Range(Vec<(CompareOp, Number)>),
}

impl Condition {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Text(expected) => value.as_str() == Some(expected.as_str()),
            Self::AnyOf(options) => value
                .as_str()
                .map_or(false, |text| options.iter().any(|o| o == text)),
            Self::Pattern(pattern) => value
                .as_str()
                .map_or(false, |text| pattern.regex.is_match(text)),
            Self::Number(expected) => match (value.as_f64(), expected.as_f64()) {
                (Some(actual), Some(expected)) => actual == expected,
                _ => false,
            },
            Self::Range(comparisons) => value.as_f64().map_or(false, |actual| {
                comparisons.iter().all(|(op, operand)| {
                    operand
                        .as_f64()
                        .map_or(false, |operand| op.holds(actual, operand))
                })
            }),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::AnyOf(options) => {
                let mut map = Map::new();
                map.insert(
                    "$in".to_string(),
                    Value::Array(options.iter().cloned().map(Value::String).collect()),
                );
                Value::Object(map)
            }
            Self::Pattern(pattern) => {
                let mut map = Map::new();
                map.insert(
                    "$regex".to_string(),
                    Value::String(pattern.source.clone()),
                );
                if pattern.case_insensitive {
                    map.insert("$options".to_string(), Value::String("i".to_string()));
                }
                Value::Object(map)
            }
            Self::Number(number) => Value::Number(number.clone()),
            Self::Range(comparisons) => {
                let mut map = Map::new();
                for (op, operand) in comparisons {
                    map.insert(op.as_str().to_string(), Value::Number(operand.clone()));
                }
                Value::Object(map)
            }
        }
    }
}

/// Reasons a filter document is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The filters value is not a JSON object
    #[error("filters must be a JSON object")]
    NotAnObject,

    /// Field outside the allow-list
    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    /// Text field given a non-text operand
    #[error("field '{field}' expects text")]
    ExpectedText {
        /// Offending field
        field: FilterField,
    },

    /// Numeric field given a non-numeric operand
    #[error("field '{field}' expects a number")]
    ExpectedNumber {
        /// Offending field
        field: FilterField,
    },

    /// Operator not supported for the field's type
    #[error("operator '{operator}' is not supported on field '{field}'")]
    UnsupportedOperator {
        /// Offending field
        field: FilterField,
        /// Operator key as written
        operator: String,
    },

    /// More than one kind of text condition in one object
    #[error("field '{field}' mixes incompatible operators")]
    MixedOperators {
        /// Offending field
        field: FilterField,
    },

    /// Condition object or `$in` list is empty
    #[error("field '{field}' has an empty condition")]
    EmptyCondition {
        /// Offending field
        field: FilterField,
    },

    /// `$regex` does not compile
    #[error("invalid pattern on field '{field}': {reason}")]
    InvalidPattern {
        /// Offending field
        field: FilterField,
        /// Compiler message
        reason: String,
    },

    /// `$options` other than case-insensitivity
    #[error("unsupported pattern options '{options}' on field '{field}'")]
    UnsupportedPatternOptions {
        /// Offending field
        field: FilterField,
        /// Options as written
        options: String,
    },
}

type FilterResult<T> = std::result::Result<T, FilterError>;

/// Validated set of per-field conditions, all of which must hold
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpression {
    conditions: BTreeMap<FilterField, Condition>,
}

impl FilterExpression {
    /// Validate a filter document against the allow-list
    ///
    /// # Errors
    ///
    /// Returns the first [`FilterError`] found, checking fields in document order
    ///
    /// # Examples
    ///
    /// ```
    /// use propsearch::interpreter::filter::{FilterExpression, FilterField};
    /// use serde_json::json;
    ///
    /// let filter = FilterExpression::from_document(&json!({
    ///     "flatType": "3BHK",
    ///     "price": {"$lte": 20000}
    /// })).unwrap();
    /// assert!(filter.condition(FilterField::Price).is_some());
    ///
    /// assert!(FilterExpression::from_document(&json!({"$where": "1"})).is_err());
    /// ```
    pub fn from_document(document: &Value) -> FilterResult<Self> {
        let object = document.as_object().ok_or(FilterError::NotAnObject)?;

        let mut conditions = BTreeMap::new();
        for (name, value) in object {
            let field = FilterField::from_name(name)
                .ok_or_else(|| FilterError::UnknownField(name.clone()))?;
            let condition = match field.kind() {
                FieldKind::Text => parse_text_condition(field, value)?,
                FieldKind::Number => parse_number_condition(field, value)?,
            };
            conditions.insert(field, condition);
        }

        Ok(Self { conditions })
    }

    /// Condition on a field, if any
    pub fn condition(&self, field: FilterField) -> Option<&Condition> {
        self.conditions.get(&field)
    }

    /// Number of constrained fields
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True when no field is constrained; such a filter matches every listing
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render as a query document
    pub fn to_document(&self) -> Value {
        let map = self
            .conditions
            .iter()
            .map(|(field, condition)| (field.as_str().to_string(), condition.to_value()))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    /// Evaluate against a listing document
    ///
    /// A listing without a constrained attribute never matches, and a value of
    /// the wrong JSON type never matches.
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            document
                .get(field.as_str())
                .map_or(false, |value| condition.matches(value))
        })
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

impl Serialize for FilterExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

fn expect_text(field: FilterField, value: &Value) -> FilterResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or(FilterError::ExpectedText { field })
}

fn expect_number(field: FilterField, value: &Value) -> FilterResult<Number> {
    match value {
        Value::Number(number) => Ok(number.clone()),
        _ => Err(FilterError::ExpectedNumber { field }),
    }
}

fn parse_text_condition(field: FilterField, value: &Value) -> FilterResult<Condition> {
    let object = match value {
        Value::String(text) => return Ok(Condition::Text(text.clone())),
        Value::Object(object) => object,
        _ => return Err(FilterError::ExpectedText { field }),
    };

    if object.is_empty() {
        return Err(FilterError::EmptyCondition { field });
    }

    for key in object.keys() {
        if !matches!(key.as_str(), "$eq" | "$in" | "$regex" | "$options") {
            return Err(FilterError::UnsupportedOperator {
                field,
                operator: key.clone(),
            });
        }
    }

    if let Some(pattern) = object.get("$regex") {
        if object.contains_key("$eq") || object.contains_key("$in") {
            return Err(FilterError::MixedOperators { field });
        }
        let source = expect_text(field, pattern)?;
        let options = match object.get("$options") {
            Some(options) => expect_text(field, options)?,
            None => String::new(),
        };
        let case_insensitive = match options.as_str() {
            "" => false,
            "i" => true,
            _ => return Err(FilterError::UnsupportedPatternOptions { field, options }),
        };
        let pattern = Pattern::new(&source, case_insensitive).map_err(|e| {
            FilterError::InvalidPattern {
                field,
                reason: e.to_string(),
            }
        })?;
        return Ok(Condition::Pattern(pattern));
    }

    if object.contains_key("$options") {
        return Err(FilterError::UnsupportedOperator {
            field,
            operator: "$options".to_string(),
        });
    }

    if object.len() > 1 {
        return Err(FilterError::MixedOperators { field });
    }

    if let Some(eq) = object.get("$eq") {
        return Ok(Condition::Text(expect_text(field, eq)?));
    }

    match object.get("$in") {
        Some(Value::Array(items)) if items.is_empty() => Err(FilterError::EmptyCondition { field }),
        Some(Value::Array(items)) => Ok(Condition::AnyOf(
            items
                .iter()
                .map(|item| expect_text(field, item))
                .collect::<FilterResult<Vec<_>>>()?,
        )),
        _ => Err(FilterError::ExpectedText { field }),
    }
}

fn parse_number_condition(field: FilterField, value: &Value) -> FilterResult<Condition> {
    let object = match value {
        Value::Number(number) => return Ok(Condition::Number(number.clone())),
        Value::Object(object) => object,
        _ => return Err(FilterError::ExpectedNumber { field }),
    };

    if object.is_empty() {
        return Err(FilterError::EmptyCondition { field });
    }

    let comparisons = object
        .iter()
        .map(|(key, operand)| {
            let op = CompareOp::from_key(key).ok_or_else(|| FilterError::UnsupportedOperator {
                field,
                operator: key.clone(),
            })?;
            Ok((op, expect_number(field, operand)?))
        })
        .collect::<FilterResult<Vec<_>>>()?;

    Ok(Condition::Range(comparisons))
}
