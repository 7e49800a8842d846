//! Value constraints.
//!
//! A model declares named constraints that its properties reference by
//! prefixed name. A property may also carry inline constraints of its own.
//! Both kinds share one name space per model.
//!
//! | Type | Parameters | Applies to |
//! |------|------------|------------|
//! | `REGEX` | `expression` (required), `requiresMatch` | any |
//! | `LIST` | `allowedValues` (list, required), `caseSensitive`, `sorted` | any; every value must suit the data type |
//! | `MINMAX` | `minValue`, `maxValue` (numbers, `maxValue` positive) | `d:int`, `d:long`, `d:float`, `d:double` |
//! | `LENGTH` | `minLength`, `maxLength` (32-bit integers) | `d:text`, `d:mltext`, `d:content` |
//!
//! Any other type must be a fully qualified implementation class name
//! such as `org.example.constraints.Isbn`. Those are stored and exported
//! but never evaluated.

use std::fmt;
use std::str::FromStr;

use cmm_catalog::ValueCheck;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::names;

const NUMERIC_TYPES: &[&str] = &["d:int", "d:long", "d:float", "d:double"];
const TEXT_TYPES: &[&str] = &["d:text", "d:mltext", "d:content"];

/// What a constraint checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConstraintType {
    /// Regular expression match.
    Regex,
    /// Membership in a list of allowed values.
    List,
    /// Numeric range.
    MinMax,
    /// Text length range.
    Length,
    /// An external implementation, named by its fully qualified class.
    Class(String),
}

impl ConstraintType {
    /// Wire name: `REGEX`, `LIST`, `MINMAX`, `LENGTH` or the class name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex => "REGEX",
            Self::List => "LIST",
            Self::MinMax => "MINMAX",
            Self::Length => "LENGTH",
            Self::Class(class) => class,
        }
    }

    /// Data types this kind may constrain, or `None` for all of them.
    #[must_use]
    pub fn applicable_types(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::MinMax => Some(NUMERIC_TYPES),
            Self::Length => Some(TEXT_TYPES),
            _ => None,
        }
    }
}

fn is_class_name(s: &str) -> bool {
    let identifier = |segment: &str| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    };
    s.contains('.') && s.split('.').all(identifier)
}

impl FromStr for ConstraintType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "REGEX" => Self::Regex,
            "LIST" => Self::List,
            "MINMAX" => Self::MinMax,
            "LENGTH" => Self::Length,
            _ if is_class_name(s) => Self::Class(s.to_owned()),
            _ => return Err(ValidationError::UnknownConstraintType(s.to_owned())),
        })
    }
}

impl TryFrom<String> for ConstraintType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConstraintType> for String {
    fn from(value: ConstraintType) -> Self {
        match value {
            ConstraintType::Class(class) => class,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named parameter holding either one value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConstraintParameter {
    /// Parameter name, e.g. `expression`.
    pub name: String,
    /// Single value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_value: Option<String>,
    /// List value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_value: Vec<String>,
}

impl ConstraintParameter {
    /// A parameter with a single value.
    #[must_use]
    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            simple_value: Some(value.into()),
            list_value: Vec::new(),
        }
    }

    /// A parameter with a list of values.
    #[must_use]
    pub fn list<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            simple_value: None,
            list_value: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A validated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Local name, unique within the model.
    pub name: String,
    /// `prefix:name` under the model's current prefix.
    pub prefixed_name: String,
    /// Constraint kind.
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ConstraintParameter>,
}

fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Compiles a `REGEX` expression anchored to the whole value.
fn full_match(expression: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{expression})$"))
}

impl Constraint {
    /// The single value of parameter `name`.
    #[must_use]
    pub fn simple(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.simple_value.as_deref())
    }

    /// The list value of parameter `name`.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.parameters
            .iter()
            .find(|p| p.name == name && !p.list_value.is_empty())
            .map(|p| p.list_value.as_slice())
    }

    fn invalid(&self, parameter: &str, value: &str) -> ValidationError {
        ValidationError::InvalidConstraintParameter {
            constraint: self.name.clone(),
            parameter: parameter.to_owned(),
            value: value.to_owned(),
        }
    }

    fn missing(&self, parameter: &'static str) -> ValidationError {
        ValidationError::MissingConstraintParameter {
            constraint: self.name.clone(),
            parameter,
        }
    }

    fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>, ValidationError> {
        self.simple(name)
            .map(|v| v.trim().parse::<T>().map_err(|_| self.invalid(name, v)))
            .transpose()
    }

    fn flag(&self, name: &str, default: bool) -> Result<bool, ValidationError> {
        match self.simple(name) {
            None => Ok(default),
            Some(v) => parse_flag(v).ok_or_else(|| self.invalid(name, v)),
        }
    }

    /// Checks the parameters against the constraint type.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::IllegalCharacter`] or [`ValidationError::Empty`]
    ///   for a bad parameter name.
    /// - [`ValidationError::MissingConstraintParameter`] when `expression`
    ///   or `allowedValues` is absent.
    /// - [`ValidationError::InvalidConstraintParameter`] for an expression
    ///   that does not compile, a non-numeric bound, a non-positive
    ///   `maxValue`, inverted bounds or a malformed flag.
    pub fn validate_parameters(&self) -> Result<(), ValidationError> {
        for parameter in &self.parameters {
            names::validate_local_name("constraint parameter name", &parameter.name)?;
        }
        match &self.constraint_type {
            ConstraintType::Regex => {
                let expression = self.simple("expression").ok_or_else(|| self.missing("expression"))?;
                full_match(expression).map_err(|_| self.invalid("expression", expression))?;
                self.flag("requiresMatch", true)?;
            }
            ConstraintType::List => {
                self.list("allowedValues")
                    .ok_or_else(|| self.missing("allowedValues"))?;
                self.flag("caseSensitive", true)?;
                self.flag("sorted", false)?;
            }
            ConstraintType::MinMax => {
                for parameter in &self.parameters {
                    if let Some(value) = &parameter.simple_value {
                        value
                            .trim()
                            .parse::<f64>()
                            .map_err(|_| self.invalid(&parameter.name, value))?;
                    }
                }
                let min = self.number::<f64>("minValue")?;
                let max = self.number::<f64>("maxValue")?;
                if let (Some(max), Some(raw)) = (max, self.simple("maxValue")) {
                    // The smallest positive double is the lowest legal maximum.
                    if max < f64::from_bits(1) {
                        return Err(self.invalid("maxValue", raw));
                    }
                }
                if let (Some(min), Some(max), Some(raw)) = (min, max, self.simple("minValue")) {
                    if min > max {
                        return Err(self.invalid("minValue", raw));
                    }
                }
            }
            ConstraintType::Length => {
                for parameter in &self.parameters {
                    if let Some(value) = &parameter.simple_value {
                        value
                            .trim()
                            .parse::<i32>()
                            .map_err(|_| self.invalid(&parameter.name, value))?;
                    }
                }
                let min = self.number::<i32>("minLength")?;
                let max = self.number::<i32>("maxLength")?;
                if let (Some(min), Some(max), Some(raw)) = (min, max, self.simple("minLength")) {
                    if min < 0 || min > max {
                        return Err(self.invalid("minLength", raw));
                    }
                }
            }
            ConstraintType::Class(_) => {}
        }
        Ok(())
    }

    /// Checks that the constraint may be applied to a property of
    /// `data_type`, whose literals `check` validates.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ConstraintNotApplicable`] for `MINMAX` on a
    ///   non-numeric type or `LENGTH` on a non-text type.
    /// - [`ValidationError::InvalidAllowedValue`] for a `LIST` value the
    ///   data type does not accept.
    pub fn check_usage(&self, data_type: &str, check: ValueCheck) -> Result<(), ValidationError> {
        if let Some(allowed) = self.constraint_type.applicable_types() {
            if !allowed.contains(&data_type) {
                return Err(ValidationError::ConstraintNotApplicable {
                    constraint: self.name.clone(),
                    constraint_type: self.constraint_type.to_string(),
                    data_type: data_type.to_owned(),
                });
            }
        }
        if self.constraint_type == ConstraintType::List {
            let values = self.list("allowedValues").unwrap_or_default();
            if let Some(bad) = values.iter().find(|v| !check.accepts(v)) {
                return Err(ValidationError::InvalidAllowedValue {
                    constraint: self.name.clone(),
                    value: bad.clone(),
                    data_type: data_type.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Returns true if `value` fails the constraint. Externally implemented
    /// constraints never fail here.
    #[must_use]
    pub fn is_violated_by(&self, value: &str) -> bool {
        match &self.constraint_type {
            ConstraintType::Regex => {
                let Some(Ok(regex)) = self.simple("expression").map(full_match) else {
                    return false;
                };
                let requires_match = self.flag("requiresMatch", true).unwrap_or(true);
                regex.is_match(value) != requires_match
            }
            ConstraintType::List => {
                let allowed = self.list("allowedValues").unwrap_or_default();
                if self.flag("caseSensitive", true).unwrap_or(true) {
                    !allowed.iter().any(|a| a == value)
                } else {
                    let value = value.to_lowercase();
                    !allowed.iter().any(|a| a.to_lowercase() == value)
                }
            }
            ConstraintType::MinMax => {
                let Ok(number) = value.trim().parse::<f64>() else {
                    return true;
                };
                let min = self.number("minValue").ok().flatten().unwrap_or(f64::NEG_INFINITY);
                let max = self.number("maxValue").ok().flatten().unwrap_or(f64::INFINITY);
                number < min || number > max
            }
            ConstraintType::Length => {
                let length = i64::try_from(value.chars().count()).unwrap_or(i64::MAX);
                let min = self.number::<i32>("minLength").ok().flatten().unwrap_or(0);
                let max = self.number::<i32>("maxLength").ok().flatten().unwrap_or(i32::MAX);
                length < i64::from(min) || length > i64::from(max)
            }
            ConstraintType::Class(_) => false,
        }
    }
}

/// Input of `create_constraint` and of inline property constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewConstraint {
    /// Local name. Required for model constraints; generated for
    /// anonymous inline ones.
    #[serde(default)]
    pub name: Option<String>,
    /// Constraint kind. Required.
    #[serde(default, rename = "type")]
    pub constraint_type: Option<ConstraintType>,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Parameters.
    #[serde(default)]
    pub parameters: Vec<ConstraintParameter>,
}

impl NewConstraint {
    /// A named constraint request.
    #[must_use]
    pub fn new(name: impl Into<String>, constraint_type: ConstraintType) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::anonymous(constraint_type)
        }
    }

    /// An inline constraint request without a name.
    #[must_use]
    pub fn anonymous(constraint_type: ConstraintType) -> Self {
        Self {
            name: None,
            constraint_type: Some(constraint_type),
            title: None,
            description: None,
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ConstraintParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl From<Constraint> for NewConstraint {
    fn from(c: Constraint) -> Self {
        Self {
            name: Some(c.name),
            constraint_type: Some(c.constraint_type),
            title: c.title,
            description: c.description,
            parameters: c.parameters,
        }
    }
}

/// Validates a request under `name` in the namespace `prefix`.
///
/// # Errors
///
/// - [`ValidationError::Empty`] or [`ValidationError::IllegalCharacter`]
///   for a bad name.
/// - [`ValidationError::MissingConstraintType`] when no type was given.
/// - Any error of [`Constraint::validate_parameters`].
pub fn build(request: NewConstraint, name: String, prefix: &str) -> Result<Constraint, ValidationError> {
    names::validate_local_name("constraint name", &name)?;
    let constraint_type = request
        .constraint_type
        .ok_or_else(|| ValidationError::MissingConstraintType(name.clone()))?;
    let constraint = Constraint {
        prefixed_name: format!("{prefix}:{name}"),
        name,
        constraint_type,
        title: request.title,
        description: request.description,
        parameters: request.parameters,
    };
    constraint.validate_parameters()?;
    Ok(constraint)
}
