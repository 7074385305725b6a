//! Client-side field validation.
//!
//! Rules run before any request is sent. A failing patch never reaches the
//! backend.

use std::collections::BTreeMap;
use std::str::FromStr;

use email_address::EmailAddress;
use serde_json::Value;

use crate::error::FieldValidationError;
use crate::model::RowPatch;
use crate::model::is_managed_key;

/// A constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Present and not blank.
    Required,
    /// A syntactically valid email address.
    Email,
    /// An integer `>= 0`, as a JSON number or a numeric string.
    NonNegativeInteger,
    /// One of a fixed set of string values.
    OneOf(Vec<String>),
}

impl Rule {
    fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::NonNegativeInteger => "non_negative_integer",
            Rule::OneOf(_) => "one_of",
        }
    }

    /// Checks a present value. Blank values only fail `Required`.
    fn check(&self, field: &str, value: &Value) -> Option<FieldValidationError> {
        let fail = |message: String| Some(FieldValidationError::new(field, self.name(), message));

        if is_blank(value) {
            return match self {
                Rule::Required => fail(format!("{} is required", field)),
                _ => None,
            };
        }

        match self {
            Rule::Required => None,
            Rule::Email => match value.as_str() {
                Some(s) if EmailAddress::from_str(s.trim()).is_ok() => None,
                _ => fail(format!("{} is not a valid email address", field)),
            },
            Rule::NonNegativeInteger => {
                let ok = match value {
                    Value::Number(n) => n.as_u64().is_some(),
                    Value::String(s) => s.trim().parse::<u64>().is_ok(),
                    _ => false,
                };
                if ok {
                    None
                } else {
                    fail(format!("{} must be a whole number of zero or more", field))
                }
            }
            Rule::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => None,
                _ => fail(format!("{} must be one of: {}", field, allowed.join(", "))),
            },
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Field rules for one collection.
///
/// # Example
///
/// ```
/// use gridsync_lib::model::RowPatch;
/// use gridsync_lib::validate::{Rule, Schema};
///
/// let schema = Schema::new()
///     .field("email", [Rule::Required, Rule::Email]);
///
/// let errors = schema.validate_patch(&RowPatch::new().set("email", "nope"));
/// assert_eq!(errors.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeMap<String, Vec<Rule>>,
}

impl Schema {
    /// Creates a schema with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rules for a field.
    pub fn field(mut self, field: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.entry(field.into()).or_default().extend(rules);
        self
    }

    /// Rules for the users collection of the admin console.
    pub fn users() -> Self {
        Self::new()
            .field("name", [Rule::Required])
            .field("email", [Rule::Required, Rule::Email])
            .field("password", [Rule::Required])
            .field("age", [Rule::NonNegativeInteger])
            .field("gender", [Rule::Required])
            .field("address", [Rule::Required])
            .field(
                "role",
                [
                    Rule::Required,
                    Rule::OneOf(vec!["user".into(), "moderator".into(), "admin".into()]),
                ],
            )
    }

    /// Validates an edit. Only fields present in the patch are checked, and
    /// server-managed keys may not be patched.
    pub fn validate_patch(&self, patch: &RowPatch) -> Vec<FieldValidationError> {
        let mut errors = managed_key_errors(patch);
        for (field, value) in patch.iter() {
            if let Some(rules) = self.fields.get(field) {
                errors.extend(rules.iter().filter_map(|rule| rule.check(field, value)));
            }
        }
        errors
    }

    /// Validates a new row. Every `Required` field must be present.
    pub fn validate_new(&self, fields: &RowPatch) -> Vec<FieldValidationError> {
        let mut errors = managed_key_errors(fields);
        for (field, rules) in &self.fields {
            match fields.get(field) {
                Some(value) => errors.extend(rules.iter().filter_map(|rule| rule.check(field, value))),
                None if rules.contains(&Rule::Required) => {
                    errors.extend(Rule::Required.check(field, &Value::Null));
                }
                None => {}
            }
        }
        errors
    }
}

fn managed_key_errors(patch: &RowPatch) -> Vec<FieldValidationError> {
    patch
        .iter()
        .filter(|(field, _)| is_managed_key(field))
        .map(|(field, _)| {
            FieldValidationError::new(
                field.as_str(),
                "managed",
                format!("{} is managed by the server", field),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_failed(errors: &[FieldValidationError]) -> Vec<(&str, &str)> {
        errors.iter().map(|e| (e.field.as_str(), e.rule)).collect()
    }

    #[test]
    fn test_patch_checks_only_present_fields() {
        let schema = Schema::users();
        let patch = RowPatch::new().set("name", "Hannah");
        assert!(schema.validate_patch(&patch).is_empty());

        let patch = RowPatch::new().set("name", "  ").set("email", "not-an-email");
        assert_eq!(
            rules_failed(&schema.validate_patch(&patch)),
            [("email", "email"), ("name", "required")]
        );
    }

    #[test]
    fn test_age_accepts_numeric_strings() {
        let schema = Schema::users();
        assert!(schema.validate_patch(&RowPatch::new().set("age", "31")).is_empty());
        assert!(schema.validate_patch(&RowPatch::new().set("age", 31)).is_empty());
        assert_eq!(
            rules_failed(&schema.validate_patch(&RowPatch::new().set("age", -1))),
            [("age", "non_negative_integer")]
        );
    }

    #[test]
    fn test_role_must_be_known() {
        let schema = Schema::users();
        assert!(schema.validate_patch(&RowPatch::new().set("role", "admin")).is_empty());
        assert_eq!(
            rules_failed(&schema.validate_patch(&RowPatch::new().set("role", "root"))),
            [("role", "one_of")]
        );
    }

    #[test]
    fn test_managed_keys_cannot_be_patched() {
        let errors = Schema::new().validate_patch(&RowPatch::new().set("id", "x"));
        assert_eq!(rules_failed(&errors), [("id", "managed")]);
    }

    #[test]
    fn test_new_row_requires_all_required_fields() {
        let schema = Schema::users();
        let fields = RowPatch::new()
            .set("name", "Hannah")
            .set("email", "hannah@example.com");

        let failed: Vec<_> = schema
            .validate_new(&fields)
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(failed, ["address", "gender", "password", "role"]);
    }
}
