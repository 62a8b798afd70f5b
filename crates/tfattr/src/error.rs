//! errors of type, value, schema and marshaling operations
//!
//! Every data error carries the [AttributePath] it was found at. Match on the variant to tell
//! error kinds apart.
use crate::path::AttributePath;
use crate::value::ValueState;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// the runtime shape of a wire value does not match the declared type
    #[error("{path}: can't use {actual} as {expected}")]
    ShapeMismatch {
        path: AttributePath,
        expected: String,
        actual: String,
    },

    /// attribute names of an object and field names of a native struct differ
    #[error(
        "{path}: mismatch between object and native struct:{}",
        describe_field_mismatch(.schema_only, .native_only)
    )]
    SchemaFieldMismatch {
        path: AttributePath,
        /// names only the object (schema) defines
        schema_only: Vec<String>,
        /// names only the native struct defines
        native_only: Vec<String>,
    },

    #[error("{path}: no attribute {name:?}")]
    PathNotFound { path: AttributePath, name: String },

    /// a step of the wrong kind was applied, e.g. an index to an object
    #[error("{path}: can't apply {step} step to {target}")]
    InvalidPathStep {
        path: AttributePath,
        step: &'static str,
        target: String,
    },

    #[error("{path}: path leads to an element or attribute of an attribute that has no schema associated with it")]
    PathInsideAtomicAttribute { path: AttributePath },

    #[error("{path}: path leads to an element of nested attributes, not to an attribute")]
    PathNotAttribute { path: AttributePath },

    #[error("{path}: unhandled {state} value, {target} can't represent it")]
    UnhandledNullOrUnknown {
        path: AttributePath,
        state: ValueState,
        target: String,
    },

    #[error("{path}: {feature} is not implemented")]
    NotImplemented {
        path: AttributePath,
        feature: &'static str,
    },

    #[error("{path}: {other} is not compatible with {ty}")]
    TypeMismatch {
        path: AttributePath,
        ty: String,
        other: String,
    },

    #[error("{path}: can't represent number {value} as {target}")]
    NumberConversion {
        path: AttributePath,
        value: String,
        target: String,
    },

    #[error("{path}: invalid attribute name {name:?}, only lowercase letters, digits and underscores are allowed")]
    InvalidAttributeName { path: AttributePath, name: String },

    #[error("invalid attribute path {input:?}: {reason}")]
    PathSyntax { input: String, reason: String },
}

fn describe_field_mismatch(schema_only: &[String], native_only: &[String]) -> String {
    let mut description = String::new();

    if !native_only.is_empty() {
        description.push_str(" native struct defines fields not found in object: ");
        description.push_str(&native_only.join(", "));
        description.push('.');
    }

    if !schema_only.is_empty() {
        description.push_str(" object defines attributes not found in native struct: ");
        description.push_str(&schema_only.join(", "));
        description.push('.');
    }

    description
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_mismatch_names_both_sides() {
        let err = Error::SchemaFieldMismatch {
            path: AttributePath::root().with_attribute_name("disk"),
            schema_only: vec!["b".into()],
            native_only: vec!["a".into(), "c".into()],
        };

        assert_eq!(
            err.to_string(),
            "disk: mismatch between object and native struct: native struct defines fields not found in object: a, c. object defines attributes not found in native struct: b."
        );
    }
}
