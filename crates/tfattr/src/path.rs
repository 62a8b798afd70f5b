//! attribute paths
//!
//! An [AttributePath] addresses a location inside a [crate::Type]/[crate::Value] tree or inside a
//! [crate::schema::Schema]. Paths are never modified in place, every `with_*` call returns a new,
//! longer path.
//!
//! Paths render like this:
//!
//! | steps                                                   | rendered              |
//! |---------------------------------------------------------|-----------------------|
//! | `[]`                                                    | `(root)`              |
//! | `[AttributeName("disks"), ElementIndex(0)]`             | `disks[0]`            |
//! | `[AttributeName("labels"), ElementKey("env")]`          | `labels["env"]`       |
//! | `[AttributeName("a"), AttributeName("b")]`              | `a.b`                 |
//!
//! The rendered form (except for `(root)` and element values) parses back via [std::str::FromStr].
use crate::error::Error;
use crate::value::Value;
use std::fmt::{self, Write};

/// A single addressing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// attribute of an object or nested attribute group
    AttributeName(String),
    /// position in a list
    ElementIndex(usize),
    /// key in a map
    ElementKey(String),
    /// member of a set, identified by its value
    ElementValue(Value),
}

impl PathStep {
    /// Human readable name of the step kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            PathStep::AttributeName(_) => "attribute name",
            PathStep::ElementIndex(_) => "element index",
            PathStep::ElementKey(_) => "element key",
            PathStep::ElementValue(_) => "element value",
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::AttributeName(name) => write!(f, ".{name}"),
            PathStep::ElementIndex(index) => write!(f, "[{index}]"),
            PathStep::ElementKey(key) => {
                f.write_str("[\"")?;
                for c in key.chars() {
                    if c == '"' || c == '\\' {
                        f.write_char('\\')?;
                    }
                    f.write_char(c)?;
                }
                f.write_str("\"]")
            }
            PathStep::ElementValue(value) => write!(f, "[{value}]"),
        }
    }
}

/// Ordered sequence of [PathStep]s, starting at the document root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_step(&self) -> Option<&PathStep> {
        self.steps.last()
    }

    pub fn with_step(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }

    pub fn with_attribute_name(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::AttributeName(name.into()))
    }

    pub fn with_element_index(&self, index: usize) -> Self {
        self.with_step(PathStep::ElementIndex(index))
    }

    pub fn with_element_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::ElementKey(key.into()))
    }

    pub fn with_element_value(&self, value: Value) -> Self {
        self.with_step(PathStep::ElementValue(value))
    }
}

impl From<Vec<PathStep>> for AttributePath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

impl FromIterator<PathStep> for AttributePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("(root)");
        }

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                // no leading dot
                PathStep::AttributeName(name) if index == 0 => f.write_str(name)?,
                step => step.fmt(f)?,
            }
        }

        Ok(())
    }
}

impl std::str::FromStr for AttributePath {
    type Err = Error;

    /// Parses `name`, `.name`, `[0]` and `["key"]` steps. The empty string is the root path.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let syntax = |reason: &str| Error::PathSyntax {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut steps = vec![];
        let mut rest = input;

        while !rest.is_empty() {
            if let Some(index) = rest.strip_prefix('[') {
                let (step, remaining) =
                    parse_bracket_step(index).ok_or_else(|| syntax("malformed `[...]` step"))?;
                steps.push(step);
                rest = remaining;
                continue;
            }

            let name = if steps.is_empty() {
                rest
            } else {
                rest.strip_prefix('.')
                    .ok_or_else(|| syntax("expected `.` or `[`"))?
            };

            let end = name
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(name.len());
            if end == 0 {
                return Err(syntax("expected an attribute name"));
            }

            steps.push(PathStep::AttributeName(name[..end].to_string()));
            rest = &name[end..];
        }

        Ok(Self { steps })
    }
}

/// Parses the inside of a `[...]` step, `input` starts right after the `[`
fn parse_bracket_step(input: &str) -> Option<(PathStep, &str)> {
    if let Some(quoted) = input.strip_prefix('"') {
        let mut key = String::new();
        let mut chars = quoted.char_indices();
        while let Some((position, c)) = chars.next() {
            match c {
                '\\' => key.push(chars.next()?.1),
                '"' => {
                    let rest = quoted[position + 1..].strip_prefix(']')?;
                    return Some((PathStep::ElementKey(key), rest));
                }
                c => key.push(c),
            }
        }
        return None;
    }

    let end = input.find(']')?;
    let index = input[..end].parse().ok()?;
    Some((PathStep::ElementIndex(index), &input[end + 1..]))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display() {
        let path = AttributePath::root()
            .with_attribute_name("disks")
            .with_element_index(0)
            .with_attribute_name("labels")
            .with_element_key("team \"a\"");

        assert_eq!(path.to_string(), r#"disks[0].labels["team \"a\""]"#);
        assert_eq!(AttributePath::root().to_string(), "(root)");
    }

    #[test]
    fn parse() {
        let path: AttributePath = r#"disks[12].labels["env"]"#.parse().unwrap();

        assert_eq!(
            path.steps(),
            &[
                PathStep::AttributeName("disks".into()),
                PathStep::ElementIndex(12),
                PathStep::AttributeName("labels".into()),
                PathStep::ElementKey("env".into()),
            ]
        );
    }

    #[test]
    fn parse_escaped_key() {
        let path: AttributePath = r#"labels["a\"]b"]"#.parse().unwrap();
        assert_eq!(path.last_step(), Some(&PathStep::ElementKey("a\"]b".into())));
    }

    #[test]
    fn parse_display_agree() {
        let path = AttributePath::root()
            .with_attribute_name("a")
            .with_element_key("x.y")
            .with_element_index(3);

        assert_eq!(path.to_string().parse::<AttributePath>().unwrap(), path);
    }

    #[test]
    fn parse_empty_is_root() {
        assert!("".parse::<AttributePath>().unwrap().is_root());
    }

    #[test]
    fn parse_errors() {
        for input in ["a..b", "a[", "a[x]", "a[\"open]", ".a", "a b"] {
            let err = input.parse::<AttributePath>().expect_err(input);
            assert!(matches!(err, Error::PathSyntax { .. }), "{input}: {err}");
        }
    }

    #[test]
    fn with_does_not_modify() {
        let parent = AttributePath::root().with_attribute_name("a");
        let _child = parent.with_element_index(1);
        assert_eq!(parent.steps().len(), 1);
    }
}
