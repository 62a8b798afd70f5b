//! schema documents
//!
//! A [Schema] is a tree of named [Attribute]s. Each attribute either has a plain [Type] or groups
//! further attributes ([NestedAttributes]) nested in one of four ways ([NestingMode]).
//!
//! The schema is only used to describe documents and to resolve paths. Values are converted with
//! the lowered [Type] (see [Schema::attribute_type]).
//!
//! Schemas can be loaded from yaml or json:
//! ```yaml
//! version: 1
//! description: a virtual machine
//! attributes:
//!   name:
//!     type: string
//!     required: true
//!   disks:
//!     nested:
//!       mode: list
//!       max_items: 8
//!       attributes:
//!         size:
//!           type: number
//! ```
use crate::error::Error;
use crate::path::{AttributePath, PathStep};
use crate::types::Type;
use crate::wire::WireType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document-level schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Names must only contain lowercase letters, digits and underscores
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,

    /// Incremented by the owner of the schema on breaking changes
    #[serde(default)]
    pub version: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deprecation_message: String,
}

/// Either a plain type or a group of nested attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeContent {
    Type(Type),
    Nested(NestedAttributes),
}

/// A single attribute
///
/// Flags and texts are stored for other consumers of the schema. Nothing in this crate enforces
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub content: AttributeContent,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub computed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub markdown_description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deprecation_message: String,
}

fn is_false(flag: &bool) -> bool {
    !flag
}

impl Attribute {
    /// Attribute with a plain type
    pub fn new(ty: Type) -> Self {
        Self::with_content(AttributeContent::Type(ty))
    }

    pub fn nested(attributes: NestedAttributes) -> Self {
        Self::with_content(AttributeContent::Nested(attributes))
    }

    fn with_content(content: AttributeContent) -> Self {
        Self {
            content,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: String::new(),
            markdown_description: String::new(),
            deprecation_message: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_markdown_description(mut self, description: impl Into<String>) -> Self {
        self.markdown_description = description.into();
        self
    }

    pub fn with_deprecation_message(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = message.into();
        self
    }

    /// The plain type, `None` for nested attributes
    pub fn ty(&self) -> Option<&Type> {
        match &self.content {
            AttributeContent::Type(ty) => Some(ty),
            AttributeContent::Nested(_) => None,
        }
    }

    /// The nested attributes, `None` for plain types
    pub fn nested_attributes(&self) -> Option<&NestedAttributes> {
        match &self.content {
            AttributeContent::Type(_) => None,
            AttributeContent::Nested(nested) => Some(nested),
        }
    }

    /// The type values of this attribute have
    pub fn attribute_type(&self) -> Result<Type, Error> {
        self.lower(&AttributePath::root())
    }

    fn lower(&self, path: &AttributePath) -> Result<Type, Error> {
        match &self.content {
            AttributeContent::Type(ty) => Ok(ty.clone()),
            AttributeContent::Nested(nested) => nested.lower(path),
        }
    }
}

/// How a group of nested attributes is nested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestingMode {
    /// exactly one instance, like an object
    Single,
    /// ordered instances
    List,
    /// unique instances
    Set,
    /// instances with a unique string key
    Map,
}

impl NestingMode {
    /// The only step kind that leads from the collection to one of its instances
    fn accepts(self, step: &PathStep) -> bool {
        matches!(
            (self, step),
            (NestingMode::List, PathStep::ElementIndex(_))
                | (NestingMode::Set, PathStep::ElementValue(_))
                | (NestingMode::Map, PathStep::ElementKey(_))
        )
    }
}

impl fmt::Display for NestingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestingMode::Single => f.write_str("single"),
            NestingMode::List => f.write_str("list"),
            NestingMode::Set => f.write_str("set"),
            NestingMode::Map => f.write_str("map"),
        }
    }
}

/// Bounds for list, set and map nesting
///
/// `0` means no bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NestedAttributesOptions {
    pub min_items: u64,
    pub max_items: u64,
}

/// A group of attributes nested under another attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedAttributes {
    mode: NestingMode,
    attributes: IndexMap<String, Attribute>,
    #[serde(default, skip_serializing_if = "is_zero")]
    min_items: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    max_items: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl NestedAttributes {
    /// One instance of `attributes`, directly nested
    pub fn single(attributes: IndexMap<String, Attribute>) -> Self {
        Self::new(NestingMode::Single, attributes, Default::default())
    }

    pub fn list(attributes: IndexMap<String, Attribute>, options: NestedAttributesOptions) -> Self {
        Self::new(NestingMode::List, attributes, options)
    }

    /// Instances are unique. Lowering set nesting to a [Type] is not implemented.
    pub fn set(attributes: IndexMap<String, Attribute>, options: NestedAttributesOptions) -> Self {
        Self::new(NestingMode::Set, attributes, options)
    }

    pub fn map(attributes: IndexMap<String, Attribute>, options: NestedAttributesOptions) -> Self {
        Self::new(NestingMode::Map, attributes, options)
    }

    fn new(
        mode: NestingMode,
        attributes: IndexMap<String, Attribute>,
        options: NestedAttributesOptions,
    ) -> Self {
        Self {
            mode,
            attributes,
            min_items: options.min_items,
            max_items: options.max_items,
        }
    }

    pub fn nesting_mode(&self) -> NestingMode {
        self.mode
    }

    pub fn attributes(&self) -> &IndexMap<String, Attribute> {
        &self.attributes
    }

    /// Always `0` for single nesting
    pub fn min_items(&self) -> u64 {
        match self.mode {
            NestingMode::Single => 0,
            _ => self.min_items,
        }
    }

    /// Always `0` for single nesting
    pub fn max_items(&self) -> u64 {
        match self.mode {
            NestingMode::Single => 0,
            _ => self.max_items,
        }
    }

    /// The type values of these nested attributes have
    ///
    /// Single nesting is an object, list and map nesting are a list or map of objects.
    pub fn attribute_type(&self) -> Result<Type, Error> {
        self.lower(&AttributePath::root())
    }

    fn lower(&self, path: &AttributePath) -> Result<Type, Error> {
        let object = lower_attributes(&self.attributes, path)?;
        match self.mode {
            NestingMode::Single => Ok(object),
            NestingMode::List => Ok(Type::list(object)),
            NestingMode::Map => Ok(Type::map(object)),
            NestingMode::Set => {
                tracing::debug!(%path, "no type available for set nested attributes");
                Err(Error::NotImplemented {
                    path: path.clone(),
                    feature: "set nested attributes",
                })
            }
        }
    }
}

fn lower_attributes(
    attributes: &IndexMap<String, Attribute>,
    path: &AttributePath,
) -> Result<Type, Error> {
    attributes
        .iter()
        .map(|(name, attribute)| {
            let ty = attribute.lower(&path.with_attribute_name(name.as_str()))?;
            Ok((name.clone(), ty))
        })
        .collect::<Result<IndexMap<_, _>, Error>>()
        .map(Type::Object)
}

/// Position reached while walking a path through a schema
#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    /// the schema root or a single instance of nested attributes
    Attributes(&'a IndexMap<String, Attribute>),
    Attribute(&'a Attribute),
}

impl<'a> Node<'a> {
    fn step(self, step: &PathStep, path: &AttributePath) -> Result<Node<'a>, Error> {
        let invalid = |target: String| Error::InvalidPathStep {
            path: path.clone(),
            step: step.kind(),
            target,
        };

        match self {
            Node::Attributes(attributes) => match step {
                PathStep::AttributeName(name) => attributes
                    .get(name)
                    .map(Node::Attribute)
                    .ok_or_else(|| Error::PathNotFound {
                        path: path.clone(),
                        name: name.clone(),
                    }),
                _ => Err(invalid("attributes".to_string())),
            },
            Node::Attribute(attribute) => match &attribute.content {
                AttributeContent::Type(ty) => Err(invalid(ty.to_string())),
                AttributeContent::Nested(nested) => match nested.mode {
                    NestingMode::Single => Node::Attributes(&nested.attributes).step(step, path),
                    mode if mode.accepts(step) => Ok(Node::Attributes(&nested.attributes)),
                    mode => Err(invalid(format!("{mode} nested attributes"))),
                },
            },
        }
    }
}

/// Result of [Schema::walk]
struct Walked<'s, 'p> {
    node: Node<'s>,
    /// path to `node`
    walked: AttributePath,
    /// steps into the type of a plain attribute, empty unless `node` is one
    remaining: &'p [PathStep],
}

impl Schema {
    pub fn new(attributes: IndexMap<String, Attribute>) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    /// Lowers the schema to an object type
    ///
    /// Fails with [Error::NotImplemented] if any attribute uses set nesting.
    pub fn attribute_type(&self) -> Result<Type, Error> {
        lower_attributes(&self.attributes, &AttributePath::root())
    }

    /// Wire shape of documents described by this schema
    pub fn wire_type(&self) -> Result<WireType, Error> {
        Ok(self.attribute_type()?.wire_type())
    }

    /// Walks `path` through the attribute tree
    ///
    /// Stops early at plain attributes, everything below them is part of their type.
    #[tracing::instrument(level = "trace", skip_all, fields(path = %path))]
    fn walk<'p>(&self, path: &'p AttributePath) -> Result<Walked<'_, 'p>, Error> {
        let mut node = Node::Attributes(&self.attributes);
        let mut walked = AttributePath::root();
        let steps = path.steps();

        for (index, step) in steps.iter().enumerate() {
            if let Node::Attribute(Attribute {
                content: AttributeContent::Type(_),
                ..
            }) = node
            {
                tracing::trace!(%walked, "stopped at plain attribute");
                return Ok(Walked {
                    node,
                    walked,
                    remaining: &steps[index..],
                });
            }

            node = node.step(step, &walked)?;
            walked = walked.with_step(step.clone());
        }

        Ok(Walked {
            node,
            walked,
            remaining: &[],
        })
    }

    /// The attribute `path` points to
    ///
    /// Fails with [Error::PathInsideAtomicAttribute] if `path` continues below a plain attribute,
    /// those parts of a document have no attribute of their own. Use
    /// [Schema::attribute_type_at_path] to get their type. Paths that end at an instance of
    /// nested attributes (e.g. `disks[0]`) fail with [Error::PathNotAttribute].
    pub fn attribute_at_path(&self, path: &AttributePath) -> Result<&Attribute, Error> {
        let walked = self.walk(path)?;
        if !walked.remaining.is_empty() {
            return Err(Error::PathInsideAtomicAttribute { path: path.clone() });
        }

        match walked.node {
            Node::Attribute(attribute) => Ok(attribute),
            Node::Attributes(_) => Err(Error::PathNotAttribute { path: path.clone() }),
        }
    }

    /// The type of whatever `path` points to, including parts of plain attribute types
    pub fn attribute_type_at_path(&self, path: &AttributePath) -> Result<Type, Error> {
        let Walked {
            node,
            walked,
            remaining,
        } = self.walk(path)?;

        match node {
            Node::Attribute(attribute) => match &attribute.content {
                AttributeContent::Type(ty) => ty.walk_from(remaining, walked).cloned(),
                AttributeContent::Nested(nested) => nested.lower(&walked),
            },
            Node::Attributes(attributes) => lower_attributes(attributes, &walked),
        }
    }

    /// Checks all attribute names, including nested ones
    pub fn validate(&self) -> Result<(), Error> {
        validate_attributes(&self.attributes, &AttributePath::root())
    }
}

fn validate_attributes(
    attributes: &IndexMap<String, Attribute>,
    path: &AttributePath,
) -> Result<(), Error> {
    for (name, attribute) in attributes {
        if !is_valid_attribute_name(name) {
            return Err(Error::InvalidAttributeName {
                path: path.clone(),
                name: name.clone(),
            });
        }

        if let AttributeContent::Nested(nested) = &attribute.content {
            validate_attributes(&nested.attributes, &path.with_attribute_name(name.as_str()))?;
        }
    }
    Ok(())
}

/// Lowercase letters, digits and underscores, at least one character
pub fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
