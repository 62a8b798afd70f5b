//! attribute types
//!
//! A [Type] describes the shape of a value and nothing else: no identity, no constraints. Two
//! independently built types with the same structure are interchangeable.
//!
//! In schema documents types are written in lowercase:
//! ```yaml
//! name: string
//! tags:
//!   list: string
//! disk:
//!   object:
//!     size: number
//!     encrypted: bool
//! ```
use crate::error::Error;
use crate::path::{AttributePath, PathStep};
use crate::value::{ListValue, MapValue, ObjectValue, Tristate, Value};
use crate::value::{BoolValue, NumberValue, StringValue};
use crate::wire::{WirePayload, WireType, WireValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible types
///
/// Equality is structural. Object attribute order does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    String,
    Bool,
    Number,
    List(Box<Type>),
    Map(Box<Type>),
    Object(IndexMap<String, Type>),
}

impl Type {
    pub fn list(elem: Type) -> Self {
        Type::List(Box::new(elem))
    }

    pub fn map(elem: Type) -> Self {
        Type::Map(Box::new(elem))
    }

    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Type)>) -> Self {
        Type::Object(attrs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Element type shared by all elements of a list or map
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::List(elem) | Type::Map(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn attribute_types(&self) -> Option<&IndexMap<String, Type>> {
        match self {
            Type::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// The wire shape values of this type are exchanged in
    pub fn wire_type(&self) -> WireType {
        match self {
            Type::String => WireType::String,
            Type::Bool => WireType::Bool,
            Type::Number => WireType::Number,
            Type::List(elem) => WireType::List(Box::new(elem.wire_type())),
            Type::Map(elem) => WireType::Map(Box::new(elem.wire_type())),
            Type::Object(attrs) => WireType::Object(
                attrs
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.wire_type()))
                    .collect(),
            ),
        }
    }

    /// Decodes a wire value
    ///
    /// Unknown and null values are returned as such without looking at their shape. Known
    /// values must match [Type::wire_type] exactly. Decoding stops at the first invalid element.
    pub fn value_from_wire(&self, wire: &WireValue) -> Result<Value, Error> {
        self.decode(wire, &AttributePath::root())
    }

    fn decode(&self, wire: &WireValue, path: &AttributePath) -> Result<Value, Error> {
        let payload = match wire.state() {
            Tristate::Unknown => return Ok(Value::unknown(self)),
            Tristate::Null => return Ok(Value::null(self)),
            Tristate::Known(payload) => payload,
        };

        let expected = self.wire_type();
        if wire.ty() != &expected {
            return Err(Error::ShapeMismatch {
                path: path.clone(),
                expected: expected.to_string(),
                actual: wire.ty().to_string(),
            });
        }

        let value = match (self, payload) {
            (Type::String, WirePayload::String(s)) => StringValue::known(s.as_str()).into(),
            (Type::Bool, WirePayload::Bool(b)) => BoolValue::known(*b).into(),
            (Type::Number, WirePayload::Number(n)) => NumberValue::known(n.clone()).into(),
            (Type::List(elem), WirePayload::List(elems)) => {
                let elems = elems
                    .iter()
                    .enumerate()
                    .map(|(index, e)| elem.decode(e, &path.with_element_index(index)))
                    .collect::<Result<_, _>>()?;
                ListValue::from_parts(elem.as_ref().clone(), Tristate::Known(elems)).into()
            }
            (Type::Map(elem), WirePayload::Map(elems)) => {
                let elems = elems
                    .iter()
                    .map(|(key, e)| {
                        Ok((key.clone(), elem.decode(e, &path.with_element_key(key.as_str()))?))
                    })
                    .collect::<Result<_, Error>>()?;
                MapValue::from_parts(elem.as_ref().clone(), Tristate::Known(elems)).into()
            }
            (Type::Object(attr_types), WirePayload::Object(attrs)) => {
                let attrs = attr_types
                    .iter()
                    .map(|(name, attr_type)| {
                        let attr_path = path.with_attribute_name(name.as_str());
                        let attr = attrs.get(name).ok_or_else(|| Error::PathNotFound {
                            path: path.clone(),
                            name: name.clone(),
                        })?;
                        Ok((name.clone(), attr_type.decode(attr, &attr_path)?))
                    })
                    .collect::<Result<_, Error>>()?;
                ObjectValue::from_parts(attr_types.clone(), Tristate::Known(attrs)).into()
            }
            // a valid wire value never has a payload of another kind than its type
            _ => {
                return Err(Error::ShapeMismatch {
                    path: path.clone(),
                    expected: expected.to_string(),
                    actual: wire.ty().to_string(),
                })
            }
        };

        Ok(value)
    }

    /// Applies a single step, relative to the root path
    ///
    /// See [Type::walk].
    pub fn apply_step(&self, step: &PathStep) -> Result<&Type, Error> {
        self.step(step, &AttributePath::root())
    }

    /// Follows `path` into this type
    ///
    /// Objects accept attribute names, lists accept element indices and maps accept element keys.
    /// All elements of a list or map share the element type, so the index or key itself is not
    /// checked.
    pub fn walk(&self, path: &AttributePath) -> Result<&Type, Error> {
        self.walk_from(path.steps(), AttributePath::root())
    }

    /// Follows `steps`, `walked` is the path that lead to `self`
    pub(crate) fn walk_from(
        &self,
        steps: &[PathStep],
        mut walked: AttributePath,
    ) -> Result<&Type, Error> {
        let mut current = self;
        for step in steps {
            current = current.step(step, &walked)?;
            walked = walked.with_step(step.clone());
        }
        Ok(current)
    }

    fn step(&self, step: &PathStep, path: &AttributePath) -> Result<&Type, Error> {
        match (self, step) {
            (Type::Object(attrs), PathStep::AttributeName(name)) => {
                attrs.get(name).ok_or_else(|| Error::PathNotFound {
                    path: path.clone(),
                    name: name.clone(),
                })
            }
            (Type::List(elem), PathStep::ElementIndex(_))
            | (Type::Map(elem), PathStep::ElementKey(_)) => Ok(elem),
            _ => Err(Error::InvalidPathStep {
                path: path.clone(),
                step: step.kind(),
                target: self.to_string(),
            }),
        }
    }
}

/// HCL-like type expressions: `string`, `list(number)`, `object({a = bool})`
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => f.write_str("string"),
            Type::Bool => f.write_str("bool"),
            Type::Number => f.write_str("number"),
            Type::List(elem) => write!(f, "list({elem})"),
            Type::Map(elem) => write!(f, "map({elem})"),
            Type::Object(attrs) => {
                f.write_str("object({")?;
                for (index, (name, ty)) in attrs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} = {ty}")?;
                }
                f.write_str("})")
            }
        }
    }
}
