//! value representation
//!
//! Every [Value] is in exactly one of three states (see [Tristate]):
//! - unknown: not known yet, e.g. computed during apply
//! - null: explicitly absent
//! - known: carries a payload
//!
//! The value variants mirror [Type]:
//! - string (utf-8)
//! - boolean (true/false)
//! - number (arbitrary precision decimal, [BigDecimal])
//! - list (ordered sequence of values sharing one element type)
//! - map (string keys, values sharing one element type)
//! - object (named attributes, each with its own type)
//!
//! Containers remember their element/attribute types even when unknown or null, and their
//! constructors reject elements of any other type. Values are never modified in place, every
//! transformation builds a new value.
use crate::error::Error;
use crate::path::AttributePath;
use crate::reflect::{FromValue, Options};
use crate::types::Type;
use crate::wire::{WirePayload, WireValue};
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use std::fmt;

/// Known, null or unknown
///
/// Also usable as a native field type: a `Tristate<String>` field keeps the distinction between
/// unknown, null and known strings when marshaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tristate<T> {
    Unknown,
    Null,
    Known(T),
}

impl<T> Default for Tristate<T> {
    fn default() -> Self {
        Tristate::Null
    }
}

impl<T> Tristate<T> {
    pub fn state(&self) -> ValueState {
        match self {
            Tristate::Unknown => ValueState::Unknown,
            Tristate::Null => ValueState::Null,
            Tristate::Known(_) => ValueState::Known,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Tristate::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tristate::Null)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Tristate::Known(_))
    }

    pub fn known(&self) -> Option<&T> {
        match self {
            Tristate::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Tristate<&T> {
        match self {
            Tristate::Unknown => Tristate::Unknown,
            Tristate::Null => Tristate::Null,
            Tristate::Known(value) => Tristate::Known(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tristate<U> {
        match self {
            Tristate::Unknown => Tristate::Unknown,
            Tristate::Null => Tristate::Null,
            Tristate::Known(value) => Tristate::Known(f(value)),
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Tristate<U>, E> {
        Ok(match self {
            Tristate::Unknown => Tristate::Unknown,
            Tristate::Null => Tristate::Null,
            Tristate::Known(value) => Tristate::Known(f(value)?),
        })
    }
}

/// Which of the three states a value is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueState {
    Unknown,
    Null,
    Known,
}

impl fmt::Display for ValueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueState::Unknown => f.write_str("unknown"),
            ValueState::Null => f.write_str("null"),
            ValueState::Known => f.write_str("known"),
        }
    }
}

macro_rules! scalar_value {
    ($(#[$meta:meta])* $name:ident, $payload:ty, $variant:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            state: Tristate<$payload>,
        }

        impl $name {
            pub fn known(value: impl Into<$payload>) -> Self {
                Self {
                    state: Tristate::Known(value.into()),
                }
            }

            pub fn unknown() -> Self {
                Self {
                    state: Tristate::Unknown,
                }
            }

            pub fn null() -> Self {
                Self {
                    state: Tristate::Null,
                }
            }

            pub fn state(&self) -> &Tristate<$payload> {
                &self.state
            }

            pub fn value(&self) -> Option<&$payload> {
                self.state.known()
            }
        }

        impl From<Tristate<$payload>> for $name {
            fn from(state: Tristate<$payload>) -> Self {
                Self { state }
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Self {
                Value::$variant(value)
            }
        }
    };
}

scalar_value!(
    /// utf-8 string value
    StringValue,
    String,
    String
);
scalar_value!(
    /// boolean value
    BoolValue,
    bool,
    Bool
);
scalar_value!(
    /// arbitrary precision number value
    ///
    /// Equality is numeric: `1` and `1.0` are equal.
    NumberValue,
    BigDecimal,
    Number
);

/// Ordered list of values of one element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValue {
    elem_type: Type,
    state: Tristate<Vec<Value>>,
}

impl ListValue {
    pub fn new(elem_type: Type, elems: Vec<Value>) -> Result<Self, Error> {
        Self::new_at(elem_type, elems, &AttributePath::root())
    }

    pub(crate) fn new_at(
        elem_type: Type,
        elems: Vec<Value>,
        path: &AttributePath,
    ) -> Result<Self, Error> {
        for (index, elem) in elems.iter().enumerate() {
            expect_type(&elem_type, elem, &path.with_element_index(index))?;
        }

        Ok(Self::from_parts(elem_type, Tristate::Known(elems)))
    }

    pub fn unknown(elem_type: Type) -> Self {
        Self::from_parts(elem_type, Tristate::Unknown)
    }

    pub fn null(elem_type: Type) -> Self {
        Self::from_parts(elem_type, Tristate::Null)
    }

    /// Caller guarantees that all elements are of `elem_type`
    pub(crate) fn from_parts(elem_type: Type, state: Tristate<Vec<Value>>) -> Self {
        Self { elem_type, state }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem_type
    }

    pub fn state(&self) -> &Tristate<Vec<Value>> {
        &self.state
    }

    pub fn elements(&self) -> Option<&[Value]> {
        self.state.known().map(Vec::as_slice)
    }

    /// Decodes the elements into a native collection such as `Vec<String>`
    ///
    /// `allow_unhandled` replaces unknown and null values the target can't represent with empty
    /// values.
    pub fn elements_as<T: FromValue>(&self, allow_unhandled: bool) -> Result<T, Error> {
        let options = Options {
            unhandled_null_as_empty: allow_unhandled,
            unhandled_unknown_as_empty: allow_unhandled,
        };
        T::from_value(
            &Value::List(self.clone()),
            &options,
            &AttributePath::root(),
        )
    }
}

/// String-keyed map of values of one element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapValue {
    elem_type: Type,
    state: Tristate<IndexMap<String, Value>>,
}

impl MapValue {
    pub fn new(elem_type: Type, elems: IndexMap<String, Value>) -> Result<Self, Error> {
        Self::new_at(elem_type, elems, &AttributePath::root())
    }

    pub(crate) fn new_at(
        elem_type: Type,
        elems: IndexMap<String, Value>,
        path: &AttributePath,
    ) -> Result<Self, Error> {
        for (key, elem) in &elems {
            expect_type(&elem_type, elem, &path.with_element_key(key.as_str()))?;
        }

        Ok(Self::from_parts(elem_type, Tristate::Known(elems)))
    }

    pub fn unknown(elem_type: Type) -> Self {
        Self::from_parts(elem_type, Tristate::Unknown)
    }

    pub fn null(elem_type: Type) -> Self {
        Self::from_parts(elem_type, Tristate::Null)
    }

    /// Caller guarantees that all elements are of `elem_type`
    pub(crate) fn from_parts(elem_type: Type, state: Tristate<IndexMap<String, Value>>) -> Self {
        Self { elem_type, state }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem_type
    }

    pub fn state(&self) -> &Tristate<IndexMap<String, Value>> {
        &self.state
    }

    pub fn elements(&self) -> Option<&IndexMap<String, Value>> {
        self.state.known()
    }

    /// Decodes the elements into a native map such as `HashMap<String, i64>`
    ///
    /// See [ListValue::elements_as].
    pub fn elements_as<T: FromValue>(&self, allow_unhandled: bool) -> Result<T, Error> {
        let options = Options {
            unhandled_null_as_empty: allow_unhandled,
            unhandled_unknown_as_empty: allow_unhandled,
        };
        T::from_value(&Value::Map(self.clone()), &options, &AttributePath::root())
    }
}

/// Object with named, individually typed attributes
///
/// A known object has exactly one value per attribute type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectValue {
    attr_types: IndexMap<String, Type>,
    state: Tristate<IndexMap<String, Value>>,
}

impl ObjectValue {
    pub fn new(
        attr_types: IndexMap<String, Type>,
        attrs: IndexMap<String, Value>,
    ) -> Result<Self, Error> {
        Self::new_at(attr_types, attrs, &AttributePath::root())
    }

    pub(crate) fn new_at(
        attr_types: IndexMap<String, Type>,
        attrs: IndexMap<String, Value>,
        path: &AttributePath,
    ) -> Result<Self, Error> {
        for (name, attr_type) in &attr_types {
            let attr_path = path.with_attribute_name(name.as_str());
            let Some(attr) = attrs.get(name) else {
                return Err(Error::PathNotFound {
                    path: path.clone(),
                    name: name.clone(),
                });
            };
            expect_type(attr_type, attr, &attr_path)?;
        }

        if let Some(extra) = attrs.keys().find(|name| !attr_types.contains_key(*name)) {
            return Err(Error::TypeMismatch {
                path: path.with_attribute_name(extra.as_str()),
                ty: Type::Object(attr_types.clone()).to_string(),
                other: format!("undeclared attribute {extra:?}"),
            });
        }

        Ok(Self::from_parts(attr_types, Tristate::Known(attrs)))
    }

    pub fn unknown(attr_types: IndexMap<String, Type>) -> Self {
        Self::from_parts(attr_types, Tristate::Unknown)
    }

    pub fn null(attr_types: IndexMap<String, Type>) -> Self {
        Self::from_parts(attr_types, Tristate::Null)
    }

    /// Caller guarantees that attribute names and types match `attr_types`
    pub(crate) fn from_parts(
        attr_types: IndexMap<String, Type>,
        state: Tristate<IndexMap<String, Value>>,
    ) -> Self {
        Self { attr_types, state }
    }

    pub fn attr_types(&self) -> &IndexMap<String, Type> {
        &self.attr_types
    }

    pub fn state(&self) -> &Tristate<IndexMap<String, Value>> {
        &self.state
    }

    pub fn attributes(&self) -> Option<&IndexMap<String, Value>> {
        self.state.known()
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|attrs| attrs.get(name))
    }

    /// Decodes the object into a native struct
    pub fn as_native<T: FromValue>(&self, options: Options) -> Result<T, Error> {
        T::from_value(
            &Value::Object(self.clone()),
            &options,
            &AttributePath::root(),
        )
    }
}

/// All possible values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(StringValue),
    Bool(BoolValue),
    Number(NumberValue),
    List(ListValue),
    Map(MapValue),
    Object(ObjectValue),
}

impl Value {
    /// Unknown value of type `ty`
    pub fn unknown(ty: &Type) -> Self {
        match ty {
            Type::String => StringValue::unknown().into(),
            Type::Bool => BoolValue::unknown().into(),
            Type::Number => NumberValue::unknown().into(),
            Type::List(elem) => ListValue::unknown(elem.as_ref().clone()).into(),
            Type::Map(elem) => MapValue::unknown(elem.as_ref().clone()).into(),
            Type::Object(attrs) => ObjectValue::unknown(attrs.clone()).into(),
        }
    }

    /// Null value of type `ty`
    pub fn null(ty: &Type) -> Self {
        match ty {
            Type::String => StringValue::null().into(),
            Type::Bool => BoolValue::null().into(),
            Type::Number => NumberValue::null().into(),
            Type::List(elem) => ListValue::null(elem.as_ref().clone()).into(),
            Type::Map(elem) => MapValue::null(elem.as_ref().clone()).into(),
            Type::Object(attrs) => ObjectValue::null(attrs.clone()).into(),
        }
    }

    /// The declared type of this value
    pub fn ty(&self) -> Type {
        match self {
            Value::String(_) => Type::String,
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::List(list) => Type::List(Box::new(list.elem_type.clone())),
            Value::Map(map) => Type::Map(Box::new(map.elem_type.clone())),
            Value::Object(object) => Type::Object(object.attr_types.clone()),
        }
    }

    /// Same as `self.ty() == *ty` without building the type
    pub fn has_type(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::String(_), Type::String)
            | (Value::Bool(_), Type::Bool)
            | (Value::Number(_), Type::Number) => true,
            (Value::List(list), Type::List(elem)) => list.elem_type == **elem,
            (Value::Map(map), Type::Map(elem)) => map.elem_type == **elem,
            (Value::Object(object), Type::Object(attrs)) => object.attr_types == *attrs,
            _ => false,
        }
    }

    pub fn state(&self) -> ValueState {
        match self {
            Value::String(v) => v.state.state(),
            Value::Bool(v) => v.state.state(),
            Value::Number(v) => v.state.state(),
            Value::List(v) => v.state.state(),
            Value::Map(v) => v.state.state(),
            Value::Object(v) => v.state.state(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.state() == ValueState::Unknown
    }

    pub fn is_null(&self) -> bool {
        self.state() == ValueState::Null
    }

    pub fn is_known(&self) -> bool {
        self.state() == ValueState::Known
    }

    /// Converts to the wire representation
    ///
    /// Every encoded container is checked against its declared element/attribute types again.
    pub fn to_wire(&self) -> Result<WireValue, Error> {
        self.encode(&AttributePath::root())
    }

    fn encode(&self, path: &AttributePath) -> Result<WireValue, Error> {
        let payload = match self {
            Value::String(v) => v.state.as_ref().map(|s| WirePayload::String(s.clone())),
            Value::Bool(v) => v.state.as_ref().map(|b| WirePayload::Bool(*b)),
            Value::Number(v) => v.state.as_ref().map(|n| WirePayload::Number(n.clone())),
            Value::List(list) => list.state.as_ref().try_map(|elems| {
                elems
                    .iter()
                    .enumerate()
                    .map(|(index, elem)| elem.encode(&path.with_element_index(index)))
                    .collect::<Result<_, _>>()
                    .map(WirePayload::List)
            })?,
            Value::Map(map) => map.state.as_ref().try_map(|elems| {
                elems
                    .iter()
                    .map(|(key, elem)| {
                        Ok((key.clone(), elem.encode(&path.with_element_key(key.as_str()))?))
                    })
                    .collect::<Result<_, Error>>()
                    .map(WirePayload::Map)
            })?,
            Value::Object(object) => object.state.as_ref().try_map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, attr)| {
                        Ok((
                            name.clone(),
                            attr.encode(&path.with_attribute_name(name.as_str()))?,
                        ))
                    })
                    .collect::<Result<_, Error>>()
                    .map(WirePayload::Object)
            })?,
        };

        WireValue::from_state(self.ty().wire_type(), payload, path)
    }
}

fn expect_type(ty: &Type, value: &Value, path: &AttributePath) -> Result<(), Error> {
    if value.has_type(ty) {
        return Ok(());
    }

    Err(Error::TypeMismatch {
        path: path.clone(),
        ty: ty.to_string(),
        other: format!("{} value", value.ty()),
    })
}

impl From<ListValue> for Value {
    fn from(value: ListValue) -> Self {
        Value::List(value)
    }
}

impl From<MapValue> for Value {
    fn from(value: MapValue) -> Self {
        Value::Map(value)
    }
}

impl From<ObjectValue> for Value {
    fn from(value: ObjectValue) -> Self {
        Value::Object(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        StringValue::known(value).into()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        StringValue::known(value).into()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        BoolValue::known(value).into()
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        NumberValue::known(value).into()
    }
}

/// Compact, HCL-like rendering used in paths and diagnostics
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state() {
            ValueState::Unknown => return f.write_str("(unknown)"),
            ValueState::Null => return f.write_str("null"),
            ValueState::Known => {}
        }

        match self {
            Value::String(v) => write!(f, "{:?}", v.value().map_or("", String::as_str)),
            Value::Bool(v) => write!(f, "{}", v.value().copied().unwrap_or_default()),
            Value::Number(v) => match v.value() {
                Some(number) => write!(f, "{number}"),
                None => Ok(()),
            },
            Value::List(list) => {
                f.write_str("[")?;
                for (index, elem) in list.elements().unwrap_or_default().iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => write_entries(f, map.elements(), true),
            Value::Object(object) => write_entries(f, object.attributes(), false),
        }
    }
}

fn write_entries(
    f: &mut fmt::Formatter<'_>,
    entries: Option<&IndexMap<String, Value>>,
    quote_keys: bool,
) -> fmt::Result {
    f.write_str("{")?;
    for (index, (key, value)) in entries.into_iter().flatten().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        if quote_keys {
            write!(f, "{key:?} = {value}")?;
        } else {
            write!(f, "{key} = {value}")?;
        }
    }
    f.write_str("}")
}
