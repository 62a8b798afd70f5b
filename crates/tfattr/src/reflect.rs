//! conversion between values and native types
//!
//! [FromValue] decodes a [Value] into a native type, [ToValue] encodes a native type as a [Value]
//! of a given [Type]. Both are implemented for
//! - `String`, `bool`, every integer width, `f32`/`f64`, [BigDecimal] and [BigInt]
//! - `Vec<T>` (lists) and `HashMap`/`BTreeMap`/`IndexMap` with `String` keys (maps)
//! - `Option<T>`: null is `None`
//! - [Tristate]: keeps unknown, null and known apart
//! - [Value] and all value types, they are passed through as they are
//!
//! Structs derive both traits, binding each field to an attribute:
//! ```
//! use tfattr::{FromValue, ToValue};
//!
//! #[derive(Debug, Default, FromValue, ToValue)]
//! struct Disk {
//!     #[tfattr(name = "size")]
//!     size: u64,
//!     #[tfattr(name = "labels")]
//!     labels: std::collections::BTreeMap<String, String>,
//! }
//! ```
//! Attribute names of the object type and field names of the struct must match exactly.
//!
//! A native type that can't represent an unknown or null value (e.g. `String`) fails with
//! [Error::UnhandledNullOrUnknown], unless [Options] allow using its empty value instead.
//!
//! Implement the traits by hand for custom representations of a value.
//!
//! Conversion is synchronous and takes no caller context. Hand written implementations only see
//! the current `tracing` span ([into] and [from_struct] open one), there is no way to pass them a
//! deadline or cancellation signal.
use crate::error::Error;
use crate::path::AttributePath;
use crate::types::Type;
use crate::value::{BoolValue, ListValue, MapValue, NumberValue, ObjectValue, StringValue};
use crate::value::{Tristate, Value, ValueState};
use crate::wire::WireValue;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

/// Decoding options
///
/// Both default to `false`: unknown and null values that the target type can't represent fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// use the empty value of the target type for unhandled null values
    pub unhandled_null_as_empty: bool,
    /// use the empty value of the target type for unhandled unknown values
    pub unhandled_unknown_as_empty: bool,
}

/// Native types that can be decoded from a [Value]
pub trait FromValue: Sized {
    /// `path` is the location of `value`, used in errors
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error>;
}

/// Native types that can be encoded as a [Value]
pub trait ToValue {
    /// Encodes `self` as a value of type `ty`, `path` is the location of the value
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error>;
}

/// Decodes a wire value of type `ty` into `T`
#[tracing::instrument(level = "trace", skip_all)]
pub fn into<T: FromValue>(ty: &Type, wire: &WireValue, options: Options) -> Result<T, Error> {
    let value = ty.value_from_wire(wire)?;
    T::from_value(&value, &options, &AttributePath::root())
}

/// Encodes `native` as a value of type `ty`
#[tracing::instrument(level = "trace", skip_all)]
pub fn from_struct<T: ToValue + ?Sized>(ty: &Type, native: &T) -> Result<Value, Error> {
    native.to_value(ty, &AttributePath::root())
}

/// Outcome of an unknown or null value hitting a type that can't represent it
///
/// Either the empty value of `T` (if `options` allow it) or [Error::UnhandledNullOrUnknown].
pub fn unhandled<T: Default>(
    state: ValueState,
    options: &Options,
    path: &AttributePath,
) -> Result<T, Error> {
    let as_empty = match state {
        ValueState::Null => options.unhandled_null_as_empty,
        ValueState::Unknown => options.unhandled_unknown_as_empty,
        ValueState::Known => false,
    };

    if as_empty {
        tracing::trace!(%path, %state, target = %native_name::<T>(), "using empty value");
        return Ok(T::default());
    }

    Err(Error::UnhandledNullOrUnknown {
        path: path.clone(),
        state,
        target: native_name::<T>(),
    })
}

/// Type name without module paths, e.g. `Vec<String>`
pub(crate) fn native_name<T: ?Sized>() -> String {
    fn last_segment(path: &str) -> &str {
        path.rsplit("::").next().unwrap_or(path)
    }

    let full = std::any::type_name::<T>();
    let mut name = String::with_capacity(full.len());
    let mut path = String::new();

    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            name.push_str(last_segment(&path));
            path.clear();
            name.push(c);
        }
    }
    name.push_str(last_segment(&path));

    name
}

fn mismatch<T: ?Sized>(ty: &Type, path: &AttributePath) -> Error {
    Error::TypeMismatch {
        path: path.clone(),
        ty: ty.to_string(),
        other: native_name::<T>(),
    }
}

fn expect_type<T: ?Sized>(ty: &Type, expected: &Type, path: &AttributePath) -> Result<(), Error> {
    if ty == expected {
        Ok(())
    } else {
        Err(mismatch::<T>(ty, path))
    }
}

fn number_conversion<T: ?Sized>(value: &dyn std::fmt::Display, path: &AttributePath) -> Error {
    Error::NumberConversion {
        path: path.clone(),
        value: value.to_string(),
        target: native_name::<T>(),
    }
}

/// Decimal digits of `u128::MAX`, no fixed width integer has more
pub(crate) const FIXED_WIDTH_DIGITS: i64 = 39;

/// The number as an integer
///
/// `None` if it has a fractional part or more than `max_digits` digits before the decimal point.
/// Digit count and exponent are checked before any power of ten is built.
pub(crate) fn integer(number: &BigDecimal, max_digits: Option<i64>) -> Option<BigInt> {
    if number.is_zero() {
        return Some(BigInt::zero());
    }

    let (int, scale) = number.as_bigint_and_exponent();
    let digits = i64::try_from(number.digits()).ok()?;
    if max_digits.is_some_and(|max| digits.saturating_sub(scale) > max) {
        return None;
    }

    if scale <= 0 {
        let shift = u32::try_from(scale.unsigned_abs()).ok()?;
        return Some(int * BigInt::from(10).pow(shift));
    }
    // every digit is behind the decimal point
    if scale > digits {
        return None;
    }

    let divisor = BigInt::from(10).pow(u32::try_from(scale).ok()?);
    if !(&int % &divisor).is_zero() {
        return None;
    }
    Some(int / divisor)
}

/// Known payload of a number value, or the outcome of [unhandled]
macro_rules! known_number {
    ($target:ty, $value:expr, $options:expr, $path:expr) => {{
        let Value::Number(number) = $value else {
            return Err(mismatch::<$target>(&$value.ty(), $path));
        };
        match number.value() {
            Some(number) => number,
            None => return unhandled($value.state(), $options, $path),
        }
    }};
}

impl FromValue for String {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        let Value::String(string) = value else {
            return Err(mismatch::<Self>(&value.ty(), path));
        };
        match string.value() {
            Some(string) => Ok(string.clone()),
            None => unhandled(value.state(), options, path),
        }
    }
}

impl ToValue for str {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        expect_type::<Self>(ty, &Type::String, path)?;
        Ok(StringValue::known(self).into())
    }
}

impl ToValue for String {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        self.as_str().to_value(ty, path)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        let Value::Bool(boolean) = value else {
            return Err(mismatch::<Self>(&value.ty(), path));
        };
        match boolean.value() {
            Some(boolean) => Ok(*boolean),
            None => unhandled(value.state(), options, path),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        expect_type::<Self>(ty, &Type::Bool, path)?;
        Ok(BoolValue::known(*self).into())
    }
}

macro_rules! integer_impl {
    ($($int:ty),*) => {$(
        impl FromValue for $int {
            fn from_value(
                value: &Value,
                options: &Options,
                path: &AttributePath,
            ) -> Result<Self, Error> {
                let number = known_number!(Self, value, options, path);
                integer(number, Some(FIXED_WIDTH_DIGITS))
                    .and_then(|int| <$int>::try_from(&int).ok())
                    .ok_or_else(|| number_conversion::<Self>(number, path))
            }
        }

        impl ToValue for $int {
            fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
                expect_type::<Self>(ty, &Type::Number, path)?;
                Ok(NumberValue::known(BigDecimal::new(BigInt::from(*self), 0)).into())
            }
        }
    )*};
}

integer_impl!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_impl {
    ($($float:ty),*) => {$(
        impl FromValue for $float {
            /// Nearest float, fails for numbers beyond the float's range
            fn from_value(
                value: &Value,
                options: &Options,
                path: &AttributePath,
            ) -> Result<Self, Error> {
                let number = known_number!(Self, value, options, path);
                number
                    .to_string()
                    .parse::<$float>()
                    .ok()
                    .filter(|float| float.is_finite())
                    .ok_or_else(|| number_conversion::<Self>(number, path))
            }
        }

        impl ToValue for $float {
            /// Shortest decimal that parses back to the same float
            fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
                expect_type::<Self>(ty, &Type::Number, path)?;
                if !self.is_finite() {
                    return Err(number_conversion::<BigDecimal>(self, path));
                }
                let number = BigDecimal::from_str(&self.to_string())
                    .map_err(|_| number_conversion::<BigDecimal>(self, path))?;
                Ok(NumberValue::known(number).into())
            }
        }
    )*};
}

float_impl!(f32, f64);

impl FromValue for BigDecimal {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        Ok(known_number!(Self, value, options, path).clone())
    }
}

impl ToValue for BigDecimal {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        expect_type::<Self>(ty, &Type::Number, path)?;
        Ok(NumberValue::known(self.clone()).into())
    }
}

impl FromValue for BigInt {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        let number = known_number!(Self, value, options, path);
        integer(number, None).ok_or_else(|| number_conversion::<Self>(number, path))
    }
}

impl ToValue for BigInt {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        expect_type::<Self>(ty, &Type::Number, path)?;
        Ok(NumberValue::known(BigDecimal::new(self.clone(), 0)).into())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        let Value::List(list) = value else {
            return Err(mismatch::<Self>(&value.ty(), path));
        };
        let Some(elems) = list.elements() else {
            return unhandled(value.state(), options, path);
        };

        elems
            .iter()
            .enumerate()
            .map(|(index, elem)| T::from_value(elem, options, &path.with_element_index(index)))
            .collect()
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        let Type::List(elem_type) = ty else {
            return Err(mismatch::<Self>(ty, path));
        };

        let elems = self
            .iter()
            .enumerate()
            .map(|(index, elem)| elem.to_value(elem_type, &path.with_element_index(index)))
            .collect::<Result<_, _>>()?;

        Ok(ListValue::new_at(elem_type.as_ref().clone(), elems, path)?.into())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        self.as_slice().to_value(ty, path)
    }
}

macro_rules! map_impl {
    ($($map:ident),*) => {$(
        impl<T: FromValue> FromValue for $map<String, T> {
            fn from_value(
                value: &Value,
                options: &Options,
                path: &AttributePath,
            ) -> Result<Self, Error> {
                let Value::Map(map) = value else {
                    return Err(mismatch::<Self>(&value.ty(), path));
                };
                let Some(elems) = map.elements() else {
                    return unhandled(value.state(), options, path);
                };

                elems
                    .iter()
                    .map(|(key, elem)| {
                        let elem = T::from_value(elem, options, &path.with_element_key(key.as_str()))?;
                        Ok((key.clone(), elem))
                    })
                    .collect()
            }
        }

        impl<T: ToValue> ToValue for $map<String, T> {
            fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
                let Type::Map(elem_type) = ty else {
                    return Err(mismatch::<Self>(ty, path));
                };

                let elems = self
                    .iter()
                    .map(|(key, elem)| {
                        let elem = elem.to_value(elem_type, &path.with_element_key(key.as_str()))?;
                        Ok((key.clone(), elem))
                    })
                    .collect::<Result<_, Error>>()?;

                Ok(MapValue::new_at(elem_type.as_ref().clone(), elems, path)?.into())
            }
        }
    )*};
}

map_impl!(HashMap, BTreeMap, IndexMap);

/// Null is `None`, unknown values are left to `T`
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value, options, path).map(Some)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        match self {
            Some(native) => native.to_value(ty, path),
            None => Ok(Value::null(ty)),
        }
    }
}

impl<T: FromValue> FromValue for Tristate<T> {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        Ok(match value.state() {
            ValueState::Unknown => Tristate::Unknown,
            ValueState::Null => Tristate::Null,
            ValueState::Known => Tristate::Known(T::from_value(value, options, path)?),
        })
    }
}

impl<T: ToValue> ToValue for Tristate<T> {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        match self {
            Tristate::Unknown => Ok(Value::unknown(ty)),
            Tristate::Null => Ok(Value::null(ty)),
            Tristate::Known(native) => native.to_value(ty, path),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        T::from_value(value, options, path).map(Box::new)
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        self.as_ref().to_value(ty, path)
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        (**self).to_value(ty, path)
    }
}

impl FromValue for Value {
    fn from_value(value: &Value, _options: &Options, _path: &AttributePath) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        if !self.has_type(ty) {
            return Err(Error::TypeMismatch {
                path: path.clone(),
                ty: ty.to_string(),
                other: format!("{} value", self.ty()),
            });
        }
        Ok(self.clone())
    }
}

macro_rules! value_impl {
    ($($name:ident => $variant:ident),*) => {$(
        impl FromValue for $name {
            fn from_value(
                value: &Value,
                _options: &Options,
                path: &AttributePath,
            ) -> Result<Self, Error> {
                match value {
                    Value::$variant(value) => Ok(value.clone()),
                    _ => Err(mismatch::<Self>(&value.ty(), path)),
                }
            }
        }

        impl ToValue for $name {
            fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
                Value::from(self.clone()).to_value(ty, path)
            }
        }
    )*};
}

value_impl!(
    StringValue => String,
    BoolValue => Bool,
    NumberValue => Number,
    ListValue => List,
    MapValue => Map,
    ObjectValue => Object
);

/// Checks that object attributes and struct fields have the same names
fn check_fields<'a>(
    attr_names: impl Iterator<Item = &'a String>,
    fields: &[&str],
    path: &AttributePath,
) -> Result<(), Error> {
    let attr_names: BTreeSet<&str> = attr_names.map(String::as_str).collect();
    let fields: BTreeSet<&str> = fields.iter().copied().collect();

    if attr_names == fields {
        return Ok(());
    }

    Err(Error::SchemaFieldMismatch {
        path: path.clone(),
        schema_only: attr_names
            .difference(&fields)
            .map(|name| name.to_string())
            .collect(),
        native_only: fields
            .difference(&attr_names)
            .map(|name| name.to_string())
            .collect(),
    })
}

/// Decoding half of `#[derive(FromValue)]`
///
/// Not meant to be used directly, but handy for hand written [FromValue] impls of structs.
#[derive(Debug)]
pub struct StructDecoder<'v> {
    attrs: &'v IndexMap<String, Value>,
    path: AttributePath,
}

impl<'v> StructDecoder<'v> {
    /// Checks that `value` is an object with attributes named like `fields`
    ///
    /// Returns `None` for unknown and null objects.
    pub fn new(
        value: &'v Value,
        struct_name: &str,
        fields: &[&str],
        path: &AttributePath,
    ) -> Result<Option<Self>, Error> {
        let Value::Object(object) = value else {
            return Err(Error::TypeMismatch {
                path: path.clone(),
                ty: value.ty().to_string(),
                other: struct_name.to_string(),
            });
        };

        check_fields(object.attr_types().keys(), fields, path)?;

        Ok(object.attributes().map(|attrs| Self {
            attrs,
            path: path.clone(),
        }))
    }

    /// Decodes attribute `name`
    pub fn field<T: FromValue>(&self, name: &str, options: &Options) -> Result<T, Error> {
        let value = self.attrs.get(name).ok_or_else(|| Error::PathNotFound {
            path: self.path.clone(),
            name: name.to_string(),
        })?;
        T::from_value(value, options, &self.path.with_attribute_name(name))
    }
}

/// Encoding half of `#[derive(ToValue)]`
#[derive(Debug)]
pub struct StructEncoder<'t> {
    attr_types: &'t IndexMap<String, Type>,
    attrs: IndexMap<String, Value>,
    path: AttributePath,
}

impl<'t> StructEncoder<'t> {
    /// Checks that `ty` is an object type with attributes named like `fields`
    pub fn new(
        ty: &'t Type,
        struct_name: &str,
        fields: &[&str],
        path: &AttributePath,
    ) -> Result<Self, Error> {
        let Type::Object(attr_types) = ty else {
            return Err(Error::TypeMismatch {
                path: path.clone(),
                ty: ty.to_string(),
                other: struct_name.to_string(),
            });
        };

        check_fields(attr_types.keys(), fields, path)?;

        Ok(Self {
            attr_types,
            attrs: IndexMap::with_capacity(attr_types.len()),
            path: path.clone(),
        })
    }

    /// Encodes attribute `name`
    pub fn field<T: ToValue + ?Sized>(&mut self, name: &str, native: &T) -> Result<(), Error> {
        let ty = self.attr_types.get(name).ok_or_else(|| Error::PathNotFound {
            path: self.path.clone(),
            name: name.to_string(),
        })?;
        let value = native.to_value(ty, &self.path.with_attribute_name(name))?;
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    pub fn finish(self) -> Result<Value, Error> {
        ObjectValue::new_at(self.attr_types.clone(), self.attrs, &self.path).map(Value::from)
    }
}
