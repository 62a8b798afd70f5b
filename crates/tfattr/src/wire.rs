//! tri-state wire values
//!
//! The transport layer exchanges [WireValue]s with this crate: a [WireType] plus a payload that is
//! unknown, null or known. This module only models them, framing and protocol handling live
//! elsewhere.
//!
//! A json codec is included, mainly for tooling and tests:
//! - `null` is a null value
//! - `{"$unknown": true}` is an unknown value
//! - map and object keys starting with `$` get one more `$` (`"$$unknown"` is the key `$unknown`),
//!   other keys are used as they are
//! - numbers keep their full text (`serde_json` is built with `arbitrary_precision`)
//! - object attributes missing from a json object are null
use crate::error::Error;
use crate::path::AttributePath;
use crate::reflect::{integer, FIXED_WIDTH_DIGITS};
use crate::value::Tristate;
use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Object key marking an unknown value in json documents
pub const UNKNOWN_KEY: &str = "$unknown";

/// Shape of a wire value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    String,
    Bool,
    Number,
    List(Box<WireType>),
    Map(Box<WireType>),
    Object(IndexMap<String, WireType>),
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::String => f.write_str("String"),
            WireType::Bool => f.write_str("Bool"),
            WireType::Number => f.write_str("Number"),
            WireType::List(elem) => write!(f, "List[{elem}]"),
            WireType::Map(elem) => write!(f, "Map[{elem}]"),
            WireType::Object(attrs) => {
                f.write_str("Object[")?;
                for (index, (name, ty)) in attrs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name:?}:{ty}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Payload of a known wire value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WirePayload {
    String(String),
    Bool(bool),
    Number(BigDecimal),
    List(Vec<WireValue>),
    Map(IndexMap<String, WireValue>),
    Object(IndexMap<String, WireValue>),
}

impl WirePayload {
    fn kind(&self) -> &'static str {
        match self {
            WirePayload::String(_) => "string payload",
            WirePayload::Bool(_) => "bool payload",
            WirePayload::Number(_) => "number payload",
            WirePayload::List(_) => "list payload",
            WirePayload::Map(_) => "map payload",
            WirePayload::Object(_) => "object payload",
        }
    }
}

/// A typed, tri-state value as exchanged with the transport
///
/// The payload of a known value always matches its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireValue {
    ty: WireType,
    state: Tristate<WirePayload>,
}

impl WireValue {
    /// Known value, fails if `payload` doesn't match `ty`
    pub fn new(ty: WireType, payload: WirePayload) -> Result<Self, Error> {
        Self::from_state(ty, Tristate::Known(payload), &AttributePath::root())
    }

    pub(crate) fn from_state(
        ty: WireType,
        state: Tristate<WirePayload>,
        path: &AttributePath,
    ) -> Result<Self, Error> {
        if let Tristate::Known(payload) = &state {
            validate(&ty, payload, path)?;
        }
        Ok(Self { ty, state })
    }

    pub fn unknown(ty: WireType) -> Self {
        Self {
            ty,
            state: Tristate::Unknown,
        }
    }

    pub fn null(ty: WireType) -> Self {
        Self {
            ty,
            state: Tristate::Null,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            ty: WireType::String,
            state: Tristate::Known(WirePayload::String(value.into())),
        }
    }

    pub fn bool(value: bool) -> Self {
        Self {
            ty: WireType::Bool,
            state: Tristate::Known(WirePayload::Bool(value)),
        }
    }

    pub fn number(value: impl Into<BigDecimal>) -> Self {
        Self {
            ty: WireType::Number,
            state: Tristate::Known(WirePayload::Number(value.into())),
        }
    }

    pub fn list(elem: WireType, elems: Vec<WireValue>) -> Result<Self, Error> {
        Self::new(WireType::List(Box::new(elem)), WirePayload::List(elems))
    }

    pub fn map(elem: WireType, elems: IndexMap<String, WireValue>) -> Result<Self, Error> {
        Self::new(WireType::Map(Box::new(elem)), WirePayload::Map(elems))
    }

    /// Known object, its type is taken from the attribute values
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, WireValue)>) -> Self {
        let attrs: IndexMap<String, WireValue> =
            attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let ty = WireType::Object(
            attrs
                .iter()
                .map(|(name, attr)| (name.clone(), attr.ty.clone()))
                .collect(),
        );

        Self {
            ty,
            state: Tristate::Known(WirePayload::Object(attrs)),
        }
    }

    pub fn ty(&self) -> &WireType {
        &self.ty
    }

    pub fn state(&self) -> &Tristate<WirePayload> {
        &self.state
    }

    pub fn payload(&self) -> Option<&WirePayload> {
        self.state.known()
    }

    /// Reads a json document as a value of type `ty`
    pub fn from_json(ty: &WireType, json: &serde_json::Value) -> Result<Self, Error> {
        Self::from_json_at(ty, json, &AttributePath::root())
    }

    fn from_json_at(
        ty: &WireType,
        json: &serde_json::Value,
        path: &AttributePath,
    ) -> Result<Self, Error> {
        use serde_json::Value as Json;

        if json.is_null() {
            return Ok(Self::null(ty.clone()));
        }

        if is_unknown_marker(json) {
            return Ok(Self::unknown(ty.clone()));
        }

        let mismatch = || Error::ShapeMismatch {
            path: path.clone(),
            expected: ty.to_string(),
            actual: format!("json {}", json_kind(json)),
        };

        let payload = match (ty, json) {
            (WireType::String, Json::String(s)) => WirePayload::String(s.clone()),
            (WireType::Bool, Json::Bool(b)) => WirePayload::Bool(*b),
            (WireType::Number, Json::Number(n)) => {
                WirePayload::Number(BigDecimal::from_str(&n.to_string()).map_err(|_| mismatch())?)
            }
            (WireType::List(elem), Json::Array(items)) => WirePayload::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        Self::from_json_at(elem, item, &path.with_element_index(index))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            (WireType::Map(elem), Json::Object(entries)) => WirePayload::Map(
                entries
                    .iter()
                    .map(|(key, entry)| {
                        let key = unescape_key(key);
                        let entry_path = path.with_element_key(key);
                        Ok((key.to_string(), Self::from_json_at(elem, entry, &entry_path)?))
                    })
                    .collect::<Result<_, Error>>()?,
            ),
            (WireType::Object(attr_types), Json::Object(entries)) => {
                if let Some(extra) = entries
                    .keys()
                    .map(|key| unescape_key(key))
                    .find(|key| !attr_types.contains_key(*key))
                {
                    return Err(Error::PathNotFound {
                        path: path.clone(),
                        name: extra.to_string(),
                    });
                }

                WirePayload::Object(
                    attr_types
                        .iter()
                        .map(|(name, attr_type)| {
                            let attr = match entries.get(&*escape_key(name)) {
                                Some(entry) => Self::from_json_at(
                                    attr_type,
                                    entry,
                                    &path.with_attribute_name(name.as_str()),
                                )?,
                                None => Self::null(attr_type.clone()),
                            };
                            Ok((name.clone(), attr))
                        })
                        .collect::<Result<_, Error>>()?,
                )
            }
            _ => return Err(mismatch()),
        };

        Ok(Self {
            ty: ty.clone(),
            state: Tristate::Known(payload),
        })
    }

    /// Renders the value as json without losing numeric precision
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        let payload = match &self.state {
            Tristate::Unknown => return unknown_marker(),
            Tristate::Null => return Json::Null,
            Tristate::Known(payload) => payload,
        };

        match payload {
            WirePayload::String(s) => Json::String(s.clone()),
            WirePayload::Bool(b) => Json::Bool(*b),
            WirePayload::Number(n) => serde_json::Number::from_str(&n.to_string())
                .map(Json::Number)
                .unwrap_or_else(|_| Json::String(n.to_string())),
            WirePayload::List(elems) => Json::Array(elems.iter().map(Self::to_json).collect()),
            WirePayload::Map(elems) | WirePayload::Object(elems) => Json::Object(
                elems
                    .iter()
                    .map(|(key, elem)| (escape_key(key).into_owned(), elem.to_json()))
                    .collect(),
            ),
        }
    }
}

/// `value` as a float, if the float prints as exactly `value`
fn exact_float(value: &BigDecimal) -> Option<f64> {
    let (_, scale) = value.as_bigint_and_exponent();
    if value.digits() > 17 || !(1..=350).contains(&scale) {
        return None;
    }

    let float = value.to_string().parse::<f64>().ok()?;
    (BigDecimal::from_str(&float.to_string()).ok().as_ref() == Some(value)).then_some(float)
}

/// Json spelling of a map key or attribute name
fn escape_key(key: &str) -> Cow<'_, str> {
    if key.starts_with('$') {
        Cow::Owned(format!("${key}"))
    } else {
        Cow::Borrowed(key)
    }
}

fn unescape_key(key: &str) -> &str {
    key.strip_prefix('$')
        .filter(|rest| rest.starts_with('$'))
        .unwrap_or(key)
}

fn is_unknown_marker(json: &serde_json::Value) -> bool {
    json.as_object().is_some_and(|object| {
        object.len() == 1 && object.get(UNKNOWN_KEY) == Some(&serde_json::Value::Bool(true))
    })
}

fn unknown_marker() -> serde_json::Value {
    let mut marker = serde_json::Map::new();
    marker.insert(UNKNOWN_KEY.to_string(), serde_json::Value::Bool(true));
    serde_json::Value::Object(marker)
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Checks a payload against its type, child values are already valid on their own
fn validate(ty: &WireType, payload: &WirePayload, path: &AttributePath) -> Result<(), Error> {
    match (ty, payload) {
        (WireType::String, WirePayload::String(_))
        | (WireType::Bool, WirePayload::Bool(_))
        | (WireType::Number, WirePayload::Number(_)) => Ok(()),
        (WireType::List(elem), WirePayload::List(elems)) => {
            for (index, value) in elems.iter().enumerate() {
                expect_type(elem, value, &path.with_element_index(index))?;
            }
            Ok(())
        }
        (WireType::Map(elem), WirePayload::Map(elems)) => {
            for (key, value) in elems {
                expect_type(elem, value, &path.with_element_key(key.as_str()))?;
            }
            Ok(())
        }
        (WireType::Object(attr_types), WirePayload::Object(attrs)) => {
            if attr_types.len() != attrs.len() {
                return Err(Error::ShapeMismatch {
                    path: path.clone(),
                    expected: ty.to_string(),
                    actual: object_shape(attrs).to_string(),
                });
            }

            for (name, value) in attrs {
                let Some(attr_type) = attr_types.get(name) else {
                    return Err(Error::ShapeMismatch {
                        path: path.clone(),
                        expected: ty.to_string(),
                        actual: object_shape(attrs).to_string(),
                    });
                };
                expect_type(attr_type, value, &path.with_attribute_name(name.as_str()))?;
            }
            Ok(())
        }
        _ => Err(Error::ShapeMismatch {
            path: path.clone(),
            expected: ty.to_string(),
            actual: payload.kind().to_string(),
        }),
    }
}

fn expect_type(expected: &WireType, value: &WireValue, path: &AttributePath) -> Result<(), Error> {
    if &value.ty == expected {
        return Ok(());
    }

    Err(Error::ShapeMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        actual: value.ty.to_string(),
    })
}

fn object_shape(attrs: &IndexMap<String, WireValue>) -> WireType {
    WireType::Object(
        attrs
            .iter()
            .map(|(name, attr)| (name.clone(), attr.ty.clone()))
            .collect(),
    )
}

/// Format independent rendering
///
/// Numbers are written as integers or floats when that is lossless and as strings otherwise. Use
/// [WireValue::to_json] for json output that keeps every digit.
impl Serialize for WireValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.state {
            Tristate::Unknown => {
                let mut ser = serializer.serialize_map(Some(1))?;
                ser.serialize_entry(UNKNOWN_KEY, &true)?;
                ser.end()
            }
            Tristate::Null => serializer.serialize_unit(),
            Tristate::Known(payload) => payload.serialize(serializer),
        }
    }
}

impl Serialize for WirePayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            WirePayload::String(value) => serializer.serialize_str(value),
            WirePayload::Bool(value) => serializer.serialize_bool(*value),
            WirePayload::Number(value) => {
                if let Some(int) = integer(value, Some(FIXED_WIDTH_DIGITS)) {
                    if let Ok(int) = i64::try_from(&int) {
                        return serializer.serialize_i64(int);
                    }
                    if let Ok(int) = u64::try_from(&int) {
                        return serializer.serialize_u64(int);
                    }
                } else if let Some(float) = exact_float(value) {
                    return serializer.serialize_f64(float);
                }

                serializer.serialize_str(&value.to_string())
            }
            WirePayload::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            WirePayload::Map(value) | WirePayload::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(&*escape_key(element_key), element_value)?;
                }
                ser.end()
            }
        }
    }
}
