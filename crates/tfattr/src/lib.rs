//! # tfattr - tri-state attribute values
//!
//! Typed, tri-state values described by schemas, and their conversion from and to native Rust
//! structs.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tfattr` works internally.
//!
//! ### Terms
//!
//! - a [Type] describes the shape of data: `string`, `bool`, `number` or one of the containers
//!   `list(T)`, `map(T)` (string keys) and `object({name = T, ...})`
//! - a [Value] is data of a [Type]. Every value is either
//!   - unknown: not known yet, e.g. computed later
//!   - null: explicitly absent
//!   - known: carries a payload
//! - a [WireValue] is how values travel to and from the transport, see [wire]
//! - an [AttributePath] addresses a location inside values, types and schemas, e.g. `disks[0].size`
//! - a [Schema] names attributes and groups them, see [schema]
//!
//! ### Data flow
//!
//! ```text
//!  WireValue --Type::value_from_wire--> Value --FromValue--> native struct
//!  WireValue <----Value::to_wire------- Value <--ToValue---- native struct
//! ```
//!
//! The schema does not take part in the conversion. It is lowered to a [Type] first
//! ([Schema::attribute_type]) and used to resolve paths ([Schema::attribute_at_path]).
//!
//! ### Decoding
//!
//! [Type::value_from_wire] checks unknown and null first, those are accepted without looking
//! at their shape. Known wire values must have exactly the wire shape of the type
//! ([Type::wire_type]). Containers are decoded element by element, the first error wins.
//!
//! Value containers check their elements on construction, so a [ListValue] never holds an element
//! of another type than its element type.
//!
//! ### Native structs
//!
//! See [reflect]. Struct fields are bound to attributes by name:
//!
//! ```
//! use tfattr::reflect::{self, Options};
//! use tfattr::{FromValue, ToValue, Type, WireType, WireValue};
//!
//! #[derive(Debug, Default, PartialEq, FromValue, ToValue)]
//! struct Server {
//!     #[tfattr(name = "name")]
//!     name: String,
//!     #[tfattr(name = "tags")]
//!     tags: Vec<String>,
//! }
//!
//! let ty = Type::object([("name", Type::String), ("tags", Type::list(Type::String))]);
//! let wire = WireValue::object([
//!     ("name", WireValue::string("db1")),
//!     ("tags", WireValue::list(WireType::String, vec![WireValue::string("prod")])?),
//! ]);
//!
//! let server: Server = reflect::into(&ty, &wire, Options::default())?;
//! assert_eq!(server.tags, vec!["prod"]);
//!
//! let value = reflect::from_struct(&ty, &server)?;
//! assert_eq!(value.to_wire()?, wire);
//! # Ok::<(), tfattr::Error>(())
//! ```
//!
//! ### Errors
//!
//! Every failure is an [Error] variant carrying the [AttributePath] it occurred at.
//!
extern crate self as tfattr;

pub mod error;
pub mod path;
pub mod reflect;
pub mod schema;
pub mod types;
pub mod value;
pub mod wire;

pub use error::Error;
pub use path::{AttributePath, PathStep};
pub use reflect::{FromValue, Options, ToValue};
pub use schema::{Attribute, NestedAttributes, NestingMode, Schema};
pub use types::Type;
pub use value::{BoolValue, ListValue, MapValue, NumberValue, ObjectValue, StringValue};
pub use value::{Tristate, Value, ValueState};
pub use wire::{WirePayload, WireType, WireValue};

/// `#[derive(FromValue)]`, fields need a `#[tfattr(name = "...")]` attribute
pub use tfattr_derive::FromValue;
/// `#[derive(ToValue)]`, fields need a `#[tfattr(name = "...")]` attribute
pub use tfattr_derive::ToValue;
