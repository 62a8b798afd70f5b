//! Marshaling between wire values and derived native structs

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, HashMap};
use tfattr::reflect::{self, Options};
use tfattr::{AttributePath, Error, FromValue, ToValue, Type, ValueState};
use tfattr::{StringValue, Tristate, Value, WireType, WireValue};

#[derive(Debug, Default, Clone, PartialEq, FromValue, ToValue)]
struct Server {
    #[tfattr(name = "name")]
    name: String,
    #[tfattr(name = "tags")]
    tags: Vec<String>,
}

fn server_type() -> Type {
    Type::object([("name", Type::String), ("tags", Type::list(Type::String))])
}

fn strings(elems: &[&str]) -> WireValue {
    WireValue::list(
        WireType::String,
        elems.iter().map(|elem| WireValue::string(*elem)).collect(),
    )
    .unwrap()
}

fn lenient() -> Options {
    Options {
        unhandled_null_as_empty: true,
        unhandled_unknown_as_empty: true,
    }
}

#[test]
fn decode_and_encode_record() {
    let wire = WireValue::object([
        ("name", WireValue::string("db1")),
        ("tags", strings(&["prod", "east"])),
    ]);

    let server: Server = reflect::into(&server_type(), &wire, Options::default()).unwrap();
    assert_eq!(
        server,
        Server {
            name: "db1".into(),
            tags: vec!["prod".into(), "east".into()],
        }
    );

    let value = reflect::from_struct(&server_type(), &server).unwrap();
    assert_eq!(value.to_wire().unwrap(), wire);
}

#[test]
fn unknown_and_null_as_empty() {
    let wire = WireValue::object([
        ("name", WireValue::unknown(WireType::String)),
        ("tags", WireValue::null(WireType::List(Box::new(WireType::String)))),
    ]);

    let server: Server = reflect::into(&server_type(), &wire, lenient()).unwrap();
    assert_eq!(server, Server::default());

    let first = server_type().value_from_wire(&wire).unwrap();
    let second = server_type().value_from_wire(&wire).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unhandled_unknown_fails() {
    let wire = WireValue::object([
        ("name", WireValue::unknown(WireType::String)),
        ("tags", strings(&[])),
    ]);

    let err = reflect::into::<Server>(&server_type(), &wire, Options::default()).unwrap_err();
    assert_eq!(
        err,
        Error::UnhandledNullOrUnknown {
            path: "name".parse().unwrap(),
            state: ValueState::Unknown,
            target: "String".into(),
        }
    );

    let options = Options {
        unhandled_unknown_as_empty: true,
        ..Default::default()
    };
    let server: Server = reflect::into(&server_type(), &wire, options).unwrap();
    assert_eq!(server.name, "");
}

#[test]
fn unknown_object_into_struct() {
    let wire = WireValue::unknown(server_type().wire_type());

    let err = reflect::into::<Server>(&server_type(), &wire, Options::default()).unwrap_err();
    assert_eq!(err.to_string(), "(root): unhandled unknown value, Server can't represent it");

    let server: Server = reflect::into(&server_type(), &wire, lenient()).unwrap();
    assert_eq!(server, Server::default());

    let server: Option<Server> = reflect::into(
        &server_type(),
        &WireValue::null(server_type().wire_type()),
        Options::default(),
    )
    .unwrap();
    assert_eq!(server, None);
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct OnlyName {
    #[tfattr(name = "name")]
    name: String,
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct NameAndPort {
    #[tfattr(name = "name")]
    name: String,
    #[tfattr(name = "port")]
    port: u16,
}

#[test]
fn attribute_only_in_schema() {
    let ty = Type::object([("name", Type::String), ("x", Type::String)]);
    let wire = WireValue::object([("name", WireValue::string("a")), ("x", WireValue::string("b"))]);

    let err = reflect::into::<OnlyName>(&ty, &wire, Options::default()).unwrap_err();
    assert_eq!(
        err,
        Error::SchemaFieldMismatch {
            path: AttributePath::root(),
            schema_only: vec!["x".into()],
            native_only: vec![],
        }
    );
}

#[test]
fn field_only_in_struct() {
    let ty = Type::object([("name", Type::String)]);
    let wire = WireValue::object([("name", WireValue::string("a"))]);

    let err = reflect::into::<NameAndPort>(&ty, &wire, Options::default()).unwrap_err();
    assert_eq!(
        err,
        Error::SchemaFieldMismatch {
            path: AttributePath::root(),
            schema_only: vec![],
            native_only: vec!["port".into()],
        }
    );

    let err = reflect::from_struct(&ty, &NameAndPort::default()).unwrap_err();
    assert!(matches!(err, Error::SchemaFieldMismatch { .. }), "{err}");
}

#[test]
fn fields_missing_on_both_sides() {
    let ty = Type::object([("name", Type::String), ("address", Type::String)]);
    let wire = WireValue::object([
        ("name", WireValue::string("a")),
        ("address", WireValue::string("b")),
    ]);

    let err = reflect::into::<NameAndPort>(&ty, &wire, Options::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "(root): mismatch between object and native struct: native struct defines fields not found in object: port. object defines attributes not found in native struct: address."
    );
}

/// Keeps track of unknown and null itself
#[derive(Debug, Default, PartialEq)]
enum Setting {
    #[default]
    Unset,
    Pending,
    Value(String),
}

impl FromValue for Setting {
    fn from_value(value: &Value, options: &Options, path: &AttributePath) -> Result<Self, Error> {
        Ok(match Tristate::<String>::from_value(value, options, path)? {
            Tristate::Unknown => Setting::Pending,
            Tristate::Null => Setting::Unset,
            Tristate::Known(value) => Setting::Value(value),
        })
    }
}

impl ToValue for Setting {
    fn to_value(&self, ty: &Type, path: &AttributePath) -> Result<Value, Error> {
        match self {
            Setting::Unset => Tristate::<String>::Null.to_value(ty, path),
            Setting::Pending => Tristate::<String>::Unknown.to_value(ty, path),
            Setting::Value(value) => value.to_value(ty, path),
        }
    }
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct Item {
    #[tfattr(name = "a")]
    a: String,
    #[tfattr(name = "b")]
    b: i64,
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct Inner {
    #[tfattr(name = "a")]
    a: bool,
    #[tfattr(name = "slice")]
    slice: Vec<f64>,
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct Complex {
    #[tfattr(name = "slice")]
    slice: Vec<String>,
    #[tfattr(name = "slice_of_structs")]
    slice_of_structs: Vec<Item>,
    #[tfattr(name = "struct")]
    inner: Inner,
    #[tfattr(name = "map")]
    map: HashMap<String, Vec<String>>,
    #[tfattr(name = "optional")]
    optional: Option<String>,
    #[tfattr(name = "unknownable")]
    unknownable: Tristate<String>,
    #[tfattr(name = "nullable")]
    nullable: Tristate<String>,
    #[tfattr(name = "attribute_value")]
    attribute_value: StringValue,
    #[tfattr(name = "value_converter")]
    value_converter: Setting,
    #[tfattr(name = "unhandled_null")]
    unhandled_null: String,
    #[tfattr(name = "unhandled_unknown")]
    unhandled_unknown: String,
}

fn item_type() -> Type {
    Type::object([("a", Type::String), ("b", Type::Number)])
}

fn complex_type() -> Type {
    Type::object([
        ("slice", Type::list(Type::String)),
        ("slice_of_structs", Type::list(item_type())),
        (
            "struct",
            Type::object([("a", Type::Bool), ("slice", Type::list(Type::Number))]),
        ),
        ("map", Type::map(Type::list(Type::String))),
        ("optional", Type::String),
        ("unknownable", Type::String),
        ("nullable", Type::String),
        ("attribute_value", Type::String),
        ("value_converter", Type::String),
        ("unhandled_null", Type::String),
        ("unhandled_unknown", Type::String),
    ])
}

fn item(a: &str, b: i64) -> WireValue {
    WireValue::object([("a", WireValue::string(a)), ("b", WireValue::number(b))])
}

fn complex_wire(second_b: WireValue) -> WireValue {
    let item_wire_type = item_type().wire_type();

    WireValue::object([
        ("slice", strings(&["red", "blue", "green"])),
        (
            "slice_of_structs",
            WireValue::list(
                item_wire_type,
                vec![
                    item("hello, world", 123),
                    WireValue::object([
                        ("a", WireValue::string("goodnight, moon")),
                        ("b", second_b),
                    ]),
                ],
            )
            .unwrap(),
        ),
        (
            "struct",
            WireValue::object([
                ("a", WireValue::bool(true)),
                (
                    "slice",
                    WireValue::list(
                        WireType::Number,
                        vec![
                            WireValue::number(123),
                            WireValue::number(456),
                            WireValue::number(789),
                        ],
                    )
                    .unwrap(),
                ),
            ]),
        ),
        (
            "map",
            WireValue::map(
                WireType::List(Box::new(WireType::String)),
                IndexMap::from([
                    ("colors".to_string(), strings(&["red", "orange", "yellow"])),
                    ("fruits".to_string(), strings(&["apple", "banana"])),
                ]),
            )
            .unwrap(),
        ),
        ("optional", WireValue::string("pointed")),
        ("unknownable", WireValue::unknown(WireType::String)),
        ("nullable", WireValue::null(WireType::String)),
        ("attribute_value", WireValue::unknown(WireType::String)),
        ("value_converter", WireValue::null(WireType::String)),
        ("unhandled_null", WireValue::null(WireType::String)),
        ("unhandled_unknown", WireValue::unknown(WireType::String)),
    ])
}

#[test]
fn decode_complex() {
    let complex: Complex =
        reflect::into(&complex_type(), &complex_wire(WireValue::number(456)), lenient()).unwrap();

    assert_eq!(
        complex,
        Complex {
            slice: vec!["red".into(), "blue".into(), "green".into()],
            slice_of_structs: vec![
                Item {
                    a: "hello, world".into(),
                    b: 123,
                },
                Item {
                    a: "goodnight, moon".into(),
                    b: 456,
                },
            ],
            inner: Inner {
                a: true,
                slice: vec![123.0, 456.0, 789.0],
            },
            map: HashMap::from([
                (
                    "colors".to_string(),
                    vec!["red".into(), "orange".into(), "yellow".into()],
                ),
                ("fruits".to_string(), vec!["apple".into(), "banana".into()]),
            ]),
            optional: Some("pointed".into()),
            unknownable: Tristate::Unknown,
            nullable: Tristate::Null,
            attribute_value: StringValue::unknown(),
            value_converter: Setting::Unset,
            unhandled_null: String::new(),
            unhandled_unknown: String::new(),
        }
    );
}

#[test]
fn decode_complex_error_path() {
    let wire = complex_wire(WireValue::number(
        "4.5".parse::<bigdecimal::BigDecimal>().unwrap(),
    ));

    let err = reflect::into::<Complex>(&complex_type(), &wire, lenient()).unwrap_err();
    assert_eq!(
        err,
        Error::NumberConversion {
            path: "slice_of_structs[1].b".parse().unwrap(),
            value: "4.5".into(),
            target: "i64".into(),
        }
    );
}

#[test]
fn decode_strict_reports_first_unhandled() {
    let err = reflect::into::<Complex>(
        &complex_type(),
        &complex_wire(WireValue::number(456)),
        Options::default(),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "unhandled_null: unhandled null value, String can't represent it"
    );
}

#[test]
fn complex_round_trip() {
    let native = Complex {
        slice: vec!["red".into()],
        slice_of_structs: vec![Item {
            a: "x".into(),
            b: -7,
        }],
        inner: Inner {
            a: false,
            slice: vec![0.25, 1e-7],
        },
        map: HashMap::from([("empty".to_string(), vec![])]),
        optional: None,
        unknownable: Tristate::Known("known".into()),
        nullable: Tristate::Null,
        attribute_value: StringValue::null(),
        value_converter: Setting::Pending,
        unhandled_null: "set".into(),
        unhandled_unknown: "also set".into(),
    };

    let value = reflect::from_struct(&complex_type(), &native).unwrap();
    let wire = value.to_wire().unwrap();
    let decoded: Complex = reflect::into(&complex_type(), &wire, Options::default()).unwrap();

    assert_eq!(decoded, native);
}

#[test]
fn encode_type_mismatch_has_path() {
    let ty = Type::object([
        ("name", Type::String),
        ("tags", Type::list(Type::Number)),
    ]);

    let err = reflect::from_struct(
        &ty,
        &Server {
            name: "db1".into(),
            tags: vec!["a".into()],
        },
    )
    .unwrap_err();

    assert_eq!(
        err,
        Error::TypeMismatch {
            path: "tags[0]".parse().unwrap(),
            ty: "number".into(),
            other: "str".into(),
        }
    );
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct Labels {
    #[tfattr(name = "labels")]
    labels: BTreeMap<String, Option<u32>>,
}

#[test]
fn as_native() {
    let ty = Type::object([("labels", Type::map(Type::Number))]);
    let wire = WireValue::from_json(
        &ty.wire_type(),
        &serde_json::json!({"labels": {"a": 1, "b": null}}),
    )
    .unwrap();

    let Value::Object(object) = ty.value_from_wire(&wire).unwrap() else {
        panic!("expected an object");
    };

    let labels: Labels = object.as_native(Options::default()).unwrap();
    assert_eq!(
        labels.labels,
        BTreeMap::from([("a".to_string(), Some(1)), ("b".to_string(), None)])
    );
}

#[derive(Debug, Default, PartialEq, FromValue, ToValue)]
struct Entry<T> {
    #[tfattr(name = "key")]
    key: String,
    #[tfattr(name = "value")]
    value: T,
}

#[test]
fn generic_struct() {
    let ty = Type::object([("key", Type::String), ("value", Type::Number)]);
    let wire = WireValue::object([
        ("key", WireValue::string("port")),
        ("value", WireValue::number(8080)),
    ]);

    let entry: Entry<u16> = reflect::into(&ty, &wire, Options::default()).unwrap();
    assert_eq!(
        entry,
        Entry {
            key: "port".into(),
            value: 8080,
        }
    );
    assert_eq!(reflect::from_struct(&ty, &entry).unwrap().to_wire().unwrap(), wire);

    let ty = Type::object([("key", Type::String), ("value", Type::list(Type::Bool))]);
    let unknown = WireValue::unknown(ty.wire_type());
    let entry: Entry<Vec<bool>> = reflect::into(&ty, &unknown, lenient()).unwrap();
    assert_eq!(entry, Entry::default());
}
