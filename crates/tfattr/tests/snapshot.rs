//! Snapshot tests
//!
//! Loads the schema documents in /tests/schemas/ and checks what they lower and decode to.

use pretty_assertions::assert_eq;
use tfattr::schema::Schema;
use tfattr::{AttributePath, Error, Type, WireValue};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFATTR_LOG"))
        .with_writer(std::io::stderr)
        .try_init();
}

fn vm_schema() -> Schema {
    init_tracing();

    let schema: Schema =
        serde_yaml::from_str(include_str!("schemas/vm.yaml")).expect("valid schema document");
    schema.validate().expect("valid attribute names");
    schema
}

fn path(input: &str) -> AttributePath {
    input.parse().expect("valid path")
}

#[test]
fn lower() {
    let ty = vm_schema().attribute_type().unwrap();

    insta::assert_yaml_snapshot!(ty, @r###"
    object:
      name: string
      tags:
        list: string
      disks:
        list:
          object:
            size: number
            labels:
              map: string
      network:
        object:
          subnet: string
    "###);
}

#[test]
fn metadata() {
    let schema = vm_schema();

    assert_eq!(schema.version, 3);
    assert_eq!(schema.description, "a virtual machine");

    let disks = schema.attribute_at_path(&path("disks")).unwrap();
    let nested = disks.nested_attributes().unwrap();
    assert_eq!((nested.min_items(), nested.max_items()), (1, 8));
}

#[test]
fn resolve() {
    let schema = vm_schema();

    let subnet = schema.attribute_at_path(&path("network.subnet")).unwrap();
    insta::assert_yaml_snapshot!(subnet, @r###"
    type: string
    computed: true
    "###);

    let err = schema
        .attribute_at_path(&path(r#"disks[0].labels["env"]"#))
        .unwrap_err();
    assert_eq!(
        err,
        Error::PathInsideAtomicAttribute {
            path: path(r#"disks[0].labels["env"]"#)
        }
    );
    assert_eq!(
        schema
            .attribute_type_at_path(&path(r#"disks[0].labels["env"]"#))
            .unwrap(),
        Type::String
    );
}

#[test]
fn decode_document() {
    let ty = vm_schema().attribute_type().unwrap();
    let json = serde_json::json!({
        "name": "vm1",
        "tags": ["a", "b"],
        "disks": [
            {"size": 10, "labels": {"env": "prod"}},
            {"size": 0.5, "labels": {"env": "dev"}}
        ],
        "network": {"subnet": "internal"}
    });

    let wire = WireValue::from_json(&ty.wire_type(), &json).unwrap();
    let value = ty.value_from_wire(&wire).unwrap();
    let encoded = value.to_wire().unwrap();
    assert_eq!(encoded, wire);

    insta::assert_yaml_snapshot!(encoded, @r###"
    name: vm1
    tags:
      - a
      - b
    disks:
      - size: 10
        labels:
          env: prod
      - size: 0.5
        labels:
          env: dev
    network:
      subnet: internal
    "###);
}

#[test]
fn decode_document_tristate() {
    let ty = vm_schema().attribute_type().unwrap();
    let json: serde_json::Value = serde_json::from_str(
        r#"{
            "name": {"$unknown": true},
            "disks": [{"size": 12345678901234567890.000000000001, "labels": null}],
            "network": null
        }"#,
    )
    .unwrap();

    let wire = WireValue::from_json(&ty.wire_type(), &json).unwrap();
    let value = ty.value_from_wire(&wire).unwrap();
    assert!(value.is_known());

    let expected: serde_json::Value = serde_json::from_str(
        r#"{
            "name": {"$unknown": true},
            "tags": null,
            "disks": [{"size": 12345678901234567890.000000000001, "labels": null}],
            "network": null
        }"#,
    )
    .unwrap();
    assert_eq!(value.to_wire().unwrap().to_json(), expected);
}
