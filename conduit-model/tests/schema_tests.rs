use conduit_model::{FieldType, SchemaDefinition, SchemaField};
use pretty_assertions::assert_eq;
use serde_json::json;

fn customer_schema() -> SchemaDefinition {
    let address = SchemaDefinition::new("address", "1.0")
        .with_field(SchemaField::string("city").required())
        .with_field(SchemaField::string("zip"));
    let order = SchemaDefinition::new("order", "1.0")
        .with_field(SchemaField::integer("number").key())
        .with_field(SchemaField::decimal("total"));

    SchemaDefinition::new("customer", "2.1")
        .with_field(SchemaField::integer("id").key())
        .with_field(SchemaField::string("name").required())
        .with_field(SchemaField::boolean("active"))
        .with_field(SchemaField::date("since"))
        .with_field(SchemaField::object("address", "address"))
        .with_field(SchemaField::array("orders", Some("order")))
        .with_nested("address", address)
        .with_nested("order", order)
}

fn violated_properties(schema: &SchemaDefinition, data: serde_json::Value) -> Vec<String> {
    schema
        .validate(&data)
        .errors()
        .iter()
        .map(|e| e.property_name.clone())
        .collect()
}

// ── SchemaField constructors ─────────────────────────────────────

#[test]
fn key_field_is_required() {
    let f = SchemaField::integer("id").key();
    assert!(f.is_key);
    assert!(f.required);
    assert_eq!(f.field_type, FieldType::Integer);
}

#[test]
fn object_field_references_nested_schema() {
    let f = SchemaField::object("address", "address");
    assert_eq!(f.field_type, FieldType::Object);
    assert_eq!(f.nested_schema.as_deref(), Some("address"));
    assert!(!f.required);
}

#[test]
fn array_field_without_nested_schema() {
    let f = SchemaField::array("tags", None);
    assert_eq!(f.field_type, FieldType::Array);
    assert!(f.nested_schema.is_none());
}

#[test]
fn key_fields_in_declaration_order() {
    let schema = customer_schema();
    let keys: Vec<_> = schema.key_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(keys, vec!["id"]);
    assert!(schema.field("orders").is_some());
    assert!(schema.field("missing").is_none());
}

// ── Conformance ─────────────────────────────────────────────────

#[test]
fn conforming_record_is_valid() {
    let data = json!({
        "id": 7,
        "name": "Ada",
        "active": true,
        "since": "2024-02-29",
        "address": {"city": "London"},
        "orders": [{"number": 1, "total": 9.5}, {"number": 2}]
    });
    assert!(customer_schema().validate(&data).is_valid());
}

#[test]
fn every_violation_is_reported() {
    let data = json!({
        "name": 12,
        "active": "yes",
        "since": "29/02/2024"
    });
    let props = violated_properties(&customer_schema(), data);
    assert_eq!(props, vec!["id", "name", "active", "since"]);
}

#[test]
fn null_required_field_counts_as_missing() {
    let data = json!({"id": null, "name": "x"});
    assert_eq!(violated_properties(&customer_schema(), data), vec!["id"]);
}

#[test]
fn nested_violations_use_dotted_paths() {
    let data = json!({
        "id": 1,
        "name": "x",
        "address": {"zip": 123},
        "orders": [{"number": 1}, {"total": "cheap"}]
    });
    let props = violated_properties(&customer_schema(), data);
    assert_eq!(
        props,
        vec![
            "address.city",
            "address.zip",
            "orders[1].number",
            "orders[1].total"
        ]
    );
}

#[test]
fn array_input_is_validated_per_record() {
    let data = json!([{"id": 1, "name": "a"}, {"name": "b"}, "nope"]);
    let props = violated_properties(&customer_schema(), data);
    assert_eq!(props, vec!["[1].id", "[2]"]);
}

#[test]
fn scalar_input_is_rejected() {
    let props = violated_properties(&customer_schema(), json!(42));
    assert_eq!(props, vec!["$"]);
}

#[test]
fn unknown_nested_schema_is_a_violation() {
    let schema = SchemaDefinition::new("broken", "1.0")
        .with_field(SchemaField::object("child", "ghost"));
    let result = schema.validate(&json!({"child": {}}));
    assert_eq!(result.len(), 1);
    assert!(result.errors()[0].error_message.contains("ghost"));
}

// ── FieldType ───────────────────────────────────────────────────

#[test]
fn field_type_accepts() {
    assert!(FieldType::Integer.accepts(&json!(3)));
    assert!(!FieldType::Integer.accepts(&json!(3.5)));
    assert!(FieldType::Decimal.accepts(&json!(3)));
    assert!(FieldType::DateTime.accepts(&json!("2024-01-01T10:00:00Z")));
    assert!(!FieldType::DateTime.accepts(&json!("2024-01-01")));
    assert!(FieldType::Time.accepts(&json!("23:59:01")));
    assert!(!FieldType::Time.accepts(&json!("25:00:00")));
    assert!(FieldType::Binary.accepts(&json!([0, 255])));
    assert!(!FieldType::Binary.accepts(&json!([256])));
    assert!(FieldType::Custom.accepts(&json!({"any": "thing"})));
}

#[test]
fn field_type_serde_snake_case() {
    assert_eq!(serde_json::to_string(&FieldType::DateTime).unwrap(), "\"date_time\"");
    let parsed: FieldType = serde_json::from_str("\"binary\"").unwrap();
    assert_eq!(parsed, FieldType::Binary);
}

#[test]
fn schema_deserializes_with_defaults() {
    let schema: SchemaDefinition = serde_json::from_value(json!({
        "name": "s",
        "version": "1",
        "fields": [{"name": "a", "field_type": "string"}]
    }))
    .unwrap();
    assert!(!schema.fields[0].required);
    assert!(schema.nested_schemas.is_empty());
}
