//! `#[derive(GridRow)]` integration.

mod common;

use common::{people, Person, Status};
use datagrid::{
    compile_reader, resolve_value_type, FieldSpec, Row, RowShape, Value, ValueType,
};
use datagrid_macros::GridRow;

#[derive(GridRow)]
struct Reading {
    sensor: String,
    celsius: f64,
    #[grid(rename = "ok")]
    is_ok: bool,
    #[grid(skip)]
    _raw: Vec<u8>,
}

#[test]
fn member_constants() {
    assert_eq!(Person::NAME, "Name");
    assert_eq!(Person::AGE, "Age");
    assert_eq!(Person::STATUS, "Status");
    assert_eq!(Reading::SENSOR, "sensor");
    assert_eq!(Reading::OK, "ok");
}

#[test]
fn derived_rows_are_static() {
    assert_eq!(Person::SHAPE, RowShape::Static);
    assert_eq!(Reading::SHAPE, RowShape::Static);
}

#[test]
fn member_types_follow_field_types() {
    assert_eq!(
        resolve_value_type::<Person>(Person::AGE, None).unwrap(),
        ValueType::optional(ValueType::I32)
    );
    assert_eq!(
        resolve_value_type::<Person>(Person::STATUS, None).unwrap(),
        ValueType::enumeration("Status")
    );
    assert_eq!(
        resolve_value_type::<Reading>(Reading::CELSIUS, None).unwrap(),
        ValueType::F64
    );
}

#[test]
fn skipped_and_renamed_fields() {
    assert!(Reading::member("_raw").is_none());
    assert!(Reading::member("is_ok").is_none());
    assert!(Reading::member("ok").is_some());
    assert!(Person::member("notes").is_none());
}

#[test]
fn members_read_values() {
    let reading = Reading {
        sensor: "north".to_string(),
        celsius: 21.5,
        is_ok: true,
        _raw: vec![1, 2],
    };
    let read = compile_reader::<Reading>(&FieldSpec::new(Reading::CELSIUS)).unwrap();
    assert_eq!(read.call(&reading), Value::from(21.5));

    let member = Reading::member(Reading::OK).unwrap();
    assert_eq!((member.read)(&reading), Value::Bool(true));

    let rows = people();
    let status = compile_reader::<Person>(&FieldSpec::new(Person::STATUS)).unwrap();
    let names: Vec<String> = rows.iter().map(|p| status.call(p).to_string()).collect();
    assert_eq!(names, vec!["Active", "Pending", "Done", "Active"]);
    assert_eq!(
        status.call(&rows[1]),
        Value::Enum(datagrid::EnumValue::of(&Status::Pending))
    );
}
