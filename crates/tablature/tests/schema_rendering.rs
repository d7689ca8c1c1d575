//! End-to-end rendering scenarios through the public API.

use serde_json::{json, Value};
use tablature::{
    ColumnSpec, Converter, Declaration, ResultBuilder, RowShape, Schema, SchemaError, Table,
    TableOptions,
};

fn user_schema() -> Schema {
    Schema::builder("users")
        .column(ColumnSpec::new().named("ID").key("id").value_with(|row, _| row["id"].clone()))
        .column(ColumnSpec::new().named("Name").key("name").value_with(|row, _| row["name"].clone()))
        .column(
            ColumnSpec::new()
                .names(["Pet 1", "Pet 2", "Pet 3"])
                .keys(["pet1", "pet2", "pet3"])
                .value_with(|row, _| row["pets"].clone()),
        )
        .build()
}

#[test]
fn projects_records_through_the_schema() {
    let table = user_schema().instantiate(Value::Null).unwrap();

    assert_eq!(
        table.header(&Value::Null),
        json!(["ID", "Name", "Pet 1", "Pet 2", "Pet 3"])
    );

    let rows: Vec<Value> = table
        .body(vec![
            json!({ "id": 1, "name": "Taro", "pets": ["cat", "dog"] }),
            json!({ "id": 2, "name": "Hana", "pets": [] }),
            json!({ "id": 3, "name": "Jiro", "pets": ["a", "b", "c", "d"] }),
        ])
        .collect();

    assert_eq!(rows[0], json!([1, "Taro", "cat", "dog", null]));
    assert_eq!(rows[1], json!([2, "Hana", null, null, null]));
    assert_eq!(rows[2], json!([3, "Jiro", "a", "b", "c"]));
}

#[test]
fn map_shape_produces_keyed_records() {
    let table = user_schema()
        .instantiate_with(Value::Null, TableOptions::map())
        .unwrap();

    assert_eq!(
        table.row(&json!({ "id": 1, "name": "Taro", "pets": ["cat"] })),
        json!({ "id": 1, "name": "Taro", "pet1": "cat", "pet2": null, "pet3": null })
    );
}

#[test]
fn key_affixes_rename_map_keys() {
    let options = TableOptions {
        shape: RowShape::Map,
        key_prefix: Some("user_".to_string()),
        key_suffix: None,
        ..TableOptions::default()
    };
    let table = user_schema().instantiate_with(Value::Null, options).unwrap();

    let row = table.row(&json!({ "id": 1, "name": "Taro", "pets": [] }));
    assert_eq!(row["user_id"], json!(1));
    assert_eq!(row["user_name"], json!("Taro"));
}

#[test]
fn lazy_declarations_generate_columns_from_context() {
    let schema = Schema::builder("survey")
        .column(ColumnSpec::new().named("ID").value_with(|row, _| row["id"].clone()))
        .lazy(|ctx| {
            let questions = ctx["questions"].as_array().cloned().unwrap_or_default();
            questions
                .into_iter()
                .map(|q| {
                    let key = q.as_str().unwrap_or("").to_string();
                    let pick = key.clone();
                    Declaration::Column(
                        ColumnSpec::new()
                            .named(q)
                            .value_with(move |row, _| row["answers"][pick.as_str()].clone()),
                    )
                })
                .collect()
        })
        .build();

    let table = schema
        .instantiate(json!({ "questions": ["q1", "q2"] }))
        .unwrap();

    assert_eq!(table.header(&Value::Null), json!(["ID", "q1", "q2"]));
    assert_eq!(
        table.row(&json!({ "id": 9, "answers": { "q1": "yes", "q2": "no" } })),
        json!([9, "yes", "no"])
    );
}

#[test]
fn merged_schemas_override_converters_by_name() {
    let first = Schema::builder("first")
        .column(ColumnSpec::new().named("n").value(10))
        .converter("to_s", Converter::new(|v, _, _| json!(format!("S1:{v}"))))
        .build();
    let second = Schema::builder("second")
        .converter("to_s", Converter::new(|v, _, _| json!(format!("S2:{v}"))))
        .build();

    let merged = Schema::merge("report", &[&first, &second]).unwrap();
    let table = merged.instantiate(Value::Null).unwrap();

    assert_eq!(table.row(&Value::Null), json!(["S2:10"]));
}

#[test]
fn composed_schemas_concatenate_columns() {
    let base = Schema::builder("base")
        .column(ColumnSpec::new().named("ID").value_with(|row, _| row["id"].clone()))
        .build();
    let extra = Schema::builder("extra")
        .column(ColumnSpec::new().named("Note").value_with(|row, _| row["note"].clone()))
        .build();

    let table = base.compose(&extra).instantiate(Value::Null).unwrap();
    assert_eq!(table.header(&Value::Null), json!(["ID", "Note"]));
    assert_eq!(
        table.row(&json!({ "id": 4, "note": "ok" })),
        json!([4, "ok"])
    );
}

#[test]
fn nested_schemas_flatten_into_the_parent_row() {
    let pets = Schema::builder("pets")
        .column(
            ColumnSpec::new()
                .names(["Pet 1", "Pet 2"])
                .value_with(|row, _| row["pets"].clone()),
        )
        .build();

    let users = Schema::builder("users")
        .column(ColumnSpec::new().named("Name").value_with(|row, _| row["name"].clone()))
        .nested(pets)
        .column(ColumnSpec::new().named("Age").value_with(|row, _| row["age"].clone()))
        .build();

    let table = users.instantiate(Value::Null).unwrap();
    assert_eq!(table.width(), 4);
    assert_eq!(
        table.header(&Value::Null),
        json!(["Name", "Pet 1", "Pet 2", "Age"])
    );
    assert_eq!(
        table.row(&json!({ "name": "Taro", "pets": ["cat"], "age": 30 })),
        json!(["Taro", "cat", null, 30])
    );
}

#[test]
fn converters_then_builders_form_one_ordered_pipeline() {
    let schema = Schema::builder("s")
        .column(ColumnSpec::new().named("a").key("a").value(1))
        .column(ColumnSpec::new().named("b").key("b").value(2))
        .converter("stringify", Converter::body_only(|v, _, _| json!(v.to_string())))
        .result_builder(
            "summarize",
            ResultBuilder::body_only(|row, keys, _, _| {
                json!({ "cells": row, "keys": keys.len() })
            }),
        )
        .build();

    let table = schema.instantiate(Value::Null).unwrap();
    assert_eq!(table.header(&Value::Null), json!(["a", "b"]));
    assert_eq!(
        table.row(&Value::Null),
        json!({ "cells": ["1", "2"], "keys": 2 })
    );
}

#[test]
fn nil_declarations_require_opt_in() {
    let schema = Schema::builder("sparse")
        .column(ColumnSpec::new().named("A"))
        .declaration(Declaration::Skip)
        .build();

    let err = schema.instantiate(Value::Null).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidDeclaration { position: 2, .. }
    ));

    let options = TableOptions {
        ignore_nil_declarations: true,
        ..TableOptions::default()
    };
    let table = schema.instantiate_with(Value::Null, options).unwrap();
    assert_eq!(table.header(&Value::Null), json!(["A"]));
}

#[test]
fn compile_errors_name_the_schema_and_position() {
    let schema = Schema::builder("billing")
        .column(ColumnSpec::new().named("ok"))
        .column(ColumnSpec::new().value_with(|row, _| row.clone()))
        .build();

    let err = schema.instantiate(Value::Null).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("`billing`"));
    assert!(msg.contains("position 2"));
}

#[test]
fn tables_are_independent_render_sessions() {
    let schema = Schema::builder("env")
        .column(ColumnSpec::new().named("env").value_with(|_, table| table["env"].clone()))
        .build();

    let dev: Table = schema.instantiate(json!({ "env": "dev" })).unwrap();
    let prod: Table = schema.instantiate(json!({ "env": "prod" })).unwrap();

    assert_eq!(dev.row(&Value::Null), json!(["dev"]));
    assert_eq!(prod.row(&Value::Null), json!(["prod"]));
}

#[test]
fn body_over_infinite_input_stays_lazy() {
    let schema = Schema::builder("seq")
        .column(ColumnSpec::new().named("n").value_with(|row, _| row.clone()))
        .build();
    let table = schema.instantiate(Value::Null).unwrap();

    let rows: Vec<Value> = table.body((0..).map(|n| json!(n))).take(2).collect();
    assert_eq!(rows, vec![json!([0]), json!([1])]);
}
