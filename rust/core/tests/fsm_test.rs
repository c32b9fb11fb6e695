// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Custom schemas compiled and run through the public API.

use std::sync::Arc;
use std::thread;

use obj_lite_core::schema::MAX_SUBFIELDS;
use obj_lite_core::{
    compile, compile_for, CompositeSpec, Delimiter, DiagnosticKind, ElementParser, Failure,
    FieldSpec, Outcome, Record, ScalarSpec, Schema, SchemaError, TokenKind, Tokenizer, Value,
    ValueKind,
};

/// Run `schema` over a single line, keyword included.
fn run(schema: &Schema, line: &str) -> Result<Record, Failure> {
    let fsm = compile(schema).expect("valid schema");
    let mut parser = ElementParser::new(Arc::new(fsm));
    let mut tokenizer = Tokenizer::new(line.as_bytes());
    tokenizer.next_token();
    match parser.run(&mut tokenizer) {
        Outcome::Success(record) | Outcome::Warning(record, _) => Ok(record.clone()),
        Outcome::Error(failure) => Err(failure),
    }
}

fn floats(group: &[Option<Value>]) -> Vec<Option<f64>> {
    group
        .iter()
        .map(|v| v.as_ref().and_then(Value::as_float))
        .collect()
}

fn named_color() -> Schema {
    Schema::new(vec![
        FieldSpec::scalar("name", ValueKind::String),
        FieldSpec::composite(
            CompositeSpec::new("color", Delimiter::Space)
                .field(ScalarSpec::new("red", ValueKind::Float))
                .field(ScalarSpec::new("green", ValueKind::Float))
                .field(ScalarSpec::new("blue", ValueKind::Float)),
        ),
    ])
}

#[test]
fn space_delimited_composite() {
    let record = run(&named_color(), "kd red 1 0.5 0\n").unwrap();
    assert_eq!(record.text(0), Some("red"));
    assert_eq!(
        floats(record.group(1).unwrap()),
        vec![Some(1.0), Some(0.5), Some(0.0)]
    );

    let failure = run(&named_color(), "kd red 1 0.5\n").unwrap_err();
    assert_eq!(failure.report.kind, DiagnosticKind::SyntaxError);
    assert_eq!(
        &*failure.report.message,
        "parameter blue of the color is not specified"
    );

    let failure = run(&named_color(), "kd red\n").unwrap_err();
    assert_eq!(
        &*failure.report.message,
        "parameters red of the color, green of the color, blue of the color are not specified"
    );
}

#[test]
fn slash_composite_with_optional_tail() {
    let schema = Schema::new(vec![FieldSpec::composite(
        CompositeSpec::new("point", Delimiter::Slash)
            .field(ScalarSpec::new("u", ValueKind::Int))
            .field(ScalarSpec::new("v", ValueKind::Int).optional()),
    )]);

    let record = run(&schema, "pt 1/2\n").unwrap();
    assert_eq!(record.group(0).unwrap()[1], Some(Value::Int(2)));

    let record = run(&schema, "pt 1 \n").unwrap();
    assert_eq!(record.group(0).unwrap()[1], None);

    let failure = run(&schema, "pt 1 2\n").unwrap_err();
    assert_eq!(failure.token.kind, TokenKind::Int);
    assert_eq!(failure.token.position.column, 5);
}

#[test]
fn enum_values() {
    let schema = Schema::new(vec![FieldSpec::scalar(
        "type",
        ValueKind::Enum(vec!["bspline".into(), "bezier".into()]),
    )]);
    let record = run(&schema, "cstype bezier\n").unwrap();
    assert_eq!(record.scalar(0), Some(&Value::Enum(1)));

    let failure = run(&schema, "cstype taylor\n").unwrap_err();
    assert_eq!(failure.report.kind, DiagnosticKind::SemanticError);
    assert_eq!(
        &*failure.report.message,
        "the type parameter must take one of the values 'bspline', 'bezier'"
    );
}

#[test]
fn repeated_scalar_min_count() {
    let schema = Schema::new(vec![FieldSpec::repeated(
        "vertex",
        ScalarSpec::new("vertex", ValueKind::Int),
        2,
    )]);
    let record = run(&schema, "l 1 2 3 4\n").unwrap();
    assert_eq!(record.repeated(0).len(), 4);

    let failure = run(&schema, "l\n").unwrap_err();
    assert_eq!(
        &*failure.report.message,
        "parameters vertex number 1, vertex number 2 are not specified"
    );
}

#[test]
fn trailing_tokens_are_rejected() {
    let schema = Schema::new(vec![FieldSpec::scalar("level", ValueKind::Int)]);
    let failure = run(&schema, "lod 1 2\n").unwrap_err();
    assert_eq!(failure.report.kind, DiagnosticKind::SyntaxError);
    assert_eq!(failure.token.text(), "2");
}

#[test]
fn too_many_subfields() {
    let mut composite = CompositeSpec::new("wide", Delimiter::Slash)
        .field(ScalarSpec::new("first", ValueKind::Int));
    for k in 0..MAX_SUBFIELDS {
        composite = composite.field(ScalarSpec::new(format!("extra {k}"), ValueKind::Int).optional());
    }
    let schema = Schema::new(vec![FieldSpec::repeated("wide", composite, 1)]);
    assert_eq!(
        compile_for("wide", &schema).err(),
        Some(SchemaError::TooManySubfields("wide".into()))
    );
}

#[test]
fn compiled_table_is_shared_across_threads() {
    let schema = Schema::new(vec![FieldSpec::repeated(
        "vertex",
        CompositeSpec::new("vertex", Delimiter::Slash)
            .field(ScalarSpec::new("index", ValueKind::Int))
            .field(ScalarSpec::new("texture", ValueKind::Int).optional())
            .field(ScalarSpec::new("normal", ValueKind::Int).optional()),
        3,
    )]);
    let fsm = Arc::new(compile_for("face", &schema).unwrap());

    let handles: Vec<_> = (0..4i64)
        .map(|t| {
            let fsm = Arc::clone(&fsm);
            thread::spawn(move || {
                let mut parser = ElementParser::new(fsm);
                let mut total = 0;
                for i in 0..100i64 {
                    let line = format!("f {i}/{t} {i}/{t} {i}/{t}\n");
                    let mut tokenizer = Tokenizer::new(line.as_bytes());
                    tokenizer.next_token();
                    let outcome = parser.run(&mut tokenizer);
                    let record = outcome.record().unwrap();
                    total += record.repeated(0).len();
                    assert_eq!(record.repeated(0)[2][1], Some(Value::Int(t)));
                }
                total
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 300);
    }
}
