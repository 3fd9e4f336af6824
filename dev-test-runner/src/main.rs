//! Replays a fixed set of payloads against a representative schema and prints
//! each one raw, then either cleaned or with its failure trace.
use chrono::NaiveDate;
use json_clean::compile::{any, mapping, optional, sequence, tuple};
use json_clean::{Cleaner, FailureKind, Schema, SchemaError, TypeNode, ValidationFailure};
use serde_json::{Value as Json, json};

fn schema() -> Schema {
    let cutoff = NaiveDate::from_ymd_opt(2017, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    mapping([
        ("foo", TypeNode::string().into()),
        ("bar", TypeNode::number().into()),
        ("hoho", optional(TypeNode::number())),
        (
            "nest",
            mapping([
                ("somedate", TypeNode::date().into()),
                (
                    "constrained_date",
                    TypeNode::datetime()
                        .with_fallible_condition(move |v| match (v.as_datetime(), cutoff) {
                            (Some(d), Some(limit)) if d > limit => Err("date must be before 2017-01-01"),
                            _ => Ok(true),
                        })
                        .into(),
                ),
                ("nest", sequence(TypeNode::number().min(0.0))),
            ]),
        ),
        (
            "mixed",
            optional(sequence(any([
                Schema::from(TypeNode::string()),
                TypeNode::number().into(),
                TypeNode::boolean().into(),
                sequence(TypeNode::null()),
            ]))),
        ),
        ("pairlist", sequence(tuple([TypeNode::string(), TypeNode::number()]))),
        ("strict_bool", TypeNode::boolean().into()),
        ("permissive_bool", TypeNode::boolean().lenient().into()),
        (
            "enum",
            any([TypeNode::constant("FOO"), TypeNode::constant("BAR"), TypeNode::constant("BAZ")]),
        ),
    ])
}

fn passing() -> Json {
    json!({
        "foo": "hello",
        "bar": "1234",
        "nest": {
            "somedate": "2000-01-01",
            "constrained_date": "2000-01-02T10:10:10.123Z",
            "somethingextra": "not validated",
            "nest": [1, 2, 3, 4]
        },
        "mixed": [1, "hello", true, 123.1234, [null], "OH MY GOD"],
        "pairlist": [["hello", 1], ["goodbye", 120]],
        "strict_bool": true,
        "permissive_bool": "false",
        "enum": "BAZ"
    })
}

fn scenarios() -> Vec<(&'static str, Json)> {
    let base = passing();
    let with = |edit: fn(&mut Json)| {
        let mut doc = base.clone();
        edit(&mut doc);
        doc
    };
    vec![
        ("passing", base.clone()),
        ("failing condition", with(|d| d["nest"]["constrained_date"] = json!("2018-01-02T10:10:10"))),
        ("failing schema", with(|d| d["hoho"] = json!("1234a"))),
        ("failing composite", with(|d| d["mixed"] = json!([1, 2, [3, 4, null]]))),
        (
            "failing tuple",
            with(|d| d["pairlist"] = json!([["hello", 1], ["goodbye", 120], ["butwait", 1000, 1000]])),
        ),
        ("failing enum", with(|d| d["enum"] = json!("BARZ"))),
    ]
}

fn print_failure(failure: &ValidationFailure, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}- [{}] {failure}", failure.kind.name());
    if let FailureKind::NoAlternativeMatched { attempts } = &failure.kind {
        for attempt in attempts {
            print_failure(attempt, depth + 1);
        }
    }
}

fn main() -> Result<(), SchemaError> {
    let cleaner = Cleaner::new(schema())?;
    for (label, raw) in scenarios() {
        println!("==> {label}");
        println!("RAW:   {raw}");
        match cleaner.clean_json(&raw) {
            Ok(clean) => println!("CLEAN: {clean}"),
            Err(error) => {
                println!("ERROR:");
                for failure in error.failures() {
                    print_failure(failure, 1);
                }
            }
        }
        println!();
    }
    Ok(())
}
