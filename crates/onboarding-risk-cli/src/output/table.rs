use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_value, TRIGGERED_RULE_COLUMNS};

/// Format output as tables using the tabled crate.
///
/// An assessment prints its headline figures followed by one row per
/// triggered rule; batch results print one row per record.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(rules)) = map.get("triggeredRules") {
                print_assessment(map, rules);
            } else if let Some(Value::Array(results)) = map.get("results") {
                print_rows(results);
            } else if let Some(Value::Object(result)) = map.get("result") {
                print_fields(result);
            } else {
                print_fields(map);
            }
        }
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", format_value(value)),
    }
}

fn print_assessment(map: &Map<String, Value>, rules: &[Value]) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for key in ["score", "level", "totalScore"] {
        if let Some(val) = map.get(key) {
            builder.push_record([key, &format_value(val)]);
        }
    }
    println!("{}", Table::from(builder));

    if rules.is_empty() {
        println!("\nNo rules triggered");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(TRIGGERED_RULE_COLUMNS);
    for rule in rules {
        builder.push_record(
            TRIGGERED_RULE_COLUMNS
                .iter()
                .map(|col| rule.get(*col).map(format_value).unwrap_or_default()),
        );
    }
    println!("\nTriggered rules:");
    println!("{}", Table::from(builder));
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        let cell = match val {
            Value::Object(inner) => inner
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect::<Vec<_>>()
                .join("\n"),
            other => format_value(other),
        };
        builder.push_record([key.clone(), cell]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in arr {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}
