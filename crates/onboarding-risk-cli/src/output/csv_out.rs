use serde_json::Value;
use std::io;

use super::{format_value, TRIGGERED_RULE_COLUMNS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// An assessment is written as its triggered rules, one row each.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => {
            if let Some(Value::Array(rules)) = map.get("triggeredRules") {
                write_triggered_rules(&mut wtr, rules)
            } else if let Some(Value::Array(results)) = map.get("results") {
                write_rows(&mut wtr, results)
            } else {
                let fields = match map.get("result") {
                    Some(Value::Object(result)) => result,
                    _ => map,
                };
                write_fields(&mut wtr, fields)
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr),
        _ => wtr.write_record([format_value(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {}", e);
    }
}

fn write_triggered_rules(wtr: &mut StdoutWriter<'_>, rules: &[Value]) -> csv::Result<()> {
    wtr.write_record(TRIGGERED_RULE_COLUMNS)?;
    for rule in rules {
        wtr.write_record(
            TRIGGERED_RULE_COLUMNS
                .iter()
                .map(|col| rule.get(*col).map(format_value).unwrap_or_default()),
        )?;
    }
    Ok(())
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &serde_json::Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        match val {
            // nested maps (rules per category) flatten to dotted keys
            Value::Object(inner) => {
                for (k, v) in inner {
                    wtr.write_record([format!("{}.{}", key, k), format_value(v)])?;
                }
            }
            other => wtr.write_record([key.clone(), format_value(other)])?,
        }
    }
    Ok(())
}

fn write_rows(wtr: &mut StdoutWriter<'_>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            wtr.write_record(
                headers
                    .iter()
                    .map(|h| map.get(*h).map(format_value).unwrap_or_default()),
            )?;
        }
    }
    Ok(())
}
