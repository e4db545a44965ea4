use serde_json::Value;

use super::format_value;

/// Print just the key answer: `<level> (<score>)` for assessments, one line
/// per record for batches.
pub fn print_minimal(value: &Value) {
    if let Some(Value::Array(results)) = value.get("results") {
        for item in results {
            println!("{}", headline(item));
        }
        return;
    }

    if value.get("level").is_some() {
        println!("{}", headline(value));
        return;
    }

    let result_obj = value.get("result").unwrap_or(value);
    match result_obj {
        Value::Object(map) => {
            for key in ["activeRules", "totalRules"] {
                if let Some(val) = map.get(key) {
                    println!("{}: {}", key, format_value(val));
                    return;
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_value(val));
            }
        }
        other => println!("{}", format_value(other)),
    }
}

fn headline(value: &Value) -> String {
    let level = value.get("level").map(format_value).unwrap_or_default();
    match value.get("score") {
        Some(score) => format!("{} ({})", level, format_value(score)),
        None => level,
    }
}
