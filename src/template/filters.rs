// Built-in template filters

use super::eval::display;
use serde_json::Value;

/// Apply filter `name` to `value`.
///
/// Returns `Err` with a human-readable message; the caller attaches the
/// template name and line.
pub fn apply(name: &str, value: Value, args: &[Value]) -> Result<Value, String> {
    match name {
        "length" | "count" => length(&value),
        "upper" => Ok(Value::String(display(&value).to_uppercase())),
        "lower" => Ok(Value::String(display(&value).to_lowercase())),
        "trim" => Ok(Value::String(display(&value).trim().to_string())),
        "default" => Ok(if value.is_null() {
            args.first().cloned().unwrap_or_else(|| Value::String(String::new()))
        } else {
            value
        }),
        "join" => join(&value, args.first()),
        "letter" => letter(&value),
        "pad" => pad(&value, args.first()),
        "latex" => Ok(Value::String(escape_latex(&display(&value)))),
        "csv" => escape_csv(&display(&value)).map(Value::String),
        other => Err(format!("unknown filter '{}'", other)),
    }
}

fn length(value: &Value) -> Result<Value, String> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        other => return Err(format!("cannot take length of {}", other)),
    };
    Ok(Value::from(n))
}

fn join(value: &Value, sep: Option<&Value>) -> Result<Value, String> {
    let sep = sep.map(display).unwrap_or_default();
    match value {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(display).collect::<Vec<_>>().join(&sep),
        )),
        Value::Null => Ok(Value::String(String::new())),
        other => Err(format!("cannot join {}", other)),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 1 -> A, 26 -> Z, 27 -> AA
fn letter(value: &Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::String(String::new()));
    }
    let mut n = match as_integer(value) {
        Some(n) if n >= 1 => n as u64,
        _ => return Err(format!("letter expects a positive integer, got {}", value)),
    };

    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    Ok(Value::String(letters.iter().rev().collect()))
}

fn pad(value: &Value, width: Option<&Value>) -> Result<Value, String> {
    let width = match width {
        Some(w) => as_integer(w)
            .filter(|w| *w >= 0)
            .ok_or_else(|| format!("pad width must be a non-negative integer, got {}", w))? as usize,
        None => 3,
    };
    let n = as_integer(value).ok_or_else(|| format!("pad expects an integer, got {}", value))?;
    Ok(Value::String(format!("{:0width$}", n, width = width)))
}

pub fn escape_latex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Quote a single CSV field when it needs quoting
pub fn escape_csv(s: &str) -> Result<String, String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record([s]).map_err(|e| e.to_string())?;
    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    let mut field = String::from_utf8(bytes).map_err(|e| e.to_string())?;
    if field.ends_with('\n') {
        field.pop();
    }
    Ok(field)
}
