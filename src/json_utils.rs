use serde_json::Value;

/// Search results are heterogeneous; only `result_type == "ticket"` items are tickets.
pub fn is_ticket_result(v: &Value) -> bool {
    v.get("result_type").and_then(|x| x.as_str()) == Some("ticket")
}

/// Render an untyped custom-field value into candidate label strings.
/// Strings pass through, numbers and bools become their text, lists
/// (multi-select fields) contribute each scalar element. Null, objects and
/// empty strings contribute nothing.
pub fn field_value_labels(v: &Value) -> Vec<String> {
    let mut out = Vec::new();
    push_scalar(v, &mut out);
    if let Value::Array(items) = v {
        for item in items {
            push_scalar(item, &mut out);
        }
    }
    out
}

fn push_scalar(v: &Value, out: &mut Vec<String>) {
    match v {
        Value::String(s) if !s.is_empty() => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        _ => {}
    }
}
