//! Template helpers
//!
//! The operators follow the loose semantics the viewer templates were written
//! against: `eq` compares across types, `or` returns an operand rather than a
//! boolean, and `add` concatenates when either side is not a number.

use handlebars::{
    handlebars_helper, BlockContext, Context, Handlebars, Helper, HelperResult, Output,
    RenderContext, RenderErrorReason, Renderable,
};
use serde_json::{Map, Number, Value};

/// Register every helper on `registry`
pub(crate) fn register(registry: &mut Handlebars<'static>) {
    registry.register_helper("add", Box::new(add));
    registry.register_helper("eq", Box::new(eq));
    registry.register_helper("or", Box::new(or));
    registry.register_helper("not", Box::new(not));
    registry.register_helper("gt", Box::new(gt));
    registry.register_helper("count", Box::new(count));
    registry.register_helper("eachInMap", Box::new(each_in_map));
}

handlebars_helper!(add: |a: Json, b: Json| add_values(a, b));
handlebars_helper!(eq: |a: Json, b: Json| loose_eq(a, b));
handlebars_helper!(or: |a: Json, b: Json| if is_truthy(a) { a.clone() } else { b.clone() });
handlebars_helper!(not: |a: Json| !is_truthy(a));
handlebars_helper!(gt: |a: Json, b: Json| greater_than(a, b));
handlebars_helper!(count: |collection: Json| count_of(collection));

/// Iterate an object's entries
///
/// Object values are rendered with an `id` field defaulting to the entry key;
/// any other value is exposed as `{ id, value }`.
fn each_in_map<'reg, 'rc>(
    h: &Helper<'rc>,
    registry: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
    out: &mut dyn Output,
) -> HelperResult {
    let map = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("eachInMap", 0))?
        .value();
    let Some(template) = h.template() else {
        return Ok(());
    };

    for (key, value) in entries(map) {
        let item = match value {
            Value::Object(fields) => {
                let mut fields = fields.clone();
                if !fields.get("id").is_some_and(is_truthy) {
                    fields.insert("id".to_string(), Value::String(key));
                }
                Value::Object(fields)
            }
            other => {
                let mut fields = Map::new();
                fields.insert("id".to_string(), Value::String(key));
                fields.insert("value".to_string(), other.clone());
                Value::Object(fields)
            }
        };

        let mut block = BlockContext::new();
        block.set_base_value(item);
        rc.push_block(block);
        let rendered = template.render(registry, ctx, rc, out);
        rc.pop_block();
        rendered?;
    }
    Ok(())
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

/// Truthiness of a value the way the template authors expect it: empty
/// strings, zero, `NaN`, `false` and `null` are falsy, containers are truthy
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| if item.is_null() { String::new() } else { to_display(item) })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn add_values(a: &Value, b: &Value) -> Value {
    let numeric = |v: &Value| matches!(v, Value::Null | Value::Bool(_) | Value::Number(_));
    if !(numeric(a) && numeric(b)) {
        return Value::String(format!("{}{}", to_display(a), to_display(b)));
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Value::from(sum);
        }
    }
    let sum = to_number(a).unwrap_or(f64::NAN) + to_number(b).unwrap_or(f64::NAN);
    Number::from_f64(sum).map_or(Value::Null, Value::Number)
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => a == b,
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
            _ => false,
        },
    }
}

fn greater_than(a: &Value, b: &Value) -> bool {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return x > y;
    }
    match (to_number(a), to_number(b)) {
        (Some(x), Some(y)) => x > y,
        _ => false,
    }
}

fn count_of(collection: &Value) -> Value {
    match collection {
        Value::Array(items) => Value::from(items.len()),
        Value::String(s) => Value::from(s.chars().count()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: &Value) -> String {
        let mut registry = Handlebars::new();
        register(&mut registry);
        registry.render_template(template, data).unwrap()
    }

    #[test]
    fn test_add() {
        assert_eq!(add_values(&json!(1), &json!(2)), json!(3));
        assert_eq!(add_values(&json!(1.5), &json!(1)), json!(2.5));
        assert_eq!(add_values(&json!("a"), &json!(1)), json!("a1"));
        assert_eq!(add_values(&json!(true), &json!(1)), json!(2));
        assert_eq!(render("{{add a b}}", &json!({"a": 2, "b": 40})), "42");
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_eq(&json!(1), &json!(1.0)));
        assert!(loose_eq(&json!("1"), &json!(1)));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!(""), &json!(0)));
        assert!(!loose_eq(&json!(null), &json!(0)));
        assert!(!loose_eq(&json!("a"), &json!("b")));
        assert!(!loose_eq(&json!("abc"), &json!(0)));
    }

    #[test]
    fn test_or_returns_operand() {
        assert_eq!(render("{{or a b}}", &json!({"a": "", "b": "fallback"})), "fallback");
        assert_eq!(render("{{or a b}}", &json!({"a": "first", "b": "second"})), "first");
    }

    #[test]
    fn test_not_and_gt_in_conditionals() {
        let template = "{{#if (not hidden)}}visible{{/if}}{{#if (gt total 3)}} many{{/if}}";
        assert_eq!(render(template, &json!({"hidden": false, "total": 5})), "visible many");
        assert_eq!(render(template, &json!({"hidden": true, "total": 2})), "");
    }

    #[test]
    fn test_count() {
        assert_eq!(render("{{count items}}", &json!({"items": [1, 2, 3]})), "3");
        assert_eq!(count_of(&json!("héllo")), json!(5));
        assert_eq!(count_of(&json!({"a": 1})), Value::Null);
    }

    #[test]
    fn test_each_in_map() {
        let data = json!({
            "buttons": {
                "play": {"label": "Play"},
                "stop": {"id": "halt", "label": "Stop"}
            },
            "flags": {"fast": true}
        });
        assert_eq!(
            render(
                "{{#eachInMap buttons}}<b id=\"{{id}}\">{{label}}</b>{{/eachInMap}}",
                &data
            ),
            r#"<b id="play">Play</b><b id="halt">Stop</b>"#
        );
        assert_eq!(
            render("{{#eachInMap flags}}{{id}}={{value}}{{/eachInMap}}", &data),
            "fast=true"
        );
    }

    #[test]
    fn test_each_in_map_on_missing_value_renders_nothing() {
        assert_eq!(render("[{{#eachInMap nothing}}x{{/eachInMap}}]", &json!({})), "[]");
    }
}
