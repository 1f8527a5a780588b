use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("static regex is valid"))
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expands `{{ name }}` tokens (optional interior whitespace) from `vars`.
/// A variable absent from the map, or present with a JSON null, renders as
/// the empty string. No escaping, conditionals, or iteration (§4.4).
pub fn render(template: &str, vars: &HashMap<String, serde_json::Value>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            vars.get(name).map(value_to_string).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_no_placeholders() {
        let template = "plain text with no tokens.";
        assert_eq!(render(template, &HashMap::new()), template);
    }

    #[test]
    fn substitutes_present_variable() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), serde_json::json!("world"));
        assert_eq!(render("hello {{name}}", &vars), "hello world");
    }

    #[test]
    fn tolerates_interior_whitespace() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), serde_json::json!("world"));
        assert_eq!(render("hello {{  name  }}", &vars), "hello world");
    }

    #[test]
    fn missing_variable_renders_empty() {
        assert_eq!(render("hello {{name}}!", &HashMap::new()), "hello !");
    }

    #[test]
    fn null_variable_renders_empty() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), serde_json::Value::Null);
        assert_eq!(render("hello {{name}}!", &vars), "hello !");
    }

    #[test]
    fn non_string_values_are_json_stringified() {
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), serde_json::json!(3));
        assert_eq!(render("n={{count}}", &vars), "n=3");
    }

    #[test]
    fn injective_for_distinct_substitutions() {
        let mut a = HashMap::new();
        a.insert("x".to_string(), serde_json::json!("foo"));
        let mut b = HashMap::new();
        b.insert("x".to_string(), serde_json::json!("bar"));
        assert_ne!(render("value: {{x}}", &a), render("value: {{x}}", &b));
    }
}
