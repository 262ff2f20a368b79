//! Jinja-style template rendering against a run context

use minijinja::{AutoEscape, Environment, Value};

use crate::domain::{Context, DomainError};

/// Output escaping applied to substituted values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    None,
    /// For Word document parts
    Xml,
}

fn environment(escaping: Escaping) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    if escaping == Escaping::Xml {
        env.set_auto_escape_callback(|_| AutoEscape::Html);
    }
    env
}

/// Render `template` with the context's fields as variables
pub fn render(template: &str, context: &Context, escaping: Escaping) -> Result<String, DomainError> {
    environment(escaping)
        .render_str(template, Value::from_serialize(context))
        .map_err(|e| DomainError::template(format!("failed to render template: {}", e)))
}

/// Parse `template` without rendering it
pub fn validate(template: &str) -> Result<(), DomainError> {
    let env = environment(Escaping::None);
    env.template_from_str(template)
        .map(|_| ())
        .map_err(|e| DomainError::template(format!("invalid template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: serde_json::Value) -> Context {
        Context::try_from(value).unwrap()
    }

    #[test]
    fn test_render_fields() {
        let context = ctx(json!({"name": "Ada", "id": 2}));
        let rendered = render("Dear {{ name }} ({{ id }})\n", &context, Escaping::None).unwrap();
        assert_eq!(rendered, "Dear Ada (2)\n");
    }

    #[test]
    fn test_render_collapsed_list() {
        let context = ctx(json!({"orders": [{"sku": "A1"}, {"sku": "B2"}]}));
        let rendered = render(
            "{% for o in orders %}{{ o.sku }};{% endfor %}",
            &context,
            Escaping::None,
        )
        .unwrap();
        assert_eq!(rendered, "A1;B2;");
    }

    #[test]
    fn test_render_xml_escapes_values() {
        let context = ctx(json!({"company": "Smith & <Sons>"}));
        let rendered = render("<w:t>{{ company }}</w:t>", &context, Escaping::Xml).unwrap();
        assert_eq!(rendered, "<w:t>Smith &amp; &lt;Sons&gt;</w:t>");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let rendered = render("[{{ missing }}]", &Context::new(), Escaping::None).unwrap();
        assert_eq!(rendered, "[]");
    }

    #[test]
    fn test_validate() {
        assert!(validate("Hello {{ name }}").is_ok());

        let err = validate("Hello {{ name").unwrap_err();
        assert!(matches!(err, DomainError::Template { .. }));
    }
}
