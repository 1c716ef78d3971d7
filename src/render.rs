//! Human-readable rendering of property values and message templates.

use indexmap::IndexMap;

use crate::provider::FormatProvider;
use crate::template::{AlignmentDirection, MessageTemplate, PropertyToken, Token};
use crate::value::{PropertyValue, Scalar};

/// Render `value` as display text.
///
/// Strings are quoted unless the format is `l`. The format is applied to
/// every scalar inside sequences, structures and dictionaries.
pub fn render_value(
    value: &PropertyValue,
    format: Option<&str>,
    provider: &dyn FormatProvider,
    out: &mut String,
) {
    match value {
        PropertyValue::Scalar(scalar) => render_scalar(scalar, format, provider, out),
        PropertyValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(item, format, provider, out);
            }
            out.push(']');
        }
        PropertyValue::Structure(structure) => {
            if let Some(tag) = &structure.type_tag {
                out.push_str(tag);
                out.push(' ');
            }
            if structure.fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (name, field)) in structure.fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(name);
                out.push_str(": ");
                render_value(field, format, provider, out);
            }
            out.push_str(" }");
        }
        PropertyValue::Dictionary(entries) => {
            out.push('[');
            for (i, (key, entry)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('(');
                render_value(key, format, provider, out);
                out.push_str(": ");
                render_value(entry, format, provider, out);
                out.push(')');
            }
            out.push(']');
        }
    }
}

fn render_scalar(scalar: &Scalar, format: Option<&str>, provider: &dyn FormatProvider, out: &mut String) {
    match scalar {
        Scalar::String(s) if format != Some("l") => {
            out.push('"');
            out.push_str(&s.replace('"', "\\\""));
            out.push('"');
        }
        other => provider.format_scalar(other, format, out),
    }
}

/// Render one template hole against `properties`.
///
/// A hole whose property is missing renders as its raw text.
pub fn render_token(
    token: &PropertyToken,
    properties: &IndexMap<String, PropertyValue>,
    provider: &dyn FormatProvider,
    out: &mut String,
) {
    let Some(value) = properties.get(&token.name) else {
        out.push_str(&token.raw_text);
        return;
    };

    let Some(alignment) = token.alignment else {
        render_value(value, token.format.as_deref(), provider, out);
        return;
    };

    let start = out.len();
    render_value(value, token.format.as_deref(), provider, out);
    let width = out[start..].chars().count();
    if width >= alignment.width {
        return;
    }

    let padding = " ".repeat(alignment.width - width);
    match alignment.direction {
        AlignmentDirection::Right => out.insert_str(start, &padding),
        AlignmentDirection::Left => out.push_str(&padding),
    }
}

impl MessageTemplate {
    /// Render the full message, substituting every hole.
    pub fn render(
        &self,
        properties: &IndexMap<String, PropertyValue>,
        provider: &dyn FormatProvider,
    ) -> String {
        let mut out = String::with_capacity(self.text().len());
        for token in self.tokens() {
            match token {
                Token::Text(t) => out.push_str(&t.text),
                Token::Property(p) => render_token(p, properties, provider, &mut out),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InvariantFormat;
    use crate::value::Structure;

    fn props(entries: Vec<(&str, PropertyValue)>) -> IndexMap<String, PropertyValue> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn rendered(value: PropertyValue, format: Option<&str>) -> String {
        let mut out = String::new();
        render_value(&value, format, &InvariantFormat, &mut out);
        out
    }

    #[test]
    fn strings_quoted_unless_literal() {
        assert_eq!(rendered("say \"hi\"".into(), None), r#""say \"hi\"""#);
        assert_eq!(rendered("plain".into(), Some("l")), "plain");
    }

    #[test]
    fn composite_values() {
        assert_eq!(rendered(vec![1, 2].into(), None), "[1, 2]");

        let structure = Structure::tagged(
            "Point",
            vec![("X".into(), 1.5.into()), ("Y".into(), "n".into())],
        );
        assert_eq!(rendered(structure.into(), None), r#"Point { X: 1.5, Y: "n" }"#);

        let dict = PropertyValue::Dictionary(vec![("a".into(), 1.into())]);
        assert_eq!(rendered(dict, None), r#"[("a": 1)]"#);

        assert_eq!(rendered(Structure::default().into(), None), "{}");
    }

    #[test]
    fn format_applies_to_nested_scalars() {
        assert_eq!(rendered(vec![1.234, 5.0].into(), Some("F1")), "[1.2, 5.0]");
    }

    #[test]
    fn alignment_pads_by_chars() {
        let template = MessageTemplate::parse("[{A,5}|{B,-4}|{C,2}]");
        let properties = props(vec![
            ("A", 42.into()),
            ("B", "é".into()),
            ("C", 12345.into()),
        ]);
        assert_eq!(template.render(&properties, &InvariantFormat), r#"[   42|"é" |12345]"#);
    }

    #[test]
    fn missing_property_renders_raw_hole() {
        let template = MessageTemplate::parse("User {Name:l} logged in from {Ip,8}");
        let properties = props(vec![("Name", "alice".into())]);
        assert_eq!(
            template.render(&properties, &InvariantFormat),
            "User alice logged in from {Ip,8}"
        );
    }
}
