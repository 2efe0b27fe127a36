//! The built-in editors: one per value type, plus the tag, expression and
//! connection editors layered on top.

use formic_model::{Connection, DesignValue, PropertyValue, Value, ValueType};

use crate::{EditorError, PropertyEditor};

fn invalid(editor: &'static str, input: &str, reason: impl Into<String>) -> EditorError {
    EditorError::Invalid {
        editor,
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Design values have no inline text form; the generated code stands in.
fn design_text(value: &Value) -> Option<String> {
    match value {
        Value::Design(dv) => Some(dv.initialization_code()),
        Value::Literal(_) => None,
    }
}

pub struct TextEditor;

impl PropertyEditor for TextEditor {
    fn id(&self) -> &'static str {
        "text"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Text
    }

    fn as_text(&self, value: &Value) -> String {
        if let Some(code) = design_text(value) {
            return code;
        }
        match value.as_literal() {
            Some(PropertyValue::String(s)) => s.clone(),
            Some(other) => other.initialization_code(),
            None => String::new(),
        }
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        Ok(Value::literal(PropertyValue::String(text.to_string())))
    }
}

pub struct IntegerEditor;

impl PropertyEditor for IntegerEditor {
    fn id(&self) -> &'static str {
        "integer"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Int
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::Integer(i)) => i.to_string(),
            _ => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        text.trim()
            .parse::<i32>()
            .map(|i| Value::literal(PropertyValue::Integer(i)))
            .map_err(|e| invalid(self.id(), text, e.to_string()))
    }
}

pub struct DoubleEditor;

impl PropertyEditor for DoubleEditor {
    fn id(&self) -> &'static str {
        "double"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Float
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::Double(d)) => d.to_string(),
            _ => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        text.trim()
            .parse::<f64>()
            .map(|d| Value::literal(PropertyValue::Double(d)))
            .map_err(|e| invalid(self.id(), text, e.to_string()))
    }
}

pub struct BooleanEditor;

impl PropertyEditor for BooleanEditor {
    fn id(&self) -> &'static str {
        "boolean"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Bool
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::Boolean(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::literal(PropertyValue::Boolean(true))),
            "false" => Ok(Value::literal(PropertyValue::Boolean(false))),
            _ => Err(invalid(self.id(), text, "expected true or false")),
        }
    }

    fn tags(&self) -> Option<Vec<String>> {
        Some(vec!["true".into(), "false".into()])
    }
}

/// Hex `#rrggbb` colors, with a picker dialog at design time.
pub struct ColorEditor;

impl PropertyEditor for ColorEditor {
    fn id(&self) -> &'static str {
        "color"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Color
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::Color(c)) => c.clone(),
            _ => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        let t = text.trim();
        let valid = t.len() == 7
            && t.starts_with('#')
            && t[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(invalid(self.id(), text, "expected #rrggbb"));
        }
        Ok(Value::literal(PropertyValue::Color(t.to_lowercase())))
    }

    fn supports_custom_panel(&self) -> bool {
        true
    }
}

/// Newline-separated string lists, as used for list box items.
pub struct StringListEditor;

impl PropertyEditor for StringListEditor {
    fn id(&self) -> &'static str {
        "string-list"
    }

    fn value_type(&self) -> ValueType {
        ValueType::TextList
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::StringArray(items)) => items.join("\n"),
            _ => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        let items: Vec<String> = text
            .lines()
            .map(str::to_string)
            .filter(|l| !l.is_empty())
            .collect();
        Ok(Value::literal(PropertyValue::StringArray(items)))
    }

    fn supports_custom_panel(&self) -> bool {
        true
    }
}

/// Enumerated choices from a property descriptor's tag list.
pub struct TagsEditor {
    value_type: ValueType,
    tags: Vec<(String, PropertyValue)>,
}

impl TagsEditor {
    pub fn new(value_type: ValueType, tags: Vec<(String, PropertyValue)>) -> Self {
        Self { value_type, tags }
    }
}

impl PropertyEditor for TagsEditor {
    fn id(&self) -> &'static str {
        "tags"
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn as_text(&self, value: &Value) -> String {
        if let Some(code) = design_text(value) {
            return code;
        }
        let literal = value.as_literal();
        self.tags
            .iter()
            .find(|(_, v)| Some(v) == literal)
            .map(|(tag, _)| tag.clone())
            .unwrap_or_default()
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == text.trim())
            .map(|(_, v)| Value::Literal(v.clone()))
            .ok_or_else(|| invalid(self.id(), text, "not one of the allowed tags"))
    }

    fn tags(&self) -> Option<Vec<String>> {
        Some(self.tags.iter().map(|(tag, _)| tag.clone()).collect())
    }
}

/// Raw source expressions, emitted into generated code verbatim.
pub struct ExpressionEditor;

impl PropertyEditor for ExpressionEditor {
    fn id(&self) -> &'static str {
        "expression"
    }

    fn value_type(&self) -> ValueType {
        ValueType::Code
    }

    fn as_text(&self, value: &Value) -> String {
        design_text(value).unwrap_or_else(|| match value.as_literal() {
            Some(PropertyValue::Expression(e)) => e.clone(),
            Some(other) => other.initialization_code(),
            None => String::new(),
        })
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        if text.trim().is_empty() {
            return Err(invalid(self.id(), text, "empty expression"));
        }
        Ok(Value::literal(PropertyValue::Expression(text.to_string())))
    }

    fn supports_custom_panel(&self) -> bool {
        true
    }
}

/// Cross-component connections: `other.Property`, `other.Method()`, a bare
/// component name, or arbitrary code.
pub struct ConnectionEditor {
    value_type: ValueType,
}

impl ConnectionEditor {
    pub fn new(value_type: ValueType) -> Self {
        Self { value_type }
    }
}

impl PropertyEditor for ConnectionEditor {
    fn id(&self) -> &'static str {
        "connection"
    }

    fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn as_text(&self, value: &Value) -> String {
        match value {
            Value::Design(DesignValue::Connection(Connection::Property {
                component,
                property,
            })) => format!("{component}.{property}"),
            Value::Design(DesignValue::Connection(Connection::Method { component, method })) => {
                format!("{component}.{method}()")
            }
            Value::Design(DesignValue::Connection(Connection::Bean { component })) => {
                component.clone()
            }
            Value::Design(DesignValue::Connection(Connection::Code(code))) => code.clone(),
            Value::Design(DesignValue::ComponentRef { component }) => component.clone(),
            Value::Literal(v) => v.initialization_code(),
        }
    }

    fn parse_text(&self, text: &str) -> Result<Value, EditorError> {
        let t = text.trim();
        if t.is_empty() {
            return Err(invalid(self.id(), text, "empty connection"));
        }
        let connection = match t.split_once('.') {
            Some((component, rest)) if is_identifier(component) => {
                if let Some(method) = rest.strip_suffix("()") {
                    if is_identifier(method) {
                        Connection::Method {
                            component: component.to_string(),
                            method: method.to_string(),
                        }
                    } else {
                        Connection::Code(t.to_string())
                    }
                } else if is_identifier(rest) {
                    Connection::Property {
                        component: component.to_string(),
                        property: rest.to_string(),
                    }
                } else {
                    Connection::Code(t.to_string())
                }
            }
            None if is_identifier(t) => Connection::Bean {
                component: t.to_string(),
            },
            _ => Connection::Code(t.to_string()),
        };
        Ok(Value::Design(DesignValue::Connection(connection)))
    }

    fn supports_custom_panel(&self) -> bool {
        true
    }
}

fn is_identifier(s: &str) -> bool {
    formic_model::is_valid_identifier(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_editor_rejects_garbage() {
        let err = IntegerEditor.parse_text("12x").unwrap_err();
        assert!(matches!(err, EditorError::Invalid { editor: "integer", .. }));
        assert_eq!(
            IntegerEditor.parse_text(" 42 ").unwrap(),
            Value::literal(PropertyValue::Integer(42))
        );
    }

    #[test]
    fn color_editor_normalizes_hex() {
        assert_eq!(
            ColorEditor.parse_text("#FFAA00").unwrap(),
            Value::literal(PropertyValue::Color("#ffaa00".into()))
        );
        assert!(ColorEditor.parse_text("red").is_err());
        assert!(ColorEditor.parse_text("#ffaa0").is_err());
    }

    #[test]
    fn tags_editor_round_trips_its_choices() {
        let editor = TagsEditor::new(
            ValueType::Int,
            vec![
                ("DropDown".into(), PropertyValue::Integer(1)),
                ("Simple".into(), PropertyValue::Integer(0)),
            ],
        );
        let value = editor.parse_text("Simple").unwrap();
        assert_eq!(value, Value::literal(PropertyValue::Integer(0)));
        assert_eq!(editor.as_text(&value), "Simple");
        assert!(editor.parse_text("Nope").is_err());
    }

    #[test]
    fn connection_editor_classifies_its_forms() {
        let e = ConnectionEditor::new(ValueType::Text);
        assert_eq!(
            e.parse_text("lblStatus.Text").unwrap(),
            Value::Design(DesignValue::Connection(Connection::Property {
                component: "lblStatus".into(),
                property: "Text".into(),
            }))
        );
        assert_eq!(
            e.parse_text("timer1.Stop()").unwrap(),
            Value::Design(DesignValue::Connection(Connection::Method {
                component: "timer1".into(),
                method: "Stop".into(),
            }))
        );
        assert_eq!(
            e.parse_text("timer1").unwrap(),
            Value::Design(DesignValue::Connection(Connection::Bean {
                component: "timer1".into(),
            }))
        );
        assert!(matches!(
            e.parse_text("a + b").unwrap(),
            Value::Design(DesignValue::Connection(Connection::Code(_)))
        ));
    }
}
