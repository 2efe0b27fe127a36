//! XML fragment contract for stored values.
//!
//! One `<Connection/>` element per value, keyed by a small fixed attribute
//! vocabulary: `type` is one of `value | component | property | method |
//! bean | code`, with `value`, `component`, `name` and `code` attributes per
//! kind. The external form serializer embeds these fragments.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

use crate::error::PersistError;
use crate::value::{Connection, DesignValue, PropertyValue, Value};

/// Serializes a stored value to its XML fragment.
pub fn store_to_xml(value: &Value) -> Result<String, PersistError> {
    let mut writer = Writer::new(Vec::new());
    let element = writer.create_element("Connection");
    match value {
        Value::Literal(v) => {
            let encoded = serde_json::to_string(v)?;
            element
                .with_attributes([("type", "value"), ("value", encoded.as_str())])
                .write_empty()?;
        }
        Value::Design(DesignValue::ComponentRef { component }) => {
            element
                .with_attributes([("type", "component"), ("component", component.as_str())])
                .write_empty()?;
        }
        Value::Design(DesignValue::Connection(conn)) => match conn {
            Connection::Property {
                component,
                property,
            } => {
                element
                    .with_attributes([
                        ("type", "property"),
                        ("component", component.as_str()),
                        ("name", property.as_str()),
                    ])
                    .write_empty()?;
            }
            Connection::Method { component, method } => {
                element
                    .with_attributes([
                        ("type", "method"),
                        ("component", component.as_str()),
                        ("name", method.as_str()),
                    ])
                    .write_empty()?;
            }
            Connection::Bean { component } => {
                element
                    .with_attributes([("type", "bean"), ("component", component.as_str())])
                    .write_empty()?;
            }
            Connection::Code(code) => {
                element
                    .with_attributes([("type", "code"), ("code", code.as_str())])
                    .write_empty()?;
            }
        },
    }
    String::from_utf8(writer.into_inner())
        .map_err(|e| PersistError::Malformed(format!("non-UTF8 output: {e}")))
}

/// Parses a `<Connection/>` fragment back into a stored value.
pub fn read_from_xml(xml: &str) -> Result<Value, PersistError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Connection" => {
                let mut kind = None;
                let mut value = None;
                let mut component = None;
                let mut name = None;
                let mut code = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let text = attr.unescape_value()?.into_owned();
                    match attr.key.as_ref() {
                        b"type" => kind = Some(text),
                        b"value" => value = Some(text),
                        b"component" => component = Some(text),
                        b"name" => name = Some(text),
                        b"code" => code = Some(text),
                        _ => {}
                    }
                }
                return build_value(kind, value, component, name, code);
            }
            Event::Eof => {
                return Err(PersistError::Malformed(
                    "no Connection element found".to_string(),
                ));
            }
            _ => {}
        }
    }
}

fn build_value(
    kind: Option<String>,
    value: Option<String>,
    component: Option<String>,
    name: Option<String>,
    code: Option<String>,
) -> Result<Value, PersistError> {
    let missing = |attr: &str| PersistError::Malformed(format!("missing '{attr}' attribute"));
    let kind = kind.ok_or_else(|| missing("type"))?;
    match kind.as_str() {
        "value" => {
            let encoded = value.ok_or_else(|| missing("value"))?;
            let v: PropertyValue = serde_json::from_str(&encoded)?;
            Ok(Value::Literal(v))
        }
        "component" => Ok(Value::Design(DesignValue::ComponentRef {
            component: component.ok_or_else(|| missing("component"))?,
        })),
        "property" => Ok(Value::Design(DesignValue::Connection(
            Connection::Property {
                component: component.ok_or_else(|| missing("component"))?,
                property: name.ok_or_else(|| missing("name"))?,
            },
        ))),
        "method" => Ok(Value::Design(DesignValue::Connection(Connection::Method {
            component: component.ok_or_else(|| missing("component"))?,
            method: name.ok_or_else(|| missing("name"))?,
        }))),
        "bean" => Ok(Value::Design(DesignValue::Connection(Connection::Bean {
            component: component.ok_or_else(|| missing("component"))?,
        }))),
        "code" => Ok(Value::Design(DesignValue::Connection(Connection::Code(
            code.ok_or_else(|| missing("code"))?,
        )))),
        other => Err(PersistError::Malformed(format!(
            "unknown connection type '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Value) {
        let xml = store_to_xml(&value).unwrap();
        let back = read_from_xml(&xml).unwrap();
        assert_eq!(back, value, "fragment was: {xml}");
    }

    #[test]
    fn every_connection_kind_round_trips() {
        round_trip(Value::literal("plain \"quoted\" text"));
        round_trip(Value::literal(42));
        round_trip(Value::Design(DesignValue::ComponentRef {
            component: "btn1".to_string(),
        }));
        round_trip(Value::Design(DesignValue::Connection(
            Connection::Property {
                component: "txt1".to_string(),
                property: "Text".to_string(),
            },
        )));
        round_trip(Value::Design(DesignValue::Connection(Connection::Method {
            component: "Form1".to_string(),
            method: "GetTitle".to_string(),
        })));
        round_trip(Value::Design(DesignValue::Connection(Connection::Bean {
            component: "tmr1".to_string(),
        })));
        round_trip(Value::Design(DesignValue::Connection(Connection::Code(
            "a < b And c > d".to_string(),
        ))));
    }

    #[test]
    fn malformed_fragment_is_rejected() {
        assert!(read_from_xml("<Other/>").is_err());
        assert!(read_from_xml("<Connection type=\"property\"/>").is_err());
        assert!(read_from_xml("<Connection type=\"wormhole\" code=\"x\"/>").is_err());
    }
}
