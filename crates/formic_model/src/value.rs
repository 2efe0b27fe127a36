use serde::{Deserialize, Serialize};

use crate::model::FormModel;

/// Maximum depth for chained property connections (A.Text -> B.Text -> ...).
/// Chains deeper than this resolve as unresolved rather than recursing forever.
const MAX_CONNECTION_DEPTH: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i32),
    Boolean(bool),
    Double(f64),
    StringArray(Vec<String>),
    /// Color in `#rrggbb` notation.
    Color(String),
    /// Raw code expression that should be written as-is (not quoted).
    Expression(String),
}

impl PropertyValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&Vec<String>> {
        match self {
            PropertyValue::StringArray(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            PropertyValue::String(_) => ValueType::Text,
            PropertyValue::Integer(_) => ValueType::Int,
            PropertyValue::Boolean(_) => ValueType::Bool,
            PropertyValue::Double(_) => ValueType::Float,
            PropertyValue::StringArray(_) => ValueType::TextList,
            PropertyValue::Color(_) => ValueType::Color,
            PropertyValue::Expression(_) => ValueType::Code,
        }
    }

    /// Renders this value as a source-code literal for the generated
    /// initializer (VB.NET dialect, matching the generated designer files).
    pub fn initialization_code(&self) -> String {
        match self {
            PropertyValue::String(s) => format!("\"{}\"", s.replace('"', "\"\"")),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Boolean(true) => "True".to_string(),
            PropertyValue::Boolean(false) => "False".to_string(),
            PropertyValue::Double(d) => {
                if d.fract() == 0.0 {
                    format!("{d:.1}")
                } else {
                    d.to_string()
                }
            }
            PropertyValue::StringArray(items) => {
                let quoted: Vec<String> = items
                    .iter()
                    .map(|s| format!("\"{}\"", s.replace('"', "\"\"")))
                    .collect();
                format!("New String() {{{}}}", quoted.join(", "))
            }
            PropertyValue::Color(c) => {
                format!("System.Drawing.ColorTranslator.FromHtml(\"{c}\")")
            }
            PropertyValue::Expression(code) => code.clone(),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Double(d)
    }
}

/// Type tag used by property descriptors and editor registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Text,
    Int,
    Bool,
    Float,
    TextList,
    Color,
    Code,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Text => "Text",
            ValueType::Int => "Int",
            ValueType::Bool => "Bool",
            ValueType::Float => "Float",
            ValueType::TextList => "TextList",
            ValueType::Color => "Color",
            ValueType::Code => "Code",
        }
    }
}

/// What a meta-property stores: either a plain literal, or an indirection
/// that only yields a concrete value when resolved against the form model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Literal(PropertyValue),
    Design(DesignValue),
}

impl Value {
    pub fn literal(v: impl Into<PropertyValue>) -> Self {
        Value::Literal(v.into())
    }

    pub fn as_literal(&self) -> Option<&PropertyValue> {
        match self {
            Value::Literal(v) => Some(v),
            Value::Design(_) => None,
        }
    }

    pub fn initialization_code(&self) -> String {
        match self {
            Value::Literal(v) => v.initialization_code(),
            Value::Design(dv) => dv.initialization_code(),
        }
    }
}

/// Design-time indirection: the property's value must be computed from
/// something else in the model at use time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DesignValue {
    /// Reference to another component of the same form, by name.
    ComponentRef { component: String },
    /// A connection to another component's property/method/instance, or raw
    /// user code.
    Connection(Connection),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Connection {
    Property { component: String, property: String },
    Method { component: String, method: String },
    Bean { component: String },
    Code(String),
}

/// Result of resolving a stored value against the live model: either a
/// concrete value, or a typed "nothing to apply at design time" marker.
#[derive(Debug, Clone, PartialEq)]
pub enum RealValue {
    Concrete(PropertyValue),
    Ignored(IgnoreReason),
}

impl RealValue {
    pub fn concrete(&self) -> Option<&PropertyValue> {
        match self {
            RealValue::Concrete(v) => Some(v),
            RealValue::Ignored(_) => None,
        }
    }
}

/// Why a design value yields no concrete value at design time.
#[derive(Debug, Clone, PartialEq)]
pub enum IgnoreReason {
    /// Raw user code; only meaningful in generated source.
    UserCode,
    /// A method call that cannot be invoked at design time.
    MethodCall,
    /// A reference to another component's instance as a whole.
    BeanRef,
    /// The referenced component (or its property) no longer exists.
    UnresolvedReference(String),
}

impl DesignValue {
    /// Resolves the indirection against the model. Stale references resolve
    /// to `Ignored(UnresolvedReference)` rather than failing: a connection
    /// can legitimately go stale across edits and must stay inspectable.
    pub fn resolve(&self, model: &FormModel) -> RealValue {
        self.resolve_at_depth(model, MAX_CONNECTION_DEPTH)
    }

    fn resolve_at_depth(&self, model: &FormModel, depth: u32) -> RealValue {
        match self {
            DesignValue::ComponentRef { component } => {
                if model.find_by_name(component).is_some() {
                    RealValue::Concrete(PropertyValue::Expression(component.clone()))
                } else {
                    RealValue::Ignored(IgnoreReason::UnresolvedReference(component.clone()))
                }
            }
            DesignValue::Connection(conn) => conn.resolve_at_depth(model, depth),
        }
    }

    pub fn initialization_code(&self) -> String {
        match self {
            DesignValue::ComponentRef { component } => format!("Me.{component}"),
            DesignValue::Connection(conn) => conn.initialization_code(),
        }
    }

    /// Short human-readable description for property sheets. Never fails for
    /// stale references; those render as an invalid-connection marker.
    pub fn display_string(&self, model: &FormModel) -> String {
        match self {
            DesignValue::ComponentRef { component } => {
                if model.find_by_name(component).is_some() {
                    component.clone()
                } else {
                    format!("<invalid reference: {component}>")
                }
            }
            DesignValue::Connection(conn) => conn.display_string(model),
        }
    }
}

impl Connection {
    fn resolve_at_depth(&self, model: &FormModel, depth: u32) -> RealValue {
        match self {
            Connection::Property {
                component,
                property,
            } => {
                if depth == 0 {
                    return RealValue::Ignored(IgnoreReason::UnresolvedReference(format!(
                        "{component}.{property}"
                    )));
                }
                let Some(comp) = model.find_by_name(component) else {
                    return RealValue::Ignored(IgnoreReason::UnresolvedReference(
                        component.clone(),
                    ));
                };
                // Stored design-time value wins over the live instance state.
                if let Some(prop) = comp.property(property) {
                    match prop.value() {
                        Some(Value::Literal(v)) => return RealValue::Concrete(v.clone()),
                        Some(Value::Design(dv)) => return dv.resolve_at_depth(model, depth - 1),
                        None => {}
                    }
                    if let Some(v) = comp.instance().and_then(|bag| bag.get(property)) {
                        return RealValue::Concrete(v.clone());
                    }
                    if let Some(hint) = prop.descriptor().default_hint.as_ref() {
                        return RealValue::Concrete(hint.clone());
                    }
                }
                RealValue::Ignored(IgnoreReason::UnresolvedReference(format!(
                    "{component}.{property}"
                )))
            }
            Connection::Method { component, .. } => {
                if model.find_by_name(component).is_some() {
                    RealValue::Ignored(IgnoreReason::MethodCall)
                } else {
                    RealValue::Ignored(IgnoreReason::UnresolvedReference(component.clone()))
                }
            }
            Connection::Bean { component } => {
                if model.find_by_name(component).is_some() {
                    RealValue::Ignored(IgnoreReason::BeanRef)
                } else {
                    RealValue::Ignored(IgnoreReason::UnresolvedReference(component.clone()))
                }
            }
            Connection::Code(_) => RealValue::Ignored(IgnoreReason::UserCode),
        }
    }

    pub fn initialization_code(&self) -> String {
        match self {
            Connection::Property {
                component,
                property,
            } => format!("Me.{component}.{property}"),
            Connection::Method { component, method } => format!("Me.{component}.{method}()"),
            Connection::Bean { component } => format!("Me.{component}"),
            Connection::Code(code) => code.clone(),
        }
    }

    pub fn display_string(&self, model: &FormModel) -> String {
        let exists = |name: &str| model.find_by_name(name).is_some();
        match self {
            Connection::Property {
                component,
                property,
            } => {
                if exists(component) {
                    format!("{component}.{property}")
                } else {
                    format!("<invalid connection: {component}.{property}>")
                }
            }
            Connection::Method { component, method } => {
                if exists(component) {
                    format!("{component}.{method}()")
                } else {
                    format!("<invalid connection: {component}.{method}()>")
                }
            }
            Connection::Bean { component } => {
                if exists(component) {
                    component.clone()
                } else {
                    format!("<invalid connection: {component}>")
                }
            }
            Connection::Code(_) => "user code".to_string(),
        }
    }
}
