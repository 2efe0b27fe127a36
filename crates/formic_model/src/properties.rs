use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::class::{Access, PropertyDescriptor};
use crate::error::ModelError;
use crate::value::{PropertyValue, Value, ValueType};

/// Live-instance state: the concrete values currently applied to the
/// designed object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBag {
    properties: HashMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn set_raw(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_string())
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter()
    }
}

/// Design-time proxy for one property of a component: holds the stored
/// design value (literal or indirection), tracks the captured default and
/// the editor currently in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProperty {
    desc: PropertyDescriptor,
    /// The design-time value. `None` means "unchanged from default".
    value: Option<Value>,
    /// Default captured from the live instance the first time the property
    /// was readable; used by restore-default and ignored-value fallback.
    default_value: Option<PropertyValue>,
    default_capture_tried: bool,
    /// Editor presently in use, when it differs from the type default.
    current_editor: Option<String>,
    /// Raw source fragments injected around the generated assignment.
    pre_code: Option<String>,
    post_code: Option<String>,
}

impl FormProperty {
    pub fn new(desc: PropertyDescriptor) -> Self {
        Self {
            desc,
            value: None,
            default_value: None,
            default_capture_tried: false,
            current_editor: None,
            pre_code: None,
            post_code: None,
        }
    }

    /// Seeds a stored value; used for synthesized (constraint) properties
    /// built outside the component set-value flow.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.desc
    }

    pub fn value_type(&self) -> ValueType {
        self.desc.value_type
    }

    pub fn access(&self) -> Access {
        self.desc.access
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// True once a design value has been explicitly set.
    pub fn is_changed(&self) -> bool {
        self.value.is_some()
    }

    /// Vetoable step of `set_value`: rejects literals of the wrong type.
    /// `Expression` literals and design values are legal for any type since
    /// they only resolve at use time.
    pub fn validate(&self, value: &Value) -> Result<(), ModelError> {
        match value {
            Value::Literal(PropertyValue::Expression(_)) | Value::Design(_) => Ok(()),
            Value::Literal(v) => {
                let actual = v.value_type();
                if actual == self.desc.value_type {
                    Ok(())
                } else {
                    Err(ModelError::TypeMismatch {
                        property: self.desc.name.clone(),
                        expected: self.desc.value_type,
                        actual,
                    })
                }
            }
        }
    }

    /// Captures the default from the live instance, once, before the first
    /// write. Failure to capture is silent; `supports_default_value` then
    /// reports false.
    pub fn ensure_default_capture(&mut self, instance: &PropertyBag) {
        if self.default_capture_tried || self.desc.access == Access::DetachedRead {
            return;
        }
        self.default_capture_tried = true;
        if let Some(v) = instance.get(&self.desc.name) {
            self.default_value = Some(v.clone());
        }
    }

    pub fn supports_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn default_value(&self) -> Option<&PropertyValue> {
        self.default_value.as_ref()
    }

    /// Commits a validated value, returning the previous one for the change
    /// notification.
    pub(crate) fn commit(&mut self, value: Value) -> Option<Value> {
        self.value.replace(value)
    }

    /// Resets to "unchanged from default", returning the previous value.
    pub(crate) fn clear(&mut self) -> Option<Value> {
        self.value.take()
    }

    pub fn current_editor(&self) -> Option<&str> {
        self.current_editor.as_deref()
    }

    pub fn set_current_editor(&mut self, editor_id: Option<String>) {
        self.current_editor = editor_id;
    }

    pub fn pre_code(&self) -> Option<&str> {
        self.pre_code.as_deref()
    }

    pub fn post_code(&self) -> Option<&str> {
        self.post_code.as_deref()
    }

    pub fn set_pre_code(&mut self, code: Option<String>) {
        self.pre_code = code;
    }

    pub fn set_post_code(&mut self, code: Option<String>) {
        self.post_code = code;
    }

    /// Source initializer for the stored value, or `None` when the property
    /// is unchanged and generates nothing.
    pub fn initialization_code(&self) -> Option<String> {
        self.value.as_ref().map(|v| v.initialization_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::PropertyDescriptor;

    #[test]
    fn validate_rejects_wrong_literal_type() {
        let prop = FormProperty::new(PropertyDescriptor::new("Text", ValueType::Text));
        assert!(prop.validate(&Value::literal("hello")).is_ok());
        assert!(prop.validate(&Value::literal(42)).is_err());
        // Raw expressions are legal for any type.
        assert!(prop
            .validate(&Value::Literal(PropertyValue::Expression("x + 1".into())))
            .is_ok());
    }

    #[test]
    fn default_capture_is_one_shot_and_silent() {
        let mut prop = FormProperty::new(
            PropertyDescriptor::new("Ghost", ValueType::Text),
        );
        let empty = PropertyBag::new();
        prop.ensure_default_capture(&empty);
        assert!(!prop.supports_default_value());

        // A later, richer instance no longer changes the captured default.
        let mut bag = PropertyBag::new();
        bag.set("Ghost", "late");
        prop.ensure_default_capture(&bag);
        assert!(!prop.supports_default_value());
    }
}
