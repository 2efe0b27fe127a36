use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::value::PropertyValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStrategy {
    ReadWrite,
    ReadOnly,
    ReadOnce,
}

/// A declarative link from a source component/property path to a target
/// component/property path. Always owned by the *target* component's
/// binding property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaBinding {
    id: Uuid,
    pub source: Uuid,
    pub source_path: String,
    pub target: Uuid,
    pub target_path: String,
    pub strategy: UpdateStrategy,
    /// Value substituted when the source resolves to null.
    pub null_value: Option<PropertyValue>,
    /// Value substituted when the source path cannot be fully evaluated.
    pub incomplete_path_value: Option<PropertyValue>,
    pub converter: Option<String>,
    pub validator: Option<String>,
    pub parameters: HashMap<String, String>,
    pub sub_bindings: Vec<MetaBinding>,
}

impl MetaBinding {
    pub fn new(source: Uuid, source_path: &str, target: Uuid, target_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            source_path: source_path.to_string(),
            target,
            target_path: target_path.to_string(),
            strategy: UpdateStrategy::ReadWrite,
            null_value: None,
            incomplete_path_value: None,
            converter: None,
            validator: None,
            parameters: HashMap::new(),
            sub_bindings: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Copy of this binding aimed at a different target component. Always a
    /// distinct binding object: multi-selection editing must never alias one
    /// binding across components.
    pub fn retargeted(&self, new_target: Uuid) -> MetaBinding {
        let mut clone = self.clone();
        clone.id = Uuid::new_v4();
        clone.target = new_target;
        clone
    }
}

/// Per-(component, target path) binding slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingProperty {
    path: String,
    binding: Option<MetaBinding>,
}

impl BindingProperty {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            binding: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn binding(&self) -> Option<&MetaBinding> {
        self.binding.as_ref()
    }

    /// Installs a binding for this slot on `owner`. A binding whose target is
    /// another component is re-targeted (cloned), never shared.
    pub fn assign(&mut self, owner: Uuid, binding: MetaBinding) -> Option<MetaBinding> {
        let owned = if binding.target == owner {
            binding
        } else {
            binding.retargeted(owner)
        };
        self.binding.replace(owned)
    }

    pub fn clear(&mut self) -> Option<MetaBinding> {
        self.binding.take()
    }
}
