use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::binding::{BindingProperty, MetaBinding};
use crate::class::{Access, ComponentClass, ComponentKind};
use crate::constraints::Constraints;
use crate::error::ModelError;
use crate::events::{EventProperty, EventType};
use crate::properties::{FormProperty, PropertyBag};
use crate::value::{PropertyValue, RealValue, Value};

/// Designer-only metadata keys (not component properties).
pub const AUX_LAYER: &str = "layer";
pub const AUX_CREATION_CODE: &str = "customCreationCode";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Design-time proxy for one component of the form: owns the (lazily built)
/// live instance, the meta-properties describing it, and its place in the
/// parent-indexed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaComponent {
    id: Uuid,
    name: String,
    class: ComponentClass,
    kind: ComponentKind,
    parent: Option<Uuid>,
    /// Ordered visual children (containers only). Order determines both
    /// z-order and code-generation order.
    children: Vec<Uuid>,
    /// Distinguished non-visual menu slot, tracked separately from the
    /// ordered children.
    menu: Option<Uuid>,
    properties: Vec<FormProperty>,
    events: Vec<EventProperty>,
    bindings: Vec<BindingProperty>,
    /// Keyed by layout delegate id; retained across layout switches.
    constraints: HashMap<String, Constraints>,
    aux_values: HashMap<String, PropertyValue>,
    read_only: bool,
    in_model: bool,
    pub bounds: Bounds,
    /// Live instance state; instantiated on first use.
    instance: Option<PropertyBag>,
    /// Constraint sub-properties synthesized from the parent's layout
    /// delegate; invalidated when the delegate changes.
    #[serde(skip)]
    constraint_props: Option<Vec<FormProperty>>,
}

impl MetaComponent {
    pub fn new(class: ComponentClass, name: impl Into<String>) -> Self {
        let (width, height) = class.default_size();
        let kind = class.kind();
        let properties = class
            .property_descriptors()
            .into_iter()
            .map(FormProperty::new)
            .collect();
        let events = class.event_types().into_iter().map(EventProperty::new).collect();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            class,
            kind,
            parent: None,
            children: Vec::new(),
            menu: None,
            properties,
            events,
            bindings: Vec::new(),
            constraints: HashMap::new(),
            aux_values: HashMap::new(),
            read_only: false,
            in_model: false,
            bounds: Bounds::new(0, 0, width, height),
            instance: None,
            constraint_props: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn class(&self) -> &ComponentClass {
        &self.class
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Uuid>) {
        self.parent = parent;
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn in_model(&self) -> bool {
        self.in_model
    }

    pub(crate) fn set_in_model(&mut self, in_model: bool) {
        self.in_model = in_model;
        if !in_model {
            // Discard the live instance; the component may linger in undo
            // history but must not be rendered or laid out.
            self.instance = None;
        }
    }

    /// Ordered visual children. Callers must not assume this includes the
    /// menu slot; see [`sub_beans`](Self::sub_beans).
    pub fn sub_components(&self) -> &[Uuid] {
        &self.children
    }

    /// All owned components: ordered children plus the menu slot.
    pub fn sub_beans(&self) -> Vec<Uuid> {
        let mut all = self.children.clone();
        if let Some(menu) = self.menu {
            all.push(menu);
        }
        all
    }

    pub fn menu(&self) -> Option<Uuid> {
        self.menu
    }

    pub(crate) fn set_menu(&mut self, menu: Option<Uuid>) {
        self.menu = menu;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Uuid> {
        &mut self.children
    }

    /// Whether this container diverts `comp_class` into its menu slot.
    pub fn routes_to_menu(&self, comp_class: &ComponentClass) -> bool {
        self.kind.is_container() && self.class.supports_menu() && comp_class.is_menu_bar()
    }

    // ---- properties ------------------------------------------------------

    pub fn properties(&self) -> &[FormProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&FormProperty> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut FormProperty> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    /// Rebuilds the property set from the class descriptors, dropping all
    /// stored values. Used when the underlying class changes.
    pub fn clear_properties(&mut self) {
        self.properties = self
            .class
            .property_descriptors()
            .into_iter()
            .map(FormProperty::new)
            .collect();
        self.constraint_props = None;
    }

    pub fn instance(&self) -> Option<&PropertyBag> {
        self.instance.as_ref()
    }

    /// The live instance, created from class defaults on first access.
    pub fn instance_mut(&mut self) -> &mut PropertyBag {
        self.instance.get_or_insert_with(|| self.class.default_instance())
    }

    /// Commits `value` and applies `real` (its resolution) to the live
    /// instance. Apply failures are recoverable: the design value stays
    /// committed and the problem is logged, never propagated.
    pub(crate) fn apply_property(
        &mut self,
        name: &str,
        value: Value,
        real: RealValue,
    ) -> Result<Option<Value>, ModelError> {
        let instance = self.instance.get_or_insert_with(|| self.class.default_instance());
        let prop = self
            .properties
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ModelError::UnknownProperty {
                component: self.name.clone(),
                name: name.to_string(),
            })?;
        prop.validate(&value)?;
        prop.ensure_default_capture(instance);
        let old = prop.commit(value);

        match prop.access() {
            Access::NoWrite | Access::DetachedRead => {
                log::info!(
                    "property '{}' is not writable on the live instance; value stored only",
                    name
                );
            }
            Access::ReadWrite => match real {
                RealValue::Concrete(v) => instance.set_raw(name, v),
                RealValue::Ignored(reason) => {
                    // Never push the ignored marker into the instance; fall
                    // back to the captured default when one exists.
                    if let Some(d) = prop.default_value().cloned() {
                        instance.set_raw(name, d);
                    } else {
                        log::warn!(
                            "property '{}' has no design-time value ({:?}) and no default; \
                             live instance left as-is",
                            name,
                            reason
                        );
                    }
                }
            },
        }
        Ok(old)
    }

    /// Resets a property to its captured default. When no default was
    /// capturable the stored value is still cleared (silent skip).
    pub(crate) fn restore_property_default(
        &mut self,
        name: &str,
    ) -> Result<Option<Value>, ModelError> {
        let instance = self.instance.get_or_insert_with(|| self.class.default_instance());
        let prop = self
            .properties
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ModelError::UnknownProperty {
                component: self.name.clone(),
                name: name.to_string(),
            })?;
        let old = prop.clear();
        if prop.access() == Access::ReadWrite {
            if let Some(d) = prop.default_value().cloned() {
                instance.set_raw(name, d);
            }
        }
        Ok(old)
    }

    // ---- events ----------------------------------------------------------

    pub fn events(&self) -> &[EventProperty] {
        &self.events
    }

    pub fn event_property(&self, event: EventType) -> Option<&EventProperty> {
        self.events.iter().find(|e| e.event() == event)
    }

    pub(crate) fn event_property_mut(&mut self, event: EventType) -> Option<&mut EventProperty> {
        self.events.iter_mut().find(|e| e.event() == event)
    }

    // ---- bindings --------------------------------------------------------

    pub fn bindings(&self) -> &[BindingProperty] {
        &self.bindings
    }

    pub fn binding_property(&self, path: &str) -> Option<&BindingProperty> {
        self.bindings.iter().find(|b| b.path() == path)
    }

    /// Installs a binding for `path`, creating the slot on first use.
    /// Returns the previously installed binding.
    pub(crate) fn assign_binding(&mut self, path: &str, binding: MetaBinding) -> Option<MetaBinding> {
        let owner = self.id;
        if let Some(slot) = self.bindings.iter_mut().find(|b| b.path() == path) {
            slot.assign(owner, binding)
        } else {
            let mut slot = BindingProperty::new(path);
            let old = slot.assign(owner, binding);
            self.bindings.push(slot);
            old
        }
    }

    // ---- constraints -----------------------------------------------------

    pub fn constraints(&self, delegate_id: &str) -> Option<&Constraints> {
        self.constraints.get(delegate_id)
    }

    pub fn set_constraints(&mut self, constraints: Constraints) {
        self.constraints
            .insert(constraints.delegate_id().to_string(), constraints);
    }

    pub fn remove_constraints(&mut self, delegate_id: &str) -> Option<Constraints> {
        self.constraints.remove(delegate_id)
    }

    /// Cached constraint sub-properties synthesized by the layout layer.
    pub fn constraint_properties(&self) -> Option<&[FormProperty]> {
        self.constraint_props.as_deref()
    }

    pub fn set_constraint_properties(&mut self, props: Vec<FormProperty>) {
        self.constraint_props = Some(props);
    }

    /// Invalidates synthesized constraint sub-properties; called whenever
    /// the parent's layout delegate changes.
    pub fn reset_constraints_properties(&mut self) {
        self.constraint_props = None;
    }

    // ---- aux values ------------------------------------------------------

    pub fn aux_value(&self, key: &str) -> Option<&PropertyValue> {
        self.aux_values.get(key)
    }

    pub fn set_aux_value(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.aux_values.insert(key.into(), value.into());
    }

    /// Creation code for the generated initializer: the custom creation-code
    /// aux value when present, otherwise a plain constructor call.
    pub fn creation_code(&self) -> String {
        if let Some(PropertyValue::Expression(code) | PropertyValue::String(code)) =
            self.aux_values.get(AUX_CREATION_CODE)
        {
            return code.clone();
        }
        format!("New {}()", self.class.qualified_name())
    }
}
