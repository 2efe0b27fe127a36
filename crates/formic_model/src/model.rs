use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::binding::MetaBinding;
use crate::class::ComponentClass;
use crate::component::MetaComponent;
use crate::error::ModelError;
use crate::events::EventType;
use crate::value::{IgnoreReason, RealValue, Value};

/// Structural and property change notifications. Fired synchronously, in
/// program order, before the mutating call returns, so dependent views never
/// observe a mutated model with stale notifications pending.
#[derive(Debug, Clone, PartialEq)]
pub enum FormModelEvent {
    ComponentAdded {
        component: Uuid,
        container: Uuid,
    },
    ComponentRemoved {
        component: Uuid,
        container: Uuid,
    },
    ComponentsReordered {
        container: Uuid,
        perm: Vec<usize>,
    },
    LayoutChanged {
        container: Uuid,
        component: Uuid,
    },
    PropertyChanged {
        component: Uuid,
        property: String,
        old: Option<Value>,
        new: Option<Value>,
    },
    ComponentRenamed {
        component: Uuid,
        old: String,
        new: String,
    },
    EventHandlerChanged {
        component: Uuid,
        event: EventType,
        handler: Option<String>,
    },
    BindingChanged {
        component: Uuid,
        path: String,
    },
}

type Listener = Box<dyn FnMut(&FormModelEvent)>;

#[derive(Default)]
struct Listeners(Vec<Listener>);

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.0.len())
    }
}

/// Where a detached component used to live, for reattachment by undo.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachInfo {
    pub parent: Uuid,
    pub index: Option<usize>,
    pub was_menu: bool,
}

fn default_true() -> bool {
    true
}

/// The meta-model of one designed form: a parent-indexed component tree
/// mirroring the nested bean structure, plus change notification and the
/// undo-recording switch.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormModel {
    name: String,
    root: Uuid,
    components: HashMap<Uuid, MetaComponent>,
    name_counters: HashMap<String, u32>,
    #[serde(skip)]
    listeners: Listeners,
    /// When false, a manually assembled compound edit is being built and
    /// automatic undo recording must stay out of the way.
    #[serde(skip, default = "default_true")]
    undo_recording: bool,
}

impl FormModel {
    pub fn new(name: impl Into<String>) -> Self {
        let mut root = MetaComponent::new(ComponentClass::Form, name);
        root.set_in_model(true);
        let root_id = root.id();
        let mut components = HashMap::new();
        let name_string = root.name().to_string();
        components.insert(root_id, root);
        Self {
            name: name_string,
            root: root_id,
            components,
            name_counters: HashMap::new(),
            listeners: Listeners::default(),
            undo_recording: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Uuid {
        self.root
    }

    pub fn component(&self, id: Uuid) -> Result<&MetaComponent, ModelError> {
        self.components
            .get(&id)
            .ok_or(ModelError::UnknownComponent(id))
    }

    pub fn component_mut(&mut self, id: Uuid) -> Result<&mut MetaComponent, ModelError> {
        self.components
            .get_mut(&id)
            .ok_or(ModelError::UnknownComponent(id))
    }

    pub fn components(&self) -> impl Iterator<Item = &MetaComponent> {
        self.components.values()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MetaComponent> {
        self.components.values().find(|c| c.name() == name)
    }

    // ---- listeners -------------------------------------------------------

    /// Registers a change listener. Listeners observe; they must not mutate
    /// the model from inside a notification.
    pub fn add_listener(&mut self, listener: impl FnMut(&FormModelEvent) + 'static) {
        self.listeners.0.push(Box::new(listener));
    }

    /// Fires one event to every listener. Public so that the layout layer
    /// can emit its batched notifications through the same channel.
    pub fn notify(&mut self, event: FormModelEvent) {
        for listener in self.listeners.0.iter_mut() {
            listener(&event);
        }
    }

    // ---- undo recording switch -------------------------------------------

    pub fn undo_recording(&self) -> bool {
        self.undo_recording
    }

    /// Flips automatic undo recording, returning the previous state.
    pub fn set_undo_recording(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.undo_recording, on)
    }

    // ---- naming ----------------------------------------------------------

    /// Allocates a fresh unique component name: class prefix plus counter.
    pub fn make_unique_name(&mut self, class: &ComponentClass) -> String {
        let prefix = class.default_name_prefix().to_string();
        loop {
            let counter = self.name_counters.entry(prefix.clone()).or_insert(0);
            *counter += 1;
            let candidate = format!("{}{}", prefix, counter);
            if self.find_by_name(&candidate).is_none() {
                return candidate;
            }
        }
    }

    pub fn rename_component(&mut self, id: Uuid, new_name: &str) -> Result<(), ModelError> {
        if !crate::events::is_valid_identifier(new_name) {
            return Err(ModelError::InvalidIdentifier(new_name.to_string()));
        }
        if let Some(existing) = self.find_by_name(new_name) {
            if existing.id() != id {
                return Err(ModelError::DuplicateName(new_name.to_string()));
            }
        }
        let comp = self.component_mut(id)?;
        let old = comp.name().to_string();
        comp.set_name(new_name.to_string());
        self.notify(FormModelEvent::ComponentRenamed {
            component: id,
            old,
            new: new_name.to_string(),
        });
        Ok(())
    }

    // ---- structure -------------------------------------------------------

    /// Creates a component of `class` and inserts it under `parent`.
    /// `index <= 0` with a menu-bar-compatible component routes it into the
    /// container's dedicated menu slot; otherwise a negative index appends.
    pub fn add_component(
        &mut self,
        parent: Uuid,
        class: ComponentClass,
        index: i32,
    ) -> Result<Uuid, ModelError> {
        let name = self.make_unique_name(&class);
        let comp = MetaComponent::new(class, name);
        self.insert_component(comp, parent, index)
    }

    /// Inserts an existing component (fresh, or resurrected by undo).
    pub fn insert_component(
        &mut self,
        mut comp: MetaComponent,
        parent: Uuid,
        index: i32,
    ) -> Result<Uuid, ModelError> {
        let id = comp.id();
        {
            let parent_comp = self.component(parent)?;
            if !parent_comp.kind().is_container() {
                return Err(ModelError::NotAContainer(parent_comp.name().to_string()));
            }
            if !parent_comp.in_model() {
                return Err(ModelError::NotInModel(parent));
            }
        }
        if let Some(existing) = self.find_by_name(comp.name()) {
            if existing.id() != id {
                return Err(ModelError::DuplicateName(comp.name().to_string()));
            }
        }

        comp.set_parent(Some(parent));
        comp.set_in_model(true);

        let route_to_menu = {
            let parent_comp = self.component(parent)?;
            index <= 0 && parent_comp.routes_to_menu(comp.class()) && parent_comp.menu().is_none()
        };
        self.components.insert(id, comp);

        let parent_comp = self.component_mut(parent)?;
        if route_to_menu {
            parent_comp.set_menu(Some(id));
        } else {
            let children = parent_comp.children_mut();
            let at = if index < 0 {
                children.len()
            } else {
                (index as usize).min(children.len())
            };
            children.insert(at, id);
        }

        self.notify(FormModelEvent::ComponentAdded {
            component: id,
            container: parent,
        });
        Ok(id)
    }

    /// Removes a component and its whole subtree from the model. The bean
    /// instances are discarded and `in_model` cleared; the returned
    /// components (parent-first) allow undo to resurrect them.
    pub fn remove_component(&mut self, id: Uuid) -> Result<Vec<MetaComponent>, ModelError> {
        if id == self.root {
            return Err(ModelError::CannotRemoveRoot);
        }
        let parent = self
            .component(id)?
            .parent()
            .ok_or(ModelError::UnknownComponent(id))?;

        self.unlink(parent, id)?;

        // Collect the subtree, parent-first.
        let mut order = vec![id];
        let mut i = 0;
        while i < order.len() {
            if let Some(comp) = self.components.get(&order[i]) {
                order.extend(comp.sub_beans());
            }
            i += 1;
        }
        let mut removed = Vec::with_capacity(order.len());
        for cid in order {
            if let Some(mut comp) = self.components.remove(&cid) {
                comp.set_in_model(false);
                removed.push(comp);
            }
        }

        self.notify(FormModelEvent::ComponentRemoved {
            component: id,
            container: parent,
        });
        Ok(removed)
    }

    /// Reverses [`remove_component`](Self::remove_component): puts a removed
    /// subtree (parent-first, as returned by removal) back into the model at
    /// its former slot. Identity, properties and internal child links are
    /// preserved; the live instances were discarded and rebuild lazily.
    pub fn resurrect_component(
        &mut self,
        subtree: Vec<MetaComponent>,
        at: &DetachInfo,
    ) -> Result<(), ModelError> {
        let Some(top) = subtree.first().map(|c| c.id()) else {
            return Ok(());
        };
        for mut comp in subtree {
            comp.set_in_model(true);
            self.components.insert(comp.id(), comp);
        }
        let parent_comp = self.component_mut(at.parent)?;
        if at.was_menu {
            parent_comp.set_menu(Some(top));
        } else {
            let children = parent_comp.children_mut();
            let index = at.index.unwrap_or(children.len()).min(children.len());
            children.insert(index, top);
        }
        self.component_mut(top)?.set_parent(Some(at.parent));
        self.notify(FormModelEvent::ComponentAdded {
            component: top,
            container: at.parent,
        });
        Ok(())
    }

    /// Unlinks a component from its parent without destroying it, for
    /// reparenting. Fires the structural removal event immediately.
    pub fn detach_from_parent(&mut self, id: Uuid) -> Result<DetachInfo, ModelError> {
        let parent = self
            .component(id)?
            .parent()
            .ok_or(ModelError::UnknownComponent(id))?;
        let info = self.unlink(parent, id)?;
        self.component_mut(id)?.set_parent(None);
        self.notify(FormModelEvent::ComponentRemoved {
            component: id,
            container: parent,
        });
        Ok(info)
    }

    /// Symmetric removal from whichever slot holds the child.
    fn unlink(&mut self, parent: Uuid, id: Uuid) -> Result<DetachInfo, ModelError> {
        let parent_comp = self.component_mut(parent)?;
        if parent_comp.menu() == Some(id) {
            parent_comp.set_menu(None);
            return Ok(DetachInfo {
                parent,
                index: None,
                was_menu: true,
            });
        }
        let children = parent_comp.children_mut();
        let index = children.iter().position(|c| *c == id);
        if let Some(at) = index {
            children.remove(at);
        }
        Ok(DetachInfo {
            parent,
            index,
            was_menu: false,
        })
    }

    /// Atomically replaces a container's ordered child list, fixing up the
    /// parent links. Fires no events; callers batch their own notifications.
    /// This is the one-pass rebuild used by drop commit and by undo/redo.
    pub fn set_children(&mut self, container: Uuid, children: Vec<Uuid>) -> Result<(), ModelError> {
        {
            let comp = self.component(container)?;
            if !comp.kind().is_container() {
                return Err(ModelError::NotAContainer(comp.name().to_string()));
            }
        }
        for &child in &children {
            if !self.components.contains_key(&child) {
                return Err(ModelError::UnknownComponent(child));
            }
        }
        for &child in &children {
            self.component_mut(child)?.set_parent(Some(container));
        }
        *self.component_mut(container)?.children_mut() = children;
        Ok(())
    }

    /// Applies a permutation to a container's child order: the child at old
    /// position `i` moves to position `perm[i]`. Rebuilds the order in one
    /// pass and fires a single reorder event.
    pub fn reorder_sub_components(
        &mut self,
        container: Uuid,
        perm: &[usize],
    ) -> Result<(), ModelError> {
        let old: Vec<Uuid> = self.component(container)?.sub_components().to_vec();
        if perm.len() != old.len() {
            return Err(ModelError::InvalidPermutation(format!(
                "length {} != child count {}",
                perm.len(),
                old.len()
            )));
        }
        let mut new_children = vec![None; old.len()];
        for (i, &target) in perm.iter().enumerate() {
            if target >= old.len() || new_children[target].is_some() {
                return Err(ModelError::InvalidPermutation(format!(
                    "index {target} out of range or repeated"
                )));
            }
            new_children[target] = Some(old[i]);
        }
        let new_children: Vec<Uuid> = new_children.into_iter().flatten().collect();
        *self.component_mut(container)?.children_mut() = new_children;
        self.notify(FormModelEvent::ComponentsReordered {
            container,
            perm: perm.to_vec(),
        });
        Ok(())
    }

    /// Which slot of its parent currently holds this component.
    pub fn slot_of(&self, id: Uuid) -> Option<DetachInfo> {
        let parent = self.components.get(&id)?.parent()?;
        let parent_comp = self.components.get(&parent)?;
        if parent_comp.menu() == Some(id) {
            return Some(DetachInfo {
                parent,
                index: None,
                was_menu: true,
            });
        }
        Some(DetachInfo {
            parent,
            index: parent_comp.sub_components().iter().position(|c| *c == id),
            was_menu: false,
        })
    }

    /// Position of a component in its parent's authoritative child list.
    pub fn component_index(&self, id: Uuid) -> Option<usize> {
        let parent = self.components.get(&id)?.parent()?;
        self.components
            .get(&parent)?
            .sub_components()
            .iter()
            .position(|c| *c == id)
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_same_or_ancestor(&self, ancestor: Uuid, id: Uuid) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.components.get(&current).and_then(|c| c.parent());
        }
        false
    }

    /// Deepest in-model container whose bounds contain the given root-space
    /// point, skipping excluded components (and their subtrees). Returns the
    /// container id and the point translated into its coordinate space.
    pub fn container_at(&self, x: i32, y: i32, exclude: &[Uuid]) -> (Uuid, (i32, i32)) {
        let mut current = self.root;
        let (mut lx, mut ly) = (x, y);
        'descend: loop {
            let Some(comp) = self.components.get(&current) else {
                break;
            };
            // Topmost child wins: later children are higher in z-order.
            for &child in comp.sub_components().iter().rev() {
                if exclude.contains(&child) {
                    continue;
                }
                let Some(child_comp) = self.components.get(&child) else {
                    continue;
                };
                if child_comp.kind().is_container()
                    && child_comp.in_model()
                    && child_comp.bounds.contains(lx, ly)
                {
                    lx -= child_comp.bounds.x;
                    ly -= child_comp.bounds.y;
                    current = child;
                    continue 'descend;
                }
            }
            break;
        }
        (current, (lx, ly))
    }

    // ---- properties ------------------------------------------------------

    /// Sets the design-time value of a property: validates, commits, fires
    /// the change event and applies the resolved real value to the live
    /// instance. Apply failures are recoverable and logged, never fatal.
    pub fn set_property(&mut self, id: Uuid, name: &str, value: Value) -> Result<(), ModelError> {
        let real = self.resolve_value(&value);
        let comp = self.component_mut(id)?;
        if comp.read_only() {
            return Err(ModelError::ReadOnly(comp.name().to_string()));
        }
        let old = comp.apply_property(name, value.clone(), real)?;
        self.notify(FormModelEvent::PropertyChanged {
            component: id,
            property: name.to_string(),
            old,
            new: Some(value),
        });
        Ok(())
    }

    pub fn property_value(&self, id: Uuid, name: &str) -> Result<Option<&Value>, ModelError> {
        let comp = self.component(id)?;
        let prop = comp
            .property(name)
            .ok_or_else(|| ModelError::UnknownProperty {
                component: comp.name().to_string(),
                name: name.to_string(),
            })?;
        Ok(prop.value())
    }

    /// The concrete value a property resolves to right now: the stored value
    /// through any design-value indirection, falling back to the captured
    /// default when resolution is ignored, then to the live instance state.
    pub fn real_property_value(&self, id: Uuid, name: &str) -> Result<RealValue, ModelError> {
        let comp = self.component(id)?;
        let prop = comp
            .property(name)
            .ok_or_else(|| ModelError::UnknownProperty {
                component: comp.name().to_string(),
                name: name.to_string(),
            })?;
        match prop.value() {
            Some(Value::Literal(v)) => Ok(RealValue::Concrete(v.clone())),
            Some(Value::Design(dv)) => {
                let real = dv.resolve(self);
                if let RealValue::Ignored(_) = &real {
                    if let Some(d) = prop.default_value() {
                        return Ok(RealValue::Concrete(d.clone()));
                    }
                }
                Ok(real)
            }
            None => {
                if let Some(v) = comp.instance().and_then(|bag| bag.get(name)) {
                    return Ok(RealValue::Concrete(v.clone()));
                }
                if let Some(hint) = prop.descriptor().default_hint.as_ref() {
                    return Ok(RealValue::Concrete(hint.clone()));
                }
                Ok(RealValue::Ignored(IgnoreReason::UnresolvedReference(
                    name.to_string(),
                )))
            }
        }
    }

    fn resolve_value(&self, value: &Value) -> RealValue {
        match value {
            Value::Literal(v) => RealValue::Concrete(v.clone()),
            Value::Design(dv) => dv.resolve(self),
        }
    }

    /// Resets one property to its captured default.
    pub fn restore_default(&mut self, id: Uuid, name: &str) -> Result<(), ModelError> {
        let comp = self.component_mut(id)?;
        let old = comp.restore_property_default(name)?;
        self.notify(FormModelEvent::PropertyChanged {
            component: id,
            property: name.to_string(),
            old,
            new: None,
        });
        Ok(())
    }

    /// Resets every changed property, continuing past individual failures.
    pub fn restore_all_defaults(&mut self, id: Uuid) {
        let names: Vec<String> = match self.component(id) {
            Ok(comp) => comp
                .properties()
                .iter()
                .filter(|p| p.is_changed())
                .map(|p| p.name().to_string())
                .collect(),
            Err(_) => return,
        };
        for name in names {
            if let Err(err) = self.restore_default(id, &name) {
                log::warn!("could not restore default of '{}': {}", name, err);
            }
        }
    }

    // ---- events and bindings ---------------------------------------------

    pub fn set_event_handler(
        &mut self,
        id: Uuid,
        event: EventType,
        handler: Option<String>,
    ) -> Result<(), ModelError> {
        let comp = self.component_mut(id)?;
        let name = comp.name().to_string();
        let prop = comp
            .event_property_mut(event)
            .ok_or_else(|| ModelError::UnknownEvent {
                component: name,
                event: event.as_str().to_string(),
            })?;
        prop.set_handler(handler.clone())?;
        self.notify(FormModelEvent::EventHandlerChanged {
            component: id,
            event,
            handler,
        });
        Ok(())
    }

    /// Installs a binding on the target component's binding property. The
    /// binding is cloned when it is owned by another target.
    pub fn set_binding(
        &mut self,
        id: Uuid,
        path: &str,
        binding: MetaBinding,
    ) -> Result<(), ModelError> {
        let comp = self.component_mut(id)?;
        comp.assign_binding(path, binding);
        self.notify(FormModelEvent::BindingChanged {
            component: id,
            path: path.to_string(),
        });
        Ok(())
    }
}
