//! Layout-support delegates: the translation layer between an abstract
//! layout algorithm and pixel-level constraint editing.

use std::collections::HashMap;
use uuid::Uuid;

use formic_laf::SharedThemeContext;
use formic_model::{
    Bounds, Constraints, FormModel, FormModelEvent, FormProperty, ModelError,
    PropertyDescriptor, Value, ValueType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Per-edge size changes from a resize gesture. Only the edges whose handle
/// is active carry a non-zero delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeDeltas {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout '{delegate}' rejected the components: {reason}")]
    Rejected {
        delegate: &'static str,
        reason: String,
    },
    #[error("unknown layout delegate: {0}")]
    UnknownDelegate(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A layout-support delegate. Translates pointer positions into constraints
/// and insertion indices, vets incoming component batches, and synthesizes
/// the constraint sub-properties shown in the property sheet.
pub trait LayoutSupport {
    fn delegate_id(&self) -> &'static str;

    /// Constraints for one dragged component: `pointer` is in the target
    /// container's space, `hotspot` the grab offset within the component's
    /// original bounds.
    fn constraints_at(
        &self,
        model: &FormModel,
        container: Uuid,
        pointer: Point,
        hotspot: Point,
        bounds: Bounds,
    ) -> Constraints;

    /// Insertion index for a drop at `pointer`, or `None` when the layout is
    /// constraint-driven and assigns the slot itself.
    fn insertion_index_at(
        &self,
        model: &FormModel,
        container: Uuid,
        pointer: Point,
    ) -> Option<usize>;

    /// Pre-commit veto hook for a batch of components entering the
    /// container. Called before any model mutation; an error aborts the
    /// whole drop with no partial state.
    fn accept_new_components(
        &self,
        model: &FormModel,
        container: Uuid,
        components: &[Uuid],
        constraints: &[Constraints],
    ) -> Result<(), LayoutError>;

    /// Applies per-edge size deltas (not absolute coordinates) to existing
    /// constraints.
    fn resize_constraints(
        &self,
        model: &FormModel,
        container: Uuid,
        current: &Constraints,
        deltas: ResizeDeltas,
    ) -> Constraints;

    /// Constraint sub-properties for a component under this delegate.
    fn constraint_properties(&self, current: Option<&Constraints>) -> Vec<FormProperty>;
}

fn int_property(name: &str, value: i32) -> FormProperty {
    FormProperty::new(PropertyDescriptor::new(name, ValueType::Int))
        .with_value(Value::literal(value))
}

/// Free-design placement with grid snapping, the default for new
/// containers.
pub struct AbsoluteLayout {
    pub grid: i32,
}

impl AbsoluteLayout {
    pub fn new() -> Self {
        Self { grid: 10 }
    }

    fn snap(&self, v: i32) -> i32 {
        if self.grid > 1 { (v / self.grid) * self.grid } else { v }
    }
}

impl Default for AbsoluteLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutSupport for AbsoluteLayout {
    fn delegate_id(&self) -> &'static str {
        "absolute"
    }

    fn constraints_at(
        &self,
        _model: &FormModel,
        _container: Uuid,
        pointer: Point,
        hotspot: Point,
        bounds: Bounds,
    ) -> Constraints {
        Constraints::Absolute {
            x: self.snap(pointer.x - hotspot.x).max(0),
            y: self.snap(pointer.y - hotspot.y).max(0),
            width: bounds.width,
            height: bounds.height,
        }
    }

    fn insertion_index_at(
        &self,
        _model: &FormModel,
        _container: Uuid,
        _pointer: Point,
    ) -> Option<usize> {
        None
    }

    fn accept_new_components(
        &self,
        _model: &FormModel,
        _container: Uuid,
        _components: &[Uuid],
        _constraints: &[Constraints],
    ) -> Result<(), LayoutError> {
        Ok(())
    }

    fn resize_constraints(
        &self,
        _model: &FormModel,
        _container: Uuid,
        current: &Constraints,
        deltas: ResizeDeltas,
    ) -> Constraints {
        match *current {
            Constraints::Absolute {
                x,
                y,
                width,
                height,
            } => Constraints::Absolute {
                x: x - deltas.left,
                y: y - deltas.top,
                width: (width + deltas.left + deltas.right).max(self.grid.max(1)),
                height: (height + deltas.top + deltas.bottom).max(self.grid.max(1)),
            },
            ref other => other.clone(),
        }
    }

    fn constraint_properties(&self, current: Option<&Constraints>) -> Vec<FormProperty> {
        let (x, y, w, h) = match current {
            Some(Constraints::Absolute {
                x,
                y,
                width,
                height,
            }) => (*x, *y, *width, *height),
            _ => (0, 0, 0, 0),
        };
        vec![
            int_property("X", x),
            int_property("Y", y),
            int_property("Width", w),
            int_property("Height", h),
        ]
    }
}

/// Order-driven placement: the drop position picks an insertion index and
/// the layout flows components itself.
pub struct FlowLayout;

impl LayoutSupport for FlowLayout {
    fn delegate_id(&self) -> &'static str {
        "flow"
    }

    fn constraints_at(
        &self,
        model: &FormModel,
        container: Uuid,
        pointer: Point,
        _hotspot: Point,
        _bounds: Bounds,
    ) -> Constraints {
        let index = self
            .insertion_index_at(model, container, pointer)
            .unwrap_or(0);
        Constraints::Flow { index }
    }

    fn insertion_index_at(
        &self,
        model: &FormModel,
        container: Uuid,
        pointer: Point,
    ) -> Option<usize> {
        let Ok(parent) = model.component(container) else {
            return Some(0);
        };
        // Row-major order: a child precedes the pointer when its center is
        // above, or on the same row and to the left.
        let mut index = 0;
        for &child in parent.sub_components() {
            let Ok(comp) = model.component(child) else {
                continue;
            };
            let cx = comp.bounds.x + comp.bounds.width / 2;
            let cy = comp.bounds.y + comp.bounds.height / 2;
            if cy + comp.bounds.height / 2 < pointer.y
                || (pointer.y >= comp.bounds.y && cx < pointer.x)
            {
                index += 1;
            }
        }
        Some(index)
    }

    fn accept_new_components(
        &self,
        _model: &FormModel,
        _container: Uuid,
        _components: &[Uuid],
        _constraints: &[Constraints],
    ) -> Result<(), LayoutError> {
        Ok(())
    }

    fn resize_constraints(
        &self,
        _model: &FormModel,
        _container: Uuid,
        current: &Constraints,
        _deltas: ResizeDeltas,
    ) -> Constraints {
        // Flow placement has no size component; resizing is a bounds-only
        // operation handled by the dragger.
        current.clone()
    }

    fn constraint_properties(&self, current: Option<&Constraints>) -> Vec<FormProperty> {
        let index = match current {
            Some(Constraints::Flow { index }) => *index as i32,
            _ => 0,
        };
        vec![int_property("Index", index)]
    }
}

/// Cell placement in a bounded grid. Rejects batches that do not fit, which
/// makes it the delegate that exercises the abort-before-mutate drop path.
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
}

impl GridLayout {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Cell size derived from the container's current bounds.
    fn cell_size(&self, model: &FormModel, container: Uuid) -> (i32, i32) {
        match model.component(container) {
            Ok(c) => (
                (c.bounds.width / self.cols.max(1) as i32).max(1),
                (c.bounds.height / self.rows.max(1) as i32).max(1),
            ),
            Err(_) => (1, 1),
        }
    }
}

/// Whole cells covered by a pixel delta, rounded to the nearest cell in
/// either direction.
fn cells_for_delta(delta: i32, cell: i32) -> i32 {
    let cell = cell.max(1);
    let magnitude = (delta.abs() + cell / 2) / cell;
    magnitude * delta.signum()
}

impl LayoutSupport for GridLayout {
    fn delegate_id(&self) -> &'static str {
        "grid"
    }

    fn constraints_at(
        &self,
        model: &FormModel,
        container: Uuid,
        pointer: Point,
        _hotspot: Point,
        _bounds: Bounds,
    ) -> Constraints {
        let (cw, ch) = self.cell_size(model, container);
        let col = ((pointer.x / cw).max(0) as usize).min(self.cols.saturating_sub(1));
        let row = ((pointer.y / ch).max(0) as usize).min(self.rows.saturating_sub(1));
        Constraints::Grid {
            row,
            col,
            row_span: 1,
            col_span: 1,
        }
    }

    fn insertion_index_at(
        &self,
        _model: &FormModel,
        _container: Uuid,
        _pointer: Point,
    ) -> Option<usize> {
        None
    }

    fn accept_new_components(
        &self,
        model: &FormModel,
        container: Uuid,
        components: &[Uuid],
        _constraints: &[Constraints],
    ) -> Result<(), LayoutError> {
        let existing = match model.component(container) {
            Ok(c) => c.sub_components().len(),
            Err(_) => 0,
        };
        let capacity = self.rows * self.cols;
        if existing + components.len() > capacity {
            return Err(LayoutError::Rejected {
                delegate: self.delegate_id(),
                reason: format!(
                    "{} components into a {}x{} grid holding {}",
                    components.len(),
                    self.rows,
                    self.cols,
                    existing
                ),
            });
        }
        Ok(())
    }

    fn resize_constraints(
        &self,
        model: &FormModel,
        container: Uuid,
        current: &Constraints,
        deltas: ResizeDeltas,
    ) -> Constraints {
        match *current {
            Constraints::Grid {
                row,
                col,
                row_span,
                col_span,
            } => {
                // Right/bottom edges change the span by whole cells, in
                // either direction, never below one cell.
                let (cw, ch) = self.cell_size(model, container);
                Constraints::Grid {
                    row,
                    col,
                    row_span: (row_span as i32 + cells_for_delta(deltas.bottom, ch)).max(1)
                        as usize,
                    col_span: (col_span as i32 + cells_for_delta(deltas.right, cw)).max(1)
                        as usize,
                }
            }
            ref other => other.clone(),
        }
    }

    fn constraint_properties(&self, current: Option<&Constraints>) -> Vec<FormProperty> {
        let (row, col, row_span, col_span) = match current {
            Some(Constraints::Grid {
                row,
                col,
                row_span,
                col_span,
            }) => (*row as i32, *col as i32, *row_span as i32, *col_span as i32),
            _ => (0, 0, 1, 1),
        };
        vec![
            int_property("Row", row),
            int_property("Column", col),
            int_property("RowSpan", row_span),
            int_property("ColumnSpan", col_span),
        ]
    }
}

/// Delegate lookup plus the container-to-delegate assignment table.
pub struct LayoutRegistry {
    delegates: HashMap<&'static str, Box<dyn LayoutSupport>>,
    assignments: HashMap<Uuid, &'static str>,
    theme: Option<SharedThemeContext>,
    /// Notifications held back while a theme block is active.
    deferred: Vec<FormModelEvent>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        let mut delegates: HashMap<&'static str, Box<dyn LayoutSupport>> = HashMap::new();
        delegates.insert("absolute", Box::new(AbsoluteLayout::new()));
        delegates.insert("flow", Box::new(FlowLayout));
        delegates.insert("grid", Box::new(GridLayout::new(4, 4)));
        Self {
            delegates,
            assignments: HashMap::new(),
            theme: None,
            deferred: Vec::new(),
        }
    }

    /// Registers the theme context consulted for notification deferral.
    pub fn with_theme(mut self, theme: SharedThemeContext) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn register(&mut self, delegate: Box<dyn LayoutSupport>) {
        self.delegates.insert(delegate.delegate_id(), delegate);
    }

    pub fn delegate(&self, id: &str) -> Result<&dyn LayoutSupport, LayoutError> {
        self.delegates
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| LayoutError::UnknownDelegate(id.to_string()))
    }

    /// The delegate governing a container; free design (absolute) unless
    /// assigned otherwise.
    pub fn layout_of(&self, container: Uuid) -> &dyn LayoutSupport {
        let id = self.assignments.get(&container).copied().unwrap_or("absolute");
        self.delegates
            .get(id)
            .map(|d| d.as_ref())
            .unwrap_or_else(|| {
                // "absolute" is always registered.
                self.delegates["absolute"].as_ref()
            })
    }

    /// Switches a container to a different layout delegate. Children keep
    /// their constraints for the old delegate (undo across switches recovers
    /// them); their synthesized constraint properties are invalidated.
    pub fn set_container_layout(
        &mut self,
        model: &mut FormModel,
        container: Uuid,
        delegate_id: &str,
    ) -> Result<(), LayoutError> {
        let id = self
            .delegates
            .get_key_value(delegate_id)
            .map(|(k, _)| *k)
            .ok_or_else(|| LayoutError::UnknownDelegate(delegate_id.to_string()))?;
        {
            let comp = model.component(container)?;
            if !comp.kind().is_container() {
                return Err(LayoutError::Model(ModelError::NotAContainer(
                    comp.name().to_string(),
                )));
            }
        }
        self.assignments.insert(container, id);

        let children: Vec<Uuid> = model.component(container)?.sub_components().to_vec();
        for child in children {
            model.component_mut(child)?.reset_constraints_properties();
        }

        let event = FormModelEvent::LayoutChanged {
            container,
            component: container,
        };
        if self.in_theme_block() {
            // Rendering with a substituted look-and-feel; notify once the
            // block is over.
            self.deferred.push(event);
        } else {
            model.notify(event);
        }
        Ok(())
    }

    fn in_theme_block(&self) -> bool {
        self.theme.as_ref().is_some_and(|t| t.in_theme_block())
    }

    /// Flushes notifications deferred during a theme block.
    pub fn flush_deferred(&mut self, model: &mut FormModel) {
        for event in std::mem::take(&mut self.deferred) {
            model.notify(event);
        }
    }

    /// Synthesizes (and caches on the component) the constraint
    /// sub-properties for a visual component: from the parent's delegate
    /// when the component is constrained, otherwise generic size properties.
    pub fn synthesize_constraint_properties(
        &self,
        model: &mut FormModel,
        component: Uuid,
    ) -> Result<(), ModelError> {
        let (parent, bounds) = {
            let comp = model.component(component)?;
            (comp.parent(), comp.bounds)
        };
        let props = match parent {
            Some(container) => {
                let delegate = self.layout_of(container);
                let comp = model.component(component)?;
                delegate.constraint_properties(comp.constraints(delegate.delegate_id()))
            }
            None => vec![
                int_property("Width", bounds.width),
                int_property("Height", bounds.height),
            ],
        };
        model.component_mut(component)?.set_constraint_properties(props);
        Ok(())
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_laf::ThemeTable;
    use formic_model::ComponentClass;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn panel_with_button() -> (FormModel, Uuid, Uuid) {
        let mut model = FormModel::new("Form1");
        let root = model.root();
        let panel = model.add_component(root, ComponentClass::Panel, -1).unwrap();
        let button = model.add_component(panel, ComponentClass::Button, -1).unwrap();
        model.component_mut(panel).unwrap().bounds = Bounds::new(0, 0, 400, 200);
        (model, panel, button)
    }

    fn property_names(model: &FormModel, component: Uuid) -> Vec<String> {
        model
            .component(component)
            .unwrap()
            .constraint_properties()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    #[test]
    fn synthesized_properties_follow_the_parent_delegate() {
        let (mut model, panel, button) = panel_with_button();
        model
            .component_mut(button)
            .unwrap()
            .set_constraints(Constraints::Absolute {
                x: 30,
                y: 40,
                width: 50,
                height: 20,
            });

        let mut registry = LayoutRegistry::new();
        registry
            .synthesize_constraint_properties(&mut model, button)
            .unwrap();
        assert_eq!(
            property_names(&model, button),
            vec!["X", "Y", "Width", "Height"]
        );
        let props = model.component(button).unwrap().constraint_properties().unwrap();
        let x = props[0].value().and_then(|v| v.as_literal()).and_then(|v| v.as_int());
        assert_eq!(x, Some(30));

        // Switching the parent's delegate invalidates the cache; the next
        // synthesis reflects the new delegate's sub-properties.
        registry.set_container_layout(&mut model, panel, "grid").unwrap();
        assert!(model.component(button).unwrap().constraint_properties().is_none());
        registry
            .synthesize_constraint_properties(&mut model, button)
            .unwrap();
        assert_eq!(
            property_names(&model, button),
            vec!["Row", "Column", "RowSpan", "ColumnSpan"]
        );
    }

    #[test]
    fn layout_change_notification_is_deferred_inside_a_theme_block() {
        let (mut model, panel, _) = panel_with_button();
        let theme = SharedThemeContext::new(ThemeTable::new());
        let mut registry = LayoutRegistry::new().with_theme(theme.clone());

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        model.add_listener(move |e| sink.borrow_mut().push(e.clone()));

        {
            let _block = theme.enter_design(uuid::Uuid::new_v4());
            registry.set_container_layout(&mut model, panel, "flow").unwrap();
            // Held back while the substituted look-and-feel is active.
            assert!(events.borrow().is_empty());
        }
        registry.flush_deferred(&mut model);
        assert_eq!(
            events.borrow().as_slice(),
            &[FormModelEvent::LayoutChanged {
                container: panel,
                component: panel,
            }]
        );
    }

    #[test]
    fn grid_resize_changes_spans_by_whole_cells_both_ways() {
        let (model, panel, _) = panel_with_button();
        // 400x200 bounds over a 4x4 grid: cells are 100x50.
        let grid = GridLayout::new(4, 4);
        let current = Constraints::Grid {
            row: 0,
            col: 0,
            row_span: 2,
            col_span: 2,
        };

        let grown = grid.resize_constraints(
            &model,
            panel,
            &current,
            ResizeDeltas {
                right: 210,
                bottom: 0,
                ..Default::default()
            },
        );
        assert_eq!(
            grown,
            Constraints::Grid {
                row: 0,
                col: 0,
                row_span: 2,
                col_span: 4,
            }
        );

        let shrunk = grid.resize_constraints(
            &model,
            panel,
            &current,
            ResizeDeltas {
                right: -100,
                bottom: -50,
                ..Default::default()
            },
        );
        assert_eq!(
            shrunk,
            Constraints::Grid {
                row: 0,
                col: 0,
                row_span: 1,
                col_span: 1,
            }
        );

        // A shrink past the remaining span floors at one cell.
        let floored = grid.resize_constraints(
            &model,
            panel,
            &current,
            ResizeDeltas {
                right: -400,
                ..Default::default()
            },
        );
        assert_eq!(
            floored,
            Constraints::Grid {
                row: 0,
                col: 0,
                row_span: 2,
                col_span: 1,
            }
        );
    }
}
