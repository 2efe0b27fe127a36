//! Drag gestures on the design canvas: moving and resizing component
//! selections, negotiating constraints with the target container's layout
//! delegate, and committing the result as one undoable edit.

use uuid::Uuid;

use formic_model::{Bounds, Constraints, FormModel, FormModelEvent, ModelError};

use crate::layout::{LayoutError, LayoutRegistry, Point, ResizeDeltas};
use crate::undo::{with_recording_suspended, DropEdit, PlacementState};

/// Movement below this many pixels keeps the gesture pending; a click with
/// jitter is not a drag.
const DRAG_THRESHOLD: i32 = 4;

/// Cap on target redirects while climbing out of a dragged subtree.
const MAX_TARGET_REDIRECTS: usize = 64;

/// The eight resize handles around a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePosition {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl HandlePosition {
    /// Which edges this handle moves: (left, top, right, bottom).
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Self::NorthWest => (true, true, false, false),
            Self::North => (false, true, false, false),
            Self::NorthEast => (false, true, true, false),
            Self::East => (false, false, true, false),
            Self::SouthEast => (false, false, true, true),
            Self::South => (false, false, false, true),
            Self::SouthWest => (true, false, false, true),
            Self::West => (true, false, false, false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Pressed but not yet past the drag threshold.
    Pending,
    Move,
    Resize(HandlePosition),
}

/// The negotiated result of the current pointer position: where the
/// selection would land and with what constraints.
#[derive(Debug, Clone)]
pub struct DropPlan {
    pub target: Uuid,
    /// Pointer translated into the target container's space.
    pub pointer: Point,
    /// One entry per dragged component, in selection order.
    pub constraints: Vec<Constraints>,
    /// Insertion index from the delegate, when the layout is order-driven.
    pub index: Option<usize>,
}

/// What a committed drop did.
pub enum DropOutcome {
    /// Gesture never became a drag, or no valid target was found.
    Cancelled,
    Committed {
        target: Uuid,
        moved: Vec<Uuid>,
        edit: DropEdit,
    },
}

pub struct ComponentDragger {
    components: Vec<Uuid>,
    mode: DragMode,
    start: Point,
    /// Grab offset of the start point within each component, in that
    /// component's own space.
    hotspots: Vec<Point>,
    plan: Option<DropPlan>,
}

impl ComponentDragger {
    /// Starts a move gesture at `start` (root space). The gesture stays
    /// pending until the pointer travels past the drag threshold.
    pub fn begin_move(model: &FormModel, components: Vec<Uuid>, start: Point) -> Self {
        let hotspots = components
            .iter()
            .map(|&id| {
                let origin = root_space_origin(model, id);
                Point::new(start.x - origin.x, start.y - origin.y)
            })
            .collect();
        Self {
            components,
            mode: DragMode::Pending,
            start,
            hotspots,
            plan: None,
        }
    }

    /// Starts a resize gesture on `handle`. Handle grabs are deliberate, so
    /// there is no pending phase.
    pub fn begin_resize(
        model: &FormModel,
        components: Vec<Uuid>,
        handle: HandlePosition,
        start: Point,
    ) -> Self {
        let hotspots = components
            .iter()
            .map(|&id| {
                let origin = root_space_origin(model, id);
                Point::new(start.x - origin.x, start.y - origin.y)
            })
            .collect();
        Self {
            components,
            mode: DragMode::Resize(handle),
            start,
            hotspots,
            plan: None,
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn components(&self) -> &[Uuid] {
        &self.components
    }

    pub fn plan(&self) -> Option<&DropPlan> {
        self.plan.as_ref()
    }

    /// Tracks the pointer to `pointer` (root space), renegotiating the drop
    /// plan. Returns the current plan for feedback painting.
    pub fn drag_to(
        &mut self,
        model: &FormModel,
        registry: &LayoutRegistry,
        pointer: Point,
    ) -> Option<&DropPlan> {
        if self.mode == DragMode::Pending {
            let dx = (pointer.x - self.start.x).abs();
            let dy = (pointer.y - self.start.y).abs();
            if dx < DRAG_THRESHOLD && dy < DRAG_THRESHOLD {
                return None;
            }
            self.mode = DragMode::Move;
        }
        self.plan = match self.mode {
            DragMode::Pending => None,
            DragMode::Move => self.plan_move(model, registry, pointer),
            DragMode::Resize(handle) => self.plan_resize(model, registry, handle, pointer),
        };
        self.plan.as_ref()
    }

    fn plan_move(
        &self,
        model: &FormModel,
        registry: &LayoutRegistry,
        pointer: Point,
    ) -> Option<DropPlan> {
        let (target, local) = self.resolve_target(model, pointer)?;
        let delegate = registry.layout_of(target);
        let constraints = self
            .components
            .iter()
            .zip(&self.hotspots)
            .map(|(&id, &hotspot)| {
                let bounds = model
                    .component(id)
                    .map(|c| c.bounds)
                    .unwrap_or(Bounds::new(0, 0, 0, 0));
                delegate.constraints_at(model, target, local, hotspot, bounds)
            })
            .collect();
        let index = delegate.insertion_index_at(model, target, local);
        Some(DropPlan {
            target,
            pointer: local,
            constraints,
            index,
        })
    }

    fn plan_resize(
        &self,
        model: &FormModel,
        registry: &LayoutRegistry,
        handle: HandlePosition,
        pointer: Point,
    ) -> Option<DropPlan> {
        let primary = *self.components.first()?;
        let target = model.component(primary).ok()?.parent()?;
        let delegate = registry.layout_of(target);
        let deltas = resize_deltas(handle, self.start, pointer);
        let constraints = self
            .components
            .iter()
            .map(|&id| {
                let comp = model.component(id).ok();
                let current = comp
                    .and_then(|c| c.constraints(delegate.delegate_id()).cloned())
                    .unwrap_or_else(|| {
                        let b = comp.map(|c| c.bounds).unwrap_or(Bounds::new(0, 0, 0, 0));
                        Constraints::Absolute {
                            x: b.x,
                            y: b.y,
                            width: b.width,
                            height: b.height,
                        }
                    });
                delegate.resize_constraints(model, target, &current, deltas)
            })
            .collect();
        Some(DropPlan {
            target,
            pointer,
            constraints,
            index: None,
        })
    }

    /// Deepest container under the pointer that can take the selection.
    /// When the hit container sits inside a dragged component the target is
    /// redirected to that component's parent and re-checked, so a container
    /// can never be dropped into its own subtree. The climb is bounded.
    fn resolve_target(&self, model: &FormModel, pointer: Point) -> Option<(Uuid, Point)> {
        let (mut target, (mut lx, mut ly)) =
            model.container_at(pointer.x, pointer.y, &self.components);
        let mut redirects = 0;
        while self
            .components
            .iter()
            .any(|&d| model.is_same_or_ancestor(d, target))
        {
            redirects += 1;
            if redirects > MAX_TARGET_REDIRECTS {
                return None;
            }
            let comp = model.component(target).ok()?;
            let parent = comp.parent()?;
            lx += comp.bounds.x;
            ly += comp.bounds.y;
            target = parent;
        }
        Some((target, Point::new(lx, ly)))
    }

    /// Commits the gesture. The whole commit is one atomic step: the target
    /// delegate vets the incoming batch before any model mutation, and on
    /// rejection the model is untouched. On success the returned edit
    /// replays the drop in either direction.
    pub fn drop_components(
        mut self,
        model: &mut FormModel,
        registry: &LayoutRegistry,
    ) -> Result<DropOutcome, LayoutError> {
        let Some(plan) = self.plan.take() else {
            return Ok(DropOutcome::Cancelled);
        };
        match self.mode {
            DragMode::Pending => Ok(DropOutcome::Cancelled),
            DragMode::Move => self.commit_move(model, registry, plan),
            DragMode::Resize(_) => self.commit_resize(model, registry, plan),
        }
    }

    fn commit_move(
        self,
        model: &mut FormModel,
        registry: &LayoutRegistry,
        plan: DropPlan,
    ) -> Result<DropOutcome, LayoutError> {
        let target = plan.target;
        let delegate = registry.layout_of(target);
        let delegate_id = delegate.delegate_id();

        // Partition the selection: components crossing a container boundary
        // versus components moving within the target.
        let mut crossers = Vec::new();
        let mut crosser_constraints = Vec::new();
        let mut movers = Vec::new();
        for (i, &id) in self.components.iter().enumerate() {
            let parent = model.component(id)?.parent();
            if parent == Some(target) {
                movers.push(id);
            } else {
                crossers.push(id);
                crosser_constraints.push(plan.constraints[i].clone());
            }
        }

        // Veto point. Nothing has been mutated yet; a rejection aborts the
        // whole drop.
        delegate.accept_new_components(model, target, &crossers, &crosser_constraints)?;

        // Snapshot every affected container and component placement.
        let mut containers = vec![target];
        for &id in &crossers {
            if let Some(parent) = model.component(id)?.parent() {
                if !containers.contains(&parent) {
                    containers.push(parent);
                }
            }
        }
        let before_children: Vec<(Uuid, Vec<Uuid>)> = containers
            .iter()
            .map(|&c| {
                model
                    .component(c)
                    .map(|comp| (c, comp.sub_components().to_vec()))
            })
            .collect::<Result<_, _>>()?;
        let before: Vec<PlacementState> = self
            .components
            .iter()
            .filter_map(|&id| PlacementState::capture(model, id, delegate_id))
            .collect();

        let result = with_recording_suspended(model, |model| {
            Self::apply_move(model, &plan, &self.components, &crossers, &movers)
        });
        if let Err(err) = result {
            return Err(LayoutError::Model(err));
        }

        let after: Vec<PlacementState> = self
            .components
            .iter()
            .filter_map(|&id| PlacementState::capture(model, id, delegate_id))
            .collect();
        let edit_containers = before_children
            .into_iter()
            .map(|(c, old)| {
                model
                    .component(c)
                    .map(|comp| (c, old, comp.sub_components().to_vec()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DropOutcome::Committed {
            target,
            moved: self.components,
            edit: DropEdit {
                containers: edit_containers,
                before,
                after,
            },
        })
    }

    /// The mutation phase of a move commit. Runs with undo recording
    /// suspended; structural events fire as the model changes.
    fn apply_move(
        model: &mut FormModel,
        plan: &DropPlan,
        selection: &[Uuid],
        crossers: &[Uuid],
        movers: &[Uuid],
    ) -> Result<(), ModelError> {
        if selection.is_empty() {
            return Ok(());
        }
        let target = plan.target;
        let old_order: Vec<Uuid> = model.component(target)?.sub_components().to_vec();

        // Detach boundary-crossers from their source containers first.
        for &id in crossers {
            model.detach_from_parent(id)?;
        }

        // Rebuild the target's child array in one pass. Each dragged
        // component takes its explicit slot when one was negotiated; a taken
        // or out-of-range slot falls forward to the first free one, wrapping
        // at the end. The remaining components keep their relative order.
        let base: Vec<Uuid> = model
            .component(target)?
            .sub_components()
            .iter()
            .copied()
            .filter(|c| !selection.contains(c))
            .collect();
        let total = base.len() + selection.len();
        let mut slots: Vec<Option<Uuid>> = vec![None; total];
        for (k, &id) in selection.iter().enumerate() {
            let desired = plan.index.map(|i| (i + k).min(total - 1));
            let mut slot = desired.unwrap_or(total - selection.len() + k);
            let mut probes = 0;
            while slots[slot].is_some() {
                slot = (slot + 1) % total;
                probes += 1;
                if probes > total {
                    break;
                }
            }
            slots[slot] = Some(id);
        }
        let mut rest = base.into_iter();
        let new_children: Vec<Uuid> = slots
            .into_iter()
            .filter_map(|s| s.or_else(|| rest.next()))
            .collect();
        model.set_children(target, new_children.clone())?;

        // Negotiated constraints become the authoritative placement; free
        // design also moves the visible bounds.
        for (k, &id) in selection.iter().enumerate() {
            let constraints = plan.constraints[k].clone();
            let comp = model.component_mut(id)?;
            if let Constraints::Absolute {
                x,
                y,
                width,
                height,
            } = constraints
            {
                comp.bounds = Bounds::new(x, y, width, height);
            }
            comp.set_constraints(constraints);
            comp.reset_constraints_properties();
        }

        if crossers.is_empty() {
            // Pure in-container reorder: one event describing the
            // permutation of the previous order.
            if new_children != old_order {
                let perm: Vec<usize> = old_order
                    .iter()
                    .map(|id| {
                        new_children
                            .iter()
                            .position(|c| c == id)
                            .unwrap_or_default()
                    })
                    .collect();
                model.notify(FormModelEvent::ComponentsReordered {
                    container: target,
                    perm,
                });
            }
        } else {
            for &id in crossers {
                model.notify(FormModelEvent::ComponentAdded {
                    component: id,
                    container: target,
                });
            }
            for &id in movers {
                model.notify(FormModelEvent::LayoutChanged {
                    container: target,
                    component: id,
                });
            }
        }
        Ok(())
    }

    fn commit_resize(
        self,
        model: &mut FormModel,
        registry: &LayoutRegistry,
        plan: DropPlan,
    ) -> Result<DropOutcome, LayoutError> {
        let target = plan.target;
        let delegate_id = registry.layout_of(target).delegate_id();
        let children: Vec<Uuid> = model.component(target)?.sub_components().to_vec();
        let before: Vec<PlacementState> = self
            .components
            .iter()
            .filter_map(|&id| PlacementState::capture(model, id, delegate_id))
            .collect();

        let result = with_recording_suspended(model, |model| -> Result<(), ModelError> {
            for (k, &id) in self.components.iter().enumerate() {
                let constraints = plan.constraints[k].clone();
                let comp = model.component_mut(id)?;
                if let Constraints::Absolute {
                    x,
                    y,
                    width,
                    height,
                } = constraints
                {
                    comp.bounds = Bounds::new(x, y, width, height);
                }
                comp.set_constraints(constraints);
                comp.reset_constraints_properties();
            }
            for &id in &self.components {
                model.notify(FormModelEvent::LayoutChanged {
                    container: target,
                    component: id,
                });
            }
            Ok(())
        });
        if let Err(err) = result {
            return Err(LayoutError::Model(err));
        }

        let after: Vec<PlacementState> = self
            .components
            .iter()
            .filter_map(|&id| PlacementState::capture(model, id, delegate_id))
            .collect();

        Ok(DropOutcome::Committed {
            target,
            moved: self.components,
            edit: DropEdit {
                containers: vec![(target, children.clone(), children)],
                before,
                after,
            },
        })
    }
}

/// A component's top-left corner in root space.
fn root_space_origin(model: &FormModel, id: Uuid) -> Point {
    let mut x = 0;
    let mut y = 0;
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        let Ok(comp) = model.component(current) else {
            break;
        };
        x += comp.bounds.x;
        y += comp.bounds.y;
        cursor = comp.parent();
    }
    Point::new(x, y)
}

fn resize_deltas(handle: HandlePosition, start: Point, pointer: Point) -> ResizeDeltas {
    let dx = pointer.x - start.x;
    let dy = pointer.y - start.y;
    let (left, top, right, bottom) = handle.edges();
    ResizeDeltas {
        left: if left { -dx } else { 0 },
        top: if top { -dy } else { 0 },
        right: if right { dx } else { 0 },
        bottom: if bottom { dy } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_edges_cover_all_eight() {
        assert_eq!(HandlePosition::NorthWest.edges(), (true, true, false, false));
        assert_eq!(HandlePosition::SouthEast.edges(), (false, false, true, true));
        assert_eq!(HandlePosition::East.edges(), (false, false, true, false));
        assert_eq!(HandlePosition::South.edges(), (false, false, false, true));
    }

    #[test]
    fn resize_deltas_follow_the_active_edges() {
        let start = Point::new(100, 100);
        let pointer = Point::new(110, 90);
        let d = resize_deltas(HandlePosition::NorthEast, start, pointer);
        assert_eq!(
            d,
            ResizeDeltas {
                left: 0,
                top: 10,
                right: 10,
                bottom: 0
            }
        );
        let d = resize_deltas(HandlePosition::West, start, pointer);
        assert_eq!(
            d,
            ResizeDeltas {
                left: -10,
                top: 0,
                right: 0,
                bottom: 0
            }
        );
    }
}
