//! End-to-end drag gestures against a live form model: target negotiation,
//! veto aborts, event batches and undo.

use std::cell::RefCell;
use std::rc::Rc;

use formic_designer::{
    ComponentDragger, DropOutcome, GridLayout, LayoutError, LayoutRegistry, Point, UndoManager,
};
use formic_model::{
    Bounds, ComponentClass, Constraints, FormModel, FormModelEvent,
};
use uuid::Uuid;

fn place(model: &mut FormModel, id: Uuid, bounds: Bounds) {
    model.component_mut(id).unwrap().bounds = bounds;
}

fn capture_events(model: &mut FormModel) -> Rc<RefCell<Vec<FormModelEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    model.add_listener(move |e| sink.borrow_mut().push(e.clone()));
    events
}

#[test]
fn dragging_a_container_over_its_own_subtree_lands_in_the_parent() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let panel = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let inner = model.add_component(panel, ComponentClass::Panel, -1).unwrap();
    place(&mut model, panel, Bounds::new(10, 10, 200, 200));
    place(&mut model, inner, Bounds::new(20, 20, 100, 100));

    let registry = LayoutRegistry::new();
    let mut dragger = ComponentDragger::begin_move(&model, vec![panel], Point::new(15, 15));
    // Deep inside the panel's own subtree.
    dragger.drag_to(&model, &registry, Point::new(60, 60));
    let outcome = dragger.drop_components(&mut model, &registry).unwrap();

    match outcome {
        DropOutcome::Committed { target, .. } => assert_eq!(target, root),
        DropOutcome::Cancelled => panic!("drop should have committed"),
    }
    assert_eq!(model.component(panel).unwrap().parent(), Some(root));
    assert_eq!(model.component(inner).unwrap().parent(), Some(panel));
    // The panel never became its own ancestor.
    assert!(!model.is_same_or_ancestor(inner, panel));
}

#[test]
fn vetoed_drop_leaves_the_model_untouched() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let grid = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let occupant = model.add_component(grid, ComponentClass::Label, -1).unwrap();
    let button = model.add_component(root, ComponentClass::Button, -1).unwrap();
    place(&mut model, grid, Bounds::new(200, 0, 120, 120));
    place(&mut model, button, Bounds::new(10, 10, 40, 20));

    let mut registry = LayoutRegistry::new();
    // A one-cell grid that is already full.
    registry.register(Box::new(GridLayout::new(1, 1)));
    registry.set_container_layout(&mut model, grid, "grid").unwrap();

    let root_children_before: Vec<Uuid> = model.component(root).unwrap().sub_components().to_vec();
    let grid_children_before: Vec<Uuid> = model.component(grid).unwrap().sub_components().to_vec();

    let events = capture_events(&mut model);
    let mut dragger = ComponentDragger::begin_move(&model, vec![button], Point::new(15, 15));
    dragger.drag_to(&model, &registry, Point::new(250, 50));
    let result = dragger.drop_components(&mut model, &registry);

    assert!(matches!(result, Err(LayoutError::Rejected { .. })));
    // Rejected before any mutation: identical child arrays, no events.
    assert_eq!(
        model.component(root).unwrap().sub_components(),
        root_children_before.as_slice()
    );
    assert_eq!(
        model.component(grid).unwrap().sub_components(),
        grid_children_before.as_slice()
    );
    assert_eq!(model.component(button).unwrap().parent(), Some(root));
    assert_eq!(model.component(occupant).unwrap().parent(), Some(grid));
    assert!(events.borrow().is_empty());
}

#[test]
fn cross_container_move_fires_remove_then_add_only() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let p1 = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let p2 = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let x = model.add_component(p1, ComponentClass::Button, -1).unwrap();
    let d = model.add_component(p1, ComponentClass::Label, -1).unwrap();
    let e = model.add_component(p2, ComponentClass::Label, -1).unwrap();
    place(&mut model, p1, Bounds::new(0, 0, 100, 100));
    place(&mut model, p2, Bounds::new(200, 0, 100, 100));
    place(&mut model, x, Bounds::new(10, 10, 30, 20));

    let registry = LayoutRegistry::new();
    let events = capture_events(&mut model);
    let mut dragger = ComponentDragger::begin_move(&model, vec![x], Point::new(15, 15));
    dragger.drag_to(&model, &registry, Point::new(250, 50));
    let outcome = dragger.drop_components(&mut model, &registry).unwrap();
    assert!(matches!(outcome, DropOutcome::Committed { .. }));

    assert_eq!(model.component(p1).unwrap().sub_components(), &[d]);
    assert_eq!(model.component(p2).unwrap().sub_components(), &[e, x]);
    assert_eq!(model.component(x).unwrap().parent(), Some(p2));
    // Free-design constraints moved the visible bounds, snapped to the grid.
    assert_eq!(model.component(x).unwrap().bounds, Bounds::new(40, 40, 30, 20));

    // Exactly one removal from the source and one addition to the target;
    // nothing about the undisturbed siblings, no layout-change for the
    // crosser.
    let events = events.borrow();
    assert_eq!(
        events.as_slice(),
        &[
            FormModelEvent::ComponentRemoved {
                component: x,
                container: p1,
            },
            FormModelEvent::ComponentAdded {
                component: x,
                container: p2,
            },
        ]
    );
}

#[test]
fn in_container_reorder_fires_a_single_permutation_event() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let a = model.add_component(root, ComponentClass::Button, -1).unwrap();
    let b = model.add_component(root, ComponentClass::Button, -1).unwrap();
    let c = model.add_component(root, ComponentClass::Button, -1).unwrap();
    place(&mut model, a, Bounds::new(0, 0, 40, 20));
    place(&mut model, b, Bounds::new(50, 0, 40, 20));
    place(&mut model, c, Bounds::new(100, 0, 40, 20));

    let mut registry = LayoutRegistry::new();
    registry.set_container_layout(&mut model, root, "flow").unwrap();

    let events = capture_events(&mut model);
    let mut dragger = ComponentDragger::begin_move(&model, vec![a], Point::new(10, 10));
    // Between the first and second remaining children.
    dragger.drag_to(&model, &registry, Point::new(40, 10));
    let outcome = dragger.drop_components(&mut model, &registry).unwrap();

    assert_eq!(model.component(root).unwrap().sub_components(), &[b, a, c]);
    assert_eq!(
        events.borrow().as_slice(),
        &[FormModelEvent::ComponentsReordered {
            container: root,
            perm: vec![1, 0, 2],
        }]
    );

    // Undo restores the exact original order.
    let mut manager = UndoManager::new(8);
    if let DropOutcome::Committed { edit, .. } = outcome {
        manager.push(Box::new(edit));
    } else {
        panic!("drop should have committed");
    }
    manager.undo(&mut model).unwrap();
    assert_eq!(model.component(root).unwrap().sub_components(), &[a, b, c]);
}

#[test]
fn cross_container_drop_lands_at_the_negotiated_index() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let p1 = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let p2 = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let x = model.add_component(p1, ComponentClass::Button, -1).unwrap();
    let d = model.add_component(p2, ComponentClass::Label, -1).unwrap();
    let e = model.add_component(p2, ComponentClass::Label, -1).unwrap();
    place(&mut model, p1, Bounds::new(0, 0, 100, 100));
    place(&mut model, p2, Bounds::new(200, 0, 200, 100));
    place(&mut model, x, Bounds::new(10, 10, 30, 20));
    place(&mut model, d, Bounds::new(0, 0, 40, 20));
    place(&mut model, e, Bounds::new(50, 0, 40, 20));

    let mut registry = LayoutRegistry::new();
    registry.set_container_layout(&mut model, p2, "flow").unwrap();

    // Past the first child's center, short of the second's: index 1.
    let mut dragger = ComponentDragger::begin_move(&model, vec![x], Point::new(15, 15));
    dragger.drag_to(&model, &registry, Point::new(245, 10));
    let outcome = dragger.drop_components(&mut model, &registry).unwrap();
    assert!(matches!(outcome, DropOutcome::Committed { .. }));

    // The crosser slots between the incumbents instead of appending.
    assert_eq!(model.component(p2).unwrap().sub_components(), &[d, x, e]);
    assert!(model.component(p1).unwrap().sub_components().is_empty());
    assert_eq!(model.component(x).unwrap().parent(), Some(p2));
    assert_eq!(
        model.component(x).unwrap().constraints("flow"),
        Some(&Constraints::Flow { index: 1 })
    );
}

#[test]
fn undo_and_redo_replay_a_cross_container_drop_exactly() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let panel = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let button = model.add_component(root, ComponentClass::Button, -1).unwrap();
    place(&mut model, panel, Bounds::new(100, 0, 150, 150));
    place(&mut model, button, Bounds::new(10, 10, 40, 20));

    let root_before: Vec<Uuid> = model.component(root).unwrap().sub_components().to_vec();

    let registry = LayoutRegistry::new();
    let mut dragger = ComponentDragger::begin_move(&model, vec![button], Point::new(15, 15));
    dragger.drag_to(&model, &registry, Point::new(150, 60));
    let outcome = dragger.drop_components(&mut model, &registry).unwrap();

    let root_after: Vec<Uuid> = model.component(root).unwrap().sub_components().to_vec();
    let panel_after: Vec<Uuid> = model.component(panel).unwrap().sub_components().to_vec();
    assert_eq!(panel_after, vec![button]);

    let mut manager = UndoManager::new(8);
    if let DropOutcome::Committed { edit, .. } = outcome {
        manager.push(Box::new(edit));
    } else {
        panic!("drop should have committed");
    }

    manager.undo(&mut model).unwrap();
    assert_eq!(
        model.component(root).unwrap().sub_components(),
        root_before.as_slice()
    );
    assert!(model.component(panel).unwrap().sub_components().is_empty());
    assert_eq!(model.component(button).unwrap().parent(), Some(root));

    manager.redo(&mut model).unwrap();
    assert_eq!(
        model.component(root).unwrap().sub_components(),
        root_after.as_slice()
    );
    assert_eq!(
        model.component(panel).unwrap().sub_components(),
        panel_after.as_slice()
    );
    assert_eq!(model.component(button).unwrap().parent(), Some(panel));
}

#[test]
fn constraints_survive_a_layout_switch() {
    let mut model = FormModel::new("Form1");
    let root = model.root();
    let panel = model.add_component(root, ComponentClass::Panel, -1).unwrap();
    let button = model.add_component(panel, ComponentClass::Button, -1).unwrap();
    place(&mut model, panel, Bounds::new(0, 0, 300, 300));
    place(&mut model, button, Bounds::new(5, 5, 40, 20));

    let mut registry = LayoutRegistry::new();
    let mut dragger = ComponentDragger::begin_move(&model, vec![button], Point::new(10, 10));
    dragger.drag_to(&model, &registry, Point::new(80, 80));
    dragger.drop_components(&mut model, &registry).unwrap();

    let absolute = model
        .component(button)
        .unwrap()
        .constraints("absolute")
        .cloned()
        .unwrap();
    assert!(matches!(absolute, Constraints::Absolute { .. }));

    // Switching away and back does not lose the recorded constraints.
    registry.set_container_layout(&mut model, panel, "flow").unwrap();
    registry.set_container_layout(&mut model, panel, "absolute").unwrap();
    assert_eq!(
        model.component(button).unwrap().constraints("absolute"),
        Some(&absolute)
    );
}
