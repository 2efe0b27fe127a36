//! Look-and-feel multiplexing for design-time rendering.
//!
//! The designer canvas may render with a different theme than the host
//! application. One delegating defaults table stands in for the global UI
//! defaults and switches between three backing tables: the *original* theme
//! (active when no design block is open), per-project *design* defaults, and
//! transient *preview* defaults. The switch is scope-guarded and re-entrant:
//! only the outermost block swaps tables, and every exit path (including
//! unwinding) restores the original.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use formic_model::PropertyValue;

/// Identifies the project whose class space a form belongs to; the unit of
/// theme caching. Closing a project releases its cached tables.
pub type ProjectId = Uuid;

/// One UI defaults table: keys like `"Button.background"` mapped to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeTable {
    entries: HashMap<String, PropertyValue>,
}

impl ThemeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveTable {
    Original,
    Design(ProjectId),
    Preview(ProjectId),
}

#[derive(Debug)]
struct ThemeState {
    original: ThemeTable,
    design: HashMap<ProjectId, ThemeTable>,
    preview: HashMap<ProjectId, ThemeTable>,
    active: ActiveTable,
    /// Re-entrancy depth: nested design blocks collapse into one swap.
    depth: u32,
}

/// The rendering context holding the three-way table state. Cheap to clone;
/// all clones share one context.
#[derive(Debug, Clone)]
pub struct SharedThemeContext {
    state: Arc<Mutex<ThemeState>>,
}

impl SharedThemeContext {
    pub fn new(original: ThemeTable) -> Self {
        Self {
            state: Arc::new(Mutex::new(ThemeState {
                original,
                design: HashMap::new(),
                preview: HashMap::new(),
                active: ActiveTable::Original,
                depth: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThemeState> {
        // A panicked holder only ever left the table swap half-done for its
        // own block; the state itself stays usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a design or preview block is currently active. Layout code
    /// consults this to defer change notifications.
    pub fn in_theme_block(&self) -> bool {
        self.lock().depth > 0
    }

    /// Fills the per-project design defaults on first use.
    pub fn design_defaults_for(
        &self,
        project: ProjectId,
        init: impl FnOnce() -> ThemeTable,
    ) -> ThemeTable {
        let mut state = self.lock();
        state.design.entry(project).or_insert_with(init).clone()
    }

    /// Fills the per-project preview defaults on first use.
    pub fn preview_defaults_for(
        &self,
        project: ProjectId,
        init: impl FnOnce() -> ThemeTable,
    ) -> ThemeTable {
        let mut state = self.lock();
        state.preview.entry(project).or_insert_with(init).clone()
    }

    /// Drops everything cached for a closed project.
    pub fn release_project(&self, project: ProjectId) {
        let mut state = self.lock();
        if state.design.remove(&project).is_some() | state.preview.remove(&project).is_some() {
            log::debug!("released theme tables for project {project}");
        }
    }

    /// Opens a design-rendering block for `project`. Only the outermost
    /// block swaps the active table; nested calls run directly and the
    /// returned guard restores on every exit path.
    pub fn enter_design(&self, project: ProjectId) -> ThemeBlock {
        self.enter(ActiveTable::Design(project))
    }

    /// Opens a preview-rendering block for `project`.
    pub fn enter_preview(&self, project: ProjectId) -> ThemeBlock {
        self.enter(ActiveTable::Preview(project))
    }

    fn enter(&self, table: ActiveTable) -> ThemeBlock {
        let mut state = self.lock();
        if state.depth == 0 {
            state.active = table;
        }
        state.depth += 1;
        ThemeBlock {
            state: Arc::clone(&self.state),
        }
    }

    /// Runs `f` with the design theme of `project` active.
    pub fn with_design<R>(&self, project: ProjectId, f: impl FnOnce(&SharedThemeContext) -> R) -> R {
        let _block = self.enter_design(project);
        f(self)
    }

    /// Looks a key up in the currently active table, falling back to the
    /// original theme for keys the substituted table does not define.
    pub fn lookup(&self, key: &str) -> Option<PropertyValue> {
        let state = self.lock();
        let substituted = match state.active {
            ActiveTable::Original => None,
            ActiveTable::Design(p) => state.design.get(&p).and_then(|t| t.get(key)),
            ActiveTable::Preview(p) => state.preview.get(&p).and_then(|t| t.get(key)),
        };
        substituted.or_else(|| state.original.get(key)).cloned()
    }
}

/// Scope guard for one theme block. Dropping it (normally or during unwind)
/// closes the block; closing the outermost block restores the original
/// table.
#[must_use = "the theme block ends when this guard is dropped"]
pub struct ThemeBlock {
    state: Arc<Mutex<ThemeState>>,
}

impl Drop for ThemeBlock {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.active = ActiveTable::Original;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> (SharedThemeContext, ProjectId) {
        let mut original = ThemeTable::new();
        original.set("Button.background", PropertyValue::Color("#dddddd".into()));
        original.set("Panel.background", PropertyValue::Color("#eeeeee".into()));
        let ctx = SharedThemeContext::new(original);
        let project = Uuid::new_v4();
        ctx.design_defaults_for(project, || {
            let mut t = ThemeTable::new();
            t.set("Button.background", PropertyValue::Color("#222222".into()));
            t
        });
        (ctx, project)
    }

    #[test]
    fn design_block_substitutes_and_restores() {
        let (ctx, project) = context();
        assert_eq!(
            ctx.lookup("Button.background"),
            Some(PropertyValue::Color("#dddddd".into()))
        );
        {
            let _block = ctx.enter_design(project);
            assert!(ctx.in_theme_block());
            assert_eq!(
                ctx.lookup("Button.background"),
                Some(PropertyValue::Color("#222222".into()))
            );
            // Keys the design theme does not define fall back.
            assert_eq!(
                ctx.lookup("Panel.background"),
                Some(PropertyValue::Color("#eeeeee".into()))
            );
        }
        assert!(!ctx.in_theme_block());
        assert_eq!(
            ctx.lookup("Button.background"),
            Some(PropertyValue::Color("#dddddd".into()))
        );
    }

    #[test]
    fn nested_blocks_collapse_into_one_swap() {
        let (ctx, project) = context();
        let outer = ctx.enter_design(project);
        let other_project = Uuid::new_v4();
        {
            // The inner block does not re-swap, even for another project.
            let _inner = ctx.enter_design(other_project);
            assert_eq!(
                ctx.lookup("Button.background"),
                Some(PropertyValue::Color("#222222".into()))
            );
        }
        // Still inside the outer block after the inner guard dropped.
        assert!(ctx.in_theme_block());
        assert_eq!(
            ctx.lookup("Button.background"),
            Some(PropertyValue::Color("#222222".into()))
        );
        drop(outer);
        assert!(!ctx.in_theme_block());
    }

    #[test]
    fn unwinding_restores_the_original_table() {
        let (ctx, project) = context();
        let probe = ctx.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _block = probe.enter_design(project);
            panic!("renderer blew up");
        }));
        assert!(result.is_err());
        assert!(!ctx.in_theme_block());
        assert_eq!(
            ctx.lookup("Button.background"),
            Some(PropertyValue::Color("#dddddd".into()))
        );
    }

    #[test]
    fn releasing_a_project_drops_its_caches() {
        let (ctx, project) = context();
        ctx.release_project(project);
        let _block = ctx.enter_design(project);
        // No design table cached any more: lookups fall back entirely.
        assert_eq!(
            ctx.lookup("Button.background"),
            Some(PropertyValue::Color("#dddddd".into()))
        );
    }
}
