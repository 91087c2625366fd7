//! The active-context registry.
//!
//! During a render pass the engine tracks which view or widget is currently
//! rendering as a stack: the page view sits at the bottom, and each widget
//! render pushes itself for the duration of its template execution. The top
//! of the stack is always the innermost actively rendering context; widget
//! lookups and the `_widget` global resolve against it.
//!
//! Pushes are paired with pops through [`ContextGuard`], which pops on drop.
//! The pairing must hold on every exit path, including early `?` returns and
//! panics during template execution: a leaked top-of-stack entry would make
//! sibling and subsequent renders resolve against a stale context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::widget::ActiveContext;

/// Stack of the contexts currently rendering, innermost last.
///
/// One registry instance belongs to one render pass; concurrent passes get
/// their own (the engine owns one runtime per engine instance).
#[derive(Debug, Default)]
pub struct ActiveContextRegistry {
    stack: Vec<ActiveContext>,
}

impl ActiveContextRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a context. Duplicates are allowed; identity is not inspected.
    pub fn add(&mut self, context: ActiveContext) {
        self.stack.push(context);
    }

    /// The innermost actively rendering context, if any. Never mutates.
    pub fn last_added(&self) -> Option<&ActiveContext> {
        self.stack.last()
    }

    /// The outermost context: the page view for a page render pass.
    pub fn first_added(&self) -> Option<&ActiveContext> {
        self.stack.first()
    }

    /// Removes and returns the innermost context.
    ///
    /// Popping an empty registry is a no-op returning `None`. The dispatcher
    /// treats an empty registry as an error at the peek site
    /// ([`WidgetError::EmptyRegistry`](crate::WidgetError::EmptyRegistry)),
    /// not here.
    pub fn remove_last_added(&mut self) -> Option<ActiveContext> {
        self.stack.pop()
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if no context is active.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Shared handle to the registry of one render pass.
pub type SharedRegistry = Arc<Mutex<ActiveContextRegistry>>;

/// Locks a shared registry, recovering from lock poisoning. Push and pop are
/// single `Vec` operations; a panicked render cannot leave the stack
/// half-updated.
pub(crate) fn lock(registry: &SharedRegistry) -> MutexGuard<'_, ActiveContextRegistry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scope guard pairing one push with exactly one pop.
///
/// Created immediately before template execution; dropping it (normally or
/// during unwinding) pops the entry it pushed.
#[must_use = "dropping the guard pops the context"]
pub struct ContextGuard {
    registry: SharedRegistry,
}

impl ContextGuard {
    /// Pushes `context` and returns the guard that will pop it.
    pub fn push(registry: &SharedRegistry, context: ActiveContext) -> Self {
        lock(registry).add(context);
        Self {
            registry: Arc::clone(registry),
        }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        lock(&self.registry).remove_last_added();
    }
}
