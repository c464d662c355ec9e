//! Process-wide override table: `(backend, type name) → view node constructor`.
//!
//! Backends fill it through explicit registration calls; nothing registers on import. Later
//! registrations replace earlier ones, so applications can swap a backend's implementation for
//! one type at runtime.

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::foundation::error::VizResult;
use crate::scene::object::SceneRef;
use crate::scene_graph::view_node::ViewNodeImpl;

pub type ViewNodeCtor = fn(&SceneRef) -> VizResult<Box<dyn ViewNodeImpl>>;

type Table = HashMap<String, HashMap<&'static str, ViewNodeCtor>>;

static OVERRIDES: LazyLock<RwLock<Table>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register `ctor` for `class_name` in `backend`. Returns the constructor it replaced.
pub fn register_override(
    backend: &str,
    class_name: &'static str,
    ctor: ViewNodeCtor,
) -> Option<ViewNodeCtor> {
    let mut table = OVERRIDES.write().unwrap_or_else(PoisonError::into_inner);
    table
        .entry(backend.to_owned())
        .or_default()
        .insert(class_name, ctor)
}

pub fn unregister_override(backend: &str, class_name: &str) -> Option<ViewNodeCtor> {
    let mut table = OVERRIDES.write().unwrap_or_else(PoisonError::into_inner);
    table.get_mut(backend)?.remove(class_name)
}

pub fn lookup_override(backend: &str, class_name: &str) -> Option<ViewNodeCtor> {
    let table = OVERRIDES.read().unwrap_or_else(PoisonError::into_inner);
    table.get(backend)?.get(class_name).copied()
}

/// Type names with an entry in `backend`, sorted.
pub fn registered_classes(backend: &str) -> Vec<&'static str> {
    let table = OVERRIDES.read().unwrap_or_else(PoisonError::into_inner);
    let mut out: Vec<_> = table
        .get(backend)
        .map(|m| m.keys().copied().collect())
        .unwrap_or_default();
    out.sort_unstable();
    out
}

/// Register the CPU raster and recording backends.
pub fn register_builtin_backends() {
    crate::render::cpu::register();
    crate::render::recording::register();
}
