use std::cell::Cell;
use std::collections::HashMap;

use crate::foundation::error::{VizError, VizResult};
use crate::scene::object::SceneRef;
use crate::scene_graph::overrides::{ViewNodeCtor, lookup_override};
use crate::scene_graph::view_node::ViewNode;

/// Creates view nodes for one backend.
///
/// Dispatch walks the object's class hierarchy from most to least derived; at each level a
/// factory-local override beats the process-wide table. The first hit wins.
pub struct ViewNodeFactory {
    backend: String,
    local: HashMap<&'static str, ViewNodeCtor>,
    created: Cell<u64>,
}

impl ViewNodeFactory {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            local: HashMap::new(),
            created: Cell::new(0),
        }
    }

    /// Layer an override over the global table for this factory only.
    pub fn with_override(mut self, class_name: &'static str, ctor: ViewNodeCtor) -> Self {
        self.local.insert(class_name, ctor);
        self
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Number of view nodes this factory has created.
    pub fn created(&self) -> u64 {
        self.created.get()
    }

    /// The type name and constructor dispatch picks for `obj`.
    pub fn resolve(&self, obj: &SceneRef) -> VizResult<(&'static str, ViewNodeCtor)> {
        obj.class_hierarchy()
            .iter()
            .find_map(|&name| {
                self.local
                    .get(name)
                    .copied()
                    .or_else(|| lookup_override(&self.backend, name))
                    .map(|ctor| (name, ctor))
            })
            .ok_or_else(|| VizError::NoOverride {
                class_name: obj.class_name().to_owned(),
                backend: self.backend.clone(),
            })
    }

    pub fn create_node(&self, obj: &SceneRef) -> VizResult<ViewNode> {
        let (matched, ctor) = self.resolve(obj)?;
        let imp = ctor(obj)?;
        self.created.set(self.created.get() + 1);
        tracing::trace!(
            class = obj.class_name(),
            matched,
            backend = %self.backend,
            "view node created"
        );
        Ok(ViewNode::new(obj.clone(), matched, imp))
    }
}
