use std::any::Any;
use std::rc::Rc;

use crate::foundation::stamp::{ObjectId, Stamp, Stamped};
use crate::scene::prop::Prop;

/// A renderable domain object: the thing view nodes are created for.
pub trait SceneObject: Any {
    fn stamped(&self) -> &Stamped;

    /// Type names from most to least derived, e.g. `["Actor", "Prop3D", "Prop", "Object"]`.
    ///
    /// Backend dispatch walks this list and picks the first registered entry.
    fn class_hierarchy(&self) -> &'static [&'static str];

    /// Objects that get their own view nodes under this one, in traversal order.
    fn scene_children(&self) -> Vec<SceneRef> {
        Vec::new()
    }

    /// The prop view of this object, for view nodes dispatched on a prop role.
    fn as_prop(&self) -> Option<&dyn Prop> {
        None
    }

    fn object_id(&self) -> ObjectId {
        self.stamped().id()
    }

    fn stamp(&self) -> Stamp {
        self.stamped().stamp()
    }

    fn class_name(&self) -> &'static str {
        self.class_hierarchy().first().copied().unwrap_or("Object")
    }
}

pub type SceneRef = Rc<dyn SceneObject>;

pub fn downcast_scene<T: SceneObject>(obj: &SceneRef) -> Option<Rc<T>> {
    let any: Rc<dyn Any> = obj.clone();
    any.downcast::<T>().ok()
}

pub fn downcast_scene_ref<T: SceneObject>(obj: &dyn SceneObject) -> Option<&T> {
    let any: &dyn Any = obj;
    any.downcast_ref::<T>()
}

/// Set a `Cell` and bump `stamped` only when the value actually changes.
pub(crate) fn set_if_changed<T: Copy + PartialEq>(
    stamped: &Stamped,
    cell: &std::cell::Cell<T>,
    value: T,
) -> bool {
    if cell.get() == value {
        return false;
    }
    cell.set(value);
    stamped.modified();
    true
}
