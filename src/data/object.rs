use std::any::Any;
use std::rc::Rc;

use crate::foundation::core::Bounds;
use crate::foundation::stamp::{ObjectId, Stamp, Stamped};

/// Contract every value flowing through the pipeline satisfies.
///
/// Data objects are produced by a compute step, owned by the producing output slot and handed
/// to consumers as shared read-only references.
pub trait DataObject: Any {
    fn stamped(&self) -> &Stamped;

    fn class_name(&self) -> &'static str;

    fn bounds(&self) -> Bounds {
        Bounds::EMPTY
    }

    fn id(&self) -> ObjectId {
        self.stamped().id()
    }

    fn stamp(&self) -> Stamp {
        self.stamped().stamp()
    }
}

pub type DataRef = Rc<dyn DataObject>;

/// Typed view of a shared data object.
pub fn downcast_data<T: DataObject>(data: &DataRef) -> Option<Rc<T>> {
    let any: Rc<dyn Any> = data.clone();
    any.downcast::<T>().ok()
}

pub fn downcast_data_ref<T: DataObject>(data: &dyn DataObject) -> Option<&T> {
    let any: &dyn Any = data;
    any.downcast_ref::<T>()
}
