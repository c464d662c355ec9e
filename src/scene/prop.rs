use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::{Bounds, Rect, Rgb};
use crate::foundation::stamp::Stamped;
use crate::scene::mapper::Mapper;
use crate::scene::object::{SceneObject, SceneRef, set_if_changed};
use crate::scene::property::Property;

/// Anything a renderer can hold.
pub trait Prop: SceneObject {
    fn visibility(&self) -> bool;

    fn set_visibility(&self, visible: bool) -> bool;

    fn pickable(&self) -> bool {
        true
    }

    fn mapper(&self) -> Option<Rc<Mapper>> {
        None
    }

    fn property(&self) -> Rc<Property>;

    /// World bounds; pulls the mapper's pipeline.
    fn bounds(&self) -> Bounds {
        self.mapper().map_or(Bounds::EMPTY, |m| m.bounds())
    }

    /// Opaque props draw in the opaque pass, the rest in the translucent pass.
    fn is_opaque(&self) -> bool {
        true
    }
}

pub type PropRef = Rc<dyn Prop>;

#[derive(Debug)]
struct PropFlags {
    visible: Cell<bool>,
    pickable: Cell<bool>,
}

impl Default for PropFlags {
    fn default() -> Self {
        Self {
            visible: Cell::new(true),
            pickable: Cell::new(true),
        }
    }
}

const ACTOR_HIERARCHY: &[&str] = &["Actor", "Prop3D", "Prop", "Object"];
const VOLUME_HIERARCHY: &[&str] = &["Volume", "Prop3D", "Prop", "Object"];
const ACTOR2D_HIERARCHY: &[&str] = &["Actor2D", "Prop", "Object"];

/// Surface geometry prop.
pub struct Actor {
    stamped: Stamped,
    flags: PropFlags,
    mapper: RefCell<Option<Rc<Mapper>>>,
    property: RefCell<Rc<Property>>,
}

impl Actor {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            flags: PropFlags::default(),
            mapper: RefCell::new(None),
            property: RefCell::new(Rc::new(Property::new())),
        })
    }

    pub fn with_mapper(mapper: Rc<Mapper>) -> Rc<Self> {
        let actor = Self::new();
        actor.set_mapper(Some(mapper));
        actor
    }

    pub fn set_mapper(&self, mapper: Option<Rc<Mapper>>) {
        self.mapper.replace(mapper);
        self.stamped.modified();
    }

    pub fn set_property(&self, property: Rc<Property>) {
        self.property.replace(property);
        self.stamped.modified();
    }

    pub fn set_pickable(&self, pickable: bool) -> bool {
        set_if_changed(&self.stamped, &self.flags.pickable, pickable)
    }
}

impl SceneObject for Actor {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        ACTOR_HIERARCHY
    }

    fn as_prop(&self) -> Option<&dyn Prop> {
        Some(self)
    }

    fn scene_children(&self) -> Vec<SceneRef> {
        self.mapper()
            .map(|m| vec![m as SceneRef])
            .unwrap_or_default()
    }
}

impl Prop for Actor {
    fn visibility(&self) -> bool {
        self.flags.visible.get()
    }

    fn set_visibility(&self, visible: bool) -> bool {
        set_if_changed(&self.stamped, &self.flags.visible, visible)
    }

    fn pickable(&self) -> bool {
        self.flags.pickable.get()
    }

    fn mapper(&self) -> Option<Rc<Mapper>> {
        self.mapper.borrow().clone()
    }

    fn property(&self) -> Rc<Property> {
        Rc::clone(&self.property.borrow())
    }

    fn is_opaque(&self) -> bool {
        self.property.borrow().opacity() >= 1.0
    }
}

/// Volumetric prop. Rendered as a translucent slab over its mapper's bounds.
pub struct Volume {
    stamped: Stamped,
    flags: PropFlags,
    mapper: RefCell<Option<Rc<Mapper>>>,
    property: Rc<Property>,
}

impl Volume {
    pub fn new(mapper: Rc<Mapper>) -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            flags: PropFlags::default(),
            mapper: RefCell::new(Some(mapper)),
            property: Rc::new(Property::with_color(Rgb::new(0.9, 0.9, 0.6), 0.35)),
        })
    }

}

impl SceneObject for Volume {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        VOLUME_HIERARCHY
    }

    fn as_prop(&self) -> Option<&dyn Prop> {
        Some(self)
    }

    fn scene_children(&self) -> Vec<SceneRef> {
        self.mapper()
            .map(|m| vec![m as SceneRef])
            .unwrap_or_default()
    }
}

impl Prop for Volume {
    fn visibility(&self) -> bool {
        self.flags.visible.get()
    }

    fn set_visibility(&self, visible: bool) -> bool {
        set_if_changed(&self.stamped, &self.flags.visible, visible)
    }

    fn mapper(&self) -> Option<Rc<Mapper>> {
        self.mapper.borrow().clone()
    }

    fn property(&self) -> Rc<Property> {
        Rc::clone(&self.property)
    }

    fn is_opaque(&self) -> bool {
        false
    }
}

/// Screen-space rectangle drawn in the overlay pass.
pub struct Actor2D {
    stamped: Stamped,
    flags: PropFlags,
    /// Normalized viewport coordinates, origin bottom-left.
    rect: Cell<Rect>,
    property: Rc<Property>,
}

impl Actor2D {
    pub fn new(rect: Rect, color: Rgb) -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            flags: PropFlags::default(),
            rect: Cell::new(rect),
            property: Rc::new(Property::with_color(color, 1.0)),
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect.get()
    }

    pub fn set_rect(&self, rect: Rect) -> bool {
        set_if_changed(&self.stamped, &self.rect, rect)
    }
}

impl SceneObject for Actor2D {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        ACTOR2D_HIERARCHY
    }

    fn as_prop(&self) -> Option<&dyn Prop> {
        Some(self)
    }
}

impl Prop for Actor2D {
    fn visibility(&self) -> bool {
        self.flags.visible.get()
    }

    fn set_visibility(&self, visible: bool) -> bool {
        set_if_changed(&self.stamped, &self.flags.visible, visible)
    }

    fn pickable(&self) -> bool {
        false
    }

    fn property(&self) -> Rc<Property> {
        Rc::clone(&self.property)
    }
}
