use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::{Bounds, Rect, Rgb};
use crate::foundation::error::{VizError, VizResult};
use crate::foundation::stamp::Stamped;
use crate::scene::camera::Camera;
use crate::scene::object::{SceneObject, SceneRef, set_if_changed};
use crate::scene::prop::PropRef;

const HIERARCHY: &[&str] = &["Renderer", "Viewport", "Object"];

/// One viewport of a window: a camera, a background and a list of props.
pub struct Renderer {
    stamped: Stamped,
    camera: RefCell<Rc<Camera>>,
    props: RefCell<Vec<PropRef>>,
    background: Cell<Rgb>,
    /// Normalized `[x0, y0, x1, y1]`, origin bottom-left.
    viewport: Cell<Rect>,
}

impl Renderer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            stamped: Stamped::new(),
            camera: RefCell::new(Rc::new(Camera::new())),
            props: RefCell::new(Vec::new()),
            background: Cell::new(Rgb::BLACK),
            viewport: Cell::new(Rect::new(0.0, 0.0, 1.0, 1.0)),
        })
    }

    pub fn camera(&self) -> Rc<Camera> {
        Rc::clone(&self.camera.borrow())
    }

    pub fn set_camera(&self, camera: Rc<Camera>) {
        self.camera.replace(camera);
        self.stamped.modified();
    }

    pub fn background(&self) -> Rgb {
        self.background.get()
    }

    pub fn set_background(&self, color: Rgb) -> bool {
        set_if_changed(&self.stamped, &self.background, color)
    }

    pub fn viewport(&self) -> Rect {
        self.viewport.get()
    }

    pub fn set_viewport(&self, viewport: Rect) -> VizResult<bool> {
        let unit = Rect::new(0.0, 0.0, 1.0, 1.0);
        if viewport.width() <= 0.0
            || viewport.height() <= 0.0
            || unit.intersect(viewport) != viewport
        {
            return Err(VizError::validation(format!(
                "viewport must be a non-empty sub-rectangle of the unit square, got {viewport:?}"
            )));
        }
        Ok(set_if_changed(&self.stamped, &self.viewport, viewport))
    }

    /// Returns `false` when the prop was already present.
    pub fn add_view_prop(&self, prop: PropRef) -> bool {
        {
            let mut props = self.props.borrow_mut();
            if props.iter().any(|p| Rc::ptr_eq(p, &prop)) {
                return false;
            }
            props.push(prop);
        }
        self.stamped.modified();
        true
    }

    pub fn remove_view_prop(&self, prop: &PropRef) -> bool {
        let removed = {
            let mut props = self.props.borrow_mut();
            let before = props.len();
            props.retain(|p| !Rc::ptr_eq(p, prop));
            props.len() != before
        };
        if removed {
            self.stamped.modified();
        }
        removed
    }

    pub fn props(&self) -> Vec<PropRef> {
        self.props.borrow().clone()
    }

    pub fn visible_props(&self) -> Vec<PropRef> {
        self.props
            .borrow()
            .iter()
            .filter(|p| p.visibility())
            .cloned()
            .collect()
    }

    /// Union of the visible props' bounds. Pulls their pipelines.
    pub fn visible_bounds(&self) -> Bounds {
        self.visible_props()
            .iter()
            .fold(Bounds::EMPTY, |acc, p| acc.union(p.bounds()))
    }

    /// Point the camera at everything visible.
    pub fn reset_camera(&self) {
        let bounds = self.visible_bounds();
        if !bounds.is_valid() {
            tracing::debug!("reset_camera: nothing visible to fit");
            return;
        }
        self.camera().reset_to_bounds(bounds);
    }
}

impl SceneObject for Renderer {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        HIERARCHY
    }

    fn scene_children(&self) -> Vec<SceneRef> {
        let mut out: Vec<SceneRef> = vec![self.camera() as SceneRef];
        out.extend(self.props.borrow().iter().map(|p| Rc::clone(p) as SceneRef));
        out
    }
}
