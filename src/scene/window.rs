use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::foundation::core::Canvas;
use crate::foundation::error::VizResult;
use crate::foundation::stamp::Stamped;
use crate::scene::object::{SceneObject, SceneRef};
use crate::scene::renderer::Renderer;

const HIERARCHY: &[&str] = &["RenderWindow", "Object"];

type PreRenderHook = Box<dyn Fn(&RenderWindow)>;

/// Root of a scene: output size plus an ordered list of renderers.
pub struct RenderWindow {
    stamped: Stamped,
    canvas: Cell<Canvas>,
    renderers: RefCell<Vec<Rc<Renderer>>>,
    pre_render: RefCell<Vec<PreRenderHook>>,
}

impl RenderWindow {
    pub fn new(width: u32, height: u32) -> VizResult<Rc<Self>> {
        Ok(Rc::new(Self {
            stamped: Stamped::new(),
            canvas: Cell::new(Canvas::new(width, height)?),
            renderers: RefCell::new(Vec::new()),
            pre_render: RefCell::new(Vec::new()),
        }))
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas.get()
    }

    pub fn set_size(&self, width: u32, height: u32) -> VizResult<()> {
        let next = Canvas::new(width, height)?;
        if next != self.canvas.get() {
            self.canvas.set(next);
            self.stamped.modified();
        }
        Ok(())
    }

    pub fn add_renderer(&self, renderer: Rc<Renderer>) {
        {
            let mut rs = self.renderers.borrow_mut();
            if rs.iter().any(|r| Rc::ptr_eq(r, &renderer)) {
                return;
            }
            rs.push(renderer);
        }
        self.stamped.modified();
    }

    pub fn remove_renderer(&self, renderer: &Rc<Renderer>) -> bool {
        let removed = {
            let mut rs = self.renderers.borrow_mut();
            let before = rs.len();
            rs.retain(|r| !Rc::ptr_eq(r, renderer));
            rs.len() != before
        };
        if removed {
            self.stamped.modified();
        }
        removed
    }

    pub fn renderers(&self) -> Vec<Rc<Renderer>> {
        self.renderers.borrow().clone()
    }

    /// Run `hook` at the start of every frame, before the pipeline is pulled.
    pub fn on_pre_render(&self, hook: impl Fn(&RenderWindow) + 'static) {
        self.pre_render.borrow_mut().push(Box::new(hook));
    }

    pub(crate) fn run_pre_render_hooks(&self) {
        // Hooks may register more hooks; run the ones present at frame start.
        let hooks = std::mem::take(&mut *self.pre_render.borrow_mut());
        for hook in &hooks {
            hook(self);
        }
        let mut slot = self.pre_render.borrow_mut();
        let added = std::mem::replace(&mut *slot, hooks);
        slot.extend(added);
    }
}

impl SceneObject for RenderWindow {
    fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    fn class_hierarchy(&self) -> &'static [&'static str] {
        HIERARCHY
    }

    fn scene_children(&self) -> Vec<SceneRef> {
        self.renderers
            .borrow()
            .iter()
            .map(|r| Rc::clone(r) as SceneRef)
            .collect()
    }
}
