use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Coalesces continuous-render requests from many parties into one frame loop.
///
/// Requesters are identified by reference, so registering the same object twice is a no-op and
/// so is cancelling an object that never registered. The loop runs while at least one requester
/// is registered.
#[derive(Default)]
pub struct AnimationScheduler {
    requesters: RefCell<Vec<Rc<dyn Any>>>,
    running: Cell<bool>,
    loop_starts: Cell<u64>,
    frames: Cell<u64>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `requester` was not registered yet.
    pub fn request_animation(&self, requester: Rc<dyn Any>) -> bool {
        {
            let mut set = self.requesters.borrow_mut();
            if set.iter().any(|r| Rc::ptr_eq(r, &requester)) {
                return false;
            }
            set.push(requester);
        }
        if !self.running.get() {
            self.running.set(true);
            self.loop_starts.set(self.loop_starts.get() + 1);
            tracing::debug!("animation loop started");
        }
        true
    }

    /// Returns `true` when `requester` was registered.
    pub fn cancel_animation(&self, requester: &Rc<dyn Any>) -> bool {
        let now_empty = {
            let mut set = self.requesters.borrow_mut();
            let before = set.len();
            set.retain(|r| !Rc::ptr_eq(r, requester));
            if set.len() == before {
                return false;
            }
            set.is_empty()
        };
        if now_empty && self.running.get() {
            self.running.set(false);
            tracing::debug!(frames = self.frames.get(), "animation loop stopped");
        }
        true
    }

    pub fn is_animating(&self) -> bool {
        self.running.get()
    }

    pub fn num_requesters(&self) -> usize {
        self.requesters.borrow().len()
    }

    /// How many times the loop went from stopped to running.
    pub fn loop_starts(&self) -> u64 {
        self.loop_starts.get()
    }

    pub fn frames(&self) -> u64 {
        self.frames.get()
    }

    /// Run one loop iteration if the loop is running.
    pub fn drive_frame<R>(&self, render: impl FnOnce() -> R) -> Option<R> {
        if !self.running.get() {
            return None;
        }
        self.frames.set(self.frames.get() + 1);
        Some(render())
    }
}
