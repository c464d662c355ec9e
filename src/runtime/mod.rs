pub mod animation;
pub mod task;

pub use animation::AnimationScheduler;
pub use task::{LocalPool, LocalSpawner, Promise, Task, promise};
