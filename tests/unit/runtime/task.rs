use super::*;
use futures::task::LocalSpawnExt as _;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn resolved_task_is_ready() {
    let mut t = Task::ready(7);
    assert_eq!(t.try_take().unwrap().unwrap(), 7);
    assert_eq!(pollster::block_on(Task::ready(8)).unwrap(), 8);
}

#[test]
fn dropped_promise_cancels() {
    let (p, t) = promise::<u8>();
    drop(p);
    assert!(matches!(pollster::block_on(t), Err(VizError::TaskCancelled)));
}

#[test]
fn pending_task_has_nothing_to_take() {
    let (p, mut t) = promise::<u8>();
    assert!(t.try_take().is_none());
    assert!(!p.is_canceled());
    drop(t);
    assert!(p.is_canceled());
}

#[test]
fn rejection_surfaces_the_error() {
    let (p, mut t) = promise::<u8>();
    p.reject(VizError::resource("offline"));
    let err = t.try_take().unwrap().unwrap_err();
    assert!(err.to_string().contains("offline"));
}

#[test]
fn continuations_run_only_when_the_pool_is_drained() {
    let mut pool = LocalPool::new();
    let (p, t) = promise::<u32>();
    let seen = Rc::new(Cell::new(0));
    let seen2 = Rc::clone(&seen);
    pool.spawner()
        .spawn_local(async move {
            if let Ok(v) = t.await {
                seen2.set(v);
            }
        })
        .unwrap();

    pool.run_until_stalled();
    assert_eq!(seen.get(), 0);

    p.resolve(42);
    assert_eq!(seen.get(), 0);
    pool.run_until_stalled();
    assert_eq!(seen.get(), 42);
}

#[test]
fn continuations_may_spawn_more_work() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let hits = Rc::new(Cell::new(0));
    let (inner, h2) = (spawner.clone(), Rc::clone(&hits));
    spawner
        .spawn_local(async move {
            h2.set(h2.get() + 1);
            let h3 = Rc::clone(&h2);
            inner
                .spawn_local(async move {
                    h3.set(h3.get() + 10);
                })
                .unwrap();
        })
        .unwrap();
    pool.run_until_stalled();
    assert_eq!(hits.get(), 11);
}
