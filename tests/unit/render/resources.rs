use super::*;

fn key(n: u64) -> ResourceKey {
    ResourceKey::new(ObjectId(n), "geometry")
}

#[test]
fn released_exactly_when_last_user_leaves() {
    let mut reg = ResourceRegistry::default();
    let (a, b) = (ViewNodeId(1), ViewNodeId(2));
    reg.set_resource_for_user(key(1), a, Rc::new(vec![0u8; 16]), 7, 16);
    assert!(reg.register_user(key(1), b));
    assert_eq!(reg.users(key(1)), vec![a, b]);

    assert!(!reg.unregister_user(key(1), a));
    assert!(reg.contains(key(1)));
    // Unknown users and repeated unregistration are harmless.
    assert!(!reg.unregister_user(key(1), ViewNodeId(99)));
    assert!(reg.contains(key(1)));

    assert!(reg.unregister_user(key(1), b));
    assert!(!reg.contains(key(1)));
    assert_eq!(reg.stats().released, 1);
    assert!(!reg.unregister_user(key(1), b));
}

#[test]
fn payloads_are_typed_and_hashed() {
    let mut reg = ResourceRegistry::default();
    reg.set_resource_for_user(key(2), ViewNodeId(1), Rc::new(42u32), 5, 4);
    assert_eq!(reg.hash(key(2)), Some(5));
    assert_eq!(*reg.get::<u32>(key(2)).unwrap(), 42);
    assert!(reg.get::<String>(key(2)).is_none());

    reg.set_resource_for_user(key(2), ViewNodeId(1), Rc::new(43u32), 6, 4);
    assert_eq!(reg.hash(key(2)), Some(6));
    assert_eq!(reg.stats().replaced, 1);
}

#[test]
fn memory_usage_sums_retained_bytes() {
    let mut reg = ResourceRegistry::new(ResourceRegistryOpts {
        budget_bytes: Some(10),
    });
    reg.set_resource_for_user(key(3), ViewNodeId(1), Rc::new(()), 0, 8);
    reg.set_resource_for_user(key(4), ViewNodeId(1), Rc::new(()), 0, 8);
    assert_eq!(reg.memory_usage(), 16);
    reg.release_all();
    assert!(reg.is_empty());
    assert_eq!(reg.memory_usage(), 0);
}

#[test]
fn registering_on_a_missing_resource_fails() {
    let mut reg = ResourceRegistry::default();
    assert!(!reg.register_user(key(5), ViewNodeId(1)));
}
