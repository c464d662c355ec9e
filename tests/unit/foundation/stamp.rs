use super::*;

#[test]
fn stamps_are_strictly_increasing_across_objects() {
    let a = Stamped::new();
    let b = Stamped::new();
    assert!(b.stamp().is_newer_than(a.stamp()));

    let sa = a.modified();
    assert!(sa.is_newer_than(b.stamp()));
    let sb = b.modified();
    assert!(sb.is_newer_than(sa));
}

#[test]
fn modified_never_reuses_a_value() {
    let s = Stamped::new();
    let mut prev = s.stamp();
    for _ in 0..64 {
        let next = s.modified();
        assert!(next > prev);
        prev = next;
    }
    assert!(Stamp::current() >= prev);
}

#[test]
fn zero_is_older_than_everything() {
    let s = Stamped::new();
    assert!(s.stamp().is_newer_than(Stamp::ZERO));
    assert!(Stamp::ZERO.is_zero());
}

#[test]
fn ids_are_unique() {
    let a = Stamped::new();
    let b = Stamped::new();
    assert_ne!(a.id(), b.id());
}
