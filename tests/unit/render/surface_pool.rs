use super::*;

fn desc(w: u32, h: u32) -> SurfaceDesc {
    SurfaceDesc {
        width: w,
        height: h,
        format: PixelFormat::Rgba8Premul,
    }
}

#[test]
fn pool_honors_bucket_cap() {
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: 1 << 30,
        max_surfaces_per_bucket: 1,
    });
    let d = desc(8, 8);

    let a = p.borrow(d).unwrap();
    let b = p.borrow(d).unwrap();
    p.release(d, a);
    p.release(d, b);

    let st = p.stats();
    assert_eq!(st.retained_surfaces, 1);
}

#[test]
fn pool_honors_global_byte_cap() {
    let bytes_8x8 = desc(8, 8).byte_len();
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: bytes_8x8,
        max_surfaces_per_bucket: 8,
    });
    let d = desc(8, 8);

    let a = p.borrow(d).unwrap();
    let b = p.borrow(d).unwrap();
    p.release(d, a);
    p.release(d, b);

    let st = p.stats();
    assert_eq!(st.retained_bytes, bytes_8x8);
    assert_eq!(st.retained_surfaces, 1);
    assert!(st.dropped_on_release >= 1);
}

#[test]
fn released_surfaces_are_reused_and_cleared_on_request() {
    let mut p = SurfacePool::default();
    let d = desc(4, 4);
    let mut a = p.borrow(d).unwrap();
    a.data_as_u8_slice_mut().fill(7);
    p.release(d, a);

    let b = p.borrow_cleared(d).unwrap();
    assert!(b.data_as_u8_slice().iter().all(|&v| v == 0));
    let st = p.stats();
    assert_eq!(st.alloc_surfaces, 1);
    assert_eq!(st.reused_surfaces, 1);
}

#[test]
fn oversized_surfaces_are_refused() {
    let mut p = SurfacePool::default();
    assert!(p.borrow(desc(70_000, 1)).is_err());
}
