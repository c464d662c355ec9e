use super::*;

#[test]
fn pixel_reads_row_major() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(frame.pixel(2, 0), None);
}

#[test]
fn pixel_index_does_not_overflow_on_large_frames() {
    // Largest canvas side; the byte offset of the last pixel exceeds u32.
    let frame = FrameRGBA {
        width: 65535,
        height: 65535,
        data: Vec::new(),
        premultiplied: true,
    };
    assert_eq!(frame.pixel(65534, 65534), None);
}

#[test]
fn recording_backend_has_no_pixels() {
    assert!(BackendKind::Cpu.rasterizes());
    assert!(!BackendKind::Recording.rasterizes());
}
