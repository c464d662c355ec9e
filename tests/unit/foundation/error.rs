use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VizError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(VizError::pipeline("x").to_string().contains("pipeline error:"));
    assert!(VizError::resource("x").to_string().contains("resource error:"));
    assert!(
        VizError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn no_override_names_class_and_backend() {
    let err = VizError::NoOverride {
        class_name: "Volume".to_owned(),
        backend: "cpu".to_owned(),
    };
    let s = err.to_string();
    assert!(s.contains("Volume"));
    assert!(s.contains("cpu"));
}

#[test]
fn port_out_of_range_reports_direction() {
    let err = VizError::PortOutOfRange {
        node: "ShrinkPolyData".to_owned(),
        index: 3,
        available: 1,
        direction: PortDirection::Input,
    };
    assert!(err.to_string().contains("1 input port(s), index 3"));
}

#[test]
fn only_context_loss_is_fatal() {
    assert!(VizError::context_unavailable("lost").is_fatal());
    assert!(!VizError::resource("x").is_fatal());
    assert!(!VizError::TaskCancelled.is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VizError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
