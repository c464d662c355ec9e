use crate::foundation::error::{VizError, VizResult};

/// Overlay `patch` onto the serialized parameters in `base`.
///
/// Both must be JSON objects. Keys the algorithm does not declare are rejected so a typo in a
/// configuration object is reported instead of silently ignored. Nested objects merge
/// recursively; any other value replaces the previous one.
pub(crate) fn merge_values(
    class_name: &str,
    base: &mut serde_json::Value,
    patch: &serde_json::Value,
) -> VizResult<()> {
    let serde_json::Value::Object(patch) = patch else {
        return Err(VizError::validation(format!(
            "{class_name}: parameter values must be a JSON object"
        )));
    };
    let serde_json::Value::Object(base) = base else {
        return Err(VizError::validation(format!(
            "{class_name}: parameters do not serialize to a JSON object"
        )));
    };
    for (key, value) in patch {
        let Some(slot) = base.get_mut(key) else {
            return Err(VizError::validation(format!(
                "{class_name}: unknown parameter '{key}'"
            )));
        };
        if slot.is_object() && value.is_object() {
            merge_values(class_name, slot, value)?;
        } else {
            *slot = value.clone();
        }
    }
    Ok(())
}
