use serde_json::{Map, Value};

/// Result of applying a patch body to a stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Both sides were JSON objects and were merged field by field.
    Merged(Value),
    /// Both sides parsed but at least one was not an object; the patch replaces
    /// the value and its original text is what gets stored.
    Replaced { text: String, value: Value },
    /// One side failed to parse; the raw patch text replaces the value.
    Unparsable(String),
}

impl MergeOutcome {
    /// Text to write back to the store.
    pub fn stored_text(&self) -> String {
        match self {
            MergeOutcome::Merged(value) => value.to_string(),
            MergeOutcome::Replaced { text, .. } => text.clone(),
            MergeOutcome::Unparsable(text) => text.clone(),
        }
    }

    /// The resulting document, when there is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MergeOutcome::Merged(value) | MergeOutcome::Replaced { value, .. } => Some(value),
            MergeOutcome::Unparsable(_) => None,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged(_))
    }
}

/// Merge `patch` into `current`.
///
/// When both are objects every patch field is applied in order: `null` removes
/// the field, an object merges recursively into an existing object field, any
/// other value replaces the field wholesale. Arrays are never merged element-wise.
/// When either side is not an object the result is `patch` itself.
pub fn merge(current: &Value, patch: &Value) -> Value {
    match (current, patch) {
        (Value::Object(current), Value::Object(patch)) => {
            let mut result = current.clone();
            merge_fields(&mut result, patch);
            Value::Object(result)
        }
        _ => patch.clone(),
    }
}

fn merge_fields(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (field, patch_value) in patch {
        match patch_value {
            Value::Null => {
                target.shift_remove(field);
            }
            Value::Object(nested) => match target.get_mut(field) {
                Some(Value::Object(existing)) => merge_fields(existing, nested),
                _ => {
                    target.insert(field.clone(), patch_value.clone());
                }
            },
            other => {
                target.insert(field.clone(), other.clone());
            }
        }
    }
}

/// Parse both texts and merge them.
///
/// Parse failures on either side are not errors: the raw patch text becomes the
/// new value. Nesting depth is bounded by `serde_json`'s parser recursion limit.
pub fn merge_text(current: &str, patch: &str) -> MergeOutcome {
    let (current_doc, patch_doc) = match (
        serde_json::from_str::<Value>(current),
        serde_json::from_str::<Value>(patch),
    ) {
        (Ok(c), Ok(p)) => (c, p),
        _ => return MergeOutcome::Unparsable(patch.to_owned()),
    };

    if current_doc.is_object() && patch_doc.is_object() {
        MergeOutcome::Merged(merge(&current_doc, &patch_doc))
    } else {
        MergeOutcome::Replaced { text: patch.to_owned(), value: patch_doc }
    }
}
