//! Execution-result payload parsing.
//!
//! The host delivers a node's execution output as JSON. Preview images sit
//! under `images` (or `ram_preview`, the older key) as a list of base64
//! strings; `null` entries are kept as empty slots.
//!
//! ```text
//! {"images": ["iVBORw0KGgo...", null]}
//! ```

use log::warn;
use serde_json::Value;

use crate::core::preview_cache::ImageSlots;
use crate::entities::image::ImageBlob;

pub const IMAGE_KEYS: [&str; 2] = ["images", "ram_preview"];

/// Image slots from an execution output, or `None` when it carries no images.
pub fn parse_images(output: &Value) -> Option<ImageSlots> {
    let list = IMAGE_KEYS
        .iter()
        .find_map(|key| output.get(key))
        .and_then(Value::as_array)?;
    Some(list.iter().enumerate().map(|(i, entry)| parse_slot(i, entry)).collect())
}

fn parse_slot(index: usize, entry: &Value) -> Option<ImageBlob> {
    match entry {
        Value::Null => None,
        Value::String(encoded) => match ImageBlob::from_base64(encoded) {
            Ok(blob) => Some(blob),
            Err(e) => {
                warn!("Preview slot {} dropped: {:#}", index, e);
                None
            }
        },
        other => {
            warn!("Preview slot {} dropped: expected string, got {}", index, other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::image::{encode_png, to_base64};
    use serde_json::json;

    #[test]
    fn test_images_key_with_null_slot() {
        let blob = encode_png(2, 1, [1, 2, 3, 255]).unwrap();
        let output = json!({"images": [to_base64(&blob), null]});
        let slots = parse_images(&output).unwrap();
        assert_eq!(slots, vec![Some(blob), None]);
    }

    #[test]
    fn test_ram_preview_alias() {
        let blob = encode_png(1, 1, [0, 0, 0, 255]).unwrap();
        let output = json!({"ram_preview": [to_base64(&blob)]});
        assert_eq!(parse_images(&output).unwrap().len(), 1);
    }

    #[test]
    fn test_no_images() {
        assert!(parse_images(&json!({"text": ["done"]})).is_none());
        assert!(parse_images(&json!({"images": "nope"})).is_none());
        assert!(parse_images(&json!(null)).is_none());
    }

    #[test]
    fn test_bad_entries_become_empty_slots() {
        let slots = parse_images(&json!({"images": ["%%%not-base64", 5]})).unwrap();
        assert_eq!(slots, vec![None, None]);
    }
}
