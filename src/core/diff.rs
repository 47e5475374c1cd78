//! Field-level diffs over history snapshots
//!
//! The ledger stores loosely-typed JSON deltas; this module turns any entry
//! into human-readable `FieldDiff`s. Everything here is total: unexpected
//! shapes fall back to a structural dump, never a panic.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::entities::history::HistoryEntry;

/// One changed field, formatted for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: String,
    pub label: String,
    /// `None` renders as absence (a dash, typically)
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Diff a ledger entry's before/after snapshots
pub fn diff_entry(entry: &HistoryEntry) -> Vec<FieldDiff> {
    diff_states(entry.previous_state.as_ref(), &entry.new_state)
}

/// Diff two snapshots; `previous = None` means there was no prior state
pub fn diff_states(previous: Option<&Value>, new: &Value) -> Vec<FieldDiff> {
    let empty = serde_json::Map::new();

    let previous = previous.unwrap_or(&Value::Null);
    let (prev_map, new_map) = match (previous, new) {
        (Value::Object(p), Value::Object(n)) => (p, n),
        (Value::Null, Value::Object(n)) => (&empty, n),
        (Value::Object(p), Value::Null) => (p, &empty),
        // Snapshots are objects by construction; compare anything else as a
        // single opaque value rather than failing.
        _ => {
            if previous == new {
                return Vec::new();
            }
            return vec![FieldDiff {
                field: "value".to_string(),
                label: "Value".to_string(),
                before: format_value(previous),
                after: format_value(new),
            }];
        }
    };

    let keys: BTreeSet<&String> = prev_map.keys().chain(new_map.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let before = prev_map.get(key).unwrap_or(&Value::Null);
            let after = new_map.get(key).unwrap_or(&Value::Null);
            if before == after {
                return None;
            }
            Some(FieldDiff {
                field: key.clone(),
                label: field_label(key),
                before: format_value(before),
                after: format_value(after),
            })
        })
        .collect()
}

/// Display label for a snapshot field
pub fn field_label(field: &str) -> String {
    let known = match field {
        "animal_type" => "Animal",
        "hanging_weight_lbs" => "Hanging Weight (lbs)",
        "actual_weight_lbs" => "Actual Weight (lbs)",
        "ground_type" => "Ground Meat Packaging",
        "ground_package_weight_lbs" => "Ground Package Weight (lbs)",
        "patty_size" => "Patty Size",
        "special_instructions" => "Special Instructions",
        "processor_notes" => "Processor Notes",
        "producer_notes" => "Producer Notes",
        "processor_modifications" => "Processor Modifications",
        "removed_cuts" => "Removed Cuts",
        "added_cuts" => "Added Cuts",
        "cut_id" => "Cut",
        "cut_name" => "Cut Name",
        "pieces_per_package" => "Pieces per Package",
        "quantity_in_package" => "Quantity in Package",
        "package_number" => "Package Number",
        "processing_style" => "Processing Style",
        "livestock_tracking_id" => "Livestock Tracking ID",
        "status" => "Status",
        "items" => "Selected Cuts",
        "sausages" => "Sausage",
        "organs" => "Organs",
        "beef" => "Beef Options",
        "pork" => "Pork Options",
        _ => return title_case(field),
    };
    known.to_string()
}

/// `snake_case` → `Title Case`
fn title_case(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format any snapshot value for display; `None` means absence
fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(format_array(items)),
        Value::Object(map) => Some(format_object(map)),
    }
}

fn format_array(items: &[Value]) -> String {
    if items.iter().any(|item| item.is_object()) {
        // Object elements: prefer a cut_name/name field, else dump the element.
        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => map
                    .get("cut_name")
                    .or_else(|| map.get("name"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| item.to_string()),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        items
            .iter()
            .filter_map(format_value)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn format_object(map: &serde_json::Map<String, Value>) -> String {
    let pairs: Vec<String> = map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .filter_map(|(k, v)| format_value(v).map(|rendered| format!("{}: {}", field_label(k), rendered)))
        .collect();
    if pairs.is_empty() {
        "Empty".to_string()
    } else {
        pairs.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equal_keys_produce_no_diff() {
        let prev = json!({"hanging_weight_lbs": 450.0, "status": "draft"});
        let new = json!({"status": "draft", "hanging_weight_lbs": 450.0});
        assert!(diff_states(Some(&prev), &new).is_empty());
    }

    #[test]
    fn test_one_diff_per_differing_key() {
        let prev = json!({"a": 1, "b": 2, "c": 3});
        let new = json!({"a": 1, "b": 20, "c": 30});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].field, "b");
        assert_eq!(diffs[1].field, "c");
    }

    #[test]
    fn test_absent_prior_state() {
        let new = json!({"processor_notes": "trim heavy"});
        let diffs = diff_states(None, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].before, None);
        assert_eq!(diffs[0].after.as_deref(), Some("trim heavy"));
    }

    #[test]
    fn test_booleans_render_yes_no() {
        let prev = json!({"stew_meat": false});
        let new = json!({"stew_meat": true});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs[0].before.as_deref(), Some("No"));
        assert_eq!(diffs[0].after.as_deref(), Some("Yes"));
    }

    #[test]
    fn test_primitive_array_comma_joined() {
        let prev = json!({"changed": []});
        let new = json!({"changed": ["thickness", "note"]});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs[0].after.as_deref(), Some("thickness, note"));
    }

    #[test]
    fn test_object_array_extracts_cut_name() {
        let prev = json!({"removed_cuts": []});
        let new = json!({"removed_cuts": [
            {"cut_id": "ribeye", "cut_name": "Ribeye Steak", "reason": "out of stock"},
            {"cut_id": "flank_steak", "cut_name": "Flank Steak", "reason": "short"}
        ]});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs[0].after.as_deref(), Some("Ribeye Steak, Flank Steak"));
    }

    #[test]
    fn test_object_array_falls_back_to_dump() {
        let new = json!({"rows": [{"qty": 2}]});
        let diffs = diff_states(None, &new);
        assert_eq!(diffs[0].after.as_deref(), Some(r#"{"qty":2}"#));
    }

    #[test]
    fn test_nested_object_renders_label_pairs() {
        let new = json!({"organs": {"heart": true, "liver": false, "tongue": null}});
        let diffs = diff_states(None, &new);
        assert_eq!(diffs[0].after.as_deref(), Some("Heart: Yes, Liver: No"));
    }

    #[test]
    fn test_all_null_object_renders_empty() {
        let prev = json!({"organs": {"heart": true}});
        let new = json!({"organs": {"heart": null}});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs[0].after.as_deref(), Some("Empty"));
    }

    #[test]
    fn test_known_labels_and_fallback() {
        assert_eq!(field_label("hanging_weight_lbs"), "Hanging Weight (lbs)");
        assert_eq!(field_label("soup_bones"), "Soup Bones");
        assert_eq!(field_label("x"), "X");
    }

    #[test]
    fn test_null_renders_as_absence() {
        let prev = json!({"processor_notes": "old"});
        let new = json!({"processor_notes": null});
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs[0].before.as_deref(), Some("old"));
        assert_eq!(diffs[0].after, None);
    }

    #[test]
    fn test_non_object_snapshots_do_not_panic() {
        let prev = json!("weird");
        let new = json!(42);
        let diffs = diff_states(Some(&prev), &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "value");

        assert!(diff_states(Some(&json!(7)), &json!(7)).is_empty());
    }

    #[test]
    fn test_key_order_insensitive_object_equality() {
        let prev = json!({"mod": {"thickness": "1in", "pieces_per_package": 2}});
        let new = json!({"mod": {"pieces_per_package": 2, "thickness": "1in"}});
        assert!(diff_states(Some(&prev), &new).is_empty());
    }
}
