//! Archive entry lookup in upstream metadata documents
//!
//! Walks a parsed JSON document in pre-order (object keys in source order,
//! arrays by index) and returns the first object whose `file_type` is
//! `tar.gz` or `zip` and whose `url` is a string.

use std::collections::HashSet;
use std::ptr;

use serde::Serialize;
use serde_json::{Map, Value};

/// File types a direct request can resolve to
const ARCHIVE_FILE_TYPES: [&str; 2] = ["tar.gz", "zip"];

/// First archive entry found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMatch {
    pub url: String,
    /// Lower-cased `file_type` of the entry
    pub file_type: String,
    /// Location of the entry, e.g. `a.b[2].c`; `$` for the document root
    pub json_path: String,
}

/// Find the first archive entry in `root`.
///
/// Uses an explicit stack, so deeply nested documents cannot exhaust the
/// call stack. Containers already visited are skipped.
pub fn find_direct_match(root: &Value) -> Option<DirectMatch> {
    let mut stack: Vec<(&Value, String)> = vec![(root, String::new())];
    let mut visited: HashSet<*const Value> = HashSet::new();

    while let Some((node, path)) = stack.pop() {
        if !visited.insert(ptr::from_ref(node)) {
            continue;
        }

        match node {
            Value::Object(map) => {
                if let Some(found) = match_entry(map, &path) {
                    return Some(found);
                }
                // Reversed so the first key is popped first
                for (key, child) in map.iter().rev() {
                    if is_container(child) {
                        stack.push((child, key_path(&path, key)));
                    }
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate().rev() {
                    if is_container(child) {
                        stack.push((child, format!("{path}[{index}]")));
                    }
                }
            }
            _ => {}
        }
    }

    None
}

fn match_entry(map: &Map<String, Value>, path: &str) -> Option<DirectMatch> {
    let file_type = map.get("file_type")?.as_str()?.to_ascii_lowercase();
    if !ARCHIVE_FILE_TYPES.contains(&file_type.as_str()) {
        return None;
    }
    let url = map.get("url")?.as_str()?;

    Some(DirectMatch {
        url: url.to_string(),
        file_type,
        json_path: if path.is_empty() {
            "$".to_string()
        } else {
            path.to_string()
        },
    })
}

const fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
