//! Dot-path resolution over decoded response bodies
//!
//! A capture expression is a dot-separated path. Each segment is either a
//! bare identifier (object key lookup) or a bracketed index `[n]` / `[-n]`
//! (array lookup, negative indices counting from the end).

use serde_json::Value;
use thiserror::Error;

/// Capture resolution errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A key is absent or an index is out of range
    #[error("path error: {0}")]
    Path(String),

    /// A segment targets the wrong kind of node
    #[error("type error: {0}")]
    Type(String),

    /// The expression itself is malformed
    #[error("invalid capture expression '{0}': {1}")]
    Expression(String, String),
}

/// One parsed path segment
enum Segment<'a> {
    Key(&'a str),
    Index(i64),
}

/// Resolve a dot-path expression against a decoded JSON value.
pub fn resolve_path<'a>(root: &'a Value, expression: &str) -> Result<&'a Value, CaptureError> {
    let mut node = root;
    for raw in expression.split('.') {
        node = match parse_segment(expression, raw)? {
            Segment::Key(key) => child_by_key(node, key)?,
            Segment::Index(index) => child_by_index(node, index)?,
        };
    }
    Ok(node)
}

fn parse_segment<'a>(expression: &str, raw: &'a str) -> Result<Segment<'a>, CaptureError> {
    if raw.is_empty() {
        return Err(CaptureError::Expression(
            expression.to_string(),
            "empty path segment".to_string(),
        ));
    }

    let Some(open) = raw.find('[') else {
        return Ok(Segment::Key(raw));
    };

    let close = raw.find(']').ok_or_else(|| {
        CaptureError::Expression(expression.to_string(), "unterminated index".to_string())
    })?;
    let index = raw[open + 1..close].parse::<i64>().map_err(|_| {
        CaptureError::Expression(
            expression.to_string(),
            format!("invalid index in segment '{}'", raw),
        )
    })?;

    Ok(Segment::Index(index))
}

fn child_by_key<'a>(parent: &'a Value, key: &str) -> Result<&'a Value, CaptureError> {
    let Value::Object(map) = parent else {
        return Err(CaptureError::Type(format!(
            "key '{}' applied to non-object value",
            key
        )));
    };

    map.get(key)
        .ok_or_else(|| CaptureError::Path(format!("key '{}' not found", key)))
}

fn child_by_index(parent: &Value, index: i64) -> Result<&Value, CaptureError> {
    let Value::Array(items) = parent else {
        return Err(CaptureError::Type(format!(
            "index {} applied to non-array value",
            index
        )));
    };

    let length = items.len() as i64;
    // Negative indices count from the end
    let effective = if index < 0 { length + index } else { index };
    if effective < 0 || effective >= length {
        return Err(CaptureError::Path(format!(
            "index {} out of range for array of length {}",
            index, length
        )));
    }

    Ok(&items[effective as usize])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_lookup() {
        let body = json!({"a": {"b": "v"}});
        assert_eq!(resolve_path(&body, "a.b").unwrap(), "v");
    }

    #[test]
    fn test_index_lookup() {
        let body = json!({"items": [10, 20, 30]});
        assert_eq!(resolve_path(&body, "items.[0]").unwrap(), 10);
        assert_eq!(resolve_path(&body, "items.[2]").unwrap(), 30);
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let body = json!({"items": [10, 20, 30]});
        assert_eq!(resolve_path(&body, "items.[-1]").unwrap(), 30);
        assert_eq!(resolve_path(&body, "items.[-3]").unwrap(), 10);
        assert!(matches!(
            resolve_path(&body, "items.[-4]"),
            Err(CaptureError::Path(_))
        ));
    }

    #[test]
    fn test_missing_key_is_path_error() {
        let body = json!({"a": 1});
        assert!(matches!(
            resolve_path(&body, "b"),
            Err(CaptureError::Path(_))
        ));
    }

    #[test]
    fn test_index_out_of_range_is_path_error() {
        let body = json!([1, 2]);
        assert!(matches!(
            resolve_path(&body, "a[5]"),
            Err(CaptureError::Path(_))
        ));
    }

    #[test]
    fn test_wrong_node_kind_is_type_error() {
        let body = json!({"a": 1});
        assert!(matches!(
            resolve_path(&body, "a.b"),
            Err(CaptureError::Type(_))
        ));
        assert!(matches!(
            resolve_path(&body, "[0]"),
            Err(CaptureError::Type(_))
        ));
    }

    #[test]
    fn test_typed_value_preserved() {
        let body = json!({"n": 42});
        let value = resolve_path(&body, "n").unwrap();
        assert!(value.is_number());
    }

    #[test]
    fn test_malformed_expression() {
        let body = json!([1]);
        assert!(matches!(
            resolve_path(&body, "[zero]"),
            Err(CaptureError::Expression(_, _))
        ));

        let nested = json!({"a": {"b": 1}});
        assert!(matches!(
            resolve_path(&nested, "a..b"),
            Err(CaptureError::Expression(_, _))
        ));
    }
}
