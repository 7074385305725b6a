//! Strict decoding of the paginated list envelope.
//!
//! ```json
//! {"first": 1, "prev": null, "next": 2, "last": 3, "pages": 3, "items": 5, "data": [...]}
//! ```
//!
//! Every key must be present. `prev` and `next` may be `null`; everything else
//! must be a non-negative integer (or, for `data`, an array of rows).

use serde_json::Map;
use serde_json::Value;

use super::Page;
use super::PaginationMetadata;
use crate::error::ApiError;
use crate::model::Row;

/// Decodes a list response body. `page_size` is the requested `_per_page`,
/// which the envelope does not echo.
pub(crate) fn decode_page(body: &str, page_size: u32) -> Result<Page, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::malformed_with_body(format!("invalid JSON: {}", e), body))?;

    let Value::Object(map) = value else {
        return Err(ApiError::malformed_with_body("expected a JSON object", body));
    };

    let field = |key: &str| -> Result<&Value, ApiError> {
        map.get(key)
            .ok_or_else(|| ApiError::malformed_with_body(format!("missing '{}'", key), body))
    };

    let first_page = page_number(field("first")?, "first", body)?;
    let last_page = page_number(field("last")?, "last", body)?;
    let prev_page = nullable_page_number(field("prev")?, "prev", body)?;
    let next_page = nullable_page_number(field("next")?, "next", body)?;
    let total_pages = page_number(field("pages")?, "pages", body)?;
    let total_items = field("items")?
        .as_u64()
        .ok_or_else(|| ApiError::malformed_with_body("'items' is not a count", body))?;

    let rows = decode_rows(&map, body)?;

    let current_page = match (prev_page, next_page) {
        (Some(prev), _) => prev + 1,
        (None, Some(next)) => next.saturating_sub(1).max(1),
        (None, None) => first_page,
    };

    Ok(Page::new(
        rows,
        PaginationMetadata {
            current_page,
            page_size,
            total_items,
            total_pages,
            next_page,
            prev_page,
            first_page,
            last_page,
        },
    ))
}

fn decode_rows(map: &Map<String, Value>, body: &str) -> Result<Vec<Row>, ApiError> {
    let Some(data) = map.get("data") else {
        return Err(ApiError::malformed_with_body("missing 'data'", body));
    };
    let Value::Array(items) = data else {
        return Err(ApiError::malformed_with_body("'data' is not an array", body));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Row::from_json(item.clone())
                .map_err(|e| ApiError::malformed_with_body(format!("data[{}]: {}", i, e), body))
        })
        .collect()
}

fn page_number(value: &Value, key: &str, body: &str) -> Result<u32, ApiError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ApiError::malformed_with_body(format!("'{}' is not a page number", key), body))
}

fn nullable_page_number(value: &Value, key: &str, body: &str) -> Result<Option<u32>, ApiError> {
    match value {
        Value::Null => Ok(None),
        other => page_number(other, key, body).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_ONE: &str = r#"{
        "first": 1, "prev": null, "next": 2, "last": 3, "pages": 3, "items": 5,
        "data": [{"id": "1", "name": "Andrew"}, {"id": "2", "name": "Hannah"}]
    }"#;

    #[test]
    fn test_decode_first_page() {
        let page = decode_page(PAGE_ONE, 2).unwrap();
        let meta = page.metadata();

        assert_eq!(page.len(), 2);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.page_size, 2);
        assert_eq!(meta.total_items, 5);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.next_page, Some(2));
        assert_eq!(meta.prev_page, None);
        assert!(meta.is_consistent());
    }

    #[test]
    fn test_current_page_derived_from_cursors() {
        let body = r#"{"first":1,"prev":2,"next":null,"last":3,"pages":3,"items":5,"data":[]}"#;
        assert_eq!(decode_page(body, 2).unwrap().metadata().current_page, 3);

        let body = r#"{"first":1,"prev":null,"next":null,"last":1,"pages":1,"items":1,"data":[]}"#;
        assert_eq!(decode_page(body, 2).unwrap().metadata().current_page, 1);
    }

    #[test]
    fn test_missing_metadata_is_malformed() {
        for key in ["first", "prev", "next", "last", "pages", "items", "data"] {
            let mut value: Value = serde_json::from_str(PAGE_ONE).unwrap();
            value.as_object_mut().unwrap().remove(key);
            let body = value.to_string();

            let err = decode_page(&body, 2).unwrap_err();
            assert!(err.is_malformed(), "removing '{}' should be malformed", key);
        }
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let body = r#"{"first":1,"prev":null,"next":2,"last":3,"pages":"3","items":5,"data":[]}"#;
        assert!(decode_page(body, 2).unwrap_err().is_malformed());

        let body = r#"{"first":1,"prev":null,"next":2,"last":3,"pages":3,"items":5,"data":[{"name":"x"}]}"#;
        assert!(decode_page(body, 2).unwrap_err().is_malformed());

        assert!(decode_page("[]", 2).unwrap_err().is_malformed());
        assert!(decode_page("not json", 2).unwrap_err().is_malformed());
    }
}
