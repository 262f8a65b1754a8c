//! Keyset cursor codec.
//!
//! A cursor is the base64 of `strategy|sort_value|item_id|created_at_unix`.
//! Encoding is deterministic (same inputs, same token) and exactly
//! reversible: the sort value is formatted with Rust's shortest
//! round-trip float notation, so no precision is lost on decode.
//!
//! Decoding only checks structure. The token is tamper-evident, not
//! authenticated: a corrupted token fails with `InvalidCursor`, but
//! nothing stops a caller from forging a well-formed one (doing so only
//! repositions their own pagination).

use base64::{engine::general_purpose, Engine as _};
use uuid::Uuid;

use crate::error::{FeedQueryError, Result};
use crate::models::{Cursor, SortStrategy};

const FIELD_SEPARATOR: char = '|';
const FIELD_COUNT: usize = 4;

/// Serialize a sort position into an opaque token.
pub fn encode(
    strategy: SortStrategy,
    sort_value: f64,
    item_id: Uuid,
    created_at_unix: i64,
) -> String {
    let raw = format!(
        "{}{sep}{}{sep}{}{sep}{}",
        strategy.as_str(),
        sort_value,
        item_id,
        created_at_unix,
        sep = FIELD_SEPARATOR,
    );
    general_purpose::STANDARD.encode(raw)
}

/// Decode a caller-supplied token.
///
/// The empty string is the canonical "first page" value and decodes to
/// `None` without error. Anything else must be a structurally valid
/// token or the decode fails with `InvalidCursor`.
pub fn decode(token: &str) -> Result<Option<Cursor>> {
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = general_purpose::STANDARD
        .decode(token)
        .map_err(|_| FeedQueryError::InvalidCursor("not valid base64".into()))?;
    let raw = String::from_utf8(bytes)
        .map_err(|_| FeedQueryError::InvalidCursor("not valid utf-8".into()))?;

    let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
    if fields.len() != FIELD_COUNT {
        return Err(FeedQueryError::InvalidCursor(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    let sort_key: SortStrategy = fields[0]
        .parse()
        .map_err(|_| FeedQueryError::InvalidCursor(format!("unknown sort key '{}'", fields[0])))?;
    let sort_value: f64 = fields[1]
        .parse()
        .map_err(|_| FeedQueryError::InvalidCursor("non-numeric sort value".into()))?;
    let item_id = Uuid::parse_str(fields[2])
        .map_err(|_| FeedQueryError::InvalidCursor("malformed item id".into()))?;
    let created_at_unix: i64 = fields[3]
        .parse()
        .map_err(|_| FeedQueryError::InvalidCursor("non-numeric timestamp".into()))?;

    Ok(Some(Cursor {
        sort_key,
        sort_value,
        item_id,
        created_at_unix,
    }))
}
