//! Persisted record shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ascii::GlyphGrid;

/// One stored capture.
///
/// The identifier is the key the record lives under; it is not part of the
/// persisted body. On disk a record is the flat mapping
/// `{owner_id, raw_image, order_number, date}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    #[serde(skip)]
    pub id: String,
    pub owner_id: String,
    /// Per-cell tokens, row by row
    #[serde(with = "row_map")]
    pub raw_image: Vec<Vec<String>>,
    pub order_number: u64,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

impl PhotoRecord {
    /// The stored grid, if its tokens are well-formed.
    pub fn grid(&self) -> Option<GlyphGrid> {
        GlyphGrid::from_tokens(&self.raw_image)
    }

    /// The stored grid as printable text, one line per row.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for row in &self.raw_image {
            for token in row {
                out.push_str(token);
            }
            out.push('\n');
        }
        out
    }
}

/// A partial update. `None` leaves a field untouched, `Some` replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub owner_id: Option<String>,
    pub raw_image: Option<Vec<Vec<String>>>,
}

impl RecordUpdate {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() && self.raw_image.is_none()
    }

    /// Names of the persisted fields this update touches.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.owner_id.is_some() {
            paths.push("owner_id");
        }
        if self.raw_image.is_some() {
            paths.push("raw_image");
        }
        paths
    }

    pub fn apply(&self, record: &mut PhotoRecord) {
        if let Some(owner_id) = &self.owner_id {
            record.owner_id = owner_id.clone();
        }
        if let Some(raw_image) = &self.raw_image {
            record.raw_image = raw_image.clone();
        }
    }
}

/// Sort records the way listings present them: insertion order, then id.
pub fn sort_records(records: &mut [PhotoRecord]) {
    records.sort_by(|a, b| {
        a.order_number
            .cmp(&b.order_number)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Rows persisted as a mapping from row index ("0", "1", ...) to tokens.
///
/// Decoding orders rows by numeric index, so "10" comes after "9".
pub mod row_map {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(rows: &[Vec<String>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(rows.len()))?;
        for (i, row) in rows.iter().enumerate() {
            map.serialize_entry(&i.to_string(), row)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error> {
        let raw: HashMap<String, Vec<String>> = HashMap::deserialize(deserializer)?;
        let mut indexed = raw
            .into_iter()
            .map(|(key, row)| {
                key.parse::<usize>()
                    .map(|i| (i, row))
                    .map_err(|_| D::Error::custom(format!("row key '{}' is not an index", key)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.sort_by_key(|(i, _)| *i);
        Ok(indexed.into_iter().map(|(_, row)| row).collect())
    }
}
