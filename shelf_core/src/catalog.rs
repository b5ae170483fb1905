use serde::{Deserialize, Serialize};

/// Reserved cover reference for the synthetic "add new" slot.
pub const ADD_NEW_SENTINEL: &str = "__shelf_add_new__";

/// One game as the catalog store hands it to the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub title: String,
    #[serde(rename = "cover")]
    pub cover_image_ref: String,
}

pub fn is_add_new(reference: &str) -> bool {
    reference == ADD_NEW_SENTINEL
}

/// Cover references in catalog order with the add-new sentinel appended.
pub fn cover_sequence(entries: &[CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.cover_image_ref.clone())
        .chain(std::iter::once(ADD_NEW_SENTINEL.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ends_with_sentinel() {
        let entries = vec![
            CatalogEntry {
                id: 4,
                title: "Full Throttle".into(),
                cover_image_ref: "covers/ft.png".into(),
            },
            CatalogEntry {
                id: 9,
                title: "Loom".into(),
                cover_image_ref: "covers/loom.png".into(),
            },
        ];
        let sequence = cover_sequence(&entries);
        assert_eq!(sequence, ["covers/ft.png", "covers/loom.png", ADD_NEW_SENTINEL]);
        assert!(is_add_new(&sequence[2]));
        assert!(!is_add_new(&sequence[0]));
    }

    #[test]
    fn empty_catalog_still_has_placeholder() {
        assert_eq!(cover_sequence(&[]), [ADD_NEW_SENTINEL]);
    }

    #[test]
    fn entry_uses_cover_key() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{ "id": 1, "title": "Grim", "cover": "grim.png" }"#)
                .expect("parse entry");
        assert_eq!(entry.cover_image_ref, "grim.png");
    }
}
