use serde::{Deserialize, Serialize};

/// A service catalog item as exposed by the record store.
///
/// Immutable from the engine's perspective; the record store owns the
/// lifecycle. `price` is carried as an opaque string because the upstream
/// table stores it as display text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Record identifier.
    pub sys_id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Owning category identifier, if assigned.
    #[serde(default)]
    pub category: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub price: Option<String>,
    /// Display order within the category.
    #[serde(default)]
    pub order: Option<i64>,
}

impl CatalogItem {
    /// Trimmed short description, `None` when missing or blank.
    pub fn short_description_text(&self) -> Option<&str> {
        self.short_description.as_deref().map(str::trim).filter(|text| !text.is_empty())
    }
}

/// A catalog category. Categories form a tree through `parent`; a root
/// category has no parent. The tree is not trusted to be well-formed: parent
/// references may dangle or cycle, and the structure analyzer walks them with
/// an explicit guard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogCategory {
    pub sys_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Parent category identifier; `None` marks a root.
    #[serde(default)]
    pub parent: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub order: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(short_description: Option<&str>) -> CatalogItem {
        CatalogItem {
            sys_id: "item_1".to_string(),
            name: "Laptop".to_string(),
            short_description: short_description.map(str::to_string),
            description: None,
            category: None,
            active: true,
            price: None,
            order: None,
        }
    }

    #[test]
    fn blank_short_description_reads_as_missing() {
        assert_eq!(item(None).short_description_text(), None);
        assert_eq!(item(Some("   ")).short_description_text(), None);
        assert_eq!(item(Some(" Standard laptop ")).short_description_text(), Some("Standard laptop"));
    }

    #[test]
    fn item_deserializes_with_optional_fields_absent() {
        let parsed: CatalogItem = serde_json::from_str(
            r#"{"sys_id":"item_2","name":"Monitor","active":true}"#,
        )
        .expect("minimal item should parse");
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.price, None);
    }
}
