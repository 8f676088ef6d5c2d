use anyhow::{Context, Result};
use serde::Deserialize;

/// One purchasable study-material entry as it appears in `material.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub label: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCategory {
    pub title: String,
    pub items: Vec<CatalogItem>,
}

/// A catalog item flattened together with its category and delivery link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: String,
    pub label: String,
    pub key: String,
    pub telegram_link: String,
}

/// Static, read-only material catalog. Loaded once at process start.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<CatalogCategory>,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_json(json: &str, material_bot: &str) -> Result<Self> {
        let categories: Vec<CatalogCategory> =
            serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        if categories.is_empty() {
            anyhow::bail!("Catalog is empty");
        }

        let entries = categories
            .iter()
            .flat_map(|cat| {
                cat.items.iter().map(|item| CatalogEntry {
                    category: cat.title.clone(),
                    label: item.label.clone(),
                    key: item.key.clone(),
                    telegram_link: telegram_link(material_bot, &item.key),
                })
            })
            .collect();

        Ok(Self { categories, entries })
    }

    pub fn load(path: &str, material_bot: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path))?;
        Self::from_json(&raw, material_bot)
    }

    pub fn categories(&self) -> &[CatalogCategory] {
        &self.categories
    }

    /// Items in catalog order, flattened across categories.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry_by_key(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

/// Deep link that grants access to a material once payment succeeds.
pub fn telegram_link(material_bot: &str, key: &str) -> String {
    format!("https://t.me/{}?start={}", material_bot, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"title": "Physics", "items": [
            {"label": "Physics MTG", "key": "phy_mtg"},
            {"label": "Physics Short Notes", "key": "phy_notes"}
        ]},
        {"title": "Biology", "items": [
            {"label": "Biology MTG", "key": "bio_mtg"}
        ]}
    ]"#;

    #[test]
    fn flattens_in_catalog_order() {
        let catalog = Catalog::from_json(SAMPLE, "Material_eduhubkmrbot").unwrap();
        let keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["phy_mtg", "phy_notes", "bio_mtg"]);
        assert_eq!(catalog.entries()[2].category, "Biology");
    }

    #[test]
    fn builds_delivery_links() {
        let catalog = Catalog::from_json(SAMPLE, "Material_eduhubkmrbot").unwrap();
        let entry = catalog.entry_by_key("bio_mtg").unwrap();
        assert_eq!(
            entry.telegram_link,
            "https://t.me/Material_eduhubkmrbot?start=bio_mtg"
        );
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(Catalog::from_json("[]", "bot").is_err());
        assert!(Catalog::from_json("not json", "bot").is_err());
    }
}
