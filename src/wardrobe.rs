use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::category::{group_by_category, OutfitCategory};

/// Snapshot of one item in a user's wardrobe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id_item: i64,
    pub id_user: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub formality: String,
    pub main_color: String,
    #[serde(default)]
    pub additional_colors: Option<Vec<String>>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Look up an item by id in a wardrobe snapshot.
pub fn find_item(wardrobe: &[ClothingItem], id: i64) -> Option<&ClothingItem> {
    wardrobe.iter().find(|item| item.id_item == id)
}

/// Wardrobe items grouped by type label.
///
/// Types appear in first-seen order and items keep their wardrobe order
/// within a type, so "first available" selections are reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsByType {
    groups: IndexMap<String, Vec<ClothingItem>>,
}

impl ItemsByType {
    pub fn from_wardrobe(wardrobe: &[ClothingItem]) -> Self {
        let mut groups: IndexMap<String, Vec<ClothingItem>> = IndexMap::new();
        for item in wardrobe {
            groups
                .entry(item.item_type.clone())
                .or_default()
                .push(item.clone());
        }
        Self { groups }
    }

    pub fn get(&self, type_label: &str) -> &[ClothingItem] {
        self.groups
            .get(type_label)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First item of `type_label`, if the wardrobe holds any.
    pub fn first_of(&self, type_label: &str) -> Option<&ClothingItem> {
        self.get(type_label).first()
    }

    /// First item across `type_labels`, scanning the labels in order.
    pub fn first_among(&self, type_labels: &[&str]) -> Option<&ClothingItem> {
        type_labels.iter().find_map(|label| self.first_of(label))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ClothingItem])> {
        self.groups
            .iter()
            .map(|(label, items)| (label.as_str(), items.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-category counts of a wardrobe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardrobeStats {
    pub total: usize,
    pub by_category: BTreeMap<OutfitCategory, usize>,
    pub unclassified: usize,
}

impl WardrobeStats {
    pub fn of(wardrobe: &[ClothingItem]) -> Self {
        let by_category: BTreeMap<OutfitCategory, usize> = group_by_category(wardrobe)
            .into_iter()
            .map(|(category, items)| (category, items.len()))
            .collect();
        let classified: usize = by_category.values().sum();

        Self {
            total: wardrobe.len(),
            by_category,
            unclassified: wardrobe.len() - classified,
        }
    }

    /// Whether any outfit base (top and bottom, or a dress) can be built.
    pub fn can_build_base(&self) -> bool {
        let count = |c: OutfitCategory| self.by_category.get(&c).copied().unwrap_or(0);
        (count(OutfitCategory::Top) > 0 && count(OutfitCategory::Bottom) > 0)
            || count(OutfitCategory::Dress) > 0
    }
}

#[cfg(test)]
pub(crate) fn test_item(id: i64, item_type: &str) -> ClothingItem {
    ClothingItem {
        id_item: id,
        id_user: 1,
        name: format!("item {id}"),
        description: String::new(),
        item_type: item_type.to_string(),
        season: "all".to_string(),
        formality: "casual".to_string(),
        main_color: "black".to_string(),
        additional_colors: None,
        brand: None,
        reference: None,
    }
}
