use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::wardrobe::ClothingItem;

/// Fewest items a generated outfit may contain.
pub const MIN_ITEMS: usize = 2;
/// Most items a generated outfit may contain.
pub const MAX_ITEMS: usize = 6;

pub const TOPS: &[&str] = &[
    "T-shirts & Tops",
    "Sweatshirts & Hoodies",
    "Sweaters & Knitwear",
    "Shirts",
];
pub const BOTTOMS: &[&str] = &["Trousers", "Skirts", "Shorts"];
pub const DRESSES: &[&str] = &["Dresses"];
pub const OUTERWEAR: &[&str] = &["Jackets & Coats"];
pub const SHOES: &[&str] = &["Shoes"];
pub const ACCESSORIES: &[&str] = &["Accessories"];

/// Functional slot an item occupies in an outfit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitCategory {
    Top,
    Bottom,
    Dress,
    Outerwear,
    Shoes,
    Accessories,
}

/// The type-label partition, checked in this order.
static CATEGORY_TABLE: [(OutfitCategory, &[&str]); 6] = [
    (OutfitCategory::Top, TOPS),
    (OutfitCategory::Bottom, BOTTOMS),
    (OutfitCategory::Dress, DRESSES),
    (OutfitCategory::Outerwear, OUTERWEAR),
    (OutfitCategory::Shoes, SHOES),
    (OutfitCategory::Accessories, ACCESSORIES),
];

impl OutfitCategory {
    pub const ALL: [OutfitCategory; 6] = [
        OutfitCategory::Top,
        OutfitCategory::Bottom,
        OutfitCategory::Dress,
        OutfitCategory::Outerwear,
        OutfitCategory::Shoes,
        OutfitCategory::Accessories,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OutfitCategory::Top => "top",
            OutfitCategory::Bottom => "bottom",
            OutfitCategory::Dress => "dress",
            OutfitCategory::Outerwear => "outerwear",
            OutfitCategory::Shoes => "shoes",
            OutfitCategory::Accessories => "accessories",
        }
    }

    /// Type labels belonging to this category, in table order.
    pub fn type_labels(self) -> &'static [&'static str] {
        CATEGORY_TABLE
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, labels)| *labels)
            .unwrap_or(&[])
    }
}

impl fmt::Display for OutfitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a clothing-type label to its outfit category.
///
/// Returns `None` for labels outside the table; such items never count
/// towards category uniqueness or outfit structure.
pub fn category_of(type_label: &str) -> Option<OutfitCategory> {
    CATEGORY_TABLE
        .iter()
        .find(|(_, labels)| labels.contains(&type_label))
        .map(|(category, _)| *category)
}

/// Which categories a candidate outfit already occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub top: bool,
    pub bottom: bool,
    pub dress: bool,
    pub outerwear: bool,
    pub shoes: bool,
    pub accessories: bool,
}

impl CategoryUsage {
    pub fn is_taken(&self, category: OutfitCategory) -> bool {
        match category {
            OutfitCategory::Top => self.top,
            OutfitCategory::Bottom => self.bottom,
            OutfitCategory::Dress => self.dress,
            OutfitCategory::Outerwear => self.outerwear,
            OutfitCategory::Shoes => self.shoes,
            OutfitCategory::Accessories => self.accessories,
        }
    }

    pub fn mark(&mut self, category: OutfitCategory) {
        let slot = match category {
            OutfitCategory::Top => &mut self.top,
            OutfitCategory::Bottom => &mut self.bottom,
            OutfitCategory::Dress => &mut self.dress,
            OutfitCategory::Outerwear => &mut self.outerwear,
            OutfitCategory::Shoes => &mut self.shoes,
            OutfitCategory::Accessories => &mut self.accessories,
        };
        *slot = true;
    }

    /// Copy of `self` with `category` marked.
    pub fn with(mut self, category: OutfitCategory) -> Self {
        self.mark(category);
        self
    }

    /// Copy of `self` with the category of `type_label` marked, if it has one.
    pub fn with_type(self, type_label: &str) -> Self {
        match category_of(type_label) {
            Some(category) => self.with(category),
            None => self,
        }
    }
}

/// An outfit needs a top and a bottom, or a dress, and never a dress
/// together with either half of the two-piece base.
pub fn is_structurally_valid(usage: &CategoryUsage) -> bool {
    let has_base = (usage.top && usage.bottom) || usage.dress;
    let mixed = usage.dress && (usage.top || usage.bottom);
    has_base && !mixed
}

/// Bucket items by category, dropping unclassified ones.
pub fn group_by_category(items: &[ClothingItem]) -> BTreeMap<OutfitCategory, Vec<&ClothingItem>> {
    let mut grouped: BTreeMap<OutfitCategory, Vec<&ClothingItem>> =
        OutfitCategory::ALL.iter().map(|c| (*c, Vec::new())).collect();

    for item in items {
        if let Some(category) = category_of(&item.item_type) {
            grouped.entry(category).or_default().push(item);
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wardrobe::test_item;

    fn usage_from_bits(bits: u8) -> CategoryUsage {
        CategoryUsage {
            top: bits & 0b000001 != 0,
            bottom: bits & 0b000010 != 0,
            dress: bits & 0b000100 != 0,
            outerwear: bits & 0b001000 != 0,
            shoes: bits & 0b010000 != 0,
            accessories: bits & 0b100000 != 0,
        }
    }

    #[test]
    fn structural_validity_over_every_flag_combination() {
        for bits in 0u8..64 {
            let usage = usage_from_bits(bits);
            let two_piece = usage.top && usage.bottom && !usage.dress;
            let dress_only = usage.dress && !usage.top && !usage.bottom;
            assert_eq!(
                is_structurally_valid(&usage),
                two_piece || dress_only,
                "unexpected verdict for {usage:?}"
            );
        }
    }

    #[test]
    fn every_label_maps_to_its_own_bucket() {
        for category in OutfitCategory::ALL {
            for label in category.type_labels() {
                assert_eq!(category_of(label), Some(category), "label {label}");
            }
        }
    }

    #[test]
    fn buckets_do_not_overlap() {
        let mut seen = std::collections::HashSet::new();
        for category in OutfitCategory::ALL {
            for label in category.type_labels() {
                assert!(seen.insert(*label), "{label} appears in two buckets");
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn unknown_labels_have_no_category() {
        assert_eq!(category_of("Swimwear"), None);
        assert_eq!(category_of(""), None);
        // Lookup is case-sensitive.
        assert_eq!(category_of("shirts"), None);
    }

    #[test]
    fn category_of_is_deterministic() {
        for label in ["Shirts", "Dresses", "Swimwear"] {
            assert_eq!(category_of(label), category_of(label));
        }
    }

    #[test]
    fn with_type_ignores_unclassified_labels() {
        let usage = CategoryUsage::default().with_type("Swimwear");
        assert_eq!(usage, CategoryUsage::default());

        let usage = usage.with_type("Skirts");
        assert!(usage.bottom);
        assert!(usage.is_taken(OutfitCategory::Bottom));
        assert!(!usage.is_taken(OutfitCategory::Top));
    }

    #[test]
    fn group_by_category_keeps_wardrobe_order() {
        let items = vec![
            test_item(1, "Shirts"),
            test_item(2, "Swimwear"),
            test_item(3, "T-shirts & Tops"),
            test_item(4, "Shoes"),
        ];
        let grouped = group_by_category(&items);

        let tops: Vec<i64> = grouped[&OutfitCategory::Top].iter().map(|i| i.id_item).collect();
        assert_eq!(tops, vec![1, 3]);
        assert_eq!(grouped[&OutfitCategory::Shoes].len(), 1);
        assert!(grouped[&OutfitCategory::Dress].is_empty());
        assert_eq!(grouped.values().map(Vec::len).sum::<usize>(), 3);
    }
}
