use serde::{Deserialize, Serialize};

use crate::category::{category_of, is_structurally_valid, CategoryUsage};
use crate::wardrobe::{find_item, ClothingItem};

/// Outcome of checking one proposed outfit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Human-readable violations; empty iff `is_valid`.
    pub errors: Vec<String>,
    /// Resolved items in selection order; populated only on success.
    pub selected_items: Vec<ClothingItem>,
    /// Categories occupied when validation stopped.
    pub categories_used: CategoryUsage,
}

impl ValidationResult {
    fn failed(reason: String, categories_used: CategoryUsage) -> Self {
        Self {
            is_valid: false,
            errors: vec![reason],
            selected_items: Vec::new(),
            categories_used,
        }
    }
}

/// Check a proposed outfit against the wardrobe and the forced ids.
///
/// Checks run in order and stop at the first violation:
/// forced-item coverage, then per item existence and category uniqueness,
/// then the overall structure. Only the first offending id or duplicate is
/// reported.
pub fn validate(
    selected_ids: &[i64],
    wardrobe: &[ClothingItem],
    forced_ids: &[i64],
) -> ValidationResult {
    let mut usage = CategoryUsage::default();

    let missing: Vec<String> = forced_ids
        .iter()
        .filter(|id| !selected_ids.contains(*id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        return ValidationResult::failed(
            format!("missing forced items: {}", missing.join(", ")),
            usage,
        );
    }

    let mut selected_items = Vec::with_capacity(selected_ids.len());
    for &id in selected_ids {
        let Some(item) = find_item(wardrobe, id) else {
            return ValidationResult::failed(format!("invalid id: {id}"), usage);
        };

        if let Some(category) = category_of(&item.item_type) {
            if usage.is_taken(category) {
                return ValidationResult::failed(
                    format!("category already used: {category} ({})", item.item_type),
                    usage,
                );
            }
            usage.mark(category);
        }

        selected_items.push(item.clone());
    }

    if !is_structurally_valid(&usage) {
        let reason = if !usage.top && !usage.bottom && !usage.dress {
            "incomplete outfit (needs top+bottom or dress)"
        } else {
            "dress combined with top/bottom (invalid)"
        };
        return ValidationResult::failed(reason.to_string(), usage);
    }

    ValidationResult {
        is_valid: true,
        errors: Vec::new(),
        selected_items,
        categories_used: usage,
    }
}
