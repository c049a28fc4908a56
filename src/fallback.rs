//! Rule-based outfit assembly used once every model attempt has failed.
//!
//! The assembler is a fold over an ordered list of filling rules. Each rule
//! receives the selection built so far and returns the next one; nothing is
//! mutated in place. Items are always the first available of their type, so
//! the result depends only on wardrobe order.

use crate::category::{category_of, CategoryUsage, OutfitCategory, MAX_ITEMS};
use crate::look::{GeneratedOutfit, ItemChoice};
use crate::wardrobe::{ClothingItem, ItemsByType};

pub const FORCED_REASON: &str = "imposed by user";
pub const TOP_REASON: &str = "top selected to complete the outfit";
pub const BOTTOM_REASON: &str = "bottom matched to the outfit";
pub const DRESS_REASONING: &str = "elegant outfit based on the imposed dress";
pub const FORCED_REASONING: &str = "outfit completed around the imposed items";
pub const CASUAL_REASONING: &str = "casual and versatile outfit";

/// Optional slots, in the order they are filled.
pub const OPTIONAL_SLOTS: [&str; 3] = ["Shoes", "Jackets & Coats", "Accessories"];

/// Inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct FallbackInput<'a> {
    pub items_by_type: &'a ItemsByType,
    pub forced_items: &'a [ClothingItem],
}

/// Selection state threaded through the rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub picks: Vec<(ClothingItem, String)>,
    pub categories_taken: CategoryUsage,
    /// Set once a rule has settled the outfit's reasoning; later rules are skipped.
    pub reasoning: Option<&'static str>,
}

impl Selection {
    fn with_pick(mut self, item: &ClothingItem, reason: impl Into<String>) -> Self {
        self.categories_taken = self.categories_taken.with_type(&item.item_type);
        self.picks.push((item.clone(), reason.into()));
        self
    }

    fn finished(mut self, reasoning: &'static str) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    fn is_finished(&self) -> bool {
        self.reasoning.is_some()
    }

    fn into_outfit(self) -> GeneratedOutfit {
        let general_reasoning = self.reasoning.unwrap_or(CASUAL_REASONING).to_string();
        let (selected_items, items) = self
            .picks
            .into_iter()
            .map(|(item, reason)| {
                let choice = ItemChoice::new(item.id_item, reason);
                (item, choice)
            })
            .unzip();

        GeneratedOutfit {
            items,
            selected_items,
            general_reasoning,
        }
    }
}

pub type FillRule = fn(Selection, &FallbackInput<'_>) -> Selection;

/// Filling rules, applied in order.
pub const RULES: [FillRule; 6] = [
    seed_forced,
    dress_shortcut,
    fill_top,
    fill_bottom,
    fill_optional_slots,
    conclude,
];

/// Build a minimal outfit around `forced_items` from the first available
/// item of each needed type.
///
/// The result is not re-validated: a wardrobe without tops or bottoms (and
/// no forced dress) yields an incomplete outfit.
pub fn assemble_fallback(
    items_by_type: &ItemsByType,
    forced_items: &[ClothingItem],
) -> GeneratedOutfit {
    let input = FallbackInput {
        items_by_type,
        forced_items,
    };

    RULES
        .iter()
        .fold(Selection::default(), |selection, rule| {
            if selection.is_finished() {
                selection
            } else {
                rule(selection, &input)
            }
        })
        .into_outfit()
}

pub fn seed_forced(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    input
        .forced_items
        .iter()
        .fold(selection, |selection, item| selection.with_pick(item, FORCED_REASON))
}

/// A forced dress only gets optional pieces added around it.
pub fn dress_shortcut(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    if !selection.categories_taken.is_taken(OutfitCategory::Dress) {
        return selection;
    }
    fill_optional_slots(selection, input).finished(DRESS_REASONING)
}

pub fn fill_top(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    fill_base(selection, input, OutfitCategory::Top, TOP_REASON)
}

pub fn fill_bottom(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    fill_base(selection, input, OutfitCategory::Bottom, BOTTOM_REASON)
}

fn fill_base(
    selection: Selection,
    input: &FallbackInput<'_>,
    category: OutfitCategory,
    reason: &str,
) -> Selection {
    if selection.categories_taken.is_taken(category) {
        return selection;
    }
    match input.items_by_type.first_among(category.type_labels()) {
        Some(item) => selection.with_pick(item, reason),
        None => selection,
    }
}

pub fn fill_optional_slots(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    OPTIONAL_SLOTS.iter().fold(selection, |selection, type_label| {
        if selection.picks.len() >= MAX_ITEMS {
            return selection;
        }
        let taken = category_of(type_label)
            .is_some_and(|category| selection.categories_taken.is_taken(category));
        if taken {
            return selection;
        }
        match input.items_by_type.first_of(type_label) {
            Some(item) => selection.with_pick(item, format!("{type_label} to complete the outfit")),
            None => selection,
        }
    })
}

pub fn conclude(selection: Selection, input: &FallbackInput<'_>) -> Selection {
    let reasoning = if input.forced_items.is_empty() {
        CASUAL_REASONING
    } else {
        FORCED_REASONING
    };
    selection.finished(reasoning)
}
