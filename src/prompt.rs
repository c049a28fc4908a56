use crate::category::{OutfitCategory, MAX_ITEMS, MIN_ITEMS};
use crate::look::look_proposal_typedef;
use crate::schema::describe;
use crate::wardrobe::{ClothingItem, ItemsByType};

/// Heading that opens the wardrobe listing in the system prompt.
pub const WARDROBE_HEADING: &str = "## Available wardrobe";

/// Prompt pair sent to the generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptData {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Builds the text prompts for outfit generation. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(
        &self,
        items_by_type: &ItemsByType,
        forced_items: &[ClothingItem],
        not_liked_items: &[ClothingItem],
        forced_item_ids: &[i64],
        context: Option<&str>,
    ) -> PromptData {
        PromptData {
            system_prompt: self.system_prompt(items_by_type, forced_items, not_liked_items),
            user_prompt: self.user_prompt(forced_item_ids, context),
        }
    }

    pub fn system_prompt(
        &self,
        items_by_type: &ItemsByType,
        forced_items: &[ClothingItem],
        not_liked_items: &[ClothingItem],
    ) -> String {
        let labels = |category: OutfitCategory| category.type_labels().join(", ");
        let mut s = String::new();

        s.push_str("You are a fashion assistant that builds outfits from the user's wardrobe.\n\n");

        s.push_str("## Mandatory outfit structure\n\n");
        s.push_str("Option A, two-piece outfit:\n");
        s.push_str(&format!("- EXACTLY 1 top among: {}\n", labels(OutfitCategory::Top)));
        s.push_str(&format!("- EXACTLY 1 bottom among: {}\n", labels(OutfitCategory::Bottom)));
        push_optional_slots(&mut s);
        s.push_str("\nOption B, dress:\n");
        s.push_str(&format!(
            "- EXACTLY 1 of {} (replaces top and bottom)\n",
            labels(OutfitCategory::Dress)
        ));
        push_optional_slots(&mut s);

        s.push_str("\n## Absolute rules\n");
        s.push_str(
            "1. Never pick two items of the same category \
             (two tops, two bottoms, two pairs of shoes...).\n",
        );
        s.push_str("2. A dress is never combined with a top or a bottom.\n");
        s.push_str("3. Only use ids listed below, written as [ID n].\n");
        s.push_str("4. Colors and styles must go well together.\n");
        s.push_str(&format!(
            "5. The outfit has between {MIN_ITEMS} and {MAX_ITEMS} items.\n"
        ));
        if !forced_items.is_empty() {
            s.push_str("6. Every imposed item listed below MUST be part of the outfit.\n");
        }

        s.push('\n');
        s.push_str(WARDROBE_HEADING);
        s.push('\n');
        for (type_label, items) in items_by_type.iter() {
            s.push_str(&format!("### {type_label} ({} options)\n", items.len()));
            for item in items {
                s.push_str(&format!(
                    "- [ID {}]: {} | color: {} | season: {} | formality: {}\n",
                    item.id_item, item.name, item.main_color, item.season, item.formality
                ));
            }
        }

        if !forced_items.is_empty() {
            s.push_str("\n## Imposed items (mandatory)\n");
            s.push_str("The user asked for these items to be part of the outfit:\n");
            push_item_summaries(&mut s, forced_items);
            s.push_str("Build the rest of the outfit around them.\n");
        }

        if !not_liked_items.is_empty() {
            s.push_str("\n## Disliked items\n");
            s.push_str("The user does not like these items and would rather not wear them:\n");
            push_item_summaries(&mut s, not_liked_items);
            s.push_str("Avoid them in the outfit.\n");
        }

        s.push_str("\n## Response format\n");
        s.push_str("Answer with valid JSON only, no text before or after, matching:\n");
        s.push_str(&describe(&look_proposal_typedef(), 0));

        s
    }

    pub fn user_prompt(&self, forced_item_ids: &[i64], context: Option<&str>) -> String {
        let base = match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("Context requested by the user: \"{context}\". "),
            None => String::new(),
        };

        if forced_item_ids.is_empty() {
            return format!(
                "{base}Create a complete, coherent outfit with a single item per category."
            );
        }

        let ids: Vec<String> = forced_item_ids.iter().map(i64::to_string).collect();
        format!(
            "{base}Create a complete outfit that MUST include the imposed items (IDs: {}). \
             Build the rest of the outfit so it is consistent with these pieces.",
            ids.join(", ")
        )
    }
}

fn push_optional_slots(s: &mut String) {
    s.push_str(&format!(
        "- OPTIONAL: 1 piece of {}\n",
        OutfitCategory::Outerwear.type_labels().join(", ")
    ));
    s.push_str(&format!(
        "- OPTIONAL: 1 pair of {}\n",
        OutfitCategory::Shoes.type_labels().join(", ")
    ));
    s.push_str(&format!(
        "- OPTIONAL: {}\n",
        OutfitCategory::Accessories.type_labels().join(", ")
    ));
}

fn push_item_summaries(s: &mut String, items: &[ClothingItem]) {
    for item in items {
        s.push_str(&format!(
            "- [ID {}]: {} ({}) | color: {}\n",
            item.id_item, item.name, item.item_type, item.main_color
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wardrobe::test_item;

    fn wardrobe() -> Vec<ClothingItem> {
        vec![
            test_item(1, "Shirts"),
            test_item(2, "Trousers"),
            test_item(3, "Shirts"),
        ]
    }

    #[test]
    fn system_prompt_lists_wardrobe_by_type() {
        let by_type = ItemsByType::from_wardrobe(&wardrobe());
        let prompt = PromptBuilder.system_prompt(&by_type, &[], &[]);

        assert!(prompt.contains("### Shirts (2 options)"));
        assert!(prompt.contains("- [ID 3]: item 3 | color: black"));
        assert!(prompt.contains("between 2 and 6 items"));
        assert!(prompt.contains("idItem: integer"));
        assert!(!prompt.contains("Imposed items"));
        assert!(!prompt.contains("Disliked items"));
        let shirts = prompt.find("### Shirts").expect("shirts section");
        let trousers = prompt.find("### Trousers").expect("trousers section");
        assert!(shirts < trousers);
    }

    #[test]
    fn forced_and_disliked_sections_appear_when_present() {
        let wardrobe = wardrobe();
        let by_type = ItemsByType::from_wardrobe(&wardrobe);
        let prompt = PromptBuilder.system_prompt(&by_type, &wardrobe[..1], &wardrobe[2..]);

        assert!(prompt.contains("6. Every imposed item"));
        assert!(prompt.contains(
            "## Imposed items (mandatory)\n\
             The user asked for these items to be part of the outfit:\n\
             - [ID 1]: item 1 (Shirts)"
        ));
        assert!(prompt.contains("## Disliked items"));
        assert!(prompt.contains("- [ID 3]: item 3 (Shirts)"));
    }

    #[test]
    fn user_prompt_carries_context_and_forced_ids() {
        let prompt = PromptBuilder.user_prompt(&[4, 9], Some("wedding in June"));
        assert!(prompt.starts_with("Context requested by the user: \"wedding in June\". "));
        assert!(prompt.contains("(IDs: 4, 9)"));

        let prompt = PromptBuilder.user_prompt(&[], Some("   "));
        assert_eq!(
            prompt,
            "Create a complete, coherent outfit with a single item per category."
        );
    }
}
