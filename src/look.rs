use serde::{Deserialize, Serialize};

use crate::category::{MAX_ITEMS, MIN_ITEMS};
use crate::schema::{FieldDef, TypeDef};
use crate::wardrobe::ClothingItem;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One item of a look together with why it was picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemChoice {
    pub id_item: i64,
    pub reason: String,
}

impl ItemChoice {
    pub fn new(id_item: i64, reason: impl Into<String>) -> Self {
        Self {
            id_item,
            reason: reason.into(),
        }
    }
}

/// Structured output requested from the generative model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookProposal {
    pub items: Vec<ItemChoice>,
    pub general_reasoning: String,
}

impl LookProposal {
    /// Proposed item ids, in the order the model returned them.
    pub fn selected_ids(&self) -> Vec<i64> {
        self.items.iter().map(|choice| choice.id_item).collect()
    }
}

// TypeDef for LookProposal (for validation of LLM JSON)
pub fn look_proposal_typedef() -> TypeDef {
    TypeDef::Object(vec![
        FieldDef {
            name: "items",
            ty: TypeDef::BoundedList {
                item: Box::new(TypeDef::Object(vec![
                    FieldDef {
                        name: "idItem",
                        ty: TypeDef::Integer,
                    },
                    FieldDef {
                        name: "reason",
                        ty: TypeDef::Text,
                    },
                ])),
                min: MIN_ITEMS,
                max: MAX_ITEMS,
            },
        },
        FieldDef {
            name: "generalReasoning",
            ty: TypeDef::Text,
        },
    ])
}

/// Constraints for one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// Ids that must all appear in the final outfit.
    pub forced_item_ids: Vec<i64>,
    /// Ids the user would rather avoid. Advisory only.
    pub not_liked_item_ids: Vec<i64>,
    pub context: Option<String>,
    pub max_attempts: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            forced_item_ids: Vec::new(),
            not_liked_item_ids: Vec::new(),
            context: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// A finished outfit, whichever strategy built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutfit {
    pub items: Vec<ItemChoice>,
    pub selected_items: Vec<ClothingItem>,
    pub general_reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Ai,
    Fallback,
}

impl GenerationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMethod::Ai => "ai",
            GenerationMethod::Fallback => "fallback",
        }
    }
}

/// Result of the generator, tagged by the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// A model proposal that passed validation.
    Ai(GeneratedOutfit),
    /// Rule-based outfit built after every model attempt failed.
    Fallback(GeneratedOutfit),
}

impl Generation {
    pub fn method(&self) -> GenerationMethod {
        match self {
            Generation::Ai(_) => GenerationMethod::Ai,
            Generation::Fallback(_) => GenerationMethod::Fallback,
        }
    }

    pub fn outfit(&self) -> &GeneratedOutfit {
        match self {
            Generation::Ai(outfit) | Generation::Fallback(outfit) => outfit,
        }
    }

    pub fn into_outfit(self) -> GeneratedOutfit {
        match self {
            Generation::Ai(outfit) | Generation::Fallback(outfit) => outfit,
        }
    }
}

/// Wire request: a wardrobe snapshot plus per-request constraints.
///
/// `max_attempts` and `temperature` fall back to the runner's configured
/// defaults when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitRequest {
    pub wardrobe: Vec<ClothingItem>,
    #[serde(default)]
    pub forced_item_ids: Vec<i64>,
    #[serde(default)]
    pub not_liked_item_ids: Vec<i64>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl OutfitRequest {
    pub fn into_parts(
        self,
        defaults: &GenerationOptions,
    ) -> (Vec<ClothingItem>, GenerationOptions) {
        let options = GenerationOptions {
            forced_item_ids: self.forced_item_ids,
            not_liked_item_ids: self.not_liked_item_ids,
            context: self.context,
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        };
        (self.wardrobe, options)
    }
}

/// Selected item joined with its reason, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitViewItem {
    pub item: ClothingItem,
    pub reason: String,
    pub is_forced: bool,
}

/// Caller-facing shape of a generated outfit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutfitView {
    pub items: Vec<OutfitViewItem>,
    pub general_reasoning: String,
    pub generation_method: GenerationMethod,
    pub forced_items_count: usize,
}

impl OutfitView {
    pub fn new(generation: &Generation, forced_item_ids: &[i64]) -> Self {
        let outfit = generation.outfit();
        let items = outfit
            .items
            .iter()
            .filter_map(|choice| {
                let item = outfit
                    .selected_items
                    .iter()
                    .find(|item| item.id_item == choice.id_item)?;
                Some(OutfitViewItem {
                    item: item.clone(),
                    reason: choice.reason.clone(),
                    is_forced: forced_item_ids.contains(&choice.id_item),
                })
            })
            .collect();

        Self {
            items,
            general_reasoning: outfit.general_reasoning.clone(),
            generation_method: generation.method(),
            forced_items_count: forced_item_ids.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate;
    use crate::wardrobe::test_item;
    use serde_json::json;

    #[test]
    fn proposal_schema_bounds_item_count() {
        let one_item = json!({"items": [{"idItem": 1, "reason": "r"}], "generalReasoning": "g"});
        assert!(validate(&look_proposal_typedef(), &one_item).is_err());

        let two_items = json!({
            "items": [{"idItem": 1, "reason": "r"}, {"idItem": 2, "reason": "r"}],
            "generalReasoning": "g"
        });
        assert!(validate(&look_proposal_typedef(), &two_items).is_ok());

        let proposal: LookProposal = serde_json::from_value(two_items).expect("proposal");
        assert_eq!(proposal.selected_ids(), vec![1, 2]);
    }

    #[test]
    fn options_default_when_fields_are_missing() {
        let options: GenerationOptions =
            serde_json::from_value(json!({"forcedItemIds": [4]})).expect("options");
        assert_eq!(options.forced_item_ids, vec![4]);
        assert_eq!(options.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(options.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn request_overrides_only_what_it_sets() {
        let defaults = GenerationOptions {
            max_attempts: 5,
            temperature: 0.2,
            ..GenerationOptions::default()
        };
        let request = OutfitRequest {
            wardrobe: vec![test_item(1, "Shirts")],
            temperature: Some(0.9),
            ..OutfitRequest::default()
        };

        let (wardrobe, options) = request.into_parts(&defaults);
        assert_eq!(wardrobe.len(), 1);
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.temperature, 0.9);
    }

    #[test]
    fn view_joins_reasons_and_flags_forced_items() {
        let generation = Generation::Ai(GeneratedOutfit {
            items: vec![ItemChoice::new(1, "crisp"), ItemChoice::new(3, "relaxed")],
            selected_items: vec![test_item(1, "Shirts"), test_item(3, "Trousers")],
            general_reasoning: "smart casual".into(),
        });

        let view = OutfitView::new(&generation, &[3]);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].reason, "crisp");
        assert!(!view.items[0].is_forced);
        assert!(view.items[1].is_forced);
        assert_eq!(view.generation_method, GenerationMethod::Ai);
        assert_eq!(view.forced_items_count, 1);

        let json = serde_json::to_value(&view).expect("view json");
        assert_eq!(json["generationMethod"], "ai");
    }
}
