use crate::error::GenerateError;
use crate::fallback::assemble_fallback;
use crate::llm::OutfitModel;
use crate::look::{GeneratedOutfit, Generation, GenerationOptions};
use crate::prompt::PromptBuilder;
use crate::validator::validate;
use crate::wardrobe::{find_item, ClothingItem, ItemsByType};

/// Builds outfits with a generative model, falling back to rules.
///
/// Attempts run one after another; each is a model call followed by a
/// validation pass. Model errors and invalid proposals both consume an
/// attempt. Once attempts run out, [`assemble_fallback`] produces the outfit,
/// so only caller errors are ever returned.
pub struct OutfitGenerator<M> {
    model: M,
    prompts: PromptBuilder,
}

impl<M: OutfitModel> OutfitGenerator<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            prompts: PromptBuilder,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn generate(
        &self,
        wardrobe: &[ClothingItem],
        options: &GenerationOptions,
    ) -> Result<Generation, GenerateError> {
        if wardrobe.is_empty() {
            return Err(GenerateError::EmptyWardrobe);
        }

        let forced_items = options
            .forced_item_ids
            .iter()
            .map(|&id| {
                find_item(wardrobe, id)
                    .cloned()
                    .ok_or(GenerateError::UnknownForcedItem { id })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let not_liked_items: Vec<ClothingItem> = options
            .not_liked_item_ids
            .iter()
            .filter_map(|&id| find_item(wardrobe, id).cloned())
            .collect();

        let items_by_type = ItemsByType::from_wardrobe(wardrobe);

        if let Some(outfit) = self
            .try_model(wardrobe, &items_by_type, &forced_items, &not_liked_items, options)
            .await
        {
            return Ok(Generation::Ai(outfit));
        }

        tracing::warn!(
            max_attempts = options.max_attempts,
            forced = forced_items.len(),
            "Model attempts exhausted, assembling fallback outfit"
        );
        Ok(Generation::Fallback(assemble_fallback(
            &items_by_type,
            &forced_items,
        )))
    }

    async fn try_model(
        &self,
        wardrobe: &[ClothingItem],
        items_by_type: &ItemsByType,
        forced_items: &[ClothingItem],
        not_liked_items: &[ClothingItem],
        options: &GenerationOptions,
    ) -> Option<GeneratedOutfit> {
        let max_attempts = options.max_attempts;
        let prompt = self.prompts.build(
            items_by_type,
            forced_items,
            not_liked_items,
            &options.forced_item_ids,
            options.context.as_deref(),
        );

        for attempt in 1..=max_attempts {
            let proposal = match self.model.propose_look(&prompt, options.temperature).await {
                Ok(proposal) => proposal,
                Err(e) => {
                    tracing::error!(attempt, max_attempts, error = %e, "Model call failed");
                    continue;
                }
            };

            let validation =
                validate(&proposal.selected_ids(), wardrobe, &options.forced_item_ids);
            if validation.is_valid {
                tracing::info!(
                    attempt,
                    max_attempts,
                    items = proposal.items.len(),
                    "Model outfit accepted"
                );
                return Some(GeneratedOutfit {
                    items: proposal.items,
                    selected_items: validation.selected_items,
                    general_reasoning: proposal.general_reasoning,
                });
            }

            tracing::warn!(
                attempt,
                max_attempts,
                errors = %validation.errors.join(", "),
                "Model outfit failed validation"
            );
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::look::{ItemChoice, LookProposal};
    use crate::prompt::PromptData;
    use crate::wardrobe::test_item;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt it receives and always fails.
    #[derive(Default)]
    struct Recording {
        prompts: Mutex<Vec<(PromptData, f32)>>,
    }

    #[async_trait]
    impl OutfitModel for Recording {
        async fn propose_look(
            &self,
            prompt: &PromptData,
            temperature: f32,
        ) -> Result<LookProposal, ModelError> {
            self.prompts.lock().unwrap().push((prompt.clone(), temperature));
            Err(ModelError::Schema("$.items missing".into()))
        }
    }

    fn wardrobe() -> Vec<ClothingItem> {
        vec![
            test_item(1, "Shirts"),
            test_item(2, "Trousers"),
            test_item(3, "Shoes"),
        ]
    }

    #[tokio::test]
    async fn unknown_forced_item_is_a_caller_error() {
        let generator = OutfitGenerator::new(Recording::default());
        let options = GenerationOptions {
            forced_item_ids: vec![1, 42],
            ..GenerationOptions::default()
        };

        let err = generator.generate(&wardrobe(), &options).await.unwrap_err();

        assert_eq!(err, GenerateError::UnknownForcedItem { id: 42 });
        assert!(generator.model().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_wardrobe_is_a_caller_error() {
        let generator = OutfitGenerator::new(Recording::default());
        let err = generator
            .generate(&[], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, GenerateError::EmptyWardrobe);
    }

    #[tokio::test]
    async fn same_prompt_and_temperature_are_used_for_every_attempt() {
        let generator = OutfitGenerator::new(Recording::default());
        let options = GenerationOptions {
            not_liked_item_ids: vec![3, 77],
            context: Some("rainy day".into()),
            temperature: 0.3,
            ..GenerationOptions::default()
        };

        let generation = generator.generate(&wardrobe(), &options).await.unwrap();
        assert_matches!(generation, Generation::Fallback(_));

        let prompts = generator.model().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|entry| *entry == prompts[0]));
        let (prompt, temperature) = &prompts[0];
        assert_eq!(*temperature, 0.3);
        assert!(prompt.user_prompt.contains("rainy day"));
        // Unknown disliked ids are dropped silently.
        assert!(prompt.system_prompt.contains("## Disliked items\n"));
        assert!(!prompt.system_prompt.contains("ID 77"));
    }

    #[tokio::test]
    async fn zero_attempts_goes_straight_to_fallback() {
        let generator = OutfitGenerator::new(Recording::default());
        let options = GenerationOptions {
            max_attempts: 0,
            ..GenerationOptions::default()
        };

        let generation = generator.generate(&wardrobe(), &options).await.unwrap();

        assert!(generator.model().prompts.lock().unwrap().is_empty());
        let outfit = generation.into_outfit();
        assert_eq!(
            outfit.items.first(),
            Some(&ItemChoice::new(1, crate::fallback::TOP_REASON))
        );
    }
}
