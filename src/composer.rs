//! Builder for one step of the create draft.

use serde::{Deserialize, Serialize};

use crate::model::{
    digits_only, parse_minutes, parse_quantity, DraftStep, IngredientId, LocalPhotoId,
    LocalStepId, QuantifiedIngredient, ValidationError,
};
use crate::photos::{stage_all, PendingPhoto, SelectedFile, StagedBatch};
use crate::units::MeasurementUnit;
use crate::DEFAULT_STEP_DURATION_MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComposerField {
    Title,
    Description,
    Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepComposer {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub step_ingredients: Vec<QuantifiedIngredient>,
    pub pending_photos: Vec<PendingPhoto>,
}

impl Default for StepComposer {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            duration: DEFAULT_STEP_DURATION_MIN.to_string(),
            step_ingredients: Vec::new(),
            pending_photos: Vec::new(),
        }
    }
}

#[must_use]
pub fn default_step_title(position: usize) -> String {
    format!("Βήμα {position}")
}

impl StepComposer {
    pub fn set_field(&mut self, field: ComposerField, value: &str) {
        match field {
            ComposerField::Title => self.title = value.to_string(),
            ComposerField::Description => self.description = value.to_string(),
            ComposerField::Duration => self.duration = digits_only(value),
        }
    }

    /// Adds an ingredient taken from the recipe-level list. Missing quantity
    /// or unit fall back to the recipe-level values.
    pub fn add_ingredient(
        &mut self,
        recipe_ingredients: &[QuantifiedIngredient],
        ingredient_id: IngredientId,
        quantity: Option<&str>,
        unit: Option<MeasurementUnit>,
    ) -> Result<(), ValidationError> {
        let source = recipe_ingredients
            .iter()
            .find(|r| r.ingredient_id == Some(ingredient_id))
            .ok_or(ValidationError::UnknownIngredient)?;

        let quantity = match quantity.map(str::trim).filter(|q| !q.is_empty()) {
            Some(raw) => parse_quantity(raw).ok_or(ValidationError::IncompleteIngredient)?,
            None => source.quantity,
        };

        let entry = QuantifiedIngredient {
            quantity,
            measurement_unit: unit.unwrap_or(source.measurement_unit),
            entry_id: None,
            ..source.clone()
        };

        match self
            .step_ingredients
            .iter_mut()
            .find(|r| r.ingredient_id == Some(ingredient_id))
        {
            Some(existing) => *existing = entry,
            None => self.step_ingredients.push(entry),
        }
        Ok(())
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<QuantifiedIngredient> {
        (index < self.step_ingredients.len()).then(|| self.step_ingredients.remove(index))
    }

    pub fn add_photos(&mut self, files: Vec<SelectedFile>) -> StagedBatch {
        let mut batch = stage_all(files);
        self.pending_photos.append(&mut batch.accepted);
        batch
    }

    pub fn remove_photo(&mut self, local_id: LocalPhotoId) -> Option<PendingPhoto> {
        let index = self.pending_photos.iter().position(|p| p.local_id == local_id)?;
        Some(self.pending_photos.remove(index))
    }

    /// Turns the composer into a draft step at position `existing + 1` and
    /// clears it. On a validation error nothing changes.
    pub fn commit(&mut self, existing: usize) -> Result<DraftStep, ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingStepDescription);
        }

        let position = existing + 1;
        let composer = std::mem::take(self);
        let title = match composer.title.trim() {
            "" => default_step_title(position),
            t => t.to_string(),
        };

        Ok(DraftStep {
            local_id: LocalStepId::generate(),
            title,
            description: composer.description.trim().to_string(),
            duration: parse_minutes(&composer.duration, 1),
            step_order: u32::try_from(position).unwrap_or(u32::MAX),
            step_ingredients: composer.step_ingredients,
            pending_photos: composer.pending_photos,
        })
    }

    /// Preview URLs still owned by the composer.
    pub fn preview_urls(&self) -> impl Iterator<Item = &str> {
        self.pending_photos.iter().filter_map(|p| p.preview_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_list() -> Vec<QuantifiedIngredient> {
        vec![QuantifiedIngredient::new(
            IngredientId::new(7),
            "Ντομάτα",
            4.0,
            MeasurementUnit::Pieces,
        )]
    }

    #[test]
    fn test_commit_requires_description() {
        let mut composer = StepComposer::default();
        composer.set_field(ComposerField::Title, "Κόψιμο");
        assert_eq!(composer.commit(0), Err(ValidationError::MissingStepDescription));
        assert_eq!(composer.title, "Κόψιμο");
    }

    #[test]
    fn test_commit_defaults_title_and_resets() {
        let mut composer = StepComposer::default();
        composer.set_field(ComposerField::Description, "Ανακατεύουμε");
        let step = composer.commit(2).unwrap();
        assert_eq!(step.title, "Βήμα 3");
        assert_eq!(step.step_order, 3);
        assert_eq!(step.duration, DEFAULT_STEP_DURATION_MIN);
        assert_eq!(composer, StepComposer::default());
    }

    #[test]
    fn test_duration_keeps_digits_only() {
        let mut composer = StepComposer::default();
        composer.set_field(ComposerField::Duration, "1a2");
        assert_eq!(composer.duration, "12");
    }

    #[test]
    fn test_ingredient_defaults_from_recipe_list() {
        let mut composer = StepComposer::default();
        composer
            .add_ingredient(&recipe_list(), IngredientId::new(7), None, None)
            .unwrap();
        assert_eq!(composer.step_ingredients[0].quantity, 4.0);

        composer
            .add_ingredient(
                &recipe_list(),
                IngredientId::new(7),
                Some("2"),
                Some(MeasurementUnit::Slices),
            )
            .unwrap();
        assert_eq!(composer.step_ingredients.len(), 1);
        assert_eq!(composer.step_ingredients[0].measurement_unit, MeasurementUnit::Slices);

        assert_eq!(
            composer.add_ingredient(&recipe_list(), IngredientId::new(99), None, None),
            Err(ValidationError::UnknownIngredient)
        );
    }

    #[test]
    fn test_remove_ingredient_out_of_range() {
        let mut composer = StepComposer::default();
        assert!(composer.remove_ingredient(0).is_none());
    }
}
