//! Edit page for an existing recipe.
//!
//! Each section saves on its own. A save never re-sends another section
//! and never rolls back local edits when it fails; structural changes
//! (new/deleted steps, photos) are followed by a full reload.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::dto::{CreateStepPayload, IngredientLine, UpdateRecipePayload, UpdateStepPayload};
use crate::api::ApiResult;
use crate::composer::ComposerField;
use crate::composition::{apply_recipe_field, validate_basics, RecipeField};
use crate::model::{
    parse_minutes, parse_quantity, parse_step_minutes, renumber, Category, Difficulty,
    IngredientId, PhotoId, PhotoRef, QuantifiedIngredient, Recipe, RecipeId, Step, StepId,
    ValidationError,
};
use crate::photos::PendingPhoto;
use crate::units::MeasurementUnit;
use crate::{AppError, DEFAULT_STEP_DURATION_MIN};

pub const NEW_STEP_DESCRIPTION: &str = "Περιγραφή...";
pub const STEP_PHOTO_DESCRIPTION: &str = "Φωτογραφία βήματος";
pub const LOAD_FAILED_MESSAGE: &str = "Απέτυχε η φόρτωση της συνταγής.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhotoTarget {
    Recipe,
    Step(StepId),
}

/// The independent save operations of the edit page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOperation {
    SaveBasicInfo,
    SaveIngredients,
    AddStep,
    SaveStep(StepId),
    DeleteStep(StepId),
    UploadPhotos,
    DeletePhoto(PhotoId),
}

impl EditOperation {
    #[must_use]
    pub fn success_message(self, session: &EditSession) -> String {
        match self {
            Self::SaveBasicInfo => "✅ Τα βασικά στοιχεία αποθηκεύτηκαν!".into(),
            Self::SaveIngredients => "✅ Η λίστα υλικών ενημερώθηκε!".into(),
            Self::AddStep => "Νέο βήμα δημιουργήθηκε!".into(),
            Self::SaveStep(id) => match session.step(id) {
                Some(step) => format!("Το Βήμα \"{}\" ενημερώθηκε!", step.title),
                None => "Το βήμα ενημερώθηκε!".into(),
            },
            Self::DeleteStep(_) => "Το βήμα διαγράφηκε.".into(),
            Self::UploadPhotos => "📷 Η φωτογραφία ανέβηκε επιτυχώς!".into(),
            Self::DeletePhoto(_) => "🗑️ Η φωτογραφία διαγράφηκε.".into(),
        }
    }

    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::SaveBasicInfo => "❌ Σφάλμα κατά την αποθήκευση.",
            Self::SaveIngredients => "❌ Σφάλμα κατά την αποθήκευση υλικών.",
            Self::AddStep => "Σφάλμα δημιουργίας βήματος.",
            Self::SaveStep(_) => "Σφάλμα αποθήκευσης βήματος.",
            Self::DeleteStep(_) | Self::DeletePhoto(_) => "Σφάλμα διαγραφής.",
            Self::UploadPhotos => "Σφάλμα ανεβάσματος.",
        }
    }

    /// Whether a successful call is followed by a reload.
    #[must_use]
    pub const fn reloads(self) -> bool {
        !matches!(self, Self::SaveBasicInfo | Self::SaveIngredients)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditForm {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub total_duration: String,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    pub recipe_id: RecipeId,
    pub load: LoadState,
    pub form: EditForm,
    pub recipe_ingredients: Vec<QuantifiedIngredient>,
    pub steps: Vec<Step>,
    pub photos: Vec<PhotoRef>,
    /// Calls issued and not yet answered.
    pub in_flight: usize,
    uploads: VecDeque<(PhotoTarget, PendingPhoto)>,
    upload_failures: Vec<String>,
}

impl EditSession {
    #[must_use]
    pub fn new(recipe_id: RecipeId) -> Self {
        Self {
            recipe_id,
            load: LoadState::Loading,
            form: EditForm::default(),
            recipe_ingredients: Vec::new(),
            steps: Vec::new(),
            photos: Vec::new(),
            in_flight: 0,
            uploads: VecDeque::new(),
            upload_failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.load == LoadState::Ready
    }

    /// Applies a (re)load. Returns the error when it should be reported
    /// on top of the current view rather than replacing it.
    pub fn loaded(&mut self, result: ApiResult<Recipe>) -> Option<AppError> {
        match result {
            Ok(recipe) => {
                debug!(recipe_id = %recipe.id, steps = recipe.steps.len(), "edit session loaded");
                self.form = EditForm {
                    name: recipe.name,
                    description: recipe.description,
                    difficulty: recipe.difficulty,
                    category: recipe.category,
                    total_duration: recipe.total_duration.max(1).to_string(),
                };
                self.recipe_ingredients = recipe.recipe_ingredients;
                self.steps = recipe.steps;
                self.steps.sort_by_key(|s| s.step_order);
                renumber(&mut self.steps, |s| &mut s.step_order);
                self.photos = recipe.photos;
                self.load = LoadState::Ready;
                None
            }
            Err(e) if self.load == LoadState::Loading => {
                self.load = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
                debug!(error = %e, "edit session failed to load");
                None
            }
            Err(e) => Some(e),
        }
    }

    pub fn set_field(&mut self, field: RecipeField, value: &str) -> Result<(), ValidationError> {
        let form = &mut self.form;
        apply_recipe_field(
            field,
            value,
            &mut form.name,
            &mut form.description,
            &mut form.difficulty,
            &mut form.category,
            &mut form.total_duration,
        )
    }

    /// Scalar fields only; the ingredient list is saved separately.
    pub fn basic_info_payload(&self) -> Result<UpdateRecipePayload, ValidationError> {
        validate_basics(&self.form.name, &self.form.description)?;
        Ok(UpdateRecipePayload {
            name: Some(self.form.name.trim().to_string()),
            description: Some(self.form.description.trim().to_string()),
            difficulty: Some(self.form.difficulty),
            category: Some(self.form.category),
            total_duration: Some(parse_minutes(&self.form.total_duration, 1)),
            recipe_ingredients: None,
        })
    }

    #[must_use]
    pub fn ingredients_payload(&self) -> UpdateRecipePayload {
        UpdateRecipePayload {
            recipe_ingredients: Some(IngredientLine::from_refs(&self.recipe_ingredients)),
            ..UpdateRecipePayload::default()
        }
    }

    pub fn add_ingredient(&mut self, ingredient: QuantifiedIngredient) {
        self.recipe_ingredients.push(ingredient);
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<QuantifiedIngredient> {
        (index < self.recipe_ingredients.len()).then(|| self.recipe_ingredients.remove(index))
    }

    /// Placeholder step appended at the end of the list.
    #[must_use]
    pub fn new_step_payload(&self) -> CreateStepPayload {
        let order = u32::try_from(self.steps.len() + 1).unwrap_or(u32::MAX);
        CreateStepPayload {
            title: format!("Νέο Βήμα {order}"),
            description: NEW_STEP_DESCRIPTION.to_string(),
            step_order: order,
            duration: DEFAULT_STEP_DURATION_MIN,
            recipe_id: self.recipe_id,
            step_ingredients: Vec::new(),
        }
    }

    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Local edit of a step field. A rejected duration leaves the step as it was.
    pub fn set_step_field(
        &mut self,
        id: StepId,
        field: ComposerField,
        value: &str,
    ) -> Result<(), ValidationError> {
        let Some(step) = self.step_mut(id) else {
            debug!(%id, "edit for a step that is no longer listed");
            return Ok(());
        };
        match field {
            ComposerField::Title => step.title = value.to_string(),
            ComposerField::Description => step.description = value.to_string(),
            ComposerField::Duration => step.duration = parse_step_minutes(value)?,
        }
        Ok(())
    }

    /// Adds (or replaces) an ingredient of a step, picked from the recipe
    /// list. Local only until the step is saved.
    pub fn add_step_ingredient(
        &mut self,
        id: StepId,
        ingredient_id: IngredientId,
        quantity: &str,
        unit: MeasurementUnit,
    ) -> Result<(), ValidationError> {
        let source = self
            .recipe_ingredients
            .iter()
            .find(|r| r.ingredient_id == Some(ingredient_id))
            .cloned()
            .ok_or(ValidationError::UnknownIngredient)?;
        let quantity = parse_quantity(quantity).ok_or(ValidationError::IncompleteIngredient)?;
        let step = self.step_mut(id).ok_or(ValidationError::UnknownIngredient)?;

        let entry = QuantifiedIngredient::new(ingredient_id, source.name, quantity, unit);
        match step
            .step_ingredients
            .iter_mut()
            .find(|r| r.ingredient_id == Some(ingredient_id))
        {
            Some(existing) => {
                existing.quantity = entry.quantity;
                existing.measurement_unit = entry.measurement_unit;
            }
            None => step.step_ingredients.push(entry),
        }
        Ok(())
    }

    pub fn remove_step_ingredient(
        &mut self,
        id: StepId,
        index: usize,
    ) -> Option<QuantifiedIngredient> {
        let step = self.step_mut(id)?;
        (index < step.step_ingredients.len()).then(|| step.step_ingredients.remove(index))
    }

    #[must_use]
    pub fn step_payload(&self, id: StepId) -> Option<UpdateStepPayload> {
        self.step(id)
            .map(|step| UpdateStepPayload::from_step(step, self.recipe_id))
    }

    /// Drops a deleted step locally so the list stays contiguous until the
    /// reload lands.
    pub fn forget_step(&mut self, id: StepId) {
        self.steps.retain(|s| s.id != id);
        renumber(&mut self.steps, |s| &mut s.step_order);
    }

    pub fn forget_photo(&mut self, id: PhotoId) {
        self.photos.retain(|p| p.id != id);
        for step in &mut self.steps {
            step.photos.retain(|p| p.id != id);
        }
    }

    pub fn queue_uploads(&mut self, target: PhotoTarget, photos: Vec<PendingPhoto>) {
        info!(?target, count = photos.len(), "photo uploads queued");
        self.uploads
            .extend(photos.into_iter().map(|photo| (target, photo)));
    }

    #[must_use]
    pub fn is_uploading(&self) -> bool {
        !self.uploads.is_empty()
    }

    #[must_use]
    pub fn current_upload(&self) -> Option<&(PhotoTarget, PendingPhoto)> {
        self.uploads.front()
    }

    /// Pops the finished upload. Returns the failures of the batch once the
    /// queue has drained.
    pub fn upload_finished(&mut self, result: ApiResult<()>) -> Option<Vec<String>> {
        if let Some((_, photo)) = self.uploads.pop_front() {
            if let Err(e) = result {
                debug!(error = %e, file = %photo.file_name, "edit upload failed");
                self.upload_failures.push(photo.file_name);
            }
        }
        self.uploads
            .is_empty()
            .then(|| std::mem::take(&mut self.upload_failures))
    }

    /// Preview URLs of photos still waiting in the upload queue.
    #[must_use]
    pub fn preview_urls(&self) -> Vec<String> {
        self.uploads
            .iter()
            .filter_map(|(_, p)| p.preview_url.clone())
            .collect()
    }
}

#[must_use]
pub fn upload_description(target: PhotoTarget, photo: &PendingPhoto) -> String {
    match target {
        PhotoTarget::Step(_) if photo.description.trim().is_empty() => {
            STEP_PHOTO_DESCRIPTION.to_string()
        }
        _ => photo.description.clone(),
    }
}
