//! Create-recipe draft and the multi-call submission sequence.
//!
//! Submission is a chain of dependent backend calls: the recipe first,
//! then its photos, then each step followed by that step's photos. Only a
//! failed recipe creation stops the chain; every later failure is recorded
//! in the report and the chain moves on.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::dto::{CreateRecipePayload, CreateStepPayload, IngredientLine};
use crate::api::ApiResult;
use crate::composer::StepComposer;
use crate::model::{
    digits_only, parse_minutes, renumber, Category, Difficulty, DraftStep, LocalPhotoId,
    LocalStepId, QuantifiedIngredient, RecipeId, StepId, ValidationError,
};
use crate::photos::{stage_all, PendingPhoto, SelectedFile, StagedBatch};
use crate::{AppError, MAX_RECIPE_DESCRIPTION_CHARS, MAX_RECIPE_NAME_CHARS, MIN_RECIPE_NAME_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipeField {
    Name,
    Description,
    Difficulty,
    Category,
    TotalDuration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    /// Digits only, as typed.
    pub total_duration: String,
    pub recipe_ingredients: Vec<QuantifiedIngredient>,
    pub steps: Vec<DraftStep>,
    pub photos: Vec<PendingPhoto>,
}

impl Default for RecipeDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            difficulty: Difficulty::default(),
            category: Category::default(),
            total_duration: "1".to_string(),
            recipe_ingredients: Vec::new(),
            steps: Vec::new(),
            photos: Vec::new(),
        }
    }
}

/// Applies a scalar field edit shared by the create draft and the edit form.
pub(crate) fn apply_recipe_field(
    field: RecipeField,
    value: &str,
    name: &mut String,
    description: &mut String,
    difficulty: &mut Difficulty,
    category: &mut Category,
    total_duration: &mut String,
) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidChoice {
        value: value.to_string(),
    };
    match field {
        RecipeField::Name => *name = value.to_string(),
        RecipeField::Description => *description = value.to_string(),
        RecipeField::Difficulty => *difficulty = Difficulty::parse(value).ok_or_else(invalid)?,
        RecipeField::Category => *category = Category::parse(value).ok_or_else(invalid)?,
        RecipeField::TotalDuration => *total_duration = digits_only(value),
    }
    Ok(())
}

/// Name and description rules shared by create and edit.
pub(crate) fn validate_basics(name: &str, description: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let name_len = name.chars().count();
    if !(MIN_RECIPE_NAME_CHARS..=MAX_RECIPE_NAME_CHARS).contains(&name_len) {
        return Err(ValidationError::NameLength {
            min: MIN_RECIPE_NAME_CHARS,
            max: MAX_RECIPE_NAME_CHARS,
        });
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::MissingDescription);
    }
    if description.chars().count() > MAX_RECIPE_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_RECIPE_DESCRIPTION_CHARS,
        });
    }
    Ok(())
}

impl RecipeDraft {
    pub fn set_field(&mut self, field: RecipeField, value: &str) -> Result<(), ValidationError> {
        apply_recipe_field(
            field,
            value,
            &mut self.name,
            &mut self.description,
            &mut self.difficulty,
            &mut self.category,
            &mut self.total_duration,
        )
    }

    pub fn add_ingredient(&mut self, ingredient: QuantifiedIngredient) {
        self.recipe_ingredients.push(ingredient);
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<QuantifiedIngredient> {
        (index < self.recipe_ingredients.len()).then(|| self.recipe_ingredients.remove(index))
    }

    pub fn add_step(&mut self, step: DraftStep) {
        self.steps.push(step);
        renumber(&mut self.steps, |s| &mut s.step_order);
    }

    #[must_use]
    pub fn has_step(&self, local_id: LocalStepId) -> bool {
        self.steps.iter().any(|s| s.local_id == local_id)
    }

    pub fn remove_step(&mut self, local_id: LocalStepId) -> Option<DraftStep> {
        let index = self.steps.iter().position(|s| s.local_id == local_id)?;
        let removed = self.steps.remove(index);
        renumber(&mut self.steps, |s| &mut s.step_order);
        Some(removed)
    }

    pub fn add_photos(&mut self, files: Vec<SelectedFile>) -> StagedBatch {
        let mut batch = stage_all(files);
        self.photos.append(&mut batch.accepted);
        batch
    }

    pub fn remove_photo(&mut self, local_id: LocalPhotoId) -> Option<PendingPhoto> {
        let index = self.photos.iter().position(|p| p.local_id == local_id)?;
        Some(self.photos.remove(index))
    }

    pub fn set_photo_description(&mut self, local_id: LocalPhotoId, description: &str) -> bool {
        match self.photos.iter_mut().find(|p| p.local_id == local_id) {
            Some(photo) => {
                photo.set_description(description);
                true
            }
            None => false,
        }
    }

    /// First violated rule, in the order the form presents them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_basics(&self.name, &self.description)?;
        if self.recipe_ingredients.is_empty() {
            return Err(ValidationError::MissingIngredients);
        }
        if self.steps.is_empty() {
            return Err(ValidationError::MissingSteps);
        }
        Ok(())
    }

    #[must_use]
    pub fn payload(&self) -> CreateRecipePayload {
        CreateRecipePayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            difficulty: self.difficulty,
            category: self.category,
            total_duration: parse_minutes(&self.total_duration, 1),
            recipe_ingredients: IngredientLine::from_refs(&self.recipe_ingredients),
            steps: Vec::new(),
            photos: Vec::new(),
        }
    }

    /// Every preview still held by the draft, step photos included.
    #[must_use]
    pub fn preview_urls(&self) -> Vec<String> {
        self.photos
            .iter()
            .chain(self.steps.iter().flat_map(|s| s.pending_photos.iter()))
            .filter_map(|p| p.preview_url.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    pub recipe_id: Option<RecipeId>,
    pub steps_attempted: usize,
    pub steps_created: usize,
    pub photos_attempted: usize,
    pub photos_uploaded: usize,
    pub failures: Vec<String>,
}

impl SubmissionReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!(
            "Επιτυχία! Η συνταγή δημιουργήθηκε! Βήματα: {}/{}, φωτογραφίες: {}/{}.",
            self.steps_created, self.steps_attempted, self.photos_uploaded, self.photos_attempted
        );
        if !self.failures.is_empty() {
            text.push_str(&format!(" Προβλήματα: {}", self.failures.join("; ")));
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionPhase {
    CreatingRecipe,
    UploadingRecipePhoto(usize),
    CreatingStep(usize),
    UploadingStepPhoto { step: usize, photo: usize },
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    UploadRecipePhoto {
        recipe_id: RecipeId,
        photo: PendingPhoto,
    },
    CreateStep(CreateStepPayload),
    UploadStepPhoto {
        step_id: StepId,
        photo: PendingPhoto,
    },
    Finished(SubmissionReport),
}

#[derive(Debug, Clone)]
pub struct SubmissionRun {
    recipe_photos: Vec<PendingPhoto>,
    steps: Vec<DraftStep>,
    phase: SubmissionPhase,
    current_step_id: Option<StepId>,
    report: SubmissionReport,
}

impl SubmissionRun {
    /// Validates the draft and returns the run with the create-recipe
    /// payload to send first. A validation failure issues nothing.
    pub fn start(draft: &RecipeDraft) -> Result<(Self, CreateRecipePayload), ValidationError> {
        draft.validate()?;
        let photos_attempted = draft.photos.len()
            + draft.steps.iter().map(|s| s.pending_photos.len()).sum::<usize>();
        let run = Self {
            recipe_photos: draft.photos.clone(),
            steps: draft.steps.clone(),
            phase: SubmissionPhase::CreatingRecipe,
            current_step_id: None,
            report: SubmissionReport {
                steps_attempted: draft.steps.len(),
                photos_attempted,
                ..SubmissionReport::default()
            },
        };
        Ok((run, draft.payload()))
    }

    #[must_use]
    pub const fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    #[must_use]
    pub const fn report(&self) -> &SubmissionReport {
        &self.report
    }

    #[must_use]
    pub fn status_text(&self) -> String {
        match self.phase {
            SubmissionPhase::CreatingRecipe => "Δημιουργία συνταγής...".to_string(),
            SubmissionPhase::UploadingRecipePhoto(i) => format!(
                "Μεταφόρτωση φωτογραφίας {}/{}...",
                i + 1,
                self.recipe_photos.len()
            ),
            SubmissionPhase::CreatingStep(i)
            | SubmissionPhase::UploadingStepPhoto { step: i, .. } => {
                format!("Δημιουργία βήματος {}/{}...", i + 1, self.steps.len())
            }
            SubmissionPhase::Done => "Ολοκλήρωση...".to_string(),
        }
    }

    /// A failed recipe creation ends the run; the error is handed back.
    pub fn recipe_created(&mut self, result: ApiResult<RecipeId>) -> Result<(), AppError> {
        if self.phase != SubmissionPhase::CreatingRecipe {
            warn!(phase = ?self.phase, "recipe result outside its phase ignored");
            return Ok(());
        }
        match result {
            Ok(recipe_id) => {
                info!(%recipe_id, "recipe created");
                self.report.recipe_id = Some(recipe_id);
                self.phase = SubmissionPhase::UploadingRecipePhoto(0);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "recipe creation failed, submission stopped");
                self.phase = SubmissionPhase::Done;
                Err(e)
            }
        }
    }

    pub fn recipe_photo_uploaded(&mut self, result: ApiResult<()>) {
        let SubmissionPhase::UploadingRecipePhoto(index) = self.phase else {
            warn!(phase = ?self.phase, "recipe photo result outside its phase ignored");
            return;
        };
        let file = self.recipe_photos.get(index).map(|p| p.file_name.clone());
        self.record_photo(result, file.as_deref().unwrap_or_default());
        self.phase = SubmissionPhase::UploadingRecipePhoto(index + 1);
    }

    pub fn step_created(&mut self, result: ApiResult<StepId>) {
        let SubmissionPhase::CreatingStep(index) = self.phase else {
            warn!(phase = ?self.phase, "step result outside its phase ignored");
            return;
        };
        match result {
            Ok(step_id) => {
                info!(%step_id, step_order = index + 1, "step created");
                self.report.steps_created += 1;
                self.current_step_id = Some(step_id);
                self.phase = SubmissionPhase::UploadingStepPhoto { step: index, photo: 0 };
            }
            Err(e) => {
                warn!(error = %e, step_order = index + 1, "step creation failed");
                let skipped = self.steps.get(index).map_or(0, |s| s.pending_photos.len());
                let mut failure = format!("Αποτυχία δημιουργίας βήματος {}", index + 1);
                if skipped > 0 {
                    failure.push_str(&format!(" ({skipped} φωτογραφίες δεν ανέβηκαν)"));
                }
                self.report.failures.push(failure);
                self.current_step_id = None;
                self.phase = SubmissionPhase::CreatingStep(index + 1);
            }
        }
    }

    pub fn step_photo_uploaded(&mut self, result: ApiResult<()>) {
        let SubmissionPhase::UploadingStepPhoto { step, photo } = self.phase else {
            warn!(phase = ?self.phase, "step photo result outside its phase ignored");
            return;
        };
        let file = self
            .steps
            .get(step)
            .and_then(|s| s.pending_photos.get(photo))
            .map(|p| p.file_name.clone());
        self.record_photo(result, file.as_deref().unwrap_or_default());
        self.phase = SubmissionPhase::UploadingStepPhoto {
            step,
            photo: photo + 1,
        };
    }

    fn record_photo(&mut self, result: ApiResult<()>, file_name: &str) {
        match result {
            Ok(()) => self.report.photos_uploaded += 1,
            Err(e) => {
                warn!(error = %e, file = file_name, "photo upload failed");
                self.report
                    .failures
                    .push(format!("Αποτυχία μεταφόρτωσης φωτογραφίας {file_name}"));
            }
        }
    }

    /// Advances past exhausted lists and returns the next call to make.
    pub fn next_action(&mut self) -> Option<SubmitAction> {
        loop {
            match self.phase {
                SubmissionPhase::CreatingRecipe => return None,
                SubmissionPhase::UploadingRecipePhoto(index) => {
                    let recipe_id = self.report.recipe_id?;
                    match self.recipe_photos.get(index) {
                        Some(photo) => {
                            return Some(SubmitAction::UploadRecipePhoto {
                                recipe_id,
                                photo: photo.clone(),
                            })
                        }
                        None => self.phase = SubmissionPhase::CreatingStep(0),
                    }
                }
                SubmissionPhase::CreatingStep(index) => {
                    let recipe_id = self.report.recipe_id?;
                    match self.steps.get(index) {
                        Some(step) => {
                            return Some(SubmitAction::CreateStep(CreateStepPayload {
                                title: step.title.clone(),
                                description: step.description.clone(),
                                step_order: u32::try_from(index + 1).unwrap_or(u32::MAX),
                                duration: step.duration,
                                recipe_id,
                                step_ingredients: IngredientLine::from_refs(
                                    &step.step_ingredients,
                                ),
                            }))
                        }
                        None => self.phase = SubmissionPhase::Done,
                    }
                }
                SubmissionPhase::UploadingStepPhoto { step, photo } => {
                    let next = self
                        .steps
                        .get(step)
                        .and_then(|s| s.pending_photos.get(photo))
                        .zip(self.current_step_id);
                    match next {
                        Some((pending, step_id)) => {
                            return Some(SubmitAction::UploadStepPhoto {
                                step_id,
                                photo: pending.clone(),
                            })
                        }
                        None => self.phase = SubmissionPhase::CreatingStep(step + 1),
                    }
                }
                SubmissionPhase::Done => {
                    return Some(SubmitAction::Finished(self.report.clone()));
                }
            }
        }
    }
}

/// The create page: draft, step composer and the running submission.
#[derive(Debug, Default)]
pub struct Composition {
    pub draft: RecipeDraft,
    pub composer: StepComposer,
    pub submission: Option<SubmissionRun>,
    pub last_report: Option<SubmissionReport>,
}

impl Composition {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    /// Clears the draft and the composer, returning previews to release.
    pub fn reset(&mut self) -> Vec<String> {
        let mut previews = self.draft.preview_urls();
        previews.extend(self.composer.preview_urls().map(str::to_string));
        self.draft = RecipeDraft::default();
        self.composer = StepComposer::default();
        previews
    }
}
