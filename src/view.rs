//! What the shell renders. Labels are resolved here so every shell shows
//! the same Greek text.

use serde::{Deserialize, Serialize};

use crate::api::{ApiConfig, Endpoint};
use crate::catalog::SearchFilters;
use crate::composition::SubmissionReport;
use crate::edit::LoadState;
use crate::model::{
    Category, Difficulty, DraftStep, Ingredient, IngredientId, LocalPhotoId, LocalStepId, Model,
    PhotoId, PhotoRef, QuantifiedIngredient, Recipe, RecipeId, Screen, Step, StepId,
};
use crate::photos::PendingPhoto;
use crate::units::MeasurementUnit;
use crate::{ToastKind, ToastMessage};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToastView {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            id: t.id,
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OptionView {
    pub token: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IngredientLineView {
    pub ingredient_id: Option<IngredientId>,
    pub name: String,
    pub quantity: String,
    pub unit: MeasurementUnit,
    pub unit_label: String,
    pub unit_short_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhotoView {
    pub id: PhotoId,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PendingPhotoView {
    pub local_id: LocalPhotoId,
    pub file_name: String,
    pub preview_url: Option<String>,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecipeCardView {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub difficulty_label: String,
    pub category_label: String,
    pub total_duration: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogView {
    pub recipes: Vec<RecipeCardView>,
    pub filters: SearchFilters,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StepSummaryView {
    pub id: StepId,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub ingredients: Vec<IngredientLineView>,
    pub photos: Vec<PhotoView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetailsView {
    pub recipe_id: RecipeId,
    pub loading: bool,
    pub error: Option<String>,
    pub name: String,
    pub description: String,
    pub difficulty_label: String,
    pub category_label: String,
    pub total_duration: u32,
    pub cover_url: Option<String>,
    pub gallery: Vec<PhotoView>,
    pub ingredients: Vec<IngredientLineView>,
    pub steps: Vec<StepSummaryView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PickerView {
    pub term: String,
    pub quantity: String,
    pub unit: MeasurementUnit,
    pub units: Vec<OptionView>,
    pub suggestions: Vec<Ingredient>,
    pub is_creating_new: bool,
    pub creating: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DraftStepView {
    pub local_id: LocalStepId,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub ingredients: Vec<IngredientLineView>,
    pub photos: Vec<PendingPhotoView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComposerView {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub ingredients: Vec<IngredientLineView>,
    pub photos: Vec<PendingPhotoView>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateView {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub total_duration: String,
    pub difficulties: Vec<OptionView>,
    pub categories: Vec<OptionView>,
    pub ingredients: Vec<IngredientLineView>,
    pub steps: Vec<DraftStepView>,
    pub photos: Vec<PendingPhotoView>,
    pub composer: ComposerView,
    pub is_submitting: bool,
    pub last_report: Option<SubmissionReport>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EditView {
    pub recipe_id: RecipeId,
    pub load: LoadState,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub total_duration: String,
    pub ingredients: Vec<IngredientLineView>,
    pub steps: Vec<StepSummaryView>,
    pub photos: Vec<PhotoView>,
    pub busy: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewerView {
    pub src: String,
    pub index: usize,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExecutionView {
    pub recipe_name: String,
    pub finished: bool,
    pub step_heading: String,
    pub step_description: String,
    pub duration_label: String,
    pub ingredients: Vec<IngredientLineView>,
    pub progress: f64,
    pub progress_label: String,
    pub is_first: bool,
    pub is_last: bool,
    pub next_label: String,
    pub photos: Vec<String>,
    pub viewer: Option<ViewerView>,
    pub finished_message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IngredientsView {
    pub items: Vec<Ingredient>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub screen: Screen,
    pub toast: Option<ToastView>,
    pub validation_error: Option<String>,
    pub status_message: Option<String>,
    pub catalog: CatalogView,
    pub ingredients: IngredientsView,
    pub details: Option<DetailsView>,
    pub picker: PickerView,
    pub create: CreateView,
    pub edit: Option<EditView>,
    pub execution: Option<ExecutionView>,
}

/// Shortest decimal form: `2` rather than `2.0`.
#[must_use]
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{quantity:.0}")
    } else {
        format!("{quantity}")
    }
}

fn ingredient_lines(refs: &[QuantifiedIngredient]) -> Vec<IngredientLineView> {
    refs.iter()
        .map(|r| IngredientLineView {
            ingredient_id: r.ingredient_id,
            name: r.name.clone(),
            quantity: format_quantity(r.quantity),
            unit: r.measurement_unit,
            unit_label: r.measurement_unit.label().to_string(),
            unit_short_label: r.measurement_unit.short_label().to_string(),
        })
        .collect()
}

fn photo_url(api: &ApiConfig, id: PhotoId) -> Option<String> {
    api.url(&Endpoint::PhotoImage(id)).ok().map(String::from)
}

fn photo_views(api: &ApiConfig, photos: &[PhotoRef]) -> Vec<PhotoView> {
    photos
        .iter()
        .filter_map(|p| {
            Some(PhotoView {
                id: p.id,
                url: photo_url(api, p.id)?,
                description: p.description.clone(),
            })
        })
        .collect()
}

fn pending_views(photos: &[PendingPhoto]) -> Vec<PendingPhotoView> {
    photos
        .iter()
        .map(|p| PendingPhotoView {
            local_id: p.local_id,
            file_name: p.file_name.clone(),
            preview_url: p.preview_url.clone(),
            description: p.description.clone(),
        })
        .collect()
}

fn step_summaries(api: &ApiConfig, steps: &[Step]) -> Vec<StepSummaryView> {
    steps
        .iter()
        .map(|s| StepSummaryView {
            id: s.id,
            order: s.step_order,
            title: s.title.clone(),
            description: s.description.clone(),
            duration: s.duration,
            ingredients: ingredient_lines(&s.step_ingredients),
            photos: photo_views(api, &s.photos),
        })
        .collect()
}

fn draft_steps(steps: &[DraftStep]) -> Vec<DraftStepView> {
    steps
        .iter()
        .map(|s| DraftStepView {
            local_id: s.local_id,
            order: s.step_order,
            title: s.title.clone(),
            description: s.description.clone(),
            duration: s.duration,
            ingredients: ingredient_lines(&s.step_ingredients),
            photos: pending_views(&s.pending_photos),
        })
        .collect()
}

fn card(recipe: &Recipe) -> RecipeCardView {
    RecipeCardView {
        id: recipe.id,
        name: recipe.name.clone(),
        description: recipe.description.clone(),
        difficulty_label: recipe.difficulty.label().to_string(),
        category_label: recipe.category.label().to_string(),
        total_duration: recipe.total_duration,
    }
}

fn options<T: Copy>(
    all: &[T],
    token: fn(T) -> &'static str,
    label: fn(T) -> &'static str,
) -> Vec<OptionView> {
    all.iter()
        .map(|v| OptionView {
            token: token(*v).to_string(),
            label: label(*v).to_string(),
        })
        .collect()
}

fn details_view(model: &Model) -> Option<DetailsView> {
    let details = model.details.as_ref()?;
    let recipe = details.recipe.clone().unwrap_or_default();
    Some(DetailsView {
        recipe_id: details.recipe_id,
        loading: details.recipe.is_none() && details.error.is_none(),
        error: details.error.clone(),
        name: recipe.name.clone(),
        description: recipe.description.clone(),
        difficulty_label: recipe.difficulty.label().to_string(),
        category_label: recipe.category.label().to_string(),
        total_duration: recipe.total_duration,
        cover_url: details.cover_photo.and_then(|id| photo_url(&model.api, id)),
        gallery: photo_views(&model.api, &details.gallery),
        ingredients: ingredient_lines(&recipe.recipe_ingredients),
        steps: step_summaries(&model.api, &recipe.steps),
    })
}

fn create_view(model: &Model) -> CreateView {
    let composition = &model.composition;
    let draft = &composition.draft;
    CreateView {
        name: draft.name.clone(),
        description: draft.description.clone(),
        difficulty: draft.difficulty,
        category: draft.category,
        total_duration: draft.total_duration.clone(),
        difficulties: options(&Difficulty::ALL, Difficulty::token, Difficulty::label),
        categories: options(&Category::ALL, Category::token, Category::label),
        ingredients: ingredient_lines(&draft.recipe_ingredients),
        steps: draft_steps(&draft.steps),
        photos: pending_views(&draft.photos),
        composer: ComposerView {
            title: composition.composer.title.clone(),
            description: composition.composer.description.clone(),
            duration: composition.composer.duration.clone(),
            ingredients: ingredient_lines(&composition.composer.step_ingredients),
            photos: pending_views(&composition.composer.pending_photos),
        },
        is_submitting: composition.is_submitting(),
        last_report: composition.last_report.clone(),
    }
}

fn edit_view(model: &Model) -> Option<EditView> {
    let session = model.edit.as_ref()?;
    Some(EditView {
        recipe_id: session.recipe_id,
        load: session.load.clone(),
        name: session.form.name.clone(),
        description: session.form.description.clone(),
        difficulty: session.form.difficulty,
        category: session.form.category,
        total_duration: session.form.total_duration.clone(),
        ingredients: ingredient_lines(&session.recipe_ingredients),
        steps: step_summaries(&model.api, &session.steps),
        photos: photo_views(&model.api, &session.photos),
        busy: session.in_flight > 0 || session.is_uploading(),
    })
}

fn execution_view(model: &Model) -> Option<ExecutionView> {
    let session = model.execution.as_ref()?;
    let progress = session.progress();
    let step = session.current_step();
    let index = session.current_index().unwrap_or(0);
    let is_last = index + 1 >= session.steps.len();

    Some(ExecutionView {
        recipe_name: session.recipe_name.clone(),
        finished: session.is_finished(),
        step_heading: step
            .map(|s| format!("{}. {}", s.step_order, s.title))
            .unwrap_or_default(),
        step_description: step.map(|s| s.description.clone()).unwrap_or_default(),
        duration_label: step
            .map(|s| format!("{} λεπτά", s.duration))
            .unwrap_or_default(),
        ingredients: step
            .map(|s| ingredient_lines(&s.step_ingredients))
            .unwrap_or_default(),
        progress,
        progress_label: format!("ΠΡΟΟΔΟΣ {progress:.0}%"),
        is_first: index == 0,
        is_last,
        next_label: if is_last { "Ολοκλήρωση" } else { "Επόμενο" }.to_string(),
        photos: session.viewer.sources().to_vec(),
        viewer: session.viewer.current().map(|src| ViewerView {
            src: src.to_string(),
            index: session.viewer.index().unwrap_or(0),
            count: session.viewer.sources().len(),
        }),
        finished_message: session.is_finished().then(|| {
            format!(
                "Συγχαρητήρια! Ολοκληρώσατε τη συνταγή «{}».",
                session.recipe_name
            )
        }),
    })
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    ViewModel {
        screen: model.screen,
        toast: model.active_toast.as_ref().map(ToastView::from),
        validation_error: model.validation_error.clone(),
        status_message: model.status_message.clone(),
        catalog: CatalogView {
            recipes: model.catalog.recipes.iter().map(card).collect(),
            filters: model.catalog.filters.clone(),
            loading: model.catalog.loading,
            error: model.catalog.error.clone(),
        },
        ingredients: IngredientsView {
            items: model.ingredients.items.clone(),
            loading: model.ingredients.loading,
            error: model.ingredients.error.clone(),
        },
        details: details_view(model),
        picker: PickerView {
            term: model.picker.term.clone(),
            quantity: model.picker.quantity.clone(),
            unit: model.picker.unit,
            units: options(
                &MeasurementUnit::ALL,
                MeasurementUnit::token,
                MeasurementUnit::label,
            ),
            suggestions: model.picker.results.clone(),
            is_creating_new: model.picker.is_creating_new,
            creating: model.picker.creating,
        },
        create: create_view(model),
        edit: edit_view(model),
        execution: execution_view(model),
    }
}
