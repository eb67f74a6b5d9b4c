use serde::{Deserialize, Serialize};

use crate::api::ApiResult;
use crate::capabilities::ConfirmPrompt;
use crate::catalog::SearchFilters;
use crate::composer::ComposerField;
use crate::composition::RecipeField;
use crate::edit::{EditOperation, PhotoTarget};
use crate::execution::ViewerKey;
use crate::model::{
    Ingredient, IngredientId, LineRef, LocalPhotoId, LocalStepId, PhotoId, PhotoRef, Recipe,
    RecipeId, StepId,
};
use crate::photos::SelectedFile;
use crate::picker::PickerTarget;
use crate::units::MeasurementUnit;

/// Destructive actions waiting on the user's answer.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveDraftIngredient(LineRef),
    RemoveDraftStep(LocalStepId),
    RemoveComposerIngredient(LineRef),
    RemoveEditIngredient(LineRef),
    RemoveStepIngredient { step_id: StepId, line: LineRef },
    DeleteStep(StepId),
    DeletePhoto(PhotoId),
    DeleteRecipe(RecipeId),
    DeleteIngredient(IngredientId),
}

impl ConfirmAction {
    #[must_use]
    pub fn prompt(self) -> ConfirmPrompt {
        const REMOVE_INGREDIENT: &str = "Είστε σίγουροι ότι θέλετε να διαγράψετε αυτό το υλικό;";
        match self {
            Self::RemoveDraftIngredient(_)
            | Self::RemoveComposerIngredient(_)
            | Self::RemoveEditIngredient(_)
            | Self::RemoveStepIngredient { .. }
            | Self::DeleteIngredient(_) => {
                ConfirmPrompt::new("Διαγραφή Υλικού", REMOVE_INGREDIENT)
                    .with_confirm_text("Διαγραφή")
            }
            Self::RemoveDraftStep(_) | Self::DeleteStep(_) => ConfirmPrompt::new(
                "Διαγραφή Βήματος",
                "Είστε σίγουροι ότι θέλετε να διαγράψετε αυτό το βήμα;",
            )
            .with_confirm_text("Διαγραφή"),
            Self::DeletePhoto(_) => ConfirmPrompt::new(
                "Διαγραφή φωτογραφίας",
                "Είστε σίγουροι ότι θέλετε να διαγράψετε αυτή τη φωτογραφία;",
            )
            .with_confirm_text("Διαγραφή"),
            Self::DeleteRecipe(_) => ConfirmPrompt::new(
                "Διαγραφή Συνταγής",
                "Είστε σίγουροι ότι θέλετε να διαγράψετε αυτή τη συνταγή;",
            )
            .with_confirm_text("Διαγραφή"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Configuration & navigation
    Configure {
        api_base_url: String,
    },
    OpenWelcome,
    OpenRecipeList,
    OpenIngredients,
    OpenCreateRecipe,
    CreateRecipeClosed,
    OpenRecipeDetails {
        recipe_id: RecipeId,
    },
    OpenEditRecipe {
        recipe_id: RecipeId,
    },
    ToastDismissed {
        id: u64,
    },
    ValidationDismissed,

    // Recipe list & details
    SearchChanged(SearchFilters),
    SearchReset,
    DeleteRecipeRequested {
        recipe_id: RecipeId,
    },
    DeleteIngredientRequested {
        ingredient_id: IngredientId,
    },

    // Ingredient picker
    PickerTermChanged(String),
    PickerSuggestionSelected(IngredientId),
    PickerQuantityChanged(String),
    PickerUnitChanged(MeasurementUnit),
    PickerConfirmed(PickerTarget),

    // Create draft
    DraftFieldChanged {
        field: RecipeField,
        value: String,
    },
    DraftIngredientRemoveRequested(usize),
    DraftStepRemoveRequested(LocalStepId),
    DraftPhotosSelected(Vec<SelectedFile>),
    DraftPhotoRemoved(LocalPhotoId),
    DraftPhotoDescriptionChanged {
        local_id: LocalPhotoId,
        description: String,
    },
    SubmitRequested,

    // Step composer
    ComposerFieldChanged {
        field: ComposerField,
        value: String,
    },
    ComposerIngredientAdded {
        ingredient_id: IngredientId,
        quantity: Option<String>,
        unit: Option<MeasurementUnit>,
    },
    ComposerIngredientRemoveRequested(usize),
    ComposerPhotosSelected(Vec<SelectedFile>),
    ComposerPhotoRemoved(LocalPhotoId),
    ComposerCommitted,

    // Edit
    EditFieldChanged {
        field: RecipeField,
        value: String,
    },
    SaveBasicInfoRequested,
    SaveIngredientListRequested,
    EditIngredientRemoveRequested(usize),
    AddStepRequested,
    EditStepFieldChanged {
        step_id: StepId,
        field: ComposerField,
        value: String,
    },
    EditStepIngredientAdded {
        step_id: StepId,
        ingredient_id: IngredientId,
        quantity: String,
        unit: MeasurementUnit,
    },
    EditStepIngredientRemoveRequested {
        step_id: StepId,
        index: usize,
    },
    SaveStepRequested(StepId),
    DeleteStepRequested(StepId),
    EditPhotosSelected {
        target: PhotoTarget,
        files: Vec<SelectedFile>,
    },
    DeletePhotoRequested(PhotoId),

    // Execution
    StartExecution,
    ExecutionNext,
    ExecutionPrevious,
    ExecutionCancelled,
    ExecutionClosed,
    ExecutionBackToMenu,
    ViewerOpened {
        src: String,
    },
    ViewerKeyPressed(ViewerKey),
    ViewerBackdropClicked,

    // Capability responses
    #[serde(skip)]
    ConfirmationAnswered {
        action: ConfirmAction,
        confirmed: bool,
    },
    #[serde(skip)]
    SearchDebounceElapsed {
        generation: u64,
    },
    #[serde(skip)]
    RecipesLoaded {
        generation: u64,
        result: ApiResult<Vec<Recipe>>,
    },
    #[serde(skip)]
    RecipeDetailsLoaded {
        recipe_id: RecipeId,
        result: ApiResult<Recipe>,
    },
    #[serde(skip)]
    GalleryLoaded {
        recipe_id: RecipeId,
        result: ApiResult<Vec<PhotoRef>>,
    },
    #[serde(skip)]
    CoverPhotoRecalled {
        recipe_id: RecipeId,
        photo_id: Option<PhotoId>,
    },
    #[serde(skip)]
    SessionCacheWritten,
    #[serde(skip)]
    RecipeDeleted {
        recipe_id: RecipeId,
        result: ApiResult<()>,
    },
    #[serde(skip)]
    IngredientsLoaded(ApiResult<Vec<Ingredient>>),
    #[serde(skip)]
    IngredientDeleted {
        ingredient_id: IngredientId,
        result: ApiResult<()>,
    },
    #[serde(skip)]
    PickerDebounceElapsed {
        generation: u64,
    },
    #[serde(skip)]
    PickerResults {
        generation: u64,
        result: ApiResult<Vec<Ingredient>>,
    },
    #[serde(skip)]
    PickerIngredientCreated {
        target: PickerTarget,
        quantity: f64,
        unit: MeasurementUnit,
        result: ApiResult<Ingredient>,
    },
    #[serde(skip)]
    RecipeCreated(ApiResult<RecipeId>),
    #[serde(skip)]
    RecipePhotoUploaded(ApiResult<()>),
    #[serde(skip)]
    StepCreated(ApiResult<StepId>),
    #[serde(skip)]
    StepPhotoUploaded(ApiResult<()>),
    #[serde(skip)]
    EditLoaded {
        recipe_id: RecipeId,
        result: ApiResult<Recipe>,
    },
    #[serde(skip)]
    EditSaved {
        operation: EditOperation,
        result: ApiResult<()>,
    },
    #[serde(skip)]
    EditPhotoUploaded(ApiResult<()>),
    #[serde(skip)]
    StepPhotosLoaded {
        generation: u64,
        result: ApiResult<Vec<PhotoRef>>,
    },
}
