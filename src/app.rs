//! Event dispatch for the recipe book core.

use tracing::{debug, info, warn};
use url::Url;

use crate::api::dto::{CreateIngredientPayload, RawRecipe, RawStep};
use crate::api::multipart::MultipartBody;
use crate::api::{ApiConfig, ApiResult, Endpoint};
use crate::capabilities::http::{delete, get_json, post_json, post_multipart, put_json};
use crate::capabilities::kv::{recall_cover_photo, remember_cover_photo};
use crate::capabilities::Capabilities;
use crate::catalog::RecipeDetails;
use crate::composition::{SubmissionPhase, SubmissionReport, SubmissionRun, SubmitAction};
use crate::edit::{upload_description, EditOperation, EditSession, PhotoTarget};
use crate::event::{ConfirmAction, Event};
use crate::execution::{ExecutionSession, Transition};
use crate::model::{
    Ingredient, LineRef, Model, PhotoRef, QuantifiedIngredient, Recipe, RecipeId, Screen, StepId,
};
use crate::photos::{PendingPhoto, PhotoError, StagedBatch};
use crate::picker::{PickerSubmission, PickerTarget, SearchPlan};
use crate::view::{self, ViewModel};
use crate::{AppError, ToastKind, INGREDIENT_SEARCH_DEBOUNCE_MS, RECIPE_SEARCH_DEBOUNCE_MS};

pub const NO_STEPS_MESSAGE: &str = "Δεν υπάρχουν βήματα εκτέλεσης.";

#[derive(Default)]
pub struct App;

fn normalize_all(raw: Vec<RawRecipe>) -> Vec<Recipe> {
    raw.into_iter().map(RawRecipe::normalize).collect()
}

impl App {
    fn endpoint_url(model: &mut Model, endpoint: &Endpoint) -> Option<Url> {
        match model.api.url(endpoint) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, ?endpoint, "request URL could not be built");
                model.report_error("Σφάλμα διεύθυνσης διακομιστή.", &e);
                None
            }
        }
    }

    fn confirm(caps: &Capabilities, action: ConfirmAction) {
        caps.ui.confirm(action.prompt(), move |confirmed| {
            Event::ConfirmationAnswered { action, confirmed }
        });
    }

    /// Releases previews of rejected files and reports them in one toast.
    fn take_staged(
        model: &mut Model,
        caps: &Capabilities,
        batch: StagedBatch,
    ) -> Vec<PendingPhoto> {
        caps.ui.revoke_previews(batch.orphaned_previews);
        if !batch.rejected.is_empty() {
            let message = batch
                .rejected
                .iter()
                .map(PhotoError::user_message)
                .collect::<Vec<_>>()
                .join("\n");
            model.show_toast(message, ToastKind::Warning);
        }
        batch.accepted
    }

    /// Tears down the state owned by the screen being left.
    fn leave_screen(model: &mut Model, caps: &Capabilities) {
        match model.screen {
            Screen::CreateRecipe if !model.composition.is_submitting() => {
                caps.ui.revoke_previews(model.composition.reset());
                model.picker.reset();
            }
            Screen::EditRecipe => {
                if let Some(session) = model.edit.take() {
                    caps.ui.revoke_previews(session.preview_urls());
                }
                model.picker.reset();
            }
            Screen::Execution => model.execution = None,
            _ => {}
        }
        model.validation_error = None;
    }

    // Catalogue

    fn load_recipes(model: &mut Model, caps: &Capabilities, generation: u64, endpoint: &Endpoint) {
        let Some(url) = Self::endpoint_url(model, endpoint) else {
            model.catalog.loading = false;
            return;
        };
        get_json(&caps.http, &url, move |result: ApiResult<Vec<RawRecipe>>| {
            Event::RecipesLoaded {
                generation,
                result: result.map(normalize_all),
            }
        });
    }

    fn open_recipe_list(model: &mut Model, caps: &Capabilities) {
        model.screen = Screen::RecipeList;
        let (generation, endpoint) = model.catalog.begin_query();
        Self::load_recipes(model, caps, generation, &endpoint);
    }

    fn open_details(model: &mut Model, caps: &Capabilities, recipe_id: RecipeId) {
        model.screen = Screen::RecipeDetails;
        model.details = Some(RecipeDetails::new(recipe_id));

        recall_cover_photo(&caps.key_value, recipe_id, move |photo_id| {
            Event::CoverPhotoRecalled {
                recipe_id,
                photo_id,
            }
        });
        if let Some(url) = Self::endpoint_url(model, &Endpoint::Recipe(recipe_id)) {
            get_json(&caps.http, &url, move |result: ApiResult<RawRecipe>| {
                Event::RecipeDetailsLoaded {
                    recipe_id,
                    result: result.map(RawRecipe::normalize),
                }
            });
        }
        if let Some(url) = Self::endpoint_url(model, &Endpoint::PhotosByRecipe(recipe_id)) {
            get_json(&caps.http, &url, move |result: ApiResult<Vec<PhotoRef>>| {
                Event::GalleryLoaded { recipe_id, result }
            });
        }
    }

    fn load_ingredients(model: &mut Model, caps: &Capabilities) {
        model.ingredients.loading = true;
        if let Some(url) = Self::endpoint_url(model, &Endpoint::AllIngredients) {
            get_json(&caps.http, &url, Event::IngredientsLoaded);
        } else {
            model.ingredients.loading = false;
        }
    }

    // Picker

    fn emit_picked(model: &mut Model, target: PickerTarget, item: QuantifiedIngredient) {
        match target {
            PickerTarget::DraftRecipe => model.composition.draft.add_ingredient(item),
            PickerTarget::EditRecipe => match model.edit.as_mut() {
                Some(session) => session.add_ingredient(item),
                None => {
                    warn!("picked ingredient dropped, no recipe is being edited");
                    return;
                }
            },
        }
        model.picker.reset();
    }

    fn confirm_picker(model: &mut Model, caps: &Capabilities, target: PickerTarget) {
        if model.picker.creating {
            debug!("ingredient creation already running");
            return;
        }
        match model.picker.prepare() {
            Err(e) => model.show_toast(e.to_string(), ToastKind::Warning),
            Ok(PickerSubmission::Ready(item)) => Self::emit_picked(model, target, item),
            Ok(PickerSubmission::CreateNew {
                name,
                quantity,
                unit,
            }) => {
                let Some(url) = Self::endpoint_url(model, &Endpoint::CreateIngredient) else {
                    return;
                };
                info!(%name, "creating ingredient on the fly");
                let sent = post_json(
                    &caps.http,
                    &url,
                    &CreateIngredientPayload::auto(&name),
                    move |result: ApiResult<Ingredient>| Event::PickerIngredientCreated {
                        target,
                        quantity,
                        unit,
                        result,
                    },
                );
                match sent {
                    Ok(()) => model.picker.creating = true,
                    Err(e) => model.report_error("Σφάλμα δημιουργίας υλικού.", &e),
                }
            }
        }
    }

    // Submission

    fn submit(model: &mut Model, caps: &Capabilities) {
        if model.composition.is_submitting() {
            debug!("submit ignored, a submission is already running");
            return;
        }
        let (run, payload) = match SubmissionRun::start(&model.composition.draft) {
            Ok(started) => started,
            Err(e) => {
                debug!(error = %e, "submission blocked by validation");
                model.block_with(&e);
                return;
            }
        };
        let Some(url) = Self::endpoint_url(model, &Endpoint::CreateRecipe) else {
            return;
        };
        let sent = post_json(&caps.http, &url, &payload, |result: ApiResult<RawRecipe>| {
            Event::RecipeCreated(result.map(|raw| raw.id))
        });
        match sent {
            Ok(()) => {
                info!(name = %payload.name, "submission started");
                model.status_message = Some(run.status_text());
                model.composition.submission = Some(run);
            }
            Err(e) => model.report_error("Αποτυχία δημιουργίας συνταγής.", &e),
        }
    }

    fn issue_submit_action(
        api: &ApiConfig,
        caps: &Capabilities,
        action: SubmitAction,
    ) -> Result<(), AppError> {
        match action {
            SubmitAction::UploadRecipePhoto { recipe_id, photo } => {
                let url = api.url(&Endpoint::UploadRecipePhoto {
                    recipe_id,
                    description: photo.description.clone(),
                })?;
                post_multipart(
                    &caps.http,
                    &url,
                    MultipartBody::photo(&photo),
                    Event::RecipePhotoUploaded,
                );
                Ok(())
            }
            SubmitAction::CreateStep(payload) => {
                let url = api.url(&Endpoint::CreateStep)?;
                post_json(&caps.http, &url, &payload, |result: ApiResult<RawStep>| {
                    Event::StepCreated(result.map(|raw| raw.id))
                })
            }
            SubmitAction::UploadStepPhoto { step_id, photo } => {
                let url = api.url(&Endpoint::UploadStepPhoto {
                    step_id,
                    description: upload_description(PhotoTarget::Step(step_id), &photo),
                })?;
                post_multipart(
                    &caps.http,
                    &url,
                    MultipartBody::photo(&photo),
                    Event::StepPhotoUploaded,
                );
                Ok(())
            }
            SubmitAction::Finished(_) => Ok(()),
        }
    }

    /// Issues the next call of the running submission. A call that cannot
    /// even be sent is recorded as a failure of that item and the chain
    /// moves on.
    fn drive_submission(model: &mut Model, caps: &Capabilities) {
        loop {
            let Some(run) = model.composition.submission.as_mut() else {
                return;
            };
            let Some(action) = run.next_action() else {
                return;
            };
            if let SubmitAction::Finished(report) = action {
                Self::finish_submission(model, caps, report);
                return;
            }
            model.status_message = Some(run.status_text());

            let Err(e) = Self::issue_submit_action(&model.api, caps, action) else {
                return;
            };
            warn!(error = %e, "submission call could not be sent");
            let Some(run) = model.composition.submission.as_mut() else {
                return;
            };
            match run.phase() {
                SubmissionPhase::UploadingRecipePhoto(_) => run.recipe_photo_uploaded(Err(e)),
                SubmissionPhase::CreatingStep(_) => run.step_created(Err(e)),
                SubmissionPhase::UploadingStepPhoto { .. } => run.step_photo_uploaded(Err(e)),
                SubmissionPhase::CreatingRecipe | SubmissionPhase::Done => {
                    model.composition.submission = None;
                    model.status_message = None;
                    return;
                }
            }
        }
    }

    fn finish_submission(model: &mut Model, caps: &Capabilities, report: SubmissionReport) {
        info!(
            recipe_id = ?report.recipe_id,
            steps_created = report.steps_created,
            photos_uploaded = report.photos_uploaded,
            failures = report.failures.len(),
            "submission finished"
        );
        model.composition.submission = None;
        model.status_message = None;
        let kind = if report.is_clean() {
            ToastKind::Success
        } else {
            ToastKind::Warning
        };
        model.show_toast(report.summary(), kind);
        caps.ui.revoke_previews(model.composition.reset());
        model.picker.reset();
        model.composition.last_report = Some(report);
    }

    // Edit

    fn load_edit(model: &mut Model, caps: &Capabilities, recipe_id: RecipeId) {
        let Some(url) = Self::endpoint_url(model, &Endpoint::Recipe(recipe_id)) else {
            return;
        };
        get_json(&caps.http, &url, move |result: ApiResult<RawRecipe>| {
            Event::EditLoaded {
                recipe_id,
                result: result.map(RawRecipe::normalize),
            }
        });
    }

    fn ready_session(model: &mut Model) -> Option<&mut EditSession> {
        model.edit.as_mut().filter(|s| s.is_ready())
    }

    fn edit_call_sent(model: &mut Model, operation: EditOperation, sent: Result<(), AppError>) {
        match sent {
            Ok(()) => {
                debug!(?operation, "edit call sent");
                if let Some(session) = model.edit.as_mut() {
                    session.in_flight += 1;
                }
            }
            Err(e) => model.report_error(operation.failure_message(), &e),
        }
    }

    fn save_basic_info(model: &mut Model, caps: &Capabilities) {
        let Some(session) = Self::ready_session(model) else {
            return;
        };
        let recipe_id = session.recipe_id;
        let payload = match session.basic_info_payload() {
            Ok(payload) => payload,
            Err(e) => {
                model.block_with(&e);
                return;
            }
        };
        let Some(url) = Self::endpoint_url(model, &Endpoint::Recipe(recipe_id)) else {
            return;
        };
        let operation = EditOperation::SaveBasicInfo;
        let sent = put_json(&caps.http, &url, &payload, move |result| Event::EditSaved {
            operation,
            result,
        });
        Self::edit_call_sent(model, operation, sent);
    }

    fn save_ingredient_list(model: &mut Model, caps: &Capabilities) {
        let Some(session) = Self::ready_session(model) else {
            return;
        };
        let recipe_id = session.recipe_id;
        let payload = session.ingredients_payload();
        let Some(url) = Self::endpoint_url(model, &Endpoint::Recipe(recipe_id)) else {
            return;
        };
        let operation = EditOperation::SaveIngredients;
        let sent = put_json(&caps.http, &url, &payload, move |result| Event::EditSaved {
            operation,
            result,
        });
        Self::edit_call_sent(model, operation, sent);
    }

    fn add_step(model: &mut Model, caps: &Capabilities) {
        let Some(session) = Self::ready_session(model) else {
            return;
        };
        let payload = session.new_step_payload();
        let Some(url) = Self::endpoint_url(model, &Endpoint::CreateStep) else {
            return;
        };
        let operation = EditOperation::AddStep;
        let sent = post_json(&caps.http, &url, &payload, move |result: ApiResult<RawStep>| {
            Event::EditSaved {
                operation,
                result: result.map(|_| ()),
            }
        });
        Self::edit_call_sent(model, operation, sent);
    }

    fn save_step(model: &mut Model, caps: &Capabilities, step_id: StepId) {
        let Some(payload) = Self::ready_session(model).and_then(|s| s.step_payload(step_id)) else {
            warn!(%step_id, "save requested for an unknown step");
            return;
        };
        let Some(url) = Self::endpoint_url(model, &Endpoint::Step(step_id)) else {
            return;
        };
        let operation = EditOperation::SaveStep(step_id);
        let sent = put_json(&caps.http, &url, &payload, move |result| Event::EditSaved {
            operation,
            result,
        });
        Self::edit_call_sent(model, operation, sent);
    }

    fn edit_delete(
        model: &mut Model,
        caps: &Capabilities,
        operation: EditOperation,
        endpoint: &Endpoint,
    ) {
        if Self::ready_session(model).is_none() {
            return;
        }
        let Some(url) = Self::endpoint_url(model, endpoint) else {
            return;
        };
        delete(&caps.http, &url, move |result| Event::EditSaved {
            operation,
            result,
        });
        Self::edit_call_sent(model, operation, Ok(()));
    }

    fn edit_saved(
        model: &mut Model,
        caps: &Capabilities,
        operation: EditOperation,
        result: ApiResult<()>,
    ) {
        let Some(session) = model.edit.as_mut() else {
            debug!(?operation, "edit result after the page was left");
            return;
        };
        session.in_flight = session.in_flight.saturating_sub(1);
        match result {
            Ok(()) => {
                match operation {
                    EditOperation::DeleteStep(id) => session.forget_step(id),
                    EditOperation::DeletePhoto(id) => session.forget_photo(id),
                    _ => {}
                }
                info!(?operation, recipe_id = %session.recipe_id, "edit saved");
                let message = operation.success_message(session);
                let reload = operation.reloads().then_some(session.recipe_id);
                model.show_toast(message, ToastKind::Success);
                if let Some(recipe_id) = reload {
                    Self::load_edit(model, caps, recipe_id);
                }
            }
            Err(e) => {
                warn!(?operation, error = %e, "edit save failed");
                model.report_error(operation.failure_message(), &e);
            }
        }
    }

    fn queue_edit_photos(
        model: &mut Model,
        caps: &Capabilities,
        target: PhotoTarget,
        photos: Vec<PendingPhoto>,
    ) {
        let Some(session) = Self::ready_session(model) else {
            caps.ui
                .revoke_previews(photos.into_iter().filter_map(|p| p.preview_url));
            return;
        };
        if photos.is_empty() {
            return;
        }
        let idle = !session.is_uploading();
        session.queue_uploads(target, photos);
        if idle {
            Self::issue_edit_upload(model, caps);
        }
    }

    fn issue_edit_upload(model: &mut Model, caps: &Capabilities) {
        let Some(session) = model.edit.as_ref() else {
            return;
        };
        let Some((target, photo)) = session.current_upload() else {
            return;
        };
        let description = upload_description(*target, photo);
        let endpoint = match *target {
            PhotoTarget::Recipe => Endpoint::UploadRecipePhoto {
                recipe_id: session.recipe_id,
                description,
            },
            PhotoTarget::Step(step_id) => Endpoint::UploadStepPhoto {
                step_id,
                description,
            },
        };
        let form = MultipartBody::photo(photo);
        match model.api.url(&endpoint) {
            Ok(url) => post_multipart(&caps.http, &url, form, Event::EditPhotoUploaded),
            Err(e) => Self::edit_upload_finished(model, caps, Err(e)),
        }
    }

    fn edit_upload_finished(model: &mut Model, caps: &Capabilities, result: ApiResult<()>) {
        let Some(session) = model.edit.as_mut() else {
            return;
        };
        let preview = session
            .current_upload()
            .and_then(|(_, p)| p.preview_url.clone());
        caps.ui.revoke_previews(preview);

        let Some(failures) = session.upload_finished(result) else {
            Self::issue_edit_upload(model, caps);
            return;
        };
        let recipe_id = session.recipe_id;
        if failures.is_empty() {
            let message = EditOperation::UploadPhotos.success_message(session);
            model.show_toast(message, ToastKind::Success);
        } else {
            let message = format!(
                "{} ({})",
                EditOperation::UploadPhotos.failure_message(),
                failures.join(", ")
            );
            model.show_toast(message, ToastKind::Error);
        }
        Self::load_edit(model, caps, recipe_id);
    }

    // Execution

    fn fetch_step_photos(model: &mut Model, caps: &Capabilities) {
        let Some(session) = model.execution.as_mut() else {
            return;
        };
        let Some((step_id, generation)) = session.begin_photo_fetch() else {
            return;
        };
        let Some(url) = Self::endpoint_url(model, &Endpoint::PhotosByStep(step_id)) else {
            return;
        };
        get_json(&caps.http, &url, move |result: ApiResult<Vec<PhotoRef>>| {
            Event::StepPhotosLoaded { generation, result }
        });
    }

    fn leave_execution(model: &mut Model) {
        model.execution = None;
        model.screen = if model.details.is_some() {
            Screen::RecipeDetails
        } else {
            Screen::RecipeList
        };
    }

    // Confirmations

    fn confirmed(model: &mut Model, caps: &Capabilities, action: ConfirmAction) {
        match action {
            ConfirmAction::RemoveDraftIngredient(line) => {
                let draft = &mut model.composition.draft;
                if let Some(index) = line.locate(&draft.recipe_ingredients) {
                    draft.remove_ingredient(index);
                }
            }
            ConfirmAction::RemoveDraftStep(local_id) => {
                if let Some(step) = model.composition.draft.remove_step(local_id) {
                    caps.ui.revoke_previews(
                        step.pending_photos.into_iter().filter_map(|p| p.preview_url),
                    );
                }
            }
            ConfirmAction::RemoveComposerIngredient(line) => {
                let composer = &mut model.composition.composer;
                if let Some(index) = line.locate(&composer.step_ingredients) {
                    composer.remove_ingredient(index);
                }
            }
            ConfirmAction::RemoveEditIngredient(line) => {
                if let Some(session) = model.edit.as_mut() {
                    if let Some(index) = line.locate(&session.recipe_ingredients) {
                        session.remove_ingredient(index);
                    }
                }
            }
            ConfirmAction::RemoveStepIngredient { step_id, line } => {
                let Some(session) = model.edit.as_mut() else {
                    return;
                };
                let index = session
                    .step(step_id)
                    .and_then(|step| line.locate(&step.step_ingredients));
                if let Some(index) = index {
                    session.remove_step_ingredient(step_id, index);
                }
            }
            ConfirmAction::DeleteStep(step_id) => Self::edit_delete(
                model,
                caps,
                EditOperation::DeleteStep(step_id),
                &Endpoint::Step(step_id),
            ),
            ConfirmAction::DeletePhoto(photo_id) => Self::edit_delete(
                model,
                caps,
                EditOperation::DeletePhoto(photo_id),
                &Endpoint::Photo(photo_id),
            ),
            ConfirmAction::DeleteRecipe(recipe_id) => {
                if let Some(url) = Self::endpoint_url(model, &Endpoint::Recipe(recipe_id)) {
                    delete(&caps.http, &url, move |result| Event::RecipeDeleted {
                        recipe_id,
                        result,
                    });
                }
            }
            ConfirmAction::DeleteIngredient(ingredient_id) => {
                if let Some(url) = Self::endpoint_url(model, &Endpoint::Ingredient(ingredient_id)) {
                    delete(&caps.http, &url, move |result| Event::IngredientDeleted {
                        ingredient_id,
                        result,
                    });
                }
            }
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::Configure { api_base_url } => match ApiConfig::new(&api_base_url) {
                Ok(api) => {
                    info!(base_url = api.base_url(), "API configured");
                    model.api = api;
                }
                Err(e) => {
                    warn!(error = %e, "API base URL rejected");
                    model.report_error("Μη έγκυρη διεύθυνση διακομιστή.", &e);
                }
            },

            Event::OpenWelcome => {
                Self::leave_screen(model, caps);
                model.screen = Screen::Welcome;
            }
            Event::OpenRecipeList => {
                Self::leave_screen(model, caps);
                Self::open_recipe_list(model, caps);
            }
            Event::OpenIngredients => {
                Self::leave_screen(model, caps);
                model.screen = Screen::Ingredients;
                Self::load_ingredients(model, caps);
            }
            Event::OpenCreateRecipe => {
                if model.screen != Screen::CreateRecipe {
                    Self::leave_screen(model, caps);
                    model.picker.reset();
                }
                model.screen = Screen::CreateRecipe;
            }
            Event::CreateRecipeClosed => {
                Self::leave_screen(model, caps);
                Self::open_recipe_list(model, caps);
            }
            Event::OpenRecipeDetails { recipe_id } => {
                Self::leave_screen(model, caps);
                Self::open_details(model, caps, recipe_id);
            }
            Event::OpenEditRecipe { recipe_id } => {
                Self::leave_screen(model, caps);
                model.screen = Screen::EditRecipe;
                model.edit = Some(EditSession::new(recipe_id));
                model.picker.reset();
                Self::load_edit(model, caps, recipe_id);
            }
            Event::ToastDismissed { id } => model.dismiss_toast(id),
            Event::ValidationDismissed => model.validation_error = None,

            Event::SearchChanged(filters) => {
                let generation = model.catalog.filters_changed(filters);
                caps.ui.delay(
                    RECIPE_SEARCH_DEBOUNCE_MS,
                    Event::SearchDebounceElapsed { generation },
                );
            }
            Event::SearchDebounceElapsed { generation } => {
                if let Some((generation, endpoint)) = model.catalog.debounce_elapsed(generation) {
                    Self::load_recipes(model, caps, generation, &endpoint);
                }
            }
            Event::SearchReset => {
                let (generation, endpoint) = model.catalog.reset_filters();
                Self::load_recipes(model, caps, generation, &endpoint);
            }
            Event::RecipesLoaded { generation, result } => {
                model.catalog.results(generation, result);
            }
            Event::DeleteRecipeRequested { recipe_id } => {
                Self::confirm(caps, ConfirmAction::DeleteRecipe(recipe_id));
            }
            Event::RecipeDeleted { recipe_id, result } => match result {
                Ok(()) => {
                    info!(%recipe_id, "recipe deleted");
                    model.catalog.forget(recipe_id);
                    model.show_toast("Η συνταγή διαγράφηκε.", ToastKind::Success);
                    if model.details.as_ref().is_some_and(|d| d.recipe_id == recipe_id) {
                        model.details = None;
                        Self::open_recipe_list(model, caps);
                    }
                }
                Err(e) => model.report_error("Σφάλμα διαγραφής συνταγής.", &e),
            },
            Event::RecipeDetailsLoaded { recipe_id, result } => {
                let Some(details) = model.details.as_mut().filter(|d| d.recipe_id == recipe_id)
                else {
                    debug!(%recipe_id, "details for a closed recipe dropped");
                    return;
                };
                if let Some(cover) = details.loaded(result) {
                    remember_cover_photo(&caps.key_value, recipe_id, cover);
                }
            }
            Event::GalleryLoaded { recipe_id, result } => {
                if let Some(details) = model.details.as_mut().filter(|d| d.recipe_id == recipe_id) {
                    if let Some(e) = details.gallery_loaded(result) {
                        warn!(error = %e, %recipe_id, "gallery failed to load");
                    }
                }
            }
            Event::CoverPhotoRecalled {
                recipe_id,
                photo_id,
            } => {
                if let Some(details) = model.details.as_mut().filter(|d| d.recipe_id == recipe_id) {
                    details.cached_cover(photo_id);
                }
            }
            Event::SessionCacheWritten => {
                debug!("session cache written");
                return;
            }
            Event::IngredientsLoaded(result) => model.ingredients.loaded(result),
            Event::DeleteIngredientRequested { ingredient_id } => {
                Self::confirm(caps, ConfirmAction::DeleteIngredient(ingredient_id));
            }
            Event::IngredientDeleted {
                ingredient_id,
                result,
            } => match result {
                Ok(()) => {
                    info!(%ingredient_id, "ingredient deleted");
                    model.ingredients.forget(ingredient_id);
                    model.show_toast("Το υλικό διαγράφηκε.", ToastKind::Success);
                }
                Err(e) => model.report_error("Σφάλμα διαγραφής υλικού.", &e),
            },

            Event::PickerTermChanged(term) => match model.picker.set_term(&term) {
                SearchPlan::Clear => {}
                SearchPlan::Debounce { generation } => caps.ui.delay(
                    INGREDIENT_SEARCH_DEBOUNCE_MS,
                    Event::PickerDebounceElapsed { generation },
                ),
            },
            Event::PickerDebounceElapsed { generation } => {
                let Some(term) = model.picker.debounce_elapsed(generation) else {
                    return;
                };
                if let Some(url) = Self::endpoint_url(model, &Endpoint::SearchIngredients(term)) {
                    get_json(&caps.http, &url, move |result| Event::PickerResults {
                        generation,
                        result,
                    });
                }
            }
            Event::PickerResults { generation, result } => match result {
                Ok(found) => {
                    model.picker.apply_results(generation, found);
                }
                Err(e) => {
                    if model.picker.search_failed(generation) {
                        warn!(error = %e, "ingredient search failed");
                    }
                }
            },
            Event::PickerSuggestionSelected(id) => {
                model.picker.select(id);
            }
            Event::PickerQuantityChanged(quantity) => model.picker.set_quantity(&quantity),
            Event::PickerUnitChanged(unit) => model.picker.set_unit(unit),
            Event::PickerConfirmed(target) => Self::confirm_picker(model, caps, target),
            Event::PickerIngredientCreated {
                target,
                quantity,
                unit,
                result,
            } => {
                model.picker.creating = false;
                match result {
                    Ok(ingredient) => {
                        info!(ingredient_id = %ingredient.id, "ingredient created");
                        let item = QuantifiedIngredient::new(
                            ingredient.id,
                            ingredient.name,
                            quantity,
                            unit,
                        );
                        Self::emit_picked(model, target, item);
                    }
                    Err(e) => model.report_error("Σφάλμα δημιουργίας υλικού.", &e),
                }
            }

            Event::DraftFieldChanged { field, value } => {
                if let Err(e) = model.composition.draft.set_field(field, &value) {
                    model.show_toast(e.to_string(), ToastKind::Warning);
                }
            }
            Event::DraftIngredientRemoveRequested(index) => {
                let line = LineRef::at(&model.composition.draft.recipe_ingredients, index);
                if let Some(line) = line {
                    Self::confirm(caps, ConfirmAction::RemoveDraftIngredient(line));
                }
            }
            Event::DraftStepRemoveRequested(local_id) => {
                if model.composition.draft.has_step(local_id) {
                    Self::confirm(caps, ConfirmAction::RemoveDraftStep(local_id));
                }
            }
            Event::DraftPhotosSelected(files) => {
                let batch = model.composition.draft.add_photos(files);
                Self::take_staged(model, caps, batch);
            }
            Event::DraftPhotoRemoved(local_id) => {
                if let Some(photo) = model.composition.draft.remove_photo(local_id) {
                    caps.ui.revoke_previews(photo.preview_url);
                }
            }
            Event::DraftPhotoDescriptionChanged {
                local_id,
                description,
            } => {
                model
                    .composition
                    .draft
                    .set_photo_description(local_id, &description);
            }
            Event::SubmitRequested => Self::submit(model, caps),

            Event::RecipeCreated(result) => {
                let Some(run) = model.composition.submission.as_mut() else {
                    return;
                };
                match run.recipe_created(result) {
                    Ok(()) => Self::drive_submission(model, caps),
                    Err(e) => {
                        model.composition.submission = None;
                        model.status_message = None;
                        model.report_error("Αποτυχία δημιουργίας συνταγής.", &e);
                    }
                }
            }
            Event::RecipePhotoUploaded(result) => {
                if let Some(run) = model.composition.submission.as_mut() {
                    run.recipe_photo_uploaded(result);
                    Self::drive_submission(model, caps);
                }
            }
            Event::StepCreated(result) => {
                if let Some(run) = model.composition.submission.as_mut() {
                    run.step_created(result);
                    Self::drive_submission(model, caps);
                }
            }
            Event::StepPhotoUploaded(result) => {
                if let Some(run) = model.composition.submission.as_mut() {
                    run.step_photo_uploaded(result);
                    Self::drive_submission(model, caps);
                }
            }

            Event::ComposerFieldChanged { field, value } => {
                model.composition.composer.set_field(field, &value);
            }
            Event::ComposerIngredientAdded {
                ingredient_id,
                quantity,
                unit,
            } => {
                let composition = &mut model.composition;
                let added = composition.composer.add_ingredient(
                    &composition.draft.recipe_ingredients,
                    ingredient_id,
                    quantity.as_deref(),
                    unit,
                );
                if let Err(e) = added {
                    model.show_toast(e.to_string(), ToastKind::Warning);
                }
            }
            Event::ComposerIngredientRemoveRequested(index) => {
                let line = LineRef::at(&model.composition.composer.step_ingredients, index);
                if let Some(line) = line {
                    Self::confirm(caps, ConfirmAction::RemoveComposerIngredient(line));
                }
            }
            Event::ComposerPhotosSelected(files) => {
                let batch = model.composition.composer.add_photos(files);
                Self::take_staged(model, caps, batch);
            }
            Event::ComposerPhotoRemoved(local_id) => {
                if let Some(photo) = model.composition.composer.remove_photo(local_id) {
                    caps.ui.revoke_previews(photo.preview_url);
                }
            }
            Event::ComposerCommitted => {
                let composition = &mut model.composition;
                match composition.composer.commit(composition.draft.steps.len()) {
                    Ok(step) => {
                        debug!(step_order = step.step_order, "step added to draft");
                        composition.draft.add_step(step);
                    }
                    Err(e) => model.block_with(&e),
                }
            }

            Event::EditFieldChanged { field, value } => {
                if let Some(Err(e)) = model.edit.as_mut().map(|s| s.set_field(field, &value)) {
                    model.show_toast(e.to_string(), ToastKind::Warning);
                }
            }
            Event::SaveBasicInfoRequested => Self::save_basic_info(model, caps),
            Event::SaveIngredientListRequested => Self::save_ingredient_list(model, caps),
            Event::EditIngredientRemoveRequested(index) => {
                let line = model
                    .edit
                    .as_ref()
                    .and_then(|s| LineRef::at(&s.recipe_ingredients, index));
                if let Some(line) = line {
                    Self::confirm(caps, ConfirmAction::RemoveEditIngredient(line));
                }
            }
            Event::AddStepRequested => Self::add_step(model, caps),
            Event::EditStepFieldChanged {
                step_id,
                field,
                value,
            } => {
                let edited = model
                    .edit
                    .as_mut()
                    .map(|s| s.set_step_field(step_id, field, &value));
                if let Some(Err(e)) = edited {
                    model.show_toast(e.to_string(), ToastKind::Warning);
                }
            }
            Event::EditStepIngredientAdded {
                step_id,
                ingredient_id,
                quantity,
                unit,
            } => {
                let added = model
                    .edit
                    .as_mut()
                    .map(|s| s.add_step_ingredient(step_id, ingredient_id, &quantity, unit));
                if let Some(Err(e)) = added {
                    model.show_toast(e.to_string(), ToastKind::Warning);
                }
            }
            Event::EditStepIngredientRemoveRequested { step_id, index } => {
                let line = model
                    .edit
                    .as_ref()
                    .and_then(|s| s.step(step_id))
                    .and_then(|step| LineRef::at(&step.step_ingredients, index));
                if let Some(line) = line {
                    Self::confirm(caps, ConfirmAction::RemoveStepIngredient { step_id, line });
                }
            }
            Event::SaveStepRequested(step_id) => Self::save_step(model, caps, step_id),
            Event::DeleteStepRequested(step_id) => {
                Self::confirm(caps, ConfirmAction::DeleteStep(step_id));
            }
            Event::EditPhotosSelected { target, files } => {
                let batch = crate::photos::stage_all(files);
                let accepted = Self::take_staged(model, caps, batch);
                Self::queue_edit_photos(model, caps, target, accepted);
            }
            Event::DeletePhotoRequested(photo_id) => {
                Self::confirm(caps, ConfirmAction::DeletePhoto(photo_id));
            }
            Event::EditLoaded { recipe_id, result } => {
                let Some(session) = model.edit.as_mut().filter(|s| s.recipe_id == recipe_id) else {
                    debug!(%recipe_id, "edit load for a closed recipe dropped");
                    return;
                };
                if let Some(e) = session.loaded(result) {
                    warn!(error = %e, %recipe_id, "edit reload failed");
                    model.report_error("Αποτυχία ανανέωσης της συνταγής.", &e);
                }
            }
            Event::EditSaved { operation, result } => {
                Self::edit_saved(model, caps, operation, result);
            }
            Event::EditPhotoUploaded(result) => Self::edit_upload_finished(model, caps, result),

            Event::StartExecution => {
                let started = model
                    .details
                    .as_ref()
                    .and_then(|d| d.recipe.as_ref())
                    .map(ExecutionSession::start);
                match started {
                    Some(Some(session)) => {
                        info!(
                            recipe_id = %session.recipe_id,
                            steps = session.steps.len(),
                            "walkthrough started"
                        );
                        model.execution = Some(session);
                        model.screen = Screen::Execution;
                        Self::fetch_step_photos(model, caps);
                    }
                    Some(None) => model.show_toast(NO_STEPS_MESSAGE, ToastKind::Warning),
                    None => debug!("walkthrough requested before the recipe loaded"),
                }
            }
            Event::ExecutionNext => {
                let Some(session) = model.execution.as_mut() else {
                    return;
                };
                match session.next() {
                    Transition::Moved { index } => {
                        debug!(index, "walkthrough advanced");
                        caps.ui.reset_scroll();
                        Self::fetch_step_photos(model, caps);
                    }
                    Transition::Finished => {
                        info!(recipe_id = %session.recipe_id, "walkthrough finished");
                        caps.ui.reset_scroll();
                    }
                    Transition::Unchanged => {}
                }
            }
            Event::ExecutionPrevious => {
                let moved = model
                    .execution
                    .as_mut()
                    .map(ExecutionSession::previous);
                if let Some(Transition::Moved { index }) = moved {
                    debug!(index, "walkthrough went back");
                    Self::fetch_step_photos(model, caps);
                }
            }
            Event::ExecutionCancelled | Event::ExecutionClosed => Self::leave_execution(model),
            Event::ExecutionBackToMenu => {
                model.execution = None;
                Self::open_recipe_list(model, caps);
            }
            Event::ViewerOpened { src } => {
                if let Some(session) = model.execution.as_mut() {
                    session.viewer.open(&src);
                }
            }
            Event::ViewerKeyPressed(key) => {
                if let Some(session) = model.execution.as_mut() {
                    session.viewer.key(key);
                }
            }
            Event::ViewerBackdropClicked => {
                if let Some(session) = model.execution.as_mut() {
                    session.viewer.close();
                }
            }
            Event::StepPhotosLoaded { generation, result } => match result {
                Ok(photos) => {
                    let sources: Vec<String> = photos
                        .iter()
                        .filter_map(|p| model.api.url(&Endpoint::PhotoImage(p.id)).ok())
                        .map(String::from)
                        .collect();
                    if let Some(session) = model.execution.as_mut() {
                        session.photos_loaded(generation, photos, sources);
                    }
                }
                Err(e) => warn!(error = %e, generation, "step photos failed to load"),
            },

            Event::ConfirmationAnswered { action, confirmed } => {
                if confirmed {
                    Self::confirmed(model, caps, action);
                } else {
                    debug!(?action, "confirmation declined");
                }
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}
