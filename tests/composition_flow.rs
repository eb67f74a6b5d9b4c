use crux_core::testing::AppTester;
use crux_http::protocol::HttpRequest;
use recipe_shared::composition::RecipeField;
use recipe_shared::composer::ComposerField;
use recipe_shared::model::{Ingredient, IngredientId, LineRef, RecipeId, StepId};
use recipe_shared::photos::SelectedFile;
use recipe_shared::picker::PickerTarget;
use recipe_shared::units::MeasurementUnit;
use recipe_shared::{
    App, AppError, ConfirmAction, Effect, Event, Model, ToastKind,
};
use recipe_shared::capabilities::UiOperation;

fn http(effects: &[Effect]) -> Vec<&HttpRequest> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(req) => Some(&req.operation),
            _ => None,
        })
        .collect()
}

fn json(req: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(&req.body).unwrap()
}

/// Fills name, description, one ingredient (picked from the search
/// results) and one committed step.
fn fill_draft(app: &AppTester<App, Effect>, model: &mut Model) {
    app.update(
        Event::DraftFieldChanged {
            field: RecipeField::Name,
            value: "Ντομάτα Σαλάτα".into(),
        },
        model,
    );
    app.update(
        Event::DraftFieldChanged {
            field: RecipeField::Description,
            value: "Δροσερή καλοκαιρινή σαλάτα".into(),
        },
        model,
    );

    let update = app.update(Event::PickerTermChanged("Ντομ".into()), model);
    assert!(update
        .effects
        .iter()
        .any(|e| matches!(e, Effect::Ui(req) if matches!(req.operation, UiOperation::Delay { millis: 500 }))));

    let generation = model.picker.generation();
    app.update(
        Event::PickerResults {
            generation,
            result: Ok(vec![Ingredient {
                id: IngredientId::new(7),
                name: "Ντομάτα".into(),
                description: None,
            }]),
        },
        model,
    );
    app.update(Event::PickerSuggestionSelected(IngredientId::new(7)), model);
    app.update(Event::PickerQuantityChanged("2".into()), model);
    app.update(Event::PickerUnitChanged(MeasurementUnit::Pieces), model);
    app.update(Event::PickerConfirmed(PickerTarget::DraftRecipe), model);
    assert_eq!(model.composition.draft.recipe_ingredients.len(), 1);
    assert!(model.picker.term.is_empty());

    app.update(
        Event::ComposerFieldChanged {
            field: ComposerField::Description,
            value: "Κόβουμε τις ντομάτες".into(),
        },
        model,
    );
    app.update(Event::ComposerCommitted, model);
    assert_eq!(model.composition.draft.steps.len(), 1);
}

fn png(name: &str) -> SelectedFile {
    SelectedFile {
        file_name: name.into(),
        mime_type: "image/png".into(),
        size_bytes: 4,
        bytes: vec![0x89, b'P', b'N', b'G'],
        preview_url: Some(format!("blob:{name}")),
    }
}

#[test]
fn test_submit_creates_recipe_then_steps() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    fill_draft(&app, &mut model);

    let step = &model.composition.draft.steps[0];
    assert_eq!(step.title, "Βήμα 1");
    assert_eq!(step.step_order, 1);
    assert_eq!(step.duration, 5);

    let update = app.update(Event::SubmitRequested, &mut model);
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].url, "http://localhost:8080/api/recipes");
    let body = json(requests[0]);
    assert_eq!(body["name"], "Ντομάτα Σαλάτα");
    assert_eq!(body["recipeIngredients"][0]["ingredientId"], 7);
    assert_eq!(body["recipeIngredients"][0]["measurementUnit"], "PIECES");
    assert_eq!(body["steps"], serde_json::json!([]));
    assert!(model.composition.is_submitting());

    // A second press while running does nothing.
    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http(&update.effects).is_empty());

    let update = app.update(Event::RecipeCreated(Ok(RecipeId::new(42))), &mut model);
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8080/api/steps");
    let body = json(requests[0]);
    assert_eq!(body["stepOrder"], 1);
    assert_eq!(body["recipeId"], 42);
    assert_eq!(body["title"], "Βήμα 1");

    let update = app.update(Event::StepCreated(Ok(StepId::new(5))), &mut model);
    assert!(http(&update.effects).is_empty());
    assert!(!model.composition.is_submitting());

    let report = model.composition.last_report.clone().unwrap();
    assert_eq!(report.recipe_id, Some(RecipeId::new(42)));
    assert_eq!(report.steps_created, 1);
    assert!(report.is_clean());

    // Draft and composer are back to their defaults.
    assert!(model.composition.draft.name.is_empty());
    assert!(model.composition.draft.steps.is_empty());
    assert_eq!(model.composition.composer.duration, "5");

    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.kind, ToastKind::Success);
    assert!(toast.message.starts_with("Επιτυχία! Η συνταγή δημιουργήθηκε!"));
}

#[test]
fn test_validation_failure_issues_no_request() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http(&update.effects).is_empty());
    assert_eq!(
        model.validation_error.as_deref(),
        Some("Η συνταγή πρέπει να έχει Όνομα!")
    );

    app.update(
        Event::DraftFieldChanged {
            field: RecipeField::Name,
            value: "Μουσακάς".into(),
        },
        &mut model,
    );
    app.update(
        Event::DraftFieldChanged {
            field: RecipeField::Description,
            value: "Κλασικός".into(),
        },
        &mut model,
    );
    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http(&update.effects).is_empty());
    assert_eq!(model.validation_error.as_deref(), Some("Λείπουν τα Υλικά!"));
    assert!(!model.composition.is_submitting());

    app.update(Event::ValidationDismissed, &mut model);
    assert!(model.validation_error.is_none());
}

#[test]
fn test_declined_removal_keeps_the_ingredient() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    fill_draft(&app, &mut model);

    let update = app.update(Event::DraftIngredientRemoveRequested(0), &mut model);
    let prompt = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Ui(req) => match &req.operation {
                UiOperation::Confirm(prompt) => Some(prompt.clone()),
                _ => None,
            },
            _ => None,
        })
        .expect("removal asks first");
    assert_eq!(prompt.title, "Διαγραφή Υλικού");
    assert_eq!(model.composition.draft.recipe_ingredients.len(), 1);
    let line = LineRef::at(&model.composition.draft.recipe_ingredients, 0).unwrap();

    app.update(
        Event::ConfirmationAnswered {
            action: ConfirmAction::RemoveDraftIngredient(line),
            confirmed: false,
        },
        &mut model,
    );
    assert_eq!(model.composition.draft.recipe_ingredients.len(), 1);

    app.update(
        Event::ConfirmationAnswered {
            action: ConfirmAction::RemoveDraftIngredient(line),
            confirmed: true,
        },
        &mut model,
    );
    assert!(model.composition.draft.recipe_ingredients.is_empty());
}

fn add_step(app: &AppTester<App, Effect>, model: &mut Model, title: &str) {
    app.update(
        Event::ComposerFieldChanged {
            field: ComposerField::Title,
            value: title.into(),
        },
        model,
    );
    app.update(
        Event::ComposerFieldChanged {
            field: ComposerField::Description,
            value: "Ανακατεύουμε".into(),
        },
        model,
    );
    app.update(Event::ComposerCommitted, model);
}

fn step_titles(model: &Model) -> Vec<(String, u32)> {
    model
        .composition
        .draft
        .steps
        .iter()
        .map(|s| (s.title.clone(), s.step_order))
        .collect()
}

#[test]
fn test_step_removal_waits_for_confirmation_and_renumbers() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    fill_draft(&app, &mut model);
    add_step(&app, &mut model, "Αλάτισμα");
    add_step(&app, &mut model, "Σερβίρισμα");
    let before = step_titles(&model);
    assert_eq!(
        before,
        vec![
            ("Βήμα 1".to_string(), 1),
            ("Αλάτισμα".to_string(), 2),
            ("Σερβίρισμα".to_string(), 3),
        ]
    );

    let middle = model.composition.draft.steps[1].local_id;
    let update = app.update(Event::DraftStepRemoveRequested(middle), &mut model);
    let asks = update.effects.iter().any(|e| match e {
        Effect::Ui(req) => {
            matches!(&req.operation, UiOperation::Confirm(p) if p.title == "Διαγραφή Βήματος")
        }
        _ => false,
    });
    assert!(asks);
    assert_eq!(step_titles(&model), before);

    app.update(
        Event::ConfirmationAnswered {
            action: ConfirmAction::RemoveDraftStep(middle),
            confirmed: false,
        },
        &mut model,
    );
    assert_eq!(step_titles(&model), before);

    app.update(
        Event::ConfirmationAnswered {
            action: ConfirmAction::RemoveDraftStep(middle),
            confirmed: true,
        },
        &mut model,
    );
    assert_eq!(
        step_titles(&model),
        vec![("Βήμα 1".to_string(), 1), ("Σερβίρισμα".to_string(), 2)]
    );

    // The handle of a removed step no longer matches anything.
    let update = app.update(Event::DraftStepRemoveRequested(middle), &mut model);
    assert!(update.effects.iter().all(|e| !matches!(e, Effect::Ui(_))));
    assert_eq!(model.composition.draft.steps.len(), 2);
}

#[test]
fn test_invalid_drafts_issue_no_request() {
    let app = AppTester::<App, Effect>::default();

    let cases: [(&str, fn(&AppTester<App, Effect>, &mut Model)); 3] = [
        ("Η συνταγή πρέπει να έχει Περιγραφή!", |app, model| {
            app.update(
                Event::DraftFieldChanged {
                    field: RecipeField::Description,
                    value: "   ".into(),
                },
                model,
            );
        }),
        ("Το όνομα πρέπει να έχει από 2 έως 30 χαρακτήρες.", |app, model| {
            app.update(
                Event::DraftFieldChanged {
                    field: RecipeField::Name,
                    value: "Σ".repeat(31),
                },
                model,
            );
        }),
        ("Λείπουν τα Βήματα!", |app, model| {
            let step = model.composition.draft.steps[0].local_id;
            app.update(
                Event::ConfirmationAnswered {
                    action: ConfirmAction::RemoveDraftStep(step),
                    confirmed: true,
                },
                model,
            );
        }),
    ];

    for (message, spoil) in cases {
        let mut model = Model::default();
        fill_draft(&app, &mut model);
        spoil(&app, &mut model);

        let update = app.update(Event::SubmitRequested, &mut model);
        assert!(http(&update.effects).is_empty(), "{message}");
        assert_eq!(model.validation_error.as_deref(), Some(message));
        assert!(!model.composition.is_submitting());
    }
}

#[test]
fn test_photo_failures_do_not_stop_the_chain() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    fill_draft(&app, &mut model);

    let update = app.update(
        Event::DraftPhotosSelected(vec![
            png("salad.png"),
            SelectedFile {
                file_name: "notes.txt".into(),
                mime_type: "text/plain".into(),
                size_bytes: 3,
                bytes: b"abc".to_vec(),
                preview_url: Some("blob:notes".into()),
            },
        ]),
        &mut model,
    );
    assert_eq!(model.composition.draft.photos.len(), 1);
    assert!(update.effects.iter().any(|e| matches!(
        e,
        Effect::Ui(req) if req.operation == UiOperation::RevokePreview { url: "blob:notes".into() }
    )));
    let toast = model.active_toast.clone().unwrap();
    assert_eq!(toast.kind, ToastKind::Warning);
    assert!(toast.message.contains("notes.txt"));

    app.update(Event::SubmitRequested, &mut model);
    let update = app.update(Event::RecipeCreated(Ok(RecipeId::new(42))), &mut model);
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .url
        .starts_with("http://localhost:8080/api/photos/recipe/upload?recipeId=42"));

    let update = app.update(
        Event::RecipePhotoUploaded(Err(AppError::from_http_status(500, None))),
        &mut model,
    );
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8080/api/steps");

    let update = app.update(Event::StepCreated(Ok(StepId::new(9))), &mut model);
    // The uploaded preview is released with the reset draft.
    assert!(update.effects.iter().any(|e| matches!(
        e,
        Effect::Ui(req) if req.operation == UiOperation::RevokePreview { url: "blob:salad.png".into() }
    )));

    let report = model.composition.last_report.clone().unwrap();
    assert_eq!(report.steps_created, 1);
    assert_eq!(report.photos_attempted, 1);
    assert_eq!(report.photos_uploaded, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(model.active_toast.unwrap().kind, ToastKind::Warning);
}

#[test]
fn test_failed_recipe_creation_stops_everything() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    fill_draft(&app, &mut model);

    app.update(Event::SubmitRequested, &mut model);
    let update = app.update(
        Event::RecipeCreated(Err(AppError::from_http_status(400, None))),
        &mut model,
    );
    assert!(http(&update.effects).is_empty());
    assert!(!model.composition.is_submitting());
    assert!(model.composition.last_report.is_none());

    // The draft survives so the user can retry.
    assert_eq!(model.composition.draft.name, "Ντομάτα Σαλάτα");
    let toast = model.active_toast.unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert!(toast.message.ends_with("(VALIDATION_ERROR)"));
}

#[test]
fn test_unknown_ingredient_is_created_before_use() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PickerTermChanged("Κάππαρη".into()), &mut model);
    let generation = model.picker.generation();
    app.update(
        Event::PickerResults {
            generation,
            result: Ok(Vec::new()),
        },
        &mut model,
    );
    assert!(model.picker.is_creating_new);

    app.update(Event::PickerQuantityChanged("1,5".into()), &mut model);
    let update = app.update(Event::PickerConfirmed(PickerTarget::DraftRecipe), &mut model);
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8080/api/ingredients");
    assert_eq!(
        json(requests[0])["description"],
        "Αυτόματα δημιουργημένο υλικό: Κάππαρη"
    );

    app.update(
        Event::PickerIngredientCreated {
            target: PickerTarget::DraftRecipe,
            quantity: 1.5,
            unit: MeasurementUnit::Grams,
            result: Ok(Ingredient {
                id: IngredientId::new(31),
                name: "Κάππαρη".into(),
                description: None,
            }),
        },
        &mut model,
    );
    let added = &model.composition.draft.recipe_ingredients[0];
    assert_eq!(added.ingredient_id, Some(IngredientId::new(31)));
    assert!((added.quantity - 1.5).abs() < f64::EPSILON);
    assert!(!model.picker.creating);
}

#[test]
fn test_stale_picker_results_are_dropped() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::PickerTermChanged("Αλ".into()), &mut model);
    let stale = model.picker.generation();
    app.update(Event::PickerTermChanged("Αλάτι".into()), &mut model);

    let update = app.update(Event::PickerDebounceElapsed { generation: stale }, &mut model);
    assert!(http(&update.effects).is_empty());

    app.update(
        Event::PickerResults {
            generation: stale,
            result: Ok(vec![Ingredient {
                id: IngredientId::new(1),
                name: "Αλεύρι".into(),
                description: None,
            }]),
        },
        &mut model,
    );
    assert!(model.picker.results.is_empty());

    let current = model.picker.generation();
    let update = app.update(Event::PickerDebounceElapsed { generation: current }, &mut model);
    let requests = http(&update.effects);
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .url
        .starts_with("http://localhost:8080/api/ingredients/search?name="));
}
