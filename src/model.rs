use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::api::ApiConfig;
use crate::catalog::{Catalog, IngredientCatalog, RecipeDetails};
use crate::composition::Composition;
use crate::edit::EditSession;
use crate::execution::ExecutionSession;
use crate::photos::PendingPhoto;
use crate::picker::IngredientPicker;
use crate::units::MeasurementUnit;
use crate::{AppError, ToastKind, ToastMessage};

/// Backend ids are numeric but forms and older payloads sometimes carry
/// them as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientId {
    Number(i64),
    Text(String),
}

impl LenientId {
    fn into_i64(self) -> Result<i64, String> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid numeric id: {s:?}")),
        }
    }
}

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                LenientId::deserialize(deserializer)?
                    .into_i64()
                    .map(Self)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

typed_id!(RecipeId);
typed_id!(IngredientId);
typed_id!(StepId);
typed_id!(PhotoId);

/// Client-side handle of a photo that has not been uploaded yet.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LocalPhotoId(pub Uuid);

impl LocalPhotoId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LocalPhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side handle of a draft step, stable while the list is renumbered.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct LocalStepId(pub Uuid);

impl LocalStepId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Εύκολο",
            Self::Medium => "Μέτριο",
            Self::Hard => "Δύσκολο",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        Self::ALL.into_iter().find(|d| d.token() == upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Appetizer,
    #[default]
    MainCourse,
    Dessert,
    Salad,
    Snack,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Appetizer,
        Self::MainCourse,
        Self::Dessert,
        Self::Salad,
        Self::Snack,
    ];

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Appetizer => "APPETIZER",
            Self::MainCourse => "MAIN_COURSE",
            Self::Dessert => "DESSERT",
            Self::Salad => "SALAD",
            Self::Snack => "SNACK",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Appetizer => "Ορεκτικό",
            Self::MainCourse => "Κυρίως Πιάτο",
            Self::Dessert => "Επιδόρπιο",
            Self::Salad => "Σαλάτα",
            Self::Snack => "Σνακ",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        Self::ALL.into_iter().find(|c| c.token() == upper)
    }
}

/// An ingredient as it sits in a recipe or a step: which ingredient, how
/// much of it, in which unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantifiedIngredient {
    /// `None` only when a backend reference could not be resolved.
    pub ingredient_id: Option<IngredientId>,
    pub name: String,
    pub quantity: f64,
    pub measurement_unit: MeasurementUnit,
    /// Join-row id echoed back by the backend for persisted references.
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<i64>,
}

impl QuantifiedIngredient {
    #[must_use]
    pub fn new(
        ingredient_id: IngredientId,
        name: impl Into<String>,
        quantity: f64,
        measurement_unit: MeasurementUnit,
    ) -> Self {
        Self {
            ingredient_id: Some(ingredient_id),
            name: name.into(),
            quantity,
            measurement_unit,
            entry_id: None,
        }
    }
}

/// Addresses a line of an ingredient list by position and ingredient, so a
/// list that changed under a pending confirmation still removes the right line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    pub index: usize,
    pub ingredient_id: Option<IngredientId>,
}

impl LineRef {
    #[must_use]
    pub fn at(lines: &[QuantifiedIngredient], index: usize) -> Option<Self> {
        lines.get(index).map(|line| Self {
            index,
            ingredient_id: line.ingredient_id,
        })
    }

    /// Current position of the line, if it is still in the list.
    #[must_use]
    pub fn locate(self, lines: &[QuantifiedIngredient]) -> Option<usize> {
        match lines.get(self.index) {
            Some(line) if line.ingredient_id == self.ingredient_id => Some(self.index),
            _ => lines
                .iter()
                .position(|line| line.ingredient_id == self.ingredient_id),
        }
    }
}

/// Catalogue ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub id: PhotoId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A step in the create draft, not yet persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftStep {
    pub local_id: LocalStepId,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub step_order: u32,
    pub step_ingredients: Vec<QuantifiedIngredient>,
    pub pending_photos: Vec<PendingPhoto>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub step_order: u32,
    pub step_ingredients: Vec<QuantifiedIngredient>,
    pub photos: Vec<PhotoRef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub total_duration: u32,
    pub recipe_ingredients: Vec<QuantifiedIngredient>,
    pub steps: Vec<Step>,
    pub photos: Vec<PhotoRef>,
}

/// Renumbers `stepOrder` to `1..=n` following the current slice order.
pub fn renumber<T>(items: &mut [T], order: impl Fn(&mut T) -> &mut u32) {
    for (index, item) in items.iter_mut().enumerate() {
        *order(item) = u32::try_from(index + 1).unwrap_or(u32::MAX);
    }
}

/// Keeps ASCII digits only, the way duration inputs behave.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a digits-only duration, falling back when empty or zero.
#[must_use]
pub fn parse_minutes(raw: &str, fallback: u32) -> u32 {
    match digits_only(raw).parse::<u32>() {
        Ok(0) | Err(_) => fallback,
        Ok(minutes) => minutes,
    }
}

/// Strict variant for fields that edit a persisted value: empty, zero and
/// out-of-range input is rejected rather than defaulted.
pub fn parse_step_minutes(raw: &str) -> Result<u32, ValidationError> {
    match digits_only(raw).parse::<u32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ValidationError::InvalidDuration),
    }
}

/// Parses a user-typed quantity. Accepts a decimal comma.
#[must_use]
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let value = raw.trim().replace(',', ".").parse::<f64>().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Η συνταγή πρέπει να έχει Όνομα!")]
    MissingName,
    #[error("Η συνταγή πρέπει να έχει Περιγραφή!")]
    MissingDescription,
    #[error("Λείπουν τα Υλικά!")]
    MissingIngredients,
    #[error("Λείπουν τα Βήματα!")]
    MissingSteps,
    #[error("Το όνομα πρέπει να έχει από {min} έως {max} χαρακτήρες.")]
    NameLength { min: usize, max: usize },
    #[error("Η περιγραφή δεν μπορεί να ξεπερνά τους {max} χαρακτήρες.")]
    DescriptionTooLong { max: usize },
    #[error("Η περιγραφή είναι υποχρεωτική.")]
    MissingStepDescription,
    #[error("Παρακαλώ συμπληρώστε όνομα υλικού και ποσότητα.")]
    IncompleteIngredient,
    #[error("Το υλικό δεν υπάρχει στη λίστα της συνταγής.")]
    UnknownIngredient,
    #[error("Η διάρκεια πρέπει να είναι θετικός αριθμός λεπτών.")]
    InvalidDuration,
    #[error("Μη έγκυρη τιμή: {value}")]
    InvalidChoice { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Welcome,
    RecipeList,
    Ingredients,
    CreateRecipe,
    RecipeDetails,
    EditRecipe,
    Execution,
}

#[derive(Debug, Default)]
pub struct Model {
    pub api: ApiConfig,
    pub screen: Screen,
    pub catalog: Catalog,
    pub ingredients: IngredientCatalog,
    pub details: Option<RecipeDetails>,
    pub composition: Composition,
    pub picker: IngredientPicker,
    pub edit: Option<EditSession>,
    pub execution: Option<ExecutionSession>,
    /// Blocking validation message; cleared when the user dismisses it.
    pub validation_error: Option<String>,
    pub status_message: Option<String>,
    pub active_toast: Option<ToastMessage>,
    toast_seq: u64,
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.toast_seq += 1;
        self.active_toast = Some(ToastMessage::new(self.toast_seq, message, kind));
    }

    pub fn dismiss_toast(&mut self, id: u64) {
        if self.active_toast.as_ref().is_some_and(|t| t.id == id) {
            self.active_toast = None;
        }
    }

    /// Error toast in the user's language, with the diagnostic code appended.
    pub fn report_error(&mut self, headline: &str, error: &AppError) {
        let message = format!("{headline} ({})", error.code());
        self.show_toast(message, ToastKind::Error);
    }

    pub fn block_with(&mut self, error: &ValidationError) {
        self.validation_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_minutes_reject_non_positive_input() {
        assert_eq!(parse_step_minutes("15"), Ok(15));
        assert_eq!(parse_step_minutes(" 4 λεπτά"), Ok(4));
        for raw in ["", "0", "99999999999"] {
            assert_eq!(parse_step_minutes(raw), Err(ValidationError::InvalidDuration));
        }
    }

    #[test]
    fn test_line_ref_follows_the_ingredient() {
        let entry = |id: i64, name: &str| {
            QuantifiedIngredient::new(IngredientId::new(id), name, 1.0, MeasurementUnit::Pinch)
        };
        let lines = vec![entry(1, "Αλάτι"), entry(2, "Πιπέρι")];
        let line = LineRef::at(&lines, 1).unwrap();
        assert_eq!(line.locate(&lines), Some(1));
        assert_eq!(line.locate(&lines[1..]), Some(0));
        assert_eq!(line.locate(&lines[..1]), None);
        assert!(LineRef::at(&lines, 2).is_none());
    }

    #[test]
    fn test_ids_accept_numeric_strings() {
        let id: RecipeId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, RecipeId::new(42));
        let id: RecipeId = serde_json::from_str("42").unwrap();
        assert_eq!(id.get(), 42);
        assert!(serde_json::from_str::<RecipeId>("\"abc\"").is_err());
    }

    #[test]
    fn test_parse_minutes_falls_back() {
        assert_eq!(parse_minutes("", 1), 1);
        assert_eq!(parse_minutes("0", 1), 1);
        assert_eq!(parse_minutes("4a5", 1), 45);
        assert_eq!(parse_minutes("30", 5), 30);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("2,5"), Some(2.5));
        assert_eq!(parse_quantity(" 3 "), Some(3.0));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("NaN"), None);
    }

    #[test]
    fn test_renumber_is_contiguous() {
        let mut steps = vec![
            DraftStep { step_order: 7, ..DraftStep::default() },
            DraftStep { step_order: 2, ..DraftStep::default() },
            DraftStep { step_order: 9, ..DraftStep::default() },
        ];
        renumber(&mut steps, |s| &mut s.step_order);
        let orders: Vec<u32> = steps.iter().map(|s| s.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_toast_dismiss_only_matching_id() {
        let mut model = Model::default();
        model.show_toast("a", ToastKind::Info);
        let first = model.active_toast.as_ref().map(|t| t.id).unwrap();
        model.show_toast("b", ToastKind::Info);
        model.dismiss_toast(first);
        assert!(model.active_toast.is_some());
        let second = model.active_toast.as_ref().map(|t| t.id).unwrap();
        model.dismiss_toast(second);
        assert!(model.active_toast.is_none());
    }

    #[test]
    fn test_difficulty_and_category_tokens() {
        assert_eq!(Difficulty::parse("medium"), Some(Difficulty::Medium));
        assert_eq!(Category::parse("MAIN_COURSE"), Some(Category::MainCourse));
        assert_eq!(
            serde_json::to_string(&Category::MainCourse).unwrap(),
            "\"MAIN_COURSE\""
        );
        assert_eq!(Category::Salad.label(), "Σαλάτα");
    }
}
