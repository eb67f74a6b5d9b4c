//! Request payloads and the raw shapes the backend answers with.
//!
//! Responses are deserialised into `Raw*` types that tolerate missing
//! fields and both ingredient-reference shapes, then normalised into the
//! model types.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::model::{
    Category, Difficulty, IngredientId, PhotoRef, QuantifiedIngredient, Recipe, RecipeId, Step,
    StepId,
};
use crate::units::MeasurementUnit;

pub const UNKNOWN_INGREDIENT_NAME: &str = "Άγνωστο";
pub const AUTO_INGREDIENT_DESCRIPTION_PREFIX: &str = "Αυτόματα δημιουργημένο υλικό: ";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLine {
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub measurement_unit: MeasurementUnit,
    pub name: String,
}

impl IngredientLine {
    /// Drops references without a resolvable ingredient id.
    #[must_use]
    pub fn from_refs(refs: &[QuantifiedIngredient]) -> Vec<Self> {
        refs.iter()
            .filter_map(|r| {
                Some(Self {
                    ingredient_id: r.ingredient_id?,
                    quantity: r.quantity,
                    measurement_unit: r.measurement_unit,
                    name: r.name.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipePayload {
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: Category,
    pub total_duration: u32,
    pub recipe_ingredients: Vec<IngredientLine>,
    /// Steps and photos are created by their own calls afterwards.
    pub steps: Vec<serde_json::Value>,
    pub photos: Vec<serde_json::Value>,
}

/// Partial update: only the populated section is sent.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_ingredients: Option<Vec<IngredientLine>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStepPayload {
    pub title: String,
    pub description: String,
    pub step_order: u32,
    pub duration: u32,
    pub recipe_id: RecipeId,
    pub step_ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepIngredientLine {
    pub step_id: StepId,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub measurement_unit: MeasurementUnit,
    pub name: String,
    pub id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStepPayload {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub step_order: u32,
    pub duration: u32,
    pub recipe_id: RecipeId,
    pub step_ingredients: Vec<StepIngredientLine>,
}

impl UpdateStepPayload {
    #[must_use]
    pub fn from_step(step: &Step, recipe_id: RecipeId) -> Self {
        let step_ingredients = step
            .step_ingredients
            .iter()
            .filter_map(|r| {
                Some(StepIngredientLine {
                    step_id: step.id,
                    ingredient_id: r.ingredient_id?,
                    quantity: r.quantity,
                    measurement_unit: r.measurement_unit,
                    name: r.name.clone(),
                    id: r.entry_id,
                })
            })
            .collect();

        Self {
            id: step.id,
            title: step.title.clone(),
            description: step.description.clone(),
            step_order: step.step_order,
            duration: step.duration.max(1),
            recipe_id,
            step_ingredients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIngredientPayload {
    pub name: String,
    pub description: String,
}

impl CreateIngredientPayload {
    #[must_use]
    pub fn auto(name: &str) -> Self {
        let name = name.trim().to_string();
        Self {
            description: format!("{AUTO_INGREDIENT_DESCRIPTION_PREFIX}{name}"),
            name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawNestedIngredient {
    pub id: Option<IngredientId>,
    pub name: Option<String>,
}

/// Ingredient reference as the backend returns it: flat
/// (`{ingredientId, name, ...}`) or nested (`{id, ingredient: {id, name}}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawIngredientRef {
    pub id: Option<i64>,
    pub ingredient_id: Option<IngredientId>,
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub measurement_unit: Option<String>,
    pub ingredient: Option<RawNestedIngredient>,
}

impl RawIngredientRef {
    #[must_use]
    pub fn normalize(self) -> QuantifiedIngredient {
        let nested = self.ingredient.unwrap_or_default();
        let has_link = self.ingredient_id.is_some() || nested.id.is_some();

        let ingredient_id = self
            .ingredient_id
            .or(nested.id)
            .or_else(|| if has_link { None } else { self.id.map(IngredientId::new) });
        let entry_id = if has_link { self.id } else { None };

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or(nested.name.filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| UNKNOWN_INGREDIENT_NAME.to_string());

        QuantifiedIngredient {
            ingredient_id,
            name,
            quantity: self.quantity.filter(|q| q.is_finite()).unwrap_or(0.0),
            measurement_unit: self
                .measurement_unit
                .as_deref()
                .and_then(MeasurementUnit::parse)
                .unwrap_or(MeasurementUnit::FALLBACK),
            entry_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawStep {
    pub id: StepId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub step_order: Option<u32>,
    pub step_ingredients: Option<Vec<RawIngredientRef>>,
    pub photos: Option<Vec<PhotoRef>>,
}

impl RawStep {
    #[must_use]
    pub fn normalize(self) -> Step {
        Step {
            id: self.id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            duration: self.duration.unwrap_or(0),
            step_order: self.step_order.unwrap_or(0),
            step_ingredients: self
                .step_ingredients
                .unwrap_or_default()
                .into_iter()
                .map(RawIngredientRef::normalize)
                .collect(),
            photos: self.photos.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecipe {
    pub id: RecipeId,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_difficulty")]
    pub difficulty: Option<Difficulty>,
    #[serde(deserialize_with = "lenient_category")]
    pub category: Option<Category>,
    pub total_duration: Option<u32>,
    pub recipe_ingredients: Option<Vec<RawIngredientRef>>,
    pub steps: Option<Vec<RawStep>>,
    pub photos: Option<Vec<PhotoRef>>,
}

/// An unrecognised choice reads as unset, so one odd token does not fail the
/// whole recipe.
fn lenient_choice<'de, D, T>(
    deserializer: D,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::String(raw) => parse(&raw),
        _ => None,
    };
    if parsed.is_none() {
        warn!(field, "unrecognised choice from the backend, using the default");
    }
    Ok(parsed)
}

fn lenient_difficulty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Difficulty>, D::Error> {
    lenient_choice(d, "difficulty", Difficulty::parse)
}

fn lenient_category<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Category>, D::Error> {
    lenient_choice(d, "category", Category::parse)
}

impl RawRecipe {
    /// Steps come out sorted by `stepOrder`; the sort is stable so equal
    /// orders keep the backend's sequence.
    #[must_use]
    pub fn normalize(self) -> Recipe {
        let mut steps: Vec<Step> = self
            .steps
            .unwrap_or_default()
            .into_iter()
            .map(RawStep::normalize)
            .collect();
        steps.sort_by_key(|s| s.step_order);

        Recipe {
            id: self.id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            difficulty: self.difficulty.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            total_duration: self.total_duration.unwrap_or(0),
            recipe_ingredients: self
                .recipe_ingredients
                .unwrap_or_default()
                .into_iter()
                .map(RawIngredientRef::normalize)
                .collect(),
            steps,
            photos: self.photos.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_nested_shape() {
        let raw: RawIngredientRef = serde_json::from_value(serde_json::json!({
            "id": 301,
            "quantity": 2,
            "measurementUnit": "κιλά",
            "ingredient": { "id": 7, "name": "Ντομάτα" }
        }))
        .unwrap();
        let r = raw.normalize();
        assert_eq!(r.ingredient_id, Some(IngredientId::new(7)));
        assert_eq!(r.name, "Ντομάτα");
        assert_eq!(r.entry_id, Some(301));
        assert_eq!(r.measurement_unit, MeasurementUnit::Kilograms);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let raw: RawIngredientRef =
            serde_json::from_value(serde_json::json!({ "id": 5 })).unwrap();
        let r = raw.normalize();
        assert_eq!(r.ingredient_id, Some(IngredientId::new(5)));
        assert_eq!(r.name, UNKNOWN_INGREDIENT_NAME);
        assert!(r.quantity.abs() < f64::EPSILON);
        assert_eq!(r.measurement_unit, MeasurementUnit::Pieces);
        assert_eq!(r.entry_id, None);
    }

    #[test]
    fn test_normalizing_flat_reference_is_identity() {
        let original = QuantifiedIngredient {
            ingredient_id: Some(IngredientId::new(7)),
            name: "Ντομάτα".into(),
            quantity: 2.0,
            measurement_unit: MeasurementUnit::Pieces,
            entry_id: Some(11),
        };
        let json = serde_json::to_value(&original).unwrap();
        let raw: RawIngredientRef = serde_json::from_value(json).unwrap();
        assert_eq!(raw.normalize(), original);
    }

    #[test]
    fn test_recipe_steps_sorted_by_order() {
        let raw: RawRecipe = serde_json::from_value(serde_json::json!({
            "id": "12",
            "name": "Μουσακάς",
            "steps": [
                { "id": 2, "title": "β", "stepOrder": 2 },
                { "id": 1, "title": "α", "stepOrder": 1 }
            ]
        }))
        .unwrap();
        let recipe = raw.normalize();
        assert_eq!(recipe.id, RecipeId::new(12));
        let titles: Vec<&str> = recipe.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["α", "β"]);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_unknown_choices_fall_back_to_defaults() {
        let raw: RawRecipe = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "Γεμιστά",
            "difficulty": "EXTREME",
            "category": 4,
        }))
        .unwrap();
        let recipe = raw.normalize();
        assert_eq!(recipe.name, "Γεμιστά");
        assert_eq!(recipe.difficulty, Difficulty::default());
        assert_eq!(recipe.category, Category::default());

        let raw: RawRecipe = serde_json::from_value(serde_json::json!({
            "id": 9,
            "difficulty": "hard",
            "category": null,
        }))
        .unwrap();
        assert_eq!(raw.difficulty, Some(Difficulty::Hard));
        assert_eq!(raw.category, None);
    }

    #[test]
    fn test_update_step_sends_canonical_units_and_drops_unresolved() {
        let step = Step {
            id: StepId::new(4),
            title: "Βράσιμο".into(),
            description: "Βράζουμε".into(),
            duration: 0,
            step_order: 2,
            step_ingredients: vec![
                QuantifiedIngredient::new(
                    IngredientId::new(1),
                    "Νερό",
                    1.0,
                    MeasurementUnit::Liters,
                ),
                QuantifiedIngredient {
                    ingredient_id: None,
                    name: UNKNOWN_INGREDIENT_NAME.into(),
                    quantity: 0.0,
                    measurement_unit: MeasurementUnit::Pieces,
                    entry_id: None,
                },
            ],
            photos: vec![],
        };
        let payload = UpdateStepPayload::from_step(&step, RecipeId::new(3));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["duration"], 1);
        assert_eq!(json["stepIngredients"].as_array().unwrap().len(), 1);
        assert_eq!(json["stepIngredients"][0]["measurementUnit"], "LITERS");
        assert_eq!(json["stepIngredients"][0]["stepId"], 4);
    }

    #[test]
    fn test_auto_ingredient_payload() {
        let p = CreateIngredientPayload::auto("  Κάπαρη ");
        assert_eq!(p.name, "Κάπαρη");
        assert_eq!(p.description, "Αυτόματα δημιουργημένο υλικό: Κάπαρη");
    }

    #[test]
    fn test_partial_update_omits_other_sections() {
        let payload = UpdateRecipePayload {
            name: Some("Φακές".into()),
            ..UpdateRecipePayload::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Φακές" }));
    }
}
