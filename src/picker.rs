//! Ingredient picker: debounced search, selection or on-the-fly creation,
//! and emission of a quantified reference into a target list.
//!
//! Every keystroke starts a new search generation. The delayed search and
//! its response both carry the generation they were started for; anything
//! older than the current generation is dropped, so the last keystroke
//! always wins.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{parse_quantity, Ingredient, IngredientId, QuantifiedIngredient, ValidationError};
use crate::units::MeasurementUnit;
use crate::MIN_INGREDIENT_SEARCH_CHARS;

/// List that receives the picked ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerTarget {
    DraftRecipe,
    EditRecipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPlan {
    /// Term too short: results were cleared, nothing to schedule.
    Clear,
    Debounce { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerSubmission {
    Ready(QuantifiedIngredient),
    CreateNew {
        name: String,
        quantity: f64,
        unit: MeasurementUnit,
    },
}

#[derive(Debug, Clone, Default)]
pub struct IngredientPicker {
    pub term: String,
    pub quantity: String,
    pub unit: MeasurementUnit,
    pub results: Vec<Ingredient>,
    pub selected: Option<Ingredient>,
    pub is_creating_new: bool,
    /// A create-ingredient call is in flight.
    pub creating: bool,
    generation: u64,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl IngredientPicker {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Typing always drops the current selection.
    pub fn set_term(&mut self, term: &str) -> SearchPlan {
        self.term = term.to_string();
        self.selected = None;
        self.is_creating_new = false;
        self.generation += 1;

        if term.trim().chars().count() < MIN_INGREDIENT_SEARCH_CHARS {
            self.results.clear();
            return SearchPlan::Clear;
        }
        SearchPlan::Debounce {
            generation: self.generation,
        }
    }

    /// The search term to query, if the timer is still the latest one.
    #[must_use]
    pub fn debounce_elapsed(&self, generation: u64) -> Option<String> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale picker timer dropped");
            return None;
        }
        let term = self.term.trim();
        (term.chars().count() >= MIN_INGREDIENT_SEARCH_CHARS).then(|| term.to_string())
    }

    pub fn apply_results(&mut self, generation: u64, results: Vec<Ingredient>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale picker results dropped");
            return false;
        }
        self.is_creating_new = !results.iter().any(|i| same_name(&i.name, &self.term));
        self.results = results;
        true
    }

    pub fn search_failed(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.results.clear();
        self.is_creating_new = !self.term.trim().is_empty();
        true
    }

    pub fn select(&mut self, id: IngredientId) -> bool {
        let Some(found) = self.results.iter().find(|i| i.id == id).cloned() else {
            return false;
        };
        self.term.clone_from(&found.name);
        self.selected = Some(found);
        self.is_creating_new = false;
        self.results.clear();
        self.generation += 1;
        true
    }

    pub fn set_quantity(&mut self, quantity: &str) {
        self.quantity = quantity.to_string();
    }

    pub fn set_unit(&mut self, unit: MeasurementUnit) {
        self.unit = unit;
    }

    /// Decides how the confirm button resolves. Fields are left untouched;
    /// callers reset after the reference has actually been emitted.
    pub fn prepare(&self) -> Result<PickerSubmission, ValidationError> {
        let name = self.term.trim();
        let quantity = parse_quantity(&self.quantity);
        let (false, Some(quantity)) = (name.is_empty(), quantity) else {
            return Err(ValidationError::IncompleteIngredient);
        };

        let existing = self
            .selected
            .as_ref()
            .or_else(|| self.results.iter().find(|i| same_name(&i.name, name)));

        Ok(match existing {
            Some(ingredient) => PickerSubmission::Ready(QuantifiedIngredient::new(
                ingredient.id,
                ingredient.name.clone(),
                quantity,
                self.unit,
            )),
            None => PickerSubmission::CreateNew {
                name: name.to_string(),
                quantity,
                unit: self.unit,
            },
        })
    }

    /// Clears the input fields after an emission. The generation keeps
    /// counting so late responses for the old term are still dropped.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: i64, name: &str) -> Ingredient {
        Ingredient {
            id: IngredientId::new(id),
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_short_term_clears_without_search() {
        let mut picker = IngredientPicker::default();
        picker.results = vec![ingredient(1, "Αλάτι")];
        assert_eq!(picker.set_term("Α"), SearchPlan::Clear);
        assert!(picker.results.is_empty());
    }

    #[test]
    fn test_last_keystroke_wins() {
        let mut picker = IngredientPicker::default();
        let SearchPlan::Debounce { generation: first } = picker.set_term("Ντ") else {
            panic!("expected debounce");
        };
        let SearchPlan::Debounce { generation: second } = picker.set_term("Ντομ") else {
            panic!("expected debounce");
        };
        assert_eq!(picker.debounce_elapsed(first), None);
        assert_eq!(picker.debounce_elapsed(second).as_deref(), Some("Ντομ"));

        assert!(!picker.apply_results(first, vec![ingredient(1, "Ντίλ")]));
        assert!(picker.results.is_empty());
        assert!(picker.apply_results(second, vec![ingredient(7, "Ντομάτα")]));
        assert_eq!(picker.results.len(), 1);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let mut picker = IngredientPicker::default();
        let SearchPlan::Debounce { generation } = picker.set_term("ντομάτα") else {
            panic!("expected debounce");
        };
        picker.apply_results(generation, vec![ingredient(7, "Ντομάτα")]);
        assert!(!picker.is_creating_new);

        picker.set_quantity("2");
        match picker.prepare().unwrap() {
            PickerSubmission::Ready(r) => {
                assert_eq!(r.ingredient_id, Some(IngredientId::new(7)));
                assert_eq!(r.name, "Ντομάτα");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_needs_creation() {
        let mut picker = IngredientPicker::default();
        let SearchPlan::Debounce { generation } = picker.set_term("Κάπαρη") else {
            panic!("expected debounce");
        };
        picker.apply_results(generation, vec![ingredient(3, "Καπνιστό τυρί")]);
        assert!(picker.is_creating_new);
        picker.set_quantity("1,5");
        picker.set_unit(MeasurementUnit::Tablespoons);
        assert_eq!(
            picker.prepare().unwrap(),
            PickerSubmission::CreateNew {
                name: "Κάπαρη".into(),
                quantity: 1.5,
                unit: MeasurementUnit::Tablespoons,
            }
        );
    }

    #[test]
    fn test_missing_quantity_is_rejected_and_fields_kept() {
        let mut picker = IngredientPicker::default();
        picker.set_term("Ρύζι");
        assert_eq!(picker.prepare(), Err(ValidationError::IncompleteIngredient));
        assert_eq!(picker.term, "Ρύζι");

        picker.set_term("  ");
        picker.set_quantity("3");
        assert_eq!(picker.prepare(), Err(ValidationError::IncompleteIngredient));
    }

    #[test]
    fn test_select_then_typing_resets_selection() {
        let mut picker = IngredientPicker::default();
        let SearchPlan::Debounce { generation } = picker.set_term("Ελ") else {
            panic!("expected debounce");
        };
        picker.apply_results(generation, vec![ingredient(4, "Ελαιόλαδο")]);
        assert!(picker.select(IngredientId::new(4)));
        assert_eq!(picker.term, "Ελαιόλαδο");
        assert!(picker.results.is_empty());

        picker.set_term("Ελαιόλαδ");
        assert!(picker.selected.is_none());
    }

    #[test]
    fn test_reset_keeps_generation_moving() {
        let mut picker = IngredientPicker::default();
        picker.set_term("Μέλι");
        let before = picker.generation();
        picker.set_quantity("1");
        picker.reset();
        assert!(picker.term.is_empty());
        assert!(picker.quantity.is_empty());
        assert_eq!(picker.unit, MeasurementUnit::default());
        assert!(picker.generation() > before);
    }
}
