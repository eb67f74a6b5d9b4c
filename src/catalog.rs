//! Recipe list with search filters, the details page and the ingredient
//! catalogue.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiResult, Endpoint};
use crate::model::{
    Category, Difficulty, Ingredient, IngredientId, PhotoId, PhotoRef, Recipe, RecipeId,
};
use crate::{AppError, MAX_FILTER_DURATION_MIN};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub max_duration: Option<u32>,
}

impl SearchFilters {
    /// Trims the name and clamps the duration bound to `1..=1440`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.max_duration = self
            .max_duration
            .filter(|m| *m > 0)
            .map(|m| m.min(MAX_FILTER_DURATION_MIN));
        self
    }

    /// The most selective server-side query; remaining filters are applied
    /// on the client.
    #[must_use]
    pub fn server_query(&self) -> Endpoint {
        if !self.name.is_empty() {
            Endpoint::SearchRecipes(self.name.clone())
        } else if let Some(category) = self.category {
            Endpoint::RecipesByCategory(category)
        } else if let Some(difficulty) = self.difficulty {
            Endpoint::RecipesByDifficulty(difficulty)
        } else {
            Endpoint::AllRecipes
        }
    }

    #[must_use]
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let name_ok = self.name.is_empty()
            || recipe
                .name
                .to_lowercase()
                .contains(&self.name.to_lowercase());
        name_ok
            && self.category.map_or(true, |c| recipe.category == c)
            && self.difficulty.map_or(true, |d| recipe.difficulty == d)
            && self.max_duration.map_or(true, |m| recipe.total_duration <= m)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub recipes: Vec<Recipe>,
    pub filters: SearchFilters,
    pub loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl Catalog {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Records new filters and returns the generation of the debounce
    /// timer to start.
    pub fn filters_changed(&mut self, filters: SearchFilters) -> u64 {
        self.filters = filters.normalized();
        self.generation += 1;
        self.generation
    }

    pub fn reset_filters(&mut self) -> (u64, Endpoint) {
        self.filters = SearchFilters::default();
        self.begin_query()
    }

    pub fn begin_query(&mut self) -> (u64, Endpoint) {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        (self.generation, self.filters.server_query())
    }

    /// Query to run once the timer fires, unless newer input arrived.
    pub fn debounce_elapsed(&mut self, generation: u64) -> Option<(u64, Endpoint)> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale search timer dropped");
            return None;
        }
        Some(self.begin_query())
    }

    pub fn results(&mut self, generation: u64, result: ApiResult<Vec<Recipe>>) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale recipe list dropped");
            return false;
        }
        self.loading = false;
        match result {
            Ok(recipes) => {
                self.recipes = recipes
                    .into_iter()
                    .filter(|r| self.filters.matches(r))
                    .collect();
            }
            Err(e) => {
                debug!(error = %e, "recipe list failed");
                self.error = Some("Αποτυχία φόρτωσης συνταγών.".to_string());
            }
        }
        true
    }

    pub fn forget(&mut self, id: RecipeId) {
        self.recipes.retain(|r| r.id != id);
    }
}

#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub recipe_id: RecipeId,
    pub recipe: Option<Recipe>,
    pub gallery: Vec<PhotoRef>,
    pub cover_photo: Option<PhotoId>,
    pub error: Option<String>,
}

impl RecipeDetails {
    #[must_use]
    pub const fn new(recipe_id: RecipeId) -> Self {
        Self {
            recipe_id,
            recipe: None,
            gallery: Vec::new(),
            cover_photo: None,
            error: None,
        }
    }

    /// Returns the cover photo to remember for the session, if any.
    pub fn loaded(&mut self, result: ApiResult<Recipe>) -> Option<PhotoId> {
        match result {
            Ok(recipe) => {
                self.cover_photo = recipe.photos.first().map(|p| p.id).or(self.cover_photo);
                if self.gallery.is_empty() {
                    self.gallery = recipe.photos.clone();
                }
                self.recipe = Some(recipe);
                self.error = None;
                self.cover_photo
            }
            Err(e) => {
                debug!(error = %e, recipe_id = %self.recipe_id, "details failed to load");
                self.error = Some("Δεν βρέθηκαν τα στοιχεία της συνταγής".to_string());
                None
            }
        }
    }

    /// A cached cover only fills in while the recipe itself is not there.
    pub fn cached_cover(&mut self, cover: Option<PhotoId>) {
        if self.recipe.is_none() && self.cover_photo.is_none() {
            self.cover_photo = cover;
        }
    }

    pub fn gallery_loaded(&mut self, result: ApiResult<Vec<PhotoRef>>) -> Option<AppError> {
        match result {
            Ok(photos) => {
                self.gallery = photos;
                None
            }
            Err(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngredientCatalog {
    pub items: Vec<Ingredient>,
    pub loading: bool,
    pub error: Option<String>,
}

impl IngredientCatalog {
    pub fn loaded(&mut self, result: ApiResult<Vec<Ingredient>>) {
        self.loading = false;
        match result {
            Ok(mut items) => {
                items.sort_by_key(|i| i.name.to_lowercase());
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                debug!(error = %e, "ingredient catalogue failed");
                self.error = Some("Αποτυχία φόρτωσης υλικών.".to_string());
            }
        }
    }

    pub fn forget(&mut self, id: IngredientId) {
        self.items.retain(|i| i.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn recipe(id: i64, name: &str, category: Category, minutes: u32) -> Recipe {
        Recipe {
            id: RecipeId::new(id),
            name: name.into(),
            category,
            total_duration: minutes,
            ..Recipe::default()
        }
    }

    #[test]
    fn test_server_query_prefers_name() {
        let filters = SearchFilters {
            name: " μους ".into(),
            category: Some(Category::MainCourse),
            ..SearchFilters::default()
        }
        .normalized();
        assert_eq!(filters.server_query(), Endpoint::SearchRecipes("μους".into()));

        let filters = SearchFilters {
            difficulty: Some(Difficulty::Hard),
            ..SearchFilters::default()
        };
        assert_eq!(filters.server_query(), Endpoint::RecipesByDifficulty(Difficulty::Hard));
        assert_eq!(SearchFilters::default().server_query(), Endpoint::AllRecipes);
    }

    #[test]
    fn test_remaining_filters_apply_locally() {
        let mut catalog = Catalog::default();
        let generation = catalog.filters_changed(SearchFilters {
            name: "σαλάτα".into(),
            max_duration: Some(5000),
            category: Some(Category::Salad),
            ..SearchFilters::default()
        });
        assert_eq!(catalog.filters.max_duration, Some(MAX_FILTER_DURATION_MIN));
        let (generation, _) = catalog.debounce_elapsed(generation).unwrap();
        catalog.results(
            generation,
            Ok(vec![
                recipe(1, "Χωριάτικη Σαλάτα", Category::Salad, 10),
                recipe(2, "Σαλάτα ζεστή", Category::MainCourse, 10),
            ]),
        );
        let ids: Vec<i64> = catalog.recipes.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_stale_search_dropped() {
        let mut catalog = Catalog::default();
        let first = catalog.filters_changed(SearchFilters::default());
        let second = catalog.filters_changed(SearchFilters::default());
        assert!(catalog.debounce_elapsed(first).is_none());
        let (current, _) = catalog.debounce_elapsed(second).unwrap();
        assert!(!catalog.results(second, Ok(vec![])));
        assert!(catalog.results(current, Ok(vec![])));
    }

    #[test]
    fn test_details_cover_from_first_photo() {
        let mut details = RecipeDetails::new(RecipeId::new(1));
        details.cached_cover(Some(PhotoId::new(5)));
        assert_eq!(details.cover_photo, Some(PhotoId::new(5)));
        let recipe = Recipe {
            photos: vec![
                PhotoRef { id: PhotoId::new(8), description: None, file_name: None },
                PhotoRef { id: PhotoId::new(9), description: None, file_name: None },
            ],
            ..Recipe::default()
        };
        assert_eq!(details.loaded(Ok(recipe)), Some(PhotoId::new(8)));
        details.cached_cover(Some(PhotoId::new(5)));
        assert_eq!(details.cover_photo, Some(PhotoId::new(8)));
    }

    #[test]
    fn test_details_failure_message() {
        let mut details = RecipeDetails::new(RecipeId::new(1));
        assert!(details
            .loaded(Err(AppError::new(ErrorKind::NotFound, "missing")))
            .is_none());
        assert!(details.error.is_some());
    }
}
