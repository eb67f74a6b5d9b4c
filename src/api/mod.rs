//! Backend REST contract: where things live and what goes over the wire.

pub mod dto;
pub mod multipart;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{Category, Difficulty, IngredientId, PhotoId, RecipeId, StepId};
use crate::{AppError, ErrorKind, DEFAULT_API_BASE_URL};

pub type ApiResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl ApiConfig {
    /// Accepts absolute `http`/`https` URLs with a host.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| {
            AppError::new(ErrorKind::Validation, "Μη έγκυρη διεύθυνση διακομιστή.")
                .with_internal(e.to_string())
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::new(
                ErrorKind::Validation,
                "Μη έγκυρη διεύθυνση διακομιστή.",
            )
            .with_context("scheme", parsed.scheme()));
        }
        if parsed.host_str().is_none() {
            return Err(AppError::new(
                ErrorKind::Validation,
                "Μη έγκυρη διεύθυνση διακομιστή.",
            )
            .with_internal("missing host"));
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AppError::new(ErrorKind::InvalidState, "invalid API base URL")
                .with_internal(e.to_string())
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                AppError::new(ErrorKind::InvalidState, "API base URL cannot be a base")
            })?;
            segments.pop_if_empty();
            segments.extend(endpoint.segments());
        }

        let query = endpoint.query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    CreateRecipe,
    AllRecipes,
    /// `GET`, `PUT` and `DELETE` share this address.
    Recipe(RecipeId),
    SearchRecipes(String),
    RecipesByCategory(Category),
    RecipesByDifficulty(Difficulty),

    CreateIngredient,
    SearchIngredients(String),
    AllIngredients,
    Ingredient(IngredientId),

    CreateStep,
    StepsByRecipe(RecipeId),
    Step(StepId),

    UploadRecipePhoto { recipe_id: RecipeId, description: String },
    UploadStepPhoto { step_id: StepId, description: String },
    Photo(PhotoId),
    PhotosByRecipe(RecipeId),
    PhotosByStep(StepId),
    PhotoImage(PhotoId),
}

impl Endpoint {
    fn segments(&self) -> &'static [&'static str] {
        match self {
            Self::CreateRecipe | Self::Recipe(_) => &["recipes"],
            Self::AllRecipes => &["recipes", "all"],
            Self::SearchRecipes(_) => &["recipes", "search"],
            Self::RecipesByCategory(_) => &["recipes", "by-category"],
            Self::RecipesByDifficulty(_) => &["recipes", "by-difficulty"],
            Self::CreateIngredient | Self::Ingredient(_) => &["ingredients"],
            Self::SearchIngredients(_) => &["ingredients", "search"],
            Self::AllIngredients => &["ingredients", "all"],
            Self::CreateStep | Self::Step(_) => &["steps"],
            Self::StepsByRecipe(_) => &["steps", "by-recipe"],
            Self::UploadRecipePhoto { .. } => &["photos", "recipe", "upload"],
            Self::UploadStepPhoto { .. } => &["photos", "step", "upload"],
            Self::Photo(_) => &["photos"],
            Self::PhotosByRecipe(_) => &["photos", "by-recipe"],
            Self::PhotosByStep(_) => &["photos", "by-step"],
            Self::PhotoImage(_) => &["photos", "image"],
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::CreateRecipe
            | Self::AllRecipes
            | Self::CreateIngredient
            | Self::AllIngredients
            | Self::CreateStep => Vec::new(),
            Self::Recipe(id) => vec![("id", id.to_string())],
            Self::Ingredient(id) => vec![("id", id.to_string())],
            Self::Step(id) => vec![("id", id.to_string())],
            Self::Photo(id) | Self::PhotoImage(id) => vec![("id", id.to_string())],
            Self::SearchRecipes(name) | Self::SearchIngredients(name) => {
                vec![("name", name.clone())]
            }
            Self::RecipesByCategory(c) => vec![("category", c.token().to_string())],
            Self::RecipesByDifficulty(d) => vec![("difficulty", d.token().to_string())],
            Self::StepsByRecipe(id) | Self::PhotosByRecipe(id) => {
                vec![("recipeId", id.to_string())]
            }
            Self::PhotosByStep(id) => vec![("stepId", id.to_string())],
            Self::UploadRecipePhoto {
                recipe_id,
                description,
            } => vec![
                ("recipeId", recipe_id.to_string()),
                ("description", description.clone()),
            ],
            Self::UploadStepPhoto {
                step_id,
                description,
            } => vec![
                ("stepId", step_id.to_string()),
                ("description", description.clone()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(endpoint: &Endpoint) -> String {
        ApiConfig::default().url(endpoint).unwrap().to_string()
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(url(&Endpoint::CreateRecipe), "http://localhost:8080/api/recipes");
        assert_eq!(
            url(&Endpoint::AllIngredients),
            "http://localhost:8080/api/ingredients/all"
        );
    }

    #[test]
    fn test_query_parameters_are_encoded() {
        assert_eq!(
            url(&Endpoint::SearchIngredients("ντομάτα & ρύζι".into())),
            "http://localhost:8080/api/ingredients/search?name=%CE%BD%CF%84%CE%BF%CE%BC%CE%AC%CF%84%CE%B1+%26+%CF%81%CF%8D%CE%B6%CE%B9"
        );
        assert_eq!(
            url(&Endpoint::RecipesByCategory(Category::MainCourse)),
            "http://localhost:8080/api/recipes/by-category?category=MAIN_COURSE"
        );
    }

    #[test]
    fn test_upload_carries_owner_and_description() {
        let u = url(&Endpoint::UploadStepPhoto {
            step_id: StepId::new(9),
            description: "Φωτογραφία βήματος".into(),
        });
        assert!(u.starts_with("http://localhost:8080/api/photos/step/upload?stepId=9&description="));
    }

    #[test]
    fn test_configured_base_url_with_trailing_slash() {
        let config = ApiConfig::new("https://recipes.example.com/api/").unwrap();
        assert_eq!(
            config.url(&Endpoint::Recipe(RecipeId::new(3))).unwrap().as_str(),
            "https://recipes.example.com/api/recipes?id=3"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(ApiConfig::new("ftp://example.com").is_err());
        assert!(ApiConfig::new("not a url").is_err());
    }
}
