//! Step-by-step cooking walkthrough with a photo viewer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{PhotoRef, Recipe, RecipeId, Step, StepId};
use crate::PROGRESS_CAP_PERCENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkState {
    Active { index: usize },
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { index: usize },
    Finished,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerKey {
    ArrowRight,
    ArrowLeft,
    Escape,
}

/// Fullscreen viewer over the current step's photos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoViewer {
    sources: Vec<String>,
    index: Option<usize>,
}

impl PhotoViewer {
    /// New sources close the viewer.
    pub fn set_sources(&mut self, sources: Vec<String>) {
        self.sources = sources;
        self.index = None;
    }

    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Opens at the position of `src`. Unknown sources are ignored.
    pub fn open(&mut self, src: &str) -> bool {
        match self.sources.iter().position(|s| s == src) {
            Some(index) => {
                self.index = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        self.index = None;
    }

    pub fn key(&mut self, key: ViewerKey) {
        let (Some(index), count) = (self.index, self.sources.len()) else {
            return;
        };
        if count == 0 {
            self.index = None;
            return;
        }
        self.index = match key {
            ViewerKey::ArrowRight => Some((index + 1) % count),
            ViewerKey::ArrowLeft => Some((index + count - 1) % count),
            ViewerKey::Escape => None,
        };
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.index.is_some()
    }

    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.index
            .and_then(|i| self.sources.get(i))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionSession {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub steps: Vec<Step>,
    pub total_duration: u32,
    pub state: WalkState,
    pub step_photos: Vec<PhotoRef>,
    pub viewer: PhotoViewer,
    photo_generation: u64,
}

impl ExecutionSession {
    /// `None` when the recipe has no steps to walk through.
    #[must_use]
    pub fn start(recipe: &Recipe) -> Option<Self> {
        if recipe.steps.is_empty() {
            return None;
        }
        let mut steps = recipe.steps.clone();
        steps.sort_by_key(|s| s.step_order);
        Some(Self {
            recipe_id: recipe.id,
            recipe_name: recipe.name.clone(),
            steps,
            total_duration: recipe.total_duration.max(1),
            state: WalkState::Active { index: 0 },
            step_photos: Vec::new(),
            viewer: PhotoViewer::default(),
            photo_generation: 0,
        })
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            WalkState::Active { index } => Some(index),
            WalkState::Finished => None,
        }
    }

    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.current_index().and_then(|i| self.steps.get(i))
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == WalkState::Finished
    }

    pub fn next(&mut self) -> Transition {
        let WalkState::Active { index } = self.state else {
            return Transition::Unchanged;
        };
        if index + 1 < self.steps.len() {
            self.state = WalkState::Active { index: index + 1 };
            Transition::Moved { index: index + 1 }
        } else {
            self.state = WalkState::Finished;
            self.viewer.set_sources(Vec::new());
            self.step_photos.clear();
            Transition::Finished
        }
    }

    pub fn previous(&mut self) -> Transition {
        match self.state {
            WalkState::Active { index } if index > 0 => {
                self.state = WalkState::Active { index: index - 1 };
                Transition::Moved { index: index - 1 }
            }
            _ => Transition::Unchanged,
        }
    }

    /// Percentage of the total duration covered by the completed steps.
    /// Capped below 100 until the walkthrough is finished.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let index = match self.state {
            WalkState::Finished => return 100.0,
            WalkState::Active { index } => index,
        };
        let done: u64 = self.steps[..index.min(self.steps.len())]
            .iter()
            .map(|s| u64::from(s.duration))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let percent = 100.0 * done as f64 / f64::from(self.total_duration.max(1));
        percent.min(PROGRESS_CAP_PERCENT)
    }

    /// Starts a fetch of the current step's photos, invalidating any
    /// earlier one. Clears what was shown for the previous step.
    pub fn begin_photo_fetch(&mut self) -> Option<(StepId, u64)> {
        self.photo_generation += 1;
        self.step_photos.clear();
        self.viewer.set_sources(Vec::new());
        let step_id = self.current_step()?.id;
        Some((step_id, self.photo_generation))
    }

    pub fn photos_loaded(
        &mut self,
        generation: u64,
        photos: Vec<PhotoRef>,
        sources: Vec<String>,
    ) -> bool {
        if generation != self.photo_generation || self.is_finished() {
            debug!(generation, current = self.photo_generation, "stale step photos dropped");
            return false;
        }
        self.step_photos = photos;
        self.viewer.set_sources(sources);
        true
    }
}
