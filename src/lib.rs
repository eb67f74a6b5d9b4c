#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod app;
pub mod capabilities;
pub mod catalog;
pub mod composer;
pub mod composition;
pub mod edit;
pub mod event;
pub mod execution;
pub mod model;
pub mod photos;
pub mod picker;
pub mod units;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::{ConfirmAction, Event};
pub use model::Model;
pub use view::ViewModel;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const INGREDIENT_SEARCH_DEBOUNCE_MS: u64 = 500;
pub const RECIPE_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const MIN_INGREDIENT_SEARCH_CHARS: usize = 2;
pub const DEFAULT_STEP_DURATION_MIN: u32 = 5;
pub const MIN_RECIPE_NAME_CHARS: usize = 2;
pub const MAX_RECIPE_NAME_CHARS: usize = 30;
pub const MAX_RECIPE_DESCRIPTION_CHARS: usize = 500;
pub const MAX_FILTER_DURATION_MIN: u32 = 1440;
pub const PROGRESS_CAP_PERCENT: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Conflict,
    PayloadTooLarge,
    Serialization,
    Deserialization,
    PhotoRejected,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::PhotoRejected => "PHOTO_REJECTED",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Δεν ήταν δυνατή η σύνδεση με τον διακομιστή. Δοκιμάστε ξανά.".into()
            }
            ErrorKind::Timeout => "Το αίτημα άργησε να απαντηθεί. Δοκιμάστε ξανά.".into(),
            ErrorKind::Validation | ErrorKind::PhotoRejected => self.message.clone(),
            ErrorKind::NotFound => "Το στοιχείο δεν βρέθηκε.".into(),
            ErrorKind::Conflict => {
                "Η ενέργεια συγκρούεται με πρόσφατη αλλαγή. Ανανεώστε και δοκιμάστε ξανά.".into()
            }
            ErrorKind::PayloadTooLarge => "Το αρχείο είναι πολύ μεγάλο.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "Σφάλμα δεδομένων. Δοκιμάστε ξανά αργότερα.".into()
            }
            ErrorKind::InvalidState => "Η εφαρμογή βρέθηκε σε μη έγκυρη κατάσταση.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "Παρουσιάστηκε απρόσμενο σφάλμα. Δοκιμάστε ξανά.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            408 | 504 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            413 => ErrorKind::PayloadTooLarge,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<model::ValidationError> for AppError {
    fn from(e: model::ValidationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

impl From<photos::PhotoError> for AppError {
    fn from(e: photos::PhotoError) -> Self {
        let kind = match &e {
            photos::PhotoError::TooLarge { .. } => ErrorKind::PayloadTooLarge,
            photos::PhotoError::Empty { .. } | photos::PhotoError::UnsupportedType { .. } => {
                ErrorKind::PhotoRejected
            }
        };
        AppError::new(kind, e.user_message()).with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(id: u64, message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            id,
            message: message.into(),
            kind,
            duration_ms: kind.default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}
