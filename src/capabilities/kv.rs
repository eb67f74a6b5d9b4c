//! Session-scoped key-value cache. Holds the cover photo of recently
//! opened recipes so the details page can show it before the recipe loads.

use crux_kv::KeyValue;
use thiserror::Error;
use tracing::warn;

use crate::event::Event;
use crate::model::{PhotoId, RecipeId};

pub type KvCapability = KeyValue<Event>;

pub const SESSION_PREFIX: &str = "session";
pub const MAX_KEY_LENGTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvKeyError {
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KvKey {
    key: String,
}

impl KvKey {
    pub fn session(key: impl Into<String>) -> Result<Self, KvKeyError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self { key })
    }

    #[must_use]
    pub fn raw(&self) -> String {
        format!("{SESSION_PREFIX}:{}", self.key)
    }

    fn validate(key: &str) -> Result<(), KvKeyError> {
        let reason = if key.trim().is_empty() {
            "key cannot be empty"
        } else if key.len() > MAX_KEY_LENGTH {
            "key exceeds maximum length"
        } else if key.contains("..") || key.starts_with('/') {
            "key cannot contain path traversal sequences"
        } else if key.chars().any(char::is_control) {
            "key contains control characters"
        } else {
            return Ok(());
        };
        Err(KvKeyError::InvalidKey {
            key: key.chars().take(50).collect(),
            reason,
        })
    }
}

pub fn cover_photo_key(recipe_id: RecipeId) -> Result<KvKey, KvKeyError> {
    KvKey::session(format!("cover-photo/{recipe_id}"))
}

fn decode_photo_id(bytes: &[u8]) -> Option<PhotoId> {
    std::str::from_utf8(bytes)
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .map(PhotoId::new)
}

pub fn remember_cover_photo(kv: &KvCapability, recipe_id: RecipeId, photo_id: PhotoId) {
    match cover_photo_key(recipe_id) {
        Ok(key) => kv.set(key.raw(), photo_id.to_string().into_bytes(), |_| {
            Event::SessionCacheWritten
        }),
        Err(e) => warn!(error = %e, "cover photo not cached"),
    }
}

pub fn recall_cover_photo<F>(kv: &KvCapability, recipe_id: RecipeId, make_event: F)
where
    F: FnOnce(Option<PhotoId>) -> Event + Send + Sync + 'static,
{
    match cover_photo_key(recipe_id) {
        Ok(key) => kv.get(key.raw(), move |result| {
            let cached = result.ok().flatten().as_deref().and_then(decode_photo_id);
            make_event(cached)
        }),
        Err(e) => warn!(error = %e, "cover photo cache skipped"),
    }
}
