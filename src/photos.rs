//! Staging of user-selected photo files before upload.

use std::fmt;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::LocalPhotoId;

pub const MAX_PHOTO_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_PHOTO_DESCRIPTION_CHARS: usize = 500;
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PhotoError {
    #[error("{file_name}: input too large: {size} bytes, max {max_size}")]
    TooLarge {
        file_name: String,
        size: u64,
        max_size: u64,
    },

    #[error("{file_name}: input bytes empty")]
    Empty { file_name: String },

    #[error("{file_name}: unsupported image type {mime_type:?}")]
    UnsupportedType { file_name: String, mime_type: String },
}

impl PhotoError {
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::TooLarge { file_name, .. }
            | Self::Empty { file_name }
            | Self::UnsupportedType { file_name, .. } => file_name,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::TooLarge { file_name, .. } => format!("{file_name}: Μέγιστο μέγεθος 50MB"),
            Self::Empty { file_name } => format!("{file_name}: Το αρχείο είναι κενό."),
            Self::UnsupportedType { file_name, .. } => {
                format!("{file_name}: Μη αποδεκτός τύπος.")
            }
        }
    }
}

/// A file picked in the shell. `preview_url` is the object URL the shell
/// created for it; the core decides when it is revoked.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .field("preview_url", &self.preview_url)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct PendingPhoto {
    pub local_id: LocalPhotoId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
    pub preview_url: Option<String>,
    pub description: String,
}

impl fmt::Debug for PendingPhoto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPhoto")
            .field("local_id", &self.local_id)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl PendingPhoto {
    pub fn set_description(&mut self, description: &str) {
        self.description = clamp_chars(description, MAX_PHOTO_DESCRIPTION_CHARS);
    }
}

#[must_use]
pub fn clamp_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn is_generic_mime(mime: &str) -> bool {
    let mime = mime.trim();
    mime.is_empty() || mime == "application/octet-stream"
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    match format {
        ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::WebP => Some(format.to_mime_type()),
        _ => None,
    }
}

/// Checks size and type and returns the effective MIME type.
pub fn validate(file: &SelectedFile) -> Result<String, PhotoError> {
    let size = file.size_bytes.max(file.bytes.len() as u64);
    if size > MAX_PHOTO_BYTES {
        return Err(PhotoError::TooLarge {
            file_name: file.file_name.clone(),
            size,
            max_size: MAX_PHOTO_BYTES,
        });
    }
    if file.bytes.is_empty() {
        return Err(PhotoError::Empty {
            file_name: file.file_name.clone(),
        });
    }

    let declared = file.mime_type.trim().to_lowercase();
    let effective = if is_generic_mime(&declared) {
        sniff_mime(&file.bytes).map(str::to_string).unwrap_or(declared)
    } else {
        declared
    };

    if ALLOWED_MIME_TYPES.contains(&effective.as_str()) {
        Ok(effective)
    } else {
        Err(PhotoError::UnsupportedType {
            file_name: file.file_name.clone(),
            mime_type: effective,
        })
    }
}

pub fn stage(file: SelectedFile) -> Result<PendingPhoto, PhotoError> {
    let mime_type = validate(&file)?;
    Ok(PendingPhoto {
        local_id: LocalPhotoId::generate(),
        size_bytes: file.size_bytes.max(file.bytes.len() as u64),
        file_name: file.file_name,
        mime_type,
        bytes: file.bytes,
        preview_url: file.preview_url,
        description: String::new(),
    })
}

/// Outcome of staging several files at once. A rejected file never takes
/// its siblings down with it.
#[derive(Debug, Default)]
pub struct StagedBatch {
    pub accepted: Vec<PendingPhoto>,
    pub rejected: Vec<PhotoError>,
    /// Previews of rejected files, to be released right away.
    pub orphaned_previews: Vec<String>,
}

#[must_use]
pub fn stage_all(files: Vec<SelectedFile>) -> StagedBatch {
    let mut batch = StagedBatch::default();
    for file in files {
        let preview = file.preview_url.clone();
        match stage(file) {
            Ok(photo) => {
                debug!(file = %photo.file_name, mime = %photo.mime_type, "photo staged");
                batch.accepted.push(photo);
            }
            Err(e) => {
                warn!(error = %e, "photo rejected");
                batch.orphaned_previews.extend(preview);
                batch.rejected.push(e);
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn file(name: &str, mime: &str, size: u64) -> SelectedFile {
        SelectedFile {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            size_bytes: size,
            bytes: vec![1, 2, 3],
            preview_url: Some(format!("blob:{name}")),
        }
    }

    #[test]
    fn test_rejects_oversized_file() {
        let err = validate(&file("big.jpg", "image/jpeg", MAX_PHOTO_BYTES + 1)).unwrap_err();
        assert!(matches!(err, PhotoError::TooLarge { .. }));
        assert!(err.user_message().contains("50MB"));
    }

    #[test]
    fn test_accepts_limit_exactly() {
        assert!(validate(&file("ok.jpg", "image/jpeg", MAX_PHOTO_BYTES)).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate(&file("doc.pdf", "application/pdf", 10)).unwrap_err();
        assert_eq!(err.user_message(), "doc.pdf: Μη αποδεκτός τύπος.");
    }

    #[test]
    fn test_sniffs_generic_mime() {
        let mut f = file("photo", "", 12);
        f.bytes = PNG_MAGIC.to_vec();
        assert_eq!(validate(&f).unwrap(), "image/png");

        let mut f = file("blob", "application/octet-stream", 3);
        f.bytes = b"abc".to_vec();
        assert!(validate(&f).is_err());
    }

    #[test]
    fn test_batch_keeps_valid_siblings() {
        let batch = stage_all(vec![
            file("a.png", "image/png", 10),
            file("b.txt", "text/plain", 10),
            file("c.webp", "image/webp", 10),
        ]);
        assert_eq!(batch.accepted.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].file_name(), "b.txt");
        assert_eq!(batch.orphaned_previews, vec!["blob:b.txt".to_string()]);
    }

    #[test]
    fn test_description_is_clamped() {
        let mut photo = stage(file("a.png", "image/png", 10)).unwrap();
        photo.set_description(&"α".repeat(600));
        assert_eq!(photo.description.chars().count(), MAX_PHOTO_DESCRIPTION_CHARS);
    }
}
