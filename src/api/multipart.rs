use uuid::Uuid;

use crate::photos::PendingPhoto;

/// Form field the upload endpoints read the file from.
pub const PHOTO_FIELD: &str = "photo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    /// Single-part `multipart/form-data` body carrying the photo file.
    #[must_use]
    pub fn photo(photo: &PendingPhoto) -> Self {
        let boundary = format!("----recipe-form-{}", Uuid::new_v4().simple());
        let file_name = photo.file_name.replace(['"', '\r', '\n'], "_");

        let mut body = Vec::with_capacity(photo.bytes.len() + 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{PHOTO_FIELD}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", photo.mime_type).as_bytes());
        body.extend_from_slice(&photo.bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Self { boundary, body }
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}
