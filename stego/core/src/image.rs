//! Image Selection
//!
//! The carrier image a user picks for encoding or decoding. Only a fixed set
//! of raster formats is offered for selection; the service decides whether the
//! bytes actually decode.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while selecting an image
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file extension is not one of the accepted formats
    #[error("Unsupported image type '{0}'. Accepted: {accepted}", accepted = ImageFormat::accept_filter())]
    UnsupportedFormat(String),

    /// The file has no content
    #[error("Image file is empty")]
    Empty,

    /// The file exceeds the configured size limit
    #[error("Image is {size} bytes, larger than the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected file
        size: u64,
        /// Configured limit
        limit: u64,
    },

    /// Failed to read the file
    #[error("Failed to read image at {path}: {source}")]
    Io {
        /// The path that was attempted
        path: String,
        /// The underlying IO error
        source: std::io::Error,
    },
}

/// Raster formats accepted for selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// TIFF
    Tiff,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// Every accepted format, in display order
    pub const ACCEPTED: [ImageFormat; 5] = [
        ImageFormat::Png,
        ImageFormat::Jpeg,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Webp,
    ];

    /// File extensions recognised for this format (lowercase, no dot)
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Bmp => &["bmp"],
            Self::Tiff => &["tif", "tiff"],
            Self::Webp => &["webp"],
        }
    }

    /// MIME type sent with the multipart image part
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
        }
    }

    /// Look up a format by extension (case-insensitive)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ACCEPTED
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Look up a format from a file path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Comma separated `.ext` list, suitable for a file picker filter
    #[must_use]
    pub fn accept_filter() -> String {
        Self::ACCEPTED
            .iter()
            .flat_map(|format| format.extensions().iter())
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A selected image: name, format and raw bytes
///
/// Bytes are reference counted so the session, the validator output and an
/// in-flight request can all hold the same image without copying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFile {
    file_name: String,
    format: ImageFormat,
    bytes: Arc<[u8]>,
}

impl ImageFile {
    /// Build an image from bytes already in memory
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::UnsupportedFormat`] when the name has no accepted
    /// extension and [`ImageError::Empty`] when `bytes` is empty.
    pub fn from_bytes(
        file_name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self, ImageError> {
        let file_name = file_name.into();
        let format = ImageFormat::from_path(Path::new(&file_name))
            .ok_or_else(|| ImageError::UnsupportedFormat(file_name.clone()))?;
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self {
            file_name,
            format,
            bytes,
        })
    }

    /// Read an image from disk, enforcing the format filter and a size limit
    ///
    /// # Errors
    ///
    /// Returns an [`ImageError`] if the format is not accepted, the file is
    /// empty or too large, or it cannot be read.
    pub async fn open(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let io_error = |source| ImageError::Io {
            path: path.display().to_string(),
            source,
        };

        if ImageFormat::from_path(path).is_none() {
            return Err(ImageError::UnsupportedFormat(path.display().to_string()));
        }

        let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
        if size > max_bytes {
            return Err(ImageError::TooLarge {
                size,
                limit: max_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(io_error)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        tracing::debug!(file = %file_name, size, "Image selected");
        Self::from_bytes(file_name, bytes)
    }

    /// File name shown to the user and sent with the upload
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Detected format
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw image bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a constructed image; present for API symmetry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
