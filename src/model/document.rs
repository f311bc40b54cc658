//! Document-level types.

use super::Picture;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// An ordered collection of captioned pictures.
///
/// Use [`Document::append`] to keep pictures and captions in step. The fields
/// are public, so [`Document::check`] verifies the pairing before saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Pictures in display order
    pub pictures: Vec<Picture>,

    /// One caption per picture
    pub captions: Vec<String>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a picture together with its caption.
    pub fn append(&mut self, picture: Picture, caption: impl Into<String>) {
        self.pictures.push(picture);
        self.captions.push(caption.into());
    }

    /// Get the number of pictures.
    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    /// Check if the document has any pictures.
    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    /// Iterate over (picture, caption) pairs in order.
    pub fn entries(&self) -> impl Iterator<Item = (&Picture, &str)> {
        self.pictures
            .iter()
            .zip(self.captions.iter().map(String::as_str))
    }

    /// Whether the engine must run with shell escape.
    ///
    /// Decided by the first picture.
    pub fn allow_shell_escape(&self) -> bool {
        self.pictures
            .first()
            .is_some_and(|pic| pic.allow_shell_escape)
    }

    /// Verify the document can be saved.
    pub fn check(&self) -> Result<()> {
        if self.pictures.is_empty() {
            return Err(Error::EmptyDocument);
        }
        if self.pictures.len() != self.captions.len() {
            return Err(Error::CaptionMismatch {
                pictures: self.pictures.len(),
                captions: self.captions.len(),
            });
        }
        Ok(())
    }
}
