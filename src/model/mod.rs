//! Picture and document model.
//!
//! A [`Picture`] is a single TikZ drawing; a [`Document`] is an ordered
//! collection of captioned pictures typeset together as an article.

mod document;
mod picture;

pub use document::Document;
pub use picture::Picture;
