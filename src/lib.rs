//! # tikzrender
//!
//! Render TikZ pictures to PDF, SVG and standalone LaTeX source by driving
//! an installed TeX toolchain.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tikzrender::{Picture, SaveTarget};
//!
//! fn main() -> tikzrender::Result<()> {
//!     let pic = Picture::new(r"\draw (0,0) -- (1,1);").with_options("thick");
//!
//!     // Typeset with lualatex and move the result to ./out.pdf
//!     tikzrender::save(&SaveTarget::pdf("out"), &pic)?;
//!
//!     // Emit the source only
//!     println!("{}", tikzrender::to_source(&pic));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Isolated runs**: every render works in its own scratch directory
//! - **Engine quirks**: reruns on changed labels, one automatic retry with
//!   `luatex85` for the standalone class on newer LuaTeX
//! - **Two SVG routes**: PDF via `pdftocairo`, or DVI/XDV via `dvisvgm`
//! - **Inline display**: SVG markup with identifiers made unique per render
//! - **Captioned documents**: several pictures typeset as one article
//! - **Batch rendering**: independent jobs in parallel with Rayon

pub mod config;
pub mod display;
pub mod emit;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod target;

// Re-export commonly used types
pub use config::{LogSignatures, RenderConfig, SvgStrategy};
pub use display::rewrite_svg_ids;
pub use emit::{document_source, picture_source};
pub use error::{Error, Result};
pub use model::{Document, Picture};
pub use pipeline::{
    CommandRunner, Invocation, ProcessOutcome, RenderJob, Renderer, SystemRunner,
};
pub use target::{SaveTarget, TargetKind};

use std::path::PathBuf;

/// Save a picture with a default renderer.
///
/// The engine can be overridden with the `TIKZRENDER_ENGINE` environment
/// variable. Use a [`Renderer`] directly to keep the workaround state between
/// saves.
///
/// # Example
///
/// ```no_run
/// use tikzrender::{save, Picture, SaveTarget};
///
/// let pic = Picture::new(r"\draw (0,0) circle (1);");
/// let path = save(&SaveTarget::svg("circle"), &pic).unwrap();
/// println!("wrote {}", path.display());
/// ```
pub fn save(target: &SaveTarget, picture: &Picture) -> Result<PathBuf> {
    Renderer::from_env().save(target, picture)
}

/// Save a captioned document with a default renderer.
///
/// # Example
///
/// ```no_run
/// use tikzrender::{save_document, Document, Picture, SaveTarget};
///
/// let mut doc = Document::new();
/// doc.append(Picture::new(r"\draw (0,0) -- (1,0);"), "A line");
/// doc.append(Picture::new(r"\draw (0,0) circle (1);"), "A circle");
/// save_document(&SaveTarget::pdf("figures"), &doc).unwrap();
/// ```
pub fn save_document(target: &SaveTarget, document: &Document) -> Result<PathBuf> {
    Renderer::from_env().save_document(target, document)
}

/// Complete standalone source of a picture.
pub fn to_source(picture: &Picture) -> String {
    emit::picture_source(picture, true, false)
}

/// The `tikzpicture` environment of a picture, without preamble.
pub fn to_fragment(picture: &Picture) -> String {
    emit::picture_source(picture, false, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source_is_standalone() {
        let pic = Picture::new(r"\draw (0,0) -- (1,1);");
        let src = to_source(&pic);
        assert!(src.starts_with("\\documentclass[tikz]{standalone}\n"));
        assert!(src.contains("\\begin{document}\n\\begin{tikzpicture}[]\n"));
        assert!(src.ends_with("\\end{tikzpicture}\n\\end{document}\n"));
    }

    #[test]
    fn test_to_fragment_has_no_preamble() {
        let pic = Picture::new(r"\draw (0,0) -- (1,1);").with_preamble(r"\usepackage{xcolor}");
        let src = to_fragment(&pic);
        assert!(src.starts_with("\\begin{tikzpicture}"));
        assert!(!src.contains("documentclass"));
        assert!(!src.contains("xcolor"));
    }

    #[test]
    fn test_save_source_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("pic.TEX");
        let target = SaveTarget::source(name.to_string_lossy());

        let path = save(&target, &Picture::new("x")).unwrap();
        assert_eq!(path, dir.path().join("pic.tex"));
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("\\begin{tikzpicture}[]\nx\n"));
    }

    #[test]
    fn test_save_document_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let target = SaveTarget::pdf(dir.path().join("doc").to_string_lossy());
        let result = save_document(&target, &Document::new());
        assert!(matches!(result, Err(Error::EmptyDocument)));
        assert!(!dir.path().join("doc.pdf").exists());
    }
}
