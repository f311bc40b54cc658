//! Save targets.
//!
//! A [`SaveTarget`] names the artifact to produce and where it goes. The
//! filename is stored without its extension, so `Pdf("out")` and
//! `Pdf("out.PDF")` both write `out.pdf`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Kind of artifact written by a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Complete LaTeX source
    Source,
    /// TikZ fragment for `\input`
    Fragment,
    /// Typeset PDF
    Pdf,
    /// Vector image
    Svg,
}

impl TargetKind {
    /// File extension written for this kind (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            TargetKind::Source => "tex",
            TargetKind::Fragment => "tikz",
            TargetKind::Pdf => "pdf",
            TargetKind::Svg => "svg",
        }
    }

    /// Look up the kind for a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        [Self::Source, Self::Fragment, Self::Pdf, Self::Svg]
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

/// Where and how to save a picture or document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// LaTeX source, normally with preamble so it compiles on its own.
    Source {
        /// Canonical filename without extension
        filename: String,
        /// Emit document class, preamble and document environment
        include_preamble: bool,
    },

    /// TikZ source meant to be `\input` into another document.
    Fragment {
        /// Canonical filename without extension
        filename: String,
        /// Emit document class, preamble and document environment
        include_preamble: bool,
    },

    /// PDF typeset by the engine.
    Pdf {
        /// Canonical filename without extension
        filename: String,
    },

    /// SVG converted from the engine's output.
    Svg {
        /// Canonical filename without extension
        filename: String,
    },
}

impl SaveTarget {
    /// Standalone LaTeX source (`.tex`) including the preamble.
    pub fn source(filename: impl AsRef<str>) -> Self {
        SaveTarget::Source {
            filename: canonical_filename(filename.as_ref(), TargetKind::Source),
            include_preamble: true,
        }
    }

    /// TikZ fragment (`.tikz`) without preamble.
    pub fn fragment(filename: impl AsRef<str>) -> Self {
        SaveTarget::Fragment {
            filename: canonical_filename(filename.as_ref(), TargetKind::Fragment),
            include_preamble: false,
        }
    }

    /// PDF (`.pdf`).
    pub fn pdf(filename: impl AsRef<str>) -> Self {
        SaveTarget::Pdf {
            filename: canonical_filename(filename.as_ref(), TargetKind::Pdf),
        }
    }

    /// SVG (`.svg`).
    pub fn svg(filename: impl AsRef<str>) -> Self {
        SaveTarget::Svg {
            filename: canonical_filename(filename.as_ref(), TargetKind::Svg),
        }
    }

    /// Build a target from a path, choosing the kind by its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedTarget(format!("{} has no extension", path.display())))?;

        let kind = TargetKind::from_extension(ext)
            .ok_or_else(|| Error::UnsupportedTarget(format!("unknown extension: {}", ext)))?;

        let name = path.to_string_lossy();
        Ok(Self::of_kind(kind, name.as_ref()))
    }

    /// Build a target of the given kind with default settings.
    pub fn of_kind(kind: TargetKind, filename: &str) -> Self {
        match kind {
            TargetKind::Source => Self::source(filename),
            TargetKind::Fragment => Self::fragment(filename),
            TargetKind::Pdf => Self::pdf(filename),
            TargetKind::Svg => Self::svg(filename),
        }
    }

    /// Override whether source output includes the preamble.
    ///
    /// Ignored for rendered targets.
    pub fn with_preamble(mut self, include: bool) -> Self {
        match &mut self {
            SaveTarget::Source {
                include_preamble, ..
            }
            | SaveTarget::Fragment {
                include_preamble, ..
            } => *include_preamble = include,
            SaveTarget::Pdf { .. } | SaveTarget::Svg { .. } => {}
        }
        self
    }

    /// Get the target kind.
    pub fn kind(&self) -> TargetKind {
        match self {
            SaveTarget::Source { .. } => TargetKind::Source,
            SaveTarget::Fragment { .. } => TargetKind::Fragment,
            SaveTarget::Pdf { .. } => TargetKind::Pdf,
            SaveTarget::Svg { .. } => TargetKind::Svg,
        }
    }

    /// Canonical filename without extension.
    pub fn filename(&self) -> &str {
        match self {
            SaveTarget::Source { filename, .. }
            | SaveTarget::Fragment { filename, .. }
            | SaveTarget::Pdf { filename }
            | SaveTarget::Svg { filename } => filename,
        }
    }

    /// Whether source output includes the preamble (`None` for rendered targets).
    pub fn include_preamble(&self) -> Option<bool> {
        match self {
            SaveTarget::Source {
                include_preamble, ..
            }
            | SaveTarget::Fragment {
                include_preamble, ..
            } => Some(*include_preamble),
            SaveTarget::Pdf { .. } | SaveTarget::Svg { .. } => None,
        }
    }

    /// Path written by a save, with the extension re-appended.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(format!(
            "{}.{}",
            self.filename(),
            self.kind().extension()
        ))
    }

    /// Absolute destination path.
    pub fn absolute_path(&self) -> Result<PathBuf> {
        let path = self.path();
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }
}

/// Strip the kind's extension from `name` once, ignoring case.
///
/// Names that do not end in the extension, or consist only of it, are kept.
pub fn canonical_filename(name: &str, kind: TargetKind) -> String {
    let suffix_len = kind.extension().len() + 1;
    if name.len() <= suffix_len {
        return name.to_string();
    }
    let split = name.len() - suffix_len;
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(suffix))
            if suffix.starts_with('.')
                && suffix[1..].eq_ignore_ascii_case(kind.extension())
                && !stem.ends_with(['/', '\\']) =>
        {
            stem.to_string()
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_matching_extension() {
        assert_eq!(canonical_filename("out.pdf", TargetKind::Pdf), "out");
        assert_eq!(canonical_filename("out.PDF", TargetKind::Pdf), "out");
        assert_eq!(canonical_filename("dir/out.Svg", TargetKind::Svg), "dir/out");
    }

    #[test]
    fn test_strip_only_once() {
        assert_eq!(canonical_filename("out.pdf.pdf", TargetKind::Pdf), "out.pdf");
        assert_eq!(canonical_filename("a.tex.TEX", TargetKind::Source), "a.tex");
    }

    #[test]
    fn test_other_extension_unchanged() {
        assert_eq!(canonical_filename("out", TargetKind::Pdf), "out");
        assert_eq!(canonical_filename("out.svg", TargetKind::Pdf), "out.svg");
        assert_eq!(canonical_filename("outpdf", TargetKind::Pdf), "outpdf");
        assert_eq!(canonical_filename(".pdf", TargetKind::Pdf), ".pdf");
        assert_eq!(canonical_filename("dir/.pdf", TargetKind::Pdf), "dir/.pdf");
    }

    #[test]
    fn test_non_ascii_names() {
        assert_eq!(canonical_filename("图.pdf", TargetKind::Pdf), "图");
        assert_eq!(canonical_filename("ü", TargetKind::Pdf), "ü");
        assert_eq!(canonical_filename("ñandú.tikz", TargetKind::Fragment), "ñandú");
    }

    #[test]
    fn test_path_reappends_extension() {
        assert_eq!(SaveTarget::pdf("out").path(), PathBuf::from("out.pdf"));
        assert_eq!(SaveTarget::pdf("out.PDF").path(), PathBuf::from("out.pdf"));
        assert_eq!(SaveTarget::svg("pic").path(), PathBuf::from("pic.svg"));
        assert_eq!(SaveTarget::source("doc.tex").path(), PathBuf::from("doc.tex"));
        assert_eq!(SaveTarget::fragment("f").path(), PathBuf::from("f.tikz"));
    }

    #[test]
    fn test_preamble_defaults() {
        assert_eq!(SaveTarget::source("a").include_preamble(), Some(true));
        assert_eq!(SaveTarget::fragment("a").include_preamble(), Some(false));
        assert_eq!(SaveTarget::pdf("a").include_preamble(), None);
        assert_eq!(
            SaveTarget::source("a").with_preamble(false).include_preamble(),
            Some(false)
        );
        assert_eq!(SaveTarget::svg("a").with_preamble(true).include_preamble(), None);
    }

    #[test]
    fn test_from_path() {
        let target = SaveTarget::from_path("figures/plot.SVG").unwrap();
        assert_eq!(target.kind(), TargetKind::Svg);
        assert_eq!(target.filename(), "figures/plot");

        let target = SaveTarget::from_path("snippet.tikz").unwrap();
        assert_eq!(target.kind(), TargetKind::Fragment);
        assert_eq!(target.include_preamble(), Some(false));

        assert!(matches!(
            SaveTarget::from_path("plot.png"),
            Err(Error::UnsupportedTarget(_))
        ));
        assert!(matches!(
            SaveTarget::from_path("plot"),
            Err(Error::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn test_absolute_path() {
        let path = SaveTarget::pdf("out").absolute_path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("out.pdf"));
    }
}
