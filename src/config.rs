//! Render configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the engine command.
pub const ENGINE_ENV: &str = "TIKZRENDER_ENGINE";

/// Default typesetting engine.
pub const DEFAULT_ENGINE: &str = "lualatex";

/// How SVG output is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SvgStrategy {
    /// Typeset to PDF, then convert the PDF to SVG
    #[default]
    ViaPdf,
    /// Typeset to DVI/XDV, then convert that to SVG
    ViaDvi,
}

impl SvgStrategy {
    /// The other strategy, suggested when one of them fails.
    pub fn alternative(self) -> Self {
        match self {
            SvgStrategy::ViaPdf => SvgStrategy::ViaDvi,
            SvgStrategy::ViaDvi => SvgStrategy::ViaPdf,
        }
    }
}

/// Substrings searched for in engine logs.
///
/// The strings depend on the engine version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSignatures {
    /// A failure fixable by loading the `luatex85` compatibility package
    pub compat_failure: Vec<String>,

    /// Warnings asking for another engine pass
    pub rerun: Vec<String>,
}

impl LogSignatures {
    /// Check whether a log shows the known standalone/LuaTeX failure.
    pub fn is_compat_failure(&self, log: &str) -> bool {
        self.compat_failure.iter().any(|s| log.contains(s.as_str()))
    }

    /// Check whether a log asks for a rerun.
    pub fn needs_rerun(&self, log: &str) -> bool {
        self.rerun.iter().any(|s| log.contains(s.as_str()))
    }
}

impl Default for LogSignatures {
    fn default() -> Self {
        Self {
            compat_failure: vec![
                "! Undefined control sequence.\n<argument> \\pdfpagewidth".to_string(),
                "! Undefined control sequence.\n<recently read> \\pdfpagewidth".to_string(),
                "! Undefined control sequence.\n\\sa@placebox ->\\newpage \\global \\pdfpagewidth".to_string(),
            ],
            rerun: vec!["Label(s) may have changed. Rerun to get cross-references right".to_string()],
        }
    }
}

/// Options controlling how pictures are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Engine command (e.g. "lualatex", "pdflatex", "xelatex")
    pub engine: String,

    /// Remove scratch directories and temporary files after rendering
    pub delete_intermediate: bool,

    /// SVG conversion strategy
    pub svg_strategy: SvgStrategy,

    /// PDF to SVG converter command
    pub pdf_to_svg: String,

    /// DVI/XDV to SVG converter command
    pub dvi_to_svg: String,

    /// Start sessions with the `luatex85` workaround already enabled
    pub workaround: bool,

    /// Log signatures driving reruns and the workaround retry
    pub signatures: LogSignatures,
}

impl RenderConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with the engine taken from `TIKZRENDER_ENGINE` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(engine) = std::env::var(ENGINE_ENV) {
            if !engine.trim().is_empty() {
                config.engine = engine.trim().to_string();
            }
        }
        config
    }

    /// Load configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all commands are set.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("engine", &self.engine),
            ("pdf_to_svg", &self.pdf_to_svg),
            ("dvi_to_svg", &self.dvi_to_svg),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Get the engine command.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Set the engine command.
    pub fn set_engine(&mut self, engine: impl Into<String>) {
        self.engine = engine.into();
    }

    /// Set the engine command.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Whether intermediate files are removed.
    pub fn delete_intermediate(&self) -> bool {
        self.delete_intermediate
    }

    /// Set whether intermediate files are removed.
    pub fn set_delete_intermediate(&mut self, delete: bool) {
        self.delete_intermediate = delete;
    }

    /// Keep or remove intermediate files.
    pub fn with_delete_intermediate(mut self, delete: bool) -> Self {
        self.delete_intermediate = delete;
        self
    }

    /// Get the SVG strategy.
    pub fn svg_strategy(&self) -> SvgStrategy {
        self.svg_strategy
    }

    /// Set the SVG strategy.
    pub fn set_svg_strategy(&mut self, strategy: SvgStrategy) {
        self.svg_strategy = strategy;
    }

    /// Set the SVG strategy.
    pub fn with_svg_strategy(mut self, strategy: SvgStrategy) -> Self {
        self.svg_strategy = strategy;
        self
    }

    /// Set the PDF to SVG converter command.
    pub fn with_pdf_to_svg(mut self, command: impl Into<String>) -> Self {
        self.pdf_to_svg = command.into();
        self
    }

    /// Set the DVI to SVG converter command.
    pub fn with_dvi_to_svg(mut self, command: impl Into<String>) -> Self {
        self.dvi_to_svg = command.into();
        self
    }

    /// Start with the workaround enabled.
    pub fn with_workaround(mut self, enabled: bool) -> Self {
        self.workaround = enabled;
        self
    }

    /// Replace the log signatures.
    pub fn with_signatures(mut self, signatures: LogSignatures) -> Self {
        self.signatures = signatures;
        self
    }

    /// Whether the engine writes XDV instead of DVI in intermediate mode.
    pub(crate) fn engine_writes_xdv(&self) -> bool {
        Path::new(&self.engine)
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.to_ascii_lowercase().starts_with("xe"))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            delete_intermediate: true,
            svg_strategy: SvgStrategy::ViaPdf,
            pdf_to_svg: "pdftocairo".to_string(),
            dvi_to_svg: "dvisvgm".to_string(),
            workaround: false,
            signatures: LogSignatures::default(),
        }
    }
}
