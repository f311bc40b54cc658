//! Render pipeline.
//!
//! Every render runs the engine inside its own [`ScratchDir`]:
//!
//! 1. the source is emitted into `<stem>.tex`,
//! 2. the engine runs, and once more when the log asks for a rerun,
//! 3. a failure showing the standalone/LuaTeX compatibility signature enables
//!    the `luatex85` workaround and restarts the whole attempt (at most once),
//!    any other failure surfaces the log's error block,
//! 4. the output is optionally converted to SVG,
//! 5. the artifact is moved to its destination.
//!
//! # Example
//!
//! ```no_run
//! use tikzrender::{Picture, RenderConfig, Renderer, SaveTarget};
//!
//! fn main() -> tikzrender::Result<()> {
//!     let renderer = Renderer::new(RenderConfig::default());
//!     let pic = Picture::new(r"\draw (0,0) -- (1,1);");
//!     renderer.save(&SaveTarget::pdf("out"), &pic)?;
//!     Ok(())
//! }
//! ```

mod batch;
mod runner;
mod scratch;
mod texlog;

pub use batch::RenderJob;
pub use runner::{tool_available, CommandRunner, Invocation, ProcessOutcome, SystemRunner};
pub use scratch::ScratchDir;
pub use texlog::{TexLog, FALLBACK_LOG};

use crate::config::{RenderConfig, SvgStrategy};
use crate::emit;
use crate::error::{Error, Result};
use crate::model::{Document, Picture};
use crate::target::{SaveTarget, TargetKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Restarts allowed after enabling the compatibility workaround.
pub const MAX_WORKAROUND_RETRIES: usize = 1;

const SCRATCH_PREFIX: &str = "tikzrender-";

/// File format the engine is asked to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutput {
    /// PDF (engine default)
    Pdf,
    /// DVI
    Dvi,
    /// Extended DVI, written by XeTeX
    Xdv,
}

impl EngineOutput {
    /// Extension of the produced file.
    pub fn extension(self) -> &'static str {
        match self {
            EngineOutput::Pdf => "pdf",
            EngineOutput::Dvi => "dvi",
            EngineOutput::Xdv => "xdv",
        }
    }

    /// Engine flag selecting this output.
    pub fn flag(self) -> Option<&'static str> {
        match self {
            EngineOutput::Pdf => None,
            EngineOutput::Dvi => Some("--output-format=dvi"),
            EngineOutput::Xdv => Some("-no-pdf"),
        }
    }
}

/// Result of one attempt that may ask for the workaround restart.
enum Attempt<T> {
    Done(T),
    /// The compatibility failure was seen without the workaround. Carries
    /// the error to report if no restart is allowed.
    NeedsWorkaround(Error),
}

/// Renders pictures and documents through the external toolchain.
///
/// A renderer is one session: it owns the configuration, the sticky
/// compatibility workaround flag and the counter used to keep inline SVG
/// identifiers unique. It is `Send + Sync`; concurrent renders only share
/// those two atomics.
pub struct Renderer {
    config: RenderConfig,
    runner: Arc<dyn CommandRunner>,
    workaround: AtomicBool,
    display_counter: AtomicU64,
}

impl Renderer {
    /// Create a renderer spawning real processes.
    pub fn new(config: RenderConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create a renderer with default configuration, honoring `TIKZRENDER_ENGINE`.
    pub fn from_env() -> Self {
        Self::new(RenderConfig::from_env())
    }

    /// Create a renderer using a custom process runner.
    pub fn with_runner(config: RenderConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let workaround = AtomicBool::new(config.workaround);
        Self {
            config,
            runner,
            workaround,
            display_counter: AtomicU64::new(0),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Get the configuration for modification.
    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    /// Whether the `luatex85` workaround is active for this session.
    pub fn workaround_enabled(&self) -> bool {
        self.workaround.load(Ordering::SeqCst)
    }

    /// Enable the workaround. Returns `true` if it was off before.
    ///
    /// The flag is sticky: nothing turns it off again.
    pub fn enable_workaround(&self) -> bool {
        !self.workaround.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn next_display_id(&self) -> u64 {
        self.display_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Save a picture to any target.
    ///
    /// Returns the path written.
    pub fn save(&self, target: &SaveTarget, picture: &Picture) -> Result<PathBuf> {
        let dest = target.absolute_path()?;
        match target {
            SaveTarget::Source {
                include_preamble, ..
            }
            | SaveTarget::Fragment {
                include_preamble, ..
            } => {
                let text =
                    emit::picture_source(picture, *include_preamble, self.workaround_enabled());
                write_output(&dest, &text)?;
                Ok(dest)
            }
            SaveTarget::Pdf { .. } => self.pdf_to(&dest, picture),
            SaveTarget::Svg { .. } => self.svg_to(&dest, picture),
        }
    }

    /// Typeset a picture to PDF.
    pub fn render_pdf(&self, target: &SaveTarget, picture: &Picture) -> Result<PathBuf> {
        expect_kind(target, TargetKind::Pdf)?;
        self.pdf_to(&target.absolute_path()?, picture)
    }

    /// Typeset a picture and convert it to SVG with the configured strategy.
    pub fn render_svg(&self, target: &SaveTarget, picture: &Picture) -> Result<PathBuf> {
        expect_kind(target, TargetKind::Svg)?;
        self.svg_to(&target.absolute_path()?, picture)
    }

    /// Save a captioned document as LaTeX source or PDF.
    ///
    /// No workaround restart is attempted. Failures are logged and returned
    /// unchanged.
    pub fn save_document(&self, target: &SaveTarget, document: &Document) -> Result<PathBuf> {
        self.save_document_inner(target, document).map_err(|e| {
            log::warn!(
                "failed to save document to {}: {}",
                target.path().display(),
                e
            );
            e
        })
    }

    fn save_document_inner(&self, target: &SaveTarget, document: &Document) -> Result<PathBuf> {
        document.check()?;
        let dest = target.absolute_path()?;

        match target {
            SaveTarget::Source { .. } => {
                let text = emit::document_source(document, self.workaround_enabled())?;
                write_output(&dest, &text)?;
                Ok(dest)
            }
            SaveTarget::Pdf { .. } => {
                let stem = job_stem(&dest)?;
                let workaround = self.workaround_enabled();
                let source = emit::document_source(document, workaround)?;
                let scratch = self.scratch()?;
                let produced = match self.typeset(
                    &scratch,
                    &stem,
                    &source,
                    document.allow_shell_escape(),
                    EngineOutput::Pdf,
                    None,
                )? {
                    Attempt::Done(path) => path,
                    Attempt::NeedsWorkaround(err) => return Err(err),
                };
                relocate(&produced, &dest)?;
                Ok(dest)
            }
            SaveTarget::Fragment { .. } | SaveTarget::Svg { .. } => Err(Error::UnsupportedTarget(
                format!("documents cannot be saved as {}", target.kind().extension()),
            )),
        }
    }

    pub(crate) fn pdf_to(&self, dest: &Path, picture: &Picture) -> Result<PathBuf> {
        self.with_workaround_retry(|| {
            let stem = job_stem(dest)?;
            let workaround = self.workaround_enabled();
            let source = emit::picture_source(picture, true, workaround);
            let scratch = self.scratch()?;

            let pdf = match self.typeset(
                &scratch,
                &stem,
                &source,
                picture.allow_shell_escape,
                EngineOutput::Pdf,
                Some(workaround),
            )? {
                Attempt::Done(path) => path,
                Attempt::NeedsWorkaround(err) => return Ok(Attempt::NeedsWorkaround(err)),
            };
            relocate(&pdf, dest)?;
            Ok(Attempt::Done(dest.to_path_buf()))
        })
    }

    pub(crate) fn svg_to(&self, dest: &Path, picture: &Picture) -> Result<PathBuf> {
        self.svg_to_with(dest, picture, self.config.svg_strategy)
    }

    pub(crate) fn svg_to_with(
        &self,
        dest: &Path,
        picture: &Picture,
        strategy: SvgStrategy,
    ) -> Result<PathBuf> {
        self.with_workaround_retry(|| {
            let stem = job_stem(dest)?;
            let workaround = self.workaround_enabled();
            let source = emit::picture_source(picture, true, workaround);
            let scratch = self.scratch()?;

            let output = match strategy {
                SvgStrategy::ViaPdf => EngineOutput::Pdf,
                SvgStrategy::ViaDvi if self.config.engine_writes_xdv() => EngineOutput::Xdv,
                SvgStrategy::ViaDvi => EngineOutput::Dvi,
            };

            let typeset = match self.typeset(
                &scratch,
                &stem,
                &source,
                picture.allow_shell_escape,
                output,
                Some(workaround),
            )? {
                Attempt::Done(path) => path,
                Attempt::NeedsWorkaround(err) => return Ok(Attempt::NeedsWorkaround(err)),
            };

            let svg = match strategy {
                SvgStrategy::ViaPdf => self.convert_pdf(&scratch, &typeset, &stem)?,
                SvgStrategy::ViaDvi => self.convert_dvi(&scratch, &typeset, &stem)?,
            };
            relocate(&svg, dest)?;
            Ok(Attempt::Done(dest.to_path_buf()))
        })
    }

    /// Run an attempt, restarting it once after enabling the workaround.
    fn with_workaround_retry<T>(
        &self,
        mut attempt: impl FnMut() -> Result<Attempt<T>>,
    ) -> Result<T> {
        let mut restarts = 0;
        loop {
            match attempt()? {
                Attempt::Done(value) => return Ok(value),
                Attempt::NeedsWorkaround(err) if restarts >= MAX_WORKAROUND_RETRIES => {
                    return Err(err)
                }
                Attempt::NeedsWorkaround(_) => {
                    restarts += 1;
                    self.enable_workaround();
                    log::warn!(
                        "{} failed on the standalone class; retrying with \\RequirePackage{{luatex85}}",
                        self.config.engine
                    );
                }
            }
        }
    }

    fn scratch(&self) -> Result<ScratchDir> {
        ScratchDir::create(SCRATCH_PREFIX, !self.config.delete_intermediate)
    }

    /// Write the source and run the engine, with one extra pass on request.
    ///
    /// `workaround_used` is `Some` when a failure may ask for the restart,
    /// carrying whether the source already had the workaround.
    fn typeset(
        &self,
        scratch: &ScratchDir,
        stem: &str,
        source: &str,
        shell_escape: bool,
        output: EngineOutput,
        workaround_used: Option<bool>,
    ) -> Result<Attempt<PathBuf>> {
        let tex_name = format!("{}.tex", stem);
        std::fs::write(scratch.join(&tex_name), source)?;

        let mut invocation = Invocation::new(&self.config.engine, scratch.path())
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error");
        if shell_escape {
            invocation = invocation.arg("-shell-escape");
        }
        if let Some(flag) = output.flag() {
            invocation = invocation.arg(flag);
        }
        let invocation = invocation.arg(tex_name);

        let mut outcome = self.runner.run(&invocation)?;
        let mut log = TexLog::read(scratch.path(), stem);
        if log.needs_rerun(&self.config.signatures) {
            log::debug!("{} asked for a rerun", self.config.engine);
            outcome = self.runner.run(&invocation)?;
            log = TexLog::read(scratch.path(), stem);
        }

        if !outcome.success {
            let err = Error::Engine {
                engine: self.config.engine.clone(),
                message: log.failure_message(),
            };
            if workaround_used == Some(false) && log.is_compat_failure(&self.config.signatures) {
                return Ok(Attempt::NeedsWorkaround(err));
            }
            return Err(err);
        }

        let name = format!("{}.{}", stem, output.extension());
        runner::produced(scratch.path(), &name)
            .map(Attempt::Done)
            .ok_or_else(|| Error::MissingOutput(scratch.join(name)))
    }

    fn convert_pdf(&self, scratch: &ScratchDir, pdf: &Path, stem: &str) -> Result<PathBuf> {
        let svg_name = format!("{}.svg", stem);
        let invocation = Invocation::new(&self.config.pdf_to_svg, scratch.path())
            .arg("-svg")
            .arg(file_name(pdf))
            .arg(&svg_name);

        let outcome = self.runner.run(&invocation)?;
        if !outcome.success {
            return Err(Error::Converter {
                tool: self.config.pdf_to_svg.clone(),
                message: format!("{}: {}", outcome.status_text(), outcome.stderr.trim()),
            });
        }

        runner::produced(scratch.path(), &svg_name)
            .ok_or_else(|| Error::MissingOutput(scratch.join(svg_name)))
    }

    /// Convert DVI/XDV to SVG. The converter may fail without a nonzero
    /// exit status, so success means the SVG exists.
    fn convert_dvi(&self, scratch: &ScratchDir, dvi: &Path, stem: &str) -> Result<PathBuf> {
        let svg_name = format!("{}.svg", stem);
        let invocation = Invocation::new(&self.config.dvi_to_svg, scratch.path())
            .arg("--no-fonts")
            .arg(file_name(dvi))
            .arg("-o")
            .arg(&svg_name);

        let outcome = self.runner.run(&invocation)?;
        match runner::produced(scratch.path(), &svg_name) {
            Some(svg) => {
                if !outcome.success {
                    log::warn!(
                        "{} reported {} but wrote {}",
                        self.config.dvi_to_svg,
                        outcome.status_text(),
                        svg_name
                    );
                }
                Ok(svg)
            }
            None => Err(Error::Converter {
                tool: self.config.dvi_to_svg.clone(),
                message: format!(
                    "no SVG was produced ({}); try SvgStrategy::{:?} instead",
                    outcome.status_text(),
                    SvgStrategy::ViaDvi.alternative()
                ),
            }),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("workaround", &self.workaround_enabled())
            .finish_non_exhaustive()
    }
}

fn expect_kind(target: &SaveTarget, kind: TargetKind) -> Result<()> {
    if target.kind() == kind {
        Ok(())
    } else {
        Err(Error::UnsupportedTarget(format!(
            "expected a {} target, got {}",
            kind.extension(),
            target.kind().extension()
        )))
    }
}

/// Job name for the scratch files: the destination's final component
/// without extension.
fn job_stem(dest: &Path) -> Result<String> {
    dest.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::UnsupportedTarget(format!("{} has no file name", dest.display())))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn warn_if_replacing(dest: &Path) {
    if dest.exists() {
        log::warn!("replacing existing file {}", dest.display());
    }
}

/// Write text output, warning when a file is replaced.
pub(crate) fn write_output(dest: &Path, text: &str) -> Result<()> {
    ensure_parent_dir(dest)?;
    warn_if_replacing(dest);
    std::fs::write(dest, text)?;
    Ok(())
}

/// Move a produced file to its destination, warning when a file is replaced.
///
/// Falls back to copy and remove when a rename is not possible, e.g. across
/// file systems.
pub(crate) fn relocate(from: &Path, dest: &Path) -> Result<()> {
    ensure_parent_dir(dest)?;
    warn_if_replacing(dest);
    if let Err(e) = std::fs::rename(from, dest) {
        log::debug!(
            "rename {} -> {} failed ({}), copying",
            from.display(),
            dest.display(),
            e
        );
        std::fs::copy(from, dest)?;
        std::fs::remove_file(from)?;
    }
    log::debug!("wrote {}", dest.display());
    Ok(())
}
