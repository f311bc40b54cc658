//! Scripted toolchain shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tikzrender::{CommandRunner, Invocation, ProcessOutcome, RenderConfig, Renderer};

pub const PDF_BYTES: &[u8] = b"%PDF-1.5\n%fake\n";

pub const SVG_TEXT: &str = r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink">
<defs><symbol id="glyph0-1"/><clipPath id="clip1"/></defs>
<g id="surface1" clip-path="url(#clip1)"><use xlink:href="#glyph0-1"/>
<image id="image3" xlink:href="data:image/png;base64,AA"/></g>
</svg>"##;

/// dvisvgm output: single-quoted attributes and `g<font>-<char>` glyph ids.
pub const DVISVGM_TEXT: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<svg version='1.1' xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>
<defs><path id='g0-49' d='M 1 0'/></defs>
<g id='page1'><use x='1' y='2' xlink:href='#g0-49'/></g>
</svg>"#;

pub const RERUN_LOG: &str =
    "LaTeX Warning: Label(s) may have changed. Rerun to get cross-references right.\n";

pub const COMPAT_LOG: &str = "(/usr/share/texmf/tex/latex/standalone/standalone.cls\n\
! Undefined control sequence.\n\
<argument> \\pdfpagewidth \n\
\n\
l.12 \\begin{document}\n";

pub const ERROR_LOG: &str = "(./pic.tex\n\
! Package tikz Error: Giving up on this path. Did you forget a semicolon?.\n\
l.5 \\end{tikzpicture}\n\
\n\
Here is how much of TeX's memory you used:\n";

/// One scripted engine run.
#[derive(Debug, Clone)]
pub struct EngineStep {
    pub success: bool,
    pub log: String,
    pub write_output: bool,
    pub log_name: Option<String>,
}

impl EngineStep {
    pub fn ok() -> Self {
        Self {
            success: true,
            log: "Output written.\n".to_string(),
            write_output: true,
            log_name: None,
        }
    }

    pub fn ok_with_log(log: &str) -> Self {
        Self {
            log: log.to_string(),
            ..Self::ok()
        }
    }

    pub fn fail(log: &str) -> Self {
        Self {
            success: false,
            log: log.to_string(),
            write_output: false,
            log_name: None,
        }
    }
}

/// A [`CommandRunner`] that pretends to be lualatex, pdftocairo and dvisvgm.
#[derive(Default)]
pub struct FakeToolchain {
    pub engine_steps: Mutex<VecDeque<EngineStep>>,
    pub pdf_to_svg_fails: bool,
    pub dvi_to_svg_writes: bool,
    pub calls: Mutex<Vec<Invocation>>,
    pub sources: Mutex<Vec<String>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self {
            dvi_to_svg_writes: true,
            ..Default::default()
        }
    }

    pub fn with_steps(steps: Vec<EngineStep>) -> Self {
        let fake = Self::new();
        *fake.engine_steps.lock().unwrap() = steps.into();
        fake
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }

    /// Working directories used by all calls.
    pub fn scratch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.calls().into_iter().map(|c| c.cwd).collect();
        dirs.dedup();
        dirs
    }

    fn run_engine(&self, invocation: &Invocation) -> ProcessOutcome {
        let tex = invocation.args.last().cloned().unwrap_or_default();
        let stem = tex.trim_end_matches(".tex").to_string();
        if let Ok(source) = std::fs::read_to_string(invocation.cwd.join(&tex)) {
            self.sources.lock().unwrap().push(source);
        }

        let step = self
            .engine_steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(EngineStep::ok);

        let log_name = step
            .log_name
            .clone()
            .unwrap_or_else(|| format!("{}.log", stem));
        std::fs::write(invocation.cwd.join(log_name), &step.log).unwrap();

        if step.write_output {
            let ext = if invocation.has_arg("--output-format=dvi") {
                "dvi"
            } else if invocation.has_arg("-no-pdf") {
                "xdv"
            } else {
                "pdf"
            };
            std::fs::write(invocation.cwd.join(format!("{}.{}", stem, ext)), PDF_BYTES).unwrap();
        }

        if step.success {
            ProcessOutcome::ok()
        } else {
            ProcessOutcome::failed(1)
        }
    }

    fn run_pdf_to_svg(&self, invocation: &Invocation) -> ProcessOutcome {
        if self.pdf_to_svg_fails {
            return ProcessOutcome {
                stderr: "Syntax Error: Couldn't find trailer dictionary".to_string(),
                ..ProcessOutcome::failed(1)
            };
        }
        let out = invocation.args.last().cloned().unwrap_or_default();
        std::fs::write(invocation.cwd.join(out), SVG_TEXT).unwrap();
        ProcessOutcome::ok()
    }

    fn run_dvi_to_svg(&self, invocation: &Invocation) -> ProcessOutcome {
        if self.dvi_to_svg_writes {
            let out = invocation.args.last().cloned().unwrap_or_default();
            std::fs::write(invocation.cwd.join(out), DVISVGM_TEXT).unwrap();
        }
        // dvisvgm exits with 0 even when it gives up
        ProcessOutcome::ok()
    }
}

impl CommandRunner for FakeToolchain {
    fn run(&self, invocation: &Invocation) -> tikzrender::Result<ProcessOutcome> {
        self.calls.lock().unwrap().push(invocation.clone());
        let outcome = match invocation.program.as_str() {
            "pdftocairo" => self.run_pdf_to_svg(invocation),
            "dvisvgm" => self.run_dvi_to_svg(invocation),
            _ => self.run_engine(invocation),
        };
        Ok(outcome)
    }
}

pub fn renderer(config: RenderConfig, fake: &Arc<FakeToolchain>) -> Renderer {
    Renderer::with_runner(config, fake.clone())
}

/// Destination name inside `dir`, as a string for the target constructors.
pub fn dest(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}
