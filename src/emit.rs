//! LaTeX source emission.
//!
//! The engine is sensitive to the exact block structure, so the output is
//! built line by line with fixed markers.

use crate::error::Result;
use crate::model::{Document, Picture};

/// Compatibility package loaded before the document class when the
/// standalone class fails under newer LuaTeX versions.
pub const WORKAROUND_DIRECTIVE: &str = "\\RequirePackage{luatex85}";

/// Document class of single pictures, cropped to the drawing.
pub const STANDALONE_CLASS: &str = "\\documentclass[tikz]{standalone}";

/// Document class of captioned collections.
pub const ARTICLE_CLASS: &str = "\\documentclass{article}";

/// Vertical space emitted after every caption of a document.
pub const CAPTION_SPACING: &str = "\\vspace{1cm}";

/// Emit the source of a single picture.
///
/// With `include_preamble` the output is a complete standalone document;
/// without it only the `tikzpicture` environment is emitted. `workaround`
/// adds [`WORKAROUND_DIRECTIVE`] in front of the document class.
pub fn picture_source(picture: &Picture, include_preamble: bool, workaround: bool) -> String {
    let mut out = String::new();

    if include_preamble {
        if workaround {
            push_line(&mut out, WORKAROUND_DIRECTIVE);
        }
        push_line(&mut out, STANDALONE_CLASS);
        push_block(&mut out, &picture.preamble);
        push_line(&mut out, "\\begin{document}");
    }

    push_environment(&mut out, picture);

    if include_preamble {
        push_line(&mut out, "\\end{document}");
    }

    out
}

/// Emit the source of a captioned document.
///
/// Each picture is centered and followed by a figure caption. The preamble
/// of every picture is included once, in order of first appearance.
pub fn document_source(document: &Document, workaround: bool) -> Result<String> {
    document.check()?;

    let mut out = String::new();
    if workaround {
        push_line(&mut out, WORKAROUND_DIRECTIVE);
    }
    push_line(&mut out, ARTICLE_CLASS);
    push_line(&mut out, "\\usepackage{caption}");
    push_line(&mut out, "\\usepackage{tikz}");

    let mut seen: Vec<&str> = Vec::new();
    for picture in &document.pictures {
        let preamble = picture.preamble.trim_end();
        if !preamble.is_empty() && !seen.contains(&preamble) {
            seen.push(preamble);
            push_block(&mut out, preamble);
        }
    }

    push_line(&mut out, "\\begin{document}");
    push_line(&mut out, "\\centering");
    for (picture, caption) in document.entries() {
        push_environment(&mut out, picture);
        push_line(&mut out, &format!("\\captionof{{figure}}{{{}}}", caption));
        push_line(&mut out, CAPTION_SPACING);
    }
    push_line(&mut out, "\\end{document}");

    Ok(out)
}

/// The environment always carries an option list, empty or not, and the
/// body is copied unchanged.
fn push_environment(out: &mut String, picture: &Picture) {
    push_line(out, &format!("\\begin{{tikzpicture}}[{}]", picture.options));
    out.push_str(&picture.body);
    if !picture.body.is_empty() && !picture.body.ends_with('\n') {
        out.push('\n');
    }
    push_line(out, "\\end{tikzpicture}");
}

fn push_block(out: &mut String, text: &str) {
    let text = text.trim_end_matches(['\n', '\r']);
    if !text.is_empty() {
        push_line(out, text);
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
