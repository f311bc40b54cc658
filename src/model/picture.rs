//! A single TikZ picture.

use serde::{Deserialize, Serialize};

/// A TikZ picture: drawing commands plus the settings needed to typeset them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Picture {
    /// Drawing commands placed inside the `tikzpicture` environment
    pub body: String,

    /// Options of the `tikzpicture` environment (without brackets)
    pub options: String,

    /// Extra preamble text (packages, libraries, macro definitions)
    pub preamble: String,

    /// Run the engine with shell escape enabled
    pub allow_shell_escape: bool,
}

impl Picture {
    /// Create a picture from drawing commands.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set the environment options, e.g. `"scale=2, thick"`.
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    /// Set the preamble text.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Allow or forbid shell escape.
    pub fn with_shell_escape(mut self, allow: bool) -> Self {
        self.allow_shell_escape = allow;
        self
    }

    /// Append a line to the body.
    pub fn push_line(&mut self, line: impl AsRef<str>) {
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            self.body.push('\n');
        }
        self.body.push_str(line.as_ref());
    }

    /// Append a line to the preamble.
    pub fn push_preamble(&mut self, line: impl AsRef<str>) {
        if !self.preamble.is_empty() && !self.preamble.ends_with('\n') {
            self.preamble.push('\n');
        }
        self.preamble.push_str(line.as_ref());
    }

    /// Check if the picture has no drawing commands.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_builder() {
        let pic = Picture::new(r"\draw (0,0) -- (1,1);")
            .with_options("scale=2")
            .with_preamble(r"\usetikzlibrary{arrows}")
            .with_shell_escape(true);

        assert_eq!(pic.body, r"\draw (0,0) -- (1,1);");
        assert_eq!(pic.options, "scale=2");
        assert_eq!(pic.preamble, r"\usetikzlibrary{arrows}");
        assert!(pic.allow_shell_escape);
    }

    #[test]
    fn test_push_line() {
        let mut pic = Picture::default();
        assert!(pic.is_empty());
        pic.push_line(r"\draw (0,0) circle (1);");
        pic.push_line(r"\fill (0,0) circle (2pt);");
        assert_eq!(pic.body, "\\draw (0,0) circle (1);\n\\fill (0,0) circle (2pt);");
        assert!(!pic.is_empty());
    }

    #[test]
    fn test_push_preamble() {
        let mut pic = Picture::default();
        pic.push_preamble(r"\usetikzlibrary{calc}");
        pic.push_preamble(r"\usepackage{xcolor}");
        assert_eq!(pic.preamble, "\\usetikzlibrary{calc}\n\\usepackage{xcolor}");
    }

    #[test]
    fn test_deserialize_defaults() {
        let pic: Picture = serde_json::from_str(r#"{"body": "\\draw (0,0) -- (1,0);"}"#).unwrap();
        assert_eq!(pic.body, r"\draw (0,0) -- (1,0);");
        assert!(pic.options.is_empty());
        assert!(!pic.allow_shell_escape);
    }
}
