//! Inline SVG for embedding in notebooks and HTML pages.
//!
//! Converters number their internal identifiers from zero in every file, so
//! two SVGs embedded in one page would share `glyph0-1`, `clip1` and so on.
//! [`rewrite_svg_ids`] suffixes those identifiers and every reference to
//! them with a per-render number.

use crate::config::SvgStrategy;
use crate::error::{Error, Result};
use crate::model::Picture;
use crate::pipeline::{Renderer, ScratchDir};
use regex::{Captures, Regex};

/// Identifier prefixes emitted by the SVG converters.
pub const ID_CLASSES: [&str; 5] = ["glyph", "clip", "image", "linear", "surface"];

/// Style added to embedded raster images so they scale without smoothing.
pub const IMAGE_RENDERING_STYLE: &str = "image-rendering:pixelated";

const INLINE_PREFIX: &str = "tikzrender-inline-";

impl Renderer {
    /// Render a picture to SVG markup that can be embedded next to other
    /// renders without identifier collisions.
    ///
    /// Always converts through PDF: the identifier rewrite follows the
    /// pdftocairo naming scheme, whatever strategy the renderer is set to.
    pub fn display_svg(&self, picture: &Picture) -> Result<String> {
        let scratch = ScratchDir::create(INLINE_PREFIX, !self.config().delete_intermediate)?;
        let svg_path = scratch.join("inline.svg");

        self.svg_to_with(&svg_path, picture, SvgStrategy::ViaPdf)?;
        let bytes = std::fs::read(&svg_path)?;
        let svg = String::from_utf8(bytes)
            .map_err(|e| Error::InvalidSvg(format!("{}: {}", svg_path.display(), e)))?;

        rewrite_svg_ids(&svg, self.next_display_id())
    }
}

/// Append `-<suffix>` to every converter identifier and reference, and mark
/// `<image>` elements as pixelated.
pub fn rewrite_svg_ids(svg: &str, suffix: u64) -> Result<String> {
    let ids = Regex::new(&format!(
        r##"(id="|href="#|url\(#)((?:{})[^"')\s]*)"##,
        ID_CLASSES.join("|")
    ))?;
    let rewritten = ids.replace_all(svg, |caps: &Captures| {
        format!("{}{}-{}", &caps[1], &caps[2], suffix)
    });

    let images = Regex::new(r"<image\b")?;
    let styled = images.replace_all(
        &rewritten,
        format!(r#"<image style="{}""#, IMAGE_RENDERING_STYLE).as_str(),
    );

    Ok(styled.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
<defs>
<g><symbol overflow="visible" id="glyph0-1"><path d="M 1 1"/></symbol></g>
<clipPath id="clip1"><path d="M 0 0 L 10 0"/></clipPath>
<image id="image5" width="2" height="2" xlink:href="data:image/png;base64,AAAA"/>
<linearGradient id="linear0" x1="0"/>
</defs>
<g id="surface1">
<g clip-path="url(#clip1)"><use xlink:href="#glyph0-1" x="1" y="2"/></g>
<use xlink:href="#image5"/>
<path fill="url(#linear0)" d="M 0 0"/>
</g>
</svg>"##;

    #[test]
    fn test_rewrites_definitions_and_references() {
        let out = rewrite_svg_ids(SVG, 7).unwrap();
        assert!(out.contains(r#"id="glyph0-1-7""#));
        assert!(out.contains(r##"xlink:href="#glyph0-1-7""##));
        assert!(out.contains(r#"id="clip1-7""#));
        assert!(out.contains("url(#clip1-7)"));
        assert!(out.contains(r#"id="image5-7""#));
        assert!(out.contains(r##"xlink:href="#image5-7""##));
        assert!(out.contains(r#"id="linear0-7""#));
        assert!(out.contains("url(#linear0-7)"));
        assert!(out.contains(r#"id="surface1-7""#));
        assert!(!out.contains(r#"id="clip1""#));
    }

    #[test]
    fn test_leaves_other_attributes() {
        let out = rewrite_svg_ids(SVG, 3).unwrap();
        assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        assert!(out.contains("data:image/png;base64,AAAA"));
        assert!(out.contains(r#"d="M 1 1""#));
    }

    #[test]
    fn test_marks_images_pixelated() {
        let out = rewrite_svg_ids(SVG, 1).unwrap();
        assert!(out.contains(r#"<image style="image-rendering:pixelated" id="image5-1""#));
        assert_eq!(out.matches(IMAGE_RENDERING_STYLE).count(), 1);
    }

    #[test]
    fn test_distinct_suffixes_never_collide() {
        let a = rewrite_svg_ids(SVG, 1).unwrap();
        let b = rewrite_svg_ids(SVG, 2).unwrap();
        let id = Regex::new(r#"id="([^"]+)""#).unwrap();
        let ids_a: Vec<&str> = id.captures_iter(&a).map(|c| c.get(1).unwrap().as_str()).collect();
        let ids_b: Vec<&str> = id.captures_iter(&b).map(|c| c.get(1).unwrap().as_str()).collect();
        assert!(!ids_a.is_empty());
        assert!(ids_a.iter().all(|x| !ids_b.contains(x)));
    }
}
