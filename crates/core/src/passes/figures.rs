//! Image embeds (`![[plot.png]]`) and image links (`[[plot.png]]`).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::pipeline::StageContext;
use crate::slug::{figure_label, figure_stem, latex_to_plain};

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "pdf"];

// An embed line followed by a caption line such as `Pic 3: Validation error`.
// The caption starts after the first `:`, or after the first `-` when the line has no `:`.
// The `!` is optional: a bare image link directly above a caption line is an embed too.
static EMBED_WITH_CAPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^!?\[\[(?P<path>[^\]\n]+)\]\][ \t]*\r?\n[ \t]*(?i:fig(?:ure)?|pic|caption)\b\.?[ \t]*(?:[^:\n]*:|[^:\n\-]*-)[ \t]*(?P<caption>\S[^\n]*?)[ \t]*\r?(?:\n(?:[ \t]*\r?\n)*|\z)",
    )
    .expect("valid embed regex")
});

static EMBED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!\[\[(?P<path>[^\]\n]+)\]\][ \t]*(?:\r?\n(?:[ \t]*\r?\n)*)?")
        .expect("valid embed regex")
});

static IMAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[\[(?P<path>[^\]|\n]+?\.(?i:png|jpe?g|svg|pdf))[ \t]*(?:(?:\||\\textbar)[^\]\n]*)?\]\]",
    )
    .expect("valid image link regex")
});

/// True when `path` ends in one of [`IMAGE_EXTENSIONS`].
pub fn is_image_path(path: &str) -> bool {
    let Some((_, ext)) = path.trim().rsplit_once('.') else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Replace whitespace runs with single underscores.
pub fn normalize_file_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Path written into `\includegraphics` for an embedded image.
///
/// Figures are copied flat into `figure_root`, so only the file name survives;
/// URLs and absolute paths are kept.
pub fn figure_path(raw: &str, figure_root: &str) -> String {
    let plain = latex_to_plain(raw.trim()).replace('\\', "/");
    if plain.starts_with("http://") || plain.starts_with("https://") {
        return plain;
    }
    if plain.starts_with('/') {
        return normalize_file_name(&plain);
    }

    let name = normalize_file_name(plain.rsplit('/').next().unwrap_or(&plain));
    let root = figure_root.trim_end_matches('/');
    if root.is_empty() {
        name
    } else {
        format!("{root}/{name}")
    }
}

/// Caption synthesized from a file name: `loss_curve-v2.png` → `Loss curve v2`.
pub fn caption_from_file_name(path: &str) -> String {
    let plain = latex_to_plain(path);
    let words = figure_stem(&plain).replace(['_', '-'], " ");
    let caption = words.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = caption.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Figure".to_string(),
    }
}

/// A complete `figure` float for one image.
pub fn figure_block(path: &str, caption: &str, cx: &StageContext) -> String {
    format!(
        "\\begin{{figure}}[{placement}]\n    \\centering\n    \\includegraphics[width=\\textwidth]{{{file}}}\n    \\caption{{{caption}}}\n    \\label{{{label}}}\n\\end{{figure}}\n\n",
        placement = cx.options.figure_placement,
        file = figure_path(path, &cx.options.figure_root),
        label = figure_label(path),
    )
}

/// Rewrite image embeds into `figure` floats.
///
/// An embed followed by a caption line takes that caption verbatim; otherwise
/// the caption is derived from the file name.
pub fn rewrite_figure_embeds<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains("[[") {
        return Cow::Borrowed(input);
    }

    let captioned = EMBED_WITH_CAPTION.replace_all(input, |caps: &Captures| {
        let path = &caps["path"];
        if !is_image_path(path) {
            return caps[0].to_string();
        }
        figure_block(path, &caps["caption"], cx)
    });

    let uncaptioned = match EMBED.replace_all(&captioned, |caps: &Captures| {
        let path = &caps["path"];
        if !is_image_path(path) {
            return caps[0].to_string();
        }
        let start = caps.get(0).map_or(0, |m| m.start());
        let block = figure_block(path, &caption_from_file_name(path), cx);
        if start == 0 || captioned[..start].ends_with('\n') {
            block
        } else {
            format!("\n{block}")
        }
    }) {
        Cow::Owned(text) => Some(text),
        Cow::Borrowed(_) => None,
    };

    match uncaptioned {
        Some(text) => Cow::Owned(text),
        None => captioned,
    }
}

/// Rewrite image links into `Figure~\ref{fig:<stem>}`.
pub fn rewrite_image_links<'a>(input: &'a str, _cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains("[[") {
        return Cow::Borrowed(input);
    }

    IMAGE_LINK.replace_all(input, |caps: &Captures| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if input[..start].ends_with('!') {
            return caps[0].to_string();
        }
        format!("Figure~\\ref{{{}}}", figure_label(&caps["path"]))
    })
}
