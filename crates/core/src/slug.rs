use std::borrow::Cow;

/// Slugify free text into a label-safe key.
///
/// This is the same algorithm the heading-labeling filter runs on the Markdown
/// side, so keys computed here match the `\label{}`s found in converter output:
/// 1. Trim surrounding whitespace
/// 2. Replace every run of whitespace with a single hyphen
/// 3. Drop every character that is not an ASCII letter, ASCII digit or hyphen
/// 4. Lowercase
///
/// # Examples
///
/// ```
/// use notetex_core::slug::slugify;
///
/// assert_eq!(slugify("My First Heading!"), "my-first-heading");
/// assert_eq!(slugify("Data and info"), "data-and-info");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_alphanumeric() || ch == '-' {
            slug.push(ch.to_ascii_lowercase());
        }
    }

    slug
}

/// Label emitted by the heading filter for `heading` inside the note `note`.
pub fn heading_label(note: &str, heading: &str) -> String {
    format!(
        "{}--{}",
        slugify(&latex_to_plain(note)),
        slugify(&latex_to_plain(heading))
    )
}

/// File stem of an image path: no directories, no extension.
pub fn figure_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Slug of an image's stem, treating underscores as word separators.
pub fn figure_stem_slug(path: &str) -> String {
    let plain = latex_to_plain(path);
    slugify(&figure_stem(&plain).replace('_', " "))
}

/// `fig:<stem-slug>` label for an image path.
pub fn figure_label(path: &str) -> String {
    format!("fig:{}", figure_stem_slug(path))
}

/// Revert the text escapes Pandoc applies when writing LaTeX.
///
/// Slugs are defined on the raw Markdown text, so names read back out of
/// converter output must be unescaped before slugifying.
pub fn latex_to_plain(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    const WORD_ESCAPES: &[(&str, &str)] = &[
        ("\\textbar", "|"),
        ("\\textasciitilde", "~"),
        ("\\textasciicircum", "^"),
        ("\\textbackslash", "\\"),
        ("\\textless", "<"),
        ("\\textgreater", ">"),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        for (escape, plain) in WORD_ESCAPES {
            if let Some(after) = rest.strip_prefix(escape) {
                out.push_str(plain);
                rest = after
                    .strip_prefix("{}")
                    .or_else(|| after.strip_prefix(' '))
                    .unwrap_or(after);
                continue 'outer;
            }
        }

        let mut chars = rest[1..].chars();
        match chars.next() {
            Some(ch @ ('&' | '%' | '$' | '#' | '_' | '{' | '}' | ' ')) => {
                out.push(ch);
                rest = chars.as_str();
            }
            _ => {
                out.push('\\');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("My First Heading!"), "my-first-heading");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(slugify("a \t\n b"), "a-b");
        assert_eq!(slugify("  padded  "), "padded");
    }

    #[test]
    fn hyphens_preserved_and_not_collapsed() {
        assert_eq!(slugify("a---b"), "a---b");
        assert_eq!(slugify("A & B"), "a--b");
    }

    #[test]
    fn non_ascii_dropped() {
        assert_eq!(slugify("Héllo Wörld"), "hllo-wrld");
        assert_eq!(slugify("snake_case"), "snakecase");
    }

    #[test]
    fn empty_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn idempotent() {
        let cases = [
            "My First Heading!",
            "  a---b  ",
            "A & B",
            "Learning Rate Schedule",
            "x\ty z",
            "Über cool",
            "",
        ];
        for case in cases {
            let once = slugify(case);
            assert_eq!(slugify(&once), once, "not idempotent for {case:?}");
        }
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(slugify("BACKGROUND"), slugify("background"));
    }

    #[test]
    fn heading_label_matches_filter() {
        assert_eq!(heading_label("My Notes", "Background"), "my-notes--background");
        assert_eq!(
            heading_label("Optimization", "Learning Rate Schedule"),
            "optimization--learning-rate-schedule"
        );
    }

    #[test]
    fn heading_label_reverts_pandoc_escapes() {
        assert_eq!(heading_label("R\\&D", "Costs \\textbar{} 2024"), "rd--costs--2024");
    }

    #[test]
    fn figure_labels() {
        assert_eq!(figure_label("error_curve.png"), "fig:error-curve");
        assert_eq!(figure_label("attachments/Loss Plot.PNG"), "fig:loss-plot");
        assert_eq!(figure_label("error\\_curve.png"), "fig:error-curve");
        assert_eq!(figure_stem("dir/archive.tar.gz"), "archive.tar");
        assert_eq!(figure_stem(".hidden"), ".hidden");
    }

    #[test]
    fn latex_to_plain_unescapes() {
        assert_eq!(latex_to_plain("a\\_b \\#c"), "a_b #c");
        assert_eq!(latex_to_plain("x\\textbar{}y"), "x|y");
        assert_eq!(latex_to_plain("x\\textbar y"), "x|y");
        assert_eq!(latex_to_plain("\\emph{x}"), "\\emph{x}");
        assert!(matches!(latex_to_plain("plain"), Cow::Borrowed(_)));
    }
}
