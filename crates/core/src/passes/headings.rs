use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::StageContext;

static SECTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\\section\{").expect("valid section regex"));

// `#### Heading` lines the converter escaped instead of parsing.
static STRAY_H4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\\#\\#\\#\\#[ \t]+(?P<title>[^\n]+?)[ \t]*$").expect("valid heading regex")
});

/// Page break before each `\section{`, and `\paragraph{}` for stray level-4 headings.
pub fn rewrite_headings<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    let paragraphs = STRAY_H4.replace_all(input, "\\paragraph{$title}");
    if !cx.options.section_page_breaks {
        return paragraphs;
    }

    let mut out = String::with_capacity(paragraphs.len() + 64);
    let mut last = 0;
    let mut changed = false;
    for m in SECTION_START.find_iter(&paragraphs) {
        let before = paragraphs[..m.start()].trim_end();
        out.push_str(&paragraphs[last..m.start()]);
        last = m.start();
        if before.ends_with("\\newpage") {
            continue;
        }
        out.push_str("\\newpage\n");
        changed = true;
    }

    if !changed {
        return paragraphs;
    }
    out.push_str(&paragraphs[last..]);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(input: &str) -> String {
        let mut cx = StageContext::default();
        rewrite_headings(input, &mut cx).into_owned()
    }

    #[test]
    fn page_break_before_sections() {
        let input = "\\section{Intro}\\label{a--intro}\n\nText.\n\n\\section{Methods}\\label{a--methods}\n";
        assert_eq!(
            rewrite(input),
            "\\newpage\n\\section{Intro}\\label{a--intro}\n\nText.\n\n\\newpage\n\\section{Methods}\\label{a--methods}\n"
        );
    }

    #[test]
    fn leading_section_gets_a_page_break_once() {
        let once = rewrite("\\section{Intro}\n");
        assert_eq!(once, "\\newpage\n\\section{Intro}\n");
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn page_breaks_not_duplicated() {
        let input = "Text.\n\n\\newpage\n\\section{Methods}\n";
        assert_eq!(rewrite(input), input);
        let once = rewrite("Text.\n\\section{A}\n");
        assert_eq!(rewrite(&once), once);
    }

    #[test]
    fn page_breaks_can_be_disabled() {
        let mut cx = StageContext::default();
        cx.options.section_page_breaks = false;
        let input = "Text.\n\\section{A}\n";
        assert_eq!(rewrite_headings(input, &mut cx), input);
    }

    #[test]
    fn stray_level_four_heading() {
        assert_eq!(
            rewrite("\\#\\#\\#\\# Ablation details\nBody\n"),
            "\\paragraph{Ablation details}\nBody\n"
        );
    }
}
