//! Note and heading wikilinks: `[[Note]]`, `[[Note#Heading]]`, `[[Note#Heading|Alias]]`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::options::BareNotePolicy;
use crate::pipeline::StageContext;
use crate::slug::{heading_label, latex_to_plain, slugify};

static WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?P<inner>[^\[\]]+?)\]\]").expect("valid wikilink regex"));

/// Parts of a wikilink body, still in converter (LaTeX-escaped) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink<'a> {
    /// Note name, empty for same-note links.
    pub note: &'a str,
    /// Heading, if the link targets one.
    pub heading: Option<&'a str>,
    /// Display override.
    pub alias: Option<&'a str>,
}

impl<'a> Wikilink<'a> {
    /// Split a wikilink body. Pandoc writes `#` as `\#` and `|` as `\textbar{}`.
    pub fn parse(inner: &'a str) -> Option<Self> {
        let (target, alias) = match split_alias(inner) {
            Some((target, alias)) => (target, Some(alias.trim()).filter(|a| !a.is_empty())),
            None => (inner, None),
        };

        let (note, heading) = match split_heading(target) {
            Some((note, heading)) => (note.trim(), Some(heading.trim()).filter(|h| !h.is_empty())),
            None => (target.trim(), None),
        };

        if note.is_empty() && heading.is_none() {
            return None;
        }
        Some(Self {
            note,
            heading,
            alias,
        })
    }

    /// Text shown in the document: alias, else heading verbatim, else note.
    pub fn display_text(&self) -> &'a str {
        self.alias.or(self.heading).unwrap_or(self.note)
    }
}

fn split_alias(inner: &str) -> Option<(&str, &str)> {
    const SEPARATORS: &[&str] = &["\\textbar{}", "\\textbar ", "\\textbar", "|"];
    SEPARATORS
        .iter()
        .filter_map(|sep| inner.find(sep).map(|pos| (pos, sep.len())))
        .min_by_key(|(pos, _)| *pos)
        .map(|(pos, len)| (&inner[..pos], &inner[pos + len..]))
}

// Note ends at the first `#`; the heading is the last `#` segment, which is
// the one carrying the label for nested `Note#Section#Subsection` links.
fn split_heading(target: &str) -> Option<(&str, &str)> {
    let first = find_hash(target, false)?;
    let last = find_hash(target, true)?;
    Some((&target[..first.0], &target[last.0 + last.1..]))
}

fn find_hash(text: &str, last: bool) -> Option<(usize, usize)> {
    let mut positions = text.match_indices('#').map(|(pos, _)| {
        if pos > 0 && text.as_bytes()[pos - 1] == b'\\' {
            (pos - 1, 2)
        } else {
            (pos, 1)
        }
    });
    if last {
        positions.last()
    } else {
        positions.next()
    }
}

/// Label key a wikilink resolves to, or `None` when it stays plain text.
pub fn resolve_key(link: &Wikilink<'_>, cx: &StageContext) -> Option<String> {
    match link.heading {
        Some(heading) if !link.note.is_empty() => Some(heading_label(link.note, heading)),
        Some(heading) => {
            let heading_slug = slugify(&latex_to_plain(heading));
            Some(match &cx.document_slug {
                Some(doc) => format!("{doc}--{heading_slug}"),
                None => heading_slug,
            })
        }
        None => {
            let note_slug = slugify(&latex_to_plain(link.note));
            match cx.options.bare_note_policy {
                BareNotePolicy::NoteSlug => Some(note_slug),
                BareNotePolicy::Introduction => Some(format!("{note_slug}--introduction")),
                BareNotePolicy::PlainText => None,
            }
        }
    }
}

/// Rewrite every remaining `[[...]]` into `\hyperref[<key>]{<text>}`.
pub fn rewrite_wikilinks<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains("[[") {
        return Cow::Borrowed(input);
    }

    WIKILINK.replace_all(input, |caps: &Captures| {
        let inner = caps["inner"].replace('\n', " ");
        let Some(link) = Wikilink::parse(&inner) else {
            return caps[0].to_string();
        };
        let text = link.display_text();
        match resolve_key(&link, cx) {
            Some(key) => format!("\\hyperref[{key}]{{{text}}}"),
            None => text.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;

    fn rewrite(input: &str) -> String {
        let mut cx = StageContext::default();
        rewrite_wikilinks(input, &mut cx).into_owned()
    }

    #[test]
    fn note_and_heading() {
        assert_eq!(
            rewrite("see [[My Notes\\#Background]]."),
            "see \\hyperref[my-notes--background]{Background}."
        );
    }

    #[test]
    fn alias_is_displayed() {
        assert_eq!(
            rewrite("[[Optimization\\#Learning Rate Schedule\\textbar{}LR schedule]]"),
            "\\hyperref[optimization--learning-rate-schedule]{LR schedule}"
        );
        assert_eq!(
            rewrite("[[Optimization#Learning Rate Schedule|LR schedule]]"),
            "\\hyperref[optimization--learning-rate-schedule]{LR schedule}"
        );
    }

    #[test]
    fn heading_text_kept_verbatim() {
        assert_eq!(
            rewrite("[[Results\\#Costs \\& Benefits]]"),
            "\\hyperref[results--costs--benefits]{Costs \\& Benefits}"
        );
    }

    #[test]
    fn nested_heading_uses_last_segment() {
        assert_eq!(
            rewrite("[[Methods\\#Setup\\#Hardware]]"),
            "\\hyperref[methods--hardware]{Hardware}"
        );
    }

    #[test]
    fn bare_note_policies() {
        assert_eq!(rewrite("[[Related Work]]"), "\\hyperref[related-work]{Related Work}");

        let mut cx = StageContext::new(
            Options {
                bare_note_policy: BareNotePolicy::Introduction,
                ..Options::default()
            },
            None,
        );
        assert_eq!(
            rewrite_wikilinks("[[Related Work]]", &mut cx),
            "\\hyperref[related-work--introduction]{Related Work}"
        );

        cx.options.bare_note_policy = BareNotePolicy::PlainText;
        assert_eq!(
            rewrite_wikilinks("[[Related Work\\textbar{}prior work]]", &mut cx),
            "prior work"
        );
    }

    #[test]
    fn same_note_heading_uses_document_slug() {
        let mut cx = StageContext::new(Options::default(), Some("my-notes".to_string()));
        assert_eq!(
            rewrite_wikilinks("[[\\#Background]]", &mut cx),
            "\\hyperref[my-notes--background]{Background}"
        );
        assert_eq!(rewrite("[[\\#Background]]"), "\\hyperref[background]{Background}");
    }

    #[test]
    fn soft_wrapped_link() {
        assert_eq!(
            rewrite("[[Optimization\\#Learning\nRate]]"),
            "\\hyperref[optimization--learning-rate]{Learning Rate}"
        );
    }

    #[test]
    fn empty_link_untouched() {
        assert_eq!(rewrite("[[ ]]"), "[[ ]]");
    }

    #[test]
    fn parse_parts() {
        let link = Wikilink::parse("Note\\#Head\\textbar{}Alias").unwrap();
        assert_eq!(link.note, "Note");
        assert_eq!(link.heading, Some("Head"));
        assert_eq!(link.alias, Some("Alias"));
        assert_eq!(link.display_text(), "Alias");
    }
}
