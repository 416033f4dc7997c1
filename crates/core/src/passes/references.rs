use std::borrow::Cow;
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Diagnostics, ReferenceKind, Warning};
use crate::pipeline::StageContext;

static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\label\{(?P<key>[^{}]+)\}").expect("valid label regex"));

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:(?:ref|eqref|autoref|cref|Cref|pageref)\{(?P<ref>[^{}]+)\}|hyperref\[(?P<link>[^\]]+)\])")
        .expect("valid reference regex")
});

fn kind_of(key: &str) -> ReferenceKind {
    if key.starts_with("fig:") {
        ReferenceKind::Figure
    } else if key.starts_with("tbl:") {
        ReferenceKind::Table
    } else {
        ReferenceKind::Other
    }
}

/// Report every `\ref`/`\hyperref` key that no `\label` in `latex` defines.
pub fn find_unresolved_references(latex: &str, diagnostics: &mut Diagnostics) {
    let labels: HashSet<&str> = LABEL
        .captures_iter(latex)
        .filter_map(|caps| caps.name("key"))
        .map(|key| key.as_str().trim())
        .collect();

    for caps in REFERENCE.captures_iter(latex) {
        let (key, reference) = match (caps.name("ref"), caps.name("link")) {
            (Some(key), _) => (key.as_str().trim(), kind_of(key.as_str().trim())),
            (None, Some(key)) => (key.as_str().trim(), ReferenceKind::Wikilink),
            (None, None) => continue,
        };
        if labels.contains(key) {
            continue;
        }
        diagnostics.warn(Warning::UnresolvedReference {
            reference,
            key: key.to_string(),
        });
    }
}

/// Final read-only stage: records unresolved references, never changes the text.
pub fn check_references<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    if cx.options.check_references {
        find_unresolved_references(input, &mut cx.diagnostics);
    }
    Cow::Borrowed(input)
}
