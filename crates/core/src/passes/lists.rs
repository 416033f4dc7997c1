use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::StageContext;

static LIST_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?P<side>begin|end)\{(?:itemize|enumerate|description)\}")
        .expect("valid list regex")
});

/// Insert the configured spacing after each outermost list environment.
///
/// Nested lists are skipped, as is a list already followed by the spacing.
pub fn space_after_lists<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    let spacing = cx.options.list_spacing.trim();
    if spacing.is_empty() || !input.contains("\\end{") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 64);
    let mut cursor = 0;
    let mut depth = 0usize;
    for caps in LIST_BOUNDARY.captures_iter(input) {
        let Some(boundary) = caps.get(0) else { continue };
        if &caps["side"] == "begin" {
            depth += 1;
            continue;
        }
        depth = depth.saturating_sub(1);
        if depth > 0 {
            continue;
        }
        if input[boundary.end()..].trim_start().starts_with(spacing) {
            continue;
        }
        out.push_str(&input[cursor..boundary.end()]);
        out.push('\n');
        out.push_str(spacing);
        cursor = boundary.end();
    }

    if cursor == 0 {
        return Cow::Borrowed(input);
    }
    out.push_str(&input[cursor..]);
    Cow::Owned(out)
}
