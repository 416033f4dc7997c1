use std::borrow::Cow;

use crate::passes::tables::longtable::braced_argument;
use crate::pipeline::StageContext;

const HREF: &str = "\\href";

fn escape_underscores(url: &str) -> Cow<'_, str> {
    if !url.contains('_') {
        return Cow::Borrowed(url);
    }
    let mut out = String::with_capacity(url.len() + 8);
    let mut previous = None;
    for ch in url.chars() {
        if ch == '_' && previous != Some('\\') {
            out.push('\\');
        }
        out.push(ch);
        previous = Some(ch);
    }
    Cow::Owned(out)
}

/// Escape bare `_` inside the URL argument of `\href{...}{...}`.
pub fn escape_href_underscores<'a>(input: &'a str, _cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains(HREF) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    let mut cursor = 0;
    let mut changed = false;
    let mut search = 0;
    while let Some(rel) = input[search..].find(HREF) {
        let command_end = search + rel + HREF.len();
        search = command_end;
        let argument = &input[command_end..];
        let Some((url, _)) = braced_argument(argument) else {
            continue;
        };
        let Cow::Owned(escaped) = escape_underscores(url) else {
            continue;
        };
        let url_start = command_end + (argument.len() - argument.trim_start().len()) + 1;
        out.push_str(&input[cursor..url_start]);
        out.push_str(&escaped);
        cursor = url_start + url.len();
        search = cursor;
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(input);
    }
    out.push_str(&input[cursor..]);
    Cow::Owned(out)
}
