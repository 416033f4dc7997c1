use std::borrow::Cow;

use crate::pipeline::StageContext;

/// Turn the converter's `{[}{[}` / `{]}{]}` back into `[[` / `]]`.
pub fn unescape_wikilink_brackets<'a>(input: &'a str, _cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains("{[}{[}") && !input.contains("{]}{]}") {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("{[}{[}", "[[").replace("{]}{]}", "]]"))
}
