use std::borrow::Cow;

use crate::pipeline::StageContext;

// Bodies that already open one of these are left alone.
const MATH_ENVIRONMENTS: &[&str] = &[
    "equation", "align", "gather", "multline", "flalign", "alignat", "eqnarray",
];

// An odd run of backslashes before `pos` means the `\` at `pos` is itself escaped,
// which is how `\\[2pt]` row spacing differs from `\[`.
fn is_escaped(text: &str, pos: usize) -> bool {
    let run = text.as_bytes()[..pos]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

fn find_unescaped(text: &str, from: usize, needle: &str) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = text[search..].find(needle) {
        let pos = search + rel;
        if !is_escaped(text, pos) {
            return Some(pos);
        }
        search = pos + needle.len();
    }
    None
}

fn opens_math_environment(body: &str) -> bool {
    let Some((name, _)) = body
        .strip_prefix("\\begin{")
        .and_then(|rest| rest.split_once('}'))
    else {
        return false;
    };
    MATH_ENVIRONMENTS.contains(&name.trim_end_matches('*'))
}

/// Rewrite `\[ ... \]` display math into numbered `equation` environments.
///
/// Inline `\( ... \)` math is untouched.
pub fn rewrite_display_math<'a>(input: &'a str, _cx: &mut StageContext) -> Cow<'a, str> {
    if !input.contains("\\[") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 64);
    let mut cursor = 0;
    let mut search = 0;
    while let Some(open) = find_unescaped(input, search, "\\[") {
        let body_start = open + 2;
        let Some(close) = find_unescaped(input, body_start, "\\]") else {
            break;
        };
        search = close + 2;

        let body = input[body_start..close].trim();
        if body.is_empty() || opens_math_environment(body) {
            continue;
        }
        out.push_str(&input[cursor..open]);
        out.push_str("\\begin{equation}\n");
        out.push_str(body);
        out.push_str("\n\\end{equation}");
        cursor = close + 2;
    }

    if cursor == 0 {
        return Cow::Borrowed(input);
    }
    out.push_str(&input[cursor..]);
    Cow::Owned(out)
}
