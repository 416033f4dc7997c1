use std::borrow::Cow;

use crate::pipeline::StageContext;

/// Arrows and the math macro each one becomes.
pub const ARROWS: &[(char, &str)] = &[
    ('→', "\\to"),
    ('←', "\\leftarrow"),
    ('↔', "\\leftrightarrow"),
    ('⇒', "\\Rightarrow"),
    ('⇐', "\\Leftarrow"),
    ('⇔', "\\Leftrightarrow"),
    ('↦', "\\mapsto"),
    ('⟶', "\\longrightarrow"),
    ('⟵', "\\longleftarrow"),
    ('⟷', "\\longleftrightarrow"),
    ('⟹', "\\Longrightarrow"),
    ('⟸', "\\Longleftarrow"),
    ('⟺', "\\Longleftrightarrow"),
];

fn arrow_macro(ch: char) -> Option<&'static str> {
    ARROWS
        .iter()
        .find(|(arrow, _)| *arrow == ch)
        .map(|(_, latex)| *latex)
}

/// Replace Unicode arrows with `\ensuremath{...}` so they typeset in text and math.
pub fn replace_unicode_arrows<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    if !cx.options.unicode_arrows || !input.chars().any(|ch| arrow_macro(ch).is_some()) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 32);
    for ch in input.chars() {
        match arrow_macro(ch) {
            Some(latex) => {
                out.push_str("\\ensuremath{");
                out.push_str(latex);
                out.push('}');
            }
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_replaced() {
        let mut cx = StageContext::default();
        assert_eq!(
            replace_unicode_arrows("input → model ⇒ loss", &mut cx),
            "input \\ensuremath{\\to} model \\ensuremath{\\Rightarrow} loss"
        );
        assert_eq!(
            replace_unicode_arrows("a ⟺ b", &mut cx),
            "a \\ensuremath{\\Longleftrightarrow} b"
        );
    }

    #[test]
    fn text_without_arrows_is_borrowed() {
        let mut cx = StageContext::default();
        assert!(matches!(
            replace_unicode_arrows("naïve text", &mut cx),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn can_be_disabled() {
        let mut cx = StageContext::default();
        cx.options.unicode_arrows = false;
        assert_eq!(replace_unicode_arrows("a → b", &mut cx), "a → b");
    }

    #[test]
    fn every_arrow_has_a_macro() {
        assert_eq!(ARROWS.len(), 13);
        let mut cx = StageContext::default();
        let all: String = ARROWS.iter().map(|(ch, _)| *ch).collect();
        let out = replace_unicode_arrows(&all, &mut cx);
        assert_eq!(out.matches("\\ensuremath{").count(), 13);
    }
}
