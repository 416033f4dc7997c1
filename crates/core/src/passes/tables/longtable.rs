//! Restructuring of `longtable` environments into floating `tabularx` tables.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::Options;

static SEGMENT_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\end(?P<kind>firsthead|head|foot|lastfoot)\b").expect("valid segment regex")
});

static MULTICOLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\multicolumn\{\s*(?P<span>\d+)\s*\}").expect("valid multicolumn regex")
});

static RULE_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:toprule|midrule|bottomrule|hline|cline\{[^}]*\}|cmidrule(?:\([^)]*\))?\{[^}]*\}|noalign\{\}|tabularnewline)")
        .expect("valid rule regex")
});

/// Where a caption sits relative to the tabular content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionPosition {
    /// Caption before the tabular
    Above,
    /// Caption after the tabular
    Below,
}

/// Caption and label injected into the float.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCaption {
    /// Caption text
    pub text: String,
    /// Full label key (`tbl:<slug>`)
    pub label: Option<String>,
    /// Placement relative to the tabular
    pub position: CaptionPosition,
}

/// Page orientation chosen from the column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// `table` at `\textwidth`
    Portrait,
    /// `sidewaystable` at `\textheight`
    Landscape,
}

/// One entry of a column specification.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecItem {
    /// A column: `l`, `c`, `r`, `X`, ...
    Column(char),
    /// A paragraph column `p{}`/`m{}`/`b{}` with its width argument.
    Paragraph {
        /// `p`, `m` or `b`
        kind: char,
        /// Raw width argument
        width: String,
    },
    /// Modifiers, separators and rules that don't add a column.
    Decoration(String),
}

/// Parsed column specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Items in source order.
    pub items: Vec<SpecItem>,
}

impl ColumnSpec {
    /// Parse a column specification such as `@{}>{\raggedright}p{3cm}lr@{}`.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut items = Vec::new();
        parse_spec_into(spec, &mut items)?;
        Ok(Self { items })
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !matches!(item, SpecItem::Decoration(_)))
            .count()
    }

    /// Spec for `tabularx`: paragraph columns become `X` and `@{}` closes both ends.
    pub fn to_tabularx(&self, preserve_fixed_width_cm: Option<f64>) -> String {
        let mut out = String::new();
        for item in &self.items {
            match item {
                SpecItem::Column(ch) => out.push(*ch),
                SpecItem::Paragraph { kind, width } => {
                    let keep = match (preserve_fixed_width_cm, width_in_cm(width)) {
                        (Some(cutoff), Some(cm)) => cm >= cutoff,
                        _ => false,
                    };
                    if keep {
                        write!(out, "{kind}{{{width}}}").ok();
                    } else {
                        out.push('X');
                    }
                }
                SpecItem::Decoration(raw) => out.push_str(raw),
            }
        }
        if !out.starts_with("@{}") {
            out.insert_str(0, "@{}");
        }
        if !out.ends_with("@{}") {
            out.push_str("@{}");
        }
        out
    }
}

fn parse_spec_into(spec: &str, items: &mut Vec<SpecItem>) -> Result<(), String> {
    let mut rest = spec;
    while let Some(ch) = rest.chars().next() {
        let after = &rest[ch.len_utf8()..];
        match ch {
            c if c.is_whitespace() => rest = after,
            '>' | '<' | '@' | '!' => {
                let (arg, tail) = braced_argument(after)
                    .ok_or_else(|| format!("`{ch}` without a braced argument"))?;
                items.push(SpecItem::Decoration(format!("{ch}{{{arg}}}")));
                rest = tail;
            }
            '|' => {
                items.push(SpecItem::Decoration("|".to_string()));
                rest = after;
            }
            'p' | 'm' | 'b' => {
                let (width, tail) = braced_argument(after)
                    .ok_or_else(|| format!("`{ch}` column without a width"))?;
                items.push(SpecItem::Paragraph {
                    kind: ch,
                    width: collapse_whitespace(width),
                });
                rest = tail;
            }
            '*' => {
                let (count, tail) =
                    braced_argument(after).ok_or("`*` without a repeat count")?;
                let (inner, tail) =
                    braced_argument(tail).ok_or("`*` without a repeated spec")?;
                let count: usize = count
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid repeat count `{count}`"))?;
                for _ in 0..count {
                    parse_spec_into(inner, items)?;
                }
                rest = tail;
            }
            c if c.is_ascii_alphabetic() => {
                items.push(SpecItem::Column(c));
                rest = after;
            }
            other => return Err(format!("unexpected `{other}` in column spec")),
        }
    }
    Ok(())
}

/// Split `{arg}rest` into `arg` and `rest`, honouring nested braces.
pub(crate) fn braced_argument(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if !text.starts_with('{') {
        return None;
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[1..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Absolute width in centimetres (`3cm`, `25mm`, `1.5in`, `72pt`); `None` for relative widths.
pub fn width_in_cm(width: &str) -> Option<f64> {
    let width = width.trim();
    let split = width.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    let (number, unit) = width.split_at(split);
    let value: f64 = number.parse().ok()?;
    match unit.trim() {
        "cm" => Some(value),
        "mm" => Some(value / 10.0),
        "in" => Some(value * 2.54),
        "pt" => Some(value * 2.54 / 72.27),
        _ => None,
    }
}

/// A `longtable` environment split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Longtable {
    /// Parsed column specification
    pub spec: ColumnSpec,
    /// Caption the converter placed inside the table, if any
    pub own_caption: Option<String>,
    /// Label the converter placed inside the table, if any
    pub own_label: Option<String>,
    /// First header rows, without caption scaffolding
    pub head: String,
    /// Data rows
    pub rows: String,
    /// Rows closing the last page
    pub last_foot: String,
}

impl Longtable {
    /// Parse a complete `\begin{longtable}...\end{longtable}` block.
    pub fn parse(block: &str) -> Result<Self, String> {
        let after_begin = block
            .trim_start()
            .strip_prefix("\\begin{longtable}")
            .ok_or("missing \\begin{longtable}")?;
        let after_placement = match after_begin.trim_start().strip_prefix('[') {
            Some(rest) => rest
                .split_once(']')
                .map(|(_, tail)| tail)
                .ok_or("unterminated placement argument")?,
            None => after_begin,
        };
        let (raw_spec, body) =
            braced_argument(after_placement).ok_or("missing column specification")?;
        let body = body
            .trim_end()
            .strip_suffix("\\end{longtable}")
            .ok_or("missing \\end{longtable}")?;

        let spec = ColumnSpec::parse(raw_spec)?;
        if spec.column_count() == 0 {
            return Err("column specification has no columns".to_string());
        }

        let mut head: Option<&str> = None;
        let mut last_foot = "";
        let mut cursor = 0;
        for caps in SEGMENT_END.captures_iter(body) {
            let Some(whole) = caps.get(0) else { continue };
            let segment = &body[cursor..whole.start()];
            cursor = whole.end();
            match &caps["kind"] {
                "firsthead" => head = Some(segment),
                "head" if head.is_none() => head = Some(segment),
                "lastfoot" => last_foot = segment,
                // continuation head and continuation foot
                _ => {}
            }
        }
        let rows = &body[cursor..];

        let (own_caption, own_label, head) = strip_caption(head.unwrap_or(""));

        let table = Self {
            spec,
            own_caption,
            own_label,
            head: head.trim().to_string(),
            rows: rows.trim().to_string(),
            last_foot: last_foot.trim().to_string(),
        };
        table.check_rows()?;
        Ok(table)
    }

    /// Number of columns in the spec.
    pub fn column_count(&self) -> usize {
        self.spec.column_count()
    }

    /// Orientation for a given landscape threshold.
    pub fn orientation(&self, landscape_threshold: usize) -> Orientation {
        if self.column_count() > landscape_threshold {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    fn check_rows(&self) -> Result<(), String> {
        let columns = self.column_count();
        for section in [&self.head, &self.rows, &self.last_foot] {
            for row in split_rows(section) {
                let cells = count_cells(row);
                if cells > columns {
                    return Err(format!(
                        "row has {cells} cells but the column spec declares {columns}: `{}`",
                        collapse_whitespace(row)
                    ));
                }
            }
        }
        Ok(())
    }

    fn body_lines(&self) -> Vec<String> {
        let mut body = String::new();
        for part in [&self.head, &self.rows, &self.last_foot] {
            if part.is_empty() {
                continue;
            }
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(part);
        }
        if body.contains("\\toprule") && !body.contains("\\bottomrule") {
            body.push_str("\n\\bottomrule");
        }
        body.lines().map(|line| line.trim().to_string()).collect()
    }

    /// Render as a float wrapping a `tabularx`.
    pub fn render(&self, caption: Option<&TableCaption>, options: &Options) -> String {
        let orientation = self.orientation(options.landscape_threshold);
        let (environment, width) = match orientation {
            Orientation::Portrait => ("table", "\\textwidth"),
            Orientation::Landscape => ("sidewaystable", "\\textheight"),
        };

        let mut out = String::new();
        match orientation {
            Orientation::Portrait => {
                writeln!(out, "\\begin{{table}}[{}]", options.figure_placement).ok();
            }
            Orientation::Landscape => {
                writeln!(out, "\\begin{{sidewaystable}}").ok();
            }
        }
        writeln!(out, "  \\centering").ok();
        if orientation == Orientation::Landscape {
            writeln!(out, "  \\small").ok();
        }
        if let Some(caption) = caption.filter(|c| c.position == CaptionPosition::Above) {
            write_caption(&mut out, caption);
        }
        writeln!(
            out,
            "  \\begin{{tabularx}}{{{width}}}{{{}}}",
            self.spec.to_tabularx(options.preserve_fixed_width_cm)
        )
        .ok();
        for line in self.body_lines() {
            if line.is_empty() {
                continue;
            }
            writeln!(out, "    {line}").ok();
        }
        writeln!(out, "  \\end{{tabularx}}").ok();
        if let Some(caption) = caption.filter(|c| c.position == CaptionPosition::Below) {
            write_caption(&mut out, caption);
        }
        write!(out, "\\end{{{environment}}}").ok();
        if orientation == Orientation::Landscape {
            write!(out, "\n\\clearpage").ok();
        }
        out
    }
}

fn write_caption(out: &mut String, caption: &TableCaption) {
    writeln!(out, "  \\caption{{{}}}", caption.text).ok();
    if let Some(label) = &caption.label {
        writeln!(out, "  \\label{{{label}}}").ok();
    }
}

// Pandoc opens the first head with `\caption{...}\label{...}\tabularnewline`.
fn strip_caption(head: &str) -> (Option<String>, Option<String>, String) {
    let Some(start) = head.find("\\caption") else {
        return (None, None, head.to_string());
    };
    let mut after = &head[start + "\\caption".len()..];
    if let Some(rest) = after.trim_start().strip_prefix('[') {
        after = rest.split_once(']').map_or(rest, |(_, tail)| tail);
    }
    let Some((text, mut tail)) = braced_argument(after) else {
        return (None, None, head.to_string());
    };

    let mut caption = text.trim().to_string();
    let mut label = None;
    if let Some(pos) = caption.find("\\label") {
        if let Some((inner, rest)) = braced_argument(&caption[pos + "\\label".len()..]) {
            label = Some(inner.trim().to_string());
            caption = format!("{}{}", &caption[..pos], rest).trim().to_string();
        }
    }
    if let Some(rest) = tail.trim_start().strip_prefix("\\label")
        && let Some((inner, rest)) = braced_argument(rest)
    {
        label = Some(inner.trim().to_string());
        tail = rest;
    }
    let tail = tail
        .trim_start()
        .strip_prefix("\\tabularnewline")
        .or_else(|| tail.trim_start().strip_prefix("\\\\"))
        .unwrap_or(tail);

    let remaining = format!("{}{}", &head[..start], tail);
    (Some(caption).filter(|c| !c.is_empty()), label, remaining)
}

/// Split tabular content into rows at `\\` and `\tabularnewline`.
fn split_rows(section: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let bytes = section.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if bytes.get(i + 1) == Some(&b'\\') {
                rows.push(&section[start..i]);
                i += 2;
                start = i;
                continue;
            }
            if section[i..].starts_with("\\tabularnewline") {
                rows.push(&section[start..i]);
                i += "\\tabularnewline".len();
                start = i;
                continue;
            }
            i += 2;
            continue;
        }
        i += 1;
    }
    rows.push(&section[start..]);
    rows.into_iter()
        .filter(|row| !RULE_COMMAND.replace_all(row, "").trim().is_empty())
        .collect()
}

/// Cells in one row: top-level `&` separators plus extra `\multicolumn` spans.
fn count_cells(row: &str) -> usize {
    let mut cells = 1;
    let mut depth = 0usize;
    let mut escaped = false;
    for ch in row.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '&' if depth == 0 => cells += 1,
            _ => {}
        }
    }
    let extra: usize = MULTICOLUMN
        .captures_iter(row)
        .filter_map(|caps| caps["span"].parse::<usize>().ok())
        .map(|span| span.saturating_sub(1))
        .sum();
    cells + extra
}
