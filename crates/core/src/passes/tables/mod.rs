//! Table caption markers, the table registry, and `Table <slug>` references.
//!
//! A caption marker is a line `Table <slug>: <caption>` separated from a
//! longtable only by whitespace. A marker above a table wins over one below
//! it, so a marker sitting between two tables belongs to the second one.
//! Claimed marker lines are removed and their slug is registered; every
//! `Table <slug>` mention of a registered slug then becomes
//! `Table~\ref{tbl:<slug>}`.

pub mod longtable;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Diagnostics, ReferenceKind, Warning, line_of};
use crate::options::UncaptionedTables;
use crate::pipeline::StageContext;

pub use longtable::{CaptionPosition, Longtable, Orientation, TableCaption};

static LONGTABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\begin\{longtable\}.*?\\end\{longtable\}").expect("valid longtable regex")
});

static MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*Table[ \t]+(?P<slug>[A-Za-z0-9][A-Za-z0-9-]*):[ \t]*(?P<caption>\S.*?)[ \t]*$")
        .expect("valid marker regex")
});

// Slug on the same line or wrapped onto the next one, never across a blank line.
static TABLE_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bTable(?:[ \t]*\r?\n[ \t]*|[ \t]+)(?P<slug>[A-Za-z0-9][A-Za-z0-9-]*)")
        .expect("valid mention regex")
});

/// Label key for a table slug.
pub fn table_label(slug: &str) -> String {
    format!("tbl:{slug}")
}

/// A table registered through its caption marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTable {
    /// Caption text from the marker
    pub caption: String,
    /// Whether the marker sat above or below the table
    pub position: CaptionPosition,
}

/// Slugs of the tables restructured in one document.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, RegisteredTable>,
}

impl TableRegistry {
    /// Register a slug. A later marker with the same slug replaces the earlier one.
    pub fn register(&mut self, slug: &str, caption: &str, position: CaptionPosition) {
        let previous = self.tables.insert(
            slug.to_string(),
            RegisteredTable {
                caption: caption.to_string(),
                position,
            },
        );
        if previous.is_some() {
            log::warn!("table slug `{slug}` is defined more than once; the last one wins");
        }
    }

    /// True when `slug` belongs to a restructured table.
    pub fn contains(&self, slug: &str) -> bool {
        self.tables.contains_key(slug)
    }

    /// Look up a registered table.
    pub fn get(&self, slug: &str) -> Option<&RegisteredTable> {
        self.tables.get(slug)
    }

    /// Registered slugs in sorted order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Marker<'a> {
    slug: &'a str,
    caption: &'a str,
    line_start: usize,
    // Marker line plus the whitespace joining it to the table.
    span: Range<usize>,
}

fn marker_above(input: &str, search_start: usize, table_start: usize) -> Option<Marker<'_>> {
    let region = input[search_start..table_start].trim_end();
    if region.is_empty() {
        return None;
    }
    let line_start = region.rfind('\n').map_or(0, |i| i + 1);
    let caps = MARKER_LINE.captures(&region[line_start..])?;
    let start = search_start + line_start;
    Some(Marker {
        slug: caps.name("slug")?.as_str(),
        caption: caps.name("caption")?.as_str(),
        line_start: start,
        span: start..table_start,
    })
}

fn marker_below(input: &str, table_end: usize, search_end: usize) -> Option<Marker<'_>> {
    let region = &input[table_end..search_end];
    let rest = region.trim_start();
    if rest.is_empty() {
        return None;
    }
    let leading = region.len() - rest.len();
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let caps = MARKER_LINE.captures(rest[..line_end].trim_end())?;
    Some(Marker {
        slug: caps.name("slug")?.as_str(),
        caption: caps.name("caption")?.as_str(),
        line_start: table_end + leading,
        span: table_end..table_end + leading + line_end,
    })
}

/// Claim caption markers, restructure longtables, and build the registry.
///
/// Returns `None` for the text when nothing was restructured.
pub fn restructure_tables(input: &str, cx: &mut StageContext) -> (Option<String>, TableRegistry) {
    let mut registry = TableRegistry::default();
    let tables: Vec<Range<usize>> = LONGTABLE.find_iter(input).map(|m| m.range()).collect();
    if tables.is_empty() {
        return (None, registry);
    }

    let above: Vec<Option<Marker<'_>>> = tables
        .iter()
        .enumerate()
        .map(|(i, table)| {
            let search_start = if i == 0 { 0 } else { tables[i - 1].end };
            marker_above(input, search_start, table.start)
        })
        .collect();

    let mut out = String::with_capacity(input.len() + 256);
    let mut cursor = 0;
    let mut changed = false;
    for (i, table) in tables.iter().enumerate() {
        let (marker, position) = match &above[i] {
            Some(marker) => (Some(marker.clone()), CaptionPosition::Above),
            None => {
                let search_end = tables.get(i + 1).map_or(input.len(), |next| next.start);
                let next_above = above.get(i + 1).and_then(Option::as_ref);
                let below = marker_below(input, table.end, search_end).filter(|marker| {
                    next_above.is_none_or(|next| next.line_start != marker.line_start)
                });
                (below, CaptionPosition::Below)
            }
        };

        let span_start = match (&marker, position) {
            (Some(marker), CaptionPosition::Above) => marker.span.start,
            _ => table.start,
        };
        let span_end = match (&marker, position) {
            (Some(marker), CaptionPosition::Below) => marker.span.end,
            _ => table.end,
        };

        out.push_str(&input[cursor..span_start]);
        cursor = span_end;

        let line = line_of(input, table.start);
        match render_table(&input[table.clone()], marker.as_ref(), position, line, cx) {
            Some(rendered) => {
                if let Some(marker) = &marker {
                    registry.register(marker.slug, marker.caption, position);
                }
                out.push_str(&rendered);
                changed = true;
            }
            None => out.push_str(&input[span_start..span_end]),
        }
    }
    out.push_str(&input[cursor..]);

    (changed.then_some(out), registry)
}

fn render_table(
    block: &str,
    marker: Option<&Marker<'_>>,
    position: CaptionPosition,
    line: usize,
    cx: &mut StageContext,
) -> Option<String> {
    let convert_all = cx.options.uncaptioned_tables == UncaptionedTables::Convert;
    let table = match Longtable::parse(block) {
        Ok(table) => table,
        Err(reason) => {
            if marker.is_some() || convert_all || block.contains("\\caption") {
                cx.diagnostics.warn(Warning::MalformedTable { line, reason });
            }
            return None;
        }
    };
    // Only a caption in the first head counts; continuation heads are dropped.
    if marker.is_none() && table.own_caption.is_none() && !convert_all {
        return None;
    }

    let caption = match marker {
        Some(marker) => Some(TableCaption {
            text: marker.caption.to_string(),
            label: Some(table_label(marker.slug)),
            position,
        }),
        None => table.own_caption.clone().map(|text| TableCaption {
            text,
            label: table.own_label.clone(),
            position: CaptionPosition::Above,
        }),
    };
    Some(table.render(caption.as_ref(), &cx.options))
}

/// Rewrite `Table <slug>` mentions of registered slugs into `Table~\ref{tbl:<slug>}`.
///
/// Unregistered slugs that look like identifiers (contain `-`) are reported.
pub fn resolve_table_mentions<'a>(
    text: &'a str,
    registry: &TableRegistry,
    diagnostics: &mut Diagnostics,
) -> Cow<'a, str> {
    if !text.contains("Table") {
        return Cow::Borrowed(text);
    }

    TABLE_MENTION.replace_all(text, |caps: &Captures| {
        let slug = &caps["slug"];
        if registry.contains(slug) {
            return format!("Table~\\ref{{{}}}", table_label(slug));
        }
        if slug.contains('-') {
            diagnostics.warn(Warning::UnresolvedReference {
                reference: ReferenceKind::Table,
                key: table_label(slug),
            });
        }
        caps[0].to_string()
    })
}

/// Restructure longtables and resolve table references.
pub fn rewrite_tables<'a>(input: &'a str, cx: &mut StageContext) -> Cow<'a, str> {
    let (restructured, registry) = restructure_tables(input, cx);
    let current: Cow<'a, str> = match restructured {
        Some(text) => Cow::Owned(text),
        None => Cow::Borrowed(input),
    };

    let resolved = match resolve_table_mentions(&current, &registry, &mut cx.diagnostics) {
        Cow::Owned(text) => Some(text),
        Cow::Borrowed(_) => None,
    };
    match resolved {
        Some(text) => Cow::Owned(text),
        None => current,
    }
}
