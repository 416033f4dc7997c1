//! Rewrite passes applied to converter output.
//!
//! - `brackets`: undoes the converter's escaping of `[[`/`]]`.
//! - `figures`: image embeds and image links.
//! - `wikilinks`: note and heading links.
//! - `headings`: section page breaks and stray heading markers.
//! - `tables`: caption markers, table references, and longtable restructuring.
//! - `math`: display math to numbered equations.
//! - `lists`: spacing after lists.
//! - `urls`: underscore escaping inside `\href` URLs.
//! - `unicode`: Unicode arrows to math macros.
//! - `references`: unresolved reference check.

/// Bracket unescaping.
pub mod brackets;
/// Image embeds and image links.
pub mod figures;
/// Section page breaks and stray heading markers.
pub mod headings;
/// Spacing after list environments.
pub mod lists;
/// Display math rewriting.
pub mod math;
/// Unresolved reference check.
pub mod references;
/// Table caption markers and longtable restructuring.
pub mod tables;
/// Unicode arrow replacement.
pub mod unicode;
/// URL underscore escaping.
pub mod urls;
/// Note and heading wikilinks.
pub mod wikilinks;
