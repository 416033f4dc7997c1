//! Splicing the converted body into a LaTeX template.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{NotetexError, Result};

/// Line opening the injected region.
pub const START_MARKER: &str = "% === BEGIN MARKDOWN CONTENT ===";
/// Line closing the injected region.
pub const END_MARKER: &str = "% === END MARKDOWN CONTENT ===";

fn locate(template: &str, marker: &str) -> Result<usize> {
    let count = template.matches(marker).count();
    match count {
        0 => Err(NotetexError::TemplateMarkerMissing(marker.to_string())),
        1 => template
            .find(marker)
            .ok_or_else(|| NotetexError::InternalError(format!("marker vanished: {marker}"))),
        _ => Err(NotetexError::TemplateMarkerDuplicated {
            marker: marker.to_string(),
            count,
        }),
    }
}

/// Replace whatever lies between the two markers with `body`.
///
/// Text outside the markers is preserved byte-for-byte, and injecting the
/// same body twice gives the same template.
pub fn inject_body(template: &str, body: &str) -> Result<String> {
    let start = locate(template, START_MARKER)?;
    let end = locate(template, END_MARKER)?;
    if end < start {
        return Err(NotetexError::TemplateMarkersOutOfOrder);
    }

    let before = &template[..start + START_MARKER.len()];
    let after = &template[end..];
    let body = body.trim_end();

    let mut out = String::with_capacity(before.len() + body.len() + after.len() + 2);
    out.push_str(before);
    out.push('\n');
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out.push_str(after);
    Ok(out)
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so readers never observe a half-written file.
pub fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file =
        NamedTempFile::new_in(dir).map_err(|err| NotetexError::file_access(dir, err))?;
    file.write_all(content.as_bytes())
        .map_err(|err| NotetexError::file_access(path, err))?;
    file.flush()
        .map_err(|err| NotetexError::file_access(path, err))?;
    file.persist(path)
        .map_err(|err| NotetexError::file_access(path, err.error))?;
    Ok(())
}

/// Read `template_path`, inject `body`, and write the result back in place.
pub fn inject_into_file(template_path: &Path, body: &str) -> Result<()> {
    let template = std::fs::read_to_string(template_path)
        .map_err(|err| NotetexError::file_access(template_path, err))?;
    let updated = inject_body(&template, body)?;
    write_atomically(template_path, &updated)?;
    log::info!("Injected {} bytes into {}", body.len(), template_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(inner: &str) -> String {
        format!(
            "\\documentclass{{article}}\n\\begin{{document}}\n{START_MARKER}\n{inner}{END_MARKER}\n\\end{{document}}\n"
        )
    }

    #[test]
    fn body_replaces_region() {
        let out = inject_body(&template("old text\n"), "new body\n\n").unwrap();
        assert_eq!(out, template("new body\n"));
    }

    #[test]
    fn injection_is_idempotent() {
        let once = inject_body(&template(""), "Body").unwrap();
        let twice = inject_body(&once, "Body").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_body() {
        assert_eq!(inject_body(&template("x\n"), "  \n").unwrap(), template(""));
    }

    #[test]
    fn marker_errors() {
        assert!(matches!(
            inject_body("no markers", "x"),
            Err(NotetexError::TemplateMarkerMissing(_))
        ));
        let doubled = format!("{START_MARKER}\n{START_MARKER}\n{END_MARKER}\n");
        assert!(matches!(
            inject_body(&doubled, "x"),
            Err(NotetexError::TemplateMarkerDuplicated { count: 2, .. })
        ));
        let reversed = format!("{END_MARKER}\n{START_MARKER}\n");
        assert!(matches!(
            inject_body(&reversed, "x"),
            Err(NotetexError::TemplateMarkersOutOfOrder)
        ));
    }

    #[test]
    fn file_is_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tex");
        std::fs::write(&path, template("")).unwrap();
        inject_into_file(&path, "Hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), template("Hello\n"));
    }

    #[test]
    fn failed_injection_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tex");
        std::fs::write(&path, "no markers here\n").unwrap();
        assert!(inject_into_file(&path, "Hello").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "no markers here\n");
    }
}
