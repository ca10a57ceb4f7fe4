//! Serialization and persistence of the document.

use std::path::Path;

use boxforge_fsops::write_atomic;
use tracing::{info, instrument};

use crate::error::{GenerateError, RenderError};
use crate::model::Document;
use crate::projection::{ProjectionOptions, RecordSource, project};

/// Serialize with two-space indentation and a trailing newline.
///
/// # Errors
///
/// Returns [`RenderError::Serialize`] if the tree cannot be encoded.
pub fn render_document(document: &Document) -> Result<String, RenderError> {
    let mut text = serde_json::to_string_pretty(document)
        .map_err(|source| RenderError::Serialize { source })?;
    text.push('\n');
    Ok(text)
}

/// Serialize `document` and atomically replace `path` with it.
///
/// # Errors
///
/// Returns [`RenderError::Write`] when the file cannot be replaced; the
/// previous contents stay intact.
pub fn write_document(document: &Document, path: &Path) -> Result<(), RenderError> {
    let text = render_document(document)?;
    write_atomic(path, text.as_bytes()).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Project `source` and write the result to `path`.
///
/// # Errors
///
/// Returns [`GenerateError::Projection`] when the records cannot be projected
/// (nothing is written) and [`GenerateError::Render`] when the write fails.
#[instrument(skip(source, options), fields(path = %path.display()))]
pub async fn generate_document<S>(
    source: &S,
    options: ProjectionOptions,
    path: &Path,
) -> Result<Document, GenerateError>
where
    S: RecordSource + ?Sized,
{
    let document = project(source, options).await?;
    write_document(&document, path)?;
    info!(inbounds = document.inbounds.len(), "configuration document written");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Inbound, Log};
    use boxforge_test_support::fixtures::temp_dir;
    use std::fs;

    fn document() -> Document {
        Document {
            log: Log {
                level: "info".into(),
                ..Log::default()
            },
            inbounds: vec![Inbound {
                kind: "vless".into(),
                tag: "in1".into(),
                listen: "::".into(),
                listen_port: 8080,
                sniff: true,
                sniff_timeout: "300ms".into(),
                ..Inbound::default()
            }],
            ..Document::default()
        }
    }

    #[test]
    fn rendered_text_uses_two_space_indent_and_newline() -> anyhow::Result<()> {
        let text = render_document(&document())?;
        assert!(text.starts_with("{\n  \"log\": {\n    \"level\": \"info\"\n  },\n"));
        assert!(text.ends_with("}\n"));
        assert!(!text.ends_with("}\n\n"));
        Ok(())
    }

    #[test]
    fn mandatory_scalars_survive_a_parse() -> anyhow::Result<()> {
        let text = render_document(&document())?;
        let parsed: serde_json::Value = serde_json::from_str(&text)?;
        let inbound = &parsed["inbounds"][0];
        assert_eq!(inbound["type"], "vless");
        assert_eq!(inbound["tag"], "in1");
        assert_eq!(inbound["listen"], "::");
        assert_eq!(inbound["listen_port"], 8080);
        assert_eq!(inbound["sniff"], true);
        assert_eq!(inbound["sniff_override_destination"], false);
        assert_eq!(inbound["sniff_timeout"], "300ms");
        Ok(())
    }

    #[test]
    fn write_document_replaces_existing_file() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let path = temp.path().join("config.json");
        fs::write(&path, "stale")?;
        write_document(&document(), &path)?;
        assert_eq!(fs::read_to_string(&path)?, render_document(&document())?);
        Ok(())
    }

    #[test]
    fn write_failure_is_reported_as_write_error() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x")?;
        let err = write_document(&document(), &blocker.join("config.json"))
            .expect_err("parent is a file");
        assert!(matches!(err, RenderError::Write { .. }));
        Ok(())
    }
}
