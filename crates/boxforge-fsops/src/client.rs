//! Per-user client documents derived from a caller-supplied template.

use std::path::{Path, PathBuf};

use boxforge_data::UserRow;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::atomic::write_atomic;
use crate::error::{FsOpsError, FsOpsResult};
use crate::names::validate_file_stem;
use crate::report::EmitReport;

const UUID_KEY: &str = "uuid";

/// Replace the value of every `uuid` key with `uuid`.
///
/// Objects and arrays are traversed at any depth. A replaced value is not
/// descended into, and scalars elsewhere are left untouched.
pub fn rewrite_uuid(value: &mut Value, uuid: &str) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == UUID_KEY {
                    *child = Value::String(uuid.to_string());
                } else {
                    rewrite_uuid(child, uuid);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_uuid(item, uuid);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Render the template for one credential.
///
/// # Errors
///
/// Returns [`FsOpsError::Json`] when the template is not valid JSON.
pub fn render_client_document(template: &str, uuid: &str, origin: &Path) -> FsOpsResult<String> {
    let mut document: Value = serde_json::from_str(template)
        .map_err(|source| FsOpsError::json("client.parse_template", origin, source))?;
    rewrite_uuid(&mut document, uuid);
    let mut rendered = serde_json::to_string_pretty(&document)
        .map_err(|source| FsOpsError::json("client.serialize", origin, source))?;
    rendered.push('\n');
    Ok(rendered)
}

/// Writes one client document per active user.
#[derive(Debug, Clone)]
pub struct ClientEmitter {
    users_dir: PathBuf,
    extension: String,
}

impl ClientEmitter {
    /// Emit into `users_dir`, naming files `<user>.<extension>`.
    #[must_use]
    pub fn new(users_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            users_dir: users_dir.into(),
            extension: extension.into(),
        }
    }

    /// Destination path for a user's document.
    #[must_use]
    pub fn document_path(&self, user_name: &str) -> PathBuf {
        self.users_dir.join(format!("{user_name}.{}", self.extension))
    }

    /// Write a document for every active user in `users`.
    ///
    /// Failures for one user are logged and recorded in the report; the rest
    /// continue. `template_path` is only used to label parse failures.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::NothingWritten`] when at least one user was
    /// eligible but none of their documents could be written.
    pub fn emit(
        &self,
        users: &[UserRow],
        template: &str,
        template_path: &Path,
    ) -> FsOpsResult<EmitReport> {
        let mut report = EmitReport::default();
        let mut attempted = 0_usize;

        for user in users {
            if !user.active {
                debug!(user = %user.name, "skipping inactive user");
                continue;
            }
            attempted += 1;

            if let Err(err) = validate_file_stem(&user.name) {
                warn!(
                    user = %user.name,
                    error = %err,
                    "rejected user name for client document"
                );
                report.fail(&user.name, "user name is not a valid file name");
                continue;
            }

            let rendered = match render_client_document(template, &user.uuid, template_path) {
                Ok(rendered) => rendered,
                Err(err) => {
                    warn!(user = %user.name, error = ?err, "failed to render client document");
                    report.fail(&user.name, "template could not be rendered");
                    continue;
                }
            };

            let path = self.document_path(&user.name);
            if let Err(err) = write_atomic(&path, rendered.as_bytes()) {
                warn!(
                    user = %user.name,
                    path = %path.display(),
                    error = ?err,
                    "failed to write client document"
                );
                report.fail(&user.name, "client document could not be written");
                continue;
            }
            info!(path = %path.display(), "generated client document");
            report.written.push(path);
        }

        if attempted > 0 && report.produced() == 0 {
            return Err(FsOpsError::NothingWritten {
                operation: "client.emit",
                attempted,
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxforge_test_support::fixtures::{CLIENT_TEMPLATE, file_names, temp_dir};
    use serde_json::json;
    use std::fs;

    fn user(name: &str, uuid: &str, active: bool) -> UserRow {
        UserRow {
            id: 0,
            name: name.to_string(),
            uuid: uuid.to_string(),
            sub: format!("sub-{name}"),
            active,
        }
    }

    #[test]
    fn rewrite_uuid_reaches_nested_objects_and_arrays() {
        let mut value = json!({
            "uuid": "root",
            "outbounds": [
                {"uuid": "old", "nested": {"uuid": "deeper"}},
                ["x", {"uuid": 7}],
                "uuid"
            ],
            "other": "uuid"
        });
        rewrite_uuid(&mut value, "u-9");
        assert_eq!(
            value,
            json!({
                "uuid": "u-9",
                "outbounds": [
                    {"uuid": "u-9", "nested": {"uuid": "u-9"}},
                    ["x", {"uuid": "u-9"}],
                    "uuid"
                ],
                "other": "uuid"
            })
        );
    }

    #[test]
    fn replaced_values_are_not_descended_into() {
        let mut value = json!({"uuid": {"uuid": "inner"}});
        rewrite_uuid(&mut value, "u-1");
        assert_eq!(value, json!({"uuid": "u-1"}));
    }

    #[test]
    fn emit_writes_one_document_per_active_user() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let emitter = ClientEmitter::new(temp.path().join("users"), "json");
        let users = [user("carol", "u-9", true), user("dave", "u-10", false)];

        let report = emitter.emit(&users, CLIENT_TEMPLATE, Path::new("template.json"))?;

        assert_eq!(report.written, [emitter.document_path("carol")]);
        assert!(report.failures.is_empty());
        assert_eq!(file_names(&temp.path().join("users"))?, ["carol.json"]);
        let written: Value = serde_json::from_str(&fs::read_to_string(&report.written[0])?)?;
        let mut expected: Value = serde_json::from_str(CLIENT_TEMPLATE)?;
        rewrite_uuid(&mut expected, "u-9");
        assert_eq!(written, expected);
        Ok(())
    }

    #[test]
    fn unsafe_names_are_skipped_without_stopping_others() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let emitter = ClientEmitter::new(temp.path(), "json");
        let users = [user("../escape", "u-1", true), user("erin", "u-2", true)];

        let report = emitter.emit(&users, r#"{"uuid":""}"#, Path::new("template.json"))?;

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].user, "../escape");
        assert_eq!(file_names(temp.path())?, ["erin.json"]);
        Ok(())
    }

    #[test]
    fn invalid_template_fails_every_user() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let emitter = ClientEmitter::new(temp.path(), "json");
        let err = emitter
            .emit(&[user("frank", "u-3", true)], "{not json", Path::new("t.json"))
            .expect_err("nothing should be written");
        assert!(matches!(
            err,
            FsOpsError::NothingWritten {
                attempted: 1,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn no_active_users_is_not_an_error() -> anyhow::Result<()> {
        let temp = temp_dir()?;
        let emitter = ClientEmitter::new(temp.path(), "json");
        let report = emitter.emit(&[user("gina", "u-4", false)], "{not json", Path::new("t.json"))?;
        assert_eq!(report, EmitReport::default());
        Ok(())
    }
}
