//! Interactive editing of config files

use pmrc_fs::NormalizedPath;
use pmrc_meta::definition::describe_value;
use pmrc_meta::{Catalog, Location};
use tokio::process::Command;

use crate::{Error, Result};

/// The file contents shown to the user: a header, the current data, then
/// every key settable at `location` with its default, commented out.
pub fn annotated(location: Location, file: &NormalizedPath, data: &str, catalog: &Catalog) -> String {
    let mut out = vec![
        ";;;;".to_string(),
        format!("; {location} config from {file}"),
        ";;;;".to_string(),
        String::new(),
    ];
    if !data.is_empty() {
        out.push(data.to_string());
        out.push(String::new());
    }
    out.push(";;;;".to_string());
    out.push("; all available options shown below with default values".to_string());
    out.push(";;;;".to_string());
    out.push(String::new());
    for def in catalog.allowed_at(location) {
        out.push(format!("; {}={}", def.key(), describe_value(def.default())));
    }
    out.join("\n")
}

/// Run `editor` on `file` and wait for it to exit.
///
/// The editor string is split on whitespace; the file is passed as the
/// final argument.
pub async fn launch(editor: &str, file: &NormalizedPath) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let Some(bin) = parts.next() else {
        return Err(Error::EditorSpawn {
            editor: editor.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty editor command"),
        });
    };

    tracing::debug!(editor, file = %file, "launching editor");
    let status = Command::new(bin)
        .args(parts)
        .arg(file.to_native())
        .status()
        .await
        .map_err(|source| Error::EditorSpawn {
            editor: editor.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::EditorExited {
            code: status.code(),
        })
    }
}
