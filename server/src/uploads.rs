//! Multipart form handling for catalog assets. Files are written under the
//! configured upload directory with a millisecond-timestamp filename and
//! exposed back to clients as `/uploads/<subdir>/<name>` paths; records
//! store only that path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Utc;
use tracing::info;

use crate::error::AppError;

pub struct FileRules {
    pub field: &'static str,
    pub subdir: &'static str,
    pub extensions: &'static [&'static str],
    pub mime_prefix: &'static str,
}

pub fn image(subdir: &'static str) -> FileRules {
    FileRules {
        field: "image",
        subdir,
        extensions: &["jpg", "jpeg", "png"],
        mime_prefix: "image/",
    }
}

pub fn audio() -> FileRules {
    FileRules {
        field: "audio",
        subdir: "voices",
        extensions: &["mp3"],
        mime_prefix: "audio/",
    }
}

/// Drains a multipart form into text fields plus at most one stored file.
/// Returns the text fields and the public path of the saved file, if any.
pub async fn read_form(
    mut multipart: Multipart,
    rules: &FileRules,
    upload_root: &str,
) -> Result<(HashMap<String, String>, Option<String>), AppError> {
    let mut fields = HashMap::new();
    let mut saved = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("Malformed multipart payload".to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let file_name = field.file_name().map(str::to_string);
        if name == rules.field {
            if let Some(original) = file_name {
                let ext = Path::new(&original)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_lowercase();

                if !rules.extensions.contains(&ext.as_str()) {
                    return Err(AppError::Validation(format!(
                        "Only {} files are allowed",
                        rules.extensions.join("/")
                    )));
                }

                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with(rules.mime_prefix) {
                    return Err(AppError::Validation(format!(
                        "Unexpected content type: {content_type}"
                    )));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::Validation("Malformed multipart payload".to_string()))?;

                let dir = PathBuf::from(upload_root).join(rules.subdir);
                tokio::fs::create_dir_all(&dir).await?;

                let filename = format!("{}.{ext}", Utc::now().timestamp_millis());
                tokio::fs::write(dir.join(&filename), &data).await?;
                info!("Stored upload {}/{filename}", rules.subdir);

                saved = Some(format!("/uploads/{}/{filename}", rules.subdir));
                continue;
            }
        }

        let text = field
            .text()
            .await
            .map_err(|_| AppError::Validation("Malformed multipart payload".to_string()))?;
        fields.insert(name, text);
    }

    Ok((fields, saved))
}

/// Pulls a required, non-empty text field out of a drained form.
pub fn required_field(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<String, AppError> {
    fields
        .get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}
