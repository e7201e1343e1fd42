//! Multipart form collection, upload validation, and on-disk storage under the uploads root.

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};

pub const PUBLIC_PREFIX: &str = "/Uploads";
const MB: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct UploadRule {
    pub max_bytes: usize,
    pub extensions: &'static [&'static str],
    pub subdir: &'static str,
    pub label: &'static str,
}

pub const BUSINESS_LICENSE: UploadRule = UploadRule {
    max_bytes: 5 * MB,
    extensions: &["pdf"],
    subdir: "BusinessLicenses",
    label: "Business license",
};

pub const AVATAR: UploadRule = UploadRule {
    max_bytes: 5 * MB,
    extensions: &["jpg", "jpeg", "png", "gif"],
    subdir: "Avatars",
    label: "Avatar",
};

pub const PROFILE_CV: UploadRule = UploadRule {
    max_bytes: 10 * MB,
    extensions: &["pdf", "doc", "docx"],
    subdir: "CVs",
    label: "CV",
};

pub const APPLICATION_CV: UploadRule = UploadRule {
    subdir: "ApplicationCVs",
    ..PROFILE_CV
};

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Text fields and file parts of a multipart request, keyed by field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) => {
                    let data = field.bytes().await?;
                    if !file_name.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, data });
                    }
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text value; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn magic_bytes_match(ext: &str, data: &[u8]) -> bool {
    match ext {
        "pdf" => data.starts_with(b"%PDF"),
        "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8]),
        "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "gif" => data.starts_with(b"GIF8"),
        "docx" => data.starts_with(b"PK\x03\x04"),
        "doc" => data.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]),
        _ => false,
    }
}

/// Checks presence, size, extension and content signature; returns the lower-cased extension.
pub fn validate(rule: &UploadRule, file: Option<&UploadedFile>) -> Result<String> {
    let Some(file) = file.filter(|f| !f.data.is_empty()) else {
        return Err(Error::bad_request(
            "NO_FILE",
            format!("{} file is required", rule.label),
        ));
    };
    if file.data.len() > rule.max_bytes {
        return Err(Error::bad_request(
            "FILE_TOO_LARGE",
            format!(
                "{} file must not exceed {} MB",
                rule.label,
                rule.max_bytes / MB
            ),
        ));
    }
    let ext = file.extension().unwrap_or_default();
    if !rule.extensions.contains(&ext.as_str()) || !magic_bytes_match(&ext, &file.data) {
        return Err(Error::bad_request(
            "INVALID_FILE_TYPE",
            format!(
                "{} file must be one of: {}",
                rule.label,
                rule.extensions
                    .iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
    Ok(ext)
}

/// Validates a required upload and hands it back with its extension.
pub fn accept(rule: &UploadRule, file: Option<UploadedFile>) -> Result<(UploadedFile, String)> {
    let ext = validate(rule, file.as_ref())?;
    file.map(|file| (file, ext))
        .ok_or_else(|| Error::bad_request("NO_FILE", format!("{} file is required", rule.label)))
}

const MAX_FILE_NAME_LEN: usize = 120;

/// Keeps the final path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }
    // Shorten the stem, never the extension.
    let (stem, ext) = match trimmed.rfind('.') {
        Some(dot) if trimmed.len() - dot <= 16 => trimmed.split_at(dot),
        _ => (trimmed, ""),
    };
    let keep = MAX_FILE_NAME_LEN.saturating_sub(ext.len()).max(1);
    let mut name: String = stem.chars().take(keep).collect();
    name.push_str(ext);
    name
}

/// Writes the file and returns its public path (`/Uploads/{subdir}/{name}`).
pub async fn store(root: &Path, rule: &UploadRule, stored_name: &str, data: &Bytes) -> Result<String> {
    let dir = root.join(rule.subdir);
    fs::create_dir_all(&dir).await?;
    let file_path = dir.join(stored_name);
    fs::write(&file_path, data).await.map_err(|e| {
        tracing::error!(path = %file_path.display(), error = %e, "failed to write upload");
        Error::Io(e)
    })?;
    Ok(format!("{}/{}/{}", PUBLIC_PREFIX, rule.subdir, stored_name))
}

/// Maps a public `/Uploads/...` path back onto the uploads root, refusing traversal.
pub fn resolve_public_path(root: &Path, public_path: &str) -> Option<PathBuf> {
    let relative = public_path.strip_prefix(PUBLIC_PREFIX)?.trim_start_matches('/');
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Best-effort delete of a previously stored upload.
pub async fn remove(root: &Path, public_path: &str) {
    let Some(path) = resolve_public_path(root, public_path) else {
        return;
    };
    if let Err(err) = fs::remove_file(&path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove old upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, data: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: name.into(),
            data: Bytes::from(data),
        }
    }

    fn pdf(size: usize) -> Vec<u8> {
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(size.max(data.len()), b'0');
        data
    }

    fn code(result: Result<String>) -> &'static str {
        result.unwrap_err().code()
    }

    #[test]
    fn missing_file_is_rejected() {
        assert_eq!(code(validate(&BUSINESS_LICENSE, None)), "NO_FILE");
        let empty = file("license.pdf", vec![]);
        assert_eq!(code(validate(&BUSINESS_LICENSE, Some(&empty))), "NO_FILE");
    }

    #[test]
    fn oversized_license_is_rejected() {
        let big = file("license.pdf", pdf(6 * MB));
        assert_eq!(code(validate(&BUSINESS_LICENSE, Some(&big))), "FILE_TOO_LARGE");
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let docx = file("license.docx", b"PK\x03\x04rest".to_vec());
        assert_eq!(code(validate(&BUSINESS_LICENSE, Some(&docx))), "INVALID_FILE_TYPE");
    }

    #[test]
    fn spoofed_content_is_rejected() {
        let fake = file("license.pdf", b"MZ not a pdf".to_vec());
        assert_eq!(code(validate(&BUSINESS_LICENSE, Some(&fake))), "INVALID_FILE_TYPE");
    }

    #[test]
    fn valid_files_pass() {
        let license = file("License.PDF", pdf(1024));
        assert_eq!(validate(&BUSINESS_LICENSE, Some(&license)).unwrap(), "pdf");
        let avatar = file("me.png", vec![0x89, 0x50, 0x4E, 0x47, 0x0D]);
        assert_eq!(validate(&AVATAR, Some(&avatar)).unwrap(), "png");
        let cv = file("cv.docx", b"PK\x03\x04word".to_vec());
        assert_eq!(validate(&APPLICATION_CV, Some(&cv)).unwrap(), "docx");
    }

    #[test]
    fn cv_limit_is_ten_megabytes() {
        let cv = file("cv.pdf", pdf(9 * MB));
        assert!(validate(&PROFILE_CV, Some(&cv)).is_ok());
        let too_big = file("cv.pdf", pdf(11 * MB));
        assert_eq!(code(validate(&PROFILE_CV, Some(&too_big))), "FILE_TOO_LARGE");
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my license (1).pdf"), "my_license__1_.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");

        let long = format!("{}.pdf", "a".repeat(300));
        let cut = sanitize_file_name(&long);
        assert_eq!(cut.len(), 120);
        assert!(cut.ends_with("aaa.pdf"));
    }

    #[test]
    fn public_paths_cannot_escape_root() {
        let root = Path::new("/srv/uploads");
        assert_eq!(
            resolve_public_path(root, "/Uploads/Avatars/a.png"),
            Some(PathBuf::from("/srv/uploads/Avatars/a.png"))
        );
        assert_eq!(resolve_public_path(root, "/Uploads/../secret"), None);
        assert_eq!(resolve_public_path(root, "/etc/passwd"), None);
    }

    #[tokio::test]
    async fn store_writes_under_subdir() {
        let root = std::env::temp_dir().join(format!("job-board-upload-{}", uuid::Uuid::new_v4()));
        let data = Bytes::from(pdf(64));
        let public = store(&root, &BUSINESS_LICENSE, "x_license.pdf", &data)
            .await
            .unwrap();
        assert_eq!(public, "/Uploads/BusinessLicenses/x_license.pdf");
        let on_disk = resolve_public_path(&root, &public).unwrap();
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), data.to_vec());
        remove(&root, &public).await;
        assert!(!on_disk.exists());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
