use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::Document;
use crate::error::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON, everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Load a document. An empty path is a no-op and yields `None`; an empty
/// file loads as null.
pub fn load(path: &Path) -> Result<Option<Document>, DocumentError> {
    if path.as_os_str().is_empty() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let doc = if text.trim().is_empty() {
        Document::Null
    } else {
        match DocumentFormat::from_path(path) {
            DocumentFormat::Json => serde_json::from_str(&text)?,
            DocumentFormat::Yaml => serde_yaml::from_str(&text)?,
        }
    };
    info!(path = %path.display(), "loaded document");
    Ok(Some(doc))
}

/// Save a document in block style, keeping key order. An empty path is a no-op.
pub fn save(path: &Path, doc: &Document) -> Result<(), DocumentError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    let text = match DocumentFormat::from_path(path) {
        DocumentFormat::Json => {
            let mut s = serde_json::to_string_pretty(doc)?;
            s.push('\n');
            s
        }
        DocumentFormat::Yaml => to_yaml_string(doc)?,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    info!(path = %path.display(), "saved document");
    Ok(())
}

pub fn to_yaml_string(doc: &Document) -> Result<String, DocumentError> {
    Ok(serde_yaml::to_string(doc)?)
}

fn is_document_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Recursively list YAML/JSON documents under `dir`, sorted. Hidden
/// directories and `target/` are skipped.
pub fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let walker = WalkDir::new(dir).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        let name = e.file_name().to_string_lossy();
        !name.starts_with('.') && name != "target"
    });
    for entry in walker.flatten() {
        let p = entry.path();
        if entry.file_type().is_file() && is_document_file(p) {
            out.push(p.to_path_buf());
        }
    }
    out.sort();
    debug!(dir = %dir.display(), found = out.len(), "document scan");
    out
}

/// Zip the file at `path` into `<stem>_<timestamp>.zip` next to it.
pub fn zip_backup(path: &Path) -> Result<PathBuf, DocumentError> {
    if !path.is_file() {
        return Err(DocumentError::NotAFile(path.display().to_string()));
    }
    let parent = path.parent().unwrap_or(Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("document");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_{}.zip", stem, ts));

    let file = fs::File::create(&dest)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    zip.start_file(name, options)?;
    zip.write_all(&fs::read(path)?)?;
    zip.finish()?;
    info!(backup = %dest.display(), "wrote backup");
    Ok(dest)
}
