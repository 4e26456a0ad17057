use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::model::EmbeddingEntry;

pub fn entry_path(root: &Path, fingerprint: &str) -> PathBuf {
    let trimmed = fingerprint.trim_start_matches("el_");
    let shard = &trimmed[..trimmed.len().min(2)];
    root.join("embeddings").join(shard).join(format!("{fingerprint}.json"))
}

pub fn write_entry(root: &Path, entry: &EmbeddingEntry) -> io::Result<PathBuf> {
    let path = entry_path(root, &entry.fingerprint);
    let data = serde_json::to_vec(entry)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    write_atomic(path, &data)
}

pub fn read_entry(root: &Path, fingerprint: &str) -> io::Result<Option<EmbeddingEntry>> {
    let path = entry_path(root, fingerprint);
    match fs::read(&path) {
        Ok(data) => {
            let entry = serde_json::from_slice(&data)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
            Ok(Some(entry))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn remove_entry(root: &Path, fingerprint: &str) {
    let _ = fs::remove_file(entry_path(root, fingerprint));
}

fn write_atomic(path: PathBuf, data: &[u8]) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp, &path)?;
    Ok(path)
}
