use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::model::PromotionEntry;

/// One file per `(page_signature, frame_hash, label_key, selector)` row,
/// mirroring the persisted layout's uniqueness constraint.
pub fn entry_path(root: &Path, content_id: &str) -> PathBuf {
    let trimmed = content_id.trim_start_matches("pe_");
    let shard = &trimmed[..trimmed.len().min(2)];
    root.join("promotions").join(shard).join(format!("{content_id}.json"))
}

pub fn write_entry(root: &Path, content_id: &str, entry: &PromotionEntry) -> io::Result<PathBuf> {
    let path = entry_path(root, content_id);
    let data = serde_json::to_vec(entry)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    write_atomic(path, &data)
}

pub fn read_entry(root: &Path, content_id: &str) -> io::Result<Option<PromotionEntry>> {
    let path = entry_path(root, content_id);
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

pub fn remove_entry(root: &Path, content_id: &str) {
    let _ = fs::remove_file(entry_path(root, content_id));
}

pub fn list_all(root: &Path) -> Vec<PromotionEntry> {
    let base = root.join("promotions");
    let mut out = Vec::new();
    let Ok(shards) = fs::read_dir(&base) else {
        return out;
    };
    for shard in shards.flatten() {
        let Ok(files) = fs::read_dir(shard.path()) else {
            continue;
        };
        for file in files.flatten() {
            if let Ok(data) = fs::read(file.path()) {
                if let Ok(entry) = serde_json::from_slice::<PromotionEntry>(&data) {
                    out.push(entry);
                }
            }
        }
    }
    out
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
