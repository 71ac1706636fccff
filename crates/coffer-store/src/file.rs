use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, ObjectStore};

/// Flush strategy for entry writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` every entry before it is renamed into place (safest, slowest).
    EveryWrite,
    /// Rely on OS page-cache buffering; the rename is still atomic.
    #[default]
    OsDefault,
}

/// Entry file extension.
const ENTRY_EXT: &str = ".pt";

/// Prefix of in-flight temporary files. Never produced by key escaping.
const TEMP_PREFIX: &str = "%tmp-";

/// Temporary files younger than this may belong to a writer in another
/// handle on the same directory and are left alone on open.
const STALE_TEMP_AGE: Duration = Duration::from_secs(10 * 60);

/// Longest file name most filesystems accept.
const MAX_FILE_NAME: usize = 255;

/// Entry frame magic.
const MAGIC: &[u8; 4] = b"CFR1";

/// Header size: 4 bytes magic + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Directory-backed object store: one file per key.
///
/// On-disk entry format:
/// ```text
/// [4 bytes: magic "CFR1"]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload]
/// ```
///
/// Writes go to a temporary file in the store directory and are renamed over
/// the entry, so a crash leaves either the old entry or the new one.
/// Temporary files left by an interrupted write are removed on open once
/// they are older than ten minutes; younger ones may be in flight from
/// another handle on the same directory.
pub struct FileObjectStore {
    dir: PathBuf,
    sync_mode: SyncMode,
}

impl FileObjectStore {
    /// Open (or create) the store named `name` under `root`.
    pub fn open(root: &Path, name: &str, sync_mode: SyncMode) -> StoreResult<Self> {
        validate_key(name)?;
        if name == "." || name == ".." {
            return Err(StoreError::InvalidKey {
                key: name.to_string(),
                reason: "store name must not be a relative path component".into(),
            });
        }
        let dir = root.join(encode_key(name));
        fs::create_dir_all(&dir)?;

        let store = Self { dir, sync_mode };
        let removed = store.remove_stray_temp_files()?;
        info!(dir = %store.dir.display(), removed, "file store opened");
        Ok(store)
    }

    /// Directory holding this store's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        let file_name = format!("{}{ENTRY_EXT}", encode_key(key));
        if file_name.len() > MAX_FILE_NAME {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: format!(
                    "escaped file name is {} bytes, limit is {MAX_FILE_NAME}",
                    file_name.len()
                ),
            });
        }
        Ok(self.dir.join(file_name))
    }

    fn remove_stray_temp_files(&self) -> StoreResult<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(TEMP_PREFIX) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            // A clock step backwards reads as zero age.
            let age = now.duration_since(modified).unwrap_or_default();
            if age < STALE_TEMP_AGE {
                continue;
            }
            warn!(file = ?name, age_secs = age.as_secs(), "removing interrupted write");
            match fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                // Another opener got there first.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

impl ObjectStore for FileObjectStore {
    fn insert(&self, key: &str, payload: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let write_err = |source: io::Error| StoreError::Write {
            key: key.to_string(),
            source,
        };

        // Recreated on demand so the store is reusable after `destroy`.
        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(write_err)?;
        tmp.write_all(&frame(payload)).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        if matches!(self.sync_mode, SyncMode::EveryWrite) {
            tmp.as_file().sync_all().map_err(write_err)?;
        }
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        debug!(key, len = payload.len(), "entry written");
        Ok(())
    }

    fn select(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => unframe(key, &bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn exist(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        path.try_exists().map_err(|source| StoreError::Read {
            key: key.to_string(),
            source,
        })
    }

    fn delete_if_exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "entry deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Write {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn all_keys(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                warn!(file = ?name, "skipping non UTF-8 file name");
                continue;
            };
            let Some(stem) = name.strip_suffix(ENTRY_EXT) else {
                continue;
            };
            match decode_key(stem) {
                Some(key) => keys.push(key),
                None => warn!(file = name, "skipping undecodable entry name"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn destroy(&self) -> StoreResult<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(dir = %self.dir.display(), "file store destroyed");
        Ok(())
    }
}

impl std::fmt::Debug for FileObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileObjectStore")
            .field("dir", &self.dir)
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn unframe(key: &str, bytes: &[u8]) -> StoreResult<Vec<u8>> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::corrupt(
            key,
            format!("truncated entry ({} bytes)", bytes.len()),
        ));
    }
    let (header, payload) = bytes.split_at(HEADER_SIZE);
    if &header[..4] != MAGIC {
        return Err(StoreError::corrupt(key, "bad entry magic"));
    }
    let expected = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let actual = crc32fast::hash(payload);
    if expected != actual {
        return Err(StoreError::corrupt(
            key,
            format!("CRC mismatch: expected {expected:#010x}, got {actual:#010x}"),
        ));
    }
    Ok(payload.to_vec())
}

/// Escape a key into a file-name-safe string.
///
/// ASCII alphanumerics, `-`, `_` and `.` pass through; every other byte
/// becomes `%` followed by two lowercase hex digits.
pub(crate) fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for &b in key.as_bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&hex::encode([b]));
        }
    }
    out
}

/// Inverse of [`encode_key`]. Returns `None` for names it never produces.
pub(crate) fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let digits = bytes.get(i + 1..i + 3)?;
            out.extend(hex::decode(digits).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
