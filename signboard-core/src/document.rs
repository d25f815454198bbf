//! Generic key/value JSON document.
//!
//! Backs both `config.json` and `notice_cache.json`. The document is loaded
//! once on open, mutated in memory through typed `get`/`set`, and written
//! back only on an explicit [`JsonDocument::save`]. Keys this crate does not
//! know about are carried through load/save untouched.
//!
//! Write flow: serialize → `<file>.tmp` sibling → `chmod 0600` → `rename`.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{io_err, CoreError};

#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
    root: Map<String, Value>,
    dirty: bool,
}

impl JsonDocument {
    /// Open the document at `path`, creating parent directories and an empty
    /// `{}` file when it does not exist yet.
    ///
    /// Returns `CoreError::Parse` if the file exists but is not a JSON object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
                set_dir_permissions(dir)?;
            }
        }
        if !path.exists() {
            let doc = Self::empty(path);
            doc.save()?;
            return Ok(doc);
        }
        let root = read_object(&path)?;
        Ok(Self {
            path,
            root,
            dirty: false,
        })
    }

    /// In-memory empty document bound to `path`; nothing is written until `save`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: Map::new(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the in-memory document has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Typed read. `Ok(None)` when the key is absent or JSON `null`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        match self.root.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| CoreError::Value {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Typed write (in memory only).
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), CoreError> {
        let value = serde_json::to_value(value)?;
        self.root.insert(key.to_string(), value);
        self.dirty = true;
        Ok(())
    }

    /// Read `key`, inserting `default` when it is absent.
    pub fn get_or_insert<T>(&mut self, key: &str, default: T) -> Result<T, CoreError>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        self.set(key, &default)?;
        Ok(default)
    }

    /// Atomically write the document to disk (pretty-printed).
    pub fn save(&self) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(&self.root)?;
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.json".to_string());
        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }

    /// `save`, then mark the in-memory state clean.
    pub fn commit(&mut self) -> Result<(), CoreError> {
        self.save()?;
        self.dirty = false;
        Ok(())
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    // A zero-length file is what a crash between create and first write leaves.
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(&contents).map_err(|source| CoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join(".signboard").join("doc.json")
    }

    #[test]
    fn open_creates_empty_object_file() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        let doc = JsonDocument::open(&path).expect("open");
        assert!(path.exists());
        assert!(!doc.contains_key("anything"));
        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, Value::Object(Map::new()));
    }

    #[test]
    fn set_save_reopen_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        let mut doc = JsonDocument::open(&path).unwrap();
        doc.set("count", 7u32).unwrap();
        doc.set("name", "north-gate").unwrap();
        doc.save().unwrap();

        let reopened = JsonDocument::open(&path).unwrap();
        assert_eq!(reopened.get::<u32>("count").unwrap(), Some(7));
        assert_eq!(
            reopened.get::<String>("name").unwrap().as_deref(),
            Some("north-gate")
        );
    }

    #[test]
    fn unknown_keys_survive_save() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"foreign":{"nested":[1,2,3]}}"#).unwrap();

        let mut doc = JsonDocument::open(&path).unwrap();
        doc.set("mine", true).unwrap();
        doc.save().unwrap();

        let reopened = JsonDocument::open(&path).unwrap();
        assert_eq!(
            reopened.get::<Value>("foreign").unwrap(),
            Some(serde_json::json!({"nested": [1, 2, 3]}))
        );
    }

    #[test]
    fn get_or_insert_marks_dirty_only_when_missing() {
        let tmp = TempDir::new().unwrap();
        let mut doc = JsonDocument::open(doc_path(&tmp)).unwrap();
        assert_eq!(doc.get_or_insert("port", 3306u16).unwrap(), 3306);
        assert!(doc.is_dirty());
        doc.commit().unwrap();
        assert!(!doc.is_dirty());

        assert_eq!(doc.get_or_insert("port", 1u16).unwrap(), 3306);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn wrong_shape_is_a_value_error() {
        let tmp = TempDir::new().unwrap();
        let mut doc = JsonDocument::open(doc_path(&tmp)).unwrap();
        doc.set("port", "not-a-number").unwrap();
        let err = doc.get::<u16>("port").unwrap_err();
        assert!(matches!(err, CoreError::Value { ref key, .. } if key == "port"));
    }

    #[test]
    fn corrupt_file_is_a_parse_error_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonDocument::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
        assert!(err.to_string().contains("doc.json"));
    }

    #[test]
    fn zero_length_file_opens_empty() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        let doc = JsonDocument::open(&path).expect("open");
        assert!(!doc.contains_key("x"));
    }

    #[test]
    fn save_cleans_up_tmp_file() {
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        let mut doc = JsonDocument::open(&path).unwrap();
        doc.set("k", 1).unwrap();
        doc.save().unwrap();
        assert!(!path.with_file_name("doc.json.tmp").exists());
    }

    #[test]
    #[cfg(unix)]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = doc_path(&tmp);
        JsonDocument::open(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
