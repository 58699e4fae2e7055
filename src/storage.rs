use crate::model::{Listing, StoreError};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TMP_PREFIX: &str = ".tmp-";

#[derive(Debug, Clone)]
pub struct NoteStore {
    dir: PathBuf,
    trash: Option<PathBuf>,
    max_note_size: u64,
}

impl NoteStore {
    pub fn new(dir: PathBuf, trash: Option<PathBuf>, max_note_size: u64) -> Self {
        NoteStore {
            dir,
            trash,
            max_note_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn note_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    pub fn switch_dir(&mut self, dir: PathBuf) -> Result<(), StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::InvalidDirectory(dir));
        }
        self.dir = dir;
        Ok(())
    }

    pub fn list(&self) -> Result<Listing, StoreError> {
        if !self.dir.is_dir() {
            return Ok(Listing::default());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.metadata()?.len() >= self.max_note_size {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if !name.starts_with(TMP_PREFIX) {
                    ids.push(name);
                }
            }
        }
        Ok(Listing::new(ids))
    }

    pub fn load(&self, id: &str) -> Result<String, StoreError> {
        check_id(id)?;
        match fs::read_to_string(self.note_path(id)) {
            Ok(text) => Ok(text),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, id: &str, content: &str) -> Result<(), StoreError> {
        check_id(id)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(tmp_name());
        fs::write(&tmp, content)?;
        if let Err(err) = fs::rename(&tmp, self.note_path(id)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        check_id(id)?;
        let path = self.note_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if let Some(trash) = &self.trash {
            if move_to_trash(&path, trash, id).is_ok() {
                return Ok(());
            }
            log::warn!("could not move {} to trash, removing permanently", id);
        }
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn rename(&self, id: &str, new_id: &str) -> Result<(), StoreError> {
        check_id(id)?;
        check_id(new_id)?;
        if new_id == id {
            return Ok(());
        }
        if self.note_path(new_id).exists() {
            return Err(StoreError::Conflict(new_id.to_string()));
        }
        match fs::rename(self.note_path(id), self.note_path(new_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn move_to_trash(path: &Path, trash: &Path, id: &str) -> Result<(), StoreError> {
    fs::create_dir_all(trash)?;
    let mut dest = trash.join(id);
    if dest.exists() {
        dest = trash.join(format!("{}.{}", id, Utc::now().timestamp()));
    }
    fs::rename(path, dest)?;
    Ok(())
}

fn tmp_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{}{}", TMP_PREFIX, suffix)
}

pub(crate) fn check_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.starts_with(TMP_PREFIX)
        || id.contains('/')
        || id.contains('\\')
    {
        return Err(StoreError::InvalidName(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> NoteStore {
        NoteStore::new(dir.to_path_buf(), None, 1024)
    }

    #[test]
    fn save_then_load_returns_exact_text() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "hello\nworld").unwrap();
        assert_eq!(store.load("a").unwrap(), "hello\nworld");
    }

    #[test]
    fn save_then_load_round_trips_empty_content() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("empty", "").unwrap();
        assert_eq!(store.load("empty").unwrap(), "");
    }

    #[test]
    fn save_then_load_round_trips_just_under_threshold() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let text = "x".repeat(1023);
        store.save("big", &text).unwrap();
        assert_eq!(store.load("big").unwrap(), text);
        assert!(store.list().unwrap().contains("big"));
    }

    #[test]
    fn save_overwrites_previous_content() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "first version, fairly long").unwrap();
        store.save("a", "short").unwrap();
        assert_eq!(store.load("a").unwrap(), "short");
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "text").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir.path().join("notes"));
        store.save("a", "text").unwrap();
        assert_eq!(store.load("a").unwrap(), "text");
    }

    #[test]
    fn list_is_sorted() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("beta", "2").unwrap();
        store.save("alpha", "1").unwrap();
        store.save("gamma", "3").unwrap();
        assert_eq!(store.list().unwrap().ids(), &["alpha", "beta", "gamma"]);
    }

    #[test]
    fn list_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir.path().join("nowhere"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn list_skips_subdirectories() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "text").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        assert_eq!(store.list().unwrap().ids(), &["a"]);
    }

    #[test]
    fn list_filters_out_oversized_files() {
        let dir = tempdir().unwrap();
        let store = NoteStore::new(dir.path().to_path_buf(), None, 8);
        fs::write(dir.path().join("at_limit"), "12345678").unwrap();
        fs::write(dir.path().join("under"), "1234567").unwrap();
        fs::write(dir.path().join("over"), "123456789").unwrap();
        assert_eq!(store.list().unwrap().ids(), &["under"]);
    }

    #[test]
    fn list_skips_stranded_temp_files() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "text").unwrap();
        fs::write(dir.path().join(".tmp-a1b2c3d4"), "junk").unwrap();
        assert_eq!(store.list().unwrap().ids(), &["a"]);
    }

    #[test]
    fn temp_prefix_names_are_reserved() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.save(".tmp-note", "x"),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn load_of_missing_note_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.load("gone"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn delete_moves_note_into_trash() {
        let dir = tempdir().unwrap();
        let trash = dir.path().join("trash");
        let store = NoteStore::new(dir.path().join("notes"), Some(trash.clone()), 1024);
        store.save("a", "keep me around").unwrap();
        store.delete("a").unwrap();
        assert!(!store.note_path("a").exists());
        assert_eq!(fs::read_to_string(trash.join("a")).unwrap(), "keep me around");
    }

    #[test]
    fn delete_without_trash_removes_permanently() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "text").unwrap();
        store.delete("a").unwrap();
        assert!(!store.note_path("a").exists());
    }

    #[test]
    fn delete_of_missing_note_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.delete("gone"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_same_name_twice_keeps_both_trash_copies() {
        let dir = tempdir().unwrap();
        let trash = dir.path().join("trash");
        let store = NoteStore::new(dir.path().join("notes"), Some(trash.clone()), 1024);
        store.save("a", "first").unwrap();
        store.delete("a").unwrap();
        store.save("a", "second").unwrap();
        store.delete("a").unwrap();
        let count = fs::read_dir(&trash).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn rename_to_existing_name_is_conflict() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "content a").unwrap();
        store.save("b", "content b").unwrap();
        assert!(matches!(
            store.rename("a", "b"),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.load("a").unwrap(), "content a");
        assert_eq!(store.load("b").unwrap(), "content b");
    }

    #[test]
    fn rename_moves_note_to_new_name() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.save("a", "content").unwrap();
        store.rename("a", "z").unwrap();
        let listing = store.list().unwrap();
        assert!(listing.contains("z"));
        assert!(!listing.contains("a"));
        assert_eq!(store.load("z").unwrap(), "content");
    }

    #[test]
    fn rename_of_missing_note_is_not_found() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(matches!(
            store.rename("gone", "z"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn ids_with_path_separators_are_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir.path().join("notes"));
        store.save("a", "text").unwrap();
        assert!(matches!(
            store.save("../escape", "x"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.save("nested\\name", "x"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.load("../escape"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(store.delete(".."), Err(StoreError::InvalidName(_))));
        assert!(matches!(
            store.rename("a", "sub/dir"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(!dir.path().join("escape").exists());
        assert_eq!(store.load("a").unwrap(), "text");
    }

    #[test]
    fn switch_dir_rejects_non_directories() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.save("a", "text").unwrap();
        let err = store.switch_dir(dir.path().join("missing"));
        assert!(matches!(err, Err(StoreError::InvalidDirectory(_))));
        let file = store.note_path("a");
        assert!(matches!(
            store.switch_dir(file),
            Err(StoreError::InvalidDirectory(_))
        ));
        assert_eq!(store.dir(), dir.path());
    }

    #[test]
    fn switch_dir_changes_listing_root() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("other");
        fs::create_dir(&other).unwrap();
        fs::write(other.join("elsewhere"), "hi").unwrap();
        let mut store = store_in(dir.path());
        store.save("here", "hi").unwrap();
        store.switch_dir(other).unwrap();
        assert_eq!(store.list().unwrap().ids(), &["elsewhere"]);
    }
}
