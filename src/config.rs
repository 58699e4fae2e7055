use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings: PathBuf,
    pub trash: PathBuf,
    pub lock: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let dirs = BaseDirs::new().context("locating home directory")?;
        Ok(AppPaths::under(dirs.home_dir()))
    }

    pub fn under(home: &Path) -> Self {
        let root = home.join(".cloud_notes");
        AppPaths {
            settings: root.join("settings.cfg"),
            trash: root.join("trash"),
            lock: root.join("instance.lock"),
            root,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,
    #[serde(default = "default_x")]
    pub x: i32,
    #[serde(default = "default_y")]
    pub y: i32,
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_note: Option<String>,
    #[serde(default = "default_max_note_size")]
    pub max_note_size: u64,
    #[serde(default = "default_show_list")]
    pub show_list: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            notes_dir: default_notes_dir(),
            x: default_x(),
            y: default_y(),
            width: default_width(),
            height: default_height(),
            current_note: None,
            max_note_size: default_max_note_size(),
            show_list: default_show_list(),
        }
    }
}

impl Settings {
    pub fn load_or_init(path: &Path) -> Result<Settings> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save(path)?;
            return Ok(settings);
        }
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let settings: Settings =
            serde_json::from_str(&data).context("parsing settings file")?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let serialized = serde_json::to_string_pretty(self).context("serializing settings")?;
        fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }
}

fn default_notes_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".cloud_notes").join("notes"))
        .unwrap_or_else(|| PathBuf::from(".cloud_notes/notes"))
}

fn default_x() -> i32 {
    200
}

fn default_y() -> i32 {
    200
}

fn default_width() -> u16 {
    80
}

fn default_height() -> u16 {
    24
}

fn default_max_note_size() -> u64 {
    1024
}

fn default_show_list() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_or_init_writes_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        let settings = Settings::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.max_note_size, 1024);
        assert_eq!(settings.current_note, None);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        fs::write(&path, r#"{"notes_dir": "/tmp/mynotes", "x": 10}"#).unwrap();
        let settings = Settings::load_or_init(&path).unwrap();
        assert_eq!(settings.notes_dir, PathBuf::from("/tmp/mynotes"));
        assert_eq!(settings.x, 10);
        assert_eq!(settings.y, 200);
        assert_eq!(settings.width, 80);
        assert_eq!(settings.max_note_size, 1024);
        assert!(settings.show_list);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        fs::write(&path, r#"{"x": 5, "theme": "dark", "font_size": 12}"#).unwrap();
        let settings = Settings::load_or_init(&path).unwrap();
        assert_eq!(settings.x, 5);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        let settings = Settings {
            current_note: Some("Note_17".to_string()),
            notes_dir: PathBuf::from("/tmp/elsewhere"),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let reloaded = Settings::load_or_init(&path).unwrap();
        assert_eq!(reloaded.current_note.as_deref(), Some("Note_17"));
        assert_eq!(reloaded.notes_dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn absent_current_note_is_omitted_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.cfg");
        Settings::default().save(&path).unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(!data.contains("current_note"));
    }

    #[test]
    fn paths_sit_under_one_root() {
        let paths = AppPaths::under(Path::new("/home/someone"));
        assert_eq!(paths.root, PathBuf::from("/home/someone/.cloud_notes"));
        assert_eq!(
            paths.settings,
            PathBuf::from("/home/someone/.cloud_notes/settings.cfg")
        );
        assert_eq!(paths.trash, PathBuf::from("/home/someone/.cloud_notes/trash"));
    }
}
