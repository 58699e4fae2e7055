use crate::config::{AppPaths, Settings};
use crate::model::{synthesize_id, Listing, NoteId, StoreError};
use crate::storage::{check_id, NoteStore};
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    Unchanged,
}

#[derive(Clone, Copy)]
enum Step {
    Previous,
    Next,
}

pub struct Session {
    store: NoteStore,
    settings: Settings,
    paths: AppPaths,
    listing: Listing,
    current: NoteId,
    baseline: String,
}

impl Session {
    pub fn start(settings: Settings, paths: AppPaths) -> Result<Session, StoreError> {
        let store = NoteStore::new(
            settings.notes_dir.clone(),
            Some(paths.trash.clone()),
            settings.max_note_size,
        );
        let listing = store.list()?;
        let mut session = Session {
            store,
            settings,
            paths,
            listing,
            current: NoteId::new(),
            baseline: String::new(),
        };
        let remembered = session.settings.current_note.clone().unwrap_or_default();
        match session.listing.resolve(&remembered).cloned() {
            Some(id) => session.open(id)?,
            None => session.begin_new(),
        }
        Ok(session)
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn text(&self) -> &str {
        &self.baseline
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn index_label(&self) -> String {
        self.listing.index_label(&self.current)
    }

    pub fn notes_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn is_dirty(&self, text: &str) -> bool {
        text != self.baseline
    }

    pub fn show_list(&self) -> bool {
        self.settings.show_list
    }

    pub fn set_show_list(&mut self, show: bool) {
        self.settings.show_list = show;
    }

    pub fn set_geometry(&mut self, width: u16, height: u16) {
        self.settings.width = width;
        self.settings.height = height;
    }

    pub fn save(&mut self, text: &str) -> Result<SaveOutcome, StoreError> {
        if text == self.baseline {
            return Ok(SaveOutcome::Unchanged);
        }
        self.store.save(&self.current, text)?;
        self.baseline = text.to_string();
        Ok(SaveOutcome::Written)
    }

    pub fn previous(&mut self, text: &str) -> Result<(), StoreError> {
        self.step(Step::Previous, text)
    }

    pub fn next(&mut self, text: &str) -> Result<(), StoreError> {
        self.step(Step::Next, text)
    }

    pub fn select(&mut self, id: &str, text: &str) -> Result<(), StoreError> {
        self.save_and_refresh(text)?;
        self.open(id.to_string())
    }

    pub fn new_note(&mut self, text: &str) -> Result<(), StoreError> {
        self.save_and_refresh(text)?;
        self.begin_new();
        Ok(())
    }

    pub fn delete_current(&mut self) -> Result<(), StoreError> {
        self.listing = self.store.list()?;
        let index = self
            .listing
            .position(&self.current)
            .unwrap_or_else(|| self.listing.len().saturating_sub(1));
        if let Err(err) = self.store.delete(&self.current) {
            log::warn!("could not delete {}: {}", self.current, err);
        }
        self.listing = self.store.list()?;
        let target = if let Some(id) = self.listing.get(index) {
            Some(id.clone())
        } else {
            self.listing.ids().last().cloned()
        };
        match target {
            Some(id) => self.open(id),
            None => {
                self.begin_new();
                Ok(())
            }
        }
    }

    pub fn rename_current(&mut self, new_id: &str) -> Result<(), StoreError> {
        check_id(new_id)?;
        self.listing = self.store.list()?;
        if self.listing.contains(&self.current) {
            self.store.rename(&self.current, new_id)?;
        } else if self.store.note_path(new_id).exists() {
            return Err(StoreError::Conflict(new_id.to_string()));
        }
        self.current = new_id.to_string();
        self.listing = self.store.list()?;
        Ok(())
    }

    pub fn choose_directory(&mut self, path: PathBuf, text: &str) -> Result<(), StoreError> {
        if !path.is_dir() {
            log::warn!("ignoring notes directory {:?}: not a directory", path);
            return Err(StoreError::InvalidDirectory(path));
        }
        self.save(text)?;
        self.store.switch_dir(path.clone())?;
        self.settings.notes_dir = path;
        self.listing = self.store.list()?;
        match self.listing.ids().first().cloned() {
            Some(id) => self.open(id)?,
            None => self.begin_new(),
        }
        if let Err(err) = self.persist_settings() {
            log::warn!("could not save settings: {}", err);
        }
        Ok(())
    }

    pub fn shutdown(&mut self, text: &str) -> Result<()> {
        self.save(text)?;
        self.persist_settings()?;
        Ok(())
    }

    pub fn persist_settings(&mut self) -> Result<()> {
        self.settings.current_note = Some(self.current.clone());
        self.settings.save(&self.paths.settings)
    }

    fn save_and_refresh(&mut self, text: &str) -> Result<(), StoreError> {
        self.save(text)?;
        self.listing = self.store.list()?;
        Ok(())
    }

    fn step(&mut self, step: Step, text: &str) -> Result<(), StoreError> {
        self.save_and_refresh(text)?;
        let target = match step {
            Step::Previous => self.listing.previous(&self.current).cloned(),
            Step::Next => self.listing.next(&self.current).cloned(),
        };
        match target {
            Some(id) => self.open(id),
            None => {
                self.begin_new();
                Ok(())
            }
        }
    }

    fn open(&mut self, mut id: NoteId) -> Result<(), StoreError> {
        loop {
            match self.store.load(&id) {
                Ok(text) => {
                    self.baseline = text;
                    self.current = id;
                    return Ok(());
                }
                Err(StoreError::NotFound(_)) => {
                    self.listing = self.store.list()?;
                    match self.listing.resolve(&id).cloned() {
                        Some(next) if next != id => id = next,
                        _ => {
                            self.begin_new();
                            return Ok(());
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn begin_new(&mut self) {
        self.current = synthesize_id(&self.listing);
        self.baseline = String::new();
    }
}
