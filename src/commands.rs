use crate::config::{AppPaths, Settings};
use crate::lock::{InstanceLock, LockError};
use crate::model::{synthesize_id, StoreError};
use crate::session::Session;
use crate::storage::NoteStore;
use crate::ui;
use anyhow::{bail, Context, Result};
use std::io;
use std::path::PathBuf;

pub fn list() -> Result<()> {
    let (store, _, _) = open_store()?;
    let listing = store.list()?;
    println!("Notes in {}:", store.dir().display());
    if listing.is_empty() {
        println!("  (empty)");
    }
    for id in listing.ids() {
        println!("  - {}", id);
    }
    Ok(())
}

pub fn show(id: Option<String>) -> Result<()> {
    let (store, settings, _) = open_store()?;
    let id = match id.or(settings.current_note) {
        Some(id) => id,
        None => bail!("no note selected"),
    };
    let text = store.load(&id)?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn add(id: Option<String>, text: Option<String>) -> Result<()> {
    let (store, _, _) = open_store()?;
    let id = match id {
        Some(id) => id,
        None => synthesize_id(&store.list()?),
    };
    let text = match text {
        Some(text) => text,
        None => io::read_to_string(io::stdin()).context("reading note text from stdin")?,
    };
    store.save(&id, &text)?;
    println!("Saved note {}", id);
    Ok(())
}

pub fn delete(id: String) -> Result<()> {
    let (store, _, _) = open_store()?;
    store.delete(&id)?;
    println!("Deleted note {}", id);
    Ok(())
}

pub fn rename(id: String, new_id: String) -> Result<()> {
    let (store, _, _) = open_store()?;
    store.rename(&id, &new_id)?;
    println!("Renamed {} to {}", id, new_id);
    Ok(())
}

pub fn dir(path: Option<PathBuf>) -> Result<()> {
    let (_, mut settings, paths) = open_store()?;
    let path = match path {
        Some(path) => path,
        None => {
            println!("{}", settings.notes_dir.display());
            return Ok(());
        }
    };
    if !path.is_dir() {
        return Err(StoreError::InvalidDirectory(path).into());
    }
    settings.notes_dir = path.clone();
    settings.save(&paths.settings)?;
    println!("Notes folder set to {}", path.display());
    Ok(())
}

pub fn tui() -> Result<()> {
    let paths = AppPaths::discover()?;
    let _lock = match InstanceLock::acquire(&paths.lock) {
        Ok(lock) => lock,
        Err(LockError::AlreadyRunning) => bail!("cloudnotes is already running"),
        Err(err) => return Err(err.into()),
    };
    log::debug!("state directory {:?}", paths.root);
    let settings = Settings::load_or_init(&paths.settings)?;
    let session = Session::start(settings, paths)?;
    ui::run(session)
}

fn open_store() -> Result<(NoteStore, Settings, AppPaths)> {
    let paths = AppPaths::discover()?;
    let settings = Settings::load_or_init(&paths.settings)?;
    let store = NoteStore::new(
        settings.notes_dir.clone(),
        Some(paths.trash.clone()),
        settings.max_note_size,
    );
    Ok((store, settings, paths))
}
