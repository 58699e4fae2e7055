use std::fs::{self, File, TryLockError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("another instance is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct InstanceLock {
    _file: File,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<InstanceLock, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        match file.try_lock() {
            Ok(()) => Ok(InstanceLock { _file: file }),
            Err(TryLockError::WouldBlock) => Err(LockError::AlreadyRunning),
            Err(TryLockError::Error(err)) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("instance.lock");
        let lock = InstanceLock::acquire(&path);
        assert!(lock.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn second_acquire_is_refused_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("instance.lock");
        let held = InstanceLock::acquire(&path).unwrap();
        assert!(matches!(
            InstanceLock::acquire(&path),
            Err(LockError::AlreadyRunning)
        ));
        drop(held);
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
