//! Class store: qualified names mapped to class file bytes
//!
//! The scanner and patcher only ever see this trait; the directory
//! implementation below is the one the CLI wires in.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::classfile::defs::CLASS_EXT;
use crate::common::error::{Error, Result};

pub trait ClassStore {
    fn exists(&self, name: &str) -> bool;

    /// Read a class; absence is `NotFound`, never an empty result
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Overwrite a class atomically: a failed write must not leave a
    /// partially-written class file behind
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Directory-backed store; `pkg/Main` lives at `<root>/pkg/Main.class`
pub struct DirClassStore {
    root: PathBuf,
}

impl DirClassStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn class_path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        match name.rsplit_once('/') {
            Some((package, simple)) => {
                for part in package.split('/') {
                    path.push(part);
                }
                path.push(format!("{simple}{CLASS_EXT}"));
            }
            None => path.push(format!("{name}{CLASS_EXT}")),
        }
        path
    }
}

impl ClassStore for DirClassStore {
    fn exists(&self, name: &str) -> bool {
        self.class_path(name).is_file()
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.class_path(name)).map_err(|error| {
            if error.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(name)
            } else {
                Error::Io(error)
            }
        })
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.class_path(name);
        let directory = path.parent().unwrap_or(&self.root);
        let mut file = tempfile::NamedTempFile::new_in(directory)?;
        file.write_all(bytes)?;
        file.persist(&path).map_err(|error| Error::Io(error.error))?;
        Ok(())
    }
}
