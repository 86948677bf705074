use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use enum_dispatch::enum_dispatch;

use super::Resource;

const TMP_SUFFIX: &str = "tmp";

/// Somewhere the three ledger documents can be kept.
#[enum_dispatch]
pub trait Medium {
    /// `Ok(None)` when the resource has never been written.
    fn read(&self, resource: Resource) -> io::Result<Option<String>>;

    /// Replaces the whole document. Either the old or the new contents survive a failure.
    fn write(&self, resource: Resource, contents: &str) -> io::Result<()>;
}

#[enum_dispatch(Medium)]
#[derive(Debug, Clone)]
pub enum Backend {
    FileMedium,
    MemoryMedium,
}

/// One JSON file per resource inside a data directory.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> FileMedium {
        FileMedium { dir: dir.into() }
    }

    pub fn path(&self, resource: Resource) -> PathBuf {
        self.dir.join(resource.file_name())
    }
}

impl Medium for FileMedium {
    fn read(&self, resource: Resource) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(resource)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, resource: Resource, contents: &str) -> io::Result<()> {
        write_atomic(&self.path(resource), contents)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes next to `path` and renames over it.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<Resource, String>,
    failing: HashSet<Resource>,
}

/// In-process medium. Clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryMedium {
    pub fn new() -> MemoryMedium {
        MemoryMedium::default()
    }

    pub fn insert(&self, resource: Resource, contents: &str) {
        self.state.borrow_mut().documents.insert(resource, contents.to_string());
    }

    pub fn get(&self, resource: Resource) -> Option<String> {
        self.state.borrow().documents.get(&resource).cloned()
    }

    /// Makes every later write of `resource` fail.
    pub fn fail_writes(&self, resource: Resource) {
        self.state.borrow_mut().failing.insert(resource);
    }
}

impl Medium for MemoryMedium {
    fn read(&self, resource: Resource) -> io::Result<Option<String>> {
        Ok(self.get(resource))
    }

    fn write(&self, resource: Resource, contents: &str) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.failing.contains(&resource) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is not writable", resource),
            ));
        }

        state.documents.insert(resource, contents.to_string());
        Ok(())
    }
}
