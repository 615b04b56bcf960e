//! The context store: owns the loaded contexts, the current selection and
//! the dirty flag, and writes everything back on [`ContextStore::close`].
//!
//! Persistence writes `<path>.bkp` first and renames it over `<path>`, so the
//! config file is either the old version or the new one, never a torn write.
//! There is no cross-process locking; two invocations closing against the
//! same path at once race on the backup file and the last rename wins.

use super::codec::{self, Decoded};
use super::{Context, ContextError, ContextResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

const BACKUP_SUFFIX: &str = ".bkp";

#[derive(Debug)]
pub struct ContextStore {
    path: PathBuf,
    contexts: Vec<Context>,
    // Name of an entry in `contexts`, never an owner of its own.
    current: Option<String>,
    dirty: bool,
}

impl ContextStore {
    /// Loads the store from `path`, or starts empty when the file does not exist,
    /// then selects `select` if given.
    pub fn open(path: impl Into<PathBuf>, select: Option<&str>) -> ContextResult<Self> {
        let path = path.into();

        let Decoded { contexts, current } = match fs::read(&path) {
            Ok(bytes) => codec::decode(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, starting empty");
                Decoded::default()
            }
            Err(err) => return Err(err.into()),
        };

        let mut store = Self {
            path,
            contexts,
            current: None,
            dirty: false,
        };

        // A dangling current-context gets an empty entry so `current` always resolves.
        if let Some(name) = current {
            if store.position(&name).is_none() {
                store.contexts.push(Context::new(name.clone()));
            }
            store.current = Some(name);
        }

        debug!(
            path = %store.path.display(),
            contexts = store.contexts.len(),
            current = store.current.as_deref().unwrap_or("-"),
            "context store loaded"
        );

        if let Some(name) = select {
            store.select(name);
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|ctx| ctx.name == name)
    }

    pub fn current_context(&self) -> Option<&Context> {
        self.current.as_deref().and_then(|name| self.context(name))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces the next [`close`](Self::close) to write.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Makes `name` the current context, creating an empty one when it does not exist.
    ///
    /// An empty name, or the name of the context that is already current, changes nothing.
    pub fn select(&mut self, name: &str) {
        if name.is_empty() || self.current.as_deref() == Some(name) {
            return;
        }

        if self.position(name).is_none() {
            debug!(context = name, "creating context");
            self.contexts.push(Context::new(name));
        }

        debug!(context = name, "selecting context");
        self.current = Some(name.to_owned());
        self.dirty = true;
    }

    pub fn add_service(&mut self, id: Uuid) -> ContextResult<()> {
        let ctx = self.current_mut()?;
        ctx.services.push(id);
        trace!(context = %ctx.name, service = %id, "service added");

        self.dirty = true;
        Ok(())
    }

    /// Removes one occurrence of `id`. The order of the remaining services is not kept.
    pub fn remove_service(&mut self, id: Uuid) -> ContextResult<()> {
        let ctx = self.current_mut()?;

        let index = ctx
            .services
            .iter()
            .position(|service| *service == id)
            .ok_or(ContextError::ServiceNotFound(id))?;

        ctx.services.swap_remove(index);
        trace!(context = %ctx.name, service = %id, "service removed");

        self.dirty = true;
        Ok(())
    }

    /// Parses `host` and assigns it to the current context.
    pub fn set_host(&mut self, host: &str) -> ContextResult<()> {
        let ctx = self.current_mut()?;

        let url = Url::parse(host).map_err(|source| ContextError::InvalidHost {
            name: ctx.name.clone(),
            value: host.to_owned(),
            source,
        })?;

        if ctx.host.as_ref() == Some(&url) {
            return Ok(());
        }

        debug!(context = %ctx.name, host = %url, "host updated");
        ctx.host = Some(url);

        self.dirty = true;
        Ok(())
    }

    pub fn clear_host(&mut self) -> ContextResult<()> {
        let ctx = self.current_mut()?;

        if ctx.host.take().is_some() {
            self.dirty = true;
        }

        Ok(())
    }

    pub fn rename_context(&mut self, from: &str, to: &str) -> ContextResult<()> {
        if to.trim().is_empty() {
            return Err(ContextError::EmptyName);
        }

        let index = self
            .position(from)
            .ok_or_else(|| ContextError::UnknownContext(from.to_owned()))?;

        if from == to {
            return Ok(());
        }

        if self.position(to).is_some() {
            return Err(ContextError::DuplicateName(to.to_owned()));
        }

        self.contexts[index].name = to.to_owned();

        if self.current.as_deref() == Some(from) {
            self.current = Some(to.to_owned());
        }

        debug!(from, to, "context renamed");
        self.dirty = true;
        Ok(())
    }

    pub fn delete_context(&mut self, name: &str) -> ContextResult<Context> {
        let index = self
            .position(name)
            .ok_or_else(|| ContextError::UnknownContext(name.to_owned()))?;

        let removed = self.contexts.remove(index);

        if self.current.as_deref() == Some(name) {
            self.current = None;
        }

        debug!(context = name, "context deleted");
        self.dirty = true;
        Ok(removed)
    }

    /// Persists the store if anything changed since it was opened or last closed.
    ///
    /// The dirty flag is cleared only once the new file is in place, so a failed
    /// close can be retried.
    pub fn close(&mut self) -> ContextResult<()> {
        self.close_with(|file, bytes| {
            file.write_all(bytes)?;
            file.sync_all()
        })
    }

    fn close_with<F>(&mut self, write: F) -> ContextResult<()>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        if !self.dirty {
            trace!(path = %self.path.display(), "nothing to persist");
            return Ok(());
        }

        let bytes = codec::encode(&self.contexts, self.current.as_deref())?;
        replace_via_backup(&self.path, &bytes, write)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "context store persisted");
        self.dirty = false;
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.contexts.iter().position(|ctx| ctx.name == name)
    }

    fn current_mut(&mut self) -> ContextResult<&mut Context> {
        let name = self.current.as_deref().ok_or(ContextError::NoCurrentContext)?;

        self.contexts
            .iter_mut()
            .find(|ctx| ctx.name == name)
            .ok_or(ContextError::NoCurrentContext)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn replace_via_backup<F>(target: &Path, bytes: &[u8], write: F) -> io::Result<()>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let backup = backup_path(target);

    let written = File::create(&backup).and_then(|mut file| write(&mut file, bytes));

    if let Err(err) = written {
        // Best effort: the file may never have been created.
        let _ = fs::remove_file(&backup);
        return Err(err);
    }

    fs::rename(&backup, target)
}
