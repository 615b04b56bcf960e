//! Mapping between the JSON config file and the in-memory [`Context`] list.
//!
//! Pure functions over byte slices. Reading and writing files is the
//! store's job.

use super::model::{ConfigFile, ContextEntry};
use super::{Context, ContextError, ContextResult};
use std::collections::HashSet;
use url::Url;
use uuid::Uuid;

/// Result of decoding a config file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub contexts: Vec<Context>,
    pub current: Option<String>,
}

pub fn decode(bytes: &[u8]) -> ContextResult<Decoded> {
    let file: ConfigFile = serde_json::from_slice(bytes).map_err(ContextError::MalformedConfig)?;

    let mut seen = HashSet::with_capacity(file.contexts.len());
    let mut contexts = Vec::with_capacity(file.contexts.len());

    for (index, entry) in file.contexts.into_iter().enumerate() {
        let ctx = entry_to_context(index, entry)?;

        if !seen.insert(ctx.name.clone()) {
            return Err(ContextError::DuplicateName(ctx.name));
        }

        contexts.push(ctx);
    }

    let current = file.current.filter(|name| !name.is_empty());

    Ok(Decoded { contexts, current })
}

pub fn encode(contexts: &[Context], current: Option<&str>) -> ContextResult<Vec<u8>> {
    let file = ConfigFile {
        current: current.map(str::to_owned),
        contexts: contexts.iter().map(context_to_entry).collect(),
    };

    let mut bytes = serde_json::to_vec_pretty(&file).map_err(ContextError::Encode)?;
    bytes.push(b'\n');

    Ok(bytes)
}

fn entry_to_context(index: usize, entry: ContextEntry) -> ContextResult<Context> {
    let name = entry
        .name
        .filter(|name| !name.is_empty())
        .ok_or(ContextError::MissingName { index })?;

    let host = match entry.host.filter(|host| !host.is_empty()) {
        Some(value) => match Url::parse(&value) {
            Ok(url) => Some(url),
            Err(source) => {
                return Err(ContextError::InvalidHost {
                    name,
                    value,
                    source,
                });
            }
        },
        None => None,
    };

    let mut services = Vec::with_capacity(entry.services.len());
    for value in entry.services {
        match Uuid::parse_str(&value) {
            Ok(id) => services.push(id),
            Err(source) => {
                return Err(ContextError::InvalidServiceId {
                    name,
                    value,
                    source,
                });
            }
        }
    }

    Ok(Context {
        name,
        host,
        services,
    })
}

fn context_to_entry(ctx: &Context) -> ContextEntry {
    ContextEntry {
        name: Some(ctx.name.clone()),
        host: ctx.host.as_ref().map(|url| url.as_str().to_owned()),
        services: ctx.services.iter().map(Uuid::to_string).collect(),
    }
}
