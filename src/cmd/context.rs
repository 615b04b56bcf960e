use crate::cmd::{ContextCommand, OutputFormat};
use crate::context::{Context, ContextStore};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use url::Url;
use uuid::Uuid;

pub fn handle(store: &mut ContextStore, action: ContextCommand) -> anyhow::Result<()> {
    match action {
        ContextCommand::Current => match store.current_context() {
            Some(ctx) => println!("Current context: {}", ctx.name.green().bold()),
            None => println!("No current context set."),
        },
        ContextCommand::List { format } => list(store, format)?,
        ContextCommand::Use { name } => {
            let name = name.trim();
            anyhow::ensure!(!name.is_empty(), "Context name cannot be empty");

            let existed = store.context(name).is_some();
            store.select(name);

            match existed {
                true => println!("Current context set to '{name}'."),
                false => println!("Created context '{name}' and set it as current."),
            }
        }
        ContextCommand::Host { url } => {
            store.set_host(url.trim())?;

            if let Some(ctx) = store.current_context() {
                let host = ctx.host.as_ref().map(Url::as_str).unwrap_or_default();
                println!("Host for '{}' set to {host}.", ctx.name);
            }
        }
        ContextCommand::Rename { from, to } => {
            store.rename_context(&from, to.trim())?;
            println!("Renamed context '{from}' -> '{}'.", to.trim());
        }
        ContextCommand::Delete { name } => {
            let removed = store.delete_context(&name)?;

            match removed.services.len() {
                0 => println!("Deleted context '{name}'."),
                n => println!("Deleted context '{name}' ({n} service ids dropped)."),
            }
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct ContextRow {
    #[tabled(rename = "CURRENT")]
    marker: &'static str,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "HOST")]
    host: String,
    #[tabled(rename = "SERVICES")]
    services: usize,
}

#[derive(Serialize)]
struct ContextView<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    services: &'a [Uuid],
    current: bool,
}

fn list(store: &ContextStore, format: OutputFormat) -> anyhow::Result<()> {
    let current = store.current_context().map(|ctx| ctx.name.as_str());
    let is_current = |ctx: &Context| current == Some(ctx.name.as_str());

    match format {
        OutputFormat::Table => {
            if store.contexts().is_empty() {
                println!("No contexts defined.");
                return Ok(());
            }

            let rows = store.contexts().iter().map(|ctx| ContextRow {
                marker: if is_current(ctx) { "*" } else { "" },
                name: ctx.name.clone(),
                host: ctx.host.as_ref().map(Url::to_string).unwrap_or_default(),
                services: ctx.services.len(),
            });

            println!("{}", Table::new(rows));
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let views: Vec<_> = store
                .contexts()
                .iter()
                .map(|ctx| ContextView {
                    name: &ctx.name,
                    host: ctx.host.as_ref().map(Url::as_str),
                    services: &ctx.services,
                    current: is_current(ctx),
                })
                .collect();

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&views)?,
                _ => serde_yaml::to_string(&views)?,
            };

            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}
