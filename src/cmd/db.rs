use crate::cmd::DbCommand;
use crate::context::ContextStore;
use anyhow::{Context as _, bail};
use uuid::Uuid;

pub fn handle(store: &mut ContextStore, action: DbCommand) -> anyhow::Result<()> {
    match action {
        DbCommand::Create { host } => {
            ensure_host(store, host.as_deref())?;

            let id = Uuid::new_v4();
            store.add_service(id)?;
            println!("{id}");
        }
        DbCommand::Delete { id, host } => {
            ensure_host(store, host.as_deref())?;

            let empty = store
                .current_context()
                .is_some_and(|ctx| ctx.services.is_empty());
            if empty {
                bail!("no services to delete");
            }

            let id = Uuid::parse_str(id.trim())
                .with_context(|| format!("Invalid service id '{}'", id.trim()))?;
            store.remove_service(id)?;
            println!("Deleted service '{id}'.");
        }
        DbCommand::List => {
            let Some(ctx) = store.current_context() else {
                bail!("need context");
            };

            for id in &ctx.services {
                println!("{id}");
            }
        }
    }

    Ok(())
}

/// Applies `--host` to the current context, or checks that one is already stored.
fn ensure_host(store: &mut ContextStore, host: Option<&str>) -> anyhow::Result<()> {
    let host = host.map(str::trim).filter(|host| !host.is_empty());

    let Some(ctx) = store.current_context() else {
        match host {
            Some(_) => bail!("need context"),
            None => bail!("need host and context"),
        }
    };

    if host.is_none() && ctx.host.is_none() {
        bail!("need host for {} context", ctx.name);
    }

    if let Some(host) = host {
        store.set_host(host)?;
    }

    Ok(())
}
