use super::Host;
use super::common::CommonArgs;
use crate::Result;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

const LOG_TARGET: &str = "     watch";

#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Warm the caches, keep them refreshed in the background, and stop on Ctrl-C
pub async fn watch<H: Host>(host: &mut H, args: &WatchArgs) -> Result<()> {
    let (config, store) = args.common.open_store()?;

    let handles = store.start().await;
    if handles.is_empty() {
        log::warn!(target: LOG_TARGET, "Background refresh is disabled for every resource");
    }

    let _ = writeln!(
        host.output(),
        "Watching '{}' with {} background refresh tasks, press Ctrl-C to stop",
        config.owner,
        handles.len()
    );

    tokio::signal::ctrl_c().await.into_app_err("waiting for Ctrl-C")?;

    for handle in &handles {
        handle.abort();
    }

    for (name, state) in store.states() {
        let _ = writeln!(host.output(), "{name}: {state:?}");
    }

    Ok(())
}
