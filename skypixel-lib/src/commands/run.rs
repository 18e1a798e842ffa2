//! Command dispatch logic for skypixel

use super::{InitArgs, SnapshotArgs, ValidateArgs, WatchArgs, init_config, print_snapshot, validate_config, watch};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "skypixel", author, version, long_about = None)]
#[command(about = "Keep the Skypixel showcase snapshots fresh")]
#[command(styles = CLAP_STYLES)]
struct Args {
    #[command(subcommand)]
    command: SkypixelSubcommand,
}

#[derive(Subcommand, Debug)]
enum SkypixelSubcommand {
    /// Load the snapshots once and print them as JSON
    Snapshot(Box<SnapshotArgs>),
    /// Keep the snapshots refreshed in the background until interrupted
    Watch(Box<WatchArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let args = Args::parse_from(args);

    match &args.command {
        SkypixelSubcommand::Snapshot(snapshot_args) => print_snapshot(host, snapshot_args).await,
        SkypixelSubcommand::Watch(watch_args) => watch(host, watch_args).await,
        SkypixelSubcommand::Init(init_args) => init_config(host, init_args),
        SkypixelSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}
