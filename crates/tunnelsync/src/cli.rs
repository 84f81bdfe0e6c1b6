//! Clap derive structures for the `tunnelsync` CLI.

use std::path::PathBuf;

use clap::Parser;

/// tunnelsync -- keep a tunnel broker and a Junos router on the current IPv4 address
#[derive(Debug, Parser)]
#[command(
    name = "tunnelsync",
    version,
    about = "Sync a tunnelbroker.net tunnel and a Junos router with the router's public IPv4 address",
    long_about = "Reads the router's external interface address, the tunnel broker's record of\n\
        the tunnel, and the router's own tunnel endpoints, then corrects whichever\n\
        side no longer matches the external address.\n\n\
        Configuration is read from tunnelsync.toml, searched in --config-dir, the\n\
        current directory, and the user config directory, in that order.\n\
        TUNNELSYNC_* environment variables override file values\n\
        (e.g. TUNNELSYNC_TUNNELBROKER__PASSWORD)."
)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Extra directory searched first for tunnelsync.toml
    #[arg(long, short = 'c', value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Report the corrections that would be made without making them
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds allowed for each remote operation (overrides the config file)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}
