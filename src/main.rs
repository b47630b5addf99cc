//! CLI entrypoint for `adexport`.
//!
//! Parses command-line arguments, merges them with the optional config file,
//! and runs one export through the library engine. Prints usage and exits 0
//! when neither a config file nor a full set of connection arguments is given;
//! exits 1 when required connection fields are still missing after merging.
//! Every other run ends with status 0, failures being reported in the log.
use std::path::PathBuf;

use adexport::{
    config::{
        ConnectionArgs, DEFAULT_FILTER, DEFAULT_OUTPUT, FileSettings, resolve, should_show_help,
    },
    engine::Engine,
    logging,
};
use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use env_logger::WriteStyle;
use log::{LevelFilter, debug, error, warn};

#[derive(Parser, Debug)]
#[command(
    name = "adexport",
    version,
    about = "Export Active Directory users to a spreadsheet"
)]
struct Args {
    /// Path to an INI config file with an [AD] section
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Directory server address (host, host:port or ldap[s]:// URL)
    #[arg(long = "server")]
    server: Option<String>,

    /// Account used to bind (DOMAIN\user or user@domain)
    #[arg(long = "user")]
    user: Option<String>,

    /// Password for the bind account
    #[arg(long = "password", env = "ADEXPORT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Search base DN
    #[arg(long = "base")]
    base: Option<String>,

    /// LDAP search filter
    #[arg(long = "filter", default_value = DEFAULT_FILTER)]
    filter: String,

    /// Output file (.xlsx, or .csv for CSV)
    #[arg(long = "output", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Upgrade plain ldap:// connections with StartTLS
    #[arg(long = "starttls")]
    starttls: bool,

    /// Increase verbosity (-v)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn log_level(args: &Args) -> LevelFilter {
    if args.quiet {
        return LevelFilter::Error;
    }
    match args.verbose {
        0 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn print_usage() -> Result<()> {
    Args::command().print_help()?;
    println!();
    Ok(())
}

fn main() {
    let args = Args::parse();
    let style = match args.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
            WriteStyle::Always
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
            WriteStyle::Never
        }
        ColorChoice::Auto => WriteStyle::Auto,
    };
    logging::init(log_level(&args), style);

    let conn_args = ConnectionArgs {
        server: args.server.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
        base: args.base.clone(),
        starttls: args.starttls,
    };
    if should_show_help(args.config.as_deref(), &conn_args) {
        if let Err(e) = print_usage() {
            error!("failed to print usage: {}", e);
        }
        return;
    }

    let file = match &args.config {
        Some(path) => FileSettings::load(path).unwrap_or_else(|e| {
            warn!("{} (continuing without it)", e);
            FileSettings::default()
        }),
        None => FileSettings::default(),
    };

    let profile = match resolve(&conn_args, &file, &args.filter, &args.output) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    debug!("resolved profile: {:?}", profile);

    let outcome = Engine::new().run(&profile);
    debug!("run finished: {:?}", outcome);
}
