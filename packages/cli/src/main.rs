use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use store::SortKey;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "contacts", version, about = "Manage your contacts from the terminal")]
pub struct Cli {
    /// Config file (default: platform config dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding config and environment.
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// More log output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Password confirmation, checked locally.
        #[arg(long)]
        confirm: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show who is logged in.
    Whoami,

    /// List contacts.
    #[command(alias = "ls")]
    List {
        /// Only contacts whose name contains this text.
        #[arg(long)]
        search: Option<String>,
        /// Sort column; repeat a column to reverse it.
        #[arg(long, value_name = "KEY")]
        sort: Vec<SortKey>,
    },

    /// Create a contact.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },

    /// Change a contact; omitted fields keep their value.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a contact.
    #[command(alias = "rm")]
    Delete { id: String },

    /// Read contacts from a CSV file.
    Import {
        file: PathBuf,
        /// Create every imported row on the server.
        #[arg(long)]
        create: bool,
    },

    /// Write contacts to a CSV file.
    Export {
        /// Output file (default: `export.filename` from config).
        file: Option<PathBuf>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_name = "KEY")]
        sort: Vec<SortKey>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    commands::run(cli).await
}
