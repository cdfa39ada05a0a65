mod cmd_serve;
mod cmd_tasks;

use anyhow::Result;
use branchtodo_git::{Backend, StoreConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "git-todo")]
#[command(about = "Keep a checklist in the current git branch's description")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// Git executable used by the cli backend
    #[arg(long, global = true, default_value = "git")]
    git: PathBuf,

    /// How to talk to the repository
    #[arg(long, global = true, value_enum, default_value_t = BackendArg::Cli)]
    backend: BackendArg,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Tasks(cmd_tasks::TaskOp),
    /// Bridge a panel host over JSON lines on stdin/stdout
    Serve {
        /// Confirm deletions without asking
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    /// Run the git executable
    Cli,
    /// Use libgit2 in-process
    #[value(name = "libgit2")]
    LibGit2,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Cli => Backend::Cli,
            BackendArg::LibGit2 => Backend::LibGit2,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = StoreConfig {
        workdir: cli.dir,
        backend: cli.backend.into(),
        git_binary: cli.git,
    };
    let store = config.open();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let result = match cli.command {
        Commands::Tasks(op) => cmd_tasks::run(op, store, stdin.lock(), &mut stdout, cli.pretty),
        Commands::Serve { yes } => {
            let mut host = cmd_serve::HostConfirm::new(yes);
            cmd_serve::run(store, stdin.lock(), &mut stdout, &mut host, cli.pretty)
        }
    };
    stdout.flush()?;
    result
}
