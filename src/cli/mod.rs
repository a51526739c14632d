pub mod commands;
pub mod output;

use crate::errors::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bbr")]
#[command(about = "Bitbucket reporter - merged pull request analytics for Cloud and Server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Repository selection shared by the pull request commands
#[derive(Args, Debug, Clone, Default)]
pub struct RepositorySelection {
    /// Workspace (Cloud) or project key (Server)
    #[arg(long, short)]
    pub workspace: Option<String>,

    /// Only include these repositories (slug or full name); repeatable
    #[arg(long = "repo", short = 'r')]
    pub repos: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List repositories
    Repos {
        /// Workspace (Cloud) or project key (Server)
        #[arg(long, short)]
        workspace: Option<String>,

        /// Print raw JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// List merged pull requests per repository
    Merged {
        #[command(flatten)]
        selection: RepositorySelection,

        /// Print raw JSON instead of a listing
        #[arg(long)]
        json: bool,
    },

    /// Monthly merge counts, resolution time and top authors
    Summary {
        #[command(flatten)]
        selection: RepositorySelection,
    },

    /// Show version information
    Version,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Set up logging based on verbosity
        self.setup_logging();

        match self.command {
            Commands::Repos { workspace, json } => {
                commands::repos::run(workspace.as_deref(), json).await
            }
            Commands::Merged { selection, json } => commands::merged::run(&selection, json).await,
            Commands::Summary { selection } => commands::summary::run(&selection).await,
            Commands::Version => commands::version::run().await,
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr);

        if self.no_color {
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}
