mod commands;
mod notify;

use clap::{Parser, Subcommand};
use tally_core::config;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Tally — local-first to-do list with reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks.
    List {
        /// Include completed tasks.
        #[arg(long)]
        all: bool,
    },
    /// Add a task.
    Add {
        /// Task title.
        #[arg(trailing_var_arg = true, required = true)]
        title: Vec<String>,
        /// Due timestamp ("YYYY-MM-DD HH:MM" local time, or RFC 3339).
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task as completed.
    Done { id: i64 },
    /// Mark a task as not completed.
    Reopen { id: i64 },
    /// Edit a task's title and/or due date.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete one or more tasks in a single batch.
    Rm {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Check configuration and store health.
    Status,
    /// Run the reminder delivery loop in the foreground.
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.tally.log_level.clone())),
        )
        .init();

    let app = commands::App::build(&cfg).await?;

    match cli.command {
        Commands::List { all } => println!("{}", app.list(all).await?),
        Commands::Add { title, due } => {
            let title = title.join(" ");
            println!("{}", app.add(&title, due.as_deref()).await?);
        }
        Commands::Done { id } => println!("{}", app.set_completed(id, true).await?),
        Commands::Reopen { id } => println!("{}", app.set_completed(id, false).await?),
        Commands::Edit { id, title, due } => {
            println!("{}", app.edit(id, title.as_deref(), due.as_deref()).await?)
        }
        Commands::Rm { ids } => println!("{}", app.remove(&ids).await?),
        Commands::Status => println!("{}", app.status(&cli.config).await),
        Commands::Watch => app.watch().await?,
    }
    Ok(())
}
