use clap::{Parser, Subcommand};
use studyflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studyflow", version, about = "Studyflow study-session tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus/break timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Study task list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Study statistics and level progress
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Daily activity history
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Achievement progress
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(Config::load_or_default().logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Activity { action } => commands::activity::run(action),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
