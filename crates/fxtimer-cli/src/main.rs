use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "fxtimer", version, about = "Interval workout timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List enabled exercises
    Exercises {
        #[command(flatten)]
        data: args::DataArgs,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// List muscle groups usable with --group
    Groups {
        #[command(flatten)]
        data: args::DataArgs,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// List workout presets
    Presets {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a workout and print its blocks
    Plan {
        #[command(flatten)]
        workout: args::WorkoutArgs,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a workout and run it in the terminal
    Run {
        #[command(flatten)]
        workout: args::WorkoutArgs,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Exercises { data, json } => commands::exercises::run_exercises(&data, json),
        Commands::Groups { data, json } => commands::exercises::run_groups(&data, json),
        Commands::Presets { json } => commands::presets::run(json),
        Commands::Plan { workout, json } => commands::plan::run(&workout, json),
        Commands::Run { workout } => commands::run::run(&workout),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fxtimer", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
