use crate::commands::{run_evaluate, run_score, EvaluateArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use fives::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "fives-api",
    about = "Score workspace photos against the 5S methodology",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate local photo files against the configured classifier
    Evaluate(EvaluateArgs),
    /// Validate and render a saved classifier reply without calling the network
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
        Command::Score(args) => run_score(args),
    }
}
