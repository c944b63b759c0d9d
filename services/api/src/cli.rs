use crate::demo::{run_demo, run_draw, DemoArgs, DrawArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grimoire_registry::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Grimoire Registry",
    about = "Admission requests and grimoire assignment for the magic academy",
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
    /// Walk one applicant through admission and print the awarded grimoire
    Demo(DemoArgs),
    /// Sample the weighted draw and compare observed frequencies with the weight table
    Draw(DrawArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Draw(args) => run_draw(args),
    }
}
