pub mod commands;
pub mod trace;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shipquote",
    about = "Shipping quote agent CLI",
    long_about = "Turn a free-text shipping request into priced quotes by letting a language model drive the country, postal code and quote lookups.",
    after_help = "Examples:\n  shipquote run \"Versand nach FR Paris 2 kg standard.\"\n  shipquote run --json --max-rounds 5 \"Schick das nach Deutschland, Berlin, 1 kg, express.\"\n  shipquote demo\n  shipquote tools\n  shipquote config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one shipping request through the agent and print its trace")]
    Run {
        #[arg(help = "Free-text shipping request")]
        request: String,
        #[arg(long, help = "Override agent.max_rounds for this run")]
        max_rounds: Option<u32>,
        #[arg(long, help = "Emit the full run result as JSON")]
        json: bool,
    },
    #[command(about = "Run the built-in demo requests and print compact traces")]
    Demo {
        #[arg(long, help = "Override agent.max_rounds for every demo run")]
        max_rounds: Option<u32>,
    },
    #[command(about = "Print the tool catalog the model is shown")]
    Tools,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { request, max_rounds, json } => {
            commands::run::run(&request, max_rounds, json)
        }
        Command::Demo { max_rounds } => commands::demo::run(max_rounds),
        Command::Tools => commands::tools::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
