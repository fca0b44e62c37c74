use shipquote_core::config::ConfigOverrides;
use shipquote_core::{ApplicationError, RunResult};

use crate::commands::run::exit_code;
use crate::commands::session::build_agent;
use crate::commands::{current_thread_runtime, init_logging, load_config, CommandResult};
use crate::trace::render_compact;

pub const DEMO_REQUESTS: [&str; 3] = [
    "Schick das nach Deutschland, Berlin, 1 kg, express.",
    "Einmal nach Deutschland Berlin 1 kg express und einmal nach Österreich Wien 1 kg standard.",
    "Versand nach FR Paris 2 kg standard.",
];

pub fn run(max_rounds: Option<u32>) -> CommandResult {
    match execute(max_rounds) {
        Ok(results) => {
            let output = results
                .iter()
                .map(|(request, result)| render_compact(request, result))
                .collect::<Vec<_>>()
                .join("\n");
            let code = results.iter().map(|(_, result)| exit_code(result)).max().unwrap_or(0);
            CommandResult { exit_code: code, output }
        }
        Err(error) => CommandResult::from_error("demo", &error),
    }
}

/// Runs every demo request with one agent, sequentially.
fn execute(max_rounds: Option<u32>) -> Result<Vec<(&'static str, RunResult)>, ApplicationError> {
    let config = load_config(ConfigOverrides { max_rounds, ..ConfigOverrides::default() })?;
    init_logging(&config);

    let runtime = current_thread_runtime()?;
    runtime.block_on(async {
        let agent = build_agent(&config).await?;
        let mut results = Vec::with_capacity(DEMO_REQUESTS.len());
        for request in DEMO_REQUESTS {
            results.push((request, agent.run(request).await));
        }
        Ok(results)
    })
}
