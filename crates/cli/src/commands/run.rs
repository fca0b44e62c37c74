use shipquote_core::config::ConfigOverrides;
use shipquote_core::{ApplicationError, RunResult};

use crate::commands::session::build_agent;
use crate::commands::{
    current_thread_runtime, init_logging, load_config, CommandResult, NO_QUOTE_EXIT_CODE,
};
use crate::trace::render_compact;

pub fn run(request: &str, max_rounds: Option<u32>, json: bool) -> CommandResult {
    let outcome = execute(request, max_rounds);

    match outcome {
        Ok(result) => render(request, &result, json),
        Err(error) => CommandResult::from_error("run", &error),
    }
}

fn execute(request: &str, max_rounds: Option<u32>) -> Result<RunResult, ApplicationError> {
    let config = load_config(ConfigOverrides { max_rounds, ..ConfigOverrides::default() })?;
    init_logging(&config);

    let runtime = current_thread_runtime()?;
    runtime.block_on(async {
        let agent = build_agent(&config).await?;
        Ok(agent.run(request).await)
    })
}

pub(crate) fn render(request: &str, result: &RunResult, json: bool) -> CommandResult {
    let output = if json {
        serde_json::to_string_pretty(result).unwrap_or_else(|error| {
            format!("{{\"error\":\"failed to encode run result: {error}\"}}")
        })
    } else {
        render_compact(request, result)
    };

    CommandResult { exit_code: exit_code(result), output }
}

pub(crate) fn exit_code(result: &RunResult) -> u8 {
    if result.ok {
        0
    } else {
        NO_QUOTE_EXIT_CODE
    }
}
