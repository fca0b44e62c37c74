use shipquote_core::config::ConfigOverrides;

use crate::commands::session::{load_catalog, tool_invoker};
use crate::commands::{current_thread_runtime, init_logging, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config(ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error("tools", &error),
    };
    init_logging(&config);

    let invoker = match tool_invoker(&config) {
        Ok(invoker) => invoker,
        Err(error) => return CommandResult::from_error("tools", &error),
    };
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::from_error("tools", &error),
    };

    let (catalog, source) = runtime.block_on(load_catalog(&config, &invoker));
    let output = format!(
        "tool catalog ({} tools, source: {}, base_url: {}):\n{}",
        catalog.len(),
        source.as_str(),
        invoker.base_url(),
        catalog.render()
    );

    CommandResult { exit_code: 0, output }
}
