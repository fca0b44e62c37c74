pub mod run;
pub mod tool_call;
pub mod tool_result;
