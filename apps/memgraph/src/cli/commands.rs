//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use memgraph_core::{Dispatcher, MemoryError, ToolArguments, ToolCall, ToolOutput};
use serde_json::Value;

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(dispatcher: Dispatcher, host: &str, port: u16) -> Result<(), MemoryError> {
    println!("memgraph REST bridge starting...");
    println!();
    println!("Configuration:");
    println!("  Host:   {}", host);
    println!("  Port:   {}", port);
    println!("  Memory: {}", dispatcher.store().path().display());
    println!("  Policy: {}", dispatcher.store().policy());
    println!();
    println!("Endpoints:");
    println!("  GET  /tools     - List tools");
    println!("  POST /tool/call - Invoke a tool");
    println!("  GET  /topics    - List entity names");
    println!("  GET  /status    - Graph counters");
    println!("  GET  /health    - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, dispatcher).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph counters.
pub fn cmd_status(dispatcher: &Dispatcher, json_mode: bool) -> Result<(), MemoryError> {
    let stats = dispatcher.stats()?;
    let path = dispatcher.store().path();

    if json_mode {
        let output = serde_json::json!({
            "memory_path": path.to_string_lossy(),
            "entity_count": stats.entity_count,
            "relation_count": stats.relation_count,
            "observation_count": stats.observation_count,
        });
        print_json(&output);
        return Ok(());
    }

    println!("memgraph Status");
    println!("===============");
    println!("Memory: {}", path.display());
    println!();
    println!("Entities:     {}", stats.entity_count);
    println!("Relations:    {}", stats.relation_count);
    println!("Observations: {}", stats.observation_count);

    Ok(())
}

// =============================================================================
// TOOLS COMMAND
// =============================================================================

/// List the tool catalogue.
pub fn cmd_tools(dispatcher: &Dispatcher, json_mode: bool) -> Result<(), MemoryError> {
    let tools = dispatcher.list_tools();

    if json_mode {
        let output = serde_json::to_value(&tools)
            .map_err(|e| MemoryError::Persistence(format!("cannot encode tools: {}", e)))?;
        print_json(&output);
        return Ok(());
    }

    for tool in tools {
        println!("{:<20} {}", tool.name, tool.description);
    }
    Ok(())
}

// =============================================================================
// CALL COMMAND
// =============================================================================

/// Invoke one tool and print its text payload.
///
/// An engine failure is printed as its `Error: ...` payload and then
/// returned unchanged, so the process exits non-zero with the real cause.
pub fn cmd_call(
    dispatcher: &Dispatcher,
    tool: &str,
    args: &str,
    json_mode: bool,
) -> Result<(), MemoryError> {
    let call = ToolCall::decode(tool, Some(parse_arguments(args)?))?;
    let result = dispatcher.run(call);

    let output = match &result {
        Ok(text) => ToolOutput::success(text.as_str()),
        Err(e) => ToolOutput::failure(e),
    };
    if json_mode {
        print_json(&serde_json::json!({
            "content": [{"type": "text", "text": output.text}],
            "is_error": output.is_error,
        }));
    } else {
        println!("{}", output.text);
    }

    result.map(|_| ())
}

/// Parse `--args`; it must be a JSON object.
fn parse_arguments(args: &str) -> Result<ToolArguments, MemoryError> {
    match serde_json::from_str::<Value>(args) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(MemoryError::InvalidRequest(format!(
            "--args must be a JSON object, got {}",
            other
        ))),
        Err(e) => Err(MemoryError::InvalidRequest(format!(
            "--args is not valid JSON: {}",
            e
        ))),
    }
}

// =============================================================================
// TOPICS COMMAND
// =============================================================================

/// List entity names, one per line.
pub fn cmd_topics(dispatcher: &Dispatcher, json_mode: bool) -> Result<(), MemoryError> {
    let names = dispatcher.engine().entity_names()?;

    if json_mode {
        print_json(&Value::from(names));
        return Ok(());
    }

    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use memgraph_core::{GraphStore, LoadPolicy, MutationEngine};
    use std::sync::Arc;

    fn dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
        let store = GraphStore::open(dir.path().join("memory.jsonl"), LoadPolicy::Reset)
            .expect("open store");
        Dispatcher::new(MutationEngine::new(Arc::new(store)), 100)
    }

    #[test]
    fn arguments_must_be_an_object() {
        assert!(parse_arguments("{}").is_ok());
        assert!(matches!(
            parse_arguments("[1, 2]"),
            Err(MemoryError::InvalidRequest(_))
        ));
        assert!(matches!(
            parse_arguments("{not json"),
            Err(MemoryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn call_writes_through_to_the_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher = dispatcher(&dir);

        let args = r#"{"entities":[{"name":"Ada","entityType":"person","observations":["wrote notes"]}]}"#;
        cmd_call(&dispatcher, "create_entities", args, false).expect("call");

        let stats = dispatcher.stats().expect("stats");
        assert_eq!(stats.entity_count, 1);
        assert_eq!(stats.observation_count, 1);
    }

    #[test]
    fn engine_error_fails_the_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher = dispatcher(&dir);

        let args = r#"{"observations":[{"entityName":"Ghost","contents":["boo"]}]}"#;
        let result = cmd_call(&dispatcher, "add_observations", args, true);
        assert!(matches!(result, Err(MemoryError::NotFound(name)) if name == "Ghost"));
    }

    #[test]
    fn unknown_tool_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dispatcher = dispatcher(&dir);
        assert!(matches!(
            cmd_call(&dispatcher, "drop_everything", "{}", false),
            Err(MemoryError::InvalidRequest(_))
        ));
    }
}
