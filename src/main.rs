use anyhow::Context;
use clap::Parser;
use dispatchloop::{
    Container, DispatchError, DispatchEvent, Dispatcher, DispatcherConfig, EventBus, EventKind,
    Forward, Signal, TaskHandler, TracingListener,
};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Run a task action through the dispatch loop
#[derive(Parser, Debug)]
#[command(name = "dispatchloop", version, about = "Dispatch a task action", long_about = None)]
struct Args {
    /// Task to run (defaults to the configured default task)
    #[arg(short, long)]
    task: Option<String>,

    /// Action to run (defaults to the configured default action)
    #[arg(short, long)]
    action: Option<String>,

    /// Positional params passed to the action
    params: Vec<String>,

    /// Named option appended after the params, as key=value (repeatable)
    #[arg(short = 'o', long = "option", value_parser = parse_key_val)]
    options: Vec<(String, String)>,

    /// Dispatcher config file (toml, yaml or json)
    #[arg(short, long, env = "DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid option '{s}', expected key=value"))?;
    Ok((key.to_string(), value.to_string()))
}

/// Option values are JSON when they parse as JSON, plain strings otherwise.
fn option_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn init_logging(json_logs: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize JSON logging")?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialize logging")?;
    }
    Ok(())
}

fn demo_container() -> Container {
    let container = Container::new();

    container.set_handler("MainTask", || {
        TaskHandler::new("main")
            .action("main", |_d, _args| {
                Ok(json!({ "tasks": ["main", "echo", "math"] }))
            })
            .action("not_found", |d, args| {
                Ok(json!({
                    "error": "not found",
                    "target": args.first().cloned().unwrap_or(Value::Null),
                    "previous_action": d.previous_action_name(),
                }))
            })
    });

    container.set_handler("EchoTask", || {
        TaskHandler::new("echo").action("main", |_d, args| Ok(Value::Array(args.to_vec())))
    });

    container.set_handler("MathTask", || {
        TaskHandler::new("math")
            .action("sum", |_d, args| {
                let total: f64 = args.iter().filter_map(as_number).sum();
                Ok(json!(total))
            })
            .action("add", |d, _args| {
                d.forward(Forward::default().action("sum"))?;
                Ok(Value::Null)
            })
    });

    container
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn demo_events() -> EventBus {
    let mut bus = EventBus::new();
    bus.attach(TracingListener::default());
    bus.on(EventKind::BeforeException, |event: &DispatchEvent<'_>, d: &mut Dispatcher| {
        let target = match event.fault() {
            Some(DispatchError::HandlerNotFound { class }) => class.clone(),
            Some(DispatchError::ActionNotFound { handler, action }) => {
                format!("{handler}/{action}")
            }
            _ => return Ok(Signal::Continue),
        };
        d.forward(
            Forward::default()
                .task("main")
                .action("not_found")
                .params(json!([target])),
        )?;
        Ok(Signal::Stop)
    });
    bus
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs)?;

    let config = match &args.config {
        Some(path) => DispatcherConfig::load(path)?,
        None => DispatcherConfig::from_env(),
    };

    let mut dispatcher = Dispatcher::with_config(config);
    dispatcher
        .set_resolver(Arc::new(demo_container()))
        .set_events_manager(Arc::new(demo_events()))
        .set_params(Value::Array(args.params.into_iter().map(Value::String).collect()));
    if let Some(task) = args.task {
        dispatcher.set_task_name(task);
    }
    if let Some(action) = args.action {
        dispatcher.set_action_name(action);
    }
    let options: Map<String, Value> = args
        .options
        .iter()
        .map(|(k, v)| (k.clone(), option_value(v)))
        .collect();
    dispatcher.set_options(options);

    let handler = dispatcher.dispatch()?;
    info!(
        handler_class = %dispatcher.handler_class(),
        handler_id = ?handler.as_ref().map(|h| h.id()),
        dispatch_id = ?dispatcher.dispatch_id(),
        "Dispatch complete"
    );

    println!("{}", serde_json::to_string_pretty(dispatcher.returned_value())?);
    Ok(())
}
