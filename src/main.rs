//! handler-slack - post one monitoring event to Slack.

use std::io::Read;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use slack_handler::cli::{Cli, LogFormat};
use slack_handler::config::{Endpoints, HandlerConfig, HandlerSettings};
use slack_handler::error::{ConfigError, EXIT_DELIVERY, EventError, HandlerError};
use slack_handler::{Event, EventHandler, HandleReport};

/// Initialize the tracing subscriber with the specified log format.
///
/// Logs go to stderr so stdout stays free for `--validate` output.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<HandlerError>() {
            Some(handler_error) => {
                error!(error = %handler_error, "Handler failed");
                handler_error.exit_code()
            }
            None => {
                error!(error = %e, "Handler failed");
                EXIT_DELIVERY
            }
        },
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if cli.validate {
        let errors = config.check_templates();
        if !errors.is_empty() {
            return Err(validation_failed(errors).into());
        }
        EventHandler::new(config.clone()).map_err(HandlerError::from)?;
        print_summary(cli, &config);
        return Ok(());
    }

    let event = read_event(cli.event.as_deref()).map_err(HandlerError::from)?;
    info!(
        client = %event.client.name,
        check = %event.check.name,
        status = event.check.status,
        "Event received"
    );

    let handler = EventHandler::new(config).map_err(HandlerError::from)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime
        .block_on(handler.handle(&event))
        .and_then(HandleReport::into_result)?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<HandlerConfig, HandlerError> {
    info!(config_path = %cli.config.display(), section = %cli.section, "Loading configuration");

    let settings = HandlerSettings::load(&cli.config, &cli.section).inspect_err(|e| {
        error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
    })?;

    let config_dir = cli.config.parent().unwrap_or_else(|| Path::new("."));
    settings
        .compile(&cli.section, config_dir)
        .map_err(validation_failed)
}

/// Log every validation error and fold them into one.
fn validation_failed(errors: Vec<ConfigError>) -> HandlerError {
    for e in &errors {
        error!(error = %e, "Configuration validation error");
    }
    error!(error_count = errors.len(), "Configuration validation failed");
    HandlerError::Config(ConfigError::ValidationError(format!(
        "{} error(s) in settings",
        errors.len()
    )))
}

fn read_event(path: Option<&Path>) -> Result<Event, EventError> {
    let input = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| EventError::ReadFailed(format!("{}: {}", path.display(), e)))?,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .map_err(|e| EventError::ReadFailed(format!("stdin: {}", e)))?;
            input
        }
    };
    Event::from_json(&input)
}

fn print_summary(cli: &Cli, config: &HandlerConfig) {
    println!(
        "Configuration is valid: {} [{}]",
        cli.config.display(),
        config.name
    );
    match &config.endpoints {
        Endpoints::Single(url) => println!("  Webhook: {}", url.endpoint_hint()),
        Endpoints::PerChannel(map) => {
            println!("  Webhooks: {} channel(s)", map.len());
            for channel in map.keys() {
                println!("    - {}", channel);
            }
        }
    }
    println!("  Default channels: {}", list_or_none(&config.channels.default));
    println!("  Compulsory channels: {}", list_or_none(&config.channels.compulsory));
    println!(
        "  Retries: {} (timeout {:?}, sleep {:?})",
        config.retry.retries, config.retry.timeout, config.retry.retry_sleep
    );
    println!(
        "  Proxy: {}",
        if config.proxy.is_some() { "configured" } else { "none" }
    );
}

fn list_or_none(channels: &[String]) -> String {
    if channels.is_empty() {
        "none".to_string()
    } else {
        channels.join(", ")
    }
}
