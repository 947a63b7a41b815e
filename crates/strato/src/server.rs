//! The stdio JSON-lines transport and the one-shot subcommands.

use anyhow::Context;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use strato_client::ClientRegistry;
use strato_config::Settings;
use strato_core::envelope::Envelope;
use strato_core::request::next_request_id;
use strato_core::ToolError;
use strato_tools::{register_enabled, Dispatcher, ToolContext, ToolRegistry};

fn build_dispatcher(settings: Arc<Settings>) -> anyhow::Result<Dispatcher> {
    let mut registry = ToolRegistry::new();
    register_enabled(&mut registry, &settings.features)
        .context("failed to assemble tool registry")?;
    let ctx = Arc::new(ToolContext::new(settings)?);
    Ok(Dispatcher::new(registry, ctx))
}

/// Read `{"name": ..., "arguments": {...}}` per stdin line, write one
/// envelope per stdout line. Malformed lines get a Validation envelope.
///
/// Each request runs on its own task, so a slow backend call never blocks the
/// next line. Responses are funneled through one writer task, which keeps
/// stdout lines whole; arrival order follows completion order.
pub async fn serve(settings: Arc<Settings>) -> anyhow::Result<()> {
    let verbose = settings.logging.verbose();
    let dispatcher = Arc::new(build_dispatcher(settings.clone())?);
    let instance = settings.instance()?;
    info!(
        instance = %settings.active_instance,
        region = %instance.region,
        tools = dispatcher.registry().len(),
        "strato server ready"
    );

    let (response_tx, mut response_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = response_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
            {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let dispatcher = dispatcher.clone();
                        let response_tx = response_tx.clone();
                        tokio::spawn(async move {
                            let envelope = handle_line(&dispatcher, &line, verbose).await;
                            if let Ok(serialized) = serde_json::to_string(&envelope.to_value()) {
                                let _ = response_tx.send(serialized);
                            }
                        });
                    }
                    None => break,
                }
            }
        }
    }

    // In-flight request tasks hold sender clones; the writer drains until the
    // last one completes.
    drop(response_tx);
    writer.await.context("stdout writer task failed")?;

    dispatcher.context().clients.shutdown().await;
    Ok(())
}

async fn handle_line(dispatcher: &Dispatcher, line: &str, verbose: bool) -> Envelope {
    let parsed: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "malformed request line");
            let err = ToolError::validation("Malformed request line")
                .with_detail("parse_error", e.to_string());
            return Envelope::failure(&err, next_request_id(), 0.0, verbose);
        }
    };

    let name = match parsed["name"].as_str() {
        Some(name) => name,
        None => {
            let err = ToolError::validation("Request must carry a string 'name' field");
            return Envelope::failure(&err, next_request_id(), 0.0, verbose);
        }
    };
    let arguments = parsed["arguments"].as_object().cloned();

    dispatcher.dispatch(name, arguments).await
}

/// Print the tool listing as pretty JSON.
pub fn print_tools(settings: Arc<Settings>) -> anyhow::Result<()> {
    let dispatcher = build_dispatcher(settings)?;
    println!("{}", serde_json::to_string_pretty(&dispatcher.list_tools())?);
    Ok(())
}

/// Probe backend connectivity and print the per-service report.
pub async fn check(settings: Arc<Settings>) -> anyhow::Result<()> {
    let registry = ClientRegistry::new(settings);
    let report = registry.test_connection().await;
    registry.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
