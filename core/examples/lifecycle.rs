//! Walk a sandbox through its lifecycle against a live endpoint.
//!
//! ```text
//! SCALEBOX_BASE_URL=http://127.0.0.1:3000 SCALEBOX_API_KEY=test-api-key \
//!     RUST_LOG=scalebox_core=debug cargo run -p scalebox-core --example lifecycle
//! ```
//!
//! Point it at the mock server (`cargo run -p mock-server`) to try it
//! locally.

use std::collections::HashMap;

use scalebox_core::{
    ClientConfig, CreateSandboxRequest, GetSandboxMetricsOptions, ListSandboxesOptions,
    SandboxState, ScaleboxClient, UpdateSandboxRequest,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env();
    if !config.has_api_key() {
        return Err("SCALEBOX_API_KEY is not set".into());
    }
    tracing::info!(?config, "configuration loaded");
    let client = ScaleboxClient::from_config(&config)?;

    println!("=== create ===");
    let sandbox = client.create_sandbox(&CreateSandboxRequest {
        name: "lifecycle-demo".to_string(),
        template: "base".to_string(),
        cpu_count: 2,
        memory_mb: 512,
        storage_gb: 10,
        timeout: Some(300),
        metadata: HashMap::from([("environment".to_string(), "development".to_string())]),
        ..Default::default()
    })?;
    let id = sandbox.sandbox_id.as_str();
    println!("created {id} ({})", sandbox.status);

    println!("\n=== get ===");
    let sandbox = client.get_sandbox(id)?;
    println!("name: {}", sandbox.name);
    println!("cpu: {} cores, memory: {} MB", sandbox.cpu_count, sandbox.memory_mb);

    println!("\n=== list ===");
    let listed = client.list_sandboxes(Some(&ListSandboxesOptions {
        status: Some(SandboxState::Running),
        limit: 10,
        ..Default::default()
    }))?;
    println!("{} running sandbox(es)", listed.sandboxes.len());
    for s in &listed.sandboxes {
        println!("  - {}: {} ({})", s.sandbox_id, s.name, s.status);
    }

    println!("\n=== status ===");
    let status = client.get_sandbox_status(id)?;
    println!("status: {}", status.status);
    if let Some(substatus) = &status.substatus {
        println!("substatus: {substatus}");
    }

    println!("\n=== extend timeout ===");
    let sandbox = client.update_sandbox(id, &UpdateSandboxRequest { timeout: 600 })?;
    println!("timeout: {}s", sandbox.timeout);

    println!("\n=== pause / resume ===");
    println!("after pause: {}", client.pause_sandbox(id)?.status);
    println!("after resume: {}", client.resume_sandbox(id)?.status);

    println!("\n=== metrics ===");
    let metrics = client.get_sandbox_metrics(
        id,
        Some(&GetSandboxMetricsOptions {
            step: Some(60),
            ..Default::default()
        }),
    )?;
    println!("uptime: {}s, {} sample(s)", metrics.uptime_seconds, metrics.metrics.len());
    if let Some(latest) = metrics.metrics.last() {
        println!(
            "cpu {:.1}%, memory {}/{} bytes",
            latest.cpu_used_pct, latest.mem_used, latest.mem_total
        );
    }

    println!("\n=== delete ===");
    let deleted = client.delete_sandbox(id, None)?;
    println!("{}: {} ({})", deleted.sandbox_id, deleted.status, deleted.note);

    match client.get_sandbox(id) {
        Err(e) if e.is_not_found() => println!("{id} is gone"),
        Err(e) => return Err(e.into()),
        Ok(s) => println!("{id} still reports {}", s.status),
    }

    Ok(())
}
