//! Status command: where panelbus reads from and how the bus is configured.

use anyhow::Result;
use console::style;

use panelbus_infra::filesystem::resolve_bundles_dir;

use crate::state::AppState;

pub fn status(state: &AppState, json: bool) -> Result<()> {
    let config = &state.config;
    let bundles_dir = resolve_bundles_dir(&state.data_dir, &config.server);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "bundles_dir": bundles_dir.display().to_string(),
            "bundles": state.bundles.len(),
            "config": config.as_ref(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let ack_timeout = match config.bus.ack_timeout_ms {
        Some(ms) => format!("{ms} ms"),
        None => "none".to_string(),
    };

    println!();
    println!("  {} panelbus v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {}", style("── Paths ──").dim());
    println!("  Data dir:    {}", style(state.data_dir.display()).cyan());
    println!("  Bundles dir: {}", style(bundles_dir.display()).cyan());
    println!("  Bundles:     {}", style(state.bundles.len()).bold());
    println!();
    println!("  {}", style("── Bus ──").dim());
    println!("  Ack timeout:   {ack_timeout}");
    println!(
        "  When offline:  {:?} (queue capacity {})",
        config.bus.disconnected_policy, config.bus.queue_capacity
    );
    println!();
    println!("  {}", style("── Server ──").dim());
    println!("  Listen:      {}:{}", config.server.host, config.server.port);
    println!();

    Ok(())
}
