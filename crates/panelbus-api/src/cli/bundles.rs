//! Bundle listing command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use panelbus_core::bundle::BundleMetadata;

use crate::state::AppState;

/// List every loaded bundle.
pub fn list_bundles(state: &AppState, json: bool) -> Result<()> {
    let bundles = state.bundles.descriptors();

    if json {
        println!("{}", serde_json::to_string_pretty(&bundles)?);
        return Ok(());
    }

    if bundles.is_empty() {
        println!();
        println!(
            "  {} No bundles found. Add one at: {}",
            style("i").blue().bold(),
            style("<bundles_dir>/<name>/bundle.toml").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Bundle").fg(Color::White),
        Cell::new("Version").fg(Color::White),
        Cell::new("Branch").fg(Color::White),
        Cell::new("Commit").fg(Color::White),
        Cell::new("Date").fg(Color::White),
    ]);

    for bundle in &bundles {
        let (branch, commit, date) = match &bundle.git {
            Some(git) => (
                git.branch.clone(),
                format!("{} {}", git.short_hash, git.message),
                git.date.format("%Y-%m-%d").to_string(),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(bundle.name.as_str()).fg(Color::Cyan),
            Cell::new(bundle.version.to_string()),
            Cell::new(branch),
            Cell::new(commit),
            Cell::new(date).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} bundle{}",
        style(bundles.len()).bold(),
        if bundles.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
