//! Element lookup commands: find, list, updates.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use portfolio_types::element::ElementType;
use portfolio_types::unified::{Provenance, UnifiedEntry};

use super::search::{source_color, truncate};
use crate::state::AppState;

/// Find a single element by name and show where it lives.
pub async fn find(state: &AppState, name: &str, json: bool) -> Result<()> {
    let entry = state.index_manager.find_by_name(name).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    let Some(entry) = entry else {
        println!();
        println!(
            "  {} No element named '{}' in any source.",
            style("✗").red().bold(),
            style(name).cyan()
        );
        println!();
        return Ok(());
    };

    println!();
    println!(
        "  {}  {}",
        style("Name:").bold(),
        style(&entry.name).cyan()
    );
    println!("  {}  {}", style("Type:").bold(), entry.element_type);
    println!(
        "  {}  {}",
        style("Source:").bold(),
        entry.source().display_name()
    );
    if let Some(version) = &entry.version {
        println!("  {}  {}", style("Version:").bold(), version);
    }
    if let Some(author) = &entry.author {
        println!("  {}  {}", style("Author:").bold(), author);
    }
    if let Some(description) = &entry.description {
        println!("  {}  {}", style("Description:").bold(), description);
    }
    if !entry.tags.is_empty() {
        println!("  {}  {}", style("Tags:").bold(), entry.tags.join(", "));
    }
    println!(
        "  {}  {}",
        style("Location:").bold(),
        style(location(&entry)).dim()
    );
    println!();

    Ok(())
}

/// List every element of one type, first source in priority order wins.
pub async fn list(state: &AppState, element_type: ElementType, json: bool) -> Result<()> {
    let entries = state
        .index_manager
        .get_elements_by_type(element_type)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!("  No {} found.", element_type.dir_name());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Version").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for entry in &entries {
        table.add_row(vec![
            Cell::new(&entry.name).fg(Color::Cyan),
            Cell::new(entry.source().display_name()).fg(source_color(entry.source())),
            Cell::new(entry.version.as_deref().unwrap_or("-")),
            Cell::new(truncate(entry.description.as_deref().unwrap_or(""), 60))
                .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!(
        "  {} ({} entries)",
        style(element_type.dir_name()).bold(),
        entries.len()
    );
    println!("{table}");
    println!();

    Ok(())
}

/// Compare an element's versions across every source that has it.
pub async fn updates(state: &AppState, name: &str, json: bool) -> Result<()> {
    let comparison = state.index_manager.check_for_updates(name).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    let Some(comparison) = comparison else {
        println!();
        println!(
            "  No element named '{}' in any source.",
            style(name).cyan()
        );
        println!();
        return Ok(());
    };

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Source").fg(Color::White),
        Cell::new("Version").fg(Color::White),
        Cell::new("Last Modified").fg(Color::White),
    ]);

    for (source, version) in &comparison.versions_by_source {
        let newest = comparison.update_from_source == Some(*source);
        let version_cell = Cell::new(version.version.as_deref().unwrap_or("-"));
        table.add_row(vec![
            Cell::new(source.display_name()).fg(source_color(*source)),
            if newest {
                version_cell.fg(Color::Yellow)
            } else {
                version_cell
            },
            Cell::new(
                version
                    .last_modified
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("  {}", style(&comparison.name).cyan().bold());
    println!("{table}");
    match comparison.update_from_source {
        Some(source) if comparison.update_available => println!(
            "  {} Newer version available from {}",
            style("↑").yellow().bold(),
            source.display_name()
        ),
        _ => println!("  {} Up to date", style("✓").green().bold()),
    }
    println!();

    Ok(())
}

fn location(entry: &UnifiedEntry) -> String {
    match &entry.provenance {
        Provenance::Local { file_path } => file_path.display().to_string(),
        Provenance::GitHub { path, sha } => {
            format!("{path} @ {}", sha.get(..7).unwrap_or(sha.as_str()))
        }
        Provenance::Collection { path } => path.clone(),
    }
}
