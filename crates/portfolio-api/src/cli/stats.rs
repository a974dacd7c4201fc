//! `pfolio stats`: per-source and combined index statistics.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;

use portfolio_types::element::{ElementType, Source};
use portfolio_types::unified::SourceStats;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.index_manager.get_stats().await;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "portfolio_dir": state.portfolio_dir.display().to_string(),
            "config": state.config.path.display().to_string(),
            "token_configured": state.tokens.is_configured(),
            "sources": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} pfolio v{}",
        style("◆").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    print_source(Source::Local, &stats.local);
    print_source(Source::GitHub, &stats.github);
    print_source(Source::Collection, &stats.collection);

    println!("  {}", style("── Combined ──").dim());
    println!(
        "  Elements:  {}",
        style(stats.combined.total_elements).bold()
    );
    println!(
        "  Available: {}/{}",
        stats.combined.sources_available,
        Source::ALL.len()
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!(
        "  Data dir:  {}",
        style(state.data_dir.display()).dim()
    );
    println!(
        "  Portfolio: {}",
        style(state.portfolio_dir.display()).dim()
    );
    println!(
        "  Config:    {}",
        style(state.config.path.display()).dim()
    );
    println!(
        "  Token:     {}",
        if state.tokens.is_configured() {
            style("configured").green()
        } else {
            style("not set (GITHUB_TOKEN / GH_TOKEN)").yellow()
        }
    );
    println!();

    Ok(())
}

fn print_source(source: Source, stats: &SourceStats) {
    println!(
        "  {}",
        style(format!("── {} ──", source.display_name())).dim()
    );
    if !stats.available {
        println!("  {}", style("unavailable").red());
        println!();
        return;
    }

    println!(
        "  Elements:  {}{}",
        style(stats.total_elements).bold(),
        if stats.is_stale {
            style(" (stale)").yellow().to_string()
        } else {
            String::new()
        }
    );
    let by_type = format_by_type(stats);
    if !by_type.is_empty() {
        println!("  By type:   {by_type}");
    }
    println!("  Updated:   {}", format_time(stats.last_updated));
    println!();
}

fn format_by_type(stats: &SourceStats) -> String {
    ElementType::ALL
        .iter()
        .filter_map(|t| match stats.elements_by_type.get(t) {
            Some(&n) if n > 0 => Some(format!("{} {n}", t.dir_name())),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => {
            let age = Utc::now().signed_duration_since(t);
            let ago = if age.num_days() > 0 {
                format!("{}d ago", age.num_days())
            } else if age.num_hours() > 0 {
                format!("{}h ago", age.num_hours())
            } else if age.num_minutes() > 0 {
                format!("{}m ago", age.num_minutes())
            } else {
                "just now".to_string()
            };
            format!("{} ({ago})", t.format("%Y-%m-%d %H:%M"))
        }
        None => "never".to_string(),
    }
}
