//! Cache maintenance commands: `pfolio cache ...` and `pfolio rebuild`.

use anyhow::Result;
use console::style;

use portfolio_types::unified::ActionKind;

use super::stats::format_time;
use crate::state::AppState;

/// Show remote portfolio cache freshness without triggering a fetch.
pub fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.remote_cache.cache_stats();
    let config = state.remote_cache.config();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("── Remote Cache ──").dim());
    println!("  Repository:  {}", style(&config.repository).cyan());
    println!(
        "  Cached:      {}",
        if stats.has_cached_data {
            style("yes").green()
        } else {
            style("no").dim()
        }
    );
    println!("  Elements:    {}", stats.total_elements);
    println!("  Last fetch:  {}", format_time(stats.last_fetch_time));
    println!(
        "  Stale:       {}",
        if stats.is_stale {
            style("yes").yellow()
        } else {
            style("no").green()
        }
    );
    if stats.recent_user_action {
        println!(
            "  {}",
            style("Refresh pending after a portfolio write").yellow()
        );
    }
    println!("  TTL:         {}s", config.ttl.as_secs());
    println!();

    Ok(())
}

/// Drop the cached remote index.
pub fn clear(state: &AppState, json: bool) -> Result<()> {
    state.remote_cache.clear_cache();
    report(json, "cleared", "Remote cache cleared")
}

/// Invalidate caches after a portfolio write performed elsewhere.
pub async fn invalidate(state: &AppState, action: ActionKind, json: bool) -> Result<()> {
    state.index_manager.invalidate_after_action(action).await;
    report(
        json,
        "invalidated",
        &format!("Caches invalidated after {action}"),
    )
}

/// Refresh the remote index immediately.
pub async fn refresh(state: &AppState, json: bool) -> Result<()> {
    let index = state.remote_cache.force_refresh().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&*index)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}/{}: {} elements",
        style("✓").green().bold(),
        index.username,
        index.repository,
        style(index.total_elements).bold()
    );
    if let Some(sha) = &index.head_commit_sha {
        println!(
            "  Head commit: {}",
            style(sha.get(..7).unwrap_or(sha.as_str())).dim()
        );
    }
    println!();

    Ok(())
}

/// Rebuild the local index and drop every remote cache.
pub async fn rebuild(state: &AppState, json: bool) -> Result<()> {
    state.index_manager.rebuild_all().await;
    report(json, "rebuilt", "Indexes rebuilt")
}

fn report(json: bool, status: &str, message: &str) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "status": status }))?
        );
    } else {
        println!();
        println!("  {} {}", style("✓").green().bold(), message);
        println!();
    }
    Ok(())
}
