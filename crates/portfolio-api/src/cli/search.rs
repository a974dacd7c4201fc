//! `pfolio search`: unified search across all enabled sources.

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use portfolio_types::config::parse_priority_names;
use portfolio_types::element::Source;
use portfolio_types::unified::{SearchOptions, UnifiedSearchResult};

use super::SearchArgs;
use crate::state::AppState;

/// Run a unified search and print the ranked results.
///
/// # Examples
///
/// ```bash
/// pfolio search writer --type persona
/// pfolio search "code review" --all --priority github,local
/// ```
pub async fn search(state: &AppState, args: SearchArgs, json: bool) -> Result<()> {
    let options = build_options(args)?;
    let results = state
        .index_manager
        .search(&options)
        .await
        .context("Search options rejected")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!();
        println!(
            "  No elements match '{}'.",
            style(&options.query).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    print_results(&results);
    if let (Some(page), Some(_)) = (options.page, options.page_size) {
        println!("  {}", style(format!("page {page}")).dim());
    }
    println!();

    Ok(())
}

fn build_options(args: SearchArgs) -> Result<SearchOptions> {
    let source_priority = args
        .priority
        .map(|names| parse_priority_names(&names))
        .transpose()
        .context("Invalid --priority")?;

    Ok(SearchOptions {
        query: args.query,
        include_local: !args.no_local,
        include_github: !args.no_github,
        include_collection: !args.no_collection,
        include_all: args.all,
        preferred_source: args.prefer,
        source_priority,
        element_type: args.element_type,
        page: args.page,
        page_size: args.page_size,
        sort: args.sort,
    })
}

fn print_results(results: &[UnifiedSearchResult]) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Version").fg(Color::White),
        Cell::new("Score").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for result in results {
        let name = if result.is_duplicate {
            format!("{} *", result.entry.name)
        } else {
            result.entry.name.clone()
        };
        table.add_row(vec![
            Cell::new(name).fg(Color::Cyan),
            Cell::new(result.entry.element_type),
            Cell::new(result.source.display_name()).fg(source_color(result.source)),
            Cell::new(result.entry.version.as_deref().unwrap_or("-")),
            Cell::new(format!("{:.2}", result.score)),
            Cell::new(truncate(result.entry.description.as_deref().unwrap_or(""), 60))
                .fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    if results.iter().any(|r| r.is_duplicate) {
        println!("  {}", style("* also present in another source").dim());
    }
}

pub(crate) fn source_color(source: Source) -> Color {
    match source {
        Source::Local => Color::Green,
        Source::GitHub => Color::Blue,
        Source::Collection => Color::Magenta,
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portfolio_types::element::ElementType;
    use portfolio_types::unified::SortBy;

    fn args(query: &str) -> SearchArgs {
        SearchArgs {
            query: query.to_string(),
            element_type: None,
            all: false,
            prefer: None,
            priority: None,
            no_local: false,
            no_github: false,
            no_collection: false,
            page: None,
            page_size: None,
            sort: SortBy::Relevance,
        }
    }

    #[test]
    fn test_flags_map_onto_search_options() {
        let mut a = args("writer");
        a.no_github = true;
        a.all = true;
        a.element_type = Some(ElementType::Persona);
        a.priority = Some(vec!["collection".into(), "local".into()]);

        let options = build_options(a).unwrap();
        assert!(options.include_local);
        assert!(!options.include_github);
        assert!(options.include_all);
        assert_eq!(options.element_type, Some(ElementType::Persona));
        assert_eq!(
            options.source_priority,
            Some(vec![Source::Collection, Source::Local])
        );
    }

    #[test]
    fn test_invalid_priority_is_rejected() {
        let mut a = args("writer");
        a.priority = Some(vec!["local".into(), "gitlab".into()]);
        let err = build_options(a).unwrap_err();
        assert!(format!("{err:#}").contains("gitlab"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
