//! `pm search <query> -p <project>`.
//!
//! Semantic search when an embedding provider is configured, substring
//! search otherwise. A short answer is synthesized from the top results
//! when a text generator is available.

use super::{embedding_provider, open_storage, print_json, runtime, text_generator, truncate};
use crate::cli::SearchArgs;
use crate::config::{load_config, process_env, resolve_search_settings};
use crate::error::Result;
use crate::search::{Ranker, SearchMode, SearchOptions, SearchOutcome};
use colored::Colorize;
use std::path::PathBuf;

/// Execute the search command.
///
/// # Errors
///
/// Returns an error for invalid input, an unknown project, or a provider
/// failure while embedding the query.
pub fn execute(args: &SearchArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let storage = open_storage(db_path)?;
    let config = load_config()?;
    let settings = resolve_search_settings(config.search.as_ref(), &process_env)?;

    let options = SearchOptions {
        limit: args.limit,
        threshold: args.threshold,
        answer: !args.no_answer,
    };

    let outcome = runtime()?.block_on(async {
        let provider = embedding_provider(&config).await;
        let generator = if options.answer && provider.is_some() {
            text_generator(&config).await
        } else {
            None
        };

        Ranker::new(&storage, provider.as_ref(), generator.as_ref(), settings)
            .search(&args.project, &args.query, options)
            .await
    })?;

    if json {
        return print_json(&outcome);
    }

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &SearchOutcome) {
    if outcome.mode == SearchMode::Text {
        println!(
            "{}",
            "No embedding provider configured; showing text matches.".dimmed()
        );
    }

    if outcome.results.is_empty() {
        println!("No matching decisions for \"{}\".", outcome.query);
        return;
    }

    if let Some(answer) = &outcome.answer {
        println!("{}", "Answer".yellow().bold());
        println!("  {}", answer.trim());
        println!();
    }

    println!("{} ({})", "Decisions".bold(), outcome.results.len());
    for (i, result) in outcome.results.iter().enumerate() {
        let score = match outcome.mode {
            SearchMode::Semantic => format!("{:.2}", result.score),
            SearchMode::Text => "text".to_string(),
        };
        println!(
            "  {}. {} {} {}",
            i + 1,
            result.decision.title.bold(),
            format!("[{score}]").yellow(),
            result.decision.id.dimmed()
        );
        if let Some(snippet) = &result.snippet {
            println!("     {}", truncate(snippet, 120));
        }
    }

    if outcome.mismatched > 0 {
        println!();
        println!(
            "{} {} decision(s) were embedded with a different model and skipped.",
            "Note:".yellow(),
            outcome.mismatched
        );
    }
}
