use anyhow::{Context, Result};
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::data::{Category, Item, SavedRequest, SavedResult};
use crate::llm::{parse_plan_response, FileResponseProvider, MockPlannerProvider, PlannerProvider};
use crate::location::{distance_text, Coordinates};
use crate::optimizer::{compute_plans, optimize, OptimizeMode};
use crate::plan::{apply_alternative, compute_total, distinct_stores, toggle_owned};
use crate::storage::{FileStorage, Storage};

fn resolve_provider(spec: &str) -> Box<dyn PlannerProvider> {
    // Anything that is not the built-in mock is a path to a pre-captured
    // planner response.
    if spec == "mock" {
        Box::new(MockPlannerProvider)
    } else {
        Box::new(FileResponseProvider::new(spec))
    }
}

fn parse_result_id(result_id: &str) -> Result<Uuid> {
    Uuid::parse_str(result_id).with_context(|| format!("Invalid result id: {}", result_id))
}

/// Run a free-text request through the planner and persist the result.
pub fn run_plan(
    config: &PlannerConfig,
    provider_spec: &str,
    request: &str,
    title: Option<&str>,
) -> Result<()> {
    let provider = resolve_provider(provider_spec);
    let raw = provider.generate_plan(request, &config.shops)?;
    let response = parse_plan_response(&raw).context("Planner returned a malformed response")?;

    let total = compute_total(&response.items);
    tracing::info!(
        items = response.items.len(),
        total = total,
        "Parsed planner response"
    );

    let storage = FileStorage::new(&config.data_dir);
    let saved_request = SavedRequest::new(request.to_string(), total);
    storage.save_request(&saved_request)?;

    let title = title
        .map(str::to_string)
        .or_else(|| Some(request.to_string()).filter(|t| !t.is_empty()));
    let result = SavedResult::new(
        saved_request.request_id,
        response.items,
        config.method.clone(),
        title,
    );
    storage.save_result(&result)?;

    print_items(&result.items, None);
    println!();
    println!("Estimated cost: ${:.2}", total);
    if response.total_cost > 0.0 && (response.total_cost - total).abs() > 0.005 {
        println!("Planner's own estimate: ${:.2}", response.total_cost);
    }
    if !response.estimated_time.is_empty() {
        println!("Estimated time: {}", response.estimated_time);
    }
    if !response.difficulty.is_empty() {
        println!("Difficulty: {}", response.difficulty);
    }
    println!();
    println!("Saved result {}", result.result_id);

    Ok(())
}

/// Table of saved results, newest first.
pub fn list_results(config: &PlannerConfig) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let results = storage.list_results()?;

    if results.is_empty() {
        println!("No results found in: {}", config.data_dir);
        return Ok(());
    }

    println!("Results in {}:", config.data_dir);
    println!(
        "{:<38} {:<20} {:>5} {:>10}  TITLE",
        "RESULT ID", "CREATED", "ITEMS", "TOTAL"
    );
    println!("{}", "-".repeat(90));
    for result in results {
        println!(
            "{:<38} {:<20} {:>5} {:>10}  {}",
            result.result_id,
            result.created_at.format("%Y-%m-%d %H:%M:%S"),
            result.items.len(),
            format!("${:.2}", compute_total(&result.items)),
            result.title.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

/// Print a saved result as raw JSON or a readable grouped summary.
pub fn show_result(
    config: &PlannerConfig,
    result_id: &str,
    format: &str,
    origin: Option<Coordinates>,
) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let result = storage.load_result(&parse_result_id(result_id)?)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "md" => {
            println!("# {}", result.title.as_deref().unwrap_or("Shopping plan"));
            println!();
            println!("Created: {}", result.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("Method: {}", result.method);
            println!();
            print_items(&result.items, origin);
            println!();
            println!("Estimated cost: ${:.2}", compute_total(&result.items));
            println!("Stores to visit: {}", distinct_stores(&result.items).len());
        }
        other => anyhow::bail!("Unknown format: {} (expected 'json' or 'md')", other),
    }

    Ok(())
}

/// Compute all three plan variants and print their totals side by side.
pub fn compare_plans(config: &PlannerConfig, result_id: &str) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let result = storage.load_result(&parse_result_id(result_id)?)?;

    let plans = compute_plans(&result.items);
    println!("{:<16} {:>10} {:>8}", "PLAN", "TOTAL", "STORES");
    println!("{}", "-".repeat(36));
    for (name, plan) in [
        ("current", &result.items),
        ("lowest", &plans.lowest),
        ("fewest-shops", &plans.fewest),
        ("both", &plans.both),
    ] {
        println!(
            "{:<16} {:>10} {:>8}",
            name,
            format!("${:.2}", compute_total(plan)),
            distinct_stores(plan).len(),
        );
    }

    Ok(())
}

/// Re-optimize a saved result with one plan variant and persist it.
pub fn optimize_result(config: &PlannerConfig, result_id: &str, mode: OptimizeMode) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let id = parse_result_id(result_id)?;
    let result = storage.load_result(&id)?;

    let before = compute_total(&result.items);
    let optimized = optimize(&result.items, mode);
    let after = compute_total(&optimized);
    storage.update_result_items(&id, &optimized)?;

    tracing::info!(mode = ?mode, before = before, after = after, "Optimized result");
    println!(
        "Optimized ({:?}): ${:.2} -> ${:.2}, {} store(s)",
        mode,
        before,
        after,
        distinct_stores(&optimized).len()
    );

    Ok(())
}

/// Toggle the "I already have this" flag on one item and persist.
pub fn toggle_owned_item(config: &PlannerConfig, result_id: &str, item_id: &str) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let id = parse_result_id(result_id)?;
    let result = storage.load_result(&id)?;

    if !result.items.iter().any(|i| i.id == item_id) {
        anyhow::bail!("No item with id {} in result {}", item_id, result_id);
    }

    let updated = toggle_owned(&result.items, item_id);
    storage.update_result_items(&id, &updated)?;

    let owned = updated
        .iter()
        .find(|i| i.id == item_id)
        .map(|i| i.owned)
        .unwrap_or(false);
    println!(
        "Item {} is now {}. Estimated cost: ${:.2}",
        item_id,
        if owned { "owned" } else { "not owned" },
        compute_total(&updated)
    );

    Ok(())
}

/// Manually substitute one item with one of its alternatives and persist.
pub fn use_alternative(
    config: &PlannerConfig,
    result_id: &str,
    item_id: &str,
    alt_index: usize,
) -> Result<()> {
    let storage = FileStorage::new(&config.data_dir);
    let id = parse_result_id(result_id)?;
    let result = storage.load_result(&id)?;

    let updated = apply_alternative(&result.items, item_id, alt_index)?;
    storage.update_result_items(&id, &updated)?;

    if let Some(item) = updated.iter().find(|i| i.id == item_id) {
        println!(
            "Item {} replaced with: {} ({} at {})",
            item_id, item.name, item.price, item.store
        );
    }
    println!("Estimated cost: ${:.2}", compute_total(&updated));

    Ok(())
}

fn print_items(items: &[Item], origin: Option<Coordinates>) {
    print_group(items, Category::Product, "Products & Materials", origin);
    print_group(items, Category::Tool, "Tools & Equipment", origin);
}

fn print_group(items: &[Item], category: Category, heading: &str, origin: Option<Coordinates>) {
    let group: Vec<&Item> = items.iter().filter(|i| i.category == category).collect();
    if group.is_empty() {
        return;
    }

    println!();
    println!("{}", heading);
    for item in group {
        let owned = if item.owned { " [owned]" } else { "" };
        println!(
            "  {}. {} - {} at {}{}",
            item.id, item.name, item.price, item.store, owned
        );
        println!("     {} ({})", item.description, item.availability);
        if let Some(distance) = distance_text(&item.store, origin) {
            println!("     {}", distance);
        }
        if !item.alternatives.is_empty() {
            println!("     {} alternative(s):", item.alternatives.len());
            for (idx, alt) in item.alternatives.iter().enumerate() {
                println!("       [{}] {} - {} at {}", idx, alt.name, alt.price, alt.store);
            }
        }
    }
}
