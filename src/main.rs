use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use pbilink::ado::AdoClient;
use pbilink::auth::{self, token_store, TokenSource};
use pbilink::config::Settings;
use pbilink::pipeline::run::{execute, format_rows, RunOutcome};
use pbilink::pipeline::{self, plan::Plan, Prepared};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const MAX_PATH_ATTEMPTS: usize = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pbilink=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let settings = Settings::load()?;

    // ==============================
    // 🚪 LOGOUT MODE
    // ==============================
    if args.len() >= 3 && args[1] == "auth" && args[2] == "logout" {
        token_store::delete_token(settings.org_base())?;
        println!("✅ Removed stored token for {}", settings.org_base());
        return Ok(());
    }

    let dry_run = args.iter().any(|a| a == "--dry-run");
    let path_arg = args.iter().skip(1).find(|a| !a.starts_with("--")).cloned();

    let path = match resolve_path(path_arg)? {
        Some(path) => path,
        None => return Ok(()),
    };

    println!("📖 Reading {}...\n", path.display());

    let prepared = match pipeline::prepare(&path, &settings) {
        Ok(prepared) => prepared,
        Err(e) => {
            println!("{} {}", "❌ ERROR:".red().bold(), e);
            println!("   No PBIs were created.");
            return Ok(());
        }
    };

    print_plan(&prepared);

    if dry_run {
        print_dry_run(&prepared.plan);
        return Ok(());
    }

    if prepared.plan.items.is_empty() {
        println!("✅ Nothing to create.");
        return Ok(());
    }

    // ==============================
    // 🔐 Token
    // ==============================
    let (pat, source) = auth::resolve_pat(&settings)?;
    match source {
        TokenSource::Config => println!("🔑 Using token from configuration"),
        TokenSource::Keyring => println!("🔑 Using stored token"),
        TokenSource::Prompt => {}
    }

    let client = AdoClient::new(&settings, pat);

    let outcome = execute(&client, &prepared.plan, &prepared.details.feature_id).await;

    match pipeline::write_back(
        &prepared.workbook,
        &prepared.table,
        &outcome.linked,
        settings.write_hyperlinks,
    ) {
        Ok(0) => {}
        Ok(cells) => println!(
            "\n📝 UPDATED: {} PBI URL(s) written into {}",
            cells,
            path.display()
        ),
        Err(e) => {
            // The items exist remotely already; list their URLs.
            println!("{} Could not save URLs: {}", "❌ ERROR:".red().bold(), e);
            for linked in &outcome.linked {
                println!("   row {}: {}", linked.row, linked.url);
            }
        }
    }

    print_summary(&prepared.plan, &outcome);
    Ok(())
}

fn print_usage() {
    println!("pbilink - create Azure DevOps PBIs from an accessibility audit workbook\n");
    println!("USAGE:");
    println!("    pbilink [PATH] [--dry-run]");
    println!("    pbilink auth logout\n");
    println!("Configuration is read from pbilink.toml and PBILINK_* environment variables.");
}

/// Use the argument when given, otherwise prompt up to three times.
fn resolve_path(arg: Option<String>) -> Result<Option<PathBuf>, Box<dyn Error>> {
    if let Some(arg) = arg {
        let path = PathBuf::from(arg.trim());
        if is_workbook(&path) {
            return Ok(Some(path));
        }
        println!("{} File {} not found.", "❌".red(), path.display());
        return Ok(None);
    }

    for attempt in 1..=MAX_PATH_ATTEMPTS {
        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Path to the audit workbook (.xlsx)")
            .interact_text()?;

        let path = PathBuf::from(input.trim().trim_matches('"'));
        if is_workbook(&path) {
            return Ok(Some(path));
        }

        println!(
            "{} File not found. Attempts left: {}",
            "⚠️".yellow(),
            MAX_PATH_ATTEMPTS - attempt
        );
    }

    println!("{} Maximum attempts reached. Exiting.", "❌".red());
    Ok(None)
}

fn is_workbook(path: &Path) -> bool {
    path.is_file()
}

fn print_plan(prepared: &Prepared) {
    println!(
        "📄 {} - {} (feature {})",
        prepared.details.page_name.bold(),
        prepared.details.page_url.dimmed(),
        prepared.details.feature_id.cyan()
    );

    for skipped in &prepared.plan.skipped {
        println!("⏭  Skipped row {}: {}", skipped.row, skipped.reason);
    }
    println!();
}

fn print_dry_run(plan: &Plan) {
    println!("🧪 Dry run: {} PBI(s) would be created\n", plan.items.len());

    for item in &plan.items {
        println!("{}", item.title.bold());
        println!("   rows:     {}", format_rows(&item.rows));
        println!("   priority: {}", item.priority);
        println!("   tags:     {}", item.tags);
        if let Some(group) = &item.group {
            println!("   group:    {}", group.cyan());
        }
        println!();
    }
}

fn print_summary(plan: &Plan, outcome: &RunOutcome) {
    println!("\n========================================");
    println!("✅ Created:  {}", outcome.created.to_string().green());
    println!("🔁 Reused:   {}", outcome.reused_rows);
    println!("⏭  Skipped:  {}", plan.skipped.len());

    let failed = if outcome.failed.is_empty() {
        "0".normal()
    } else {
        outcome.failed.len().to_string().red()
    };
    println!("❌ Failed:   {}", failed);

    if outcome.link_failures > 0 {
        println!(
            "⚠️  {} PBI(s) could not be linked to the feature",
            outcome.link_failures
        );
    }
    println!("========================================");

    for failure in &outcome.failed {
        println!(
            "   rows {}: {} ({})",
            format_rows(&failure.rows),
            failure.title,
            failure.error.dimmed()
        );
    }
}
