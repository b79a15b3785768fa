use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};

use verbi::cache::{FileCache, create_cache};
use verbi::config::{CacheKind, VerbiConfig};
use verbi::extractor::{self, catalog};
use verbi::providers::create_provider;
use verbi::translator::translate_locale;
use verbi::validator::validate_translations;

fn cli() -> Command {
    let locales_arg = Arg::new("locales")
        .long("locales")
        .short('l')
        .help("Comma-separated target locales (e.g. fr,de)")
        .value_name("LOCALES");
    let all_arg = Arg::new("all")
        .long("all")
        .short('a')
        .help("Run for every configured locale")
        .action(clap::ArgAction::SetTrue);

    Command::new("verbi")
        .version("0.1.0")
        .about("AI-assisted localization pipeline for TypeScript projects")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Config file path (default: ./verbi.config.json)")
                .value_name("PATH")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show debug-level log output")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new("scan").about("Extract translatable content from code"))
        .subcommand(
            Command::new("translate")
                .about("Translate messages using the configured provider")
                .arg(locales_arg.clone())
                .arg(all_arg.clone()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check translated catalogs for placeholder parity")
                .arg(locales_arg)
                .arg(all_arg),
        )
        .subcommand(Command::new("status").about("Show translation coverage and cache totals"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse().unwrap()),
        )
        .init();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = VerbiConfig::load(config_path.as_deref())?;

    match matches.subcommand() {
        Some(("scan", _)) => run_scan(&config),
        Some(("translate", sub)) => run_translate(&config, sub).await,
        Some(("validate", sub)) => run_validate(&config, sub),
        Some(("status", _)) => run_status(&config),
        _ => unreachable!("subcommand is required"),
    }
}

fn run_scan(config: &VerbiConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("📝 Scanning for translatable content...");
    let scan = extractor::scan_project(config, Path::new("."))?;
    println!(
        "   {} files scanned, {} unique messages extracted",
        scan.files_scanned,
        scan.messages.len()
    );
    if scan.files_failed > 0 {
        println!("   ⚠️  {} files could not be parsed", scan.files_failed);
    }

    catalog::write_catalogs(&scan.messages, config)?;
    println!(
        "✅ Scan complete! Messages written to {}",
        config.messages_dir.join(&config.source_locale).display()
    );

    print_status_table(config)
}

async fn run_translate(
    config: &VerbiConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let locales = select_locales(config, matches)?;

    let provider = create_provider(&config.provider)?;
    println!("🔌 Validating provider configuration...");
    if !provider.validate_config().await {
        eprintln!("❌ Provider configuration is invalid. Check your API keys.");
        return Err("invalid provider configuration".into());
    }

    let mut cache = create_cache(&config.cache);
    let mut all_stats = Vec::new();
    for locale in &locales {
        println!("🌍 Translating {locale}...");
        let stats = translate_locale(config, Arc::clone(&provider), cache.as_mut(), locale).await?;
        all_stats.push(stats);
    }

    println!();
    println!("✨ Translation complete!");
    println!("📊 Summary:");
    let mut total_new = 0;
    let mut total_cached = 0;
    for stats in &all_stats {
        total_new += stats.translated;
        total_cached += stats.cached;
        println!("   {}: {} total messages", stats.locale, stats.total);
    }
    println!();
    println!("   Total translated: {total_new} new, {total_cached} from cache");
    Ok(())
}

fn run_validate(
    config: &VerbiConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let locales = select_locales(config, matches)?;
    let source = catalog::load_catalog(&config.messages_dir, &config.source_locale)?;

    let mut total_errors = 0;
    for locale in &locales {
        let target = catalog::load_catalog(&config.messages_dir, locale)?;
        let report = validate_translations(&source, &target, locale, config);

        if report.is_clean() {
            println!(
                "✅ {}: {} valid, {} missing",
                report.locale, report.stats.valid, report.stats.missing
            );
        } else {
            println!(
                "❌ {}: {} invalid, {} missing of {} messages",
                report.locale, report.stats.invalid, report.stats.missing, report.stats.total
            );
        }
        for issue in &report.errors {
            println!("   ❌ {}: {}", issue.key, issue.message);
        }
        for issue in &report.warnings {
            println!("   ⚠️  {}: {}", issue.key, issue.message);
        }
        total_errors += report.errors.len();
    }

    if total_errors > 0 {
        return Err(format!("{total_errors} validation errors").into());
    }
    Ok(())
}

fn run_status(config: &VerbiConfig) -> Result<(), Box<dyn std::error::Error>> {
    print_status_table(config)?;

    if config.cache.kind == CacheKind::File {
        let stats = FileCache::new(&config.cache.path).stats()?;
        println!();
        println!(
            "📦 Cache: {} entries, {} bytes",
            stats.total_entries, stats.size_in_bytes
        );
    }
    Ok(())
}

fn print_status_table(config: &VerbiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let statuses = catalog::translation_status(config)?;
    if statuses.is_empty() {
        println!("No target locales configured.");
        return Ok(());
    }

    println!();
    println!("📊 Translation status:");
    for status in &statuses {
        if status.total == 0 {
            println!("   {}: no source messages yet", status.locale);
        } else if status.missing == 0 {
            println!(
                "   {}: ✓ all {} messages translated",
                status.locale, status.total
            );
        } else {
            println!(
                "   {}: {} missing, {} translated",
                status.locale, status.missing, status.translated
            );
        }
    }
    Ok(())
}

/// Resolve the locale list from `--locales`/`--all`, keeping the order the
/// user gave.
fn select_locales(
    config: &VerbiConfig,
    matches: &ArgMatches,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if matches.get_flag("all") {
        return Ok(config.target_locales());
    }
    if let Some(raw) = matches.get_one::<String>("locales") {
        let locales: Vec<String> = raw
            .split(',')
            .map(|locale| locale.trim().to_string())
            .filter(|locale| !locale.is_empty())
            .collect();
        if !locales.is_empty() {
            return Ok(locales);
        }
    }
    eprintln!("❌ Specify --locales or --all");
    Err("missing --locales or --all".into())
}
