use campus_catalog::config::LogFormat;
use campus_catalog::core::ConfigProvider;
use campus_catalog::utils::error::ErrorSeverity;
use campus_catalog::utils::{logger, validation::Validate};
use campus_catalog::{
    CatalogConfig, CatalogError, CatalogStore, CliArgs, FavoritesStore, HttpCatalogSource,
    JsonFileStore, StoreWarning, University,
};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = match CatalogConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file is valid TOML or remove it to use defaults");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    match config.log_format() {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("Starting campus-catalog");
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }

    let source = match HttpCatalogSource::from_config(&config) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(exit_code(&e));
        }
    };
    tracing::debug!("Source endpoint: {}", source.endpoint());
    let persistence = Arc::new(JsonFileStore::new(config.storage_path()));
    tracing::info!("Storage file: {}", persistence.path().display());

    let catalog = CatalogStore::new(Arc::new(source), persistence.clone(), config.country_key());
    let favorites = FavoritesStore::new(
        persistence,
        config.favorites_key(),
        config.identity_policy(),
    );
    tracing::debug!("Favorites identity: {:?}", favorites.identity());
    let mut catalog_warnings = catalog.warnings();
    let mut favorite_warnings = favorites.warnings();

    tokio::join!(catalog.initialize(), favorites.initialize());

    if let Some(country) = args.country_change() {
        catalog.set_selected_country(country).await;
    }

    let load_state = catalog.load_state();
    tracing::debug!("Catalog is {}", load_state.tag());
    if let Some(message) = load_state.error_message() {
        eprintln!("❌ {}", message);
        eprintln!("💡 Check your connection and run the command again to reload");
        catalog.flush().await;
        report_warnings(&mut catalog_warnings);
        std::process::exit(2);
    }

    if let Some(term) = &args.search {
        catalog.set_search_term(term);
    }

    for name in &args.toggle_favorite {
        match find_university(&catalog, &favorites, name) {
            Some(university) => {
                if favorites.toggle_favorite(&university) {
                    println!("♥ Added {} to favorites", university.name);
                } else {
                    println!("♡ Removed {} from favorites", university.name);
                }
            }
            None => eprintln!("⚠️  No university named {:?} in the current view", name),
        }
    }

    if args.countries {
        for facet in catalog.country_facets() {
            println!("{}", facet.label);
        }
    } else if args.favorites {
        let list = favorites.favorites();
        println!("Favorites ({})", list.len());
        print_rows(list.iter().map(|u| u.as_ref()), &favorites, args.limit);
    } else {
        let snapshot = catalog.snapshot();
        let country = if snapshot.filter.has_country() {
            snapshot.filter.selected_country.as_str()
        } else {
            "All"
        };
        println!("{} universities (country: {})", snapshot.filtered.len(), country);
        print_rows(snapshot.filtered.iter().map(|u| u.as_ref()), &favorites, args.limit);
    }

    catalog.flush().await;
    favorites.flush().await;
    report_warnings(&mut catalog_warnings);
    report_warnings(&mut favorite_warnings);

    Ok(())
}

fn exit_code(e: &CatalogError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

/// Looks in the current view first, then the whole catalog, then the
/// favorites so a favorite can be removed while filtered out.
fn find_university(
    catalog: &CatalogStore,
    favorites: &FavoritesStore,
    name: &str,
) -> Option<University> {
    let snapshot = catalog.snapshot();
    let saved = favorites.favorites();
    let found = snapshot
        .filtered
        .iter()
        .chain(snapshot.all_universities.iter())
        .chain(saved.iter())
        .find(|u| u.name == name)
        .map(|u| u.as_ref().clone());
    found
}

fn print_rows<'a>(
    rows: impl Iterator<Item = &'a University>,
    favorites: &FavoritesStore,
    limit: usize,
) {
    let limit = if limit == 0 { usize::MAX } else { limit };
    let mut hidden = 0;

    for (position, university) in rows.enumerate() {
        if position >= limit {
            hidden += 1;
            continue;
        }
        let marker = if favorites.is_favorite(university) { "♥" } else { " " };
        let region = university
            .state_province
            .as_deref()
            .map(|s| format!(", {}", s))
            .unwrap_or_default();
        let site = university.web_pages.first().map(String::as_str).unwrap_or("");
        println!(
            "{} {} | {}{} {}",
            marker, university.name, university.country, region, site
        );
    }

    if hidden > 0 {
        println!("... {} more (use --limit 0 to show all)", hidden);
    }
}

fn report_warnings(rx: &mut broadcast::Receiver<StoreWarning>) {
    while let Ok(warning) = rx.try_recv() {
        match warning {
            StoreWarning::HydrationFailed { key, message } => {
                eprintln!("⚠️  Saved '{}' could not be read and was ignored: {}", key, message)
            }
            StoreWarning::WriteFailed { key, message } => {
                eprintln!("⚠️  '{}' was not saved: {}", key, message)
            }
        }
    }
}
