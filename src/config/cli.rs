use crate::config::toml_config::CatalogConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "campus-catalog")]
#[command(about = "Browse the university directory, filter by country and keep favorites")]
pub struct CliArgs {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, default_value = "catalog.toml")]
    pub config: String,

    /// Override source.endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override storage.path
    #[arg(long)]
    pub data_file: Option<String>,

    /// Override source.timeout_seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Select and remember a country
    #[arg(long, conflicts_with = "clear_country")]
    pub country: Option<String>,

    /// Forget the remembered country and show all countries
    #[arg(long)]
    pub clear_country: bool,

    /// Filter the list by name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Toggle the favorite status of the university with this exact name
    #[arg(long)]
    pub toggle_favorite: Vec<String>,

    /// Print the favorites instead of the catalog
    #[arg(long)]
    pub favorites: bool,

    /// Print the country list
    #[arg(long)]
    pub countries: bool,

    /// Maximum number of rows to print (0 = all)
    #[arg(long, default_value = "50")]
    pub limit: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Command-line values win over the configuration file.
    pub fn apply_overrides(&self, config: &mut CatalogConfig) {
        if let Some(endpoint) = &self.endpoint {
            tracing::debug!("Endpoint overridden to {}", endpoint);
            config.source.endpoint = endpoint.clone();
        }
        if let Some(path) = &self.data_file {
            tracing::debug!("Storage path overridden to {}", path);
            config.storage.path = path.clone();
        }
        if let Some(timeout) = self.timeout {
            config.source.timeout_seconds = Some(timeout);
        }
    }

    /// The selection change requested on the command line, if any.
    pub fn country_change(&self) -> Option<&str> {
        if self.clear_country {
            Some("")
        } else {
            self.country.as_deref()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_file_values() {
        let args = CliArgs::parse_from([
            "campus-catalog",
            "--endpoint",
            "https://example.com/search",
            "--data-file",
            "/tmp/state.json",
            "--timeout",
            "7",
        ]);
        let mut config = CatalogConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.source.endpoint, "https://example.com/search");
        assert_eq!(config.storage.path, "/tmp/state.json");
        assert_eq!(config.source.timeout_seconds, Some(7));
    }

    #[test]
    fn test_country_change() {
        let args = CliArgs::parse_from(["campus-catalog", "--country", "Canada"]);
        assert_eq!(args.country_change(), Some("Canada"));

        let args = CliArgs::parse_from(["campus-catalog", "--clear-country"]);
        assert_eq!(args.country_change(), Some(""));

        let args = CliArgs::parse_from(["campus-catalog"]);
        assert_eq!(args.country_change(), None);
    }

    #[test]
    fn test_repeated_toggle_flags() {
        let args = CliArgs::parse_from([
            "campus-catalog",
            "--toggle-favorite",
            "Alpha U",
            "--toggle-favorite",
            "Beta U",
        ]);
        assert_eq!(args.toggle_favorite, vec!["Alpha U", "Beta U"]);
    }
}
