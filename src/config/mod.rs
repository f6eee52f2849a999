use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub airtable: AirtableConfig,
    pub api: ApiConfig,
    pub tables: TableConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub endpoint_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_page_size: usize,
    pub default_page_size: usize,
    pub enable_request_logging: bool,
}

/// Names of the tables in the Airtable base. Overridable so staging bases
/// can use copies without renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub access_tokens: String,
    pub collaborateurs: String,
    pub villes: String,
    pub etablissements: String,
    pub categories: String,
    pub agenda: String,
    pub factures: String,
    pub publications: String,
    pub creneaux: String,
    pub tickets: String,
    pub ressources: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            access_tokens: "Access tokens".to_string(),
            collaborateurs: "Collaborateurs".to_string(),
            villes: "Villes EPICU".to_string(),
            etablissements: "Établissements".to_string(),
            categories: "Catégories".to_string(),
            agenda: "Agenda".to_string(),
            factures: "Factures".to_string(),
            publications: "Publications".to_string(),
            creneaux: "Créneaux".to_string(),
            tickets: "Tickets".to_string(),
            ressources: "Ressources".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, then specific env var overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Airtable credentials are always environment-provided
        if let Ok(v) = env::var("AIRTABLE_API_KEY") {
            self.airtable.api_key = v;
        }
        if let Ok(v) = env::var("AIRTABLE_BASE_ID") {
            self.airtable.base_id = v;
        }
        if let Ok(v) = env::var("AIRTABLE_ENDPOINT_URL") {
            self.airtable.endpoint_url = v;
        }
        if let Ok(v) = env::var("AIRTABLE_REQUEST_TIMEOUT_SECS") {
            self.airtable.request_timeout_secs =
                v.parse().unwrap_or(self.airtable.request_timeout_secs);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging =
                v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Table name overrides
        if let Ok(v) = env::var("TABLE_ACCESS_TOKENS") {
            self.tables.access_tokens = v;
        }
        if let Ok(v) = env::var("TABLE_COLLABORATEURS") {
            self.tables.collaborateurs = v;
        }
        if let Ok(v) = env::var("TABLE_VILLES") {
            self.tables.villes = v;
        }
        if let Ok(v) = env::var("TABLE_ETABLISSEMENTS") {
            self.tables.etablissements = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            airtable: AirtableConfig {
                api_key: String::new(),
                base_id: String::new(),
                endpoint_url: "https://api.airtable.com".to_string(),
                request_timeout_secs: 30,
            },
            api: ApiConfig {
                max_page_size: 100,
                default_page_size: 10,
                enable_request_logging: true,
            },
            tables: TableConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            airtable: AirtableConfig {
                api_key: String::new(),
                base_id: String::new(),
                endpoint_url: "https://api.airtable.com".to_string(),
                request_timeout_secs: 15,
            },
            api: ApiConfig {
                max_page_size: 100,
                default_page_size: 10,
                enable_request_logging: false,
            },
            tables: TableConfig::default(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.api.max_page_size, 100);
        assert_eq!(config.api.default_page_size, 10);
        assert_eq!(config.tables.villes, "Villes EPICU");
    }

    #[test]
    fn production_disables_request_logging() {
        let config = AppConfig::production();
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.airtable.request_timeout_secs, 15);
    }
}
