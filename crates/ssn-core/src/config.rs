use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from)
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("SSN_ENV", "development"))?;

    let bind_addr = or_default("SSN_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "SSN_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default("SSN_LOG_LEVEL", "info");
    let directory_path = optional_path("SSN_DIRECTORY_PATH");

    let api_base_url = or_default("SSN_API_BASE_URL", "http://localhost:3000");
    let postcode_api_url = or_default("SSN_POSTCODE_API_URL", "https://api.postcodes.io");
    for (var, value) in [
        ("SSN_API_BASE_URL", &api_base_url),
        ("SSN_POSTCODE_API_URL", &postcode_api_url),
    ] {
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected an http(s) URL, got '{value}'"),
            });
        }
    }

    let query_timeout_secs = parse_u64("SSN_QUERY_TIMEOUT_SECS", "15")?;
    if query_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SSN_QUERY_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let cache_capacity = parse_usize("SSN_CACHE_CAPACITY", "50")?;
    let cache_ttl_secs = parse_u64("SSN_CACHE_TTL_SECS", "300")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        directory_path,
        api_base_url,
        postcode_api_url,
        query_timeout_secs,
        cache_capacity,
        cache_ttl_secs,
        categories_path: optional_path("SSN_CATEGORIES_PATH"),
        locations_path: optional_path("SSN_LOCATIONS_PATH"),
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SSN_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn parse_environment_known_values() {
        assert_eq!(
            parse_environment("development").unwrap(),
            Environment::Development
        );
        assert_eq!(parse_environment("test").unwrap(), Environment::Test);
        assert_eq!(
            parse_environment("production").unwrap(),
            Environment::Production
        );
    }

    #[test]
    fn parse_environment_unknown_fails() {
        let err = parse_environment("staging").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "SSN_ENV"));
    }

    #[test]
    fn build_app_config_defaults_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults are valid");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.directory_path.is_none());
        assert_eq!(cfg.api_base_url, "http://localhost:3000");
        assert_eq!(cfg.postcode_api_url, "https://api.postcodes.io");
        assert_eq!(cfg.query_timeout_secs, 15);
        assert_eq!(cfg.cache_capacity, 50);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert!(cfg.categories_path.is_none());
        assert!(cfg.locations_path.is_none());
    }

    #[test]
    fn build_app_config_reads_directory_path() {
        let mut map = HashMap::new();
        map.insert("SSN_DIRECTORY_PATH", "./data/directory.json");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.directory_path.as_deref(),
            Some(std::path::Path::new("./data/directory.json"))
        );
    }

    #[test]
    fn build_app_config_treats_blank_directory_path_as_absent() {
        let mut map = HashMap::new();
        map.insert("SSN_DIRECTORY_PATH", "   ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.directory_path.is_none());
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map = HashMap::new();
        map.insert("SSN_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SSN_BIND_ADDR"),
            "expected InvalidEnvVar(SSN_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_http_base_url() {
        let mut map = HashMap::new();
        map.insert("SSN_API_BASE_URL", "ftp://example.com");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SSN_API_BASE_URL"),
            "expected InvalidEnvVar(SSN_API_BASE_URL), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_query_timeout_override() {
        let mut map = HashMap::new();
        map.insert("SSN_QUERY_TIMEOUT_SECS", "30");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.query_timeout_secs, 30);
    }

    #[test]
    fn build_app_config_rejects_zero_timeout() {
        let mut map = HashMap::new();
        map.insert("SSN_QUERY_TIMEOUT_SECS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SSN_QUERY_TIMEOUT_SECS"),
            "expected InvalidEnvVar(SSN_QUERY_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_cache_capacity_invalid() {
        let mut map = HashMap::new();
        map.insert("SSN_CACHE_CAPACITY", "lots");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SSN_CACHE_CAPACITY"),
            "expected InvalidEnvVar(SSN_CACHE_CAPACITY), got: {result:?}"
        );
    }
}
