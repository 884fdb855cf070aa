use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub mongo_url: String,
    pub db_name: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub upload_dir: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "5000"),
            mongo_url: try_load("MONGO_URL", "mongodb://localhost:27017"),
            db_name: try_load("DB_NAME", "shop"),
            jwt_secret: read_secret("JWT_SECRET"),
            token_ttl_days: try_load("TOKEN_TTL_DAYS", "30"),
            upload_dir: try_load("UPLOAD_DIR", "uploads"),
            allowed_origins: try_load::<CommaList>("ALLOWED_ORIGINS", "http://localhost:3000").0,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            mongo_url: String::new(),
            db_name: String::new(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_days: 30,
            upload_dir: "uploads".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

struct CommaList(Vec<String>);

impl FromStr for CommaList {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        ))
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Secrets come from files under `/run/secrets` when deployed, with a plain
/// env var fallback for local runs.
fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            var(secret_name)
        })
        .expect("Secrets misconfigured!")
}

#[cfg(test)]
mod tests {
    use super::CommaList;

    #[test]
    fn comma_list_trims_and_drops_empties() {
        let parsed: CommaList = "http://a.test, http://b.test,,".parse().unwrap();
        assert_eq!(parsed.0, vec!["http://a.test", "http://b.test"]);
    }
}
