use anyhow::{Context, Result, anyhow};
use axum_extra::extract::cookie::Key;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::SessionPolicy;
use platform_db::DatabaseSettings;
use products_hr::CompanyInfo;
use products_hr::seed::SeedAdmin;

/// Minimum decoded length of `COOKIE_SECRET_BASE64`; private cookies need a 64-byte master key.
pub const COOKIE_SECRET_MIN_BYTES: usize = 64;

#[derive(Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub cookie_key: Key,
    pub cookie_secure: bool,
    pub session: SessionPolicy,
    pub company: CompanyInfo,
    pub seed_admin: SeedAdmin,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database.url)
            .field("cookie_secure", &self.cookie_secure)
            .field("session_ttl", &self.session.ttl())
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut database = DatabaseSettings::default();
        if let Some(url) = get("DATABASE_URL") {
            database.url = url;
        }
        if let Some(raw) = get("DB_MAX_CONNECTIONS") {
            database.max_connections = raw
                .parse()
                .with_context(|| format!("invalid DB_MAX_CONNECTIONS {raw:?}"))?;
        }
        database.validate()?;

        let cookie_secret = get("COOKIE_SECRET_BASE64").context("COOKIE_SECRET_BASE64 missing")?;
        let cookie_key = cookie_key(&cookie_secret)?;

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_flag(&raw).with_context(|| format!("invalid COOKIE_SECURE {raw:?}"))?,
            None => true,
        };

        let session = match get("SESSION_TTL_HOURS") {
            Some(raw) => {
                let hours: i64 = raw
                    .parse()
                    .with_context(|| format!("invalid SESSION_TTL_HOURS {raw:?}"))?;
                SessionPolicy::from_hours(hours)?
            }
            None => SessionPolicy::default(),
        };

        let defaults = CompanyInfo::default();
        let company = CompanyInfo {
            name: get("COMPANY_NAME").unwrap_or(defaults.name),
            address: get("COMPANY_ADDRESS").unwrap_or(defaults.address),
        };

        let seed_defaults = SeedAdmin::default();
        let seed_admin = SeedAdmin {
            email: get("SEED_ADMIN_EMAIL").unwrap_or(seed_defaults.email),
            password: get("SEED_ADMIN_PASSWORD").unwrap_or(seed_defaults.password),
        };

        Ok(Self {
            database,
            cookie_key,
            cookie_secure,
            session,
            company,
            seed_admin,
        })
    }
}

fn cookie_key(encoded: &str) -> Result<Key> {
    let bytes = STANDARD
        .decode(encoded)
        .context("invalid COOKIE_SECRET_BASE64")?;
    if bytes.len() < COOKIE_SECRET_MIN_BYTES {
        return Err(anyhow!(
            "COOKIE_SECRET_BASE64 must decode to at least {COOKIE_SECRET_MIN_BYTES} bytes"
        ));
    }
    Key::try_from(bytes.as_slice()).map_err(|err| anyhow!("unusable cookie secret: {err}"))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
