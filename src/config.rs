use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Access policies that differ between deployments.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// The first account ever registered becomes an admin.
    pub bootstrap_first_admin: bool,
    /// Creating sweets requires the admin role instead of any login.
    pub admin_only_sweet_create: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub policy: PolicyConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sweetshop.db".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "sweetshop".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "sweetshop-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 30),
        };
        let hash = HashConfig {
            memory_kib: env_parse("HASH_MEMORY_KIB", 19 * 1024),
            iterations: env_parse("HASH_ITERATIONS", 2),
            parallelism: env_parse("HASH_PARALLELISM", 1),
        };
        let policy = PolicyConfig {
            bootstrap_first_admin: env_flag("BOOTSTRAP_FIRST_ADMIN", true),
            admin_only_sweet_create: env_flag("ADMIN_ONLY_SWEET_CREATE", false),
        };
        let config = Self {
            database_url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", 5),
            jwt,
            hash,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.jwt.ttl_minutes > 0,
            "JWT_TTL_MINUTES must be positive, got {}",
            self.jwt.ttl_minutes
        );
        anyhow::ensure!(!self.jwt.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(self.max_connections > 0, "DB_MAX_CONNECTIONS must be positive");
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => parse_flag(&v).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
