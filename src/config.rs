use std::env;

/// Fallback signing secret for local development only.
const LOCAL_SESSION_SECRET: &str = "pos-portal-local-session-secret-change-me";

/// Bootstrap account seeded into an empty local store.
const LOCAL_ADMIN_USERNAME: &str = "admin";
const LOCAL_ADMIN_PASSWORD: &str = "admin123";

/// Default lifetime of a session token, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 8;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared read-only with every request through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` is only allowed locally and selects the
    // in-memory repository.
    pub db_url: Option<String>,
    // Runtime environment marker. Controls the `Secure` cookie flag and log format.
    pub env: Env,
    // HMAC secret used to sign and verify session tokens.
    pub session_secret: String,
    // Fixed session lifetime measured from issuance.
    pub session_ttl_hours: i64,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Credentials of the ADMIN account created at startup if it does not exist yet.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

/// Env
///
/// Runtime context: local development conveniences vs. hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        *self == Env::Production
    }
}

impl Default for AppConfig {
    /// Test-friendly configuration that never touches the environment.
    fn default() -> Self {
        Self {
            db_url: None,
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            bind_addr: "0.0.0.0:3000".to_string(),
            admin_username: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables. Locally the bootstrap admin
    /// falls back to `admin` / `admin123`; in production it is only created when
    /// `ADMIN_USERNAME` and `ADMIN_PASSWORD` are both set.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `SESSION_SECRET` is missing, so the
    /// service never starts with an in-memory store or a guessable signing key.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_SESSION_TTL_HOURS);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                session_secret: env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string()),
                session_ttl_hours,
                bind_addr,
                admin_username: admin_username.or_else(|| Some(LOCAL_ADMIN_USERNAME.to_string())),
                admin_password: admin_password.or_else(|| Some(LOCAL_ADMIN_PASSWORD.to_string())),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                session_secret: env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
                session_ttl_hours,
                bind_addr,
                admin_username,
                admin_password,
            },
        }
    }
}
