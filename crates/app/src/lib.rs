//! Snipr application composition root
//!
//! Builds the vendor adapters from the environment and composes the domain
//! routers into a single application.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use snipr_auth::{AuthBackend, AuthConfig};
use snipr_common::config::{env_opt, Config};
use snipr_email::{EmailConfig, EmailService, EmailServiceFactory};
use snipr_llm::{LlmConfig, LlmService, LlmServiceFactory};
use snipr_market::{MarketConfig, MarketDataFactory, MarketDataService};
use snipr_scraper::{ScraperConfig, ScraperFactory, TimelineScraper};
use snipr_snipes::{SnipeAnalyzer, SnipesRepositories, SnipesState};
use snipr_support::{
    ConversationStore, FeatureRequestNotifier, KnowledgeBase, SupportChatService, SupportConfig,
    SupportState, TranscriptWriter,
};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// `/analyze` requests each client address may burst
const ANALYZE_PER_MINUTE: u32 = 10;

/// One `/analyze` slot refills every six seconds, ten per minute
const ANALYZE_REFILL: Duration = Duration::from_secs(60 / ANALYZE_PER_MINUTE as u64);

/// How often idle client entries are dropped from the limiter
const LIMITER_SWEEP: Duration = Duration::from_secs(60);

/// Vendor adapters the domains depend on
#[derive(Clone)]
pub struct AppServices {
    /// `None` when no provider key is configured
    pub llm: Option<Arc<dyn LlmService>>,
    pub scraper: Arc<dyn TimelineScraper>,
    pub market: Arc<dyn MarketDataService>,
    pub email: Arc<dyn EmailService>,
    pub notify_from: Option<String>,
    pub notify_to: Option<String>,
}

impl AppServices {
    /// Create every adapter from environment configuration
    pub async fn from_env() -> Result<Self, anyhow::Error> {
        let llm = match LlmServiceFactory::create(LlmConfig::from_env()?) {
            Ok(service) => Some(Arc::from(service)),
            Err(e) => {
                tracing::warn!(error = %e, "LLM service unavailable; analysis and support chat are degraded");
                None
            }
        };

        let scraper = Arc::from(ScraperFactory::create(ScraperConfig::from_env()?)?);
        let market = Arc::from(MarketDataFactory::create(MarketConfig::from_env()?)?);

        let email_config = EmailConfig::from_env()?;
        let notify_from = email_config.notify_from.clone();
        let notify_to = email_config.notify_to.clone();
        let email = Arc::from(EmailServiceFactory::create(email_config).await?);

        Ok(Self {
            llm,
            scraper,
            market,
            email,
            notify_from,
            notify_to,
        })
    }
}

/// Domain settings that are not tied to a vendor
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub analysis_model: String,
    pub support: SupportConfig,
    pub knowledge_dir: PathBuf,
    pub chat_log_dir: PathBuf,
    pub idle_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            analysis_model: snipr_snipes::domain::analyzer::DEFAULT_ANALYSIS_MODEL.to_string(),
            support: SupportConfig::default(),
            knowledge_dir: PathBuf::from("knowledge"),
            chat_log_dir: PathBuf::from("chat_logs"),
            idle_timeout: snipr_support::store::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl AppSettings {
    /// Load settings; model defaults only apply to the OpenAI provider
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let openai = env_opt("LLM_PROVIDER").map_or(true, |p| p == "openai");
        // An empty model means "the provider's default"
        let model_or = |key: &str, openai_default: String| {
            env_opt(key).unwrap_or(if openai { openai_default } else { String::new() })
        };

        Self {
            analysis_model: model_or("ANALYSIS_MODEL", defaults.analysis_model),
            support: SupportConfig {
                model: model_or("SUPPORT_MODEL", defaults.support.model),
                support_email: env_opt("SUPPORT_EMAIL").unwrap_or(defaults.support.support_email),
            },
            knowledge_dir: env_opt("KNOWLEDGE_DIR").map_or(defaults.knowledge_dir, PathBuf::from),
            chat_log_dir: env_opt("CHAT_LOG_DIR").map_or(defaults.chat_log_dir, PathBuf::from),
            idle_timeout: env_opt("SUPPORT_IDLE_SECONDS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.idle_timeout, Duration::from_secs),
        }
    }
}

/// Create the main application router from environment configuration
pub async fn create_app(config: Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let services = AppServices::from_env().await?;
    let settings = AppSettings::from_env();
    build_router(&config, pool, services, settings)
}

/// Compose domain routers with shared infrastructure routes and middleware.
///
/// Must be called from within a Tokio runtime. `/analyze` is limited per
/// peer address, so the server has to be run with connect info.
pub fn build_router(
    config: &Config,
    pool: PgPool,
    services: AppServices,
    settings: AppSettings,
) -> Result<Router, anyhow::Error> {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let snipes_state = SnipesState {
        repos: SnipesRepositories::new(pool),
        auth,
        analyzer: SnipeAnalyzer::new(
            services.scraper,
            services.llm.clone(),
            services.market,
            settings.analysis_model,
        ),
    };

    let support_state = SupportState {
        chat: SupportChatService::new(
            services.llm,
            ConversationStore::new(
                TranscriptWriter::new(settings.chat_log_dir),
                settings.idle_timeout,
            ),
            Arc::new(KnowledgeBase::new(settings.knowledge_dir)),
            FeatureRequestNotifier::new(services.email, services.notify_from, services.notify_to),
            settings.support,
        ),
    };

    let governor_conf = GovernorConfigBuilder::default()
        .period(ANALYZE_REFILL)
        .burst_size(ANALYZE_PER_MINUTE)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid /analyze rate limit configuration"))?;

    let limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(LIMITER_SWEEP);
        loop {
            sweep.tick().await;
            limiter.retain_recent();
        }
    });

    let snipes = snipr_snipes::routes()
        .layer(GovernorLayer::new(governor_conf))
        .layer(middleware::map_response(rate_limit_envelope))
        .with_state(snipes_state);

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/", get(|| async { "Snipr API v0.0.1-SNAPSHOT" }))
        .merge(snipes)
        .merge(snipr_support::routes().with_state(support_state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(&config.cors_allowed_origins)))
}

/// CORS policy from a comma-separated origin list; `*` allows any origin
/// without credentials.
pub fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.trim() == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(origins).allow_credentials(true)
}

/// The limiter answers 429 in plain text; callers expect the error envelope
async fn rate_limit_envelope(response: Response) -> Response {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return snipr_common::Error::RateLimit("Too many requests, slow down.".to_string())
            .into_response();
    }
    response
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
