//! Short link creation and resolution service.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::RateLimiter;
use crate::domain::entities::{CollisionPolicy, NewShortLink, QuotaStatus, ShortLink};
use crate::domain::repositories::MappingRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_alias};
use crate::utils::url_validator::{UrlValidationError, check_shortenable};
use serde_json::json;
use tracing::{debug, info};

/// Attempts at drawing a free code under [`CollisionPolicy::Reject`].
const MAX_ATTEMPTS: usize = 10;

/// Tunables of the shorten workflow.
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Service domain; prefix of every short link and the self-reference guard.
    pub domain: String,
    pub default_expiry: Duration,
    pub max_expiry: Duration,
    pub code_length: usize,
    pub collision_policy: CollisionPolicy,
}

impl LinkSettings {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            default_expiry: Duration::from_secs(24 * 60 * 60),
            max_expiry: Duration::from_secs(365 * 24 * 60 * 60),
            code_length: 5,
            collision_policy: CollisionPolicy::default(),
        }
    }
}

/// A created link together with the caller's quota after the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub link: ShortLink,
    pub quota: QuotaStatus,
}

/// Service for creating and resolving short links.
///
/// Link creation is gated by the [`RateLimiter`]; resolution is not.
pub struct LinkService {
    mappings: Arc<dyn MappingRepository>,
    rate_limiter: Arc<RateLimiter>,
    settings: LinkSettings,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        mappings: Arc<dyn MappingRepository>,
        rate_limiter: Arc<RateLimiter>,
        settings: LinkSettings,
    ) -> Self {
        Self {
            mappings,
            rate_limiter,
            settings,
        }
    }

    /// Shortens `request.url` on behalf of `client_id`.
    ///
    /// # Flow
    ///
    /// 1. Validate the URL and reject links back into the service
    /// 2. Resolve the expiry (zero or absent → default)
    /// 3. Validate the custom alias, if any
    /// 4. Charge the client's quota
    /// 5. Generate a code (or use the alias) and write the mapping
    ///
    /// Input errors are raised before the quota is charged.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed URL, alias or expiry
    /// - [`AppError::SelfReferential`] if the URL contains the service domain
    /// - [`AppError::QuotaExhausted`] once the client's window is used up
    /// - [`AppError::Conflict`] if the alias is taken, or no free code was
    ///   found under [`CollisionPolicy::Reject`]
    /// - [`AppError::StoreUnavailable`] on store failures
    pub async fn shorten(
        &self,
        request: NewShortLink,
        client_id: &str,
    ) -> Result<Shortened, AppError> {
        let input = request.url.trim();

        // Store the serialized form: control characters stripped, non-ASCII
        // percent-encoded, so it is always a valid `Location` value.
        let url = check_shortenable(input, &self.settings.domain)
            .map_err(|e| match e {
                UrlValidationError::SelfReferential => AppError::self_referential(
                    e.to_string(),
                    json!({ "domain": self.settings.domain }),
                ),
                other => AppError::bad_request(
                    "Invalid URL",
                    json!({ "url": input, "reason": other.to_string() }),
                ),
            })?
            .to_string();

        let expiry = self.resolve_expiry(request.expiry)?;

        let alias = request
            .custom_alias
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty());
        if let Some(alias) = &alias {
            validate_alias(alias)?;
        }

        let quota = self.rate_limiter.check_and_consume(client_id).await?;

        let link = match alias {
            Some(alias) => self.write_alias(alias, &url, expiry).await?,
            None => self.write_generated(&url, expiry).await?,
        };

        info!(
            "Created short link {} -> {} (client: {}, remaining: {})",
            link.short_url, link.target_url, client_id, quota.remaining
        );
        metrics::counter!("shortener_links_created_total").increment(1);

        Ok(Shortened { link, quota })
    }

    /// Resolves a short code to its target URL.
    ///
    /// # Errors
    ///
    /// - [`AppError::MissingParameter`] if `code` is empty
    /// - [`AppError::NotFound`] if no live mapping exists
    /// - [`AppError::StoreUnavailable`] on store failures
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::missing_parameter(
                "Please provide a short code",
                json!({}),
            ));
        }

        let key = self.short_url(code);

        match self.mappings.get(&key).await? {
            Some(target) => {
                debug!("Resolved {} -> {}", key, target);
                metrics::counter!("shortener_resolve_total", "result" => "hit").increment(1);
                Ok(target)
            }
            None => {
                debug!("No mapping for {}", key);
                metrics::counter!("shortener_resolve_total", "result" => "miss").increment(1);
                Err(AppError::not_found(
                    "This URL redirect was not valid",
                    json!({ "code": code }),
                ))
            }
        }
    }

    /// Remaining lifetime of the mapping behind `code`, `None` if absent.
    pub async fn remaining_lifetime(&self, code: &str) -> Result<Option<Duration>, AppError> {
        self.mappings.ttl(&self.short_url(code)).await
    }

    /// Builds the absolute short link for `code`; also its store key.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.settings.domain.trim_end_matches('/'), code)
    }

    /// Checks that the mapping store answers.
    pub async fn store_healthy(&self) -> bool {
        self.mappings.health_check().await
    }

    fn resolve_expiry(&self, requested: Option<Duration>) -> Result<Duration, AppError> {
        match requested {
            None => Ok(self.settings.default_expiry),
            Some(expiry) if expiry.is_zero() => Ok(self.settings.default_expiry),
            Some(expiry) if expiry > self.settings.max_expiry => Err(AppError::bad_request(
                "Expiry is too long",
                json!({
                    "expiry_seconds": expiry.as_secs(),
                    "max_expiry_seconds": self.settings.max_expiry.as_secs(),
                }),
            )),
            Some(expiry) => Ok(expiry),
        }
    }

    /// Writes a user-chosen alias; never replaces an existing mapping.
    async fn write_alias(
        &self,
        alias: String,
        url: &str,
        expiry: Duration,
    ) -> Result<ShortLink, AppError> {
        let short_url = self.short_url(&alias);

        if !self.mappings.insert(&short_url, url, expiry, false).await? {
            return Err(AppError::conflict(
                "Custom short URL is already in use",
                json!({ "custom-short-url": alias }),
            ));
        }

        Ok(ShortLink::new(alias, short_url, url.to_owned(), expiry))
    }

    /// Writes a mapping under a freshly generated code.
    ///
    /// Under [`CollisionPolicy::Overwrite`] the first code is written
    /// unconditionally; under [`CollisionPolicy::Reject`] taken codes are
    /// redrawn up to [`MAX_ATTEMPTS`] times.
    async fn write_generated(&self, url: &str, expiry: Duration) -> Result<ShortLink, AppError> {
        let overwrite = self.settings.collision_policy.allows_overwrite();

        for _ in 0..MAX_ATTEMPTS {
            let code = generate_code(self.settings.code_length)?;
            let short_url = self.short_url(&code);

            if self
                .mappings
                .insert(&short_url, url, expiry, overwrite)
                .await?
            {
                return Ok(ShortLink::new(code, short_url, url.to_owned(), expiry));
            }

            debug!("Code collision on {}, drawing another", short_url);
        }

        Err(AppError::conflict(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions", "attempts": MAX_ATTEMPTS }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::QuotaPolicy;
    use crate::domain::entities::ConsumeOutcome;
    use crate::domain::repositories::{MockMappingRepository, MockQuotaRepository};
    use crate::infrastructure::store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOMAIN: &str = "short.ly";

    fn granting_quota(remaining: i64) -> MockQuotaRepository {
        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().returning(move |_, _, _| {
            Ok(ConsumeOutcome::Granted(QuotaStatus::new(
                remaining,
                Duration::from_secs(1800),
            )))
        });
        quota
    }

    fn service_with(
        mappings: MockMappingRepository,
        quota: MockQuotaRepository,
        settings: LinkSettings,
    ) -> LinkService {
        let limiter = Arc::new(RateLimiter::new(Arc::new(quota), QuotaPolicy::default()));
        LinkService::new(Arc::new(mappings), limiter, settings)
    }

    fn in_memory_service() -> LinkService {
        let store = Arc::new(InMemoryStore::new());
        let limiter = Arc::new(RateLimiter::new(store.clone(), QuotaPolicy::default()));
        LinkService::new(store, limiter, LinkSettings::new(DOMAIN))
    }

    #[tokio::test]
    async fn test_shorten_success() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .withf(|key, target, ttl, overwrite| {
                key.starts_with("short.ly/")
                    && key.len() == "short.ly/".len() + 5
                    && target == "https://example.com/page"
                    && *ttl == Duration::from_secs(24 * 60 * 60)
                    && *overwrite
            })
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let result = service
            .shorten(NewShortLink::new("https://example.com/page"), "10.0.0.1")
            .await
            .unwrap();

        assert_eq!(result.link.target_url, "https://example.com/page");
        assert_eq!(result.link.code.len(), 5);
        assert_eq!(result.link.short_url, format!("short.ly/{}", result.link.code));
        assert_eq!(result.quota.remaining, 9);
        assert_eq!(result.quota.reset_in_minutes(), 30);
    }

    #[tokio::test]
    async fn test_shorten_invalid_url_does_not_charge_quota() {
        let mappings = MockMappingRepository::new();
        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().times(0);

        let service = service_with(mappings, quota, LinkSettings::new(DOMAIN));

        let err = service
            .shorten(NewShortLink::new("not-a-url"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shorten_self_referential() {
        let mappings = MockMappingRepository::new();
        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().times(0);

        let service = service_with(mappings, quota, LinkSettings::new(DOMAIN));

        let err = service
            .shorten(NewShortLink::new("https://short.ly/abcde"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SelfReferential { .. }));
    }

    #[tokio::test]
    async fn test_shorten_self_referential_even_when_exhausted() {
        let service = in_memory_service();

        for _ in 0..10 {
            service
                .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
                .await
                .unwrap();
        }

        let err = service
            .shorten(NewShortLink::new("https://short.ly/x"), "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SelfReferential { .. }));

        let err = service
            .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExhausted { .. }));
    }

    #[tokio::test]
    async fn test_shorten_honors_explicit_expiry() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .withf(|_, _, ttl, _| *ttl == Duration::from_secs(600))
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let result = service
            .shorten(
                NewShortLink::new("https://example.com").with_expiry(Duration::from_secs(600)),
                "10.0.0.1",
            )
            .await
            .unwrap();

        assert_eq!(result.link.expiry, Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_shorten_zero_expiry_uses_default() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .withf(|_, _, ttl, _| *ttl == Duration::from_secs(24 * 60 * 60))
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        service
            .shorten(
                NewShortLink::new("https://example.com").with_expiry(Duration::ZERO),
                "10.0.0.1",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shorten_rejects_expiry_above_max() {
        let mappings = MockMappingRepository::new();
        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().times(0);

        let service = service_with(mappings, quota, LinkSettings::new(DOMAIN));

        let err = service
            .shorten(
                NewShortLink::new("https://example.com")
                    .with_expiry(Duration::from_secs(400 * 24 * 60 * 60)),
                "10.0.0.1",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shorten_quota_exhausted_writes_nothing() {
        let mut mappings = MockMappingRepository::new();
        mappings.expect_insert().times(0);

        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().times(1).returning(|_, _, _| {
            Ok(ConsumeOutcome::Exhausted(QuotaStatus::new(
                0,
                Duration::from_secs(60),
            )))
        });

        let service = service_with(mappings, quota, LinkSettings::new(DOMAIN));

        let err = service
            .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExhausted { .. }));
    }

    #[tokio::test]
    async fn test_shorten_with_custom_alias() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .withf(|key, _, _, overwrite| key == "short.ly/promo-2025" && !*overwrite)
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let result = service
            .shorten(
                NewShortLink::new("https://example.com").with_alias("promo-2025"),
                "10.0.0.1",
            )
            .await
            .unwrap();

        assert_eq!(result.link.code, "promo-2025");
        assert_eq!(result.link.short_url, "short.ly/promo-2025");
    }

    #[tokio::test]
    async fn test_shorten_blank_alias_is_ignored() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .times(1)
            .returning(|_, _, _, _| Ok(true));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let result = service
            .shorten(
                NewShortLink::new("https://example.com").with_alias("  "),
                "10.0.0.1",
            )
            .await
            .unwrap();

        assert_eq!(result.link.code.len(), 5);
    }

    #[tokio::test]
    async fn test_shorten_custom_alias_conflict() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .times(1)
            .returning(|_, _, _, _| Ok(false));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let err = service
            .shorten(
                NewShortLink::new("https://example.com").with_alias("taken"),
                "10.0.0.1",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_shorten_invalid_alias_does_not_charge_quota() {
        let mappings = MockMappingRepository::new();
        let mut quota = MockQuotaRepository::new();
        quota.expect_consume().times(0);

        let service = service_with(mappings, quota, LinkSettings::new(DOMAIN));

        let err = service
            .shorten(
                NewShortLink::new("https://example.com").with_alias("health"),
                "10.0.0.1",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shorten_reject_policy_redraws_on_collision() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .withf(|_, _, _, overwrite| !*overwrite)
            .times(3)
            .returning(move |_, _, _, _| Ok(counter.fetch_add(1, Ordering::SeqCst) == 2));

        let mut settings = LinkSettings::new(DOMAIN);
        settings.collision_policy = CollisionPolicy::Reject;

        let service = service_with(mappings, granting_quota(9), settings);

        let result = service
            .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shorten_reject_policy_gives_up() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .times(MAX_ATTEMPTS)
            .returning(|_, _, _, _| Ok(false));

        let mut settings = LinkSettings::new(DOMAIN);
        settings.collision_policy = CollisionPolicy::Reject;

        let service = service_with(mappings, granting_quota(9), settings);

        let err = service
            .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_shorten_store_failure_propagates() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_insert()
            .times(1)
            .returning(|_, _, _, _| Err(AppError::store_unavailable("Store error", json!({}))));

        let service = service_with(mappings, granting_quota(9), LinkSettings::new(DOMAIN));

        let err = service
            .shorten(NewShortLink::new("https://example.com"), "10.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_resolve_empty_code() {
        let service = in_memory_service();

        let err = service.resolve("").await.unwrap_err();
        assert!(matches!(err, AppError::MissingParameter { .. }));
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let service = in_memory_service();

        let err = service.resolve("nope1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_uses_domain_prefixed_key() {
        let mut mappings = MockMappingRepository::new();
        mappings
            .expect_get()
            .withf(|key| key == "short.ly/abcde")
            .times(1)
            .returning(|_| Ok(Some("https://example.com/page".to_string())));

        let service = service_with(
            mappings,
            MockQuotaRepository::new(),
            LinkSettings::new("short.ly/"),
        );

        let target = service.resolve("abcde").await.unwrap();
        assert_eq!(target, "https://example.com/page");
    }

    #[tokio::test]
    async fn test_shorten_then_resolve_roundtrip() {
        let service = in_memory_service();

        for url in [
            "https://example.com/page",
            "http://example.org/a/b?c=d&e=f",
            "https://sub.example.net:8443/path#frag",
        ] {
            let result = service
                .shorten(NewShortLink::new(url), "10.0.0.1")
                .await
                .unwrap();
            let target = service.resolve(&result.link.code).await.unwrap();
            assert_eq!(target, url);
        }
    }

    #[tokio::test]
    async fn test_shorten_stores_serialized_url() {
        let service = in_memory_service();

        for (input, stored) in [
            ("https://example.com/a\nb", "https://example.com/ab"),
            ("https://example.com/a\r\tb", "https://example.com/ab"),
            ("https://example.com/café", "https://example.com/caf%C3%A9"),
            ("https://EXAMPLE.com", "https://example.com/"),
        ] {
            let result = service
                .shorten(NewShortLink::new(input), "10.0.0.1")
                .await
                .unwrap();

            assert_eq!(result.link.target_url, stored);
            let target = service.resolve(&result.link.code).await.unwrap();
            assert_eq!(target, stored);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mapping_expires_after_expiry() {
        let service = in_memory_service();
        let expiry = Duration::from_secs(10 * 60);

        let result = service
            .shorten(
                NewShortLink::new("https://example.com").with_expiry(expiry),
                "10.0.0.1",
            )
            .await
            .unwrap();

        tokio::time::advance(expiry - Duration::from_secs(1)).await;
        assert!(service.resolve(&result.link.code).await.is_ok());
        assert_eq!(
            service.remaining_lifetime(&result.link.code).await.unwrap(),
            Some(Duration::from_secs(1))
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        let err = service.resolve(&result.link.code).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
