use crate::auth::AuthError;
use crate::config::{OAuthConfig, OAuthProviderConfig};
use crate::error::AppError;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse as _, TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use rand::RngCore;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

// Avoid oauth2 type madness
pub type Oauth2Client =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Outbound provider calls must not hang a request task indefinitely.
const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Closed set of supported OAuth2 providers. Dispatch is an exhaustive match;
/// an unknown name fails at the `FromStr` boundary instead of deep inside a
/// string switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    Discord,
    GitHub,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Discord, Provider::GitHub];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Discord => "discord",
            Provider::GitHub => "github",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::Discord => "Discord",
            Provider::GitHub => "GitHub",
        }
    }

    fn default_authorization_url(&self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/o/oauth2/auth",
            Provider::Discord => "https://discord.com/api/oauth2/authorize",
            Provider::GitHub => "https://github.com/login/oauth/authorize",
        }
    }

    fn default_token_url(&self) -> &'static str {
        match self {
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Discord => "https://discord.com/api/oauth2/token",
            Provider::GitHub => "https://github.com/login/oauth/access_token",
        }
    }

    pub(crate) fn default_user_info_url(&self) -> &'static str {
        match self {
            Provider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
            Provider::Discord => "https://discord.com/api/users/@me",
            Provider::GitHub => "https://api.github.com/user",
        }
    }

    fn default_scopes(&self) -> Vec<String> {
        let scopes: &[&str] = match self {
            Provider::Google => &["profile", "email"],
            Provider::Discord => &["identify", "email"],
            Provider::GitHub => &["read:user", "user:email"],
        };
        scopes.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "discord" => Ok(Provider::Discord),
            "github" => Ok(Provider::GitHub),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Result of the authorization-code-for-token exchange, carried through into
/// the provider identity.
#[derive(Debug, Clone)]
pub struct ExchangedToken {
    pub access_token: String,
    pub token_type: String,
    pub scope: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

struct ProviderEntry {
    client: Oauth2Client,
    scopes: Vec<String>,
    user_info_url: String,
}

/// Per-provider static configuration resolved once at startup, plus the
/// oauth2 clients built from it. Immutable after construction; safe for
/// unsynchronized concurrent reads.
pub struct ProviderRegistry {
    entries: HashMap<Provider, ProviderEntry>,
    http: reqwest::Client,
}

impl ProviderRegistry {
    pub fn new(config: &OAuthConfig) -> Result<Self, AppError> {
        let mut entries = HashMap::new();

        let configured = [
            (Provider::Google, &config.google),
            (Provider::Discord, &config.discord),
            (Provider::GitHub, &config.github),
        ];
        for (provider, settings) in configured {
            if let Some(settings) = settings {
                entries.insert(provider, build_entry(provider, settings)?);
            }
        }

        // Following redirects opens the client up to SSRF vulnerabilities.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(PROVIDER_HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("reqwest build error: {e}")))?;

        Ok(Self { entries, http })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.entries.contains_key(p))
            .collect()
    }

    fn entry(&self, provider: Provider) -> Result<&ProviderEntry, AuthError> {
        self.entries
            .get(&provider)
            .ok_or_else(|| AuthError::UnsupportedProvider(provider.as_str().to_string()))
    }

    pub(crate) fn user_info_url(&self, provider: Provider) -> Result<&str, AuthError> {
        Ok(self.entry(provider)?.user_info_url.as_str())
    }

    pub(crate) fn scopes(&self, provider: Provider) -> Result<&[String], AuthError> {
        Ok(self.entry(provider)?.scopes.as_slice())
    }

    /// Build the provider authorization URL with a fresh unpredictable state
    /// token embedded. The state is returned to the caller for echo-back; it
    /// is not stored server-side, so the callback can only check presence
    /// (known CSRF gap, see DESIGN.md).
    pub fn authorize_url(&self, provider: Provider) -> Result<(String, String), AuthError> {
        let entry = self.entry(provider)?;
        let state = generate_state();

        let state_for_request = state.clone();
        let (url, _csrf) = entry
            .client
            .authorize_url(move || CsrfToken::new(state_for_request))
            .add_scopes(entry.scopes.iter().map(|s| Scope::new(s.clone())))
            .url();

        Ok((url.to_string(), state))
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<ExchangedToken, AuthError> {
        let entry = self.entry(provider)?;

        let token = entry
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AuthError::ExchangeFailed {
                provider: provider.to_string(),
                detail: e.to_string(),
            })?;

        let token_type = match token.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "mac".to_string(),
            other => format!("{other:?}"),
        };

        Ok(ExchangedToken {
            access_token: token.access_token().secret().clone(),
            token_type,
            scope: token
                .scopes()
                .map(|scopes| {
                    scopes
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .filter(|s| !s.is_empty()),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expires_at: token
                .expires_in()
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
        })
    }
}

fn build_entry(
    provider: Provider,
    settings: &OAuthProviderConfig,
) -> Result<ProviderEntry, AppError> {
    let auth_url = settings
        .authorization_url
        .clone()
        .unwrap_or_else(|| provider.default_authorization_url().to_string());
    let token_url = settings
        .token_url
        .clone()
        .unwrap_or_else(|| provider.default_token_url().to_string());
    let user_info_url = settings
        .user_info_url
        .clone()
        .unwrap_or_else(|| provider.default_user_info_url().to_string());

    let auth_url = AuthUrl::new(auth_url).map_err(|e| {
        AppError::BadRequest(format!("Invalid authorization URL for '{provider}': {e}"))
    })?;
    let token_url = TokenUrl::new(token_url)
        .map_err(|e| AppError::BadRequest(format!("Invalid token URL for '{provider}': {e}")))?;
    let redirect_url = RedirectUrl::new(settings.redirect_uri.clone())
        .map_err(|e| AppError::BadRequest(format!("Invalid redirect URI for '{provider}': {e}")))?;

    let client = BasicClient::new(ClientId::new(settings.client_id.clone()))
        .set_client_secret(ClientSecret::new(settings.client_secret.clone()))
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(redirect_url);

    let scopes = if settings.scopes.is_empty() {
        provider.default_scopes()
    } else {
        settings.scopes.clone()
    };

    Ok(ProviderEntry {
        client,
        scopes,
        user_info_url,
    })
}

/// 32 bytes of OS randomness, URL-safe encoded; 256 bits comfortably clears
/// the unpredictability bar for a state token.
fn generate_state() -> String {
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
