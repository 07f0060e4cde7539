use crate::auth::AuthError;
use crate::auth::oauth::provider::{ExchangedToken, Provider, ProviderRegistry};
use serde::Deserialize;
use serde_json::Value;

/// Normalized result of a provider "who am I" call, plus the token carried
/// through from the code exchange. Constructed per callback, consumed by
/// reconciliation, then discarded.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider: Provider,
    pub provider_account_id: String,
    pub name: String,
    pub email: String,
    pub image: String,
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
}

/// Providers disagree on whether ids are strings or numbers; everything is
/// stored as a string.
fn normalize_id(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    id: Value,
    email: String,
    name: String,
    #[serde(default)]
    picture: String,
}

#[derive(Deserialize)]
struct DiscordUserInfo {
    id: String,
    username: String,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct GitHubUserInfo {
    id: Value,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: String,
    #[serde(default)]
    email: Option<String>,
}

impl ProviderRegistry {
    /// Fetch the provider profile for an exchanged token and normalize it
    /// into a [`ProviderIdentity`].
    pub async fn fetch_identity(
        &self,
        provider: Provider,
        token: &ExchangedToken,
    ) -> Result<ProviderIdentity, AuthError> {
        let url = self.user_info_url(provider)?.to_string();

        let fetch_failed = |detail: String| AuthError::UserInfoFetchFailed {
            provider: provider.to_string(),
            detail,
        };

        let response = self
            .http()
            .get(&url)
            .bearer_auth(&token.access_token)
            .header(reqwest::header::USER_AGENT, "authlink")
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_failed(format!(
                "user info request returned status {}",
                response.status()
            )));
        }

        let scope = match &token.scope {
            Some(scope) => scope.clone(),
            None => self.scopes(provider)?.join(" "),
        };

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;

        normalize(provider, body, token, scope).map_err(fetch_failed)
    }
}

fn normalize(
    provider: Provider,
    body: Value,
    token: &ExchangedToken,
    scope: String,
) -> Result<ProviderIdentity, String> {
    let (provider_account_id, name, email, image) = match provider {
        Provider::Google => {
            let info: GoogleUserInfo =
                serde_json::from_value(body).map_err(|e| e.to_string())?;
            let id = normalize_id(&info.id).ok_or("user id missing in provider response")?;
            (id, info.name, info.email, info.picture)
        }
        Provider::Discord => {
            let info: DiscordUserInfo =
                serde_json::from_value(body).map_err(|e| e.to_string())?;
            let image = info
                .avatar
                .map(|hash| {
                    format!("https://cdn.discordapp.com/avatars/{}/{}.png", info.id, hash)
                })
                .unwrap_or_default();
            (info.id, info.username, info.email, image)
        }
        Provider::GitHub => {
            let info: GitHubUserInfo =
                serde_json::from_value(body).map_err(|e| e.to_string())?;
            let id = normalize_id(&info.id).ok_or("user id missing in provider response")?;
            let name = info.name.unwrap_or_else(|| info.login.clone());
            // Users can hide their email; fall back to the noreply form so
            // reconciliation still has a stable address to match on.
            let email = match info.email {
                Some(email) if !email.is_empty() => email,
                _ => format!("{}@users.noreply.github.com", info.login),
            };
            (id, name, email, info.avatar_url)
        }
    };

    if email.is_empty() {
        return Err("email missing in provider response".to_string());
    }

    Ok(ProviderIdentity {
        provider,
        provider_account_id,
        name,
        email,
        image,
        access_token: token.access_token.clone(),
        token_type: token.token_type.clone(),
        scope,
    })
}
