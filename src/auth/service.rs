use crate::auth::oauth::{ExchangedToken, Provider, ProviderIdentity, ProviderRegistry};
use crate::auth::{AuthError, PasswordHasher, TokenIssuer};
use crate::database::{Account, DatabaseError, IdentityRepository, User};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// The authentication engine. Composes the hasher, the token issuer, the
/// provider registry and the identity repository; holds no per-request state.
pub struct AuthService {
    repository: Arc<dyn IdentityRepository>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    registry: ProviderRegistry,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn IdentityRepository>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            registry,
        }
    }

    /// Create a user with one credentials account in a single logical create.
    /// Email uniqueness is enforced by the repository, not pre-checked here;
    /// a duplicate surfaces as a repository constraint violation.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let password_hash = self.hasher.hash(password)?;
        let user = User::new(name, email);
        let account = Account::credentials(user.id, password_hash);

        self.repository
            .create_user(&user, std::slice::from_ref(&account))
            .await?;

        info!(user_id = %user.id, "registered new user");
        Ok(user)
    }

    /// Verify password credentials and issue a token. A user without a
    /// credentials account verifies against the empty hash, which fails the
    /// same way a wrong password does.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = self
            .repository
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let accounts = self.repository.find_accounts_by_user(user.id).await?;
        let stored_hash = accounts
            .iter()
            .find(|a| a.is_credentials())
            .and_then(|a| a.password_hash.as_deref())
            .unwrap_or("");

        if !self.hasher.verify(password, stored_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((token, user))
    }

    /// Provider authorization URL with a fresh state token embedded.
    pub fn oauth_redirect(&self, provider: Provider) -> Result<String, AuthError> {
        let (url, _state) = self.registry.authorize_url(provider)?;
        Ok(url)
    }

    /// Complete the authorization-code flow: exchange the code, fetch the
    /// provider identity, reconcile it into a user, issue a token.
    ///
    /// The state parameter is checked for presence only; it is not compared
    /// against a stored value (known CSRF gap, see DESIGN.md).
    pub async fn oauth_callback(
        &self,
        provider: Provider,
        code: &str,
        state: &str,
    ) -> Result<(String, User), AuthError> {
        if code.is_empty() {
            return Err(AuthError::MissingParameter("code"));
        }
        if state.is_empty() {
            return Err(AuthError::MissingParameter("state"));
        }

        let exchanged = self.registry.exchange_code(provider, code).await?;
        let identity = self.registry.fetch_identity(provider, &exchanged).await?;
        let user = self.reconcile(&identity, &exchanged).await?;

        let token = self.tokens.issue(user.id)?;
        Ok((token, user))
    }

    /// Thin delegation to the token issuer; returns the embedded subject.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens.validate(token)
    }

    pub async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.repository.find_user_by_id(id).await?)
    }

    /// Find-or-create-and-link. Precedence is the core invariant:
    /// provider-identity match wins over email match, and email match wins
    /// over creating a new user. The read-then-write sequence is not
    /// transactional; a losing race on the account insert in step 3 is
    /// resolved by retrying the provider lookup once.
    async fn reconcile(
        &self,
        identity: &ProviderIdentity,
        token: &ExchangedToken,
    ) -> Result<User, AuthError> {
        let provider = identity.provider.as_str();

        // Step 1: the (provider, external id) pair already has an account.
        // Repeat sign-ins take this path and do not sync profile fields.
        if let Some(account) = self
            .repository
            .find_account_by_provider(provider, &identity.provider_account_id)
            .await?
        {
            return self
                .repository
                .find_user_by_id(account.user_id)
                .await?
                .ok_or_else(|| AuthError::LinkFailed {
                    provider: provider.to_string(),
                    detail: "account references a missing user".to_string(),
                });
        }

        // Step 2: a user already owns this email; link the provider identity
        // to it. Provider data overwrites the stored name and image.
        if let Some(mut user) = self.repository.find_user_by_email(&identity.email).await? {
            user.name = identity.name.clone();
            user.image = identity.image.clone();
            user.updated_at = Utc::now();
            self.repository.update_user(&user).await?;

            let account = oauth_account(user.id, identity, token);
            if let Err(e) = self.repository.create_account(&account).await {
                // The profile update above is not rolled back.
                return Err(AuthError::LinkFailed {
                    provider: provider.to_string(),
                    detail: format!("linking to existing user failed: {e}"),
                });
            }

            info!(user_id = %user.id, provider, "linked provider account to existing user");
            return Ok(user);
        }

        // Step 3: first sign-in for this identity; create user and account.
        let user = User::new(&identity.name, &identity.email).with_image(&identity.image);
        self.repository.create_user(&user, &[]).await?;

        let account = oauth_account(user.id, identity, token);
        match self.repository.create_account(&account).await {
            Ok(()) => {
                info!(user_id = %user.id, provider, "created new user from provider identity");
                Ok(user)
            }
            Err(DatabaseError::Constraint(_)) => {
                // A concurrent callback for the same identity won the insert.
                // Discard our duplicate user and adopt the winner's.
                self.compensate_user_create(user.id).await;
                match self
                    .repository
                    .find_account_by_provider(provider, &identity.provider_account_id)
                    .await?
                {
                    Some(existing) => self
                        .repository
                        .find_user_by_id(existing.user_id)
                        .await?
                        .ok_or_else(|| AuthError::LinkFailed {
                            provider: provider.to_string(),
                            detail: "winning account references a missing user".to_string(),
                        }),
                    None => Err(AuthError::LinkFailed {
                        provider: provider.to_string(),
                        detail: "account constraint violation without a visible owner".to_string(),
                    }),
                }
            }
            Err(e) => {
                self.compensate_user_create(user.id).await;
                Err(AuthError::LinkFailed {
                    provider: provider.to_string(),
                    detail: format!("creating linked account failed: {e}"),
                })
            }
        }
    }

    /// Best-effort rollback of a just-created user. Failure here leaves an
    /// orphaned user behind; it is logged, not surfaced.
    async fn compensate_user_create(&self, user_id: Uuid) {
        if let Err(e) = self.repository.delete_user(user_id).await {
            warn!(user_id = %user_id, error = %e, "failed to roll back user created during linking");
        }
    }
}

fn oauth_account(user_id: Uuid, identity: &ProviderIdentity, token: &ExchangedToken) -> Account {
    Account::oauth(
        user_id,
        identity.provider.as_str(),
        identity.provider_account_id.clone(),
        identity.access_token.clone(),
        identity.token_type.clone(),
        identity.scope.clone(),
        token.refresh_token.clone(),
        token.expires_at,
    )
}
