//! Identity storage: repository contract plus the sea-orm implementation.
//!
//! The engine only ever sees `dyn IdentityRepository`; tests inject fakes and
//! the server wires up [`DatabaseRepository`] over sqlite or postgres.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ActiveValue::Unchanged, ColumnTrait, ConnectOptions,
    Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

pub mod entities;
pub mod migration;

pub use entities::{Account, AccountKind, User, UserRole};
pub use migration::Migrator;

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Database(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("migration error: {0}")]
    Migration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

fn map_db_err(err: DbErr) -> DatabaseError {
    let message = err.to_string();
    // sqlite reports "UNIQUE constraint failed", postgres "duplicate key value
    // violates unique constraint". Both become typed conflicts.
    if message.contains("UNIQUE constraint") || message.contains("duplicate key") {
        DatabaseError::Constraint(message)
    } else {
        DatabaseError::Database(message)
    }
}

/// Narrow persistence contract consumed by the authentication engine.
///
/// Every lookup distinguishes not-found (`Ok(None)`) from a storage error.
/// No transaction guarantee is assumed across calls; `create_user` is the one
/// logical create that persists a user together with its initial accounts.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn create_user(&self, user: &User, accounts: &[Account]) -> DatabaseResult<()>;
    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
    async fn update_user(&self, user: &User) -> DatabaseResult<()>;
    async fn delete_user(&self, id: Uuid) -> DatabaseResult<()>;
    async fn create_account(&self, account: &Account) -> DatabaseResult<()>;
    async fn find_account_by_provider(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> DatabaseResult<Option<Account>>;
    async fn find_accounts_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Account>>;
    async fn update_account(&self, account: &Account) -> DatabaseResult<()>;
    async fn delete_account(&self, id: Uuid) -> DatabaseResult<()>;
}

/// sea-orm backed repository.
#[derive(Clone)]
pub struct DatabaseRepository {
    db: DatabaseConnection,
}

impl DatabaseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(url: &str) -> DatabaseResult<Self> {
        let mut options = ConnectOptions::new(url.to_string());
        if url.contains(":memory:") {
            // Pooled in-memory sqlite gives every connection its own database;
            // pin the pool to a single connection so migrations stick.
            options.max_connections(1).min_connections(1);
        }
        let db = Database::connect(options)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> DatabaseResult<()> {
        use migration::MigratorTrait;
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn user_active_model(user: &User) -> entities::users::ActiveModel {
    entities::users::ActiveModel {
        id: Set(user.id),
        name: Set(user.name.clone()),
        email: Set(user.email.clone()),
        image: Set(user.image.clone()),
        role: Set(user.role),
        phone: Set(user.phone.clone()),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
}

fn account_active_model(account: &Account) -> entities::accounts::ActiveModel {
    entities::accounts::ActiveModel {
        id: Set(account.id),
        user_id: Set(account.user_id),
        kind: Set(account.kind),
        password_hash: Set(account.password_hash.clone()),
        provider: Set(account.provider.clone()),
        provider_account_id: Set(account.provider_account_id.clone()),
        access_token: Set(account.access_token.clone()),
        token_type: Set(account.token_type.clone()),
        scope: Set(account.scope.clone()),
        refresh_token: Set(account.refresh_token.clone()),
        expires_at: Set(account.expires_at),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    }
}

#[async_trait]
impl IdentityRepository for DatabaseRepository {
    async fn create_user(&self, user: &User, accounts: &[Account]) -> DatabaseResult<()> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        user_active_model(user)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;

        for account in accounts {
            account_active_model(account)
                .insert(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        entities::users::Entity::find()
            .filter(entities::users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        entities::users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn update_user(&self, user: &User) -> DatabaseResult<()> {
        let mut model = user_active_model(user);
        model.id = Unchanged(user.id);
        model.update(&self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> DatabaseResult<()> {
        // Cascade is also declared in the schema; deleting accounts first
        // keeps behavior identical across backends.
        entities::accounts::Entity::delete_many()
            .filter(entities::accounts::Column::UserId.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        entities::users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn create_account(&self, account: &Account) -> DatabaseResult<()> {
        account_active_model(account)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_account_by_provider(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> DatabaseResult<Option<Account>> {
        entities::accounts::Entity::find()
            .filter(entities::accounts::Column::Provider.eq(provider))
            .filter(entities::accounts::Column::ProviderAccountId.eq(provider_account_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn find_accounts_by_user(&self, user_id: Uuid) -> DatabaseResult<Vec<Account>> {
        entities::accounts::Entity::find()
            .filter(entities::accounts::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn update_account(&self, account: &Account) -> DatabaseResult<()> {
        let mut model = account_active_model(account);
        model.id = Unchanged(account.id);
        model.update(&self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_account(&self, id: Uuid) -> DatabaseResult<()> {
        entities::accounts::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }
}
