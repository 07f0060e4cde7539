use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::StringLen};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One authentication method bound to exactly one user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountKind {
    #[sea_orm(string_value = "credentials")]
    #[serde(rename = "credentials")]
    Credentials,
    #[sea_orm(string_value = "oauth")]
    #[serde(rename = "oauth")]
    OAuth,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Credentials => "credentials",
            AccountKind::OAuth => "oauth",
        }
    }
}

/// The `(provider, provider_account_id)` pair is the external identity key;
/// a unique index enforces it across all accounts.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(16))")]
    pub kind: AccountKind,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub provider: Option<String>,
    pub provider_account_id: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    fn base(user_id: Uuid, kind: AccountKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            password_hash: None,
            provider: None,
            provider_account_id: None,
            access_token: None,
            token_type: None,
            scope: None,
            refresh_token: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn credentials(user_id: Uuid, password_hash: impl Into<String>) -> Self {
        let mut account = Self::base(user_id, AccountKind::Credentials);
        account.password_hash = Some(password_hash.into());
        account
    }

    #[allow(clippy::too_many_arguments)]
    pub fn oauth(
        user_id: Uuid,
        provider: impl Into<String>,
        provider_account_id: impl Into<String>,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        scope: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        let mut account = Self::base(user_id, AccountKind::OAuth);
        account.provider = Some(provider.into());
        account.provider_account_id = Some(provider_account_id.into());
        account.access_token = Some(access_token.into());
        account.token_type = Some(token_type.into());
        account.scope = Some(scope.into());
        account.refresh_token = refresh_token;
        account.expires_at = expires_at;
        account
    }

    pub fn is_credentials(&self) -> bool {
        self.kind == AccountKind::Credentials
    }
}
