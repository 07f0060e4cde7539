use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20250612_000001_create_users_table;
mod m20250612_000002_create_accounts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250612_000001_create_users_table::Migration),
            Box::new(m20250612_000002_create_accounts_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    Image,
    Role,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    UserId,
    Kind,
    PasswordHash,
    Provider,
    ProviderAccountId,
    AccessToken,
    TokenType,
    Scope,
    RefreshToken,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
