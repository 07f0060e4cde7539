pub mod identity;
pub mod provider;

pub use identity::ProviderIdentity;
pub use provider::{ExchangedToken, Oauth2Client, Provider, ProviderRegistry};
