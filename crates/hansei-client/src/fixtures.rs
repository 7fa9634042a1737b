//! Builders for throwaway test objects.
//!
//! Every fixture gets a fresh random suffix so repeated runs against the same
//! server never collide. Created objects are owned by the caller, who is
//! expected to delete them.

use tracing::info;

use crate::client::KokuClient;
use crate::config::{HanseiConfig, ProviderConfig};
use crate::error::ClientError;
use crate::types::{Customer, NewCustomer, NewProvider, NewUser, Owner, Provider, User};

/// Password given to every fixture user.
pub const FIXTURE_PASSWORD: &str = "redhat";

/// Provider type used by [`new_provider`].
pub const FIXTURE_PROVIDER_TYPE: &str = "AWS";

/// Eight random lowercase alphanumeric characters.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Payload for a customer whose owner is `owner_<suffix>`.
#[must_use]
pub fn customer_payload(suffix: &str) -> NewCustomer {
    NewCustomer {
        name: format!("Customer {suffix}"),
        owner: Owner::new(
            format!("owner_{suffix}"),
            format!("owner_{suffix}@{suffix}.com"),
            FIXTURE_PASSWORD,
        ),
    }
}

/// Payload for a user named `user_<suffix>`.
#[must_use]
pub fn user_payload(suffix: &str) -> NewUser {
    NewUser {
        username: format!("user_{suffix}"),
        email: format!("user_{suffix}@{suffix}.com"),
        password: Some(FIXTURE_PASSWORD.to_string()),
    }
}

/// Payload registering the configured provider under a unique name.
#[must_use]
pub fn provider_payload(config: &ProviderConfig, suffix: &str) -> NewProvider {
    NewProvider {
        name: format!("Provider {suffix}"),
        provider_type: config.provider_type.clone(),
        authentication: config.authentication.clone(),
        billing_source: config.billing_source.clone(),
    }
}

/// A client logged in as the configured service admin.
///
/// # Errors
///
/// Returns an error if the config has no hostname or the login fails.
pub async fn service_admin(config: &HanseiConfig) -> Result<KokuClient, ClientError> {
    let mut client = KokuClient::from_config(&config.koku)?;
    client
        .login(&config.koku.username, &config.koku.password)
        .await?;
    Ok(client)
}

/// Create a customer through `admin` and log in as its owner.
///
/// # Errors
///
/// Returns an error if creation or the owner's login fails.
pub async fn new_customer(admin: &KokuClient) -> Result<(Customer, KokuClient), ClientError> {
    let payload = customer_payload(&unique_suffix());
    let customer = admin.create_customer(&payload).await?;
    info!(customer = %customer.uuid, name = %customer.name, "Created fixture customer");

    let owner = admin
        .login_as(&payload.owner.username, FIXTURE_PASSWORD)
        .await?;
    Ok((customer, owner))
}

/// Create a user in the customer of `owner` and log in as that user.
///
/// # Errors
///
/// Returns an error if creation or the user's login fails.
pub async fn new_user(owner: &KokuClient) -> Result<(User, KokuClient), ClientError> {
    let payload = user_payload(&unique_suffix());
    let user = owner.create_user(&payload).await?;
    info!(user = %user.uuid, username = %user.username, "Created fixture user");

    let client = owner.login_as(&payload.username, FIXTURE_PASSWORD).await?;
    Ok((user, client))
}

/// Register the first configured AWS provider through `client`.
///
/// # Errors
///
/// Returns [`ClientError::Configuration`] if no AWS provider is configured,
/// or the server error if registration fails.
pub async fn new_provider(
    client: &KokuClient,
    config: &HanseiConfig,
) -> Result<Provider, ClientError> {
    let provider_config = config.provider(FIXTURE_PROVIDER_TYPE).ok_or_else(|| {
        ClientError::Configuration(format!(
            "no {FIXTURE_PROVIDER_TYPE} provider in the 'providers' section"
        ))
    })?;

    let provider = client
        .create_provider(&provider_payload(provider_config, &unique_suffix()))
        .await?;
    info!(provider = %provider.uuid, name = %provider.name, "Created fixture provider");
    Ok(provider)
}
