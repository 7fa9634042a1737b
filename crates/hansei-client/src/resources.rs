//! CRUD operations on customers, users, providers and user preferences.
//!
//! Single objects live at `<collection>/<uuid>/`. List endpoints are paged;
//! the `list_*` methods follow `next` links until the last page.

use hansei_core::{CustomerId, PreferenceId, ProviderId, UserId};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::client::KokuClient;
use crate::error::ClientError;
use crate::types::{
    Customer, NewCustomer, NewPreference, NewProvider, NewUser, Page, Preference,
    PreferenceUpdate, Provider, User,
};

/// Customer collection.
pub const CUSTOMERS_PATH: &str = "customers/";

/// User collection.
pub const USERS_PATH: &str = "users/";

/// Provider collection.
pub const PROVIDERS_PATH: &str = "providers/";

/// Path of one customer.
#[must_use]
pub fn customer_path(id: CustomerId) -> String {
    format!("{CUSTOMERS_PATH}{id}/")
}

/// Path of one user.
#[must_use]
pub fn user_path(id: UserId) -> String {
    format!("{USERS_PATH}{id}/")
}

/// Path of one provider.
#[must_use]
pub fn provider_path(id: ProviderId) -> String {
    format!("{PROVIDERS_PATH}{id}/")
}

/// Path of a user's preference collection.
#[must_use]
pub fn preferences_path(user: UserId) -> String {
    format!("{USERS_PATH}{user}/preferences/")
}

/// Path of one preference.
#[must_use]
pub fn preference_path(user: UserId, preference: PreferenceId) -> String {
    format!("{}{preference}/", preferences_path(user))
}

impl KokuClient {
    /// Collect every object of a paged list endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to load.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>, ClientError> {
        let mut results = Vec::new();
        let mut next = Some(endpoint.to_string());

        while let Some(page_url) = next.take() {
            let page: Page<T> = self.get_json(&page_url, &[]).await?;
            results.extend(page.results);
            next = page.next.filter(|url| !url.is_empty());
        }

        debug!(endpoint, count = results.len(), "Listed Koku objects");
        Ok(results)
    }

    // ------------------------------------------------------------------------
    // Customers
    // ------------------------------------------------------------------------

    /// Create a customer and its owner. Requires service admin rights.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    #[instrument(skip(self, customer), fields(name = %customer.name))]
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ClientError> {
        self.post_json(CUSTOMERS_PATH, customer).await
    }

    /// Fetch one customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn read_customer(&self, id: CustomerId) -> Result<Customer, ClientError> {
        self.get_json(&customer_path(id), &[]).await
    }

    /// All customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, ClientError> {
        self.list_all(CUSTOMERS_PATH).await
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<(), ClientError> {
        self.delete(&customer_path(id)).await
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    /// Create a user in the logged in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.post_json(USERS_PATH, user).await
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn read_user(&self, id: UserId) -> Result<User, ClientError> {
        self.get_json(&user_path(id), &[]).await
    }

    /// All users visible to the logged in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.list_all(USERS_PATH).await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), ClientError> {
        self.delete(&user_path(id)).await
    }

    // ------------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------------

    /// Register a cost provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    #[instrument(skip(self, provider), fields(name = %provider.name, provider_type = %provider.provider_type))]
    pub async fn create_provider(&self, provider: &NewProvider) -> Result<Provider, ClientError> {
        self.post_json(PROVIDERS_PATH, provider).await
    }

    /// Fetch one provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn read_provider(&self, id: ProviderId) -> Result<Provider, ClientError> {
        self.get_json(&provider_path(id), &[]).await
    }

    /// All providers visible to the logged in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_providers(&self) -> Result<Vec<Provider>, ClientError> {
        self.list_all(PROVIDERS_PATH).await
    }

    /// Delete a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_provider(&self, id: ProviderId) -> Result<(), ClientError> {
        self.delete(&provider_path(id)).await
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    /// Add a preference for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    #[instrument(skip(self, preference), fields(name = %preference.name))]
    pub async fn create_preference(
        &self,
        user: UserId,
        preference: &NewPreference,
    ) -> Result<Preference, ClientError> {
        self.post_json(&preferences_path(user), preference).await
    }

    /// Fetch one preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn read_preference(
        &self,
        user: UserId,
        id: PreferenceId,
    ) -> Result<Preference, ClientError> {
        self.get_json(&preference_path(user, id), &[]).await
    }

    /// All preferences of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_preferences(&self, user: UserId) -> Result<Vec<Preference>, ClientError> {
        self.list_all(&preferences_path(user)).await
    }

    /// Change a preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the request.
    #[instrument(skip(self, update))]
    pub async fn update_preference(
        &self,
        user: UserId,
        id: PreferenceId,
        update: &PreferenceUpdate,
    ) -> Result<Preference, ClientError> {
        self.put_json(&preference_path(user, id), update).await
    }

    /// Delete a preference.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_preference(
        &self,
        user: UserId,
        id: PreferenceId,
    ) -> Result<(), ClientError> {
        self.delete(&preference_path(user, id)).await
    }
}
