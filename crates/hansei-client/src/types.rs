//! Request and response types for the Koku API.

use std::fmt;

use hansei_core::{CustomerId, PreferenceId, ProviderId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Authentication
// ============================================================================

/// Body of `POST token-auth/`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Username.
    pub username: &'a str,
    /// Password.
    pub password: &'a str,
}

/// Response of `POST token-auth/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// API token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Response of `GET status/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// API version number.
    #[serde(default)]
    pub api_version: Option<u32>,
    /// Git commit the server was built from.
    #[serde(default)]
    pub commit: Option<String>,
    /// Identifier of the answering server instance.
    #[serde(default)]
    pub server_id: Option<String>,
    /// Interpreter version reported by the server.
    #[serde(default)]
    pub python_version: Option<String>,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_version = self
            .api_version
            .map_or_else(|| "unknown".to_string(), |v| v.to_string());
        write!(
            f,
            "API Version: {api_version}, Git Commit: {}",
            self.commit.as_deref().unwrap_or("unknown")
        )
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// One page of a list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Total number of objects across all pages.
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// Absolute URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Objects on this page.
    pub results: Vec<T>,
}

// ============================================================================
// Customers and users
// ============================================================================

/// Owner of a customer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<UserId>,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password, sent on creation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Owner {
    /// A new owner with a password.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uuid: None,
            username: username.into(),
            email: email.into(),
            password: Some(password.into()),
        }
    }
}

/// Body of `POST customers/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomer {
    /// Customer name.
    pub name: String,
    /// Account owner, created with the customer.
    pub owner: Owner,
}

/// A customer as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Identifier.
    pub uuid: CustomerId,
    /// Customer name.
    pub name: String,
    /// Account owner.
    pub owner: Owner,
    /// Creation timestamp, as sent by the server.
    #[serde(default)]
    pub date_created: Option<String>,
}

/// Body of `POST users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A user as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier.
    pub uuid: UserId,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// Reference to a user nested in another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Identifier.
    pub uuid: UserId,
}

// ============================================================================
// Providers
// ============================================================================

/// Body of `POST providers/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProvider {
    /// Provider name.
    pub name: String,
    /// Provider type, e.g. `AWS`.
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Credentials the server uses to reach the provider.
    pub authentication: Value,
    /// Where the provider's billing data is stored.
    pub billing_source: Value,
}

/// A cost provider as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Identifier.
    pub uuid: ProviderId,
    /// Provider name.
    pub name: String,
    /// Provider type.
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Credentials the server uses to reach the provider.
    #[serde(default)]
    pub authentication: Value,
    /// Where the provider's billing data is stored.
    #[serde(default)]
    pub billing_source: Value,
    /// User that created the provider.
    #[serde(default)]
    pub created_by: Option<UserRef>,
}

// ============================================================================
// User preferences
// ============================================================================

/// Body of `POST users/{uuid}/preferences/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPreference {
    /// Preference name, e.g. `currency`.
    pub name: String,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Preference value, keyed by name: `{"currency": "USD"}`.
    pub preference: Value,
}

/// Body of `PUT users/{uuid}/preferences/{uuid}/`. Unset fields are left
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceUpdate {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<Value>,
}

/// A user preference as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    /// Identifier.
    pub uuid: PreferenceId,
    /// Preference name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Preference value.
    pub preference: Value,
    /// Owning user.
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_customer_serializes_owner_password() {
        let customer = NewCustomer {
            name: "Customer abc".into(),
            owner: Owner::new("owner_abc", "owner_abc@abc.com", "redhat"),
        };

        assert_eq!(
            serde_json::to_value(&customer).unwrap(),
            json!({
                "name": "Customer abc",
                "owner": {"username": "owner_abc", "email": "owner_abc@abc.com", "password": "redhat"}
            })
        );
    }

    #[test]
    fn customer_parses_server_shape() {
        let customer: Customer = serde_json::from_value(json!({
            "uuid": "0b8c2e3a-6b34-4f5e-a3e1-4d8c9a1f2b7e",
            "name": "Customer abc",
            "owner": {
                "uuid": "5f0fa8ef-2d2a-4d1b-8e6d-3c4b5a6d7e8f",
                "username": "owner_abc",
                "email": "owner_abc@abc.com"
            },
            "date_created": "2018-07-20T11:12:13Z"
        }))
        .unwrap();

        assert_eq!(customer.owner.username, "owner_abc");
        assert!(customer.owner.uuid.is_some());
        assert!(customer.owner.password.is_none());
    }

    #[test]
    fn provider_type_is_renamed() {
        let provider = NewProvider {
            name: "Provider abc".into(),
            provider_type: "AWS".into(),
            authentication: json!({"provider_resource_name": "arn:aws:iam::1:role/x"}),
            billing_source: json!({"bucket": "b"}),
        };
        let value = serde_json::to_value(&provider).unwrap();
        assert_eq!(value["type"], "AWS");
        assert!(value.get("provider_type").is_none());
    }

    #[test]
    fn preference_update_skips_unset_fields() {
        let update = PreferenceUpdate {
            description: Some("Preferred currency".into()),
            ..PreferenceUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"description": "Preferred currency"})
        );
    }

    #[test]
    fn server_status_tolerates_missing_fields() {
        let status: ServerStatus = serde_json::from_value(json!({"api_version": 1})).unwrap();
        assert_eq!(status.to_string(), "API Version: 1, Git Commit: unknown");
    }

    #[test]
    fn page_parses_results() {
        let page: Page<User> = serde_json::from_value(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "uuid": "5f0fa8ef-2d2a-4d1b-8e6d-3c4b5a6d7e8f",
                "username": "u",
                "email": "u@example.com"
            }]
        }))
        .unwrap();

        assert_eq!(page.count, Some(1));
        assert_eq!(page.results.len(), 1);
        assert!(page.next.is_none());
    }
}
