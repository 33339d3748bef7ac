//! OAuth credential returned by the token refresh exchange.

use serde::Deserialize;

/// Short-lived access credential.
///
/// Not `Serialize`: the access token never appears in API responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    /// Bearer token for API calls
    pub access_token: String,
    /// Granted OAuth scopes (comma separated, may be empty)
    pub scope: String,
    /// Strava athlete ID, if the provider reported one
    pub athlete_id: Option<u64>,
}

/// Raw token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub athlete: Option<TokenAthlete>,
}

/// Athlete summary embedded in the token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAthlete {
    #[serde(default)]
    pub id: Option<u64>,
}

impl From<TokenRefreshResponse> for Credential {
    fn from(resp: TokenRefreshResponse) -> Self {
        Self {
            access_token: resp.access_token,
            scope: resp.scope.unwrap_or_default(),
            athlete_id: resp.athlete.and_then(|a| a.id),
        }
    }
}
