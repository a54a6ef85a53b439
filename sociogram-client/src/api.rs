use crate::error::{ClientError, Result};
use crate::model::{FriendEntry, UserId};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Wire protocol version understood by this client.
const API_VERSION: &str = "5.131";

/// Profile fields requested with every friend list.
const REQUESTED_FIELDS: &str = "bdate,city";

const DEFAULT_API_BASE: &str = "https://api.vk.com";

/// The one operation the crawler needs from the remote service: an ordered
/// friend list for an identity. Implementations own authentication,
/// transport and pagination; the crawler is indifferent to all of them.
#[allow(async_fn_in_trait)]
pub trait FriendService {
    async fn list_friends(&self, user: UserId) -> Result<Vec<FriendEntry>>;
}

/// VK-style `friends.get` client over HTTP.
pub struct HttpFriendService {
    client: Client,
    base: Url,
    token: String,
}

impl HttpFriendService {
    pub fn new(token: String) -> Self {
        Self::with_timeout(token, 10)
    }

    pub fn with_timeout(token: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Sociogram/0.1 (https://github.com/trapdoorsec/sociogram)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base: Url::parse(DEFAULT_API_BASE).expect("default API base is valid"),
            token,
        }
    }

    /// Points the client at a different service root, e.g. a mock server.
    pub fn with_base_url(mut self, base: Url) -> Self {
        self.base = base;
        self
    }
}

impl FriendService for HttpFriendService {
    async fn list_friends(&self, user: UserId) -> Result<Vec<FriendEntry>> {
        let endpoint = self
            .base
            .join("method/friends.get")
            .map_err(|e| ClientError::InvalidResponse(format!("invalid endpoint: {e}")))?;

        debug!("fetching friend list of {user}");

        let envelope: Envelope = self
            .client
            .get(endpoint)
            .query(&[
                ("user_id", user.to_string()),
                ("fields", REQUESTED_FIELDS.to_string()),
                ("access_token", self.token.clone()),
                ("v", API_VERSION.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        match envelope {
            Envelope {
                error: Some(error), ..
            } => Err(ClientError::Api {
                code: error.error_code,
                message: error.error_msg,
            }),
            Envelope {
                response: Some(payload),
                ..
            } => Ok(payload.items.into_iter().map(FriendEntry::from).collect()),
            Envelope { .. } => Err(ClientError::InvalidResponse(
                "neither response nor error present".to_string(),
            )),
        }
    }
}

// Wire types. The service reports a city as an object with a title; both the
// birth date and the city are omitted entirely for hidden profiles.

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<FriendsPayload>,
    error: Option<ApiErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct FriendsPayload {
    #[allow(dead_code)]
    count: Option<u64>,
    items: Vec<WireFriend>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    error_code: i64,
    error_msg: String,
}

#[derive(Debug, Deserialize)]
struct WireFriend {
    id: u64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    bdate: Option<String>,
    city: Option<WireCity>,
}

#[derive(Debug, Deserialize)]
struct WireCity {
    title: String,
}

impl From<WireFriend> for FriendEntry {
    fn from(wire: WireFriend) -> Self {
        Self {
            id: UserId(wire.id),
            first_name: wire.first_name,
            last_name: wire.last_name,
            birth_date: wire.bdate,
            city: wire.city.map(|c| c.title),
        }
    }
}
