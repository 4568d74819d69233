use chrono::NaiveDate;
use plexlink_models::{HomeUser, MediaKind, MetadataRecord, RawHistoryRecord, ServerAccount};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::SourceError;

pub const PLEX_TV_BASE_URL: &str = "https://plex.tv";
const CLIENT_IDENTIFIER: &str = "plexlink-cli";

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub url: String,
    pub name: String,
    pub identifier: String,
    pub local: bool,
}

/// Thin wrapper over the Plex Media Server and plex.tv JSON endpoints.
///
/// The token is passed per request so one client serves any signed-in user.
pub struct PlexHttpClient {
    client: Client,
    plex_tv_base_url: String,
}

impl PlexHttpClient {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_plex_tv_base_url(PLEX_TV_BASE_URL)
    }

    pub fn with_plex_tv_base_url(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-client-identifier"),
                    reqwest::header::HeaderValue::from_static(CLIENT_IDENTIFIER),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-plex-product"),
                    reqwest::header::HeaderValue::from_static("plexlink"),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            plex_tv_base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, url: &str, token: &str, extra_headers: &[(&str, String)]) -> Result<Value, SourceError> {
        let token_header = reqwest::header::HeaderValue::from_str(token)
            .map_err(|e| SourceError::InvalidToken(e.to_string()))?;

        let mut request = self.client.get(url).header("X-Plex-Token", token_header);
        for (name, value) in extra_headers {
            request = request.header(*name, value.as_str());
        }

        trace!("Plex GET {}", url);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SourceError::decode(format!("{}: {}", url, e)))
    }

    pub async fn get_servers(&self, token: &str) -> Result<Vec<ServerInfo>, SourceError> {
        let url = format!("{}/api/v2/resources?includeHttps=1", self.plex_tv_base_url);
        let json = self.get_json(&url, token, &[]).await?;
        let servers = parse_servers(&json);
        debug!("Plex server discovery: Found {} servers", servers.len());
        Ok(servers)
    }

    /// Most recent history entries, newest first
    pub async fn get_play_history(
        &self,
        server_url: &str,
        token: &str,
        page_size: usize,
    ) -> Result<Vec<RawHistoryRecord>, SourceError> {
        let url = format!("{}/status/sessions/history/all?sort=viewedAt:desc", server_url);
        let headers = [
            ("X-Plex-Container-Start", "0".to_string()),
            ("X-Plex-Container-Size", page_size.to_string()),
        ];
        let json = self.get_json(&url, token, &headers).await?;
        let history = parse_history_container(&json);
        debug!("Plex play history: Returning {} items", history.len());
        Ok(history)
    }

    pub async fn get_sessions(&self, server_url: &str, token: &str) -> Result<Vec<RawHistoryRecord>, SourceError> {
        let url = format!("{}/status/sessions", server_url);
        let json = self.get_json(&url, token, &[]).await?;
        let sessions = parse_history_container(&json);
        debug!("Plex sessions: {} active", sessions.len());
        Ok(sessions)
    }

    /// Fetch one metadata record; a 404 means the server does not know the item
    pub async fn get_metadata_item(
        &self,
        server_url: &str,
        token: &str,
        rating_key: &str,
    ) -> Result<Option<MetadataRecord>, SourceError> {
        // "/library/metadata/123" -> "123"
        let id = rating_key.trim_start_matches("/library/metadata/").trim();
        let url = format!("{}/library/metadata/{}?includeGuids=1", server_url, id);

        let json = match self.get_json(&url, token, &[]).await {
            Ok(json) => json,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(metadata_items(&json).first().and_then(parse_metadata_record))
    }

    pub async fn get_accounts(&self, server_url: &str, token: &str) -> Result<Vec<ServerAccount>, SourceError> {
        let url = format!("{}/accounts", server_url);
        let json = self.get_json(&url, token, &[]).await?;
        Ok(parse_accounts(&json))
    }

    pub async fn get_home_users(&self, token: &str) -> Result<Vec<HomeUser>, SourceError> {
        let url = format!("{}/api/home/users", self.plex_tv_base_url);
        let json = self.get_json(&url, token, &[]).await?;
        Ok(parse_home_users(&json))
    }

    pub async fn get_current_user(&self, token: &str) -> Result<HomeUser, SourceError> {
        let url = format!("{}/api/v2/user", self.plex_tv_base_url);
        let json = self.get_json(&url, token, &[]).await?;
        parse_home_user(&json).ok_or_else(|| SourceError::decode("user response has no id"))
    }
}

/// Rating keys and ids arrive as strings or numbers depending on server version
fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_u32(value: Option<&Value>) -> Option<u32> {
    value_as_u64(value).and_then(|v| u32::try_from(v).ok())
}

fn value_as_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    value
        .and_then(|v| v.as_str())
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}

/// "/library/metadata/123" or "123" -> "123"
fn parse_key(value: Option<&Value>) -> Option<String> {
    value_as_string(value).map(|key| {
        key.trim_start_matches("/library/metadata/")
            .trim_end_matches("/children")
            .to_string()
    })
}

pub(crate) fn parse_guid_array(guid_value: &Value) -> Vec<String> {
    let mut guids = Vec::new();
    match guid_value {
        Value::Array(items) => {
            for guid_obj in items {
                if let Some(id) = guid_obj.get("id").and_then(|i| i.as_str()) {
                    guids.push(id.to_string());
                } else if let Some(id_str) = guid_obj.as_str() {
                    // Sometimes GUIDs are just strings
                    guids.push(id_str.to_string());
                }
            }
        }
        Value::Object(obj) => {
            if let Some(id) = obj.get("id").and_then(|i| i.as_str()) {
                guids.push(id.to_string());
            }
        }
        Value::String(id) => guids.push(id.clone()),
        _ => {}
    }
    guids
}

/// Items of a MediaContainer; "Metadata" on current servers, "Video" on older ones
fn metadata_items(json: &Value) -> Vec<Value> {
    json.get("MediaContainer")
        .and_then(|mc| mc.get("Metadata").or_else(|| mc.get("Video")))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

pub(crate) fn parse_history_container(json: &Value) -> Vec<RawHistoryRecord> {
    let items = metadata_items(json);
    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (idx, item) in items.iter().enumerate() {
        match parse_history_record(item) {
            Some(record) => {
                if idx < 3 {
                    trace!(
                        "Plex history[{}]: rating_key={}, type={}, title={:?}",
                        idx, record.rating_key, record.type_, record.title
                    );
                }
                records.push(record);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Plex history: Skipped {} items without a rating key", skipped);
    }
    records
}

pub(crate) fn parse_history_record(item: &Value) -> Option<RawHistoryRecord> {
    let rating_key = parse_key(item.get("ratingKey").or_else(|| item.get("key")))?;

    // Sessions carry the viewer as a nested User object
    let user = item.get("User");
    let account_id = value_as_u64(item.get("accountID")).or_else(|| user.and_then(|u| value_as_u64(u.get("id"))));
    let username = user.and_then(|u| value_as_str(u.get("title")));

    let originally_available_at = parse_date(item.get("originallyAvailableAt"));
    let year = value_as_u32(item.get("year"));

    Some(RawHistoryRecord {
        rating_key,
        type_: value_as_str(item.get("type")).unwrap_or_default(),
        title: value_as_str(item.get("title")),
        grandparent_title: value_as_str(item.get("grandparentTitle")),
        grandparent_rating_key: parse_key(item.get("grandparentRatingKey").or_else(|| item.get("grandparentKey"))),
        parent_index: value_as_u32(item.get("parentIndex")),
        index: value_as_u32(item.get("index")),
        year,
        originally_available_at,
        account_id,
        username,
    })
}

pub(crate) fn parse_metadata_record(item: &Value) -> Option<MetadataRecord> {
    let rating_key = parse_key(item.get("ratingKey"))?;
    let kind = value_as_str(item.get("type"))
        .map(|t| MediaKind::from_plex_type(&t))
        .unwrap_or_default();

    let mut guids = parse_guid_array(item.get("Guid").unwrap_or(&Value::Null));
    // Legacy agents put their id in the top-level guid attribute
    if let Some(guid) = value_as_str(item.get("guid")) {
        guids.push(guid);
    }

    Some(MetadataRecord {
        rating_key,
        kind,
        title: value_as_str(item.get("title")),
        year: value_as_u32(item.get("year")),
        originally_available_at: parse_date(item.get("originallyAvailableAt")),
        guids,
        grandparent_rating_key: parse_key(item.get("grandparentRatingKey").or_else(|| item.get("grandparentKey"))),
        grandparent_title: value_as_str(item.get("grandparentTitle")),
        parent_index: value_as_u32(item.get("parentIndex")),
        index: value_as_u32(item.get("index")),
    })
}

pub(crate) fn parse_accounts(json: &Value) -> Vec<ServerAccount> {
    json.get("MediaContainer")
        .and_then(|mc| mc.get("Account"))
        .and_then(|a| a.as_array())
        .map(|accounts| {
            accounts
                .iter()
                .filter_map(|account| {
                    let id = value_as_u64(account.get("id"))?;
                    let name = value_as_str(account.get("name"))?;
                    Some(ServerAccount { id, name })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_home_user(user: &Value) -> Option<HomeUser> {
    Some(HomeUser {
        id: value_as_u64(user.get("id"))?,
        title: value_as_str(user.get("title")),
        username: value_as_str(user.get("username")),
        friendly_name: value_as_str(user.get("friendlyName")),
    })
}

pub(crate) fn parse_home_users(json: &Value) -> Vec<HomeUser> {
    // plex.tv answers either {"users": [...]} or {"MediaContainer": {"User": [...]}}
    let users = json
        .get("users")
        .or_else(|| json.get("MediaContainer").and_then(|mc| mc.get("User")))
        .and_then(|u| u.as_array());

    users
        .map(|users| users.iter().filter_map(parse_home_user).collect())
        .unwrap_or_default()
}

pub(crate) fn parse_servers(json: &Value) -> Vec<ServerInfo> {
    let mut servers = Vec::new();

    // The v2 API returns a direct array of resources
    let Some(resources) = json.as_array() else {
        debug!("Plex server discovery: Unexpected resources response shape");
        return servers;
    };

    for resource in resources {
        let provides = resource.get("provides").and_then(|p| p.as_str());
        let product = resource.get("product").and_then(|p| p.as_str());
        let is_server = provides.map(|p| p.contains("server")).unwrap_or(false)
            || product.map(|p| p == "Plex Media Server").unwrap_or(false);
        if !is_server {
            continue;
        }

        let name = value_as_str(resource.get("name")).unwrap_or_else(|| "Unknown".to_string());
        let identifier = value_as_str(resource.get("clientIdentifier")).unwrap_or_default();

        let Some(connections) = resource.get("connections").and_then(|c| c.as_array()) else {
            continue;
        };

        // Prefer local connections, then any connection
        let mut local_uri = None;
        let mut any_uri = None;
        for conn in connections {
            if let Some(uri) = conn.get("uri").and_then(|u| u.as_str()) {
                let is_local = conn.get("local").and_then(|l| l.as_bool()).unwrap_or(false);
                if is_local && local_uri.is_none() {
                    local_uri = Some(uri.to_string());
                } else if any_uri.is_none() {
                    any_uri = Some(uri.to_string());
                }
            }
        }

        let local = local_uri.is_some();
        if let Some(uri) = local_uri.or(any_uri) {
            debug!("Plex server discovery: Found server '{}' at {}", name, uri);
            servers.push(ServerInfo {
                url: uri,
                name,
                identifier,
                local,
            });
        }
    }

    servers
}
