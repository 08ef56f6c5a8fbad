use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{MigrateError, Result};

/// A resolved or created account in the target system.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetUser {
    pub id: u64,
    pub login: String,
    pub email: String,
    /// Role names; absent from some responses, in which case the
    /// caller-visible default is "no roles".
    #[serde(default)]
    pub roles: Vec<String>,
}

impl TargetUser {
    pub fn is_agent(&self) -> bool {
        self.roles.iter().any(|role| role == "Agent")
    }
}

/// A created ticket in the target system.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetTicket {
    pub id: u64,
    #[serde(default)]
    pub customer_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Write operations the identity-resolution and load stages need from
/// the target system. `acting` selects the impersonation session; `None`
/// is the bootstrap account.
pub trait HelpdeskTarget {
    fn list_users(&mut self) -> Result<Vec<TargetUser>>;
    fn search_users(&mut self, query: &str) -> Result<Vec<TargetUser>>;
    fn create_user(&mut self, payload: &Value) -> Result<TargetUser>;
    fn create_ticket(&mut self, acting: Option<&str>, payload: &Value) -> Result<TargetTicket>;
    fn update_ticket(&mut self, id: u64, payload: &Value) -> Result<()>;
    fn create_article(&mut self, acting: Option<&str>, payload: &Value) -> Result<()>;
    fn list_tags(&mut self) -> Result<Vec<String>>;
    fn create_tag(&mut self, name: &str) -> Result<()>;
    fn assign_tag(&mut self, object: &str, o_id: u64, item: &str) -> Result<()>;
}

struct Session {
    http: reqwest::blocking::Client,
}

/// HTTP client for one target instance, holding an authenticated session
/// per acting user. Impersonated posts go through a session carrying an
/// `X-On-Behalf-Of` header rather than spoofed article metadata.
pub struct ZammadClient {
    base: String,
    basic_token: String,
    sessions: HashMap<Option<String>, Session>,
}

impl ZammadClient {
    pub fn new(config: &Config) -> Self {
        let scheme = if config.zammad_secure { "https" } else { "http" };
        Self {
            base: format!("{scheme}://{}/api/v1", config.zammad_host),
            basic_token: STANDARD.encode(format!(
                "{}:{}",
                config.zammad_user, config.zammad_password
            )),
            sessions: HashMap::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn build_session(&self, acting: Option<&str>) -> Result<Session> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Basic {}", self.basic_token))
            .map_err(|_| MigrateError::Session("credentials are not header-safe".into()))?;
        headers.insert(AUTHORIZATION, auth);
        if let Some(login) = acting {
            let value = HeaderValue::from_str(login)
                .map_err(|_| MigrateError::Session(login.to_string()))?;
            headers.insert("X-On-Behalf-Of", value);
        }
        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Session { http })
    }

    /// The memoized session for `acting`, built on first use.
    fn session(&mut self, acting: Option<&str>) -> Result<&Session> {
        let key = acting.map(str::to_string);
        if !self.sessions.contains_key(&key) {
            let session = self.build_session(acting)?;
            self.sessions.insert(key.clone(), session);
        }
        Ok(&self.sessions[&key])
    }

    /// Validate the bootstrap credentials before doing anything else.
    pub fn me(&mut self) -> Result<TargetUser> {
        let url = self.endpoint("users/me");
        let resp = self.session(None)?.http.get(url).send()?;
        parse_json(resp)
    }
}

fn ensure_success(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(MigrateError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp)
}

fn parse_json<T: serde::de::DeserializeOwned>(resp: reqwest::blocking::Response) -> Result<T> {
    Ok(ensure_success(resp)?.json()?)
}

fn check_status(resp: reqwest::blocking::Response) -> Result<()> {
    ensure_success(resp)?;
    Ok(())
}

impl HelpdeskTarget for ZammadClient {
    fn list_users(&mut self) -> Result<Vec<TargetUser>> {
        let mut users = Vec::new();
        for page in 1u32.. {
            let url = self.endpoint("users");
            let resp = self
                .session(None)?
                .http
                .get(url)
                .query(&[("page", page.to_string().as_str()), ("per_page", "100")])
                .send()?;
            let batch: Vec<TargetUser> = parse_json(resp)?;
            if batch.is_empty() {
                break;
            }
            users.extend(batch);
        }
        Ok(users)
    }

    fn search_users(&mut self, query: &str) -> Result<Vec<TargetUser>> {
        let url = self.endpoint("users/search");
        let resp = self
            .session(None)?
            .http
            .get(url)
            .query(&[("query", query), ("expand", "true")])
            .send()?;
        parse_json(resp)
    }

    fn create_user(&mut self, payload: &Value) -> Result<TargetUser> {
        let url = self.endpoint("users");
        let resp = self
            .session(None)?
            .http
            .post(url)
            .query(&[("expand", "true")])
            .json(payload)
            .send()?;
        parse_json(resp)
    }

    fn create_ticket(&mut self, acting: Option<&str>, payload: &Value) -> Result<TargetTicket> {
        let url = self.endpoint("tickets");
        let resp = self.session(acting)?.http.post(url).json(payload).send()?;
        parse_json(resp)
    }

    fn update_ticket(&mut self, id: u64, payload: &Value) -> Result<()> {
        let url = self.endpoint(&format!("tickets/{id}"));
        let resp = self.session(None)?.http.put(url).json(payload).send()?;
        check_status(resp)
    }

    fn create_article(&mut self, acting: Option<&str>, payload: &Value) -> Result<()> {
        let url = self.endpoint("ticket_articles");
        let resp = self.session(acting)?.http.post(url).json(payload).send()?;
        check_status(resp)
    }

    fn list_tags(&mut self) -> Result<Vec<String>> {
        let url = self.endpoint("tag_list");
        let resp = self.session(None)?.http.get(url).send()?;
        let entries: Vec<TagEntry> = parse_json(resp)?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    fn create_tag(&mut self, name: &str) -> Result<()> {
        let url = self.endpoint("tag_list");
        let resp = self
            .session(None)?
            .http
            .post(url)
            .json(&serde_json::json!({ "name": name }))
            .send()?;
        check_status(resp)
    }

    // The generic resource client has no tag-assignment surface, so this
    // goes straight at the tag-management endpoint.
    fn assign_tag(&mut self, object: &str, o_id: u64, item: &str) -> Result<()> {
        let url = self.endpoint("tags/add");
        let resp = self
            .session(None)?
            .http
            .get(url)
            .query(&[
                ("object", object),
                ("o_id", o_id.to_string().as_str()),
                ("item", item),
            ])
            .send()?;
        check_status(resp)
    }
}
