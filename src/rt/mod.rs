mod parse;

use crate::config::Config;
use crate::error::Result;
use crate::model::{LegacyAttachment, LegacyHistoryItem, LegacyTicket, LegacyUser};

/// Read operations the extraction stage needs from the legacy tracker.
pub trait TicketSource {
    /// Fetch one ticket; `None` means the ID does not exist and the
    /// configured range has run past the last ticket.
    fn get_ticket(&self, id: u64) -> Result<Option<LegacyTicket>>;
    fn get_history(&self, id: u64) -> Result<Vec<LegacyHistoryItem>>;
    fn get_attachment(&self, ticket_id: u64, attachment_id: u64) -> Result<LegacyAttachment>;
    fn get_user(&self, username: &str) -> Result<LegacyUser>;
}

/// Session-authenticated HTTP client for one tracker instance.
pub struct RtClient {
    http: reqwest::blocking::Client,
    base: String,
    user: String,
    pass: String,
}

impl RtClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            base: config.rt_url.trim_end_matches('/').to_string(),
            user: config.rt_user.clone(),
            pass: config.rt_pass.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// Authenticate against the REST root. The session cookie lands in
    /// the client's jar and rides along on every later request. Returns
    /// `false` when the tracker rejects the credentials.
    pub fn login(&self) -> Result<bool> {
        let body = self
            .http
            .post(&self.base)
            .form(&[("user", self.user.as_str()), ("pass", self.pass.as_str())])
            .send()?
            .text()?;
        let status = body.lines().next().unwrap_or_default();
        Ok(status.starts_with("RT/") && status.split_whitespace().nth(1) == Some("200"))
    }

    fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.http.get(self.endpoint(path)).send()?.text()?)
    }

    fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        Ok(self.http.get(self.endpoint(path)).send()?.bytes()?.to_vec())
    }
}

impl TicketSource for RtClient {
    fn get_ticket(&self, id: u64) -> Result<Option<LegacyTicket>> {
        let body = self.get_text(&format!("ticket/{id}/show"))?;
        parse::parse_ticket(id, parse::strip_status_line(&body)?)
    }

    fn get_history(&self, id: u64) -> Result<Vec<LegacyHistoryItem>> {
        let body = self.get_text(&format!("ticket/{id}/history?format=l"))?;
        parse::parse_history(parse::strip_status_line(&body)?)
    }

    fn get_attachment(&self, ticket_id: u64, attachment_id: u64) -> Result<LegacyAttachment> {
        let body = self.get_bytes(&format!("ticket/{ticket_id}/attachments/{attachment_id}"))?;
        parse::parse_attachment(parse::strip_status_line_bytes(&body)?)
    }

    fn get_user(&self, username: &str) -> Result<LegacyUser> {
        let body = self.get_text(&format!("user/{username}"))?;
        parse::parse_user(username, parse::strip_status_line(&body)?)
    }
}
