use std::collections::HashMap;

use crate::error::{MigrateError, Result};
use crate::model::{AttachmentRef, LegacyAttachment, LegacyHistoryItem, LegacyTicket, LegacyUser};

fn protocol(message: impl Into<String>) -> MigrateError {
    MigrateError::Protocol(message.into())
}

fn check_status(line: &str) -> Result<()> {
    if !line.starts_with("RT/") {
        return Err(protocol(format!(
            "unexpected status line '{}'",
            line.trim_end()
        )));
    }
    if line.split_whitespace().nth(1) != Some("200") {
        return Err(protocol(format!("source returned '{}'", line.trim_end())));
    }
    Ok(())
}

/// Validate the status line and return the payload that follows it.
pub(crate) fn strip_status_line(body: &str) -> Result<&str> {
    let (status, rest) = body
        .split_once('\n')
        .ok_or_else(|| protocol("empty response"))?;
    check_status(status)?;
    Ok(rest.strip_prefix('\n').unwrap_or(rest))
}

/// Byte-level variant of [`strip_status_line`] for attachment bodies,
/// which may not be valid UTF-8 past the metadata section.
pub(crate) fn strip_status_line_bytes(body: &[u8]) -> Result<&[u8]> {
    let line_end = body
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| protocol("empty response"))?;
    check_status(&String::from_utf8_lossy(&body[..line_end]))?;
    let rest = &body[line_end + 1..];
    Ok(rest.strip_prefix(b"\n").unwrap_or(rest))
}

/// Parse a payload into ordered `(key, value)` pairs, folding indented
/// continuation lines into the preceding value. Comment lines (`#`) and
/// blank lines are skipped.
pub(crate) fn parse_fields(payload: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for line in payload.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with(' ') {
            let Some((key, value)) = fields.last_mut() else {
                continue;
            };
            let indent = key.len() + 2;
            let continuation = match line.get(..indent) {
                Some(prefix) if prefix.trim().is_empty() => &line[indent..],
                _ => line.trim_start(),
            };
            if value.is_empty() {
                value.push_str(continuation);
            } else {
                value.push('\n');
                value.push_str(continuation);
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(": ") {
            fields.push((key.to_string(), value.to_string()));
        } else if let Some(key) = line.strip_suffix(':') {
            fields.push((key.to_string(), String::new()));
        }
    }
    fields
}

fn field_map(payload: &str) -> HashMap<String, String> {
    parse_fields(payload).into_iter().collect()
}

fn required(map: &HashMap<String, String>, key: &str) -> Result<String> {
    map.get(key)
        .cloned()
        .ok_or_else(|| protocol(format!("missing field '{key}'")))
}

/// Parse a `ticket/<id>/show` payload. `Ok(None)` means the ticket does
/// not exist, which the extraction loop treats as "range exhausted".
pub(crate) fn parse_ticket(requested_id: u64, payload: &str) -> Result<Option<LegacyTicket>> {
    if payload.trim_start().starts_with('#') && payload.contains("does not exist") {
        return Ok(None);
    }
    let map = field_map(payload);
    let id = required(&map, "id")?;
    let numerical_id = id
        .rsplit('/')
        .next()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| protocol(format!("unparseable ticket id '{id}'")))?;
    Ok(Some(LegacyTicket {
        original_id: requested_id,
        numerical_id,
        subject: required(&map, "Subject")?,
        queue: required(&map, "Queue")?,
        status: required(&map, "Status")?,
        creator: required(&map, "Creator")?,
        owner: required(&map, "Owner")?,
        created: required(&map, "Created")?,
        resolved: map.get("Resolved").cloned().unwrap_or_else(|| "Not set".into()),
    }))
}

/// Parse a `ticket/<id>/history?format=l` payload into history items.
/// The leading `# n/n` summary chunk carries no fields and is skipped.
pub(crate) fn parse_history(payload: &str) -> Result<Vec<LegacyHistoryItem>> {
    let mut items = Vec::new();
    for chunk in payload.split("\n--\n") {
        let map = field_map(chunk);
        let Some(id) = map.get("id") else {
            continue;
        };
        let id = id
            .parse()
            .map_err(|_| protocol(format!("unparseable history id '{id}'")))?;
        items.push(LegacyHistoryItem {
            id,
            kind: required(&map, "Type")?,
            creator: required(&map, "Creator")?,
            created: required(&map, "Created")?,
            content: map.get("Content").cloned().unwrap_or_default(),
            attachments: parse_attachment_refs(map.get("Attachments").map_or("", String::as_str)),
        });
    }
    Ok(items)
}

/// Parse the `Attachments:` sublist of a history item. Each line reads
/// `<id>: <name> (<size>)`; the size suffix is dropped.
fn parse_attachment_refs(value: &str) -> Vec<AttachmentRef> {
    let mut refs = Vec::new();
    for line in value.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((id, name)) = line.split_once(':') else {
            continue;
        };
        let Ok(id) = id.trim().parse::<u64>() else {
            continue;
        };
        let name = name.trim();
        let name = match name.rfind(" (") {
            Some(pos) if name.ends_with(')') => name[..pos].trim_end(),
            _ => name,
        };
        refs.push(AttachmentRef {
            id,
            name: name.to_string(),
        });
    }
    refs
}

/// Parse a `user/<name>` payload.
pub(crate) fn parse_user(username: &str, payload: &str) -> Result<LegacyUser> {
    if payload.trim_start().starts_with('#') {
        return Err(protocol(format!("no such user '{username}'")));
    }
    let map = field_map(payload);
    Ok(LegacyUser {
        name: map
            .get("Name")
            .cloned()
            .unwrap_or_else(|| username.to_string()),
        email: map.get("EmailAddress").cloned().unwrap_or_default(),
        real_name: map.get("RealName").filter(|v| !v.is_empty()).cloned(),
    })
}

/// Parse a `ticket/<t>/attachments/<a>` payload: metadata fields followed
/// by the raw bytes under `Content:`.
pub(crate) fn parse_attachment(payload: &[u8]) -> Result<LegacyAttachment> {
    const MARKER: &[u8] = b"Content: ";
    let start = if payload.starts_with(MARKER) {
        Some(0)
    } else {
        payload
            .windows(MARKER.len() + 1)
            .position(|window| window[0] == b'\n' && &window[1..] == MARKER)
            .map(|pos| pos + 1)
    };
    let start = start.ok_or_else(|| protocol("attachment response has no Content field"))?;
    let meta = String::from_utf8_lossy(&payload[..start]);
    let map = field_map(&meta);
    Ok(LegacyAttachment {
        filename: map.get("Filename").cloned().unwrap_or_default(),
        content_type: required(&map, "ContentType")?,
        content: decode_content(&payload[start + MARKER.len()..]),
    })
}

/// Undo the wire encoding of an attachment's `Content:` block: every
/// continuation line carries a nine-space indent, and the payload ends
/// with a blank trailer.
fn decode_content(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for (i, line) in raw.split(|b| *b == b'\n').enumerate() {
        if i > 0 {
            out.push(b'\n');
            out.extend_from_slice(&line[line.len().min(9)..]);
        } else {
            out.extend_from_slice(line);
        }
    }
    if out.ends_with(b"\n\n\n") {
        out.truncate(out.len() - 3);
    }
    out
}
