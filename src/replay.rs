use std::collections::{BTreeMap, BTreeSet};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use crate::cache::Snapshot;
use crate::error::{MigrateError, Result};
use crate::identity::UserDirectory;
use crate::model::{LegacyAttachment, LegacyHistoryItem, LegacyTicket, LegacyUser, TicketRecord};
use crate::zammad::HelpdeskTarget;

/// Group every imported ticket lands in.
const DEFAULT_GROUP: &str = "Users";

/// Target state for merge stubs and for legacy end states.
const CLOSED_STATE: u32 = 4;

/// Map a legacy status onto a target `state_id`. Anything outside the
/// legacy tracker's fixed vocabulary is a fatal error.
pub fn state_id(status: &str) -> Result<u32> {
    match status {
        "new" => Ok(1),
        "open" => Ok(2),
        "resolved" | "rejected" | "deleted" => Ok(CLOSED_STATE),
        other => Err(MigrateError::UnknownStatus(other.to_string())),
    }
}

/// Tag derived from a legacy queue name: the first whitespace-delimited
/// token, lowercased. `None` for blank queue names.
pub fn queue_tag(queue: &str) -> Option<String> {
    queue
        .split_whitespace()
        .next()
        .map(|token| token.to_lowercase())
}

/// Deep link into the legacy tracker's web UI, derived from the REST
/// root by stripping its interface suffix.
pub fn display_url(rt_url: &str, id: u64) -> String {
    let root = rt_url.trim_end_matches('/');
    let root = root.strip_suffix("/REST/1.0").unwrap_or(root);
    format!("{root}/Ticket/Display.html?id={id}")
}

fn provenance_label(ticket: &LegacyTicket) -> String {
    format!("RT-{}", ticket.original_id)
}

fn provenance_note(ticket: &LegacyTicket, rt_url: &str) -> String {
    format!(
        "Ticket imported from Request Tracker\n\nCreated: {}\nResolved: {}\n\n{}",
        ticket.created,
        ticket.resolved,
        display_url(rt_url, ticket.original_id)
    )
}

/// Transport form of a history item's attachments. Unnamed and
/// signature blobs are dropped; bytes are base64-encoded; filename and
/// MIME type ride along verbatim.
fn article_files(
    item: &LegacyHistoryItem,
    attachments: &BTreeMap<u64, LegacyAttachment>,
) -> Result<Vec<Value>> {
    let mut files = Vec::new();
    for reference in &item.attachments {
        let Some(attachment) = attachments.get(&reference.id) else {
            return Err(MigrateError::SnapshotGap(format!(
                "attachment {}",
                reference.id
            )));
        };
        if attachment.is_noise() {
            continue;
        }
        files.push(json!({
            "filename": attachment.filename,
            "data": STANDARD.encode(&attachment.content),
            "mime-type": attachment.content_type,
        }));
    }
    Ok(files)
}

/// Replay the whole snapshot: queue tags first, then every ticket in
/// extraction order.
pub fn load<T: HelpdeskTarget>(
    target: &mut T,
    directory: &mut UserDirectory,
    snapshot: &Snapshot,
    rt_url: &str,
) -> Result<()> {
    let mut existing: BTreeSet<String> = target.list_tags()?.into_iter().collect();
    for queue in &snapshot.queues {
        let Some(tag) = queue_tag(queue) else {
            continue;
        };
        if !existing.contains(&tag) {
            target.create_tag(&tag)?;
            existing.insert(tag);
        }
    }

    for record in &snapshot.tickets {
        replay_ticket(target, directory, snapshot, record, rt_url)?;
    }
    Ok(())
}

fn lookup_user<'a>(snapshot: &'a Snapshot, username: &str) -> Result<&'a LegacyUser> {
    snapshot
        .users
        .get(username)
        .ok_or_else(|| MigrateError::SnapshotGap(format!("user '{username}'")))
}

fn replay_ticket<T: HelpdeskTarget>(
    target: &mut T,
    directory: &mut UserDirectory,
    snapshot: &Snapshot,
    record: &TicketRecord,
    rt_url: &str,
) -> Result<()> {
    let ticket = &record.ticket;
    let label = provenance_label(ticket);
    println!("Importing {label}");

    let creator = lookup_user(snapshot, &ticket.creator)?;
    let customer = directory.resolve(target, creator)?;

    if ticket.is_merged() {
        // Stub pointing at the surviving ticket; no tags, no history.
        target.create_ticket(
            Some(&customer.login),
            &json!({
                "title": format!("{} [{label}]", ticket.subject),
                "group": DEFAULT_GROUP,
                "state_id": CLOSED_STATE,
                "customer_id": customer.id,
                "note": format!("RT-import:{}", ticket.original_id),
                "article": {
                    "subject": ticket.subject,
                    "body": format!("Merged into RT-{}.", ticket.numerical_id),
                },
            }),
        )?;
        return Ok(());
    }

    let first_body = record
        .history
        .first()
        .map(|item| item.content.as_str())
        .unwrap_or_default();
    let created = target.create_ticket(
        Some(&customer.login),
        &json!({
            "title": format!("{} [{label}]", ticket.subject),
            "group": DEFAULT_GROUP,
            "state_id": state_id(&ticket.status)?,
            "customer_id": customer.id,
            "note": format!("RT-import:{}", ticket.original_id),
            "article": {
                "subject": ticket.subject,
                "body": first_body,
            },
        }),
    )?;

    if let Some(tag) = queue_tag(&ticket.queue) {
        target.assign_tag("Ticket", created.id, &tag)?;
    }

    target.create_article(
        None,
        &json!({
            "ticket_id": created.id,
            "body": provenance_note(ticket, rt_url),
            "internal": true,
        }),
    )?;

    for item in &record.history {
        if !item.is_replayable() {
            continue;
        }
        let files = article_files(item, &snapshot.attachments)?;
        let author_record = lookup_user(snapshot, &item.creator)?;
        let author = directory.resolve(target, author_record)?;
        let payload = json!({
            "ticket_id": created.id,
            "body": item.content,
            "internal": item.kind == "Comment",
            "attachments": files,
        });

        // The article API attributes authorship to the ticket's customer
        // in some contexts, so a non-agent author who is not the customer
        // temporarily becomes the customer for the duration of the post.
        if author.id != customer.id && !author.is_agent() {
            target.update_ticket(created.id, &json!({ "customer_id": author.id }))?;
            let posted = target.create_article(Some(&author.login), &payload);
            let restored = target.update_ticket(created.id, &json!({ "customer_id": customer.id }));
            posted?;
            restored?;
        } else {
            target.create_article(Some(&author.login), &payload)?;
        }
    }

    Ok(())
}
