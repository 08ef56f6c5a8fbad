use crate::cache::Snapshot;
use crate::error::Result;
use crate::model::TicketRecord;
use crate::rt::TicketSource;

/// Extract tickets `start..end` (ascending) into a fresh snapshot.
///
/// A nonexistent ticket means the range has run past the last ticket and
/// iteration stops early. Users and attachments are fetched at most once
/// each, keyed by username and attachment ID. A merged ticket (reported
/// ID differs from the requested one) gets an empty history: its real
/// history lives on the surviving ticket.
pub fn extract<S: TicketSource>(source: &S, start: u64, end: u64) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    for id in start..end {
        println!("Loading ticket {id}");
        let Some(ticket) = source.get_ticket(id)? else {
            break;
        };
        snapshot.queues.insert(ticket.queue.clone());
        ensure_user(source, &mut snapshot, &ticket.creator)?;
        ensure_user(source, &mut snapshot, &ticket.owner)?;

        let history = if ticket.is_merged() {
            Vec::new()
        } else {
            source.get_history(id)?
        };
        for item in &history {
            ensure_user(source, &mut snapshot, &item.creator)?;
            for attachment in &item.attachments {
                if !snapshot.attachments.contains_key(&attachment.id) {
                    snapshot
                        .attachments
                        .insert(attachment.id, source.get_attachment(id, attachment.id)?);
                }
            }
        }
        snapshot.tickets.push(TicketRecord { ticket, history });
    }
    Ok(snapshot)
}

fn ensure_user<S: TicketSource>(
    source: &S,
    snapshot: &mut Snapshot,
    username: &str,
) -> Result<()> {
    if !snapshot.users.contains_key(username) {
        let user = source.get_user(username)?;
        snapshot.users.insert(username.to_string(), user);
    }
    Ok(())
}
