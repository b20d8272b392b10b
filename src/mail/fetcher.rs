use crate::domain::email::EmailCollection;
use crate::mail::decoders::decode_message;
use crate::mail::gmail::MailboxSession;

/// Fetch and decode up to `max_results` messages. Never fails: a listing error yields
/// an empty collection, and messages that cannot be fetched or decoded are skipped.
pub fn fetch_emails(session: &dyn MailboxSession, max_results: u32) -> EmailCollection {
    let ids = match session.list_messages(max_results) {
        Ok(ids) => ids,
        Err(e) => {
            log::error!("listing messages failed: {e:#}");
            return EmailCollection::default();
        }
    };
    log::info!("fetching {} messages", ids.len());

    let mut emails = EmailCollection::default();
    for id in &ids {
        let message = match session.get_message(id) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("fetching message {id} failed: {e:#}");
                continue;
            }
        };
        match decode_message(&message) {
            Ok(record) => emails.push(record),
            Err(e) => log::warn!("dropping message {id}: {e}"),
        }
    }

    log::info!("decoded {}/{} messages", emails.len(), ids.len());
    emails
}
