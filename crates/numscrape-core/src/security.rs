use crate::domain::UserId;

// ============== Authorization ==============

/// Is `user_id` allowed to run scrape commands?
///
/// An empty allow-list leaves the bot open to everyone; a message without a
/// sender is never authorized.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }
    allowed_users.contains(&user_id.0)
}
