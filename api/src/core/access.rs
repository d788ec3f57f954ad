/// Allow-list of chat ids that may use the bot.
///
/// Positive ids name users (or private chats): they match either the sender
/// or the chat. Negative ids name groups and only match the chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    ids: Vec<i64>,
}

impl AccessList {
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn is_authorized(&self, user_id: i64, chat_id: i64) -> bool {
        self.ids.iter().any(|&id| {
            if id > 0 {
                id == user_id || id == chat_id
            } else {
                id < 0 && id == chat_id
            }
        })
    }

    /// First configured id; receives error diagnostics.
    pub fn admin(&self) -> Option<i64> {
        self.ids.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_match_sender_or_chat() {
        let acl = AccessList::new(vec![42]);
        assert!(acl.is_authorized(42, -900));
        assert!(acl.is_authorized(7, 42));
        assert!(!acl.is_authorized(7, 8));
    }

    #[test]
    fn group_ids_match_only_the_chat() {
        let acl = AccessList::new(vec![-100123]);
        assert!(acl.is_authorized(5, -100123));
        assert!(!acl.is_authorized(-100123, 5));
    }

    #[test]
    fn empty_list_denies_everyone() {
        let acl = AccessList::default();
        assert!(!acl.is_authorized(1, 1));
        assert_eq!(acl.admin(), None);
    }
}
