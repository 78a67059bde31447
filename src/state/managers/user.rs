//! Nickname registry.
//!
//! `UserManager` owns every registered [`Session`] and the map from
//! normalized nickname to session id. It is the only place that decides
//! whether a nickname is free, so uniqueness holds by construction.

use crate::error::HandlerError;
use crate::proto::Reply;
use crate::state::{Connection, Identity, Session, Uid, UidGenerator};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// First char is a word character, the rest word characters or hyphens,
/// sixteen characters at most.
static NICK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z_][0-9A-Za-z_-]{0,15}$").expect("nickname pattern is valid")
});

/// Validate `name` and return its registry key.
pub fn normalize(name: &str) -> Result<String, HandlerError> {
    if NICK_PATTERN.is_match(name) {
        Ok(name.to_ascii_lowercase())
    } else {
        Err(HandlerError::ErroneousNickname(name.to_string()))
    }
}

/// Tracks registered sessions and their nicknames.
#[derive(Debug, Default)]
pub struct UserManager {
    users: HashMap<Uid, Session>,
    nicks: HashMap<String, Uid>,
    uid_gen: UidGenerator,
}

impl UserManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session under `name`.
    ///
    /// Fails without touching the registry if the nickname is malformed or
    /// already claimed (case-insensitively).
    pub fn create(
        &mut self,
        name: &str,
        connection: Arc<dyn Connection>,
        identity: Identity,
        realname: &str,
    ) -> Result<Uid, HandlerError> {
        let key = normalize(name)?;
        if self.nicks.contains_key(&key) {
            return Err(HandlerError::NicknameInUse(name.to_string()));
        }

        let uid = self.uid_gen.next();
        let session = Session::new(
            uid,
            name.to_string(),
            connection,
            identity,
            realname.to_string(),
        );
        self.nicks.insert(key, uid);
        self.users.insert(uid, session);
        Ok(uid)
    }

    /// Look up a session by nickname. Malformed names simply do not match.
    pub fn find(&self, name: &str) -> Option<&Session> {
        let key = normalize(name).ok()?;
        self.nicks.get(&key).and_then(|uid| self.users.get(uid))
    }

    pub fn get(&self, uid: Uid) -> Option<&Session> {
        self.users.get(&uid)
    }

    pub fn get_mut(&mut self, uid: Uid) -> Option<&mut Session> {
        self.users.get_mut(&uid)
    }

    /// Move the registry entry for `old` to `new`.
    ///
    /// All-or-nothing: on any error the entry for `old` is left untouched.
    /// Renaming onto a different case of one's own nickname is allowed.
    /// The session's `nick` field is not updated here; the caller does that
    /// once peers have been told. Returns the new registry key.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, HandlerError> {
        let new_key = normalize(new)?;
        let old_key = old.to_ascii_lowercase();
        let uid = *self
            .nicks
            .get(&old_key)
            .ok_or_else(|| HandlerError::NoSuchNickOrChannel(old.to_string()))?;

        if let Some(holder) = self.nicks.get(&new_key)
            && *holder != uid
        {
            return Err(HandlerError::NicknameInUse(new.to_string()));
        }

        self.nicks.remove(&old_key);
        self.nicks.insert(new_key.clone(), uid);
        Ok(new_key)
    }

    /// Remove the session registered under `name`. Absent names are a no-op.
    pub fn delete(&mut self, name: &str) -> Option<Session> {
        let uid = self.nicks.remove(&name.to_ascii_lowercase())?;
        self.users.remove(&uid)
    }

    /// Deliver `reply` to each session in `uids` except `except`.
    ///
    /// Exclusion compares session ids, not nicknames. Ids that no longer
    /// resolve are skipped. Returns how many sessions were reached.
    pub fn broadcast_to<I>(&self, uids: I, reply: &Reply, except: Option<Uid>) -> usize
    where
        I: IntoIterator<Item = Uid>,
    {
        let mut delivered = 0;
        for uid in uids {
            if Some(uid) == except {
                continue;
            }
            if let Some(session) = self.users.get(&uid) {
                session.respond_with(reply.clone());
                delivered += 1;
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::RecordingConnection;

    fn register(users: &mut UserManager, nick: &str) -> (Uid, Arc<RecordingConnection>) {
        let conn = RecordingConnection::new();
        let uid = users
            .create(nick, conn.clone(), Identity::new("user"), "Real Name")
            .unwrap();
        (uid, conn)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Alice").unwrap(), "alice");
        assert_eq!(normalize("a-b_c9").unwrap(), "a-b_c9");
        assert_eq!(normalize("_x").unwrap(), "_x");
        assert_eq!(normalize("abcdefghijklmnop").unwrap(), "abcdefghijklmnop");

        for bad in ["", "-alice", "al ice", "al!ce", "#chan", "abcdefghijklmnopq"] {
            assert_eq!(
                normalize(bad),
                Err(HandlerError::ErroneousNickname(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_create_rejects_case_insensitive_duplicate() {
        let mut users = UserManager::new();
        let (alice, _) = register(&mut users, "Alice");

        let result = users.create(
            "alice",
            RecordingConnection::new(),
            Identity::new("other"),
            "Other",
        );
        assert_eq!(result, Err(HandlerError::NicknameInUse("alice".to_string())));

        // The existing registration is untouched.
        assert_eq!(users.len(), 1);
        let found = users.find("ALICE").unwrap();
        assert_eq!(found.uid, alice);
        assert_eq!(found.nick, "Alice");
        assert_eq!(found.identity.username, "user");
    }

    #[test]
    fn test_create_rejects_malformed_nick() {
        let mut users = UserManager::new();
        let result = users.create("9-lives!", RecordingConnection::new(), Identity::new("u"), "");
        assert!(matches!(result, Err(HandlerError::ErroneousNickname(_))));
        assert!(users.is_empty());
    }

    #[test]
    fn test_find_absent_is_none() {
        let users = UserManager::new();
        assert!(users.find("nobody").is_none());
        assert!(users.find("not valid").is_none());
    }

    #[test]
    fn test_rename_moves_entry() {
        let mut users = UserManager::new();
        let (alice, _) = register(&mut users, "alice");

        assert_eq!(users.rename("alice", "Bob").unwrap(), "bob");
        assert!(users.find("alice").is_none());
        assert_eq!(users.find("bob").unwrap().uid, alice);
    }

    #[test]
    fn test_rename_onto_taken_nick_is_all_or_nothing() {
        let mut users = UserManager::new();
        let (alice, _) = register(&mut users, "alice");
        let (bob, _) = register(&mut users, "bob");

        assert_eq!(
            users.rename("alice", "BOB"),
            Err(HandlerError::NicknameInUse("BOB".to_string()))
        );
        assert_eq!(users.find("alice").unwrap().uid, alice);
        assert_eq!(users.find("alice").unwrap().nick, "alice");
        assert_eq!(users.find("bob").unwrap().uid, bob);
    }

    #[test]
    fn test_rename_case_change_of_own_nick() {
        let mut users = UserManager::new();
        let (alice, _) = register(&mut users, "alice");
        assert_eq!(users.rename("alice", "ALICE").unwrap(), "alice");
        assert_eq!(users.find("alice").unwrap().uid, alice);
    }

    #[test]
    fn test_rename_to_malformed_nick() {
        let mut users = UserManager::new();
        register(&mut users, "alice");
        assert!(matches!(
            users.rename("alice", "bad nick"),
            Err(HandlerError::ErroneousNickname(_))
        ));
        assert!(users.find("alice").is_some());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut users = UserManager::new();
        let (alice, _) = register(&mut users, "Alice");

        assert_eq!(users.delete("alice").map(|s| s.uid), Some(alice));
        assert!(users.delete("alice").is_none());
        assert!(users.find("alice").is_none());
        assert!(users.get(alice).is_none());
    }

    #[test]
    fn test_broadcast_to_skips_excluded_session() {
        let mut users = UserManager::new();
        let (alice, alice_conn) = register(&mut users, "alice");
        let (bob, bob_conn) = register(&mut users, "bob");
        let (carol, carol_conn) = register(&mut users, "carol");

        let reply = Reply::command("hector", "NOTICE", vec!["*".into()], Some("hello"));
        let delivered = users.broadcast_to([alice, bob, carol], &reply, Some(alice));

        assert_eq!(delivered, 2);
        assert_eq!(alice_conn.count("hello"), 0);
        assert_eq!(bob_conn.count("hello"), 1);
        assert_eq!(carol_conn.count("hello"), 1);
    }

    #[test]
    fn test_broadcast_exclusion_survives_rename() {
        let mut users = UserManager::new();
        let (alice, alice_conn) = register(&mut users, "alice");
        let (bob, bob_conn) = register(&mut users, "bob");

        users.rename("alice", "alicia").unwrap();
        let reply = Reply::command("hector", "NOTICE", vec!["*".into()], Some("ping"));
        users.broadcast_to([alice, bob], &reply, Some(alice));

        assert_eq!(alice_conn.count("ping"), 0);
        assert_eq!(bob_conn.count("ping"), 1);
    }
}
