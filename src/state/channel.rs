//! Channel entity: member set, topic, and the replies a channel emits.
//!
//! A channel stores member *ids* only. Sessions never store their channel
//! list; it is always derived from the channel directory.

use crate::proto::{Reply, Response};
use crate::state::{ServerInfo, Session, Uid, UserManager};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Channel topic with metadata.
#[derive(Debug, Clone)]
pub struct Topic {
    pub text: String,
    pub set_by: String,
    pub set_at: DateTime<Utc>,
}

/// A named group destination.
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    pub topic: Option<Topic>,
    /// Ordered by session id, i.e. connection order.
    members: BTreeSet<Uid>,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            topic: None,
            members: BTreeSet::new(),
        }
    }

    pub fn has_session(&self, uid: Uid) -> bool {
        self.members.contains(&uid)
    }

    pub fn members(&self) -> impl Iterator<Item = Uid> + '_ {
        self.members.iter().copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Add `session` and announce it.
    ///
    /// Everyone on the channel, the joiner included, sees the JOIN; the
    /// joiner then gets the topic (if any) and the names list. Joining a
    /// channel one is already on does nothing. Returns whether the session
    /// was added.
    pub fn join(&mut self, session: &Session, users: &UserManager, server: &ServerInfo) -> bool {
        if !self.members.insert(session.uid) {
            return false;
        }

        let join = Reply::command(
            session.source(&server.name),
            "JOIN",
            vec![self.name.clone()],
            None,
        );
        self.broadcast(users, &join, None);

        if self.topic.is_some() {
            self.respond_to_topic(session, server);
        }
        self.respond_to_names(session, users, server);
        true
    }

    /// Explicit PART: notify members (the leaver included), then remove.
    pub fn part(
        &mut self,
        session: &Session,
        reason: Option<&str>,
        users: &UserManager,
        server: &ServerInfo,
    ) {
        if !self.has_session(session.uid) {
            session.numeric(
                &server.name,
                Response::ERR_NOTONCHANNEL,
                vec![self.name.clone()],
                "You're not on that channel",
            );
            return;
        }

        let part = Reply::command(
            session.source(&server.name),
            "PART",
            vec![self.name.clone()],
            reason,
        );
        self.broadcast(users, &part, None);
        self.remove(session.uid);
    }

    /// Silent removal. Idempotent.
    pub fn remove(&mut self, uid: Uid) -> bool {
        self.members.remove(&uid)
    }

    /// RPL_NAMREPLY + RPL_ENDOFNAMES to `to`.
    pub fn respond_to_names(&self, to: &Session, users: &UserManager, server: &ServerInfo) {
        let names = self
            .members()
            .filter_map(|uid| users.get(uid))
            .map(|member| member.nick.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        to.numeric(
            &server.name,
            Response::RPL_NAMREPLY,
            vec!["=".to_string(), self.name.clone()],
            &names,
        );
        to.numeric(
            &server.name,
            Response::RPL_ENDOFNAMES,
            vec![self.name.clone()],
            "End of /NAMES list.",
        );
    }

    /// Set (or clear, with empty text) the topic.
    ///
    /// Only members may change the topic; others get ERR_NOTONCHANNEL. A
    /// successful change is broadcast to every member.
    pub fn change_topic(
        &mut self,
        session: &Session,
        text: &str,
        users: &UserManager,
        server: &ServerInfo,
    ) {
        if !self.has_session(session.uid) {
            session.numeric(
                &server.name,
                Response::ERR_NOTONCHANNEL,
                vec![self.name.clone()],
                "You're not on that channel",
            );
            return;
        }

        self.topic = (!text.is_empty()).then(|| Topic {
            text: text.to_string(),
            set_by: session.nick.clone(),
            set_at: Utc::now(),
        });

        let topic = Reply::command(
            session.source(&server.name),
            "TOPIC",
            vec![self.name.clone()],
            Some(text),
        );
        self.broadcast(users, &topic, None);
    }

    /// RPL_TOPIC and RPL_TOPICWHOTIME, or RPL_NOTOPIC, to `to`.
    pub fn respond_to_topic(&self, to: &Session, server: &ServerInfo) {
        match &self.topic {
            Some(topic) => {
                to.numeric(
                    &server.name,
                    Response::RPL_TOPIC,
                    vec![self.name.clone()],
                    &topic.text,
                );
                to.numeric(
                    &server.name,
                    Response::RPL_TOPICWHOTIME,
                    vec![self.name.clone(), topic.set_by.clone()],
                    &topic.set_at.timestamp().to_string(),
                );
            }
            None => to.numeric(
                &server.name,
                Response::RPL_NOTOPIC,
                vec![self.name.clone()],
                "No topic is set",
            ),
        }
    }

    /// Deliver `reply` to every current member except `except`.
    pub fn broadcast(&self, users: &UserManager, reply: &Reply, except: Option<Uid>) -> usize {
        users.broadcast_to(self.members(), reply, except)
    }
}
