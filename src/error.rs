//! Protocol-level rejections raised by the core.
//!
//! None of these are faults: the connection layer translates each one into
//! a numeric reply and keeps serving the client.

use crate::proto::{Reply, Response};
use thiserror::Error;

/// Errors that can occur during command handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),

    #[error("cannot send to channel: {0}")]
    CannotSendToChannel(String),

    #[error("no such nick/channel: {0}")]
    NoSuchNickOrChannel(String),

    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("no text to send")]
    NoTextToSend,

    #[error("not registered")]
    NotRegistered,
}

impl HandlerError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::ErroneousNickname(_) => "erroneous_nickname",
            Self::CannotSendToChannel(_) => "cannot_send_to_channel",
            Self::NoSuchNickOrChannel(_) => "no_such_nick_or_channel",
            Self::NeedMoreParams => "need_more_params",
            Self::NoTextToSend => "no_text_to_send",
            Self::NotRegistered => "not_registered",
        }
    }

    /// The numeric reply that reports this error.
    pub fn response(&self) -> Response {
        match self {
            Self::NicknameInUse(_) => Response::ERR_NICKNAMEINUSE,
            Self::ErroneousNickname(_) => Response::ERR_ERRONEUSNICKNAME,
            Self::CannotSendToChannel(_) => Response::ERR_CANNOTSENDTOCHAN,
            Self::NoSuchNickOrChannel(_) => Response::ERR_NOSUCHNICK,
            Self::NeedMoreParams => Response::ERR_NEEDMOREPARAMS,
            Self::NoTextToSend => Response::ERR_NOTEXTTOSEND,
            Self::NotRegistered => Response::ERR_NOTREGISTERED,
        }
    }

    /// Convert to an IRC error reply.
    ///
    /// `nick` is the requester's nickname, or `*` before registration.
    /// `command` is the uppercased command word that failed.
    pub fn to_reply(&self, server_name: &str, nick: &str, command: &str) -> Reply {
        let (args, text) = match self {
            Self::NicknameInUse(bad) => (vec![bad.clone()], "Nickname is already in use"),
            Self::ErroneousNickname(bad) => (vec![bad.clone()], "Erroneous nickname"),
            Self::CannotSendToChannel(chan) => (vec![chan.clone()], "Cannot send to channel"),
            Self::NoSuchNickOrChannel(target) => (vec![target.clone()], "No such nick/channel"),
            Self::NeedMoreParams => (vec![command.to_string()], "Not enough parameters"),
            Self::NoTextToSend => (Vec::new(), "No text to send"),
            Self::NotRegistered => (Vec::new(), "You have not registered"),
        };
        Reply::numeric(server_name, nick, self.response(), args, text)
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
