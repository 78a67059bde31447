//! Numeric reply codes used by the server.

#![allow(non_camel_case_types)]

use std::fmt;

/// IRC numeric reply code.
///
/// Only the numerics this server actually emits are listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Response {
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 311 - WHOIS user line
    RPL_WHOISUSER = 311,
    /// 312 - WHOIS server line
    RPL_WHOISSERVER = 312,
    /// 315 - End of WHO list
    RPL_ENDOFWHO = 315,
    /// 317 - WHOIS idle and signon time
    RPL_WHOISIDLE = 317,
    /// 318 - End of WHOIS list
    RPL_ENDOFWHOIS = 318,
    /// 319 - WHOIS channel list
    RPL_WHOISCHANNELS = 319,
    /// 331 - No topic is set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Who set the topic, and when
    RPL_TOPICWHOTIME = 333,
    /// 352 - WHO reply line
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list
    RPL_ENDOFNAMES = 366,
    /// 372 - MOTD line
    RPL_MOTD = 372,
    /// 375 - Start of MOTD
    RPL_MOTDSTART = 375,
    /// 376 - End of MOTD
    RPL_ENDOFMOTD = 376,
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 404 - Cannot send to channel
    ERR_CANNOTSENDTOCHAN = 404,
    /// 412 - No text to send
    ERR_NOTEXTTOSEND = 412,
    /// 417 - Input line too long
    ERR_INPUTTOOLONG = 417,
    /// 422 - MOTD file is missing
    ERR_NOMOTD = 422,
    /// 431 - No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname in use
    ERR_NICKNAMEINUSE = 433,
    /// 442 - Not on channel
    ERR_NOTONCHANNEL = 442,
    /// 451 - Not registered
    ERR_NOTREGISTERED = 451,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - Already registered
    ERR_ALREADYREGISTERED = 462,
}

impl Response {
    /// The numeric value of this reply.
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.code())
    }
}
