//! Outgoing reply model and wire serialization.

use super::Response;
use std::fmt;

/// The command part of a reply: a protocol word or a numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Command(&'static str),
    Numeric(Response),
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verb::Command(word) => f.write_str(word),
            Verb::Numeric(response) => write!(f, "{response}"),
        }
    }
}

/// A reply ready for a connection to emit.
///
/// `text` is serialized as the trailing parameter and is always prefixed
/// with `:`, even when it has no spaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub prefix: Option<String>,
    pub verb: Verb,
    pub args: Vec<String>,
    pub text: Option<String>,
}

impl Reply {
    /// A command reply authored by `source` (a user source or the server name).
    pub fn command(
        source: impl Into<String>,
        command: &'static str,
        args: Vec<String>,
        text: Option<&str>,
    ) -> Self {
        Self {
            prefix: Some(source.into()),
            verb: Verb::Command(command),
            args,
            text: text.map(str::to_string),
        }
    }

    /// A numeric reply from `server_name` addressed to `nick`.
    ///
    /// The recipient's nickname is always the first parameter.
    pub fn numeric(
        server_name: &str,
        nick: &str,
        response: Response,
        args: Vec<String>,
        text: &str,
    ) -> Self {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(nick.to_string());
        params.extend(args);
        Self {
            prefix: Some(server_name.to_string()),
            verb: Verb::Numeric(response),
            args: params,
            text: Some(text.to_string()),
        }
    }

    /// `ERROR :<text>`, sent right before the server drops a link.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            prefix: None,
            verb: Verb::Command("ERROR"),
            args: Vec::new(),
            text: Some(text.into()),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.verb)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(text) = &self.text {
            write!(f, " :{text}")?;
        }
        Ok(())
    }
}
