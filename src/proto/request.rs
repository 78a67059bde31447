//! Parsed client requests.

/// A single client command, as framed and split by the transport.
///
/// `event_name` is always lowercase. Middle parameters land in `args`; a
/// final parameter introduced by `:` lands in `text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub event_name: String,
    pub args: Vec<String>,
    pub text: Option<String>,
}

impl Request {
    /// Build a request directly from its parts.
    pub fn new(event_name: &str, args: &[&str], text: Option<&str>) -> Self {
        Self {
            event_name: event_name.to_ascii_lowercase(),
            args: args.iter().map(|a| a.to_string()).collect(),
            text: text.map(str::to_string),
        }
    }

    /// Parse one raw protocol line (without its terminator).
    ///
    /// Message tags and a client-supplied prefix are accepted and discarded.
    /// Returns `None` for lines that carry no command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start_matches(' ');

        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r)?.trim_start_matches(' ');
        }
        if rest.starts_with(':') {
            rest = rest.split_once(' ').map(|(_, r)| r)?.trim_start_matches(' ');
        }

        let (middle, text) = match rest.find(" :") {
            Some(idx) => (&rest[..idx], Some(rest[idx + 2..].to_string())),
            None => (rest, None),
        };

        let mut words = middle.split(' ').filter(|w| !w.is_empty());
        let command = words.next()?;
        let args = words.map(str::to_string).collect();

        Some(Self {
            event_name: command.to_ascii_lowercase(),
            args,
            text,
        })
    }

    /// Positional argument `n`, if present.
    #[inline]
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.args.get(n).map(String::as_str)
    }

    /// Trailing text, if the line carried one.
    #[inline]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Trailing text, falling back to positional argument `n`.
    ///
    /// Clients commonly omit the `:` on single-word trailing parameters
    /// (`PRIVMSG bob hi`).
    pub fn text_or_arg(&self, n: usize) -> Option<&str> {
        self.text().or_else(|| self.arg(n))
    }
}
