//! Request head reading.
//!
//! # Responsibilities
//! - Read the request line and headers up to the blank line
//! - Extract the request target (path + query)
//! - Enforce the head size limit
//!
//! # Design Decisions
//! - Parsing is a small state machine fed one line at a time, so it can be
//!   tested without sockets
//! - Headers are consumed and discarded; only the first line is interpreted
//! - End of stream is not an error: the parser simply stops

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// The first line of a request: `METHOD TARGET [VERSION]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Split on whitespace; at least method and target are required.
    pub fn parse(line: &str) -> Result<Self, RequestError> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(method), Some(target)) => Ok(Self {
                method: method.to_string(),
                target: target.to_string(),
                version: tokens.next().unwrap_or_default().to_string(),
            }),
            _ => Err(RequestError::MalformedRequestLine(line.to_string())),
        }
    }
}

/// Errors raised while reading a request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request line '{0}'")]
    MalformedRequestLine(String),

    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    #[error("timed out reading request head after {0}s")]
    Timeout(u64),

    #[error("I/O error reading request: {0}")]
    Io(#[from] std::io::Error),
}

impl RequestError {
    /// Transport failures end the connection without a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, RequestError::Timeout(_) | RequestError::Io(_))
    }
}

/// Parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Waiting for the request line.
    RequestLine,
    /// Skipping header lines.
    Headers,
    /// Blank line (or end of stream) reached.
    Done,
}

/// Line-fed request head parser.
#[derive(Debug)]
pub struct RequestParser {
    state: ParseState,
    request_line: Option<RequestLine>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::RequestLine,
            request_line: None,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Feed one line with its terminator already stripped.
    pub fn feed_line(&mut self, line: &str) -> Result<ParseState, RequestError> {
        self.state = match self.state {
            ParseState::RequestLine if line.is_empty() => ParseState::Done,
            ParseState::RequestLine => {
                self.request_line = Some(RequestLine::parse(line)?);
                ParseState::Headers
            }
            ParseState::Headers if line.is_empty() => ParseState::Done,
            ParseState::Headers => ParseState::Headers,
            ParseState::Done => ParseState::Done,
        };
        Ok(self.state)
    }

    /// End of stream: whatever was seen so far is the result.
    pub fn finish(mut self) -> Option<RequestLine> {
        self.state = ParseState::Done;
        self.request_line
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip one trailing `\n` and then one trailing `\r`.
fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Read lines until the header/body boundary or end of stream.
///
/// Returns `None` when the stream ended (or a blank line arrived) before any
/// request line.
pub async fn read_request<R>(
    reader: &mut R,
    max_head_bytes: usize,
) -> Result<Option<RequestLine>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut parser = RequestParser::new();
    let mut consumed = 0usize;
    let mut buf = Vec::new();

    while parser.state() != ParseState::Done {
        buf.clear();
        // One byte past the budget is enough to tell the limit was crossed.
        let budget = max_head_bytes.saturating_sub(consumed) as u64 + 1;
        let n = (&mut *reader).take(budget).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }
        consumed += n;
        if consumed > max_head_bytes {
            return Err(RequestError::HeadTooLarge(max_head_bytes));
        }

        let text = String::from_utf8_lossy(&buf);
        parser.feed_line(chomp(&text))?;
    }

    Ok(parser.finish())
}
