//! Response encoding and transmission.
//!
//! # Responsibilities
//! - Map outcomes to one of three status lines
//! - Serialize `{"error": ..}` / `{"body": ..}` bodies
//! - Write the response and close the connection
//!
//! # Design Decisions
//! - Bodies go through serde_json so quotes, backslashes and newlines in
//!   roll text are escaped
//! - Unknown status codes are sent as 500
//! - Every response closes the connection; keep-alive is never offered

use std::fmt;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

const LINE_END: &str = "\r\n";
const FALLBACK_BODY: &str = r#"{"error":"internal server error"}"#;

/// The only statuses this server ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok,
    BadRequest,
    InternalServerError,
}

impl HttpStatus {
    /// Anything other than 200 or 400 becomes 500.
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => HttpStatus::Ok,
            400 => HttpStatus::BadRequest,
            _ => HttpStatus::InternalServerError,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            HttpStatus::Ok => 200,
            HttpStatus::BadRequest => 400,
            HttpStatus::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// JSON body: exactly one of `error` or `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResponseBody {
    #[serde(rename = "error")]
    Error(String),
    #[serde(rename = "body")]
    Body(String),
}

/// A complete response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: HttpStatus,
    pub body: ResponseBody,
}

impl Response {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            status: HttpStatus::Ok,
            body: ResponseBody::Body(text.into()),
        }
    }

    pub fn error(status: HttpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Error(message.into()),
        }
    }

    /// Status line, content type, blank line, body; each CRLF-terminated.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (status, json) = match serde_json::to_string(&self.body) {
            Ok(json) => (self.status, json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                (HttpStatus::InternalServerError, FALLBACK_BODY.to_string())
            }
        };

        let head = format!("HTTP/1.1 {status}{LINE_END}Content-Type: application/json{LINE_END}");
        format!("{head}{LINE_END}{json}{LINE_END}").into_bytes()
    }

    /// Write the response, then shut down the write side.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await?;
        writer.shutdown().await
    }
}
