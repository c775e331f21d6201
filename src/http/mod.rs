//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, per-connection tasks)
//!     → handler.rs (one request per connection)
//!     → request.rs (request line and headers)
//!     → query.rs (game and dice from the target)
//!     → [dice engine evaluates]
//!     → response.rs (status line, JSON body)
//!     → Close connection
//! ```

pub mod handler;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{ConnectionHandler, HandleError};
pub use query::{decode_query, DiceQuery, QueryError};
pub use request::{read_request, RequestError, RequestLine};
pub use response::{HttpStatus, Response, ResponseBody};
pub use server::DiceServer;
