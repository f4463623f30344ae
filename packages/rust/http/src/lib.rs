//! JSON-over-HTTP API for DraftDeck.
//!
//! [`Router`] maps an [`ApiRequest`] to an [`ApiResponse`] without touching
//! the network; [`HttpServer`] feeds it from a `tiny_http` listener.

mod message;
mod router;
mod server;

pub use message::{ApiRequest, ApiResponse, Method};
pub use router::Router;
pub use server::{HttpServer, ShutdownHandle};
