//! Core building blocks for banyan-shield.
//!
//! This crate holds the pieces every other banyan crate leans on:
//!
//! - [`HttpRequest`] / [`HttpResponse`] value types
//! - the framework [`Error`] type and its HTTP status mapping
//! - [`RuntimeMode`], the development/production switch
//! - [`Server`], a small hyper-based HTTP/1 server driving a [`RequestHandler`]
//! - [`logging`], tracing subscriber setup driven by `BANYAN_LOG_*`
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use banyan_core::{Error, HttpRequest, HttpResponse, RequestHandler, Server};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl RequestHandler for Hello {
//!     async fn handle(&self, _req: HttpRequest) -> Result<HttpResponse, Error> {
//!         Ok(HttpResponse::ok().with_body(b"hello".to_vec()))
//!     }
//! }
//!
//! # async fn run() -> Result<(), Error> {
//! Server::new(([127, 0, 0, 1], 3000).into(), Hello).listen().await
//! # }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod mode;
pub mod server;

pub use error::{Error, Result};
pub use http::{HttpRequest, HttpResponse};
pub use mode::{ParseModeError, RuntimeMode};
pub use server::{RequestHandler, Server};
