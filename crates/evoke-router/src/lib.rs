//! EVOKE Router
//!
//! The router is the dispatch hub for event-based socket connections:
//! - Maps inbound packets to registered routes (exact path, first match wins)
//! - Validates payloads with the route's declared strategy
//! - Runs the before/on/after handler chain with global hooks around it
//! - Classifies failures into validation and handler errors
//! - Tracks connections and rooms for response fan-out
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use evoke_router::{HandlerResult, Request, Response, Route, RouteConfig, Router, RouterConfig};
//!
//! struct Ping;
//!
//! #[async_trait]
//! impl Route for Ping {
//!     fn config(&self) -> Option<RouteConfig> {
//!         Some(RouteConfig::new("ping"))
//!     }
//!
//!     async fn on(&self, _request: &Request, response: &mut Response) -> HandlerResult {
//!         response.message("pong").relay().await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut router = Router::new(RouterConfig::default());
//!     router.register(Ping)?;
//!     std::sync::Arc::new(router).serve_tcp("0.0.0.0:7440").await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod hooks;
pub mod hub;
pub mod request;
pub mod response;
pub mod route;
pub mod router;

pub use connection::{Connection, ConnectionId};
pub use error::{Result, RouterError};
pub use hooks::{CallbackRegistry, HookContext, HookStage};
pub use hub::Hub;
pub use request::Request;
pub use response::Response;
pub use route::{HandlerResult, NestedRoute, Route, RouteConfig, Validation};
pub use router::{RegisteredRoute, Router, RouterConfig};
