//! Route contract and configuration

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use evoke_core::validation::{Model, ModelValidator, RuleSchema, ValidationError};

use crate::request::Request;
use crate::response::Response;

/// Result type for handler stages. Handler code is application code, so it
/// reports failures as `anyhow` errors; the pipeline routes them to
/// [`Route::on_error`].
pub type HandlerResult = anyhow::Result<()>;

/// Payload validation strategy declared by a route config.
///
/// At most one strategy per route, carried by construction.
#[derive(Debug, Clone, Default)]
pub enum Validation {
    /// Accept everything; the handler sees an empty placeholder target.
    #[default]
    None,
    /// Materialize and check a typed model.
    Model(ModelValidator),
    /// Check the raw payload against a rule map.
    Schema(RuleSchema),
}

/// Declarative route definition: the event path and how payloads are
/// accepted. Immutable once registered.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    path: String,
    validation: Validation,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            validation: Validation::None,
        }
    }

    /// Declare model validation for this route.
    pub fn with_model<M: Model>(mut self) -> Self {
        self.validation = Validation::Model(ModelValidator::of::<M>());
        self
    }

    /// Declare rule-schema validation for this route.
    pub fn with_schema(mut self, schema: RuleSchema) -> Self {
        self.validation = Validation::Schema(schema);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Resolve this config against a parent path: the declared path is
    /// concatenated onto the parent's resolved path.
    pub(crate) fn prefixed(mut self, parent: &str) -> Self {
        self.path = format!("{parent}{}", self.path);
        self
    }
}

/// A nested route declaration: the child's config (with its path relative
/// to the parent) plus the child instance.
pub struct NestedRoute {
    pub config: RouteConfig,
    pub route: Arc<dyn Route>,
}

impl NestedRoute {
    pub fn new(config: RouteConfig, route: impl Route + 'static) -> Self {
        Self {
            config,
            route: Arc::new(route),
        }
    }
}

/// The handler contract every route implements.
///
/// For each dispatched packet the stages run strictly in order: `before`
/// completes before `on` starts, `on` completes before `after` starts. A
/// failing stage stops the chain and routes the error to [`Route::on_error`];
/// a rejected payload routes to [`Route::on_validation_error`] without
/// touching the chain. No response is ever sent implicitly; handlers
/// address their replies through the [`Response`] they are given.
#[async_trait]
pub trait Route: Send + Sync {
    /// Declared route metadata. An explicit config passed at registration
    /// wins over this.
    fn config(&self) -> Option<RouteConfig> {
        None
    }

    /// Child routes, resolved relative to this route's path. Registration
    /// recurses through them in declaration order.
    fn nested(&self) -> Vec<NestedRoute> {
        Vec::new()
    }

    async fn before(&self, _request: &Request, _response: &mut Response) -> HandlerResult {
        Ok(())
    }

    async fn on(&self, request: &Request, response: &mut Response) -> HandlerResult;

    async fn after(&self, _request: &Request, _response: &mut Response) -> HandlerResult {
        Ok(())
    }

    /// Invoked when `before`/`on`/`after` fails, or when
    /// [`Route::on_validation_error`] itself fails. If this handler fails
    /// too, the dispatch is abandoned and the failure logged at the task
    /// boundary.
    async fn on_error(
        &self,
        error: anyhow::Error,
        _request: &Request,
        _response: &mut Response,
    ) -> HandlerResult {
        error!("unhandled route error: {error:#}");
        Ok(())
    }

    /// Invoked with the first validation error when the payload is rejected.
    async fn on_validation_error(
        &self,
        error: ValidationError,
        _request: &Request,
        _response: &mut Response,
    ) -> HandlerResult {
        warn!("unhandled validation error: {error}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_concatenates_paths() {
        let config = RouteConfig::new("/profile").prefixed("users");
        assert_eq!(config.path(), "users/profile");
    }

    #[test]
    fn default_validation_is_none() {
        assert!(matches!(
            RouteConfig::new("x").validation(),
            Validation::None
        ));
    }
}
