//! EVOKE demo server
//!
//! A standalone dispatch server with a small chat/user route set. Frames are
//! length-prefixed JSON arrays over TCP, so any scriptable TCP client can
//! poke at it: send `["chat", {"text": "hi"}]` and watch the broadcast.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use evoke_core::validation::{Model, Rule, RuleSchema, ValidationError};
use evoke_core::{status, Kind};
use evoke_router::{
    HandlerResult, HookStage, NestedRoute, Request, Response, Route, RouteConfig, Router,
    RouterConfig,
};

#[derive(Parser)]
#[command(name = "evoke-server")]
#[command(about = "EVOKE dispatch server")]
#[command(version)]
struct Cli {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:7440")]
    listen: String,

    /// Server name used in logs
    #[arg(short, long, default_value = "EVOKE Router")]
    name: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Fan chat messages out to everyone else; the sender gets a receipt.
struct ChatRoute;

#[async_trait]
impl Route for ChatRoute {
    fn config(&self) -> Option<RouteConfig> {
        Some(RouteConfig::new("chat").with_schema(RuleSchema::new().field(
            "text",
            vec![
                Rule::Required,
                Rule::Is(Kind::String),
                Rule::MaxLength(512),
            ],
        )))
    }

    async fn on(&self, request: &Request, response: &mut Response) -> HandlerResult {
        let data = request.data().cloned().unwrap_or_default();
        response
            .message("message")
            .with_data(data)
            .to_all_except_sender()
            .await?;
        response.message("delivered").relay().await?;
        Ok(())
    }

    async fn on_validation_error(
        &self,
        error: ValidationError,
        _request: &Request,
        response: &mut Response,
    ) -> HandlerResult {
        response
            .status(status::BAD_REQUEST)
            .message(error.to_string())
            .relay()
            .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

impl Model for NewUser {
    fn validate(&self) -> Vec<ValidationError> {
        if self.name.trim().is_empty() {
            vec![ValidationError::new("name", "must not be blank")]
        } else {
            Vec::new()
        }
    }
}

/// Parent route; `users/add` is handled by the nested [`AddUserRoute`].
struct UsersRoute;

#[async_trait]
impl Route for UsersRoute {
    fn config(&self) -> Option<RouteConfig> {
        Some(RouteConfig::new("users"))
    }

    fn nested(&self) -> Vec<NestedRoute> {
        vec![NestedRoute::new(
            RouteConfig::new("/add").with_model::<NewUser>(),
            AddUserRoute,
        )]
    }

    async fn on(&self, _request: &Request, response: &mut Response) -> HandlerResult {
        response.message("ok").relay().await?;
        Ok(())
    }
}

struct AddUserRoute;

#[async_trait]
impl Route for AddUserRoute {
    async fn on(&self, request: &Request, response: &mut Response) -> HandlerResult {
        let user = request
            .model::<NewUser>()
            .ok_or_else(|| anyhow::anyhow!("missing model target"))?;

        response
            .status(status::CREATED)
            .message("user added")
            .with_data(serde_json::json!({"name": user.name}))
            .relay()
            .await?;
        response.to_all_except_sender().await?;
        Ok(())
    }

    async fn on_validation_error(
        &self,
        error: ValidationError,
        _request: &Request,
        response: &mut Response,
    ) -> HandlerResult {
        response
            .status(status::BAD_REQUEST)
            .message(error.to_string())
            .relay()
            .await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut router = Router::new(RouterConfig {
        name: cli.name.clone(),
        ..Default::default()
    });
    router.register(ChatRoute)?;
    router.register(UsersRoute)?;

    router.register_callback(HookStage::PreDispatch, |ctx| {
        tracing::debug!("dispatching {}", ctx.path);
    });
    router.register_callback(HookStage::ValidationError, |ctx| {
        tracing::warn!("validation failed on {}: {:?}", ctx.path, ctx.error);
    });

    tracing::info!("starting {}", cli.name);
    Arc::new(router).serve_tcp(&cli.listen).await?;

    Ok(())
}
