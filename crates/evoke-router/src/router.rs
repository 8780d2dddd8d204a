//! Route registry and dispatch pipeline
//!
//! The router owns the ordered route table, the hook registry, and the
//! connection hub. Registration happens once at startup; after that the
//! table is read-only and dispatches run concurrently without locking it.
//!
//! Each inbound packet is resolved synchronously, then dispatched on its own
//! task which runs to completion: validate, branch, run the handler chain,
//! classify failures. Nothing a handler does can escape the task as an
//! unhandled error.

use std::any::type_name;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use evoke_core::validation::{Validated, ValidationOutcome};
use evoke_core::{codec, validate_schema, EventPacket};
use evoke_transport::{TransportEvent, TransportReceiver, TransportSender, TransportServer};

#[cfg(feature = "tcp")]
use evoke_transport::TcpServer;

use crate::connection::Connection;
use crate::error::{Result, RouterError};
use crate::hooks::{CallbackRegistry, HookContext, HookStage};
use crate::hub::Hub;
use crate::request::Request;
use crate::response::Response;
use crate::route::{Route, RouteConfig, Validation};

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Server name, used in logs
    pub name: String,
    /// Namespace assigned to accepted connections
    pub default_namespace: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            name: "EVOKE Router".to_string(),
            default_namespace: evoke_core::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// A route bound into the table: resolved path, config, and the singleton
/// handler instance. Never mutated after insertion.
pub struct RegisteredRoute {
    path: String,
    config: RouteConfig,
    instance: Arc<dyn Route>,
}

impl RegisteredRoute {
    /// Fully resolved event path (parent prefixes applied).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    pub fn instance(&self) -> &Arc<dyn Route> {
        &self.instance
    }
}

/// EVOKE router
pub struct Router {
    config: RouterConfig,
    /// Ordered route table; first match wins
    routes: Vec<Arc<RegisteredRoute>>,
    /// Cross-cutting hooks
    callbacks: Arc<CallbackRegistry>,
    /// Live connections and rooms
    hub: Arc<Hub>,
    /// Running flag
    running: Arc<RwLock<bool>>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            callbacks: Arc::new(CallbackRegistry::new()),
            hub: Arc::new(Hub::new()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a route using its declared metadata.
    pub fn register<R: Route + 'static>(&mut self, route: R) -> Result<()> {
        self.register_arc(Arc::new(route), None, type_name::<R>())
    }

    /// Register a route with an explicit config, overriding any declared
    /// metadata.
    pub fn register_with<R: Route + 'static>(&mut self, route: R, config: RouteConfig) -> Result<()> {
        self.register_arc(Arc::new(route), Some(config), type_name::<R>())
    }

    /// Register several routes in order; equivalent to repeated `register`.
    pub fn register_bulk(&mut self, routes: impl IntoIterator<Item = Arc<dyn Route>>) -> Result<()> {
        for route in routes {
            self.register_arc(route, None, "route")?;
        }
        Ok(())
    }

    /// Append a hook to one of the fixed pipeline points.
    pub fn register_callback(
        &self,
        stage: HookStage,
        hook: impl Fn(&HookContext<'_>) + Send + Sync + 'static,
    ) {
        self.callbacks.add(stage, hook);
    }

    fn register_arc(
        &mut self,
        instance: Arc<dyn Route>,
        override_config: Option<RouteConfig>,
        label: &str,
    ) -> Result<()> {
        let config = override_config
            .or_else(|| instance.config())
            .ok_or_else(|| RouterError::MissingConfig(label.to_string()))?;

        let path = config.path().to_string();
        info!("registering route: {}", path);

        self.routes.push(Arc::new(RegisteredRoute {
            path: path.clone(),
            config,
            instance: Arc::clone(&instance),
        }));

        // Children resolve against this route's path, recursively and in
        // declaration order. Nested declarations always carry a config, so
        // only top-level registrations can fail resolution.
        for nested in instance.nested() {
            let child_config = nested.config.prefixed(&path);
            self.register_arc(nested.route, Some(child_config), "nested route")?;
        }

        Ok(())
    }

    /// Find the earliest-registered route with the given resolved path.
    pub fn find(&self, path: &str) -> Option<&Arc<RegisteredRoute>> {
        self.routes.iter().find(|route| route.path == path)
    }

    /// Number of registered routes (nested included).
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatch one packet from a connection.
    ///
    /// Fire-and-forget: a packet matching no route is logged and dropped
    /// with no response and no handler call; everything else runs on its own
    /// task to completion.
    pub fn dispatch(&self, packet: EventPacket, connection: Arc<Connection>) {
        let Some(route) = self.find(packet.path()) else {
            warn!("could not find a route for {}", packet.path());
            return;
        };

        let route = Arc::clone(route);
        let callbacks = Arc::clone(&self.callbacks);
        let hub = Arc::clone(&self.hub);

        tokio::spawn(async move {
            if let Err(e) = invoke_route(route, callbacks, hub, packet, connection).await {
                // on_error itself failed; there is no handler left to try.
                error!("unrecoverable dispatch failure: {e:#}");
            }
        });
    }

    // =========================================================================
    // Serving
    // =========================================================================

    /// Serve using any [`TransportServer`] implementation.
    pub async fn serve_on<S>(self: Arc<Self>, mut server: S) -> Result<()>
    where
        S: TransportServer + 'static,
        S::Sender: 'static,
        S::Receiver: 'static,
    {
        info!("{} accepting connections", self.config.name);
        *self.running.write() = true;

        while *self.running.read() {
            match server.accept().await {
                Ok((sender, receiver, addr)) => {
                    debug!("new connection from {}", addr);
                    Arc::clone(&self).handle_connection(Arc::new(sender), receiver);
                }
                Err(evoke_transport::TransportError::ConnectionClosed) => {
                    debug!("listener closed");
                    break;
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }

        Ok(())
    }

    /// Serve on TCP with length-prefixed JSON frames.
    #[cfg(feature = "tcp")]
    pub async fn serve_tcp(self: Arc<Self>, addr: &str) -> Result<()> {
        let server = TcpServer::bind(addr).await?;
        self.serve_on(server).await
    }

    /// Handle one accepted connection: decode frames and feed the dispatch
    /// pipeline until the peer goes away.
    fn handle_connection(
        self: Arc<Self>,
        sender: Arc<dyn TransportSender>,
        mut receiver: impl TransportReceiver + 'static,
    ) {
        let connection = Arc::new(Connection::new(sender, self.config.default_namespace.clone()));
        self.hub.insert(Arc::clone(&connection));

        tokio::spawn(async move {
            while *self.running.read() {
                match receiver.recv().await {
                    Some(TransportEvent::Data(data)) => match codec::decode_frame(&data) {
                        Ok(packet) => {
                            let packet = packet.with_namespace(connection.namespace());
                            self.dispatch(packet, Arc::clone(&connection));
                        }
                        Err(e) => {
                            warn!("decode error from {}: {}", connection.id(), e);
                        }
                    },
                    Some(TransportEvent::Disconnected { reason }) => {
                        debug!("connection {} closed: {:?}", connection.id(), reason);
                        break;
                    }
                    Some(TransportEvent::Error(e)) => {
                        error!("transport error from {}: {}", connection.id(), e);
                        break;
                    }
                    Some(TransportEvent::Connected) => {}
                    None => break,
                }
            }

            debug!("removing connection {}", connection.id());
            self.hub.remove(connection.id());
        });
    }

    /// Stop accepting and reading. In-flight dispatches run to completion.
    pub fn stop(&self) {
        *self.running.write() = false;
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

/// Run one dispatch to completion.
///
/// Validation failures go to `on_validation_error`, chain failures to
/// `on_error`, and a failure inside `on_validation_error` falls through to
/// `on_error` as well. Only an error from `on_error` itself escapes, to be
/// logged at the task boundary.
async fn invoke_route(
    route: Arc<RegisteredRoute>,
    callbacks: Arc<CallbackRegistry>,
    hub: Arc<Hub>,
    packet: EventPacket,
    connection: Arc<Connection>,
) -> anyhow::Result<()> {
    let outcome = match route.config.validation() {
        Validation::None => ValidationOutcome::valid(Validated::Empty),
        Validation::Model(validator) => validator.validate(packet.payload()),
        Validation::Schema(schema) => validate_schema(schema, packet.payload()),
    };

    match outcome {
        ValidationOutcome::Invalid(errors) => {
            // Invalid outcomes are never constructed empty.
            let Some(first) = errors.into_iter().next() else {
                return Ok(());
            };

            callbacks.run(&HookContext {
                stage: HookStage::ValidationError,
                path: &route.path,
                error: Some(&first),
            });

            let request = Request::rejected(packet.clone(), Arc::clone(&connection));
            let mut response = new_response(&route, &connection, &hub);
            if let Err(e) = route
                .instance
                .on_validation_error(first, &request, &mut response)
                .await
            {
                trigger_internal_error(&route, e, &hub, &packet, &connection).await?;
            }
            Ok(())
        }

        ValidationOutcome::Valid(target) => {
            let request = Request::new(target, packet.clone(), Arc::clone(&connection));
            let mut response = new_response(&route, &connection, &hub);

            callbacks.run(&HookContext {
                stage: HookStage::PreDispatch,
                path: &route.path,
                error: None,
            });

            match run_chain(route.instance.as_ref(), &request, &mut response).await {
                Ok(()) => {
                    callbacks.run(&HookContext {
                        stage: HookStage::PostDispatch,
                        path: &route.path,
                        error: None,
                    });
                    Ok(())
                }
                Err(e) => trigger_internal_error(&route, e, &hub, &packet, &connection).await,
            }
        }
    }
}

/// The handler chain proper. `?` stops it at the first failing stage, so
/// `on` never starts after a failed `before`, nor `after` after a failed
/// `on`.
async fn run_chain(
    route: &dyn Route,
    request: &Request,
    response: &mut Response,
) -> anyhow::Result<()> {
    route.before(request, response).await?;
    route.on(request, response).await?;
    route.after(request, response).await?;
    Ok(())
}

/// Route a handler error to `on_error` with a fresh request view (no
/// validated target) and a fresh response.
async fn trigger_internal_error(
    route: &RegisteredRoute,
    error: anyhow::Error,
    hub: &Arc<Hub>,
    packet: &EventPacket,
    connection: &Arc<Connection>,
) -> anyhow::Result<()> {
    let request = Request::rejected(packet.clone(), Arc::clone(connection));
    let mut response = new_response(route, connection, hub);
    route.instance.on_error(error, &request, &mut response).await
}

fn new_response(route: &RegisteredRoute, connection: &Arc<Connection>, hub: &Arc<Hub>) -> Response {
    Response::new(route.path.clone(), Arc::clone(connection), Arc::clone(hub))
}
