// ── Device session ──
//
// Owns one device connection: a single inbound task drains the link in
// arrival order and routes every frame, while commands from consumers
// and router re-queries share the link's outbound queue. Consumers
// observe the session through broadcast channels, `EventSink`s, and the
// telemetry store.

use std::sync::{Arc, OnceLock};

use exolink_api::{Attribute, Command, Device, Link, LinkSender, Value, websocket};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::event::{EventSink, ProtocolEvent, Report};
use crate::router::{Dispatch, Router};
use crate::store::TelemetryStore;

const EVENT_CHANNEL_SIZE: usize = 1024;
const REPORT_CHANNEL_SIZE: usize = 256;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// The device closed the connection or the handshake failed.
    Failed,
}

// ── Session ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Create with
/// [`new`](Self::new), subscribe to whatever you need, then
/// [`connect`](Self::connect) (or [`attach`](Self::attach) an existing
/// link). Subscribing first guarantees nothing the device pushes on
/// connect is missed.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    router: Router,
    store: Arc<TelemetryStore>,
    outbound: OnceLock<LinkSender>,
    connection_state: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<Arc<ProtocolEvent>>,
    report_tx: broadcast::Sender<Arc<Report>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Create a session. Does NOT connect.
    pub fn new(config: SessionConfig) -> Self {
        let router = Router::new(config.retry_policy);
        let store = Arc::new(TelemetryStore::new(config.history_len));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (report_tx, _) = broadcast::channel(REPORT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(SessionInner {
                config,
                router,
                store,
                outbound: OnceLock::new(),
                connection_state,
                event_tx,
                report_tx,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the WebSocket to the configured device and start routing.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.outbound.get().is_some() {
            return Err(CoreError::AlreadyConnected);
        }
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        let config = &self.inner.config;
        let link = websocket::connect(
            &config.url,
            config.connect_timeout,
            self.inner.cancel.child_token(),
        )
        .await
        .map_err(|e| {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            match e {
                exolink_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                    url: config.url.to_string(),
                    reason,
                },
                other => CoreError::from(other),
            }
        })?;

        self.attach(link).await
    }

    /// Start routing over an already established link.
    pub async fn attach(&self, link: Link) -> Result<(), CoreError> {
        let (inbound, outbound) = link.into_parts();
        self.inner
            .outbound
            .set(outbound)
            .map_err(|_| CoreError::AlreadyConnected)?;

        // Connected must land before the inbound task can report Failed.
        let _ = self.inner.connection_state.send(ConnectionState::Connected);

        let session = self.clone();
        let cancel = self.inner.cancel.clone();
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(inbound_task(session, inbound, cancel)));

        info!(url = %self.inner.config.url, "session connected");
        Ok(())
    }

    /// Stop routing and close the connection.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Queue a command for the device. Fire-and-forget: the answer, if
    /// any, arrives as an event or report.
    pub fn send(&self, command: &Command) -> Result<(), CoreError> {
        let outbound = self.inner.outbound.get().ok_or(CoreError::NotConnected)?;
        debug!(
            device = %command.device(),
            request = %command.request(),
            attribute = %command.attribute(),
            "sending command"
        );
        outbound.send(command.encode())?;
        Ok(())
    }

    pub fn get(&self, device: Device, attribute: Attribute) -> Result<(), CoreError> {
        self.send(&Command::get(device, attribute)?)
    }

    pub fn set(
        &self,
        device: Device,
        attribute: Attribute,
        value: impl Into<Value>,
    ) -> Result<(), CoreError> {
        self.send(&Command::set(device, attribute, value)?)
    }

    /// Ask the device for every stored setting. Returns the number of
    /// requests issued.
    pub fn query_all(&self) -> Result<usize, CoreError> {
        let mut issued = 0;
        for device in Device::all() {
            for attribute in device.attributes() {
                if attribute.is_queryable() {
                    self.get(device, attribute)?;
                    issued += 1;
                }
            }
        }
        debug!(issued, "queried all settings");
        Ok(issued)
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to protocol events.
    pub fn events(&self) -> broadcast::Receiver<Arc<ProtocolEvent>> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to acknowledgements and diagnostics.
    pub fn reports(&self) -> broadcast::Receiver<Arc<Report>> {
        self.inner.report_tx.subscribe()
    }

    /// Drive `sink` from the event bus on its own task until the session
    /// shuts down.
    pub async fn spawn_sink<S: EventSink>(&self, sink: S) {
        let events = self.events();
        let reports = self.reports();
        let cancel = self.inner.cancel.clone();
        let handle = tokio::spawn(sink_task(sink, events, reports, cancel));
        self.inner.task_handles.lock().await.push(handle);
    }

    // ── Inbound processing ───────────────────────────────────────

    /// Route one raw frame and carry out the result.
    fn handle_frame(&self, raw: &str) {
        match self.inner.router.route_text(raw) {
            Dispatch::Event(event) => {
                trace!(event = event.kind(), device = %event.device(), value = %event.value(), "event");
                self.inner.store.apply(&event);
                let _ = self.inner.event_tx.send(Arc::new(event));
            }
            Dispatch::Acknowledged { device, attribute } => {
                info!(%device, %attribute, "SET acknowledged");
                self.report(Report::Acknowledged { device, attribute });
            }
            Dispatch::Requery {
                command,
                diagnostic,
            } => {
                warn!(kind = diagnostic.kind(), "{diagnostic}; re-querying");
                if let Err(e) = self.send(&command) {
                    warn!(error = %e, "re-query could not be sent");
                }
                self.report(Report::Diagnostic(diagnostic));
            }
            Dispatch::Dropped(diagnostic) => {
                warn!(kind = diagnostic.kind(), "{diagnostic}");
                self.report(Report::Diagnostic(diagnostic));
            }
        }
    }

    fn report(&self, report: Report) {
        let _ = self.inner.report_tx.send(Arc::new(report));
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Drain the link's inbound queue until it ends or the session is
/// cancelled.
async fn inbound_task(
    session: Session,
    mut inbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = inbound.recv() => {
                let Some(raw) = frame else {
                    info!("device closed the connection");
                    let _ = session.inner.connection_state.send(ConnectionState::Failed);
                    break;
                };
                session.handle_frame(&raw);
            }
        }
    }
    debug!("inbound task exiting");
}

async fn sink_task<S: EventSink>(
    mut sink: S,
    mut events: broadcast::Receiver<Arc<ProtocolEvent>>,
    mut reports: broadcast::Receiver<Arc<Report>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => sink.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event sink lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            report = reports.recv() => match report {
                Ok(report) => sink.on_report(&report),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event sink lagging, reports dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    sink.on_close();
}
