//! Listener and the single session slot.
//!
//! Every accepted connection reads its client's login on its own task. Only
//! then does it try to take the slot, which is the extension host behind an
//! async mutex: holding the guard is being the session. A client arriving
//! while the slot is held is refused immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use mc_relay_proto::codec::PacketCodec;
use mc_relay_state::ShadowState;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::extension_host::ExtensionHost;
use crate::session::{login, ClientConnection, Session};
use crate::transport::{ConnectionId, IdGenerator, PeerHandle, Side};

#[derive(Clone)]
struct Shared {
    config: Arc<RelayConfig>,
    codec: Arc<dyn PacketCodec>,
    slot: Arc<Mutex<ExtensionHost>>,
    ids: Arc<IdGenerator>,
}

pub struct Relay {
    shared: Shared,
}

impl Relay {
    pub fn new(config: RelayConfig, codec: Arc<dyn PacketCodec>, host: ExtensionHost) -> Self {
        Self {
            shared: Shared {
                config: Arc::new(config),
                codec,
                slot: Arc::new(Mutex::new(host)),
                ids: Arc::new(IdGenerator::new()),
            },
        }
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, RelayError> {
        let addr = self.shared.config.bind_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!("Relay listening on {addr}");
        Ok(listener)
    }

    /// Whether a session currently holds the slot.
    pub fn is_occupied(&self) -> bool {
        self.shared.slot.try_lock().is_err()
    }

    /// Wait up to `limit` for the active session, if any, to end, then
    /// disable every extension.
    pub async fn drain(&self, limit: Duration) -> bool {
        match timeout(limit, self.shared.slot.lock()).await {
            Ok(mut host) => {
                host.disable_all(&mut ShadowState::new());
                true
            }
            Err(_) => false,
        }
    }

    /// Accept connections until `shutdown` is set.
    pub async fn run(&self, listener: TcpListener, shutdown: watch::Receiver<bool>) {
        let mut shutdown_rx = shutdown.clone();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("accept failed: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("nodelay not set: {e}");
                    }
                    let id = self.shared.ids.next_id();
                    info!(%id, %peer_addr, "accepted connection");

                    let shared = self.shared.clone();
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        match serve(id, stream, shared, shutdown).await {
                            Ok(()) => debug!(%id, "connection finished"),
                            Err(e) => info!(%id, "connection ended: {e}"),
                        }
                    });
                }
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Relay shutting down");
                        break;
                    }
                }
            }
        }
    }
}

async fn serve(
    id: ConnectionId,
    stream: TcpStream,
    shared: Shared,
    shutdown: watch::Receiver<bool>,
) -> Result<(), RelayError> {
    let (reader, writer) = stream.into_split();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let handle = PeerHandle::spawn(
        id,
        Side::Client,
        reader,
        writer,
        shared.config.relay.max_frame_size,
        events_tx.clone(),
    );

    let Some(hello) = login::accept(&mut events, shared.codec.as_ref(), shared.config.connect_timeout()).await?
    else {
        return Ok(());
    };

    let host = match Arc::clone(&shared.slot).try_lock_owned() {
        Ok(guard) => guard,
        Err(_) => {
            warn!(username = %hello.login_start.username, "session slot occupied, refusing login");
            let err = RelayError::SessionOccupied;
            login::reject(&handle, shared.codec.as_ref(), &err.to_string())?;
            return Err(err);
        }
    };

    let client = ClientConnection {
        handle,
        hello,
        events_tx,
        events,
    };
    Session::new(shared.config, shared.codec, host, client, shared.ids)
        .run(shutdown)
        .await;
    Ok(())
}
