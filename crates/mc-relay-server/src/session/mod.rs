//! One relayed session: both peers, the shadow state and the lifecycle.
//!
//! A session starts once the client has logged in and the single session
//! slot is held. It dials the upstream, completes the client's login with
//! the upstream's answer, and then relays until either peer goes away. A
//! failed upstream sends the client to limbo instead of dropping it, where
//! relay commands can pick another target.

pub mod limbo;
pub mod login;

use std::fmt;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, OwnedMutexGuard};
use tokio::time::{interval, interval_at, sleep, timeout, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, trace, warn};

use mc_relay_command::CommandAction;
use mc_relay_proto::codec::PacketCodec;
use mc_relay_proto::packets::{name, KickDisconnect, Login, LoginDisconnect};
use mc_relay_proto::{chat, Direction, Packet, ProtocolState};
use mc_relay_state::{ShadowState, StateHandler};

use crate::config::RelayConfig;
use crate::dispatcher::{apply_actions, DispatchContext, Dispatcher, Disposition, Outbound};
use crate::error::RelayError;
use crate::extension_host::ExtensionHost;
use crate::transport::{ConnectionId, IdGenerator, PeerEvent, PeerHandle, Side};

pub use login::ClientHello;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    AwaitingUpstreamLogin,
    Relaying,
    Limbo,
    Disconnected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::AwaitingUpstreamLogin => "awaiting-upstream-login",
            SessionState::Relaying => "relaying",
            SessionState::Limbo => "limbo",
            SessionState::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// Session facts the dispatcher and commands read.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub phase: SessionState,
    pub username: String,
    /// Current upstream as `host:port`.
    pub upstream: String,
    pub tick: u64,
}

// ─── Peers ───────────────────────────────────────────────────────────────────

struct Peer {
    handle: PeerHandle,
    state: ProtocolState,
}

struct Peers {
    codec: Arc<dyn PacketCodec>,
    client: Peer,
    upstream: Option<Peer>,
}

impl Peers {
    fn get(&self, direction: Direction) -> Option<&Peer> {
        match direction {
            Direction::ToClient => Some(&self.client),
            Direction::ToServer => self.upstream.as_ref(),
        }
    }

    fn side(direction: Direction) -> Side {
        match direction {
            Direction::ToClient => Side::Client,
            Direction::ToServer => Side::Upstream,
        }
    }

    /// Forward a frame the codec could not decode.
    fn send_raw(&self, direction: Direction, payload: &[u8]) -> Result<(), RelayError> {
        let peer = self
            .get(direction)
            .ok_or(RelayError::PeerClosed(Self::side(direction)))?;
        peer.handle.send_frame(payload)
    }
}

impl Outbound for Peers {
    fn is_ready(&self, direction: Direction) -> bool {
        self.get(direction)
            .is_some_and(|p| p.state == ProtocolState::Play)
    }

    fn send(&mut self, packet: &Packet) -> Result<(), RelayError> {
        let peer = self
            .get(packet.direction)
            .ok_or(RelayError::PeerClosed(Self::side(packet.direction)))?;
        let payload = self.codec.encode(peer.state, packet)?;
        peer.handle.send_frame(&payload)
    }
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// A logged-in client connection handed over by the acceptor.
pub struct ClientConnection {
    pub handle: PeerHandle,
    pub hello: ClientHello,
    pub events_tx: mpsc::UnboundedSender<PeerEvent>,
    pub events: mpsc::UnboundedReceiver<PeerEvent>,
}

pub struct Session {
    config: Arc<RelayConfig>,
    host: OwnedMutexGuard<ExtensionHost>,
    state: ShadowState,
    dispatcher: Dispatcher,
    peers: Peers,
    info: SessionInfo,
    target: (String, u16),
    hello: ClientHello,
    ids: Arc<IdGenerator>,
    events_tx: mpsc::UnboundedSender<PeerEvent>,
    events: mpsc::UnboundedReceiver<PeerEvent>,
    ticker: Option<Interval>,
    keep_alive: Option<Interval>,
    login_deadline: Option<Pin<Box<Sleep>>>,
    /// The client already has a world loaded, so the next upstream `login`
    /// becomes a respawn.
    switching: bool,
}

impl Session {
    pub fn new(
        config: Arc<RelayConfig>,
        codec: Arc<dyn PacketCodec>,
        host: OwnedMutexGuard<ExtensionHost>,
        client: ClientConnection,
        ids: Arc<IdGenerator>,
    ) -> Self {
        let target = (config.upstream.address.clone(), config.upstream.port);
        let info = SessionInfo {
            phase: SessionState::Authenticating,
            username: client.hello.login_start.username.clone(),
            upstream: format!("{}:{}", target.0, target.1),
            tick: 0,
        };
        Self {
            dispatcher: Dispatcher::new(config.relay.command_prefix.clone()),
            config,
            host,
            state: ShadowState::new(),
            peers: Peers {
                codec,
                client: Peer {
                    handle: client.handle,
                    state: ProtocolState::Login,
                },
                upstream: None,
            },
            info,
            target,
            hello: client.hello,
            ids,
            events_tx: client.events_tx,
            events: client.events,
            ticker: None,
            keep_alive: None,
            login_deadline: None,
            switching: false,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Drive the session until either peer disconnects or `shutdown` fires.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(username = %self.info.username, upstream = %self.info.upstream, "session started");
        self.connect_upstream().await;

        while self.info.phase != SessionState::Disconnected {
            tokio::select! {
                Some(event) = self.events.recv() => self.on_peer_event(event).await,
                _ = next_tick(&mut self.ticker) => self.on_tick(),
                _ = next_tick(&mut self.keep_alive) => self.on_limbo_keep_alive(),
                _ = expired(&mut self.login_deadline) => {
                    let timeout = RelayError::LoginTimeout(self.config.connect_timeout());
                    self.enter_limbo(&timeout.to_string());
                }
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.kick_client("Relay shutting down");
                        self.set_phase(SessionState::Disconnected);
                    }
                }
            }
            self.flush_events();
        }

        self.teardown();
    }

    // ─── Peer events ─────────────────────────────────────────────────────────

    async fn on_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Frame {
                side: Side::Client,
                payload,
                ..
            } => self.on_client_frame(payload).await,
            PeerEvent::Frame {
                id,
                side: Side::Upstream,
                payload,
            } if self.is_current_upstream(id) => self.on_upstream_frame(payload),
            PeerEvent::Closed {
                side: Side::Client,
                reason,
                ..
            } => {
                info!(username = %self.info.username, reason = reason.as_deref().unwrap_or("end of stream"), "client disconnected");
                self.set_phase(SessionState::Disconnected);
            }
            PeerEvent::Closed {
                id,
                side: Side::Upstream,
                reason,
            } if self.is_current_upstream(id) => self.on_upstream_closed(reason),
            other => trace!(?other, "event from a replaced upstream"),
        }
    }

    fn is_current_upstream(&self, id: ConnectionId) -> bool {
        self.peers
            .upstream
            .as_ref()
            .is_some_and(|p| p.handle.id() == id)
    }

    async fn on_client_frame(&mut self, payload: Bytes) {
        if self.peers.client.state != ProtocolState::Play {
            trace!("client frame before play");
            return;
        }
        let packet = match self
            .peers
            .codec
            .decode(ProtocolState::Play, Direction::ToServer, payload.clone())
        {
            Ok(packet) => packet,
            Err(e) => {
                debug!("undecodable client frame forwarded raw: {e}");
                if self.peers.is_ready(Direction::ToServer) {
                    if let Err(e) = self.peers.send_raw(Direction::ToServer, &payload) {
                        warn!("forwarding failed: {e}");
                    }
                }
                return;
            }
        };

        if let Disposition::Consumed(Some(action)) = self.dispatch(packet) {
            self.on_command_action(action).await;
        }
    }

    fn on_upstream_frame(&mut self, payload: Bytes) {
        let Some(state) = self.peers.upstream.as_ref().map(|p| p.state) else {
            return;
        };
        let packet = match self
            .peers
            .codec
            .decode(state, Direction::ToClient, payload.clone())
        {
            Ok(packet) => packet,
            Err(e) => {
                debug!(?state, "undecodable upstream frame: {e}");
                if state == ProtocolState::Play && self.peers.is_ready(Direction::ToClient) {
                    if let Err(e) = self.peers.send_raw(Direction::ToClient, &payload) {
                        warn!("forwarding failed: {e}");
                    }
                }
                return;
            }
        };

        match state {
            ProtocolState::Login => self.on_upstream_login(packet),
            ProtocolState::Play => self.on_upstream_play(packet),
            other => debug!(?other, packet = %packet.name, "unexpected upstream packet"),
        }
    }

    fn on_upstream_login(&mut self, packet: Packet) {
        match packet.name.as_str() {
            name::LOGIN_SUCCESS => {
                self.login_deadline = None;
                if let Some(upstream) = self.peers.upstream.as_mut() {
                    upstream.state = ProtocolState::Play;
                }
                if self.peers.client.state == ProtocolState::Login {
                    self.send_client(&packet);
                    self.peers.client.state = ProtocolState::Play;
                }
                if let Err(e) = StateHandler::Player.apply(&mut self.state, &packet) {
                    debug!("login success not applied: {e}");
                }
                self.start_relaying();
            }
            name::LOGIN_DISCONNECT => {
                let reason = packet
                    .parse::<LoginDisconnect>()
                    .map(|d| chat::flatten_str(&d.reason))
                    .unwrap_or_default();
                let refused = RelayError::UpstreamRefused {
                    target: self.info.upstream.clone(),
                    reason,
                };
                self.enter_limbo(&refused.to_string());
            }
            name::ENCRYPTION_BEGIN => {
                let refused = RelayError::UpstreamRefused {
                    target: self.info.upstream.clone(),
                    reason: "online-mode encryption is not supported".into(),
                };
                self.enter_limbo(&refused.to_string());
            }
            name::COMPRESS => debug!("upstream enabled compression"),
            other => debug!(packet = other, "ignored during upstream login"),
        }
    }

    fn on_upstream_play(&mut self, packet: Packet) {
        if self.switching && packet.name == name::LOGIN {
            self.switching = false;
            self.switch_world(&packet);
            return;
        }

        let kicked = packet.name == name::KICK_DISCONNECT;
        self.dispatch(packet);
        if kicked {
            info!(upstream = %self.info.upstream, "kicked by upstream");
            self.set_phase(SessionState::Disconnected);
        }
    }

    fn on_upstream_closed(&mut self, reason: Option<String>) {
        let reason = reason.unwrap_or_else(|| "connection closed".into());
        match self.info.phase {
            SessionState::AwaitingUpstreamLogin => {
                let refused = RelayError::UpstreamRefused {
                    target: self.info.upstream.clone(),
                    reason,
                };
                self.enter_limbo(&refused.to_string());
            }
            SessionState::Relaying => {
                info!(upstream = %self.info.upstream, %reason, "upstream disconnected");
                self.kick_client("Lost connection to the server");
                self.set_phase(SessionState::Disconnected);
            }
            _ => debug!(%reason, "upstream closed"),
        }
    }

    /// Move a client that already has a world onto the new upstream's.
    fn switch_world(&mut self, packet: &Packet) {
        match packet.parse::<Login>() {
            Ok(login) => match limbo::respawn_into(&login) {
                Ok(packets) => {
                    for p in &packets {
                        self.send_client(p);
                    }
                }
                Err(e) => warn!("world switch not built: {e}"),
            },
            Err(e) => warn!("upstream login unreadable, client world not switched: {e}"),
        }
        if let Err(e) = StateHandler::Player.apply(&mut self.state, packet) {
            debug!("login not applied: {e}");
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    async fn on_command_action(&mut self, action: CommandAction) {
        match action {
            CommandAction::Connect { host, port } => {
                self.target = (host, port);
                self.reconnect().await;
            }
            CommandAction::Reconnect => self.reconnect().await,
            other => debug!(?other, "handled by dispatcher"),
        }
    }

    /// Drop the current upstream and dial the current target.
    async fn reconnect(&mut self) {
        if self.info.phase == SessionState::Relaying {
            match limbo::clear_client_lists(&self.state) {
                Ok(packets) => {
                    for p in &packets {
                        self.send_client(p);
                    }
                }
                Err(e) => warn!("client lists not cleared: {e}"),
            }
        }
        self.connect_upstream().await;
    }

    // ─── Upstream lifecycle ──────────────────────────────────────────────────

    async fn connect_upstream(&mut self) {
        self.close_upstream();
        self.ticker = None;
        self.keep_alive = None;
        self.dispatcher.clear_events();
        self.state.reset();
        self.switching = self.peers.client.state == ProtocolState::Play;

        let (host, port) = self.target.clone();
        let addr = format!("{host}:{port}");
        self.info.upstream = addr.clone();
        self.set_phase(SessionState::AwaitingUpstreamLogin);
        info!(upstream = %addr, "connecting upstream");

        let limit = self.config.connect_timeout();
        let stream = match timeout(limit, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let refused = RelayError::UpstreamRefused {
                    target: addr,
                    reason: e.to_string(),
                };
                return self.enter_limbo(&refused.to_string());
            }
            Err(_) => {
                let refused = RelayError::UpstreamRefused {
                    target: addr,
                    reason: format!("no answer within {limit:?}"),
                };
                return self.enter_limbo(&refused.to_string());
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("nodelay not set: {e}");
        }

        let (reader, writer) = stream.into_split();
        let handle = PeerHandle::spawn(
            self.ids.next_id(),
            Side::Upstream,
            reader,
            writer,
            self.config.relay.max_frame_size,
            self.events_tx.clone(),
        );
        self.peers.upstream = Some(Peer {
            handle,
            state: ProtocolState::Handshaking,
        });

        if let Err(e) = self.send_upstream_login(&host, port) {
            let refused = RelayError::UpstreamRefused {
                target: addr,
                reason: e.to_string(),
            };
            return self.enter_limbo(&refused.to_string());
        }
        self.login_deadline = Some(Box::pin(sleep(limit)));
    }

    /// Replay the client's handshake, aimed at the target, and its login start.
    fn send_upstream_login(&mut self, host: &str, port: u16) -> Result<(), RelayError> {
        let handshake = Packet::from_fields(
            name::SET_PROTOCOL,
            Direction::ToServer,
            &self.hello.handshake.retargeted(host, port),
        )?;
        self.peers.send(&handshake)?;
        if let Some(upstream) = self.peers.upstream.as_mut() {
            upstream.state = ProtocolState::Login;
        }
        let login_start = Packet::from_fields(
            name::LOGIN_START,
            Direction::ToServer,
            &self.hello.login_start,
        )?;
        self.peers.send(&login_start)
    }

    fn close_upstream(&mut self) {
        if let Some(upstream) = self.peers.upstream.take() {
            upstream.handle.close();
        }
        self.login_deadline = None;
    }

    fn start_relaying(&mut self) {
        self.keep_alive = None;
        let mut ticker = interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
        self.set_phase(SessionState::Relaying);
        info!(upstream = %self.info.upstream, "relaying");
    }

    fn enter_limbo(&mut self, message: &str) {
        warn!(upstream = %self.info.upstream, "{message}");
        self.close_upstream();
        self.ticker = None;
        self.dispatcher.clear_events();
        self.state.reset();

        let in_play = self.peers.client.state == ProtocolState::Play;
        if !in_play {
            match limbo::login_success(&self.info.username) {
                Ok(success) => self.send_client(&success),
                Err(e) => warn!("limbo login not built: {e}"),
            }
            self.peers.client.state = ProtocolState::Play;
        }
        match limbo::enter(in_play, message) {
            Ok(packets) => {
                for p in &packets {
                    self.send_client(p);
                }
            }
            Err(e) => warn!("limbo world not built: {e}"),
        }

        self.switching = true;
        let period = self.config.limbo_keep_alive();
        self.keep_alive = Some(interval_at(Instant::now() + period, period));
        self.set_phase(SessionState::Limbo);
    }

    fn on_limbo_keep_alive(&mut self) {
        match limbo::keep_alive() {
            Ok(packet) => self.send_client(&packet),
            Err(e) => warn!("keep-alive not built: {e}"),
        }
    }

    // ─── Pipeline ────────────────────────────────────────────────────────────

    fn dispatch(&mut self, packet: Packet) -> Disposition {
        let mut ctx = DispatchContext {
            state: &mut self.state,
            host: &mut *self.host,
            out: &mut self.peers,
            session: &self.info,
        };
        self.dispatcher.dispatch(packet, &mut ctx)
    }

    fn flush_events(&mut self) {
        if self.dispatcher.pending_events() == 0 {
            return;
        }
        let mut ctx = DispatchContext {
            state: &mut self.state,
            host: &mut *self.host,
            out: &mut self.peers,
            session: &self.info,
        };
        self.dispatcher.flush_events(&mut ctx);
    }

    fn on_tick(&mut self) {
        if self.info.phase != SessionState::Relaying {
            return;
        }
        self.info.tick += 1;
        let actions = self.host.tick(&self.state, self.info.tick);
        apply_actions(actions, &mut self.state, &mut self.peers);
    }

    fn send_client(&mut self, packet: &Packet) {
        if let Err(e) = self.peers.send(packet) {
            warn!(packet = %packet.name, "not delivered to client: {e}");
        }
    }

    fn kick_client(&mut self, message: &str) {
        let packet = if self.peers.client.state == ProtocolState::Play {
            Packet::from_fields(
                name::KICK_DISCONNECT,
                Direction::ToClient,
                &KickDisconnect::with_message(message),
            )
        } else {
            Packet::from_fields(
                name::LOGIN_DISCONNECT,
                Direction::ToClient,
                &LoginDisconnect {
                    reason: chat::text_component(message),
                },
            )
        };
        match packet {
            Ok(packet) => self.send_client(&packet),
            Err(e) => warn!("kick not built: {e}"),
        }
    }

    fn set_phase(&mut self, phase: SessionState) {
        if self.info.phase != phase {
            debug!(from = %self.info.phase, to = %phase, "session state");
            self.info.phase = phase;
        }
    }

    fn teardown(&mut self) {
        self.ticker = None;
        self.keep_alive = None;
        self.dispatcher.clear_events();
        self.close_upstream();
        self.state.reset();
        self.set_phase(SessionState::Disconnected);
        info!(username = %self.info.username, ticks = self.info.tick, "session ended");
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn expired(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
