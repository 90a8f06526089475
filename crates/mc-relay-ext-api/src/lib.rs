//! Extension API: traits, events, and relay API for extension authors.
//!
//! This crate defines the boundary between the relay and its extensions. It
//! depends only on the packet model, never on the relay's session or state.

use mc_relay_proto::types::{Uuid, Vec3};
use mc_relay_proto::{Direction, Packet, Slot};
use serde::Serialize;
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Interception was requested for a packet extensions may not touch.
    #[error("packet {direction}:{packet} cannot be intercepted")]
    UnsafePacket { direction: Direction, packet: String },
    #[error("{0}")]
    Failed(String),
}

impl ExtensionError {
    pub fn msg(message: impl Into<String>) -> Self {
        ExtensionError::Failed(message.into())
    }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Stable identity of a loaded extension. Scopes everything it registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(pub u32);

/// A player as seen through the tab list and/or a live entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub uuid: Uuid,
    pub name: Option<String>,
    /// Name as the client would render it (overrides and team affixes applied).
    pub display_name: Option<String>,
    pub entity_id: Option<i32>,
    pub position: Option<Vec3>,
    pub gamemode: Option<i32>,
    pub ping: Option<i32>,
    pub health: Option<f32>,
    pub team: Option<String>,
}

/// The player behind the relayed client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPlayerView {
    pub entity_id: i32,
    pub username: String,
    pub position: Vec3,
    pub health: f32,
    pub food: i32,
    pub gamemode: u8,
    pub held_slot: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub name: String,
    pub display_name: String,
    pub prefix: String,
    pub suffix: String,
    pub color: i8,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerView {
    pub window_id: u8,
    pub inventory_type: String,
    pub title: String,
    pub slots: Vec<Slot>,
}

/// Log level for extension logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// A structured event projected from a packet after state was updated.
/// Not cancellable.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEvent {
    pub name: String,
    pub data: serde_json::Value,
}

impl RelayEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A packet offered to an interceptor before it is forwarded.
#[derive(Debug, Clone)]
pub struct InterceptEvent {
    packet: Packet,
    cancelled: bool,
    modified: bool,
}

impl InterceptEvent {
    pub fn new(packet: Packet) -> Self {
        Self {
            packet,
            cancelled: false,
            modified: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.packet.name
    }

    pub fn direction(&self) -> Direction {
        self.packet.direction
    }

    /// Current fields, including replacements made by earlier interceptors.
    pub fn fields(&self) -> &serde_json::Value {
        &self.packet.fields
    }

    /// Drop the packet instead of forwarding it.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Replace the fields that will be forwarded.
    pub fn modify(&mut self, fields: serde_json::Value) {
        self.packet.fields = fields;
        self.modified = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn into_packet(self) -> Packet {
        self.packet
    }
}

// ─── Handlers and registration ───────────────────────────────────────────────

pub type EventHandler =
    Box<dyn FnMut(&RelayEvent, &mut dyn RelayApi) -> Result<(), ExtensionError> + Send>;

pub type PacketHandler =
    Box<dyn FnMut(&mut InterceptEvent, &mut dyn RelayApi) -> Result<(), ExtensionError> + Send>;

/// Answers which packets extensions may cancel or rewrite.
pub trait PacketSafety {
    fn is_safe(&self, direction: Direction, packet: &str) -> bool;
}

pub struct Subscription {
    pub event: String,
    pub handler: EventHandler,
}

pub struct Interceptor {
    pub direction: Direction,
    pub packets: Vec<String>,
    pub handler: PacketHandler,
}

impl Interceptor {
    pub fn matches(&self, direction: Direction, packet: &str) -> bool {
        self.direction == direction && self.packets.iter().any(|p| p == packet)
    }
}

/// Per-extension capability handed to [`Extension::on_enable`].
///
/// Everything registered here is owned by the extension's [`ExtensionId`]
/// and removed when the extension is disabled.
pub struct ExtensionContext<'a> {
    id: ExtensionId,
    safety: &'a dyn PacketSafety,
    subscriptions: Vec<Subscription>,
    interceptors: Vec<Interceptor>,
}

impl<'a> ExtensionContext<'a> {
    pub fn new(id: ExtensionId, safety: &'a dyn PacketSafety) -> Self {
        Self {
            id,
            safety,
            subscriptions: Vec::new(),
            interceptors: Vec::new(),
        }
    }

    pub fn id(&self) -> ExtensionId {
        self.id
    }

    /// Subscribe to a structured event.
    pub fn on<F>(&mut self, event: &str, handler: F)
    where
        F: FnMut(&RelayEvent, &mut dyn RelayApi) -> Result<(), ExtensionError> + Send + 'static,
    {
        self.subscriptions.push(Subscription {
            event: event.to_string(),
            handler: Box::new(handler),
        });
    }

    /// Intercept packets travelling in `direction`.
    ///
    /// Fails without registering anything if any name is not interceptable.
    pub fn intercept_packets<F>(
        &mut self,
        direction: Direction,
        packets: &[&str],
        handler: F,
    ) -> Result<(), ExtensionError>
    where
        F: FnMut(&mut InterceptEvent, &mut dyn RelayApi) -> Result<(), ExtensionError>
            + Send
            + 'static,
    {
        if let Some(unsafe_name) = packets.iter().find(|p| !self.safety.is_safe(direction, p)) {
            return Err(ExtensionError::UnsafePacket {
                direction,
                packet: unsafe_name.to_string(),
            });
        }
        self.interceptors.push(Interceptor {
            direction,
            packets: packets.iter().map(|p| p.to_string()).collect(),
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn into_registrations(self) -> (Vec<Subscription>, Vec<Interceptor>) {
        (self.subscriptions, self.interceptors)
    }
}

// ─── Extension trait ─────────────────────────────────────────────────────────

/// Metadata about an extension.
#[derive(Debug, Clone)]
pub struct ExtensionInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

pub trait Extension: Send {
    fn info(&self) -> ExtensionInfo;

    /// Called when the extension is enabled. Register handlers on `ctx`.
    fn on_enable(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError>;

    /// Called when the extension is disabled. Registrations are removed by the host.
    fn on_disable(&mut self) {}

    /// Called on every relay tick while a session is relaying.
    fn on_tick(&mut self, api: &mut dyn RelayApi) {
        let _ = api;
    }
}

// ─── Relay API ───────────────────────────────────────────────────────────────

/// Read access to the shadow state plus deferred write operations.
///
/// Read methods return copies immediately. Write methods are applied after
/// the extension callback returns.
pub trait RelayApi {
    // --- Players ---
    fn players(&self) -> Vec<PlayerView>;
    fn player(&self, uuid: &Uuid) -> Option<PlayerView>;
    fn player_by_name(&self, name: &str) -> Option<PlayerView>;
    fn players_within(&self, center: Vec3, radius: f64) -> Vec<PlayerView>;
    fn teammates(&self, name: &str) -> Vec<PlayerView>;
    fn local_player(&self) -> LocalPlayerView;

    // --- Inventory ---
    fn container(&self) -> Option<ContainerView>;
    fn cursor(&self) -> Slot;

    // --- Teams ---
    fn teams(&self) -> Vec<TeamView>;
    fn team(&self, name: &str) -> Option<TeamView>;

    // --- Relay ---
    fn tick(&self) -> u64;
    fn log(&self, level: LogLevel, message: &str);

    // --- Deferred writes ---
    /// Show a system chat line to the local client.
    fn send_chat(&mut self, message: &str);
    /// Send a packet to the peer its direction points at.
    fn send_packet(&mut self, packet: Packet);
    /// Override the name rendered for a player.
    fn set_display_name(&mut self, uuid: Uuid, name: &str);
    fn clear_display_name(&mut self, uuid: Uuid);
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct ChatOnly;

    impl PacketSafety for ChatOnly {
        fn is_safe(&self, _direction: Direction, packet: &str) -> bool {
            packet == "chat"
        }
    }

    fn test_player() -> PlayerView {
        PlayerView {
            uuid: Uuid(1),
            name: Some("Alice".into()),
            display_name: Some("Alice".into()),
            entity_id: Some(5),
            position: Some(Vec3::new(0.0, 64.0, 0.0)),
            gamemode: Some(0),
            ping: Some(30),
            health: Some(20.0),
            team: None,
        }
    }

    // Minimal RelayApi implementation for testing.
    #[derive(Default)]
    struct MockApi {
        chats: Vec<String>,
        packets: Vec<Packet>,
        names: Vec<(Uuid, Option<String>)>,
    }

    impl RelayApi for MockApi {
        fn players(&self) -> Vec<PlayerView> {
            vec![test_player()]
        }
        fn player(&self, uuid: &Uuid) -> Option<PlayerView> {
            (*uuid == Uuid(1)).then(test_player)
        }
        fn player_by_name(&self, name: &str) -> Option<PlayerView> {
            (name == "Alice").then(test_player)
        }
        fn players_within(&self, _center: Vec3, _radius: f64) -> Vec<PlayerView> {
            Vec::new()
        }
        fn teammates(&self, _name: &str) -> Vec<PlayerView> {
            Vec::new()
        }
        fn local_player(&self) -> LocalPlayerView {
            LocalPlayerView {
                entity_id: 1,
                username: "Me".into(),
                position: Vec3::ZERO,
                health: 20.0,
                food: 20,
                gamemode: 0,
                held_slot: 0,
            }
        }
        fn container(&self) -> Option<ContainerView> {
            None
        }
        fn cursor(&self) -> Slot {
            Slot::Empty
        }
        fn teams(&self) -> Vec<TeamView> {
            Vec::new()
        }
        fn team(&self, _name: &str) -> Option<TeamView> {
            None
        }
        fn tick(&self) -> u64 {
            100
        }
        fn log(&self, _level: LogLevel, _message: &str) {}
        fn send_chat(&mut self, message: &str) {
            self.chats.push(message.to_string());
        }
        fn send_packet(&mut self, packet: Packet) {
            self.packets.push(packet);
        }
        fn set_display_name(&mut self, uuid: Uuid, name: &str) {
            self.names.push((uuid, Some(name.to_string())));
        }
        fn clear_display_name(&mut self, uuid: Uuid) {
            self.names.push((uuid, None));
        }
    }

    // A simple test extension.
    struct Censor {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Extension for Censor {
        fn info(&self) -> ExtensionInfo {
            ExtensionInfo {
                name: "Censor".into(),
                version: "1.0.0".into(),
                description: "Hides chat containing a word".into(),
                author: "Test".into(),
            }
        }

        fn on_enable(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
            let seen = Arc::clone(&self.seen);
            ctx.on("chat", move |event, _api| {
                if let Some(text) = event.data.get("text").and_then(|t| t.as_str()) {
                    seen.lock().map_err(|e| ExtensionError::msg(e.to_string()))?.push(text.into());
                }
                Ok(())
            });
            ctx.intercept_packets(Direction::ToClient, &["chat"], |event, api| {
                if event.fields().to_string().contains("bad") {
                    event.cancel();
                    api.send_chat("a message was hidden");
                }
                Ok(())
            })
        }
    }

    #[test]
    fn extension_info() {
        let ext = Censor {
            seen: Arc::default(),
        };
        assert_eq!(ext.info().name, "Censor");
    }

    #[test]
    fn on_enable_registers_handlers() {
        let mut ext = Censor {
            seen: Arc::default(),
        };
        let mut ctx = ExtensionContext::new(ExtensionId(3), &ChatOnly);
        ext.on_enable(&mut ctx).unwrap();
        assert_eq!(ctx.id(), ExtensionId(3));
        let (subs, interceptors) = ctx.into_registrations();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].event, "chat");
        assert_eq!(interceptors.len(), 1);
        assert!(interceptors[0].matches(Direction::ToClient, "chat"));
        assert!(!interceptors[0].matches(Direction::ToServer, "chat"));
    }

    #[test]
    fn unsafe_interception_fails_at_registration() {
        let mut ctx = ExtensionContext::new(ExtensionId(1), &ChatOnly);
        let err = ctx
            .intercept_packets(Direction::ToServer, &["chat", "position"], |_, _| Ok(()))
            .unwrap_err();
        match err {
            ExtensionError::UnsafePacket { packet, direction } => {
                assert_eq!(packet, "position");
                assert_eq!(direction, Direction::ToServer);
            }
            other => panic!("unexpected error: {other}"),
        }
        let (_, interceptors) = ctx.into_registrations();
        assert!(interceptors.is_empty());
    }

    #[test]
    fn interceptor_cancels_and_uses_api() {
        let mut ext = Censor {
            seen: Arc::default(),
        };
        let mut ctx = ExtensionContext::new(ExtensionId(1), &ChatOnly);
        ext.on_enable(&mut ctx).unwrap();
        let (_, mut interceptors) = ctx.into_registrations();

        let mut api = MockApi::default();
        let mut event = InterceptEvent::new(Packet::new(
            "chat",
            Direction::ToClient,
            json!({"message": "{\"text\":\"bad words\"}", "position": 0}),
        ));
        (interceptors[0].handler)(&mut event, &mut api).unwrap();
        assert!(event.is_cancelled());
        assert_eq!(api.chats, vec!["a message was hidden".to_string()]);
    }

    #[test]
    fn subscription_receives_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ext = Censor {
            seen: Arc::clone(&seen),
        };
        let mut ctx = ExtensionContext::new(ExtensionId(1), &ChatOnly);
        ext.on_enable(&mut ctx).unwrap();
        let (mut subs, _) = ctx.into_registrations();
        let mut api = MockApi::default();
        (subs[0].handler)(&RelayEvent::new("chat", json!({"text": "hello"})), &mut api).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn modify_replaces_fields() {
        let mut event = InterceptEvent::new(Packet::new(
            "chat",
            Direction::ToServer,
            json!({"message": "hi"}),
        ));
        assert!(!event.is_modified());
        event.modify(json!({"message": "hello"}));
        assert!(event.is_modified());
        assert!(!event.is_cancelled());
        assert_eq!(event.name(), "chat");
        assert_eq!(event.direction(), Direction::ToServer);
        assert_eq!(event.into_packet().fields, json!({"message": "hello"}));
    }

    #[test]
    fn mock_api_defers_writes() {
        let mut api = MockApi::default();
        api.set_display_name(Uuid(1), "Ally");
        api.clear_display_name(Uuid(1));
        api.send_packet(Packet::new("chat", Direction::ToServer, json!({"message": "x"})));
        assert_eq!(api.names.len(), 2);
        assert_eq!(api.packets.len(), 1);
        assert!(api.player_by_name("Alice").is_some());
        assert!(api.player(&Uuid(2)).is_none());
    }
}
