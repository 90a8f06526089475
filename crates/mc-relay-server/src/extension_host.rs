//! Extension host: registers, enables, and dispatches to extensions.

use std::panic::{self, AssertUnwindSafe};

use mc_relay_ext_api::{
    ContainerView, Extension, ExtensionContext, ExtensionError, ExtensionId, InterceptEvent,
    Interceptor, LocalPlayerView, LogLevel, PlayerView, RelayApi, RelayEvent, Subscription,
    TeamView,
};
use mc_relay_proto::types::{Uuid, Vec3};
use mc_relay_proto::{Direction, Packet, Slot};
use mc_relay_state::{PlayerRecord, ShadowState, Team};
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Deferred side-effect requested by an extension during a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    SendChat {
        message: String,
    },
    SendPacket {
        packet: Packet,
    },
    SetDisplayName {
        owner: ExtensionId,
        uuid: Uuid,
        name: String,
    },
    ClearDisplayName {
        owner: ExtensionId,
        uuid: Uuid,
    },
}

/// A registration tagged with the extension that owns it.
struct Owned<T> {
    owner: ExtensionId,
    extension: String,
    inner: T,
}

struct LoadedExtension {
    id: ExtensionId,
    name: String,
    extension: Box<dyn Extension>,
    enabled: bool,
}

// ─── Views ───────────────────────────────────────────────────────────────────

fn player_view(state: &ShadowState, record: &PlayerRecord<'_>) -> PlayerView {
    let name = record.name().map(String::from);
    PlayerView {
        uuid: record.uuid,
        display_name: state.formatted_display_name(&record.uuid).or_else(|| name.clone()),
        team: name
            .as_deref()
            .and_then(|n| state.team_of(n))
            .map(|t| t.name.clone()),
        name,
        entity_id: record.entity.map(|e| e.id),
        position: record.entity.map(|e| e.position),
        gamemode: record.tab.map(|t| t.gamemode),
        ping: record.tab.map(|t| t.ping),
        health: record.entity.and_then(|e| e.health),
    }
}

fn team_view(team: &Team) -> TeamView {
    TeamView {
        name: team.name.clone(),
        display_name: team.display_name.clone(),
        prefix: team.prefix.clone(),
        suffix: team.suffix.clone(),
        color: team.color,
        members: team.members.iter().cloned().collect(),
    }
}

// ─── RelayApiImpl ────────────────────────────────────────────────────────────

/// Implements `RelayApi` by reading the shadow state and accumulating
/// PendingActions for writes.
struct RelayApiImpl<'a> {
    state: &'a ShadowState,
    tick: u64,
    owner: ExtensionId,
    extension: &'a str,
    actions: Vec<PendingAction>,
}

impl<'a> RelayApiImpl<'a> {
    fn new(state: &'a ShadowState, tick: u64, owner: ExtensionId, extension: &'a str) -> Self {
        Self {
            state,
            tick,
            owner,
            extension,
            actions: Vec::new(),
        }
    }

    fn take_actions(self) -> Vec<PendingAction> {
        self.actions
    }
}

impl RelayApi for RelayApiImpl<'_> {
    fn players(&self) -> Vec<PlayerView> {
        self.state
            .players()
            .iter()
            .map(|p| player_view(self.state, p))
            .collect()
    }

    fn player(&self, uuid: &Uuid) -> Option<PlayerView> {
        self.state
            .player(uuid)
            .map(|p| player_view(self.state, &p))
    }

    fn player_by_name(&self, name: &str) -> Option<PlayerView> {
        self.state
            .player_by_name(name)
            .map(|p| player_view(self.state, &p))
    }

    fn players_within(&self, center: Vec3, radius: f64) -> Vec<PlayerView> {
        self.state
            .players_within(center, radius)
            .iter()
            .map(|p| player_view(self.state, p))
            .collect()
    }

    fn teammates(&self, name: &str) -> Vec<PlayerView> {
        self.state
            .teammates(name)
            .iter()
            .map(|p| player_view(self.state, p))
            .collect()
    }

    fn local_player(&self) -> LocalPlayerView {
        let local = self.state.local_player();
        LocalPlayerView {
            entity_id: local.entity_id,
            username: local.username.clone(),
            position: local.position,
            health: local.health,
            food: local.food,
            gamemode: local.gamemode,
            held_slot: local.held_slot,
        }
    }

    fn container(&self) -> Option<ContainerView> {
        self.state
            .inventory()
            .container()
            .map(|c| ContainerView {
                window_id: c.window_id,
                inventory_type: c.inventory_type.clone(),
                title: c.title.clone(),
                slots: c.slots.clone(),
            })
    }

    fn cursor(&self) -> Slot {
        self.state.inventory().cursor().clone()
    }

    fn teams(&self) -> Vec<TeamView> {
        let mut teams: Vec<TeamView> = self.state.teams().map(team_view).collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        teams
    }

    fn team(&self, name: &str) -> Option<TeamView> {
        self.state.team(name).map(team_view)
    }

    fn tick(&self) -> u64 {
        self.tick
    }

    fn log(&self, level: LogLevel, message: &str) {
        let extension = self.extension;
        match level {
            LogLevel::Info => info!(extension, "{message}"),
            LogLevel::Warn => warn!(extension, "{message}"),
            LogLevel::Error => error!(extension, "{message}"),
            LogLevel::Debug => debug!(extension, "{message}"),
        }
    }

    fn send_chat(&mut self, message: &str) {
        self.actions.push(PendingAction::SendChat {
            message: message.to_string(),
        });
    }

    fn send_packet(&mut self, packet: Packet) {
        self.actions.push(PendingAction::SendPacket { packet });
    }

    fn set_display_name(&mut self, uuid: Uuid, name: &str) {
        self.actions.push(PendingAction::SetDisplayName {
            owner: self.owner,
            uuid,
            name: name.to_string(),
        });
    }

    fn clear_display_name(&mut self, uuid: Uuid) {
        self.actions.push(PendingAction::ClearDisplayName {
            owner: self.owner,
            uuid,
        });
    }
}

/// Run an extension callback, turning both errors and panics into a log line.
fn guarded<F>(extension: &str, what: &str, f: F) -> bool
where
    F: FnOnce() -> Result<(), ExtensionError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(extension, "{what} failed: {e}");
            false
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!(extension, "{what} panicked: {reason}");
            false
        }
    }
}

// ─── ExtensionHost ───────────────────────────────────────────────────────────

/// Owns every registered extension and everything they registered.
///
/// Callbacks run one at a time on the session task. A failing callback is
/// logged with its extension name and skipped.
#[derive(Default)]
pub struct ExtensionHost {
    extensions: Vec<LoadedExtension>,
    subscriptions: Vec<Owned<Subscription>>,
    interceptors: Vec<Owned<Interceptor>>,
    next_id: u32,
}

impl ExtensionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension (call before `enable_all`).
    pub fn register(&mut self, extension: Box<dyn Extension>) -> ExtensionId {
        self.next_id += 1;
        let id = ExtensionId(self.next_id);
        let name = extension.info().name;
        info!("Registered extension: {name}");
        self.extensions.push(LoadedExtension {
            id,
            name,
            extension,
            enabled: false,
        });
        id
    }

    /// Enable every registered extension not named in `disabled`.
    pub fn enable_all(&mut self, disabled: &[String]) {
        let names: Vec<String> = self
            .extensions
            .iter()
            .filter(|e| !disabled.contains(&e.name))
            .map(|e| e.name.clone())
            .collect();
        for name in names {
            if let Err(e) = self.enable(&name) {
                warn!(extension = %name, "not enabled: {e}");
            }
        }
    }

    /// Enable an extension by name, running its `on_enable`.
    ///
    /// Nothing it registered is kept if `on_enable` fails.
    pub fn enable(&mut self, name: &str) -> Result<(), ExtensionError> {
        let loaded = self
            .extensions
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ExtensionError::msg(format!("unknown extension {name}")))?;
        if loaded.enabled {
            return Err(ExtensionError::msg(format!("{} is already enabled", loaded.name)));
        }

        let mut ctx = ExtensionContext::new(loaded.id, &Catalog);
        let mut result = Ok(());
        let ok = guarded(&loaded.name, "on_enable", || {
            result = loaded.extension.on_enable(&mut ctx);
            result
                .as_ref()
                .map(|_| ())
                .map_err(|e| ExtensionError::msg(e.to_string()))
        });
        if !ok {
            return Err(result
                .err()
                .unwrap_or_else(|| ExtensionError::msg("on_enable panicked")));
        }

        let (subscriptions, interceptors) = ctx.into_registrations();
        let (owner, extension) = (loaded.id, loaded.name.clone());
        loaded.enabled = true;
        info!(
            extension = %extension,
            subscriptions = subscriptions.len(),
            interceptors = interceptors.len(),
            "Enabled extension"
        );
        self.subscriptions
            .extend(subscriptions.into_iter().map(|inner| Owned {
                owner,
                extension: extension.clone(),
                inner,
            }));
        self.interceptors
            .extend(interceptors.into_iter().map(|inner| Owned {
                owner,
                extension: extension.clone(),
                inner,
            }));
        Ok(())
    }

    /// Disable an extension by name and reverse everything it registered,
    /// including display-name overrides held in `state`.
    ///
    /// Returns the players whose override was dropped, so the caller can
    /// refresh their tab-list names on the client.
    pub fn disable(&mut self, name: &str, state: &mut ShadowState) -> Result<Vec<Uuid>, ExtensionError> {
        let loaded = self
            .extensions
            .iter_mut()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ExtensionError::msg(format!("unknown extension {name}")))?;
        if !loaded.enabled {
            return Err(ExtensionError::msg(format!("{} is not enabled", loaded.name)));
        }
        let owner = loaded.id;
        loaded.enabled = false;
        let extension = loaded.extension.as_mut();
        guarded(&loaded.name, "on_disable", || {
            extension.on_disable();
            Ok(())
        });

        self.subscriptions.retain(|s| s.owner != owner);
        self.interceptors.retain(|i| i.owner != owner);
        let cleared = state.clear_name_overrides_of(owner.0);
        info!(extension = %loaded.name, overrides = cleared.len(), "Disabled extension");
        Ok(cleared)
    }

    /// Disable every enabled extension.
    pub fn disable_all(&mut self, state: &mut ShadowState) {
        let names: Vec<String> = self
            .extensions
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.name.clone())
            .collect();
        for name in names {
            let _ = self.disable(&name, state);
        }
    }

    /// `(name, enabled)` for every registered extension, in registration order.
    pub fn statuses(&self) -> Vec<(String, bool)> {
        self.extensions
            .iter()
            .map(|e| (e.name.clone(), e.enabled))
            .collect()
    }

    pub fn has_interceptor(&self, direction: Direction, packet: &str) -> bool {
        self.interceptors
            .iter()
            .any(|i| i.inner.matches(direction, packet))
    }

    pub fn has_subscriber(&self, event: &str) -> bool {
        self.subscriptions.iter().any(|s| s.inner.event == event)
    }

    /// Offer a packet to every matching interceptor, in registration order.
    ///
    /// Each interceptor sees the result of the previous one. A failing
    /// interceptor's changes and actions are discarded.
    pub fn run_interceptors(
        &mut self,
        event: &mut InterceptEvent,
        state: &ShadowState,
        tick: u64,
    ) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for interceptor in &mut self.interceptors {
            if !interceptor.inner.matches(event.direction(), event.name()) {
                continue;
            }
            let mut attempt = event.clone();
            let mut api = RelayApiImpl::new(state, tick, interceptor.owner, &interceptor.extension);
            let handler = &mut interceptor.inner.handler;
            let ok = guarded(&interceptor.extension, "interceptor", || {
                handler(&mut attempt, &mut api)
            });
            if ok {
                *event = attempt;
                all_actions.extend(api.take_actions());
            }
        }
        all_actions
    }

    /// Deliver an event to every subscriber.
    pub fn dispatch_event(
        &mut self,
        event: &RelayEvent,
        state: &ShadowState,
        tick: u64,
    ) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for subscription in &mut self.subscriptions {
            if subscription.inner.event != event.name {
                continue;
            }
            let mut api =
                RelayApiImpl::new(state, tick, subscription.owner, &subscription.extension);
            let handler = &mut subscription.inner.handler;
            let what = format!("{} handler", event.name);
            if guarded(&subscription.extension, &what, || handler(event, &mut api)) {
                all_actions.extend(api.take_actions());
            }
        }
        all_actions
    }

    /// Run `on_tick` on every enabled extension.
    pub fn tick(&mut self, state: &ShadowState, tick: u64) -> Vec<PendingAction> {
        let mut all_actions = Vec::new();
        for loaded in self.extensions.iter_mut().filter(|e| e.enabled) {
            let mut api = RelayApiImpl::new(state, tick, loaded.id, &loaded.name);
            let extension = loaded.extension.as_mut();
            if guarded(&loaded.name, "on_tick", || {
                extension.on_tick(&mut api);
                Ok(())
            }) {
                all_actions.extend(api.take_actions());
            }
        }
        all_actions
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_ext_api::ExtensionInfo;
    use mc_relay_proto::packets::name;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn info(name: &str) -> ExtensionInfo {
        ExtensionInfo {
            name: name.into(),
            version: "0.1.0".into(),
            description: "Test".into(),
            author: "Test".into(),
        }
    }

    /// Rewrites outgoing chat, renames a player, and counts ticks.
    struct Shouter {
        ticks: Arc<Mutex<u64>>,
    }

    impl Extension for Shouter {
        fn info(&self) -> ExtensionInfo {
            info("Shouter")
        }

        fn on_enable(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
            ctx.intercept_packets(Direction::ToServer, &[name::CHAT], |event, _api| {
                let message = event.fields()["message"].as_str().unwrap_or_default().to_uppercase();
                event.modify(json!({ "message": message }));
                Ok(())
            })?;
            ctx.on("player_join", |_event, api| {
                api.set_display_name(Uuid(1), "Friend");
                api.send_chat("welcome");
                Ok(())
            });
            Ok(())
        }

        fn on_tick(&mut self, _api: &mut dyn RelayApi) {
            if let Ok(mut ticks) = self.ticks.lock() {
                *ticks += 1;
            }
        }
    }

    /// Fails or panics in every callback.
    struct Broken {
        panic: bool,
    }

    impl Extension for Broken {
        fn info(&self) -> ExtensionInfo {
            info("Broken")
        }

        fn on_enable(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
            let panic = self.panic;
            ctx.intercept_packets(Direction::ToServer, &[name::CHAT], move |event, _api| {
                event.cancel();
                if panic {
                    panic!("interceptor exploded");
                }
                Err(ExtensionError::msg("interceptor failed"))
            })?;
            ctx.on("player_join", move |_event, _api| {
                if panic {
                    panic!("handler exploded");
                }
                Err(ExtensionError::msg("handler failed"))
            });
            Ok(())
        }
    }

    /// Asks for a packet it may not touch.
    struct Greedy;

    impl Extension for Greedy {
        fn info(&self) -> ExtensionInfo {
            info("Greedy")
        }

        fn on_enable(&mut self, ctx: &mut ExtensionContext<'_>) -> Result<(), ExtensionError> {
            ctx.on("chat", |_, _| Ok(()));
            ctx.intercept_packets(Direction::ToServer, &[name::POSITION], |_, _| Ok(()))
        }
    }

    fn chat_event(message: &str) -> InterceptEvent {
        InterceptEvent::new(Packet::new(
            name::CHAT,
            Direction::ToServer,
            json!({ "message": message }),
        ))
    }

    fn add_players(state: &mut ShadowState) {
        mc_relay_state::StateHandler::Player
            .apply(
                state,
                &Packet::new(
                    name::PLAYER_INFO,
                    Direction::ToClient,
                    json!({"action": 0, "data": [
                        {"UUID": "00000000-0000-0000-0000-000000000001",
                         "name": "Alice", "gamemode": 1, "ping": 42},
                        {"UUID": "00000000-0000-0000-0000-000000000002",
                         "name": "Bob", "gamemode": 0, "ping": 10}
                    ]}),
                ),
            )
            .unwrap();
    }

    fn host_with(extensions: Vec<Box<dyn Extension>>) -> ExtensionHost {
        let mut host = ExtensionHost::new();
        for ext in extensions {
            host.register(ext);
        }
        host.enable_all(&[]);
        host
    }

    #[test]
    fn enable_all_respects_disabled_list() {
        let mut host = ExtensionHost::new();
        host.register(Box::new(Shouter { ticks: Arc::default() }));
        host.register(Box::new(Broken { panic: false }));
        host.enable_all(&["broken".to_string(), "Broken".to_string()]);
        assert_eq!(
            host.statuses(),
            vec![("Shouter".to_string(), true), ("Broken".to_string(), false)]
        );
        assert!(host.has_interceptor(Direction::ToServer, name::CHAT));
        assert!(host.has_subscriber("player_join"));
    }

    #[test]
    fn interceptor_rewrites_fields() {
        let mut host = host_with(vec![Box::new(Shouter { ticks: Arc::default() })]);
        let state = ShadowState::new();
        let mut event = chat_event("hello");
        let actions = host.run_interceptors(&mut event, &state, 0);
        assert!(actions.is_empty());
        assert!(event.is_modified());
        assert_eq!(event.fields()["message"], "HELLO");
    }

    #[test]
    fn failing_interceptor_is_skipped() {
        for panic in [false, true] {
            let mut host = host_with(vec![
                Box::new(Broken { panic }),
                Box::new(Shouter { ticks: Arc::default() }),
            ]);
            let state = ShadowState::new();
            let mut event = chat_event("hello");
            host.run_interceptors(&mut event, &state, 0);
            // The broken interceptor's cancel is discarded; the next one still runs.
            assert!(!event.is_cancelled());
            assert_eq!(event.fields()["message"], "HELLO");
        }
    }

    #[test]
    fn failing_handler_does_not_stop_others() {
        for panic in [false, true] {
            let mut host = host_with(vec![
                Box::new(Broken { panic }),
                Box::new(Shouter { ticks: Arc::default() }),
            ]);
            let state = ShadowState::new();
            let actions = host.dispatch_event(&RelayEvent::new("player_join", json!({})), &state, 4);
            assert_eq!(actions.len(), 2);
            assert!(matches!(actions[1], PendingAction::SendChat { .. }));
        }
    }

    #[test]
    fn unsafe_registration_keeps_extension_disabled() {
        let mut host = ExtensionHost::new();
        host.register(Box::new(Greedy));
        let err = host.enable("Greedy").unwrap_err();
        assert!(matches!(err, ExtensionError::UnsafePacket { .. }));
        assert_eq!(host.statuses(), vec![("Greedy".to_string(), false)]);
        assert!(!host.has_subscriber("chat"));
    }

    #[test]
    fn disable_reverses_registrations_and_overrides() {
        let mut host = host_with(vec![Box::new(Shouter { ticks: Arc::default() })]);
        let mut state = ShadowState::new();
        add_players(&mut state);
        let actions = host.dispatch_event(&RelayEvent::new("player_join", json!({})), &state, 0);
        let owner = match &actions[0] {
            PendingAction::SetDisplayName { owner, uuid, name } => {
                state.set_name_override(*uuid, owner.0, name.clone());
                *owner
            }
            other => panic!("unexpected action: {other:?}"),
        };
        state.set_name_override(Uuid(2), owner.0 + 1, "Other");
        assert_eq!(state.formatted_display_name(&Uuid(1)).as_deref(), Some("Friend"));

        assert_eq!(host.disable("shouter", &mut state).unwrap(), vec![Uuid(1)]);
        assert_eq!(state.formatted_display_name(&Uuid(1)).as_deref(), Some("Alice"));
        assert_eq!(state.formatted_display_name(&Uuid(2)).as_deref(), Some("Other"));
        assert!(!host.has_interceptor(Direction::ToServer, name::CHAT));
        assert!(!host.has_subscriber("player_join"));
        assert!(host.disable("Shouter", &mut state).is_err());

        // Re-enabling registers everything again.
        host.enable("Shouter").unwrap();
        assert!(host.has_interceptor(Direction::ToServer, name::CHAT));
        assert!(host.enable("Shouter").is_err());
        assert!(host.enable("Missing").is_err());
    }

    #[test]
    fn tick_runs_enabled_extensions_only() {
        let ticks = Arc::new(Mutex::new(0));
        let mut host = host_with(vec![Box::new(Shouter { ticks: Arc::clone(&ticks) })]);
        let mut state = ShadowState::new();
        host.tick(&state, 1);
        host.tick(&state, 2);
        assert_eq!(*ticks.lock().unwrap(), 2);
        host.disable_all(&mut state);
        host.tick(&state, 3);
        assert_eq!(*ticks.lock().unwrap(), 2);
    }

    #[test]
    fn api_reads_state() {
        let mut state = ShadowState::new();
        add_players(&mut state);
        state.set_name_override(Uuid(1), 7, "Ally");
        let api = RelayApiImpl::new(&state, 9, ExtensionId(7), "Test");
        let players = api.players();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].name.as_deref(), Some("Alice"));
        assert_eq!(players[0].display_name.as_deref(), Some("Ally"));
        assert_eq!(players[0].ping, Some(42));
        assert!(api.player_by_name("alice").is_some());
        assert!(api.player(&Uuid(2)).is_none());
        assert!(api.container().is_none());
        assert!(api.cursor().is_empty());
        assert_eq!(api.tick(), 9);
        assert_eq!(api.local_player().health, 20.0);
    }

    #[test]
    fn api_accumulates_actions() {
        let state = ShadowState::new();
        let mut api = RelayApiImpl::new(&state, 0, ExtensionId(3), "Test");
        api.send_chat("hi");
        api.set_display_name(Uuid(5), "Bob");
        api.clear_display_name(Uuid(5));
        let actions = api.take_actions();
        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[2],
            PendingAction::ClearDisplayName {
                owner: ExtensionId(3),
                uuid: Uuid(5)
            }
        );
    }
}
