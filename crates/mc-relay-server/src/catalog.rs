//! Static per-direction packet table.
//!
//! For every packet the relay understands, the catalog answers three
//! questions: may extensions cancel or rewrite it, which state handler owns
//! it, and which structured events it projects to. Packets with no entry are
//! forwarded verbatim with no mutation and no event.

use mc_relay_ext_api::PacketSafety;
use mc_relay_proto::packets::entity_status::status;
use mc_relay_proto::packets::player_info::action;
use mc_relay_proto::packets::use_entity::mouse;
use mc_relay_proto::packets::{name, PlayerInfo, ScoreboardTeam, UseEntity};
use mc_relay_proto::{chat, Direction, Packet};
use mc_relay_state::{EntityKind, ShadowState, StateHandler};
use serde_json::{json, Value};

/// Builds event data from a packet and the already-updated state.
/// Returning `None` suppresses the event.
pub type Extractor = fn(&Packet, &ShadowState) -> Option<Value>;

#[derive(Debug, Clone, Copy)]
pub struct EventMapping {
    pub name: &'static str,
    pub extract: Extractor,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Extensions may cancel or rewrite this packet.
    pub safe: bool,
    pub handler: Option<StateHandler>,
    pub events: &'static [EventMapping],
}

impl CatalogEntry {
    const fn mutates(handler: StateHandler) -> Self {
        Self {
            safe: false,
            handler: Some(handler),
            events: &[],
        }
    }

    const fn read_only() -> Self {
        Self {
            safe: false,
            handler: None,
            events: &[],
        }
    }

    const fn safe() -> Self {
        Self {
            safe: true,
            handler: None,
            events: &[],
        }
    }

    const fn emits(mut self, events: &'static [EventMapping]) -> Self {
        self.events = events;
        self
    }

    pub fn mutates_state(&self) -> bool {
        self.handler.is_some()
    }
}

/// Look up a packet by travel direction and name.
pub fn lookup(direction: Direction, packet: &str) -> Option<CatalogEntry> {
    use Direction::{ToClient, ToServer};

    let entry = match (direction, packet) {
        // --- Player, login and health ---
        (ToClient, name::LOGIN) => CatalogEntry::mutates(StateHandler::Player),
        (ToClient, name::RESPAWN) => CatalogEntry::mutates(StateHandler::Player).emits(RESPAWN),
        (ToClient, name::UPDATE_HEALTH) => {
            CatalogEntry::mutates(StateHandler::Player).emits(HEALTH_CHANGE)
        }
        (ToClient, name::PLAYER_INFO) => {
            CatalogEntry::mutates(StateHandler::Player).emits(PLAYER_JOIN_LEAVE)
        }
        (_, name::HELD_ITEM_SLOT) => CatalogEntry::mutates(StateHandler::Player),
        (ToServer, name::ENTITY_ACTION) => CatalogEntry::mutates(StateHandler::Player),

        // --- Entity lifecycle ---
        (ToClient, name::NAMED_ENTITY_SPAWN | name::SPAWN_ENTITY_LIVING | name::SPAWN_ENTITY) => {
            CatalogEntry::mutates(StateHandler::Entity).emits(ENTITY_SPAWN)
        }
        (
            ToClient,
            name::ENTITY_DESTROY
            | name::ENTITY_METADATA
            | name::ENTITY_EQUIPMENT
            | name::ENTITY_EFFECT
            | name::REMOVE_ENTITY_EFFECT,
        ) => CatalogEntry::mutates(StateHandler::Entity),
        (ToClient, name::ENTITY_STATUS) => {
            CatalogEntry::mutates(StateHandler::Entity).emits(ENTITY_HURT)
        }

        // --- Movement ---
        (ToClient, name::ENTITY_TELEPORT | name::REL_ENTITY_MOVE | name::ENTITY_MOVE_LOOK) => {
            CatalogEntry::mutates(StateHandler::Movement).emits(ENTITY_MOVE)
        }
        (ToClient, name::ENTITY_LOOK | name::ENTITY_HEAD_ROTATION) => {
            CatalogEntry::mutates(StateHandler::Movement)
        }
        (_, name::POSITION) => CatalogEntry::mutates(StateHandler::Movement),
        (ToServer, name::FLYING | name::LOOK | name::POSITION_LOOK) => {
            CatalogEntry::mutates(StateHandler::Movement)
        }

        // --- Inventory ---
        (ToClient, name::WINDOW_ITEMS | name::SET_SLOT) => {
            CatalogEntry::mutates(StateHandler::Inventory).emits(INVENTORY_UPDATE)
        }
        (ToClient, name::OPEN_WINDOW) => {
            CatalogEntry::mutates(StateHandler::Inventory).emits(WINDOW_OPEN)
        }
        (_, name::CLOSE_WINDOW) => {
            CatalogEntry::mutates(StateHandler::Inventory).emits(WINDOW_CLOSE)
        }
        (ToClient, name::TRANSACTION) => CatalogEntry::mutates(StateHandler::Inventory),
        (ToServer, name::TRANSACTION) => CatalogEntry::read_only(),
        (ToServer, name::WINDOW_CLICK) => CatalogEntry::mutates(StateHandler::Inventory),

        // --- Teams and scoreboard ---
        (ToClient, name::SCOREBOARD_TEAM) => {
            CatalogEntry::mutates(StateHandler::Team).emits(TEAM_UPDATE)
        }
        (ToClient, name::SCOREBOARD_OBJECTIVE | name::SCOREBOARD_SCORE) => {
            CatalogEntry::mutates(StateHandler::Team)
        }

        // --- Protocol upkeep ---
        (_, name::KEEP_ALIVE) => CatalogEntry::read_only(),
        (ToClient, name::KICK_DISCONNECT) => CatalogEntry::read_only(),

        // --- Interceptable ---
        (ToClient, name::CHAT) => CatalogEntry::safe().emits(CHAT),
        (ToClient, name::TITLE | name::NAMED_SOUND_EFFECT) => CatalogEntry::safe(),
        (ToServer, name::CHAT) => CatalogEntry::safe().emits(OUTGOING_CHAT),
        (ToServer, name::USE_ENTITY) => CatalogEntry::safe().emits(ATTACK),
        (ToServer, name::ARM_ANIMATION) => CatalogEntry::safe().emits(SWING),

        _ => return None,
    };
    Some(entry)
}

/// Interception gate handed to extensions at registration.
#[derive(Debug, Default, Clone, Copy)]
pub struct Catalog;

impl PacketSafety for Catalog {
    fn is_safe(&self, direction: Direction, packet: &str) -> bool {
        lookup(direction, packet).is_some_and(|e| e.safe)
    }
}

// ─── Event projections ───────────────────────────────────────────────────────

const CHAT: &[EventMapping] = &[EventMapping {
    name: "chat",
    extract: chat_event,
}];
const OUTGOING_CHAT: &[EventMapping] = &[EventMapping {
    name: "outgoing_chat",
    extract: outgoing_chat_event,
}];
const ATTACK: &[EventMapping] = &[EventMapping {
    name: "attack",
    extract: attack_event,
}];
const SWING: &[EventMapping] = &[EventMapping {
    name: "swing",
    extract: swing_event,
}];
const ENTITY_HURT: &[EventMapping] = &[EventMapping {
    name: "entity_hurt",
    extract: entity_hurt_event,
}];
const PLAYER_JOIN_LEAVE: &[EventMapping] = &[
    EventMapping {
        name: "player_join",
        extract: player_join_event,
    },
    EventMapping {
        name: "player_leave",
        extract: player_leave_event,
    },
];
const ENTITY_SPAWN: &[EventMapping] = &[EventMapping {
    name: "entity_spawn",
    extract: entity_spawn_event,
}];
const ENTITY_MOVE: &[EventMapping] = &[EventMapping {
    name: "entity_move",
    extract: entity_move_event,
}];
const HEALTH_CHANGE: &[EventMapping] = &[EventMapping {
    name: "health_change",
    extract: health_change_event,
}];
const TEAM_UPDATE: &[EventMapping] = &[EventMapping {
    name: "team_update",
    extract: team_update_event,
}];
const INVENTORY_UPDATE: &[EventMapping] = &[EventMapping {
    name: "inventory_update",
    extract: inventory_update_event,
}];
const WINDOW_OPEN: &[EventMapping] = &[EventMapping {
    name: "window_open",
    extract: window_open_event,
}];
const WINDOW_CLOSE: &[EventMapping] = &[EventMapping {
    name: "window_close",
    extract: window_close_event,
}];
const RESPAWN: &[EventMapping] = &[EventMapping {
    name: "respawn",
    extract: respawn_event,
}];

fn entity_id(packet: &Packet) -> Option<i32> {
    packet.field_i64("entityId").and_then(|v| i32::try_from(v).ok())
}

fn kind_name(kind: EntityKind) -> (&'static str, Option<i16>) {
    match kind {
        EntityKind::Player => ("player", None),
        EntityKind::Mob(t) => ("mob", Some(t.into())),
        EntityKind::Object(t) => ("object", Some(t.into())),
    }
}

fn player_name(state: &ShadowState, entity_id: i32) -> Option<String> {
    let uuid = state.entity(entity_id)?.uuid?;
    state.player(&uuid)?.name().map(String::from)
}

fn chat_event(packet: &Packet, _state: &ShadowState) -> Option<Value> {
    let message = packet.field_str("message")?;
    Some(json!({
        "text": chat::flatten_str(message),
        "message": message,
        "position": packet.field_i64("position").unwrap_or(0),
    }))
}

fn outgoing_chat_event(packet: &Packet, _state: &ShadowState) -> Option<Value> {
    let message = packet.field_str("message")?;
    Some(json!({ "message": message }))
}

fn attack_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let use_entity: UseEntity = packet.parse().ok()?;
    if use_entity.mouse != mouse::ATTACK {
        return None;
    }
    let target = state.entity(use_entity.target);
    Some(json!({
        "targetId": use_entity.target,
        "isPlayer": target.is_some_and(|e| e.is_player()),
        "uuid": target.and_then(|e| e.uuid),
        "name": player_name(state, use_entity.target),
    }))
}

fn swing_event(_packet: &Packet, state: &ShadowState) -> Option<Value> {
    Some(json!({ "entityId": state.local_player().entity_id }))
}

fn entity_hurt_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let id = entity_id(packet)?;
    if packet.field_i64("entityStatus")? != i64::from(status::HURT) {
        return None;
    }
    let entity = state.entity(id);
    Some(json!({
        "entityId": id,
        "isLocalPlayer": id == state.local_player().entity_id,
        "isPlayer": entity.is_some_and(|e| e.is_player()),
        "uuid": entity.and_then(|e| e.uuid),
        "name": player_name(state, id),
        "health": entity.and_then(|e| e.health),
    }))
}

fn player_join_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let info: PlayerInfo = packet.parse().ok()?;
    if info.action != action::ADD_PLAYER {
        return None;
    }
    let players: Vec<Value> = info
        .data
        .iter()
        .map(|entry| {
            json!({
                "uuid": entry.uuid,
                "name": entry.name,
                "displayName": state.formatted_display_name(&entry.uuid),
            })
        })
        .collect();
    Some(json!({ "players": players }))
}

fn player_leave_event(packet: &Packet, _state: &ShadowState) -> Option<Value> {
    let info: PlayerInfo = packet.parse().ok()?;
    if info.action != action::REMOVE_PLAYER {
        return None;
    }
    let players: Vec<Value> = info
        .data
        .iter()
        .map(|entry| json!({ "uuid": entry.uuid }))
        .collect();
    Some(json!({ "players": players }))
}

fn entity_spawn_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let entity = state.entity(entity_id(packet)?)?;
    let (kind, type_id) = kind_name(entity.kind);
    Some(json!({
        "entityId": entity.id,
        "kind": kind,
        "typeId": type_id,
        "uuid": entity.uuid,
        "position": entity.position,
    }))
}

fn entity_move_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let entity = state.entity(entity_id(packet)?)?;
    if !entity.is_player() {
        return None;
    }
    Some(json!({
        "entityId": entity.id,
        "uuid": entity.uuid,
        "name": player_name(state, entity.id),
        "position": entity.position,
        "lastPosition": entity.last_position,
        "onGround": entity.on_ground,
    }))
}

fn health_change_event(_packet: &Packet, state: &ShadowState) -> Option<Value> {
    let local = state.local_player();
    Some(json!({
        "health": local.health,
        "food": local.food,
        "saturation": local.saturation,
    }))
}

fn team_update_event(packet: &Packet, state: &ShadowState) -> Option<Value> {
    let update: ScoreboardTeam = packet.parse().ok()?;
    let members: Option<Vec<&String>> = state
        .team(&update.team)
        .map(|t| t.members.iter().collect());
    Some(json!({
        "team": update.team,
        "mode": update.mode,
        "players": update.players,
        "members": members,
    }))
}

fn inventory_update_event(packet: &Packet, _state: &ShadowState) -> Option<Value> {
    Some(json!({
        "windowId": packet.field_i64("windowId")?,
        "slot": packet.field_i64("slot"),
    }))
}

fn window_open_event(_packet: &Packet, state: &ShadowState) -> Option<Value> {
    let container = state.inventory().container()?;
    Some(json!({
        "windowId": container.window_id,
        "inventoryType": container.inventory_type,
        "title": chat::flatten_str(&container.title),
        "slotCount": container.size(),
    }))
}

fn window_close_event(packet: &Packet, _state: &ShadowState) -> Option<Value> {
    Some(json!({
        "windowId": packet.field_i64("windowId")?,
        "byClient": packet.direction == Direction::ToServer,
    }))
}

fn respawn_event(_packet: &Packet, state: &ShadowState) -> Option<Value> {
    let local = state.local_player();
    Some(json!({
        "dimension": local.dimension,
        "gamemode": local.gamemode,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_relay_ext_api::{ExtensionContext, ExtensionError, ExtensionId};

    fn apply(state: &mut ShadowState, name: &str, direction: Direction, fields: Value) -> Packet {
        let packet = Packet::new(name, direction, fields);
        if let Some(handler) = lookup(direction, name).and_then(|e| e.handler) {
            handler.apply(state, &packet).unwrap();
        }
        packet
    }

    fn extract(packet: &Packet, state: &ShadowState, event: &str) -> Option<Value> {
        let entry = lookup(packet.direction, &packet.name)?;
        let mapping = entry.events.iter().find(|m| m.name == event)?;
        (mapping.extract)(packet, state)
    }

    #[test]
    fn safety_classification() {
        assert!(Catalog.is_safe(Direction::ToClient, name::CHAT));
        assert!(Catalog.is_safe(Direction::ToServer, name::CHAT));
        assert!(Catalog.is_safe(Direction::ToServer, name::USE_ENTITY));
        for (direction, packet) in [
            (Direction::ToServer, name::POSITION),
            (Direction::ToServer, name::WINDOW_CLICK),
            (Direction::ToServer, name::KEEP_ALIVE),
            (Direction::ToClient, name::LOGIN),
            (Direction::ToClient, name::SET_SLOT),
            (Direction::ToClient, "map_chunk"),
        ] {
            assert!(!Catalog.is_safe(direction, packet), "{direction}:{packet}");
        }
        assert!(lookup(Direction::ToClient, "map_chunk").is_none());
        assert!(lookup(Direction::ToClient, name::USE_ENTITY).is_none());
    }

    #[test]
    fn state_mutating_entries() {
        let entry = lookup(Direction::ToClient, name::REL_ENTITY_MOVE).unwrap();
        assert_eq!(entry.handler, Some(StateHandler::Movement));
        assert!(entry.mutates_state());
        let entry = lookup(Direction::ToServer, name::WINDOW_CLICK).unwrap();
        assert_eq!(entry.handler, Some(StateHandler::Inventory));
        assert!(!lookup(Direction::ToClient, name::CHAT).unwrap().mutates_state());
        assert!(!lookup(Direction::ToServer, name::KEEP_ALIVE).unwrap().mutates_state());
    }

    #[test]
    fn unsafe_interception_rejected_at_registration() {
        let mut ctx = ExtensionContext::new(ExtensionId(1), &Catalog);
        assert!(ctx
            .intercept_packets(Direction::ToClient, &[name::CHAT, name::TITLE], |_, _| Ok(()))
            .is_ok());
        let err = ctx
            .intercept_packets(Direction::ToServer, &[name::FLYING], |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ExtensionError::UnsafePacket { .. }));
    }

    #[test]
    fn chat_event_flattens_components() {
        let state = ShadowState::new();
        let packet = Packet::new(
            name::CHAT,
            Direction::ToClient,
            json!({"message": r#"{"text":"A","extra":[{"text":"B"},{"text":"C"}]}"#, "position": 0}),
        );
        let data = extract(&packet, &state, "chat").unwrap();
        assert_eq!(data["text"], "ABC");
    }

    #[test]
    fn attack_only_for_attack_clicks() {
        let mut state = ShadowState::new();
        apply(
            &mut state,
            name::NAMED_ENTITY_SPAWN,
            Direction::ToClient,
            json!({"entityId": 9, "playerUUID": "00000000-0000-0000-0000-000000000009",
                   "x": 0, "y": 2048, "z": 0, "yaw": 0, "pitch": 0, "metadata": []}),
        );
        let interact = Packet::new(name::USE_ENTITY, Direction::ToServer, json!({"target": 9, "mouse": 0}));
        assert!(extract(&interact, &state, "attack").is_none());

        let attack = Packet::new(name::USE_ENTITY, Direction::ToServer, json!({"target": 9, "mouse": 1}));
        let data = extract(&attack, &state, "attack").unwrap();
        assert_eq!(data["targetId"], 9);
        assert_eq!(data["isPlayer"], true);
        assert_eq!(data["uuid"], "00000000-0000-0000-0000-000000000009");
    }

    #[test]
    fn entity_move_vetoes_non_players() {
        let mut state = ShadowState::new();
        apply(
            &mut state,
            name::SPAWN_ENTITY_LIVING,
            Direction::ToClient,
            json!({"entityId": 5, "type": 90, "x": 0, "y": 2048, "z": 0,
                   "yaw": 0, "pitch": 0, "headPitch": 0, "metadata": []}),
        );
        let mv = apply(
            &mut state,
            name::REL_ENTITY_MOVE,
            Direction::ToClient,
            json!({"entityId": 5, "dX": 32, "dY": 0, "dZ": 0, "onGround": true}),
        );
        assert!(extract(&mv, &state, "entity_move").is_none());

        apply(
            &mut state,
            name::NAMED_ENTITY_SPAWN,
            Direction::ToClient,
            json!({"entityId": 6, "playerUUID": "00000000-0000-0000-0000-000000000006",
                   "x": 0, "y": 2048, "z": 0, "yaw": 0, "pitch": 0, "metadata": []}),
        );
        let mv = apply(
            &mut state,
            name::REL_ENTITY_MOVE,
            Direction::ToClient,
            json!({"entityId": 6, "dX": 32, "dY": 0, "dZ": 0, "onGround": true}),
        );
        let data = extract(&mv, &state, "entity_move").unwrap();
        assert_eq!(data["position"]["x"], 1.0);
        assert_eq!(data["lastPosition"]["x"], 0.0);
    }

    #[test]
    fn entity_hurt_only_for_hurt_status() {
        let state = ShadowState::new();
        let dead = Packet::new(name::ENTITY_STATUS, Direction::ToClient, json!({"entityId": 3, "entityStatus": 3}));
        assert!(extract(&dead, &state, "entity_hurt").is_none());
        let hurt = Packet::new(name::ENTITY_STATUS, Direction::ToClient, json!({"entityId": 3, "entityStatus": 2}));
        assert_eq!(extract(&hurt, &state, "entity_hurt").unwrap()["entityId"], 3);
    }

    #[test]
    fn player_info_projects_join_or_leave() {
        let mut state = ShadowState::new();
        let add = apply(
            &mut state,
            name::PLAYER_INFO,
            Direction::ToClient,
            json!({"action": 0, "data": [{"UUID": "00000000-0000-0000-0000-000000000001",
                   "name": "Alice", "gamemode": 0, "ping": 20}]}),
        );
        let data = extract(&add, &state, "player_join").unwrap();
        assert_eq!(data["players"][0]["name"], "Alice");
        assert_eq!(data["players"][0]["displayName"], "Alice");
        assert!(extract(&add, &state, "player_leave").is_none());

        let remove = apply(
            &mut state,
            name::PLAYER_INFO,
            Direction::ToClient,
            json!({"action": 4, "data": [{"UUID": "00000000-0000-0000-0000-000000000001"}]}),
        );
        assert!(extract(&remove, &state, "player_join").is_none());
        let data = extract(&remove, &state, "player_leave").unwrap();
        assert_eq!(data["players"][0]["uuid"], "00000000-0000-0000-0000-000000000001");
    }

    #[test]
    fn health_change_reads_updated_state() {
        let mut state = ShadowState::new();
        let packet = apply(
            &mut state,
            name::UPDATE_HEALTH,
            Direction::ToClient,
            json!({"health": 7.5, "food": 12, "foodSaturation": 1.0}),
        );
        let data = extract(&packet, &state, "health_change").unwrap();
        assert_eq!(data["health"], 7.5);
        assert_eq!(data["food"], 12);
    }

    #[test]
    fn window_open_requires_container() {
        let mut state = ShadowState::new();
        let packet = Packet::new(
            name::OPEN_WINDOW,
            Direction::ToClient,
            json!({"windowId": 2, "inventoryType": "minecraft:chest",
                   "windowTitle": "\"Chest\"", "slotCount": 27}),
        );
        assert!(extract(&packet, &state, "window_open").is_none());
        let packet = apply(&mut state, name::OPEN_WINDOW, Direction::ToClient, packet.fields.clone());
        let data = extract(&packet, &state, "window_open").unwrap();
        assert_eq!(data["slotCount"], 27);
        assert_eq!(data["title"], "Chest");
    }
}
