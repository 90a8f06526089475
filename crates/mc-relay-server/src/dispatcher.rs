//! Per-packet pipeline.
//!
//! Every decoded play packet goes through the same fixed steps:
//!
//! 1. client chat starting with the command prefix is offered to the relay
//!    command registry, and a consumed command stops here;
//! 2. interceptors run, for catalog-safe packets only;
//! 3. the packet, possibly rewritten, is forwarded if not cancelled and the
//!    receiving peer is past login;
//! 4. the owning state handler runs on the original fields;
//! 5. event projection is queued and runs in [`Dispatcher::flush_events`],
//!    after the packet has been forwarded and the state updated.
//!
//! Nothing in here returns an error to the caller; every failure is logged
//! and the packet carries on.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use mc_relay_command::{parse_command_line, CommandAction, CommandContext, CommandRegistry};
use mc_relay_ext_api::{InterceptEvent, RelayEvent};
use mc_relay_proto::packets::chat_message::position;
use mc_relay_proto::packets::player_info::action;
use mc_relay_proto::packets::{name, PlayerInfo, PlayerInfoEntry};
use mc_relay_proto::types::Uuid;
use mc_relay_proto::{chat, Direction, Packet};
use mc_relay_state::ShadowState;
use serde_json::json;
use tracing::{debug, info, trace, warn};

use crate::catalog::{self, EventMapping};
use crate::error::RelayError;
use crate::extension_host::{ExtensionHost, PendingAction};
use crate::session::{SessionInfo, SessionState};

/// Where dispatched packets go.
pub trait Outbound {
    /// Whether the peer `direction` points at has finished logging in.
    fn is_ready(&self, direction: Direction) -> bool;

    /// Encode and queue a packet for the peer its direction points at.
    fn send(&mut self, packet: &Packet) -> Result<(), RelayError>;
}

/// Everything a dispatch borrows from the session for one packet.
pub struct DispatchContext<'a> {
    pub state: &'a mut ShadowState,
    pub host: &'a mut ExtensionHost,
    pub out: &'a mut dyn Outbound,
    pub session: &'a SessionInfo,
}

/// What happened to a dispatched packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Forwarded,
    /// An interceptor cancelled it.
    Cancelled,
    /// The receiving peer is not past login.
    NotReady,
    /// A relay command handled it. The session carries out any action.
    Consumed(Option<CommandAction>),
}

struct QueuedEvent {
    packet: Packet,
    events: &'static [EventMapping],
}

pub struct Dispatcher {
    commands: CommandRegistry,
    prefix: String,
    queue: VecDeque<QueuedEvent>,
}

impl Dispatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            commands: CommandRegistry::new(),
            prefix: prefix.into(),
            queue: VecDeque::new(),
        }
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    /// Event projections waiting for [`Dispatcher::flush_events`].
    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn clear_events(&mut self) {
        self.queue.clear();
    }

    pub fn dispatch(&mut self, packet: Packet, ctx: &mut DispatchContext<'_>) -> Disposition {
        if packet.direction == Direction::ToServer && packet.name == name::CHAT {
            if let Some(consumed) = self.try_command(&packet, ctx) {
                return consumed;
            }
        }

        let Some(entry) = catalog::lookup(packet.direction, &packet.name) else {
            return forward(&packet, ctx.out);
        };

        let mut actions = Vec::new();
        let disposition = if entry.safe && ctx.host.has_interceptor(packet.direction, &packet.name)
        {
            let mut event = InterceptEvent::new(packet.clone());
            actions = ctx.host.run_interceptors(&mut event, ctx.state, ctx.session.tick);
            if event.is_cancelled() {
                trace!(packet = %packet.name, direction = %packet.direction, "cancelled by extension");
                Disposition::Cancelled
            } else {
                forward(&event.into_packet(), ctx.out)
            }
        } else {
            forward(&packet, ctx.out)
        };

        if let Some(handler) = entry.handler {
            if let Err(e) = handler.apply(ctx.state, &packet) {
                debug!(packet = %packet.name, direction = %packet.direction, "state not updated: {e}");
            }
        }

        apply_actions(actions, ctx.state, ctx.out);

        if !entry.events.is_empty() && ctx.session.phase == SessionState::Relaying {
            self.queue.push_back(QueuedEvent {
                packet,
                events: entry.events,
            });
        }
        disposition
    }

    /// Extract and deliver every queued event projection.
    pub fn flush_events(&mut self, ctx: &mut DispatchContext<'_>) {
        while let Some(queued) = self.queue.pop_front() {
            for mapping in queued.events {
                if !ctx.host.has_subscriber(mapping.name) {
                    continue;
                }
                let state: &ShadowState = ctx.state;
                let extracted =
                    panic::catch_unwind(AssertUnwindSafe(|| (mapping.extract)(&queued.packet, state)));
                let data = match extracted {
                    Ok(Some(data)) => data,
                    Ok(None) => continue,
                    Err(_) => {
                        warn!(event = mapping.name, packet = %queued.packet.name, "extractor panicked");
                        continue;
                    }
                };
                let event = RelayEvent::new(mapping.name, data);
                let actions = ctx.host.dispatch_event(&event, ctx.state, ctx.session.tick);
                apply_actions(actions, ctx.state, ctx.out);
            }
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    fn try_command(&mut self, packet: &Packet, ctx: &mut DispatchContext<'_>) -> Option<Disposition> {
        let line = packet.field_str("message")?;
        let (command, args) = parse_command_line(line, &self.prefix)?;
        let limbo = ctx.session.phase == SessionState::Limbo;
        if !self.commands.contains(&command) && !limbo {
            return None;
        }

        debug!(command = %command, "relay command");
        let args = self.inject_args(&command, args, ctx);
        let result = self.commands.execute(
            &command,
            &CommandContext {
                sender_name: ctx.session.username.clone(),
                args,
            },
        );
        for message in &result.messages {
            send_chat(ctx.out, message);
        }

        let action = match result.action {
            Some(CommandAction::EnableExtension(name)) => {
                match ctx.host.enable(&name) {
                    Ok(()) => send_chat(ctx.out, &format!("Enabled {name}")),
                    Err(e) => send_chat(ctx.out, &format!("Could not enable {name}: {e}")),
                }
                None
            }
            Some(CommandAction::DisableExtension(name)) => {
                match ctx.host.disable(&name, ctx.state) {
                    Ok(cleared) => {
                        for uuid in cleared {
                            refresh_display_name(ctx.state, ctx.out, uuid);
                        }
                        send_chat(ctx.out, &format!("Disabled {name}"));
                    }
                    Err(e) => send_chat(ctx.out, &format!("Could not disable {name}: {e}")),
                }
                None
            }
            other => other,
        };
        Some(Disposition::Consumed(action))
    }

    /// Fill in the arguments built-in commands expect from the relay.
    fn inject_args(&self, command: &str, args: Vec<String>, ctx: &DispatchContext<'_>) -> Vec<String> {
        match command {
            "help" => self.commands.help_args(),
            "relay" => {
                let enabled = ctx.host.statuses().iter().filter(|(_, on)| *on).count();
                vec![
                    format!("state={}", ctx.session.phase),
                    format!("upstream={}", ctx.session.upstream),
                    format!("tick={}", ctx.session.tick),
                    format!("entities={}", ctx.state.entity_count()),
                    format!("players={}", ctx.state.players().len()),
                    format!("extensions={enabled} enabled"),
                ]
            }
            "ext" if args.first().map_or(true, |a| a == "list") => {
                let mut injected = vec!["list".to_string()];
                injected.extend(ctx.host.statuses().into_iter().map(|(name, on)| {
                    format!("{name}:{}", if on { "enabled" } else { "disabled" })
                }));
                injected
            }
            _ => args,
        }
    }
}

fn forward(packet: &Packet, out: &mut dyn Outbound) -> Disposition {
    if !out.is_ready(packet.direction) {
        trace!(packet = %packet.name, direction = %packet.direction, "receiver not ready, dropped");
        return Disposition::NotReady;
    }
    match out.send(packet) {
        Ok(()) => Disposition::Forwarded,
        Err(e) => {
            warn!(packet = %packet.name, direction = %packet.direction, "forwarding failed: {e}");
            Disposition::Forwarded
        }
    }
}

/// A system chat line for the local client.
pub fn system_chat(text: &str) -> Packet {
    Packet::new(
        name::CHAT,
        Direction::ToClient,
        json!({ "message": chat::text_component(text), "position": position::SYSTEM }),
    )
}

fn send_chat(out: &mut dyn Outbound, text: &str) {
    if let Err(e) = out.send(&system_chat(text)) {
        warn!("relay chat not delivered: {e}");
    }
}

/// Carry out what extensions asked for during a callback.
pub fn apply_actions(actions: Vec<PendingAction>, state: &mut ShadowState, out: &mut dyn Outbound) {
    for action in actions {
        match action {
            PendingAction::SendChat { message } => send_chat(out, &message),
            PendingAction::SendPacket { packet } => {
                forward(&packet, out);
            }
            PendingAction::SetDisplayName { owner, uuid, name } => {
                info!(%uuid, name = %name, "display name override set");
                state.set_name_override(uuid, owner.0, name);
                refresh_display_name(state, out, uuid);
            }
            PendingAction::ClearDisplayName { owner, uuid } => {
                state.clear_name_override(&uuid, owner.0);
                refresh_display_name(state, out, uuid);
            }
        }
    }
}

/// Tell the client to redraw a player's tab-list name.
fn refresh_display_name(state: &ShadowState, out: &mut dyn Outbound, uuid: Uuid) {
    let Some(tab) = state.tab_entry(&uuid) else {
        return;
    };
    let display_name = match state.name_override(&uuid) {
        Some(_) => state
            .formatted_display_name(&uuid)
            .map(|name| chat::text_component(&name)),
        None => tab.display_name.clone(),
    };
    let update = PlayerInfo {
        action: action::UPDATE_DISPLAY_NAME,
        data: vec![PlayerInfoEntry {
            uuid,
            name: None,
            gamemode: None,
            ping: None,
            display_name,
        }],
    };
    match Packet::from_fields(name::PLAYER_INFO, Direction::ToClient, &update) {
        Ok(packet) => {
            forward(&packet, out);
        }
        Err(e) => debug!(%uuid, "display name refresh not built: {e}"),
    }
}
