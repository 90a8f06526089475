//! Client side of the login: capture the handshake, refuse at the door.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, trace};

use mc_relay_proto::codec::PacketCodec;
use mc_relay_proto::packets::{name, LoginDisconnect, LoginStart, SetProtocol};
use mc_relay_proto::{chat, Direction, Packet, ProtocolState};

use crate::error::RelayError;
use crate::transport::{PeerEvent, PeerHandle, Side};

/// What the client sent before the relay has to pick an upstream.
#[derive(Debug, Clone)]
pub struct ClientHello {
    pub handshake: SetProtocol,
    pub login_start: LoginStart,
}

/// Read the client's handshake and login start.
///
/// Returns `Ok(None)` for a status request, which the relay does not serve.
pub async fn accept(
    events: &mut mpsc::UnboundedReceiver<PeerEvent>,
    codec: &dyn PacketCodec,
    limit: Duration,
) -> Result<Option<ClientHello>, RelayError> {
    match timeout(limit, read_hello(events, codec)).await {
        Ok(result) => result,
        Err(_) => Err(RelayError::LoginTimeout(limit)),
    }
}

async fn read_hello(
    events: &mut mpsc::UnboundedReceiver<PeerEvent>,
    codec: &dyn PacketCodec,
) -> Result<Option<ClientHello>, RelayError> {
    let handshake: SetProtocol =
        next_packet(events, codec, ProtocolState::Handshaking, name::SET_PROTOCOL)
            .await?
            .parse()?;
    if handshake.next_state != SetProtocol::NEXT_LOGIN {
        debug!(next_state = handshake.next_state, "not a login, closing");
        return Ok(None);
    }

    let login_start: LoginStart = next_packet(events, codec, ProtocolState::Login, name::LOGIN_START)
        .await?
        .parse()?;
    debug!(
        username = %login_start.username,
        protocol = handshake.protocol_version,
        "client login"
    );
    Ok(Some(ClientHello {
        handshake,
        login_start,
    }))
}

async fn next_packet(
    events: &mut mpsc::UnboundedReceiver<PeerEvent>,
    codec: &dyn PacketCodec,
    state: ProtocolState,
    wanted: &str,
) -> Result<Packet, RelayError> {
    loop {
        let payload = match events.recv().await {
            Some(PeerEvent::Frame { payload, .. }) => payload,
            Some(PeerEvent::Closed { .. }) | None => return Err(RelayError::PeerClosed(Side::Client)),
        };
        let packet = codec.decode(state, Direction::ToServer, payload)?;
        if packet.name == wanted {
            return Ok(packet);
        }
        trace!(packet = %packet.name, ?state, "ignored before login");
    }
}

/// Refuse a client that is still in the login state.
pub fn reject(client: &PeerHandle, codec: &dyn PacketCodec, reason: &str) -> Result<(), RelayError> {
    let packet = Packet::from_fields(
        name::LOGIN_DISCONNECT,
        Direction::ToClient,
        &LoginDisconnect {
            reason: chat::text_component(reason),
        },
    )?;
    client.send_frame(&codec.encode(ProtocolState::Login, &packet)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mc_relay_proto::codec::{encode_frame, FrameDecoder, JsonCodec};
    use serde_json::{json, Value};
    use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream};

    use crate::transport::ConnectionId;

    fn client() -> (PeerHandle, DuplexStream, mpsc::UnboundedReceiver<PeerEvent>) {
        let (ours, theirs) = duplex(64 * 1024);
        let (reader, writer) = split(ours);
        let (tx, rx) = mpsc::unbounded_channel();
        let peer = PeerHandle::spawn(ConnectionId(1), Side::Client, reader, writer, 1 << 16, tx);
        (peer, theirs, rx)
    }

    fn frame(name: &str, fields: Value) -> Bytes {
        let packet = Packet::new(name, Direction::ToServer, fields);
        let payload = JsonCodec.encode(ProtocolState::Login, &packet).unwrap();
        encode_frame(&payload, 1 << 16).unwrap()
    }

    fn handshake(next_state: i32) -> Bytes {
        frame(
            name::SET_PROTOCOL,
            json!({"protocolVersion": 47, "serverHost": "localhost", "serverPort": 25566, "nextState": next_state}),
        )
    }

    #[tokio::test]
    async fn captures_handshake_and_login() {
        let (_peer, mut remote, mut events) = client();
        remote.write_all(&handshake(2)).await.unwrap();
        remote
            .write_all(&frame(name::LOGIN_START, json!({"username": "Steve"})))
            .await
            .unwrap();

        let hello = accept(&mut events, &JsonCodec, Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hello.handshake.protocol_version, 47);
        assert_eq!(hello.handshake.server_port, 25566);
        assert_eq!(hello.login_start.username, "Steve");
    }

    #[tokio::test]
    async fn status_requests_are_not_served() {
        let (_peer, mut remote, mut events) = client();
        remote.write_all(&handshake(1)).await.unwrap();
        let hello = accept(&mut events, &JsonCodec, Duration::from_secs(1)).await.unwrap();
        assert!(hello.is_none());
    }

    #[tokio::test]
    async fn close_before_login_is_an_error() {
        let (_peer, mut remote, mut events) = client();
        remote.write_all(&handshake(2)).await.unwrap();
        drop(remote);
        let err = accept(&mut events, &JsonCodec, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, RelayError::PeerClosed(Side::Client)));
    }

    #[tokio::test]
    async fn silent_client_times_out() {
        let (_peer, _remote, mut events) = client();
        let err = accept(&mut events, &JsonCodec, Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, RelayError::LoginTimeout(_)));
    }

    #[tokio::test]
    async fn reject_sends_login_disconnect() {
        let (peer, mut remote, _events) = client();
        reject(&peer, &JsonCodec, "Relay busy").unwrap();
        peer.close();

        let mut wire = Vec::new();
        remote.read_to_end(&mut wire).await.unwrap();
        let mut decoder = FrameDecoder::new(1 << 16);
        decoder.extend(&wire);
        let payload = decoder.next_frame().unwrap().unwrap();
        let packet = JsonCodec
            .decode(ProtocolState::Login, Direction::ToClient, payload)
            .unwrap();
        assert_eq!(packet.name, name::LOGIN_DISCONNECT);
        assert_eq!(chat::flatten_str(packet.field_str("reason").unwrap()), "Relay busy");
    }
}
