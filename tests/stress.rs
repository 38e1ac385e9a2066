use bytes::BytesMut;
use mc_protocol::core::codec::PacketCodec;
use mc_protocol::protocol::login::LoginPluginResponse;
use mc_protocol::protocol::{GameState, Packet, PacketRegistry, ProtocolVersion};
use tokio_util::codec::{Decoder, Encoder};

#[test]
#[allow(clippy::unwrap_used)]
fn stress_plugin_response_large_series() {
    // heavy burst of frames across sizes and both envelopes, reusing one buffer
    let registry = PacketRegistry::new();
    let mut client = PacketCodec::client(&registry, ProtocolVersion::LATEST).unwrap();
    let mut server = PacketCodec::server(&registry, ProtocolVersion::LATEST).unwrap();
    client.set_state(GameState::Login);
    server.set_state(GameState::Login);
    let mut buf = BytesMut::new();

    for threshold in [-1, 256] {
        client.set_compression(threshold);
        server.set_compression(threshold);
        for size in [0usize, 1, 64, 512, 4096, 65536, 1_048_576] {
            for i in 0..50 {
                let packet: Packet = LoginPluginResponse {
                    message_id: i,
                    data: Some(vec![(i & 0xFF) as u8; size]),
                }
                .into();
                client.encode(&packet, &mut buf).unwrap();
                assert_eq!(server.decode(&mut buf).unwrap(), Some(packet));
                assert!(buf.is_empty());
            }
        }
    }
}
