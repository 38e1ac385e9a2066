#![no_main]

use libfuzzer_sys::fuzz_target;
use mc_protocol::core::frame::{read_packet, write_packet};
use mc_protocol::protocol::{Direction, GameState, PacketRegistry, ProtocolVersion};

const STATES: [GameState; 3] = [GameState::Handshaking, GameState::Status, GameState::Login];

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // first byte picks the version and state, second the compression mode
    let version = ProtocolVersion::SUPPORTED[data[0] as usize % ProtocolVersion::SUPPORTED.len()];
    let state = STATES[(data[0] as usize / 16) % STATES.len()];
    let direction = if data[0] & 0x80 == 0 {
        Direction::Serverbound
    } else {
        Direction::Clientbound
    };
    let threshold = if data[1] & 1 == 0 { -1 } else { 64 };

    let registry = PacketRegistry::new();
    let Ok(inbound) = registry.resolve(version, state, direction) else {
        return;
    };

    let mut reader = &data[2..];
    if let Ok(packet) = read_packet(&mut reader, &inbound, threshold) {
        // anything that decodes must encode again and decode to the same value
        let mut wire = Vec::new();
        if write_packet(&mut wire, &packet, version, threshold).is_ok() {
            let again = read_packet(&mut wire.as_slice(), &inbound, threshold);
            assert_eq!(again.ok(), Some(packet));
        }
    }
});
