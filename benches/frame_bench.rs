use bytes::BytesMut;
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use mc_protocol::core::codec::PacketCodec;
use mc_protocol::core::frame::{decode_frame, encode_frame};
use mc_protocol::core::primitives::McRead;
use mc_protocol::core::varint::{encode_varint, peek_varint};
use mc_protocol::protocol::login::LoginPluginResponse;
use mc_protocol::protocol::{Direction, GameState, Packet, PacketRegistry, ProtocolVersion};
use tokio_util::codec::{Decoder, Encoder};

const VERSION: ProtocolVersion = ProtocolVersion::V1_20_1;

fn plugin_response(size: usize) -> Packet {
    LoginPluginResponse {
        message_id: 1,
        data: Some((0..size).map(|i| (i % 251) as u8).collect()),
    }
    .into()
}

#[allow(clippy::unwrap_used)]
fn bench_frame_encode_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode_decode");
    let payload_sizes = [64usize, 512, 4096, 65536, 1024 * 1024];
    let registry = PacketRegistry::new();
    let inbound = registry
        .resolve(VERSION, GameState::Login, Direction::Serverbound)
        .unwrap();

    for &size in &payload_sizes {
        let packet = plugin_response(size);
        group.throughput(Throughput::Bytes(size as u64));

        for (label, threshold) in [("raw", -1), ("zlib", 256)] {
            group.bench_function(format!("encode_{label}_{size}b"), |b| {
                b.iter(|| encode_frame(&packet, VERSION, threshold).unwrap())
            });

            let frame = encode_frame(&packet, VERSION, threshold).unwrap();
            // skip the length prefix, decode_frame takes the body only
            let (_, prefix_len) = peek_varint(&frame).unwrap().unwrap();
            let body = frame[prefix_len..].to_vec();
            group.bench_function(format!("decode_{label}_{size}b"), |b| {
                b.iter_batched(
                    || body.clone(),
                    |body| {
                        let decoded = decode_frame(body, &inbound, threshold);
                        assert!(decoded.is_ok());
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_codec");
    let registry = PacketRegistry::new();

    for &size in &[512usize, 65536] {
        let packet = plugin_response(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("roundtrip_{size}b"), |b| {
            let mut client = PacketCodec::client(&registry, VERSION).unwrap();
            let mut server = PacketCodec::server(&registry, VERSION).unwrap();
            client.set_state(GameState::Login);
            server.set_state(GameState::Login);
            let mut buf = BytesMut::with_capacity(size + 16);
            b.iter(|| {
                client.encode(&packet, &mut buf).unwrap();
                let decoded = server.decode(&mut buf).unwrap();
                assert!(decoded.is_some());
            })
        });
    }

    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");
    let values = [0i32, 127, 25565, 2_097_151, i32::MAX, -1];

    group.bench_function("encode", |b| {
        let mut out = Vec::with_capacity(64);
        b.iter(|| {
            out.clear();
            for &value in &values {
                encode_varint(value, &mut out);
            }
        })
    });

    let mut encoded = Vec::new();
    for &value in &values {
        encode_varint(value, &mut encoded);
    }
    group.bench_function("decode", |b| {
        b.iter(|| {
            let mut reader = &encoded[..];
            for _ in 0..values.len() {
                reader.read_varint().unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_frame_encode_decode, bench_codec, bench_varint);
criterion_main!(benches);
