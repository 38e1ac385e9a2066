//! Property-based tests using proptest
//!
//! These tests check codec invariants over randomly generated inputs:
//! primitives survive a write/read cycle, VarInts stay within their byte
//! caps, frames decode to the packet that was written at any threshold, and
//! arbitrary bytes never panic a decoder.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use mc_protocol::config::MAX_DATA_LENGTH;
use mc_protocol::core::frame::{read_packet, write_packet, FrameSettings};
use mc_protocol::core::primitives::{McRead, McWrite};
use mc_protocol::core::varint::{encode_varint, encode_varlong, varint_len, varlong_len};
use mc_protocol::core::Buffer;
use mc_protocol::nbt::{self, Compound, List, NamedTag, Tag};
use mc_protocol::protocol::login::LoginPluginResponse;
use mc_protocol::protocol::{Direction, GameState, Packet, PacketRegistry, ProtocolVersion};
use mc_protocol::utils::compression::{maybe_compress, maybe_decompress};
use proptest::prelude::*;

fn leaf_tag() -> impl Strategy<Value = Tag> {
    prop_oneof![
        any::<i8>().prop_map(Tag::Byte),
        any::<i16>().prop_map(Tag::Short),
        any::<i32>().prop_map(Tag::Int),
        any::<i64>().prop_map(Tag::Long),
        (-1.0e6f32..1.0e6f32).prop_map(Tag::Float),
        (-1.0e12f64..1.0e12f64).prop_map(Tag::Double),
        prop::collection::vec(any::<i8>(), 0..32).prop_map(Tag::ByteArray),
        "\\PC{0,24}".prop_map(Tag::String),
        prop::collection::vec(any::<i32>(), 0..16).prop_map(Tag::IntArray),
        prop::collection::vec(any::<i64>(), 0..16).prop_map(Tag::LongArray),
    ]
}

fn nbt_tree() -> impl Strategy<Value = Tag> {
    leaf_tag().prop_recursive(4, 96, 6, |inner| {
        prop_oneof![
            prop::collection::btree_map("[a-zA-Z_]{1,10}", inner.clone(), 0..6).prop_map(
                |children| {
                    let mut compound = Compound::new();
                    for (name, tag) in children {
                        compound.insert(name, tag).unwrap();
                    }
                    Tag::Compound(compound)
                }
            ),
            prop::collection::vec(inner, 0..6).prop_map(|items| {
                let kind = items.first().map(Tag::kind);
                let same_kind = items.into_iter().filter(|t| Some(t.kind()) == kind);
                Tag::List(List::from_tags(same_kind).unwrap())
            }),
        ]
    })
}

/// One level of compound whose children are leaves or lists of leaves; every
/// such tree has a schema that reproduces it from JSON.
fn flat_compound() -> impl Strategy<Value = Tag> {
    let child = prop_oneof![
        leaf_tag(),
        prop::collection::vec(leaf_tag(), 0..6).prop_map(|items| {
            let kind = items.first().map(Tag::kind);
            let same_kind = items.into_iter().filter(|t| Some(t.kind()) == kind);
            Tag::List(List::from_tags(same_kind).unwrap())
        }),
    ];
    prop::collection::btree_map("[a-z]{1,8}", child, 0..8).prop_map(|children| {
        let mut compound = Compound::new();
        for (name, tag) in children {
            compound.insert(name, tag).unwrap();
        }
        Tag::Compound(compound)
    })
}

// Property: fixed-width values survive a write/read cycle
proptest! {
    #[test]
    fn prop_fixed_width_roundtrip(
        a in any::<i8>(), b in any::<u16>(), c in any::<i32>(),
        d in any::<i64>(), e in any::<f32>(), f in any::<bool>(),
    ) {
        let mut buf = Buffer::new();
        buf.write_value(a).unwrap();
        buf.write_value(b).unwrap();
        buf.write_value(c).unwrap();
        buf.write_value(d).unwrap();
        buf.write_value(e).unwrap();
        buf.write_value(f).unwrap();
        prop_assert_eq!(buf.len(), 1 + 2 + 4 + 8 + 4 + 1);

        prop_assert_eq!(buf.read_value::<i8>().unwrap(), a);
        prop_assert_eq!(buf.read_value::<u16>().unwrap(), b);
        prop_assert_eq!(buf.read_value::<i32>().unwrap(), c);
        prop_assert_eq!(buf.read_value::<i64>().unwrap(), d);
        prop_assert_eq!(buf.read_value::<f32>().unwrap().to_bits(), e.to_bits());
        prop_assert_eq!(buf.read_value::<bool>().unwrap(), f);
        prop_assert!(!buf.has_remaining());
    }
}

// Property: VarInt/VarLong encodings respect their byte caps and decode back
proptest! {
    #[test]
    fn prop_varint_within_cap(value in any::<i32>()) {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        prop_assert!(out.len() <= 5);
        prop_assert_eq!(out.len(), varint_len(value));
        prop_assert!(out[..out.len() - 1].iter().all(|b| b & 0x80 != 0));
        prop_assert_eq!(out[out.len() - 1] & 0x80, 0);

        let mut buf = Buffer::from_bytes(out);
        prop_assert_eq!(buf.read_varint().unwrap(), value);
    }

    #[test]
    fn prop_varlong_within_cap(value in any::<i64>()) {
        let mut out = Vec::new();
        encode_varlong(value, &mut out);
        prop_assert!(out.len() <= 10);
        prop_assert_eq!(out.len(), varlong_len(value));

        let mut buf = Buffer::from_bytes(out);
        prop_assert_eq!(buf.read_varlong().unwrap(), value);
    }

    #[test]
    fn prop_range_checked_write(value in any::<i64>()) {
        let mut buf = Buffer::new();
        let result = buf.write_int::<i16>(i128::from(value));
        prop_assert_eq!(result.is_ok(), i16::try_from(value).is_ok());
    }
}

// Property: strings and optionals decode to what was written
proptest! {
    #[test]
    fn prop_utf_roundtrip(text in "\\PC{0,200}") {
        let mut buf = Buffer::new();
        buf.write_utf(&text).unwrap();
        prop_assert_eq!(buf.read_utf().unwrap(), text);
    }

    #[test]
    fn prop_ascii_roundtrip(text in "[ -~]{0,64}") {
        let mut buf = Buffer::new();
        buf.write_ascii(&text).unwrap();
        prop_assert_eq!(buf.as_slice().last(), Some(&0u8));
        prop_assert_eq!(buf.read_ascii().unwrap(), text);
    }

    #[test]
    fn prop_optional_roundtrip(value in proptest::option::of(any::<i64>())) {
        let mut buf = Buffer::new();
        buf.write_optional(value.as_ref(), |b, v| b.write_value(*v)).unwrap();
        let decoded = buf.read_optional(|b| b.read_value::<i64>()).unwrap();
        prop_assert_eq!(decoded, value);
    }
}

// Property: the zlib transform is lossless
proptest! {
    #[test]
    fn prop_compression_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..20000),
        threshold in -1i32..512,
    ) {
        let compressed = maybe_compress(&data, threshold, 6).unwrap();
        prop_assert_eq!(compressed.is_some(), threshold >= 0 && data.len() > threshold as usize);
        if let Some(payload) = compressed {
            let restored = maybe_decompress(&payload, Some(data.len()), MAX_DATA_LENGTH).unwrap();
            prop_assert_eq!(restored, Some(data));
        }
    }
}

// Property: a written frame reads back as the same packet at any threshold
proptest! {
    #[test]
    fn prop_frame_roundtrip(
        message_id in any::<i32>(),
        data in proptest::option::of(prop::collection::vec(any::<u8>(), 0..4096)),
        threshold in -1i32..300,
    ) {
        let registry = PacketRegistry::new();
        let version = ProtocolVersion::V1_18_1;
        let inbound = registry
            .resolve(version, GameState::Login, Direction::Serverbound)
            .unwrap();

        let packet: Packet = LoginPluginResponse { message_id, data }.into();
        let settings = FrameSettings::compressed(threshold);

        let mut wire = Vec::new();
        write_packet(&mut wire, &packet, version, settings).unwrap();
        let decoded = read_packet(&mut wire.as_slice(), &inbound, settings).unwrap();
        prop_assert_eq!(decoded, packet);
    }

    #[test]
    fn prop_read_packet_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let registry = PacketRegistry::new();
        let inbound = registry
            .resolve(ProtocolVersion::V1_18_1, GameState::Login, Direction::Serverbound)
            .unwrap();
        let _ = read_packet(&mut data.as_slice(), &inbound, -1);
        let _ = read_packet(&mut data.as_slice(), &inbound, 0);
    }
}

// Property: NBT trees survive serialization, and garbage never panics the reader
proptest! {
    #[test]
    fn prop_nbt_roundtrip(tag in nbt_tree(), name in "[a-z]{1,12}") {
        let root = NamedTag::new(name, tag);
        let bytes = nbt::to_bytes(&root).unwrap();
        prop_assert_eq!(nbt::from_bytes(&bytes).unwrap(), root);
    }

    #[test]
    fn prop_nbt_native_roundtrip(tag in flat_compound()) {
        let schema = nbt::Schema::of(&tag).unwrap();
        let native = nbt::to_native(&tag);
        prop_assert_eq!(nbt::from_native(&native, Some(&schema)).unwrap(), tag);
    }

    #[test]
    fn prop_nbt_garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = nbt::from_bytes(&data);
    }
}
