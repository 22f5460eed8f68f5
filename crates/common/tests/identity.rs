//! Integration tests for meta, address and identifier derivation

mod common;

use ::common::crypto::{CryptographyKey, SignKey, VerifyKey};
use ::common::mkm::{
    anyone, create_identifier, generate_address, parse_address, parse_identifier, Address,
    EntityType, Identifier, Meta, MetaType,
};
use proptest::prelude::*;

#[test]
fn test_user_and_group_entities() {
    let (_, meta, user) = common::setup_entity(MetaType::Mkm, "moky", EntityType::USER);
    assert!(user.is_user());
    assert_eq!(user.name(), Some("moky"));
    assert!(meta.matches_identifier(&user));

    let group_address = generate_address(&meta, EntityType::GROUP).unwrap();
    let group = create_identifier(meta.seed(), &group_address, None).unwrap();
    assert!(group.is_group());
    assert_ne!(group, user);
    assert!(meta.matches_identifier(&group));
}

#[test]
fn test_identifier_survives_meta_serialization() {
    let (key, meta, id) = common::setup_entity(MetaType::Mkm, "hulk", EntityType::USER);

    let json = serde_json::to_string(&meta).unwrap();
    let restored: Meta = serde_json::from_str(&json).unwrap();
    assert!(restored.matches_identifier(&id));
    assert!(restored.matches_public_key(&key.public_key().unwrap()));

    let signature = key.sign(b"greetings").unwrap();
    assert!(restored.public_key().verify(b"greetings", &signature));
}

#[test]
fn test_rsa_meta_with_btc_addresses() {
    let key = common::rsa_key();
    let meta = Meta::generate(MetaType::Btc, &key, Some("station")).unwrap();
    let address = generate_address(&meta, EntityType::STATION).unwrap();
    assert_eq!(address.network(), EntityType::STATION);

    let parsed = parse_address(address.as_str()).unwrap();
    assert_eq!(parsed, address);
    assert!(meta.public_key().data().is_ok());
}

#[test]
fn test_eth_identifier() {
    let (_, meta, id) = common::setup_entity(MetaType::Eth, "satoshi", EntityType::USER);
    assert!(matches!(id.address(), Address::Eth(_)));
    assert!(id.address().as_str().starts_with("0x"));
    assert!(meta.matches_identifier(&id));
}

#[test]
fn test_broadcast_identifiers_parse_to_constants() {
    let id = parse_identifier("anyone@anywhere").unwrap();
    assert_eq!(&id, anyone());
    assert!(id.is_broadcast());
}

#[test]
fn prop_identifier_round_trip() {
    proptest!(|(
        name in proptest::option::of("[a-z][a-z0-9_.-]{0,15}"),
        terminal in proptest::option::of("[A-Za-z0-9_-]{1,12}"),
        network in prop_oneof![Just(EntityType::USER), Just(EntityType::GROUP), Just(EntityType::BOT)],
    )| {
        let address = Address::Btc(::common::mkm::BtcAddress::generate(b"hello", network));
        let id = Identifier::new(name.as_deref(), address, terminal.as_deref()).unwrap();
        let parsed = Identifier::parse(id.as_str()).unwrap();

        prop_assert_eq!(parsed.as_str(), id.as_str());
        prop_assert_eq!(parsed.name(), id.name());
        prop_assert_eq!(parsed.terminal(), id.terminal());
        prop_assert_eq!(parsed.network(), network);
    });
}

#[test]
fn prop_checksum_detects_single_character_change() {
    proptest!(|(index in 0usize..34, replacement in "[1-9A-HJ-NP-Za-km-z]")| {
        let original = common::HELLO_ADDRESS;
        let replacement = replacement.chars().next().unwrap();
        let current = original.chars().nth(index).unwrap();
        prop_assume!(current != replacement);

        let corrupted: String = original
            .chars()
            .enumerate()
            .map(|(i, c)| if i == index { replacement } else { c })
            .collect();
        prop_assert!(Address::parse(&corrupted).is_err());
    });
}
