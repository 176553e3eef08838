// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use thor_builtins::testing::TestEnv;
use thor_builtins::{authority, energy};
use thor_shared::abi;
use thor_shared::keys::{KEY_MAX_BLOCK_PROPOSERS, KEY_PROPOSER_ENDORSEMENT};
use thor_shared::{address_from_name, bytes32_from_label, Address, TokenAmount};

fn setup() -> (TestEnv, Address) {
    let mut env = TestEnv::new();
    let executor = address_from_name(b"executor");
    env.set_executor(executor);
    env.set_param(&KEY_MAX_BLOCK_PROPOSERS, &TokenAmount::from_wei(101u64));
    env.set_param(
        &KEY_PROPOSER_ENDORSEMENT,
        &TokenAmount::from_whole(1_000),
    );
    (env, executor)
}

fn add(env: &mut TestEnv, executor: Address, n: u8) -> Address {
    let master = address_from_name(&[b'm', b'0' + n]);
    let endorsor = address_from_name(&[b'e', b'0' + n]);
    let identity = bytes32_from_label(&[b'i', b'd', b'0' + n]);
    let out = env.call(
        executor,
        *authority::ADDRESS,
        "add",
        &[
            abi::token_address(master),
            abi::token_address(endorsor),
            abi::token_bytes32(identity),
        ],
    );
    assert!(abi::as_bool(&out[0]));
    master
}

#[test]
fn roster_happy_path() {
    let (mut env, executor) = setup();
    let anyone = address_from_name(b"anyone");

    let m1 = add(&mut env, executor, 1);
    let m2 = add(&mut env, executor, 2);
    let m3 = add(&mut env, executor, 3);

    let out = env.call(anyone, *authority::ADDRESS, "first", &[]);
    assert_eq!(abi::as_address(&out[0]), m1);
    let out = env.call(anyone, *authority::ADDRESS, "next", &[abi::token_address(m1)]);
    assert_eq!(abi::as_address(&out[0]), m2);
    let out = env.call(anyone, *authority::ADDRESS, "next", &[abi::token_address(m3)]);
    assert!(abi::as_address(&out[0]).is_zero());

    // e2 holds 1 wei of energy, far below the endorsement; anyone may revoke.
    let e2 = address_from_name(b"e2");
    energy::Energy::new()
        .add(&mut env.state, &e2, 0, &TokenAmount::from_wei(1u64))
        .unwrap();
    let out = env.call(anyone, *authority::ADDRESS, "revoke", &[abi::token_address(m2)]);
    assert!(abi::as_bool(&out[0]));

    // Candidate(m2, "revoked") emitted.
    let log = env.last_logs.last().unwrap();
    let mut expected_topic = [0u8; 32];
    expected_topic[12..].copy_from_slice(m2.as_bytes());
    assert_eq!(log.topics[1].as_bytes(), expected_topic);
    assert_eq!(
        log.data,
        ethabi::encode(&[abi::token_bytes32(bytes32_from_label(b"revoked"))])
    );

    let out = env.call(anyone, *authority::ADDRESS, "first", &[]);
    assert_eq!(abi::as_address(&out[0]), m1);
    let out = env.call(anyone, *authority::ADDRESS, "next", &[abi::token_address(m1)]);
    assert_eq!(abi::as_address(&out[0]), m3);

    let out = env.call(anyone, *authority::ADDRESS, "get", &[abi::token_address(m2)]);
    assert!(!abi::as_bool(&out[0]));
}

#[test]
fn well_endorsed_candidate_survives_foreign_revoke() {
    let (mut env, executor) = setup();
    let m1 = add(&mut env, executor, 1);
    let e1 = address_from_name(b"e1");
    energy::Energy::new()
        .add(&mut env.state, &e1, 0, &TokenAmount::from_whole(5_000))
        .unwrap();

    let payload = env.call_err(
        address_from_name(b"anyone"),
        *authority::ADDRESS,
        "revoke",
        &[abi::token_address(m1)],
    );
    assert!(thor_shared::abi::decode_error_string(&payload).is_some());

    // The executor is not subject to the endorsement check.
    let out = env.call(executor, *authority::ADDRESS, "revoke", &[abi::token_address(m1)]);
    assert!(abi::as_bool(&out[0]));
}

#[test]
fn add_requires_executor() {
    let (mut env, _) = setup();
    let payload = env.call_err(
        address_from_name(b"anyone"),
        *authority::ADDRESS,
        "add",
        &[
            abi::token_address(address_from_name(b"m1")),
            abi::token_address(address_from_name(b"e1")),
            abi::token_bytes32(bytes32_from_label(b"id1")),
        ],
    );
    assert!(thor_shared::abi::decode_error_string(&payload).is_some());
}

#[test]
fn duplicate_add_returns_false() {
    let (mut env, executor) = setup();
    let m1 = add(&mut env, executor, 1);
    let out = env.call(
        executor,
        *authority::ADDRESS,
        "add",
        &[
            abi::token_address(m1),
            abi::token_address(address_from_name(b"e9")),
            abi::token_bytes32(bytes32_from_label(b"id9")),
        ],
    );
    assert!(!abi::as_bool(&out[0]));
}

#[test]
fn revoke_then_re_add() {
    let (mut env, executor) = setup();
    let m1 = add(&mut env, executor, 1);
    let out = env.call(executor, *authority::ADDRESS, "revoke", &[abi::token_address(m1)]);
    assert!(abi::as_bool(&out[0]));
    let out = env.call(
        executor,
        *authority::ADDRESS,
        "add",
        &[
            abi::token_address(m1),
            abi::token_address(address_from_name(b"e1")),
            abi::token_bytes32(bytes32_from_label(b"id1")),
        ],
    );
    assert!(abi::as_bool(&out[0]));
}
