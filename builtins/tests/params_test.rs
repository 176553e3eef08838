// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use thor_builtins::params;
use thor_builtins::testing::TestEnv;
use thor_shared::abi::{self, decode_error_string};
use thor_shared::{address_from_name, bytes32_from_label, TokenAmount};

#[test]
fn set_by_executor_then_get() {
    let mut env = TestEnv::new();
    let executor = address_from_name(b"e");
    env.set_executor(executor);

    let key = bytes32_from_label(b"key");
    env.call(
        executor,
        *params::ADDRESS,
        "set",
        &[abi::token_bytes32(key), abi::token_u64(999)],
    );

    // Emits Set(key indexed, value).
    assert_eq!(env.last_logs.len(), 1);
    let log = &env.last_logs[0];
    assert_eq!(log.address, *params::ADDRESS);
    assert_eq!(log.topics[1], key);
    assert_eq!(log.data, ethabi::encode(&[abi::token_u64(999)]));

    let out = env.call(executor, *params::ADDRESS, "get", &[abi::token_bytes32(key)]);
    assert_eq!(abi::as_amount(&out[0]), TokenAmount::from_wei(999u64));
}

#[test]
fn set_by_non_executor_reverts() {
    let mut env = TestEnv::new();
    let executor = address_from_name(b"e");
    env.set_executor(executor);

    let key = bytes32_from_label(b"key");
    env.call(
        executor,
        *params::ADDRESS,
        "set",
        &[abi::token_bytes32(key), abi::token_u64(999)],
    );

    let payload = env.call_err(
        address_from_name(b"other"),
        *params::ADDRESS,
        "set",
        &[abi::token_bytes32(key), abi::token_u64(111)],
    );
    assert!(decode_error_string(&payload).is_some());

    // The rejected write changed nothing.
    let out = env.call(executor, *params::ADDRESS, "get", &[abi::token_bytes32(key)]);
    assert_eq!(abi::as_amount(&out[0]), TokenAmount::from_wei(999u64));
}

#[test]
fn executor_getter_reflects_registry() {
    let mut env = TestEnv::new();
    let executor = address_from_name(b"e");
    env.set_executor(executor);
    let caller = address_from_name(b"anyone");
    let out = env.call(caller, *params::ADDRESS, "executor", &[]);
    assert_eq!(abi::as_address(&out[0]), executor);
}

#[test]
fn set_with_no_executor_configured_reverts() {
    let mut env = TestEnv::new();
    let payload = env.call_err(
        address_from_name(b"anyone"),
        *params::ADDRESS,
        "set",
        &[
            abi::token_bytes32(bytes32_from_label(b"key")),
            abi::token_u64(1),
        ],
    );
    assert!(decode_error_string(&payload).is_some());
}
