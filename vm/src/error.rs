// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use ethabi::{ParamType, Token};
use thor_state::StateError;
use thor_shared::abi;

/// Execution result of a native method body.
pub type Result<T> = std::result::Result<T, NativeError>;

/// What a native method can fail with.
///
/// The recoverable kinds (`Revert`, `OutOfGas`) are converted into a VM
/// revert at the dispatch boundary; `Fatal` propagates unchanged and aborts
/// the enclosing block execution.
#[derive(thiserror::Error, Debug)]
pub enum NativeError {
    #[error("revert: {0:?}")]
    Revert(RevertData),
    #[error("out of gas")]
    OutOfGas,
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

/// The revert payload shape, Solidity compatible.
#[derive(Debug)]
pub enum RevertData {
    /// Rendered as an `Error(string)` payload.
    Message(String),
    /// Rendered as a 4-byte custom-error selector plus encoded args.
    Custom {
        name: &'static str,
        params: Vec<ParamType>,
        args: Vec<Token>,
    },
}

impl RevertData {
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            RevertData::Message(msg) => abi::error_string_payload(msg),
            RevertData::Custom { name, params, args } => {
                abi::custom_error_payload(name, params, args)
            }
        }
    }
}

impl NativeError {
    pub fn revert(msg: impl Into<String>) -> Self {
        NativeError::Revert(RevertData::Message(msg.into()))
    }

    /// An argument-less custom error, the common case.
    pub fn custom(name: &'static str) -> Self {
        NativeError::Revert(RevertData::Custom {
            name,
            params: Vec::new(),
            args: Vec::new(),
        })
    }

    pub fn custom_with(name: &'static str, params: Vec<ParamType>, args: Vec<Token>) -> Self {
        NativeError::Revert(RevertData::Custom { name, params, args })
    }

    /// The name of the custom error, if this is one. Test hook.
    pub fn custom_name(&self) -> Option<&'static str> {
        match self {
            NativeError::Revert(RevertData::Custom { name, .. }) => Some(name),
            _ => None,
        }
    }
}

impl From<StateError> for NativeError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::OutOfGas => NativeError::OutOfGas,
            // Missing historical views are a domain failure the caller can
            // observe; trie I/O and decode mismatches are not.
            StateError::UnknownRoot(root) => {
                NativeError::revert(format!("unknown state root {:?}", root))
            }
            other => NativeError::Fatal(other.into()),
        }
    }
}

impl From<abi::AbiError> for NativeError {
    // ABI mismatches against a statically-known table are table bugs.
    fn from(e: abi::AbiError) -> Self {
        NativeError::Fatal(e.into())
    }
}

/// Extension for lifting foreign errors into the fatal kind.
pub trait ClassifyResult<T> {
    fn or_fatal(self) -> Result<T>;
}

impl<T, E> ClassifyResult<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn or_fatal(self) -> Result<T> {
        self.map_err(|e| NativeError::Fatal(e.into()))
    }
}

/// Convenience macro for message reverts.
#[macro_export]
macro_rules! native_revert {
    ( $msg:literal $(,)? ) => {
        $crate::NativeError::revert($msg)
    };
    ( $fmt:literal, $($arg:tt)* ) => {
        $crate::NativeError::revert(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_payload_is_error_string() {
        let err = native_revert!("no {}", "luck");
        match err {
            NativeError::Revert(data) => {
                assert_eq!(
                    abi::decode_error_string(&data.to_payload()).as_deref(),
                    Some("no luck")
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn custom_payload_is_selector_prefixed() {
        let err = NativeError::custom("StakerPaused");
        match err {
            NativeError::Revert(data) => {
                let payload = data.to_payload();
                assert_eq!(payload, ethabi::short_signature("StakerPaused", &[]));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn state_out_of_gas_maps() {
        let err: NativeError = StateError::OutOfGas.into();
        assert!(matches!(err, NativeError::OutOfGas));
    }
}
