// Copyright 2025 PRAGMA
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::utils::{InvalidBech32, decode_bech32, encode_bech32};
use std::fmt;

pub use pallas_crypto::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Hash sizes
// -----------------------------------------------------------------------------

pub mod size {
    pub const CREDENTIAL: usize = 28;

    pub const KEY: usize = CREDENTIAL;

    pub const SCRIPT: usize = CREDENTIAL;

    pub const POOL_COLD_KEY: usize = 28;

    pub const DATUM: usize = 32;

    pub const TRANSACTION_BODY: usize = 32;

    pub const AUXILIARY_DATA: usize = 32;

    pub const SCRIPT_DATA: usize = 32;

    pub const VRF_KEY: usize = 32;
}

// -----------------------------------------------------------------------------
// Aliases
// -----------------------------------------------------------------------------

pub type PubKeyHash = Hash<{ size::KEY }>;

pub type ScriptHash = Hash<{ size::SCRIPT }>;

pub type PolicyId = Hash<{ size::SCRIPT }>;

pub type PoolId = Hash<{ size::POOL_COLD_KEY }>;

pub type DatumHash = Hash<{ size::DATUM }>;

pub type TransactionId = Hash<{ size::TRANSACTION_BODY }>;

pub type AuxiliaryDataHash = Hash<{ size::AUXILIARY_DATA }>;

pub type ScriptDataHash = Hash<{ size::SCRIPT_DATA }>;

// -----------------------------------------------------------------------------
// Constants
// -----------------------------------------------------------------------------

pub const NULL_HASH28: Hash<28> = Hash::new([0; 28]);

pub const NULL_HASH32: Hash<32> = Hash::new([0; 32]);

pub fn blake2b_224(bytes: &[u8]) -> Hash<28> {
    Hasher::<224>::hash(bytes)
}

pub fn blake2b_256(bytes: &[u8]) -> Hash<32> {
    Hasher::<256>::hash(bytes)
}

/// Construct a fixed-width hash out of a slice, failing when the length doesn't match.
pub fn hash_from_slice<const BYTES: usize>(
    role: HashRole,
    bytes: &[u8],
) -> Result<Hash<BYTES>, InvalidHash> {
    <[u8; BYTES]>::try_from(bytes)
        .map(Hash::new)
        .map_err(|_| InvalidHash::InvalidLength {
            role,
            expected: BYTES,
            actual: bytes.len(),
        })
}

// -----------------------------------------------------------------------------
// Roles
// -----------------------------------------------------------------------------

/// All 28-byte identifiers share a single representation; the role only matters at the edges,
/// when formatting or parsing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashRole {
    PubKey,
    StakeKey,
    Validator,
    MintingPolicy,
    StakingValidator,
    Datum,
    Transaction,
}

impl HashRole {
    pub fn bech32_prefix(&self) -> &'static str {
        match self {
            Self::PubKey => "addr_vkh",
            Self::StakeKey => "stake_vkh",
            Self::Validator | Self::StakingValidator => "script",
            Self::MintingPolicy => "policy",
            Self::Datum => "datum",
            Self::Transaction => "tx",
        }
    }

    pub fn expected_length(&self) -> usize {
        match self {
            Self::PubKey | Self::StakeKey => size::KEY,
            Self::Validator | Self::MintingPolicy | Self::StakingValidator => size::SCRIPT,
            Self::Datum => size::DATUM,
            Self::Transaction => size::TRANSACTION_BODY,
        }
    }

    /// Minting policies are the only identifiers that may be empty: the empty policy stands for
    /// the base currency.
    pub fn accepts_length(&self, len: usize) -> bool {
        len == self.expected_length() || (*self == Self::MintingPolicy && len == 0)
    }

    pub fn to_bech32<const BYTES: usize>(&self, hash: &Hash<BYTES>) -> Result<String, InvalidHash> {
        Ok(encode_bech32(self.bech32_prefix(), hash.as_ref())?)
    }

    pub fn from_bech32<const BYTES: usize>(&self, s: &str) -> Result<Hash<BYTES>, InvalidHash> {
        let (prefix, payload) = decode_bech32(s)?;
        if prefix != self.bech32_prefix() {
            return Err(InvalidHash::UnexpectedPrefix {
                expected: self.bech32_prefix(),
                actual: prefix,
            });
        }
        hash_from_slice(*self, &payload)
    }

    pub fn from_hex<const BYTES: usize>(&self, s: &str) -> Result<Hash<BYTES>, InvalidHash> {
        hash_from_slice(*self, &hex::decode(s)?)
    }
}

impl fmt::Display for HashRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PubKey => "public key hash",
            Self::StakeKey => "stake key hash",
            Self::Validator => "validator hash",
            Self::MintingPolicy => "minting policy",
            Self::StakingValidator => "staking validator hash",
            Self::Datum => "datum hash",
            Self::Transaction => "transaction id",
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidHash {
    #[error("invalid {role} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        role: HashRole,
        expected: usize,
        actual: usize,
    },
    #[error("malformed hex string: {0}")]
    MalformedHex(#[from] hex::FromHexError),
    #[error("{0}")]
    MalformedBech32(#[from] InvalidBech32),
    #[error("unexpected bech32 prefix: expected {expected} got {actual}")]
    UnexpectedPrefix {
        expected: &'static str,
        actual: String,
    },
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub fn any_hash28() -> impl Strategy<Value = Hash<28>> {
        any::<[u8; 28]>().prop_map(Hash::from)
    }

    pub fn any_hash32() -> impl Strategy<Value = Hash<32>> {
        any::<[u8; 32]>().prop_map(Hash::from)
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use test_case::test_case;

        #[test_case(HashRole::PubKey, 28 => true)]
        #[test_case(HashRole::PubKey, 0 => false)]
        #[test_case(HashRole::MintingPolicy, 0 => true)]
        #[test_case(HashRole::MintingPolicy, 28 => true)]
        #[test_case(HashRole::Validator, 0 => false)]
        #[test_case(HashRole::Datum, 32 => true)]
        fn accepted_lengths(role: HashRole, len: usize) -> bool {
            role.accepts_length(len)
        }

        #[test]
        fn wrong_length_is_rejected() {
            assert_eq!(
                hash_from_slice::<28>(HashRole::Validator, &[0; 27]),
                Err(InvalidHash::InvalidLength {
                    role: HashRole::Validator,
                    expected: 28,
                    actual: 27
                })
            );
        }

        #[test]
        fn malformed_hex_is_rejected() {
            assert_eq!(
                HashRole::Datum.from_hex::<32>("abc"),
                Err(InvalidHash::MalformedHex(hex::FromHexError::OddLength))
            );
        }

        proptest! {
            #[test]
            fn bech32_roundtrip(hash in any_hash28()) {
                let s = HashRole::MintingPolicy.to_bech32(&hash).unwrap();
                prop_assert!(s.starts_with("policy1"));
                prop_assert_eq!(HashRole::MintingPolicy.from_bech32::<28>(&s), Ok(hash));
                prop_assert!(HashRole::PubKey.from_bech32::<28>(&s).is_err());
            }
        }
    }
}
