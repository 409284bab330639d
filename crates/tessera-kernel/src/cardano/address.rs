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

use crate::{
    Credential, Hash, PubKeyHash, ScriptHash, cbor,
    utils::{InvalidBech32, decode_bech32, encode_bech32},
};
use std::{fmt, str::FromStr};

/// Length of an address without staking part: header + spending credential.
pub const ENTERPRISE_ADDRESS_LENGTH: usize = 29;

/// Length of an address with a staking part: header + spending + staking credentials.
pub const BASE_ADDRESS_LENGTH: usize = 57;

const MAINNET_PREFIX: &str = "addr";

const TESTNET_PREFIX: &str = "addr_test";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidAddress {
    #[error("invalid address length: expected 29 or 57 bytes, got {0}")]
    InvalidLength(usize),
    #[error("unsupported address header {header:#04x} for a {length}-byte address")]
    UnsupportedHeader { header: u8, length: usize },
    #[error("address prefix mismatch: decoded {actual} but the address is for {expected}")]
    PrefixMismatch {
        expected: &'static str,
        actual: String,
    },
    #[error("malformed hex string: {0}")]
    MalformedHex(#[from] hex::FromHexError),
    #[error("{0}")]
    MalformedBech32(#[from] InvalidBech32),
}

/// A Shelley-era address: a header byte, a spending credential and an optional staking
/// credential.
///
/// The header's high nibble describes the layout (bit 4: spending part is a script; bit 5:
/// staking part is a script; `0x6`/`0x7`: no staking part). Its low nibble carries the network.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<u8>);

impl Address {
    pub fn from_hashes(
        is_mainnet: bool,
        spending: Credential,
        staking: Option<Credential>,
    ) -> Self {
        let kind = match (spending, staking) {
            (Credential::Key(..), Some(Credential::Key(..))) => 0x00,
            (Credential::Script(..), Some(Credential::Key(..))) => 0x10,
            (Credential::Key(..), Some(Credential::Script(..))) => 0x20,
            (Credential::Script(..), Some(Credential::Script(..))) => 0x30,
            (Credential::Key(..), None) => 0x60,
            (Credential::Script(..), None) => 0x70,
        };

        let mut bytes = Vec::with_capacity(BASE_ADDRESS_LENGTH);
        bytes.push(kind | u8::from(is_mainnet));
        bytes.extend_from_slice(spending.hash().as_ref());
        if let Some(staking) = staking {
            bytes.extend_from_slice(staking.hash().as_ref());
        }

        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidAddress> {
        let header = *bytes.first().ok_or(InvalidAddress::InvalidLength(0))?;
        let valid = match bytes.len() {
            BASE_ADDRESS_LENGTH => header >> 4 <= 0x3,
            ENTERPRISE_ADDRESS_LENGTH => header >> 4 == 0x6 || header >> 4 == 0x7,
            length => return Err(InvalidAddress::InvalidLength(length)),
        };

        if !valid {
            return Err(InvalidAddress::UnsupportedHeader {
                header,
                length: bytes.len(),
            });
        }

        Ok(Self(bytes.to_vec()))
    }

    pub fn from_hex(s: &str) -> Result<Self, InvalidAddress> {
        Self::from_bytes(&hex::decode(s)?)
    }

    pub fn from_bech32(s: &str) -> Result<Self, InvalidAddress> {
        let (prefix, payload) = decode_bech32(s)?;
        let address = Self::from_bytes(&payload)?;
        if prefix != address.bech32_prefix() {
            return Err(InvalidAddress::PrefixMismatch {
                expected: address.bech32_prefix(),
                actual: prefix,
            });
        }
        Ok(address)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn to_bech32(&self) -> Result<String, InvalidAddress> {
        Ok(encode_bech32(self.bech32_prefix(), &self.0)?)
    }

    pub fn header(&self) -> u8 {
        self.0[0]
    }

    pub fn is_for_mainnet(&self) -> bool {
        self.header() & 0x0f != 0
    }

    pub fn bech32_prefix(&self) -> &'static str {
        if self.is_for_mainnet() {
            MAINNET_PREFIX
        } else {
            TESTNET_PREFIX
        }
    }

    pub fn spending_credential(&self) -> Credential {
        let hash = Self::hash_at(&self.0, 1);
        if (self.header() >> 4) % 2 == 0 {
            Credential::Key(hash)
        } else {
            Credential::Script(hash)
        }
    }

    pub fn staking_credential(&self) -> Option<Credential> {
        if self.0.len() != BASE_ADDRESS_LENGTH {
            return None;
        }

        let hash = Self::hash_at(&self.0, 29);
        Some(if (self.header() >> 5) % 2 == 0 {
            Credential::Key(hash)
        } else {
            Credential::Script(hash)
        })
    }

    pub fn pub_key_hash(&self) -> Option<PubKeyHash> {
        self.spending_credential().as_key().copied()
    }

    pub fn validator_hash(&self) -> Option<ScriptHash> {
        self.spending_credential().as_script().copied()
    }

    pub fn is_locked_by_script(&self) -> bool {
        self.spending_credential().is_script()
    }

    // The length is checked at construction, hence the range is always within bounds.
    fn hash_at(bytes: &[u8], offset: usize) -> Hash<28> {
        let mut hash = [0; 28];
        hash.copy_from_slice(&bytes[offset..offset + 28]);
        Hash::new(hash)
    }
}

impl FromStr for Address {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s).or_else(|bech32_error| Self::from_hex(s).map_err(|_| bech32_error))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(s) => f.write_str(&s),
            Err(..) => f.write_str(&self.to_hex()),
        }
    }
}

impl<C> cbor::Encode<C> for Address {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Address {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        Self::from_bytes(d.bytes()?).map_err(cbor::decode::Error::message)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_credential;
    use proptest::{option, prelude::*};

    pub fn any_address() -> impl Strategy<Value = Address> {
        (any::<bool>(), any_credential(), option::of(any_credential())).prop_map(
            |(is_mainnet, spending, staking)| Address::from_hashes(is_mainnet, spending, staking),
        )
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::{NULL_HASH28, prop_cbor_roundtrip};
        use test_case::test_case;

        prop_cbor_roundtrip!(Address, any_address());

        #[test]
        fn testnet_key_address_from_null_hash() {
            let address = Address::from_hashes(false, Credential::Key(NULL_HASH28), None);
            let decoded = Address::from_bytes(address.as_bytes()).unwrap();
            assert_eq!(decoded.pub_key_hash(), Some(NULL_HASH28));
            assert!(!decoded.is_for_mainnet());
            assert_eq!(decoded.as_bytes().len(), ENTERPRISE_ADDRESS_LENGTH);
            assert!(decoded.to_bech32().unwrap().starts_with("addr_test1"));
        }

        #[test]
        fn malformed_hex_is_rejected() {
            assert_eq!(
                Address::from_hex("60zz"),
                Err(InvalidAddress::MalformedHex(
                    hex::FromHexError::InvalidHexCharacter { c: 'z', index: 2 }
                ))
            );
        }

        #[test_case(true, false, None, 0x61)]
        #[test_case(false, true, None, 0x70)]
        #[test_case(true, false, Some(false), 0x01)]
        #[test_case(false, true, Some(false), 0x10)]
        #[test_case(false, false, Some(true), 0x20)]
        #[test_case(true, true, Some(true), 0x31)]
        fn header_layout(mainnet: bool, script: bool, staking_script: Option<bool>, header: u8) {
            let credential = |is_script: bool, byte: u8| {
                if is_script {
                    Credential::Script(Hash::new([byte; 28]))
                } else {
                    Credential::Key(Hash::new([byte; 28]))
                }
            };

            let spending = credential(script, 1);
            let staking = staking_script.map(|s| credential(s, 2));
            let address = Address::from_hashes(mainnet, spending, staking);

            assert_eq!(address.header(), header);
            assert_eq!(address.is_for_mainnet(), mainnet);
            assert_eq!(address.spending_credential(), spending);
            assert_eq!(address.staking_credential(), staking);
        }

        #[test_case(&[0x61; 28] => matches Err(InvalidAddress::InvalidLength(28)))]
        #[test_case(&[0x41; 29] => matches Err(InvalidAddress::UnsupportedHeader { header: 0x41, .. }))]
        #[test_case(&[0x61; 57] => matches Err(InvalidAddress::UnsupportedHeader { header: 0x61, .. }))]
        #[test_case(&[0x81; 29] => matches Err(InvalidAddress::UnsupportedHeader { .. }))]
        fn invalid_bytes(bytes: &[u8]) -> Result<Address, InvalidAddress> {
            Address::from_bytes(bytes)
        }

        #[test]
        fn bech32_prefix_must_match_network() {
            let address = Address::from_hashes(true, Credential::Key(NULL_HASH28), None);
            let forged = encode_bech32("addr_test", address.as_bytes()).unwrap();
            assert!(matches!(
                Address::from_bech32(&forged),
                Err(InvalidAddress::PrefixMismatch { expected: "addr", .. })
            ));
        }

        proptest! {
            #[test]
            fn bech32_roundtrip(address in any_address()) {
                let s = address.to_bech32().unwrap();
                prop_assert_eq!(Address::from_str(&s), Ok(address));
            }
        }
    }
}
