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
    Credential, Hash, InvalidAddress, cbor,
    utils::{decode_bech32, encode_bech32},
};
use std::fmt;

pub const STAKE_ADDRESS_LENGTH: usize = 29;

const MAINNET_PREFIX: &str = "stake";

const TESTNET_PREFIX: &str = "stake_test";

/// A reward account: a header byte (`0xe0`/`0xf0` for key/script, or'd with the network) followed
/// by a staking credential. Withdrawals are keyed by it, and ordered by its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StakeAddress {
    header: u8,
    hash: Hash<28>,
}

impl StakeAddress {
    pub fn new(is_mainnet: bool, credential: Credential) -> Self {
        let kind = if credential.is_script() { 0xf0 } else { 0xe0 };
        Self {
            header: kind | u8::from(is_mainnet),
            hash: *credential.hash(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidAddress> {
        if bytes.len() != STAKE_ADDRESS_LENGTH {
            return Err(InvalidAddress::InvalidLength(bytes.len()));
        }

        let header = bytes[0];
        if header >> 4 != 0xe && header >> 4 != 0xf {
            return Err(InvalidAddress::UnsupportedHeader {
                header,
                length: bytes.len(),
            });
        }

        let mut hash = [0; 28];
        hash.copy_from_slice(&bytes[1..]);

        Ok(Self {
            header,
            hash: Hash::new(hash),
        })
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

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(STAKE_ADDRESS_LENGTH);
        bytes.push(self.header);
        bytes.extend_from_slice(self.hash.as_ref());
        bytes
    }

    pub fn to_bech32(&self) -> Result<String, InvalidAddress> {
        Ok(encode_bech32(self.bech32_prefix(), &self.to_bytes())?)
    }

    pub fn is_for_mainnet(&self) -> bool {
        self.header & 0x0f != 0
    }

    pub fn bech32_prefix(&self) -> &'static str {
        if self.is_for_mainnet() {
            MAINNET_PREFIX
        } else {
            TESTNET_PREFIX
        }
    }

    pub fn credential(&self) -> Credential {
        if (self.header >> 4) % 2 == 0 {
            Credential::Key(self.hash)
        } else {
            Credential::Script(self.hash)
        }
    }
}

impl fmt::Display for StakeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(s) => f.write_str(&s),
            Err(..) => f.write_str(&hex::encode(self.to_bytes())),
        }
    }
}

impl<C> cbor::Encode<C> for StakeAddress {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.bytes(&self.to_bytes())?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for StakeAddress {
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
    use proptest::prelude::*;

    pub fn any_stake_address() -> impl Strategy<Value = StakeAddress> {
        (any::<bool>(), any_credential())
            .prop_map(|(is_mainnet, credential)| StakeAddress::new(is_mainnet, credential))
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;

        prop_cbor_roundtrip!(StakeAddress, any_stake_address());

        #[test]
        fn script_stake_address_header() {
            let address = StakeAddress::new(false, Credential::Script(Hash::new([3; 28])));
            assert_eq!(address.to_bytes()[0], 0xf0);
            assert!(address.to_bech32().unwrap().starts_with("stake_test1"));
            assert!(address.credential().is_script());
        }

        proptest! {
            #[test]
            fn order_follows_bytes(a in any_stake_address(), b in any_stake_address()) {
                prop_assert_eq!(a.cmp(&b), a.to_bytes().cmp(&b.to_bytes()));
            }

            #[test]
            fn bech32_roundtrip(address in any_stake_address()) {
                let s = address.to_bech32().unwrap();
                prop_assert_eq!(StakeAddress::from_bech32(&s), Ok(address));
            }
        }
    }
}
