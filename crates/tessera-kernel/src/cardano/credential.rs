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

use crate::{Hash, HashRole, PubKeyHash, ScriptHash, cbor, size};
use std::fmt;

/// A spending or staking authority: either a key or a script. Both roles share this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Credential {
    Key(PubKeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn hash(&self) -> &Hash<{ size::CREDENTIAL }> {
        match self {
            Self::Key(hash) | Self::Script(hash) => hash,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Self::Script(..))
    }

    pub fn as_key(&self) -> Option<&PubKeyHash> {
        match self {
            Self::Key(hash) => Some(hash),
            Self::Script(..) => None,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptHash> {
        match self {
            Self::Script(hash) => Some(hash),
            Self::Key(..) => None,
        }
    }

    /// The role this credential plays when used as a spending authority.
    pub fn spending_role(&self) -> HashRole {
        match self {
            Self::Key(..) => HashRole::PubKey,
            Self::Script(..) => HashRole::Validator,
        }
    }

    /// The role this credential plays when used as a staking authority.
    pub fn staking_role(&self) -> HashRole {
        match self {
            Self::Key(..) => HashRole::StakeKey,
            Self::Script(..) => HashRole::StakingValidator,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Key(..) => 0,
            Self::Script(..) => 1,
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(hash) => write!(f, "key:{hash}"),
            Self::Script(hash) => write!(f, "script:{hash}"),
        }
    }
}

impl<C> cbor::Encode<C> for Credential {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.u8(self.tag())?;
        e.encode_with(self.hash(), ctx)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Credential {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            match d.u8()? {
                0 => Ok(Self::Key(d.decode_with(ctx)?)),
                1 => Ok(Self::Script(d.decode_with(ctx)?)),
                t => Err(cbor::decode::Error::message(format!(
                    "unknown credential kind: expected 0 or 1, got {t}"
                ))),
            }
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_hash28;
    use proptest::prelude::*;

    pub fn any_credential() -> impl Strategy<Value = Credential> {
        prop_oneof![
            any_hash28().prop_map(Credential::Key),
            any_hash28().prop_map(Credential::Script),
        ]
    }

}
