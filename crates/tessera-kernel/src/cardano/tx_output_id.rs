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

use crate::{TransactionId, cbor};
use std::{fmt, str::FromStr};

/// Reference to an output of a past transaction.
///
/// Ordered by transaction id bytes first, then by index; the field order matters for the derived
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxOutputId {
    pub transaction_id: TransactionId,
    pub index: u64,
}

impl TxOutputId {
    pub fn new(transaction_id: TransactionId, index: u64) -> Self {
        Self {
            transaction_id,
            index,
        }
    }
}

impl fmt::Display for TxOutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.transaction_id, self.index)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("malformed output reference {0:?}: expected <transaction id>#<index>")]
pub struct InvalidTxOutputId(String);

impl FromStr for TxOutputId {
    type Err = InvalidTxOutputId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InvalidTxOutputId(s.to_string());
        let (id, index) = s.split_once('#').ok_or_else(malformed)?;
        Ok(Self {
            transaction_id: id.parse().map_err(|_| malformed())?,
            index: index.parse().map_err(|_| malformed())?,
        })
    }
}

impl<C> cbor::Encode<C> for TxOutputId {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.bytes(self.transaction_id.as_ref())?;
        e.u64(self.index)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for TxOutputId {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            Ok(Self {
                transaction_id: d.decode_with(ctx)?,
                index: d.u64()?,
            })
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_hash32;
    use proptest::prelude::*;

    pub fn any_tx_output_id() -> impl Strategy<Value = TxOutputId> {
        (any_hash32(), 0_u64..16).prop_map(|(transaction_id, index)| TxOutputId {
            transaction_id,
            index,
        })
    }

}
