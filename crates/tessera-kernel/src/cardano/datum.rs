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

use crate::{DatumHash, PlutusData, cbor};

/// Data attached to an output, either referenced by its hash or carried inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutputDatum {
    Hash(DatumHash),
    Inline(PlutusData),
}

impl TxOutputDatum {
    pub fn hash(&self) -> DatumHash {
        match self {
            Self::Hash(hash) => *hash,
            Self::Inline(data) => data.hash(),
        }
    }

    pub fn as_inline(&self) -> Option<&PlutusData> {
        match self {
            Self::Hash(..) => None,
            Self::Inline(data) => Some(data),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(..))
    }
}

impl From<PlutusData> for TxOutputDatum {
    fn from(data: PlutusData) -> Self {
        Self::Inline(data)
    }
}

impl From<DatumHash> for TxOutputDatum {
    fn from(hash: DatumHash) -> Self {
        Self::Hash(hash)
    }
}

impl<C> cbor::Encode<C> for TxOutputDatum {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        match self {
            Self::Hash(hash) => {
                e.u8(0)?;
                e.bytes(hash.as_ref())?;
            }
            Self::Inline(data) => {
                e.u8(1)?;
                e.tag(cbor::data::Tag::new(cbor::TAG_EMBEDDED_CBOR_24))?;
                e.bytes(&cbor::to_cbor(data))?;
            }
        }
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for TxOutputDatum {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            match d.u8()? {
                0 => Ok(Self::Hash(d.decode_with(ctx)?)),
                1 => {
                    cbor::expect_tag(d, cbor::TAG_EMBEDDED_CBOR_24)?;
                    let data = cbor::from_cbor_no_leftovers(d.bytes()?)
                        .map_err(|e| cbor::decode::Error::message(format!("inline datum: {e}")))?;
                    Ok(Self::Inline(data))
                }
                option => Err(cbor::decode::Error::message(format!(
                    "unknown datum option: expected 0 or 1, got {option}"
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
    use crate::{any_hash32, any_plutus_data};
    use proptest::prelude::*;

    pub fn any_datum() -> impl Strategy<Value = TxOutputDatum> {
        prop_oneof![
            any_hash32().prop_map(TxOutputDatum::Hash),
            any_plutus_data().prop_map(TxOutputDatum::Inline),
        ]
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;

        prop_cbor_roundtrip!(TxOutputDatum, any_datum());

        #[test]
        fn inline_datum_hash_is_data_hash() {
            let datum = TxOutputDatum::from(PlutusData::unit());
            assert_eq!(datum.hash(), PlutusData::unit().hash());
            assert_eq!(
                hex::encode(cbor::to_cbor(&datum)),
                "8201d81843d87980",
            );
        }
    }
}
