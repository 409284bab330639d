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

use crate::{ExUnits, PlutusData, cbor};
use std::{cmp::Ordering, fmt};

/// The kind of resource a redeemer unlocks.
///
/// Each kind has two distinct numberings: the one used in the transaction's wire format, and the
/// constructor index of the corresponding script purpose in on-chain data. They differ for
/// spending and rewarding, and must not be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedeemerTag {
    Spend,
    Mint,
    Cert,
    Reward,
}

impl RedeemerTag {
    pub fn wire_tag(&self) -> u8 {
        match self {
            Self::Spend => 0,
            Self::Mint => 1,
            Self::Cert => 2,
            Self::Reward => 3,
        }
    }

    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Spend),
            1 => Some(Self::Mint),
            2 => Some(Self::Cert),
            3 => Some(Self::Reward),
            _ => None,
        }
    }

    /// Constructor index of the matching `ScriptPurpose` in on-chain data.
    pub fn purpose_tag(&self) -> u64 {
        match self {
            Self::Mint => 0,
            Self::Spend => 1,
            Self::Reward => 2,
            Self::Cert => 3,
        }
    }
}

impl fmt::Display for RedeemerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spend => "Spend",
            Self::Mint => "Mint",
            Self::Cert => "Cert",
            Self::Reward => "Reward",
        })
    }
}

impl<C> cbor::Encode<C> for RedeemerTag {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.u8(self.wire_tag())?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for RedeemerTag {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let tag = d.u8()?;
        Self::from_wire_tag(tag).ok_or_else(|| {
            cbor::decode::Error::message(format!(
                "unsupported redeemer tag {tag}: expected one of 0..=3"
            ))
        })
    }
}

/// Data and budget supplied to the script guarding one resource of the transaction.
///
/// `index` points into the body's canonically ordered list of resources of the kind given by
/// `tag`: sorted inputs, sorted minted policies, withdrawals or certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

impl Redeemer {
    pub fn new(tag: RedeemerTag, index: u32, data: PlutusData, ex_units: ExUnits) -> Self {
        Self {
            tag,
            index,
            data,
            ex_units,
        }
    }

    /// Order in which the ledger sorts redeemers: by wire tag, then by index.
    pub fn pointer_cmp(&self, other: &Self) -> Ordering {
        (self.tag.wire_tag(), self.index).cmp(&(other.tag.wire_tag(), other.index))
    }
}

impl fmt::Display for Redeemer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tag, self.index)
    }
}

impl<C> cbor::Encode<C> for Redeemer {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(4)?;
        e.encode_with(self.tag, ctx)?;
        e.u32(self.index)?;
        e.encode_with(&self.data, ctx)?;
        e.encode_with(self.ex_units, ctx)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Redeemer {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(4)?;
            Ok(Self {
                tag: d.decode_with(ctx)?,
                index: d.u32()?,
                data: d.decode_with(ctx)?,
                ex_units: d.decode_with(ctx)?,
            })
        })
    }
}

/// The two serialisations of a collection of redeemers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RedeemersFormat {
    /// `[* [tag, index, data, ex_units]]`
    #[default]
    List,
    /// `{* [tag, index] => [data, ex_units]}`
    Map,
}

pub fn encode_redeemers<C, W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    redeemers: &[Redeemer],
    format: RedeemersFormat,
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    match format {
        RedeemersFormat::List => cbor::encode_list(e, redeemers, ctx),
        RedeemersFormat::Map => {
            e.map(redeemers.len() as u64)?;
            for redeemer in redeemers {
                e.array(2)?;
                e.encode_with(redeemer.tag, ctx)?;
                e.u32(redeemer.index)?;
                e.array(2)?;
                e.encode_with(&redeemer.data, ctx)?;
                e.encode_with(redeemer.ex_units, ctx)?;
            }
            Ok(())
        }
    }
}

pub fn decode_redeemers<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<(Vec<Redeemer>, RedeemersFormat), cbor::decode::Error> {
    use cbor::data::Type;

    if matches!(d.datatype()?, Type::Map | Type::MapIndef) {
        let redeemers = cbor::heterogeneous_map(
            d,
            Vec::new(),
            |d| {
                cbor::heterogeneous_array(d, |d, assert_len| {
                    assert_len(2)?;
                    Ok((d.decode::<RedeemerTag>()?, d.u32()?))
                })
            },
            |d, redeemers: &mut Vec<Redeemer>, (tag, index)| {
                let (data, ex_units) = cbor::heterogeneous_array(d, |d, assert_len| {
                    assert_len(2)?;
                    Ok((d.decode_with(ctx)?, d.decode_with(ctx)?))
                })?;
                redeemers.push(Redeemer {
                    tag,
                    index,
                    data,
                    ex_units,
                });
                Ok(())
            },
        )?;
        return Ok((redeemers, RedeemersFormat::Map));
    }

    Ok((
        cbor::decode_list(d, |d| d.decode_with(ctx))?,
        RedeemersFormat::List,
    ))
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_plutus_data;
    use proptest::prelude::*;

    pub fn any_redeemer_tag() -> impl Strategy<Value = RedeemerTag> {
        prop_oneof![
            Just(RedeemerTag::Spend),
            Just(RedeemerTag::Mint),
            Just(RedeemerTag::Cert),
            Just(RedeemerTag::Reward),
        ]
    }

    pub fn any_redeemer() -> impl Strategy<Value = Redeemer> {
        (
            any_redeemer_tag(),
            0_u32..8,
            any_plutus_data(),
            any::<u32>(),
            any::<u32>(),
        )
            .prop_map(|(tag, index, data, memory, steps)| {
                Redeemer::new(
                    tag,
                    index,
                    data,
                    ExUnits::new(u64::from(memory), u64::from(steps)),
                )
            })
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;
        use proptest::collection::vec;
        use test_case::test_case;

        prop_cbor_roundtrip!(Redeemer, any_redeemer());

        #[test_case(RedeemerTag::Spend => (0, 1))]
        #[test_case(RedeemerTag::Mint => (1, 0))]
        #[test_case(RedeemerTag::Cert => (2, 3))]
        #[test_case(RedeemerTag::Reward => (3, 2))]
        fn wire_and_purpose_tags(tag: RedeemerTag) -> (u8, u64) {
            (tag.wire_tag(), tag.purpose_tag())
        }

        struct Redeemers(Vec<Redeemer>, RedeemersFormat);

        impl<C> cbor::Encode<C> for Redeemers {
            fn encode<W: cbor::encode::Write>(
                &self,
                e: &mut cbor::Encoder<W>,
                ctx: &mut C,
            ) -> Result<(), cbor::encode::Error<W::Error>> {
                encode_redeemers(e, &self.0, self.1, ctx)
            }
        }

        impl<'d, C> cbor::Decode<'d, C> for Redeemers {
            fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
                let (redeemers, format) = decode_redeemers(d, ctx)?;
                Ok(Redeemers(redeemers, format))
            }
        }

        proptest! {
            #[test]
            fn both_formats_roundtrip(redeemers in vec(any_redeemer(), 0..4), as_map in any::<bool>()) {
                let format = if as_map { RedeemersFormat::Map } else { RedeemersFormat::List };
                let bytes = cbor::to_cbor(&Redeemers(redeemers.clone(), format));
                let decoded: Redeemers = cbor::from_cbor(&bytes).unwrap();
                prop_assert_eq!(decoded.0, redeemers);
                prop_assert_eq!(decoded.1, format);
            }
        }
    }
}
