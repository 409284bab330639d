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

use crate::{DatumHash, blake2b_256, cbor, decode_quantity};
use num::{BigInt, bigint::Sign};

/// The data tree exchanged with on-chain scripts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlutusData {
    Constr { alternative: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(BigInt),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(alternative: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr {
            alternative,
            fields,
        }
    }

    pub fn integer(i: impl Into<BigInt>) -> Self {
        Self::Integer(i.into())
    }

    pub fn bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self::Bytes(bytes.as_ref().to_vec())
    }

    pub fn bool(b: bool) -> Self {
        Self::constr(u64::from(b), vec![])
    }

    pub fn unit() -> Self {
        Self::constr(0, vec![])
    }

    /// Hash identifying the datum, over its canonical encoding.
    pub fn hash(&self) -> DatumHash {
        blake2b_256(&cbor::to_cbor(self))
    }
}

/// The CBOR tag under which a constructor alternative is serialised, or `None` when the
/// alternative only fits the general form (tag 102).
pub fn constr_tag(alternative: u64) -> Option<u64> {
    match alternative {
        0..=6 => Some(121 + alternative),
        7..=127 => Some(1280 - 7 + alternative),
        _ => None,
    }
}

const TAG_GENERAL_CONSTR: u64 = 102;

fn encode_fields<C, W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    fields: &[PlutusData],
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    if fields.is_empty() {
        e.array(0)?;
        return Ok(());
    }
    cbor::encode_indefinite_list(e, fields, ctx)
}

fn encode_integer<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    i: &BigInt,
) -> Result<(), cbor::encode::Error<W::Error>> {
    if let Some(int) = i128::try_from(i)
        .ok()
        .and_then(|i| cbor::data::Int::try_from(i).ok())
    {
        e.int(int)?;
        return Ok(());
    }

    let (tag, magnitude) = match i.sign() {
        Sign::Minus => (3, -i - BigInt::from(1)),
        Sign::NoSign | Sign::Plus => (2, i.clone()),
    };
    e.tag(cbor::data::Tag::new(tag))?;
    cbor::encode_chunked_bytes(e, &magnitude.to_bytes_be().1)
}

impl<C> cbor::Encode<C> for PlutusData {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        match self {
            Self::Constr {
                alternative,
                fields,
            } => match constr_tag(*alternative) {
                Some(tag) => {
                    e.tag(cbor::data::Tag::new(tag))?;
                    encode_fields(e, fields, ctx)
                }
                None => {
                    e.tag(cbor::data::Tag::new(TAG_GENERAL_CONSTR))?;
                    e.array(2)?;
                    e.u64(*alternative)?;
                    encode_fields(e, fields, ctx)
                }
            },
            Self::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (k, v) in entries {
                    e.encode_with(k, ctx)?;
                    e.encode_with(v, ctx)?;
                }
                Ok(())
            }
            Self::List(elems) => encode_fields(e, elems, ctx),
            Self::Integer(i) => encode_integer(e, i),
            Self::Bytes(bytes) => cbor::encode_chunked_bytes(e, bytes),
        }
    }
}

impl<'d, C> cbor::Decode<'d, C> for PlutusData {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        use cbor::data::Type;

        match d.datatype()? {
            Type::Tag => {
                let tag = d.probe().tag()?.as_u64();
                match tag {
                    121..=127 => {
                        d.tag()?;
                        Ok(Self::constr(tag - 121, decode_items(d, ctx)?))
                    }
                    1280..=1400 => {
                        d.tag()?;
                        Ok(Self::constr(tag - 1280 + 7, decode_items(d, ctx)?))
                    }
                    TAG_GENERAL_CONSTR => {
                        d.tag()?;
                        cbor::heterogeneous_array(d, |d, assert_len| {
                            assert_len(2)?;
                            let alternative = d.u64()?;
                            Ok(Self::constr(alternative, decode_items(d, ctx)?))
                        })
                    }
                    2 | 3 => Ok(Self::Integer(decode_quantity(d)?)),
                    _ => Err(cbor::decode::Error::message(format!(
                        "unexpected CBOR tag for on-chain data: {tag}"
                    ))),
                }
            }
            Type::Map | Type::MapIndef => {
                let entries = cbor::heterogeneous_map(
                    d,
                    Vec::new(),
                    |d| d.decode::<PlutusData>(),
                    |d, entries: &mut Vec<(PlutusData, PlutusData)>, k| {
                        entries.push((k, d.decode()?));
                        Ok(())
                    },
                )?;
                Ok(Self::Map(entries))
            }
            Type::Array | Type::ArrayIndef => Ok(Self::List(decode_items(d, ctx)?)),
            Type::Bytes | Type::BytesIndef => Ok(Self::Bytes(cbor::decode_chunked_bytes(d)?)),
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => Ok(Self::Integer(decode_quantity(d)?)),
            ty => Err(cbor::decode::Error::type_mismatch(ty)),
        }
    }
}

fn decode_items<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<Vec<PlutusData>, cbor::decode::Error> {
    cbor::decode_list(d, |d| d.decode_with(ctx))
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::{collection::vec, prelude::*};

    pub fn any_plutus_data() -> impl Strategy<Value = PlutusData> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(PlutusData::integer),
            vec(any::<u8>(), 0..80).prop_map(PlutusData::Bytes),
        ];

        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                (0_u64..200, vec(inner.clone(), 0..4))
                    .prop_map(|(alternative, fields)| PlutusData::constr(alternative, fields)),
                vec(inner.clone(), 0..4).prop_map(PlutusData::List),
                vec((inner.clone(), inner), 0..3).prop_map(PlutusData::Map),
            ]
        })
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::prop_cbor_roundtrip;
        use test_case::test_case;

        prop_cbor_roundtrip!(PlutusData, any_plutus_data());

        #[test_case(PlutusData::unit(), "d87980")]
        #[test_case(PlutusData::bool(true), "d87a80")]
        #[test_case(PlutusData::constr(0, vec![PlutusData::integer(1)]), "d8799f01ff")]
        #[test_case(PlutusData::constr(7, vec![]), "d9050080")]
        #[test_case(PlutusData::constr(128, vec![]), "d86682188080"; "general constructor")]
        #[test_case(PlutusData::List(vec![]), "80")]
        #[test_case(PlutusData::List(vec![PlutusData::integer(-1)]), "9f20ff")]
        #[test_case(PlutusData::Map(vec![(PlutusData::bytes([]), PlutusData::integer(0))]), "a14000")]
        fn canonical_encoding(data: PlutusData, expected: &str) {
            assert_eq!(hex::encode(cbor::to_cbor(&data)), expected);
        }

        #[test]
        fn long_bytes_are_chunked() {
            let bytes = cbor::to_cbor(&PlutusData::Bytes(vec![0; 100]));
            assert_eq!(bytes[0], 0x5f);
            assert_eq!(cbor::from_cbor(&bytes), Some(PlutusData::Bytes(vec![0; 100])));
        }

        #[test]
        fn unit_hash() {
            assert_eq!(
                PlutusData::unit().hash().to_string(),
                "923918e403bf43c34b4ef6b48eb2ee04babed17320d8d1b9ff9ad086e86f44ec"
            );
        }
    }
}
