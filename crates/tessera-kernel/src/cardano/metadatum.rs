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

use crate::cbor;

/// A piece of (structured) metadata found in transaction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Metadatum {
    // NOTE: CBOR (signed) integers range from -2^64 to 2^64 - 1, which neither i64 nor u64 cover.
    Int(cbor::data::Int),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Metadatum {
    pub fn int(i: i64) -> Self {
        Self::Int(cbor::data::Int::from(i))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Metadatum {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        use cbor::data::Type::*;

        #[allow(clippy::wildcard_enum_match_arm)]
        match d.datatype()? {
            U8 | U16 | U32 | U64 | I8 | I16 | I32 | I64 | Int => Ok(Metadatum::Int(d.int()?)),
            Bytes | BytesIndef => Ok(Metadatum::Bytes(cbor::decode_chunked_bytes(d)?)),
            String => Ok(Metadatum::Text(d.str()?.to_string())),
            StringIndef => {
                let mut text = std::string::String::new();
                for chunk in d.str_iter()? {
                    text.push_str(chunk?);
                }
                Ok(Metadatum::Text(text))
            }
            Array | ArrayIndef => Ok(Metadatum::List(cbor::decode_list(d, |d| {
                d.decode_with(ctx)
            })?)),
            Map | MapIndef => Ok(Metadatum::Map(decode_metadata_map(d, ctx)?)),
            any => Err(cbor::decode::Error::message(format!(
                "unexpected CBOR datatype {any:?} when decoding metadatum"
            ))),
        }
    }
}

fn decode_metadata_map<K, C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<Vec<(K, Metadatum)>, cbor::decode::Error>
where
    K: for<'d> cbor::Decode<'d, ()>,
{
    cbor::heterogeneous_map(
        d,
        Vec::new(),
        |d| d.decode::<K>(),
        |d, entries: &mut Vec<(K, Metadatum)>, k| {
            entries.push((k, d.decode_with(ctx)?));
            Ok(())
        },
    )
}

/// Decode the top-level metadata map, keyed by labels.
pub fn decode_metadata<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<Vec<(u64, Metadatum)>, cbor::decode::Error> {
    decode_metadata_map(d, ctx)
}

pub fn encode_metadata<C, W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    metadata: &[(u64, Metadatum)],
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    e.map(metadata.len() as u64)?;
    for (label, metadatum) in metadata {
        e.u64(*label)?;
        e.encode_with(metadatum, ctx)?;
    }
    Ok(())
}

impl<C> cbor::Encode<C> for Metadatum {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        match self {
            Metadatum::Int(i) => {
                e.int(*i)?;
            }
            Metadatum::Bytes(bytes) => cbor::encode_chunked_bytes(e, bytes)?,
            Metadatum::Text(text) => {
                e.str(text)?;
            }
            Metadatum::List(elems) => cbor::encode_list(e, elems, ctx)?,
            Metadatum::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (k, v) in entries {
                    e.encode_with(k, ctx)?;
                    e.encode_with(v, ctx)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::{collection::vec, prelude::*};

    pub fn any_metadatum() -> impl Strategy<Value = Metadatum> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Metadatum::int),
            vec(any::<u8>(), 0..64).prop_map(Metadatum::Bytes),
            "[a-zA-Z0-9 ]{0,32}".prop_map(Metadatum::Text),
        ];

        leaf.prop_recursive(2, 16, 4, |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Metadatum::List),
                vec((inner.clone(), inner), 0..3).prop_map(Metadatum::Map),
            ]
        })
    }

}
