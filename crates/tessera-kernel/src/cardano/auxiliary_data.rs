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
    AuxiliaryDataHash, Metadatum, Script, blake2b_256, cbor, decode_metadata,
    decode_native_script, encode_metadata, encode_raw,
};

/// Data attached to a transaction, outside of its body: metadata and, occasionally, scripts.
///
/// The serialised form is kept alongside the decoded one: the body commits to the hash of the
/// bytes as they were received, and several encodings describe the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxiliaryData {
    metadata: Vec<(u64, Metadatum)>,
    scripts: Vec<Script>,
    original_bytes: Vec<u8>,
}

impl AuxiliaryData {
    /// Auxiliary data made of metadata only, in the tagged (`#6.259`) map form.
    pub fn new(metadata: Vec<(u64, Metadatum)>) -> Self {
        let mut buffer = cbor::Encoder::new(Vec::new());
        let encoded = buffer
            .tag(cbor::data::Tag::new(cbor::TAG_MAP_259))
            .and_then(|e| e.map(1))
            .and_then(|e| e.u8(0))
            .map_err(|e| e.to_string())
            .and_then(|e| encode_metadata(e, &metadata, &mut ()).map_err(|e| e.to_string()));

        Self {
            metadata,
            scripts: Vec::new(),
            original_bytes: match encoded {
                Ok(()) => buffer.into_writer(),
                // Writing to a vector can't fail.
                Err(..) => Vec::new(),
            },
        }
    }

    pub fn metadata(&self) -> &[(u64, Metadatum)] {
        &self.metadata
    }

    pub fn get(&self, label: u64) -> Option<&Metadatum> {
        self.metadata
            .iter()
            .find_map(|(k, v)| (*k == label).then_some(v))
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original_bytes
    }

    /// Obtain the blake2b-256 hash digest of the serialised auxiliary data.
    pub fn hash(&self) -> AuxiliaryDataHash {
        blake2b_256(&self.original_bytes)
    }
}

impl<C> cbor::Encode<C> for AuxiliaryData {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        encode_raw(e, &self.original_bytes)
    }
}

impl<'d, C> cbor::Decode<'d, C> for AuxiliaryData {
    // The format is chosen dynamically from what's received: a bare metadata map (Shelley), an
    // array of metadata and native scripts (Allegra), or a tagged map (Alonzo onwards).
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        use cbor::data::Type::*;

        let ((metadata, scripts), original_bytes) = cbor::tee(d, |d| {
            #[allow(clippy::wildcard_enum_match_arm)]
            match d.datatype()? {
                Map | MapIndef => Ok((decode_metadata(d, ctx)?, Vec::new())),
                Array | ArrayIndef => cbor::heterogeneous_array(d, |d, assert_len| {
                    assert_len(2)?;
                    let metadata = decode_metadata(d, ctx)?;
                    let scripts = cbor::decode_list(d, decode_native_script)?;
                    Ok((metadata, scripts))
                }),
                Tag => decode_alonzo(d, ctx),
                any => Err(cbor::decode::Error::message(format!(
                    "unexpected type {any} when decoding auxiliary data"
                ))),
            }
        })?;

        Ok(Self {
            metadata,
            scripts,
            original_bytes: original_bytes.to_vec(),
        })
    }
}

#[allow(clippy::type_complexity)]
fn decode_alonzo<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<(Vec<(u64, Metadatum)>, Vec<Script>), cbor::decode::Error> {
    cbor::expect_tag(d, cbor::TAG_MAP_259)?;

    cbor::heterogeneous_map(
        d,
        (Vec::new(), Vec::new()),
        |d| d.u64(),
        |d, (metadata, scripts), k| {
            match k {
                0 => *metadata = decode_metadata(d, ctx)?,
                1 => scripts.extend(cbor::decode_list(d, decode_native_script)?),
                2 => scripts.extend(cbor::decode_list(d, |d| {
                    Ok(Script::PlutusV1(d.bytes()?.to_vec()))
                })?),
                3 => scripts.extend(cbor::decode_list(d, |d| {
                    Ok(Script::PlutusV2(d.bytes()?.to_vec()))
                })?),
                _ => return cbor::unexpected_field::<AuxiliaryData, _>(k),
            };
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn fresh_auxiliary_data_is_tagged() {
        let data = AuxiliaryData::new(vec![(674, Metadatum::text("hi"))]);
        assert_eq!(
            hex::encode(cbor::to_cbor(&data)),
            "d90103a100a11902a2626869"
        );
        assert_eq!(data.get(674), Some(&Metadatum::text("hi")));
        assert_eq!(data.hash(), blake2b_256(data.original_bytes()));
    }

    #[test_case("a11902a2626869"; "shelley")]
    #[test_case("82a11902a262686980"; "allegra")]
    #[test_case("d90103a100a11902a2626869"; "alonzo")]
    fn every_format_roundtrips(hex_str: &str) {
        let bytes = hex::decode(hex_str).unwrap();
        let data: AuxiliaryData = cbor::from_cbor(&bytes).unwrap();
        assert_eq!(data.metadata(), &[(674, Metadatum::text("hi"))]);
        assert_eq!(cbor::to_cbor(&data), bytes);
        assert_eq!(data.hash(), blake2b_256(&bytes));
    }
}
