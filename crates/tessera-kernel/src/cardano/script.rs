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

use crate::{ScriptHash, blake2b_224, cbor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Versions of the on-chain virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    PlutusV1,
    PlutusV2,
}

impl Language {
    pub fn version(&self) -> u8 {
        match self {
            Self::PlutusV1 => 1,
            Self::PlutusV2 => 2,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlutusV{}", self.version())
    }
}

/// A script, as attached to a transaction or carried by an output.
///
/// Native (multi-signature) scripts are kept as their raw CBOR: they hash and travel like any
/// other script, but are never evaluated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Script {
    Native(Vec<u8>),
    PlutusV1(Vec<u8>),
    PlutusV2(Vec<u8>),
}

impl Script {
    fn prefix(&self) -> u8 {
        match self {
            Self::Native(..) => 0,
            Self::PlutusV1(..) => 1,
            Self::PlutusV2(..) => 2,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Native(bytes) | Self::PlutusV1(bytes) | Self::PlutusV2(bytes) => bytes,
        }
    }

    pub fn language(&self) -> Option<Language> {
        match self {
            Self::Native(..) => None,
            Self::PlutusV1(..) => Some(Language::PlutusV1),
            Self::PlutusV2(..) => Some(Language::PlutusV2),
        }
    }

    /// `blake2b-224(language prefix ‖ script bytes)`.
    pub fn hash(&self) -> ScriptHash {
        let bytes = self.bytes();
        let mut preimage = Vec::with_capacity(bytes.len() + 1);
        preimage.push(self.prefix());
        preimage.extend_from_slice(bytes);
        blake2b_224(&preimage)
    }
}

/// Write pre-encoded CBOR verbatim.
pub fn encode_raw<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    raw: &[u8],
) -> Result<(), cbor::encode::Error<W::Error>> {
    e.writer_mut()
        .write_all(raw)
        .map_err(cbor::encode::Error::write)
}

/// Decode a native script, retaining its original bytes.
pub fn decode_native_script(d: &mut cbor::Decoder<'_>) -> Result<Script, cbor::decode::Error> {
    let ((), raw) = cbor::tee(d, |d| d.skip())?;
    Ok(Script::Native(raw.to_vec()))
}

/// Scripts embedded in outputs: `#6.24(bytes .cbor [language, script])`.
pub fn encode_reference_script<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    script: &Script,
) -> Result<(), cbor::encode::Error<W::Error>> {
    let mut inner = cbor::Encoder::new(Vec::new());
    inner
        .array(2)
        .and_then(|e| e.u8(script.prefix()))
        .map_err(|e| cbor::encode::Error::message(e.to_string()))?;
    match script {
        Script::Native(raw) => inner.writer_mut().extend_from_slice(raw),
        Script::PlutusV1(bytes) | Script::PlutusV2(bytes) => {
            inner
                .bytes(bytes)
                .map_err(|e| cbor::encode::Error::message(e.to_string()))?;
        }
    }

    e.tag(cbor::data::Tag::new(cbor::TAG_EMBEDDED_CBOR_24))?;
    e.bytes(&inner.into_writer())?;
    Ok(())
}

pub fn decode_reference_script(d: &mut cbor::Decoder<'_>) -> Result<Script, cbor::decode::Error> {
    cbor::expect_tag(d, cbor::TAG_EMBEDDED_CBOR_24)?;
    let bytes = d.bytes()?;
    let mut inner = cbor::Decoder::new(bytes);
    let script = cbor::heterogeneous_array(&mut inner, |d, assert_len| {
        assert_len(2)?;
        match d.u8()? {
            0 => decode_native_script(d),
            1 => Ok(Script::PlutusV1(d.bytes()?.to_vec())),
            2 => Ok(Script::PlutusV2(d.bytes()?.to_vec())),
            t => Err(cbor::decode::Error::message(format!(
                "unknown script language: expected 0, 1 or 2, got {t}"
            ))),
        }
    })?;
    Ok(script)
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::{collection::vec, prelude::*};

    /// Native scripts are opaque here; any well-formed CBOR item fits, such as a key-hash
    /// requirement `[0, h'..']`.
    pub fn any_native_script() -> impl Strategy<Value = Script> {
        any::<[u8; 28]>().prop_map(|hash| {
            let mut raw = vec![0x82, 0x00, 0x58, 0x1c];
            raw.extend_from_slice(&hash);
            Script::Native(raw)
        })
    }

    pub fn any_script() -> impl Strategy<Value = Script> {
        prop_oneof![
            any_native_script(),
            vec(any::<u8>(), 1..64).prop_map(Script::PlutusV1),
            vec(any::<u8>(), 1..64).prop_map(Script::PlutusV2),
        ]
    }

}
