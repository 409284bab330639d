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

use std::collections::BTreeSet;
use tessera_kernel::{
    Language, NetworkParams, PlutusData, ScriptDataHash, TxBody, TxWitnesses, blake2b_256, cbor,
    encode_redeemers,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidScriptDataHash {
    #[error("missing required script integrity hash: expected {0}")]
    Missing(ScriptDataHash),
    #[error("unexpected script integrity hash {0}: the transaction has no redeemers")]
    Unexpected(ScriptDataHash),
    #[error("script integrity hash mismatch: supplied {supplied} expected {expected}")]
    Mismatch {
        supplied: ScriptDataHash,
        expected: ScriptDataHash,
    },
}

pub fn execute(
    body: &TxBody,
    witnesses: &TxWitnesses,
    languages: &BTreeSet<Language>,
    params: &NetworkParams,
) -> Result<(), InvalidScriptDataHash> {
    match (
        body.script_data_hash,
        script_data_hash(witnesses, languages, params),
    ) {
        (None, None) => Ok(()),
        (None, Some(expected)) => Err(InvalidScriptDataHash::Missing(expected)),
        (Some(supplied), None) => Err(InvalidScriptDataHash::Unexpected(supplied)),
        (Some(supplied), Some(expected)) if supplied != expected => {
            Err(InvalidScriptDataHash::Mismatch { supplied, expected })
        }
        (Some(..), Some(..)) => Ok(()),
    }
}

/// The hash committing a transaction body to the script-related parts of its witnesses:
/// redeemers, datums (when any), and the cost models of the given languages.
///
/// There's none for a transaction without redeemers.
pub fn script_data_hash(
    witnesses: &TxWitnesses,
    languages: &BTreeSet<Language>,
    params: &NetworkParams,
) -> Option<ScriptDataHash> {
    if witnesses.redeemers.is_empty() {
        return None;
    }

    let mut preimage = cbor::to_cbor(&Redeemers(witnesses));
    if !witnesses.datums.is_empty() {
        preimage.extend(cbor::to_cbor(&Datums(&witnesses.datums)));
    }
    preimage.extend(cbor::to_cbor(&LanguageViews { languages, params }));

    Some(blake2b_256(&preimage))
}

/// Redeemers, in the format they were received (or will be sent) in.
struct Redeemers<'a>(&'a TxWitnesses);

impl<C> cbor::Encode<C> for Redeemers<'_> {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        encode_redeemers(e, &self.0.redeemers, self.0.redeemers_format, ctx)
    }
}

struct Datums<'a>(&'a [PlutusData]);

impl<C> cbor::Encode<C> for Datums<'_> {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        cbor::encode_indefinite_list(e, self.0, ctx)
    }
}

/// Cost models as the ledger commits to them. Keys are sorted canonically (shortest first), so
/// Plutus V2 (`1`) precedes Plutus V1 (`h'00'`).
///
/// Plutus V1 carries two historical quirks: its key is the serialised language tag wrapped in a
/// byte string, and its value is an indefinite list, itself wrapped in a byte string.
struct LanguageViews<'a> {
    languages: &'a BTreeSet<Language>,
    params: &'a NetworkParams,
}

impl<C> cbor::Encode<C> for LanguageViews<'_> {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.map(self.languages.len() as u64)?;

        if self.languages.contains(&Language::PlutusV2) {
            e.u8(1)?;
            e.array(self.params.cost_model(Language::PlutusV2).len() as u64)?;
            for cost in self.params.cost_model(Language::PlutusV2) {
                e.i64(*cost)?;
            }
        }

        if self.languages.contains(&Language::PlutusV1) {
            e.bytes(&[0x00])?;
            e.bytes(&cbor::to_cbor(&IndefiniteCosts(
                self.params.cost_model(Language::PlutusV1),
            )))?;
        }

        Ok(())
    }
}

struct IndefiniteCosts<'a>(&'a [i64]);

impl<C> cbor::Encode<C> for IndefiniteCosts<'_> {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        cbor::encode_indefinite_list(e, self.0, ctx)
    }
}
