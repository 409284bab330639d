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
    ToPlutusData, constr_v1,
    script_context::{ContextValue, Fee, Mint, OutputRef, ScriptPurpose, TxInfo},
    to_plutus_data::staking_hash,
};
use tessera_kernel::{PlutusData, TxOutput, TxOutputDatum, TxOutputId};
use thiserror::Error;

/// Features of a transaction that didn't exist yet when Plutus V1 was introduced, and that a V1
/// script can't be shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlutusV1Error {
    #[error("reference inputs are not allowed in the v1 script context")]
    ReferenceInputsIncluded,
    #[error("inline datum included in v1 context: {0}")]
    InlineDatumProvided(TxOutputId),
    #[error("script ref included in v1 context: {0}")]
    ScriptRefProvided(TxOutputId),
    #[error("output #{0} carries an inline datum, which the v1 context can't represent")]
    InlineDatumInOutput(usize),
    #[error("output #{0} carries a reference script, which the v1 context can't represent")]
    ScriptRefInOutput(usize),
}

// Reference: https://github.com/IntersectMBO/plutus/blob/master/plutus-ledger-api/src/PlutusLedgerApi/V1/Data/Contexts.hs
pub struct ScriptContext<'a> {
    tx_info: &'a TxInfo,
    purpose: &'a ScriptPurpose,
}

impl<'a> ScriptContext<'a> {
    pub fn new(tx_info: &'a TxInfo, purpose: &'a ScriptPurpose) -> Result<Self, PlutusV1Error> {
        check(tx_info)?;
        Ok(Self { tx_info, purpose })
    }
}

fn check(tx_info: &TxInfo) -> Result<(), PlutusV1Error> {
    if !tx_info.reference_inputs.is_empty() {
        return Err(PlutusV1Error::ReferenceInputsIncluded);
    }

    for OutputRef { input, output } in &tx_info.inputs {
        if output.datum.as_ref().is_some_and(TxOutputDatum::is_inline) {
            return Err(PlutusV1Error::InlineDatumProvided(*input));
        }
        if output.script.is_some() {
            return Err(PlutusV1Error::ScriptRefProvided(*input));
        }
    }

    for (ix, output) in tx_info.outputs.iter().enumerate() {
        if output.datum.as_ref().is_some_and(TxOutputDatum::is_inline) {
            return Err(PlutusV1Error::InlineDatumInOutput(ix));
        }
        if output.script.is_some() {
            return Err(PlutusV1Error::ScriptRefInOutput(ix));
        }
    }

    Ok(())
}

impl ToPlutusData<1> for ScriptContext<'_> {
    fn to_plutus_data(&self) -> PlutusData {
        constr_v1!(0, [self.tx_info, self.purpose])
    }
}

impl ToPlutusData<1> for TxInfo {
    fn to_plutus_data(&self) -> PlutusData {
        let withdrawals = self
            .withdrawals
            .iter()
            .map(|(stake_address, amount)| {
                constr_v1!(0, [staking_hash::<1>(&stake_address.credential()), amount])
            })
            .collect::<Vec<_>>();

        let signatories = self.signatories.iter().collect::<Vec<_>>();

        let data = self
            .data
            .iter()
            .map(|(hash, datum)| constr_v1!(0, [hash, datum]))
            .collect::<Vec<_>>();

        constr_v1!(
            0,
            [
                self.inputs,
                self.outputs,
                Fee(&self.fee),
                Mint(&self.mint),
                self.certificates,
                withdrawals,
                self.valid_range,
                signatories,
                data,
                constr_v1!(0, [self.id])
            ]
        )
    }
}

impl ToPlutusData<1> for OutputRef {
    fn to_plutus_data(&self) -> PlutusData {
        constr_v1!(0, [self.input, self.output])
    }
}

impl ToPlutusData<1> for TxOutput {
    fn to_plutus_data(&self) -> PlutusData {
        let datum_hash = match &self.datum {
            Some(TxOutputDatum::Hash(hash)) => Some(*hash),
            Some(TxOutputDatum::Inline(..)) | None => None,
        };
        constr_v1!(0, [self.address, ContextValue(&self.value), datum_hash])
    }
}
