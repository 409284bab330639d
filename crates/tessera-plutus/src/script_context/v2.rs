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
    ToPlutusData, constr, constr_v2,
    script_context::{ContextValue, Fee, Mint, OutputRef, ScriptPurpose, TxInfo},
};
use tessera_kernel::{PlutusData, TxOutput, TxOutputDatum};

// Reference: https://github.com/IntersectMBO/plutus/blob/master/plutus-ledger-api/src/PlutusLedgerApi/V2/Contexts.hs
pub struct ScriptContext<'a> {
    tx_info: &'a TxInfo,
    purpose: &'a ScriptPurpose,
}

impl<'a> ScriptContext<'a> {
    /// Every transaction can be shown to a V2 script.
    pub fn new(tx_info: &'a TxInfo, purpose: &'a ScriptPurpose) -> Self {
        Self { tx_info, purpose }
    }
}

impl ToPlutusData<2> for ScriptContext<'_> {
    fn to_plutus_data(&self) -> PlutusData {
        constr_v2!(0, [self.tx_info, self.purpose])
    }
}

impl ToPlutusData<2> for TxInfo {
    fn to_plutus_data(&self) -> PlutusData {
        let withdrawals = PlutusData::Map(
            self.withdrawals
                .iter()
                .map(|(stake_address, amount)| {
                    (
                        <_ as ToPlutusData<2>>::to_plutus_data(stake_address),
                        <_ as ToPlutusData<2>>::to_plutus_data(amount),
                    )
                })
                .collect(),
        );

        let signatories = self.signatories.iter().collect::<Vec<_>>();

        let redeemers = PlutusData::Map(
            self.redeemers
                .iter()
                .map(|(purpose, redeemer)| {
                    (
                        <_ as ToPlutusData<2>>::to_plutus_data(purpose),
                        redeemer.data.clone(),
                    )
                })
                .collect(),
        );

        constr_v2!(
            0,
            [
                self.inputs,
                self.reference_inputs,
                self.outputs,
                Fee(&self.fee),
                Mint(&self.mint),
                self.certificates,
                withdrawals,
                self.valid_range,
                signatories,
                redeemers,
                self.data,
                constr_v2!(0, [self.id])
            ]
        )
    }
}

impl ToPlutusData<2> for OutputRef {
    fn to_plutus_data(&self) -> PlutusData {
        constr_v2!(0, [self.input, self.output])
    }
}

impl ToPlutusData<2> for TxOutput {
    fn to_plutus_data(&self) -> PlutusData {
        let datum = match &self.datum {
            None => constr!(0),
            Some(TxOutputDatum::Hash(hash)) => constr_v2!(1, [hash]),
            Some(TxOutputDatum::Inline(data)) => constr_v2!(2, [data]),
        };
        let script_hash = self.script.as_ref().map(|script| script.hash());

        constr_v2!(
            0,
            [self.address, ContextValue(&self.value), datum, script_hash]
        )
    }
}
