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
    Assets, AuxiliaryDataHash, Credential, DCert, PolicyId, PubKeyHash, Quantity, ScriptDataHash,
    ScriptHash, Slot, StakeAddress, TransactionId, TxInput, TxOutput, UnresolvedInput, Value,
    blake2b_256, cbor, decode_coin, encode_quantity,
};
use num::BigInt;
use std::collections::BTreeSet;

/// The part of a transaction that its id commits to.
///
// NOTE: Field 15 (network id) is never populated; fields 6, 10 and 12 don't exist in this era.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxBody {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: Quantity,
    pub last_valid_slot: Option<Slot>,
    pub certificates: Vec<DCert>,
    pub withdrawals: Vec<(StakeAddress, Quantity)>,
    pub auxiliary_data_hash: Option<AuxiliaryDataHash>,
    pub first_valid_slot: Option<Slot>,
    pub minted: Assets,
    pub script_data_hash: Option<ScriptDataHash>,
    pub collateral: Vec<TxInput>,
    pub required_signers: Vec<PubKeyHash>,
    pub collateral_return: Option<TxOutput>,
    pub total_collateral: Option<Quantity>,
    pub reference_inputs: Vec<TxInput>,
}

impl TxBody {
    /// The blake2b-256 hash digest of the serialised body.
    pub fn id(&self) -> TransactionId {
        blake2b_256(&cbor::to_cbor(self))
    }

    /// Inputs in the order redeemer indices refer to.
    pub fn sorted_inputs(&self) -> Vec<&TxInput> {
        let mut inputs = self.inputs.iter().collect::<Vec<_>>();
        inputs.sort();
        inputs
    }

    /// Minted policies in the order redeemer indices refer to.
    pub fn sorted_minted_policies(&self) -> Vec<PolicyId> {
        let mut policies = self.minted.policies().copied().collect::<Vec<_>>();
        policies.sort();
        policies.dedup();
        policies
    }

    pub fn total_withdrawals(&self) -> Quantity {
        self.withdrawals.iter().map(|(_, amount)| amount).sum()
    }

    /// Lovelace locked by the certificates registering staking credentials.
    pub fn deposits(&self, stake_address_deposit: u64) -> Quantity {
        let count = self.certificates.iter().filter(|c| c.is_registration()).count();
        BigInt::from(count) * BigInt::from(stake_address_deposit)
    }

    /// Lovelace released by the certificates deregistering staking credentials.
    pub fn refunds(&self, stake_address_deposit: u64) -> Quantity {
        let count = self
            .certificates
            .iter()
            .filter(|c| c.is_deregistration())
            .count();
        BigInt::from(count) * BigInt::from(stake_address_deposit)
    }

    pub fn sum_input_value(&self) -> Result<Value, UnresolvedInput> {
        sum_resolved(&self.inputs)
    }

    pub fn sum_collateral_value(&self) -> Result<Value, UnresolvedInput> {
        sum_resolved(&self.collateral)
    }

    pub fn sum_output_value(&self) -> Value {
        Value::sum(self.outputs.iter().map(|output| &output.value))
    }

    /// Every script hash that must be witnessed, without duplicates: spending scripts of the
    /// inputs, minting policies, and staking scripts of withdrawals and certificates.
    pub fn all_script_hashes(&self) -> Result<Vec<ScriptHash>, UnresolvedInput> {
        let mut hashes = BTreeSet::new();

        for input in &self.inputs {
            if let Some(hash) = input.output()?.address.validator_hash() {
                hashes.insert(hash);
            }
        }

        hashes.extend(self.minted.policies().copied());

        for (stake_address, _) in &self.withdrawals {
            if let Credential::Script(hash) = stake_address.credential() {
                hashes.insert(hash);
            }
        }

        for certificate in &self.certificates {
            if let Some(hash) = certificate.credential().and_then(|c| c.as_script()) {
                hashes.insert(*hash);
            }
        }

        Ok(hashes.into_iter().collect())
    }

    /// Key hashes owning the spent inputs and collateral inputs.
    pub fn input_owners(&self) -> Result<Vec<PubKeyHash>, UnresolvedInput> {
        let mut owners = BTreeSet::new();
        for input in self.inputs.iter().chain(self.collateral.iter()) {
            if let Some(owner) = input.output()?.address.pub_key_hash() {
                owners.insert(owner);
            }
        }
        Ok(owners.into_iter().collect())
    }

    /// Every input whose output must be known for the transaction to be validated.
    pub fn all_inputs_mut(&mut self) -> impl Iterator<Item = &mut TxInput> {
        self.inputs
            .iter_mut()
            .chain(self.reference_inputs.iter_mut())
            .chain(self.collateral.iter_mut())
    }
}

fn sum_resolved(inputs: &[TxInput]) -> Result<Value, UnresolvedInput> {
    let outputs = inputs
        .iter()
        .map(TxInput::output)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::sum(outputs.into_iter().map(|output| &output.value)))
}

impl<C> cbor::Encode<C> for TxBody {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        let optional_fields = [
            self.last_valid_slot.is_some(),
            !self.certificates.is_empty(),
            !self.withdrawals.is_empty(),
            self.auxiliary_data_hash.is_some(),
            self.first_valid_slot.is_some(),
            !self.minted.is_empty(),
            self.script_data_hash.is_some(),
            !self.collateral.is_empty(),
            !self.required_signers.is_empty(),
            self.collateral_return.is_some(),
            self.total_collateral.is_some(),
            !self.reference_inputs.is_empty(),
        ];
        e.map(3 + optional_fields.iter().filter(|present| **present).count() as u64)?;

        e.u8(0)?;
        cbor::encode_list(e, &self.inputs, ctx)?;

        e.u8(1)?;
        cbor::encode_list(e, &self.outputs, ctx)?;

        e.u8(2)?;
        encode_quantity(e, &self.fee)?;

        if let Some(slot) = self.last_valid_slot {
            e.u8(3)?;
            e.encode_with(slot, ctx)?;
        }

        if !self.certificates.is_empty() {
            e.u8(4)?;
            cbor::encode_list(e, &self.certificates, ctx)?;
        }

        if !self.withdrawals.is_empty() {
            e.u8(5)?;
            e.map(self.withdrawals.len() as u64)?;
            for (stake_address, amount) in &self.withdrawals {
                e.encode_with(stake_address, ctx)?;
                encode_quantity(e, amount)?;
            }
        }

        if let Some(hash) = self.auxiliary_data_hash {
            e.u8(7)?;
            e.encode_with(hash, ctx)?;
        }

        if let Some(slot) = self.first_valid_slot {
            e.u8(8)?;
            e.encode_with(slot, ctx)?;
        }

        if !self.minted.is_empty() {
            e.u8(9)?;
            e.encode_with(&self.minted, ctx)?;
        }

        if let Some(hash) = self.script_data_hash {
            e.u8(11)?;
            e.encode_with(hash, ctx)?;
        }

        if !self.collateral.is_empty() {
            e.u8(13)?;
            cbor::encode_list(e, &self.collateral, ctx)?;
        }

        if !self.required_signers.is_empty() {
            e.u8(14)?;
            cbor::encode_list(e, &self.required_signers, ctx)?;
        }

        if let Some(output) = &self.collateral_return {
            e.u8(16)?;
            e.encode_with(output, ctx)?;
        }

        if let Some(total) = &self.total_collateral {
            e.u8(17)?;
            encode_quantity(e, total)?;
        }

        if !self.reference_inputs.is_empty() {
            e.u8(18)?;
            cbor::encode_list(e, &self.reference_inputs, ctx)?;
        }

        Ok(())
    }
}

#[derive(Default)]
struct State {
    inputs: Option<Vec<TxInput>>,
    outputs: Option<Vec<TxOutput>>,
    fee: Option<Quantity>,
    last_valid_slot: Option<Slot>,
    certificates: Option<Vec<DCert>>,
    withdrawals: Option<Vec<(StakeAddress, Quantity)>>,
    auxiliary_data_hash: Option<AuxiliaryDataHash>,
    first_valid_slot: Option<Slot>,
    minted: Option<Assets>,
    script_data_hash: Option<ScriptDataHash>,
    collateral: Option<Vec<TxInput>>,
    required_signers: Option<Vec<PubKeyHash>>,
    collateral_return: Option<TxOutput>,
    total_collateral: Option<Quantity>,
    reference_inputs: Option<Vec<TxInput>>,
}

fn decode_withdrawals(
    d: &mut cbor::Decoder<'_>,
) -> Result<Vec<(StakeAddress, Quantity)>, cbor::decode::Error> {
    cbor::heterogeneous_map(
        d,
        Vec::new(),
        |d| d.decode::<StakeAddress>(),
        |d, withdrawals: &mut Vec<(StakeAddress, Quantity)>, stake_address| {
            withdrawals.push((stake_address, decode_coin(d)?));
            Ok(())
        },
    )
}

impl<'d, C> cbor::Decode<'d, C> for TxBody {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let state = cbor::heterogeneous_map(
            d,
            State::default(),
            |d| d.u64(),
            |d, st, k| {
                match k {
                    0 => cbor::unique_field::<TxBody, _>(
                        &mut st.inputs,
                        k,
                        cbor::decode_set(d, |d| d.decode_with(ctx))?,
                    )?,
                    1 => cbor::unique_field::<TxBody, _>(
                        &mut st.outputs,
                        k,
                        cbor::decode_list(d, |d| d.decode_with(ctx))?,
                    )?,
                    2 => cbor::unique_field::<TxBody, _>(&mut st.fee, k, decode_coin(d)?)?,
                    3 => cbor::unique_field::<TxBody, _>(
                        &mut st.last_valid_slot,
                        k,
                        d.decode_with(ctx)?,
                    )?,
                    4 => cbor::unique_field::<TxBody, _>(
                        &mut st.certificates,
                        k,
                        cbor::decode_set(d, |d| d.decode_with(ctx))?,
                    )?,
                    5 => cbor::unique_field::<TxBody, _>(
                        &mut st.withdrawals,
                        k,
                        decode_withdrawals(d)?,
                    )?,
                    7 => cbor::unique_field::<TxBody, _>(
                        &mut st.auxiliary_data_hash,
                        k,
                        d.decode_with(ctx)?,
                    )?,
                    8 => cbor::unique_field::<TxBody, _>(
                        &mut st.first_valid_slot,
                        k,
                        d.decode_with(ctx)?,
                    )?,
                    9 => cbor::unique_field::<TxBody, _>(&mut st.minted, k, d.decode_with(ctx)?)?,
                    11 => cbor::unique_field::<TxBody, _>(
                        &mut st.script_data_hash,
                        k,
                        d.decode_with(ctx)?,
                    )?,
                    13 => cbor::unique_field::<TxBody, _>(
                        &mut st.collateral,
                        k,
                        cbor::decode_set(d, |d| d.decode_with(ctx))?,
                    )?,
                    14 => cbor::unique_field::<TxBody, _>(
                        &mut st.required_signers,
                        k,
                        cbor::decode_set(d, |d| d.decode_with(ctx))?,
                    )?,
                    16 => cbor::unique_field::<TxBody, _>(
                        &mut st.collateral_return,
                        k,
                        d.decode_with(ctx)?,
                    )?,
                    17 => cbor::unique_field::<TxBody, _>(
                        &mut st.total_collateral,
                        k,
                        decode_coin(d)?,
                    )?,
                    18 => cbor::unique_field::<TxBody, _>(
                        &mut st.reference_inputs,
                        k,
                        cbor::decode_set(d, |d| d.decode_with(ctx))?,
                    )?,
                    _ => return cbor::unexpected_field::<TxBody, _>(k),
                };
                Ok(())
            },
        )?;

        Ok(TxBody {
            inputs: state
                .inputs
                .ok_or_else(|| cbor::missing_field::<TxBody, Vec<TxInput>>(0))?,
            outputs: state
                .outputs
                .ok_or_else(|| cbor::missing_field::<TxBody, Vec<TxOutput>>(1))?,
            fee: state
                .fee
                .ok_or_else(|| cbor::missing_field::<TxBody, Quantity>(2))?,
            last_valid_slot: state.last_valid_slot,
            certificates: state.certificates.unwrap_or_default(),
            withdrawals: state.withdrawals.unwrap_or_default(),
            auxiliary_data_hash: state.auxiliary_data_hash,
            first_valid_slot: state.first_valid_slot,
            minted: state.minted.unwrap_or_default(),
            script_data_hash: state.script_data_hash,
            collateral: state.collateral.unwrap_or_default(),
            required_signers: state.required_signers.unwrap_or_default(),
            collateral_return: state.collateral_return,
            total_collateral: state.total_collateral,
            reference_inputs: state.reference_inputs.unwrap_or_default(),
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::{
        any_assets, any_certificate, any_hash28, any_hash32, any_stake_address, any_tx_output,
        any_unresolved_input,
    };
    use proptest::{collection::vec, option, prelude::*, prop_compose};

    prop_compose! {
        pub fn any_tx_body()(
            inputs in vec(any_unresolved_input(), 1..4),
            outputs in vec(any_tx_output(), 1..3),
            fee in any::<u32>(),
            last_valid_slot in option::of(any::<u32>()),
            certificates in vec(any_certificate(), 0..2),
            withdrawals in vec((any_stake_address(), any::<u32>()), 0..2),
            auxiliary_data_hash in option::of(any_hash32()),
            first_valid_slot in option::of(any::<u32>()),
            minted in any_assets(),
            script_data_hash in option::of(any_hash32()),
            collateral in vec(any_unresolved_input(), 0..2),
            required_signers in vec(any_hash28(), 0..2),
            collateral_return in option::of(any_tx_output()),
            total_collateral in option::of(any::<u32>()),
            reference_inputs in vec(any_unresolved_input(), 0..2),
        ) -> TxBody {
            TxBody {
                inputs,
                outputs,
                fee: BigInt::from(fee),
                last_valid_slot: last_valid_slot.map(|s| Slot::new(u64::from(s))),
                certificates,
                withdrawals: withdrawals
                    .into_iter()
                    .map(|(address, amount)| (address, BigInt::from(amount)))
                    .collect(),
                auxiliary_data_hash,
                first_valid_slot: first_valid_slot.map(|s| Slot::new(u64::from(s))),
                minted,
                script_data_hash,
                collateral,
                required_signers,
                collateral_return,
                total_collateral: total_collateral.map(BigInt::from),
                reference_inputs,
            }
        }
    }

}
