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

use crate::rules::{
    InvalidTransaction, ValidationOptions,
    transaction::{self, InvalidVKeyWitness, vkey_witness},
};
use futures_util::future::try_join_all;
use std::collections::BTreeSet;
use tessera_kernel::{
    AuxiliaryData, ExUnits, InvalidSignature, NetworkParams, PubKeyHash, Quantity, ScriptMachine,
    Signature, TransactionId, TxBody, TxOutputId, TxWitnesses, UnresolvedInput, UtxoLookup, cbor,
};
use thiserror::Error;
use tracing::{Level, debug, instrument, trace};

#[derive(Debug, Error)]
pub enum RecoverError {
    #[error("unable to fetch the output behind {input}: {reason}")]
    Lookup {
        input: TxOutputId,
        reason: anyhow::Error,
    },
    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// A complete transaction: its body, the witnesses authorising it and, optionally, auxiliary
/// data.
///
/// The validity flag is only ever raised by [`Tx::validate_signatures`]; a decoded transaction
/// carries the flag it was serialised with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub body: TxBody,
    pub witnesses: TxWitnesses,
    valid: bool,
    pub auxiliary_data: Option<AuxiliaryData>,
    validation_error: Option<InvalidTransaction>,
}

impl Tx {
    pub fn new(body: TxBody, witnesses: TxWitnesses) -> Self {
        Self {
            body,
            witnesses,
            valid: false,
            auxiliary_data: None,
            validation_error: None,
        }
    }

    /// Attach auxiliary data, committing the body to its hash.
    pub fn with_auxiliary_data(mut self, auxiliary_data: AuxiliaryData) -> Self {
        self.body.auxiliary_data_hash = Some(auxiliary_data.hash());
        self.auxiliary_data = Some(auxiliary_data);
        self
    }

    pub fn id(&self) -> TransactionId {
        self.body.id()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The failure recorded by the last call to [`Tx::validate_unsafe`], if it failed.
    pub fn validation_error(&self) -> Option<&InvalidTransaction> {
        self.validation_error.as_ref()
    }

    /// Attach a signature, after checking it against the transaction id. A key that already
    /// signed isn't added twice.
    pub fn add_signature(&mut self, signature: Signature) -> Result<(), InvalidSignature> {
        signature.verify(&self.id())?;
        if !self.witnesses.has_signature_from(&signature.pub_key_hash()) {
            self.witnesses.signatures.push(signature);
        }
        Ok(())
    }

    pub fn add_signatures(
        &mut self,
        signatures: impl IntoIterator<Item = Signature>,
    ) -> Result<(), InvalidSignature> {
        signatures
            .into_iter()
            .try_for_each(|signature| self.add_signature(signature))
    }

    /// Keys whose signature the transaction needs: explicitly required signers, and owners of
    /// the key-locked inputs and collateral.
    pub fn required_signers(&self) -> Result<BTreeSet<PubKeyHash>, UnresolvedInput> {
        vkey_witness::required_signers(&self.body)
    }

    /// Serialised size once fully signed: the transaction is measured with a placeholder
    /// signature for every required signer who hasn't signed yet.
    pub fn calc_size(&self) -> Result<u64, UnresolvedInput> {
        let missing = self
            .required_signers()?
            .into_iter()
            .filter(|signer| !self.witnesses.has_signature_from(signer))
            .count();

        let mut signed = self.clone();
        signed
            .witnesses
            .signatures
            .extend(std::iter::repeat_n(Signature::dummy(), missing));

        Ok(cbor::to_cbor(&signed).len() as u64)
    }

    /// `tx_fee_fixed + tx_fee_per_byte * size + execution cost`, where the size accounts for
    /// signatures still missing and the execution cost is that of all declared budgets.
    #[instrument(level = Level::TRACE, skip_all, fields(transaction.id = %self.id()))]
    pub fn calc_min_fee(&self, params: &NetworkParams) -> Result<Quantity, UnresolvedInput> {
        let size = self.calc_size()?;
        let ex_units: ExUnits = self
            .witnesses
            .redeemers
            .iter()
            .map(|redeemer| redeemer.ex_units)
            .sum();

        let fee = Quantity::from(params.tx_fee_fixed)
            + Quantity::from(params.tx_fee_per_byte) * Quantity::from(size)
            + params.execution_unit_prices.cost(&ex_units);

        trace!(size, %ex_units, %fee, "computed minimum fee");

        Ok(fee)
    }

    /// Check the transaction against the ledger rules, returning the first failure. Every input,
    /// reference input and collateral input must have been [recovered](Tx::recover).
    pub fn validate<M: ScriptMachine + ?Sized>(
        &self,
        params: &NetworkParams,
        vm: &M,
        options: ValidationOptions,
    ) -> Result<(), InvalidTransaction> {
        transaction::execute(self, params, vm, options)
    }

    /// Like [`Tx::validate`], but record the failure in the transaction instead of returning it.
    pub fn validate_unsafe<M: ScriptMachine + ?Sized>(
        &mut self,
        params: &NetworkParams,
        vm: &M,
        options: ValidationOptions,
    ) -> bool {
        match self.validate(params, vm, options) {
            Ok(()) => {
                self.validation_error = None;
                true
            }
            Err(error) => {
                debug!(transaction.id = %self.id(), %error, "validation failed");
                self.validation_error = Some(error);
                false
            }
        }
    }

    /// Check that every signature is genuine and that every required signer signed. On success,
    /// the transaction is flagged valid.
    pub fn validate_signatures(&mut self) -> Result<(), InvalidVKeyWitness> {
        vkey_witness::execute(&self.body, &self.witnesses, &self.id())?;
        self.valid = true;
        Ok(())
    }

    /// Resolve every input, reference input and collateral input that isn't yet, fetching all of
    /// them concurrently. Scripts carried by the reference inputs then become available as
    /// witnesses.
    #[instrument(level = Level::TRACE, skip_all, fields(transaction.id = %self.id()))]
    pub async fn recover(&mut self, lookup: &impl UtxoLookup) -> Result<(), RecoverError> {
        let unresolved = self
            .body
            .all_inputs_mut()
            .filter(|input| !input.is_resolved())
            .collect::<Vec<_>>();

        trace!(count = unresolved.len(), "fetching unresolved inputs");

        let fetched = try_join_all(unresolved.iter().map(|input| {
            let output_id = input.output_id;
            async move {
                lookup
                    .get_utxo(&output_id)
                    .await
                    .map_err(|reason| RecoverError::Lookup {
                        input: output_id,
                        reason,
                    })
            }
        }))
        .await?;

        for (input, resolved) in unresolved.into_iter().zip(fetched) {
            input.resolve(resolved.output()?.clone());
        }

        self.witnesses.ref_scripts = self
            .body
            .reference_inputs
            .iter()
            .map(|input| Ok(input.output()?.script.clone()))
            .collect::<Result<Vec<_>, UnresolvedInput>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(())
    }
}

impl<C> cbor::Encode<C> for Tx {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(4)?;
        e.encode_with(&self.body, ctx)?;
        e.encode_with(&self.witnesses, ctx)?;
        e.bool(self.valid)?;
        match &self.auxiliary_data {
            Some(auxiliary_data) => e.encode_with(auxiliary_data, ctx)?,
            None => e.null()?,
        };
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Tx {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(4)?;
            let body = d.decode_with(ctx)?;
            let witnesses = d.decode_with(ctx)?;
            let valid = d.bool()?;
            let auxiliary_data = if d.datatype()? == cbor::data::Type::Null {
                d.null()?;
                None
            } else {
                Some(d.decode_with(ctx)?)
            };

            Ok(Self {
                body,
                witnesses,
                valid,
                auxiliary_data,
                validation_error: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::{key_address, output_id, spending_fixture, utxo, validator};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use tessera_kernel::{
        Address, Credential, Metadatum, TxInput, TxOutput, Value, any_tx_body, any_witnesses,
        from_cbor, to_cbor,
    };

    const ALICE: [u8; 32] = [1; 32];

    fn alice() -> PubKeyHash {
        Signature::sign(ALICE, &TransactionId::new([0; 32])).pub_key_hash()
    }

    fn simple_tx() -> Tx {
        Tx::new(
            TxBody {
                inputs: vec![utxo(
                    output_id(1, 0),
                    Address::from_hashes(false, Credential::Key(alice()), None),
                    10_000_000,
                )],
                outputs: vec![TxOutput::new(key_address(2), Value::from_lovelace(9_800_000))],
                fee: Quantity::from(200_000),
                ..TxBody::default()
            },
            TxWitnesses::default(),
        )
    }

    #[test]
    fn size_accounts_for_missing_signatures() {
        let mut tx = simple_tx();
        let unsigned = tx.calc_size().unwrap();

        tx.add_signature(Signature::sign(ALICE, &tx.id())).unwrap();
        let signed = tx.calc_size().unwrap();

        assert_eq!(unsigned, signed);
        assert_eq!(signed, to_cbor(&tx).len() as u64);
    }

    #[test]
    fn min_fee_is_linear_in_size() {
        let tx = simple_tx();
        let params = NetworkParams::default();
        let size = tx.calc_size().unwrap();
        assert_eq!(
            tx.calc_min_fee(&params),
            Ok(Quantity::from(155_381 + 44 * size))
        );
    }

    #[test]
    fn min_fee_includes_execution_cost() {
        let (body, witnesses) = spending_fixture();
        let tx = Tx::new(body, witnesses);
        let params = NetworkParams::default();
        let size = tx.calc_size().unwrap();
        // 10_000 * 0.0577 + 1_000_000 * 0.0000721 = 577 + 72.1
        assert_eq!(
            tx.calc_min_fee(&params),
            Ok(Quantity::from(155_381 + 44 * size + 650))
        );
    }

    #[test]
    fn signatures_are_verified_before_being_added() {
        let mut tx = simple_tx();
        let foreign = Signature::sign(ALICE, &TransactionId::new([9; 32]));
        assert!(tx.add_signature(foreign).is_err());
        assert!(tx.witnesses.signatures.is_empty());

        let genuine = Signature::sign(ALICE, &tx.id());
        tx.add_signatures([genuine, genuine]).unwrap();
        assert_eq!(tx.witnesses.signatures, vec![genuine]);
    }

    #[test]
    fn only_signature_validation_flags_a_transaction_valid() {
        let mut tx = simple_tx();
        assert!(!tx.is_valid());

        assert!(matches!(
            tx.validate_signatures(),
            Err(InvalidVKeyWitness::MissingRequiredVkeyWitnesses(..))
        ));
        assert!(!tx.is_valid());

        tx.add_signature(Signature::sign(ALICE, &tx.id())).unwrap();
        assert_eq!(tx.validate_signatures(), Ok(()));
        assert!(tx.is_valid());
    }

    #[test]
    fn auxiliary_data_commits_the_body() {
        let auxiliary_data = AuxiliaryData::new(vec![(674, Metadatum::text("hi"))]);
        let tx = simple_tx().with_auxiliary_data(auxiliary_data.clone());
        assert_eq!(tx.body.auxiliary_data_hash, Some(auxiliary_data.hash()));

        let decoded: Tx = from_cbor(&to_cbor(&tx)).unwrap();
        assert_eq!(decoded.auxiliary_data, Some(auxiliary_data));
    }

    #[tokio::test]
    async fn recover_resolves_everything() {
        let script = validator();
        let utxos = BTreeMap::from([
            (
                output_id(1, 0),
                TxOutput::new(key_address(1), Value::from_lovelace(10_000_000)),
            ),
            (
                output_id(3, 0),
                TxOutput::new(key_address(1), Value::from_lovelace(2_000_000))
                    .with_script(script.clone()),
            ),
            (
                output_id(5, 0),
                TxOutput::new(key_address(1), Value::from_lovelace(1_000_000)),
            ),
        ]);

        let mut tx = Tx::new(
            TxBody {
                inputs: vec![TxInput::new(output_id(1, 0))],
                reference_inputs: vec![TxInput::new(output_id(3, 0))],
                collateral: vec![TxInput::new(output_id(5, 0))],
                ..TxBody::default()
            },
            TxWitnesses::default(),
        );

        tx.recover(&utxos).await.unwrap();

        assert!(tx.body.all_inputs_mut().all(|input| input.is_resolved()));
        assert_eq!(
            tx.body.inputs[0].output().map(|output| output.lovelace().clone()),
            Ok(Quantity::from(10_000_000))
        );
        assert_eq!(tx.witnesses.ref_scripts, vec![script]);
    }

    #[tokio::test]
    async fn recover_reports_unknown_outputs() {
        let utxos: BTreeMap<TxOutputId, TxOutput> = BTreeMap::new();
        let mut tx = Tx::new(
            TxBody {
                inputs: vec![TxInput::new(output_id(1, 0))],
                ..TxBody::default()
            },
            TxWitnesses::default(),
        );

        match tx.recover(&utxos).await {
            Err(RecoverError::Lookup { input, .. }) => assert_eq!(input, output_id(1, 0)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn recover_keeps_resolved_inputs() {
        let mut tx = simple_tx();
        let before = tx.clone();
        tx.recover(&BTreeMap::<TxOutputId, TxOutput>::new())
            .await
            .unwrap();
        assert_eq!(tx, before);
    }

    proptest! {
        #[test]
        fn roundtrip(body in any_tx_body(), witnesses in any_witnesses(), valid in any::<bool>()) {
            let mut tx = Tx::new(body, witnesses);
            tx.valid = valid;
            let bytes = to_cbor(&tx);
            let decoded: Tx = from_cbor(&bytes).unwrap();
            prop_assert_eq!(to_cbor(&decoded), bytes);
        }
    }
}
