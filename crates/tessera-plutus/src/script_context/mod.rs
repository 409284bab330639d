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
    IsKnownPlutusVersion, PlutusVersion, ToPlutusData, constr, to_plutus_data::project_value,
};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use tessera_kernel::{
    Assets, Credential, DCert, DatumHash, Language, PlutusData, PolicyId, PubKeyHash, Quantity,
    Redeemer, RedeemerTag, ScriptHash, Slot, SlotConfig, StakeAddress, TimeMs, TransactionId,
    TxBody, TxOutput, TxOutputId, TxWitnesses, UnresolvedInput, Value,
};
use thiserror::Error;

pub mod v1;
pub mod v2;

pub use v1::{PlutusV1Error, ScriptContext as ScriptContextV1};
pub use v2::ScriptContext as ScriptContextV2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Represents possible errors that can occur during [`TxInfo` construction](TxInfo::new).
///
/// Both point at a transaction that should fail phase-one validation, or that hasn't been
/// recovered yet.
pub enum TxInfoTranslationError {
    #[error(transparent)]
    MissingInput(#[from] UnresolvedInput),
    #[error(transparent)]
    InvalidRedeemer(#[from] InvalidRedeemer),
}

/// A redeemer whose index falls outside of the list it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("redeemer {tag}#{index} points past the end of its resource list ({len} entries)")]
pub struct InvalidRedeemer {
    pub tag: RedeemerTag,
    pub index: u32,
    pub len: usize,
}

// OutputRef
// ----------------------------------------------------------------------------

/// An input as seen by scripts: the reference, and the output it spends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    pub input: TxOutputId,
    pub output: TxOutput,
}

// TxInfo
// ----------------------------------------------------------------------------

/// An in-memory representation of a transaction, as exposed to Plutus scripts.
///
/// It is version-agnostic; [`ScriptContextV1`] and [`ScriptContextV2`] decide how much of it
/// each language gets to see.
#[derive(Debug, Clone)]
pub struct TxInfo {
    pub(crate) inputs: Vec<OutputRef>,
    pub(crate) reference_inputs: Vec<OutputRef>,
    pub(crate) outputs: Vec<TxOutput>,
    pub(crate) fee: Quantity,
    pub(crate) mint: Assets,
    pub(crate) certificates: Vec<DCert>,
    pub(crate) withdrawals: Vec<(StakeAddress, Quantity)>,
    pub(crate) valid_range: TimeRange,
    pub(crate) signatories: BTreeSet<PubKeyHash>,
    pub(crate) redeemers: Vec<(ScriptPurpose, Redeemer)>,
    pub(crate) data: BTreeMap<DatumHash, PlutusData>,
    pub(crate) id: TransactionId,
}

impl TxInfo {
    /// Construct a new `TxInfo` from a transaction body and its witnesses.
    ///
    /// Every input and reference input must be resolved. A successful construction doesn't mean
    /// the result can be shown to every Plutus version: V1 restrictions are checked when building
    /// a [`ScriptContextV1`].
    pub fn new(
        body: &TxBody,
        witnesses: &TxWitnesses,
        id: &TransactionId,
        slot_config: &SlotConfig,
    ) -> Result<Self, TxInfoTranslationError> {
        let inputs = translate_inputs(body.sorted_inputs())?;

        let mut reference_inputs = body.reference_inputs.iter().collect::<Vec<_>>();
        reference_inputs.sort();
        let reference_inputs = translate_inputs(reference_inputs)?;

        let mut withdrawals = body.withdrawals.clone();
        withdrawals.sort_by(|(a, _), (b, _)| reward_account_cmp(a, b));

        let mut redeemers = witnesses
            .redeemers
            .iter()
            .map(|redeemer| {
                let purpose = ScriptPurpose::from_redeemer(redeemer, body)?;
                Ok((purpose, redeemer.clone()))
            })
            .collect::<Result<Vec<_>, InvalidRedeemer>>()?;
        redeemers.sort_by(|(_, a), (_, b)| a.pointer_cmp(b));

        Ok(Self {
            inputs,
            reference_inputs,
            outputs: body.outputs.clone(),
            fee: body.fee.clone(),
            mint: body.minted.clone(),
            certificates: body.certificates.clone(),
            withdrawals,
            valid_range: TimeRange::new(body.first_valid_slot, body.last_valid_slot, slot_config),
            signatories: body.required_signers.iter().copied().collect(),
            redeemers,
            data: witnesses
                .datums
                .iter()
                .map(|datum| (datum.hash(), datum.clone()))
                .collect(),
            id: *id,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn redeemers(&self) -> impl Iterator<Item = &(ScriptPurpose, Redeemer)> {
        self.redeemers.iter()
    }

    /// The output spent by one of the transaction's (non-reference) inputs.
    pub fn spent_output(&self, input: &TxOutputId) -> Option<&TxOutput> {
        self.inputs
            .iter()
            .find_map(|output_ref| (&output_ref.input == input).then_some(&output_ref.output))
    }

    /// A datum provided in the witness set.
    pub fn datum(&self, hash: &DatumHash) -> Option<&PlutusData> {
        self.data.get(hash)
    }

    /// The arguments of the script guarding `purpose`: the datum first when spending, then the
    /// redeemer and the script context of the given language.
    pub fn script_arguments(
        &self,
        language: Language,
        purpose: &ScriptPurpose,
        datum: Option<&PlutusData>,
        redeemer: &Redeemer,
    ) -> Result<Vec<PlutusData>, PlutusV1Error> {
        let context = match language {
            Language::PlutusV1 => {
                <_ as ToPlutusData<1>>::to_plutus_data(&ScriptContextV1::new(self, purpose)?)
            }
            Language::PlutusV2 => {
                <_ as ToPlutusData<2>>::to_plutus_data(&ScriptContextV2::new(self, purpose))
            }
        };

        Ok(datum
            .cloned()
            .into_iter()
            .chain([redeemer.data.clone(), context])
            .collect())
    }
}

fn translate_inputs(
    inputs: Vec<&tessera_kernel::TxInput>,
) -> Result<Vec<OutputRef>, UnresolvedInput> {
    inputs
        .into_iter()
        .map(|input| {
            Ok(OutputRef {
                input: input.output_id,
                output: input.output()?.clone(),
            })
        })
        .collect()
}

// Reference for this ordering is the ledger's own (and Aiken's) ordering of reward accounts:
// testnet first, script credentials before key credentials, then by hash.
pub(crate) fn reward_account_cmp(a: &StakeAddress, b: &StakeAddress) -> Ordering {
    a.is_for_mainnet()
        .cmp(&b.is_for_mainnet())
        .then_with(|| match (a.credential(), b.credential()) {
            (Credential::Script(..), Credential::Key(..)) => Ordering::Less,
            (Credential::Key(..), Credential::Script(..)) => Ordering::Greater,
            (Credential::Script(x), Credential::Script(y))
            | (Credential::Key(x), Credential::Key(y)) => x.cmp(&y),
        })
}

// ScriptPurpose
// ----------------------------------------------------------------------------

/// What a script is being run for. Redeemers only carry an index; the purpose is what that index
/// points at in the transaction body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptPurpose {
    Minting(PolicyId),
    Spending(TxOutputId),
    Rewarding(StakeAddress),
    Certifying(DCert),
}

impl ScriptPurpose {
    /// Resolve the referent of a redeemer: the sorted inputs for spending, the sorted minting
    /// policies for minting, withdrawals and certificates in body order.
    pub fn from_redeemer(redeemer: &Redeemer, body: &TxBody) -> Result<Self, InvalidRedeemer> {
        let index = redeemer.index as usize;
        let out_of_range = |len: usize| InvalidRedeemer {
            tag: redeemer.tag,
            index: redeemer.index,
            len,
        };

        match redeemer.tag {
            RedeemerTag::Spend => {
                let inputs = body.sorted_inputs();
                inputs
                    .get(index)
                    .map(|input| ScriptPurpose::Spending(input.output_id))
                    .ok_or_else(|| out_of_range(inputs.len()))
            }
            RedeemerTag::Mint => {
                let policies = body.sorted_minted_policies();
                policies
                    .get(index)
                    .map(|policy| ScriptPurpose::Minting(*policy))
                    .ok_or_else(|| out_of_range(policies.len()))
            }
            RedeemerTag::Reward => body
                .withdrawals
                .get(index)
                .map(|(stake_address, _)| ScriptPurpose::Rewarding(*stake_address))
                .ok_or_else(|| out_of_range(body.withdrawals.len())),
            RedeemerTag::Cert => body
                .certificates
                .get(index)
                .map(|certificate| ScriptPurpose::Certifying(certificate.clone()))
                .ok_or_else(|| out_of_range(body.certificates.len())),
        }
    }

    /// The hash of the script guarding this purpose, if any. A spending purpose is guarded by a
    /// script only when the spent output sits at a script address.
    pub fn script_hash(&self, tx_info: &TxInfo) -> Option<ScriptHash> {
        match self {
            ScriptPurpose::Minting(policy) => Some(*policy),
            ScriptPurpose::Spending(input) => tx_info
                .spent_output(input)
                .and_then(|output| output.address.validator_hash()),
            ScriptPurpose::Rewarding(stake_address) => {
                stake_address.credential().as_script().copied()
            }
            ScriptPurpose::Certifying(certificate) => certificate
                .credential()
                .and_then(Credential::as_script)
                .copied(),
        }
    }

    pub fn tag(&self) -> RedeemerTag {
        match self {
            ScriptPurpose::Minting(..) => RedeemerTag::Mint,
            ScriptPurpose::Spending(..) => RedeemerTag::Spend,
            ScriptPurpose::Rewarding(..) => RedeemerTag::Reward,
            ScriptPurpose::Certifying(..) => RedeemerTag::Cert,
        }
    }
}

impl fmt::Display for ScriptPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptPurpose::Minting(policy) => write!(f, "minting {policy}"),
            ScriptPurpose::Spending(input) => write!(f, "spending {input}"),
            ScriptPurpose::Rewarding(stake_address) => write!(f, "rewarding {stake_address}"),
            ScriptPurpose::Certifying(certificate) => write!(f, "certifying {certificate}"),
        }
    }
}

impl<const V: u8> ToPlutusData<V> for ScriptPurpose
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        let alternative = self.tag().purpose_tag();
        match self {
            ScriptPurpose::Minting(policy) => constr!(v: V, alternative, [policy]),
            ScriptPurpose::Spending(input) => constr!(v: V, alternative, [input]),
            ScriptPurpose::Rewarding(stake_address) => constr!(v: V, alternative, [stake_address]),
            ScriptPurpose::Certifying(certificate) => constr!(v: V, alternative, [certificate]),
        }
    }
}

// TimeRange
// ----------------------------------------------------------------------------

/// An interval of POSIX time (in milliseconds), derived from the validity interval of the
/// transaction. The lower bound is closed and the upper bound open; a missing bound is infinite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub lower_bound: Option<TimeMs>,
    pub upper_bound: Option<TimeMs>,
}

impl TimeRange {
    pub fn new(
        valid_from_slot: Option<Slot>,
        valid_to_slot: Option<Slot>,
        slot_config: &SlotConfig,
    ) -> Self {
        Self {
            lower_bound: valid_from_slot.map(|slot| slot_config.slot_to_time(slot)),
            upper_bound: valid_to_slot.map(|slot| slot_config.slot_to_time(slot)),
        }
    }
}

impl<const V: u8> ToPlutusData<V> for TimeRange
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        // Extended: NegInf = 0, Finite = 1, PosInf = 2.
        let lower = match self.lower_bound {
            None => constr!(v: V, 0, [constr!(0), true]),
            Some(time) => constr!(v: V, 0, [constr!(v: V, 1, [time]), true]),
        };
        let upper = match self.upper_bound {
            None => constr!(v: V, 0, [constr!(2), true]),
            Some(time) => constr!(v: V, 0, [constr!(v: V, 1, [time]), false]),
        };
        constr!(v: V, 0, [lower, upper])
    }
}

// Values
// ----------------------------------------------------------------------------

/// A value inside a script context always carries its base-currency entry, zero or not.
pub(crate) struct ContextValue<'a>(pub(crate) &'a Value);

impl<const V: u8> ToPlutusData<V> for ContextValue<'_>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        project_value::<V>(Some(self.0.lovelace()), self.0.assets())
    }
}

/// The fee, as a value made of base currency only.
pub(crate) struct Fee<'a>(pub(crate) &'a Quantity);

impl<const V: u8> ToPlutusData<V> for Fee<'_>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        project_value::<V>(Some(self.0), &Assets::default())
    }
}

/// Minted assets never hold base currency, yet the node projects them with a zero base-currency
/// entry in front. Scripts rely on it.
pub(crate) struct Mint<'a>(pub(crate) &'a Assets);

impl<const V: u8> ToPlutusData<V> for Mint<'_>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        project_value::<V>(Some(&Quantity::from(0)), self.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tessera_kernel::{
        Address, ExUnits, Hash, NULL_HASH28, TxInput, TxOutputDatum, from_cbor, to_cbor,
    };
    use test_case::test_case;

    pub(crate) fn script_address(hash: ScriptHash) -> Address {
        Address::from_hashes(false, Credential::Script(hash), None)
    }

    pub(crate) fn key_address(hash: PubKeyHash) -> Address {
        Address::from_hashes(false, Credential::Key(hash), None)
    }

    pub(crate) fn output_id(byte: u8, index: u64) -> TxOutputId {
        TxOutputId::new(Hash::new([byte; 32]), index)
    }

    /// A body spending one script-locked and one key-locked output, minting under one policy and
    /// withdrawing from a script-controlled reward account.
    pub(crate) fn fixture() -> (TxBody, TxWitnesses) {
        let validator = Hash::new([7; 28]);
        let datum = PlutusData::integer(42);

        let body = TxBody {
            inputs: vec![
                TxInput::resolved(
                    output_id(2, 0),
                    TxOutput::new(key_address(NULL_HASH28), Value::from_lovelace(5_000_000)),
                ),
                TxInput::resolved(
                    output_id(1, 1),
                    TxOutput::new(script_address(validator), Value::from_lovelace(2_000_000))
                        .with_datum(TxOutputDatum::Hash(datum.hash())),
                ),
            ],
            outputs: vec![TxOutput::new(
                key_address(NULL_HASH28),
                Value::from_lovelace(6_800_000),
            )],
            fee: Quantity::from(200_000),
            minted: Assets::singleton(Hash::new([9; 28]), "coin", 10),
            withdrawals: vec![(
                StakeAddress::new(false, Credential::Script(validator)),
                Quantity::from(0),
            )],
            first_valid_slot: Some(Slot::new(100)),
            required_signers: vec![Hash::new([3; 28]), Hash::new([3; 28])],
            ..TxBody::default()
        };

        let witnesses = TxWitnesses {
            datums: vec![datum],
            redeemers: vec![
                Redeemer::new(RedeemerTag::Reward, 0, PlutusData::unit(), ExUnits::new(1, 1)),
                Redeemer::new(RedeemerTag::Spend, 0, PlutusData::unit(), ExUnits::new(1, 1)),
                Redeemer::new(RedeemerTag::Mint, 0, PlutusData::unit(), ExUnits::new(1, 1)),
            ],
            ..TxWitnesses::default()
        };

        (body, witnesses)
    }

    #[test]
    fn redeemers_point_into_sorted_resources() {
        let (body, witnesses) = fixture();
        let purposes = witnesses
            .redeemers
            .iter()
            .map(|redeemer| ScriptPurpose::from_redeemer(redeemer, &body))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        pretty_assertions::assert_eq!(
            purposes,
            vec![
                ScriptPurpose::Rewarding(body.withdrawals[0].0),
                ScriptPurpose::Spending(output_id(1, 1)),
                ScriptPurpose::Minting(Hash::new([9; 28])),
            ]
        );
    }

    #[test_case(RedeemerTag::Spend, 2 => 2)]
    #[test_case(RedeemerTag::Mint, 1 => 1)]
    #[test_case(RedeemerTag::Cert, 0 => 0)]
    #[test_case(RedeemerTag::Reward, 5 => 1)]
    fn out_of_range_redeemer(tag: RedeemerTag, index: u32) -> usize {
        let (body, _) = fixture();
        let redeemer = Redeemer::new(tag, index, PlutusData::unit(), ExUnits::default());
        ScriptPurpose::from_redeemer(&redeemer, &body).unwrap_err().len
    }

    #[test]
    fn tx_info_is_canonical() {
        let (body, witnesses) = fixture();
        let tx_info = TxInfo::new(&body, &witnesses, &body.id(), &SlotConfig::PREVIEW).unwrap();

        pretty_assertions::assert_eq!(
            tx_info.inputs.iter().map(|i| i.input).collect::<Vec<_>>(),
            vec![output_id(1, 1), output_id(2, 0)]
        );
        pretty_assertions::assert_eq!(tx_info.signatories.len(), 1);
        pretty_assertions::assert_eq!(
            tx_info.redeemers.iter().map(|(_, r)| r.tag).collect::<Vec<_>>(),
            vec![RedeemerTag::Spend, RedeemerTag::Mint, RedeemerTag::Reward]
        );
        pretty_assertions::assert_eq!(
            tx_info.valid_range,
            TimeRange {
                lower_bound: Some(1_666_656_100_000),
                upper_bound: None
            }
        );
        pretty_assertions::assert_eq!(
            tx_info.datum(&PlutusData::integer(42).hash()),
            Some(&PlutusData::integer(42))
        );
    }

    #[test]
    fn unresolved_inputs_are_rejected() {
        let (mut body, witnesses) = fixture();
        body.inputs.push(TxInput::new(output_id(3, 0)));
        assert!(matches!(
            TxInfo::new(&body, &witnesses, &body.id(), &SlotConfig::default()),
            Err(TxInfoTranslationError::MissingInput(UnresolvedInput(id))) if id == output_id(3, 0)
        ));
    }

    #[test]
    fn script_hash_of_purposes() {
        let (body, witnesses) = fixture();
        let tx_info = TxInfo::new(&body, &witnesses, &body.id(), &SlotConfig::default()).unwrap();

        pretty_assertions::assert_eq!(
            ScriptPurpose::Spending(output_id(1, 1)).script_hash(&tx_info),
            Some(Hash::new([7; 28]))
        );
        pretty_assertions::assert_eq!(
            ScriptPurpose::Spending(output_id(2, 0)).script_hash(&tx_info),
            None
        );
        pretty_assertions::assert_eq!(
            ScriptPurpose::Certifying(DCert::Register(Credential::Key(NULL_HASH28)))
                .script_hash(&tx_info),
            None
        );
    }

    #[test]
    fn purpose_constructor_differs_from_wire_tag() {
        let purpose = ScriptPurpose::Spending(output_id(1, 1));
        match <_ as ToPlutusData<2>>::to_plutus_data(&purpose) {
            PlutusData::Constr { alternative, .. } => pretty_assertions::assert_eq!(alternative, 1),
            other => panic!("unexpected projection {other:?}"),
        }
        pretty_assertions::assert_eq!(RedeemerTag::Spend.wire_tag(), 0);
    }

    #[test]
    fn time_range_bounds() {
        let unbounded = <_ as ToPlutusData<2>>::to_plutus_data(&TimeRange::default());
        pretty_assertions::assert_eq!(
            hex::encode(to_cbor(&unbounded)),
            "d8799fd8799fd87980d87a80ffd8799fd87b80d87a80ffff"
        );

        let bounded = <_ as ToPlutusData<2>>::to_plutus_data(&TimeRange {
            lower_bound: Some(1),
            upper_bound: Some(2),
        });
        pretty_assertions::assert_eq!(
            hex::encode(to_cbor(&bounded)),
            "d8799fd8799fd87a9f01ffd87a80ffd8799fd87a9f02ffd87980ffff"
        );
        pretty_assertions::assert_eq!(from_cbor::<PlutusData>(&to_cbor(&bounded)), Some(bounded));
    }

    #[test]
    fn mint_always_carries_zero_base_currency() {
        let projected = <_ as ToPlutusData<2>>::to_plutus_data(&Mint(&Assets::default()));
        pretty_assertions::assert_eq!(
            projected,
            PlutusData::Map(vec![(
                PlutusData::bytes([]),
                PlutusData::Map(vec![(PlutusData::bytes([]), PlutusData::integer(0))])
            )])
        );
    }

    #[test]
    fn withdrawals_put_testnet_and_scripts_first() {
        let key = StakeAddress::new(false, Credential::Key(NULL_HASH28));
        let script = StakeAddress::new(false, Credential::Script(Hash::new([0xff; 28])));
        let mainnet = StakeAddress::new(true, Credential::Script(NULL_HASH28));

        let mut accounts = vec![mainnet, key, script];
        accounts.sort_by(reward_account_cmp);
        pretty_assertions::assert_eq!(accounts, vec![script, key, mainnet]);
    }
}
