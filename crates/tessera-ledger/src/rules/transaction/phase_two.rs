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
    DatumHash, EvalOutcome, ExUnits, Language, PlutusData, ScriptHash, ScriptMachine,
    SlotConfig, TransactionId, TxBody, TxOutputDatum, TxOutputId, TxWitnesses,
};
use tessera_plutus::{PlutusV1Error, ScriptPurpose, TxInfo, TxInfoTranslationError};
use thiserror::Error;
use tracing::{Level, instrument, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidScriptExecution {
    #[error("failed to translate transaction to TxInfo: {0}")]
    Translation(#[from] TxInfoTranslationError),
    #[error("redeemer for {0} points at a resource that isn't guarded by a script")]
    NotScriptLocked(ScriptPurpose),
    #[error("no script {hash} available for {purpose}")]
    MissingScript {
        purpose: ScriptPurpose,
        hash: ScriptHash,
    },
    #[error("redeemer for {purpose} points at native script {hash}")]
    NativeScript {
        purpose: ScriptPurpose,
        hash: ScriptHash,
    },
    #[error("spent output {0} carries no datum")]
    MissingDatum(TxOutputId),
    #[error("datum {hash} of spent output {input} is missing from the witnesses")]
    DatumNotFound {
        input: TxOutputId,
        hash: DatumHash,
    },
    #[error("illegal state in v1 script context: {0}")]
    PlutusV1(#[from] PlutusV1Error),
    #[error("script failure for {purpose}: {reason}")]
    ScriptFailure {
        purpose: ScriptPurpose,
        reason: String,
    },
    #[error("script for {purpose} exceeded its budget: declared {declared}, consumed {actual}")]
    BudgetExceeded {
        purpose: ScriptPurpose,
        declared: ExUnits,
        actual: ExUnits,
    },
}

/// Run every redeemed script through the virtual machine, against the arguments the script
/// would receive on-chain, and check that none consumes more than its redeemer declares.
///
/// Yields the Plutus languages involved, whose cost models the script data hash commits to.
#[instrument(level = Level::TRACE, skip_all, fields(redeemers = witnesses.redeemers.len()))]
pub fn execute<M: ScriptMachine + ?Sized>(
    body: &TxBody,
    witnesses: &TxWitnesses,
    id: &TransactionId,
    slot_config: &SlotConfig,
    vm: &M,
) -> Result<BTreeSet<Language>, InvalidScriptExecution> {
    let mut languages = BTreeSet::new();

    if witnesses.redeemers.is_empty() {
        return Ok(languages);
    }

    let tx_info = TxInfo::new(body, witnesses, id, slot_config)?;

    for (purpose, redeemer) in tx_info.redeemers() {
        let hash = purpose
            .script_hash(&tx_info)
            .ok_or_else(|| InvalidScriptExecution::NotScriptLocked(purpose.clone()))?;

        let script =
            witnesses
                .find_script(&hash)
                .ok_or_else(|| InvalidScriptExecution::MissingScript {
                    purpose: purpose.clone(),
                    hash,
                })?;

        let language = script
            .language()
            .ok_or_else(|| InvalidScriptExecution::NativeScript {
                purpose: purpose.clone(),
                hash,
            })?;

        let datum = match purpose {
            ScriptPurpose::Spending(input) => Some(spending_datum(&tx_info, input)?),
            ScriptPurpose::Minting(..)
            | ScriptPurpose::Rewarding(..)
            | ScriptPurpose::Certifying(..) => None,
        };

        let args = tx_info.script_arguments(language, purpose, datum, redeemer)?;

        let EvalOutcome { cost, result } = vm.eval(script, &args);

        if let Err(reason) = result {
            return Err(InvalidScriptExecution::ScriptFailure {
                purpose: purpose.clone(),
                reason,
            });
        }

        if !cost.fits_within(&redeemer.ex_units) {
            return Err(InvalidScriptExecution::BudgetExceeded {
                purpose: purpose.clone(),
                declared: redeemer.ex_units,
                actual: cost,
            });
        }

        trace!(%purpose, %language, %cost, "script succeeded");

        languages.insert(language);
    }

    Ok(languages)
}

/// The datum of a spent output: carried inline, or witnessed by the transaction.
fn spending_datum<'a>(
    tx_info: &'a TxInfo,
    input: &TxOutputId,
) -> Result<&'a PlutusData, InvalidScriptExecution> {
    let datum = tx_info
        .spent_output(input)
        .and_then(|output| output.datum.as_ref())
        .ok_or(InvalidScriptExecution::MissingDatum(*input))?;

    match datum {
        TxOutputDatum::Inline(data) => Ok(data),
        TxOutputDatum::Hash(hash) => {
            tx_info
                .datum(hash)
                .ok_or(InvalidScriptExecution::DatumNotFound {
                    input: *input,
                    hash: *hash,
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::{output_id, spending_budget, spending_fixture, validator};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use tessera_kernel::{
        Address, Assets, Credential, Hash, Redeemer, RedeemerTag, Script, TxInput, TxOutput,
    };

    fn succeed(cost: ExUnits) -> impl Fn(&Script, &[PlutusData]) -> EvalOutcome {
        move |_: &Script, _: &[PlutusData]| EvalOutcome::success(cost, PlutusData::unit())
    }

    fn run<M: ScriptMachine>(
        body: &TxBody,
        witnesses: &TxWitnesses,
        vm: &M,
    ) -> Result<BTreeSet<Language>, InvalidScriptExecution> {
        execute(body, witnesses, &body.id(), &SlotConfig::PREVIEW, vm)
    }

    #[test]
    fn spending_scripts_get_datum_redeemer_and_context() {
        let (body, witnesses) = spending_fixture();
        let calls = RefCell::new(Vec::new());
        let vm = |script: &Script, args: &[PlutusData]| {
            calls.borrow_mut().push((script.clone(), args.to_vec()));
            EvalOutcome::success(ExUnits::new(5_000, 500_000), PlutusData::unit())
        };

        assert_eq!(
            run(&body, &witnesses, &vm),
            Ok(BTreeSet::from([Language::PlutusV2]))
        );

        let calls = calls.into_inner();
        assert_eq!(calls.len(), 1);
        let (script, args) = &calls[0];
        assert_eq!(script, &validator());
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], PlutusData::integer(42));
        assert_eq!(args[1], PlutusData::unit());
    }

    #[test]
    fn no_redeemers_no_evaluation() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.redeemers.clear();
        let vm = |_: &Script, _: &[PlutusData]| -> EvalOutcome {
            panic!("nothing to evaluate")
        };
        assert_eq!(run(&body, &witnesses, &vm), Ok(BTreeSet::new()));
    }

    #[test]
    fn declared_budget_is_a_ceiling() {
        let (body, witnesses) = spending_fixture();
        assert!(run(&body, &witnesses, &succeed(spending_budget())).is_ok());

        let over = ExUnits::new(spending_budget().memory + 1, 0);
        assert_eq!(
            run(&body, &witnesses, &succeed(over)),
            Err(InvalidScriptExecution::BudgetExceeded {
                purpose: ScriptPurpose::Spending(output_id(1, 1)),
                declared: spending_budget(),
                actual: over,
            })
        );
    }

    #[test]
    fn script_failures_are_reported() {
        let (body, witnesses) = spending_fixture();
        let vm = |_: &Script, _: &[PlutusData]| EvalOutcome::failure(ExUnits::new(1, 1), "boom");
        assert_eq!(
            run(&body, &witnesses, &vm),
            Err(InvalidScriptExecution::ScriptFailure {
                purpose: ScriptPurpose::Spending(output_id(1, 1)),
                reason: "boom".to_string(),
            })
        );
    }

    #[test]
    fn datum_must_be_witnessed() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.datums.clear();
        assert!(matches!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::DatumNotFound { .. })
        ));
    }

    #[test]
    fn inline_datums_need_no_witness() {
        let (mut body, mut witnesses) = spending_fixture();
        witnesses.datums.clear();
        let locked = body.inputs[1].output().cloned().unwrap();
        body.inputs[1] = TxInput::resolved(
            output_id(1, 1),
            TxOutput::new(locked.address, locked.value)
                .with_datum(TxOutputDatum::Inline(PlutusData::integer(42))),
        );
        assert!(run(&body, &witnesses, &succeed(ExUnits::default())).is_ok());
    }

    #[test]
    fn redeemer_on_key_locked_input() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.redeemers[0].index = 0;
        assert_eq!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::NotScriptLocked(
                ScriptPurpose::Spending(output_id(1, 0))
            ))
        );
    }

    #[test]
    fn redeemer_past_the_end() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.redeemers[0].index = 2;
        assert!(matches!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::Translation(
                TxInfoTranslationError::InvalidRedeemer(..)
            ))
        ));
    }

    #[test]
    fn redeemer_on_native_script() {
        let (mut body, mut witnesses) = spending_fixture();
        let policy = Script::Native(vec![0x82, 0x04, 0x00]);
        body.minted = Assets::singleton(policy.hash(), "coin", 1);
        witnesses.native_scripts.push(policy.clone());
        witnesses.redeemers.push(Redeemer::new(
            RedeemerTag::Mint,
            0,
            PlutusData::unit(),
            ExUnits::default(),
        ));
        assert_eq!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::NativeScript {
                purpose: ScriptPurpose::Minting(policy.hash()),
                hash: policy.hash(),
            })
        );
    }

    #[test]
    fn missing_minting_policy() {
        let (mut body, mut witnesses) = spending_fixture();
        let policy = Hash::new([9; 28]);
        body.minted = Assets::singleton(policy, "coin", 1);
        witnesses.redeemers.insert(
            0,
            Redeemer::new(RedeemerTag::Mint, 0, PlutusData::unit(), ExUnits::default()),
        );
        assert_eq!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::MissingScript {
                purpose: ScriptPurpose::Minting(policy),
                hash: policy,
            })
        );
    }

    #[test]
    fn v1_scripts_cannot_see_inline_datums() {
        let (mut body, mut witnesses) = spending_fixture();
        let v1 = Script::PlutusV1(vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x49, 0x98]);
        let locked = body.inputs[1].output().cloned().unwrap();
        body.inputs[1] = TxInput::resolved(
            output_id(1, 1),
            TxOutput::new(
                Address::from_hashes(false, Credential::Script(v1.hash()), None),
                locked.value,
            )
            .with_datum(TxOutputDatum::Inline(PlutusData::integer(42))),
        );
        witnesses.v1_scripts.push(v1);
        assert_eq!(
            run(&body, &witnesses, &succeed(ExUnits::default())),
            Err(InvalidScriptExecution::PlutusV1(
                PlutusV1Error::InlineDatumProvided(output_id(1, 1))
            ))
        );
    }
}
