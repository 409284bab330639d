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

use std::collections::{BTreeMap, BTreeSet};
use tessera_kernel::{
    DatumHash, ScriptHash, TxBody, TxOutputDatum, TxWitnesses, UnresolvedInput,
    utils::display_collection,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidScripts {
    #[error("missing required scripts: missing [{}]", display_collection(.0))]
    MissingRequiredScripts(Vec<ScriptHash>),
    #[error("script {0} is witnessed more than once")]
    DuplicateScriptWitness(ScriptHash),
    #[error("extraneous script witnesses: extra [{}]", display_collection(.0))]
    ExtraneousScriptWitnesses(Vec<ScriptHash>),
    #[error(
        "extraneous supplemental datums: allowed: [{}] provided [{}]",
        display_collection(allowed),
        display_collection(provided)
    )]
    ExtraneousDatums {
        allowed: BTreeSet<DatumHash>,
        provided: BTreeSet<DatumHash>,
    },
    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// Every script the body calls for must be available exactly once, either attached to the
/// transaction or carried by a reference input. In strict mode, nothing beyond what's needed
/// may be attached: neither scripts nor datums.
pub fn execute(
    body: &TxBody,
    witnesses: &TxWitnesses,
    strict: bool,
) -> Result<(), InvalidScripts> {
    let required = body.all_script_hashes()?;

    let mut provided: BTreeMap<ScriptHash, usize> = BTreeMap::new();
    for script in witnesses.attached_scripts() {
        *provided.entry(script.hash()).or_default() += 1;
    }
    // Several reference inputs may carry the same script; they count as one witness.
    let referenced = witnesses
        .ref_scripts
        .iter()
        .map(|script| script.hash())
        .collect::<BTreeSet<_>>();
    for hash in referenced {
        *provided.entry(hash).or_default() += 1;
    }

    let missing = required
        .iter()
        .filter(|hash| !provided.contains_key(*hash))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(InvalidScripts::MissingRequiredScripts(missing));
    }

    if let Some((hash, _)) = provided
        .iter()
        .find(|(hash, count)| **count > 1 && required.contains(hash))
    {
        return Err(InvalidScripts::DuplicateScriptWitness(*hash));
    }

    if strict {
        let extra = witnesses
            .attached_scripts()
            .map(|script| script.hash())
            .filter(|hash| !required.contains(hash))
            .collect::<BTreeSet<_>>();
        if !extra.is_empty() {
            return Err(InvalidScripts::ExtraneousScriptWitnesses(
                extra.into_iter().collect(),
            ));
        }

        let allowed = allowed_datums(body)?;
        let provided = witnesses
            .datums
            .iter()
            .map(|datum| datum.hash())
            .collect::<BTreeSet<_>>();
        if !provided.is_subset(&allowed) {
            return Err(InvalidScripts::ExtraneousDatums { allowed, provided });
        }
    }

    Ok(())
}

/// Datums a witness set may carry: those hashed by spent, referenced or produced outputs.
fn allowed_datums(body: &TxBody) -> Result<BTreeSet<DatumHash>, UnresolvedInput> {
    let mut allowed = BTreeSet::new();

    for input in body.inputs.iter().chain(body.reference_inputs.iter()) {
        if let Some(TxOutputDatum::Hash(hash)) = &input.output()?.datum {
            allowed.insert(*hash);
        }
    }

    for output in &body.outputs {
        if let Some(TxOutputDatum::Hash(hash)) = &output.datum {
            allowed.insert(*hash);
        }
    }

    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::{key_address, spending_fixture, validator};
    use tessera_kernel::{
        Assets, Credential, PlutusData, Quantity, Script, StakeAddress, TxOutput, Value,
    };

    fn other_script() -> Script {
        Script::PlutusV1(vec![0x46, 0x01, 0x00, 0x00, 0x22, 0x49, 0x98])
    }

    #[test]
    fn every_required_script_is_witnessed() {
        let (body, witnesses) = spending_fixture();
        assert_eq!(execute(&body, &witnesses, true), Ok(()));
    }

    #[test]
    fn missing_script() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.v2_scripts.clear();
        assert_eq!(
            execute(&body, &witnesses, false),
            Err(InvalidScripts::MissingRequiredScripts(vec![validator().hash()]))
        );
    }

    #[test]
    fn reference_scripts_count_as_witnesses() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.v2_scripts.clear();
        witnesses.ref_scripts = vec![validator(), validator()];
        assert_eq!(execute(&body, &witnesses, true), Ok(()));
    }

    #[test]
    fn duplicate_witness() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.ref_scripts = vec![validator()];
        assert_eq!(
            execute(&body, &witnesses, false),
            Err(InvalidScripts::DuplicateScriptWitness(validator().hash()))
        );
    }

    #[test]
    fn minting_policies_and_staking_scripts_are_required() {
        let (mut body, witnesses) = spending_fixture();
        body.minted = Assets::singleton(other_script().hash(), "coin", 1);
        assert_eq!(
            execute(&body, &witnesses, false),
            Err(InvalidScripts::MissingRequiredScripts(vec![other_script().hash()]))
        );

        body.minted = Assets::default();
        body.withdrawals = vec![(
            StakeAddress::new(false, Credential::Script(other_script().hash())),
            Quantity::from(0),
        )];
        assert_eq!(
            execute(&body, &witnesses, false),
            Err(InvalidScripts::MissingRequiredScripts(vec![other_script().hash()]))
        );
    }

    #[test]
    fn unused_scripts_only_fail_in_strict_mode() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.v1_scripts.push(other_script());
        assert_eq!(execute(&body, &witnesses, false), Ok(()));
        assert_eq!(
            execute(&body, &witnesses, true),
            Err(InvalidScripts::ExtraneousScriptWitnesses(vec![other_script().hash()]))
        );
    }

    #[test]
    fn unused_datums_only_fail_in_strict_mode() {
        let (body, mut witnesses) = spending_fixture();
        witnesses.datums.push(PlutusData::integer(43));
        assert_eq!(execute(&body, &witnesses, false), Ok(()));
        assert!(matches!(
            execute(&body, &witnesses, true),
            Err(InvalidScripts::ExtraneousDatums { .. })
        ));
    }

    #[test]
    fn datums_of_produced_outputs_are_allowed() {
        let (mut body, mut witnesses) = spending_fixture();
        let extra = PlutusData::integer(43);
        body.outputs.push(
            TxOutput::new(key_address(2), Value::from_lovelace(1_000_000))
                .with_datum(TxOutputDatum::Hash(extra.hash())),
        );
        witnesses.datums.push(extra);
        assert_eq!(execute(&body, &witnesses, true), Ok(()));
    }
}
