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

use crate::tx::Tx;
use tessera_kernel::{NetworkParams, ScriptMachine, UnresolvedInput};
use thiserror::Error;
use tracing::{Level, debug, instrument};

pub mod collateral;
pub use collateral::InvalidCollateral;

pub mod conservation;
pub use conservation::InvalidConservation;

pub mod ex_units;
pub use ex_units::InvalidExUnits;

pub mod fees;
pub use fees::InvalidFees;

pub mod metadata;
pub use metadata::InvalidTransactionMetadata;

pub mod ordering;
pub use ordering::InvalidOrdering;

pub mod outputs;
pub use outputs::{InvalidOutputs, OutputPosition};

pub mod phase_two;
pub use phase_two::InvalidScriptExecution;

pub mod script_data;
pub use script_data::{InvalidScriptDataHash, script_data_hash};

pub mod scripts;
pub use scripts::InvalidScripts;

pub mod size;
pub use size::InvalidSize;

pub mod vkey_witness;
pub use vkey_witness::InvalidVKeyWitness;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransaction {
    #[error("invalid size: {0}")]
    Size(#[from] InvalidSize),

    #[error("invalid fees: {0}")]
    Fees(#[from] InvalidFees),

    #[error("invalid balance: {0}")]
    Conservation(#[from] InvalidConservation),

    #[error("invalid collateral: {0}")]
    Collateral(#[from] InvalidCollateral),

    #[error("invalid transaction scripts: {0}")]
    Scripts(#[from] InvalidScripts),

    #[error("invalid script execution: {0}")]
    ScriptExecution(#[from] InvalidScriptExecution),

    #[error("invalid execution units: {0}")]
    ExUnits(#[from] InvalidExUnits),

    #[error("invalid outputs: {0}")]
    Outputs(#[from] InvalidOutputs),

    #[error("invalid ordering: {0}")]
    Ordering(#[from] InvalidOrdering),

    #[error("invalid transaction metadata: {0}")]
    Metadata(#[from] InvalidTransactionMetadata),

    #[error("invalid script data hash: {0}")]
    ScriptDataHash(#[from] InvalidScriptDataHash),

    #[error("invalid transaction verification key witness: {0}")]
    VKeyWitness(#[from] InvalidVKeyWitness),

    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// Knobs of [`execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Also reject unused script witnesses and datums, and outputs whose assets aren't in
    /// canonical order.
    pub strict: bool,
    /// Emit a debug event after each rule that passes.
    pub verbose: bool,
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn verbose(self) -> Self {
        Self {
            verbose: true,
            ..self
        }
    }
}

/// Run the phase-one and phase-two rules over a fully resolved transaction, in a fixed order,
/// stopping at the first failure. Signatures are checked separately, see
/// [`Tx::validate_signatures`].
#[instrument(
    level = Level::TRACE,
    skip_all,
    fields(transaction.id = %tx.id(), strict = options.strict)
)]
pub fn execute<M: ScriptMachine + ?Sized>(
    tx: &Tx,
    params: &NetworkParams,
    vm: &M,
    options: ValidationOptions,
) -> Result<(), InvalidTransaction> {
    let body = &tx.body;
    let witnesses = &tx.witnesses;
    let passed = |rule: &'static str| {
        if options.verbose {
            debug!(rule, "passed");
        }
    };

    size::execute(tx.calc_size()?, params.max_tx_size)?;
    passed("size");

    fees::execute(&body.fee, &tx.calc_min_fee(params)?)?;
    passed("fees");

    conservation::execute(body, params.stake_address_deposit)?;
    passed("conservation");

    collateral::execute(
        body,
        !witnesses.redeemers.is_empty(),
        params.collateral_percentage,
        params.max_collateral_inputs,
    )?;
    passed("collateral");

    scripts::execute(body, witnesses, options.strict)?;
    passed("scripts");

    let languages = phase_two::execute(body, witnesses, &tx.id(), &params.slot_config, vm)?;
    passed("script execution");

    ex_units::execute(&witnesses.redeemers, &params.max_tx_execution_units)?;
    passed("execution units");

    outputs::execute(body, params.utxo_cost_per_byte, options.strict)?;
    passed("outputs");

    ordering::execute(body)?;
    passed("ordering");

    metadata::execute(body, tx.auxiliary_data.as_ref())?;
    passed("metadata");

    script_data::execute(body, witnesses, &languages, params)?;
    passed("script data hash");

    Ok(())
}

