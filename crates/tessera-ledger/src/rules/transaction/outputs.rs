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

use std::fmt;
use tessera_kernel::{Quantity, TxBody, TxOutput, UnsortedAssets};
use thiserror::Error;

/// Where an output sits in the transaction body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPosition {
    Output(usize),
    CollateralReturn,
}

impl fmt::Display for OutputPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output(ix) => write!(f, "output #{ix}"),
            Self::CollateralReturn => f.write_str("collateral return"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOutputs {
    #[error("{position} doesn't contain enough Lovelace: minimum: {required}, given: {provided}")]
    BelowMinDeposit {
        position: OutputPosition,
        provided: Quantity,
        required: Quantity,
    },
    #[error("{position} holds duplicate or zero-quantity assets")]
    UnnormalizedAssets { position: OutputPosition },
    #[error("{position} holds assets out of canonical order: {source}")]
    UnsortedAssets {
        position: OutputPosition,
        source: UnsortedAssets,
    },
}

/// Every output, the collateral return included, must hold at least the deposit its size calls
/// for and carry a normalized asset bundle. In strict mode, its assets must also be in canonical
/// order.
pub fn execute(
    body: &TxBody,
    utxo_cost_per_byte: u64,
    strict: bool,
) -> Result<(), InvalidOutputs> {
    let outputs = body
        .outputs
        .iter()
        .enumerate()
        .map(|(ix, output)| (OutputPosition::Output(ix), output))
        .chain(
            body.collateral_return
                .iter()
                .map(|output| (OutputPosition::CollateralReturn, output)),
        );

    for (position, output) in outputs {
        validate_output(position, output, utxo_cost_per_byte, strict)?;
    }

    Ok(())
}

fn validate_output(
    position: OutputPosition,
    output: &TxOutput,
    utxo_cost_per_byte: u64,
    strict: bool,
) -> Result<(), InvalidOutputs> {
    let required = output.min_deposit(utxo_cost_per_byte);
    if output.lovelace() < &required {
        return Err(InvalidOutputs::BelowMinDeposit {
            position,
            provided: output.lovelace().clone(),
            required,
        });
    }

    if !output.value.assets().is_normalized() {
        return Err(InvalidOutputs::UnnormalizedAssets { position });
    }

    if strict {
        output
            .value
            .assets()
            .assert_sorted()
            .map_err(|source| InvalidOutputs::UnsortedAssets { position, source })?;
    }

    Ok(())
}
