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

use tessera_kernel::{StakeAddress, TxBody, TxInput, TxOutputId, UnsortedAssets};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOrdering {
    #[error("inputs not in canonical order: {previous} comes before {next}")]
    Inputs {
        previous: TxOutputId,
        next: TxOutputId,
    },
    #[error("reference inputs not in canonical order: {previous} comes before {next}")]
    ReferenceInputs {
        previous: TxOutputId,
        next: TxOutputId,
    },
    #[error("minted assets not in canonical order: {0}")]
    Mint(UnsortedAssets),
    #[error("withdrawals not in canonical order: {previous} comes before {next}")]
    Withdrawals {
        previous: StakeAddress,
        next: StakeAddress,
    },
}

/// Sets travel as lists on the wire; each must be strictly increasing, which also rules out
/// duplicates.
pub fn execute(body: &TxBody) -> Result<(), InvalidOrdering> {
    if let Some((previous, next)) = first_unordered(&body.inputs) {
        return Err(InvalidOrdering::Inputs { previous, next });
    }

    if let Some((previous, next)) = first_unordered(&body.reference_inputs) {
        return Err(InvalidOrdering::ReferenceInputs { previous, next });
    }

    body.minted.assert_sorted().map_err(InvalidOrdering::Mint)?;

    // Reward accounts compare by their serialised form: header byte first, then credential.
    for window in body.withdrawals.windows(2) {
        if let [(previous, _), (next, _)] = window
            && previous.to_bytes() >= next.to_bytes()
        {
            return Err(InvalidOrdering::Withdrawals {
                previous: *previous,
                next: *next,
            });
        }
    }

    Ok(())
}

fn first_unordered(inputs: &[TxInput]) -> Option<(TxOutputId, TxOutputId)> {
    inputs.windows(2).find_map(|window| match window {
        [previous, next] if previous.output_id >= next.output_id => {
            Some((previous.output_id, next.output_id))
        }
        _ => None,
    })
}
