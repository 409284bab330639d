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

use tessera_kernel::{Quantity, TxBody, TxOutputId, UnresolvedInput};
use thiserror::Error;
use tracing::warn;

/// Above this multiple of the required amount, collateral is accepted but reported.
const EXCESSIVE_COLLATERAL_FACTOR: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCollateral {
    #[error("no collateral was provided, but collateral is required")]
    NoCollateral,
    #[error("collateral provided ({provided} inputs) but no script is involved")]
    UnexpectedCollateral { provided: usize },
    #[error("too many collateral inputs: provided: {provided} allowed: {allowed}")]
    TooManyInputs { provided: usize, allowed: usize },
    #[error("a collateral input is locked at a script address: {0}")]
    LockedAtScriptAddress(TxOutputId),
    #[error("a collateral input holds native assets: {0}")]
    NotPureLovelace(TxOutputId),
    #[error("the collateral return output holds native assets")]
    ReturnCarriesAssets,
    #[error("total collateral value is insufficient: provided: {provided} required: {required}")]
    InsufficientBalance {
        provided: Quantity,
        required: Quantity,
    },
    #[error(
        "total collateral field (expected) does not equal actual collateral (provided): provided: {provided} expected: {expected}"
    )]
    IncorrectTotalCollateral {
        provided: Quantity,
        expected: Quantity,
    },
    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// Collateral is only ever required, and only ever allowed, when a script runs.
pub fn execute(
    body: &TxBody,
    script_involved: bool,
    collateral_percentage: u64,
    max_collateral_inputs: u64,
) -> Result<(), InvalidCollateral> {
    if !script_involved {
        if !body.collateral.is_empty() {
            return Err(InvalidCollateral::UnexpectedCollateral {
                provided: body.collateral.len(),
            });
        }
        return Ok(());
    }

    if body.collateral.is_empty() {
        return Err(InvalidCollateral::NoCollateral);
    }

    let allowed = usize::try_from(max_collateral_inputs).unwrap_or(usize::MAX);
    let provided = body.collateral.len();
    if provided > allowed {
        return Err(InvalidCollateral::TooManyInputs { provided, allowed });
    }

    for collateral in &body.collateral {
        let output = collateral.output()?;
        if output.address.is_locked_by_script() {
            return Err(InvalidCollateral::LockedAtScriptAddress(collateral.output_id));
        }
        if !output.value.is_lovelace_only() {
            return Err(InvalidCollateral::NotPureLovelace(collateral.output_id));
        }
    }

    let mut balance = body.sum_collateral_value()?.lovelace().clone();
    if let Some(collateral_return) = &body.collateral_return {
        if !collateral_return.value.is_lovelace_only() {
            return Err(InvalidCollateral::ReturnCarriesAssets);
        }
        balance -= collateral_return.lovelace();
    }

    let required = required_collateral(&body.fee, collateral_percentage);
    if balance < required {
        return Err(InvalidCollateral::InsufficientBalance {
            provided: balance,
            required,
        });
    }

    if balance > &required * Quantity::from(EXCESSIVE_COLLATERAL_FACTOR) {
        warn!(
            provided = %balance,
            required = %required,
            "collateral exceeds {EXCESSIVE_COLLATERAL_FACTOR} times the required amount"
        );
    }

    if let Some(expected) = &body.total_collateral
        && expected != &balance
    {
        return Err(InvalidCollateral::IncorrectTotalCollateral {
            provided: balance,
            expected: expected.clone(),
        });
    }

    Ok(())
}

/// `ceil(fee * percentage / 100)`
pub fn required_collateral(fee: &Quantity, collateral_percentage: u64) -> Quantity {
    (fee * Quantity::from(collateral_percentage) + Quantity::from(99)) / Quantity::from(100)
}
