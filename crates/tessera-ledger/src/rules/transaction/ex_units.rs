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

use tessera_kernel::{ExUnits, Redeemer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidExUnits {
    #[error("too many execution units: provided {provided}, max {max}")]
    TooManyExUnits { provided: ExUnits, max: ExUnits },
}

/// The budget declared by all redeemers, together, must fit within the per-transaction limits.
pub fn execute(redeemers: &[Redeemer], max: &ExUnits) -> Result<(), InvalidExUnits> {
    let provided: ExUnits = redeemers.iter().map(|redeemer| redeemer.ex_units).sum();

    if !provided.fits_within(max) {
        return Err(InvalidExUnits::TooManyExUnits {
            provided,
            max: *max,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_kernel::{PlutusData, RedeemerTag};
    use test_case::test_case;

    fn redeemers(budgets: &[(u64, u64)]) -> Vec<Redeemer> {
        budgets
            .iter()
            .enumerate()
            .map(|(ix, (memory, steps))| {
                Redeemer::new(
                    RedeemerTag::Spend,
                    ix as u32,
                    PlutusData::unit(),
                    ExUnits::new(*memory, *steps),
                )
            })
            .collect()
    }

    #[test_case(&[] => Ok(()); "no redeemers")]
    #[test_case(&[(7, 50), (7, 50)] => Ok(()); "exactly the budget")]
    #[test_case(&[(10, 1), (5, 1)] => Err(InvalidExUnits::TooManyExUnits {
        provided: ExUnits::new(15, 2),
        max: ExUnits::new(14, 100),
    }); "memory exceeded")]
    #[test_case(&[(1, 60), (1, 41)] => matches Err(InvalidExUnits::TooManyExUnits { .. }); "steps exceeded")]
    fn ex_units(budgets: &[(u64, u64)]) -> Result<(), InvalidExUnits> {
        execute(&redeemers(budgets), &ExUnits::new(14, 100))
    }
}
