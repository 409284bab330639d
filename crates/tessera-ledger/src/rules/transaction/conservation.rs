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

use tessera_kernel::{TxBody, UnresolvedInput, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConservation {
    #[error("value not conserved: consumed {consumed}, produced {produced}")]
    ValueNotConserved { consumed: Value, produced: Value },
    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// Everything the transaction consumes (inputs, withdrawals, deposit refunds and minted assets)
/// must equal everything it produces (outputs, fee and new deposits), asset by asset.
pub fn execute(body: &TxBody, stake_address_deposit: u64) -> Result<(), InvalidConservation> {
    let consumed = body
        .sum_input_value()?
        .into_builder()
        .add_lovelace(body.total_withdrawals())
        .add_lovelace(body.refunds(stake_address_deposit))
        .add_assets(&body.minted)
        .build();

    let produced = body
        .sum_output_value()
        .into_builder()
        .add_lovelace(body.fee.clone())
        .add_lovelace(body.deposits(stake_address_deposit))
        .build();

    if consumed != produced {
        return Err(InvalidConservation::ValueNotConserved { consumed, produced });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::{key_address, output_id, utxo};
    use tessera_kernel::{
        Assets, Credential, DCert, Hash, Quantity, StakeAddress, TxInput, TxOutput,
    };
    use test_case::test_case;

    const DEPOSIT: u64 = 2_000_000;

    fn body(input: u64, output: u64, fee: u64) -> TxBody {
        TxBody {
            inputs: vec![utxo(output_id(1, 0), key_address(1), input)],
            outputs: vec![TxOutput::new(key_address(2), Value::from_lovelace(output))],
            fee: Quantity::from(fee),
            ..TxBody::default()
        }
    }

    #[test_case(10_000_000, 9_800_000, 200_000 => matches Ok(()); "balanced")]
    #[test_case(10_000_000, 9_800_001, 200_000 => matches Err(InvalidConservation::ValueNotConserved { .. }); "overspent")]
    #[test_case(10_000_000, 9_700_000, 200_000 => matches Err(InvalidConservation::ValueNotConserved { .. }); "leftover")]
    fn lovelace(input: u64, output: u64, fee: u64) -> Result<(), InvalidConservation> {
        execute(&body(input, output, fee), DEPOSIT)
    }

    #[test]
    fn minted_assets_must_land_in_outputs() {
        let policy = Hash::new([9; 28]);
        let mut body = body(10_000_000, 9_800_000, 200_000);
        body.minted = Assets::singleton(policy, "coin", 10);
        assert!(matches!(
            execute(&body, DEPOSIT),
            Err(InvalidConservation::ValueNotConserved { .. })
        ));

        body.outputs[0].value = Value::new(9_800_000, Assets::singleton(policy, "coin", 10));
        assert_eq!(execute(&body, DEPOSIT), Ok(()));
    }

    #[test]
    fn burnt_assets_leave_the_outputs() {
        let policy = Hash::new([9; 28]);
        let mut body = body(10_000_000, 9_800_000, 200_000);
        body.inputs = vec![TxInput::resolved(
            output_id(1, 0),
            TxOutput::new(
                key_address(1),
                Value::new(10_000_000, Assets::singleton(policy, "coin", 3)),
            ),
        )];
        body.minted = Assets::singleton(policy, "coin", -3);
        assert_eq!(execute(&body, DEPOSIT), Ok(()));
    }

    #[test]
    fn deposits_and_refunds() {
        let credential = Credential::Key(Hash::new([4; 28]));

        let mut register = body(10_000_000, 7_800_000, 200_000);
        register.certificates = vec![DCert::Register(credential)];
        assert_eq!(execute(&register, DEPOSIT), Ok(()));

        let mut deregister = body(10_000_000, 11_800_000, 200_000);
        deregister.certificates = vec![DCert::Deregister(credential)];
        assert_eq!(execute(&deregister, DEPOSIT), Ok(()));
    }

    #[test]
    fn withdrawals_are_consumed() {
        let mut body = body(10_000_000, 10_800_000, 200_000);
        body.withdrawals = vec![(
            StakeAddress::new(false, Credential::Key(Hash::new([4; 28]))),
            Quantity::from(1_000_000),
        )];
        assert_eq!(execute(&body, DEPOSIT), Ok(()));
    }

    #[test]
    fn unresolved_inputs_are_reported() {
        let mut body = body(10_000_000, 9_800_000, 200_000);
        body.inputs = vec![TxInput::new(output_id(1, 0))];
        assert_eq!(
            execute(&body, DEPOSIT),
            Err(InvalidConservation::Unresolved(UnresolvedInput(output_id(1, 0))))
        );
    }
}
