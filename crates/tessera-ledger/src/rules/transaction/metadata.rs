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

use tessera_kernel::{AuxiliaryData, AuxiliaryDataHash, TxBody};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransactionMetadata {
    #[error("missing metadata: auxiliary data hash {0}")]
    MissingTransactionMetadata(AuxiliaryDataHash),

    #[error("missing auxiliary data hash: metadata hash {0}")]
    MissingTransactionAuxiliaryDataHash(AuxiliaryDataHash),

    #[error("metadata hash mismatch: supplied {supplied} expected {expected}")]
    ConflictingMetadataHash {
        supplied: AuxiliaryDataHash,
        expected: AuxiliaryDataHash,
    },
}

pub fn execute(
    body: &TxBody,
    auxiliary_data: Option<&AuxiliaryData>,
) -> Result<(), InvalidTransactionMetadata> {
    match (body.auxiliary_data_hash, auxiliary_data) {
        (None, None) => Ok(()),
        (None, Some(auxiliary_data)) => Err(
            InvalidTransactionMetadata::MissingTransactionAuxiliaryDataHash(auxiliary_data.hash()),
        ),
        (Some(supplied), None) => Err(InvalidTransactionMetadata::MissingTransactionMetadata(
            supplied,
        )),
        (Some(supplied), Some(auxiliary_data)) => {
            let expected = auxiliary_data.hash();
            if supplied != expected {
                return Err(InvalidTransactionMetadata::ConflictingMetadataHash {
                    supplied,
                    expected,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_kernel::{Hash, Metadatum};
    use test_case::test_case;

    fn auxiliary_data() -> AuxiliaryData {
        AuxiliaryData::new(vec![(674, Metadatum::text("hello"))])
    }

    #[test_case(false, false => matches Ok(()); "neither")]
    #[test_case(true, true => matches Ok(()); "both")]
    #[test_case(false, true => matches Err(InvalidTransactionMetadata::MissingTransactionAuxiliaryDataHash(..)); "data without hash")]
    #[test_case(true, false => matches Err(InvalidTransactionMetadata::MissingTransactionMetadata(..)); "hash without data")]
    fn presence(with_hash: bool, with_data: bool) -> Result<(), InvalidTransactionMetadata> {
        let body = TxBody {
            auxiliary_data_hash: with_hash.then(|| auxiliary_data().hash()),
            ..TxBody::default()
        };
        execute(&body, with_data.then(auxiliary_data).as_ref())
    }

    #[test]
    fn conflicting_hash() {
        let body = TxBody {
            auxiliary_data_hash: Some(Hash::new([0; 32])),
            ..TxBody::default()
        };
        assert_eq!(
            execute(&body, Some(&auxiliary_data())),
            Err(InvalidTransactionMetadata::ConflictingMetadataHash {
                supplied: Hash::new([0; 32]),
                expected: auxiliary_data().hash(),
            })
        );
    }
}
