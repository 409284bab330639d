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
    InvalidSignature, PubKeyHash, TransactionId, TxBody, TxWitnesses, UnresolvedInput,
    utils::display_collection,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidVKeyWitness {
    #[error(transparent)]
    InvalidSignature(#[from] InvalidSignature),
    #[error("missing required signatures: pkhs [{}]", display_collection(.0))]
    MissingRequiredVkeyWitnesses(Vec<PubKeyHash>),
    #[error(transparent)]
    Unresolved(#[from] UnresolvedInput),
}

/// Every signature must be valid for the transaction, and every key the transaction depends on
/// must have signed it.
pub fn execute(
    body: &TxBody,
    witnesses: &TxWitnesses,
    id: &TransactionId,
) -> Result<(), InvalidVKeyWitness> {
    for signature in &witnesses.signatures {
        signature.verify(id)?;
    }

    let signers = witnesses.signers().collect::<BTreeSet<_>>();
    let missing = required_signers(body)?
        .into_iter()
        .filter(|key| !signers.contains(key))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        return Err(InvalidVKeyWitness::MissingRequiredVkeyWitnesses(missing));
    }

    Ok(())
}

/// Keys that must sign: the declared required signers, plus the owners of key-locked inputs and
/// collateral inputs.
pub fn required_signers(body: &TxBody) -> Result<BTreeSet<PubKeyHash>, UnresolvedInput> {
    let mut signers = body.required_signers.iter().copied().collect::<BTreeSet<_>>();
    signers.extend(body.input_owners()?);
    Ok(signers)
}
