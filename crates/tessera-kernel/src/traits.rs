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

use crate::{ExUnits, PlutusData, Script, TxInput, TxOutput, TxOutputId};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Somewhere to fetch the outputs that transactions spend or reference from: a node, an indexer,
/// a local store...
#[async_trait]
pub trait UtxoLookup: Send + Sync {
    /// Fetch the output behind an id, as a resolved input.
    async fn get_utxo(&self, output_id: &TxOutputId) -> Result<TxInput, anyhow::Error>;
}

#[derive(Debug, thiserror::Error)]
#[error("unknown output {0}")]
pub struct UnknownOutput(pub TxOutputId);

#[async_trait]
impl UtxoLookup for BTreeMap<TxOutputId, TxOutput> {
    async fn get_utxo(&self, output_id: &TxOutputId) -> Result<TxInput, anyhow::Error> {
        let output = self
            .get(output_id)
            .ok_or(UnknownOutput(*output_id))?
            .clone();
        Ok(TxInput::resolved(*output_id, output))
    }
}

/// What a virtual machine reports after running a script: the budget it consumed and the
/// resulting term, or the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOutcome {
    pub cost: ExUnits,
    pub result: Result<PlutusData, String>,
}

impl EvalOutcome {
    pub fn success(cost: ExUnits, result: PlutusData) -> Self {
        Self {
            cost,
            result: Ok(result),
        }
    }

    pub fn failure(cost: ExUnits, reason: impl Into<String>) -> Self {
        Self {
            cost,
            result: Err(reason.into()),
        }
    }
}

/// A virtual machine able to execute Plutus scripts.
pub trait ScriptMachine {
    fn eval(&self, script: &Script, args: &[PlutusData]) -> EvalOutcome;
}

impl<F> ScriptMachine for F
where
    F: Fn(&Script, &[PlutusData]) -> EvalOutcome,
{
    fn eval(&self, script: &Script, args: &[PlutusData]) -> EvalOutcome {
        self(script, args)
    }
}
