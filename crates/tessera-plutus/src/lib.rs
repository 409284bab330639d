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

//! Projection of transactions into the data handed to Plutus scripts: [`ToPlutusData`] for
//! every ledger entity, and the script contexts of Plutus V1 and V2.

pub mod macros;

pub mod script_context;
pub use script_context::{
    InvalidRedeemer, OutputRef, PlutusV1Error, ScriptContextV1, ScriptContextV2, ScriptPurpose,
    TimeRange, TxInfo, TxInfoTranslationError,
};

pub mod to_plutus_data;
pub use to_plutus_data::{IsKnownPlutusVersion, PlutusVersion, ToPlutusData};

#[doc(hidden)]
pub use tessera_kernel::PlutusData;
