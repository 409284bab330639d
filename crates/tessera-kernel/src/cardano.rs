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

pub mod address;
pub mod assets;
pub mod auxiliary_data;
pub mod certificate;
pub mod credential;
pub mod datum;
pub mod ex_units;
pub mod hash;
pub mod metadatum;
pub mod network_params;
pub mod plutus_data;
pub mod quantity;
pub mod redeemer;
pub mod script;
pub mod signature;
pub mod slot;
pub mod stake_address;
pub mod transaction_body;
pub mod tx_input;
pub mod tx_output;
pub mod tx_output_id;
pub mod value;
pub mod witness_set;
