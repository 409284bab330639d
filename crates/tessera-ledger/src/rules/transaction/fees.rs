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

use tessera_kernel::Quantity;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFees {
    #[error("fee too small: provided {provided}, required {required}")]
    FeeTooSmall {
        provided: Quantity,
        required: Quantity,
    },
}

pub fn execute(fee: &Quantity, min_fee: &Quantity) -> Result<(), InvalidFees> {
    if fee < min_fee {
        return Err(InvalidFees::FeeTooSmall {
            provided: fee.clone(),
            required: min_fee.clone(),
        });
    }
    Ok(())
}
