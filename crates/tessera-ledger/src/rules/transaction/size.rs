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

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSize {
    #[error("transaction too large: size {size} bytes, max {max} bytes")]
    TooLarge { size: u64, max: u64 },
}

pub fn execute(size: u64, max_tx_size: u64) -> Result<(), InvalidSize> {
    if size > max_tx_size {
        return Err(InvalidSize::TooLarge {
            size,
            max: max_tx_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(300, 16_384 => Ok(()); "well below")]
    #[test_case(16_384, 16_384 => Ok(()); "at the limit")]
    #[test_case(16_385, 16_384 => Err(InvalidSize::TooLarge { size: 16_385, max: 16_384 }); "above")]
    fn size(size: u64, max: u64) -> Result<(), InvalidSize> {
        execute(size, max)
    }
}
