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

use crate::cbor;
use serde::{Deserialize, Serialize};
use std::{fmt, iter::Sum, ops::Add};

/// Execution budget of a script, in memory units and cpu steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExUnits {
    #[serde(alias = "mem")]
    pub memory: u64,
    #[serde(alias = "cpu")]
    pub steps: u64,
}

impl ExUnits {
    pub fn new(memory: u64, steps: u64) -> Self {
        Self { memory, steps }
    }

    /// Whether neither dimension exceeds the other budget's.
    pub fn fits_within(&self, budget: &ExUnits) -> bool {
        self.memory <= budget.memory && self.steps <= budget.steps
    }
}

impl Add for ExUnits {
    type Output = ExUnits;

    fn add(self, rhs: ExUnits) -> ExUnits {
        ExUnits {
            memory: self.memory.saturating_add(rhs.memory),
            steps: self.steps.saturating_add(rhs.steps),
        }
    }
}

impl Sum for ExUnits {
    fn sum<I: Iterator<Item = ExUnits>>(iter: I) -> Self {
        iter.fold(ExUnits::default(), Add::add)
    }
}

impl fmt::Display for ExUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{mem: {}, cpu: {}}}", self.memory, self.steps)
    }
}

impl<C> cbor::Encode<C> for ExUnits {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.u64(self.memory)?;
        e.u64(self.steps)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for ExUnits {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            Ok(Self {
                memory: d.u64()?,
                steps: d.u64()?,
            })
        })
    }
}
