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
use std::fmt;

#[derive(
    Clone, Debug, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize, Default,
)]
#[repr(transparent)]
pub struct Slot(u64);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Slot {
    pub fn new(slot: u64) -> Self {
        Self(slot)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Slot {
    fn from(slot: u64) -> Slot {
        Slot(slot)
    }
}

impl From<Slot> for u64 {
    fn from(slot: Slot) -> u64 {
        slot.0
    }
}

impl<C> cbor::Encode<C> for Slot {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.u64(self.0)?;
        Ok(())
    }
}

impl<'b, C> cbor::Decode<'b, C> for Slot {
    fn decode(d: &mut cbor::Decoder<'b>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        d.u64().map(Slot)
    }
}

/// POSIX time, in milliseconds.
pub type TimeMs = u64;

/// Maps slots onto wall-clock time, for a network whose slot length never changed since
/// `zero_slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConfig {
    pub zero_time: TimeMs,
    pub zero_slot: u64,
    pub slot_length: u64,
}

impl SlotConfig {
    pub const MAINNET: SlotConfig = SlotConfig {
        zero_time: 1_596_059_091_000,
        zero_slot: 4_492_800,
        slot_length: 1000,
    };

    pub const PREPROD: SlotConfig = SlotConfig {
        zero_time: 1_655_769_600_000,
        zero_slot: 86_400,
        slot_length: 1000,
    };

    pub const PREVIEW: SlotConfig = SlotConfig {
        zero_time: 1_666_656_000_000,
        zero_slot: 0,
        slot_length: 1000,
    };

    /// Beginning of the given slot. Slots preceding `zero_slot` saturate to `zero_time`.
    pub fn slot_to_time(&self, slot: Slot) -> TimeMs {
        let elapsed = slot.as_u64().saturating_sub(self.zero_slot);
        self.zero_time
            .saturating_add(elapsed.saturating_mul(self.slot_length))
    }

    /// The slot containing the given instant.
    pub fn time_to_slot(&self, time: TimeMs) -> Slot {
        let elapsed = time.saturating_sub(self.zero_time);
        Slot(self.zero_slot + elapsed / self.slot_length.max(1))
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::MAINNET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(4_492_800 => 1_596_059_091_000; "zero slot")]
    #[test_case(4_492_801 => 1_596_059_092_000; "one slot later")]
    #[test_case(0 => 1_596_059_091_000; "before zero slot")]
    fn mainnet_slot_to_time(slot: u64) -> TimeMs {
        SlotConfig::MAINNET.slot_to_time(Slot::new(slot))
    }

    #[test]
    fn time_to_slot_is_inverse_on_slot_boundaries() {
        let config = SlotConfig::PREPROD;
        let slot = Slot::new(50_000_000);
        assert_eq!(config.time_to_slot(config.slot_to_time(slot)), slot);
        assert_eq!(config.time_to_slot(config.slot_to_time(slot) + 999), slot);
    }
}
