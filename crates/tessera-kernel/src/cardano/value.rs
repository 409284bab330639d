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

use crate::{AssetName, Assets, PolicyId, Quantity, cbor, decode_quantity, encode_quantity};
use num::{Signed, Zero};
use std::fmt;

/// An immutable amount of lovelace alongside native assets.
///
/// Values are snapshots: balancing code accumulates changes in a [`ValueBuilder`] and only
/// builds the final value once done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    lovelace: Quantity,
    assets: Assets,
}

impl Value {
    pub fn new(lovelace: impl Into<Quantity>, assets: Assets) -> Self {
        Self {
            lovelace: lovelace.into(),
            assets,
        }
    }

    pub fn from_lovelace(lovelace: impl Into<Quantity>) -> Self {
        Self::new(lovelace, Assets::default())
    }

    pub fn from_assets(assets: Assets) -> Self {
        Self::new(0, assets)
    }

    pub fn lovelace(&self) -> &Quantity {
        &self.lovelace
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn into_builder(self) -> ValueBuilder {
        ValueBuilder {
            lovelace: self.lovelace,
            assets: self.assets,
        }
    }

    pub fn sum<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
        values
            .into_iter()
            .fold(ValueBuilder::default(), |acc, value| acc.add_value(value))
            .build()
    }

    pub fn add(&self, other: &Value) -> Value {
        Value {
            lovelace: &self.lovelace + &other.lovelace,
            assets: self.assets.add(&other.assets),
        }
    }

    pub fn subtract(&self, other: &Value) -> Value {
        Value {
            lovelace: &self.lovelace - &other.lovelace,
            assets: self.assets.subtract(&other.assets),
        }
    }

    pub fn multiply(&self, scalar: impl Into<Quantity>) -> Value {
        let scalar = scalar.into();
        Value {
            lovelace: &self.lovelace * &scalar,
            assets: self.assets.multiply(scalar),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace.is_zero() && self.assets.is_zero()
    }

    /// No lovelace and no asset goes below zero.
    pub fn is_non_negative(&self) -> bool {
        !self.lovelace.is_negative() && self.assets.asset_classes().all(|(_, q)| !q.is_negative())
    }

    pub fn is_lovelace_only(&self) -> bool {
        self.assets.is_zero()
    }

    pub fn is_greater_or_equal(&self, other: &Value) -> bool {
        self.lovelace >= other.lovelace && self.assets.is_greater_or_equal(&other.assets)
    }

    /// Strictly more lovelace, and strictly more of every asset. Follows
    /// [`Assets::is_greater_than`], so a value without assets is never strictly greater than
    /// another.
    pub fn is_greater_than(&self, other: &Value) -> bool {
        self.lovelace > other.lovelace && self.assets.is_greater_than(&other.assets)
    }
}

impl From<Quantity> for Value {
    fn from(lovelace: Quantity) -> Self {
        Self::from_lovelace(lovelace)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.assets.is_empty() {
            return write!(f, "{} lovelace", self.lovelace);
        }
        write!(f, "{} lovelace + {}", self.lovelace, self.assets)
    }
}

impl<C> cbor::Encode<C> for Value {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        if self.assets.is_empty() {
            return encode_quantity(e, &self.lovelace);
        }

        e.array(2)?;
        encode_quantity(e, &self.lovelace)?;
        e.encode_with(&self.assets, ctx)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Value {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        if !matches!(
            d.datatype()?,
            cbor::data::Type::Array | cbor::data::Type::ArrayIndef
        ) {
            return Ok(Value::from_lovelace(decode_quantity(d)?));
        }

        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            Ok(Value {
                lovelace: decode_quantity(d)?,
                assets: d.decode_with(ctx)?,
            })
        })
    }
}

// -----------------------------------------------------------------------------
// Builder
// -----------------------------------------------------------------------------

/// The mutable counterpart of [`Value`], scoped to a single balancing computation.
#[derive(Debug, Clone, Default)]
pub struct ValueBuilder {
    lovelace: Quantity,
    assets: Assets,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lovelace(&self) -> &Quantity {
        &self.lovelace
    }

    pub fn set_lovelace(mut self, lovelace: impl Into<Quantity>) -> Self {
        self.lovelace = lovelace.into();
        self
    }

    pub fn add_lovelace(mut self, lovelace: impl Into<Quantity>) -> Self {
        self.lovelace += lovelace.into();
        self
    }

    pub fn add_component(
        mut self,
        policy: PolicyId,
        name: impl Into<AssetName>,
        quantity: impl Into<Quantity>,
    ) -> Self {
        self.assets.add_component(policy, name, quantity);
        self
    }

    pub fn add_assets(mut self, assets: &Assets) -> Self {
        self.assets = self.assets.add(assets);
        self
    }

    pub fn add_value(mut self, value: &Value) -> Self {
        self.lovelace += &value.lovelace;
        self.assets = self.assets.add(&value.assets);
        self
    }

    pub fn subtract_value(mut self, value: &Value) -> Self {
        self.lovelace -= &value.lovelace;
        self.assets = self.assets.subtract(&value.assets);
        self
    }

    pub fn build(self) -> Value {
        Value {
            lovelace: self.lovelace,
            assets: self.assets,
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_assets;
    use proptest::prelude::*;

    pub fn any_value() -> impl Strategy<Value = Value> {
        (0_u64..45_000_000_000_000_000, any_assets())
            .prop_map(|(lovelace, assets)| Value::new(lovelace, assets))
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::{AssetClass, Hash};
        use num::BigInt;

        #[test]
        fn sum_of_mixed_values() {
            let policy = Hash::new([7; 28]);
            let token = Value::new(2_000_000, Assets::singleton(policy, "token", 10));

            let total = Value::sum([
                &token,
                &Value::from_lovelace(1_000_000),
                &Value::from_lovelace(10_000_000),
            ]);

            assert_eq!(total.lovelace(), &BigInt::from(13_000_000));
            assert_eq!(total.assets().asset_classes().count(), 1);
            assert_eq!(
                total.assets().get_quantity(&AssetClass::new(policy, "token")),
                BigInt::from(10)
            );
        }

        #[test]
        fn builder_leaves_snapshots_untouched() {
            let original = Value::from_lovelace(1);
            let updated = original.clone().into_builder().add_lovelace(41).build();
            assert_eq!(original.lovelace(), &BigInt::from(1));
            assert_eq!(updated.lovelace(), &BigInt::from(42));
        }

        #[test]
        fn lovelace_only_value_encodes_as_int() {
            assert_eq!(hex::encode(cbor::to_cbor(&Value::from_lovelace(24))), "1818");
        }

        #[test]
        fn strict_comparison_follows_assets() {
            let policy = Hash::new([7; 28]);
            let with = |lovelace: u64, quantity: i64| {
                Value::new(lovelace, Assets::singleton(policy, "token", quantity))
            };

            assert!(with(2, 2).is_greater_than(&with(1, 1)));
            assert!(!with(2, 1).is_greater_than(&with(1, 1)));
            assert!(!with(1, 2).is_greater_than(&with(1, 1)));

            // Asset-free bundles neither dominate nor get dominated strictly.
            assert!(!Value::from_lovelace(2).is_greater_than(&Value::from_lovelace(1)));
            assert!(!with(2, 2).is_greater_than(&Value::from_lovelace(1)));
            assert_eq!(
                Value::from_lovelace(2).is_greater_than(&Value::from_lovelace(1)),
                Assets::default().is_greater_than(&Assets::default())
            );

            assert!(Value::from_lovelace(2).is_greater_or_equal(&Value::from_lovelace(1)));
        }

        proptest! {
            #[test]
            fn cbor_roundtrip(value in any_value()) {
                let bytes = cbor::to_cbor(&value);
                prop_assert_eq!(cbor::from_cbor::<Value>(&bytes), Some(value));
            }

            #[test]
            fn subtract_self_is_zero(value in any_value()) {
                prop_assert!(value.subtract(&value).is_zero());
            }
        }
    }
}
