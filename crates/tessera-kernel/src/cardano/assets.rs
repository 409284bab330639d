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

use crate::{
    HashRole, InvalidHash, PolicyId, Quantity, cbor, decode_quantity, encode_quantity,
    hash_from_slice,
};
use num::{BigInt, Zero};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Deref,
};

/// Maximum length, in bytes, of a token name.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

// -----------------------------------------------------------------------------
// AssetName
// -----------------------------------------------------------------------------

/// A token name within a policy. Ordered byte-wise, a strict prefix sorting first.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for AssetName {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for AssetName {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for AssetName {
    fn from(name: &str) -> Self {
        Self(name.as_bytes().to_vec())
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl<C> cbor::Encode<C> for AssetName {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.bytes(&self.0)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for AssetName {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let bytes = d.bytes()?;
        if bytes.len() > MAX_ASSET_NAME_LENGTH {
            return Err(cbor::decode::Error::message(format!(
                "asset name too long: expected at most {MAX_ASSET_NAME_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes.to_vec()))
    }
}

// -----------------------------------------------------------------------------
// AssetClass
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetClass {
    pub policy: PolicyId,
    pub name: AssetName,
}

impl AssetClass {
    pub fn new(policy: PolicyId, name: impl Into<AssetName>) -> Self {
        Self {
            policy,
            name: name.into(),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy, self.name)
    }
}

// -----------------------------------------------------------------------------
// CurrencySymbol
// -----------------------------------------------------------------------------

/// What a policy id denotes once values are seen from scripts, where the base currency sits under
/// an empty identifier next to the real minting policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurrencySymbol {
    Lovelace,
    Native(PolicyId),
}

impl CurrencySymbol {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidHash> {
        if bytes.is_empty() {
            return Ok(Self::Lovelace);
        }
        hash_from_slice(HashRole::MintingPolicy, bytes).map(Self::Native)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Lovelace => &[],
            Self::Native(policy) => policy.as_ref(),
        }
    }
}

impl From<PolicyId> for CurrencySymbol {
    fn from(policy: PolicyId) -> Self {
        Self::Native(policy)
    }
}

impl fmt::Display for CurrencySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lovelace => f.write_str("lovelace"),
            Self::Native(policy) => write!(f, "{policy}"),
        }
    }
}

// -----------------------------------------------------------------------------
// Assets
// -----------------------------------------------------------------------------

pub type Tokens = Vec<(AssetName, Quantity)>;

/// A multi-asset bundle: policies, each holding token quantities.
///
/// Every mutation re-establishes two invariants: no zero quantity survives, and each policy (resp.
/// token within a policy) appears at most once. Entries otherwise keep their insertion order;
/// only [`Assets::sort`] puts them in the canonical order required on-chain.
///
/// Decoded bundles are the exception: they hold exactly what was received, so that they
/// re-encode to the same bytes. See [`Assets::is_normalized`].
#[derive(Debug, Clone, Default)]
pub struct Assets(Vec<(PolicyId, Tokens)>);

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UnsortedAssets {
    #[error("policies out of order: {previous} comes before {next}")]
    Policies { previous: PolicyId, next: PolicyId },
    #[error("tokens out of order under policy {policy}: {previous} comes before {next}")]
    Tokens {
        policy: PolicyId,
        previous: AssetName,
        next: AssetName,
    },
}

impl Assets {
    pub fn new(entries: impl IntoIterator<Item = (PolicyId, Tokens)>) -> Self {
        let mut assets = Self(entries.into_iter().collect());
        assets.normalize();
        assets
    }

    pub fn from_asset_classes(entries: impl IntoIterator<Item = (AssetClass, Quantity)>) -> Self {
        let mut assets = Self::default();
        for (asset_class, quantity) in entries {
            assets.push(asset_class.policy, asset_class.name, quantity);
        }
        assets.normalize();
        assets
    }

    pub fn singleton(
        policy: PolicyId,
        name: impl Into<AssetName>,
        quantity: impl Into<Quantity>,
    ) -> Self {
        Self::new([(policy, vec![(name.into(), quantity.into())])])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when no asset class holds a non-zero quantity.
    pub fn is_zero(&self) -> bool {
        self.0
            .iter()
            .all(|(_, tokens)| tokens.iter().all(|(_, q)| q.is_zero()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(PolicyId, Tokens)> {
        self.0.iter()
    }

    pub fn policies(&self) -> impl Iterator<Item = &PolicyId> {
        self.0.iter().map(|(policy, _)| policy)
    }

    /// Flattened view, in the current order.
    pub fn asset_classes(&self) -> impl Iterator<Item = (AssetClass, &Quantity)> {
        self.0.iter().flat_map(|(policy, tokens)| {
            tokens
                .iter()
                .map(|(name, quantity)| (AssetClass::new(*policy, name.clone()), quantity))
        })
    }

    pub fn tokens(&self, policy: &PolicyId) -> Option<&Tokens> {
        self.0
            .iter()
            .find_map(|(p, tokens)| (p == policy).then_some(tokens))
    }

    pub fn get_quantity(&self, asset_class: &AssetClass) -> Quantity {
        self.asset_classes()
            .filter(|(candidate, _)| candidate == asset_class)
            .map(|(_, quantity)| quantity)
            .sum()
    }

    pub fn add_component(
        &mut self,
        policy: PolicyId,
        name: impl Into<AssetName>,
        quantity: impl Into<Quantity>,
    ) {
        self.push(policy, name.into(), quantity.into());
        self.normalize();
    }

    pub fn add_tokens(
        &mut self,
        policy: PolicyId,
        tokens: impl IntoIterator<Item = (AssetName, Quantity)>,
    ) {
        for (name, quantity) in tokens {
            self.push(policy, name, quantity);
        }
        self.normalize();
    }

    pub fn add(&self, other: &Assets) -> Assets {
        let mut result = self.clone();
        for (policy, tokens) in other.iter() {
            for (name, quantity) in tokens {
                result.push(*policy, name.clone(), quantity.clone());
            }
        }
        result.normalize();
        result
    }

    pub fn subtract(&self, other: &Assets) -> Assets {
        self.add(&other.multiply(-1))
    }

    pub fn multiply(&self, scalar: impl Into<Quantity>) -> Assets {
        let scalar = scalar.into();
        let mut result = Assets(
            self.0
                .iter()
                .map(|(policy, tokens)| {
                    (
                        *policy,
                        tokens
                            .iter()
                            .map(|(name, quantity)| (name.clone(), quantity * &scalar))
                            .collect(),
                    )
                })
                .collect(),
        );
        result.remove_zeroes();
        result
    }

    /// Weakly dominates `other` on every asset class. Anything dominates nothing.
    pub fn is_greater_or_equal(&self, other: &Assets) -> bool {
        if other.is_zero() {
            return true;
        }

        self.all_asset_classes(other)
            .iter()
            .all(|asset_class| self.get_quantity(asset_class) >= other.get_quantity(asset_class))
    }

    /// Strictly dominates `other` on every asset class. Empty bundles never strictly dominate,
    /// nor are strictly dominated.
    pub fn is_greater_than(&self, other: &Assets) -> bool {
        if self.is_zero() || other.is_zero() {
            return false;
        }

        self.all_asset_classes(other)
            .iter()
            .all(|asset_class| self.get_quantity(asset_class) > other.get_quantity(asset_class))
    }

    /// Merge duplicate policies and tokens by summation, then drop zero quantities. Idempotent.
    pub fn normalize(&mut self) {
        let mut merged: Vec<(PolicyId, Tokens)> = Vec::with_capacity(self.0.len());

        for (policy, tokens) in self.0.drain(..) {
            let index = match merged.iter().position(|(p, _)| p == &policy) {
                Some(index) => index,
                None => {
                    merged.push((policy, Vec::with_capacity(tokens.len())));
                    merged.len() - 1
                }
            };

            let (_, existing) = &mut merged[index];
            for (name, quantity) in tokens {
                match existing.iter_mut().find(|(n, _)| n == &name) {
                    Some((_, total)) => *total += quantity,
                    None => existing.push((name, quantity)),
                }
            }
        }

        self.0 = merged;
        self.remove_zeroes();
    }

    /// Whether the bundle already satisfies what [`Assets::normalize`] establishes.
    pub fn is_normalized(&self) -> bool {
        let mut policies = BTreeSet::new();
        self.0.iter().all(|(policy, tokens)| {
            let mut names = BTreeSet::new();
            policies.insert(policy)
                && !tokens.is_empty()
                && tokens
                    .iter()
                    .all(|(name, quantity)| names.insert(name) && !quantity.is_zero())
        })
    }

    pub fn remove_zeroes(&mut self) {
        for (_, tokens) in self.0.iter_mut() {
            tokens.retain(|(_, quantity)| !quantity.is_zero());
        }
        self.0.retain(|(_, tokens)| !tokens.is_empty());
    }

    /// Put policies, then tokens within each policy, in canonical byte-wise order.
    pub fn sort(&mut self) {
        for (_, tokens) in self.0.iter_mut() {
            tokens.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        self.0.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    /// Check canonical order without changing anything; fails on the first offending pair.
    pub fn assert_sorted(&self) -> Result<(), UnsortedAssets> {
        for window in self.0.windows(2) {
            if let [(previous, _), (next, _)] = window {
                if previous >= next {
                    return Err(UnsortedAssets::Policies {
                        previous: *previous,
                        next: *next,
                    });
                }
            }
        }

        for (policy, tokens) in self.0.iter() {
            for window in tokens.windows(2) {
                if let [(previous, _), (next, _)] = window {
                    if previous >= next {
                        return Err(UnsortedAssets::Tokens {
                            policy: *policy,
                            previous: previous.clone(),
                            next: next.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Canonically ordered snapshot, independent of the insertion order.
    pub fn to_btree(&self) -> BTreeMap<PolicyId, BTreeMap<AssetName, Quantity>> {
        let mut view: BTreeMap<PolicyId, BTreeMap<AssetName, Quantity>> = BTreeMap::new();
        for (policy, tokens) in self.0.iter() {
            let entry = view.entry(*policy).or_default();
            for (name, quantity) in tokens {
                *entry.entry(name.clone()).or_insert_with(BigInt::zero) += quantity;
            }
        }
        view.retain(|_, tokens| {
            tokens.retain(|_, q| !q.is_zero());
            !tokens.is_empty()
        });
        view
    }

    fn all_asset_classes(&self, other: &Assets) -> BTreeSet<AssetClass> {
        self.asset_classes()
            .chain(other.asset_classes())
            .map(|(asset_class, _)| asset_class)
            .collect()
    }

    fn push(&mut self, policy: PolicyId, name: AssetName, quantity: Quantity) {
        match self.0.iter_mut().find(|(p, _)| p == &policy) {
            Some((_, tokens)) => tokens.push((name, quantity)),
            None => self.0.push((policy, vec![(name, quantity)])),
        }
    }
}

impl PartialEq for Assets {
    fn eq(&self, other: &Self) -> bool {
        self.to_btree() == other.to_btree()
    }
}

impl Eq for Assets {}

impl fmt::Display for Assets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (asset_class, quantity)) in self.asset_classes().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{asset_class}: {quantity}")?;
        }
        write!(f, "}}")
    }
}

impl<C> cbor::Encode<C> for Assets {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.map(self.0.len() as u64)?;
        for (policy, tokens) in self.0.iter() {
            e.encode_with(policy, ctx)?;
            e.map(tokens.len() as u64)?;
            for (name, quantity) in tokens {
                e.encode_with(name, ctx)?;
                encode_quantity(e, quantity)?;
            }
        }
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Assets {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let entries = cbor::heterogeneous_map(
            d,
            Vec::new(),
            |d| d.decode::<PolicyId>(),
            |d, entries: &mut Vec<(PolicyId, Tokens)>, policy| {
                let tokens = cbor::heterogeneous_map(
                    d,
                    Vec::new(),
                    |d| d.decode::<AssetName>(),
                    |d, tokens: &mut Tokens, name| {
                        tokens.push((name, decode_quantity(d)?));
                        Ok(())
                    },
                )?;
                entries.push((policy, tokens));
                Ok(())
            },
        )?;

        // Kept as received; normalization and ordering are ledger rules, not decoding ones.
        Ok(Assets(entries))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::any_hash28;
    use proptest::{collection::vec, prelude::*};

    pub fn any_asset_name() -> impl Strategy<Value = AssetName> {
        vec(any::<u8>(), 0..=4).prop_map(AssetName::from)
    }

    /// Assets with (possibly) duplicated policies, tokens and zero quantities: not normalized.
    pub fn any_raw_assets() -> impl Strategy<Value = Vec<(PolicyId, Tokens)>> {
        let policies = vec(any_hash28(), 1..=3);
        policies.prop_flat_map(|policies| {
            vec(
                (
                    proptest::sample::select(policies),
                    vec((any_asset_name(), (-3_i64..=3).prop_map(BigInt::from)), 0..4),
                ),
                0..6,
            )
        })
    }

    pub fn any_assets() -> impl Strategy<Value = Assets> {
        any_raw_assets().prop_map(Assets::new)
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::Hash;

        fn policy(byte: u8) -> PolicyId {
            Hash::new([byte; 28])
        }

        #[test]
        fn currency_symbol_accepts_empty_or_policy_sized_bytes() {
            assert_eq!(CurrencySymbol::from_bytes(&[]), Ok(CurrencySymbol::Lovelace));
            assert_eq!(
                CurrencySymbol::from_bytes(&[7; 28]),
                Ok(CurrencySymbol::Native(policy(7)))
            );
            assert!(matches!(
                CurrencySymbol::from_bytes(&[7; 27]),
                Err(InvalidHash::InvalidLength { actual: 27, .. })
            ));
            assert!(CurrencySymbol::Lovelace < CurrencySymbol::Native(policy(0)));
        }

        #[test]
        fn sort_orders_policies_bytewise() {
            let mut assets = Assets::new([
                (policy(2), vec![(AssetName::from(""), BigInt::from(1))]),
                (policy(1), vec![(AssetName::from(""), BigInt::from(1))]),
            ]);
            assert!(assets.assert_sorted().is_err());
            assets.sort();
            assert_eq!(
                assets.policies().copied().collect::<Vec<_>>(),
                vec![policy(1), policy(2)]
            );
            assert!(assets.assert_sorted().is_ok());
        }

        #[test]
        fn sort_orders_tokens_prefix_first() {
            let mut assets = Assets::new([(
                policy(1),
                vec![
                    (AssetName::from("ab"), BigInt::from(1)),
                    (AssetName::from("a"), BigInt::from(1)),
                    (AssetName::from("b"), BigInt::from(1)),
                ],
            )]);
            assert_eq!(
                assets.assert_sorted(),
                Err(UnsortedAssets::Tokens {
                    policy: policy(1),
                    previous: AssetName::from("ab"),
                    next: AssetName::from("a"),
                })
            );
            assets.sort();
            let names = assets
                .tokens(&policy(1))
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect::<Vec<_>>();
            assert_eq!(
                names,
                vec![
                    AssetName::from("a"),
                    AssetName::from("ab"),
                    AssetName::from("b")
                ]
            );
        }

        #[test]
        fn mutations_drop_zeroes() {
            let mut assets = Assets::singleton(policy(1), "x", 5);
            assets.add_component(policy(1), "x", -5);
            assert!(assets.is_empty());

            let five = Assets::singleton(policy(1), "x", 5);
            let assets = five.subtract(&five);
            assert!(assets.is_empty());
        }

        #[test]
        fn equality_ignores_order() {
            let left = Assets::new([
                (policy(1), vec![(AssetName::from("a"), BigInt::from(1))]),
                (policy(2), vec![(AssetName::from("b"), BigInt::from(2))]),
            ]);
            let right = Assets::new([
                (policy(2), vec![(AssetName::from("b"), BigInt::from(2))]),
                (policy(1), vec![(AssetName::from("a"), BigInt::from(1))]),
            ]);
            assert_eq!(left, right);
            assert_ne!(cbor::to_cbor(&left), cbor::to_cbor(&right));
        }

        #[test]
        fn comparisons() {
            let one = Assets::singleton(policy(1), "x", 1);
            let two = Assets::singleton(policy(1), "x", 2);
            let other = Assets::singleton(policy(2), "x", 3);

            assert!(two.is_greater_or_equal(&one));
            assert!(two.is_greater_than(&one));
            assert!(one.is_greater_or_equal(&one));
            assert!(!one.is_greater_than(&one));
            assert!(!two.is_greater_or_equal(&other));
            assert!(one.is_greater_or_equal(&Assets::default()));
            assert!(!one.is_greater_than(&Assets::default()));
            assert!(!Assets::default().is_greater_than(&one));
            assert!(!Assets::default().is_greater_or_equal(&one));
        }

        #[test]
        fn quantity_lookup() {
            let assets = Assets::singleton(policy(1), "x", 7);
            let quantity = |p, name| assets.get_quantity(&AssetClass::new(policy(p), name));
            assert_eq!(quantity(1, "x"), BigInt::from(7));
            assert_eq!(quantity(1, "y"), BigInt::zero());
            assert_eq!(quantity(3, "x"), BigInt::zero());
        }

        #[test]
        fn multiply_by_zero_empties() {
            assert!(Assets::singleton(policy(1), "x", 7).multiply(0).is_empty());
            assert_eq!(
                Assets::singleton(policy(1), "x", 7).multiply(-2),
                Assets::singleton(policy(1), "x", -14)
            );
        }

        #[test]
        fn decoding_keeps_entries_as_received() {
            let received = Assets(vec![
                (policy(1), vec![(AssetName::from("x"), BigInt::zero())]),
                (policy(1), vec![(AssetName::from("y"), BigInt::from(1))]),
            ]);
            let bytes = cbor::to_cbor(&received);

            let decoded: Assets = cbor::from_cbor(&bytes).unwrap();
            assert_eq!(cbor::to_cbor(&decoded), bytes);
            assert!(!decoded.is_normalized());
            assert_eq!(decoded, Assets::singleton(policy(1), "y", 1));
            assert_eq!(
                decoded.get_quantity(&AssetClass::new(policy(1), "y")),
                BigInt::from(1)
            );
        }

        proptest! {
            #[test]
            fn normalized_iff_normalize_is_a_no_op(raw in any_raw_assets()) {
                prop_assert_eq!(
                    Assets(raw.clone()).is_normalized(),
                    Assets::new(raw.clone()).0 == raw
                );
            }

            #[test]
            fn raw_assets_survive_cbor(raw in any_raw_assets()) {
                let bytes = cbor::to_cbor(&Assets(raw.clone()));
                let decoded: Assets = cbor::from_cbor(&bytes).unwrap();
                prop_assert_eq!(decoded.0, raw);
            }

            #[test]
            fn normalize_is_idempotent(raw in any_raw_assets()) {
                let mut assets = Assets(raw);
                assets.normalize();
                let once = assets.clone();
                assets.normalize();
                prop_assert_eq!(&once.0, &assets.0);

                let mut policies = BTreeSet::new();
                for (policy, tokens) in once.iter() {
                    prop_assert!(policies.insert(*policy));
                    prop_assert!(!tokens.is_empty());
                    let mut names = BTreeSet::new();
                    for (name, quantity) in tokens {
                        prop_assert!(names.insert(name.clone()));
                        prop_assert!(!quantity.is_zero());
                    }
                }
            }

            #[test]
            fn add_then_subtract_is_identity(a in any_assets(), b in any_assets()) {
                prop_assert_eq!(a.add(&b).subtract(&b), a);
            }

            #[test]
            fn cbor_roundtrip_preserves_order(a in any_assets()) {
                let bytes = cbor::to_cbor(&a);
                let decoded: Assets = cbor::from_cbor(&bytes).unwrap();
                prop_assert_eq!(&decoded.0, &a.0);
            }
        }
    }
}
