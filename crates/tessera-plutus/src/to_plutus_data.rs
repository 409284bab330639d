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

use crate::constr;
use num::{BigInt, Zero};
use std::collections::BTreeMap;
use tessera_kernel::{
    Address, AssetName, Credential, CurrencySymbol, DCert, Hash, PlutusData, Redeemer,
    StakeAddress, TxOutputId, Value,
};

/// Serializing a type to PlutusData, which can then be serialised to CBOR.
pub trait ToPlutusData<const VERSION: u8> {
    fn to_plutus_data(&self) -> PlutusData;
}

pub struct PlutusVersion<const V: u8>;

/// A trait to restrict generic parameter `V` on `ToPlutusData` instances, to version we know
/// about.
pub trait IsKnownPlutusVersion {}
impl IsKnownPlutusVersion for PlutusVersion<1> {}
impl IsKnownPlutusVersion for PlutusVersion<2> {}

// ------------------------------------------------------------------------------------ Primitives

impl<const V: u8> ToPlutusData<V> for bool
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            false => constr!(0),
            true => constr!(1),
        }
    }
}

impl<const V: u8> ToPlutusData<V> for u32
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl<const V: u8> ToPlutusData<V> for u64
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl<const V: u8> ToPlutusData<V> for usize
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl<const V: u8> ToPlutusData<V> for i64
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::integer(*self)
    }
}

impl<const V: u8> ToPlutusData<V> for BigInt
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Integer(self.clone())
    }
}

impl<const BYTES: usize, const V: u8> ToPlutusData<V> for Hash<BYTES>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self)
    }
}

impl<const V: u8> ToPlutusData<V> for PlutusData
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        self.clone()
    }
}

impl<const V: u8> ToPlutusData<V> for Redeemer
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        self.data.clone()
    }
}

// ----------------------------------------------------------------------------------- Collections

impl<const V: u8, T> ToPlutusData<V> for &T
where
    PlutusVersion<V>: IsKnownPlutusVersion,
    T: ToPlutusData<V>,
{
    fn to_plutus_data(&self) -> PlutusData {
        T::to_plutus_data(*self)
    }
}

/// `Maybe`: `Just` is the first constructor, `Nothing` the second.
impl<A, const V: u8> ToPlutusData<V> for Option<A>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
    A: ToPlutusData<V>,
{
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Some(data) => constr!(v: V, 0, [data]),
            None => constr!(1),
        }
    }
}

impl<const V: u8, T> ToPlutusData<V> for Vec<T>
where
    PlutusVersion<V>: IsKnownPlutusVersion,
    T: ToPlutusData<V>,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::List(self.iter().map(|a| a.to_plutus_data()).collect())
    }
}

impl<const VER: u8, K, V> ToPlutusData<VER> for BTreeMap<K, V>
where
    PlutusVersion<VER>: IsKnownPlutusVersion,
    K: ToPlutusData<VER> + Ord,
    V: ToPlutusData<VER>,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::Map(
            self.iter()
                .map(|(k, v)| (k.to_plutus_data(), v.to_plutus_data()))
                .collect(),
        )
    }
}

impl<const VER: u8, K, V> ToPlutusData<VER> for (K, V)
where
    PlutusVersion<VER>: IsKnownPlutusVersion,
    K: ToPlutusData<VER>,
    V: ToPlutusData<VER>,
{
    fn to_plutus_data(&self) -> PlutusData {
        constr!(v: VER, 0, [self.0, self.1])
    }
}

// ---------------------------------------------------------------------------------------- Ledger

impl<const V: u8> ToPlutusData<V> for Credential
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            Credential::Key(hash) => constr!(v: V, 0, [hash]),
            Credential::Script(hash) => constr!(v: V, 1, [hash]),
        }
    }
}

/// A stake address is seen by scripts as a `StakingCredential`; only the `StakingHash` variant
/// exists for reward accounts.
impl<const V: u8> ToPlutusData<V> for StakeAddress
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        constr!(v: V, 0, [self.credential()])
    }
}

impl<const V: u8> ToPlutusData<V> for Address
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        let staking_credential = self
            .staking_credential()
            .map(|credential| constr!(v: V, 0, [credential]));
        constr!(v: V, 0, [self.spending_credential(), staking_credential])
    }
}

impl<const V: u8> ToPlutusData<V> for TxOutputId
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        constr!(v: V, 0, [constr!(v: V, 0, [self.transaction_id]), self.index])
    }
}

impl<const V: u8> ToPlutusData<V> for AssetName
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self.as_slice())
    }
}

impl<const V: u8> ToPlutusData<V> for CurrencySymbol
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::bytes(self.as_bytes())
    }
}

/// Outside of a script context, the base currency only shows when there is some.
impl<const V: u8> ToPlutusData<V> for Value
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        let lovelace = self.lovelace();
        project_value::<V>(
            (!lovelace.is_zero()).then_some(lovelace),
            self.assets(),
        )
    }
}

/// Nested maps, from currency symbol to token names to quantities, in canonical order, with an
/// optional base-currency entry heading them.
pub(crate) fn project_value<const V: u8>(
    lovelace: Option<&BigInt>,
    assets: &tessera_kernel::Assets,
) -> PlutusData
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    let mut entries = BTreeMap::new();

    if let Some(lovelace) = lovelace {
        entries.insert(
            CurrencySymbol::Lovelace,
            BTreeMap::from([(AssetName::default(), lovelace.clone())]),
        );
    }

    for (policy, tokens) in assets.to_btree() {
        entries.insert(CurrencySymbol::Native(policy), tokens);
    }

    <BTreeMap<_, _> as ToPlutusData<V>>::to_plutus_data(&entries)
}

/// Certificates, as seen by V1 and V2 scripts. Pool registrations only expose the pool id and its
/// VRF key hash.
impl<const V: u8> ToPlutusData<V> for DCert
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    fn to_plutus_data(&self) -> PlutusData {
        match self {
            DCert::Register(credential) => constr!(v: V, 0, [staking_hash::<V>(credential)]),
            DCert::Deregister(credential) => constr!(v: V, 1, [staking_hash::<V>(credential)]),
            DCert::Delegate(credential, pool) => {
                constr!(v: V, 2, [staking_hash::<V>(credential), pool])
            }
            DCert::RegisterPool(params) => constr!(v: V, 3, [params.id, params.vrf]),
            DCert::RetirePool(pool, epoch) => constr!(v: V, 4, [pool, epoch]),
        }
    }
}

pub(crate) fn staking_hash<const V: u8>(credential: &Credential) -> PlutusData
where
    PlutusVersion<V>: IsKnownPlutusVersion,
{
    constr!(v: V, 0, [credential])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_kernel::{Assets, NULL_HASH28, Quantity, any_value, to_cbor};
    use proptest::test_runner::TestCaseError;
    use test_case::test_case;

    fn v2<T: ToPlutusData<2>>(value: &T) -> PlutusData {
        value.to_plutus_data()
    }

    #[test]
    fn maybe_follows_plutus_tx() {
        pretty_assertions::assert_eq!(
            v2(&Some(42_u64)),
            PlutusData::constr(0, vec![PlutusData::integer(42)])
        );
        pretty_assertions::assert_eq!(v2(&None::<u64>), PlutusData::constr(1, vec![]));
    }

    #[test]
    fn enterprise_address() {
        let address = Address::from_hashes(false, Credential::Key(NULL_HASH28), None);
        pretty_assertions::assert_eq!(
            hex::encode(to_cbor(&v2(&address))),
            format!("d8799fd8799f581c{}ffd87a80ff", "00".repeat(28))
        );
    }

    #[test]
    fn base_address_carries_a_staking_hash() {
        let stake = Hash::new([1; 28]);
        let address = Address::from_hashes(
            true,
            Credential::Key(NULL_HASH28),
            Some(Credential::Script(stake)),
        );
        pretty_assertions::assert_eq!(
            v2(&address),
            PlutusData::constr(
                0,
                vec![
                    PlutusData::constr(0, vec![PlutusData::bytes(NULL_HASH28)]),
                    PlutusData::constr(
                        0,
                        vec![PlutusData::constr(
                            0,
                            vec![PlutusData::constr(1, vec![PlutusData::bytes(stake)])]
                        )]
                    ),
                ]
            )
        );
    }

    #[test]
    fn output_reference_wraps_the_transaction_id() {
        let output_id = TxOutputId::new(Hash::new([2; 32]), 3);
        pretty_assertions::assert_eq!(
            v2(&output_id),
            PlutusData::constr(
                0,
                vec![
                    PlutusData::constr(0, vec![PlutusData::bytes([2; 32])]),
                    PlutusData::integer(3)
                ]
            )
        );
    }

    #[test_case(0 => 0; "no base currency")]
    #[test_case(5 => 1; "with base currency")]
    fn standalone_value_hides_zero_lovelace(lovelace: u64) -> usize {
        match v2(&Value::from_lovelace(lovelace)) {
            PlutusData::Map(entries) => entries.len(),
            other => panic!("unexpected projection {other:?}"),
        }
    }

    #[test]
    fn value_entries_are_sorted() {
        let assets = Assets::new([
            (Hash::new([9; 28]), vec![(AssetName::from("b"), Quantity::from(1))]),
            (
                Hash::new([1; 28]),
                vec![
                    (AssetName::from("z"), Quantity::from(1)),
                    (AssetName::from("a"), Quantity::from(2)),
                ],
            ),
        ]);
        let keys = match project_value::<2>(Some(&Quantity::from(0)), &assets) {
            PlutusData::Map(entries) => entries.into_iter().map(|(k, _)| k).collect::<Vec<_>>(),
            other => panic!("unexpected projection {other:?}"),
        };
        pretty_assertions::assert_eq!(
            keys,
            vec![
                PlutusData::bytes([]),
                PlutusData::bytes([1; 28]),
                PlutusData::bytes([9; 28]),
            ]
        );
    }

    proptest! {
        #[test]
        fn projected_currencies_are_strictly_ascending(value in any_value()) {
            let PlutusData::Map(entries) = v2(&value) else {
                return Err(TestCaseError::fail("value isn't projected as a map"));
            };
            let keys = entries
                .into_iter()
                .map(|(k, _)| match k {
                    PlutusData::Bytes(bytes) => bytes,
                    other => panic!("unexpected currency symbol {other:?}"),
                })
                .collect::<Vec<_>>();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
