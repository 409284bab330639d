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
    Credential, Hash, PoolId, PubKeyHash, Quantity, StakeAddress, cbor, decode_coin,
    encode_quantity, size::VRF_KEY,
};
use std::fmt;

const TAG_RATIONAL_30: u64 = 30;

/// A fraction as found on-chain, e.g. a pool margin: `#6.30([numerator, denominator])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RationalNumber {
    pub numerator: u64,
    pub denominator: u64,
}

impl fmt::Display for RationalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl<C> cbor::Encode<C> for RationalNumber {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.tag(cbor::data::Tag::new(TAG_RATIONAL_30))?;
        e.array(2)?;
        e.u64(self.numerator)?;
        e.u64(self.denominator)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for RationalNumber {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::expect_tag(d, TAG_RATIONAL_30)?;
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            Ok(Self {
                numerator: d.u64()?,
                denominator: d.u64()?,
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolRelay {
    SingleHostAddr {
        port: Option<u32>,
        ipv4: Option<[u8; 4]>,
        ipv6: Option<[u8; 16]>,
    },
    SingleHostName {
        port: Option<u32>,
        dns_name: String,
    },
    MultiHostName {
        dns_name: String,
    },
}

fn encode_nullable<C, W: cbor::encode::Write, A: cbor::Encode<C>>(
    e: &mut cbor::Encoder<W>,
    value: &Option<A>,
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    match value {
        Some(value) => e.encode_with(value, ctx)?,
        None => e.null()?,
    };
    Ok(())
}

fn decode_nullable<'d, A>(
    d: &mut cbor::Decoder<'d>,
    decode: impl FnOnce(&mut cbor::Decoder<'d>) -> Result<A, cbor::decode::Error>,
) -> Result<Option<A>, cbor::decode::Error> {
    if d.datatype()? == cbor::data::Type::Null {
        d.skip()?;
        return Ok(None);
    }
    decode(d).map(Some)
}

fn decode_fixed_bytes<const N: usize>(
    d: &mut cbor::Decoder<'_>,
) -> Result<[u8; N], cbor::decode::Error> {
    let bytes = d.bytes()?;
    <[u8; N]>::try_from(bytes).map_err(|_| {
        cbor::decode::Error::message(format!(
            "expected a {N}-byte IP address, got {} bytes",
            bytes.len()
        ))
    })
}

impl<C> cbor::Encode<C> for PoolRelay {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        match self {
            Self::SingleHostAddr { port, ipv4, ipv6 } => {
                e.array(4)?;
                e.u8(0)?;
                encode_nullable(e, port, ctx)?;
                match ipv4 {
                    Some(ipv4) => e.bytes(ipv4)?,
                    None => e.null()?,
                };
                match ipv6 {
                    Some(ipv6) => e.bytes(ipv6)?,
                    None => e.null()?,
                };
            }
            Self::SingleHostName { port, dns_name } => {
                e.array(3)?;
                e.u8(1)?;
                encode_nullable(e, port, ctx)?;
                e.str(dns_name)?;
            }
            Self::MultiHostName { dns_name } => {
                e.array(2)?;
                e.u8(2)?;
                e.str(dns_name)?;
            }
        }
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for PoolRelay {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| match d.u8()? {
            0 => {
                assert_len(4)?;
                Ok(Self::SingleHostAddr {
                    port: decode_nullable(d, |d| d.u32())?,
                    ipv4: decode_nullable(d, decode_fixed_bytes::<4>)?,
                    ipv6: decode_nullable(d, decode_fixed_bytes::<16>)?,
                })
            }
            1 => {
                assert_len(3)?;
                Ok(Self::SingleHostName {
                    port: decode_nullable(d, |d| d.u32())?,
                    dns_name: d.str()?.to_string(),
                })
            }
            2 => {
                assert_len(2)?;
                Ok(Self::MultiHostName {
                    dns_name: d.str()?.to_string(),
                })
            }
            t => Err(cbor::decode::Error::message(format!(
                "unknown relay kind: expected 0, 1 or 2, got {t}"
            ))),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub url: String,
    pub hash: Hash<32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub id: PoolId,
    pub vrf: Hash<VRF_KEY>,
    pub pledge: Quantity,
    pub cost: Quantity,
    pub margin: RationalNumber,
    pub reward_account: StakeAddress,
    pub owners: Vec<PubKeyHash>,
    pub relays: Vec<PoolRelay>,
    pub metadata: Option<PoolMetadata>,
}

impl<C> cbor::Encode<C> for PoolParams {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.encode_with(self.id, ctx)?;
        e.encode_with(self.vrf, ctx)?;
        encode_quantity(e, &self.pledge)?;
        encode_quantity(e, &self.cost)?;
        e.encode_with(self.margin, ctx)?;
        e.encode_with(self.reward_account, ctx)?;
        cbor::encode_list(e, &self.owners, ctx)?;
        cbor::encode_list(e, &self.relays, ctx)?;
        match &self.metadata {
            None => {
                e.null()?;
            }
            Some(metadata) => {
                e.array(2)?;
                e.str(&metadata.url)?;
                e.encode_with(metadata.hash, ctx)?;
            }
        }
        Ok(())
    }
}

/// Pool parameters are spliced into the registration certificate, hence not wrapped in an
/// array of their own.
fn decode_pool_params<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<PoolParams, cbor::decode::Error> {
    Ok(PoolParams {
        id: d.decode_with(ctx)?,
        vrf: d.decode_with(ctx)?,
        pledge: decode_coin(d)?,
        cost: decode_coin(d)?,
        margin: d.decode_with(ctx)?,
        reward_account: d.decode_with(ctx)?,
        owners: cbor::decode_set(d, |d| d.decode_with(ctx))?,
        relays: cbor::decode_list(d, |d| d.decode_with(ctx))?,
        metadata: decode_nullable(d, |d| {
            cbor::heterogeneous_array(d, |d, assert_len| {
                assert_len(2)?;
                Ok(PoolMetadata {
                    url: d.str()?.to_string(),
                    hash: d.decode_with(ctx)?,
                })
            })
        })?,
    })
}

/// Certificates supported by the transaction model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DCert {
    Register(Credential),
    Deregister(Credential),
    Delegate(Credential, PoolId),
    RegisterPool(Box<PoolParams>),
    RetirePool(PoolId, u64),
}

impl DCert {
    /// The staking credential the certificate acts upon, if any.
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Register(credential)
            | Self::Deregister(credential)
            | Self::Delegate(credential, ..) => Some(credential),
            Self::RegisterPool(..) | Self::RetirePool(..) => None,
        }
    }

    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Register(..))
    }

    pub fn is_deregistration(&self) -> bool {
        matches!(self, Self::Deregister(..))
    }
}

impl fmt::Display for DCert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(credential) => write!(f, "Register({credential})"),
            Self::Deregister(credential) => write!(f, "Deregister({credential})"),
            Self::Delegate(credential, pool) => write!(f, "Delegate({credential}, {pool})"),
            Self::RegisterPool(params) => write!(f, "RegisterPool({})", params.id),
            Self::RetirePool(pool, epoch) => write!(f, "RetirePool({pool}, {epoch})"),
        }
    }
}

impl<C> cbor::Encode<C> for DCert {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        match self {
            Self::Register(credential) => {
                e.array(2)?;
                e.u8(0)?;
                e.encode_with(credential, ctx)?;
            }
            Self::Deregister(credential) => {
                e.array(2)?;
                e.u8(1)?;
                e.encode_with(credential, ctx)?;
            }
            Self::Delegate(credential, pool) => {
                e.array(3)?;
                e.u8(2)?;
                e.encode_with(credential, ctx)?;
                e.encode_with(pool, ctx)?;
            }
            Self::RegisterPool(params) => {
                e.array(10)?;
                e.u8(3)?;
                e.encode_with(params.as_ref(), ctx)?;
            }
            Self::RetirePool(pool, epoch) => {
                e.array(3)?;
                e.u8(4)?;
                e.encode_with(pool, ctx)?;
                e.u64(*epoch)?;
            }
        }
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for DCert {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| match d.u8()? {
            0 => {
                assert_len(2)?;
                Ok(Self::Register(d.decode_with(ctx)?))
            }
            1 => {
                assert_len(2)?;
                Ok(Self::Deregister(d.decode_with(ctx)?))
            }
            2 => {
                assert_len(3)?;
                Ok(Self::Delegate(d.decode_with(ctx)?, d.decode_with(ctx)?))
            }
            3 => {
                assert_len(10)?;
                Ok(Self::RegisterPool(Box::new(decode_pool_params(d, ctx)?)))
            }
            4 => {
                assert_len(3)?;
                Ok(Self::RetirePool(d.decode_with(ctx)?, d.u64()?))
            }
            t => Err(cbor::decode::Error::message(format!(
                "unsupported certificate kind {t}: expected one of 0..=4"
            ))),
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::{any_credential, any_hash28, any_hash32, any_stake_address};
    use num::BigInt;
    use proptest::{collection::vec, option, prelude::*, prop_compose};

    fn any_relay() -> impl Strategy<Value = PoolRelay> {
        prop_oneof![
            (
                option::of(any::<u32>()),
                option::of(any::<[u8; 4]>()),
                option::of(any::<[u8; 16]>())
            )
                .prop_map(|(port, ipv4, ipv6)| PoolRelay::SingleHostAddr { port, ipv4, ipv6 }),
            (option::of(any::<u32>()), "[a-z]{1,12}\\.io")
                .prop_map(|(port, dns_name)| PoolRelay::SingleHostName { port, dns_name }),
            "[a-z]{1,12}\\.io".prop_map(|dns_name| PoolRelay::MultiHostName { dns_name }),
        ]
    }

    prop_compose! {
        pub fn any_pool_params()(
            id in any_hash28(),
            vrf in any_hash32(),
            pledge in any::<u64>(),
            cost in any::<u64>(),
            numerator in 0_u64..100,
            reward_account in any_stake_address(),
            owners in vec(any_hash28(), 0..3),
            relays in vec(any_relay(), 0..3),
            metadata in option::of(("https://[a-z]{1,12}\\.io", any_hash32())),
        ) -> PoolParams {
            PoolParams {
                id,
                vrf,
                pledge: BigInt::from(pledge),
                cost: BigInt::from(cost),
                margin: RationalNumber { numerator, denominator: 100 },
                reward_account,
                owners,
                relays,
                metadata: metadata.map(|(url, hash)| PoolMetadata { url, hash }),
            }
        }
    }

    pub fn any_certificate() -> impl Strategy<Value = DCert> {
        prop_oneof![
            any_credential().prop_map(DCert::Register),
            any_credential().prop_map(DCert::Deregister),
            (any_credential(), any_hash28())
                .prop_map(|(credential, pool)| DCert::Delegate(credential, pool)),
            any_pool_params().prop_map(|params| DCert::RegisterPool(Box::new(params))),
            (any_hash28(), any::<u64>()).prop_map(|(pool, epoch)| DCert::RetirePool(pool, epoch)),
        ]
    }

}
