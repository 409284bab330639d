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
    Address, Quantity, Script, TxOutputDatum, Value, cbor, decode_reference_script,
    encode_reference_script,
};
use num::BigInt;
use tracing::trace;

/// Fixed overhead accounted for every output when computing its minimum deposit, standing for
/// the output's entry in the UTxO set.
pub const MIN_DEPOSIT_OVERHEAD: u64 = 160;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    /// Whether the output serialises as the pre-Babbage array, rather than as a map.
    is_legacy: bool,
    pub address: Address,
    pub value: Value,
    pub datum: Option<TxOutputDatum>,
    pub script: Option<Script>,
}

impl TxOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            is_legacy: true,
            address,
            value,
            datum: None,
            script: None,
        }
    }

    pub fn with_datum(mut self, datum: TxOutputDatum) -> Self {
        self.is_legacy = self.is_legacy && !datum.is_inline();
        self.datum = Some(datum);
        self
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.is_legacy = false;
        self.script = Some(script);
        self
    }

    /// Force the map serialisation, even when the array would do.
    pub fn into_post_alonzo(mut self) -> Self {
        self.is_legacy = false;
        self
    }

    /// Legacy outputs can't carry inline datums nor scripts; those always fall back to the map
    /// form, regardless of how the output was first built.
    pub fn is_legacy(&self) -> bool {
        self.is_legacy
            && self.script.is_none()
            && !self.datum.as_ref().is_some_and(TxOutputDatum::is_inline)
    }

    pub fn lovelace(&self) -> &Quantity {
        self.value.lovelace()
    }

    pub fn size(&self) -> usize {
        cbor::to_cbor(self).len()
    }

    /// Lovelace the output must hold at least, proportional to its serialised size.
    pub fn min_deposit(&self, utxo_cost_per_byte: u64) -> Quantity {
        BigInt::from(MIN_DEPOSIT_OVERHEAD + self.size() as u64) * BigInt::from(utxo_cost_per_byte)
    }

    /// Raise the lovelace held by the output to its minimum deposit.
    ///
    /// Raising the lovelace may widen its encoding, which in turn raises the deposit; hence the
    /// loop, which stops once the deposit no longer moves.
    pub fn correct_lovelace(&mut self, utxo_cost_per_byte: u64) {
        loop {
            let min_deposit = self.min_deposit(utxo_cost_per_byte);
            if self.lovelace() >= &min_deposit {
                return;
            }
            trace!(from = %self.lovelace(), to = %min_deposit, "raising output lovelace");
            self.value = self
                .value
                .clone()
                .into_builder()
                .set_lovelace(min_deposit)
                .build();
        }
    }
}

impl<C> cbor::Encode<C> for TxOutput {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        if self.is_legacy() {
            e.array(if self.datum.is_some() { 3 } else { 2 })?;
            e.encode_with(&self.address, ctx)?;
            e.encode_with(&self.value, ctx)?;
            if let Some(datum) = &self.datum {
                e.bytes(datum.hash().as_ref())?;
            }
            return Ok(());
        }

        e.map(2 + u64::from(self.datum.is_some()) + u64::from(self.script.is_some()))?;

        e.u8(0)?;
        e.encode_with(&self.address, ctx)?;

        e.u8(1)?;
        e.encode_with(&self.value, ctx)?;

        if let Some(datum) = &self.datum {
            e.u8(2)?;
            e.encode_with(datum, ctx)?;
        }

        if let Some(script) = &self.script {
            e.u8(3)?;
            encode_reference_script(e, script)?;
        }

        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for TxOutput {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        use cbor::data::Type;

        let data_type = d.datatype()?;

        if matches!(data_type, Type::MapIndef | Type::Map) {
            decode_post_alonzo_output(d, ctx)
        } else if matches!(data_type, Type::ArrayIndef | Type::Array) {
            decode_legacy_output(d, ctx)
        } else {
            Err(cbor::decode::Error::type_mismatch(data_type))
        }
    }
}

fn decode_legacy_output<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<TxOutput, cbor::decode::Error> {
    let len = d.array()?;

    let address = d.decode_with(ctx)?;
    let value = d.decode_with(ctx)?;

    let datum = match len {
        Some(2) => None,
        Some(3) => Some(TxOutputDatum::Hash(d.decode_with(ctx)?)),
        Some(len) => {
            return Err(cbor::decode::Error::message(format!(
                "expected legacy transaction output array length of 2 or 3, got {len}",
            )));
        }
        None => {
            if cbor::decode_break(d, len)? {
                None
            } else {
                let datum = TxOutputDatum::Hash(d.decode_with(ctx)?);
                if !cbor::decode_break(d, len)? {
                    return Err(cbor::decode::Error::message(
                        "expected break after legacy transaction output datum",
                    ));
                }
                Some(datum)
            }
        }
    };

    Ok(TxOutput {
        is_legacy: true,
        address,
        value,
        datum,
        script: None,
    })
}

fn decode_post_alonzo_output<C>(
    d: &mut cbor::Decoder<'_>,
    ctx: &mut C,
) -> Result<TxOutput, cbor::decode::Error> {
    let (address, value, datum, script) = cbor::heterogeneous_map(
        d,
        (None, None, None, None),
        |d| d.u8(),
        |d, state, field| {
            match field {
                0 => cbor::unique_field::<TxOutput, _>(&mut state.0, field, d.decode_with(ctx)?)?,
                1 => cbor::unique_field::<TxOutput, _>(&mut state.1, field, d.decode_with(ctx)?)?,
                2 => cbor::unique_field::<TxOutput, _>(&mut state.2, field, d.decode_with(ctx)?)?,
                3 => {
                    cbor::unique_field::<TxOutput, _>(&mut state.3, field, decode_reference_script(d)?)?
                }
                _ => return cbor::unexpected_field::<TxOutput, _>(field),
            }
            Ok(())
        },
    )?;

    Ok(TxOutput {
        is_legacy: false,
        address: address.ok_or_else(|| cbor::missing_field::<TxOutput, Address>(0))?,
        value: value.ok_or_else(|| cbor::missing_field::<TxOutput, Value>(1))?,
        datum,
        script,
    })
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::{any_address, any_datum, any_hash32, any_script, any_value};
    use proptest::{option, prelude::*};

    pub fn any_legacy_output() -> impl Strategy<Value = TxOutput> {
        (any_address(), any_value(), option::of(any_hash32())).prop_map(
            |(address, value, datum_hash)| {
                let output = TxOutput::new(address, value);
                match datum_hash {
                    None => output,
                    Some(hash) => output.with_datum(TxOutputDatum::Hash(hash)),
                }
            },
        )
    }

    pub fn any_post_alonzo_output() -> impl Strategy<Value = TxOutput> {
        (
            any_address(),
            any_value(),
            option::of(any_datum()),
            option::of(any_script()),
        )
            .prop_map(|(address, value, datum, script)| TxOutput {
                is_legacy: false,
                address,
                value,
                datum,
                script,
            })
    }

    pub fn any_tx_output() -> impl Strategy<Value = TxOutput> {
        prop_oneof![any_legacy_output(), any_post_alonzo_output()]
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::{Credential, NULL_HASH28, PlutusData, prop_cbor_roundtrip};

        prop_cbor_roundtrip!(TxOutput, any_tx_output());

        fn address() -> Address {
            Address::from_hashes(false, Credential::Key(NULL_HASH28), None)
        }

        #[test]
        fn fresh_output_is_legacy() {
            let output = TxOutput::new(address(), Value::from_lovelace(1_000_000));
            let bytes = cbor::to_cbor(&output);
            assert_eq!(bytes[0], 0x82);
        }

        #[test]
        fn inline_datum_forces_map() {
            let output = TxOutput::new(address(), Value::from_lovelace(1_000_000))
                .with_datum(TxOutputDatum::Inline(PlutusData::unit()));
            assert!(!output.is_legacy());
            assert_eq!(cbor::to_cbor(&output)[0], 0xa3);
        }

        #[test]
        fn correct_lovelace_reaches_fixed_point() {
            let mut output = TxOutput::new(address(), Value::from_lovelace(0));
            output.correct_lovelace(4310);
            let deposit = output.min_deposit(4310);
            assert_eq!(output.lovelace(), &deposit);
            assert!(deposit > BigInt::from(0));
        }

        #[test]
        fn correct_lovelace_leaves_sufficient_outputs_alone() {
            let mut output = TxOutput::new(address(), Value::from_lovelace(10_000_000));
            output.correct_lovelace(4310);
            assert_eq!(output.lovelace(), &BigInt::from(10_000_000));
        }

        proptest! {
            #[test]
            fn decoded_format_is_preserved(output in any_tx_output()) {
                let decoded: TxOutput = cbor::from_cbor(&cbor::to_cbor(&output)).unwrap();
                prop_assert_eq!(decoded.is_legacy(), output.is_legacy());
            }
        }
    }
}
