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
    DatumHash, PlutusData, PubKeyHash, Redeemer, RedeemersFormat, Script, ScriptHash, Signature,
    cbor, decode_native_script, decode_redeemers, encode_raw, encode_redeemers,
};

/// Everything that authorises a transaction but isn't covered by its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxWitnesses {
    pub signatures: Vec<Signature>,
    pub native_scripts: Vec<Script>,
    pub v1_scripts: Vec<Script>,
    pub v2_scripts: Vec<Script>,
    pub datums: Vec<PlutusData>,
    pub redeemers: Vec<Redeemer>,
    pub redeemers_format: RedeemersFormat,
    /// Scripts carried by the outputs of reference inputs. Never serialised; filled when the
    /// transaction is recovered.
    pub ref_scripts: Vec<Script>,
}

impl TxWitnesses {
    /// File a script under the bucket of its language.
    pub fn add_script(&mut self, script: Script) {
        match script {
            Script::Native(..) => self.native_scripts.push(script),
            Script::PlutusV1(..) => self.v1_scripts.push(script),
            Script::PlutusV2(..) => self.v2_scripts.push(script),
        }
    }

    /// Scripts attached to the transaction itself, reference scripts excluded.
    pub fn attached_scripts(&self) -> impl Iterator<Item = &Script> {
        self.native_scripts
            .iter()
            .chain(self.v1_scripts.iter())
            .chain(self.v2_scripts.iter())
    }

    /// Every script available to the transaction, reference scripts included.
    pub fn all_scripts(&self) -> impl Iterator<Item = &Script> {
        self.attached_scripts().chain(self.ref_scripts.iter())
    }

    pub fn find_script(&self, hash: &ScriptHash) -> Option<&Script> {
        self.all_scripts().find(|script| &script.hash() == hash)
    }

    pub fn find_datum(&self, hash: &DatumHash) -> Option<&PlutusData> {
        self.datums.iter().find(|datum| &datum.hash() == hash)
    }

    pub fn signers(&self) -> impl Iterator<Item = PubKeyHash> + '_ {
        self.signatures.iter().map(Signature::pub_key_hash)
    }

    pub fn has_signature_from(&self, signer: &PubKeyHash) -> bool {
        self.signers().any(|key| &key == signer)
    }
}

impl<C> cbor::Encode<C> for TxWitnesses {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        let fields = [
            !self.signatures.is_empty(),
            !self.native_scripts.is_empty(),
            !self.v1_scripts.is_empty(),
            !self.datums.is_empty(),
            !self.redeemers.is_empty(),
            !self.v2_scripts.is_empty(),
        ];
        e.map(fields.iter().filter(|present| **present).count() as u64)?;

        if !self.signatures.is_empty() {
            e.u8(0)?;
            cbor::encode_list(e, &self.signatures, ctx)?;
        }

        if !self.native_scripts.is_empty() {
            e.u8(1)?;
            e.array(self.native_scripts.len() as u64)?;
            for script in &self.native_scripts {
                encode_raw(e, script.bytes())?;
            }
        }

        if !self.v1_scripts.is_empty() {
            e.u8(3)?;
            encode_plutus_scripts(e, &self.v1_scripts)?;
        }

        if !self.datums.is_empty() {
            e.u8(4)?;
            cbor::encode_indefinite_list(e, &self.datums, ctx)?;
        }

        if !self.redeemers.is_empty() {
            e.u8(5)?;
            encode_redeemers(e, &self.redeemers, self.redeemers_format, ctx)?;
        }

        if !self.v2_scripts.is_empty() {
            e.u8(6)?;
            encode_plutus_scripts(e, &self.v2_scripts)?;
        }

        Ok(())
    }
}

fn encode_plutus_scripts<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    scripts: &[Script],
) -> Result<(), cbor::encode::Error<W::Error>> {
    e.array(scripts.len() as u64)?;
    for script in scripts {
        e.bytes(script.bytes())?;
    }
    Ok(())
}

impl<'d, C> cbor::Decode<'d, C> for TxWitnesses {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        let (signatures, native_scripts, v1_scripts, datums, redeemers, v2_scripts) =
            cbor::heterogeneous_map(
                d,
                (None, None, None, None, None, None),
                |d| d.u8(),
                |d, state, field| {
                    match field {
                        0 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.0,
                            field,
                            cbor::decode_set(d, |d| d.decode_with(ctx))?,
                        )?,
                        1 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.1,
                            field,
                            cbor::decode_set(d, decode_native_script)?,
                        )?,
                        3 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.2,
                            field,
                            cbor::decode_set(d, |d| Ok(Script::PlutusV1(d.bytes()?.to_vec())))?,
                        )?,
                        4 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.3,
                            field,
                            cbor::decode_set(d, |d| d.decode_with(ctx))?,
                        )?,
                        5 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.4,
                            field,
                            decode_redeemers(d, ctx)?,
                        )?,
                        6 => cbor::unique_field::<TxWitnesses, _>(
                            &mut state.5,
                            field,
                            cbor::decode_set(d, |d| Ok(Script::PlutusV2(d.bytes()?.to_vec())))?,
                        )?,
                        _ => return cbor::unexpected_field::<TxWitnesses, _>(field),
                    }
                    Ok(())
                },
            )?;

        let (redeemers, redeemers_format) = redeemers.unwrap_or_default();

        Ok(TxWitnesses {
            signatures: signatures.unwrap_or_default(),
            native_scripts: native_scripts.unwrap_or_default(),
            v1_scripts: v1_scripts.unwrap_or_default(),
            v2_scripts: v2_scripts.unwrap_or_default(),
            datums: datums.unwrap_or_default(),
            redeemers,
            redeemers_format,
            ref_scripts: Vec::new(),
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::{any_native_script, any_plutus_data, any_redeemer, any_signature};
    use proptest::{collection::vec, prelude::*, prop_compose};

    prop_compose! {
        pub fn any_witnesses()(
            signatures in vec(any_signature(), 0..3),
            native_scripts in vec(any_native_script(), 0..2),
            v1_scripts in vec(vec(any::<u8>(), 1..32).prop_map(Script::PlutusV1), 0..2),
            v2_scripts in vec(vec(any::<u8>(), 1..32).prop_map(Script::PlutusV2), 0..2),
            datums in vec(any_plutus_data(), 0..3),
            redeemers in vec(any_redeemer(), 0..3),
        ) -> TxWitnesses {
            TxWitnesses {
                signatures,
                native_scripts,
                v1_scripts,
                v2_scripts,
                datums,
                redeemers,
                redeemers_format: RedeemersFormat::List,
                ref_scripts: Vec::new(),
            }
        }
    }

}
