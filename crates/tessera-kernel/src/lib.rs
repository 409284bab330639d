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

pub mod cardano;
pub use cardano::{
    address::{Address, BASE_ADDRESS_LENGTH, ENTERPRISE_ADDRESS_LENGTH, InvalidAddress},
    assets::{
        AssetClass, AssetName, Assets, CurrencySymbol, MAX_ASSET_NAME_LENGTH, Tokens, UnsortedAssets,
    },
    auxiliary_data::AuxiliaryData,
    certificate::{DCert, PoolMetadata, PoolParams, PoolRelay, RationalNumber},
    credential::Credential,
    datum::TxOutputDatum,
    ex_units::ExUnits,
    hash::{
        AuxiliaryDataHash, DatumHash, Hash, HashRole, Hasher, InvalidHash, NULL_HASH28,
        NULL_HASH32, PolicyId, PoolId, PubKeyHash, ScriptDataHash, ScriptHash, TransactionId,
        blake2b_224, blake2b_256, hash_from_slice, size,
    },
    metadatum::{Metadatum, decode_metadata, encode_metadata},
    network_params::{CostModels, ExUnitPrices, NetworkParams},
    plutus_data::{PlutusData, constr_tag},
    quantity::{Quantity, decode_coin, decode_quantity, encode_quantity},
    redeemer::{Redeemer, RedeemerTag, RedeemersFormat, decode_redeemers, encode_redeemers},
    script::{
        Language, Script, decode_native_script, decode_reference_script, encode_raw,
        encode_reference_script,
    },
    signature::{InvalidSignature, PUBLIC_KEY_SIZE, SIGNATURE_SIZE, Signature},
    slot::{Slot, SlotConfig, TimeMs},
    stake_address::{STAKE_ADDRESS_LENGTH, StakeAddress},
    transaction_body::TxBody,
    tx_input::{FullTxInput, Resolution, TxInput, UnresolvedInput},
    tx_output::{MIN_DEPOSIT_OVERHEAD, TxOutput},
    tx_output_id::{InvalidTxOutputId, TxOutputId},
    value::{Value, ValueBuilder},
    witness_set::TxWitnesses,
};
#[cfg(any(test, feature = "test-utils"))]
pub use cardano::{
    address::any_address,
    assets::{any_asset_name, any_assets, any_raw_assets},
    certificate::{any_certificate, any_pool_params},
    credential::any_credential,
    datum::any_datum,
    hash::{any_hash28, any_hash32},
    metadatum::any_metadatum,
    plutus_data::any_plutus_data,
    redeemer::{any_redeemer, any_redeemer_tag},
    script::{any_native_script, any_script},
    signature::any_signature,
    stake_address::any_stake_address,
    transaction_body::any_tx_body,
    tx_input::{any_resolved_input, any_unresolved_input},
    tx_output::{any_legacy_output, any_post_alonzo_output, any_tx_output},
    tx_output_id::any_tx_output_id,
    value::any_value,
    witness_set::any_witnesses,
};

pub mod cbor {
    pub use minicbor::{
        Decode, Decoder, Encode, Encoder,
        data::{self, Tag, Type},
        decode, encode,
    };
    pub use tessera_minicbor_extra::{
        BYTES_CHUNK_SIZE, TAG_EMBEDDED_CBOR_24, TAG_MAP_259, TAG_SET_258, allow_tag, decode_break,
        decode_chunked_bytes, decode_list, decode_set, encode_chunked_bytes,
        encode_indefinite_list, encode_list, expect_tag, from_cbor, from_cbor_no_leftovers,
        heterogeneous_array, heterogeneous_map, missing_field, tee, to_cbor, unexpected_field,
        unique_field,
    };
}
pub use cbor::{from_cbor, from_cbor_no_leftovers, to_cbor};

pub use serde_json as json;

pub mod macros;

mod traits;
pub use traits::{EvalOutcome, ScriptMachine, UnknownOutput, UtxoLookup};

pub mod utils;
