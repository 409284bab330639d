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
use std::fmt::Display;

/// Tag marking a mathematical set (used by the ledger for inputs, signers, certificates, ...).
pub const TAG_SET_258: u64 = 258;

/// Tag marking the post-Alonzo auxiliary data map.
pub const TAG_MAP_259: u64 = 259;

/// Tag wrapping an embedded CBOR item, used for reference scripts.
pub const TAG_EMBEDDED_CBOR_24: u64 = 24;

// Misc
// ----------------------------------------------------------------------------

pub fn decode_break<'d>(
    d: &mut cbor::Decoder<'d>,
    len: Option<u64>,
) -> Result<bool, cbor::decode::Error> {
    if d.datatype()? == cbor::data::Type::Break {
        // NOTE: a break inside a definite collection is never legit.
        if len.is_some() {
            return Err(cbor::decode::Error::type_mismatch(cbor::data::Type::Break));
        }

        d.skip()?;

        return Ok(true);
    }

    Ok(false)
}

/// Decode a chunk, but retain a reference to the decoded bytes.
pub fn tee<'d, A>(
    d: &mut cbor::Decoder<'d>,
    decoder: impl FnOnce(&mut cbor::Decoder<'d>) -> Result<A, cbor::decode::Error>,
) -> Result<(A, &'d [u8]), cbor::decode::Error> {
    let original_bytes = d.input();
    let start = d.position();
    let a = decoder(d)?;
    let end = d.position();
    Ok((a, &original_bytes[start..end]))
}

/// Consume the given tag if it is the next element; leave the decoder untouched otherwise.
pub fn allow_tag(d: &mut cbor::Decoder<'_>, expected: u64) -> Result<bool, cbor::decode::Error> {
    if d.datatype()? != cbor::data::Type::Tag {
        return Ok(false);
    }

    if d.probe().tag()?.as_u64() != expected {
        return Ok(false);
    }

    d.tag()?;

    Ok(true)
}

/// Consume the given tag, failing with a comprehensible message when anything else shows up.
pub fn expect_tag(d: &mut cbor::Decoder<'_>, expected: u64) -> Result<(), cbor::decode::Error> {
    let tag = d.tag()?.as_u64();
    if tag != expected {
        return Err(cbor::decode::Error::message(format!(
            "unexpected CBOR tag: expected {expected} got {tag}"
        )));
    }
    Ok(())
}

/// Decode a byte string, irrespective of whether it comes in one piece or as an indefinite
/// sequence of chunks.
pub fn decode_chunked_bytes(d: &mut cbor::Decoder<'_>) -> Result<Vec<u8>, cbor::decode::Error> {
    if d.datatype()? == cbor::data::Type::BytesIndef {
        let mut bytes = Vec::new();
        for chunk in d.bytes_iter()? {
            bytes.extend_from_slice(chunk?);
        }
        return Ok(bytes);
    }

    Ok(d.bytes()?.to_vec())
}

// Array
// ----------------------------------------------------------------------------

/// Decode any heterogeneous CBOR array, irrespective of whether they're indefinite or definite.
pub fn heterogeneous_array<'d, A>(
    d: &mut cbor::Decoder<'d>,
    elems: impl FnOnce(
        &mut cbor::Decoder<'d>,
        &dyn Fn(u64) -> Result<(), cbor::decode::Error>,
    ) -> Result<A, cbor::decode::Error>,
) -> Result<A, cbor::decode::Error> {
    let len = d.array()?;

    match len {
        None => {
            let result = elems(d, &|_| Ok(()))?;
            if !decode_break(d, len)? {
                return Err(cbor::decode::Error::message(
                    "CBOR indefinite array has more elements than expected",
                ));
            }
            Ok(result)
        }
        Some(len) => elems(
            d,
            &(move |expected_len| {
                if len != expected_len {
                    return Err(cbor::decode::Error::message(format!(
                        "CBOR array length mismatch: expected {} got {}",
                        expected_len, len
                    )));
                }

                Ok(())
            }),
        ),
    }
}

/// Decode a homogeneous CBOR array, irrespective of whether it is indefinite or definite.
pub fn decode_list<'d, A>(
    d: &mut cbor::Decoder<'d>,
    mut elem: impl FnMut(&mut cbor::Decoder<'d>) -> Result<A, cbor::decode::Error>,
) -> Result<Vec<A>, cbor::decode::Error> {
    let len = d.array()?;

    let mut elems = Vec::with_capacity(len.unwrap_or_default().min(1024) as usize);

    let mut n = 0;
    while len.is_none() || Some(n) < len {
        if decode_break(d, len)? {
            break;
        }

        elems.push(elem(d)?);

        n += 1;
    }

    Ok(elems)
}

/// Decode a set, which the ledger accepts either as a plain array or as an array preceded by tag
/// 258. Duplicates are left for the caller to judge.
pub fn decode_set<'d, A>(
    d: &mut cbor::Decoder<'d>,
    elem: impl FnMut(&mut cbor::Decoder<'d>) -> Result<A, cbor::decode::Error>,
) -> Result<Vec<A>, cbor::decode::Error> {
    allow_tag(d, TAG_SET_258)?;
    decode_list(d, elem)
}

// Map
// ----------------------------------------------------------------------------

/// Decode any heterogeneous CBOR map, irrespective of whether they're indefinite or definite.
///
/// A good choice for `S` is generally to pick a tuple of `Option` for each field item
/// that needs decoding. For example:
///
/// ```rs
/// let (address, value) = heterogeneous_map(
///     d,
///     (None, None),
///     |d| d.u8(),
///     |d, state, field| {
///         match field {
///             0 => state.0 = Some(d.decode()?),
///             1 => state.1 = Some(d.decode()?),
///             _ => return unexpected_field::<TxOutput, _>(field),
///         }
///         Ok(())
///     },
/// )?;
/// ```
pub fn heterogeneous_map<K, S>(
    d: &mut cbor::Decoder<'_>,
    mut state: S,
    decode_key: impl Fn(&mut cbor::Decoder<'_>) -> Result<K, cbor::decode::Error>,
    mut decode_value: impl FnMut(&mut cbor::Decoder<'_>, &mut S, K) -> Result<(), cbor::decode::Error>,
) -> Result<S, cbor::decode::Error> {
    let len = d.map()?;

    let mut n = 0;
    while len.is_none() || Some(n) < len {
        if decode_break(d, len)? {
            break;
        }

        let k = decode_key(d)?;
        decode_value(d, &mut state, k)?;

        n += 1;
    }

    Ok(state)
}

/// Assign a map field, refusing to silently overwrite a field seen earlier in the same map.
pub fn unique_field<C: ?Sized, A>(
    slot: &mut Option<A>,
    field_tag: impl Display,
    value: A,
) -> Result<(), cbor::decode::Error> {
    if slot.is_some() {
        return Err(cbor::decode::Error::message(format!(
            "duplicate field .{field_tag} in <{}> CBOR map",
            std::any::type_name::<C>(),
        )));
    }
    *slot = Some(value);
    Ok(())
}

/// Yield a decoding error with a comprehensible message when an expected field is missing from
/// the map.
pub fn missing_field<C: ?Sized, A>(field_tag: u8) -> cbor::decode::Error {
    let msg = format!(
        "missing <{}> at field .{field_tag} in <{}> CBOR map",
        std::any::type_name::<A>(),
        std::any::type_name::<C>(),
    );
    cbor::decode::Error::message(msg)
}

/// Yield a `Result<_, decode::Error>` that always fails with a comprehensible error message when a
/// map key is unexpected.
pub fn unexpected_field<C: ?Sized, A>(field_tag: impl Display) -> Result<A, cbor::decode::Error> {
    Err(cbor::decode::Error::message(format!(
        "unexpected field .{field_tag} in <{}> CBOR map",
        std::any::type_name::<C>(),
    )))
}

// Tests
// ----------------------------------------------------------------------------
