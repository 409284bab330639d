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

/// Maximum size of a byte string chunk in canonical on-chain data.
pub const BYTES_CHUNK_SIZE: usize = 64;

/// Encode a homogeneous list with a definite length.
pub fn encode_list<C, W: cbor::encode::Write, A: cbor::Encode<C>>(
    e: &mut cbor::Encoder<W>,
    elems: &[A],
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    e.array(elems.len() as u64)?;
    for elem in elems {
        e.encode_with(elem, ctx)?;
    }
    Ok(())
}

/// Encode a homogeneous list as an indefinite sequence, even when empty.
pub fn encode_indefinite_list<C, W: cbor::encode::Write, A: cbor::Encode<C>>(
    e: &mut cbor::Encoder<W>,
    elems: &[A],
    ctx: &mut C,
) -> Result<(), cbor::encode::Error<W::Error>> {
    e.begin_array()?;
    for elem in elems {
        e.encode_with(elem, ctx)?;
    }
    e.end()?;
    Ok(())
}

/// Encode a byte string, splitting it into an indefinite sequence of chunks when it exceeds
/// [`BYTES_CHUNK_SIZE`].
pub fn encode_chunked_bytes<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    bytes: &[u8],
) -> Result<(), cbor::encode::Error<W::Error>> {
    if bytes.len() <= BYTES_CHUNK_SIZE {
        e.bytes(bytes)?;
        return Ok(());
    }

    e.begin_bytes()?;
    for chunk in bytes.chunks(BYTES_CHUNK_SIZE) {
        e.bytes(chunk)?;
    }
    e.end()?;

    Ok(())
}
