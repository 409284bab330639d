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

use std::fmt::Display;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidBech32 {
    #[error("invalid bech32 human-readable part: {0}")]
    InvalidPrefix(String),
    #[error("unable to encode bech32: {0}")]
    Encode(String),
    #[error("unable to decode bech32: {0}")]
    Decode(String),
}

pub fn encode_bech32(hrp: &str, payload: &[u8]) -> Result<String, InvalidBech32> {
    let hrp = bech32::Hrp::parse(hrp).map_err(|e| InvalidBech32::InvalidPrefix(e.to_string()))?;
    bech32::encode::<bech32::Bech32>(hrp, payload).map_err(|e| InvalidBech32::Encode(e.to_string()))
}

/// Decode a bech32 string into its (lowercase) human-readable part and its payload.
pub fn decode_bech32(s: &str) -> Result<(String, Vec<u8>), InvalidBech32> {
    let (hrp, payload) = bech32::decode(s).map_err(|e| InvalidBech32::Decode(e.to_string()))?;
    Ok((hrp.to_lowercase(), payload))
}

pub fn display_collection<T: Display>(collection: impl IntoIterator<Item = T>) -> String {
    collection
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
