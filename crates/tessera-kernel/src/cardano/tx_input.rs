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

use crate::{TxOutput, TxOutputId, cbor};
use std::{cmp::Ordering, fmt};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("input {0} has not been resolved; recover the transaction first")]
pub struct UnresolvedInput(pub TxOutputId);

/// What is known about the output an input spends. The wire format only carries the reference,
/// so decoded inputs start [`Resolution::Unresolved`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Resolved(Box<TxOutput>),
}

/// A reference to a past output, possibly paired with the output itself.
///
/// Equality and ordering only look at the reference.
#[derive(Debug, Clone)]
pub struct TxInput {
    pub output_id: TxOutputId,
    resolution: Resolution,
}

impl TxInput {
    pub fn new(output_id: TxOutputId) -> Self {
        Self {
            output_id,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn resolved(output_id: TxOutputId, output: TxOutput) -> Self {
        Self {
            output_id,
            resolution: Resolution::Resolved(Box::new(output)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(..))
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn output(&self) -> Result<&TxOutput, UnresolvedInput> {
        match &self.resolution {
            Resolution::Resolved(output) => Ok(output),
            Resolution::Unresolved => Err(UnresolvedInput(self.output_id)),
        }
    }

    /// Attach the spent output. Resolving twice keeps the first output.
    pub fn resolve(&mut self, output: TxOutput) {
        if let Resolution::Unresolved = self.resolution {
            self.resolution = Resolution::Resolved(Box::new(output));
        }
    }

    /// Borrow the input for its full (reference + output) serialisation.
    pub fn as_full(&self) -> FullTxInput<'_> {
        FullTxInput(self)
    }
}

impl PartialEq for TxInput {
    fn eq(&self, other: &Self) -> bool {
        self.output_id == other.output_id
    }
}

impl Eq for TxInput {}

impl PartialOrd for TxInput {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TxInput {
    fn cmp(&self, other: &Self) -> Ordering {
        self.output_id.cmp(&other.output_id)
    }
}

impl From<TxOutputId> for TxInput {
    fn from(output_id: TxOutputId) -> Self {
        Self::new(output_id)
    }
}

impl fmt::Display for TxInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.output_id.fmt(f)
    }
}

/// Inputs serialise as their output reference only.
impl<C> cbor::Encode<C> for TxInput {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.encode_with(self.output_id, ctx)?;
        Ok(())
    }
}

/// Decodes either form: `[tx_id, index]` yields an unresolved input while
/// `[[tx_id, index], output]` yields a resolved one. The forms are told apart by the first
/// element of the outer array: a byte string, or another array.
impl<'d, C> cbor::Decode<'d, C> for TxInput {
    fn decode(d: &mut cbor::Decoder<'d>, ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        use cbor::data::Type;

        let mut lookahead = d.probe();
        lookahead.array()?;
        let first = lookahead.datatype()?;

        if matches!(first, Type::Array | Type::ArrayIndef) {
            cbor::heterogeneous_array(d, |d, assert_len| {
                assert_len(2)?;
                let output_id = d.decode_with(ctx)?;
                let output = d.decode_with(ctx)?;
                Ok(Self::resolved(output_id, output))
            })
        } else {
            Ok(Self::new(d.decode_with(ctx)?))
        }
    }
}

/// An input travelling along with the output it spends: `[[tx_id, index], output]`.
pub struct FullTxInput<'a>(&'a TxInput);

impl<C> cbor::Encode<C> for FullTxInput<'_> {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        let output = self
            .0
            .output()
            .map_err(|e| cbor::encode::Error::message(e.to_string()))?;
        e.array(2)?;
        e.encode_with(self.0.output_id, ctx)?;
        e.encode_with(output, ctx)?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::{any_tx_output, any_tx_output_id};
    use proptest::prelude::*;

    pub fn any_unresolved_input() -> impl Strategy<Value = TxInput> {
        any_tx_output_id().prop_map(TxInput::new)
    }

    pub fn any_resolved_input() -> impl Strategy<Value = TxInput> {
        (any_tx_output_id(), any_tx_output())
            .prop_map(|(output_id, output)| TxInput::resolved(output_id, output))
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::{Hash, prop_cbor_roundtrip};

        prop_cbor_roundtrip!(TxInput, any_unresolved_input());

        #[test]
        fn unresolved_output_is_an_error() {
            let output_id = TxOutputId::new(Hash::new([1; 32]), 0);
            let input = TxInput::new(output_id);
            assert_eq!(input.output(), Err(UnresolvedInput(output_id)));
        }

        proptest! {
            #[test]
            fn full_form_decodes_resolved(input in any_resolved_input()) {
                let bytes = cbor::to_cbor(&input.as_full());
                let decoded: TxInput = cbor::from_cbor(&bytes).unwrap();
                prop_assert!(decoded.is_resolved());
                prop_assert_eq!(decoded.output(), input.output());
                prop_assert_eq!(decoded, input);
            }

            #[test]
            fn short_form_decodes_unresolved(input in any_resolved_input()) {
                let decoded: TxInput = cbor::from_cbor(&cbor::to_cbor(&input)).unwrap();
                prop_assert!(!decoded.is_resolved());
                prop_assert_eq!(decoded.output_id, input.output_id);
            }
        }
    }
}
