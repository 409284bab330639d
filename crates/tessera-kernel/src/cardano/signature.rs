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

use crate::{PubKeyHash, TransactionId, blake2b_224, cbor};
use pallas_crypto::key::ed25519;
use std::fmt;

pub const PUBLIC_KEY_SIZE: usize = 32;

pub const SIGNATURE_SIZE: usize = 64;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InvalidSignature {
    #[error("invalid verification key size: expected {PUBLIC_KEY_SIZE} bytes, got {0}")]
    InvalidKeySize(usize),
    #[error("invalid signature size: expected {SIGNATURE_SIZE} bytes, got {0}")]
    InvalidSignatureSize(usize),
    #[error("invalid signature from {0} for transaction {1}")]
    InvalidSignature(PubKeyHash, TransactionId),
}

/// A verification key along with a signature of the transaction id (a.k.a. vkey witness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    public_key: [u8; PUBLIC_KEY_SIZE],
    signature: [u8; SIGNATURE_SIZE],
}

impl Signature {
    pub fn new(public_key: [u8; PUBLIC_KEY_SIZE], signature: [u8; SIGNATURE_SIZE]) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    pub fn from_slices(public_key: &[u8], signature: &[u8]) -> Result<Self, InvalidSignature> {
        Ok(Self {
            public_key: public_key
                .try_into()
                .map_err(|_| InvalidSignature::InvalidKeySize(public_key.len()))?,
            signature: signature
                .try_into()
                .map_err(|_| InvalidSignature::InvalidSignatureSize(signature.len()))?,
        })
    }

    /// Sign a transaction id. Mostly useful to tests and emulators.
    pub fn sign(secret_key: [u8; 32], transaction_id: &TransactionId) -> Self {
        let secret_key = ed25519::SecretKey::from(secret_key);
        let public_key = secret_key.public_key();
        let signature = secret_key.sign(transaction_id);

        let mut signature_bytes = [0; SIGNATURE_SIZE];
        signature_bytes.copy_from_slice(signature.as_ref());
        let mut public_key_bytes = [0; PUBLIC_KEY_SIZE];
        public_key_bytes.copy_from_slice(public_key.as_ref());

        Self::new(public_key_bytes, signature_bytes)
    }

    /// Placeholder of the right size, used to measure transactions before they are signed.
    pub fn dummy() -> Self {
        Self::new([0; PUBLIC_KEY_SIZE], [0; SIGNATURE_SIZE])
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.signature
    }

    pub fn pub_key_hash(&self) -> PubKeyHash {
        blake2b_224(&self.public_key)
    }

    pub fn verify(&self, transaction_id: &TransactionId) -> Result<(), InvalidSignature> {
        let public_key = ed25519::PublicKey::from(self.public_key);
        let signature = ed25519::Signature::from(self.signature);
        if !public_key.verify(transaction_id, &signature) {
            return Err(InvalidSignature::InvalidSignature(
                self.pub_key_hash(),
                *transaction_id,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pub_key_hash())
    }
}

impl<C> cbor::Encode<C> for Signature {
    fn encode<W: cbor::encode::Write>(
        &self,
        e: &mut cbor::Encoder<W>,
        _ctx: &mut C,
    ) -> Result<(), cbor::encode::Error<W::Error>> {
        e.array(2)?;
        e.bytes(&self.public_key)?;
        e.bytes(&self.signature)?;
        Ok(())
    }
}

impl<'d, C> cbor::Decode<'d, C> for Signature {
    fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
        cbor::heterogeneous_array(d, |d, assert_len| {
            assert_len(2)?;
            let public_key = d.bytes()?;
            let signature = d.bytes()?;
            Self::from_slices(public_key, signature).map_err(cbor::decode::Error::message)
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use tests::*;

#[cfg(any(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    pub fn any_signature() -> impl Strategy<Value = Signature> {
        (any::<[u8; 32]>(), any::<[u8; 32]>()).prop_map(|(secret_key, message)| {
            Signature::sign(secret_key, &TransactionId::new(message))
        })
    }

    #[cfg(test)]
    mod internal {
        use super::*;
        use crate::{Hash, prop_cbor_roundtrip};

        prop_cbor_roundtrip!(Signature, any_signature());

        #[test]
        fn signature_verifies_against_signed_id_only() {
            let id = Hash::new([7; 32]);
            let signature = Signature::sign([42; 32], &id);
            assert_eq!(signature.verify(&id), Ok(()));
            assert!(matches!(
                signature.verify(&Hash::new([8; 32])),
                Err(InvalidSignature::InvalidSignature(..))
            ));
        }

        #[test]
        fn dummy_has_the_size_of_a_real_signature() {
            let real = Signature::sign([1; 32], &Hash::new([0; 32]));
            assert_eq!(
                cbor::to_cbor(&Signature::dummy()).len(),
                cbor::to_cbor(&real).len()
            );
        }

        #[test]
        fn malformed_sizes() {
            assert_eq!(
                Signature::from_slices(&[0; 31], &[0; 64]),
                Err(InvalidSignature::InvalidKeySize(31))
            );
            assert_eq!(
                Signature::from_slices(&[0; 32], &[0; 63]),
                Err(InvalidSignature::InvalidSignatureSize(63))
            );
        }
    }
}
