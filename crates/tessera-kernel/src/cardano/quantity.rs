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
use num::{BigInt, One, bigint::Sign};

/// Arbitrary-precision signed amount, of lovelace or of any native token. Balances may go
/// negative during arithmetic; only finalized outputs must be non-negative.
pub type Quantity = BigInt;

const TAG_POSITIVE_BIGNUM: u64 = 2;

const TAG_NEGATIVE_BIGNUM: u64 = 3;

/// Encode a quantity as a plain CBOR integer whenever it fits in the major types 0 and 1, and as
/// a bignum otherwise.
pub fn encode_quantity<W: cbor::encode::Write>(
    e: &mut cbor::Encoder<W>,
    quantity: &Quantity,
) -> Result<(), cbor::encode::Error<W::Error>> {
    if let Some(int) = i128::try_from(quantity)
        .ok()
        .and_then(|i| cbor::data::Int::try_from(i).ok())
    {
        e.int(int)?;
        return Ok(());
    }

    if quantity.sign() == Sign::Minus {
        // Negative bignums carry `-1 - n`.
        let magnitude: BigInt = -quantity - BigInt::one();
        e.tag(cbor::data::Tag::new(TAG_NEGATIVE_BIGNUM))?;
        e.bytes(&magnitude.to_bytes_be().1)?;
    } else {
        e.tag(cbor::data::Tag::new(TAG_POSITIVE_BIGNUM))?;
        e.bytes(&quantity.to_bytes_be().1)?;
    }

    Ok(())
}

pub fn decode_quantity(d: &mut cbor::Decoder<'_>) -> Result<Quantity, cbor::decode::Error> {
    if d.datatype()? != cbor::data::Type::Tag {
        return Ok(BigInt::from(i128::from(d.int()?)));
    }

    let tag = d.tag()?.as_u64();
    let magnitude = BigInt::from_bytes_be(Sign::Plus, &cbor::decode_chunked_bytes(d)?);
    match tag {
        TAG_POSITIVE_BIGNUM => Ok(magnitude),
        TAG_NEGATIVE_BIGNUM => Ok(-magnitude - BigInt::one()),
        _ => Err(cbor::decode::Error::message(format!(
            "unexpected tag for an integer: expected 2 or 3, got {tag}"
        ))),
    }
}

/// Decode a quantity that must be non-negative and fit a machine word, such as a fee.
pub fn decode_coin(d: &mut cbor::Decoder<'_>) -> Result<Quantity, cbor::decode::Error> {
    Ok(BigInt::from(d.u64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct Wrapped(Quantity);

    impl<C> cbor::Encode<C> for Wrapped {
        fn encode<W: cbor::encode::Write>(
            &self,
            e: &mut cbor::Encoder<W>,
            _ctx: &mut C,
        ) -> Result<(), cbor::encode::Error<W::Error>> {
            encode_quantity(e, &self.0)
        }
    }

    impl<'d, C> cbor::Decode<'d, C> for Wrapped {
        fn decode(d: &mut cbor::Decoder<'d>, _ctx: &mut C) -> Result<Self, cbor::decode::Error> {
            decode_quantity(d).map(Wrapped)
        }
    }

    #[test_case("0", "00")]
    #[test_case("-1", "20")]
    #[test_case("1000000", "1a000f4240")]
    #[test_case("18446744073709551615", "1bffffffffffffffff")]
    #[test_case("-18446744073709551616", "3bffffffffffffffff")]
    #[test_case("18446744073709551616", "c249010000000000000000")]
    #[test_case("-18446744073709551617", "c349010000000000000000")]
    fn quantity_encoding(n: &str, expected: &str) {
        let n: BigInt = n.parse().unwrap();
        let bytes = cbor::to_cbor(&Wrapped(n.clone()));
        assert_eq!(hex::encode(&bytes), expected);
        assert_eq!(cbor::from_cbor::<Wrapped>(&bytes).map(|w| w.0), Some(n));
    }
}
