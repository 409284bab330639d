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

use crate::{ExUnits, Language, Quantity, RationalNumber, SlotConfig};
use num::{BigInt, BigRational, Integer};
use serde::{Deserialize, Serialize};

/// The subset of protocol parameters that building and validating transactions depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    pub tx_fee_fixed: u64,
    pub tx_fee_per_byte: u64,
    pub max_tx_size: u64,
    pub execution_unit_prices: ExUnitPrices,
    pub max_tx_execution_units: ExUnits,
    pub collateral_percentage: u64,
    pub max_collateral_inputs: u64,
    pub utxo_cost_per_byte: u64,
    pub stake_address_deposit: u64,
    #[serde(default)]
    pub cost_models: CostModels,
    #[serde(default)]
    pub slot_config: SlotConfig,
}

impl NetworkParams {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn cost_model(&self, language: Language) -> &[i64] {
        match language {
            Language::PlutusV1 => &self.cost_models.plutus_v1,
            Language::PlutusV2 => &self.cost_models.plutus_v2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExUnitPrices {
    pub price_memory: RationalNumber,
    pub price_steps: RationalNumber,
}

impl ExUnitPrices {
    /// Lovelace charged for the given execution budget, rounded up.
    pub fn cost(&self, ex_units: &ExUnits) -> Quantity {
        let total = to_big_rational(&self.price_memory) * BigInt::from(ex_units.memory)
            + to_big_rational(&self.price_steps) * BigInt::from(ex_units.steps);
        total.ceil().to_integer()
    }
}

fn to_big_rational(r: &RationalNumber) -> BigRational {
    BigRational::new(BigInt::from(r.numerator), BigInt::from(r.denominator.max(1)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModels {
    #[serde(rename = "PlutusV1", default)]
    pub plutus_v1: Vec<i64>,
    #[serde(rename = "PlutusV2", default)]
    pub plutus_v2: Vec<i64>,
}

// -------------------------------------------------------------------------------- RationalNumber

impl Serialize for RationalNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RationalProxy::Fraction {
            numerator: self.numerator,
            denominator: self.denominator,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RationalNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RationalProxy::deserialize(deserializer)? {
            RationalProxy::Fraction {
                numerator,
                denominator,
            } => {
                if denominator == 0 {
                    return Err(serde::de::Error::custom("zero denominator"));
                }
                Ok(RationalNumber {
                    numerator,
                    denominator,
                })
            }
            RationalProxy::Decimal(decimal) => {
                from_decimal(decimal).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RationalProxy {
    Fraction { numerator: u64, denominator: u64 },
    Decimal(f64),
}

/// Reads a decimal through its shortest textual form, so that e.g. `0.0577` yields `577/10000`
/// rather than the binary approximation of the float.
fn from_decimal(decimal: f64) -> Result<RationalNumber, String> {
    if !decimal.is_finite() || decimal < 0.0 {
        return Err(format!("not a non-negative decimal: {decimal}"));
    }

    let text = decimal.to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let denominator = u32::try_from(fraction.len())
        .ok()
        .and_then(|digits| 10_u64.checked_pow(digits))
        .ok_or_else(|| format!("too many decimals: {text}"))?;
    let numerator = format!("{whole}{fraction}")
        .parse::<u64>()
        .map_err(|e| format!("{text}: {e}"))?;

    let gcd = numerator.gcd(&denominator).max(1);
    Ok(RationalNumber {
        numerator: numerator / gcd,
        denominator: denominator / gcd,
    })
}

// ------------------------------------------------------------------------------------- Defaults

impl Default for NetworkParams {
    /// Mainnet, Babbage era.
    fn default() -> Self {
        NetworkParams {
            tx_fee_fixed: 155_381,
            tx_fee_per_byte: 44,
            max_tx_size: 16_384,
            execution_unit_prices: ExUnitPrices {
                price_memory: RationalNumber {
                    numerator: 577,
                    denominator: 10_000,
                },
                price_steps: RationalNumber {
                    numerator: 721,
                    denominator: 10_000_000,
                },
            },
            max_tx_execution_units: ExUnits::new(14_000_000, 10_000_000_000),
            collateral_percentage: 150,
            max_collateral_inputs: 3,
            utxo_cost_per_byte: 4_310,
            stake_address_deposit: 2_000_000,
            cost_models: CostModels {
                plutus_v1: vec![
                    100788, 420, 1, 1, 1000, 173, 0, 1, 1000, 59957, 4, 1, 11183, 32, 201305, 8356,
                    4, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 100,
                    100, 16000, 100, 94375, 32, 132994, 32, 61462, 4, 72010, 178, 0, 1, 22151, 32,
                    91189, 769, 4, 2, 85848, 228465, 122, 0, 1, 1, 1000, 42921, 4, 2, 24548, 29498,
                    38, 1, 898148, 27279, 1, 51775, 558, 1, 39184, 1000, 60594, 1, 141895, 32,
                    83150, 32, 15299, 32, 76049, 1, 13169, 4, 22100, 10, 28999, 74, 1, 28999, 74,
                    1, 43285, 552, 1, 44749, 541, 1, 33852, 32, 68246, 32, 72362, 32, 7243, 32,
                    7391, 32, 11546, 32, 85848, 228465, 122, 0, 1, 1, 90434, 519, 0, 1, 74433, 32,
                    85848, 228465, 122, 0, 1, 1, 85848, 228465, 122, 0, 1, 1, 270652, 22588, 4,
                    1457325, 64566, 4, 20467, 1, 4, 0, 141992, 32, 100788, 420, 1, 1, 81663, 32,
                    59498, 32, 20142, 32, 24588, 32, 20744, 32, 25933, 32, 24623, 32, 53384111,
                    14333, 10,
                ],
                plutus_v2: vec![
                    100788, 420, 1, 1, 1000, 173, 0, 1, 1000, 59957, 4, 1, 11183, 32, 201305, 8356,
                    4, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 16000, 100, 100,
                    100, 16000, 100, 94375, 32, 132994, 32, 61462, 4, 72010, 178, 0, 1, 22151, 32,
                    91189, 769, 4, 2, 85848, 228465, 122, 0, 1, 1, 1000, 42921, 4, 2, 24548, 29498,
                    38, 1, 898148, 27279, 1, 51775, 558, 1, 39184, 1000, 60594, 1, 141895, 32,
                    83150, 32, 15299, 32, 76049, 1, 13169, 4, 22100, 10, 28999, 74, 1, 28999, 74,
                    1, 43285, 552, 1, 44749, 541, 1, 33852, 32, 68246, 32, 72362, 32, 7243, 32,
                    7391, 32, 11546, 32, 85848, 228465, 122, 0, 1, 1, 90434, 519, 0, 1, 74433, 32,
                    85848, 228465, 122, 0, 1, 1, 85848, 228465, 122, 0, 1, 1, 955506, 213312, 0, 2,
                    270652, 22588, 4, 1457325, 64566, 4, 20467, 1, 4, 0, 141992, 32, 100788, 420,
                    1, 1, 81663, 32, 59498, 32, 20142, 32, 24588, 32, 20744, 32, 25933, 32, 24623,
                    32, 43053543, 10, 53384111, 14333, 10, 43574283, 26308, 10,
                ],
            },
            slot_config: SlotConfig::MAINNET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const PREPROD_PARAMS: &str = r#"{
        "txFeeFixed": 155381,
        "txFeePerByte": 44,
        "maxTxSize": 16384,
        "executionUnitPrices": { "priceMemory": 0.0577, "priceSteps": 0.0000721 },
        "maxTxExecutionUnits": { "memory": 14000000, "steps": 10000000000 },
        "collateralPercentage": 150,
        "maxCollateralInputs": 3,
        "utxoCostPerByte": 4310,
        "stakeAddressDeposit": 2000000,
        "costModels": { "PlutusV2": [1, -2, 3] },
        "slotConfig": { "zeroTime": 1655769600000, "zeroSlot": 86400, "slotLength": 1000 }
    }"#;

    #[test]
    fn parse_decimal_prices() {
        let params = NetworkParams::from_json(PREPROD_PARAMS).unwrap();
        pretty_assertions::assert_eq!(
            params.execution_unit_prices,
            NetworkParams::default().execution_unit_prices
        );
        pretty_assertions::assert_eq!(params.cost_model(Language::PlutusV2), &[1, -2, 3]);
        assert!(params.cost_model(Language::PlutusV1).is_empty());
        pretty_assertions::assert_eq!(params.slot_config, SlotConfig::PREPROD);
    }

    #[test]
    fn parse_fraction_prices() {
        let json = PREPROD_PARAMS.replace(
            r#"{ "priceMemory": 0.0577, "priceSteps": 0.0000721 }"#,
            r#"{ "priceMemory": { "numerator": 577, "denominator": 10000 },
                 "priceSteps": { "numerator": 721, "denominator": 10000000 } }"#,
        );
        let params = NetworkParams::from_json(&json).unwrap();
        pretty_assertions::assert_eq!(
            params.execution_unit_prices,
            NetworkParams::default().execution_unit_prices
        );
    }

    #[test]
    fn default_survives_json() {
        let json = serde_json::to_string(&NetworkParams::default()).unwrap();
        pretty_assertions::assert_eq!(
            NetworkParams::from_json(&json).unwrap(),
            NetworkParams::default()
        );
    }

    #[test]
    fn zero_denominator_is_rejected() {
        let json = PREPROD_PARAMS.replace(
            "0.0577",
            r#"{ "numerator": 1, "denominator": 0 }"#,
        );
        assert!(NetworkParams::from_json(&json).is_err());
    }

    #[test_case(0.5 => (1, 2))]
    #[test_case(0.0577 => (577, 10_000))]
    #[test_case(3.0 => (3, 1))]
    #[test_case(0.0000721 => (721, 10_000_000))]
    fn decimals(decimal: f64) -> (u64, u64) {
        let r = from_decimal(decimal).unwrap();
        (r.numerator, r.denominator)
    }

    #[test_case(0, 0 => 0)]
    #[test_case(1, 1 => 1; "rounded up")]
    #[test_case(1_000_000, 500_000_000 => 93_750)]
    fn execution_cost(memory: u64, steps: u64) -> u64 {
        let cost = NetworkParams::default()
            .execution_unit_prices
            .cost(&ExUnits::new(memory, steps));
        u64::try_from(cost).unwrap()
    }
}
