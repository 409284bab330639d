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

/// Build a constructor out of its alternative and fields, projecting each field for the given
/// Plutus version.
///
/// ```
/// # use tessera_plutus::constr;
/// let unit = constr!(0);
/// let pair = constr!(v: 2, 0, [42_u64, true]);
/// ```
#[macro_export]
macro_rules! constr {
    (v: $version:expr, $index:expr, [$($field:expr),* $(,)?] $(,)?) => {
        $crate::PlutusData::constr(
            $index,
            vec![$($crate::ToPlutusData::<{ $version }>::to_plutus_data(&$field)),*],
        )
    };

    ($index:expr $(,)?) => {
        $crate::PlutusData::constr($index, vec![])
    };
}

#[macro_export]
macro_rules! constr_v1 {
    ($index:expr, [$($field:expr),* $(,)?] $(,)?) => {
        $crate::constr!(v: 1, $index, [$($field),*])
    };
}

#[macro_export]
macro_rules! constr_v2 {
    ($index:expr, [$($field:expr),* $(,)?] $(,)?) => {
        $crate::constr!(v: 2, $index, [$($field),*])
    };
}
