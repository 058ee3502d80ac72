// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::cmp::Ordering;

/// Largest unscaled value representable at precision 38 (10^38 - 1).
pub const MAX_UNSCALED_DECIMAL16: i128 = 99_999_999_999_999_999_999_999_999_999_999_999_999;

/// Integer division with ROUND_HALF_UP (half rounds away from zero).
pub fn div_round_i128(dividend: i128, divisor: i128) -> i128 {
    debug_assert!(divisor != 0);

    let mut q = dividend / divisor;
    let r = dividend % divisor;

    if r == 0 {
        return q;
    }

    // case 1: |b| is odd. if [|b|/2] < |r|, then add carry; otherwise add 0.
    // case 2: |b| is even. if [|b|/2] <= |r|, then add carry; otherwise add 0.
    // [b/2] == r means round half to up.
    // carry depends on sign of a^b.
    let abs_b = divisor.unsigned_abs();
    let abs_r = r.unsigned_abs();
    let threshold = (abs_b >> 1) + (abs_b & 1);

    if abs_r.cmp(&threshold) != Ordering::Less {
        let carry = if (dividend ^ divisor) < 0 { -1 } else { 1 };
        q += carry;
    }

    q
}

/// Divide an accumulated decimal sum by a row count, both at 128 bits.
///
/// The sum is kept at the result scale and the count is scale 0, so the
/// quotient is already at the result scale. `is_nan` reports a zero count;
/// `overflow` reports a sum or quotient outside the precision-38 range
/// (a saturated accumulator necessarily lands there).
pub fn div_decimal_by_count(
    sum: i128,
    count: i64,
    is_nan: &mut bool,
    overflow: &mut bool,
) -> i128 {
    *is_nan = false;
    *overflow = false;
    if count == 0 {
        *is_nan = true;
        return 0;
    }
    if sum.unsigned_abs() > MAX_UNSCALED_DECIMAL16 as u128 {
        *overflow = true;
        return 0;
    }
    let q = div_round_i128(sum, count as i128);
    if q.unsigned_abs() > MAX_UNSCALED_DECIMAL16 as u128 {
        *overflow = true;
        return 0;
    }
    q
}
