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

//! HyperLogLog at precision 10: 1024 one-byte registers, each holding the
//! maximum first-one-bit position observed for its bucket. Merge is an
//! element-wise max, which makes it idempotent.

use super::super::kernel::{state_bytes_mut, string_result};
use super::super::state_types::{HLL_LEN, HLL_PRECISION};
use crate::exec::expr::hash::{ValueHash, FNV64_SEED};
use crate::exec::expr::values::{AnyVal, StringVal};
use crate::runtime::context::FnContext;

pub fn init(ctx: &mut FnContext, dst: &mut StringVal) {
    dst.is_null = false;
    dst.ptr = ctx.allocate(HLL_LEN);
    dst.len = HLL_LEN;
}

pub fn update<T: ValueHash + AnyVal>(
    ctx: &mut FnContext,
    src: &T,
    dst: &mut StringVal,
) -> Result<(), String> {
    if src.is_null() {
        return Ok(());
    }
    let arg = *ctx
        .arg_type(0)
        .ok_or_else(|| "hll arg0 type missing".to_string())?;
    let hash = src.hash64(&arg, FNV64_SEED);
    if hash != 0 {
        // The low bits index the register; the first 1-bit above them is
        // the candidate value.
        let registers = unsafe { state_bytes_mut(dst, HLL_LEN) };
        let idx = (hash & (HLL_LEN as u64 - 1)) as usize;
        let first_one_bit = ((hash >> HLL_PRECISION).trailing_zeros() + 1) as u8;
        registers[idx] = registers[idx].max(first_one_bit);
    }
    Ok(())
}

pub fn merge(_ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) -> Result<(), String> {
    let src_bytes = src.as_bytes();
    if src_bytes.len() != HLL_LEN {
        return Err(format!("invalid hll state length: {}", src_bytes.len()));
    }
    let registers = unsafe { state_bytes_mut(dst, HLL_LEN) };
    for (d, s) in registers.iter_mut().zip(src_bytes) {
        *d = (*d).max(*s);
    }
    Ok(())
}

fn estimate_cardinality(registers: &[u8]) -> i64 {
    let num_streams = HLL_LEN as f64;
    // Empirical constants for the algorithm.
    let alpha = match HLL_LEN {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / num_streams),
    };

    let mut harmonic_mean = 0.0f64;
    let mut num_zero_registers = 0usize;
    for register in registers {
        harmonic_mean += 2f64.powi(-(*register as i32));
        if *register == 0 {
            num_zero_registers += 1;
        }
    }
    harmonic_mean = 1.0 / harmonic_mean;
    let mut estimate = alpha * num_streams * num_streams * harmonic_mean;

    if num_zero_registers != 0 {
        // The harmonic-mean estimate is too inaccurate at low fill; use
        // linear counting instead.
        estimate = num_streams * (num_streams / num_zero_registers as f64).ln();
    }
    estimate as i64
}

/// Emits the estimate as a text-encoded integer and frees the state.
pub fn finalize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let registers = src.as_bytes();
    assert_eq!(registers.len(), HLL_LEN, "aggregate state length mismatch");
    let result = estimate_cardinality(registers);
    ctx.free(src.ptr);
    string_result(ctx, &result.to_string())
}
