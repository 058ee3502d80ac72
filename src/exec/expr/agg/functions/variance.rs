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

//! Single-pass variance: Welford's recurrence per row and Chan's parallel
//! update on merge. An aggregation must be single pass, so the canonical
//! two-pass formulation is not an option.

use super::super::kernel::{alloc_string, init_fixed_state, state_mut, state_ref};
use super::super::state_types::{KnuthVarianceState, KNUTH_VARIANCE_STATE_LEN};
use crate::exec::expr::values::{AnyVal, DoubleVal, NumericVal, StringVal};
use crate::runtime::context::FnContext;

pub fn init(ctx: &mut FnContext, dst: &mut StringVal) {
    init_fixed_state::<KnuthVarianceState>(ctx, dst);
}

pub fn update<T: NumericVal>(_ctx: &mut FnContext, src: &T, dst: &mut StringVal) {
    if src.is_null() {
        return;
    }
    let state = unsafe { state_mut::<KnuthVarianceState>(dst) };
    let temp = state.count + 1;
    let delta = src.as_f64() - state.mean;
    let r = delta / temp as f64;
    state.mean += r;
    state.m2 += state.count as f64 * delta * r;
    state.count = temp;
}

pub fn merge(_ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) -> Result<(), String> {
    let (mean, m2, count) = parse_state(src.as_bytes())?;
    if count <= 0 {
        return Ok(());
    }
    let state = unsafe { state_mut::<KnuthVarianceState>(dst) };
    if state.count == 0 {
        state.mean = mean;
        state.m2 = m2;
        state.count = count;
        return Ok(());
    }
    let delta = state.mean - mean;
    let count_dst = state.count as f64;
    let count_src = count as f64;
    let sum_count = count_dst + count_src;
    state.mean = mean + delta * (count_dst / sum_count);
    state.m2 = m2 + state.m2 + (delta * delta) * (count_src * count_dst / sum_count);
    state.count += count;
    Ok(())
}

/// Encodes the 24-byte wire blob and frees the state.
pub fn serialize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = *unsafe { state_ref::<KnuthVarianceState>(&src) };
    let mut buf = [0u8; KNUTH_VARIANCE_STATE_LEN];
    buf[..8].copy_from_slice(&state.mean.to_le_bytes());
    buf[8..16].copy_from_slice(&state.m2.to_le_bytes());
    buf[16..].copy_from_slice(&state.count.to_le_bytes());
    let out = alloc_string(ctx, &buf);
    ctx.free(src.ptr);
    out
}

/// One tuple has zero spread per SQL semantics.
fn compute_variance(state: &KnuthVarianceState, pop: bool) -> f64 {
    if state.count == 1 {
        return 0.0;
    }
    if pop {
        state.m2 / state.count as f64
    } else {
        state.m2 / (state.count - 1) as f64
    }
}

fn finalize_with(ctx: &mut FnContext, src: StringVal, f: impl Fn(&KnuthVarianceState) -> f64) -> DoubleVal {
    let state = *unsafe { state_ref::<KnuthVarianceState>(&src) };
    ctx.free(src.ptr);
    if state.count == 0 {
        return DoubleVal::null();
    }
    DoubleVal::new(f(&state))
}

pub fn variance_samp_finalize(ctx: &mut FnContext, src: StringVal) -> DoubleVal {
    finalize_with(ctx, src, |s| compute_variance(s, false))
}

pub fn variance_pop_finalize(ctx: &mut FnContext, src: StringVal) -> DoubleVal {
    finalize_with(ctx, src, |s| compute_variance(s, true))
}

pub fn stddev_samp_finalize(ctx: &mut FnContext, src: StringVal) -> DoubleVal {
    finalize_with(ctx, src, |s| compute_variance(s, false).sqrt())
}

pub fn stddev_pop_finalize(ctx: &mut FnContext, src: StringVal) -> DoubleVal {
    finalize_with(ctx, src, |s| compute_variance(s, true).sqrt())
}

fn parse_state(bytes: &[u8]) -> Result<(f64, f64, i64), String> {
    if bytes.len() != KNUTH_VARIANCE_STATE_LEN {
        return Err(format!("invalid variance state length: {}", bytes.len()));
    }
    let mean = f64::from_le_bytes(bytes[..8].try_into().unwrap());
    let m2 = f64::from_le_bytes(bytes[8..16].try_into().unwrap());
    let count = i64::from_le_bytes(bytes[16..].try_into().unwrap());
    Ok((mean, m2, count))
}
