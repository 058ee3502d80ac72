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
use super::super::kernel::{alloc_string, init_fixed_state, state_mut, state_ref};
use super::super::state_types::{
    AvgState, DecimalAvgState, AVG_STATE_LEN, DECIMAL_AVG_STATE_LEN,
};
use crate::exec::expr::decimal::div_decimal_by_count;
use crate::exec::expr::values::{AnyVal, DecimalVal, DoubleVal, NumericVal, StringVal, TimestampVal};
use crate::runtime::context::{FnContext, TypeKind};

pub fn init(ctx: &mut FnContext, dst: &mut StringVal) {
    init_fixed_state::<AvgState>(ctx, dst);
}

pub fn update<T: NumericVal>(_ctx: &mut FnContext, src: &T, dst: &mut StringVal) {
    if src.is_null() {
        return;
    }
    let state = unsafe { state_mut::<AvgState>(dst) };
    state.sum += src.as_f64();
    state.count += 1;
}

pub fn merge(_ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) -> Result<(), String> {
    let (sum, count) = parse_state(src.as_bytes())?;
    let state = unsafe { state_mut::<AvgState>(dst) };
    state.sum += sum;
    state.count += count;
    Ok(())
}

/// Encodes the 16-byte wire blob and frees the state.
pub fn serialize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = *unsafe { state_ref::<AvgState>(&src) };
    let mut buf = [0u8; AVG_STATE_LEN];
    buf[..8].copy_from_slice(&state.sum.to_le_bytes());
    buf[8..].copy_from_slice(&state.count.to_le_bytes());
    let out = alloc_string(ctx, &buf);
    ctx.free(src.ptr);
    out
}

pub fn get_value(_ctx: &mut FnContext, src: &StringVal) -> DoubleVal {
    let state = unsafe { state_ref::<AvgState>(src) };
    if state.count == 0 {
        return DoubleVal::null();
    }
    DoubleVal::new(state.sum / state.count as f64)
}

pub fn finalize(ctx: &mut FnContext, src: StringVal) -> DoubleVal {
    let result = get_value(ctx, &src);
    ctx.free(src.ptr);
    result
}

/// Timestamp averaging accumulates the seconds-since-epoch double form and
/// converts back at emission.
pub fn timestamp_update(_ctx: &mut FnContext, src: &TimestampVal, dst: &mut StringVal) {
    if src.is_null {
        return;
    }
    let state = unsafe { state_mut::<AvgState>(dst) };
    state.sum += src.to_seconds();
    state.count += 1;
}

pub fn timestamp_get_value(_ctx: &mut FnContext, src: &StringVal) -> TimestampVal {
    let state = unsafe { state_ref::<AvgState>(src) };
    if state.count == 0 {
        return TimestampVal::null();
    }
    TimestampVal::from_seconds(state.sum / state.count as f64)
}

pub fn timestamp_finalize(ctx: &mut FnContext, src: StringVal) -> TimestampVal {
    let result = timestamp_get_value(ctx, &src);
    ctx.free(src.ptr);
    result
}

pub fn decimal_init(ctx: &mut FnContext, dst: &mut StringVal) {
    init_fixed_state::<DecimalAvgState>(ctx, dst);
}

/// The planner guarantees the input scale matches the return scale, so the
/// sum is a plain add at the argument's backing width. The accumulator
/// saturates instead of wrapping; the final divide reports it.
pub fn decimal_update(
    ctx: &mut FnContext,
    src: &DecimalVal,
    dst: &mut StringVal,
) -> Result<(), String> {
    if src.is_null {
        return Ok(());
    }
    let arg = ctx
        .arg_type(0)
        .ok_or_else(|| "avg decimal arg0 type missing".to_string())?;
    let v = src.unscaled(arg.precision);
    let state = unsafe { state_mut::<DecimalAvgState>(dst) };
    state.sum = state.sum.saturating_add(v);
    state.count += 1;
    Ok(())
}

pub fn decimal_merge(
    _ctx: &mut FnContext,
    src: &StringVal,
    dst: &mut StringVal,
) -> Result<(), String> {
    let (sum, count) = parse_decimal_state(src.as_bytes())?;
    let state = unsafe { state_mut::<DecimalAvgState>(dst) };
    state.sum = state.sum.saturating_add(sum);
    state.count += count;
    Ok(())
}

/// Encodes the 24-byte wire blob (the in-memory struct pads to 32) and
/// frees the state.
pub fn decimal_serialize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = *unsafe { state_ref::<DecimalAvgState>(&src) };
    let mut buf = [0u8; DECIMAL_AVG_STATE_LEN];
    buf[..16].copy_from_slice(&state.sum.to_le_bytes());
    buf[16..].copy_from_slice(&state.count.to_le_bytes());
    let out = alloc_string(ctx, &buf);
    ctx.free(src.ptr);
    out
}

pub fn decimal_get_value(ctx: &mut FnContext, src: &StringVal) -> DecimalVal {
    let state = *unsafe { state_ref::<DecimalAvgState>(src) };
    if state.count == 0 {
        return DecimalVal::null();
    }
    debug_assert_eq!(ctx.return_type().kind, TypeKind::Decimal);
    let mut is_nan = false;
    let mut overflow = false;
    let q = div_decimal_by_count(state.sum, state.count, &mut is_nan, &mut overflow);
    if is_nan {
        return DecimalVal::null();
    }
    if overflow {
        ctx.add_warning("avg computation overflowed, returning null");
        return DecimalVal::null();
    }
    DecimalVal::from_unscaled(q)
}

pub fn decimal_finalize(ctx: &mut FnContext, src: StringVal) -> DecimalVal {
    let result = decimal_get_value(ctx, &src);
    ctx.free(src.ptr);
    result
}

fn parse_state(bytes: &[u8]) -> Result<(f64, i64), String> {
    if bytes.len() != AVG_STATE_LEN {
        return Err(format!("invalid avg state length: {}", bytes.len()));
    }
    let sum = f64::from_le_bytes(bytes[..8].try_into().unwrap());
    let count = i64::from_le_bytes(bytes[8..].try_into().unwrap());
    Ok((sum, count))
}

fn parse_decimal_state(bytes: &[u8]) -> Result<(i128, i64), String> {
    if bytes.len() != DECIMAL_AVG_STATE_LEN {
        return Err(format!("invalid avg decimal state length: {}", bytes.len()));
    }
    let sum = i128::from_le_bytes(bytes[..16].try_into().unwrap());
    let count = i64::from_le_bytes(bytes[16..].try_into().unwrap());
    Ok((sum, count))
}
