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

//! Flajolet-Martin probabilistic counting over a 64x32 bitmap, in two
//! flavors: plain averaging (`update`, one hash per seed per row) and
//! stochastic averaging (`pcsa_update`, one hash per row with the low bits
//! picking the bitmap row). The estimate counts the average run of leading
//! 1-bits per row, scanning from bit 0 upward - the same direction the
//! update writes them.

use std::fmt::Write as _;

use tracing::trace;

use super::super::kernel::{state_bytes_mut, string_result};
use super::super::state_types::{NUM_PC_BITMAPS, PC_BITMAP_LEN, PC_BITMAP_LENGTH};
use crate::exec::expr::hash::ValueHash;
use crate::exec::expr::values::{AnyVal, StringVal};
use crate::runtime::context::FnContext;

const PC_THETA: f64 = 0.77351;

pub fn init(ctx: &mut FnContext, dst: &mut StringVal) {
    dst.is_null = false;
    dst.ptr = ctx.allocate(PC_BITMAP_LEN);
    dst.len = PC_BITMAP_LEN;
}

fn set_bit(bitmap: &mut [u8], row: usize, bit: u32) {
    // Each row is one 32-bit word.
    let idx = row * 4;
    let word = u32::from_le_bytes(bitmap[idx..idx + 4].try_into().unwrap()) | (1 << bit);
    bitmap[idx..idx + 4].copy_from_slice(&word.to_le_bytes());
}

fn get_bit(bitmap: &[u8], row: usize, bit: u32) -> bool {
    let idx = row * 4;
    let word = u32::from_le_bytes(bitmap[idx..idx + 4].try_into().unwrap());
    word & (1 << bit) != 0
}

fn bit_index(hash: u32) -> u32 {
    // A zero hash has no trailing-zero count; pin it to the last bit.
    if hash == 0 {
        PC_BITMAP_LENGTH as u32 - 1
    } else {
        hash.trailing_zeros()
    }
}

/// Plain averaging: hash the row once per bitmap row with that row's seed.
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
        .ok_or_else(|| "distinct estimate arg0 type missing".to_string())?;
    let bitmap = unsafe { state_bytes_mut(dst, PC_BITMAP_LEN) };
    for row in 0..NUM_PC_BITMAPS {
        let hash = src.hash32(&arg, row as u32);
        set_bit(bitmap, row, bit_index(hash));
    }
    Ok(())
}

/// Stochastic averaging: one hash per row; the residue picks the bitmap
/// row and the quotient's trailing zeros pick the bit.
pub fn pcsa_update<T: ValueHash + AnyVal>(
    ctx: &mut FnContext,
    src: &T,
    dst: &mut StringVal,
) -> Result<(), String> {
    if src.is_null() {
        return Ok(());
    }
    let arg = *ctx
        .arg_type(0)
        .ok_or_else(|| "distinct estimate arg0 type missing".to_string())?;
    let hash = src.hash32(&arg, 0);
    let row = (hash as usize) % NUM_PC_BITMAPS;
    let bit = bit_index(hash / NUM_PC_BITMAPS as u32);
    let bitmap = unsafe { state_bytes_mut(dst, PC_BITMAP_LEN) };
    set_bit(bitmap, row, bit);
    Ok(())
}

/// Byte-wise OR, which makes merging idempotent.
pub fn merge(_ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) -> Result<(), String> {
    let src_bytes = src.as_bytes();
    if src_bytes.len() != PC_BITMAP_LEN {
        return Err(format!(
            "invalid distinct estimate state length: {}",
            src_bytes.len()
        ));
    }
    let bitmap = unsafe { state_bytes_mut(dst, PC_BITMAP_LEN) };
    for (d, s) in bitmap.iter_mut().zip(src_bytes) {
        *d |= *s;
    }
    if tracing::enabled!(tracing::Level::TRACE) {
        trace!("merged distinct estimate bitmap:\n{}", bitmap_to_string(bitmap));
    }
    Ok(())
}

fn bitmap_to_string(bitmap: &[u8]) -> String {
    let mut out = String::with_capacity(NUM_PC_BITMAPS * (PC_BITMAP_LENGTH + 1));
    for row in 0..NUM_PC_BITMAPS {
        for bit in 0..PC_BITMAP_LENGTH as u32 {
            let _ = write!(out, "{}", get_bit(bitmap, row, bit) as u8);
        }
        out.push('\n');
    }
    out
}

fn estimate(bitmap: &[u8]) -> f64 {
    // No bits set means no rows were seen.
    if bitmap.iter().all(|b| *b == 0) {
        return 0.0;
    }
    // Count the run of leading 1-bits per row, starting at bit 0. The
    // average run length is proportional to log2 of the distinct count.
    let mut sum = 0usize;
    for row in 0..NUM_PC_BITMAPS {
        let mut run = 0u32;
        while run < PC_BITMAP_LENGTH as u32 && get_bit(bitmap, row, run) {
            run += 1;
        }
        sum += run as usize;
    }
    let avg = sum as f64 / NUM_PC_BITMAPS as f64;
    2f64.powf(avg) / PC_THETA
}

pub fn finalize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let bitmap = src.as_bytes();
    assert_eq!(bitmap.len(), PC_BITMAP_LEN, "aggregate state length mismatch");
    if tracing::enabled!(tracing::Level::TRACE) {
        trace!("finalize distinct estimate bitmap:\n{}", bitmap_to_string(bitmap));
    }
    let result = estimate(bitmap) as i64;
    ctx.free(src.ptr);
    string_result(ctx, &result.to_string())
}

/// Stochastic averaging covers each row with 1/64th of the input, so the
/// per-row estimate scales back up by the row count.
pub fn pcsa_finalize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let bitmap = src.as_bytes();
    assert_eq!(bitmap.len(), PC_BITMAP_LEN, "aggregate state length mismatch");
    let result = (estimate(bitmap) * NUM_PC_BITMAPS as f64) as i64;
    ctx.free(src.ptr);
    string_result(ctx, &result.to_string())
}
