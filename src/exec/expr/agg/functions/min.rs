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
use super::super::kernel::alloc_string;
use crate::exec::expr::values::{AnyVal, DecimalVal, PrimVal, StringVal, TimestampVal};
use crate::runtime::context::FnContext;

/// MIN starts null so the first non-null input becomes the running best.
/// The state is the result, and merge is the same fold as update.
pub fn init<T: AnyVal>(_ctx: &mut FnContext, dst: &mut T) {
    *dst = T::null();
}

pub fn update<T: PrimVal>(_ctx: &mut FnContext, src: &T, dst: &mut T) {
    if src.is_null() {
        return;
    }
    if dst.is_null() || src.value() < dst.value() {
        *dst = *src;
    }
}

/// Lexicographic minimum. The state owns the current best buffer: it is
/// freed before being replaced, and the winning input is copied out of its
/// row-scoped storage.
pub fn string_update(ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) {
    if src.is_null {
        return;
    }
    if dst.is_null || src.as_bytes() < dst.as_bytes() {
        if !dst.is_null {
            ctx.free(dst.ptr);
        }
        *dst = alloc_string(ctx, src.as_bytes());
    }
}

/// (date, time-of-day) lexicographic minimum.
pub fn timestamp_update(_ctx: &mut FnContext, src: &TimestampVal, dst: &mut TimestampVal) {
    if src.is_null {
        return;
    }
    if dst.is_null {
        *dst = *src;
        return;
    }
    if (src.date, src.time_of_day) < (dst.date, dst.time_of_day) {
        *dst = *src;
    }
}

/// Width-aware decimal minimum: comparison happens at the backing width
/// declared for the argument.
pub fn decimal_update(
    ctx: &mut FnContext,
    src: &DecimalVal,
    dst: &mut DecimalVal,
) -> Result<(), String> {
    if src.is_null {
        return Ok(());
    }
    let arg = ctx
        .arg_type(0)
        .ok_or_else(|| "min decimal arg0 type missing".to_string())?;
    match arg.decimal_byte_size() {
        4 => {
            if dst.is_null || src.val4 < dst.val4 {
                *dst = *src;
            }
        }
        8 => {
            if dst.is_null || src.val8 < dst.val8 {
                *dst = *src;
            }
        }
        _ => {
            if dst.is_null || src.val16 < dst.val16 {
                *dst = *src;
            }
        }
    }
    Ok(())
}
