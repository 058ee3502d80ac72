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
use std::ops::Add;

use crate::exec::expr::values::{AnyVal, DecimalVal, PrimVal};
use crate::runtime::context::FnContext;

/// SUM starts null; the first non-null input flips the state to zero
/// before accumulating. The state is the result.
pub fn init<T: AnyVal>(_ctx: &mut FnContext, dst: &mut T) {
    *dst = T::null();
}

pub fn update<S, D>(_ctx: &mut FnContext, src: &S, dst: &mut D)
where
    S: PrimVal,
    D: PrimVal,
    S::Prim: Into<D::Prim>,
    D::Prim: Add<Output = D::Prim>,
{
    if src.is_null() {
        return;
    }
    if dst.is_null() {
        dst.init_zero();
    }
    dst.set_value(dst.value() + src.value().into());
}

/// Merging a transported sum state is the same fold as update.
pub fn merge<T>(ctx: &mut FnContext, src: &T, dst: &mut T)
where
    T: PrimVal,
    T::Prim: Into<T::Prim> + Add<Output = T::Prim>,
{
    update(ctx, src, dst);
}

/// Decimal sum reads the backing width declared for the argument and
/// always accumulates into the 128-bit field. The accumulator saturates
/// rather than wrapping; downstream consumers detect the saturated range.
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
        .ok_or_else(|| "sum decimal arg0 type missing".to_string())?;
    let v = src.unscaled(arg.precision);
    if dst.is_null {
        *dst = DecimalVal::new16(0);
    }
    dst.val16 = dst.val16.saturating_add(v);
    Ok(())
}

pub fn decimal_merge(_ctx: &mut FnContext, src: &DecimalVal, dst: &mut DecimalVal) {
    if src.is_null {
        return;
    }
    if dst.is_null {
        *dst = DecimalVal::new16(0);
    }
    dst.val16 = dst.val16.saturating_add(src.val16);
}
