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

//! RANK / DENSE_RANK window state. Unlike the grouped kernels this one is
//! stateful across output rows: update ticks once per tuple of a peer
//! group and get_value emits at the end of the group, advancing the rank
//! for the next one. Update takes no value argument.

use super::super::kernel::{init_fixed_state, state_mut, state_ref};
use super::super::state_types::RankState;
use crate::exec::expr::values::{BigIntVal, StringVal};
use crate::runtime::context::FnContext;

pub fn init(ctx: &mut FnContext, dst: &mut StringVal) {
    init_fixed_state::<RankState>(ctx, dst);
    let state = unsafe { state_mut::<RankState>(dst) };
    state.rank = 1;
    state.count = 0;
}

pub fn update(_ctx: &mut FnContext, dst: &mut StringVal) {
    let state = unsafe { state_mut::<RankState>(dst) };
    state.count += 1;
}

pub fn dense_rank_update(_ctx: &mut FnContext, _dst: &mut StringVal) {}

/// Emit the rank of the peer group that just ended and advance past it.
pub fn get_value(_ctx: &mut FnContext, src: &StringVal) -> BigIntVal {
    let state = unsafe { state_mut::<RankState>(src) };
    debug_assert!(state.count > 0);
    debug_assert!(state.rank > 0);
    let result = state.rank;
    state.rank += state.count;
    state.count = 0;
    BigIntVal::new(result)
}

/// Dense rank ignores peer-group size; consecutive groups get consecutive
/// ranks.
pub fn dense_rank_get_value(_ctx: &mut FnContext, src: &StringVal) -> BigIntVal {
    let state = unsafe { state_mut::<RankState>(src) };
    debug_assert!(state.count == 0);
    debug_assert!(state.rank > 0);
    let result = state.rank;
    state.rank += 1;
    BigIntVal::new(result)
}

pub fn finalize(ctx: &mut FnContext, src: StringVal) -> BigIntVal {
    let state = *unsafe { state_ref::<RankState>(&src) };
    ctx.free(src.ptr);
    BigIntVal::new(state.rank)
}
