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
use caribou::exec::expr::agg::rank;
use caribou::exec::expr::values::*;
use caribou::runtime::context::{FnContext, TypeDesc, TypeKind};

fn rank_ctx() -> FnContext {
    FnContext::new(Vec::new(), TypeDesc::simple(TypeKind::BigInt))
}

#[test]
fn test_rank_advances_by_peer_group_size() {
    let mut ctx = rank_ctx();
    let mut state = StringVal::null();
    rank::init(&mut ctx, &mut state);

    let mut emitted = Vec::new();
    for group_size in [3, 1, 2] {
        for _ in 0..group_size {
            rank::update(&mut ctx, &mut state);
        }
        emitted.push(rank::get_value(&mut ctx, &state).val);
    }
    assert_eq!(emitted, vec![1, 4, 5]);

    let last = rank::finalize(&mut ctx, state);
    assert_eq!(last.val, 7);
    assert_eq!(ctx.outstanding_allocations(), 0);
}

#[test]
fn test_dense_rank_advances_by_one() {
    let mut ctx = rank_ctx();
    let mut state = StringVal::null();
    rank::init(&mut ctx, &mut state);

    let mut emitted = Vec::new();
    for group_size in [3, 1, 2] {
        for _ in 0..group_size {
            rank::dense_rank_update(&mut ctx, &mut state);
        }
        emitted.push(rank::dense_rank_get_value(&mut ctx, &state).val);
    }
    assert_eq!(emitted, vec![1, 2, 3]);

    let last = rank::finalize(&mut ctx, state);
    assert_eq!(last.val, 4);
}
