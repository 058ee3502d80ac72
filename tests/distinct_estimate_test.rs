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
use caribou::exec::expr::agg::{copy_serialize, hll, pc};
use caribou::exec::expr::values::*;
use caribou::runtime::context::{FnContext, TypeDesc, TypeKind};

fn bigint_ctx() -> FnContext {
    FnContext::new(
        vec![TypeDesc::simple(TypeKind::BigInt)],
        TypeDesc::simple(TypeKind::String),
    )
}

fn text_to_i64(ctx: &mut FnContext, out: StringVal) -> i64 {
    let v = std::str::from_utf8(out.as_bytes()).unwrap().parse().unwrap();
    ctx.free(out.ptr);
    v
}

fn hll_state_over(ctx: &mut FnContext, range: std::ops::RangeInclusive<i64>) -> StringVal {
    let mut state = StringVal::null();
    hll::init(ctx, &mut state);
    for i in range {
        hll::update(ctx, &BigIntVal::new(i), &mut state).unwrap();
    }
    state
}

#[test]
fn test_hll_small_range() {
    let mut ctx = bigint_ctx();
    let state = hll_state_over(&mut ctx, 1..=10);
    let out = hll::finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    assert!((9..=12).contains(&estimate), "estimate {estimate}");
    assert_eq!(ctx.outstanding_allocations(), 0);
}

#[test]
fn test_hll_large_range_within_tolerance() {
    let mut ctx = bigint_ctx();
    let state = hll_state_over(&mut ctx, 1..=100_000);
    let out = hll::finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    let err = (estimate - 100_000).abs() as f64 / 100_000.0;
    assert!(err <= 0.10, "estimate {estimate}, error {err}");
}

#[test]
fn test_hll_empty_is_zero() {
    let mut ctx = bigint_ctx();
    let mut state = StringVal::null();
    hll::init(&mut ctx, &mut state);
    hll::update(&mut ctx, &BigIntVal::null(), &mut state).unwrap();
    let out = hll::finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    assert_eq!(estimate, 0);
}

#[test]
fn test_hll_merge_of_halves_equals_single_pass() {
    let mut ctx = bigint_ctx();

    let lo = hll_state_over(&mut ctx, 1..=50_000);
    let blob_lo = copy_serialize(&mut ctx, lo);
    let hi = hll_state_over(&mut ctx, 50_001..=100_000);
    let blob_hi = copy_serialize(&mut ctx, hi);

    let mut merged = StringVal::null();
    hll::init(&mut ctx, &mut merged);
    hll::merge(&mut ctx, &blob_lo, &mut merged).unwrap();
    hll::merge(&mut ctx, &blob_hi, &mut merged).unwrap();
    ctx.free(blob_lo.ptr);
    ctx.free(blob_hi.ptr);

    let full = hll_state_over(&mut ctx, 1..=100_000);
    // Register-wise max makes the merged state identical to one pass.
    assert_eq!(merged.as_bytes(), full.as_bytes());

    let out = hll::finalize(&mut ctx, merged);
    let merged_estimate = text_to_i64(&mut ctx, out);
    let out = hll::finalize(&mut ctx, full);
    let full_estimate = text_to_i64(&mut ctx, out);
    assert_eq!(merged_estimate, full_estimate);
}

#[test]
fn test_hll_merge_is_idempotent() {
    let mut ctx = bigint_ctx();
    let state = hll_state_over(&mut ctx, 1..=1000);
    let before = state.as_bytes().to_vec();
    let blob = copy_serialize(&mut ctx, state);

    let mut merged = StringVal::null();
    hll::init(&mut ctx, &mut merged);
    hll::merge(&mut ctx, &blob, &mut merged).unwrap();
    hll::merge(&mut ctx, &blob, &mut merged).unwrap();
    assert_eq!(merged.as_bytes(), &before[..]);
    ctx.free(blob.ptr);
    ctx.free(merged.ptr);
}

#[test]
fn test_pcsa_within_tolerance() {
    let mut ctx = bigint_ctx();
    let mut state = StringVal::null();
    pc::init(&mut ctx, &mut state);
    for i in 1..=10_000i64 {
        pc::pcsa_update(&mut ctx, &BigIntVal::new(i), &mut state).unwrap();
    }
    let out = pc::pcsa_finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    let err = (estimate - 10_000).abs() as f64 / 10_000.0;
    assert!(err <= 0.25, "estimate {estimate}, error {err}");
}

#[test]
fn test_pc_within_tolerance() {
    let mut ctx = bigint_ctx();
    let mut state = StringVal::null();
    pc::init(&mut ctx, &mut state);
    for i in 1..=5_000i64 {
        pc::update(&mut ctx, &BigIntVal::new(i), &mut state).unwrap();
    }
    let out = pc::finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    let err = (estimate - 5_000).abs() as f64 / 5_000.0;
    assert!(err <= 0.25, "estimate {estimate}, error {err}");
}

#[test]
fn test_pc_empty_is_zero() {
    let mut ctx = bigint_ctx();
    let mut state = StringVal::null();
    pc::init(&mut ctx, &mut state);
    let out = pc::finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    assert_eq!(estimate, 0);

    let mut state = StringVal::null();
    pc::init(&mut ctx, &mut state);
    let out = pc::pcsa_finalize(&mut ctx, state);
    let estimate = text_to_i64(&mut ctx, out);
    assert_eq!(estimate, 0);
}

#[test]
fn test_pc_merge_is_bitwise_or() {
    let mut ctx = bigint_ctx();

    let mut lo = StringVal::null();
    pc::init(&mut ctx, &mut lo);
    for i in 1..=500i64 {
        pc::pcsa_update(&mut ctx, &BigIntVal::new(i), &mut lo).unwrap();
    }
    let blob_lo = copy_serialize(&mut ctx, lo);

    let mut hi = StringVal::null();
    pc::init(&mut ctx, &mut hi);
    for i in 501..=1000i64 {
        pc::pcsa_update(&mut ctx, &BigIntVal::new(i), &mut hi).unwrap();
    }
    let blob_hi = copy_serialize(&mut ctx, hi);

    let mut merged = StringVal::null();
    pc::init(&mut ctx, &mut merged);
    pc::merge(&mut ctx, &blob_lo, &mut merged).unwrap();
    pc::merge(&mut ctx, &blob_hi, &mut merged).unwrap();
    // Merging one shard twice changes nothing.
    pc::merge(&mut ctx, &blob_lo, &mut merged).unwrap();
    ctx.free(blob_lo.ptr);
    ctx.free(blob_hi.ptr);

    let mut full = StringVal::null();
    pc::init(&mut ctx, &mut full);
    for i in 1..=1000i64 {
        pc::pcsa_update(&mut ctx, &BigIntVal::new(i), &mut full).unwrap();
    }
    assert_eq!(merged.as_bytes(), full.as_bytes());

    let out = pc::pcsa_finalize(&mut ctx, merged);
    let merged_estimate = text_to_i64(&mut ctx, out);
    let out = pc::pcsa_finalize(&mut ctx, full);
    let full_estimate = text_to_i64(&mut ctx, out);
    assert_eq!(merged_estimate, full_estimate);
}

#[test]
fn test_estimators_hash_decimals_at_declared_width() {
    // Two decimals that agree at the declared width must update the same
    // register even when an inactive width disagrees.
    let arg = TypeDesc::decimal(9, 0);
    let mut ctx = FnContext::new(vec![arg], TypeDesc::simple(TypeKind::String));
    let mut a = StringVal::null();
    hll::init(&mut ctx, &mut a);
    hll::update(&mut ctx, &DecimalVal::new4(42), &mut a).unwrap();

    let mut b = StringVal::null();
    hll::init(&mut ctx, &mut b);
    let mut dup = DecimalVal::new4(42);
    dup.val16 = 999;
    hll::update(&mut ctx, &dup, &mut b).unwrap();

    assert_eq!(a.as_bytes(), b.as_bytes());
    ctx.free(a.ptr);
    ctx.free(b.ptr);
}
