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
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use caribou::exec::expr::agg::variance;
use caribou::exec::expr::values::*;
use caribou::runtime::context::{FnContext, TypeDesc, TypeKind};

fn double_ctx() -> FnContext {
    FnContext::new(
        vec![TypeDesc::simple(TypeKind::Double)],
        TypeDesc::simple(TypeKind::Double),
    )
}

fn build_state(ctx: &mut FnContext, values: &[f64]) -> StringVal {
    let mut state = StringVal::null();
    variance::init(ctx, &mut state);
    for v in values {
        variance::update(ctx, &DoubleVal::new(*v), &mut state);
    }
    state
}

fn two_phase(
    part1: &[f64],
    part2: &[f64],
    finalize: fn(&mut FnContext, StringVal) -> DoubleVal,
) -> DoubleVal {
    let mut ctx = double_ctx();
    let shard1 = build_state(&mut ctx, part1);
    let blob1 = variance::serialize(&mut ctx, shard1);
    let shard2 = build_state(&mut ctx, part2);
    let blob2 = variance::serialize(&mut ctx, shard2);

    let mut merged = StringVal::null();
    variance::init(&mut ctx, &mut merged);
    variance::merge(&mut ctx, &blob1, &mut merged).unwrap();
    variance::merge(&mut ctx, &blob2, &mut merged).unwrap();
    ctx.free(blob1.ptr);
    ctx.free(blob2.ptr);

    let out = finalize(&mut ctx, merged);
    assert_eq!(ctx.outstanding_allocations(), 0);
    out
}

#[test]
fn test_variance_samp_two_phase() {
    let v = two_phase(&[1.0, 2.0], &[3.0, 4.0], variance::variance_samp_finalize);
    let expected = 5.0 / 3.0;
    assert!((v.val - expected).abs() < 1e-12, "got {}, expected {expected}", v.val);
}

#[test]
fn test_stddev_samp_two_phase() {
    let v = two_phase(&[1.0, 2.0], &[3.0, 4.0], variance::stddev_samp_finalize);
    let expected = (5.0f64 / 3.0).sqrt();
    assert!((v.val - expected).abs() < 1e-12);
}

#[test]
fn test_variance_pop_single_phase() {
    let mut ctx = double_ctx();
    let state = build_state(&mut ctx, &[1.0, 2.0, 3.0, 4.0]);
    let v = variance::variance_pop_finalize(&mut ctx, state);
    assert!((v.val - 1.25).abs() < 1e-12);

    let state = build_state(&mut ctx, &[1.0, 2.0, 3.0, 4.0]);
    let v = variance::stddev_pop_finalize(&mut ctx, state);
    assert!((v.val - 1.25f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_single_row_has_zero_spread() {
    let mut ctx = double_ctx();
    for finalize in [
        variance::variance_samp_finalize,
        variance::variance_pop_finalize,
        variance::stddev_samp_finalize,
        variance::stddev_pop_finalize,
    ] {
        let state = build_state(&mut ctx, &[42.0]);
        let v = finalize(&mut ctx, state);
        assert!(!v.is_null);
        assert_eq!(v.val, 0.0);
    }
}

#[test]
fn test_empty_input_is_null() {
    let mut ctx = double_ctx();
    for finalize in [
        variance::variance_samp_finalize,
        variance::variance_pop_finalize,
        variance::stddev_samp_finalize,
        variance::stddev_pop_finalize,
    ] {
        let mut state = StringVal::null();
        variance::init(&mut ctx, &mut state);
        variance::update(&mut ctx, &DoubleVal::null(), &mut state);
        let v = finalize(&mut ctx, state);
        assert!(v.is_null);
    }
}

#[test]
fn test_welford_matches_two_pass_reference() {
    let mut rng = StdRng::seed_from_u64(17);
    let values: Vec<f64> = (0..10_000).map(|_| rng.gen::<f64>() * 1000.0).collect();

    let mut ctx = double_ctx();
    let state = build_state(&mut ctx, &values);
    let single_pass = variance::variance_pop_finalize(&mut ctx, state).val;

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let two_pass =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;

    let rel = (single_pass - two_pass).abs() / two_pass;
    assert!(rel <= 1e-10, "relative error {rel}");
}

#[test]
fn test_merge_is_commutative() {
    let a = two_phase(&[1.0, 5.0, 9.0], &[2.0, 2.0], variance::variance_samp_finalize);
    let b = two_phase(&[2.0, 2.0], &[1.0, 5.0, 9.0], variance::variance_samp_finalize);
    assert!((a.val - b.val).abs() <= 1e-9 * a.val.abs().max(1.0));
}

#[test]
fn test_merge_into_empty_adopts_source() {
    let mut ctx = double_ctx();
    let shard = build_state(&mut ctx, &[3.0, 7.0]);
    let blob = variance::serialize(&mut ctx, shard);

    let mut merged = StringVal::null();
    variance::init(&mut ctx, &mut merged);
    variance::merge(&mut ctx, &blob, &mut merged).unwrap();
    ctx.free(blob.ptr);

    let v = variance::variance_samp_finalize(&mut ctx, merged);
    assert!((v.val - 8.0).abs() < 1e-12);
}
