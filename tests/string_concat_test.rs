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
use caribou::exec::expr::agg::string_concat;
use caribou::exec::expr::values::*;
use caribou::runtime::context::{FnContext, TypeDesc, TypeKind};

fn string_ctx() -> FnContext {
    FnContext::new(
        vec![
            TypeDesc::simple(TypeKind::String),
            TypeDesc::simple(TypeKind::String),
        ],
        TypeDesc::simple(TypeKind::String),
    )
}

fn update_str(ctx: &mut FnContext, src: &str, sep: Option<&str>, dst: &mut StringVal) {
    let src = StringVal::from_bytes(src.as_bytes());
    let sep = match sep {
        Some(s) => StringVal::from_bytes(s.as_bytes()),
        None => StringVal::null(),
    };
    string_concat::update(ctx, &src, &sep, dst);
}

fn text(ctx: &mut FnContext, out: StringVal) -> String {
    let s = String::from_utf8(out.as_bytes().to_vec()).unwrap();
    ctx.free(out.ptr);
    s
}

#[test]
fn test_concat_strips_header_and_leading_delimiter() {
    let mut ctx = string_ctx();
    let mut state = StringVal::null();
    string_concat::init(&mut ctx, &mut state);
    for v in ["x", "y", "z"] {
        update_str(&mut ctx, v, Some("|"), &mut state);
    }
    let out = string_concat::finalize(&mut ctx, state);
    let out = text(&mut ctx, out);
    assert_eq!(out, "x|y|z");
    assert_eq!(ctx.outstanding_allocations(), 0);
}

#[test]
fn test_null_separator_uses_default() {
    let mut ctx = string_ctx();
    let mut state = StringVal::null();
    string_concat::init(&mut ctx, &mut state);
    update_str(&mut ctx, "x", None, &mut state);
    update_str(&mut ctx, "y", None, &mut state);
    let out = string_concat::finalize(&mut ctx, state);
    let out = text(&mut ctx, out);
    assert_eq!(out, "x, y");
}

#[test]
fn test_null_input_is_a_noop() {
    let mut ctx = string_ctx();
    let mut state = StringVal::null();
    string_concat::init(&mut ctx, &mut state);
    string_concat::update(
        &mut ctx,
        &StringVal::null(),
        &StringVal::from_bytes(b"|"),
        &mut state,
    );
    assert!(state.is_null);
    let out = string_concat::finalize(&mut ctx, state);
    assert!(out.is_null);
}

#[test]
fn test_merge_joins_shards_with_shared_delimiter() {
    let mut ctx = string_ctx();

    let mut shard1 = StringVal::null();
    string_concat::init(&mut ctx, &mut shard1);
    update_str(&mut ctx, "a", Some("|"), &mut shard1);
    let blob1 = string_concat::serialize(&mut ctx, shard1);

    let mut shard2 = StringVal::null();
    string_concat::init(&mut ctx, &mut shard2);
    update_str(&mut ctx, "b", Some("|"), &mut shard2);
    let blob2 = string_concat::serialize(&mut ctx, shard2);

    let mut merged = StringVal::null();
    string_concat::init(&mut ctx, &mut merged);
    string_concat::merge(&mut ctx, &blob1, &mut merged);
    string_concat::merge(&mut ctx, &blob2, &mut merged);
    ctx.free(blob1.ptr);
    ctx.free(blob2.ptr);

    let out = string_concat::finalize(&mut ctx, merged);
    let out = text(&mut ctx, out);
    assert_eq!(out, "a|b");
    assert_eq!(ctx.outstanding_allocations(), 0);
}

#[test]
fn test_first_shard_delimiter_decides_the_strip() {
    let mut ctx = string_ctx();

    // First shard used a two-byte delimiter, the second a one-byte one.
    let mut shard1 = StringVal::null();
    string_concat::init(&mut ctx, &mut shard1);
    update_str(&mut ctx, "a", Some("||"), &mut shard1);
    let blob1 = string_concat::serialize(&mut ctx, shard1);

    let mut shard2 = StringVal::null();
    string_concat::init(&mut ctx, &mut shard2);
    update_str(&mut ctx, "b", Some("-"), &mut shard2);
    let blob2 = string_concat::serialize(&mut ctx, shard2);

    let mut merged = StringVal::null();
    string_concat::init(&mut ctx, &mut merged);
    string_concat::merge(&mut ctx, &blob1, &mut merged);
    string_concat::merge(&mut ctx, &blob2, &mut merged);
    ctx.free(blob1.ptr);
    ctx.free(blob2.ptr);

    let out = string_concat::finalize(&mut ctx, merged);
    let out = text(&mut ctx, out);
    assert_eq!(out, "a-b");
}

#[test]
fn test_mixed_delimiters_within_one_state_are_kept_verbatim() {
    let mut ctx = string_ctx();
    let mut state = StringVal::null();
    string_concat::init(&mut ctx, &mut state);
    update_str(&mut ctx, "a", Some("|"), &mut state);
    update_str(&mut ctx, "b", Some("-"), &mut state);
    let out = string_concat::finalize(&mut ctx, state);
    let out = text(&mut ctx, out);
    assert_eq!(out, "a-b");
}
