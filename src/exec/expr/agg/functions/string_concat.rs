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

//! String concatenation with a self-describing intermediate state: the
//! first four bytes hold the length of the first delimiter, and the tape
//! that follows is (delimiter)(value)(delimiter)(value)... beginning with a
//! leading delimiter copy that finalization strips. Merging appends a
//! peer's tape without its header, so the delimiter of the first shard to
//! arrive decides what gets stripped.

use super::super::kernel::alloc_string;
use crate::exec::expr::values::StringVal;
use crate::runtime::context::FnContext;

/// Delimiter to use if the separator is null.
pub const DEFAULT_DELIM: &[u8] = b", ";

const HEADER_LEN: usize = 4;

pub fn init(_ctx: &mut FnContext, dst: &mut StringVal) {
    *dst = StringVal {
        is_null: true,
        ptr: std::ptr::null_mut(),
        len: 0,
    };
}

pub fn update(
    ctx: &mut FnContext,
    src: &StringVal,
    separator: &StringVal,
    dst: &mut StringVal,
) {
    if src.is_null {
        return;
    }
    let sep: &[u8] = if separator.is_null {
        DEFAULT_DELIM
    } else {
        separator.as_bytes()
    };
    if dst.is_null {
        let ptr = ctx.allocate(HEADER_LEN);
        unsafe {
            std::ptr::copy_nonoverlapping((sep.len() as i32).to_le_bytes().as_ptr(), ptr, 4)
        };
        *dst = StringVal::new(ptr, HEADER_LEN);
    }
    append(ctx, dst, sep);
    append(ctx, dst, src.as_bytes());
}

pub fn merge(ctx: &mut FnContext, src: &StringVal, dst: &mut StringVal) {
    if src.is_null {
        return;
    }
    let src_bytes = src.as_bytes();
    assert!(src_bytes.len() >= HEADER_LEN, "string concat state too short");
    if dst.is_null {
        // Adopt the header of the first intermediate to arrive.
        let ptr = ctx.allocate(HEADER_LEN);
        unsafe { std::ptr::copy_nonoverlapping(src_bytes.as_ptr(), ptr, HEADER_LEN) };
        *dst = StringVal::new(ptr, HEADER_LEN);
    }
    append(ctx, dst, &src_bytes[HEADER_LEN..]);
}

/// The tape is already transport-shaped; copy it out and free the state.
pub fn serialize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    if src.is_null {
        return src;
    }
    let out = alloc_string(ctx, src.as_bytes());
    ctx.free(src.ptr);
    out
}

/// Strip the header and the leading delimiter, returning the joined tape.
pub fn finalize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    if src.is_null {
        return src;
    }
    let bytes = src.as_bytes();
    assert!(bytes.len() >= HEADER_LEN, "string concat state too short");
    let sep_len = i32::from_le_bytes(bytes[..HEADER_LEN].try_into().unwrap()) as usize;
    assert!(
        bytes.len() >= HEADER_LEN + sep_len,
        "string concat state shorter than its first delimiter"
    );
    let out = alloc_string(ctx, &bytes[HEADER_LEN + sep_len..]);
    ctx.free(src.ptr);
    out
}

fn append(ctx: &mut FnContext, dst: &mut StringVal, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    let new_len = dst.len + bytes.len();
    dst.ptr = ctx.reallocate(dst.ptr, new_len);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst.ptr.add(dst.len), bytes.len())
    };
    dst.len = new_len;
}
