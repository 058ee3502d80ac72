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
use std::mem::size_of;

use crate::exec::expr::values::StringVal;
use crate::runtime::context::FnContext;

/// Allocate a zeroed state blob sized for `T`'s in-memory layout.
pub(super) fn init_fixed_state<T>(ctx: &mut FnContext, dst: &mut StringVal) {
    let len = size_of::<T>();
    dst.is_null = false;
    dst.ptr = ctx.allocate(len);
    dst.len = len;
}

/// Checked cast of a state blob to its typed layout. Length mismatch and
/// null states are caller-contract violations and terminate the worker.
pub(super) unsafe fn state_ref<'a, T>(sv: &StringVal) -> &'a T {
    assert!(!sv.is_null && !sv.ptr.is_null(), "null aggregate state");
    assert_eq!(sv.len, size_of::<T>(), "aggregate state length mismatch");
    &*(sv.ptr as *const T)
}

pub(super) unsafe fn state_mut<'a, T>(sv: &StringVal) -> &'a mut T {
    assert!(!sv.is_null && !sv.ptr.is_null(), "null aggregate state");
    assert_eq!(sv.len, size_of::<T>(), "aggregate state length mismatch");
    &mut *(sv.ptr as *mut T)
}

/// Raw view of a state blob of exactly `len` bytes.
pub(super) unsafe fn state_bytes_mut<'a>(sv: &StringVal, len: usize) -> &'a mut [u8] {
    assert!(!sv.is_null && !sv.ptr.is_null(), "null aggregate state");
    assert_eq!(sv.len, len, "aggregate state length mismatch");
    std::slice::from_raw_parts_mut(sv.ptr, len)
}

/// Copy `bytes` into a fresh context allocation.
pub(super) fn alloc_string(ctx: &mut FnContext, bytes: &[u8]) -> StringVal {
    let ptr = ctx.allocate(bytes.len());
    if !bytes.is_empty() {
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
    }
    StringVal::new(ptr, bytes.len())
}

/// Allocate a text result owned by the context.
pub fn string_result(ctx: &mut FnContext, text: &str) -> StringVal {
    alloc_string(ctx, text.as_bytes())
}

/// Serialize-or-finalize for states whose in-memory bytes are already the
/// wire format: copy them out and free the input blob.
pub fn copy_serialize(ctx: &mut FnContext, src: StringVal) -> StringVal {
    if src.is_null {
        return src;
    }
    let out = alloc_string(ctx, src.as_bytes());
    ctx.free(src.ptr);
    out
}
