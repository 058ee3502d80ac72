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
use std::alloc::{alloc_zeroed, dealloc, realloc, Layout};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::runtime::mem_tracker::{process_mem_tracker, MemTracker};

/// Value kind of a function argument or return slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Timestamp,
    String,
    Decimal,
}

/// Declared type of an argument or return slot. `precision` and `scale` are
/// only meaningful for decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeDesc {
    pub kind: TypeKind,
    pub precision: u8,
    pub scale: i8,
}

impl TypeDesc {
    pub fn simple(kind: TypeKind) -> Self {
        Self {
            kind,
            precision: 0,
            scale: 0,
        }
    }

    pub fn decimal(precision: u8, scale: i8) -> Self {
        Self {
            kind: TypeKind::Decimal,
            precision,
            scale,
        }
    }

    /// Storage width of the decimal backing selected by the declared
    /// precision.
    pub fn decimal_byte_size(&self) -> usize {
        if self.precision <= 9 {
            4
        } else if self.precision <= 19 {
            8
        } else {
            16
        }
    }
}

// All scratch allocations share one alignment so any kernel state layout can
// live in any blob.
const ALLOC_ALIGN: usize = 16;

/// Per-aggregation execution context handed to every kernel operation.
///
/// Supplies scratch memory for state blobs, argument/return type
/// introspection, and a non-fatal warning channel. Allocations are tracked
/// individually so frees can be balanced against them, and their logical
/// size is reported to the context's memory tracker.
pub struct FnContext {
    arg_types: Vec<TypeDesc>,
    return_type: TypeDesc,
    allocations: HashMap<usize, Layout>,
    mem_tracker: Arc<MemTracker>,
    warnings: Vec<String>,
}

impl FnContext {
    pub fn new(arg_types: Vec<TypeDesc>, return_type: TypeDesc) -> Self {
        let tracker = MemTracker::new_child("agg-fn", &process_mem_tracker());
        Self::with_mem_tracker(arg_types, return_type, tracker)
    }

    pub fn with_mem_tracker(
        arg_types: Vec<TypeDesc>,
        return_type: TypeDesc,
        mem_tracker: Arc<MemTracker>,
    ) -> Self {
        Self {
            arg_types,
            return_type,
            allocations: HashMap::new(),
            mem_tracker,
            warnings: Vec::new(),
        }
    }

    /// Allocate `len` zeroed scratch bytes owned by this context.
    pub fn allocate(&mut self, len: usize) -> *mut u8 {
        let layout = Layout::from_size_align(len.max(1), ALLOC_ALIGN).expect("scratch layout");
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null(), "scratch allocation of {} bytes failed", len);
        self.allocations.insert(ptr as usize, layout);
        self.mem_tracker.consume(layout.size() as i64);
        ptr
    }

    /// Grow or shrink a previous allocation, preserving its prefix. The
    /// returned pointer may differ from the input; the input pointer is
    /// invalid afterwards.
    pub fn reallocate(&mut self, ptr: *mut u8, len: usize) -> *mut u8 {
        if ptr.is_null() {
            return self.allocate(len);
        }
        let old = self
            .allocations
            .remove(&(ptr as usize))
            .expect("reallocate of pointer not owned by this context");
        let new_layout =
            Layout::from_size_align(len.max(1), old.align()).expect("scratch layout");
        let new_ptr = unsafe { realloc(ptr, old, new_layout.size()) };
        assert!(!new_ptr.is_null(), "scratch reallocation to {} bytes failed", len);
        self.allocations.insert(new_ptr as usize, new_layout);
        self.mem_tracker.release(old.size() as i64);
        self.mem_tracker.consume(new_layout.size() as i64);
        new_ptr
    }

    /// Release a previous allocation. Null pointers are ignored.
    pub fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let layout = self
            .allocations
            .remove(&(ptr as usize))
            .expect("free of pointer not owned by this context");
        unsafe { dealloc(ptr, layout) };
        self.mem_tracker.release(layout.size() as i64);
    }

    /// Number of live allocations. Zero once every state has been
    /// serialized or finalized.
    pub fn outstanding_allocations(&self) -> usize {
        self.allocations.len()
    }

    pub fn arg_type(&self, idx: usize) -> Option<&TypeDesc> {
        self.arg_types.get(idx)
    }

    pub fn return_type(&self) -> &TypeDesc {
        &self.return_type
    }

    /// Report a non-fatal condition; the query keeps running.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{}", msg);
        self.warnings.push(msg);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn mem_tracker(&self) -> &Arc<MemTracker> {
        &self.mem_tracker
    }
}

impl Drop for FnContext {
    fn drop(&mut self) {
        // Kernels are required to balance allocations; anything left here is
        // reclaimed so an early bail-out does not leak.
        for (ptr, layout) in self.allocations.drain() {
            unsafe { dealloc(ptr as *mut u8, layout) };
            self.mem_tracker.release(layout.size() as i64);
        }
    }
}
