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

//! Aggregate kernels.
//!
//! Every kernel exposes the same contract, each operation taking the
//! function context:
//!
//! - `init(ctx, state)` allocates and zero-initializes the state;
//! - `update(ctx, input, state)` folds one input value into the state and
//!   is a no-op on null input (only `count_star` counts unconditionally);
//! - `merge(ctx, src, state)` folds a peer's serialized state in;
//! - `serialize(ctx, state) -> bytes` produces the transport blob and frees
//!   the input state;
//! - `finalize(ctx, state) -> value` produces the typed result and frees
//!   the state.
//!
//! Kernels whose state is the typed result itself (count, sum, min, max)
//! skip the operations they do not need; for those, merge has the same
//! shape as update and is provided by the same function where the two
//! folds coincide.

mod kernel;
pub use kernel::{copy_serialize, string_result};
mod state_types;
pub use state_types::*;

pub mod functions;
pub use functions::{
    avg, count, hll, max, min, pc, rank, sample, string_concat, sum, variance,
};
