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
use crate::exec::expr::values::{AnyVal, BigIntVal};
use crate::runtime::context::FnContext;

/// COUNT starts at zero and never goes null; the state is the result.
pub fn init(_ctx: &mut FnContext, dst: &mut BigIntVal) {
    dst.is_null = false;
    dst.val = 0;
}

pub fn update<T: AnyVal>(_ctx: &mut FnContext, src: &T, dst: &mut BigIntVal) {
    debug_assert!(!dst.is_null);
    if !src.is_null() {
        dst.val += 1;
    }
}

/// COUNT(*) counts every row, null or not.
pub fn count_star_update(_ctx: &mut FnContext, dst: &mut BigIntVal) {
    debug_assert!(!dst.is_null);
    dst.val += 1;
}

pub fn merge(_ctx: &mut FnContext, src: &BigIntVal, dst: &mut BigIntVal) {
    debug_assert!(!dst.is_null);
    debug_assert!(!src.is_null);
    dst.val += src.val;
}
