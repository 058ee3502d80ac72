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

//! Intermediate-state layouts and their wire lengths. In-memory states are
//! `#[repr(C)]`; where padding makes the in-memory size differ from the
//! wire length (decimal avg, reservoir), the kernel serializes field-wise
//! instead of raw-copying.

use std::mem::size_of;

/// Wire: sum f64 + count i64.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct AvgState {
    pub sum: f64,
    pub count: i64,
}

pub const AVG_STATE_LEN: usize = 16;

/// Wire: sum i128 + count i64 (24 bytes; the in-memory struct pads to 32).
/// The sum is maintained at the return type's scale.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct DecimalAvgState {
    pub sum: i128,
    pub count: i64,
}

pub const DECIMAL_AVG_STATE_LEN: usize = 24;

/// Wire: mean f64 + m2 f64 + count i64.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct KnuthVarianceState {
    pub mean: f64,
    pub m2: f64,
    pub count: i64,
}

pub const KNUTH_VARIANCE_STATE_LEN: usize = 24;

/// Wire: rank i64 + count i64. Rank starts at 1.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RankState {
    pub rank: i64,
    pub count: i64,
}

pub const RANK_STATE_LEN: usize = 16;

pub const NUM_PC_BITMAPS: usize = 64;
pub const PC_BITMAP_LENGTH: usize = 32;
/// 64 rows x 32 bits.
pub const PC_BITMAP_LEN: usize = NUM_PC_BITMAPS * PC_BITMAP_LENGTH / 8;

pub const HLL_PRECISION: u32 = 10;
/// One byte register per bucket, 2^precision buckets.
pub const HLL_LEN: usize = 1 << HLL_PRECISION;

pub const NUM_BUCKETS: usize = 100;
pub const NUM_SAMPLES_PER_BUCKET: usize = 200;
pub const NUM_SAMPLES: usize = NUM_BUCKETS * NUM_SAMPLES_PER_BUCKET;
pub const MAX_STRING_SAMPLE_LEN: usize = 10;

/// One retained sample. `key` is the weight the sample competes with
/// during merges; -1 marks a sample that has not been weighted yet.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ReservoirSample<P: Copy> {
    pub val: P,
    pub key: f64,
}

/// Reservoir state. Wire: num_samples i32 + source_size i64 + rng_state u64,
/// then the full sample array (packed val + key per slot).
#[repr(C)]
pub struct ReservoirSampleState<P: Copy> {
    pub samples: [ReservoirSample<P>; NUM_SAMPLES],
    pub num_samples: i32,
    pub source_size: i64,
    pub rng_state: u64,
}

pub const RESERVOIR_HEADER_LEN: usize = 20;

/// Fixed-size string sample: a truncated prefix plus the stored length.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct StringSample {
    pub val: [u8; MAX_STRING_SAMPLE_LEN],
    pub len: i32,
}

/// Timestamp sample as its (day, nanos-of-day) split.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampSample {
    pub date: i32,
    pub time_of_day: i64,
}

const _: () = assert!(size_of::<AvgState>() == AVG_STATE_LEN);
const _: () = assert!(size_of::<KnuthVarianceState>() == KNUTH_VARIANCE_STATE_LEN);
const _: () = assert!(size_of::<RankState>() == RANK_STATE_LEN);
