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

//! Typed reservoir sampling with deferred weight assignment, plus the
//! three finalizers that read the sample array: the raw sample list, the
//! equi-depth histogram, and the approximate median.
//!
//! Updates run plain uniform reservoir sampling and leave the weight key
//! at -1. Serialization imputes keys for the unweighted samples so that
//! shards of different sizes merge consistently: a shard of `source_size`
//! rows hands out keys in ((source_size - num_samples) / source_size, 1],
//! approximating the keys a weighted sampler would have assigned to the
//! retained (highest-keyed) samples. Merge then keeps the globally top-k
//! keys with the reservoir held as a min-heap on the key.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::super::kernel::{alloc_string, state_mut, state_ref, string_result};
use super::super::state_types::{
    ReservoirSample, ReservoirSampleState, NUM_BUCKETS, NUM_SAMPLES, RESERVOIR_HEADER_LEN,
};
use super::common::SampleVal;
use crate::exec::expr::values::{AnyVal, StringVal};
use crate::runtime::context::FnContext;

/// Fixed seed starting each state's generator stream.
const RNG_INIT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Wire length of a serialized reservoir holding samples of `T`.
pub fn wire_len<T: SampleVal>() -> usize {
    RESERVOIR_HEADER_LEN + NUM_SAMPLES * (T::PACKED_WIRE_LEN + 8)
}

// The generator state lives in the blob as a single word; each draw seeds
// a generator from it and stores back a fresh word, so transported states
// resume their own stream.
fn draw_inclusive(rng_state: &mut u64, max: i64) -> i64 {
    let mut rng = StdRng::seed_from_u64(*rng_state);
    let r = rng.gen_range(0..=max);
    *rng_state = rng.gen();
    r
}

fn draw_below(rng_state: &mut u64, max: i64) -> i64 {
    let mut rng = StdRng::seed_from_u64(*rng_state);
    let r = rng.gen_range(0..max);
    *rng_state = rng.gen();
    r
}

pub fn init<T: SampleVal>(ctx: &mut FnContext, dst: &mut StringVal) {
    let len = std::mem::size_of::<ReservoirSampleState<T::Packed>>();
    dst.is_null = false;
    dst.ptr = ctx.allocate(len);
    dst.len = len;
    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(dst) };
    state.rng_state = RNG_INIT_SEED;
}

pub fn update<T: SampleVal>(
    ctx: &mut FnContext,
    src: &T,
    dst: &mut StringVal,
) -> Result<(), String> {
    if src.is_null() {
        return Ok(());
    }
    let arg = *ctx
        .arg_type(0)
        .ok_or_else(|| "reservoir sample arg0 type missing".to_string())?;
    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(dst) };
    let sample = ReservoirSample {
        val: src.pack(&arg),
        key: -1.0,
    };
    if (state.num_samples as usize) < NUM_SAMPLES {
        state.samples[state.num_samples as usize] = sample;
        state.num_samples += 1;
    } else {
        let r = draw_inclusive(&mut state.rng_state, state.source_size);
        if (r as usize) < NUM_SAMPLES {
            state.samples[r as usize] = sample;
        }
    }
    state.source_size += 1;
    Ok(())
}

/// Impute weight keys for any still-unweighted sample, then encode the
/// wire blob and free the state.
pub fn serialize<T: SampleVal>(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(&src) };
    for i in 0..state.num_samples as usize {
        if state.samples[i].key >= 0.0 {
            continue;
        }
        let r = draw_below(&mut state.rng_state, state.num_samples as i64);
        state.samples[i].key = (state.source_size - r) as f64 / state.source_size as f64;
    }

    let mut buf = vec![0u8; wire_len::<T>()];
    buf[..4].copy_from_slice(&state.num_samples.to_le_bytes());
    buf[4..12].copy_from_slice(&state.source_size.to_le_bytes());
    buf[12..20].copy_from_slice(&state.rng_state.to_le_bytes());
    let mut pos = RESERVOIR_HEADER_LEN;
    for sample in state.samples.iter() {
        T::write_packed(&sample.val, &mut buf[pos..]);
        pos += T::PACKED_WIRE_LEN;
        buf[pos..pos + 8].copy_from_slice(&sample.key.to_le_bytes());
        pos += 8;
    }

    let out = alloc_string(ctx, &buf);
    ctx.free(src.ptr);
    out
}

pub fn merge<T: SampleVal>(
    _ctx: &mut FnContext,
    src: &StringVal,
    dst: &mut StringVal,
) -> Result<(), String> {
    if src.is_null {
        return Ok(());
    }
    let bytes = src.as_bytes();
    if bytes.len() != wire_len::<T>() {
        return Err(format!(
            "invalid reservoir state length: {}",
            bytes.len()
        ));
    }
    let src_num = i32::from_le_bytes(bytes[..4].try_into().unwrap());
    let src_source = i64::from_le_bytes(bytes[4..12].try_into().unwrap());
    if src_num < 0 || src_num as usize > NUM_SAMPLES {
        return Err(format!("invalid reservoir sample count: {}", src_num));
    }

    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(dst) };
    let mut src_idx = 0usize;
    // Fill the reservoir first; from here on the samples stay heap-ordered
    // with the weakest key at the root.
    while (state.num_samples as usize) < NUM_SAMPLES && src_idx < src_num as usize {
        let sample = read_sample::<T>(bytes, src_idx);
        debug_assert!(sample.key >= 0.0);
        let n = state.num_samples as usize;
        state.samples[n] = sample;
        state.num_samples += 1;
        sift_up(&mut state.samples[..n + 1]);
        src_idx += 1;
    }
    // Then a source sample displaces the root only if it outweighs it.
    while src_idx < src_num as usize {
        let sample = read_sample::<T>(bytes, src_idx);
        debug_assert!(sample.key >= 0.0);
        if sample.key > state.samples[0].key {
            state.samples[0] = sample;
            sift_down(&mut state.samples[..NUM_SAMPLES]);
        }
        src_idx += 1;
    }
    state.source_size += src_source;
    Ok(())
}

/// Samples in stored order, comma separated.
pub fn finalize<T: SampleVal>(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = unsafe { state_ref::<ReservoirSampleState<T::Packed>>(&src) };
    let mut out = String::new();
    for i in 0..state.num_samples as usize {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&T::packed_to_string(&state.samples[i].val));
    }
    ctx.free(src.ptr);
    string_result(ctx, &out)
}

/// Sorts the samples by value and emits the closing value of each of up to
/// `NUM_BUCKETS` equi-count buckets.
pub fn histogram_finalize<T: SampleVal>(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(&src) };
    let n = state.num_samples as usize;
    sort_by_value::<T>(&mut state.samples[..n]);

    let num_buckets = n.min(NUM_BUCKETS);
    let samples_per_bucket = (n / NUM_BUCKETS).max(1);
    let mut out = String::new();
    for bucket_idx in 0..num_buckets {
        let sample_idx = (bucket_idx + 1) * samples_per_bucket - 1;
        if bucket_idx > 0 {
            out.push_str(", ");
        }
        out.push_str(&T::packed_to_string(&state.samples[sample_idx].val));
    }
    ctx.free(src.ptr);
    string_result(ctx, &out)
}

/// Sorts the samples by value and emits the middle one.
pub fn appx_median_finalize<T: SampleVal>(ctx: &mut FnContext, src: StringVal) -> StringVal {
    let state = unsafe { state_mut::<ReservoirSampleState<T::Packed>>(&src) };
    let n = state.num_samples as usize;
    if n == 0 {
        ctx.free(src.ptr);
        return StringVal::null();
    }
    sort_by_value::<T>(&mut state.samples[..n]);
    let text = T::packed_to_string(&state.samples[n / 2].val);
    ctx.free(src.ptr);
    string_result(ctx, &text)
}

fn read_sample<T: SampleVal>(bytes: &[u8], idx: usize) -> ReservoirSample<T::Packed> {
    let stride = T::PACKED_WIRE_LEN + 8;
    let pos = RESERVOIR_HEADER_LEN + idx * stride;
    let val = T::read_packed(&bytes[pos..]);
    let key = f64::from_le_bytes(
        bytes[pos + T::PACKED_WIRE_LEN..pos + T::PACKED_WIRE_LEN + 8]
            .try_into()
            .unwrap(),
    );
    ReservoirSample { val, key }
}

fn sort_by_value<T: SampleVal>(samples: &mut [ReservoirSample<T::Packed>]) {
    samples.sort_unstable_by(|a, b| {
        if T::packed_less(&a.val, &b.val) {
            std::cmp::Ordering::Less
        } else if T::packed_less(&b.val, &a.val) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
}

fn sift_up<P: Copy>(heap: &mut [ReservoirSample<P>]) {
    let mut idx = heap.len() - 1;
    while idx > 0 {
        let parent = (idx - 1) / 2;
        if heap[idx].key < heap[parent].key {
            heap.swap(idx, parent);
            idx = parent;
        } else {
            break;
        }
    }
}

fn sift_down<P: Copy>(heap: &mut [ReservoirSample<P>]) {
    let len = heap.len();
    let mut idx = 0usize;
    loop {
        let left = 2 * idx + 1;
        if left >= len {
            break;
        }
        let mut child = left;
        let right = left + 1;
        if right < len && heap[right].key < heap[left].key {
            child = right;
        }
        if heap[child].key < heap[idx].key {
            heap.swap(idx, child);
            idx = child;
        } else {
            break;
        }
    }
}
