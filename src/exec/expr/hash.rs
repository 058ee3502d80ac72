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

//! Seeded value hashing for the distinct-count estimators. Decimals hash
//! the backing width selected by their declared precision, so two decimals
//! compare equal iff they hash equal.

use twox_hash::{XxHash32, XxHash64};

use super::values::{
    BigIntVal, BooleanVal, DecimalVal, DoubleVal, FloatVal, IntVal, SmallIntVal, StringVal,
    TimestampVal, TinyIntVal,
};
use crate::runtime::context::TypeDesc;

/// Fixed seed for the 64-bit hasher (the FNV-64 offset basis).
pub const FNV64_SEED: u64 = 0xcbf2_9ce4_8422_2325;

pub fn hash32_bytes(data: &[u8], seed: u32) -> u32 {
    XxHash32::oneshot(seed, data)
}

pub fn hash64_bytes(data: &[u8], seed: u64) -> u64 {
    XxHash64::oneshot(seed, data)
}

/// Seeded hashing over the canonical byte representation of a value.
pub trait ValueHash {
    fn hash32(&self, type_desc: &TypeDesc, seed: u32) -> u32;
    fn hash64(&self, type_desc: &TypeDesc, seed: u64) -> u64;
}

macro_rules! hash_le_bytes {
    ($name:ident) => {
        impl ValueHash for $name {
            fn hash32(&self, _type_desc: &TypeDesc, seed: u32) -> u32 {
                hash32_bytes(&self.val.to_le_bytes(), seed)
            }

            fn hash64(&self, _type_desc: &TypeDesc, seed: u64) -> u64 {
                hash64_bytes(&self.val.to_le_bytes(), seed)
            }
        }
    };
}

hash_le_bytes!(TinyIntVal);
hash_le_bytes!(SmallIntVal);
hash_le_bytes!(IntVal);
hash_le_bytes!(BigIntVal);
hash_le_bytes!(FloatVal);
hash_le_bytes!(DoubleVal);

impl ValueHash for BooleanVal {
    fn hash32(&self, _type_desc: &TypeDesc, seed: u32) -> u32 {
        hash32_bytes(&[self.val as u8], seed)
    }

    fn hash64(&self, _type_desc: &TypeDesc, seed: u64) -> u64 {
        hash64_bytes(&[self.val as u8], seed)
    }
}

impl ValueHash for StringVal {
    fn hash32(&self, _type_desc: &TypeDesc, seed: u32) -> u32 {
        hash32_bytes(self.as_bytes(), seed)
    }

    fn hash64(&self, _type_desc: &TypeDesc, seed: u64) -> u64 {
        hash64_bytes(self.as_bytes(), seed)
    }
}

fn timestamp_bytes(v: &TimestampVal) -> [u8; 12] {
    let mut buf = [0u8; 12];
    buf[..4].copy_from_slice(&v.date.to_le_bytes());
    buf[4..].copy_from_slice(&v.time_of_day.to_le_bytes());
    buf
}

impl ValueHash for TimestampVal {
    fn hash32(&self, _type_desc: &TypeDesc, seed: u32) -> u32 {
        hash32_bytes(&timestamp_bytes(self), seed)
    }

    fn hash64(&self, _type_desc: &TypeDesc, seed: u64) -> u64 {
        hash64_bytes(&timestamp_bytes(self), seed)
    }
}

fn decimal_bytes(v: &DecimalVal, type_desc: &TypeDesc, buf: &mut [u8; 16]) -> usize {
    match type_desc.decimal_byte_size() {
        4 => {
            buf[..4].copy_from_slice(&v.val4.to_le_bytes());
            4
        }
        8 => {
            buf[..8].copy_from_slice(&v.val8.to_le_bytes());
            8
        }
        _ => {
            buf.copy_from_slice(&v.val16.to_le_bytes());
            16
        }
    }
}

impl ValueHash for DecimalVal {
    fn hash32(&self, type_desc: &TypeDesc, seed: u32) -> u32 {
        let mut buf = [0u8; 16];
        let len = decimal_bytes(self, type_desc, &mut buf);
        hash32_bytes(&buf[..len], seed)
    }

    fn hash64(&self, type_desc: &TypeDesc, seed: u64) -> u64 {
        let mut buf = [0u8; 16];
        let len = decimal_bytes(self, type_desc, &mut buf);
        hash64_bytes(&buf[..len], seed)
    }
}
