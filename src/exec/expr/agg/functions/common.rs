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

//! Per-variant capabilities of the sampling family: how a value packs into
//! a fixed-size sample slot, how packed samples order, and how they print.

use super::super::state_types::{StringSample, TimestampSample, MAX_STRING_SAMPLE_LEN};
use crate::exec::expr::values::{
    AnyVal, BigIntVal, BooleanVal, DecimalVal, DoubleVal, FloatVal, IntVal, SmallIntVal,
    StringVal, TimestampVal, TinyIntVal,
};
use crate::runtime::context::TypeDesc;

/// Value variants the reservoir family can retain. `Packed` is the
/// fixed-size in-state representation; `PACKED_WIRE_LEN` is its field-wise
/// encoding width on the wire (the 8-byte key is accounted separately).
pub trait SampleVal: AnyVal {
    type Packed: Copy + Default;

    const PACKED_WIRE_LEN: usize;

    fn pack(&self, type_desc: &TypeDesc) -> Self::Packed;
    fn packed_less(a: &Self::Packed, b: &Self::Packed) -> bool;
    fn packed_to_string(p: &Self::Packed) -> String;
    fn write_packed(p: &Self::Packed, buf: &mut [u8]);
    fn read_packed(buf: &[u8]) -> Self::Packed;
}

macro_rules! prim_sample_val {
    ($name:ident, $prim:ty, $wire_len:expr) => {
        impl SampleVal for $name {
            type Packed = $prim;

            const PACKED_WIRE_LEN: usize = $wire_len;

            fn pack(&self, _type_desc: &TypeDesc) -> $prim {
                self.val
            }

            fn packed_less(a: &$prim, b: &$prim) -> bool {
                a < b
            }

            fn packed_to_string(p: &$prim) -> String {
                p.to_string()
            }

            fn write_packed(p: &$prim, buf: &mut [u8]) {
                buf[..$wire_len].copy_from_slice(&p.to_le_bytes());
            }

            fn read_packed(buf: &[u8]) -> $prim {
                <$prim>::from_le_bytes(buf[..$wire_len].try_into().unwrap())
            }
        }
    };
}

prim_sample_val!(TinyIntVal, i8, 1);
prim_sample_val!(SmallIntVal, i16, 2);
prim_sample_val!(IntVal, i32, 4);
prim_sample_val!(BigIntVal, i64, 8);
prim_sample_val!(FloatVal, f32, 4);
prim_sample_val!(DoubleVal, f64, 8);

impl SampleVal for BooleanVal {
    type Packed = u8;

    const PACKED_WIRE_LEN: usize = 1;

    fn pack(&self, _type_desc: &TypeDesc) -> u8 {
        self.val as u8
    }

    fn packed_less(a: &u8, b: &u8) -> bool {
        a < b
    }

    fn packed_to_string(p: &u8) -> String {
        p.to_string()
    }

    fn write_packed(p: &u8, buf: &mut [u8]) {
        buf[0] = *p;
    }

    fn read_packed(buf: &[u8]) -> u8 {
        buf[0]
    }
}

impl SampleVal for StringVal {
    type Packed = StringSample;

    const PACKED_WIRE_LEN: usize = MAX_STRING_SAMPLE_LEN + 4;

    fn pack(&self, _type_desc: &TypeDesc) -> StringSample {
        let bytes = self.as_bytes();
        let len = bytes.len().min(MAX_STRING_SAMPLE_LEN);
        let mut out = StringSample::default();
        out.val[..len].copy_from_slice(&bytes[..len]);
        out.len = len as i32;
        out
    }

    fn packed_less(a: &StringSample, b: &StringSample) -> bool {
        let n = a.len.min(b.len) as usize;
        match a.val[..n].cmp(&b.val[..n]) {
            std::cmp::Ordering::Equal => a.len < b.len,
            ord => ord == std::cmp::Ordering::Less,
        }
    }

    fn packed_to_string(p: &StringSample) -> String {
        String::from_utf8_lossy(&p.val[..p.len as usize]).into_owned()
    }

    fn write_packed(p: &StringSample, buf: &mut [u8]) {
        buf[..MAX_STRING_SAMPLE_LEN].copy_from_slice(&p.val);
        buf[MAX_STRING_SAMPLE_LEN..MAX_STRING_SAMPLE_LEN + 4]
            .copy_from_slice(&p.len.to_le_bytes());
    }

    fn read_packed(buf: &[u8]) -> StringSample {
        let mut out = StringSample::default();
        out.val.copy_from_slice(&buf[..MAX_STRING_SAMPLE_LEN]);
        out.len = i32::from_le_bytes(
            buf[MAX_STRING_SAMPLE_LEN..MAX_STRING_SAMPLE_LEN + 4]
                .try_into()
                .unwrap(),
        );
        out
    }
}

impl SampleVal for TimestampVal {
    type Packed = TimestampSample;

    const PACKED_WIRE_LEN: usize = 12;

    fn pack(&self, _type_desc: &TypeDesc) -> TimestampSample {
        TimestampSample {
            date: self.date,
            time_of_day: self.time_of_day,
        }
    }

    fn packed_less(a: &TimestampSample, b: &TimestampSample) -> bool {
        if a.date == b.date {
            a.time_of_day < b.time_of_day
        } else {
            a.date < b.date
        }
    }

    fn packed_to_string(p: &TimestampSample) -> String {
        TimestampVal::new(p.date, p.time_of_day).to_display_string()
    }

    fn write_packed(p: &TimestampSample, buf: &mut [u8]) {
        buf[..4].copy_from_slice(&p.date.to_le_bytes());
        buf[4..12].copy_from_slice(&p.time_of_day.to_le_bytes());
    }

    fn read_packed(buf: &[u8]) -> TimestampSample {
        TimestampSample {
            date: i32::from_le_bytes(buf[..4].try_into().unwrap()),
            time_of_day: i64::from_le_bytes(buf[4..12].try_into().unwrap()),
        }
    }
}

impl SampleVal for DecimalVal {
    type Packed = i128;

    const PACKED_WIRE_LEN: usize = 16;

    fn pack(&self, type_desc: &TypeDesc) -> i128 {
        self.unscaled(type_desc.precision)
    }

    fn packed_less(a: &i128, b: &i128) -> bool {
        a < b
    }

    /// Samples print the raw unscaled value.
    fn packed_to_string(p: &i128) -> String {
        p.to_string()
    }

    fn write_packed(p: &i128, buf: &mut [u8]) {
        buf[..16].copy_from_slice(&p.to_le_bytes());
    }

    fn read_packed(buf: &[u8]) -> i128 {
        i128::from_le_bytes(buf[..16].try_into().unwrap())
    }
}
