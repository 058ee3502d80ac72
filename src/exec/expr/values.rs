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

//! Tagged nullable value variants exchanged between the row iterator and
//! the aggregate kernels. Every variant carries `is_null` independent of
//! its payload; string payloads are views into row storage and are only
//! valid for the duration of one update call.

use chrono::{NaiveDate, NaiveTime};

/// Day number of 1970-01-01 in chrono's from-common-era counting.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub const NANOS_PER_SEC: i64 = 1_000_000_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_PER_DAY: i64 = NANOS_PER_SEC * SECONDS_PER_DAY;

/// Common surface of every value variant.
pub trait AnyVal: Copy {
    fn null() -> Self;
    fn is_null(&self) -> bool;
}

/// Variants backed by a single primitive, ordered by that primitive.
pub trait PrimVal: AnyVal {
    type Prim: Copy + PartialOrd;

    fn value(&self) -> Self::Prim;
    fn set_value(&mut self, v: Self::Prim);
    /// Clear the null flag and zero the payload.
    fn init_zero(&mut self);
}

/// Primitive variants that participate in floating-point accumulation.
pub trait NumericVal: PrimVal {
    fn as_f64(&self) -> f64;
}

macro_rules! numeric_val {
    ($(#[$doc:meta])* $name:ident, $prim:ty) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        pub struct $name {
            pub is_null: bool,
            pub val: $prim,
        }

        impl $name {
            pub fn new(val: $prim) -> Self {
                Self {
                    is_null: false,
                    val,
                }
            }
        }

        impl AnyVal for $name {
            fn null() -> Self {
                Self {
                    is_null: true,
                    val: Default::default(),
                }
            }

            fn is_null(&self) -> bool {
                self.is_null
            }
        }

        impl PrimVal for $name {
            type Prim = $prim;

            fn value(&self) -> $prim {
                self.val
            }

            fn set_value(&mut self, v: $prim) {
                self.is_null = false;
                self.val = v;
            }

            fn init_zero(&mut self) {
                self.is_null = false;
                self.val = Default::default();
            }
        }

        impl NumericVal for $name {
            fn as_f64(&self) -> f64 {
                self.val as f64
            }
        }
    };
}

numeric_val!(TinyIntVal, i8);
numeric_val!(SmallIntVal, i16);
numeric_val!(IntVal, i32);
numeric_val!(BigIntVal, i64);
numeric_val!(FloatVal, f32);
numeric_val!(DoubleVal, f64);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BooleanVal {
    pub is_null: bool,
    pub val: bool,
}

impl BooleanVal {
    pub fn new(val: bool) -> Self {
        Self {
            is_null: false,
            val,
        }
    }
}

impl AnyVal for BooleanVal {
    fn null() -> Self {
        Self {
            is_null: true,
            val: false,
        }
    }

    fn is_null(&self) -> bool {
        self.is_null
    }
}

impl PrimVal for BooleanVal {
    type Prim = bool;

    fn value(&self) -> bool {
        self.val
    }

    fn set_value(&mut self, v: bool) {
        self.is_null = false;
        self.val = v;
    }

    fn init_zero(&mut self) {
        self.is_null = false;
        self.val = false;
    }
}

/// Timestamp split into a day number and nanoseconds within the day.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimestampVal {
    pub is_null: bool,
    pub date: i32,
    pub time_of_day: i64,
}

impl TimestampVal {
    pub fn new(date: i32, time_of_day: i64) -> Self {
        Self {
            is_null: false,
            date,
            time_of_day,
        }
    }

    /// Seconds-since-epoch double used by timestamp averaging.
    pub fn to_seconds(&self) -> f64 {
        self.date as f64 * SECONDS_PER_DAY as f64 + self.time_of_day as f64 * 1e-9
    }

    /// Inverse of [`to_seconds`]. Sub-nanosecond residue rounds to the
    /// nearest nanosecond.
    pub fn from_seconds(secs: f64) -> Self {
        let mut date = (secs / SECONDS_PER_DAY as f64).floor();
        let mut nanos =
            ((secs - date * SECONDS_PER_DAY as f64) * NANOS_PER_SEC as f64).round() as i64;
        if nanos >= NANOS_PER_DAY {
            nanos -= NANOS_PER_DAY;
            date += 1.0;
        }
        Self {
            is_null: false,
            date: date as i32,
            time_of_day: nanos,
        }
    }

    pub fn to_display_string(&self) -> String {
        let date = NaiveDate::from_num_days_from_ce_opt(EPOCH_DAYS_FROM_CE + self.date)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        let secs = (self.time_of_day / NANOS_PER_SEC) as u32;
        let nanos = (self.time_of_day % NANOS_PER_SEC) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
            .unwrap_or_else(|| NaiveTime::from_num_seconds_from_midnight_opt(0, 0).unwrap());
        format!(
            "{} {}",
            date.format("%Y-%m-%d"),
            time.format("%H:%M:%S%.9f")
        )
    }
}

impl AnyVal for TimestampVal {
    fn null() -> Self {
        Self {
            is_null: true,
            date: 0,
            time_of_day: 0,
        }
    }

    fn is_null(&self) -> bool {
        self.is_null
    }
}

/// Byte-string view. The pointed-to bytes are row-scoped and not owned by
/// the value; kernels that retain a string copy it into scratch memory.
#[derive(Clone, Copy, Debug)]
pub struct StringVal {
    pub is_null: bool,
    pub ptr: *mut u8,
    pub len: usize,
}

impl StringVal {
    pub fn new(ptr: *mut u8, len: usize) -> Self {
        Self {
            is_null: false,
            ptr,
            len,
        }
    }

    /// View over caller-owned bytes; the caller keeps them alive for the
    /// duration of the call this value is passed to.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            is_null: false,
            ptr: bytes.as_ptr() as *mut u8,
            len: bytes.len(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        if self.is_null || self.ptr.is_null() {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
        }
    }
}

impl Default for StringVal {
    fn default() -> Self {
        <Self as AnyVal>::null()
    }
}

impl AnyVal for StringVal {
    fn null() -> Self {
        Self {
            is_null: true,
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    fn is_null(&self) -> bool {
        self.is_null
    }
}

/// Decimal with a precision-determined backing width. All three fields are
/// present; the declared precision selects the valid one (<= 9 -> `val4`,
/// <= 19 -> `val8`, otherwise `val16`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecimalVal {
    pub is_null: bool,
    pub val4: i32,
    pub val8: i64,
    pub val16: i128,
}

impl DecimalVal {
    pub fn new4(v: i32) -> Self {
        Self {
            is_null: false,
            val4: v,
            ..Default::default()
        }
    }

    pub fn new8(v: i64) -> Self {
        Self {
            is_null: false,
            val8: v,
            ..Default::default()
        }
    }

    pub fn new16(v: i128) -> Self {
        Self {
            is_null: false,
            val16: v,
            ..Default::default()
        }
    }

    /// Populate every width with the same unscaled value, the way an
    /// overlaid backing would read at any width.
    pub fn from_unscaled(v: i128) -> Self {
        Self {
            is_null: false,
            val4: v as i32,
            val8: v as i64,
            val16: v,
        }
    }

    /// Unscaled value read at the width declared by `precision`.
    pub fn unscaled(&self, precision: u8) -> i128 {
        if precision <= 9 {
            self.val4 as i128
        } else if precision <= 19 {
            self.val8 as i128
        } else {
            self.val16
        }
    }
}

impl AnyVal for DecimalVal {
    fn null() -> Self {
        Self {
            is_null: true,
            ..Default::default()
        }
    }

    fn is_null(&self) -> bool {
        self.is_null
    }
}
