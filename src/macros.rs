//! # Internal Macros
//!
//! ## be_accessors!
//!
//! Generates getter and setter methods for zerocopy struct fields stored in
//! big-endian wrapper types (`U16`, `I32`). Both buffer headers use it.
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::big_endian::{I32, U16};
//!
//! #[repr(C)]
//! struct Header {
//!     num_fields: U16,
//!     num_records: I32,
//! }
//!
//! impl Header {
//!     be_accessors! {
//!         num_fields: u16,
//!         num_records: i32,
//!     }
//! }
//!
//! // Generates:
//! // pub fn num_fields(&self) -> u16 { self.num_fields.get() }
//! // pub fn set_num_fields(&mut self, val: u16) { self.num_fields = U16::new(val); }
//! // pub fn num_records(&self) -> i32 { self.num_records.get() }
//! // pub fn set_num_records(&mut self, val: i32) { self.num_records = I32::new(val); }
//! ```

/// Generates getter and setter methods for zerocopy big-endian fields.
#[macro_export]
macro_rules! be_accessors {
    (@impl $field:ident, u16) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> u16 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: u16) {
                self.$field = ::zerocopy::big_endian::U16::new(val);
            }
        }
    };
    (@impl $field:ident, i32) => {
        ::paste::paste! {
            #[inline]
            pub fn $field(&self) -> i32 {
                self.$field.get()
            }

            #[inline]
            pub fn [<set_ $field>](&mut self, val: i32) {
                self.$field = ::zerocopy::big_endian::I32::new(val);
            }
        }
    };
    ($($field:ident : $ty:tt),* $(,)?) => {
        $(
            $crate::be_accessors!(@impl $field, $ty);
        )*
    };
}
