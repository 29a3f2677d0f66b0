// SPDX-License-Identifier: MIT

//! Standalone HID value types. Most of these are simple wrappers around their
//! underlying integer type and exist for type safety only.
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).

use bitflags::bitflags;

/// Creates a `From<Foo> for u32` and `From<u32> for Foo` implementation for the given `Foo` type.
/// Use like this: `impl_from(Foo, Foo, u32)`.
macro_rules! impl_from {
    ($tipo:ty, $tipo_expr:expr, $to:ty) => {
        impl From<$tipo> for $to {
            fn from(f: $tipo) -> $to {
                f.0
            }
        }
        impl From<&$tipo> for $to {
            fn from(f: &$tipo) -> $to {
                f.0
            }
        }
        impl From<$to> for $tipo {
            fn from(f: $to) -> Self {
                $tipo_expr(f)
            }
        }
    };
}

/// Creates a `impl Display for Foo` that just converts into the underlying number.
/// Use like this: `impl_fmt(Foo, u32)`.
macro_rules! impl_fmt {
    ($tipo:ty, $to:ty) => {
        impl std::fmt::Display for $tipo {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let v: $to = self.into();
                write!(f, "{v}")
            }
        }
    };
}

/// Creates a `Foo::signed(nbytes)` that reads the stored value as a two's
/// complement number of `nbytes` bytes.
/// Use like this: `impl_signed(Foo)`.
macro_rules! impl_signed {
    ($tipo:ty) => {
        impl $tipo {
            /// The value as a two's complement number of `nbytes` bytes,
            /// the width it was encoded with in the report descriptor.
            /// Any width other than 1 or 2 returns the value unchanged.
            pub fn signed(&self, nbytes: usize) -> i32 {
                match nbytes {
                    1 => i32::from(self.0 as u8 as i8),
                    2 => i32::from(self.0 as u16 as i16),
                    _ => self.0,
                }
            }
        }
    };
}

// ---------- GLOBAL ITEMS ---------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsagePage(pub u16);

impl_from!(UsagePage, UsagePage, u16);
impl_fmt!(UsagePage, u16);

#[cfg(feature = "hut")]
impl<T: hut::AsUsagePage> From<&T> for UsagePage {
    fn from(up: &T) -> UsagePage {
        UsagePage(up.usage_page_value())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMinimum(pub i32);

impl_from!(LogicalMinimum, LogicalMinimum, i32);
impl_fmt!(LogicalMinimum, i32);
impl_signed!(LogicalMinimum);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogicalMaximum(pub i32);

impl_from!(LogicalMaximum, LogicalMaximum, i32);
impl_fmt!(LogicalMaximum, i32);
impl_signed!(LogicalMaximum);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMinimum(pub i32);

impl_from!(PhysicalMinimum, PhysicalMinimum, i32);
impl_fmt!(PhysicalMinimum, i32);
impl_signed!(PhysicalMinimum);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicalMaximum(pub i32);

impl_from!(PhysicalMaximum, PhysicalMaximum, i32);
impl_fmt!(PhysicalMaximum, i32);
impl_signed!(PhysicalMaximum);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unit(pub u32);

impl_from!(Unit, Unit, u32);
impl_fmt!(Unit, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitExponent(pub i32);

impl_from!(UnitExponent, UnitExponent, i32);
impl_fmt!(UnitExponent, i32);
impl_signed!(UnitExponent);

/// The width of a single field in bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSize(pub usize);

impl_from!(ReportSize, ReportSize, usize);
impl_fmt!(ReportSize, usize);

/// A report ID. A descriptor without any Report ID item uses the
/// report ID 0 for all of its fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReportId(pub u8);

impl_from!(ReportId, ReportId, u8);
impl_fmt!(ReportId, u8);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportCount(pub usize);

impl_from!(ReportCount, ReportCount, usize);
impl_fmt!(ReportCount, usize);

// ----------------- LOCAL ITEMS --------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct UsageId(pub u16);

impl_from!(UsageId, UsageId, u16);
impl_fmt!(UsageId, u16);

/// A full 32-bit usage: the Usage Page in the upper 16 bits and the
/// Usage ID in the lower 16 bits (Section 6.2.2.8).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Usage(pub u32);

impl_from!(Usage, Usage, u32);

impl Usage {
    pub fn from_parts(usage_page: UsagePage, usage_id: UsageId) -> Usage {
        Usage((u32::from(u16::from(usage_page)) << 16) | u32::from(u16::from(usage_id)))
    }

    pub fn usage_page(&self) -> UsagePage {
        UsagePage((self.0 >> 16) as u16)
    }

    pub fn usage_id(&self) -> UsageId {
        UsageId((self.0 & 0xffff) as u16)
    }
}

impl From<UsagePage> for Usage {
    /// The usage with the given page and a zero Usage ID. Array fields
    /// without an explicit usage carry this value.
    fn from(usage_page: UsagePage) -> Usage {
        Usage::from_parts(usage_page, UsageId(0))
    }
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}/{:04x}", self.usage_page().0, self.usage_id().0)
    }
}

#[cfg(feature = "hut")]
impl<T: hut::AsUsage> From<&T> for Usage {
    fn from(usage: &T) -> Usage {
        Usage(usage.usage_value())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringIndex(pub u32);

impl_from!(StringIndex, StringIndex, u32);
impl_fmt!(StringIndex, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringMinimum(pub u32);

impl_from!(StringMinimum, StringMinimum, u32);
impl_fmt!(StringMinimum, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringMaximum(pub u32);

impl_from!(StringMaximum, StringMaximum, u32);
impl_fmt!(StringMaximum, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesignatorIndex(pub u32);

impl_from!(DesignatorIndex, DesignatorIndex, u32);
impl_fmt!(DesignatorIndex, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesignatorMinimum(pub u32);

impl_from!(DesignatorMinimum, DesignatorMinimum, u32);
impl_fmt!(DesignatorMinimum, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesignatorMaximum(pub u32);

impl_from!(DesignatorMaximum, DesignatorMaximum, u32);
impl_fmt!(DesignatorMaximum, u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delimiter(pub u32);

impl_from!(Delimiter, Delimiter, u32);
impl_fmt!(Delimiter, u32);

// ----------------- MAIN ITEMS --------------------

bitflags! {
    /// The data bits of an Input, Output or Feature item, see Section 6.2.2.5.
    /// Bit 7 is reserved for Input items and means "volatile" for
    /// Output and Feature items.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u32 {
        const CONSTANT = 1 << 0;
        const VARIABLE = 1 << 1;
        const RELATIVE = 1 << 2;
        const WRAP = 1 << 3;
        const NONLINEAR = 1 << 4;
        const NO_PREFERRED_STATE = 1 << 5;
        const NULL_STATE = 1 << 6;
        const VOLATILE = 1 << 7;
        const BUFFERED_BYTES = 1 << 8;
    }
}

impl From<u32> for ItemFlags {
    fn from(bits: u32) -> ItemFlags {
        ItemFlags::from_bits_retain(bits)
    }
}
