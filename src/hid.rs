// SPDX-License-Identifier: MIT

//! Decoding of the raw items in a HID report descriptor. The [Tokenizer]
//! walks the descriptor bytes and hands out one typed item at a time, the
//! item state table is maintained by the [Parser](crate::Parser).
//!
//! In this document and unless stated otherwise, a reference to "Section a.b.c" refers to the
//! [HID Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111).
//!
//! # Tokenizing HID Report Descriptors
//!
//! ```
//! # use hidparse::hid::*;
//! let bytes = [0x05, 0x01, 0x09, 0x02, 0xa1, 0x01, 0xc0];
//! for rdesc_item in Tokenizer::new(&bytes) {
//!     let rdesc_item = rdesc_item.unwrap();
//!     match rdesc_item.item().item_type() {
//!         ItemType::Main(MainItem::Collection(c)) => {
//!             println!("Collection {c:?} at offset {}", rdesc_item.offset())
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use crate::types::*;
use crate::{ensure, ParserError};

use thiserror::Error;
use tracing::trace;

/// The header byte marking a long item, see Section 6.2.2.3.
pub const LONG_ITEM_HEADER: u8 = 0b11111110;

/// Splits the bytes of a short item into its header byte and data value.
fn header_and_value(bytes: &[u8]) -> Result<(u8, HidValue)> {
    match bytes.split_first() {
        Some((header, data)) => Ok((*header, HidValue::try_from(data)?)),
        None => Err(HidError::InsufficientData {
            needed: 1,
            available: 0,
        }),
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum HidError {
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
    #[error("Insufficient data: need {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

type Result<T> = std::result::Result<T, HidError>;

/// The little-endian value of the 0, 1, 2 or 4 data bytes of a short item.
/// The value is unsigned. The byte count is kept because it decides
/// whether a usage carries its own Usage Page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HidValue {
    value: u32,
    nbytes: usize,
}

impl HidValue {
    pub fn len(&self) -> usize {
        self.nbytes
    }

    pub fn is_empty(&self) -> bool {
        self.nbytes == 0
    }
}

impl TryFrom<&[u8]> for HidValue {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<HidValue> {
        ensure!(
            matches!(bytes.len(), 0 | 1 | 2 | 4),
            HidError::InvalidData {
                message: format!("Unsupported data length {}", bytes.len()),
            }
        );
        let value = bytes
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
        Ok(HidValue {
            value,
            nbytes: bytes.len(),
        })
    }
}

impl From<HidValue> for u32 {
    fn from(v: HidValue) -> u32 {
        v.value
    }
}

impl From<HidValue> for u16 {
    /// The lower 16 bits only.
    fn from(v: HidValue) -> u16 {
        v.value as u16
    }
}

impl From<HidValue> for usize {
    fn from(v: HidValue) -> usize {
        v.value as usize
    }
}

/// The type of a HID item may be one of [MainItem], [GlobalItem], or [LocalItem].
///
/// The special types [ItemType::Long] and [ItemType::Reserved] are placeholders
/// for long items and for short items of the reserved type 3. Neither affects
/// the item state table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemType {
    Main(MainItem),
    Global(GlobalItem),
    Local(LocalItem),
    Long,
    Reserved,
}

/// Main Items, see Section 6.2.2.4
///
/// > Main items are used to either define or group certain types of data fields within a
/// > Report descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MainItem {
    Input(ItemFlags),
    Output(ItemFlags),
    Feature(ItemFlags),
    Collection(CollectionItem),
    EndCollection,
    /// A main item with an undefined tag (upper 4 bits of the header)
    Reserved { tag: u8 },
}

/// Named accessors for the data bits of an Input, Output or Feature
/// item (Section 6.2.2.5). Each bit has a name for both of its states.
pub trait MainDataItem {
    fn flags(&self) -> ItemFlags;

    /// Constant fields are usually padding.
    fn is_constant(&self) -> bool {
        self.flags().contains(ItemFlags::CONSTANT)
    }

    fn is_data(&self) -> bool {
        !self.is_constant()
    }

    /// Every instance of a variable field has its own usage. An array
    /// field reports indices into its usage range instead.
    fn is_variable(&self) -> bool {
        self.flags().contains(ItemFlags::VARIABLE)
    }

    fn is_array(&self) -> bool {
        !self.is_variable()
    }

    fn is_relative(&self) -> bool {
        self.flags().contains(ItemFlags::RELATIVE)
    }

    fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    fn wraps(&self) -> bool {
        self.flags().contains(ItemFlags::WRAP)
    }

    fn is_nonlinear(&self) -> bool {
        self.flags().contains(ItemFlags::NONLINEAR)
    }

    fn has_no_preferred_state(&self) -> bool {
        self.flags().contains(ItemFlags::NO_PREFERRED_STATE)
    }

    fn has_null_state(&self) -> bool {
        self.flags().contains(ItemFlags::NULL_STATE)
    }

    /// Only defined for Output and Feature items.
    fn is_volatile(&self) -> bool {
        self.flags().contains(ItemFlags::VOLATILE)
    }

    fn is_buffered_bytes(&self) -> bool {
        self.flags().contains(ItemFlags::BUFFERED_BYTES)
    }
}

impl MainDataItem for ItemFlags {
    fn flags(&self) -> ItemFlags {
        *self
    }
}

/// The type of a Collection item, Section 6.2.2.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionItem {
    Physical,
    Application,
    Logical,
    Report,
    NamedArray,
    UsageSwitch,
    UsageModifier,
    Reserved { value: u8 },
    VendorDefined { value: u8 },
}

const COLLECTION_TYPES: [CollectionItem; 7] = [
    CollectionItem::Physical,
    CollectionItem::Application,
    CollectionItem::Logical,
    CollectionItem::Report,
    CollectionItem::NamedArray,
    CollectionItem::UsageSwitch,
    CollectionItem::UsageModifier,
];

impl From<CollectionItem> for u8 {
    fn from(c: CollectionItem) -> u8 {
        match c {
            CollectionItem::Reserved { value } | CollectionItem::VendorDefined { value } => value,
            c => COLLECTION_TYPES
                .iter()
                .position(|t| *t == c)
                .map_or(0, |i| i as u8),
        }
    }
}

impl From<u8> for CollectionItem {
    fn from(value: u8) -> CollectionItem {
        match COLLECTION_TYPES.get(usize::from(value)) {
            Some(c) => *c,
            None if value < 0x80 => CollectionItem::Reserved { value },
            None => CollectionItem::VendorDefined { value },
        }
    }
}

/// See Section 6.2.2.7, a global item applies to all subsequently identified items.
///
/// All values are stored as read, unsigned and zero-extended to 32 bits.
/// Whether a minimum, maximum or exponent is negative depends on the
/// field it applies to, so a signed view is only available on request,
/// see [LogicalMinimum::signed].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalItem {
    UsagePage(UsagePage),
    LogicalMinimum(LogicalMinimum),
    LogicalMaximum(LogicalMaximum),
    PhysicalMinimum(PhysicalMinimum),
    PhysicalMaximum(PhysicalMaximum),
    UnitExponent(UnitExponent),
    Unit(Unit),
    ReportSize(ReportSize),
    /// The report ID. The raw value is kept so values > 255 can be diagnosed.
    ReportId(u32),
    ReportCount(ReportCount),
    Push,
    Pop,
    Reserved { tag: u8 },
}

/// A Usage, Usage Minimum or Usage Maximum as found in a local item.
/// A 4-byte item carries its own Usage Page, a 1- or 2-byte one takes the
/// Usage Page from the global state at the time it is read. An item
/// without data is the usage 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalUsage {
    pub usage_page: Option<UsagePage>,
    pub usage_id: UsageId,
}

impl LocalUsage {
    /// Merge with the given Usage Page unless this usage carries its own.
    pub fn resolve(&self, usage_page: UsagePage) -> Usage {
        Usage::from_parts(self.usage_page.unwrap_or(usage_page), self.usage_id)
    }
}

impl From<HidValue> for LocalUsage {
    fn from(value: HidValue) -> LocalUsage {
        let v = u32::from(value);
        match value.len() {
            1 | 2 => LocalUsage {
                usage_page: None,
                usage_id: UsageId((v & 0xffff) as u16),
            },
            _ => LocalUsage {
                usage_page: Some(UsagePage((v >> 16) as u16)),
                usage_id: UsageId((v & 0xffff) as u16),
            },
        }
    }
}

/// See Section 6.2.2.8, a local item applies to the next [MainItem] only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalItem {
    Usage(LocalUsage),
    UsageMinimum(LocalUsage),
    UsageMaximum(LocalUsage),
    DesignatorIndex(DesignatorIndex),
    DesignatorMinimum(DesignatorMinimum),
    DesignatorMaximum(DesignatorMaximum),
    StringIndex(StringIndex),
    StringMinimum(StringMinimum),
    StringMaximum(StringMaximum),
    Delimiter(Delimiter),
    Reserved { tag: u8 },
}

impl TryFrom<&[u8]> for ItemType {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<ItemType> {
        ensure!(
            !bytes.is_empty(),
            HidError::InsufficientData {
                needed: 1,
                available: 0
            }
        );
        let itype = (bytes[0] & 0b1100) >> 2;
        match itype {
            0 => Ok(ItemType::Main(MainItem::try_from(bytes)?)),
            1 => Ok(ItemType::Global(GlobalItem::try_from(bytes)?)),
            2 => Ok(ItemType::Local(LocalItem::try_from(bytes)?)),
            _ => Ok(ItemType::Reserved),
        }
    }
}

impl TryFrom<&[u8]> for MainItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<MainItem> {
        let (header, value) = header_and_value(bytes)?;
        let item = match header & 0b11111100 {
            0b10000000 => MainItem::Input(ItemFlags::from(u32::from(value))),
            0b10010000 => MainItem::Output(ItemFlags::from(u32::from(value))),
            0b10110000 => MainItem::Feature(ItemFlags::from(u32::from(value))),
            0b10100000 => {
                MainItem::Collection(CollectionItem::from((u32::from(value) & 0xff) as u8))
            }
            0b11000000 => MainItem::EndCollection,
            header => MainItem::Reserved { tag: header >> 4 },
        };
        Ok(item)
    }
}

impl TryFrom<&[u8]> for GlobalItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<GlobalItem> {
        let (header, value) = header_and_value(bytes)?;
        let item = match header & 0b11111100 {
            0b00000100 => GlobalItem::UsagePage(UsagePage(value.into())),
            0b00010100 => GlobalItem::LogicalMinimum(LogicalMinimum(u32::from(value) as i32)),
            0b00100100 => GlobalItem::LogicalMaximum(LogicalMaximum(u32::from(value) as i32)),
            0b00110100 => GlobalItem::PhysicalMinimum(PhysicalMinimum(u32::from(value) as i32)),
            0b01000100 => GlobalItem::PhysicalMaximum(PhysicalMaximum(u32::from(value) as i32)),
            0b01010100 => GlobalItem::UnitExponent(UnitExponent(u32::from(value) as i32)),
            0b01100100 => GlobalItem::Unit(Unit(value.into())),
            0b01110100 => GlobalItem::ReportSize(ReportSize(value.into())),
            0b10000100 => GlobalItem::ReportId(value.into()),
            0b10010100 => GlobalItem::ReportCount(ReportCount(value.into())),
            0b10100100 => GlobalItem::Push,
            0b10110100 => GlobalItem::Pop,
            header => GlobalItem::Reserved { tag: header >> 4 },
        };
        Ok(item)
    }
}

impl TryFrom<&[u8]> for LocalItem {
    type Error = HidError;

    fn try_from(bytes: &[u8]) -> Result<LocalItem> {
        let (header, value) = header_and_value(bytes)?;
        let item = match header & 0b11111100 {
            0b00001000 => LocalItem::Usage(LocalUsage::from(value)),
            0b00011000 => LocalItem::UsageMinimum(LocalUsage::from(value)),
            0b00101000 => LocalItem::UsageMaximum(LocalUsage::from(value)),
            0b00111000 => LocalItem::DesignatorIndex(DesignatorIndex(value.into())),
            0b01001000 => LocalItem::DesignatorMinimum(DesignatorMinimum(value.into())),
            0b01011000 => LocalItem::DesignatorMaximum(DesignatorMaximum(value.into())),
            0b01111000 => LocalItem::StringIndex(StringIndex(value.into())),
            0b10001000 => LocalItem::StringMinimum(StringMinimum(value.into())),
            0b10011000 => LocalItem::StringMaximum(StringMaximum(value.into())),
            0b10101000 => LocalItem::Delimiter(Delimiter(value.into())),
            header => LocalItem::Reserved { tag: header >> 4 },
        };
        Ok(item)
    }
}

/// Accessors shared by both item encodings of Section 6.2.2.2: short
/// items (header byte plus 0, 1, 2 or 4 data bytes) and long items
/// (header byte, 2 length bytes, tag byte, data).
pub trait Item {
    /// The length of this item in bytes, header included.
    fn size(&self) -> usize;

    fn item_type(&self) -> ItemType;

    /// Upper 4 bits of the header for short items, the tag byte for
    /// long items.
    fn tag(&self) -> u8;

    /// The header byte. For long items this is [LONG_ITEM_HEADER].
    fn header(&self) -> u8;

    fn is_long_item(&self) -> bool;

    /// All bytes of this item, starting with the header byte.
    fn bytes(&self) -> &[u8];

    /// The data bytes, `None` for a short item without data.
    fn data(&self) -> Option<ItemData<'_>>;
}

/// The data bytes of an [Item], as opposed to [Item::bytes].
#[derive(Debug)]
pub struct ItemData<'a> {
    bytes: &'a [u8],
}

impl std::ops::Deref for ItemData<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.bytes
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ShortItem<'a> {
    item_type: ItemType,
    bytes: &'a [u8],
}

impl<'a> TryFrom<&'a [u8]> for ShortItem<'a> {
    type Error = HidError;

    /// Decodes the short item at the start of `bytes`. Fails if the
    /// header declares more data bytes than there are.
    fn try_from(bytes: &'a [u8]) -> Result<ShortItem<'a>> {
        let Some(header) = bytes.first() else {
            return Err(HidError::InsufficientData {
                needed: 1,
                available: 0,
            });
        };
        let size = 1 + match header & 0b11 {
            3 => 4,
            n => usize::from(n),
        };
        ensure!(
            bytes.len() >= size,
            HidError::InsufficientData {
                needed: size,
                available: bytes.len()
            }
        );
        let bytes = &bytes[..size];
        Ok(ShortItem {
            item_type: ItemType::try_from(bytes)?,
            bytes,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LongItem<'a> {
    bytes: &'a [u8],
}

impl LongItem<'_> {
    /// The declared data length (`bDataSize`)
    pub fn data_size(&self) -> usize {
        self.bytes.len() - 4
    }
}

impl<'a> TryFrom<&'a [u8]> for LongItem<'a> {
    type Error = HidError;

    fn try_from(bytes: &'a [u8]) -> Result<LongItem<'a>> {
        let [header, lo, hi, _tag, ..] = *bytes else {
            return Err(HidError::InsufficientData {
                needed: 4,
                available: bytes.len(),
            });
        };
        ensure!(
            header == LONG_ITEM_HEADER,
            HidError::InvalidData {
                message: format!("Header {header:#04x} does not start a long item"),
            }
        );
        let size = 4 + usize::from(u16::from_le_bytes([lo, hi]));
        ensure!(
            bytes.len() >= size,
            HidError::InsufficientData {
                needed: size,
                available: bytes.len()
            }
        );
        Ok(LongItem {
            bytes: &bytes[..size],
        })
    }
}

/// One item of either encoding.
#[derive(Debug, Clone, Copy)]
pub enum RawItem<'a> {
    Short(ShortItem<'a>),
    Long(LongItem<'a>),
}

impl<'a> TryFrom<&'a [u8]> for RawItem<'a> {
    type Error = HidError;

    /// Decodes the item at the start of `bytes`, which may be followed
    /// by further items.
    fn try_from(bytes: &'a [u8]) -> Result<RawItem<'a>> {
        match bytes.first() {
            Some(&LONG_ITEM_HEADER) => Ok(RawItem::Long(LongItem::try_from(bytes)?)),
            _ => Ok(RawItem::Short(ShortItem::try_from(bytes)?)),
        }
    }
}

impl Item for RawItem<'_> {
    fn size(&self) -> usize {
        self.bytes().len()
    }

    fn item_type(&self) -> ItemType {
        match self {
            RawItem::Short(item) => item.item_type,
            RawItem::Long(_) => ItemType::Long,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            RawItem::Short(item) => item.bytes[0] >> 4,
            RawItem::Long(item) => item.bytes[3],
        }
    }

    fn header(&self) -> u8 {
        self.bytes()[0]
    }

    fn is_long_item(&self) -> bool {
        matches!(self, RawItem::Long(_))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            RawItem::Short(item) => item.bytes,
            RawItem::Long(item) => item.bytes,
        }
    }

    fn data(&self) -> Option<ItemData<'_>> {
        let skip = match self {
            RawItem::Short(item) if item.bytes.len() == 1 => return None,
            RawItem::Short(_) => 1,
            RawItem::Long(_) => 4,
        };
        Some(ItemData {
            bytes: &self.bytes()[skip..],
        })
    }
}

/// A single item in a tokenized (but not yet interpreted) report descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ReportDescriptorItem<'a> {
    offset: usize,
    item: RawItem<'a>,
}

impl<'a> ReportDescriptorItem<'a> {
    /// The offset of this item in the Report Descriptor it was extracted from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The item that is this report descriptor item.
    pub fn item(&self) -> &RawItem<'a> {
        &self.item
    }
}

/// Lazily splits a report descriptor into its items.
///
/// Every item's declared length is checked against the remaining bytes
/// before any data byte is read. A truncated item yields a
/// [ParserError::TruncatedItem] and ends the iteration.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Tokenizer { bytes, offset: 0 }
    }

    /// The offset of the next item to be read
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn next_item(&mut self) -> crate::Result<ReportDescriptorItem<'a>> {
        let offset = self.offset;
        let remaining = &self.bytes[offset..];
        let item = RawItem::try_from(remaining).map_err(|e| match e {
            HidError::InsufficientData { needed, available } => ParserError::TruncatedItem {
                offset,
                declared: needed,
                remaining: available,
            },
            HidError::InvalidData { message } => ParserError::InvalidData {
                offset,
                data: u32::from(remaining[0]),
                message,
            },
        })?;
        trace!("Item at offset {offset}: {:02x?}", item.bytes());
        self.offset += item.size();
        Ok(ReportDescriptorItem { offset, item })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = crate::Result<ReportDescriptorItem<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }
        let item = self.next_item();
        if item.is_err() {
            self.offset = self.bytes.len();
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_size() {
        // Logical Minimum in each of the four size encodings
        let data = [1, 2, 3, 4];
        for (header, size) in [(0x14u8, 1), (0x15, 2), (0x16, 3), (0x17, 5)] {
            let bytes = [&[header][..], &data[..]].concat();
            let item = RawItem::try_from(bytes.as_slice()).unwrap();
            assert_eq!(item.size(), size);
            assert_eq!(item.tag(), 0x1);
            assert_eq!(item.data().map_or(0, |d| d.len()), size - 1);
        }
    }

    #[test]
    fn output_flags() {
        // Output with 4 data bytes, flags 0x1aa
        let bytes = [0x93, 0xaa, 0x01, 0x00, 0x00];
        let item = RawItem::try_from(bytes.as_slice()).unwrap();
        match item.item_type() {
            ItemType::Main(MainItem::Output(o)) => {
                assert!(!o.is_constant());
                assert!(o.is_variable());
                assert!(!o.is_relative());
                assert!(o.wraps());
                assert!(!o.is_nonlinear());
                assert!(o.has_no_preferred_state());
                assert!(!o.has_null_state());
                assert!(o.is_volatile());
                assert!(o.is_buffered_bytes());
            }
            other => panic!("Unexpected item {other:?}"),
        }
    }

    macro_rules! check_value {
        ($bytes:expr, $unsigned:expr, $signed:expr) => {
            let v = HidValue::try_from($bytes.as_slice()).unwrap();
            assert_eq!(u32::from(v), $unsigned);
            let minimum = LogicalMinimum(u32::from(v) as i32);
            assert_eq!(minimum.signed(v.len()), $signed);
        };
    }

    #[test]
    fn hid_value() {
        check_value!([0x1, 0x2, 0x3, 0x4], 0x04030201u32, 0x04030201);

        check_value!([0x7F], 0x7F, 127);
        check_value!([0x80], 0x80, -128);
        check_value!([0xFF], 0xFF, -1);

        check_value!([0x00, 0x80], 0x8000u32, -32768);
        check_value!([0xCC, 0xED], 0xEDCCu32, -4660);

        check_value!([0x00, 0x00, 0x00, 0x80], 0x80000000u32, i32::MIN);
        check_value!([0xFF, 0xFF, 0xFF, 0xFF], 0xFFFFFFFFu32, -1);

        let empty: [u8; 0] = [];
        check_value!(empty, 0, 0);

        assert!(HidValue::try_from([1u8, 2, 3].as_slice()).is_err());
    }

    #[test]
    fn global_items() {
        let item = ItemType::try_from([0x15, 0x81].as_slice()).unwrap();
        assert_eq!(
            item,
            ItemType::Global(GlobalItem::LogicalMinimum(LogicalMinimum(129)))
        );
        let item = ItemType::try_from([0x16, 0x00, 0x80].as_slice()).unwrap();
        assert_eq!(
            item,
            ItemType::Global(GlobalItem::LogicalMinimum(LogicalMinimum(0x8000)))
        );
        let item = ItemType::try_from([0x35, 0xff].as_slice()).unwrap();
        assert_eq!(
            item,
            ItemType::Global(GlobalItem::PhysicalMinimum(PhysicalMinimum(255)))
        );
        let item = ItemType::try_from([0x25, 0xff].as_slice()).unwrap();
        assert_eq!(
            item,
            ItemType::Global(GlobalItem::LogicalMaximum(LogicalMaximum(255)))
        );
        let item = ItemType::try_from([0x55, 0x0d].as_slice()).unwrap();
        assert_eq!(
            item,
            ItemType::Global(GlobalItem::UnitExponent(UnitExponent(13)))
        );
        let item = ItemType::try_from([0xa4].as_slice()).unwrap();
        assert_eq!(item, ItemType::Global(GlobalItem::Push));
        let item = ItemType::try_from([0xc4].as_slice()).unwrap();
        assert_eq!(item, ItemType::Global(GlobalItem::Reserved { tag: 0xc }));
    }

    #[test]
    fn local_usage() {
        let item = ItemType::try_from([0x09, 0x30].as_slice()).unwrap();
        let ItemType::Local(LocalItem::Usage(usage)) = item else {
            panic!("Wrong item type {item:?}");
        };
        assert_eq!(usage.usage_page, None);
        assert_eq!(usage.resolve(UsagePage(0x1)), Usage(0x0001_0030));

        let item = ItemType::try_from([0x0b, 0x38, 0x02, 0x0c, 0x00].as_slice()).unwrap();
        let ItemType::Local(LocalItem::Usage(usage)) = item else {
            panic!("Wrong item type {item:?}");
        };
        assert_eq!(usage.usage_page, Some(UsagePage(0x0c)));
        assert_eq!(usage.resolve(UsagePage(0x1)), Usage(0x000c_0238));

        let item = ItemType::try_from([0x08].as_slice()).unwrap();
        let ItemType::Local(LocalItem::Usage(usage)) = item else {
            panic!("Wrong item type {item:?}");
        };
        assert_eq!(usage.usage_page, Some(UsagePage(0)));
        assert_eq!(usage.resolve(UsagePage(0x1)), Usage(0));
    }

    #[test]
    fn reserved_items() {
        let item = ItemType::try_from([0xd0].as_slice()).unwrap();
        assert_eq!(item, ItemType::Main(MainItem::Reserved { tag: 0xd }));
        let item = ItemType::try_from([0xfc].as_slice()).unwrap();
        assert_eq!(item, ItemType::Reserved);
        let item = ItemType::try_from([0xf9, 0x00].as_slice()).unwrap();
        assert_eq!(item, ItemType::Local(LocalItem::Reserved { tag: 0xf }));
    }

    #[test]
    fn tokenizer() {
        #[rustfmt::skip]
        let bytes = [
            0x05, 0x01,                    // Usage Page (Generic Desktop)
            0xfe, 0x02, 0x00, 0xf0, 0xaa, 0xbb, // Long item, tag 0xf0, 2 bytes
            0xa1, 0x01,                    // Collection (Application)
            0x27, 0xff, 0xff, 0x00, 0x00,  //   Logical Maximum (65535)
            0xc0,                          // End Collection
        ];
        let items: Vec<ReportDescriptorItem> = Tokenizer::new(&bytes)
            .collect::<crate::Result<_>>()
            .unwrap();
        let offsets: Vec<usize> = items.iter().map(|i| i.offset()).collect();
        assert_eq!(offsets, [0, 2, 8, 10, 15]);

        let long = items[1].item();
        assert!(long.is_long_item());
        assert_eq!(long.item_type(), ItemType::Long);
        assert_eq!(long.tag(), 0xf0);
        assert_eq!(&*long.data().unwrap(), &[0xaa, 0xbb]);

        assert_eq!(
            items[3].item().item_type(),
            ItemType::Global(GlobalItem::LogicalMaximum(LogicalMaximum(65535)))
        );
        assert_eq!(items[4].item().data().map(|d| d.len()), None);
    }

    #[test]
    fn tokenizer_truncated_short_item() {
        // Logical Maximum declares 4 data bytes, only 2 remain
        let bytes = [0x05, 0x01, 0x27, 0xff, 0xff];
        let mut tokenizer = Tokenizer::new(&bytes);
        assert!(tokenizer.next().unwrap().is_ok());
        let err = tokenizer.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            ParserError::TruncatedItem {
                offset: 2,
                declared: 5,
                remaining: 3
            }
        ));
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn tokenizer_truncated_long_item() {
        let bytes = [0xfe, 0x10, 0x00, 0xf0, 0x01];
        let mut tokenizer = Tokenizer::new(&bytes);
        let err = tokenizer.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            ParserError::TruncatedItem {
                offset: 0,
                declared: 20,
                remaining: 5
            }
        ));
        assert!(tokenizer.next().is_none());

        let bytes = [0xfe, 0x10];
        let mut tokenizer = Tokenizer::new(&bytes);
        assert!(tokenizer.next().unwrap().is_err());
    }

    #[test]
    fn tokenizer_empty() {
        assert!(Tokenizer::new(&[]).next().is_none());
    }
}
