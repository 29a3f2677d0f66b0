// SPDX-License-Identifier: MIT

//! A pull-based parser for HID Report Descriptors.
//!
//! A [Parser] walks a report descriptor one item at a time and yields
//! an [Item] for every field of the requested [ReportKind] plus every
//! Collection and End Collection. Variable fields with a report count
//! larger than one are split into one [Item] per instance, each with its
//! own usage and [Location].
//!
//! The [Location] of an item can then be used with [data::get_unsigned]
//! and [data::get_signed] to extract the field's value from a report.
//!
//! ```
//! # use hidparse::*;
//! #[rustfmt::skip]
//! let rdesc = [
//!     0x05, 0x01,       // Usage Page (Generic Desktop)
//!     0x09, 0x02,       // Usage (Mouse)
//!     0xa1, 0x01,       // Collection (Application)
//!     0x09, 0x30,       //   Usage (X)
//!     0x09, 0x31,       //   Usage (Y)
//!     0x15, 0x81,       //   Logical Minimum (-127)
//!     0x25, 0x7f,       //   Logical Maximum (127)
//!     0x75, 0x08,       //   Report Size (8)
//!     0x95, 0x02,       //   Report Count (2)
//!     0x81, 0x06,       //   Input (Data,Var,Rel)
//!     0xc0,             // End Collection
//! ];
//! let y = Usage::from_parts(UsagePage(0x1), UsageId(0x31));
//! let located = locate(&rdesc, y, ReportId(0), ReportKind::Input)
//!     .unwrap()
//!     .expect("Y axis not found");
//!
//! let report = [0x05, 0xfe];
//! assert_eq!(data::get_signed(&report, &located.location).unwrap(), -2);
//! assert_eq!(report_size(&rdesc, ReportKind::Input, ReportId(0)).unwrap(), 2);
//! ```

use thiserror::Error;
use tracing::{debug, warn};

pub mod data;
pub mod hid;
pub mod types;
pub mod usages;

macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}

pub(crate) use ensure;

use hid::{
    CollectionItem, GlobalItem, Item as _, ItemType, LocalItem, MainDataItem, MainItem, Tokenizer,
};
pub use types::*;
use usages::UsageList;

/// The report a data field belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Input,
    Output,
    Feature,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Input,
    Output,
    Feature,
    Collection,
    EndCollection,
}

impl From<ReportKind> for ItemKind {
    fn from(kind: ReportKind) -> ItemKind {
        match kind {
            ReportKind::Input => ItemKind::Input,
            ReportKind::Output => ItemKind::Output,
            ReportKind::Feature => ItemKind::Feature,
        }
    }
}

/// Where a field's value sits within a report.
///
/// The default value (all zero) is a field of size zero, which
/// always reads as 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    /// Offset of the first bit, counting from the first bit after
    /// the report ID
    pub bit_offset: usize,
    /// The width of a single instance in bits
    pub bit_size: usize,
    /// The number of consecutive instances
    pub count: usize,
}

impl Location {
    /// The offset of the first bit after this field.
    pub fn end(&self) -> usize {
        self.bit_offset
            .saturating_add(self.bit_size.saturating_mul(self.count))
    }
}

/// One item produced by the [Parser]. The item is a copy of the parser
/// state at the time it was produced and does not borrow from the parser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    /// The collection type, only for [ItemKind::Collection]
    pub collection: Option<CollectionItem>,
    pub usage: Usage,
    pub usage_minimum: Usage,
    pub usage_maximum: Usage,
    pub report_id: ReportId,
    pub flags: ItemFlags,
    pub location: Location,
    pub logical_minimum: LogicalMinimum,
    pub logical_maximum: LogicalMaximum,
    pub physical_minimum: PhysicalMinimum,
    pub physical_maximum: PhysicalMaximum,
    pub unit: Unit,
    pub unit_exponent: UnitExponent,
    pub designator_index: DesignatorIndex,
    pub designator_minimum: DesignatorMinimum,
    pub designator_maximum: DesignatorMaximum,
    pub string_index: StringIndex,
    pub string_minimum: StringMinimum,
    pub string_maximum: StringMaximum,
    pub delimiter: Delimiter,
    /// The collection nesting depth. A Collection item carries the depth
    /// inside the collection it opens, an End Collection item the depth
    /// after closing.
    pub collection_level: usize,
}

impl MainDataItem for Item {
    fn flags(&self) -> ItemFlags {
        self.flags
    }
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Invalid data {data} at offset {offset}: {message}")]
    InvalidData {
        offset: usize,
        data: u32,
        message: String,
    },
    #[error("Item at offset {offset} needs {declared} bytes but only {remaining} remain")]
    TruncatedItem {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
}

type Result<T> = std::result::Result<T, ParserError>;

#[derive(Clone, Copy, Debug, Default)]
struct Globals {
    usage_page: UsagePage,
    logical_minimum: LogicalMinimum,
    logical_maximum: LogicalMaximum,
    physical_minimum: PhysicalMinimum,
    physical_maximum: PhysicalMaximum,
    unit_exponent: UnitExponent,
    unit: Unit,
    report_size: ReportSize,
    report_id: ReportId,
    report_count: ReportCount,
}

/// Usages in here are already merged with the Usage Page that was
/// current when the local item was read.
#[derive(Clone, Copy, Debug, Default)]
struct Locals {
    usage: Option<Usage>,
    usage_minimum: Option<Usage>,
    usage_maximum: Option<Usage>,
    designator_index: DesignatorIndex,
    designator_minimum: DesignatorMinimum,
    designator_maximum: DesignatorMaximum,
    string_index: StringIndex,
    string_minimum: StringMinimum,
    string_maximum: StringMaximum,
    delimiter: Delimiter,
}

/// The global item state table and the snapshots saved by Push.
#[derive(Debug, Default)]
struct Stack {
    current: Globals,
    saved: Vec<Globals>,
}

impl Stack {
    fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the most recently pushed globals. Returns false if
    /// there is nothing to pop.
    fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(globals) => {
                self.current = globals;
                true
            }
            None => false,
        }
    }
}

/// A variable field being split into its instances.
#[derive(Debug)]
struct MultiField {
    /// The item for each instance, with the location count pinned to 1
    item: Item,
    index: usize,
    count: usize,
}

macro_rules! update_state {
    ($parser:ident, globals, $which:ident, $from:expr) => {
        $parser.stack.current.$which = $from
    };
    ($parser:ident, locals, $which:ident, $from:expr) => {
        $parser.locals.$which = $from
    };
}

/// A single parse session over a report descriptor.
///
/// The parser yields items lazily, either through [Parser::get_item] or
/// as [Iterator]. A session cannot be restarted, parse the same bytes
/// with a new [Parser] instead.
///
/// ```
/// # use hidparse::*;
/// # fn dump(rdesc: &[u8]) -> Result<(), ParserError> {
/// let mut parser = Parser::new(rdesc, ReportKind::Input);
/// while let Some(item) = parser.get_item()? {
///     println!("{:?} {} at {:?}", item.kind, item.usage, item.location);
/// }
/// parser.end();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    /// Only data items of this kind are surfaced. `None` surfaces
    /// collections only.
    filter: Option<ReportKind>,
    stack: Stack,
    locals: Locals,
    usages: UsageList,
    /// The running bit offset. Not part of the global state, a Pop
    /// does not restore it.
    bit_offset: usize,
    collection_level: usize,
    multi: Option<MultiField>,
    usages_truncated: bool,
}

impl<'a> Parser<'a> {
    /// Starts a parse session that yields the data items of the given kind
    /// and all collections.
    pub fn new(descriptor: &'a [u8], kind: ReportKind) -> Self {
        Self::with_filter(descriptor, Some(kind))
    }

    /// Starts a parse session that yields Collection and End Collection
    /// items only.
    pub fn collections(descriptor: &'a [u8]) -> Self {
        Self::with_filter(descriptor, None)
    }

    fn with_filter(descriptor: &'a [u8], filter: Option<ReportKind>) -> Self {
        Parser {
            tokenizer: Tokenizer::new(descriptor),
            filter,
            stack: Stack::default(),
            locals: Locals::default(),
            usages: UsageList::new(),
            bit_offset: 0,
            collection_level: 0,
            multi: None,
            usages_truncated: false,
        }
    }

    /// True if at any point in this session a usage was dropped because
    /// more than [usages::MAX_USAGES] usages applied to one Main item.
    /// Instances of a variable field beyond the retained usages reuse
    /// the last retained usage.
    pub fn usages_truncated(&self) -> bool {
        self.usages_truncated
    }

    /// The number of Push items currently not matched by a Pop.
    pub fn push_depth(&self) -> usize {
        self.stack.saved.len()
    }

    /// Ends the session, releasing any globals saved by a Push that was
    /// never popped. Returns the number of snapshots released.
    /// Dropping the parser has the same effect.
    pub fn end(self) -> usize {
        let depth = self.push_depth();
        if depth > 0 {
            debug!("Releasing {depth} unpopped global state(s)");
        }
        depth
    }

    /// Returns the next item or `None` once the descriptor is exhausted.
    ///
    /// Unknown tags and other anomalies are logged and skipped. An item
    /// whose declared length exceeds the remaining descriptor is an error
    /// and ends the session.
    pub fn get_item(&mut self) -> Result<Option<Item>> {
        if let Some(item) = self.next_instance() {
            return Ok(Some(item));
        }
        while let Some(rdesc_item) = self.tokenizer.next() {
            let rdesc_item = rdesc_item?;
            let offset = rdesc_item.offset();
            let item = rdesc_item.item();
            match item.item_type() {
                ItemType::Main(main) => {
                    if let Some(item) = self.handle_main_item(&main, offset) {
                        return Ok(Some(item));
                    }
                }
                ItemType::Global(global) => self.handle_global_item(&global, offset),
                ItemType::Local(local) => self.handle_local_item(&local, offset),
                ItemType::Long => {
                    let len = item.data().map(|d| d.len()).unwrap_or(0);
                    if matches!(len, 0 | 1 | 2 | 4) {
                        debug!("Ignoring long item {:#04x} at offset {offset}", item.tag());
                    } else {
                        warn!(
                            "Ignoring long item {:#04x} with bad length {len} at offset {offset}",
                            item.tag()
                        );
                    }
                }
                ItemType::Reserved => {
                    warn!(
                        "Ignoring item {:#04x} of reserved type at offset {offset}",
                        item.header()
                    );
                }
            }
        }
        Ok(None)
    }

    /// Produces the next instance of a variable field, if any.
    fn next_instance(&mut self) -> Option<Item> {
        let multi = self.multi.as_mut()?;
        if multi.index < multi.count {
            let mut item = multi.item;
            if let Some(usage) = self.usages.for_instance(multi.index) {
                item.usage = usage;
            }
            item.location.bit_offset = self.bit_offset;
            self.bit_offset = self.bit_offset.saturating_add(item.location.bit_size);
            multi.index += 1;
            return Some(item);
        }
        self.multi = None;
        self.clear_locals();
        None
    }

    /// The current state as item of the given kind, positioned at
    /// the current bit offset.
    fn current_item(&self, kind: ItemKind) -> Item {
        let globals = &self.stack.current;
        let locals = &self.locals;
        Item {
            kind,
            collection: None,
            usage: locals.usage.unwrap_or(Usage::from(globals.usage_page)),
            usage_minimum: locals.usage_minimum.unwrap_or_default(),
            usage_maximum: locals.usage_maximum.unwrap_or_default(),
            report_id: globals.report_id,
            flags: ItemFlags::empty(),
            location: Location {
                bit_offset: self.bit_offset,
                bit_size: globals.report_size.into(),
                count: globals.report_count.into(),
            },
            logical_minimum: globals.logical_minimum,
            logical_maximum: globals.logical_maximum,
            physical_minimum: globals.physical_minimum,
            physical_maximum: globals.physical_maximum,
            unit: globals.unit,
            unit_exponent: globals.unit_exponent,
            designator_index: locals.designator_index,
            designator_minimum: locals.designator_minimum,
            designator_maximum: locals.designator_maximum,
            string_index: locals.string_index,
            string_minimum: locals.string_minimum,
            string_maximum: locals.string_maximum,
            delimiter: locals.delimiter,
            collection_level: self.collection_level,
        }
    }

    fn clear_locals(&mut self) {
        self.locals = Locals::default();
        self.usages.clear();
    }

    fn usage_overflow(&mut self, offset: usize) {
        if !self.usages_truncated {
            warn!(
                "More than {} usages at offset {offset}, dropping the rest",
                usages::MAX_USAGES
            );
        }
        self.usages_truncated = true;
    }

    fn handle_main_item(&mut self, item: &MainItem, offset: usize) -> Option<Item> {
        match item {
            MainItem::Input(flags) => self.handle_data_item(ReportKind::Input, *flags, offset),
            MainItem::Output(flags) => self.handle_data_item(ReportKind::Output, *flags, offset),
            MainItem::Feature(flags) => self.handle_data_item(ReportKind::Feature, *flags, offset),
            MainItem::Collection(collection) => {
                self.collection_level += 1;
                let item = Item {
                    collection: Some(*collection),
                    usage: self.locals.usage.unwrap_or_default(),
                    ..self.current_item(ItemKind::Collection)
                };
                self.clear_locals();
                Some(item)
            }
            MainItem::EndCollection => {
                if self.collection_level == 0 {
                    warn!("End Collection without Collection at offset {offset}");
                }
                self.collection_level = self.collection_level.saturating_sub(1);
                let item = Item {
                    usage: self.locals.usage.unwrap_or_default(),
                    ..self.current_item(ItemKind::EndCollection)
                };
                self.usages.clear();
                Some(item)
            }
            MainItem::Reserved { tag } => {
                warn!("Ignoring main item with reserved tag {tag:#x} at offset {offset}");
                None
            }
        }
    }

    fn handle_data_item(
        &mut self,
        kind: ReportKind,
        flags: ItemFlags,
        offset: usize,
    ) -> Option<Item> {
        if self.filter != Some(kind) {
            self.clear_locals();
            return None;
        }

        let mut item = Item {
            flags,
            ..self.current_item(kind.into())
        };
        let count = item.location.count;

        if flags.is_variable() {
            match (self.locals.usage_minimum, self.locals.usage_maximum) {
                (Some(minimum), Some(maximum)) => {
                    if !self.usages.extend_range(minimum, maximum) {
                        self.usage_overflow(offset);
                    }
                }
                (Some(_), None) => warn!("Usage Minimum without Usage Maximum at offset {offset}"),
                _ => {}
            }
            if count > 1 {
                item.location.count = 1;
                self.multi = Some(MultiField {
                    item,
                    index: 0,
                    count,
                });
                return self.next_instance();
            }
            if let Some(usage) = self.usages.first() {
                item.usage = usage;
            }
        }

        self.bit_offset = item.location.end();
        self.clear_locals();
        Some(item)
    }

    fn handle_global_item(&mut self, item: &GlobalItem, offset: usize) {
        match *item {
            GlobalItem::UsagePage(usage_page) => {
                update_state!(self, globals, usage_page, usage_page);
            }
            GlobalItem::LogicalMinimum(minimum) => {
                update_state!(self, globals, logical_minimum, minimum);
            }
            GlobalItem::LogicalMaximum(maximum) => {
                update_state!(self, globals, logical_maximum, maximum);
            }
            GlobalItem::PhysicalMinimum(minimum) => {
                update_state!(self, globals, physical_minimum, minimum);
            }
            GlobalItem::PhysicalMaximum(maximum) => {
                update_state!(self, globals, physical_maximum, maximum);
            }
            GlobalItem::UnitExponent(exponent) => {
                update_state!(self, globals, unit_exponent, exponent);
            }
            GlobalItem::Unit(unit) => {
                update_state!(self, globals, unit, unit);
            }
            GlobalItem::ReportSize(size) => {
                update_state!(self, globals, report_size, size);
            }
            GlobalItem::ReportId(id) => {
                if id > u32::from(u8::MAX) {
                    warn!("Report ID {id} at offset {offset} exceeds 8 bits, truncating");
                }
                update_state!(self, globals, report_id, ReportId((id & 0xff) as u8));
                self.bit_offset = 0;
            }
            GlobalItem::ReportCount(count) => {
                update_state!(self, globals, report_count, count);
            }
            GlobalItem::Push => self.stack.push(),
            GlobalItem::Pop => {
                if !self.stack.pop() {
                    warn!("Pop without Push at offset {offset}, ignoring");
                }
            }
            GlobalItem::Reserved { tag } => {
                warn!("Ignoring global item with reserved tag {tag:#x} at offset {offset}");
            }
        }
    }

    fn handle_local_item(&mut self, item: &LocalItem, offset: usize) {
        let usage_page = self.stack.current.usage_page;
        match *item {
            LocalItem::Usage(usage) => {
                let usage = usage.resolve(usage_page);
                update_state!(self, locals, usage, Some(usage));
                if !self.usages.push(usage) {
                    self.usage_overflow(offset);
                }
            }
            LocalItem::UsageMinimum(minimum) => {
                update_state!(self, locals, usage_minimum, Some(minimum.resolve(usage_page)));
            }
            LocalItem::UsageMaximum(maximum) => {
                update_state!(self, locals, usage_maximum, Some(maximum.resolve(usage_page)));
            }
            LocalItem::DesignatorIndex(index) => {
                update_state!(self, locals, designator_index, index);
            }
            LocalItem::DesignatorMinimum(minimum) => {
                update_state!(self, locals, designator_minimum, minimum);
            }
            LocalItem::DesignatorMaximum(maximum) => {
                update_state!(self, locals, designator_maximum, maximum);
            }
            LocalItem::StringIndex(index) => {
                update_state!(self, locals, string_index, index);
            }
            LocalItem::StringMinimum(minimum) => {
                update_state!(self, locals, string_minimum, minimum);
            }
            LocalItem::StringMaximum(maximum) => {
                update_state!(self, locals, string_maximum, maximum);
            }
            LocalItem::Delimiter(delimiter) => {
                update_state!(self, locals, delimiter, delimiter);
            }
            LocalItem::Reserved { tag } => {
                warn!("Ignoring local item with reserved tag {tag:#x} at offset {offset}");
            }
        }
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.get_item().transpose()
    }
}

/// The result of a successful [locate].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Located {
    pub location: Location,
    pub flags: ItemFlags,
}

/// Finds the first non-constant field of the given kind with the given
/// usage in the report with the given ID. Returns `None` if there is no
/// such field.
///
/// Every call parses the descriptor from the start.
pub fn locate(
    descriptor: &[u8],
    usage: Usage,
    report_id: ReportId,
    kind: ReportKind,
) -> Result<Option<Located>> {
    let mut parser = Parser::new(descriptor, kind);
    while let Some(item) = parser.get_item()? {
        if item.kind == ItemKind::from(kind)
            && !item.flags.is_constant()
            && item.usage == usage
            && item.report_id == report_id
        {
            return Ok(Some(Located {
                location: item.location,
                flags: item.flags,
            }));
        }
    }
    Ok(None)
}

/// The size in bytes of the report of the given kind and ID, excluding
/// the report ID byte. Returns 0 if the descriptor has no such report.
pub fn report_size(descriptor: &[u8], kind: ReportKind, report_id: ReportId) -> Result<usize> {
    let mut bits: Option<(usize, usize)> = None;
    let mut parser = Parser::new(descriptor, kind);
    while let Some(item) = parser.get_item()? {
        if item.kind != ItemKind::from(kind) || item.report_id != report_id {
            continue;
        }
        let (start, end) = (item.location.bit_offset, item.location.end());
        bits = match bits {
            None => Some((start, end)),
            Some((lo, hi)) => Some((lo.min(start), hi.max(end))),
        };
    }
    Ok(bits.map_or(0, |(lo, hi)| (hi - lo).div_ceil(8)))
}

/// True if the descriptor has an Application collection with the given
/// usage that ends while the given report ID is current.
pub fn is_collection(descriptor: &[u8], report_id: ReportId, usage: Usage) -> Result<bool> {
    let mut application: Option<Usage> = None;
    let mut parser = Parser::collections(descriptor);
    while let Some(item) = parser.get_item()? {
        match item.kind {
            ItemKind::Collection if item.collection == Some(CollectionItem::Application) => {
                application = Some(item.usage);
            }
            ItemKind::EndCollection
                if application == Some(usage) && item.report_id == report_id =>
            {
                return Ok(true);
            }
            _ => {}
        }
    }
    Ok(false)
}
