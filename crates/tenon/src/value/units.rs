//! Unit-aware scalar values: durations and data sizes
//!
//! Both are a `(value, unit)` pair over an ordered unit ladder. Mixed-unit
//! operations resolve to the coarser of the two units: the operand with the
//! finer (or equal) unit is converted into the other operand's unit and
//! combined with that operand's raw value. Equality and hashing go through
//! the finest unit so that `1000.ns == 1.us`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// A unit on an ordered ladder.
pub trait Unit: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// The finest unit, used for canonical comparison.
    const FINEST: Self;

    /// How many finest units make up one of this unit.
    fn factor(self) -> f64;

    /// Source-level symbol, e.g. `min` or `kib`.
    fn symbol(self) -> &'static str;
}

/// Unit of a [`Duration`], finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DurationUnit {
    /// Nanoseconds
    #[serde(rename = "ns")]
    Nanos,
    /// Microseconds
    #[serde(rename = "us")]
    Micros,
    /// Milliseconds
    #[serde(rename = "ms")]
    Millis,
    /// Seconds
    #[serde(rename = "s")]
    Seconds,
    /// Minutes
    #[serde(rename = "min")]
    Minutes,
    /// Hours
    #[serde(rename = "h")]
    Hours,
    /// Days
    #[serde(rename = "d")]
    Days,
}

impl DurationUnit {
    /// Parse a unit symbol.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "ns" => Some(DurationUnit::Nanos),
            "us" => Some(DurationUnit::Micros),
            "ms" => Some(DurationUnit::Millis),
            "s" => Some(DurationUnit::Seconds),
            "min" => Some(DurationUnit::Minutes),
            "h" => Some(DurationUnit::Hours),
            "d" => Some(DurationUnit::Days),
            _ => None,
        }
    }

    /// Conversion factor from this unit to nanoseconds.
    pub fn nanos(self) -> i64 {
        match self {
            DurationUnit::Nanos => 1,
            DurationUnit::Micros => 1_000,
            DurationUnit::Millis => 1_000_000,
            DurationUnit::Seconds => 1_000_000_000,
            DurationUnit::Minutes => 60 * 1_000_000_000,
            DurationUnit::Hours => 60 * 60 * 1_000_000_000,
            DurationUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }
}

impl Unit for DurationUnit {
    const FINEST: Self = DurationUnit::Nanos;

    fn factor(self) -> f64 {
        self.nanos() as f64
    }

    fn symbol(self) -> &'static str {
        match self {
            DurationUnit::Nanos => "ns",
            DurationUnit::Micros => "us",
            DurationUnit::Millis => "ms",
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "min",
            DurationUnit::Hours => "h",
            DurationUnit::Days => "d",
        }
    }
}

/// Unit of a [`DataSize`], ordered by byte count with decimal and binary
/// units interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DataSizeUnit {
    /// Bytes
    #[serde(rename = "b")]
    Bytes,
    /// 1000 bytes
    #[serde(rename = "kb")]
    Kilobytes,
    /// 1024 bytes
    #[serde(rename = "kib")]
    Kibibytes,
    /// 1000^2 bytes
    #[serde(rename = "mb")]
    Megabytes,
    /// 1024^2 bytes
    #[serde(rename = "mib")]
    Mebibytes,
    /// 1000^3 bytes
    #[serde(rename = "gb")]
    Gigabytes,
    /// 1024^3 bytes
    #[serde(rename = "gib")]
    Gibibytes,
    /// 1000^4 bytes
    #[serde(rename = "tb")]
    Terabytes,
    /// 1024^4 bytes
    #[serde(rename = "tib")]
    Tebibytes,
    /// 1000^5 bytes
    #[serde(rename = "pb")]
    Petabytes,
    /// 1024^5 bytes
    #[serde(rename = "pib")]
    Pebibytes,
}

impl DataSizeUnit {
    /// Parse a unit symbol.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "b" => Some(DataSizeUnit::Bytes),
            "kb" => Some(DataSizeUnit::Kilobytes),
            "kib" => Some(DataSizeUnit::Kibibytes),
            "mb" => Some(DataSizeUnit::Megabytes),
            "mib" => Some(DataSizeUnit::Mebibytes),
            "gb" => Some(DataSizeUnit::Gigabytes),
            "gib" => Some(DataSizeUnit::Gibibytes),
            "tb" => Some(DataSizeUnit::Terabytes),
            "tib" => Some(DataSizeUnit::Tebibytes),
            "pb" => Some(DataSizeUnit::Petabytes),
            "pib" => Some(DataSizeUnit::Pebibytes),
            _ => None,
        }
    }

    /// Conversion factor from this unit to bytes.
    pub fn bytes(self) -> i64 {
        match self {
            DataSizeUnit::Bytes => 1,
            DataSizeUnit::Kilobytes => 1_000,
            DataSizeUnit::Kibibytes => 1 << 10,
            DataSizeUnit::Megabytes => 1_000_000,
            DataSizeUnit::Mebibytes => 1 << 20,
            DataSizeUnit::Gigabytes => 1_000_000_000,
            DataSizeUnit::Gibibytes => 1 << 30,
            DataSizeUnit::Terabytes => 1_000_000_000_000,
            DataSizeUnit::Tebibytes => 1 << 40,
            DataSizeUnit::Petabytes => 1_000_000_000_000_000,
            DataSizeUnit::Pebibytes => 1 << 50,
        }
    }
}

impl Unit for DataSizeUnit {
    const FINEST: Self = DataSizeUnit::Bytes;

    fn factor(self) -> f64 {
        self.bytes() as f64
    }

    fn symbol(self) -> &'static str {
        match self {
            DataSizeUnit::Bytes => "b",
            DataSizeUnit::Kilobytes => "kb",
            DataSizeUnit::Kibibytes => "kib",
            DataSizeUnit::Megabytes => "mb",
            DataSizeUnit::Mebibytes => "mib",
            DataSizeUnit::Gigabytes => "gb",
            DataSizeUnit::Gibibytes => "gib",
            DataSizeUnit::Terabytes => "tb",
            DataSizeUnit::Tebibytes => "tib",
            DataSizeUnit::Petabytes => "pb",
            DataSizeUnit::Pebibytes => "pib",
        }
    }
}

/// An immutable amount measured in some unit.
#[derive(Debug, Clone, Copy)]
pub struct Quantity<U: Unit> {
    value: f64,
    unit: U,
}

/// A duration, e.g. `1.5.h`.
pub type Duration = Quantity<DurationUnit>;

/// A data size, e.g. `512.mib`.
pub type DataSize = Quantity<DataSizeUnit>;

impl<U: Unit> Quantity<U> {
    /// Create a new quantity.
    pub fn new(value: f64, unit: U) -> Self {
        Self { value, unit }
    }

    /// The raw numeric value, in [`Quantity::unit`].
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The unit.
    pub fn unit(&self) -> U {
        self.unit
    }

    /// The numeric value expressed in `unit`.
    pub fn value_in(&self, unit: U) -> f64 {
        self.value * self.unit.factor() / unit.factor()
    }

    /// Combine two quantities in the coarser of their units.
    fn combine(&self, other: &Self, op: impl Fn(f64, f64) -> f64) -> Self {
        if self.unit <= other.unit {
            Self::new(op(self.value_in(other.unit), other.value), other.unit)
        } else {
            Self::new(op(self.value, other.value_in(self.unit)), self.unit)
        }
    }

    /// `self + other`.
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a + b)
    }

    /// `self - other`.
    pub fn subtract(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a - b)
    }

    /// Scale by a dimensionless factor.
    pub fn multiply(&self, num: f64) -> Self {
        Self::new(self.value * num, self.unit)
    }

    /// Divide by a dimensionless factor.
    pub fn divide(&self, num: f64) -> Self {
        Self::new(self.value / num, self.unit)
    }

    /// Ratio of two quantities, using the same unit resolution as `add`.
    pub fn divide_by(&self, other: &Self) -> f64 {
        if self.unit <= other.unit {
            self.value_in(other.unit) / other.value
        } else {
            self.value / other.value_in(self.unit)
        }
    }

    /// Remainder of the raw value.
    pub fn remainder(&self, num: f64) -> Self {
        Self::new(self.value % num, self.unit)
    }

    /// Raise the raw value to a power.
    pub fn pow(&self, num: f64) -> Self {
        Self::new(self.value.powf(num), self.unit)
    }

    /// Round the raw value to the nearest integer, ties to even.
    pub fn round(&self) -> Self {
        Self::new(self.value.round_ties_even(), self.unit)
    }

    /// Express this quantity in another unit.
    pub fn convert_to(&self, unit: U) -> Self {
        Self::new(self.value_in(unit), unit)
    }

    /// Compare using the same unit resolution as `add`.
    ///
    /// `None` if either value is NaN.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.unit <= other.unit {
            self.value_in(other.unit).partial_cmp(&other.value)
        } else {
            self.value.partial_cmp(&other.value_in(self.unit))
        }
    }

    /// The value in the finest unit, normalized for hashing.
    fn canonical(&self) -> f64 {
        let v = self.value_in(U::FINEST);
        if v == 0.0 {
            0.0
        } else {
            v
        }
    }
}

impl Duration {
    /// Whole nanoseconds, if the duration is finite and fits.
    pub fn to_std(&self) -> Option<std::time::Duration> {
        let nanos = self.value_in(DurationUnit::Nanos);
        if nanos.is_finite() && nanos >= 0.0 && nanos <= u64::MAX as f64 {
            Some(std::time::Duration::from_nanos(nanos as u64))
        } else {
            None
        }
    }
}

impl<U: Unit> PartialEq for Quantity<U> {
    fn eq(&self, other: &Self) -> bool {
        self.value_in(U::FINEST) == other.value_in(U::FINEST)
    }
}

impl<U: Unit> PartialOrd for Quantity<U> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl<U: Unit> Hash for Quantity<U> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().to_bits().hash(state);
    }
}

impl<U: Unit> fmt::Display for Quantity<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.fract() == 0.0 && self.value.abs() < 1e15 {
            write!(f, "{}.{}", self.value as i64, self.unit.symbol())
        } else {
            write!(f, "{}.{}", self.value, self.unit.symbol())
        }
    }
}
