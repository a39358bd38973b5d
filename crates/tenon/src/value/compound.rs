//! Compound scalar values: pairs, integer sequences and regexes

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use regex::Regex;

use crate::context::EvalContext;
use crate::error::{EvalError, Result};

use super::Value;

/// An ordered 2-tuple.
///
/// Forcing a pair forces both components. The pair is marked forced only
/// after both succeed, so a failed attempt leaves it unforced.
#[derive(Debug)]
pub struct Pair {
    first: Value,
    second: Value,
    forced: AtomicBool,
}

impl Pair {
    /// Create a new pair.
    pub fn new(first: Value, second: Value) -> Self {
        Self {
            first,
            second,
            forced: AtomicBool::new(false),
        }
    }

    /// First component.
    pub fn first(&self) -> &Value {
        &self.first
    }

    /// Second component.
    pub fn second(&self) -> &Value {
        &self.second
    }

    /// Whether both components have been forced.
    pub fn is_forced(&self) -> bool {
        self.forced.load(Ordering::Acquire)
    }

    /// Force both components.
    pub fn force(&self, allow_undefined: bool, ctx: &mut EvalContext) -> Result<()> {
        if self.forced.load(Ordering::Acquire) {
            return Ok(());
        }
        self.first.force(allow_undefined, ctx)?;
        self.second.force(allow_undefined, ctx)?;
        self.forced.store(true, Ordering::Release);
        Ok(())
    }
}

/// `IntSeq(start, end).step(step)`, inclusive of `end` when reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntSeq {
    /// First value
    pub start: i64,
    /// Bound (inclusive)
    pub end: i64,
    /// Increment, never zero
    pub step: i64,
}

impl IntSeq {
    /// Create a sequence with step 1.
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            step: 1,
        }
    }

    /// Change the step. A zero step is rejected.
    pub fn with_step(self, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(EvalError::eval(
                "Expected a non-zero step, but got `{0}`.",
                vec![step.to_string()],
            ));
        }
        Ok(Self { step, ..self })
    }

    fn count(&self) -> u128 {
        let span = if self.step > 0 {
            (self.end as i128) - (self.start as i128)
        } else {
            (self.start as i128) - (self.end as i128)
        };
        if span < 0 {
            0
        } else {
            (span / (self.step as i128).abs()) as u128 + 1
        }
    }

    /// Number of values in the sequence, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        usize::try_from(self.count()).unwrap_or(usize::MAX)
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate the values in order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let first = (!self.is_empty()).then_some(self.start);
        std::iter::successors(first, move |current| {
            current.checked_add(self.step).filter(|next| {
                if self.step > 0 {
                    *next <= self.end
                } else {
                    *next >= self.end
                }
            })
        })
    }
}

/// A compiled regular expression.
///
/// Two regexes are equal when their patterns are.
#[derive(Debug, Clone)]
pub struct RegexValue {
    regex: Regex,
}

impl RegexValue {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| {
                EvalError::eval(
                    "Invalid regex `{0}`: {1}",
                    vec![pattern.to_string(), e.to_string()],
                )
            })
    }

    /// Source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the whole of `input` matches.
    pub fn matches(&self, input: &str) -> bool {
        self.regex
            .find(input)
            .is_some_and(|m| m.start() == 0 && m.end() == input.len())
    }

    /// The compiled regex.
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for RegexValue {}

impl fmt::Display for RegexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regex({:?})", self.pattern())
    }
}
