//! Display and Debug implementations for Value
//!
//! Both go through [`ValueRenderer`], which only shows what is already
//! evaluated. Formatting a value never triggers evaluation.

use std::fmt;

use crate::visit::ValueRenderer;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ValueRenderer::multi_line().render(self))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s), // No quotes for Display
            _ => f.write_str(&ValueRenderer::single_line(usize::MAX).render(self)),
        }
    }
}
