#![allow(dead_code)]

use oxide_query_core::{Connection, Element, GenericDriver, ParamType, SqlValue};

pub fn ansi() -> GenericDriver {
    GenericDriver::ansi()
}

/// Compiles `element` as a root with the ANSI driver.
pub fn compile(element: &mut impl Element) -> String {
    element
        .compile(&ansi(), None)
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"))
}

/// Markers, values and types of the last root compilation, in order.
pub fn bound(element: &impl Element) -> Vec<(String, SqlValue, ParamType)> {
    element
        .params()
        .map(|params| {
            params
                .iter()
                .map(|p| (p.key().marker().to_owned(), p.value().clone(), p.param_type()))
                .collect()
        })
        .unwrap_or_default()
}

/// Quotes strings the ANSI way, doubling embedded quotes.
#[derive(Debug)]
pub struct AnsiConnection;

impl Connection for AnsiConnection {
    fn quote_string(&self, raw: &str) -> String {
        format!("'{}'", raw.replace('\'', "''"))
    }
}
