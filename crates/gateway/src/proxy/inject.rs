// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing-parameter injection.
//!
//! The backend routes on a single parameter; the proxy derives its value
//! from the inbound path segment and injects it server-side. Pure
//! functions so the mapping is testable without the HTTP layer.

use serde_json::{Map, Value};

use crate::error::GatewayError;

/// Merge inbound query pairs with the routing parameter.
///
/// The routing parameter goes first; an inbound pair that tries to spoof
/// it is dropped.
pub fn inject_query(
    route_param: &str,
    operation: &str,
    inbound: &[(String, String)],
) -> Vec<(String, String)> {
    let mut out = vec![(route_param.to_owned(), operation.to_owned())];
    out.extend(inbound.iter().filter(|(k, _)| k != route_param).cloned());
    out
}

/// Inject the routing parameter into a JSON body.
///
/// The backend contract requires an object to merge into; `null` (an empty
/// POST) becomes a fresh object, anything else is rejected.
pub fn inject_body(
    route_param: &str,
    operation: &str,
    inbound: Value,
) -> Result<Map<String, Value>, GatewayError> {
    let mut map = match inbound {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => return Err(GatewayError::BadRequest),
    };
    map.insert(route_param.to_owned(), Value::String(operation.to_owned()));
    Ok(map)
}

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;
