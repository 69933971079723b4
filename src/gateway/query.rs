//! Upstream query-string construction.
//!
//! Listing routes recognize a fixed set of inbound parameters and compose
//! the upstream query in a fixed order, dropping everything else. `search`
//! is always emitted, blank when the caller sent nothing, because a blank
//! search means "return all" on the upstream side. A handful of routes
//! instead forward the inbound query verbatim; those use the passthrough
//! helpers.

use url::form_urlencoded::Serializer;

fn serializer() -> Serializer<'static, String> {
    Serializer::for_suffix(String::from("?"), 1)
}

/// Standard listing query: `search_field` first when provided, then the
/// mandatory `search` (blank string when absent).
pub fn search_query(search_field: Option<&str>, search_value: Option<&str>) -> String {
    let mut query = serializer();
    if let Some(field) = search_field.filter(|f| !f.is_empty()) {
        query.append_pair("search_field", field);
    }
    query.append_pair("search", search_value.unwrap_or(""));
    query.finish()
}

/// Invoice listing query: the standard search pair plus a `status` filter,
/// appended only when present and not `"all"`.
pub fn invoices_query(
    search_field: Option<&str>,
    search_value: Option<&str>,
    status: Option<&str>,
) -> String {
    let mut query = serializer();
    if let Some(field) = search_field.filter(|f| !f.is_empty()) {
        query.append_pair("search_field", field);
    }
    query.append_pair("search", search_value.unwrap_or(""));
    if let Some(status) = status.filter(|s| !s.is_empty() && *s != "all") {
        query.append_pair("status", status);
    }
    query.finish()
}

/// Inventory listing query: `department_name` and `item` are always
/// emitted (blank when absent), followed by the standard search pair.
pub fn inventory_query(
    department_name: Option<&str>,
    item: Option<&str>,
    search_field: Option<&str>,
    search_value: Option<&str>,
) -> String {
    let mut query = serializer();
    query.append_pair("department_name", department_name.unwrap_or(""));
    query.append_pair("item", item.unwrap_or(""));
    if let Some(field) = search_field.filter(|f| !f.is_empty()) {
        query.append_pair("search_field", field);
    }
    query.append_pair("search", search_value.unwrap_or(""));
    query.finish()
}

/// Forward the inbound query verbatim ("" when there was none).
pub fn passthrough(raw: Option<&str>) -> String {
    match raw {
        Some(query) if !query.is_empty() => format!("?{query}"),
        _ => String::new(),
    }
}

/// Forward the inbound query minus the named keys, re-encoded. Used where
/// routing parameters (`receiptId`, `action`) share the query string with
/// upstream filter parameters.
pub fn passthrough_excluding(raw: Option<&str>, exclude: &[&str]) -> String {
    let Some(raw) = raw.filter(|q| !q.is_empty()) else {
        return String::new();
    };

    let mut query = Serializer::new(String::new());
    let mut any = false;
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if exclude.contains(&key.as_ref()) {
            continue;
        }
        query.append_pair(&key, &value);
        any = true;
    }
    if any {
        format!("?{}", query.finish())
    } else {
        String::new()
    }
}
