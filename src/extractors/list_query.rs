//! Extract list parameters and column filters from the query string.

use crate::coerce::parse_bool;
use crate::error::AppError;
use crate::service::{FilterValue, ListParams};
use crate::value::GenericValue;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

/// Query keys with a fixed meaning; every other key is a column filter.
pub const RESERVED_KEYS: [&str; 4] = ["limit", "offset", "order_by", "sort"];

/// `?limit=&offset=&order_by=&sort=` plus `<column>=<value>` filters.
/// A column repeated several times filters with `IN`.
#[derive(Clone, Debug, Default)]
pub struct ListQuery(pub ListParams);

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(format!("invalid query string: {}", e)))?;
        Ok(ListQuery(list_params_from_pairs(pairs)))
    }
}

/// Integer, then finite float, then boolean, else the string itself.
pub fn parse_query_value(s: &str) -> GenericValue {
    if let Ok(n) = s.parse::<i64>() {
        return GenericValue::Int(n);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return GenericValue::Float(f);
        }
    }
    if let Some(b) = parse_bool(s) {
        return GenericValue::Bool(b);
    }
    GenericValue::String(s.to_string())
}

pub fn list_params_from_pairs(pairs: Vec<(String, String)>) -> ListParams {
    let mut params = ListParams::default();
    for (k, v) in pairs {
        match k.as_str() {
            "limit" => {
                if params.limit.is_none() {
                    params.limit = v.trim().parse().ok();
                }
            }
            "offset" => {
                if params.offset.is_none() {
                    params.offset = v.trim().parse().ok();
                }
            }
            "order_by" => {
                params.order_by.get_or_insert(v);
            }
            "sort" => {
                params.sort.get_or_insert(v);
            }
            _ => {
                if v.is_empty() {
                    continue;
                }
                let value = parse_query_value(&v);
                match params.filters.remove(&k) {
                    None => {
                        params.filters.insert(k, FilterValue::One(value));
                    }
                    Some(FilterValue::One(first)) => {
                        params.filters.insert(k, FilterValue::Many(vec![first, value]));
                    }
                    Some(FilterValue::Many(mut all)) => {
                        all.push(value);
                        params.filters.insert(k, FilterValue::Many(all));
                    }
                }
            }
        }
    }
    params
}
