//! Translation of the dashboard's query vocabulary into upstream queries.
//!
//! Each market contributes its fixed country code, its filter presets and the
//! order in which it forwards additive filters. The rest of the pipeline is
//! shared.

use crate::error::ProxyError;
use serde_json::Value;
use tracing::warn;

/// Query parameters of an inbound request, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundQuery(Vec<(String, String)>);

impl InboundQuery {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First value for `name`. Empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn is_true(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl From<Vec<(String, String)>> for InboundQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

/// An ordered multi-map with URL search-param semantics: `append` keeps
/// duplicates, `set` collapses them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamQuery {
    pairs: Vec<(String, String)>,
}

impl UpstreamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    /// Replace the first `name` in place and drop the rest, or append when
    /// absent.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter().position(|(key, _)| key == name) {
            Some(index) => {
                self.pairs[index].1 = value.to_string();
                let mut seen = 0;
                self.pairs.retain(|(key, _)| {
                    if key != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.append(name, value),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(key, _)| key != name);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish()
    }
}

/// Which upstream resource a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Offers,
    Providers,
    PriceSummary,
}

impl Route {
    /// Anything unrecognized is the offers listing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("providers") => Route::Providers,
            Some("price_summary") => Route::PriceSummary,
            _ => Route::Offers,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Offers => "offers",
            Route::Providers => "providers",
            Route::PriceSummary => "price_summary",
        }
    }

    /// Path appended to the upstream base URL.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            Route::Providers => "/providers",
            Route::Offers | Route::PriceSummary => "",
        }
    }
}

/// One upstream market behind the proxy.
pub trait Market: Send + Sync {
    /// ISO country code injected into every upstream query.
    fn country(&self) -> &'static str;

    /// Name reported in failure payloads.
    fn endpoint_label(&self) -> &'static str;

    /// `error` field of failure payloads.
    fn failure_label(&self) -> &'static str;

    /// Apply a named preset. Returns `false` when the name is not a preset
    /// of this market.
    fn apply_preset(&self, preset: &str, query: &mut UpstreamQuery) -> bool;

    /// Append the market's additive filters in its forwarding order.
    fn append_filters(&self, inbound: &InboundQuery, query: &mut UpstreamQuery);

    fn supports(&self, route: Route) -> bool {
        route != Route::PriceSummary
    }

    /// Post-process a successful upstream payload.
    fn reshape(&self, _route: Route, data: Value) -> Result<Value, ProxyError> {
        Ok(data)
    }
}

/// The upstream request derived from one inbound query.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub route: Route,
    pub query: UpstreamQuery,
}

/// Build the upstream query for `market`.
pub fn translate(market: &dyn Market, inbound: &InboundQuery) -> Translation {
    let route = Route::parse(inbound.get("route"));
    let route = if market.supports(route) {
        route
    } else {
        Route::Offers
    };

    let mut query = UpstreamQuery::new();
    query.append("country", market.country());

    if route == Route::Providers {
        return Translation { route, query };
    }

    query.append("energy_type", "electricity");
    query.append("scope__contains", "seo");
    query.append("page", inbound.get("page").unwrap_or("1"));
    query.append("limit", inbound.get("limit").unwrap_or("10"));

    let preset = inbound.get("filter_type").unwrap_or("basic");
    if preset != "basic" && !market.apply_preset(preset, &mut query) {
        warn!(
            country = market.country(),
            "Unknown filter_type '{}', using basic",
            preset
        );
    }

    market.append_filters(inbound, &mut query);

    Translation { route, query }
}

/// Forward `name=true` only when the inbound value is exactly `true`.
pub(crate) fn append_flag(inbound: &InboundQuery, query: &mut UpstreamQuery, name: &str) {
    if inbound.is_true(name) {
        query.append(name, "true");
    }
}

/// Forward a non-empty inbound value, possibly under another name.
pub(crate) fn append_value(
    inbound: &InboundQuery,
    query: &mut UpstreamQuery,
    from: &str,
    to: &str,
) {
    if let Some(value) = inbound.get(from) {
        query.append(to, value);
    }
}

/// `all` means no provider filter.
pub(crate) fn append_provider(inbound: &InboundQuery, query: &mut UpstreamQuery) {
    if let Some(provider) = inbound.get("provider").filter(|p| *p != "all") {
        query.append("provider", provider);
    }
}
