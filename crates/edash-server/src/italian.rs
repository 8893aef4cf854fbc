use crate::adapter::{
    InboundQuery, Market, Route, UpstreamQuery, append_flag, append_provider, append_value,
};
use crate::error::ProxyError;
use crate::reshape::reshape_price_summary;
use serde_json::Value;

/// Italy: F0/F1/F2 time bands, PUN-indexed offers and the price summary view.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItalianMarket;

impl Market for ItalianMarket {
    fn country(&self) -> &'static str {
        "ITA"
    }

    fn endpoint_label(&self) -> &'static str {
        "Italian Energy API"
    }

    fn failure_label(&self) -> &'static str {
        "Failed to fetch Italian energy data"
    }

    fn apply_preset(&self, preset: &str, query: &mut UpstreamQuery) -> bool {
        let (name, value) = match preset {
            "green" => ("has_green_energy", "true"),
            "fixed" => ("tariff_type__in", "fixed_price"),
            "variable" => ("tariff_type__in", "variable_price"),
            "indexed" => ("tariff_type__in", "indexed_price"),
            _ => return false,
        };
        query.append(name, value);
        true
    }

    fn append_filters(&self, inbound: &InboundQuery, query: &mut UpstreamQuery) {
        append_flag(inbound, query, "has_green_energy");
        append_value(inbound, query, "tariff_type", "tariff_type__in");
        append_provider(inbound, query);
        append_value(inbound, query, "grid_type", "grid_type");
        append_value(inbound, query, "f_rate", "f_rate");
        append_flag(inbound, query, "pun_based");
    }

    fn supports(&self, _route: Route) -> bool {
        true
    }

    fn reshape(&self, route: Route, data: Value) -> Result<Value, ProxyError> {
        match route {
            Route::PriceSummary => reshape_price_summary(data),
            Route::Offers | Route::Providers => Ok(data),
        }
    }
}
