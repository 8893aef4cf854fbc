//! `/api/energy`: forwards the inbound query as-is, minus `route`.

use crate::adapter::{InboundQuery, Route, Translation, UpstreamQuery};

pub const FAILURE_LABEL: &str = "Failed to fetch data from energy API";

/// Only `route=providers` changes the target; every other parameter,
/// duplicates and empty values included, is forwarded in order.
pub fn translate_passthrough(inbound: &InboundQuery) -> Translation {
    let route = match inbound.get("route") {
        Some("providers") => Route::Providers,
        _ => Route::Offers,
    };

    let mut query = UpstreamQuery::new();
    for (name, value) in inbound.pairs() {
        query.append(name, value);
    }
    query.remove("route");

    Translation { route, query }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_but_route_is_forwarded() {
        let inbound = InboundQuery::new(vec![
            ("country".to_string(), "FRA".to_string()),
            ("route".to_string(), "providers".to_string()),
            ("tag".to_string(), "a".to_string()),
            ("tag".to_string(), "b".to_string()),
        ]);
        let translation = translate_passthrough(&inbound);
        assert_eq!(translation.route, Route::Providers);
        assert_eq!(translation.query.to_query_string(), "country=FRA&tag=a&tag=b");
    }

    #[test]
    fn test_price_summary_is_not_special() {
        let inbound = InboundQuery::new(vec![("route".to_string(), "price_summary".to_string())]);
        let translation = translate_passthrough(&inbound);
        assert_eq!(translation.route, Route::Offers);
        assert!(translation.query.is_empty());
    }
}
