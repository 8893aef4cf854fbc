use crate::adapter::{
    InboundQuery, Market, UpstreamQuery, append_flag, append_provider, append_value,
};

/// France: partner sorting and kVA power ratings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrenchMarket;

impl Market for FrenchMarket {
    fn country(&self) -> &'static str {
        "FRA"
    }

    fn endpoint_label(&self) -> &'static str {
        "French Energy API"
    }

    fn failure_label(&self) -> &'static str {
        "Failed to fetch French energy data"
    }

    fn apply_preset(&self, preset: &str, query: &mut UpstreamQuery) -> bool {
        match preset {
            "green" => query.append("has_green_energy", "true"),
            "papernest" => query.append("sort_papernest_partner", "true"),
            "recommended" => {
                query.append("sort_papernest_partner", "true");
                query.set("limit", "3");
            }
            _ => return false,
        }
        true
    }

    fn append_filters(&self, inbound: &InboundQuery, query: &mut UpstreamQuery) {
        append_flag(inbound, query, "has_green_energy");
        append_flag(inbound, query, "sort_papernest_partner");
        append_provider(inbound, query);
        append_value(inbound, query, "power_rating", "power_rating");
        append_value(inbound, query, "tariff_type", "tariff_type__in");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Route, translate};

    fn inbound(pairs: &[(&str, &str)]) -> InboundQuery {
        InboundQuery::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_recommended_overrides_limit() {
        let translation = translate(
            &FrenchMarket,
            &inbound(&[("filter_type", "recommended"), ("limit", "50")]),
        );
        assert_eq!(translation.query.get_all("limit"), vec!["3"]);
        assert_eq!(translation.query.get("sort_papernest_partner"), Some("true"));
    }

    #[test]
    fn test_full_offer_query_order() {
        let translation = translate(
            &FrenchMarket,
            &inbound(&[
                ("filter_type", "green"),
                ("page", "2"),
                ("has_green_energy", "true"),
                ("provider", "edf"),
                ("power_rating", "6"),
                ("tariff_type", "fixed_price"),
            ]),
        );
        assert_eq!(translation.route, Route::Offers);
        assert_eq!(
            translation.query.to_query_string(),
            "country=FRA&energy_type=electricity&scope__contains=seo&page=2&limit=10\
             &has_green_energy=true&has_green_energy=true&provider=edf&power_rating=6\
             &tariff_type__in=fixed_price"
        );
    }

    #[test]
    fn test_unknown_preset_behaves_as_basic() {
        let basic = translate(&FrenchMarket, &inbound(&[]));
        let unknown = translate(&FrenchMarket, &inbound(&[("filter_type", "cheapest")]));
        assert_eq!(basic.query, unknown.query);
    }

    #[test]
    fn test_price_summary_is_offers_in_france() {
        let translation = translate(&FrenchMarket, &inbound(&[("route", "price_summary")]));
        assert_eq!(translation.route, Route::Offers);
    }
}
