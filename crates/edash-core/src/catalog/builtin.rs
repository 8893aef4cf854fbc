//! Built-in energy-market API groups.

use super::{ApiGroup, ClientDefaults, HttpMethod, OperationDescriptor, ParamKind, ParamSpec};
use std::collections::BTreeMap;

const REPOSITORY_URL: &str = "https://github.com/papernest/energy-comparator";
const DOCS_URL: &str = "https://docs.papernest.com/energy";

const TARIFF_TYPES: &[&str] = &["fixed_price", "indexed_price", "variable_price"];

pub(super) fn energy_markets() -> Vec<ApiGroup> {
    vec![french_market(), italian_market()]
}

fn client_defaults() -> ClientDefaults {
    ClientDefaults {
        timeout: Some(10_000),
        headers: BTreeMap::from([("Content-Type".to_string(), "application/json".to_string())]),
        api_key: None,
    }
}

fn get(
    id: &str,
    name: &str,
    description: &str,
    path: &str,
    query: Vec<ParamSpec>,
) -> OperationDescriptor {
    OperationDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        method: HttpMethod::Get,
        path: path.to_string(),
        requires_auth: false,
        query_params: query,
        body_params: Vec::new(),
    }
}

fn page() -> ParamSpec {
    ParamSpec::new("page", ParamKind::Number)
        .describe("Page number for pagination")
        .default_value(1)
        .allowed(&["1", "2", "3", "4", "5"])
}

fn limit(default: u64, allowed: &[&str]) -> ParamSpec {
    ParamSpec::new("limit", ParamKind::Number)
        .describe("Number of results per page")
        .default_value(default)
        .allowed(allowed)
}

fn flag(name: &str, description: &str) -> ParamSpec {
    ParamSpec::new(name, ParamKind::Boolean)
        .describe(description)
        .allowed(&["true", "false"])
}

fn route(value: &str) -> ParamSpec {
    ParamSpec::new("route", ParamKind::String)
        .required()
        .describe("Route type")
        .default_value(value)
        .allowed(&[value])
}

fn french_market() -> ApiGroup {
    let path = "/api/energy/french";

    ApiGroup {
        id: "french-energy-market".to_string(),
        name: "French Energy Market".to_string(),
        description: "Access French energy market data with comprehensive filtering options"
            .to_string(),
        base_url: String::new(),
        repository_url: REPOSITORY_URL.to_string(),
        docs_url: DOCS_URL.to_string(),
        config: client_defaults(),
        endpoints: vec![
            get(
                "french-energy-offers",
                "French Energy Offers",
                "Get energy offers from French providers with advanced filtering",
                path,
                vec![
                    ParamSpec::new("filter_type", ParamKind::String)
                        .describe("Filter type for French market")
                        .default_value("basic")
                        .allowed(&["basic", "green", "papernest", "recommended"]),
                    page(),
                    limit(10, &["5", "10", "20", "50"]),
                    flag("has_green_energy", "Filter for green energy offers only"),
                    flag("sort_papernest_partner", "Sort by Papernest partner priority"),
                    ParamSpec::new("provider", ParamKind::String)
                        .describe("Provider filter")
                        .default_value("all")
                        .allowed(&[
                            "all",
                            "engie",
                            "edf",
                            "totalenergies",
                            "enercoop",
                            "papernest",
                            "ekwateur",
                            "octopus",
                            "vattenfall",
                            "mint",
                            "ilek",
                        ]),
                    ParamSpec::new("power_rating", ParamKind::String)
                        .describe("Power rating in kVA (French grid)")
                        .allowed(&["3", "6", "9", "12", "15", "18", "24", "36"]),
                    ParamSpec::new("tariff_type", ParamKind::String)
                        .describe("Tariff type filter")
                        .allowed(TARIFF_TYPES),
                ],
            ),
            get(
                "french-energy-providers",
                "French Energy Providers",
                "Get list of available French energy providers",
                path,
                vec![route("providers")],
            ),
        ],
    }
}

fn italian_market() -> ApiGroup {
    let path = "/api/energy/italian";

    ApiGroup {
        id: "italian-energy-market".to_string(),
        name: "Italian Energy Market".to_string(),
        description:
            "Access Italian energy market data with F0/F1/F2 pricing and PUN-based offers"
                .to_string(),
        base_url: String::new(),
        repository_url: REPOSITORY_URL.to_string(),
        docs_url: DOCS_URL.to_string(),
        config: client_defaults(),
        endpoints: vec![
            get(
                "italian-energy-offers",
                "Italian Energy Offers",
                "Get energy offers from Italian providers with F0/F1/F2 pricing",
                path,
                vec![
                    ParamSpec::new("filter_type", ParamKind::String)
                        .describe("Filter type for Italian market")
                        .default_value("basic")
                        .allowed(&["basic", "green", "fixed", "variable", "indexed"]),
                    page(),
                    limit(10, &["5", "10", "20", "50"]),
                    flag("has_green_energy", "Filter for green energy offers only"),
                    ParamSpec::new("tariff_type", ParamKind::String)
                        .describe("Tariff type filter (Italian specific)")
                        .allowed(TARIFF_TYPES),
                    ParamSpec::new("provider", ParamKind::String)
                        .describe("Provider filter")
                        .default_value("all")
                        .allowed(&[
                            "all",
                            "enel",
                            "eni",
                            "edison",
                            "acea",
                            "a2a",
                            "hera",
                            "iren",
                            "sorgenia",
                            "green_network",
                            "plenitude",
                        ]),
                    ParamSpec::new("grid_type", ParamKind::String)
                        .describe("Grid type (Italian specific)")
                        .allowed(&["fixed", "pun_with_kwh_fee"]),
                    ParamSpec::new("f_rate", ParamKind::String)
                        .describe("F-rate pricing (Italian specific)")
                        .allowed(&["F0", "F1", "F2"]),
                    flag("pun_based", "PUN-based offers only"),
                ],
            ),
            get(
                "italian-energy-providers",
                "Italian Energy Providers",
                "Get list of available Italian energy providers",
                path,
                vec![route("providers")],
            ),
            get(
                "italian-price-summary",
                "Italian Price Summary",
                "Get detailed price summary with F0/F1/F2 breakdown",
                path,
                vec![route("price_summary"), limit(5, &["5", "10", "20"])],
            ),
        ],
    }
}
