//! The Italian price-summary view: one compact entry per offer with its
//! F0/F1/F2 price structure.

use crate::error::ProxyError;
use serde::Serialize;
use serde_json::Value;

/// Prices of one grid type, taken from the non-withholding-tax fields.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GridPrices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f0_price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f1_price: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f2_price: Option<Value>,
}

impl GridPrices {
    fn from_grid(grid: &Value) -> Self {
        Self {
            annual_price: grid.get("annual_price_non_wht").cloned(),
            f0_price: grid.get("F0_non_wht").cloned(),
            f1_price: grid.get("F1_non_wht").cloned(),
            f2_price: grid.get("F2_non_wht").cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceStructure {
    Fixed(GridPrices),
    PunWithKwhFee(GridPrices),
    /// Grids are present but in neither known form
    Unknown,
    /// The offer carries no grid prices at all
    NoData,
}

impl PriceStructure {
    /// Decode `offer.price.elec_grids`. A fixed grid wins over a PUN grid.
    pub fn from_offer(offer: &Value) -> Self {
        let Some(grids) = offer
            .get("price")
            .and_then(|price| price.get("elec_grids"))
            .filter(|grids| is_present(grids))
        else {
            return PriceStructure::NoData;
        };

        if let Some(fixed) = grids.get("fixed").filter(|g| is_present(g)) {
            PriceStructure::Fixed(GridPrices::from_grid(fixed))
        } else if let Some(pun) = grids.get("pun_with_kwh_fee").filter(|g| is_present(g)) {
            PriceStructure::PunWithKwhFee(GridPrices::from_grid(pun))
        } else {
            PriceStructure::Unknown
        }
    }
}

/// One entry of the reshaped `results` list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OfferSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_energy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tariff_type: Option<Value>,
    pub price_structure: PriceStructure,
}

impl OfferSummary {
    pub fn from_offer(offer: &Value) -> Self {
        Self {
            name: offer.get("name").cloned(),
            provider: offer.get("provider").and_then(|p| p.get("name")).cloned(),
            green_energy: offer.get("has_green_energy").cloned(),
            tariff_type: offer.get("tariff_type").cloned(),
            price_structure: PriceStructure::from_offer(offer),
        }
    }
}

/// Reshape every entry of `results`, keeping all other top-level keys.
///
/// A `null` or missing `results` is dropped from the output; a non-array
/// `results` is rejected.
pub fn reshape_price_summary(data: Value) -> Result<Value, ProxyError> {
    let Value::Object(mut payload) = data else {
        return Err(ProxyError::Payload(
            "price summary payload is not a JSON object".to_string(),
        ));
    };

    match payload.remove("results") {
        None | Some(Value::Null) => {}
        Some(Value::Array(offers)) => {
            let summaries = offers
                .iter()
                .map(|offer| serde_json::to_value(OfferSummary::from_offer(offer)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ProxyError::Payload(e.to_string()))?;
            payload.insert("results".to_string(), Value::Array(summaries));
        }
        Some(_) => {
            return Err(ProxyError::Payload("results is not an array".to_string()));
        }
    }

    Ok(Value::Object(payload))
}

/// JSON "truthiness": absent, `null`, `false`, `0` and `""` count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
