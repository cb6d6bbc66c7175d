//! Cost query request body.

use serde::Serialize;

use super::MetricKind;
use crate::period::BillingPeriod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timeframe: &'static str,
    pub time_period: TimePeriod,
    pub dataset: Dataset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePeriod {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub granularity: &'static str,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub total_cost: AggregationFunction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationFunction {
    pub name: &'static str,
    pub function: &'static str,
}

/// Sum of cost over the whole billing month, no time grain.
pub fn build_query(kind: MetricKind, period: BillingPeriod) -> QueryDefinition {
    QueryDefinition {
        kind: kind.api_type(),
        timeframe: "Custom",
        time_period: TimePeriod {
            from: period.time_from(),
            to: period.time_to(),
        },
        dataset: Dataset {
            granularity: "None",
            aggregation: Aggregation {
                total_cost: AggregationFunction {
                    name: "Cost",
                    function: "Sum",
                },
            },
        },
    }
}
