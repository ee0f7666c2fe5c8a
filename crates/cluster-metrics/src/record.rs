//! Cached payload types: datapoints, dimension properties and the record
//! that groups them for one resource.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Ordered dimension map attached to a datapoint.
pub type Dimensions = BTreeMap<String, String>;

/// Whether a value is a point-in-time level or a monotonically growing count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Current level, may go up or down
    Gauge,
    /// Cumulative count since the object was created
    Counter,
}

/// Numeric value of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Whole-number value (counts, phases, flags)
    Int(i64),
    /// Fractional value (parsed quantities)
    Float(f64),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// One metric observation.
///
/// No timestamp is cached; the sink stamps datapoints when it emits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datapoint {
    /// Dotted metric name, e.g. `kubernetes.pod_phase`
    pub metric: String,
    /// Observed value
    pub value: Value,
    /// Gauge or counter
    pub metric_type: MetricType,
    /// Dimensions identifying the time series
    pub dimensions: Dimensions,
}

impl Datapoint {
    /// Builds a gauge observation.
    pub fn gauge(metric: &str, dimensions: &Dimensions, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.into(),
            metric_type: MetricType::Gauge,
            dimensions: dimensions.clone(),
        }
    }

    /// Builds a counter observation.
    pub fn counter(metric: &str, dimensions: &Dimensions, value: impl Into<Value>) -> Self {
        Self {
            metric: metric.to_string(),
            value: value.into(),
            metric_type: MetricType::Counter,
            dimensions: dimensions.clone(),
        }
    }
}

/// A dimension name/value pair that properties get attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    /// Dimension key, e.g. `kubernetes_uid`
    pub name: String,
    /// Dimension value the properties apply to
    pub value: String,
}

/// Descriptive metadata for one dimension value, independent of any time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimProperties {
    /// The dimension value being described
    pub dimension: Dimension,
    /// Key/value properties (non-empty labels and kind-specific fields)
    pub properties: BTreeMap<String, String>,
    /// Value-less tags (labels with an empty value)
    pub tags: BTreeSet<String>,
}

impl DimProperties {
    /// Builds a property update, or `None` when there is nothing to attach.
    #[must_use]
    pub fn new(
        dimension_name: &str,
        dimension_value: &str,
        properties: BTreeMap<String, String>,
        tags: BTreeSet<String>,
    ) -> Option<Self> {
        if properties.is_empty() && tags.is_empty() {
            return None;
        }
        Some(Self {
            dimension: Dimension {
                name: dimension_name.to_string(),
                value: dimension_value.to_string(),
            },
            properties,
            tags,
        })
    }
}

/// Everything derived from one resource object. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DerivedRecord {
    /// Observations in derivation order
    pub datapoints: Vec<Datapoint>,
    /// At most one property update for the object
    pub dim_props: Option<DimProperties>,
}

impl DerivedRecord {
    /// Wraps derived data, returning `None` (skip) when there is none.
    #[must_use]
    pub fn from_parts(datapoints: Vec<Datapoint>, dim_props: Option<DimProperties>) -> Option<Self> {
        if datapoints.is_empty() && dim_props.is_none() {
            None
        } else {
            Some(Self {
                datapoints,
                dim_props,
            })
        }
    }

    /// Looks up the first datapoint with the given metric name.
    #[must_use]
    pub fn datapoint(&self, metric: &str) -> Option<&Datapoint> {
        self.datapoints.iter().find(|dp| dp.metric == metric)
    }
}
