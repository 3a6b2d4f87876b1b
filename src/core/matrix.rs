//! Matrix strategy expansion

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// A matrix strategy: one or more named axes, each with an ordered list of
/// values.
///
/// Axis order and value order follow the declaration, so expansion is
/// deterministic and a designated instance (e.g. version "3.9") can be
/// identified downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    axes: Vec<(String, Vec<String>)>,
}

impl Matrix {
    pub fn from_axes(axes: Vec<(String, Vec<String>)>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[(String, Vec<String>)] {
        &self.axes
    }

    /// Number of instances the matrix expands to
    pub fn len(&self) -> usize {
        self.axes.iter().map(|(_, values)| values.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Full Cartesian product of axis values, in declaration order.
    ///
    /// Each combination carries a display label (axis values joined in axis
    /// order) and the bound values themselves.
    pub fn expand(&self) -> Vec<(String, BTreeMap<String, String>)> {
        let mut combos: Vec<(Vec<String>, BTreeMap<String, String>)> =
            vec![(Vec::new(), BTreeMap::new())];

        for (axis, values) in &self.axes {
            let mut next = Vec::with_capacity(combos.len() * values.len());
            for (labels, bound) in &combos {
                for value in values {
                    let mut labels = labels.clone();
                    let mut bound = bound.clone();
                    labels.push(value.clone());
                    bound.insert(axis.clone(), value.clone());
                    next.push((labels, bound));
                }
            }
            combos = next;
        }

        combos
            .into_iter()
            .map(|(labels, bound)| (labels.join(", "), bound))
            .collect()
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
        if mapping.is_empty() {
            return Err(de::Error::custom("matrix has no axes"));
        }

        let mut axes = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let axis = key
                .as_str()
                .ok_or_else(|| de::Error::custom("matrix axis name must be a string"))?
                .to_string();
            let seq = value.as_sequence().ok_or_else(|| {
                de::Error::custom(format!("matrix axis '{}' must be a list of values", axis))
            })?;
            if seq.is_empty() {
                return Err(de::Error::custom(format!(
                    "matrix axis '{}' has no values",
                    axis
                )));
            }
            let values = seq
                .iter()
                .map(|v| scalar_to_string(&axis, v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(de::Error::custom)?;
            axes.push((axis, values));
        }

        Ok(Matrix { axes })
    }
}

impl Serialize for Matrix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for (axis, values) in &self.axes {
            map.serialize_entry(axis, values)?;
        }
        map.end()
    }
}

fn scalar_to_string(axis: &str, value: &serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(format!("matrix axis '{}' has a non-scalar value", axis)),
    }
}
