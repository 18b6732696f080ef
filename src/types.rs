use serde::{Deserialize, Serialize};

/// Planar pose: position plus heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub phi: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, phi: f64) -> Pose {
        Pose { x, y, phi }
    }

    /// Reads a pose from a JSON object with numeric `x`, `y` and `phi` members.
    pub fn from_json(value: &serde_json::Value, origin: &str) -> crate::error::Result<Pose> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| crate::error::JudgerError::MissingField {
                    origin: origin.to_string(),
                    field: name.to_string(),
                })
        };
        Ok(Pose {
            x: field("x")?,
            y: field("y")?,
            phi: field("phi")?,
        })
    }
}

/// Outcome of a relocalization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Failure,
    Success,
}

impl Label {
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Failure => 0,
            Label::Success => 1,
        }
    }

    /// +1 for success, -1 for failure, as used by the SVM dual.
    pub fn sign(self) -> f64 {
        match self {
            Label::Failure => -1.0,
            Label::Success => 1.0,
        }
    }

    pub fn from_decision(value: f64) -> Label {
        if value > 0.0 {
            Label::Success
        } else {
            Label::Failure
        }
    }
}

/// Named feature values in the order they appeared in the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    entries: Vec<(String, f64)>,
}

impl FeatureSet {
    pub fn new() -> FeatureSet {
        FeatureSet::default()
    }

    /// Inserts or replaces a value; a new name is appended at the end.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads a flat JSON object of numeric values, keeping the document's key order.
    pub fn from_json(value: &serde_json::Value, origin: &str) -> crate::error::Result<FeatureSet> {
        let object = value.as_object().ok_or_else(|| {
            crate::error::JudgerError::malformed(origin, "feature document is not an object")
        })?;
        let mut features = FeatureSet::new();
        for (name, v) in object {
            let v = v.as_f64().ok_or_else(|| {
                crate::error::JudgerError::malformed(
                    origin,
                    format!("feature `{}` is not a number", name),
                )
            })?;
            features.insert(name.clone(), v);
        }
        Ok(features)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut features = FeatureSet::new();
        for (name, value) in iter {
            features.insert(name, value);
        }
        features
    }
}

/// One relocalization attempt as loaded from disk.
#[derive(Debug, Clone)]
pub struct Sample {
    /// `scene/position`, used in diagnostics.
    pub origin: String,
    pub features: FeatureSet,
    pub reference: Pose,
    pub predicted: Pose,
    pub label: Label,
}
