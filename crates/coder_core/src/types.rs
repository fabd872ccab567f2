use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a job, unique within one batch.
///
/// Upstream files and the session service disagree on whether ids are
/// numbers or strings, so both are accepted and kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => JobId(text),
            RawId::Int(n) => JobId(n.to_string()),
            RawId::Float(n) => JobId(n.to_string()),
        })
    }
}

/// Opaque token scoping one batch on the session service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random (v4) session identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const UNCODABLE_LABEL: &str = "*";
pub const UNCODABLE_DESCRIPTION: &str = "uncodable";
pub const UNCODABLE_DISTANCE: f64 = 9.99;
pub const UNCODABLE_RANK: u32 = 9999;

/// One ranked code proposal for a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub description: String,
    #[serde(deserialize_with = "lenient::number")]
    pub distance: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub rank: u32,
}

impl Candidate {
    pub fn new(label: impl Into<String>, description: impl Into<String>, distance: f64, rank: u32) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            distance,
            rank,
        }
    }

    /// Reserved candidate recording that a human decided the job cannot be coded.
    pub fn uncodable() -> Self {
        Self::new(
            UNCODABLE_LABEL,
            UNCODABLE_DESCRIPTION,
            UNCODABLE_DISTANCE,
            UNCODABLE_RANK,
        )
    }

    /// Explicit "clear assignment" candidate; distinct from never assigned.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_uncodable(&self) -> bool {
        self.label == UNCODABLE_LABEL
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_empty()
    }
}

/// Ranked candidates returned for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub input_id: JobId,
    #[serde(default)]
    pub response: Vec<Candidate>,
    /// Set only on placeholders synthesised after a chunk exhausted its retries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl Suggestion {
    pub fn new(input_id: JobId, response: Vec<Candidate>) -> Self {
        Self {
            input_id,
            response,
            failed: false,
        }
    }

    /// Visible stand-in for a job whose classification request kept failing.
    pub fn failure_placeholder(input_id: JobId, attempts: u32) -> Self {
        Self {
            input_id,
            response: vec![Candidate::new(
                FAILED_LABEL,
                format!("classification failed after {attempts} attempts"),
                UNCODABLE_DISTANCE,
                1,
            )],
            failed: true,
        }
    }

    pub fn candidate_with_rank(&self, rank: u32) -> Option<&Candidate> {
        self.response.iter().find(|candidate| candidate.rank == rank)
    }

    /// Candidates ordered ascending by distance (closest first).
    pub fn by_distance(&self) -> Vec<Candidate> {
        let mut ordered = self.response.clone();
        ordered.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ordered
    }
}

pub const FAILED_LABEL: &str = "ERROR";

/// A free-text record awaiting a classification code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    #[serde(default)]
    pub description_orig: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub code_description: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub code_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub code_rank: Option<u32>,
    /// Text found past the description column of a fixed-width row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess: Option<String>,
}

/// How a job's code fields currently read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Never,
    Cleared,
    Uncodable,
    Coded,
}

impl Job {
    pub fn new(id: impl Into<JobId>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            id: id.into(),
            description_orig: description.clone(),
            description,
            ..Self::default()
        }
    }

    pub fn is_coded(&self) -> bool {
        !self.code.is_empty()
    }

    pub fn assignment(&self) -> Assignment {
        if self.code == UNCODABLE_LABEL {
            Assignment::Uncodable
        } else if self.is_coded() {
            Assignment::Coded
        } else if self.code_rank.is_some() || self.code_score.is_some() {
            Assignment::Cleared
        } else {
            Assignment::Never
        }
    }

    pub fn assign(&mut self, candidate: &Candidate) {
        self.code = candidate.label.clone();
        self.code_description = candidate.description.clone();
        self.code_score = Some(candidate.distance);
        self.code_rank = Some(candidate.rank);
    }
}

/// The session service stringifies every scalar it hands back ("" for null),
/// so numeric fields accept either representation.
mod lenient {
    use std::str::FromStr;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    fn parse<T: FromStr>(raw: Raw) -> Option<Result<T, String>> {
        let text = match raw {
            Raw::Text(text) => text.trim().to_string(),
            Raw::Number(number) => number.to_string(),
        };
        if text.is_empty() {
            return None;
        }
        Some(
            text.parse::<T>()
                .or_else(|_| {
                    // "3.0" for an integer field
                    text.parse::<f64>()
                        .map_err(|_| ())
                        .and_then(|value| value.to_string().parse::<T>().map_err(|_| ()))
                })
                .map_err(|_| format!("invalid number {text:?}")),
        )
    }

    pub(super) fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        match parse(Raw::deserialize(deserializer)?) {
            Some(value) => value.map_err(D::Error::custom),
            None => Err(D::Error::custom("empty number")),
        }
    }

    pub(super) fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => parse(raw).transpose().map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}
