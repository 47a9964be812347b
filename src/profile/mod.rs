//! User profile types: raw survey responses and the normalized feature vector.
//!
//! Missing-answer policy: a missing answer, or a categorical code outside its
//! lookup table, normalizes to `None` ("unknown") and is excluded from all
//! downstream math. This is the single policy used everywhere; no feature
//! substitutes a neutral default.

mod normalizer;

pub use normalizer::{interest_vector, normalize_profile};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ValidationError;

/// Raw survey answers: question identifier -> integer Likert response.
#[derive(Debug, Clone, Default)]
pub struct SurveyResponses(BTreeMap<String, i64>);

impl SurveyResponses {
    /// Build from a JSON object of integer answers.
    ///
    /// Non-object payloads and non-integer answers are validation failures;
    /// the caller reports them, nothing is retried.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or_else(|| ValidationError::InvalidValue {
            field: "survey".to_string(),
            message: "expected an object of integer answers".to_string(),
        })?;

        let mut answers = BTreeMap::new();
        for (key, raw) in object {
            let answer = raw.as_i64().ok_or_else(|| ValidationError::InvalidValue {
                field: format!("survey.{key}"),
                message: format!("expected an integer, got {raw}"),
            })?;
            answers.insert(key.clone(), answer);
        }
        Ok(Self(answers))
    }

    /// Fetch a raw answer by question id.
    pub fn get(&self, question: &str) -> Option<i64> {
        self.0.get(question).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, i64)> for SurveyResponses {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What primarily drives the user toward an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreMotivation {
    Achievement,
    Recovery,
    Connection,
    Vitality,
}

/// Preferred mode of social engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialityType {
    Solo,
    Parallel,
    LowInteractionGroup,
    HighInteractionGroup,
}

/// Preferred group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSize {
    OneOnOne,
    SmallGroup,
    LargeGroup,
}

/// Indoor/outdoor preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredSpace {
    Indoor,
    Outdoor,
}

/// Practical constraints on what the user can take on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Constraints {
    pub time_availability: Option<f64>,
    pub financial_budget: Option<f64>,
    pub energy_level: Option<f64>,
    pub mobility: Option<f64>,
    pub has_physical_constraints: Option<bool>,
    pub has_housing_constraints: Option<bool>,
    pub preferred_space: Option<PreferredSpace>,
}

/// Psychological state scores.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PsychState {
    pub self_criticism: Option<f64>,
    pub social_anxiety: Option<f64>,
    pub isolation_level: Option<f64>,
    pub structure_preference: Option<f64>,
    pub avoidant_coping: Option<f64>,
}

/// Relative weight the user places on each value dimension.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueProfile {
    pub knowledge: Option<f64>,
    pub stability: Option<f64>,
    pub relationship: Option<f64>,
    pub health: Option<f64>,
    pub creativity: Option<f64>,
    pub control: Option<f64>,
}

/// Motivation features.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Motivation {
    pub core_motivation: Option<CoreMotivation>,
    pub value_profile: ValueProfile,
    pub process_orientation: Option<f64>,
}

/// Social preference features.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialPreference {
    pub preferred_sociality_type: Option<SocialityType>,
    pub preferred_group_size: Option<GroupSize>,
    pub autonomy_preference: Option<f64>,
}

/// Interest/disposition vector consumed by the scoring engine.
///
/// Each field is a normalized Likert answer in [0,1], or `None` when the
/// answer is missing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterestVector {
    pub e_introvert: Option<f64>,
    pub o_openness: Option<f64>,
    pub c_conscientiousness: Option<f64>,
    pub a_autonomy: Option<f64>,
    pub k_competence: Option<f64>,
    pub energy_dynamic: Option<f64>,
    pub extrinsic_drive: Option<f64>,
    pub online_affinity: Option<f64>,
    pub breadth_preference: Option<f64>,
    pub process_focus: Option<f64>,
}

/// The full normalized feature profile, grouped by feature family.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizedProfile {
    pub constraints: Constraints,
    pub psych: PsychState,
    pub motivation: Motivation,
    pub social: SocialPreference,
    pub interests: InterestVector,
}
