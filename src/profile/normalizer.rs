//! Survey normalization: raw Likert answers to the [0,1] feature profile.
//!
//! Numeric features use linear min-max scaling rounded to 4 decimal places.
//! Composite features average their raw components first (reverse-scored
//! items as `6 - raw`), then normalize. Categorical features go through
//! fixed lookup tables; unknown codes are `None`, never a crash.

use super::{
    Constraints, CoreMotivation, GroupSize, InterestVector, Motivation, NormalizedProfile,
    PreferredSpace, PsychState, SocialPreference, SocialityType, SurveyResponses, ValueProfile,
};

/// Min-max normalize a raw answer into [0,1], rounded to 4 decimals.
///
/// Answers outside the declared scale are treated as unknown, consistent
/// with the missing-answer policy.
fn normalize(raw: Option<i64>, min: i64, max: i64) -> Option<f64> {
    let raw = raw?;
    if raw < min || raw > max {
        return None;
    }
    Some(round4((raw - min) as f64 / (max - min) as f64))
}

/// Normalize the mean of raw composite components. All components must be
/// present; a single missing answer makes the composite unknown.
fn normalize_mean(components: &[Option<i64>], min: i64, max: i64) -> Option<f64> {
    let mut sum = 0.0;
    for c in components {
        let v = (*c)?;
        if v < min || v > max {
            return None;
        }
        sum += v as f64;
    }
    let mean = sum / components.len() as f64;
    Some(round4((mean - min as f64) / (max - min) as f64))
}

/// Reverse-score a Likert 1..5 answer as `6 - raw`.
fn reverse(raw: Option<i64>) -> Option<i64> {
    raw.map(|v| 6 - v)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Build the full normalized profile from numbered survey answers.
pub fn normalize_profile(survey: &SurveyResponses) -> NormalizedProfile {
    let constraints = Constraints {
        time_availability: normalize(survey.get("1"), 1, 4),
        financial_budget: normalize(survey.get("2"), 1, 4),
        energy_level: normalize(survey.get("3"), 1, 5),
        mobility: normalize(survey.get("4"), 1, 5),
        has_physical_constraints: survey.get("5").map(|v| (1..=3).contains(&v)),
        has_housing_constraints: survey.get("12").map(|v| (2..=4).contains(&v)),
        preferred_space: match survey.get("6") {
            Some(1) => Some(PreferredSpace::Indoor),
            Some(2) => Some(PreferredSpace::Outdoor),
            _ => None,
        },
    };

    let psych = PsychState {
        self_criticism: normalize_mean(
            &[survey.get("13"), reverse(survey.get("14")), survey.get("16")],
            1,
            5,
        ),
        social_anxiety: normalize_mean(
            &[survey.get("15"), survey.get("18"), survey.get("20")],
            1,
            5,
        ),
        isolation_level: normalize(survey.get("21"), 1, 5),
        structure_preference: normalize(survey.get("27"), 1, 5),
        avoidant_coping: normalize(survey.get("29"), 1, 5),
    };

    let motivation = Motivation {
        core_motivation: match survey.get("31") {
            Some(1) => Some(CoreMotivation::Achievement),
            Some(2) => Some(CoreMotivation::Recovery),
            Some(3) => Some(CoreMotivation::Connection),
            Some(4) => Some(CoreMotivation::Vitality),
            _ => None,
        },
        value_profile: ValueProfile {
            knowledge: normalize(survey.get("33"), 1, 5),
            stability: normalize(survey.get("34"), 1, 5),
            relationship: normalize(survey.get("35"), 1, 5),
            health: normalize(survey.get("36"), 1, 5),
            creativity: normalize(survey.get("37"), 1, 5),
            control: normalize(survey.get("38"), 1, 5),
        },
        process_orientation: normalize(reverse(survey.get("41")), 1, 5),
    };

    let social = SocialPreference {
        preferred_sociality_type: match survey.get("39") {
            Some(1) => Some(SocialityType::Solo),
            Some(2) => Some(SocialityType::Parallel),
            Some(3) => Some(SocialityType::LowInteractionGroup),
            Some(4) => Some(SocialityType::HighInteractionGroup),
            _ => None,
        },
        preferred_group_size: match survey.get("40") {
            Some(1) => Some(GroupSize::OneOnOne),
            Some(2) => Some(GroupSize::SmallGroup),
            Some(3) => Some(GroupSize::LargeGroup),
            _ => None,
        },
        autonomy_preference: normalize(survey.get("42"), 1, 5),
    };

    NormalizedProfile {
        constraints,
        psych,
        motivation,
        social,
        interests: interest_vector(survey),
    }
}

/// Build the scoring interest vector from the Q6..Q15 Likert block.
pub fn interest_vector(survey: &SurveyResponses) -> InterestVector {
    let q = |key: &str| normalize(survey.get(key), 1, 5);
    InterestVector {
        e_introvert: q("Q6"),
        o_openness: q("Q7"),
        c_conscientiousness: q("Q8"),
        a_autonomy: q("Q9"),
        k_competence: q("Q10"),
        energy_dynamic: q("Q11"),
        extrinsic_drive: q("Q12"),
        online_affinity: q("Q13"),
        breadth_preference: q("Q14"),
        process_focus: q("Q15"),
    }
}
