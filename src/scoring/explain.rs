//! Human-readable reasons for a recommendation.

use crate::catalog::{CatalogItem, SocialMode};
use crate::profile::InterestVector;

/// A contributor below this `user x alignment` product is not worth naming.
const CONTRIBUTION_FLOOR: f64 = 0.05;

/// Render a short reason line for one scored item: the top contributing
/// features by `user x alignment` product, plus contextual labels whose
/// trigger condition holds. Falls back to a generic line when nothing
/// clears the floor.
pub fn explain(user: &InterestVector, item: &CatalogItem) -> String {
    let mut drivers: Vec<(&str, f64)> = [
        ("growth & mastery", user.k_competence, item.competence_alignment),
        (
            "planning & consistency",
            user.c_conscientiousness,
            item.conscientiousness_alignment,
        ),
        ("new experiences", user.o_openness, item.openness_alignment),
        ("autonomy & creation", user.a_autonomy, item.autonomy_alignment),
        ("active energy", user.energy_dynamic, item.activity_energy),
    ]
    .into_iter()
    .filter_map(|(label, uval, hval)| uval.map(|u| (label, u * hval)))
    .collect();

    drivers.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut parts: Vec<&str> = drivers
        .iter()
        .take(3)
        .filter(|(_, score)| *score > CONTRIBUTION_FLOOR)
        .map(|(label, _)| *label)
        .collect();

    if let Some(intro) = user.e_introvert {
        if intro >= 0.6 && item.social_mode == SocialMode::Solo {
            parts.push("solo focus");
        }
        if intro < 0.4 && matches!(item.social_mode, SocialMode::Parallel | SocialMode::Community)
        {
            parts.push("shared activity");
        }
    }
    if user.extrinsic_drive.is_some_and(|v| v >= 0.6) && item.monetizable {
        parts.push("can monetize");
    }

    if parts.is_empty() {
        return "a balanced overall fit".to_string();
    }
    parts.join(" · ")
}
