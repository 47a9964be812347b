//! The weighted-similarity scoring engine.

use serde::Serialize;

use crate::catalog::{CatalogItem, LocationType, SocialMode};
use crate::profile::InterestVector;
use crate::scoring::explain;

// Fixed per-feature weight table for the cosine base score.
const W_OPENNESS: f64 = 1.0;
const W_CONSCIENTIOUSNESS: f64 = 1.2;
const W_AUTONOMY: f64 = 1.0;
const W_COMPETENCE: f64 = 1.4;
const W_ENERGY: f64 = 1.1;
const W_BREADTH: f64 = 0.8;

// Additive bonus constants.
const BONUS_INTROVERT_SOLO: f64 = 0.08;
const BONUS_EXTROVERT_GROUP: f64 = 0.06;
const BONUS_MONETIZABLE: f64 = 0.07;
const BONUS_ONLINE: f64 = 0.05;
const BONUS_ENERGY_SYNERGY: f64 = 0.05;

/// Contextual constraints for one scoring request.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub monthly_budget: Option<f64>,
    pub session_time_limit_hours: Option<f64>,
    pub offline_ok: Option<bool>,
}

impl ScoringContext {
    /// Build from a `user_context` JSON object. Absent keys leave the
    /// corresponding filter disabled.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            monthly_budget: value.get("monthly_budget").and_then(|v| v.as_f64()),
            session_time_limit_hours: value
                .get("session_time_limit_hours")
                .and_then(|v| v.as_f64()),
            offline_ok: value.get("offline_ok").and_then(|v| v.as_bool()),
        }
    }
}

/// One ranked recommendation with its score breakdown and reason.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub rank: usize,
    pub hobby_id: String,
    pub name: String,
    pub short_desc: String,
    pub avg_cost_month: Option<f64>,
    pub avg_session_time_hours: Option<f64>,
    pub tags: Vec<String>,
    pub score_base: f64,
    pub score_total: f64,
    /// Present when rescaling is enabled: 0-100 relative to the top score of
    /// the returned set. Not comparable across requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_scaled: Option<f64>,
    pub reason: String,
}

/// Deterministic weighted-feature scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank the catalog against a user vector and context.
    ///
    /// An empty filtered set yields an empty result, not an error.
    pub fn recommend(
        &self,
        user: &InterestVector,
        catalog: &[CatalogItem],
        ctx: &ScoringContext,
        top_k: usize,
        rescale: bool,
    ) -> Vec<Recommendation> {
        let mut scored: Vec<(f64, f64, &CatalogItem)> = catalog
            .iter()
            .filter(|item| Self::passes_filters(ctx, item))
            .map(|item| {
                let base = Self::weighted_cosine(user, item);
                let total = base + Self::bonuses(user, item);
                (base, total, item)
            })
            .collect();

        // Stable sort keeps catalog order for equal totals.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        let max_total = scored
            .iter()
            .map(|(_, total, _)| *total)
            .fold(0.0f64, f64::max);

        scored
            .into_iter()
            .enumerate()
            .map(|(rank, (base, total, item))| Recommendation {
                rank,
                hobby_id: item.hobby_id.clone(),
                name: item.name.clone(),
                short_desc: item.short_desc.clone(),
                avg_cost_month: item.avg_cost_month,
                avg_session_time_hours: item.avg_session_time_hours,
                tags: item.tags.clone(),
                score_base: base,
                score_total: total,
                score_scaled: if rescale && max_total > 0.0 {
                    Some(total / max_total * 100.0)
                } else {
                    None
                },
                reason: explain::explain(user, item),
            })
            .collect()
    }

    /// Hard filter predicate. Unknown/missing item fields pass the filter.
    fn passes_filters(ctx: &ScoringContext, item: &CatalogItem) -> bool {
        if let (Some(budget), Some(cost)) = (ctx.monthly_budget, item.avg_cost_month) {
            if cost > budget {
                return false;
            }
        }
        if let (Some(limit), Some(hours)) =
            (ctx.session_time_limit_hours, item.avg_session_time_hours)
        {
            if hours > limit {
                return false;
            }
        }
        if item.needs_offline && ctx.offline_ok == Some(false) {
            return false;
        }
        true
    }

    /// Weighted cosine similarity between the user vector and the item's
    /// alignment vector. Breadth preference is compared against the inverted
    /// commitment depth (`1 - depth`): preferring breadth and demanding deep
    /// commitment are semantically opposed.
    ///
    /// Unknown user features are excluded from both norms. A zero weighted
    /// norm on either side yields 0, never NaN.
    fn weighted_cosine(user: &InterestVector, item: &CatalogItem) -> f64 {
        let pairs: [(Option<f64>, f64, f64); 6] = [
            (user.o_openness, item.openness_alignment, W_OPENNESS),
            (
                user.c_conscientiousness,
                item.conscientiousness_alignment,
                W_CONSCIENTIOUSNESS,
            ),
            (user.a_autonomy, item.autonomy_alignment, W_AUTONOMY),
            (user.k_competence, item.competence_alignment, W_COMPETENCE),
            (user.energy_dynamic, item.activity_energy, W_ENERGY),
            (
                user.breadth_preference,
                1.0 - item.commitment_depth,
                W_BREADTH,
            ),
        ];

        let mut num = 0.0;
        let mut du = 0.0;
        let mut dh = 0.0;
        for (uval, hval, w) in pairs {
            let Some(uval) = uval else { continue };
            num += w * uval * hval;
            du += w * uval * uval;
            dh += w * hval * hval;
        }

        if du <= 0.0 || dh <= 0.0 {
            return 0.0;
        }
        num / (du.sqrt() * dh.sqrt() + 1e-8)
    }

    /// Additive bonus terms outside the cosine model. Each is independent;
    /// unknown user features never trigger a bonus.
    fn bonuses(user: &InterestVector, item: &CatalogItem) -> f64 {
        let mut b = 0.0;

        if let Some(intro) = user.e_introvert {
            if intro >= 0.6 && item.social_mode == SocialMode::Solo {
                b += BONUS_INTROVERT_SOLO;
            }
            if intro < 0.4
                && matches!(item.social_mode, SocialMode::Parallel | SocialMode::Community)
            {
                b += BONUS_EXTROVERT_GROUP;
            }
        }

        if user.extrinsic_drive.is_some_and(|v| v >= 0.6) && item.monetizable {
            b += BONUS_MONETIZABLE;
        }

        let online_friendly = matches!(item.location_type, LocationType::Online | LocationType::Any)
            || item.online_available;
        if user.online_affinity.is_some_and(|v| v >= 0.6) && online_friendly {
            b += BONUS_ONLINE;
        }

        let steady = user.k_competence.is_some_and(|v| v >= 0.6)
            || user.c_conscientiousness.is_some_and(|v| v >= 0.6);
        if steady && item.activity_energy >= 0.6 {
            b += BONUS_ENERGY_SYNERGY;
        }

        b
    }
}
