use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::banner::{Banner, banner};
use super::period::{CarePeriod, CarePhase};
use crate::models::{Action, Activity, Pet};

/// What a pet type needs each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareRequirements {
    pub feedings_per_day: u8,
    pub tracks_bathroom: bool,
}

impl CareRequirements {
    /// Dogs are fed twice and let out; cats are fed twice and use a litter
    /// box, which is not tracked as a bathroom break; anything else is fed
    /// once.
    pub fn for_pet_type(pet_type: &str) -> Self {
        match pet_type.trim().to_lowercase().as_str() {
            "dog" => CareRequirements {
                feedings_per_day: 2,
                tracks_bathroom: true,
            },
            "cat" => CareRequirements {
                feedings_per_day: 2,
                tracks_bathroom: false,
            },
            _ => CareRequirements {
                feedings_per_day: 1,
                tracks_bathroom: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetStatus {
    pub pet_id: i64,
    pub name: String,
    pub requirements: CareRequirements,
    pub fed: bool,
    pub let_out: bool,
    pub needs_feed: bool,
    pub needs_bathroom: bool,
}

impl PetStatus {
    pub fn is_complete(&self) -> bool {
        !self.needs_feed && !self.needs_bathroom
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareReport {
    pub phase: CarePhase,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub pets: Vec<PetStatus>,
    pub all_fed: bool,
    /// Only pets whose type tracks bathroom breaks are considered.
    pub all_let_out: bool,
    pub all_complete: bool,
    pub banner: Option<Banner>,
}

/// Per-pet status for `period`. Activities outside the period window are
/// ignored, as are ids that no longer match a pet.
pub fn pet_statuses<'a>(
    period: &CarePeriod,
    pets: &[Pet],
    activities: impl IntoIterator<Item = &'a Activity>,
) -> Vec<PetStatus> {
    let in_window: Vec<&Activity> = activities
        .into_iter()
        .filter(|activity| period.window.contains(activity.occurred_at))
        .collect();

    let logged = |pet_id: i64, action: Action| {
        in_window
            .iter()
            .any(|activity| activity.action == action && activity.involves(pet_id))
    };

    pets.iter()
        .map(|pet| {
            let requirements = CareRequirements::for_pet_type(&pet.pet_type);
            let fed = logged(pet.id, Action::Fed);
            let let_out = logged(pet.id, Action::Bathroom);
            PetStatus {
                pet_id: pet.id,
                name: pet.name.clone(),
                requirements,
                fed,
                let_out,
                needs_feed: !fed,
                needs_bathroom: requirements.tracks_bathroom && !let_out,
            }
        })
        .collect()
}

/// Full care report for the household at `now` in `tz`.
pub fn assess<'a>(
    now: DateTime<Utc>,
    tz: Tz,
    pets: &[Pet],
    activities: impl IntoIterator<Item = &'a Activity>,
) -> CareReport {
    let period = CarePeriod::at(now, tz);
    let statuses = pet_statuses(&period, pets, activities);

    CareReport {
        phase: period.phase,
        window_start: period.window.start,
        window_end: period.window.end,
        all_fed: statuses.iter().all(|s| s.fed),
        all_let_out: statuses
            .iter()
            .filter(|s| s.requirements.tracks_bathroom)
            .all(|s| s.let_out),
        all_complete: statuses.iter().all(PetStatus::is_complete),
        banner: banner(&period, &statuses),
        pets: statuses,
    }
}
