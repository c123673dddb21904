use serde::Serialize;

use super::period::CarePeriod;
use super::status::PetStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub complete: bool,
    pub message: String,
}

/// Status banner text, or `None` when there is nothing to show (no pets, or
/// quiet hours).
pub fn banner(period: &CarePeriod, statuses: &[PetStatus]) -> Option<Banner> {
    if statuses.is_empty() || period.is_quiet_hours() {
        return None;
    }

    let phase = period.phase.as_str();
    let incomplete: Vec<&PetStatus> = statuses.iter().filter(|s| !s.is_complete()).collect();

    if incomplete.is_empty() {
        let subject = if statuses.len() == 1 {
            "Your pet has"
        } else {
            "All pets have"
        };
        return Some(Banner {
            complete: true,
            message: format!(
                "{subject} had their essential {phase} care. You're doing great!"
            ),
        });
    }

    // Group pets that need the same things, keeping first-seen order.
    let mut groups: Vec<((bool, bool), Vec<&str>)> = Vec::new();
    for status in incomplete {
        let key = (status.needs_feed, status.needs_bathroom);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, names)) => names.push(status.name.as_str()),
            None => groups.push((key, vec![status.name.as_str()])),
        }
    }

    let clauses: Vec<String> = groups
        .iter()
        .map(|((feed, bathroom), names)| {
            let verb = if names.len() == 1 { "needs" } else { "need" };
            format!(
                "{} still {verb} {phase} {}",
                join_names(names),
                needs_phrase(*feed, *bathroom)
            )
        })
        .collect();

    Some(Banner {
        complete: false,
        message: format!("{}.", clauses.join("; ")),
    })
}

fn needs_phrase(feed: bool, bathroom: bool) -> &'static str {
    match (feed, bathroom) {
        (true, true) => "feeding and bathroom break",
        (false, true) => "bathroom break",
        _ => "feeding",
    }
}

/// "A", "A and B", "A, B and C".
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}
