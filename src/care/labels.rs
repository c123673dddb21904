use crate::models::Pet;

/// Human label for the pets an activity mentions. Ids that no longer resolve
/// to a live pet are counted as removed pets.
pub fn pets_label(pet_ids: &[i64], live: &[Pet]) -> String {
    let names: Vec<&str> = pet_ids
        .iter()
        .filter_map(|id| live.iter().find(|pet| pet.id == *id))
        .map(|pet| pet.name.as_str())
        .collect();
    let removed = pet_ids.len() - names.len();

    match (names.is_empty(), removed) {
        (_, 0) => names.join(" & "),
        (true, n) => removed_pets(n),
        (false, n) => format!("{} & {}", names.join(" & "), removed_pets(n)),
    }
}

fn removed_pets(count: usize) -> String {
    if count == 1 {
        "1 removed pet".to_string()
    } else {
        format!("{count} removed pets")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn pet(id: i64, name: &str) -> Pet {
        Pet {
            id,
            household_id: 1,
            name: name.to_string(),
            pet_type: "dog".to_string(),
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn all_pets_present() {
        let live = [pet(1, "Rex"), pet(2, "Bella")];
        assert_eq!(pets_label(&[1, 2], &live), "Rex & Bella");
    }

    #[test]
    fn some_pets_removed() {
        let live = [pet(1, "Rex")];
        assert_eq!(pets_label(&[1, 7], &live), "Rex & 1 removed pet");
        assert_eq!(pets_label(&[1, 7, 8], &live), "Rex & 2 removed pets");
    }

    #[test]
    fn every_pet_removed() {
        assert_eq!(pets_label(&[7], &[]), "1 removed pet");
        assert_eq!(pets_label(&[7, 8, 9], &[]), "3 removed pets");
    }
}
