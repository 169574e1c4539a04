use rand::Rng;
use std::collections::HashSet;

const DIGITS: &[u8] = b"0123456789";
const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Three digits followed by three uppercase letters, e.g. `897TKO`.
pub fn generate_id(existing_ids: &HashSet<String>) -> String {
    generate_id_with(&mut rand::rng(), existing_ids)
}

pub fn generate_id_with<R: Rng + ?Sized>(rng: &mut R, existing_ids: &HashSet<String>) -> String {
    loop {
        let mut candidate = String::with_capacity(6);
        for _ in 0..3 {
            candidate.push(DIGITS[rng.random_range(0..DIGITS.len())] as char);
        }
        for _ in 0..3 {
            candidate.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
        }
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
        tracing::debug!(candidate = %candidate, "generated id already taken; retrying");
    }
}

pub fn is_well_formed(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 6
        && bytes[..3].iter().all(u8::is_ascii_digit)
        && bytes[3..].iter().all(u8::is_ascii_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_ids_match_shape_and_avoid_existing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut existing: HashSet<String> = ["000AAA", "123ABC", "999ZZZ"]
            .into_iter()
            .map(String::from)
            .collect();

        for _ in 0..500 {
            let id = generate_id_with(&mut rng, &existing);
            assert!(is_well_formed(&id), "bad id shape: {id}");
            assert!(!existing.contains(&id));
            existing.insert(id);
        }
    }

    #[test]
    fn retries_past_a_colliding_candidate() {
        let first = generate_id_with(&mut StdRng::seed_from_u64(42), &HashSet::new());
        let existing: HashSet<String> = [first.clone()].into_iter().collect();
        let second = generate_id_with(&mut StdRng::seed_from_u64(42), &existing);
        assert_ne!(first, second);
        assert!(is_well_formed(&second));
    }

    #[test]
    fn well_formed_rejects_other_shapes() {
        assert!(is_well_formed("897TKO"));
        assert!(!is_well_formed("TKO897"));
        assert!(!is_well_formed("897tko"));
        assert!(!is_well_formed("897TK"));
    }
}
