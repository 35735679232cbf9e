const SEED_MODULUS: u64 = 2_147_483_647;

/// Polynomial string hash (`acc * 31 + c`) folded into the Park-Miller range.
/// Stable across runs and platforms, unlike `DefaultHasher`.
pub fn hash_seed(text: &str) -> u64 {
    text.chars()
        .fold(17u64, |acc, ch| (acc * 31 + ch as u64) % SEED_MODULUS)
}

/// Park-Miller minimal standard generator.
pub struct SeededRandom {
    value: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        let mut value = seed % SEED_MODULUS;
        if value == 0 {
            value = SEED_MODULUS - 1;
        }
        Self { value }
    }

    pub fn next_unit(&mut self) -> f32 {
        self.value = (self.value * 16_807) % SEED_MODULUS;
        ((self.value - 1) as f64 / (SEED_MODULUS - 2) as f64) as f32
    }
}

/// Two deterministic values in `[-1, 1]` derived from an id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut random = SeededRandom::new(hash_seed(id));
    let x = random.next_unit();
    let y = random.next_unit();
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut short = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_seed_is_stable() {
        assert_eq!(hash_seed(""), 17);
        assert_eq!(hash_seed("a"), 17 * 31 + 97);
        assert_eq!(hash_seed("eau-flux"), hash_seed("eau-flux"));
        assert_ne!(hash_seed("eau-flux"), hash_seed("flux-eau"));
    }

    #[test]
    fn seeded_random_stays_in_unit_range() {
        let mut random = SeededRandom::new(0);
        for _ in 0..256 {
            let value = random.next_unit();
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn stable_pair_is_deterministic() {
        let (ax, ay) = stable_pair("node-a");
        let (bx, by) = stable_pair("node-a");
        assert_eq!((ax, ay), (bx, by));
        assert!((-1.0..=1.0).contains(&ax) && (-1.0..=1.0).contains(&ay));
    }

    #[test]
    fn truncate_label_adds_ellipsis() {
        assert_eq!(truncate_label("marée", 10), "marée");
        assert_eq!(truncate_label("dissolution", 5), "diss…");
    }
}
