//! Random heroku-style basenames for resource prefixes.

use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "autumn", "billowing", "bitter", "bold", "broken", "calm", "cold", "crimson", "damp",
    "delicate", "divine", "dry", "empty", "falling", "floral", "fragrant", "frosty", "green",
    "hidden", "holy", "icy", "late", "lingering", "little", "lively", "misty", "morning", "muddy",
    "nameless", "patient", "polished", "proud", "purple", "quiet", "rapid", "restless", "rough",
    "shy", "silent", "small", "snowy", "solitary", "sparkling", "spring", "still", "summer",
    "twilight", "wandering", "weathered", "white", "wild", "winter", "wispy", "withered", "young",
];

const NOUNS: &[&str] = &[
    "band", "bar", "base", "bird", "breeze", "brook", "bush", "butterfly", "cell", "cherry",
    "cloud", "darkness", "dawn", "dew", "disk", "dream", "dust", "feather", "field", "fire",
    "firefly", "flower", "fog", "forest", "frog", "frost", "glade", "glitter", "grass", "haze",
    "heart", "hill", "lake", "leaf", "meadow", "moon", "mountain", "night", "paper", "pine",
    "pond", "rain", "river", "sea", "shadow", "shape", "silence", "sky", "smoke", "snow", "sound",
    "star", "stream", "sun", "sunset", "surf", "thunder", "tree", "violet", "voice", "water",
    "waterfall", "wave", "wildflower", "wind", "wood",
];

/// Produces names like `frostybrook` for runs where the caller did not
/// pass an explicit prefix.
pub fn random_basename() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("river");
    format!("{adjective}{noun}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_is_a_known_adjective_noun_pair() {
        for _ in 0..32 {
            let name = random_basename();
            assert!(
                ADJECTIVES
                    .iter()
                    .any(|adjective| name.starts_with(adjective)),
                "unexpected basename: {name}"
            );
            assert!(NOUNS.iter().any(|noun| name.ends_with(noun)));
        }
    }

    #[test]
    fn basename_is_a_valid_resource_name_fragment() {
        let name = random_basename();
        assert!(name.chars().all(|c| c.is_ascii_lowercase()));
    }
}
