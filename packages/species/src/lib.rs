#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Species-name reconciliation.
//!
//! The aerial survey and the camera-trap annotations were labeled
//! independently and disagree on naming ("Blue wildebeest" vs
//! "Wildebeest", "Duiker grey" vs "Duiker_common"). This crate maps both
//! vocabularies onto one canonical list via a fixed lookup table, drops
//! non-focal taxa (birds, reptiles, humans, setup/blank triggers), and
//! passes every other label through unchanged so the mapping table can be
//! extended instead of silently losing data.

use hexcensus_models::CanonicalSpecies;

/// Outcome of resolving one raw species label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Label mapped to (or already was) a known canonical name.
    Canonical(CanonicalSpecies),
    /// Non-focal taxon; must never reach an aggregate.
    Excluded,
    /// Unknown label kept under its normalized form. Callers should
    /// record these in the quality report so analysts can extend the
    /// synonym table.
    Passthrough(CanonicalSpecies),
}

impl Resolution {
    /// The canonical species, unless the label was excluded.
    #[must_use]
    pub fn species(self) -> Option<CanonicalSpecies> {
        match self {
            Self::Canonical(s) | Self::Passthrough(s) => Some(s),
            Self::Excluded => None,
        }
    }
}

/// Synonym table: lowercase source label -> canonical name.
///
/// Covers the naming drift observed between the two source datasets.
/// Lookups are case-invariant; canonical names use `Title_case` with
/// underscores.
const SYNONYMS: &[(&str, &str)] = &[
    ("baboon troop", "Baboon"),
    ("chacma baboon", "Baboon"),
    ("blue wildebeest", "Wildebeest"),
    ("buffalo herd", "Buffalo"),
    ("common duiker", "Duiker_common"),
    ("common reedbuck", "Reedbuck"),
    ("duiker grey", "Duiker_common"),
    ("duiker red", "Duiker_red"),
    ("elephant bull", "Elephant"),
    ("elephant breeding herd", "Elephant"),
    ("grey duiker", "Duiker_common"),
    ("hippo", "Hippopotamus"),
    ("lichtenstein's hartebeest", "Hartebeest"),
    ("red duiker", "Duiker_red"),
    ("sable", "Sable_antelope"),
    ("sable antelope", "Sable_antelope"),
    ("vervet", "Vervet_monkey"),
    ("warthog common", "Warthog"),
    ("waterbuck common", "Waterbuck"),
];

/// The known canonical vocabulary for this study.
///
/// Labels resolving to one of these are `Canonical`; anything else that
/// survives exclusion is `Passthrough`.
const CANONICAL: &[&str] = &[
    "Baboon",
    "Buffalo",
    "Bushbuck",
    "Bushpig",
    "Duiker_common",
    "Duiker_red",
    "Eland",
    "Elephant",
    "Hartebeest",
    "Hippopotamus",
    "Impala",
    "Kudu",
    "Nyala",
    "Oribi",
    "Reedbuck",
    "Sable_antelope",
    "Vervet_monkey",
    "Warthog",
    "Waterbuck",
    "Wildebeest",
    "Zebra",
];

/// Keyword-based exclusion list for non-focal taxa and non-detections.
///
/// A label containing any of these (case-invariant) resolves to
/// [`Resolution::Excluded`]. Covers the taxa one side never records
/// (birds, crocodiles on the camera side; carnivore triggers on the
/// aerial side are legitimately absent rather than excluded) plus camera
/// housekeeping frames.
const EXCLUDED_KEYWORDS: &[&str] = &[
    "bird",
    "stork",
    "heron",
    "vulture",
    "guineafowl",
    "ground hornbill",
    "crocodile",
    "insect",
    "reptile",
    "human",
    "people",
    "vehicle",
    "setup",
    "set up",
    "camera check",
    "blank",
    "ghost",
    "unknown",
    "unidentifiable",
    "unidentified",
];

/// Resolves a raw species label from either source dataset.
///
/// Case-invariant. Pure and idempotent: resolving a canonical name
/// yields the same canonical name.
#[must_use]
pub fn resolve(raw: &str) -> Resolution {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Resolution::Excluded;
    }

    let lower = trimmed.to_lowercase();

    if contains_any(&lower, EXCLUDED_KEYWORDS) {
        return Resolution::Excluded;
    }

    if let Some((_, canonical)) = SYNONYMS.iter().find(|(from, _)| *from == lower) {
        return Resolution::Canonical(CanonicalSpecies::new(*canonical));
    }

    let normalized = normalize_label(trimmed);
    if CANONICAL.contains(&normalized.as_str()) {
        return Resolution::Canonical(CanonicalSpecies::new(normalized));
    }

    Resolution::Passthrough(CanonicalSpecies::new(normalized))
}

/// Normalizes a label into canonical casing: first letter upper, rest
/// lower, spaces collapsed to underscores. Keeps joins stable when the
/// same unknown label appears with different capitalization on the two
/// sides.
fn normalize_label(raw: &str) -> String {
    let compact = raw.split_whitespace().collect::<Vec<_>>().join("_");
    let mut chars = compact.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}

/// Checks if `haystack` contains any of the given `needles`.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(raw: &str) -> CanonicalSpecies {
        match resolve(raw) {
            Resolution::Canonical(s) => s,
            other => panic!("expected canonical resolution for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn maps_aerial_labels() {
        assert_eq!(canonical("Baboon troop").as_str(), "Baboon");
        assert_eq!(canonical("Blue wildebeest").as_str(), "Wildebeest");
        assert_eq!(canonical("Common reedbuck").as_str(), "Reedbuck");
        assert_eq!(canonical("Sable").as_str(), "Sable_antelope");
    }

    #[test]
    fn maps_camera_labels() {
        assert_eq!(canonical("Duiker grey").as_str(), "Duiker_common");
        assert_eq!(canonical("Duiker red").as_str(), "Duiker_red");
        assert_eq!(canonical("Hippo").as_str(), "Hippopotamus");
    }

    #[test]
    fn mapping_is_case_invariant() {
        assert_eq!(canonical("BLUE WILDEBEEST").as_str(), "Wildebeest");
        assert_eq!(canonical("blue Wildebeest").as_str(), "Wildebeest");
        assert_eq!(canonical("waterbuck").as_str(), "Waterbuck");
    }

    #[test]
    fn excludes_non_focal_taxa() {
        assert_eq!(resolve("Saddle-billed stork"), Resolution::Excluded);
        assert_eq!(resolve("Crocodile"), Resolution::Excluded);
        assert_eq!(resolve("Human"), Resolution::Excluded);
        assert_eq!(resolve("Camera setup"), Resolution::Excluded);
        assert_eq!(resolve("Blank"), Resolution::Excluded);
        assert_eq!(resolve("Unknown antelope"), Resolution::Excluded);
        assert_eq!(resolve(""), Resolution::Excluded);
    }

    #[test]
    fn unknown_labels_pass_through_normalized() {
        let Resolution::Passthrough(species) = resolve("side-striped jackal") else {
            panic!("expected passthrough");
        };
        assert_eq!(species.as_str(), "Side-striped_jackal");
    }

    #[test]
    fn resolution_is_idempotent() {
        for raw in [
            "Baboon troop",
            "Blue wildebeest",
            "Duiker grey",
            "Sable",
            "Civet",
            "waterbuck",
        ] {
            let Some(once) = resolve(raw).species() else {
                panic!("{raw:?} should not be excluded");
            };
            let twice = resolve(once.as_str()).species().unwrap();
            assert_eq!(once, twice, "resolving {raw:?} twice diverged");
        }
    }

    #[test]
    fn merges_never_split() {
        // Two distinct raw labels may merge onto one canonical name, but
        // one raw label always resolves to exactly one outcome.
        let labels = ["Sable", "Sable antelope", "sable"];
        let resolved: Vec<_> = labels.iter().map(|l| resolve(l)).collect();
        assert!(resolved.windows(2).all(|w| w[0] == w[1]));
    }
}
