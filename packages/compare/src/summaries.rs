//! Join-then-group summaries over the comparison table.
//!
//! Concordance tallies per species, plus the body-mass correlation the
//! study uses to ask whether larger species are relatively over-detected
//! by one method. Undefined ratios are excluded from the correlation
//! rather than treated as zero.

use std::collections::BTreeMap;

use hexcensus_models::{CanonicalSpecies, ComparisonRow, Concordance, SpeciesTraits};

/// Counts concordance labels per species across all rows.
#[must_use]
pub fn concordance_by_species(
    rows: &[ComparisonRow],
) -> BTreeMap<(CanonicalSpecies, Concordance), u64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts
            .entry((row.species.clone(), row.concordance))
            .or_insert(0) += 1;
    }
    counts
}

/// Pearson correlation between log10 body mass and the aerial-to-camera
/// ratio, over rows where both are available.
///
/// Returns `None` when fewer than two usable rows exist or the inputs
/// are degenerate (zero variance).
#[must_use]
pub fn mass_ratio_correlation(
    rows: &[ComparisonRow],
    traits: &BTreeMap<CanonicalSpecies, SpeciesTraits>,
) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let ratio = row.ratio.value()?;
            let mass = traits.get(&row.species)?.body_mass_kg;
            (mass > 0.0).then(|| (mass.log10(), ratio))
        })
        .collect();

    pearson(&pairs)
}

/// Pearson product-moment correlation coefficient.
///
/// `None` for fewer than two pairs or zero variance on either axis.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    Some(cov / (var_x * var_y).sqrt())
}

#[cfg(test)]
mod tests {
    use hexcensus_models::{Rai, Ratio};

    use super::*;

    fn row(species: &str, concordance: Concordance, ratio: Ratio) -> ComparisonRow {
        ComparisonRow {
            site: "A1".to_string(),
            species: CanonicalSpecies::new(species),
            window: "survey".to_string(),
            aerial_individuals: 1,
            aerial_groups: 0,
            detections: 1,
            nights: 14,
            rai: Rai::Defined(0.1),
            ratio,
            concordance,
        }
    }

    #[test]
    fn tallies_concordance_per_species() {
        let rows = vec![
            row("Impala", Concordance::BothDetected, Ratio::Defined(2.0)),
            row("Impala", Concordance::BothDetected, Ratio::Defined(3.0)),
            row("Impala", Concordance::AerialOnly, Ratio::Undefined),
            row("Kudu", Concordance::CameraOnly, Ratio::Undefined),
        ];
        let counts = concordance_by_species(&rows);
        assert_eq!(
            counts[&(CanonicalSpecies::new("Impala"), Concordance::BothDetected)],
            2
        );
        assert_eq!(
            counts[&(CanonicalSpecies::new("Impala"), Concordance::AerialOnly)],
            1
        );
        assert_eq!(
            counts[&(CanonicalSpecies::new("Kudu"), Concordance::CameraOnly)],
            1
        );
    }

    #[test]
    fn pearson_of_perfect_line_is_one() {
        let r = pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_degenerate_inputs_are_none() {
        assert!(pearson(&[]).is_none());
        assert!(pearson(&[(1.0, 1.0)]).is_none());
        assert!(pearson(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }

    #[test]
    fn correlation_skips_undefined_ratios_and_missing_traits() {
        let rows = vec![
            row("Impala", Concordance::BothDetected, Ratio::Defined(2.0)),
            row("Elephant", Concordance::BothDetected, Ratio::Defined(40.0)),
            row("Kudu", Concordance::AerialOnly, Ratio::Undefined),
            row("Civet", Concordance::CameraOnly, Ratio::Defined(1.0)),
        ];
        let mut traits = BTreeMap::new();
        traits.insert(
            CanonicalSpecies::new("Impala"),
            SpeciesTraits { body_mass_kg: 50.0 },
        );
        traits.insert(
            CanonicalSpecies::new("Elephant"),
            SpeciesTraits {
                body_mass_kg: 4000.0,
            },
        );
        traits.insert(
            CanonicalSpecies::new("Kudu"),
            SpeciesTraits {
                body_mass_kg: 200.0,
            },
        );
        // Civet has no trait row; Kudu has no defined ratio. Two usable
        // pairs remain, perfectly monotone.
        let r = mass_ratio_correlation(&rows, &traits).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }
}
