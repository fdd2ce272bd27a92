// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The scheduler's baseline selection filter. This is deliberately a
//! separate, coarser concept from [`crate::strategy::BaselineSelection`]:
//! the strategy's `baselines` field tunes the detector's own behaviour,
//! while this filter decides which baselines the scheduler dispatches to
//! the detector at all.

use std::collections::HashSet;

use crate::structures::BaselineMetadata;

/// Which baselines, by antenna-pairing, are in scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaselineClass {
    All,
    CrossOnly,
    AutoOnly,
    /// Auto-correlations of only the antennas named in
    /// [`Selection::include_antennas`] (empty means "no antennas", not
    /// "all antennas" — this variant is meaningless without an explicit
    /// include set).
    AutoOfCurrentAntennaeOnly,
}

impl Default for BaselineClass {
    fn default() -> Self {
        BaselineClass::All
    }
}

/// A candidate baseline, as seen by the selection filter. Only the fields
/// the filter inspects are carried; a real [`BaselineMetadata`] has more.
/// `field` is `BaselineMetadata::sequence`: the scan/field-table index the
/// base format records per baseline, distinct from `band` (spectral
/// window).
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub antenna1: usize,
    pub antenna2: usize,
    pub band: usize,
    pub field: usize,
}

impl From<&BaselineMetadata> for Candidate {
    fn from(metadata: &BaselineMetadata) -> Self {
        Self {
            antenna1: metadata.antenna1,
            antenna2: metadata.antenna2,
            band: metadata.band,
            field: metadata.sequence,
        }
    }
}

/// Accept/reject filter applied to every candidate baseline before it is
/// queued for detection.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    pub class: BaselineClass,
    pub include_antennas: Option<HashSet<usize>>,
    pub exclude_antennas: HashSet<usize>,
    pub include_bands: Option<HashSet<usize>>,
    pub include_fields: Option<HashSet<usize>>,
}

impl Selection {
    pub fn accepts(&self, candidate: Candidate) -> bool {
        let is_auto = candidate.antenna1 == candidate.antenna2;
        let class_ok = match self.class {
            BaselineClass::All => true,
            BaselineClass::CrossOnly => !is_auto,
            BaselineClass::AutoOnly => is_auto,
            BaselineClass::AutoOfCurrentAntennaeOnly => {
                is_auto
                    && self
                        .include_antennas
                        .as_ref()
                        .map_or(false, |set| set.contains(&candidate.antenna1))
            }
        };
        if !class_ok {
            return false;
        }

        if self.exclude_antennas.contains(&candidate.antenna1)
            || self.exclude_antennas.contains(&candidate.antenna2)
        {
            return false;
        }

        if let Some(include) = &self.include_antennas {
            if self.class != BaselineClass::AutoOfCurrentAntennaeOnly
                && !(include.contains(&candidate.antenna1) && include.contains(&candidate.antenna2))
            {
                return false;
            }
        }

        if let Some(bands) = &self.include_bands {
            if !bands.contains(&candidate.band) {
                return false;
            }
        }

        if let Some(fields) = &self.include_fields {
            if !fields.contains(&candidate.field) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(antenna1: usize, antenna2: usize) -> Candidate {
        Candidate {
            antenna1,
            antenna2,
            band: 0,
            field: 0,
        }
    }

    #[test]
    fn all_accepts_everything() {
        let selection = Selection::default();
        assert!(selection.accepts(candidate(1, 2)));
        assert!(selection.accepts(candidate(1, 1)));
    }

    #[test]
    fn cross_only_rejects_auto_correlations() {
        let selection = Selection {
            class: BaselineClass::CrossOnly,
            ..Default::default()
        };
        assert!(selection.accepts(candidate(1, 2)));
        assert!(!selection.accepts(candidate(1, 1)));
    }

    #[test]
    fn auto_only_rejects_cross_correlations() {
        let selection = Selection {
            class: BaselineClass::AutoOnly,
            ..Default::default()
        };
        assert!(!selection.accepts(candidate(1, 2)));
        assert!(selection.accepts(candidate(3, 3)));
    }

    #[test]
    fn auto_of_current_antennae_only_requires_membership() {
        let mut include = HashSet::new();
        include.insert(5);
        let selection = Selection {
            class: BaselineClass::AutoOfCurrentAntennaeOnly,
            include_antennas: Some(include),
            ..Default::default()
        };
        assert!(selection.accepts(candidate(5, 5)));
        assert!(!selection.accepts(candidate(6, 6)));
        assert!(!selection.accepts(candidate(5, 6)));
    }

    #[test]
    fn exclude_antennas_wins_over_include() {
        let mut include = HashSet::new();
        include.insert(1);
        include.insert(2);
        let mut exclude = HashSet::new();
        exclude.insert(2);
        let selection = Selection {
            class: BaselineClass::All,
            include_antennas: Some(include),
            exclude_antennas: exclude,
            include_bands: None,
            include_fields: None,
        };
        assert!(!selection.accepts(candidate(1, 2)));
    }

    #[test]
    fn band_filter_rejects_other_bands() {
        let mut bands = HashSet::new();
        bands.insert(1);
        let selection = Selection {
            include_bands: Some(bands),
            ..Default::default()
        };
        assert!(!selection.accepts(candidate(1, 2)));
        assert!(selection.accepts(Candidate {
            antenna1: 1,
            antenna2: 2,
            band: 1,
            field: 0,
        }));
    }

    #[test]
    fn field_filter_rejects_other_fields() {
        let mut fields = HashSet::new();
        fields.insert(2);
        let selection = Selection {
            include_fields: Some(fields),
            ..Default::default()
        };
        assert!(!selection.accepts(candidate(1, 2)));
        assert!(selection.accepts(Candidate {
            antenna1: 1,
            antenna2: 2,
            band: 0,
            field: 2,
        }));
    }
}
