use std::collections::BTreeSet;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Filter selection: which facet values are allowed
// ---------------------------------------------------------------------------

/// The two facet dimensions the dashboard filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    City,
    Gender,
}

impl Facet {
    pub const ALL: [Facet; 2] = [Facet::City, Facet::Gender];

    pub fn label(self) -> &'static str {
        match self {
            Facet::City => "City",
            Facet::Gender => "Gender",
        }
    }

    /// Every value of this facet observed in the dataset.
    pub fn observed(self, dataset: &Dataset) -> &BTreeSet<String> {
        match self {
            Facet::City => &dataset.cities,
            Facet::Gender => &dataset.genders,
        }
    }

    fn value_of(self, record: &Record) -> &str {
        match self {
            Facet::City => &record.city,
            Facet::Gender => &record.gender,
        }
    }
}

/// Allowed values per facet. An empty set allows nothing; it never means
/// "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub cities: BTreeSet<String>,
    pub genders: BTreeSet<String>,
}

impl FilterSelection {
    /// Every observed value selected (the dashboard default).
    pub fn all(dataset: &Dataset) -> Self {
        FilterSelection {
            cities: dataset.cities.clone(),
            genders: dataset.genders.clone(),
        }
    }

    pub fn values(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::City => &self.cities,
            Facet::Gender => &self.genders,
        }
    }

    pub fn values_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::City => &mut self.cities,
            Facet::Gender => &mut self.genders,
        }
    }

    /// Whether a record passes both facet constraints.
    pub fn matches(&self, record: &Record) -> bool {
        Facet::ALL
            .iter()
            .all(|&facet| self.values(facet).contains(facet.value_of(record)))
    }

    /// Flip a single value in one facet.
    pub fn toggle(&mut self, facet: Facet, value: &str) {
        let selected = self.values_mut(facet);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }

    pub fn select_all(&mut self, facet: Facet, dataset: &Dataset) {
        *self.values_mut(facet) = facet.observed(dataset).clone();
    }

    pub fn select_none(&mut self, facet: Facet) {
        self.values_mut(facet).clear();
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Return indices of records that pass the selection, in dataset order.
pub fn filtered_indices(dataset: &Dataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Borrowed subset of a [`Dataset`] selected by index.
#[derive(Debug, Clone, Copy)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: &'a [usize],
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a Dataset, indices: &'a [usize]) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + 'a {
        let Self { dataset, indices } = *self;
        indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::three_rows;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn city_and_gender_both_constrain() {
        let ds = three_rows();
        let sel = FilterSelection {
            cities: set(&["Delhi"]),
            genders: set(&["M", "F"]),
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);

        let sel = FilterSelection {
            cities: set(&["Delhi"]),
            genders: set(&["F"]),
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![2]);
    }

    #[test]
    fn full_selection_keeps_everything() {
        let ds = three_rows();
        let sel = FilterSelection::all(&ds);
        assert_eq!(filtered_indices(&ds, &sel).len(), ds.len());
    }

    #[test]
    fn empty_sets_select_nothing() {
        let ds = three_rows();
        assert!(filtered_indices(&ds, &FilterSelection::default()).is_empty());

        let mut sel = FilterSelection::all(&ds);
        sel.select_none(Facet::Gender);
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn unknown_values_are_harmless() {
        let ds = three_rows();
        let sel = FilterSelection {
            cities: set(&["Chennai"]),
            genders: set(&["M", "F"]),
        };
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn every_subset_is_bounded_by_dataset() {
        let ds = three_rows();
        let cities: Vec<&String> = ds.cities.iter().collect();
        let genders: Vec<&String> = ds.genders.iter().collect();
        for cmask in 0..(1 << cities.len()) {
            for gmask in 0..(1 << genders.len()) {
                let sel = FilterSelection {
                    cities: (0..cities.len())
                        .filter(|i| cmask & (1 << i) != 0)
                        .map(|i| cities[i].clone())
                        .collect(),
                    genders: (0..genders.len())
                        .filter(|i| gmask & (1 << i) != 0)
                        .map(|i| genders[i].clone())
                        .collect(),
                };
                let idx = filtered_indices(&ds, &sel);
                assert!(idx.len() <= ds.len());
                for &i in &idx {
                    assert!(sel.matches(&ds.records[i]));
                }
            }
        }
    }

    #[test]
    fn toggle_and_select_helpers() {
        let ds = three_rows();
        let mut sel = FilterSelection::all(&ds);

        sel.toggle(Facet::City, "Mumbai");
        assert_eq!(sel.cities, set(&["Delhi"]));
        sel.toggle(Facet::City, "Mumbai");
        assert_eq!(sel.cities, set(&["Delhi", "Mumbai"]));

        sel.select_none(Facet::City);
        assert!(sel.cities.is_empty());
        sel.select_all(Facet::City, &ds);
        assert_eq!(sel, FilterSelection::all(&ds));
    }

    #[test]
    fn view_iterates_selected_records() {
        let ds = three_rows();
        let idx = vec![0, 2];
        let view = FilteredView::new(&ds, &idx);
        assert_eq!(view.len(), 2);
        let prices: Vec<f64> = view.records().map(|r| r.price).collect();
        assert_eq!(prices, vec![100.0, 50.0]);
    }
}
