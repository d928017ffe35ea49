use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DevelopmentOption – one row of the option table
// ---------------------------------------------------------------------------

/// A single development option for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentOption {
    /// Unique key shown in the selector.
    #[serde(rename = "Option_Name")]
    pub name: String,
    /// Biodiversity Net Gain, displayed verbatim (e.g. `"5%"`).
    #[serde(rename = "BNG")]
    pub bng: String,
    #[serde(rename = "Habitat_Units")]
    pub habitat_units: f64,
    /// Cost of the habitat work in pounds.
    #[serde(rename = "Cost_of_Habitats")]
    pub cost_of_habitats: f64,
    /// Share of the total project cost as written in the source, e.g. `"15%"`.
    #[serde(rename = "Cost_Percentage")]
    pub cost_percentage: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("option table is empty")]
    Empty,
    #[error("duplicate option name '{0}'")]
    DuplicateName(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("no development option named '{name}'")]
    NotFound { name: String },
}

// ---------------------------------------------------------------------------
// OptionTable – the complete loaded table
// ---------------------------------------------------------------------------

/// All options in file order, with a name index.
#[derive(Debug, Clone)]
pub struct OptionTable {
    options: Vec<DevelopmentOption>,
    index: BTreeMap<String, usize>,
}

impl OptionTable {
    /// Build the table, rejecting duplicate names and empty input.
    pub fn new(options: Vec<DevelopmentOption>) -> Result<Self, TableError> {
        if options.is_empty() {
            return Err(TableError::Empty);
        }
        let mut index = BTreeMap::new();
        for (i, opt) in options.iter().enumerate() {
            if index.insert(opt.name.clone(), i).is_some() {
                return Err(TableError::DuplicateName(opt.name.clone()));
            }
        }
        Ok(Self { options, index })
    }

    /// Look up the option with exactly this name.
    pub fn select(&self, name: &str) -> Result<&DevelopmentOption, SelectionError> {
        self.index
            .get(name)
            .map(|&i| &self.options[i])
            .ok_or_else(|| SelectionError::NotFound {
                name: name.to_string(),
            })
    }

    /// Option names in file order (what the selector offers).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.name.as_str())
    }

    pub fn options(&self) -> &[DevelopmentOption] {
        &self.options
    }

    /// The first option in file order; a table is never empty.
    pub fn first(&self) -> &DevelopmentOption {
        &self.options[0]
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn option(name: &str, cost: f64, pct: &str) -> DevelopmentOption {
    DevelopmentOption {
        name: name.to_string(),
        bng: "5%".to_string(),
        habitat_units: 12.34,
        cost_of_habitats: cost,
        cost_percentage: pct.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_finds_every_loaded_name() {
        let table = OptionTable::new(vec![
            option("Option A", 50_000.0, "10%"),
            option("Option B", 20_000.0, "4%"),
        ])
        .unwrap();
        let names: Vec<String> = table.names().map(str::to_string).collect();
        for name in names {
            assert_eq!(table.select(&name).unwrap().name, name);
        }
    }

    #[test]
    fn select_unknown_name_is_not_found() {
        let table = OptionTable::new(vec![option("Option A", 1.0, "1%")]).unwrap();
        assert_eq!(
            table.select("Option Z"),
            Err(SelectionError::NotFound {
                name: "Option Z".into()
            })
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = OptionTable::new(vec![
            option("Option A", 1.0, "1%"),
            option("Option A", 2.0, "2%"),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateName("Option A".into()));
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(OptionTable::new(Vec::new()).unwrap_err(), TableError::Empty);
    }
}
