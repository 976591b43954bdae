//! Attributes in effect while walking a document.

use std::collections::{BTreeMap, BTreeSet};

use adoc_model::{Attribute, AttributeLookup, Header};

/// Header attributes overlaid with configuration attributes.
///
/// Configuration attributes are locked: body entries `:name: value` and
/// `:name!:` change every other attribute for the nodes that follow.
#[derive(Clone, Debug)]
pub(crate) struct RunningAttributes {
    values: BTreeMap<String, String>,
    locked: BTreeSet<String>,
}

impl RunningAttributes {
    pub fn new(header: &Header, overrides: &BTreeMap<String, String>) -> Self {
        let mut values = header.attributes.clone();
        values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            values,
            locked: overrides.keys().cloned().collect(),
        }
    }

    pub fn apply(&mut self, attribute: &Attribute) {
        match attribute {
            Attribute::Set { name, value } if !self.locked.contains(name) => {
                self.values.insert(name.clone(), value.clone());
            }
            Attribute::Unset { name } if !self.locked.contains(name) => {
                self.values.remove(name);
            }
            _ => {}
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl AttributeLookup for RunningAttributes {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}
