//! Only/exclude selection of pipeline jobs.

use std::collections::BTreeSet;

/// Decide whether `name` runs. Exclusion is checked first and always wins,
/// even over an explicit inclusion of the same name.
pub fn allowed(name: &str, only: &BTreeSet<String>, exclude: &BTreeSet<String>) -> bool {
    if exclude.contains(name) {
        return false;
    }
    if !only.is_empty() {
        return only.contains(name);
    }
    true
}

/// Owned pair of name sets from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    only: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl JobFilter {
    pub fn new<I, J, S, T>(only: I, exclude: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            only: only.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        allowed(name, &self.only, &self.exclude)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.only.is_empty() && self.exclude.is_empty()
    }
}
