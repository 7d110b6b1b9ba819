//! Conditional assumptions attached to facts.
//!
//! Throughout the crate a caveat is carried as `Option<Caveat>`, where `None`
//! means "holds unconditionally". Two combinators cover every use:
//!
//! - [`conjoin`]: a single derivation chain needs *every* assumption of the
//!   facts it uses.
//! - [`disjoin`]: independent derivations of the same conclusion; *either*
//!   assumption alone suffices, and one unconditional derivation makes the
//!   conclusion unconditional.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Caveat {
    /// A named hypothesis, e.g. `"P != NP"` or `"the polynomial hierarchy does not collapse"`.
    Assumption(String),
    All { all: Vec<Caveat> },
    Any { any: Vec<Caveat> },
}

impl Caveat {
    pub fn assumption(name: impl Into<String>) -> Self {
        Caveat::Assumption(name.into())
    }

    /// Every named assumption mentioned anywhere in this caveat.
    pub fn assumptions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_assumptions(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_assumptions<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Caveat::Assumption(name) => out.push(name),
            Caveat::All { all: parts } | Caveat::Any { any: parts } => {
                for part in parts {
                    part.collect_assumptions(out);
                }
            }
        }
    }
}

/// Logical AND of two optional caveats.
pub fn conjoin(a: Option<Caveat>, b: Option<Caveat>) -> Option<Caveat> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => {
            let mut parts = Vec::new();
            flatten_into(a, &mut parts, true);
            flatten_into(b, &mut parts, true);
            Some(build(parts, true))
        }
    }
}

/// Logical OR of two optional caveats.
pub fn disjoin(a: Option<Caveat>, b: Option<Caveat>) -> Option<Caveat> {
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(a), Some(b)) => {
            let mut parts = Vec::new();
            flatten_into(a, &mut parts, false);
            flatten_into(b, &mut parts, false);
            Some(build(parts, false))
        }
    }
}

/// AND over a sequence; the empty sequence is unconditional.
pub fn conjoin_all<I>(caveats: I) -> Option<Caveat>
where
    I: IntoIterator<Item = Option<Caveat>>,
{
    caveats.into_iter().fold(None, conjoin)
}

/// OR over a non-empty sequence of derivations.
///
/// The empty sequence yields `None` as well; callers only disjoin the
/// caveats of derivations that actually exist.
pub fn disjoin_all<I>(caveats: I) -> Option<Caveat>
where
    I: IntoIterator<Item = Option<Caveat>>,
{
    let mut iter = caveats.into_iter();
    let first = iter.next()?;
    iter.fold(first, disjoin)
}

fn flatten_into(caveat: Caveat, parts: &mut Vec<Caveat>, conjunctive: bool) {
    match (caveat, conjunctive) {
        (Caveat::All { all }, true) => parts.extend(all),
        (Caveat::Any { any }, false) => parts.extend(any),
        (other, _) => parts.push(other),
    }
}

fn build(mut parts: Vec<Caveat>, conjunctive: bool) -> Caveat {
    parts.sort();
    parts.dedup();
    if parts.len() == 1 {
        return parts.remove(0);
    }
    if conjunctive {
        Caveat::All { all: parts }
    } else {
        Caveat::Any { any: parts }
    }
}

impl fmt::Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caveat::Assumption(name) => f.write_str(name),
            Caveat::All { all } => write_joined(f, all, " and "),
            Caveat::Any { any } => write_joined(f, any, " or "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Caveat], sep: &str) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match part {
            Caveat::Assumption(_) => write!(f, "{part}")?,
            _ => write!(f, "({part})")?,
        }
    }
    Ok(())
}
