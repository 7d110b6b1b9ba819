//! The six-valued guarantee lattice for transformations and operations.
//!
//! A status packs two three-valued facts:
//!
//! ```text
//!                         poly     quasi
//! poly                    yes      yes
//! unknown-poly-quasi      ?        yes
//! no-poly-quasi           no       yes
//! unknown-both            ?        ?
//! no-poly-unknown-quasi   no       ?
//! no-quasi                no       no
//! ```
//!
//! `poly ⇒ quasi` holds on every axis combination that has a code, so
//! "poly yes, quasi unknown" and "quasi no, poly unknown" are not
//! representable: they collapse to `poly` and `no-quasi` respectively.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A guarantee code on a directed pair of languages (or on one operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Poly,
    UnknownPolyQuasi,
    NoPolyQuasi,
    UnknownBoth,
    NoPolyUnknownQuasi,
    NoQuasi,
}

/// One of the two tracked complexity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Poly,
    Quasi,
}

impl Tier {
    /// Tier of a composition of two bounded steps: polynomial only when
    /// both steps are polynomial.
    pub fn compose(self, other: Tier) -> Tier {
        match (self, other) {
            (Tier::Poly, Tier::Poly) => Tier::Poly,
            _ => Tier::Quasi,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Poly => f.write_str("polynomial"),
            Tier::Quasi => f.write_str("quasi-polynomial"),
        }
    }
}

/// A piece of knowledge about the two axes (`None` = nothing said).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Knowledge {
    pub poly: Option<bool>,
    pub quasi: Option<bool>,
}

impl Knowledge {
    /// "Holds at tier `t`."
    pub fn holds(tier: Tier) -> Self {
        match tier {
            Tier::Poly => Self {
                poly: Some(true),
                quasi: Some(true),
            },
            Tier::Quasi => Self {
                poly: None,
                quasi: Some(true),
            },
        }
    }

    /// "Does not hold at tier `t`."
    pub fn fails(tier: Tier) -> Self {
        match tier {
            Tier::Poly => Self {
                poly: Some(false),
                quasi: None,
            },
            Tier::Quasi => Self {
                poly: Some(false),
                quasi: Some(false),
            },
        }
    }
}

/// Raised by [`Status::refine`] when the new knowledge contradicts the old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub current: Status,
    pub incoming: Knowledge,
    pub tier: Tier,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Poly,
        Status::UnknownPolyQuasi,
        Status::NoPolyQuasi,
        Status::UnknownBoth,
        Status::NoPolyUnknownQuasi,
        Status::NoQuasi,
    ];

    /// Serialized code, e.g. `"no-poly-unknown-quasi"`.
    pub fn code(self) -> &'static str {
        match self {
            Status::Poly => "poly",
            Status::UnknownPolyQuasi => "unknown-poly-quasi",
            Status::NoPolyQuasi => "no-poly-quasi",
            Status::UnknownBoth => "unknown-both",
            Status::NoPolyUnknownQuasi => "no-poly-unknown-quasi",
            Status::NoQuasi => "no-quasi",
        }
    }

    pub fn from_code(code: &str) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Three-valued poly guarantee.
    pub fn poly(self) -> Option<bool> {
        match self {
            Status::Poly => Some(true),
            Status::UnknownPolyQuasi | Status::UnknownBoth => None,
            Status::NoPolyQuasi | Status::NoPolyUnknownQuasi | Status::NoQuasi => Some(false),
        }
    }

    /// Three-valued quasi guarantee.
    pub fn quasi(self) -> Option<bool> {
        match self {
            Status::Poly | Status::UnknownPolyQuasi | Status::NoPolyQuasi => Some(true),
            Status::UnknownBoth | Status::NoPolyUnknownQuasi => None,
            Status::NoQuasi => Some(false),
        }
    }

    pub fn knowledge(self) -> Knowledge {
        Knowledge {
            poly: self.poly(),
            quasi: self.quasi(),
        }
    }

    /// Rebuild a status from its two axes, closing under `poly ⇒ quasi`.
    ///
    /// Returns `None` for the contradictory pair "poly yes, quasi no".
    pub fn from_axes(poly: Option<bool>, quasi: Option<bool>) -> Option<Status> {
        match (poly, quasi) {
            (Some(true), Some(false)) => None,
            (Some(true), _) => Some(Status::Poly),
            (_, Some(false)) => Some(Status::NoQuasi),
            (None, Some(true)) => Some(Status::UnknownPolyQuasi),
            (Some(false), Some(true)) => Some(Status::NoPolyQuasi),
            (None, None) => Some(Status::UnknownBoth),
            (Some(false), None) => Some(Status::NoPolyUnknownQuasi),
        }
    }

    pub fn guarantees(self, tier: Tier) -> bool {
        match tier {
            Tier::Poly => self.poly() == Some(true),
            Tier::Quasi => self.quasi() == Some(true),
        }
    }

    pub fn rules_out(self, tier: Tier) -> bool {
        match tier {
            Tier::Poly => self.poly() == Some(false),
            Tier::Quasi => self.quasi() == Some(false),
        }
    }

    /// Strongest tier this status guarantees, if any.
    pub fn guaranteed_tier(self) -> Option<Tier> {
        if self.guarantees(Tier::Poly) {
            Some(Tier::Poly)
        } else if self.guarantees(Tier::Quasi) {
            Some(Tier::Quasi)
        } else {
            None
        }
    }

    /// Merge `incoming` into this status.
    ///
    /// The result carries every known axis of both sides. Opposite known
    /// values on the same axis (after closing under `poly ⇒ quasi`) are a
    /// [`Conflict`].
    pub fn refine(self, incoming: Knowledge) -> Result<Status, Conflict> {
        let conflict = |tier| Conflict {
            current: self,
            incoming,
            tier,
        };
        let poly = merge_axis(self.poly(), incoming.poly).ok_or_else(|| conflict(Tier::Poly))?;
        let quasi =
            merge_axis(self.quasi(), incoming.quasi).ok_or_else(|| conflict(Tier::Quasi))?;
        Status::from_axes(poly, quasi).ok_or_else(|| {
            // poly yes against quasi no: blame whichever side brought the negative.
            if incoming.quasi == Some(false) {
                conflict(Tier::Quasi)
            } else {
                conflict(Tier::Poly)
            }
        })
    }

    /// `true` when `self` keeps every known axis of `earlier`.
    pub fn is_refinement_of(self, earlier: Status) -> bool {
        let keeps = |now: Option<bool>, before: Option<bool>| before.is_none() || now == before;
        keeps(self.poly(), earlier.poly()) && keeps(self.quasi(), earlier.quasi())
    }

    /// Short phrase used in rendered derivations.
    pub fn phrase(self) -> &'static str {
        match self {
            Status::Poly => "polynomial",
            Status::UnknownPolyQuasi => "quasi-polynomial (polynomial unknown)",
            Status::NoPolyQuasi => "quasi-polynomial but not polynomial",
            Status::UnknownBoth => "unknown",
            Status::NoPolyUnknownQuasi => "not polynomial (quasi-polynomial unknown)",
            Status::NoQuasi => "not quasi-polynomial",
        }
    }
}

fn merge_axis(current: Option<bool>, incoming: Option<bool>) -> Option<Option<bool>> {
    match (current, incoming) {
        (Some(a), Some(b)) if a != b => None,
        (Some(a), _) => Some(Some(a)),
        (None, b) => Some(b),
    }
}

/// A missing entry counts as `unknown-both` during propagation.
pub fn effective(status: Option<Status>) -> Status {
    status.unwrap_or(Status::UnknownBoth)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
