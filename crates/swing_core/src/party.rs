//! crates/swing_core/src/party.rs
//! Closed party enumeration and a fixed-size map keyed by it.
//! Declaration order is the canonical order for every tie-break and report.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoreError;

/// Parties modelled by the engine. `Other` absorbs every unlisted candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Party {
    Conservative,
    Labour,
    LibDem,
    Snp,
    PlaidCymru,
    Green,
    Bnp,
    Ukip,
    Other,
}

impl Party {
    pub const COUNT: usize = 9;

    /// All parties in canonical order.
    pub const ALL: [Party; Party::COUNT] = [
        Party::Conservative,
        Party::Labour,
        Party::LibDem,
        Party::Snp,
        Party::PlaidCymru,
        Party::Green,
        Party::Bnp,
        Party::Ukip,
        Party::Other,
    ];

    /// Named parties (everything except `Other`).
    pub fn named() -> impl Iterator<Item = Party> {
        Party::ALL.into_iter().filter(|p| *p != Party::Other)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Party::Conservative => "Conservative",
            Party::Labour => "Labour",
            Party::LibDem => "Lib-Dem",
            Party::Snp => "SNP",
            Party::PlaidCymru => "PC",
            Party::Green => "Green",
            Party::Bnp => "BNP",
            Party::Ukip => "UKIP",
            Party::Other => "Other",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Party {
    type Err = CoreError;

    /// Accepts wire tokens (case-insensitive) and the short aliases used on the CLI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let p = match lower.as_str() {
            "conservative" | "con" | "tory" => Party::Conservative,
            "labour" | "lab" => Party::Labour,
            "lib-dem" | "libdem" | "ld" | "liberal democrat" => Party::LibDem,
            "snp" => Party::Snp,
            "pc" | "plaid" | "plaid cymru" | "plaid-cymru" => Party::PlaidCymru,
            "green" | "grn" => Party::Green,
            "bnp" => Party::Bnp,
            "ukip" => Party::Ukip,
            "other" | "oth" => Party::Other,
            _ => return Err(CoreError::UnknownParty(s.to_string())),
        };
        Ok(p)
    }
}

impl Serialize for Party {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Party {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ------------------------------------ PartyMap ------------------------------------

/// One slot per party, indexed by `Party`. Iteration follows canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PartyMap<T> {
    slots: [T; Party::COUNT],
}

impl<T> PartyMap<T> {
    pub fn from_fn(mut f: impl FnMut(Party) -> T) -> Self {
        Self { slots: core::array::from_fn(|i| f(Party::ALL[i])) }
    }

    #[inline]
    pub fn get(&self, p: Party) -> &T {
        &self.slots[p.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, p: Party) -> &mut T {
        &mut self.slots[p.index()]
    }

    #[inline]
    pub fn set(&mut self, p: Party, v: T) {
        self.slots[p.index()] = v;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Party, &T)> + '_ {
        Party::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Party, &mut T)> + '_ {
        Party::ALL.into_iter().zip(self.slots.iter_mut())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(Party, &T) -> U) -> PartyMap<U> {
        PartyMap::from_fn(|p| f(p, self.get(p)))
    }
}

impl<T: Copy> PartyMap<T> {
    pub fn splat(v: T) -> Self {
        Self { slots: [v; Party::COUNT] }
    }
}

impl<T> Index<Party> for PartyMap<T> {
    type Output = T;
    #[inline]
    fn index(&self, p: Party) -> &T {
        self.get(p)
    }
}

impl<T> IndexMut<Party> for PartyMap<T> {
    #[inline]
    fn index_mut(&mut self, p: Party) -> &mut T {
        self.get_mut(p)
    }
}

/// Serialized as a JSON object keyed by party token, in canonical order.
impl<T: Serialize> Serialize for PartyMap<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut m = s.serialize_map(Some(Party::COUNT))?;
        for (p, v) in self.iter() {
            m.serialize_entry(p.as_str(), v)?;
        }
        m.end()
    }
}

/// Missing parties take `T::default()`.
impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for PartyMap<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Party, T>::deserialize(d)?;
        let mut out = PartyMap::<T>::default();
        for (p, v) in raw {
            out.set(p, v);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_canonical_order() {
        for (i, p) in Party::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
        assert_eq!(Party::named().count(), Party::COUNT - 1);
    }

    #[test]
    fn parse_accepts_tokens_and_aliases() {
        assert_eq!("Lib-Dem".parse::<Party>().unwrap(), Party::LibDem);
        assert_eq!("ld".parse::<Party>().unwrap(), Party::LibDem);
        assert_eq!("PLAID".parse::<Party>().unwrap(), Party::PlaidCymru);
        assert!(matches!("Whig".parse::<Party>(), Err(CoreError::UnknownParty(_))));
        for p in Party::ALL {
            assert_eq!(p.as_str().parse::<Party>().unwrap(), p);
        }
    }

    #[test]
    fn party_map_json_fills_missing_with_default() {
        let m: PartyMap<u64> = serde_json::from_str(r#"{"Labour": 10, "UKIP": 3}"#).unwrap();
        assert_eq!(m[Party::Labour], 10);
        assert_eq!(m[Party::Ukip], 3);
        assert_eq!(m[Party::Conservative], 0);

        let v = serde_json::to_value(m).unwrap();
        assert_eq!(v["Labour"], 10);
        assert_eq!(v["Other"], 0);
    }

    #[test]
    fn party_map_rejects_unknown_keys() {
        let r: Result<PartyMap<u64>, _> = serde_json::from_str(r#"{"Whig": 1}"#);
        assert!(r.is_err());
    }
}
