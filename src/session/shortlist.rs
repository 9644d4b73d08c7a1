use std::str::FromStr;

use crate::error::{Error, Result};
use crate::media::ItemRecord;

/// Candidates from the last search-like command, picked by 1-based position.
///
/// Every new search replaces the list wholesale.
#[derive(Debug, Clone, Default)]
pub struct Shortlist {
    records: Vec<ItemRecord>,
}

impl Shortlist {
    /// Keep at most `cap` of `records`.
    pub fn replace(&mut self, mut records: Vec<ItemRecord>, cap: usize) -> usize {
        records.truncate(cap);
        self.records = records;
        self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    /// Record at 1-based `position`.
    pub fn get(&self, position: usize) -> Option<&ItemRecord> {
        position
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
    }

    /// Records for `selection`, in pick order. Fails without returning
    /// anything if one pick is out of range.
    pub fn select(&self, selection: &Selection) -> Result<Vec<ItemRecord>> {
        if self.records.is_empty() {
            return Err(Error::NotFound("shortlist is empty".to_string()));
        }
        match selection {
            Selection::All => Ok(self.records.clone()),
            Selection::Picks(picks) => picks
                .iter()
                .map(|&p| {
                    self.get(p).cloned().ok_or(Error::InvalidMutation {
                        index: p,
                        len: self.records.len(),
                    })
                })
                .collect(),
        }
    }
}

/// Which shortlist entries to queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// 1-based positions; repeats queue an entry more than once.
    Picks(Vec<usize>),
}

impl FromStr for Selection {
    type Err = Error;

    /// `*` for everything, else positions separated by commas or spaces.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(Self::All);
        }
        let picks = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<usize>()
                    .map_err(|_| Error::NotFound(format!("shortlist position `{p}`")))
            })
            .collect::<Result<Vec<_>>>()?;
        if picks.is_empty() {
            return Err(Error::NotFound("no shortlist position given".to_string()));
        }
        Ok(Self::Picks(picks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<ItemRecord> {
        (0..n)
            .map(|i| ItemRecord {
                id: format!("r{i}"),
                ..ItemRecord::default()
            })
            .collect()
    }

    #[test]
    fn replace_caps_and_picks_are_one_based() {
        let mut list = Shortlist::default();
        assert_eq!(list.replace(records(5), 3), 3);
        assert_eq!(list.get(1).unwrap().id, "r0");
        assert!(list.get(0).is_none());
        assert!(list.get(4).is_none());

        let picked = list.select(&Selection::Picks(vec![3, 1, 3])).unwrap();
        let ids: Vec<&str> = picked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r0", "r2"]);
    }

    #[test]
    fn bad_pick_selects_nothing() {
        let mut list = Shortlist::default();
        list.replace(records(2), 10);
        assert!(matches!(
            list.select(&Selection::Picks(vec![1, 3])),
            Err(Error::InvalidMutation { index: 3, len: 2 })
        ));
        assert!(matches!(
            Shortlist::default().select(&Selection::All),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn selection_parsing() {
        assert_eq!(" * ".parse::<Selection>().unwrap(), Selection::All);
        assert_eq!(
            "2, 4 1".parse::<Selection>().unwrap(),
            Selection::Picks(vec![2, 4, 1])
        );
        assert!("two".parse::<Selection>().is_err());
        assert!("".parse::<Selection>().is_err());
    }
}
