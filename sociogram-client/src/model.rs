use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Opaque numeric identity of a profile on the friend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry of a friend list, as returned by the friend service.
///
/// Birth date and city are absent when the profile hides them; no sentinel
/// values are substituted at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEntry {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<String>,
    pub city: Option<String>,
}

impl FriendEntry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A person discovered during the crawl. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: UserId,
    pub name: String,
    pub birth_date: Option<String>,
    pub city: Option<String>,
    /// 1 = direct friend of the root, 2 = friend of a friend.
    pub depth: u8,
}

impl Person {
    pub fn from_entry(entry: &FriendEntry, depth: u8) -> Self {
        Self {
            id: entry.id,
            name: entry.display_name(),
            birth_date: entry.birth_date.clone(),
            city: entry.city.clone(),
            depth,
        }
    }
}

/// Insertion-ordered set of persons, unique by identity.
///
/// An identity already present is never overwritten, even when the same
/// profile is rediscovered through a different direct friend.
#[derive(Debug, Clone, Default)]
pub struct PersonSet {
    persons: Vec<Person>,
    index: HashMap<UserId, usize>,
}

impl PersonSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a person unless its identity was seen before. Returns whether
    /// the person was newly inserted.
    pub fn insert(&mut self, person: Person) -> bool {
        if self.index.contains_key(&person.id) {
            return false;
        }

        self.index.insert(person.id, self.persons.len());
        self.persons.push(person);
        true
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &UserId) -> Option<&Person> {
        self.index.get(id).map(|i| &self.persons[*i])
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// Iterates over persons in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter()
    }

    pub fn count_at_depth(&self, depth: u8) -> usize {
        self.persons.iter().filter(|p| p.depth == depth).count()
    }
}

/// An ordered `(parent, child)` connection discovered during the crawl.
///
/// Records are not deduplicated; a friend-of-friend reached through several
/// direct friends yields one record per discovery. Duplicates collapse at
/// graph assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub parent: UserId,
    pub child: UserId,
}

impl EdgeRecord {
    pub fn new(parent: UserId, child: UserId) -> Self {
        Self { parent, child }
    }
}

/// Outcome of one direct friend's second-degree expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expansion {
    /// The friend list was fetched; `discovered` counts newly seen profiles.
    Expanded { friend: UserId, discovered: usize },
    /// The fetch failed and the branch was dropped.
    Skipped { friend: UserId, error: String },
}

/// Everything a crawl produced. An empty outcome is the valid result of a
/// failed root fetch, not an error.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub persons: PersonSet,
    /// Insertion order preserved, duplicates allowed.
    pub edges: Vec<EdgeRecord>,
    /// Identities of all direct friends, before any cap is applied.
    pub direct_friends: HashSet<UserId>,
    pub expansions: Vec<Expansion>,
}

impl CrawlOutcome {
    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.edges.is_empty()
    }

    pub fn friend_of_friend_count(&self) -> usize {
        self.persons.count_at_depth(2)
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&UserId, &str)> {
        self.expansions.iter().filter_map(|e| match e {
            Expansion::Skipped { friend, error } => Some((friend, error.as_str())),
            Expansion::Expanded { .. } => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: u64, name: &str, depth: u8) -> Person {
        Person {
            id: UserId(id),
            name: name.to_string(),
            birth_date: None,
            city: None,
            depth,
        }
    }

    #[test]
    fn person_set_insert_is_first_writer_wins() {
        let mut set = PersonSet::new();

        assert!(set.insert(person(1, "Alice Ivanova", 1)));
        assert!(!set.insert(person(1, "Alice The Second", 2)));

        assert_eq!(set.len(), 1);
        let stored = set.get(&UserId(1)).unwrap();
        assert_eq!(stored.name, "Alice Ivanova");
        assert_eq!(stored.depth, 1);
    }

    #[test]
    fn person_set_preserves_insertion_order() {
        let mut set = PersonSet::new();
        set.insert(person(3, "c", 1));
        set.insert(person(1, "a", 1));
        set.insert(person(2, "b", 2));

        let ids: Vec<u64> = set.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn count_at_depth() {
        let mut set = PersonSet::new();
        set.insert(person(1, "a", 1));
        set.insert(person(2, "b", 1));
        set.insert(person(3, "c", 2));

        assert_eq!(set.count_at_depth(1), 2);
        assert_eq!(set.count_at_depth(2), 1);
    }

    #[test]
    fn display_name_joins_first_and_last() {
        let entry = FriendEntry {
            id: UserId(7),
            first_name: "Boris".to_string(),
            last_name: "Petrov".to_string(),
            birth_date: None,
            city: None,
        };

        assert_eq!(entry.display_name(), "Boris Petrov");
    }

    #[test]
    fn empty_outcome_reports_empty() {
        let outcome = CrawlOutcome::default();
        assert!(outcome.is_empty());
        assert_eq!(outcome.friend_of_friend_count(), 0);
        assert_eq!(outcome.skipped().count(), 0);
    }
}
