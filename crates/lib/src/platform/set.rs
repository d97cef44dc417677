//! Mutable platform set keyed by identity.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Platform;

/// A set of platforms.
///
/// Insertion and removal are idempotent. Iteration order carries no meaning;
/// use [`PlatformSet::sorted`] when a stable order is needed for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformSet {
  inner: HashSet<Platform>,
}

impl PlatformSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert every platform in `batch`. Platforms already present are ignored.
  pub fn add<'a>(&mut self, batch: impl IntoIterator<Item = &'a Platform>) {
    self.inner.extend(batch.into_iter().cloned());
  }

  /// Remove every platform in `batch`. Absent platforms are ignored.
  pub fn remove<'a>(&mut self, batch: impl IntoIterator<Item = &'a Platform>) {
    for platform in batch {
      self.inner.remove(platform);
    }
  }

  pub fn insert(&mut self, platform: Platform) -> bool {
    self.inner.insert(platform)
  }

  pub fn contains(&self, platform: &Platform) -> bool {
    self.inner.contains(platform)
  }

  pub fn union(&mut self, other: &PlatformSet) {
    self.add(other.iter());
  }

  pub fn subtract(&mut self, other: &PlatformSet) {
    self.remove(other.iter());
  }

  /// Returns the platforms as an unordered vector.
  pub fn to_vec(&self) -> Vec<Platform> {
    self.inner.iter().cloned().collect()
  }

  /// Returns the platforms ordered by `(os, arch)`.
  pub fn sorted(&self) -> Vec<Platform> {
    let mut platforms = self.to_vec();
    platforms.sort();
    platforms
  }

  pub fn iter(&self) -> impl Iterator<Item = &Platform> {
    self.inner.iter()
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }
}

impl FromIterator<Platform> for PlatformSet {
  fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
    Self {
      inner: iter.into_iter().collect(),
    }
  }
}

impl<'a> FromIterator<&'a Platform> for PlatformSet {
  fn from_iter<I: IntoIterator<Item = &'a Platform>>(iter: I) -> Self {
    iter.into_iter().cloned().collect()
  }
}

impl IntoIterator for PlatformSet {
  type Item = Platform;
  type IntoIter = std::collections::hash_set::IntoIter<Platform>;

  fn into_iter(self) -> Self::IntoIter {
    self.inner.into_iter()
  }
}

// Serialized as a sorted list so files written from the same set are byte-identical.
impl Serialize for PlatformSet {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(self.sorted())
  }
}

impl<'de> Deserialize<'de> for PlatformSet {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let platforms = Vec::<Platform>::deserialize(deserializer)?;
    Ok(platforms.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn p(id: &str) -> Platform {
    Platform::parse(id).unwrap()
  }

  #[test]
  fn add_is_idempotent() {
    let mut set = PlatformSet::new();
    let batch = [p("linux/amd64"), p("linux/amd64"), p("darwin/arm64")];
    set.add(&batch);
    set.add(&batch);
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn remove_absent_is_noop() {
    let mut set: PlatformSet = [p("linux/amd64")].into_iter().collect();
    set.remove(&[p("windows/386")]);
    assert_eq!(set.len(), 1);
    set.remove(&[p("linux/amd64")]);
    set.remove(&[p("linux/amd64")]);
    assert!(set.is_empty());
  }

  #[test]
  fn sorted_orders_by_os_then_arch() {
    let set: PlatformSet = [p("linux/arm64"), p("darwin/amd64"), p("linux/386")].into_iter().collect();
    let ids: Vec<String> = set.sorted().iter().map(Platform::id).collect();
    assert_eq!(ids, vec!["darwin/amd64", "linux/386", "linux/arm64"]);
  }

  #[test]
  fn equality_ignores_insertion_order() {
    let a: PlatformSet = [p("linux/amd64"), p("windows/amd64")].into_iter().collect();
    let b: PlatformSet = [p("windows/amd64"), p("linux/amd64")].into_iter().collect();
    assert_eq!(a, b);
  }

  fn arb_platform() -> impl Strategy<Value = Platform> {
    ("[a-z]{1,3}", "[a-z0-9]{1,3}").prop_map(|(os, arch)| Platform::new(os, arch))
  }

  proptest! {
    #[test]
    fn add_twice_equals_add_once(
      base in proptest::collection::vec(arb_platform(), 0..16),
      batch in proptest::collection::vec(arb_platform(), 0..16),
    ) {
      let mut once: PlatformSet = base.iter().collect();
      once.add(&batch);

      let mut twice = once.clone();
      twice.add(&batch);

      prop_assert_eq!(once, twice);
    }

    #[test]
    fn removed_platforms_are_absent(
      base in proptest::collection::vec(arb_platform(), 0..16),
      batch in proptest::collection::vec(arb_platform(), 0..16),
    ) {
      let mut set: PlatformSet = base.iter().collect();
      set.remove(&batch);
      for platform in &batch {
        prop_assert!(!set.contains(platform));
      }
    }
  }
}
