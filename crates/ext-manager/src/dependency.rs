//! Dependency ordering for extensions
//!
//! Extensions may list other extensions they depend on. Starting them in
//! dependency order means every extension's dependencies are registered
//! before its own code runs.
//!
//! # Example
//!
//! ```
//! use ext_manager::dependency::{DependencyMap, DependencyResolver};
//!
//! let mut map = DependencyMap::new();
//! map.insert("menus", ["users"]);
//! map.insert("users", Vec::<String>::new());
//!
//! let order = DependencyResolver::sort(&map).unwrap();
//! assert_eq!(order, vec!["users", "menus"]);
//! ```

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::{Error, Result};

/// Insertion-ordered map of slug to declared dependency slugs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the dependencies of `slug`. A replaced entry keeps
    /// its original position.
    pub fn insert<S, I, D>(&mut self, slug: S, dependencies: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let slug = slug.into();
        let deps: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        match self.index.get(&slug) {
            Some(&i) => self.entries[i].1 = deps,
            None => {
                self.index.insert(slug.clone(), self.entries.len());
                self.entries.push((slug, deps));
            }
        }
    }

    pub fn get(&self, slug: &str) -> Option<&[String]> {
        self.index.get(slug).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    /// Slugs in insertion order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S, I, D> FromIterator<(S, I)> for DependencyMap
where
    S: Into<String>,
    I: IntoIterator<Item = D>,
    D: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut map = DependencyMap::new();
        for (slug, deps) in iter {
            map.insert(slug, deps);
        }
        map
    }
}

/// Stable topological sort over a [`DependencyMap`].
pub struct DependencyResolver;

impl DependencyResolver {
    /// Order the map's slugs so that each one follows its dependencies.
    ///
    /// Among slugs that are ready at the same time, the one inserted first
    /// wins. Dependencies that are not keys of the map are treated as
    /// already satisfied.
    ///
    /// # Errors
    ///
    /// Returns `Error::CyclicDependency` naming the members of one cycle.
    pub fn sort(map: &DependencyMap) -> Result<Vec<String>> {
        let n = map.entries.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, (_, deps)) in map.entries.iter().enumerate() {
            let unique: HashSet<&String> = deps.iter().collect();
            for dep in unique {
                if let Some(&j) = map.index.get(dep) {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(map.entries[i].0.clone());
            for &dependent in &dependents[i] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != n {
            let participants = find_cycle(map, &in_degree);
            tracing::debug!(?participants, "Dependency cycle detected");
            return Err(Error::CyclicDependency { participants });
        }

        Ok(order)
    }
}

/// Walk unresolved nodes until one repeats. Every unresolved node has at
/// least one unresolved dependency, so the walk always closes a loop.
fn find_cycle(map: &DependencyMap, in_degree: &[usize]) -> Vec<String> {
    let unresolved = |i: usize| in_degree[i] > 0;
    let Some(start) = (0..in_degree.len()).find(|&i| unresolved(i)) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&at) = position.get(&current) {
            return path[at..]
                .iter()
                .map(|&i| map.entries[i].0.clone())
                .collect();
        }
        position.insert(current, path.len());
        path.push(current);

        let next = map.entries[current]
            .1
            .iter()
            .filter_map(|dep| map.index.get(dep).copied())
            .find(|&j| unresolved(j));
        match next {
            Some(j) => current = j,
            None => break,
        }
    }

    path.into_iter().map(|i| map.entries[i].0.clone()).collect()
}
