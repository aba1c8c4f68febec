//! Parent-pointer walks over a snapshot of the category table.
//!
//! Every walk is bounded by the number of nodes and stops on a revisited
//! id, so a corrupted (cyclic) table yields an integrity fault instead of
//! an endless loop.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::error::{AppError, Result};
use crate::features::categories::models::Category;
use crate::shared::constants::CATEGORY_PATH_SEPARATOR;

/// Tracks one upward walk and reports a fault once it loops
pub struct WalkGuard {
    origin: i64,
    limit: usize,
    seen: HashSet<i64>,
}

impl WalkGuard {
    pub fn new(origin: i64, limit: usize) -> Self {
        Self {
            origin,
            limit,
            seen: HashSet::new(),
        }
    }

    /// Record a visit to `id`; errors when the walk has looped
    pub fn visit(&mut self, id: i64) -> Result<()> {
        if !self.seen.insert(id) || self.seen.len() > self.limit {
            return Err(AppError::Integrity(format!(
                "parent chain of category {} loops back through category {}",
                self.origin, id
            )));
        }
        Ok(())
    }
}

pub fn dangling_parent(child_id: i64, parent_id: i64) -> AppError {
    AppError::Integrity(format!(
        "category {} points at missing parent {}",
        child_id, parent_id
    ))
}

pub fn join_path<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .collect::<Vec<_>>()
        .join(CATEGORY_PATH_SEPARATOR)
}

/// In-memory id → category index for bulk tree operations
pub struct TreeIndex {
    nodes: HashMap<i64, Category>,
    children: HashMap<Option<i64>, Vec<i64>>,
    order: Vec<i64>,
}

impl TreeIndex {
    /// Build from a list of categories; child lists keep the input order
    pub fn new(categories: Vec<Category>) -> Self {
        let mut nodes = HashMap::with_capacity(categories.len());
        let mut children: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
        let mut order = Vec::with_capacity(categories.len());

        for category in categories {
            children
                .entry(category.parent_id)
                .or_default()
                .push(category.id);
            order.push(category.id);
            nodes.insert(category.id, category);
        }

        Self {
            nodes,
            children,
            order,
        }
    }

    /// Categories in input order
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Direct children of `parent_id` (`None` = roots)
    pub fn children_of(&self, parent_id: Option<i64>) -> impl Iterator<Item = &Category> {
        self.children
            .get(&parent_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
    }

    /// Chain from the root down to `id` inclusive
    pub fn lineage(&self, id: i64) -> Result<Vec<&Category>> {
        let mut guard = WalkGuard::new(id, self.nodes.len());
        let mut chain: Vec<&Category> = Vec::new();
        let mut current = Some(id);

        while let Some(current_id) = current {
            let node = self.nodes.get(&current_id).ok_or_else(|| match chain.last() {
                Some(child) => dangling_parent(child.id, current_id),
                None => AppError::NotFound(format!("Category {} not found", current_id)),
            })?;
            guard.visit(current_id)?;
            chain.push(node);
            current = node.parent_id;
        }

        chain.reverse();
        Ok(chain)
    }

    pub fn full_path(&self, id: i64) -> Result<String> {
        Ok(join_path(
            self.lineage(id)?.into_iter().map(|c| c.name.as_str()),
        ))
    }

    /// Every id below `id`, breadth first
    pub fn descendant_ids(&self, id: i64) -> Vec<i64> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(Some(current)) {
                if seen.insert(child.id) {
                    out.push(child.id);
                    queue.push_back(child.id);
                }
            }
        }

        out
    }

    /// `(id, full path)` for every category except `exclude`, sorted
    /// case-insensitively by path (ties by id)
    pub fn path_options(&self, exclude: Option<i64>) -> Result<Vec<(i64, String)>> {
        let mut options = self
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .map(|c| Ok((c.id, self.full_path(c.id)?)))
            .collect::<Result<Vec<_>>>()?;

        options.sort_by_cached_key(|(id, path)| (path.to_lowercase(), *id));
        Ok(options)
    }
}
