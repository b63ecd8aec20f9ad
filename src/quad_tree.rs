use std::hash::Hash;

use hashbrown::HashSet;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BoundingRect, MeshNum, Point2};

/// Describes objects that can be stored in a [QuadTree].
///
/// An object exposes a bounding rectangle and a containment predicate. The quad-tree only
/// uses the rectangle for placing the object and for pruning queries, the predicate decides
/// if an object is actually reported.
pub trait SpatialObject {
    /// The scalar type of the object's coordinates.
    type Scalar: MeshNum;

    /// Returns a rectangle that encloses every point for which
    /// [contains_point](SpatialObject::contains_point) returns `true`.
    ///
    /// Queries can fail if the rectangle is too small.
    fn bounds(&self) -> BoundingRect<Self::Scalar>;

    /// Returns `true` if a given point is contained in this object.
    fn contains_point(&self, point: Point2<Self::Scalar>) -> bool;
}

/// Determines where a [QuadTree] stores objects that overlap more than one quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub enum PlacementPolicy {
    /// Each object is stored exactly once, at the deepest node whose rectangle fully
    /// contains the object's bounds. Objects that straddle a quadrant border remain in the
    /// parent node.
    #[default]
    SingleOwner,

    /// Each object is copied into every leaf whose rectangle intersects the object's bounds.
    ///
    /// Queries and [QuadTree::collect_all] de-duplicate the copies.
    Duplicate,
}

/// Parameters of a [QuadTree].
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct QuadTreeOptions {
    max_items: usize,
    max_depth: usize,
    placement: PlacementPolicy,
}

impl Default for QuadTreeOptions {
    fn default() -> QuadTreeOptions {
        QuadTreeOptions::new()
    }
}

impl QuadTreeOptions {
    /// The number of items a leaf may hold before it is subdivided.
    pub const DEFAULT_MAX_ITEMS: usize = 400;

    /// The maximum depth of any node. Nodes on this depth are never subdivided.
    pub const DEFAULT_MAX_DEPTH: usize = 16;

    /// Creates the default options.
    pub fn new() -> QuadTreeOptions {
        QuadTreeOptions {
            max_items: Self::DEFAULT_MAX_ITEMS,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            placement: PlacementPolicy::default(),
        }
    }

    /// Sets the number of items a leaf may hold before it is subdivided.
    ///
    /// Values smaller than one are raised to one.
    pub fn max_items(mut self, max_items: usize) -> QuadTreeOptions {
        self.max_items = max_items.max(1);
        self
    }

    /// Sets the maximum node depth. The root has depth 0.
    pub fn max_depth(mut self, max_depth: usize) -> QuadTreeOptions {
        self.max_depth = max_depth;
        self
    }

    /// Sets the placement policy for objects overlapping several quadrants.
    pub fn placement(mut self, placement: PlacementPolicy) -> QuadTreeOptions {
        self.placement = placement;
        self
    }

    /// Creates an empty quad-tree covering `bounds`.
    pub fn build<T>(self, bounds: BoundingRect<T::Scalar>) -> QuadTree<T>
    where
        T: SpatialObject + Clone + Eq + Hash,
    {
        QuadTree::new_with_options(bounds, self)
    }
}

/// A region quad-tree storing objects with an extent.
///
/// Every node covers a rectangle. A leaf holding more than
/// [max_items](QuadTreeOptions::max_items) objects is split into four equally sized
/// quadrants and its objects are redistributed according to the tree's
/// [PlacementPolicy].
///
/// # Example
/// ```
/// use isomesh::{BoundingRect, Point2, QuadTree, SpatialObject};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// struct Tile {
///     id: u32,
///     x: i32,
///     y: i32,
/// }
///
/// impl SpatialObject for Tile {
///     type Scalar = f64;
///
///     fn bounds(&self) -> BoundingRect<f64> {
///         let lower = Point2::new(self.x as f64, self.y as f64);
///         BoundingRect::from_corners(lower, Point2::new(lower.x + 1.0, lower.y + 1.0))
///     }
///
///     fn contains_point(&self, point: Point2<f64>) -> bool {
///         self.bounds().contains_point(point)
///     }
/// }
///
/// let area = BoundingRect::from_corners(Point2::new(0.0, 0.0), Point2::new(8.0, 8.0));
/// let mut tree = QuadTree::new(area);
/// assert!(tree.insert(Tile { id: 0, x: 2, y: 3 }));
/// assert!(!tree.insert(Tile { id: 1, x: 20, y: 3 }));
///
/// let hits = tree.query(Point2::new(2.5, 3.5));
/// assert_eq!(hits.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct QuadTree<T: SpatialObject> {
    root: QuadNode<T>,
    options: QuadTreeOptions,
    len: usize,
}

#[derive(Debug, Clone)]
struct QuadNode<T: SpatialObject> {
    bounds: BoundingRect<T::Scalar>,
    depth: usize,
    items: Vec<T>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

impl<T> QuadTree<T>
where
    T: SpatialObject + Clone + Eq + Hash,
{
    /// Creates an empty quad-tree with default options.
    pub fn new(bounds: BoundingRect<T::Scalar>) -> Self {
        Self::new_with_options(bounds, QuadTreeOptions::default())
    }

    /// Creates an empty quad-tree with the given options.
    pub fn new_with_options(bounds: BoundingRect<T::Scalar>, options: QuadTreeOptions) -> Self {
        QuadTree {
            root: QuadNode::new(bounds, 0),
            options,
            len: 0,
        }
    }

    /// Returns the rectangle covered by the root node.
    pub fn bounds(&self) -> BoundingRect<T::Scalar> {
        self.root.bounds
    }

    /// Returns the options this tree was created with.
    pub fn options(&self) -> &QuadTreeOptions {
        &self.options
    }

    /// Returns the number of stored objects, not counting duplicated references.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no object is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of object references held by all nodes.
    ///
    /// This is equal to [len](QuadTree::len) for [PlacementPolicy::SingleOwner] and can be
    /// larger for [PlacementPolicy::Duplicate].
    pub fn stored_references(&self) -> usize {
        self.root.stored_references()
    }

    /// Returns the depth of the deepest node.
    pub fn depth(&self) -> usize {
        self.root.max_depth()
    }

    /// Inserts an object.
    ///
    /// Returns `false` and drops the object if its bounds do not intersect the root
    /// rectangle. Inserting an object that is equal to an already stored object is not
    /// supported.
    pub fn insert(&mut self, item: T) -> bool {
        let bounds = item.bounds();
        if !self.root.bounds.intersects(&bounds) {
            return false;
        }
        self.root.insert(item, &bounds, &self.options);
        self.len += 1;
        true
    }

    /// Returns every stored object that contains `point`.
    ///
    /// Only nodes whose rectangle contains `point` are visited.
    pub fn query(&self, point: Point2<T::Scalar>) -> HashSet<T> {
        let mut result = HashSet::new();
        self.root.query(point, &mut result);
        result
    }

    /// Removes an object from every node that holds it.
    ///
    /// Returns `true` if the object was found.
    pub fn remove(&mut self, item: &T) -> bool {
        let bounds = item.bounds();
        let removed = self.root.remove(item, &bounds, self.options.placement);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Returns all stored objects.
    pub fn collect_all(&self) -> HashSet<T> {
        let mut result = HashSet::with_capacity(self.len);
        self.root.collect(&mut result);
        result
    }
}

impl<T> QuadNode<T>
where
    T: SpatialObject + Clone + Eq + Hash,
{
    fn new(bounds: BoundingRect<T::Scalar>, depth: usize) -> Self {
        QuadNode {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, item: T, bounds: &BoundingRect<T::Scalar>, options: &QuadTreeOptions) {
        match options.placement {
            PlacementPolicy::SingleOwner => self.insert_single_owner(item, bounds, options),
            PlacementPolicy::Duplicate => self.insert_duplicating(item, bounds, options),
        }
    }

    fn insert_single_owner(
        &mut self,
        item: T,
        bounds: &BoundingRect<T::Scalar>,
        options: &QuadTreeOptions,
    ) {
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children
                .iter_mut()
                .find(|child| child.bounds.contains_rect(bounds))
            {
                child.insert_single_owner(item, bounds, options);
            } else {
                // Straddles a quadrant border
                self.items.push(item);
            }
            return;
        }
        self.items.push(item);
        self.resolve_overflow(options);
    }

    fn insert_duplicating(
        &mut self,
        item: T,
        bounds: &BoundingRect<T::Scalar>,
        options: &QuadTreeOptions,
    ) {
        if let Some(children) = self.children.as_mut() {
            let targets: SmallVec<[usize; 4]> = (0..4)
                .filter(|&index| children[index].bounds.intersects(bounds))
                .collect();
            if let Some((&last, rest)) = targets.split_last() {
                for &index in rest {
                    children[index].insert_duplicating(item.clone(), bounds, options);
                }
                children[last].insert_duplicating(item, bounds, options);
            }
            return;
        }
        self.items.push(item);
        self.resolve_overflow(options);
    }

    fn resolve_overflow(&mut self, options: &QuadTreeOptions) {
        if self.items.len() > options.max_items && self.depth < options.max_depth {
            self.subdivide(options);
        }
    }

    fn subdivide(&mut self, options: &QuadTreeOptions) {
        let depth = self.depth + 1;
        let children = self
            .bounds
            .quadrants()
            .map(|quadrant| QuadNode::new(quadrant, depth));
        self.children = Some(Box::new(children));

        for item in std::mem::take(&mut self.items) {
            let bounds = item.bounds();
            self.insert(item, &bounds, options);
        }
    }

    fn query(&self, point: Point2<T::Scalar>, result: &mut HashSet<T>) {
        if !self.bounds.contains_point(point) {
            return;
        }
        for item in &self.items {
            if item.contains_point(point) {
                result.insert(item.clone());
            }
        }
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query(point, result);
            }
        }
    }

    fn remove(
        &mut self,
        item: &T,
        bounds: &BoundingRect<T::Scalar>,
        placement: PlacementPolicy,
    ) -> bool {
        if !self.bounds.intersects(bounds) {
            return false;
        }
        let mut removed = false;
        if let Some(index) = self.items.iter().position(|stored| stored == item) {
            self.items.swap_remove(index);
            if placement == PlacementPolicy::SingleOwner {
                return true;
            }
            removed = true;
        }
        if let Some(children) = self.children.as_mut() {
            for child in children.iter_mut() {
                // Every copy must go, don't stop at the first hit
                removed |= child.remove(item, bounds, placement);
            }
        }
        removed
    }

    fn collect(&self, result: &mut HashSet<T>) {
        result.extend(self.items.iter().cloned());
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect(result);
            }
        }
    }

    fn stored_references(&self) -> usize {
        let nested: usize = self
            .children
            .iter()
            .flat_map(|children| children.iter())
            .map(QuadNode::stored_references)
            .sum();
        self.items.len() + nested
    }

    fn max_depth(&self) -> usize {
        self.children
            .iter()
            .flat_map(|children| children.iter())
            .map(QuadNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }
}

#[cfg(test)]
mod test {
    use std::hash::{Hash, Hasher};

    use super::{PlacementPolicy, QuadTree, QuadTreeOptions, SpatialObject};
    use crate::test_utilities::{random_points_with_seed, SEED, SEED2};
    use crate::{BoundingRect, Point2};

    #[derive(Clone, Copy, Debug)]
    struct Disc {
        id: usize,
        center: Point2<f64>,
        radius: f64,
    }

    impl PartialEq for Disc {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Disc {}

    impl Hash for Disc {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    impl SpatialObject for Disc {
        type Scalar = f64;

        fn bounds(&self) -> BoundingRect<f64> {
            let offset = Point2::new(self.radius, self.radius);
            BoundingRect::from_corners(self.center.sub(offset), self.center.add(offset))
        }

        fn contains_point(&self, point: Point2<f64>) -> bool {
            self.center.distance_2(point) <= self.radius * self.radius
        }
    }

    fn unit_area() -> BoundingRect<f64> {
        BoundingRect::from_corners(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0))
    }

    fn random_discs(size: usize) -> Vec<Disc> {
        random_points_with_seed(size, SEED)
            .into_iter()
            .enumerate()
            .map(|(id, center)| Disc {
                id,
                center,
                radius: 0.01 + (id % 7) as f64 * 0.02,
            })
            .collect()
    }

    fn create_tree(policy: PlacementPolicy, discs: &[Disc]) -> QuadTree<Disc> {
        let mut tree = QuadTreeOptions::new()
            .max_items(8)
            .placement(policy)
            .build(unit_area());
        for disc in discs {
            assert!(tree.insert(*disc));
        }
        tree
    }

    fn brute_force(discs: &[Disc], point: Point2<f64>) -> Vec<usize> {
        let mut result: Vec<_> = discs
            .iter()
            .filter(|disc| disc.contains_point(point))
            .map(|disc| disc.id)
            .collect();
        result.sort();
        result
    }

    fn sorted_ids(discs: impl IntoIterator<Item = Disc>) -> Vec<usize> {
        let mut result: Vec<_> = discs.into_iter().map(|disc| disc.id).collect();
        result.sort();
        result
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut tree = QuadTree::new(unit_area());
        let far_away = Disc {
            id: 0,
            center: Point2::new(5.0, 5.0),
            radius: 1.0,
        };
        assert!(!tree.insert(far_away));
        assert!(tree.is_empty());

        let overlapping = Disc {
            id: 1,
            center: Point2::new(1.5, 0.0),
            radius: 1.0,
        };
        assert!(tree.insert(overlapping));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_query_matches_linear_search() {
        let discs = random_discs(500);
        let samples = random_points_with_seed(200, SEED2);
        for policy in [PlacementPolicy::SingleOwner, PlacementPolicy::Duplicate] {
            let tree = create_tree(policy, &discs);
            assert!(tree.depth() > 0);
            for sample in &samples {
                assert_eq!(sorted_ids(tree.query(*sample)), brute_force(&discs, *sample));
            }
        }
    }

    #[test]
    fn test_collect_all() {
        let discs = random_discs(300);
        for policy in [PlacementPolicy::SingleOwner, PlacementPolicy::Duplicate] {
            let tree = create_tree(policy, &discs);
            assert_eq!(tree.len(), discs.len());
            assert_eq!(sorted_ids(tree.collect_all()), (0..discs.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_remove() {
        let discs = random_discs(300);
        let samples = random_points_with_seed(100, SEED2);
        for policy in [PlacementPolicy::SingleOwner, PlacementPolicy::Duplicate] {
            let mut tree = create_tree(policy, &discs);
            let (removed, kept) = discs.split_at(150);
            for disc in removed {
                assert!(tree.remove(disc));
                assert!(!tree.remove(disc));
            }
            assert_eq!(tree.len(), kept.len());
            for sample in &samples {
                assert_eq!(sorted_ids(tree.query(*sample)), brute_force(kept, *sample));
            }
            for disc in kept {
                assert!(tree.remove(disc));
            }
            assert!(tree.is_empty());
            assert_eq!(tree.stored_references(), 0);
        }
    }

    #[test]
    fn test_single_owner_stores_once() {
        let discs = random_discs(400);
        let tree = create_tree(PlacementPolicy::SingleOwner, &discs);
        assert_eq!(tree.stored_references(), discs.len());
    }

    // Pins the behavior of the duplicating placement: objects crossing quadrant borders
    // are copied into several leaves, yet queries, removal and collection see them once.
    #[test]
    fn test_duplicate_placement_copies_straddling_items() {
        let mut tree = QuadTreeOptions::new()
            .max_items(1)
            .max_depth(1)
            .placement(PlacementPolicy::Duplicate)
            .build(unit_area());

        let center = Disc {
            id: 0,
            center: Point2::new(0.0, 0.0),
            radius: 0.25,
        };
        let corner = Disc {
            id: 1,
            center: Point2::new(0.75, 0.75),
            radius: 0.1,
        };
        assert!(tree.insert(center));
        assert!(tree.insert(corner));

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.stored_references(), 5);
        assert_eq!(tree.collect_all().len(), 2);

        assert_eq!(sorted_ids(tree.query(Point2::new(0.1, 0.1))), vec![0]);
        assert_eq!(sorted_ids(tree.query(Point2::new(-0.1, -0.1))), vec![0]);
        assert_eq!(sorted_ids(tree.query(Point2::new(0.75, 0.8))), vec![1]);

        assert!(tree.remove(&center));
        assert_eq!(tree.stored_references(), 1);
        assert!(tree.query(Point2::new(-0.1, 0.1)).is_empty());
    }

    #[test]
    fn test_single_owner_keeps_straddling_items_in_parent() {
        let mut tree = QuadTreeOptions::new()
            .max_items(1)
            .max_depth(1)
            .build(unit_area());

        let center = Disc {
            id: 0,
            center: Point2::new(0.0, 0.0),
            radius: 0.25,
        };
        let corner = Disc {
            id: 1,
            center: Point2::new(0.75, 0.75),
            radius: 0.1,
        };
        assert!(tree.insert(center));
        assert!(tree.insert(corner));

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.stored_references(), 2);
        assert_eq!(tree.root.items, vec![center]);
        assert_eq!(sorted_ids(tree.query(Point2::new(-0.1, 0.1))), vec![0]);
    }

    #[test]
    fn test_max_depth_limits_subdivision() {
        let discs = random_discs(200);
        let mut tree = QuadTreeOptions::new()
            .max_items(1)
            .max_depth(3)
            .placement(PlacementPolicy::Duplicate)
            .build(unit_area());
        for disc in &discs {
            tree.insert(*disc);
        }
        assert_eq!(tree.depth(), 3);
    }
}
