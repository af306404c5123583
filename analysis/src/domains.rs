use core::cmp::Ordering;
use core::fmt::Debug;
use core::hash::Hash;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use std::collections::HashMap;

use fixedbitset::FixedBitSet;

/////////////////////////
// Traits for domains. //
/////////////////////////

/// A join semi-lattice is a partially ordered set where the least upper
/// bound exists for every subset. The ordering relation can be viewed as
/// "safe approximation": bigger elements approximate more program
/// behaviors. Bottom is the least informative element, often standing for
/// "not yet observed"; analyses move upwards from it until a fixed point
/// is reached.
pub trait JoinSemiLattice: Eq + PartialOrd + Clone + Debug {
    /// A type to hold some information about the lattice on the side.
    ///
    /// For some lattices, like the power set lattice, we need to store
    /// the size of the universe somewhere. When no such value is needed,
    /// set this to unit.
    type LatticeContext;

    /// The unit element of the join operation, required to be the
    /// smallest element according to the ordering.
    fn bottom(ctx: &Self::LatticeContext) -> Self;

    /// Computes the least upper bound of the two elements. Used to merge
    /// the states of multiple predecessors at control flow joins.
    ///
    /// Requirements:
    /// * Reflexive: a.join(a, ctx) == a
    /// * Commutative: a.join(b, ctx) == b.join(a, ctx)
    /// * Bottom is unit: bottom.join(b, ctx) == b
    /// * Upper bound: a.join(b, ctx) >= a and a.join(b, ctx) >= b
    /// * Ordering is respected: a <= b => a.join(b, ctx) == b
    fn join(&self, other: &Self, ctx: &Self::LatticeContext) -> Self;

    /// In case a lattice has infinite (or very long) ascending chains,
    /// the widening operation can ensure convergence. Lattices of finite
    /// height can use the default implementation.
    ///
    /// Requirements:
    /// * Reflexive: a.widen(a, ctx, i) == a
    /// * b.widen(a, ctx, i) == b if a <= b
    fn widen(&self, _previous: &Self, _ctx: &Self::LatticeContext, _iteration: usize) -> Self {
        self.clone()
    }
}

/// A lattice is a join semi-lattice that is also a meet semi-lattice,
/// i.e., the greatest lower bound (meet) also exists for all subsets.
pub trait Lattice: JoinSemiLattice {
    /// The unit element of the meet operation, the largest element of the
    /// lattice.
    fn top(ctx: &Self::LatticeContext) -> Self;

    /// Computes the greatest lower bound of the two elements. Usually
    /// useful to exclude infeasible program states, e.g., to evaluate the
    /// conditions of branches.
    ///
    /// Requirements:
    /// * Reflexive: a.meet(a, ctx) == a
    /// * Commutative: a.meet(b, ctx) == b.meet(a, ctx)
    /// * Top is unit: top.meet(b, ctx) == b
    /// * Lower bound: a.meet(b, ctx) <= a and a.meet(b, ctx) <= b
    /// * Ordering is respected: a <= b => a.meet(b, ctx) == a
    fn meet(&self, other: &Self, ctx: &Self::LatticeContext) -> Self;
}

/////////////////////////////////////
// Concrete domain implementations //
/////////////////////////////////////

/// The unit lattice is useful for testing, as a placeholder, or as a
/// building block for larger lattices.
impl JoinSemiLattice for () {
    type LatticeContext = ();

    fn bottom(&(): &Self::LatticeContext) -> Self {}

    fn join(&self, &(): &Self, &(): &Self::LatticeContext) -> Self {}
}

impl Lattice for () {
    fn top(&(): &Self::LatticeContext) -> Self {}

    fn meet(&self, &(): &Self, &(): &Self::LatticeContext) -> Self {}
}

/// Bool is a lattice, where false is bottom and true is top, join is or,
/// meet is and.
impl JoinSemiLattice for bool {
    type LatticeContext = ();

    fn bottom(_ctx: &Self::LatticeContext) -> Self {
        false
    }

    fn join(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        *self || *other
    }
}

impl Lattice for bool {
    fn top(_ctx: &Self::LatticeContext) -> Self {
        true
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        *self && *other
    }
}

/// An efficient implementation of a power set lattice over a universe of
/// dense indices. The empty set is bottom, union is join, intersection is
/// meet, the full universe is top.
#[derive(PartialEq, Eq, Clone)]
pub struct BitSetDomain(pub FixedBitSet);

/// The size of the universe the bit set draws its elements from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitSetTop(pub usize);

impl BitSetDomain {
    pub fn from(ctx: &BitSetTop, values: &[usize]) -> Self {
        let mut inner = FixedBitSet::with_capacity(ctx.0);
        for &v in values {
            inner.insert(v);
        }
        Self(inner)
    }
}

impl Deref for BitSetDomain {
    type Target = FixedBitSet;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BitSetDomain {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl PartialOrd for BitSetDomain {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.is_superset(other), other.is_superset(self)) {
            (true, true) => Some(Ordering::Equal),
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            (_, _) => None,
        }
    }
}

impl Debug for BitSetDomain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let elements: Vec<String> = self.ones().map(|x| x.to_string()).collect();
        write!(f, "{{{}}}", elements.join(", "))
    }
}

impl JoinSemiLattice for BitSetDomain {
    type LatticeContext = BitSetTop;

    fn bottom(ctx: &Self::LatticeContext) -> Self {
        Self(FixedBitSet::with_capacity(ctx.0))
    }

    fn join(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        let mut result = self.clone();
        result.union_with(other);
        result
    }
}

impl Lattice for BitSetDomain {
    fn top(ctx: &Self::LatticeContext) -> Self {
        let mut result = FixedBitSet::with_capacity(ctx.0);
        result.toggle_range(..);
        Self(result)
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }
}

/// The order dual of a lattice: join becomes meet, bottom becomes top.
/// Useful for must-analyses like dominators where the starting value of
/// every node is the full universe and merging shrinks the sets.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Flipped<T: Lattice>(pub T);

impl<T: Lattice> PartialOrd for Flipped<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0).map(Ordering::reverse)
    }
}

impl<T: Lattice> Deref for Flipped<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Lattice> DerefMut for Flipped<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Lattice> JoinSemiLattice for Flipped<T> {
    type LatticeContext = T::LatticeContext;

    fn bottom(ctx: &Self::LatticeContext) -> Self {
        Self(T::top(ctx))
    }

    fn join(&self, other: &Self, ctx: &Self::LatticeContext) -> Self {
        Self(self.0.meet(&other.0, ctx))
    }
}

impl<T: Lattice> Lattice for Flipped<T> {
    fn top(ctx: &Self::LatticeContext) -> Self {
        Self(T::bottom(ctx))
    }

    fn meet(&self, other: &Self, ctx: &Self::LatticeContext) -> Self {
        Self(self.0.join(&other.0, ctx))
    }
}

/// The flat lattice over an arbitrary set of values:
///
/// ```txt
///         Top
///       / |  | \
///     v1 v2 v3 ...
///       \ |  | /
///        Bottom
/// ```
///
/// All values are incomparable; the only way up from a value is Top.
/// This is the shape of the classic constant propagation lattice.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Flat<T: Clone + Eq + Debug> {
    Bottom,
    Element(T),
    Top,
}

impl<T: Clone + Eq + Debug> PartialOrd for Flat<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self, other) {
            (Flat::Bottom, _) | (_, Flat::Top) => Some(Ordering::Less),
            (Flat::Top, _) | (_, Flat::Bottom) => Some(Ordering::Greater),
            _ => None,
        }
    }
}

impl<T: Clone + Eq + Debug> JoinSemiLattice for Flat<T> {
    type LatticeContext = ();

    fn bottom(_ctx: &Self::LatticeContext) -> Self {
        Flat::Bottom
    }

    fn join(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        match (self, other) {
            (Flat::Bottom, _) => other.clone(),
            (_, Flat::Bottom) => self.clone(),
            _ if self == other => self.clone(),
            _ => Flat::Top,
        }
    }
}

impl<T: Clone + Eq + Debug> Lattice for Flat<T> {
    fn top(_ctx: &Self::LatticeContext) -> Self {
        Flat::Top
    }

    fn meet(&self, other: &Self, _ctx: &Self::LatticeContext) -> Self {
        match (self, other) {
            (Flat::Top, _) => other.clone(),
            (_, Flat::Top) => self.clone(),
            _ if self == other => self.clone(),
            _ => Flat::Bottom,
        }
    }
}

/// A map lattice assigning an abstract value to each key. Keys that are
/// not present are implicitly bottom, so the empty map is the bottom
/// element and join is the pointwise join over the union of the key sets.
///
/// Invariant: the map never stores an explicit bottom value, insertions
/// of bottom are dropped. This keeps the representation canonical so
/// equality and ordering can be computed key by key.
#[derive(PartialEq, Eq, Clone)]
pub struct Map<K: Clone + Eq + Hash + Debug, D: JoinSemiLattice>(HashMap<K, D>);

/// Carries the lattice context of the value domain.
#[derive(Clone, Debug)]
pub struct MapCtx<K, D: JoinSemiLattice>(pub D::LatticeContext, PhantomData<K>);

impl<K, D: JoinSemiLattice> MapCtx<K, D> {
    pub fn new(value_ctx: D::LatticeContext) -> Self {
        Self(value_ctx, PhantomData)
    }
}

impl<K: Clone + Eq + Hash + Debug, D: JoinSemiLattice> Map<K, D> {
    pub fn get(&self, key: &K) -> Option<&D> {
        self.0.get(key)
    }

    /// The value of a key, bottom when the key is absent.
    pub fn get_or_bottom(&self, key: &K, ctx: &MapCtx<K, D>) -> D {
        self.0
            .get(key)
            .cloned()
            .unwrap_or_else(|| D::bottom(&ctx.0))
    }

    pub fn insert(&mut self, key: K, value: D, ctx: &MapCtx<K, D>) {
        if value == D::bottom(&ctx.0) {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &D)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Clone + Eq + Hash + Debug, D: JoinSemiLattice> PartialOrd for Map<K, D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.0 == other.0 {
            return Some(Ordering::Equal);
        }
        let less_eq = self
            .0
            .iter()
            .all(|(k, v)| other.0.get(k).is_some_and(|o| v <= o));
        let greater_eq = other
            .0
            .iter()
            .all(|(k, v)| self.0.get(k).is_some_and(|o| v >= o));
        match (less_eq, greater_eq) {
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            _ => None,
        }
    }
}

impl<K: Clone + Eq + Hash + Debug, D: JoinSemiLattice> Debug for Map<K, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut elements: Box<[String]> =
            self.0.iter().map(|(k, v)| format!("{k:?}: {v:?}")).collect();
        elements.sort_unstable();
        write!(f, "{{{}}}", elements.join(", "))
    }
}

impl<K: Clone + Eq + Hash + Debug, D: JoinSemiLattice> JoinSemiLattice for Map<K, D> {
    type LatticeContext = MapCtx<K, D>;

    fn bottom(_ctx: &Self::LatticeContext) -> Self {
        Self(HashMap::new())
    }

    fn join(&self, other: &Self, ctx: &Self::LatticeContext) -> Self {
        let mut result = self.clone();
        for (k, v) in &other.0 {
            match result.0.get_mut(k) {
                Some(prev) => *prev = prev.join(v, &ctx.0),
                None => {
                    result.0.insert(k.clone(), v.clone());
                }
            }
        }
        result
    }
}
