//! Binary quadratic model.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CorridorError;
use crate::models::OneHotViolation;

/// One binary decision: "vehicle `vehicle_id` takes candidate `route_index`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {
    /// Owning vehicle (the one-hot group).
    pub vehicle_id: usize,
    /// Candidate index within the vehicle.
    pub route_index: usize,
}

impl Variable {
    /// Creates a variable label.
    pub fn new(vehicle_id: usize, route_index: usize) -> Self {
        Self {
            vehicle_id,
            route_index,
        }
    }
}

/// Variables of one vehicle, of which exactly one should be 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotGroup {
    /// Vehicle owning the group.
    pub vehicle_id: usize,
    /// Variable indices in ascending route order.
    pub members: Vec<usize>,
}

/// An immutable QUBO instance:
///
/// ```text
/// E(x) = offset + Σ_i h_i x_i + Σ_{i<j} J_ij x_i x_j,   x ∈ {0,1}ⁿ
/// ```
///
/// Variables are indexed `0..n` in ascending `(vehicle_id, route_index)`
/// order, which also fixes the lexicographic tie-break used when ranking
/// samples. One-hot groups are derived from the variable labels.
///
/// # Examples
///
/// ```
/// use u_corridor::qubo::{BinaryQuadraticModel, Variable};
///
/// let vars = vec![Variable::new(0, 0), Variable::new(0, 1)];
/// let bqm = BinaryQuadraticModel::new(vars, vec![-1.0, -2.0], vec![(0, 1, 4.0)], 1.0).unwrap();
/// assert_eq!(bqm.energy(&[false, true]), -1.0);
/// assert_eq!(bqm.energy(&[true, true]), 2.0);
/// assert!(bqm.is_feasible(&[false, true]));
/// assert!(!bqm.is_feasible(&[true, true]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel {
    variables: Vec<Variable>,
    index: HashMap<Variable, usize>,
    linear: Vec<f64>,
    quadratic: BTreeMap<(usize, usize), f64>,
    offset: f64,
    adjacency: Vec<Vec<(usize, f64)>>,
    groups: Vec<OneHotGroup>,
}

impl BinaryQuadraticModel {
    /// Creates a model from labelled variables, per-variable linear biases,
    /// `(i, j, J)` interactions and a constant offset.
    ///
    /// Variables are reordered ascending; interactions on the same pair are
    /// summed and zero interactions dropped. Fails on duplicate labels,
    /// mismatched lengths, out-of-range or diagonal interaction indices, or
    /// non-finite coefficients.
    pub fn new(
        variables: Vec<Variable>,
        linear: Vec<f64>,
        quadratic: Vec<(usize, usize, f64)>,
        offset: f64,
    ) -> Result<Self, CorridorError> {
        let invalid = |msg: String| Err(CorridorError::InvalidConfiguration(msg));
        let n = variables.len();
        if linear.len() != n {
            return invalid(format!("{} linear biases for {n} variables", linear.len()));
        }
        if !offset.is_finite() || linear.iter().any(|h| !h.is_finite()) {
            return invalid("non-finite linear bias or offset".to_string());
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| variables[i]);
        let mut remap = vec![0; n];
        for (new, &old) in order.iter().enumerate() {
            remap[old] = new;
        }

        let sorted: Vec<Variable> = order.iter().map(|&i| variables[i]).collect();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return invalid(format!(
                "duplicate variable (vehicle {}, route {})",
                w[0].vehicle_id, w[0].route_index
            ));
        }
        let linear: Vec<f64> = order.iter().map(|&i| linear[i]).collect();

        let mut q: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (i, j, bias) in quadratic {
            if i >= n || j >= n || i == j {
                return invalid(format!("invalid interaction ({i}, {j})"));
            }
            if !bias.is_finite() {
                return invalid(format!("non-finite interaction ({i}, {j})"));
            }
            let (a, b) = (remap[i].min(remap[j]), remap[i].max(remap[j]));
            *q.entry((a, b)).or_insert(0.0) += bias;
        }
        q.retain(|_, bias| *bias != 0.0);

        let mut adjacency = vec![Vec::new(); n];
        for (&(i, j), &bias) in &q {
            adjacency[i].push((j, bias));
            adjacency[j].push((i, bias));
        }

        let mut groups: Vec<OneHotGroup> = Vec::new();
        for (i, var) in sorted.iter().enumerate() {
            match groups.last_mut() {
                Some(g) if g.vehicle_id == var.vehicle_id => g.members.push(i),
                _ => groups.push(OneHotGroup {
                    vehicle_id: var.vehicle_id,
                    members: vec![i],
                }),
            }
        }

        let index = sorted.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        Ok(Self {
            variables: sorted,
            index,
            linear,
            quadratic: q,
            offset,
            adjacency,
            groups,
        })
    }

    /// Number of binary variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Number of nonzero interactions.
    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    /// Variable labels in index order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Index of a labelled variable.
    pub fn index_of(&self, variable: Variable) -> Option<usize> {
        self.index.get(&variable).copied()
    }

    /// Linear bias of variable `i`.
    pub fn linear(&self, i: usize) -> f64 {
        self.linear[i]
    }

    /// Interaction between `i` and `j` (either order), zero if absent.
    pub fn quadratic(&self, i: usize, j: usize) -> f64 {
        let key = (i.min(j), i.max(j));
        self.quadratic.get(&key).copied().unwrap_or(0.0)
    }

    /// Iterates `(i, j, J)` with `i < j` in ascending order.
    pub fn interactions(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.quadratic.iter().map(|(&(i, j), &b)| (i, j, b))
    }

    /// Neighbours of variable `i` with their interaction strength.
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.adjacency[i]
    }

    /// Constant energy offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// One-hot groups in ascending vehicle order.
    pub fn groups(&self) -> &[OneHotGroup] {
        &self.groups
    }

    /// Energy of an assignment.
    ///
    /// # Panics
    ///
    /// Panics if `bits.len()` differs from the number of variables.
    pub fn energy(&self, bits: &[bool]) -> f64 {
        assert_eq!(bits.len(), self.num_variables(), "assignment length");
        let mut e = self.offset;
        for (i, &h) in self.linear.iter().enumerate() {
            if bits[i] {
                e += h;
            }
        }
        for (&(i, j), &b) in &self.quadratic {
            if bits[i] && bits[j] {
                e += b;
            }
        }
        e
    }

    /// Local field `h_i + Σ_j J_ij x_j` of variable `i`.
    pub fn local_field(&self, bits: &[bool], i: usize) -> f64 {
        self.linear[i]
            + self.adjacency[i]
                .iter()
                .filter(|&&(j, _)| bits[j])
                .map(|&(_, b)| b)
                .sum::<f64>()
    }

    /// Energy change from flipping variable `i`.
    pub fn flip_delta(&self, bits: &[bool], i: usize) -> f64 {
        let field = self.local_field(bits, i);
        if bits[i] {
            -field
        } else {
            field
        }
    }

    /// Returns `true` iff every group has exactly one variable set.
    pub fn is_feasible(&self, bits: &[bool]) -> bool {
        self.groups
            .iter()
            .all(|g| g.members.iter().filter(|&&i| bits[i]).count() == 1)
    }

    /// Groups whose one-hot constraint is violated.
    pub fn violations(&self, bits: &[bool]) -> Vec<OneHotViolation> {
        self.groups
            .iter()
            .filter_map(|g| {
                let selected: Vec<usize> = g
                    .members
                    .iter()
                    .filter(|&&i| bits[i])
                    .map(|&i| self.variables[i].route_index)
                    .collect();
                (selected.len() != 1).then_some(OneHotViolation {
                    vehicle_id: g.vehicle_id,
                    selected,
                })
            })
            .collect()
    }

    /// Labels of the variables set to 1.
    pub fn selected(&self, bits: &[bool]) -> Vec<Variable> {
        self.variables
            .iter()
            .zip(bits)
            .filter(|&(_, &b)| b)
            .map(|(&v, _)| v)
            .collect()
    }
}
