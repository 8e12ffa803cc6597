//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

/// A continuous variable of a linear program
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Identifier, unique within a problem
    pub id: String,
    /// Smallest value the variable can take, may be `f64::NEG_INFINITY`
    pub lower_bound: f64,
    /// Largest value the variable can take, may be `f64::INFINITY`
    pub upper_bound: f64,
    /// Position of the variable in its problem
    pub(crate) index: usize,
}

impl Variable {
    /// Create a new variable, its index is assigned when it is added to a problem
    pub fn new(id: &str, lower_bound: f64, upper_bound: f64) -> Variable {
        Variable {
            id: id.to_string(),
            lower_bound,
            upper_bound,
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} <= {} <= {}",
            self.lower_bound, self.id, self.upper_bound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let var = Variable::new("PFK", 0., 1000.);
        assert_eq!(format!("{}", var), "0 <= PFK <= 1000");
        assert_eq!(var.index(), 0);
        let unbounded = Variable::new("EX_glc__D_e", f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(format!("{}", unbounded), "-inf <= EX_glc__D_e <= inf");
    }
}
