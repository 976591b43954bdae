//! Conditional block predicates.
//!
//! `ifdef`, `ifndef` and `ifeval` blocks keep their predicate in the tree;
//! the renderer evaluates it against whatever attributes are in effect at
//! render time.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Read access to attribute values.
pub trait AttributeLookup {
    /// Value of `name`, or `None` when the attribute is not set.
    fn attribute(&self, name: &str) -> Option<&str>;
}

impl AttributeLookup for BTreeMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl AttributeLookup for HashMap<String, String> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Predicate of a conditional block.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// `ifdef::name[]`. `a,b` matches when any is set, `a+b` when all are.
    Ifdef(String),
    /// `ifndef::name[]`, with the same `,`/`+` forms.
    Ifndef(String),
    /// `ifeval::[lhs op rhs]`.
    Ifeval(Expression),
    /// Caller-supplied evaluator. Not serializable.
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(Predicate),
}

impl Condition {
    /// Evaluate against the given attributes.
    pub fn test(&self, lookup: &dyn AttributeLookup) -> bool {
        match self {
            Self::Ifdef(names) => is_defined(names, lookup),
            Self::Ifndef(names) => !is_defined(names, lookup),
            Self::Ifeval(expression) => expression.evaluate(lookup),
            Self::Custom(predicate) => predicate.test(lookup),
        }
    }
}

fn is_defined(names: &str, lookup: &dyn AttributeLookup) -> bool {
    if names.contains('+') {
        names
            .split('+')
            .map(str::trim)
            .all(|name| lookup.attribute(name).is_some())
    } else {
        names
            .split(',')
            .map(str::trim)
            .any(|name| lookup.attribute(name).is_some())
    }
}

/// Arbitrary evaluator for [`Condition::Custom`].
pub struct Predicate(Arc<dyn Fn(&dyn AttributeLookup) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&dyn AttributeLookup) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, lookup: &dyn AttributeLookup) -> bool {
        (self.0)(lookup)
    }
}

impl Clone for Predicate {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Comparison operator of an `ifeval` expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl Operator {
    fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Equal => ordering == Equal,
            Self::NotEqual => ordering != Equal,
            Self::LessThan => ordering == Less,
            Self::LessEqual => ordering != Greater,
            Self::GreaterThan => ordering == Greater,
            Self::GreaterEqual => ordering != Less,
        }
    }
}

/// One side of an `ifeval` comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// `{name}`, looked up at evaluation time.
    Attribute(String),
    String(String),
    Number(f64),
    Boolean(bool),
    Nil,
}

/// Parsed `ifeval` expression: `lhs op rhs`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    pub lhs: Operand,
    pub operator: Operator,
    pub rhs: Operand,
}

impl Expression {
    /// Evaluate the comparison.
    ///
    /// Numbers compare numerically, strings lexically, and a string that
    /// parses as a number is coerced when compared with a number. Booleans and
    /// nil only support `==`/`!=`; any other combination is false.
    pub fn evaluate(&self, lookup: &dyn AttributeLookup) -> bool {
        let lhs = resolve(&self.lhs, lookup);
        let rhs = resolve(&self.rhs, lookup);
        let op = self.operator;

        match (&lhs, &rhs) {
            (Operand::Number(a), Operand::Number(b)) => {
                a.partial_cmp(b).is_some_and(|ordering| op.matches(ordering))
            }
            (Operand::Number(a), Operand::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|b| a.partial_cmp(&b))
                .is_some_and(|ordering| op.matches(ordering)),
            (Operand::String(s), Operand::Number(b)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|a| a.partial_cmp(b))
                .is_some_and(|ordering| op.matches(ordering)),
            (Operand::String(a), Operand::String(b)) => op.matches(a.cmp(b)),
            _ => match op {
                Operator::Equal => lhs == rhs,
                Operator::NotEqual => lhs != rhs,
                _ => false,
            },
        }
    }
}

/// Replace attribute references with typed values.
fn resolve(operand: &Operand, lookup: &dyn AttributeLookup) -> Operand {
    let Operand::Attribute(name) = operand else {
        return operand.clone();
    };
    match lookup.attribute(name) {
        None => Operand::Nil,
        Some(value) if value.eq_ignore_ascii_case("true") => Operand::Boolean(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Operand::Boolean(false),
        Some(value) => value
            .parse::<f64>()
            .map_or_else(|_| Operand::String(value.to_owned()), Operand::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_ifdef_single() {
        let condition = Condition::Ifdef("flag".to_owned());
        assert!(condition.test(&attrs(&[("flag", "")])));
        assert!(!condition.test(&attrs(&[])));
    }

    #[test]
    fn test_ifdef_any_and_all() {
        let any = Condition::Ifdef("a,b".to_owned());
        let all = Condition::Ifdef("a+b".to_owned());
        let only_b = attrs(&[("b", "")]);

        assert!(any.test(&only_b));
        assert!(!all.test(&only_b));
        assert!(all.test(&attrs(&[("a", ""), ("b", "")])));
    }

    #[test]
    fn test_ifndef() {
        let condition = Condition::Ifndef("flag".to_owned());
        assert!(condition.test(&attrs(&[])));
        assert!(!condition.test(&attrs(&[("flag", "x")])));
    }

    #[test]
    fn test_ifeval_numbers() {
        let expression = Expression {
            lhs: Operand::Attribute("level".to_owned()),
            operator: Operator::GreaterThan,
            rhs: Operand::Number(2.0),
        };
        assert!(expression.evaluate(&attrs(&[("level", "3")])));
        assert!(!expression.evaluate(&attrs(&[("level", "1")])));
        assert!(!expression.evaluate(&attrs(&[])));
    }

    #[test]
    fn test_ifeval_strings() {
        let expression = Expression {
            lhs: Operand::Attribute("backend".to_owned()),
            operator: Operator::Equal,
            rhs: Operand::String("html5".to_owned()),
        };
        assert!(expression.evaluate(&attrs(&[("backend", "html5")])));
        assert!(!expression.evaluate(&attrs(&[("backend", "pdf")])));
    }

    #[test]
    fn test_ifeval_nil() {
        let expression = Expression {
            lhs: Operand::Attribute("missing".to_owned()),
            operator: Operator::Equal,
            rhs: Operand::Nil,
        };
        assert!(expression.evaluate(&attrs(&[])));
    }

    #[test]
    fn test_ifeval_boolean_ordering_is_false() {
        let expression = Expression {
            lhs: Operand::Boolean(true),
            operator: Operator::LessThan,
            rhs: Operand::Boolean(false),
        };
        assert!(!expression.evaluate(&attrs(&[])));
    }

    #[test]
    fn test_custom_predicate() {
        let condition = Condition::Custom(Predicate::new(|lookup| {
            lookup.attribute("mode") == Some("dark")
        }));
        assert!(condition.test(&attrs(&[("mode", "dark")])));
        assert!(!condition.test(&attrs(&[("mode", "light")])));
        assert_eq!(condition.clone(), condition);
    }
}
