//! `ifeval` expression parsing.
//!
//! Expressions have the form `lhs operator rhs` where each side is an
//! attribute reference (`{name}`), a quoted string, a number, `true`,
//! `false` or `nil`. Evaluation happens at render time.

use adoc_model::{Expression, Operand, Operator};

/// Parse an `ifeval` expression. Returns `None` when no operator is found.
pub(crate) fn parse_expression(expr: &str) -> Option<Expression> {
    let (lhs, operator, rhs) = split_operator(expr.trim())?;
    let lhs = lhs.trim();
    let rhs = rhs.trim();
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some(Expression {
        lhs: parse_operand(lhs),
        operator,
        rhs: parse_operand(rhs),
    })
}

fn split_operator(expr: &str) -> Option<(&str, Operator, &str)> {
    // Two-character operators first so `<=` is not read as `<`.
    for (token, operator) in [
        ("==", Operator::Equal),
        ("!=", Operator::NotEqual),
        ("<=", Operator::LessEqual),
        (">=", Operator::GreaterEqual),
    ] {
        if let Some(pos) = expr.find(token) {
            return Some((&expr[..pos], operator, &expr[pos + 2..]));
        }
    }
    for (token, operator) in [('<', Operator::LessThan), ('>', Operator::GreaterThan)] {
        if let Some(pos) = expr.find(token) {
            return Some((&expr[..pos], operator, &expr[pos + 1..]));
        }
    }
    None
}

fn parse_operand(value: &str) -> Operand {
    if let Some(name) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        return Operand::Attribute(name.trim().to_owned());
    }
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        let inner = &value[1..value.len() - 1];
        if let Some(name) = inner.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
            return Operand::Attribute(name.trim().to_owned());
        }
        return Operand::String(inner.to_owned());
    }
    if value.eq_ignore_ascii_case("true") {
        return Operand::Boolean(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Operand::Boolean(false);
    }
    if value.eq_ignore_ascii_case("nil") || value.eq_ignore_ascii_case("null") {
        return Operand::Nil;
    }
    value
        .parse::<f64>()
        .map_or_else(|_| Operand::String(value.to_owned()), Operand::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_attribute_comparison() {
        let expression = parse_expression("{sectnumlevels} >= 3").unwrap();
        assert_eq!(
            expression,
            Expression {
                lhs: Operand::Attribute("sectnumlevels".to_owned()),
                operator: Operator::GreaterEqual,
                rhs: Operand::Number(3.0),
            }
        );
    }

    #[test]
    fn test_parse_quoted_string() {
        let expression = parse_expression(r#""{backend}" == "html5""#).unwrap();
        assert_eq!(expression.lhs, Operand::Attribute("backend".to_owned()));
        assert_eq!(expression.operator, Operator::Equal);
        assert_eq!(expression.rhs, Operand::String("html5".to_owned()));
    }

    #[test]
    fn test_parse_single_char_operator() {
        let expression = parse_expression("{level} < 2").unwrap();
        assert_eq!(expression.operator, Operator::LessThan);
    }

    #[test]
    fn test_parse_literals() {
        let expression = parse_expression("true != nil").unwrap();
        assert_eq!(expression.lhs, Operand::Boolean(true));
        assert_eq!(expression.rhs, Operand::Nil);
    }

    #[test]
    fn test_invalid_expression() {
        assert!(parse_expression("{flag}").is_none());
        assert!(parse_expression("== 2").is_none());
        assert!(parse_expression("").is_none());
    }
}
