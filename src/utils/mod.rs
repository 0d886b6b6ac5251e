/// Useful enumerations for collider types and vector kinds.
pub mod enums;
/// Concrete momentum value types ([`Vec4`](vectors::Vec4),
/// [`Vec2`](vectors::Vec2)) and the [`Momentum`](vectors::Momentum) enum over
/// them.
pub mod vectors;

/// Derive a display name for an input vector from one of its field
/// expressions by stripping a trailing component suffix (case-insensitively).
///
/// `default_vector_name("jet1Pt", "pt")` yields `"jet1"`; if the expression
/// does not end in the suffix it is returned unchanged.
pub fn default_vector_name(expression: &str, suffix: &str) -> String {
    let lower = expression.to_lowercase();
    if lower.ends_with(suffix) && expression.len() > suffix.len() {
        expression[..expression.len() - suffix.len()].to_string()
    } else {
        expression.to_string()
    }
}
