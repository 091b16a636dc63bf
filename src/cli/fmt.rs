//! Print an expression in canonical form

use super::CliError;
use crate::parse;

pub fn execute_fmt(expression: &str) -> Result<String, CliError> {
    Ok(parse(expression)?.to_string())
}

#[test]
fn test_fmt_quotes_fields() {
    assert_eq!(execute_fmt("foo.bar[0]").unwrap(), r#""foo"."bar"[0]"#);
}
