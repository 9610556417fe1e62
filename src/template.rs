// $NAME / ${NAME} expansion for chart configs given on the command line

use crate::error::{PlotError, PlotResult};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

pub fn expand_variables(input: &str, variables: &HashMap<String, String>) -> PlotResult<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            output.push(c);
            continue;
        }

        let var_name = if chars.peek() == Some(&'{') {
            chars.next();
            let name = consume_identifier(&mut chars);
            if chars.next() != Some('}') {
                return Err(PlotError::config(
                    "template",
                    format!("unterminated '${{{}' in template", name),
                ));
            }
            if name.is_empty() {
                return Err(PlotError::config("template", "empty '${}' in template"));
            }
            name
        } else {
            consume_identifier(&mut chars)
        };

        if var_name.is_empty() {
            // Lone $, kept as is
            output.push('$');
            continue;
        }

        match variables.get(&var_name) {
            Some(val) => output.push_str(val),
            None => {
                return Err(PlotError::config(
                    "template",
                    format!("variable '${}' not defined", var_name),
                ))
            }
        }
    }

    Ok(output)
}

/// Parse `NAME=VALUE` definitions, as given with `-D`.
pub fn parse_definitions<S: AsRef<str>>(definitions: &[S]) -> PlotResult<HashMap<String, String>> {
    let mut variables = HashMap::new();
    for def in definitions {
        let def = def.as_ref();
        let (name, value) = def.split_once('=').ok_or_else(|| {
            PlotError::config("define", format!("expected NAME=VALUE, got '{}'", def))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PlotError::config("define", format!("missing name in '{}'", def)));
        }
        variables.insert(name.to_string(), value.to_string());
    }
    Ok(variables)
}

fn consume_identifier(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    // Identifiers start with alpha or _
    if let Some(&c) = chars.peek() {
        if !c.is_alphabetic() && c != '_' {
            return name;
        }
    }

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expansion() {
        let vars = vars(&[("col", "animal"), ("kind", "bar")]);
        let input = r#"{"kind": "$kind", "count": "$col"}"#;
        let output = expand_variables(input, &vars).unwrap();
        assert_eq!(output, r#"{"kind": "bar", "count": "animal"}"#);
    }

    #[test]
    fn test_braced_expansion() {
        let vars = vars(&[("year", "2011")]);
        let output = expand_variables("Processes in ${year}s", &vars).unwrap();
        assert_eq!(output, "Processes in 2011s");
    }

    #[test]
    fn test_lone_dollar() {
        let output = expand_variables("Cost ($)", &HashMap::new()).unwrap();
        assert_eq!(output, "Cost ($)");
    }

    #[test]
    fn test_undefined_variable() {
        let err = expand_variables("{\"title\": \"$missing\"}", &HashMap::new()).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_unterminated_brace() {
        let vars = vars(&[("a", "1")]);
        assert!(expand_variables("${a", &vars).is_err());
    }

    #[test]
    fn test_parse_definitions() {
        let parsed = parse_definitions(&["col=animal", "title=Count = total"]).unwrap();
        assert_eq!(parsed["col"], "animal");
        assert_eq!(parsed["title"], "Count = total");
        assert!(parse_definitions(&["novalue"]).is_err());
        assert!(parse_definitions(&["=x"]).is_err());
    }
}
