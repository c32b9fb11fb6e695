// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic message text. All messages are rendered at compile time except
//! the conversion failures, which are rendered when a line fails.

use crate::tokenizer::TokenKind;

pub(crate) fn invalid(name: &str, expected: &str, received: TokenKind) -> String {
    format!("invalid {name}, expected: {expected}, received: {received}")
}

pub(crate) fn impossible(name: &str, received: TokenKind) -> String {
    format!("impossible token received when reading the {name} - {received}")
}

pub(crate) fn impossible_at_start(received: TokenKind) -> String {
    format!("impossible token received in the start state - {received}")
}

pub(crate) fn unexpected_after(element: &str, received: TokenKind) -> String {
    format!("unexpected token received after describing a {element} - {received}")
}

/// `parameter a is not specified` / `parameters a, b are not specified`
pub(crate) fn not_specified(names: &[String]) -> String {
    match names {
        [one] => format!("parameter {one} is not specified"),
        _ => format!("parameters {} are not specified", names.join(", ")),
    }
}

pub(crate) fn missing_for(sub: &str, repetition: &str, element: &str) -> String {
    format!("the {sub} is not specified for the {repetition}, but is specified for the first {element}")
}

pub(crate) fn extra_for(sub: &str, repetition: &str, element: &str) -> String {
    format!("the {sub} is specified for the {repetition}, but is not specified for the first {element}")
}

pub(crate) fn not_supported(name: &str) -> String {
    format!("the {name} is not supported")
}

pub(crate) fn not_integer(name: &str) -> String {
    format!("failed to convert the token to an integer when reading the {name}")
}

pub(crate) fn not_float(name: &str) -> String {
    format!("failed to convert the token to a float when reading the {name}")
}

pub(crate) fn not_bool(name: &str) -> String {
    format!("the {name} parameter must take the values 'on' or 'off'")
}

pub(crate) fn not_variant(name: &str, variants: &[String]) -> String {
    let quoted: Vec<String> = variants.iter().map(|v| format!("'{v}'")).collect();
    format!(
        "the {name} parameter must take one of the values {}",
        quoted.join(", ")
    )
}

pub(crate) fn unsupported_element(name: &str) -> String {
    format!("unsupported element format - {name}")
}

pub(crate) fn bad_element_name() -> String {
    "error in the name of the element type".to_string()
}

// Names of positions inside a line.

pub(crate) fn delimiter_between(before: &str, after: &str) -> String {
    format!("delimiter between {before} and {after}")
}

pub(crate) fn token_after(name: &str) -> String {
    format!("token after {name}")
}

pub(crate) fn sub_of(sub: &str, composite: &str) -> String {
    format!("{sub} of the {composite}")
}

/// 1-based repetition name.
pub(crate) fn numbered(name: &str, index: usize) -> String {
    format!("{name} number {index}")
}

pub(crate) fn additional(name: &str) -> String {
    format!("additional {name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_specified_plural() {
        assert_eq!(
            not_specified(&["vertex number 3".to_string()]),
            "parameter vertex number 3 is not specified"
        );
        assert_eq!(
            not_specified(&["X coordinate".to_string(), "Y coordinate".to_string()]),
            "parameters X coordinate, Y coordinate are not specified"
        );
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            invalid("X coordinate", "FLOAT", TokenKind::Word),
            "invalid X coordinate, expected: FLOAT, received: WORD"
        );
    }
}
