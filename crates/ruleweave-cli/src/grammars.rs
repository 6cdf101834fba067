//! Grammars bundled with the command-line front end.

use anyhow::{Result, bail};
use ruleweave_engine::{
    CharacterClass, Grammar, GrammarBuilder, GrammarError, Rule, choice, class, literal, sequence,
};

pub const NAMES: [&str; 3] = ["json", "arithmetic", "csv"];

pub fn by_name(name: &str) -> Result<Grammar> {
    let grammar = match name {
        "json" => json()?,
        "arithmetic" => arithmetic()?,
        "csv" => csv(),
        _ => bail!(
            "Unknown grammar `{name}` (available: {})",
            NAMES.join(", ")
        ),
    };
    log::debug!("using grammar `{name}`: {grammar:?}");
    Ok(grammar)
}

fn blank() -> Rule {
    class(CharacterClass::WhitespacesAndNewlines)
        .zero_or_more()
        .skip()
}

fn layout() -> Rule {
    class(CharacterClass::WhitespacesAndNewlines)
        .one_or_more()
        .skip()
}

/// `open (item ("," item)*)? close` with blanks between tokens.
fn delimited(open: &str, item: Rule, close: &str) -> Rule {
    let rest = sequence([blank(), literal(","), blank(), item.clone()]).zero_or_more();
    sequence([
        literal(open),
        blank(),
        sequence([item, rest]).optional(),
        blank(),
        literal(close).with_error(format!("expected `,` or `{close}`")),
    ])
}

/// A sequence of JSON values separated by whitespace.
pub fn json() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new();
    let value = b.define("value", |b| {
        let nested = b.declare("value");

        let escape = sequence([
            literal("\\"),
            choice([
                class(CharacterClass::set("\"\\/bfnrt")),
                sequence([literal("u"), class(CharacterClass::HexDigits).repeated(4, Some(4))]),
            ])
            .with_error("invalid escape sequence")
            .fatal(),
        ]);
        let plain = class(CharacterClass::union([
            CharacterClass::set("\"\\"),
            CharacterClass::Newlines,
        ]))
        .negated();
        let string = sequence([
            literal("\""),
            choice([escape, plain]).zero_or_more(),
            literal("\"").with_error("unterminated string").fatal(),
        ])
        .parse_as("string");

        let number = b
            .pattern(r"-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?")?
            .parse_as("number");
        let keyword = |text: &str| literal(text).parse_as(text);

        let member = sequence([
            string.clone(),
            blank(),
            literal(":").with_error("expected `:`"),
            blank(),
            nested.clone(),
        ])
        .parse_as("member");

        Ok(choice([
            delimited("{", member, "}").parse_as("object"),
            delimited("[", nested, "]").parse_as("array"),
            string,
            number,
            keyword("true"),
            keyword("false"),
            keyword("null"),
        ]))
    })?;
    Ok(b.finish([layout(), value])?.with_root("document"))
}

/// Arithmetic expressions with the usual precedence:
///
/// ```text
/// sum     := product (("+" | "-") product)*
/// product := factor (("*" | "/" | "%") factor)*
/// factor  := number | "(" sum ")" | "-" factor
/// ```
pub fn arithmetic() -> Result<Grammar, GrammarError> {
    let mut b = GrammarBuilder::new();
    let sum = b.define("sum", |b| {
        let product = b.define("product", |b| {
            let factor = b.define("factor", |b| {
                let sum = b.declare("sum");
                let factor = b.declare("factor");
                let number = b.pattern(r"[0-9]+(?:\.[0-9]+)?")?.parse_as("number");
                let group = sequence([
                    literal("("),
                    blank(),
                    sum,
                    blank(),
                    literal(")").with_error("unbalanced parenthesis").fatal(),
                ])
                .parse_as("group");
                let negation = sequence([literal("-"), blank(), factor]).parse_as("negation");
                Ok(choice([number, group, negation]).with_error("expected an operand"))
            })?;
            Ok(operation(factor, "*/%").parse_as("product"))
        })?;
        Ok(operation(product, "+-").parse_as("sum"))
    })?;
    Ok(b.finish([layout(), sum])?.with_root("program"))
}

fn operation(operand: Rule, operators: &str) -> Rule {
    let operator = class(CharacterClass::set(operators)).parse_as("operator");
    sequence([
        operand.clone(),
        sequence([blank(), operator, blank(), operand]).zero_or_more(),
    ])
}

/// Comma separated records, one per line. Quoted fields may contain
/// separators, line breaks and doubled quotes.
pub fn csv() -> Grammar {
    let quote = literal("\"");
    let quoted = sequence([
        quote.clone(),
        choice([literal("\"\""), quote.negated()]).zero_or_more(),
        quote.with_error("unterminated quoted field").fatal(),
    ]);
    let bare = sequence([class(CharacterClass::set("\",\r\n")).negated()]).one_or_more();
    let field = choice([quoted, bare]).parse_as("field");
    let record = sequence([
        field.optional(),
        sequence([literal(","), field.optional()]).zero_or_more(),
    ])
    .parse_as("record");
    let newline = class(CharacterClass::Newlines).one_or_more().skip();
    Grammar::new([newline, record]).with_root("table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn tree(grammar: &Grammar, source: &str) -> String {
        let outcome = grammar.parse(source);
        assert!(outcome.is_success(), "{:?}", outcome.errors);
        outcome.tree.pretty(source)
    }

    #[test]
    fn every_name_builds() {
        for name in NAMES {
            assert!(by_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn unknown_name() {
        let err = by_name("yaml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown grammar `yaml` (available: json, arithmetic, csv)"
        );
    }

    #[test]
    fn json_document() {
        let source = r#"{"a": [1, true]}"#;
        assert_snapshot!(tree(&json().unwrap(), source), @r#"
        document@0..16
          object@0..16
            member@1..15
              string@1..4 "\"a\""
              array@6..15
                number@7..8 "1"
                true@10..14 "true"
        "#);
    }

    #[rstest]
    #[case(r#""tab\there""#)]
    #[case(r#""é""#)]
    #[case("[]")]
    #[case("[ ]")]
    #[case("{}")]
    #[case("-12.5e3")]
    #[case(r#"[null, false, {"k": [[]]}]"#)]
    #[case("1 2\n3")]
    fn json_accepts(#[case] source: &str) {
        assert!(json().unwrap().parse(source).is_success(), "{source}");
    }

    #[rstest]
    #[case(r#""open"#, "unterminated string", 5)]
    #[case(r#""bad \q""#, "invalid escape sequence", 6)]
    fn json_fatal_errors(#[case] source: &str, #[case] message: &str, #[case] at: usize) {
        let outcome = json().unwrap().parse(source);
        assert_eq!(outcome.errors.len(), 1);
        let err = &outcome.errors[0];
        assert!(err.is_fatal());
        assert_eq!(err.message(), message);
        assert_eq!(err.span().start, at);
    }

    #[test]
    fn json_missing_bracket() {
        let outcome = json().unwrap().parse("[1, 2");
        assert_eq!(outcome.errors.len(), 1);
        assert!(
            outcome.errors[0]
                .flatten()
                .iter()
                .any(|e| e.message() == "expected `,` or `]`")
        );
    }

    #[test]
    fn arithmetic_precedence() {
        let source = "1 + 2*3";
        assert_snapshot!(tree(&arithmetic().unwrap(), source), @r#"
        program@0..7
          sum@0..7
            product@0..1
              number@0..1 "1"
            operator@2..3 "+"
            product@4..7
              number@4..5 "2"
              operator@5..6 "*"
              number@6..7 "3"
        "#);
    }

    #[test]
    fn arithmetic_groups_and_negation() {
        let source = "-(4)";
        assert_snapshot!(tree(&arithmetic().unwrap(), source), @r#"
        program@0..4
          sum@0..4
            product@0..4
              negation@0..4
                group@1..4
                  sum@2..3
                    product@2..3
                      number@2..3 "4"
        "#);
    }

    #[test]
    fn arithmetic_unbalanced() {
        let outcome = arithmetic().unwrap().parse("(1 + 2");
        assert_eq!(outcome.errors.len(), 1);
        let err = &outcome.errors[0];
        assert!(err.is_fatal());
        assert_eq!(err.message(), "unbalanced parenthesis");
        assert_eq!(err.location("(1 + 2"), (1, 7));
    }

    #[test]
    fn csv_records() {
        let source = "a,\"b\"\"c\"\n1,2\n";
        assert_snapshot!(tree(&csv(), source), @r#"
        table@0..13
          record@0..8
            field@0..1 "a"
            field@2..8 "\"b\"\"c\""
          record@9..12
            field@9..10 "1"
            field@11..12 "2"
        "#);
    }

    #[test]
    fn csv_empty_fields_have_no_node() {
        let source = "a,,b";
        let outcome = csv().parse(source);
        assert!(outcome.is_success(), "{:?}", outcome.errors);
        let fields: Vec<&str> = outcome.tree.children()[0]
            .children()
            .iter()
            .map(|field| field.matched(source))
            .collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn csv_unterminated_quote() {
        let outcome = csv().parse("x\n\"open,");
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message(), "unterminated quoted field");
        assert_eq!(outcome.errors[0].location("x\n\"open,"), (2, 7));
    }
}
