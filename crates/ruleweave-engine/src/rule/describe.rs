//! Compact grammar-like notation for rules, used in error messages and logs.
//!
//! | rule                      | shown as      |
//! |---------------------------|---------------|
//! | structural                | `token`       |
//! | literal                   | `"x"`         |
//! | character class / pattern | `digits`, `/[a-z]+/` |
//! | sequence / choice         | `(a b)`, `(a \| b)` |
//! | cyclic reference          | rule name     |
//! | negated / lookahead / skipping | `!r`, `>>r`, `-r` |
//!
//! Cardinality follows the body: `?`, `*`, `+`, `{n}`, `{n,m}`.

use std::fmt;

use crate::behaviour::Kind;
use crate::rule::{Matcher, Rule, RuleNode};

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let behaviour = self.behaviour();
        if behaviour.negate {
            f.write_str("!")?;
        }
        if behaviour.lookahead {
            f.write_str(">>")?;
        }
        match &behaviour.kind {
            Kind::Structural(token) => write!(f, "{token}")?,
            Kind::Skipping => {
                f.write_str("-")?;
                write_body(self, f)?;
            }
            Kind::Scanning => write_body(self, f)?,
        }
        write!(f, "{}", behaviour.cardinality)
    }
}

fn write_body(rule: &Rule, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let def = match rule.node() {
        RuleNode::Cyclic(cyclic) => return f.write_str(cyclic.stub().name()),
        RuleNode::Defined(def) => def,
    };
    match &def.matcher {
        Matcher::Terminal(terminal) => write!(f, "{terminal}"),
        Matcher::Sequence(rules) => write_list(f, rules, " "),
        Matcher::Choice(rules) => write_list(f, rules, " | "),
        Matcher::Reference(target) => write!(f, "{target}"),
        Matcher::Block { name, .. } => f.write_str(name),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, rules: &[Rule], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{rule}")?;
    }
    f.write_str(")")
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule({self})")
    }
}

#[cfg(test)]
mod tests {
    use crate::rule::{Rule, RuleCache, block, choice, class, literal, reference, sequence};
    use crate::terminal::CharacterClass;
    use rstest::rstest;

    #[rstest]
    #[case(literal("x"), r#""x""#)]
    #[case(class(CharacterClass::Digits).one_or_more(), "digits+")]
    #[case(literal("x").parse_as("ex").optional(), "ex?")]
    #[case(sequence([literal("a"), literal("b")]), r#"("a" "b")"#)]
    #[case(choice([literal("a"), literal("b").zero_or_more()]), r#"("a" | "b"*)"#)]
    #[case(literal("x").negated(), r#"!"x""#)]
    #[case(literal("x").lookahead(), r#">>"x""#)]
    #[case(literal(" ").skip(), r#"-" ""#)]
    #[case(literal("x").repeated(2, Some(3)), r#""x"{2,3}"#)]
    #[case(reference(literal("x"), "ex").scan(), r#""x""#)]
    #[case(block("custom", |_, _| Ok(())), "custom")]
    fn notation(#[case] rule: Rule, #[case] expected: &str) {
        assert_eq!(rule.to_string(), expected);
    }

    #[test]
    fn cyclic_references_show_their_name() {
        let mut rules = RuleCache::new();
        let value = rules.declare("value").one_or_more();
        assert_eq!(value.to_string(), "value+");
        assert_eq!(format!("{value:?}"), "Rule(value+)");
    }
}
