//! Behavioural tests for the engine as a whole: evaluation scenarios,
//! properties of the rule model and tree snapshots.


use std::sync::{Arc, Mutex};

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::{
    AstBuilder, CharacterClass, Cursor, Grammar, GrammarBuilder, LookaheadSink, MatchResult,
    ParseError, Rule, Span, Token, block, choice, class, literal, reference, sequence,
};

fn evaluate(rule: &Rule, source: &str) -> (Result<MatchResult, ParseError>, usize) {
    let mut cursor = Cursor::new(source);
    let result = rule.evaluate(&mut cursor, &mut LookaheadSink);
    assert_eq!(cursor.depth(), 0, "unbalanced checkpoints");
    (result, cursor.position())
}

fn parse_tree(grammar: &Grammar, source: &str) -> String {
    let outcome = grammar.parse(source);
    assert!(outcome.is_success(), "{:?}", outcome.errors);
    invariants::check(source, &outcome.tree);
    outcome.tree.pretty(source)
}

/// A block that records its name each time it is attempted, then matches
/// `text`.
fn recorded(name: &'static str, text: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Rule {
    let log = Arc::clone(log);
    let matcher = literal(text);
    block(name, move |cursor, ir| {
        if let Ok(mut log) = log.lock() {
            log.push(name);
        }
        matcher.test(cursor, ir)
    })
}

// Scenarios

#[test]
fn literal_matches_whole_input() {
    let (result, position) = evaluate(&literal("x"), "x");
    assert_eq!(result, Ok(MatchResult::Success(Span::new(0, 1))));
    assert_eq!(position, 1);
}

#[test]
fn digits_stop_at_first_letter() {
    let digits = class(CharacterClass::Digits).one_or_more();
    let mut cursor = Cursor::new("123abc");
    let result = digits.evaluate(&mut cursor, &mut LookaheadSink).unwrap();
    assert_eq!(result.span().map(|s| s.slice("123abc")), Some("123"));
    assert_eq!(cursor.position(), 3);
}

#[test]
fn sequence_with_structural_children() {
    let grammar = Grammar::new([
        sequence([literal("a").parse_as("a"), literal("b").parse_as("b")]).parse_as("ab"),
    ]);
    assert_snapshot!(parse_tree(&grammar, "ab"), @r#"
    root@0..2
      ab@0..2
        a@0..1 "a"
        b@1..2 "b"
    "#);
}

#[test]
fn sequence_with_scanning_children() {
    let grammar = Grammar::new([sequence([literal("a"), literal("b")]).parse_as("ab")]);
    assert_snapshot!(parse_tree(&grammar, "ab"), @r#"
    root@0..2
      ab@0..2 "ab"
    "#);
}

#[test]
fn choice_falls_through_to_second_alternative() {
    let grammar = Grammar::new([choice([literal("cat"), literal("car")]).parse_as("animal")]);
    let outcome = grammar.parse("car");
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.tree.children()[0].matched("car"), "car");
}

#[test]
fn exact_count_underflow_is_a_parsing_error() {
    let two_digits = class(CharacterClass::Digits).repeated(2, Some(2));
    let (result, position) = evaluate(&two_digits, "A");
    let err = result.unwrap_err();
    assert!(matches!(err, ParseError::Parsing { .. }));
    assert_eq!(err.message(), "expected digits{2}");
    assert_eq!(position, 0);
}

#[test]
fn custom_error_message_is_reported_verbatim() {
    let quote = literal("\"");
    let string = sequence([
        quote.clone(),
        sequence([quote.negated()]).zero_or_more(),
        quote.with_error("Missing terminating quote"),
    ]);
    let (result, _) = evaluate(&string, "\"abc");
    assert_eq!(result.unwrap_err().message(), "Missing terminating quote");

    let grammar = Grammar::new([string.parse_as("string")]);
    let outcome = grammar.parse("\"abc");
    assert_eq!(outcome.errors.len(), 1);
    let err = &outcome.errors[0];
    assert_eq!(err.message(), "Missing terminating quote");
    assert_eq!(err.location("\"abc"), (1, 5));
}

#[test]
fn annotated_message_survives_enclosing_structural_rules() {
    let quote = literal("\"");
    let string = sequence([
        quote.clone(),
        sequence([quote.negated()]).zero_or_more(),
        quote.with_error("Missing terminating quote"),
    ])
    .parse_as("string");
    let pair = sequence([literal("k="), string]).parse_as("pair");
    let pairs = sequence([pair]).repeated(2, None).parse_as("pairs");

    let outcome = Grammar::new([pairs]).parse("k=\"a\"k=\"b");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].message(), "Missing terminating quote");
    assert!(outcome.errors[0].is_annotated());
}

// Properties

#[rstest]
#[case(literal("x").optional())]
#[case(literal("x").zero_or_more())]
#[case(class(CharacterClass::Digits).zero_or_more().parse_as("digits"))]
fn optional_rule_failing_is_a_no_op(#[case] rule: Rule) {
    let mut ast = AstBuilder::new(Token::root());
    let mut cursor = Cursor::new("abc");
    let result = rule.evaluate(&mut cursor, &mut ast);
    assert_eq!(result, Ok(MatchResult::IgnorableFailure(0)));
    assert_eq!(cursor.position(), 0);
    assert!(ast.finish(Span::empty(0)).children().is_empty());
}

#[rstest]
#[case("12345", 5)]
#[case("12a45", 2)]
#[case("a12", 0)]
#[case("٣٤5x", 0)]
#[case("", 0)]
fn class_repetition_consumes_maximal_prefix(#[case] source: &str, #[case] expected: usize) {
    let digits = class(CharacterClass::Digits).zero_or_more();
    let (_, position) = evaluate(&digits, source);
    assert_eq!(position, expected);
}

#[test]
fn bounded_class_repetition_respects_maximum() {
    let digits = class(CharacterClass::Digits).repeated(0, Some(3));
    let (_, position) = evaluate(&digits, "123456");
    assert_eq!(position, 3);
}

#[test]
fn choice_tries_alternatives_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let animal = choice([recorded("cat", "cat", &log), recorded("car", "car", &log)]);
    let (result, _) = evaluate(&animal, "car");
    assert_eq!(result, Ok(MatchResult::Success(Span::new(0, 3))));
    assert_eq!(*log.lock().unwrap(), vec!["cat", "car"]);

    log.lock().unwrap().clear();
    let (result, _) = evaluate(&animal, "cat");
    assert!(result.is_ok());
    assert_eq!(*log.lock().unwrap(), vec!["cat"]);
}

#[rstest]
#[case("x")]
#[case("y")]
#[case("xx")]
#[case("")]
fn double_negation_is_identity(#[case] source: &str) {
    let rule = literal("x");
    assert_eq!(evaluate(&rule.negated().negated(), source), evaluate(&rule, source));
}

#[rstest]
#[case("ab")]
#[case("b")]
#[case("")]
fn lookahead_never_advances_or_builds(#[case] source: &str) {
    let peek = sequence([literal("a").parse_as("a"), literal("b")]).parse_as("ab").lookahead();
    let mut ast = AstBuilder::new(Token::root());
    let mut cursor = Cursor::new(source);
    let _ = peek.evaluate(&mut cursor, &mut ast);
    assert_eq!(cursor.position(), 0);
    assert!(ast.finish(Span::empty(0)).children().is_empty());
}

#[test]
fn quantified_lookahead_needs_every_repetition() {
    let peek = literal("a").repeated(2, Some(2)).lookahead();

    let (result, position) = evaluate(&peek, "ab");
    assert!(matches!(result, Err(ParseError::Parsing { .. })), "{result:?}");
    assert_eq!(position, 0);

    let (result, position) = evaluate(&peek, "aab");
    assert_eq!(result, Ok(MatchResult::Success(Span::empty(0))));
    assert_eq!(position, 0);
}

#[test]
fn reference_relabels_target_and_keeps_its_children() {
    let digit = class(CharacterClass::Digits).parse_as("digit");
    let number = sequence([digit]).one_or_more().parse_as("number");
    let grammar = Grammar::new([reference(number, "id")]);
    assert_snapshot!(parse_tree(&grammar, "42"), @r#"
    root@0..2
      id@0..2
        digit@0..1 "4"
        digit@1..2 "2"
    "#);
}

#[test]
fn negative_lookahead_guards_a_keyword() {
    let letters = class(CharacterClass::Letters);
    let keyword = sequence([literal("if"), letters.negated().lookahead()]).parse_as("keyword");
    let ident = letters.one_or_more().parse_as("ident");
    let space = literal(" ").skip();
    let grammar = Grammar::new([keyword, ident, space]);
    assert_snapshot!(parse_tree(&grammar, "if iffy"), @r#"
    root@0..7
      keyword@0..2 "if"
      ident@3..7 "iffy"
    "#);
}

#[test]
fn backtracked_alternatives_leave_no_nodes() {
    let a = literal("a").parse_as("a");
    let grammar = Grammar::new([choice([
        sequence([a.clone(), literal("x")]).parse_as("ax"),
        sequence([a, literal("y")]).parse_as("ay"),
    ])]);
    assert_snapshot!(parse_tree(&grammar, "ay"), @r#"
    root@0..2
      ay@0..2
        a@0..1 "a"
    "#);
}

#[test]
fn failed_repetition_drops_its_nodes() {
    let digit = class(CharacterClass::Digits).parse_as("digit");
    let pair = sequence([digit.clone(), digit]).parse_as("pair");
    let grammar = Grammar::new([
        sequence([pair.zero_or_more(), class(CharacterClass::Digits)]).parse_as("digits"),
    ]);
    assert_snapshot!(parse_tree(&grammar, "12345"), @r#"
    root@0..5
      digits@0..5
        pair@0..2
          digit@0..1 "1"
          digit@1..2 "2"
        pair@2..4
          digit@2..3 "3"
          digit@3..4 "4"
    "#);
}

#[test]
fn mutually_recursive_rules_nest() {
    // list := "(" item* ")"   item := atom | list
    let mut builder = GrammarBuilder::new();
    let list = builder
        .define("list", |b| {
            let item = b.define("item", |b| {
                let atom = b.pattern("[a-z]+")?.parse_as("atom");
                let list = b.declare("list");
                let space = literal(" ").skip();
                Ok(sequence([space.zero_or_more(), choice([atom, list])]))
            })?;
            Ok(sequence([literal("("), item.zero_or_more(), literal(")")]).parse_as("list"))
        })
        .unwrap();
    let grammar = builder.finish([list]).unwrap();

    assert_snapshot!(parse_tree(&grammar, "(a (b c) ())"), @r#"
    root@0..12
      list@0..12
        atom@1..2 "a"
        list@3..8
          atom@4..5 "b"
          atom@6..7 "c"
        list@9..11 "()"
    "#);
}

#[test]
fn void_and_transient_shape_the_tree() {
    let comment = sequence([literal("#"), sequence([literal("\n").negated()]).zero_or_more()])
        .parse_as("comment")
        .void();
    let word = class(CharacterClass::Letters).one_or_more().parse_as("word");
    let line = sequence([word.clone(), literal(" ").skip(), word])
        .parse_as("line")
        .transient();
    let newline = literal("\n").skip();
    let grammar = Grammar::new([comment, line, newline]);

    assert_snapshot!(parse_tree(&grammar, "# note\nab cd\n"), @r#"
    root@0..13
      word@7..9 "ab"
      word@10..12 "cd"
    "#);
}

#[test]
fn fatal_error_aborts_the_parse() {
    let statement = sequence([
        literal("let "),
        class(CharacterClass::Letters).one_or_more(),
        literal(";").with_error("missing semicolon").fatal(),
    ])
    .parse_as("let");
    let fallback = class(CharacterClass::Letters).one_or_more().parse_as("word");
    let grammar = Grammar::new([statement, fallback]);

    let outcome = grammar.parse("let x");
    assert_eq!(outcome.errors.len(), 1);
    let err = &outcome.errors[0];
    assert!(err.is_fatal());
    assert_eq!(err.message(), "missing semicolon");
    assert!(outcome.tree.children().is_empty());
}

#[test]
fn deepest_cause_points_at_the_real_problem() {
    let number = class(CharacterClass::Digits).one_or_more();
    let assignment = sequence([literal("x"), literal("="), number.clone()]).parse_as("assign");
    let call = sequence([literal("x"), literal("("), literal(")")]).parse_as("call");
    let grammar = Grammar::new([assignment, call]);

    let source = "x=y";
    let outcome = grammar.parse(source);
    let err = &outcome.errors[0];
    assert_eq!(err.causes().len(), 2);
    let deepest = err.deepest();
    assert_eq!(deepest, &ParseError::scanning(2, "digits"));
    assert_eq!(deepest.location(source), (1, 3));
}

#[test]
fn stream_is_lazy() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let item = recorded("item", "i", &log).parse_as("item");
    let grammar = Grammar::new([item]);

    let mut stream = grammar.stream("iii");
    let first = stream.next().unwrap();
    assert_eq!(first.span(), Span::new(0, 1));
    assert_eq!(log.lock().unwrap().len(), 1);

    let rest: Vec<Span> = stream.by_ref().map(|node| node.span()).collect();
    assert_eq!(rest, vec![Span::new(1, 2), Span::new(2, 3)]);
    assert!(stream.errors().is_empty());
    assert!(stream.is_finished());
}

#[test]
fn stream_reports_errors_after_last_node() {
    let grammar = Grammar::new([literal("a").parse_as("a")]);
    let mut stream = grammar.stream("aab");
    assert_eq!(stream.by_ref().count(), 2);
    let errors = stream.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), "expected a");
    assert_eq!(errors[0].deepest(), &ParseError::scanning(2, "\"a\""));
    assert_eq!(stream.position(), 2);
}

#[test]
fn stream_and_tree_agree() {
    let word = class(CharacterClass::Letters).one_or_more().parse_as("word");
    let grammar = Grammar::new([word, literal(",").skip()]);
    let source = "a,bc,def";
    let streamed: Vec<_> = grammar.stream(source).collect();
    assert_eq!(streamed, grammar.parse(source).tree.into_children());
}
