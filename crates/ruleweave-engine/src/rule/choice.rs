use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::ir::IntermediateRepresentation;
use crate::rule::{MatchResult, Rule};
use crate::span::Span;

/// Outcome of trying alternatives in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chosen {
    Matched(MatchResult),
    /// Nothing matched, but at least one alternative was allowed to match
    /// nothing.
    Absent,
}

/// Evaluates `rules` in order and stops at the first success.
///
/// Fatal errors are returned immediately. When every alternative fails their
/// errors are combined into one, with the individual failures as causes.
pub(crate) fn first_match(
    rules: &[Rule],
    cursor: &mut Cursor<'_>,
    ir: &mut dyn IntermediateRepresentation,
) -> Result<Chosen, ParseError> {
    let start = cursor.position();
    let mut optional = false;
    let mut causes = Vec::new();
    for rule in rules {
        match rule.evaluate(cursor, ir) {
            Ok(MatchResult::IgnorableFailure(_)) => optional = true,
            Ok(result) => return Ok(Chosen::Matched(result)),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => causes.push(error),
        }
    }
    if optional {
        return Ok(Chosen::Absent);
    }
    log::trace!("no alternative matched at {start} ({} tried)", rules.len());
    Err(combine(start, causes))
}

fn combine(start: usize, mut causes: Vec<ParseError>) -> ParseError {
    if causes.len() == 1 {
        if let Some(only) = causes.pop() {
            return only;
        }
    }
    let end = causes
        .iter()
        .map(|cause| cause.span().end)
        .max()
        .unwrap_or(start)
        .max(start);
    ParseError::parsing(Span::new(start, end), "no rule matched", causes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::LookaheadSink;
    use crate::rule::{choice, literal};
    use pretty_assertions::assert_eq;

    #[test]
    fn first_success_wins() {
        let rules = [literal("ca"), literal("cat")];
        let mut cursor = Cursor::new("cat");
        let chosen = first_match(&rules, &mut cursor, &mut LookaheadSink).unwrap();
        assert_eq!(chosen, Chosen::Matched(MatchResult::Success(Span::new(0, 2))));
    }

    #[test]
    fn optional_alternative_makes_choice_succeed() {
        let rules = [literal("a"), literal("b").optional()];
        let mut cursor = Cursor::new("c");
        let chosen = first_match(&rules, &mut cursor, &mut LookaheadSink).unwrap();
        assert_eq!(chosen, Chosen::Absent);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn failures_are_combined() {
        let either = choice([literal("a"), literal("b")]);
        let mut cursor = Cursor::new("c");
        let err = either.evaluate(&mut cursor, &mut LookaheadSink).unwrap_err();
        assert_eq!(err.message(), "no rule matched");
        assert_eq!(
            err.causes(),
            &[
                ParseError::scanning(0, "\"a\""),
                ParseError::scanning(0, "\"b\"")
            ]
        );
    }

    #[test]
    fn single_failure_is_not_wrapped() {
        let only = choice([literal("a")]);
        let mut cursor = Cursor::new("c");
        let err = only.evaluate(&mut cursor, &mut LookaheadSink).unwrap_err();
        assert_eq!(err, ParseError::scanning(0, "\"a\""));
    }

    #[test]
    fn fatal_alternative_stops_the_choice() {
        let either = choice([literal("a").fatal(), literal("c")]);
        let mut cursor = Cursor::new("c");
        let err = either.evaluate(&mut cursor, &mut LookaheadSink).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(cursor.position(), 0);
    }
}
