use crate::annotation::{Annotation, Annotations};
use crate::behaviour::{Behaviour, Kind};
use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::ir::{IntermediateRepresentation, LookaheadSink};
use crate::rule::{MatchResult, Rule};
use crate::span::Span;

impl Rule {
    /// Evaluates the rule at the cursor according to its behaviour.
    ///
    /// On `Ok` the cursor sits after the match (unchanged for lookahead and
    /// ignorable failures). On `Err` the cursor is back where it started and
    /// the IR has seen a failure for every structural rule it was told about.
    pub fn evaluate(
        &self,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<MatchResult, ParseError> {
        let behaviour = self.behaviour();
        if let Err(err) = behaviour.validate() {
            return Err(ParseError::fatal(
                Span::empty(cursor.position()),
                format!("invalid rule `{self}`: {err}"),
                Vec::new(),
            ));
        }
        self.evaluate_with(&behaviour, cursor, ir)
    }

    /// Evaluates the rule under `behaviour` instead of its own.
    pub(crate) fn evaluate_with(
        &self,
        behaviour: &Behaviour,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<MatchResult, ParseError> {
        if !behaviour.lookahead {
            return self.apply(behaviour, cursor, ir);
        }
        let start = cursor.position();
        cursor.mark(false);
        let outcome = self.apply(behaviour, cursor, &mut LookaheadSink);
        cursor.rewind();
        match outcome? {
            MatchResult::IgnorableFailure(at) => Ok(MatchResult::IgnorableFailure(at)),
            _ => Ok(MatchResult::Success(Span::empty(start))),
        }
    }

    fn apply(
        &self,
        behaviour: &Behaviour,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
    ) -> Result<MatchResult, ParseError> {
        let start = cursor.position();
        let annotations = self.annotations();
        let cardinality = behaviour.cardinality;
        let skipping = behaviour.kind.is_skipping();

        match &behaviour.kind {
            Kind::Structural(token) => ir.will_evaluate(token, start),
            _ => ir.will_attempt(),
        }
        // Repetitions are kept or dropped together.
        ir.will_attempt();
        cursor.mark(skipping);

        let mut matches = 0;
        let mut cause = None;
        while cardinality.allows(matches) {
            let before = cursor.position();
            ir.will_attempt();
            cursor.mark(false);
            match self.test(cursor, ir) {
                Ok(()) => {
                    cursor.commit();
                    ir.did_attempt(true);
                    matches += 1;
                    if cursor.position() == before && cardinality.maximum.is_none() {
                        // Repeating a zero-width match cannot make progress.
                        matches = matches.max(cardinality.minimum);
                        break;
                    }
                }
                Err(error) => {
                    cursor.rewind();
                    ir.did_attempt(false);
                    if error.is_fatal() {
                        cursor.rewind();
                        ir.did_attempt(false);
                        self.finish(behaviour, &annotations, ir, MatchResult::Failure(start));
                        return Err(error);
                    }
                    cause = Some(error);
                    break;
                }
            }
        }

        if matches == 0 && cardinality.is_skippable() {
            cursor.rewind();
            ir.did_attempt(false);
            let result = MatchResult::IgnorableFailure(start);
            self.finish(behaviour, &annotations, ir, result);
            return Ok(result);
        }

        if matches < cardinality.minimum {
            let reached = cursor.position();
            cursor.rewind();
            ir.did_attempt(false);
            if behaviour.negate {
                return self.consume_one(behaviour, &annotations, cursor, ir, cause);
            }
            self.finish(behaviour, &annotations, ir, MatchResult::Failure(start));
            return Err(self.underflow(behaviour, &annotations, Span::new(start, reached), cause));
        }

        if behaviour.negate {
            let span = Span::new(start, cursor.position());
            cursor.rewind();
            ir.did_attempt(false);
            self.finish(behaviour, &annotations, ir, MatchResult::Failure(start));
            let error = match annotations.error_message() {
                Some(message) => ParseError::annotated(span, message, Vec::new()),
                None => ParseError::parsing(
                    span,
                    format!("unexpected {:?}", span.slice(cursor.source())),
                    Vec::new(),
                ),
            };
            return Err(escalate_if_fatal(&annotations, error));
        }

        let span = cursor.commit().span;
        ir.did_attempt(true);
        let result = if skipping {
            MatchResult::Consumed(span)
        } else {
            MatchResult::Success(span)
        };
        self.finish(behaviour, &annotations, ir, result);
        Ok(result)
    }

    /// Success of a negated rule: the original did not match here, so one
    /// character is consumed in its place.
    fn consume_one(
        &self,
        behaviour: &Behaviour,
        annotations: &Annotations,
        cursor: &mut Cursor<'_>,
        ir: &mut dyn IntermediateRepresentation,
        cause: Option<ParseError>,
    ) -> Result<MatchResult, ParseError> {
        let start = cursor.position();
        let skipping = behaviour.kind.is_skipping();
        cursor.mark(skipping);
        if let Err(end_of_input) = cursor.advance_one() {
            cursor.rewind();
            self.finish(behaviour, annotations, ir, MatchResult::Failure(start));
            let causes = cause.into_iter().chain([end_of_input]).collect();
            let span = Span::empty(start);
            let error = match annotations.error_message() {
                Some(message) => ParseError::annotated(span, message, causes),
                None => ParseError::parsing(span, format!("expected {self}"), causes),
            };
            return Err(escalate_if_fatal(annotations, error));
        }
        let span = cursor.commit().span;
        let result = if skipping {
            MatchResult::Consumed(span)
        } else {
            MatchResult::Success(span)
        };
        self.finish(behaviour, annotations, ir, result);
        Ok(result)
    }

    /// Closes the IR scope opened for this evaluation.
    fn finish(
        &self,
        behaviour: &Behaviour,
        annotations: &Annotations,
        ir: &mut dyn IntermediateRepresentation,
        result: MatchResult,
    ) {
        log::trace!("{self} -> {result:?}");
        match &behaviour.kind {
            Kind::Structural(token) => ir.did_evaluate(token, annotations, &result),
            _ => ir.did_attempt(result.is_success()),
        }
    }

    fn underflow(
        &self,
        behaviour: &Behaviour,
        annotations: &Annotations,
        span: Span,
        cause: Option<ParseError>,
    ) -> ParseError {
        let error = match (annotations.error_message(), cause) {
            (Some(message), cause) => {
                ParseError::annotated(span, message, cause.into_iter().collect())
            }
            // Messages from `error` annotations surface as they are
            (None, Some(cause)) if cause.is_annotated() => cause,
            (None, Some(cause))
                if !behaviour.kind.is_structural() && behaviour.cardinality.minimum <= 1 =>
            {
                cause
            }
            (None, cause) => {
                ParseError::parsing(span, format!("expected {self}"), cause.into_iter().collect())
            }
        };
        escalate_if_fatal(annotations, error)
    }
}

fn escalate_if_fatal(annotations: &Annotations, error: ParseError) -> ParseError {
    if annotations.is_set(&Annotation::Fatal) {
        error.escalate()
    } else {
        error
    }
}
