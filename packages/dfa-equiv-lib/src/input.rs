//! Parsing of the line-based textual description of a batch of DFAs.
//!
//! An example batch with a single automaton is as follows:
//! ```text
//! 1
//! 3
//! a b
//! 2
//! 1 2
//! 1 2
//! 2 2
//! ```
//!
//! The first line holds the number of test cases. Every test case consists of
//! the number of states `n`, a line with the whitespace-separated symbol
//! names (their count defines the alphabet size `m`), a line with the final
//! states (possibly empty), and `n` transition rows with `m` target states
//! each. Row `i` belongs to state `i`.
//!
//! Spaces and tabs around tokens are ignored. Lines after the last test case
//! are not read.

use std::{num::ParseIntError, str::Lines};

use nom::{
    Parser,
    bytes::complete::take_till1,
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res},
    error::{FromExternalError, ParseError},
    multi::separated_list0,
    sequence::delimited,
};
use thiserror::Error;

pub use crate::automaton::dfa::MalformedAutomaton;
use crate::automaton::{StateIndex, dfa::Dfa};

/// A [MalformedAutomaton] together with where in the input it was found.
/// Line numbers start at 1, test cases are counted from 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid test case count on line {line}")]
    Header {
        line: usize,
        #[source]
        source: MalformedAutomaton,
    },

    #[error("malformed automaton in test case {case} (line {line})")]
    Case {
        case: usize,
        line: usize,
        #[source]
        source: MalformedAutomaton,
    },
}

impl InputError {
    pub fn line(&self) -> usize {
        match self {
            InputError::Header { line, .. } | InputError::Case { line, .. } => *line,
        }
    }

    pub fn malformed(&self) -> &MalformedAutomaton {
        match self {
            InputError::Header { source, .. } | InputError::Case { source, .. } => source,
        }
    }
}

fn token<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, &'a str, E> {
    take_till1(|c: char| c.is_whitespace()).parse(input)
}

// E.g., "  a b\tc "
fn tokens<'a, E: ParseError<&'a str>>(input: &'a str) -> nom::IResult<&'a str, Vec<&'a str>, E> {
    delimited(space0, separated_list0(space1, token), space0).parse(input)
}

fn integer<'a, E>(input: &'a str) -> nom::IResult<&'a str, usize, E>
where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>,
{
    map_res(digit1, |digits: &str| digits.parse::<usize>()).parse(input)
}

#[test]
fn test_tokens_1() {
    let (_, t) = tokens::<nom::error::Error<&str>>("  a b\tcd  ").unwrap();
    assert_eq!(t, vec!["a", "b", "cd"]);
}

#[test]
fn test_tokens_2() {
    let (rest, t) = tokens::<nom::error::Error<&str>>("").unwrap();
    assert!(t.is_empty());
    assert_eq!(rest, "");
}

#[test]
fn test_integer_1() {
    let (rest, value) = integer::<nom::error::Error<&str>>("42 7").unwrap();
    assert_eq!(value, 42);
    assert_eq!(rest, " 7");
}

#[test]
fn test_integer_2() {
    assert!(integer::<nom::error::Error<&str>>("-3").is_err());
    assert!(integer::<nom::error::Error<&str>>("99999999999999999999999999").is_err());
}

fn split_line<'a>(line: &'a str, expected: &'static str) -> Result<Vec<&'a str>, MalformedAutomaton> {
    all_consuming(tokens::<nom::error::Error<&str>>)
        .parse(line)
        .map(|(_, t)| t)
        .map_err(|_| MalformedAutomaton::UnexpectedTokens {
            expected,
            found: line.trim().to_string(),
        })
}

fn parse_integer(token: &str) -> Result<usize, MalformedAutomaton> {
    all_consuming(integer::<nom::error::Error<&str>>)
        .parse(token)
        .map(|(_, value)| value)
        .map_err(|_| MalformedAutomaton::InvalidInteger(token.to_string()))
}

fn parse_integers(line: &str, expected: &'static str) -> Result<Vec<usize>, MalformedAutomaton> {
    split_line(line, expected)?
        .into_iter()
        .map(parse_integer)
        .collect()
}

type Located<T> = Result<T, (usize, MalformedAutomaton)>;

/// Hands out input lines together with their 1-based line number.
struct LineCursor<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl<'a> LineCursor<'a> {
    fn new(input: &'a str) -> Self {
        LineCursor {
            lines: input.lines(),
            line: 0,
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Located<(usize, &'a str)> {
        self.line += 1;
        match self.lines.next() {
            Some(content) => Ok((self.line, content)),
            None => Err((self.line, MalformedAutomaton::UnexpectedEnd(expected))),
        }
    }

    /// Reads a line holding exactly one non-negative integer.
    fn next_count(&mut self, expected: &'static str) -> Located<(usize, usize)> {
        let (line, content) = self.next_line(expected)?;
        let values = split_line(content, expected).map_err(|e| (line, e))?;

        match values.as_slice() {
            [] => Err((line, MalformedAutomaton::MissingValue(expected))),
            [value] => parse_integer(value).map(|v| (line, v)).map_err(|e| (line, e)),
            [_, rest @ ..] => Err((
                line,
                MalformedAutomaton::UnexpectedTokens {
                    expected,
                    found: rest.join(" "),
                },
            )),
        }
    }
}

fn read_case(lines: &mut LineCursor<'_>) -> Located<Dfa> {
    let (count_line, state_count) = lines.next_count("state count")?;
    if state_count == 0 {
        return Err((count_line, MalformedAutomaton::EmptyStateSet));
    }

    let (alphabet_line, content) = lines.next_line("alphabet")?;
    let alphabet = split_line(content, "alphabet")
        .map_err(|e| (alphabet_line, e))?
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();

    let (final_line, content) = lines.next_line("final states")?;
    let final_states: Vec<StateIndex> =
        parse_integers(content, "final states").map_err(|e| (final_line, e))?;

    let mut rows = vec![];
    let mut row_lines = vec![];
    for _ in 0..state_count {
        let (line, content) = lines.next_line("transition row")?;
        rows.push(parse_integers(content, "transition row").map_err(|e| (line, e))?);
        row_lines.push(line);
    }

    Dfa::new(alphabet, &final_states, rows).map_err(|e| {
        let line = match &e {
            MalformedAutomaton::FinalStateOutOfRange { .. } => final_line,
            MalformedAutomaton::RowLengthMismatch { state, .. }
            | MalformedAutomaton::TransitionOutOfRange { state, .. } => row_lines[*state],
            _ => count_line,
        };
        (line, e)
    })
}

/// Iterates over the test cases of a batch. Yields at most one error, after
/// which the iterator is exhausted: the position of the next test case is
/// unknown once a test case is malformed.
pub struct BatchReader<'a> {
    lines: LineCursor<'a>,
    case_count: usize,
    cases_read: usize,
    failed: bool,
}

impl<'a> BatchReader<'a> {
    /// Reads the header line. Test cases are parsed lazily.
    pub fn new(input: &'a str) -> Result<Self, InputError> {
        let mut lines = LineCursor::new(input);
        let (_, case_count) = lines
            .next_count("test case count")
            .map_err(|(line, source)| InputError::Header { line, source })?;

        Ok(BatchReader {
            lines,
            case_count,
            cases_read: 0,
            failed: false,
        })
    }

    /// The number of test cases announced by the header.
    pub fn case_count(&self) -> usize {
        self.case_count
    }
}

impl Iterator for BatchReader<'_> {
    type Item = Result<Dfa, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cases_read >= self.case_count {
            return None;
        }

        self.cases_read += 1;
        match read_case(&mut self.lines) {
            Ok(dfa) => Some(Ok(dfa)),
            Err((line, source)) => {
                self.failed = true;
                Some(Err(InputError::Case {
                    case: self.cases_read,
                    line,
                    source,
                }))
            }
        }
    }
}

/// Parses a whole batch, failing on the first malformed test case.
pub fn parse_batch(input: &str) -> Result<Vec<Dfa>, InputError> {
    BatchReader::new(input)?.collect()
}

/// Parses a single test case that is not preceded by a header line.
pub fn parse_case(input: &str) -> Result<Dfa, InputError> {
    read_case(&mut LineCursor::new(input))
        .map_err(|(line, source)| InputError::Case { case: 1, line, source })
}

#[test]
fn test_case_1() {
    let dfa = parse_case("2\na b\n1\n0 1\n1 1\n").unwrap();

    assert_eq!(dfa.alphabet(), ["a", "b"]);
    assert_eq!(dfa.final_states().collect::<Vec<_>>(), vec![1]);
    assert_eq!(dfa.row(0), [0, 1]);
    assert_eq!(dfa.row(1), [1, 1]);
}

#[test]
fn test_case_empty_final_line() {
    let dfa = parse_case("3\na b\n\n1 2\n1 2\n1 2").unwrap();

    assert_eq!(dfa.final_states().count(), 0);
}

#[test]
fn test_case_line_numbers() {
    let err = parse_case("2\na b\n\n0 1\n1 9\n").unwrap_err();

    assert_eq!(err.line(), 5);
    assert_eq!(
        *err.malformed(),
        MalformedAutomaton::TransitionOutOfRange {
            state: 1,
            symbol: 1,
            target: 9,
            state_count: 2
        }
    );
}
