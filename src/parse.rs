//! Parser generator functions and implementations of [`str::FromStr`] for all dice and expression data structures.
//! Requires the `parse` feature (enabled by default).
//!
//! The parser generators generate parsers for parsing dice notation from strings. All of them are case-sensitive and
//! expect lowercase input; the [`parse()`] function and the [`str::FromStr`] implementations take care of that,
//! while reporting errors against the original text.
//!
//! # Examples
//!
//! ## Parsing a dice term
//! ```
//! use dicetrace::dice::{KeepCount, ParsedExpression};
//!
//! let dice: ParsedExpression = "6D8H4!".parse()?;
//! assert_eq!(dice.expression(), "6D8H4!");
//! assert_eq!(dice.dice_count(), 6);
//! assert_eq!(dice.die_sides(), 8);
//! assert_eq!(dice.keep_count(), KeepCount::High(4));
//! assert_eq!(dice.explode_high(), Some(8));
//! # Ok::<(), dicetrace::parse::Errors>(())
//! ```
//!
//! ## Parsing and rolling a full expression
//! ```
//! use dicetrace::{dice::{roller::Iter as IterRoller, trace::Trace}, parse::roll};
//!
//! let mut rng = IterRoller::new([2, 6, 4, 3]);
//! let mut trace = Trace::new();
//! let total = roll("3d6h2 + 1d4 - 1", &mut rng, &mut trace)?;
//! assert_eq!(total, 12);
//! assert_eq!(trace.to_string(), "3d6h2[2, 6, 4, 2 (d)] 1d4[3]");
//! # Ok::<(), dicetrace::parse::RollError>(())
//! ```

#![cfg(feature = "parse")]

use alloc::{
	borrow::ToOwned,
	format,
	string::{String, ToString},
	vec::Vec,
};
use core::{fmt, iter, str};

use chumsky::{
	error::{Error, RichReason},
	prelude::*,
};

use crate::{
	dice::{DieBase, KeepCount, ParsedExpression, RollSink, Roller},
	expr::{EvalError, Expr, Sign},
};

/// Parser extras used by every generator: rich errors over characters
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Generates a parser for the whitespace allowed around terms and signs: spaces, tabs, and form feeds only.
fn whitespace<'src>() -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
	one_of(" \t\u{c}").repeated()
}

/// Creates an error for whatever is at the given offset of the text, or for the end of the text if that's where it is
fn unexpected_at<'src>(offset: usize) -> Rich<'src, char> {
	<Rich<'src, char> as Error<'src, &'src str>>::expected_found(
		iter::empty(),
		None,
		SimpleSpan::new(offset, offset),
	)
}

/// Wraps a parser for something that has to follow what was already parsed (a number after `r`, a term after a sign,
/// etc.). When it's missing, an error is reported where it should have started and parsing carries on without it.
fn required<'src, T>(
	parser: impl Parser<'src, &'src str, T, Extra<'src>> + Clone,
) -> impl Parser<'src, &'src str, Option<T>, Extra<'src>> + Clone {
	parser.or_not().validate(|found, e, emitter| {
		if found.is_none() {
			emitter.emit(unexpected_at(e.span().start));
		}
		found
	})
}

/// Generates a parser for the unsigned numbers used throughout dice notation. Numbers never start with a zero.
///
/// A number too large for a [`u32`] is reported as an error covering the whole number.
pub fn number<'src>() -> impl Parser<'src, &'src str, u32, Extra<'src>> + Clone {
	one_of("123456789")
		.then(one_of("0123456789").repeated())
		.to_slice()
		.validate(|digits: &str, e, emitter| {
			digits.parse().unwrap_or_else(|err| {
				emitter.emit(Rich::custom(e.span(), format!("Invalid number: {err}")));
				u32::MAX
			})
		})
}

/// Generates a parser that specifically handles dice terms like "d20", "3d6h2", "4z10r1!9x2", etc.
///
/// `original` is the text being parsed before it was lowercased. It must have the same length as the parsed text, and
/// is where each term's [`ParsedExpression::expression()`] text is taken from.
///
/// The parser only fails when no die base (`d` or `z`) is found. Anything missing after that is reported as an error
/// at the position it was expected.
pub fn term_part<'src>(original: &'src str) -> impl Parser<'src, &'src str, ParsedExpression, Extra<'src>> + Clone {
	// Die base: d dice start at 1, z dice start at 0
	let base = choice((just('d').to(DieBase::One), just('z').to(DieBase::Zero)));

	// Number of sides, with d% being a d100
	let sides = required(number().or(just('%').to(100)));

	// Reroll at or below (e.g. r1)
	let reroll = just('r').ignore_then(required(number()));

	// Keep policies (e.g. h2, l1, mh3, ml3)
	let keep = choice((
		just("mh").to(KeepCount::MiddleHigh as fn(u32) -> KeepCount),
		just("ml").to(KeepCount::MiddleLow as fn(u32) -> KeepCount),
		just('h').to(KeepCount::High as fn(u32) -> KeepCount),
		just('l').to(KeepCount::Low as fn(u32) -> KeepCount),
	))
	.then(required(number()))
	.map(|(keep, count)| count.map(keep));

	// Exploding at or above (e.g. !5), or on the number of sides when bare
	let explode = just('!').ignore_then(number().or_not());

	// Multiplier (e.g. *2, x2)
	let multiply = one_of("*x").ignore_then(required(number()));

	number()
		.or_not()
		.then(base)
		.then(sides)
		.then(reroll.or_not())
		.then(keep.or_not())
		.then(explode.or_not())
		.then(multiply.or_not())
		.try_map(
			move |((((((count, base), sides), reroll), keep), explode), multiply), span: SimpleSpan| {
				let mut builder = ParsedExpression::builder()
					.expression(original.get(span.start()..span.end()).unwrap_or_default())
					.count(count.unwrap_or(1))
					.base(base)
					.multiply(multiply.flatten().unwrap_or(1));

				if let Some(sides) = sides {
					builder = builder.sides(sides);
				}
				if let Some(low) = reroll.flatten() {
					builder = builder.reroll_low(low);
				}
				if let Some(keep) = keep.flatten() {
					builder = builder.keep(keep);
				}
				match explode {
					Some(Some(high)) => builder = builder.explode(high),
					Some(None) => builder = builder.explode_at_sides(),
					None => {}
				}

				builder.build().map_err(|err| Rich::custom(span, err))
			},
		)
}

/// Generates a parser that specifically handles dice terms like "d20", "3d6h2", "4z10r1!9x2", etc.
/// and expects end of input
pub fn term<'src>(original: &'src str) -> impl Parser<'src, &'src str, ParsedExpression, Extra<'src>> + Clone {
	term_part(original).then_ignore(end())
}

/// Something following a sign in an expression
enum Operand {
	/// Dice term
	Dice(ParsedExpression),

	/// Constant adjustment, only allowed at the end
	Constant(u32),
}

/// Generates a parser that handles full expressions: a dice term, any number of further dice terms each added or
/// subtracted, and an optional constant added or subtracted at the end (e.g. "3d6h2!6x2 + 1d4 - 3").
///
/// See [`term_part()`] for the meaning of `original`. Once the first term has been read, the parser consumes the rest
/// of the text and reports anything that doesn't fit as an error at the position it was found.
pub fn expr_part<'src>(original: &'src str) -> impl Parser<'src, &'src str, Expr, Extra<'src>> + Clone {
	let sign = choice((just('+').to(Sign::Plus), just('-').to(Sign::Minus))).map_with(|sign, e| (sign, e.span()));

	// Further dice terms or a constant, each after a sign
	let operand = required(choice((
		term_part(original).map(Operand::Dice),
		number().map(Operand::Constant),
	)));
	let more = whitespace()
		.ignore_then(sign)
		.then_ignore(whitespace())
		.then(operand)
		.repeated()
		.collect::<Vec<_>>();

	// Whatever couldn't be read as part of the expression
	let rest = any().repeated().to_slice().validate(|rest: &str, e: &mut chumsky::input::MapExtra<'src, '_, &'src str, Extra<'src>>, emitter| {
		if !rest.is_empty() {
			emitter.emit(unexpected_at(e.span().start));
		}
	});

	whitespace()
		.ignore_then(term_part(original))
		.then(more)
		.then_ignore(whitespace())
		.then_ignore(rest)
		.validate(|(first, more), _, emitter| {
			let mut expr = Expr::new(first);
			let mut more = more.into_iter().peekable();

			while let Some(((sign, _), operand)) = more.next() {
				match operand {
					Some(Operand::Dice(dice)) => expr = expr.then(sign, dice),
					Some(Operand::Constant(val)) => match more.peek() {
						// A constant can only be the last part of an expression
						Some(((_, next), _)) => emitter.emit(unexpected_at(next.start)),
						None => {
							if let Some(adjust) = sign.apply(i64::from(val)) {
								expr = expr.adjust(adjust);
							}
						}
					},
					None => {}
				}
			}

			expr
		})
}

/// Generates a parser that handles full expressions (see [`expr_part()`]) and expects end of input
pub fn expr<'src>(original: &'src str) -> impl Parser<'src, &'src str, Expr, Extra<'src>> + Clone {
	expr_part(original).then_ignore(end())
}

/// Parses a full dice expression, ignoring the case of letters.
///
/// # Errors
/// If the text isn't a valid dice expression, every error the parser ran into is returned.
///
/// # Examples
/// ```
/// use dicetrace::parse::{parse, ParseError};
///
/// let expr = parse("3d6h2!6x2+1d4-3")?;
/// assert_eq!(expr.terms().len(), 2);
/// assert_eq!(expr.adjustment(), -3);
/// assert_eq!(expr.to_string(), "3d6h2!x2 + 1d4 - 3");
///
/// let errs = parse("blah").unwrap_err();
/// assert_eq!(errs.0, [ParseError::Unexpected { found: 'b', line: 1, column: 1, input: "blah".to_owned() }]);
/// assert_eq!(errs.to_string(), "Unexpected 'b' (at position 1) in dice expression 'blah'");
///
/// let errs = parse("3d6 +").unwrap_err();
/// assert_eq!(errs.to_string(), "Incomplete dice expression '3d6 +'");
/// # Ok::<(), dicetrace::parse::Errors>(())
/// ```
pub fn parse(input: &str) -> Result<Expr, Errors> {
	let lowered = input.to_ascii_lowercase();
	let result = expr(input)
		.parse(lowered.as_str())
		.into_result()
		.map_err(|errs| Errors::from_rich(&errs, input));

	#[cfg(feature = "logging")]
	if let Ok(parsed) = &result {
		log::trace!("parsed {input:?} as {parsed}");
	}

	result
}

/// Parses a full dice expression and evaluates it, rolling the dice with the given roller and reporting every
/// individual die to the sink.
///
/// # Errors
/// If the text isn't a valid dice expression, [`RollError::Syntax`] is returned without any dice having been rolled.
/// If the expression can't be evaluated, [`RollError::Eval`] is returned.
///
/// # Examples
/// ```
/// use dicetrace::{dice::{roller::{Max as MaxRoller, Min as MinRoller}, trace::Ignore}, parse::{roll, RollError}};
///
/// assert_eq!(roll("d6", &mut MinRoller, &mut Ignore)?, 1);
/// assert_eq!(roll("d6", &mut MaxRoller, &mut Ignore)?, 6);
/// assert!(matches!(roll("d1!", &mut MaxRoller, &mut Ignore), Err(RollError::Eval(..))));
/// assert!(matches!(roll("blah", &mut MaxRoller, &mut Ignore), Err(RollError::Syntax(..))));
/// # Ok::<(), RollError>(())
/// ```
pub fn roll(input: &str, rng: &mut impl Roller, sink: &mut impl RollSink) -> Result<i64, RollError> {
	let expr = parse(input)?;
	Ok(expr.eval(rng, sink)?.total)
}

/// A single problem found while parsing a dice expression
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
	/// A character that doesn't fit the dice notation at its position
	Unexpected {
		/// Character that was found
		found: char,

		/// Line of the character (1-based)
		line: usize,

		/// Column of the character within its line (1-based)
		column: usize,

		/// Full text that was being parsed
		input: String,
	},

	/// The text ended before the dice expression was complete
	Incomplete {
		/// Line the text ended on (1-based)
		line: usize,

		/// Column just past the end of the text (1-based)
		column: usize,

		/// Full text that was being parsed
		input: String,
	},

	/// A part of the expression matched the notation, but its value isn't usable (e.g. a number that's too large)
	Invalid {
		/// Description of the problem
		message: String,

		/// Line the problem starts on (1-based)
		line: usize,

		/// Column the problem starts at (1-based)
		column: usize,

		/// Full text that was being parsed
		input: String,
	},
}

impl ParseError {
	/// Creates an error from one produced by the parser, locating it in the original text.
	fn from_rich(err: &Rich<'_, char>, input: &str) -> Self {
		let offset = err.span().start();
		let before = input.get(..offset).unwrap_or(input);
		let line = before.matches('\n').count().saturating_add(1);
		let column = before
			.rsplit('\n')
			.next()
			.unwrap_or_default()
			.chars()
			.count()
			.saturating_add(1);

		if let RichReason::Custom(message) = err.reason() {
			return Self::Invalid {
				message: message.clone(),
				line,
				column,
				input: input.to_owned(),
			};
		}

		// Report the character as it was written rather than lowercased
		let found = input
			.get(offset..)
			.and_then(|rest| rest.chars().next())
			.or_else(|| err.found().copied());
		match found {
			Some(found) => Self::Unexpected {
				found,
				line,
				column,
				input: input.to_owned(),
			},
			None => Self::Incomplete {
				line,
				column,
				input: input.to_owned(),
			},
		}
	}

	/// Line the error is on (1-based).
	#[must_use]
	pub const fn line(&self) -> usize {
		match self {
			Self::Unexpected { line, .. } | Self::Incomplete { line, .. } | Self::Invalid { line, .. } => *line,
		}
	}

	/// Column the error is at within its line (1-based).
	#[must_use]
	pub const fn column(&self) -> usize {
		match self {
			Self::Unexpected { column, .. } | Self::Incomplete { column, .. } | Self::Invalid { column, .. } => *column,
		}
	}

	/// Full text that was being parsed.
	#[must_use]
	pub fn input(&self) -> &str {
		match self {
			Self::Unexpected { input, .. } | Self::Incomplete { input, .. } | Self::Invalid { input, .. } => input,
		}
	}

	/// Text of the line the error is on.
	#[must_use]
	pub fn line_text(&self) -> &str {
		self.input()
			.split('\n')
			.nth(self.line().saturating_sub(1))
			.unwrap_or_default()
	}
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unexpected { found, column, .. } => write!(
				f,
				"Unexpected '{found}' (at position {column}) in dice expression '{}'",
				self.line_text()
			),
			Self::Incomplete { .. } => write!(f, "Incomplete dice expression '{}'", self.line_text()),
			Self::Invalid { message, column, .. } => write!(
				f,
				"{message} (at position {column}) in dice expression '{}'",
				self.line_text()
			),
		}
	}
}

impl core::error::Error for ParseError {}

/// Every problem found while parsing a dice expression, in the order the parser reported them
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Only ever a list of errors")]
pub struct Errors(pub Vec<ParseError>);

impl Errors {
	/// Creates the list from the errors produced by the parser. Errors reported more than once are only kept once.
	fn from_rich(errs: &[Rich<'_, char>], input: &str) -> Self {
		let mut list = Vec::with_capacity(errs.len());
		for err in errs.iter().map(|err| ParseError::from_rich(err, input)) {
			if !list.contains(&err) {
				list.push(err);
			}
		}
		Self(list)
	}

	/// Iterates over the errors.
	pub fn iter(&self) -> core::slice::Iter<'_, ParseError> {
		self.0.iter()
	}
}

impl<'a> IntoIterator for &'a Errors {
	type Item = &'a ParseError;
	type IntoIter = core::slice::Iter<'a, ParseError>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl fmt::Display for Errors {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// Each error is written on its own line.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}",
			self.0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
		)
	}
}

impl core::error::Error for Errors {}

/// Error that can occur during [`roll()`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RollError {
	/// The text isn't a valid dice expression
	#[error(transparent)]
	Syntax(#[from] Errors),

	/// The expression couldn't be evaluated
	#[error(transparent)]
	Eval(#[from] EvalError),
}

impl str::FromStr for ParsedExpression {
	type Err = Errors;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let lowered = s.to_ascii_lowercase();
		let parser = term(s);
		parser
			.parse(lowered.as_str())
			.into_result()
			.map_err(|errs| Errors::from_rich(&errs, s))
	}
}

impl str::FromStr for Expr {
	type Err = Errors;

	#[inline]
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		parse(s)
	}
}
