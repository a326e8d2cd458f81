//! Data structures for evaluating full dice expressions (dice terms added together or subtracted from each other, with
//! an optional constant adjustment) and working with their results.

use alloc::{
	format,
	string::{String, ToString},
	vec::Vec,
};
use core::fmt;

#[cfg(feature = "logging")]
use log::debug;

use crate::dice::{Error as DiceError, ParsedExpression, RollSink, Roller};

/// Whether a term is added to or subtracted from the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_enums, reason = "There are only two signs")]
pub enum Sign {
	/// Added to the total (`+`)
	Plus,

	/// Subtracted from the total (`-`)
	Minus,
}

impl Sign {
	/// Applies the sign to a value.
	#[must_use]
	pub const fn apply(self, val: i64) -> Option<i64> {
		match self {
			Self::Plus => Some(val),
			Self::Minus => val.checked_neg(),
		}
	}

	/// Gets the symbol for the sign.
	#[must_use]
	pub const fn symbol(self) -> char {
		match self {
			Self::Plus => '+',
			Self::Minus => '-',
		}
	}
}

impl fmt::Display for Sign {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

/// A dice term along with the sign it's combined with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[expect(clippy::exhaustive_structs, reason = "A term is only ever a sign and dice")]
pub struct Term {
	/// How the term's result is combined with the running total
	pub sign: Sign,

	/// Dice to roll for the term
	pub dice: ParsedExpression,
}

/// A full dice expression: one or more dice terms, combined in order, and a constant adjustment applied at the end.
///
/// # Examples
/// ```
/// use dicetrace::{dice::ParsedExpression, expr::Expr};
///
/// let expr = Expr::new(ParsedExpression::builder().count(3).sides(6).build()?)
/// 	.minus(ParsedExpression::builder().sides(4).build()?)
/// 	.adjust(2);
/// assert_eq!(expr.to_string(), "3d6 - 1d4 + 2");
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
	/// Terms in order of appearance, the first one always being positive
	terms: Vec<Term>,

	/// Constant added to the total
	adjust: i64,
}

impl Expr {
	/// Creates an expression consisting of a single dice term.
	#[must_use]
	pub fn new(first: ParsedExpression) -> Self {
		Self {
			terms: alloc::vec![Term {
				sign: Sign::Plus,
				dice: first,
			}],
			adjust: 0,
		}
	}

	/// Adds another term to the expression.
	#[must_use]
	pub fn plus(self, dice: ParsedExpression) -> Self {
		self.then(Sign::Plus, dice)
	}

	/// Subtracts another term from the expression.
	#[must_use]
	pub fn minus(self, dice: ParsedExpression) -> Self {
		self.then(Sign::Minus, dice)
	}

	/// Combines another term with the expression using the given sign.
	#[must_use]
	pub fn then(mut self, sign: Sign, dice: ParsedExpression) -> Self {
		self.terms.push(Term { sign, dice });
		self
	}

	/// Sets the constant adjustment applied after all terms.
	#[must_use]
	pub const fn adjust(mut self, adjust: i64) -> Self {
		self.adjust = adjust;
		self
	}

	/// Terms of the expression, in order.
	#[must_use]
	#[inline]
	pub fn terms(&self) -> &[Term] {
		&self.terms
	}

	/// Constant adjustment applied after all terms.
	#[must_use]
	#[inline]
	pub const fn adjustment(&self) -> i64 {
		self.adjust
	}

	/// Evaluates the expression, rolling the terms in order with the given roller and reporting every individual die to
	/// the sink. Every term is checked for rolls that would never finish before any dice are rolled.
	///
	/// # Errors
	/// If a term can't be rolled, or there is an integer overflow while combining the results, an error variant is
	/// returned.
	///
	/// # Examples
	/// ```
	/// use dicetrace::{dice::{roller::Iter as IterRoller, trace::Trace, ParsedExpression}, expr::Expr};
	///
	/// let expr = Expr::new(ParsedExpression::builder().count(2).sides(6).build()?)
	/// 	.minus(ParsedExpression::builder().sides(4).build()?)
	/// 	.adjust(-1);
	/// let mut trace = Trace::new();
	/// let evaled = expr.eval(&mut IterRoller::new([3, 5, 2]), &mut trace)?;
	///
	/// assert_eq!(evaled.totals, [8, 2]);
	/// assert_eq!(evaled.total, 5);
	/// assert_eq!(evaled.to_string(), "2d6 (8) - 1d4 (2) - 1");
	/// assert_eq!(trace.rolls.len(), 3);
	/// # Ok::<(), Box<dyn std::error::Error>>(())
	/// ```
	pub fn eval(&self, rng: &mut impl Roller, sink: &mut impl RollSink) -> Result<Evaled<'_>, EvalError> {
		for term in &self.terms {
			rng.check(&term.dice)
				.map_err(|err| EvalError::Dice(term.dice.clone(), err))?;
		}

		let mut totals = Vec::with_capacity(self.terms.len());
		let mut total: i64 = 0;
		for term in &self.terms {
			sink.term(term.sign);
			let result = rng
				.roll(&term.dice, sink)
				.map_err(|err| EvalError::Dice(term.dice.clone(), err))?;

			#[cfg(feature = "logging")]
			debug!("rolled {} for {}", term.dice, result);

			total = term
				.sign
				.apply(result)
				.and_then(|signed| total.checked_add(signed))
				.ok_or_else(|| EvalError::Overflow(self.clone()))?;
			totals.push(result);
		}

		let total = total
			.checked_add(self.adjust)
			.ok_or_else(|| EvalError::Overflow(self.clone()))?;

		Ok(Evaled {
			expr: self,
			totals,
			total,
		})
	}
}

impl Describe for Expr {
	/// Builds the expression in canonical dice notation, with spaces around the signs.
	///
	/// `list_limit` does not affect the output of this implementation in any way since there are no possible lists of
	/// elements included, so it is always safe to pass `None`.
	fn describe(&self, _list_limit: Option<usize>) -> String {
		describe_terms(self, |term, _| term.dice.to_string())
	}
}

impl fmt::Display for Expr {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output of this implementation is equivalent to [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// Result of evaluating an [`Expr`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain result record")]
pub struct Evaled<'a> {
	/// Expression that was evaluated
	pub expr: &'a Expr,

	/// Result of each term before its sign was applied, in order
	pub totals: Vec<i64>,

	/// Final result of the expression
	pub total: i64,
}

impl Describe for Evaled<'_> {
	/// Builds the expression with each term's result in parentheses after it.
	fn describe(&self, _list_limit: Option<usize>) -> String {
		describe_terms(self.expr, |term, idx| match self.totals.get(idx) {
			Some(total) => format!("{} ({total})", term.dice),
			None => term.dice.to_string(),
		})
	}
}

impl fmt::Display for Evaled<'_> {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output of this implementation is equivalent to [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}

/// Error that can occur during [`Expr::eval()`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
	/// Dice-related error (likely during rolling)
	#[error("dice error while evaluating \"{0}\": {1}")]
	Dice(ParsedExpression, #[source] DiceError),

	/// Integer overflow while combining the results of the terms
	#[error("integer overflow while evaluating {0}")]
	Overflow(Expr),
}

/// Trait to allow creation of expanded descriptions with an optional max number of individual listed results where
/// applicable
pub trait Describe {
	/// Builds a detailed expression string with additional information about non-deterministic elements.
	/// Any elements of the expression that can have a different result between multiple evaluations or multiple results
	/// should list all of the specific individual results that occurred (ideally, up to `list_limit` of them).
	#[must_use]
	fn describe(&self, list_limit: Option<usize>) -> String;
}

/// Joins the described terms of an expression with their signs, followed by the adjustment.
fn describe_terms(expr: &Expr, describe_term: impl Fn(&Term, usize) -> String) -> String {
	let mut text = String::new();
	for (idx, term) in expr.terms.iter().enumerate() {
		if idx > 0 {
			text.push_str(&format!(" {} ", term.sign));
		} else if term.sign == Sign::Minus {
			text.push('-');
		}
		text.push_str(&describe_term(term, idx));
	}

	if expr.adjust != 0 {
		let sign = if expr.adjust < 0 { Sign::Minus } else { Sign::Plus };
		text.push_str(&format!(" {sign} {}", expr.adjust.unsigned_abs()));
	}

	text
}
