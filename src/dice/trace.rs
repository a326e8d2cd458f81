//! Notifications for every individual die rolled, and the sinks that receive them.

use alloc::{borrow::Cow, format, string::String, vec::Vec};
use core::fmt;

use super::{list_rolls, ParsedExpression};
use crate::expr::{Describe, Sign};

/// A single die that was rolled (or dropped) while rolling a [`ParsedExpression`], along with the value it showed.
///
/// Events are reported in the exact order the dice were rolled: every die of the initial roll (each with its rerolls
/// before the next die), then the rolls dropped by the keep policy, then all explosions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RolledDice<'a> {
	/// Accepted roll of one of the initial dice
	PlainRoll(Cow<'a, ParsedExpression>, u32),

	/// Roll of one of the initial dice that was discarded for being at or below the reroll threshold
	PlainReroll(Cow<'a, ParsedExpression>, u32),

	/// Accepted roll of an additional die from an explosion
	ExplodedRoll(Cow<'a, ParsedExpression>, u32),

	/// Roll of an additional die from an explosion that was discarded for being at or below the reroll threshold
	ExplodedReroll(Cow<'a, ParsedExpression>, u32),

	/// Accepted initial roll that doesn't count towards the total because of the keep policy
	DroppedRoll(Cow<'a, ParsedExpression>, u32),
}

impl RolledDice<'_> {
	/// Dice term the roll belongs to.
	#[must_use]
	pub fn expression(&self) -> &ParsedExpression {
		match self {
			Self::PlainRoll(expr, _)
			| Self::PlainReroll(expr, _)
			| Self::ExplodedRoll(expr, _)
			| Self::ExplodedReroll(expr, _)
			| Self::DroppedRoll(expr, _) => expr,
		}
	}

	/// Value that was rolled.
	#[must_use]
	pub const fn val(&self) -> u32 {
		match self {
			Self::PlainRoll(_, val)
			| Self::PlainReroll(_, val)
			| Self::ExplodedRoll(_, val)
			| Self::ExplodedReroll(_, val)
			| Self::DroppedRoll(_, val) => *val,
		}
	}

	/// Indicates whether the roll was discarded and rolled again.
	#[must_use]
	pub const fn is_reroll(&self) -> bool {
		matches!(self, Self::PlainReroll(..) | Self::ExplodedReroll(..))
	}

	/// Indicates whether the roll comes from an explosion.
	#[must_use]
	pub const fn is_explosion(&self) -> bool {
		matches!(self, Self::ExplodedRoll(..) | Self::ExplodedReroll(..))
	}

	/// Indicates whether the roll was dropped by the keep policy.
	#[must_use]
	pub const fn is_dropped(&self) -> bool {
		matches!(self, Self::DroppedRoll(..))
	}

	/// Moves all of self's owned data into a new instance and clones any unowned data in order to create a `'static`
	/// instance of self.
	#[must_use]
	pub fn into_owned(self) -> RolledDice<'static> {
		match self {
			Self::PlainRoll(expr, val) => RolledDice::PlainRoll(Cow::Owned(expr.into_owned()), val),
			Self::PlainReroll(expr, val) => RolledDice::PlainReroll(Cow::Owned(expr.into_owned()), val),
			Self::ExplodedRoll(expr, val) => RolledDice::ExplodedRoll(Cow::Owned(expr.into_owned()), val),
			Self::ExplodedReroll(expr, val) => RolledDice::ExplodedReroll(Cow::Owned(expr.into_owned()), val),
			Self::DroppedRoll(expr, val) => RolledDice::DroppedRoll(Cow::Owned(expr.into_owned()), val),
		}
	}
}

impl fmt::Display for RolledDice<'_> {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The format of a rolled die is the plain numeric value of the roll, followed by ` (r)` for rerolls, ` (x)` for
	/// explosions, and ` (d)` for dropped rolls.
	///
	/// # Examples
	/// ```
	/// use std::borrow::Cow;
	/// use dicetrace::dice::{ParsedExpression, RolledDice};
	///
	/// let dice = ParsedExpression::builder().count(3).sides(6).build()?;
	/// assert_eq!(RolledDice::PlainRoll(Cow::Borrowed(&dice), 4).to_string(), "4");
	/// assert_eq!(RolledDice::ExplodedReroll(Cow::Borrowed(&dice), 1).to_string(), "1 (x) (r)");
	/// assert_eq!(RolledDice::DroppedRoll(Cow::Borrowed(&dice), 2).to_string(), "2 (d)");
	/// # Ok::<(), dicetrace::dice::Error>(())
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}{}{}{}",
			self.val(),
			if self.is_explosion() { " (x)" } else { "" },
			if self.is_reroll() { " (r)" } else { "" },
			if self.is_dropped() { " (d)" } else { "" }
		)
	}
}

/// Receives a notification for every individual die as it's rolled
pub trait RollSink {
	/// Handles a single rolled die.
	fn roll(&mut self, rolled: RolledDice<'_>);

	/// Handles the start of an expression term, which will be added or subtracted according to `sign`.
	/// [`Expr::eval()`](crate::expr::Expr::eval()) calls this before rolling each term's dice. Does nothing by default.
	#[inline]
	fn term(&mut self, _sign: Sign) {}
}

impl<F: FnMut(RolledDice<'_>)> RollSink for F {
	#[inline]
	fn roll(&mut self, rolled: RolledDice<'_>) {
		self(rolled);
	}
}

/// Sink that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
#[expect(clippy::exhaustive_structs, reason = "Nothing to add")]
pub struct Ignore;

impl RollSink for Ignore {
	#[inline]
	fn roll(&mut self, _rolled: RolledDice<'_>) {}
}

/// Sink that records every notification in order, for verbose output or later inspection.
///
/// # Examples
/// ```
/// use dicetrace::dice::{roller::{Iter as IterRoller, Roller}, trace::Trace, KeepCount, ParsedExpression};
///
/// let dice = ParsedExpression::builder().count(3).sides(6).keep(KeepCount::High(2)).build()?;
/// let mut rng = IterRoller::new([5, 2, 6]);
/// let mut trace = Trace::default();
///
/// let total = rng.roll(&dice, &mut trace)?;
/// assert_eq!(total, 11);
/// assert_eq!(trace.total(), Some(total));
/// assert_eq!(trace.rolls.iter().map(|rolled| rolled.val()).collect::<Vec<_>>(), [5, 2, 6, 2]);
/// assert!(trace.rolls[3].is_dropped());
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[expect(clippy::exhaustive_structs, reason = "Plain record of rolls")]
pub struct Trace {
	/// Every rolled die, in the order they were reported
	pub rolls: Vec<RolledDice<'static>>,

	/// Sign of every expression term that was started, along with the index in [`Self::rolls`] of its first roll
	pub terms: Vec<(Sign, usize)>,
}

impl Trace {
	/// Creates an empty trace.
	#[must_use]
	#[inline]
	pub const fn new() -> Self {
		Self {
			rolls: Vec::new(),
			terms: Vec::new(),
		}
	}

	/// Totals the recorded rolls on their own: accepted initial rolls and explosions count towards the total, dropped
	/// rolls are taken back out, and each term's multiplier is applied to its own rolls. Rerolls don't count. Rolls of
	/// a subtracted expression term are subtracted, and rolls from before any term was started are added.
	///
	/// For a trace of a single dice term, this is always equal to the result that rolling the term returned. For a
	/// trace of an evaluated expression, it's equal to the expression's total without its constant adjustment.
	/// Returns [`None`] if the total overflows.
	///
	/// # Examples
	/// ```
	/// use dicetrace::{dice::{roller::Iter as IterRoller, trace::Trace}, parse};
	///
	/// let expr = parse("2d6 - 1d4 + 1")?;
	/// let mut trace = Trace::new();
	/// let evaled = expr.eval(&mut IterRoller::new([3, 5, 4]), &mut trace)?;
	///
	/// assert_eq!(evaled.total, 5);
	/// assert_eq!(trace.total(), Some(4));
	/// # Ok::<(), Box<dyn std::error::Error>>(())
	/// ```
	#[must_use]
	pub fn total(&self) -> Option<i64> {
		let mut terms = self.terms.iter().peekable();
		let mut sign = Sign::Plus;

		self.rolls.iter().enumerate().try_fold(0_i64, |sum, (idx, rolled)| {
			while let Some(&(next, _)) = terms.next_if(|&&(_, start)| start <= idx) {
				sign = next;
			}

			let val = i64::from(rolled.val()).checked_mul(i64::from(rolled.expression().multiply()))?;
			let val = sign.apply(val)?;
			match rolled {
				RolledDice::PlainRoll(..) | RolledDice::ExplodedRoll(..) => sum.checked_add(val),
				RolledDice::DroppedRoll(..) => sum.checked_sub(val),
				RolledDice::PlainReroll(..) | RolledDice::ExplodedReroll(..) => Some(sum),
			}
		})
	}

	/// Removes all recorded rolls and terms.
	#[inline]
	pub fn clear(&mut self) {
		self.rolls.clear();
		self.terms.clear();
	}
}

impl RollSink for Trace {
	#[inline]
	fn roll(&mut self, rolled: RolledDice<'_>) {
		self.rolls.push(rolled.into_owned());
	}

	#[inline]
	fn term(&mut self, sign: Sign) {
		self.terms.push((sign, self.rolls.len()));
	}
}

impl Describe for Trace {
	/// Builds a string listing the rolls of each dice term (see [`RolledDice::fmt()`]), grouping consecutive rolls
	/// of the same term together. A started expression term always begins a new group.
	///
	/// If `list_limit` is specified and a term has more rolls than it, its list of rolls will be truncated and appended
	/// with "X more..." (where X is the remaining roll count past the max).
	///
	/// # Examples
	/// ```
	/// use dicetrace::{
	/// 	dice::{roller::{Iter as IterRoller, Roller}, trace::Trace, KeepCount, ParsedExpression},
	/// 	expr::Describe,
	/// };
	///
	/// let dice = ParsedExpression::builder().count(4).sides(6).keep(KeepCount::High(2)).build()?;
	/// let mut trace = Trace::new();
	/// IterRoller::new([6, 2, 5, 3]).roll(&dice, &mut trace)?;
	///
	/// assert_eq!(trace.describe(None), "4d6h2[6, 2, 5, 3, 2 (d), 3 (d)]");
	/// assert_eq!(trace.describe(Some(2)), "4d6h2[6, 2, 4 more...]");
	/// # Ok::<(), dicetrace::dice::Error>(())
	/// ```
	///
	/// [`RolledDice::fmt()`]: ./enum.RolledDice.html#method.fmt
	fn describe(&self, list_limit: Option<usize>) -> String {
		let mut groups: Vec<(&ParsedExpression, Vec<&RolledDice<'static>>)> = Vec::new();
		for (idx, rolled) in self.rolls.iter().enumerate() {
			let starts_term = self.terms.iter().any(|&(_, start)| start == idx);
			match groups.last_mut() {
				Some((expr, rolls)) if !starts_term && *expr == rolled.expression() => rolls.push(rolled),
				_ => groups.push((rolled.expression(), alloc::vec![rolled])),
			}
		}

		groups
			.iter()
			.map(|(expr, rolls)| format!("{}[{}]", expr.expression(), list_rolls(rolls, list_limit)))
			.collect::<Vec<_>>()
			.join(" ")
	}
}

impl fmt::Display for Trace {
	/// Formats the value using the given formatter. [Read more][core::fmt::Debug::fmt()]
	///
	/// The output is equivalent to calling [`Self::describe(None)`].
	///
	/// [`Self::describe(None)`]: Self::describe()
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.describe(None))
	}
}
