//! All functionality for directly creating dice terms, rolling them, and observing each individual die as it's rolled.
//!
//! This is the home of the dice "primitives". For combining several dice terms into a larger expression, see
//! [`Expr`].
//!
//! [`Expr`]: crate::expr::Expr

pub mod keep;
pub mod roller;
pub mod trace;

use alloc::{
	string::{String, ToString},
	vec::Vec,
};
use core::{cmp, fmt};

pub use self::{
	keep::KeepCount,
	roller::Roller,
	trace::{RollSink, RolledDice},
};

/// Lowest face value of a die, determining how a roll is made: `base + uniform(0, sides - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[expect(clippy::exhaustive_enums, reason = "Dice faces either start at zero or one")]
pub enum DieBase {
	/// Faces are numbered starting at 0 (`z` dice)
	Zero,

	/// Faces are numbered starting at 1 (`d` dice)
	One,
}

impl DieBase {
	/// Gets the numeric value of the lowest face.
	#[must_use]
	#[inline]
	pub const fn value(self) -> u32 {
		match self {
			Self::Zero => 0,
			Self::One => 1,
		}
	}

	/// Gets the face value that lies `offset` faces above the lowest one.
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::DieBase;
	///
	/// assert_eq!(DieBase::Zero.face(5), 5);
	/// assert_eq!(DieBase::One.face(5), 6);
	/// ```
	#[must_use]
	#[inline]
	pub const fn face(self, offset: u32) -> u32 {
		self.value().saturating_add(offset)
	}

	/// Gets the letter used for the base in dice notation.
	#[must_use]
	#[inline]
	pub const fn symbol(self) -> char {
		match self {
			Self::Zero => 'z',
			Self::One => 'd',
		}
	}
}

impl PartialEq<u32> for DieBase {
	fn eq(&self, other: &u32) -> bool {
		self.value() == *other
	}
}

impl PartialOrd<u32> for DieBase {
	fn partial_cmp(&self, other: &u32) -> Option<cmp::Ordering> {
		Some(self.value().cmp(other))
	}
}

impl fmt::Display for DieBase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.symbol())
	}
}

/// A single dice term (`3d6h2!6x2`, `z10`, `4d%r1`...) with every optional clause resolved to its concrete value.
///
/// Instances are immutable once built. They are normally produced by the parser, but can be created directly with a
/// [`Builder`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedExpression {
	/// Source text the term was built from
	expression: String,

	/// Lowest face of each die
	base: DieBase,

	/// Number of faces of each die
	sides: u32,

	/// Number of dice rolled
	count: u32,

	/// Rolls at or below this value are rerolled
	reroll_low: Option<u32>,

	/// Which of the rolls count towards the total
	keep: KeepCount,

	/// Kept rolls at or above this value explode
	explode_high: Option<u32>,

	/// Factor applied to the final sum
	multiply: u32,
}

impl ParsedExpression {
	/// Creates a new dice builder.
	#[must_use]
	#[inline]
	pub fn builder() -> Builder {
		Builder::default()
	}

	/// Source text this term was parsed from. For terms made with a [`Builder`] that was never given any text, this
	/// is the canonical notation for the term.
	#[must_use]
	#[inline]
	pub fn expression(&self) -> &str {
		&self.expression
	}

	/// Lowest face of each die.
	#[must_use]
	#[inline]
	pub const fn die_base(&self) -> DieBase {
		self.base
	}

	/// Number of faces of each die.
	#[must_use]
	#[inline]
	pub const fn die_sides(&self) -> u32 {
		self.sides
	}

	/// Number of dice to roll.
	#[must_use]
	#[inline]
	pub const fn dice_count(&self) -> u32 {
		self.count
	}

	/// Threshold at or below which rolls are rerolled, if any.
	#[must_use]
	#[inline]
	pub const fn reroll_low(&self) -> Option<u32> {
		self.reroll_low
	}

	/// Policy choosing which rolls count towards the total.
	#[must_use]
	#[inline]
	pub const fn keep_count(&self) -> KeepCount {
		self.keep
	}

	/// Threshold at or above which kept rolls explode, if any.
	#[must_use]
	#[inline]
	pub const fn explode_high(&self) -> Option<u32> {
		self.explode_high
	}

	/// Factor the sum of all kept and exploded rolls is multiplied by.
	#[must_use]
	#[inline]
	pub const fn multiply(&self) -> u32 {
		self.multiply
	}

	/// Lowest value a single die can roll.
	#[must_use]
	#[inline]
	pub const fn min_roll(&self) -> u32 {
		self.base.value()
	}

	/// Highest value a single die can roll.
	#[must_use]
	#[inline]
	pub const fn max_roll(&self) -> u32 {
		self.base.face(self.sides.saturating_sub(1))
	}

	/// Checks whether a roll of the given value has to be rerolled.
	#[must_use]
	#[inline]
	pub fn rerolls(&self, val: u32) -> bool {
		self.reroll_low.is_some_and(|low| val <= low)
	}

	/// Checks whether a kept roll of the given value explodes.
	#[must_use]
	#[inline]
	pub fn explodes(&self, val: u32) -> bool {
		self.explode_high.is_some_and(|high| val >= high)
	}

	/// Lowest value a roll can have once rerolls have been taken into account.
	#[must_use]
	fn lowest_accepted_roll(&self) -> u32 {
		match self.reroll_low {
			Some(low) => cmp::max(self.base.value(), low.saturating_add(1)),
			None => self.base.value(),
		}
	}

	/// Verifies that rolling this term is guaranteed to terminate.
	///
	/// # Errors
	/// If every possible roll would be rerolled, [`Error::RerollsForever`] is returned. If every accepted roll would
	/// explode, [`Error::ExplodesForever`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::{DieBase, Error, ParsedExpression};
	///
	/// let dice = ParsedExpression::builder().base(DieBase::Zero).sides(6).explode(0).build()?;
	/// assert!(matches!(dice.check(), Err(Error::ExplodesForever { threshold: 0, .. })));
	///
	/// let dice = ParsedExpression::builder().sides(6).reroll_low(6).build()?;
	/// assert!(matches!(dice.check(), Err(Error::RerollsForever { threshold: 6, .. })));
	/// # Ok::<(), Error>(())
	/// ```
	pub fn check(&self) -> Result<(), Error> {
		if let Some(low) = self.reroll_low {
			if low >= self.max_roll() {
				return Err(Error::RerollsForever {
					expression: self.expression.clone(),
					threshold: low,
				});
			}
		}

		if let Some(high) = self.explode_high {
			if self.base >= high || self.lowest_accepted_roll() >= high {
				return Err(Error::ExplodesForever {
					expression: self.expression.clone(),
					threshold: high,
				});
			}
		}

		Ok(())
	}

	/// Rolls the dice using the given roller, reporting every individual die to the sink.
	/// This is shorthand for [`Roller::roll()`].
	///
	/// # Errors
	/// See [`Roller::roll()`].
	#[inline]
	pub fn roll(&self, rng: &mut impl Roller, sink: &mut impl RollSink) -> Result<i64, Error> {
		rng.roll(self, sink)
	}
}

impl fmt::Display for ParsedExpression {
	/// Formats the term in canonical dice notation, leaving out any clause that has its default value.
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::{KeepCount, ParsedExpression};
	///
	/// let dice = ParsedExpression::builder()
	/// 	.count(3)
	/// 	.sides(6)
	/// 	.keep(KeepCount::High(2))
	/// 	.explode(6)
	/// 	.multiply(2)
	/// 	.build()?;
	/// assert_eq!(dice.to_string(), "3d6h2!x2");
	/// # Ok::<(), dicetrace::dice::Error>(())
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}{}", self.count, self.base, self.sides)?;

		if let Some(low) = self.reroll_low {
			write!(f, "r{low}")?;
		}

		if self.keep != KeepCount::High(self.count) {
			write!(f, "{}", self.keep)?;
		}

		match self.explode_high {
			Some(high) if high == self.sides => write!(f, "!")?,
			Some(high) => write!(f, "!{high}")?,
			None => {}
		}

		if self.multiply != 1 {
			write!(f, "x{}", self.multiply)?;
		}

		Ok(())
	}
}

/// An error resulting from a dice operation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
	/// Every roll that is accepted would explode again, so rolling the dice would never finish.
	#[error("dice expression '{expression}' would explode forever (exploding on {threshold} or higher)")]
	ExplodesForever {
		/// Text of the offending term
		expression: String,

		/// Explode threshold of the term
		threshold: u32,
	},

	/// Every possible roll would be rerolled, so rolling the dice would never finish.
	#[error("dice expression '{expression}' would reroll forever (rerolling on {threshold} or lower)")]
	RerollsForever {
		/// Text of the offending term
		expression: String,

		/// Reroll threshold of the term
		threshold: u32,
	},

	/// There was an integer overflow when totalling roll values.
	#[error("integer overflow while rolling '{0}'")]
	Overflow(String),

	/// The dice description can't be rolled at all.
	#[error("invalid dice: {0}")]
	InvalidDice(&'static str),
}

/// Explode setting of a [`Builder`], resolved once the number of sides is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Explode {
	/// Explode on rolls equal to or above the number of sides
	AtSides,

	/// Explode on rolls equal to or above the value
	At(u32),
}

/// Builds a [`ParsedExpression`] with a fluent interface. Clauses that are never set take their default values when
/// [`Builder::build()`] is called: one die, no rerolls, keep all dice, no explosions, multiply by one.
///
/// # Examples
///
/// ## Basic dice
/// ```
/// use dicetrace::dice::{DieBase, KeepCount, ParsedExpression};
///
/// let dice = ParsedExpression::builder().count(2).sides(6).build()?;
/// assert_eq!(dice.dice_count(), 2);
/// assert_eq!(dice.die_base(), DieBase::One);
/// assert_eq!(dice.keep_count(), KeepCount::High(2));
/// assert_eq!(dice.explode_high(), None);
/// assert_eq!(dice.multiply(), 1);
/// assert_eq!(dice.expression(), "2d6");
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
///
/// ## Several clauses
/// ```
/// use dicetrace::dice::{DieBase, KeepCount, ParsedExpression};
///
/// let dice = ParsedExpression::builder()
/// 	.expression("4z10r1l3!")
/// 	.count(4)
/// 	.base(DieBase::Zero)
/// 	.sides(10)
/// 	.reroll_low(1)
/// 	.keep(KeepCount::Low(3))
/// 	.explode_at_sides()
/// 	.build()?;
/// assert_eq!(dice.expression(), "4z10r1l3!");
/// assert_eq!(dice.reroll_low(), Some(1));
/// assert_eq!(dice.explode_high(), Some(10));
/// assert_eq!(dice.max_roll(), 9);
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
	/// Source text of the term
	expression: Option<String>,

	/// Lowest face of each die
	base: DieBase,

	/// Number of faces of each die
	sides: u32,

	/// Number of dice to roll
	count: u32,

	/// Reroll threshold
	reroll_low: Option<u32>,

	/// Keep policy
	keep: Option<KeepCount>,

	/// Explode threshold
	explode: Option<Explode>,

	/// Factor for the sum
	multiply: u32,
}

impl Default for Builder {
	/// Creates a builder for the default dice (1d20).
	fn default() -> Self {
		Self {
			expression: None,
			base: DieBase::One,
			sides: 20,
			count: 1,
			reroll_low: None,
			keep: None,
			explode: None,
			multiply: 1,
		}
	}
}

impl Builder {
	/// Sets the source text of the term.
	#[must_use]
	pub fn expression(mut self, expression: impl Into<String>) -> Self {
		self.expression = Some(expression.into());
		self
	}

	/// Sets the number of dice to roll.
	#[must_use]
	pub const fn count(mut self, count: u32) -> Self {
		self.count = count;
		self
	}

	/// Sets the lowest face of each die.
	#[must_use]
	pub const fn base(mut self, base: DieBase) -> Self {
		self.base = base;
		self
	}

	/// Sets the number of faces of each die.
	#[must_use]
	pub const fn sides(mut self, sides: u32) -> Self {
		self.sides = sides;
		self
	}

	/// Rerolls any roll at or below the given value.
	#[must_use]
	pub const fn reroll_low(mut self, low: u32) -> Self {
		self.reroll_low = Some(low);
		self
	}

	/// Sets the policy choosing which rolls are kept.
	#[must_use]
	pub const fn keep(mut self, keep: KeepCount) -> Self {
		self.keep = Some(keep);
		self
	}

	/// Explodes any kept roll at or above the given value.
	#[must_use]
	pub const fn explode(mut self, high: u32) -> Self {
		self.explode = Some(Explode::At(high));
		self
	}

	/// Explodes any kept roll at or above the number of sides.
	#[must_use]
	pub const fn explode_at_sides(mut self) -> Self {
		self.explode = Some(Explode::AtSides);
		self
	}

	/// Sets the factor the sum is multiplied by.
	#[must_use]
	pub const fn multiply(mut self, multiply: u32) -> Self {
		self.multiply = multiply;
		self
	}

	/// Finalizes the dice, applying defaults for every clause that wasn't set.
	///
	/// # Errors
	/// If the dice have no sides or there are no dice to roll, [`Error::InvalidDice`] is returned.
	pub fn build(self) -> Result<ParsedExpression, Error> {
		if self.sides == 0 {
			return Err(Error::InvalidDice("dice must have at least one side"));
		}
		if self.count == 0 {
			return Err(Error::InvalidDice("at least one die must be rolled"));
		}

		let mut dice = ParsedExpression {
			expression: String::new(),
			base: self.base,
			sides: self.sides,
			count: self.count,
			reroll_low: self.reroll_low,
			keep: self.keep.unwrap_or(KeepCount::High(self.count)),
			explode_high: self.explode.map(|explode| match explode {
				Explode::AtSides => self.sides,
				Explode::At(high) => high,
			}),
			multiply: self.multiply,
		};
		dice.expression = match self.expression {
			Some(expression) => expression,
			None => dice.to_string(),
		};

		Ok(dice)
	}
}

/// Sums up roll values, failing on overflow.
pub(crate) fn sum_rolls(rolls: impl IntoIterator<Item = u32>) -> Option<i64> {
	rolls
		.into_iter()
		.try_fold(0_i64, |sum, val| sum.checked_add(i64::from(val)))
}

/// Collects the rolls for a description list, truncating after `list_limit` entries.
pub(crate) fn list_rolls<T: ToString>(rolls: &[T], list_limit: Option<usize>) -> String {
	let list_limit = list_limit.unwrap_or(usize::MAX);
	let truncated_rolls = rolls.len().saturating_sub(list_limit);

	let mut list = rolls
		.iter()
		.take(list_limit)
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join(", ");
	if truncated_rolls > 0 {
		list.push_str(&alloc::format!(", {truncated_rolls} more..."));
	}
	list
}
