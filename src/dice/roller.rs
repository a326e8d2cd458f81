//! Abstractions for rolling dice using various means, and the rolling algorithm built on top of them.

use alloc::{borrow::Cow, vec::Vec};
use core::iter::Peekable;

#[cfg(feature = "fastrand")]
use fastrand::Rng;

use super::{sum_rolls, DieBase, Error, ParsedExpression, RollSink, RolledDice};

/// Rolls dice - what else is there to say?
pub trait Roller {
	/// Rolls a single die, producing `base + uniform(0, sides - 1)`.
	#[must_use]
	fn roll_die(&mut self, base: DieBase, sides: u32) -> u32;

	/// Gets the value that every die of the given kind rolls, for rollers whose rolls never vary.
	#[must_use]
	#[inline]
	fn fixed_roll(&self, _base: DieBase, _sides: u32) -> Option<u32> {
		None
	}

	/// Verifies that rolling a term with this roller is guaranteed to finish. On top of [`ParsedExpression::check()`],
	/// a roller with a [fixed roll](Self::fixed_roll()) can't roll a term that would reroll or explode that value.
	///
	/// # Errors
	/// If rolling the term would never finish, [`Error::RerollsForever`] or [`Error::ExplodesForever`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::{roller::{Max as MaxRoller, Min as MinRoller, Roller}, Error, ParsedExpression};
	///
	/// let dice = ParsedExpression::builder().sides(6).reroll_low(1).explode_at_sides().build()?;
	/// assert!(dice.check().is_ok());
	/// assert!(matches!(MaxRoller.check(&dice), Err(Error::ExplodesForever { threshold: 6, .. })));
	/// assert!(matches!(MinRoller.check(&dice), Err(Error::RerollsForever { threshold: 1, .. })));
	/// # Ok::<(), Error>(())
	/// ```
	fn check(&self, dice: &ParsedExpression) -> Result<(), Error> {
		dice.check()?;

		if let Some(val) = self.fixed_roll(dice.die_base(), dice.die_sides()) {
			if dice.rerolls(val) {
				return Err(Error::RerollsForever {
					expression: dice.expression().into(),
					threshold: dice.reroll_low().unwrap_or(val),
				});
			}
			if dice.explodes(val) {
				return Err(Error::ExplodesForever {
					expression: dice.expression().into(),
					threshold: dice.explode_high().unwrap_or(val),
				});
			}
		}

		Ok(())
	}

	/// Rolls a dice term, reporting every individual die to the sink as it's rolled, and returns the term's result.
	///
	/// The dice are rolled one after the other, rerolling each while it's at or below the reroll threshold. The
	/// accepted rolls are sorted and split by the keep policy, with the dropped ones being reported. Every kept roll at
	/// or above the explode threshold then adds another die (subject to the same rerolls), repeating for as long as the
	/// newest die explodes too. The result is the sum of the kept rolls and explosions, times the multiplier.
	///
	/// # Errors
	/// If the term would never finish rolling (see [`Self::check()`]), an error variant is returned before
	/// any die is rolled. If the result overflows, [`Error::Overflow`] is returned.
	///
	/// # Examples
	/// ```
	/// use dicetrace::dice::{roller::{Iter as IterRoller, Roller}, trace::Trace, ParsedExpression, RolledDice};
	///
	/// // 3d6r1!5: rerolls ones, explodes on five or six
	/// let dice = ParsedExpression::builder().count(3).sides(6).reroll_low(1).explode(5).build()?;
	/// let mut rng = IterRoller::new([4, 1, 2, 6, 1, 5, 3]);
	/// let mut trace = Trace::default();
	///
	/// // 2 + 4 + 6 from the initial dice, 5 + 3 from the explosions
	/// assert_eq!(rng.roll(&dice, &mut trace)?, 20);
	/// assert!(matches!(trace.rolls[1], RolledDice::PlainReroll(_, 1)));
	/// assert!(matches!(trace.rolls[4], RolledDice::ExplodedReroll(_, 1)));
	/// assert!(matches!(trace.rolls[6], RolledDice::ExplodedRoll(_, 3)));
	/// # Ok::<(), dicetrace::dice::Error>(())
	/// ```
	fn roll(&mut self, dice: &ParsedExpression, sink: &mut impl RollSink) -> Result<i64, Error>
	where
		Self: Sized,
	{
		self.check(dice)?;

		// Roll the dice!
		let mut rolls = Vec::with_capacity(dice.dice_count() as usize);
		for _ in 0..dice.dice_count() {
			rolls.push(roll_and_report(self, dice, sink, false));
		}

		// Apply the keep policy
		rolls.sort_unstable();
		let (kept, dropped) = dice.keep_count().partition(&rolls);
		for val in dropped {
			sink.roll(RolledDice::DroppedRoll(Cow::Borrowed(dice), val));
		}

		// Explode kept rolls that qualify, chaining for as long as the explosions qualify too
		let mut explosions = Vec::new();
		for &val in &kept {
			let mut exploding = dice.explodes(val);
			while exploding {
				let explosion = roll_and_report(self, dice, sink, true);
				exploding = dice.explodes(explosion);
				explosions.push(explosion);
			}
		}

		let overflow = || Error::Overflow(dice.expression().into());
		sum_rolls(kept)
			.zip(sum_rolls(explosions))
			.and_then(|(kept, exploded)| kept.checked_add(exploded))
			.and_then(|sum| sum.checked_mul(i64::from(dice.multiply())))
			.ok_or_else(overflow)
	}
}

/// Rolls a single die of a term until it's above the reroll threshold, reporting every attempt, and returns the
/// accepted value.
fn roll_and_report(
	rng: &mut impl Roller,
	dice: &ParsedExpression,
	sink: &mut impl RollSink,
	explosion: bool,
) -> u32 {
	loop {
		let val = rng.roll_die(dice.die_base(), dice.die_sides());
		let expr = Cow::Borrowed(dice);

		if dice.rerolls(val) {
			sink.roll(if explosion {
				RolledDice::ExplodedReroll(expr, val)
			} else {
				RolledDice::PlainReroll(expr, val)
			});
		} else {
			sink.roll(if explosion {
				RolledDice::ExplodedRoll(expr, val)
			} else {
				RolledDice::PlainRoll(expr, val)
			});
			return val;
		}
	}
}

/// Generates rolls with random values using [fastrand]. Requires the `fastrand` feature (enabled by default).
///
/// # Examples
///
/// ## Default fastrand roller
/// ```
/// use dicetrace::dice::{roller::{FastRand as FastRandRoller, Roller}, trace::Ignore, ParsedExpression};
///
/// let mut roller = FastRandRoller::default();
///
/// let dice = ParsedExpression::builder().count(4).sides(6).build()?;
/// let _ = roller.roll(&dice, &mut Ignore)?;
/// let _ = roller.roll(&dice, &mut Ignore)?;
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
///
/// ## Manually seeded fastrand roller
/// ```
/// use dicetrace::dice::{roller::{FastRand as FastRandRoller, Roller}, trace::Ignore, ParsedExpression};
///
/// let dice = ParsedExpression::builder().count(4).sides(6).build()?;
///
/// let first = FastRandRoller::with_seed(0x750c38d574400).roll(&dice, &mut Ignore)?;
/// let second = FastRandRoller::with_seed(0x750c38d574400).roll(&dice, &mut Ignore)?;
/// assert_eq!(first, second);
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[cfg(feature = "fastrand")]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "std", derive(Default))]
pub struct FastRand(Rng);

#[cfg(feature = "fastrand")]
impl FastRand {
	/// Creates a new fastrand roller that uses the given RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub const fn new(rng: Rng) -> Self {
		Self(rng)
	}

	/// Creates a new fastrand roller that uses a pre-seeded RNG instance to generate rolls.
	#[must_use]
	#[inline]
	pub fn with_seed(seed: u64) -> Self {
		Self(Rng::with_seed(seed))
	}
}

#[cfg(feature = "fastrand")]
impl Roller for FastRand {
	/// Rolls a single die using the [`fastrand::Rng`] the roller was created with.
	#[inline]
	fn roll_die(&mut self, base: DieBase, sides: u32) -> u32 {
		if sides > 0 {
			base.face(self.0.u32(0..sides))
		} else {
			base.value()
		}
	}
}

/// Generates rolls that always have a specific value. Terms that would reroll or explode the value can't be rolled with
/// it (see [`Roller::check()`]).
///
/// # Examples
/// ```
/// use dicetrace::dice::{roller::{Roller, Val as ValRoller}, trace::Ignore, ParsedExpression};
///
/// let mut roller = ValRoller(42);
///
/// let dice = ParsedExpression::builder().count(4).sides(6).build()?;
/// assert_eq!(roller.roll(&dice, &mut Ignore)?, 168);
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Val(pub u32);

impl Roller for Val {
	/// Rolls a single die, always with one specific value.
	#[inline]
	fn roll_die(&mut self, _base: DieBase, _sides: u32) -> u32 {
		self.0
	}

	#[inline]
	fn fixed_roll(&self, _base: DieBase, _sides: u32) -> Option<u32> {
		Some(self.0)
	}
}

/// Generates rolls that always have their lowest value. Terms that reroll the lowest value can't be rolled with it.
///
/// # Examples
/// ```
/// use dicetrace::dice::{roller::{Min as MinRoller, Roller}, trace::Ignore, DieBase, ParsedExpression};
///
/// let mut roller = MinRoller;
///
/// let dice = ParsedExpression::builder().count(4).sides(6).build()?;
/// assert_eq!(roller.roll(&dice, &mut Ignore)?, 4);
///
/// let dice = ParsedExpression::builder().count(4).base(DieBase::Zero).sides(6).build()?;
/// assert_eq!(roller.roll(&dice, &mut Ignore)?, 0);
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Min;

impl Roller for Min {
	/// Rolls a single die, always with the lowest face value.
	#[inline]
	fn roll_die(&mut self, base: DieBase, _sides: u32) -> u32 {
		base.value()
	}

	#[inline]
	fn fixed_roll(&self, base: DieBase, _sides: u32) -> Option<u32> {
		Some(base.value())
	}
}

/// Generates rolls that always have their highest value. Terms that explode on the highest value can't be rolled with
/// it.
///
/// # Examples
/// ```
/// use dicetrace::dice::{roller::{Max as MaxRoller, Roller}, trace::Ignore, DieBase, ParsedExpression};
///
/// let mut roller = MaxRoller;
///
/// let dice = ParsedExpression::builder().count(4).sides(6).build()?;
/// assert_eq!(roller.roll(&dice, &mut Ignore)?, 24);
///
/// let dice = ParsedExpression::builder().count(2).base(DieBase::Zero).sides(20).build()?;
/// assert_eq!(roller.roll(&dice, &mut Ignore)?, 38);
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
#[expect(clippy::exhaustive_structs, reason = "Highly unlikely to change")]
pub struct Max;

impl Roller for Max {
	/// Rolls a single die, always with the highest face value.
	#[inline]
	fn roll_die(&mut self, base: DieBase, sides: u32) -> u32 {
		base.face(sides.saturating_sub(1))
	}

	#[inline]
	fn fixed_roll(&self, base: DieBase, sides: u32) -> Option<u32> {
		Some(base.face(sides.saturating_sub(1)))
	}
}

/// Generates rolls from an iterator of values. Mainly useful for testing purposes.
///
/// # Examples
/// ```
/// use dicetrace::dice::{roller::{Iter as IterRoller, Roller}, trace::Trace, ParsedExpression};
///
/// let mut roller = IterRoller::new(vec![1, 2, 3, 4, 10]);
/// let dice = ParsedExpression::builder().count(5).sides(6).build()?;
/// let mut trace = Trace::new();
/// assert_eq!(roller.roll(&dice, &mut trace)?, 20);
/// assert_eq!(trace.rolls.iter().map(|rolled| rolled.val()).collect::<Vec<_>>(), [1, 2, 3, 4, 10]);
/// assert!(!roller.can_roll());
/// # Ok::<(), dicetrace::dice::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Iter<I: Iterator<Item = u32>>(Peekable<I>);

impl<I: Iterator<Item = u32>> Iter<I> {
	/// Checks whether the iterator still has values available.
	#[inline]
	pub fn can_roll(&mut self) -> bool {
		self.0.peek().is_some()
	}

	/// Creates a new roller that uses the given iterator to provide roll values.
	#[must_use]
	#[inline]
	pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
		Self(iter.into_iter().peekable())
	}
}

impl<I: Iterator<Item = u32>> Roller for Iter<I> {
	/// Rolls a die with the value from the next iteration.
	///
	/// # Panics
	/// If the iterator has finished, this will panic.
	#[inline]
	#[expect(
		clippy::expect_used,
		reason = "Mostly for testing, otherwise manual checking of can_roll() is expected"
	)]
	fn roll_die(&mut self, _base: DieBase, _sides: u32) -> u32 {
		self.0.next().expect("iterator is finished")
	}
}
