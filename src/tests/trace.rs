use std::borrow::Cow;

use crate::{
	dice::{
		roller::{Iter as IterRoller, Roller},
		trace::{Ignore, Trace},
		KeepCount, ParsedExpression, RollSink, RolledDice,
	},
	expr::{Describe, Expr, Sign},
};

#[test]
fn describe_with_every_kind_of_roll() {
	let dice = ParsedExpression::builder()
		.expression("3d6r1h2!")
		.count(3)
		.sides(6)
		.reroll_low(1)
		.keep(KeepCount::High(2))
		.explode_at_sides()
		.build()
		.unwrap();
	let mut trace = Trace::new();
	IterRoller::new([1, 4, 2, 6, 1, 3]).roll(&dice, &mut trace).unwrap();

	assert_eq!(trace.describe(None), "3d6r1h2![1 (r), 4, 2, 6, 2 (d), 1 (x) (r), 3 (x)]");
	assert_eq!(trace.describe(Some(3)), "3d6r1h2![1 (r), 4, 2, 4 more...]");
	assert_eq!(trace.to_string(), trace.describe(None));
}

#[test]
fn describe_groups_consecutive_terms() {
	let d6 = ParsedExpression::builder().count(2).sides(6).build().unwrap();
	let d4 = ParsedExpression::builder().sides(4).build().unwrap();
	let mut rng = IterRoller::new([3, 5, 2, 6, 6]);
	let mut trace = Trace::new();

	rng.roll(&d6, &mut trace).unwrap();
	rng.roll(&d4, &mut trace).unwrap();
	rng.roll(&d6, &mut trace).unwrap();
	assert_eq!(trace.describe(None), "2d6[3, 5] 1d4[2] 2d6[6, 6]");
	assert_eq!(trace.describe(Some(1)), "2d6[3, 1 more...] 1d4[2] 2d6[6, 1 more...]");
}

#[test]
fn empty_trace() {
	let trace = Trace::default();
	assert_eq!(trace.describe(None), "");
	assert_eq!(trace.total(), Some(0));
}

#[test]
fn clear() {
	let dice = ParsedExpression::builder().count(2).sides(6).build().unwrap();
	let mut trace = Trace::new();
	IterRoller::new([1, 2]).roll(&dice, &mut trace).unwrap();
	assert_eq!(trace.rolls.len(), 2);

	trace.clear();
	assert!(trace.rolls.is_empty());
}

#[test]
fn owned_rolls_outlive_their_dice() {
	let rolled = {
		let dice = ParsedExpression::builder().sides(6).build().unwrap();
		RolledDice::ExplodedRoll(Cow::Borrowed(&dice), 6).into_owned()
	};
	assert!(rolled.is_explosion());
	assert!(!rolled.is_reroll());
	assert_eq!(rolled.val(), 6);
	assert_eq!(rolled.expression().expression(), "1d6");
	assert_eq!(rolled.to_string(), "6 (x)");
}

#[test]
fn ignore_and_trace_see_the_same_result() {
	let dice = ParsedExpression::builder()
		.count(5)
		.sides(10)
		.keep(KeepCount::MiddleLow(3))
		.multiply(2)
		.build()
		.unwrap();
	let rolls = [7, 2, 9, 4, 10];

	let mut trace = Trace::new();
	let traced = IterRoller::new(rolls).roll(&dice, &mut trace).unwrap();
	let ignored = IterRoller::new(rolls).roll(&dice, &mut Ignore).unwrap();

	// Sorted [2, 4, 7, 9, 10] keeps [4, 7, 9]
	assert_eq!(traced, 40);
	assert_eq!(traced, ignored);
	assert_eq!(trace.total(), Some(traced));
}

#[test]
fn custom_sink() {
	#[derive(Default)]
	struct Counts {
		rolled: usize,
		dropped: usize,
	}

	impl RollSink for Counts {
		fn roll(&mut self, rolled: RolledDice<'_>) {
			if rolled.is_dropped() {
				self.dropped += 1;
			} else {
				self.rolled += 1;
			}
		}
	}

	let dice = ParsedExpression::builder()
		.count(4)
		.sides(6)
		.keep(KeepCount::Low(1))
		.build()
		.unwrap();
	let mut counts = Counts::default();
	IterRoller::new([3, 3, 4, 5]).roll(&dice, &mut counts).unwrap();
	assert_eq!(counts.rolled, 4);
	assert_eq!(counts.dropped, 3);
}

#[test]
fn subtracted_terms_total() {
	let d6 = ParsedExpression::builder().count(2).sides(6).build().unwrap();
	let d4 = ParsedExpression::builder()
		.count(2)
		.sides(4)
		.keep(KeepCount::High(1))
		.multiply(2)
		.build()
		.unwrap();
	let expr = Expr::new(d6).minus(d4).adjust(-1);
	let mut trace = Trace::new();

	// 2 + 5 - (4 * 2)
	let evaled = expr.eval(&mut IterRoller::new([2, 5, 1, 4]), &mut trace).unwrap();
	assert_eq!(evaled.total, -2);
	assert_eq!(trace.terms, [(Sign::Plus, 0), (Sign::Minus, 2)]);
	assert_eq!(trace.total(), Some(-1));
	assert_eq!(trace.total().unwrap() + expr.adjustment(), evaled.total);

	trace.clear();
	assert!(trace.terms.is_empty());
	assert_eq!(trace.total(), Some(0));
}

#[test]
fn identical_terms_stay_apart() {
	let d6 = ParsedExpression::builder().sides(6).build().unwrap();
	let expr = Expr::new(d6.clone()).plus(d6);
	let mut trace = Trace::new();

	expr.eval(&mut IterRoller::new([3, 4]), &mut trace).unwrap();
	assert_eq!(trace.describe(None), "1d6[3] 1d6[4]");
	assert_eq!(trace.total(), Some(7));
}
