use crate::{
	dice::{
		roller::{Iter as IterRoller, Max as MaxRoller, Min as MinRoller},
		trace::{Ignore, Trace},
		Error as DiceError, KeepCount, ParsedExpression,
	},
	expr::{Describe, EvalError, Expr, Sign},
};

#[test]
fn single_term() {
	let expr = Expr::new(d(3, 6));
	let evaled = expr.eval(&mut IterRoller::new([2, 4, 6]), &mut Ignore).unwrap();
	assert_eq!(evaled.totals, [12]);
	assert_eq!(evaled.total, 12);
	assert_eq!(evaled.expr, &expr);
}

#[test]
fn terms_roll_in_order() {
	let expr = Expr::new(d(2, 6)).minus(d(1, 4)).plus(d(1, 8)).adjust(3);
	let mut trace = Trace::new();
	let evaled = expr.eval(&mut IterRoller::new([1, 2, 4, 8]), &mut trace).unwrap();

	assert_eq!(evaled.totals, [3, 4, 8]);
	assert_eq!(evaled.total, 10);
	assert_eq!(trace.describe(None), "2d6[1, 2] 1d4[4] 1d8[8]");
	assert_eq!(evaled.describe(None), "2d6 (3) - 1d4 (4) + 1d8 (8) + 3");
}

#[test]
fn negative_total() {
	let expr = Expr::new(d(1, 4)).minus(d(2, 20)).adjust(-5);
	let evaled = expr.eval(&mut MinRoller, &mut Ignore).unwrap();
	assert_eq!(evaled.total, -6);

	let evaled = expr.eval(&mut MaxRoller, &mut Ignore).unwrap();
	assert_eq!(evaled.total, -41);
}

#[test]
fn every_term_is_checked_before_rolling() {
	let endless = ParsedExpression::builder()
		.sides(1)
		.explode_at_sides()
		.build()
		.unwrap();
	let expr = Expr::new(d(1, 6)).plus(endless.clone());
	let mut rng = IterRoller::new([3]);
	let mut trace = Trace::new();

	let result = expr.eval(&mut rng, &mut trace);
	assert!(matches!(
		result,
		Err(EvalError::Dice(dice, DiceError::ExplodesForever { .. })) if dice == endless
	));
	assert!(trace.rolls.is_empty());
	assert!(rng.can_roll());
}

#[test]
fn constant_roller_is_checked_before_rolling() {
	let exploding = ParsedExpression::builder().sides(6).explode_at_sides().build().unwrap();
	let expr = Expr::new(d(2, 6)).plus(exploding);
	let mut trace = Trace::new();

	assert!(matches!(
		expr.eval(&mut MaxRoller, &mut trace),
		Err(EvalError::Dice(_, DiceError::ExplodesForever { .. }))
	));
	assert!(trace.rolls.is_empty());
	assert_eq!(expr.eval(&mut MinRoller, &mut trace).unwrap().total, 3);
}

#[test]
fn overflow() {
	let expr = Expr::new(d(1, 6)).adjust(i64::MAX);
	assert!(matches!(
		expr.eval(&mut MaxRoller, &mut Ignore),
		Err(EvalError::Overflow(overflowed)) if overflowed == expr
	));

	let expr = Expr::new(d(1, 6)).minus(d(1, 6)).adjust(i64::MIN);
	assert!(matches!(expr.eval(&mut MaxRoller, &mut Ignore), Ok(evaled) if evaled.total == i64::MIN));
}

#[test]
fn display() {
	let keep = ParsedExpression::builder()
		.count(4)
		.sides(6)
		.keep(KeepCount::High(3))
		.build()
		.unwrap();
	assert_eq!(Expr::new(keep.clone()).to_string(), "4d6h3");
	assert_eq!(Expr::new(keep.clone()).adjust(-2).to_string(), "4d6h3 - 2");
	assert_eq!(
		Expr::new(keep).then(Sign::Minus, d(1, 4)).adjust(1).to_string(),
		"4d6h3 - 1d4 + 1"
	);
}

#[test]
fn accessors() {
	let expr = Expr::new(d(2, 6)).minus(d(1, 4)).adjust(7);
	assert_eq!(expr.adjustment(), 7);
	assert_eq!(
		expr.terms().iter().map(|term| term.sign).collect::<Vec<_>>(),
		[Sign::Plus, Sign::Minus]
	);
	assert_eq!(expr.terms()[1].dice, d(1, 4));
}

#[test]
fn sign() {
	assert_eq!(Sign::Plus.apply(5), Some(5));
	assert_eq!(Sign::Minus.apply(5), Some(-5));
	assert_eq!(Sign::Minus.apply(i64::MIN), None);
	assert_eq!(Sign::Minus.to_string(), "-");
}

#[test]
fn eval_error_messages() {
	let dice = ParsedExpression::builder().sides(6).reroll_low(6).build().unwrap();
	let err = Expr::new(dice).eval(&mut MinRoller, &mut Ignore).unwrap_err();
	assert_eq!(
		err.to_string(),
		"dice error while evaluating \"1d6r6\": dice expression '1d6r6' would reroll forever (rerolling on 6 or lower)"
	);
}

fn d(count: u32, sides: u32) -> ParsedExpression {
	ParsedExpression::builder().count(count).sides(sides).build().unwrap()
}
