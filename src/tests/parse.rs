use chumsky::Parser;

use crate::{
	dice::{
		roller::{Iter as IterRoller, Max as MaxRoller, Min as MinRoller},
		trace::{Ignore, Trace},
		DieBase, KeepCount, ParsedExpression,
	},
	expr::Sign,
	parse::{self, ParseError, RollError},
};

#[test]
fn bare_die() {
	let dice: ParsedExpression = "d20".parse().unwrap();
	assert_eq!(dice.dice_count(), 1);
	assert_eq!(dice.die_base(), DieBase::One);
	assert_eq!(dice.die_sides(), 20);
	assert_eq!(dice.keep_count(), KeepCount::High(1));
	assert_eq!(dice.expression(), "d20");
}

#[test]
fn percentile_die() {
	let dice: ParsedExpression = "2d%".parse().unwrap();
	assert_eq!(dice.die_sides(), 100);

	let dice: ParsedExpression = "z%".parse().unwrap();
	assert_eq!(dice.die_base(), DieBase::Zero);
	assert_eq!(dice.max_roll(), 99);
}

#[test]
fn every_clause() {
	let dice: ParsedExpression = "4z10r1l3!9x2".parse().unwrap();
	assert_eq!(dice.dice_count(), 4);
	assert_eq!(dice.die_base(), DieBase::Zero);
	assert_eq!(dice.die_sides(), 10);
	assert_eq!(dice.reroll_low(), Some(1));
	assert_eq!(dice.keep_count(), KeepCount::Low(3));
	assert_eq!(dice.explode_high(), Some(9));
	assert_eq!(dice.multiply(), 2);
}

#[test]
fn keep_policies() {
	for (text, keep) in [
		("4d6h3", KeepCount::High(3)),
		("4d6l1", KeepCount::Low(1)),
		("5d6mh3", KeepCount::MiddleHigh(3)),
		("5d6ml3", KeepCount::MiddleLow(3)),
	] {
		let dice: ParsedExpression = text.parse().unwrap();
		assert_eq!(dice.keep_count(), keep, "{text}");
	}
}

#[test]
fn explode_thresholds() {
	let dice: ParsedExpression = "3d6!".parse().unwrap();
	assert_eq!(dice.explode_high(), Some(6));

	let dice: ParsedExpression = "3d6!5".parse().unwrap();
	assert_eq!(dice.explode_high(), Some(5));

	let dice: ParsedExpression = "3d6".parse().unwrap();
	assert_eq!(dice.explode_high(), None);
}

#[test]
fn both_multiply_symbols() {
	for text in ["2d6x3", "2d6*3", "2D6X3"] {
		let dice: ParsedExpression = text.parse().unwrap();
		assert_eq!(dice.multiply(), 3, "{text}");
	}
}

#[test]
fn case_insensitive_with_original_text() {
	let dice: ParsedExpression = "3D6R1H2!".parse().unwrap();
	assert_eq!(dice.expression(), "3D6R1H2!");
	assert_eq!(dice.to_string(), "3d6r1h2!");
	assert_eq!(dice.reroll_low(), Some(1));
	assert_eq!(dice.keep_count(), KeepCount::High(2));
}

#[test]
fn full_expression() {
	let expr = parse::parse("  3d6h2!6x2 +\t1d4 - 2d8 - 3 ").unwrap();
	assert_eq!(
		expr.terms()
			.iter()
			.map(|term| (term.sign, term.dice.expression()))
			.collect::<Vec<_>>(),
		[(Sign::Plus, "3d6h2!6x2"), (Sign::Plus, "1d4"), (Sign::Minus, "2d8")]
	);
	assert_eq!(expr.adjustment(), -3);
	assert_eq!(expr.to_string(), "3d6h2!x2 + 1d4 - 2d8 - 3");
}

#[test]
fn terms_without_whitespace() {
	let expr = parse::parse("d20+5").unwrap();
	assert_eq!(expr.terms().len(), 1);
	assert_eq!(expr.adjustment(), 5);
}

#[test]
fn parser_generator() {
	let input = "2d6 + 1";
	let expr = parse::expr(input).parse(input).into_result().unwrap();
	assert_eq!(expr.adjustment(), 1);

	let number = parse::number().parse("42").into_result().unwrap();
	assert_eq!(number, 42);
	assert!(parse::number().parse("042").has_errors());
}

#[test]
fn leading_zeros() {
	for text in ["05d6", "d06", "d0", "3d6r01", "3d6 + 07"] {
		assert!(parse::parse(text).is_err(), "{text}");
	}

	let errs = parse::parse("d0").unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Unexpected { found: '0', column: 2, .. }]));
}

#[test]
fn whitespace_inside_term() {
	for text in ["3 d6", "3d 6", "3d6 h2", "3d6! 5"] {
		assert!(parse::parse(text).is_err(), "{text}");
	}
}

#[test]
fn constant_must_come_last() {
	assert!(parse::parse("1d6+3+1d4").is_err());
	assert!(parse::parse("1d6+3+1").is_err());
	assert!(parse::parse("3").is_err());
}

#[test]
fn single_term_only() {
	assert!("3d6 + 1d4".parse::<ParsedExpression>().is_err());
	assert!(" 3d6".parse::<ParsedExpression>().is_err());
	assert!("3d6".parse::<ParsedExpression>().is_ok());
}

#[test]
fn constant_position() {
	let errs = parse::parse("1d6+3+1d4").unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Unexpected { found: '+', column: 6, .. }]));
}

#[test]
fn huge_numbers() {
	for (text, column) in [
		("99999999999d6", 1),
		("d99999999999", 2),
		("3d6r99999999999", 5),
		("2d6 + 99999999999", 7),
	] {
		let errs = parse::parse(text).unwrap_err();
		assert_eq!(
			errs.0,
			[ParseError::Invalid {
				message: "Invalid number: number too large to fit in target type".to_owned(),
				line: 1,
				column,
				input: text.to_owned(),
			}],
			"{text}"
		);
	}

	let errs = "3d6!99999999999".parse::<ParsedExpression>().unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Invalid { column: 5, .. }]));
	assert_eq!(
		errs.to_string(),
		"Invalid number: number too large to fit in target type (at position 5) in dice expression '3d6!99999999999'"
	);
}

#[test]
fn unexpected_character() {
	let errs = parse::parse("3d6 + X").unwrap_err();
	assert_eq!(
		errs.0,
		[ParseError::Unexpected {
			found: 'X',
			line: 1,
			column: 7,
			input: "3d6 + X".to_owned(),
		}]
	);
	assert_eq!(errs.to_string(), "Unexpected 'X' (at position 7) in dice expression '3d6 + X'");

	let errs = parse::parse("3d6 + 1d4 - x").unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Unexpected { found: 'x', column: 13, .. }]));

	let errs = parse::parse("3d6 + + 1d4").unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Unexpected { found: '+', column: 7, .. }]));
}

#[test]
fn clauses_need_their_numbers() {
	for text in ["3d6h", "4d6mh", "4d6l", "2d6x", "2d6*", "3d6r", "z"] {
		let errs = parse::parse(text).unwrap_err();
		assert_eq!(
			errs.0,
			[ParseError::Incomplete {
				line: 1,
				column: text.len() + 1,
				input: text.to_owned(),
			}],
			"{text}"
		);
	}

	for (text, found, column) in [("3d6r?", '?', 5), ("4d6ml+1", '+', 6), ("2dQ", 'Q', 3), ("3d6h0", '0', 5)] {
		let errs = parse::parse(text).unwrap_err();
		assert!(
			matches!(
				errs.0.as_slice(),
				[ParseError::Unexpected { found: f, column: c, .. }] if *f == found && *c == column
			),
			"{text}: {errs:?}"
		);
	}

	let errs = "3d6l".parse::<ParsedExpression>().unwrap_err();
	assert!(matches!(errs.0.as_slice(), [ParseError::Incomplete { column: 5, .. }]));
}

#[test]
fn incomplete() {
	for text in ["", "3d", "3d6 +", "3d6r"] {
		let errs = parse::parse(text).unwrap_err();
		assert!(
			errs.iter().all(|err| matches!(err, ParseError::Incomplete { .. })),
			"{text}: {errs}"
		);
		assert_eq!(errs.to_string(), format!("Incomplete dice expression '{text}'"));
	}
}

#[test]
fn error_location() {
	let errs = parse::parse("3d6 +\n 1d4!?").unwrap_err();
	let err = errs.iter().next().unwrap();
	assert_eq!(err.line(), 1);
	assert_eq!(err.column(), 6);
	assert_eq!(err.line_text(), "3d6 +");
	assert_eq!(err.input(), "3d6 +\n 1d4!?");
}

#[test]
fn roll_expression() {
	let mut trace = Trace::new();
	let total = parse::roll("2d6 - 1d4 + 3", &mut IterRoller::new([2, 5, 4]), &mut trace).unwrap();
	assert_eq!(total, 6);
	assert_eq!(trace.to_string(), "2d6[2, 5] 1d4[4]");

	assert_eq!(parse::roll("4d6h3", &mut MaxRoller, &mut Ignore).unwrap(), 18);
	assert_eq!(parse::roll("4d6h3", &mut MinRoller, &mut Ignore).unwrap(), 3);
}

#[test]
fn roll_errors() {
	let mut rng = IterRoller::new(Vec::<u32>::new());
	assert!(matches!(
		parse::roll("3d6 + blah", &mut rng, &mut Ignore),
		Err(RollError::Syntax(..))
	));
	assert!(matches!(
		parse::roll("2d6 + 1d6r6", &mut rng, &mut Ignore),
		Err(RollError::Eval(..))
	));
	assert!(matches!(
		parse::roll("3d6r3!4", &mut rng, &mut Ignore),
		Err(RollError::Eval(..))
	));
}

#[test]
fn known_sequence_repeats() {
	let rolls = [2, 3, 5];
	let mut first = Trace::new();
	let mut second = Trace::new();

	assert_eq!(parse::roll("3d6", &mut IterRoller::new(rolls), &mut first).unwrap(), 10);
	assert_eq!(parse::roll("3d6", &mut IterRoller::new(rolls), &mut second).unwrap(), 10);
	assert_eq!(first, second);
}

#[cfg(feature = "fastrand")]
#[test]
fn seeded_expression_repeats() {
	use crate::dice::roller::FastRand as FastRandRoller;

	let expr = parse::parse("10d3! + 10d3!2 - 4d6r1mh2").unwrap();
	let mut first = Trace::new();
	let mut second = Trace::new();
	let first_total = expr.eval(&mut FastRandRoller::with_seed(42), &mut first).unwrap().total;
	let second_total = expr.eval(&mut FastRandRoller::with_seed(42), &mut second).unwrap().total;

	assert_eq!(first_total, second_total);
	assert_eq!(first, second);
}
