#[cfg(feature = "build-binary")]
fn main() -> std::process::ExitCode {
	use std::{
		env,
		io::{self, BufRead},
		process::ExitCode,
	};

	use ariadne::{Color, Label, Report, ReportKind, Source};
	use dicetrace::{
		dice::{roller::FastRand, trace::Trace},
		expr::Describe,
		parse::{self, ParseError},
	};

	pretty_env_logger::init();

	let args = env::args();
	let inputs = if args.len() > 1 {
		// Obtain the expression by combining all args passed to the executable, so that it can be left unquoted
		// even with spaces. The first argument is ignored since it is typically the name of the executable itself.
		vec![args.skip(1).collect::<Vec<String>>().join(" ")]
	} else {
		// Otherwise, roll every line from stdin as its own expression
		io::stdin().lock().lines().map_while(Result::ok).collect()
	};

	let mut rng = FastRand::default();
	let mut failed = false;

	for input in inputs.iter().filter(|input| !input.trim().is_empty()) {
		let expr = match parse::parse(input) {
			Ok(expr) => expr,
			Err(errs) => {
				failed = true;
				for err in &errs {
					// Input is a single line, so the column is the character offset
					let pos = err.column().saturating_sub(1);
					let label = match err {
						ParseError::Unexpected { found, .. } => format!("unexpected '{found}'"),
						ParseError::Incomplete { .. } => "expression ends here".to_owned(),
						ParseError::Invalid { message, .. } => message.clone(),
						_ => err.to_string(),
					};

					let _ = Report::build(ReportKind::Error, ("input", pos..pos))
						.with_message(err.to_string())
						.with_label(
							Label::new(("input", pos..pos.saturating_add(1)))
								.with_message(label)
								.with_color(Color::Red),
						)
						.finish()
						.eprint(("input", Source::from(input.as_str())));
				}
				continue;
			}
		};

		let mut trace = Trace::new();
		match expr.eval(&mut rng, &mut trace) {
			Ok(evaled) => {
				println!("{}", trace.describe(None));
				println!("{evaled} = {}", evaled.total);
			}
			Err(err) => {
				failed = true;
				eprintln!("Evaluation error: {err}");
			}
		}
	}

	if failed {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	}
}

#[cfg(not(feature = "build-binary"))]
fn main() {
	println!("Nothing to do since the build-binary feature is disabled.");
}
