mod expr;
#[cfg(feature = "parse")]
mod parse;
mod trace;
