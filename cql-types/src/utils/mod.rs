pub mod literal;
pub mod parse;
