//! Rule compilation and evaluation
//!
//! This module turns rule strings like "age > 18 AND status = 'active'"
//! into expression trees, evaluates them against records, combines several
//! rules into one tree and converts trees to and from their portable form.

mod ast;
pub mod cache;
pub mod combiner;
mod evaluator;
mod fields;
pub mod parser;
pub mod portable;
mod tokenizer;


pub use ast::*;
pub use cache::*;
pub use combiner::*;
pub use evaluator::*;
pub use fields::*;
pub use parser::*;
pub use portable::{from_json, from_portable, to_json, to_portable, PortableNode, PortableTree, PortableValue};
pub use tokenizer::*;
