// SPDX-License-Identifier: Unlicense
pub mod ast;
pub mod driver;
pub mod dump;
pub mod error;
pub mod group;
pub mod optimizer;
pub mod parser;
pub mod structure;
pub mod validate;
