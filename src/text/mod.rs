// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The LVM2 text metadata format: lexer, arena-based node tree, and the
//! recursive-descent parser that builds one from the other.

pub mod lexer;
pub mod parser;
pub mod tree;

pub use parser::parse;
pub use tree::{djb2, Node, NodeId, NodeKind, Tree};
