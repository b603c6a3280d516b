//! Built-in mutators.
//!
//! | Mutator | Priority | Description |
//! |---------|----------|-------------|
//! | [`AssertMessageMutator`] | 5 | Adds the asserted condition's source text as the assertion message |

mod assertmessage;

pub use assertmessage::{AssertMessageMutator, SignatureTable};
