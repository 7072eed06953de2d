//! Text extraction and name-candidate extraction.
//!
//! The stages run in this order for every article:
//!
//! 1. [`strip`]: serialized markup -> plain text
//! 2. [`segment`]: plain text -> sentences -> word tokens
//! 3. [`tagger`]: word tokens -> part-of-speech tags (model set up by [`model`])
//! 4. [`names`]: tagged sentences -> multi-word name candidates
//! 5. [`dedup`]: run-wide exact-duplicate removal

pub mod dedup;
pub mod model;
pub mod names;
pub mod segment;
pub mod strip;
pub mod tagger;
