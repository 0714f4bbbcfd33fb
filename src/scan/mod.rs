//! Discovery engines.
//!
//! Both engines are pure functions over a [`DocumentSnapshot`]: the same
//! snapshot always yields the same result, whether it was captured from a
//! live page or built from static markup.
//!
//! [`DocumentSnapshot`]: crate::snapshot::DocumentSnapshot

pub mod emails;
pub mod links;
