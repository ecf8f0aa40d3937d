/*!
Small helpers shared by the datadee crates.
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod finite;
pub mod progress_counter;
