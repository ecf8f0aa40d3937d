/*!
This crate is an implementation of ordinary least squares linear regression, [`Regressor`](struct.Regressor.html). Training solves the normal equations exactly, so the result does not depend on a learning rate or the number of epochs.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod regressor;

pub use self::regressor::Regressor;
