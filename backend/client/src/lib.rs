//! # Client
//!
//! Page logic of the vocabulary manager, independent of any UI framework.
//!
//! ## Pages
//! - Word page ([`view::WordView`]): similar words, search box, pending selections
//! - Create page ([`creation::CreationForm`]): dictionary-assisted word creation
//!
//! ## Timing
//! - Search debounce: 300 ms, latest request wins
//! - Dictionary debounce: 500 ms
//!
//! ## Notes
//! - Every network call is a suspension point, nothing blocks the page
//! - Nothing retries on its own, the user re-clicks or re-types
pub mod api;
pub mod creation;
pub mod debounce;
pub mod error;
pub mod reconciler;
pub mod search;
pub mod view;

pub use api::{HttpApi, VocabApi};
pub use error::ClientError;
