#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::redundant_pub_crate,
    clippy::unused_async
)]

pub mod model;
pub mod routes;
mod utils;

pub use utils::{config, error};
pub use utils::tracing::{setup_tracing, Html2PngTracing};
