#![warn(clippy::pedantic)]
// Noisy doc/signature lints — would require annotating most pub functions
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
// Style preference — keeping format!("{}", x) over format!("{x}") for readability with complex exprs
#![allow(clippy::uninlined_format_args)]
// Intentional casts in timestamp/size handling
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Module structure — cache::CacheManager, session::SessionStore etc. by design
#![allow(clippy::module_name_repetitions)]

pub mod bus;
pub mod cache;
pub mod channels;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod session;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
