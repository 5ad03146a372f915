//! Bounded-concurrency HTTP request scheduling over a multiplexed transport.
//!
//! ```no_run
//! use muxcurl_core::{Request, Scheduler};
//!
//! let mut scheduler = Scheduler::with_curl();
//! scheduler.set_multiplex_limit(2);
//! for page in 0..4 {
//!     let url = format!("https://example.com/search?offset={}", page * 10);
//!     scheduler.add_request(Request::get(&url)?);
//! }
//! for response in scheduler.run()? {
//!     println!("{} {}", response.status(), response.url());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod logging;

pub mod request;
pub mod response;
pub mod scheduler;
pub mod throttle;
pub mod transport;

pub use request::{Request, RequestError};
pub use response::Response;
pub use scheduler::{Scheduler, SchedulerError};
pub use throttle::{OpenThrottle, SlidingWindow, Throttle};
pub use transport::{CurlTransport, Transport, TransportError};
