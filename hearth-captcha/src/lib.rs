//! Pluggable human-verification challenge solving for hearth.
//!
//! Some privileged requests are answered with an hCaptcha challenge that
//! must be solved out of band before the request can be retried. This crate
//! turns that into a single awaited call:
//!
//! ```no_run
//! # async fn run() -> hearth_captcha::CaptchaResult<()> {
//! use hearth_captcha::CaptchaSolver;
//!
//! let solver = CaptchaSolver::new("2captcha", Some("0123456789abcdef0123456789abcdef"))?;
//! let token = solver.solve("a5f74b19-9e45-40e0-b45d-47ff91b7a6c2").await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! A backend is anything implementing [`CaptchaBackend`]. Backends are
//! selected by name through a [`BackendRegistry`], a table from name to
//! factory built at startup. The bundled HTTP backends are compiled behind
//! cargo features:
//!
//! | Name         | Feature      |
//! |--------------|--------------|
//! | `2captcha`   | `twocaptcha` |
//! | `capmonster` | `capmonster` |

mod backend;
mod error;
mod registry;
mod solver;

#[cfg(feature = "capmonster")]
pub mod capmonster;
#[cfg(feature = "twocaptcha")]
pub mod twocaptcha;

pub use backend::{BackendOptions, CaptchaBackend, ChallengeRequest, TARGET_PAGE_URL};
pub use error::{CaptchaError, CaptchaResult};
pub use registry::{BackendFactory, BackendRegistry, KNOWN_BACKENDS};
pub use solver::CaptchaSolver;
