//! Pipeline stages for one extraction invocation.
//!
//! Each submodule implements exactly one transformation step, and the stages
//! run strictly in order; nothing is written until the last one finishes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ extract ──▶ normalize ──▶ assemble
//! (envelope) (base64)  (text layer) (flatten)    (record + status)
//! ```
//!
//! 1. [`input`]    : unwrap the flat / JSON-wrapped / nested envelope into
//!    one canonical field set
//! 2. [`decode`]   : base64 → owned bytes, or the `NO_FILE` branch
//! 3. [`extract`]  : run the text-layer reader on the blocking pool; failures
//!    downgrade to an empty result
//! 4. [`normalize`]: strip control characters and flatten line breaks so the
//!    text fits in one CSV cell
//! 5. [`assemble`] : build the dataset record and the status summary
//!
//! [`stage`] optionally writes the decoded bytes to a temp directory between
//! steps 2 and 3.

pub mod assemble;
pub mod decode;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod stage;
