//! V1 EIP-155 "exact" payment scheme, client side.
//!
//! The payer authorizes an exact-amount ERC-3009 `transferWithAuthorization`
//! by signing EIP-712 typed data. The signed authorization travels in the
//! `X-Payment` header as Base64 of a JSON envelope:
//!
//! ```json
//! {
//!   "x402Version": 1,
//!   "scheme": "exact",
//!   "network": "base-sepolia",
//!   "payload": {
//!     "signature": "0x…",
//!     "authorization": {
//!       "from": "0x…", "to": "0x…", "value": "1000",
//!       "validAfter": "1700000000", "validBefore": "1700000360",
//!       "nonce": "0x…"
//!     }
//!   }
//! }
//! ```

pub mod client;
pub use client::*;

pub mod types;
pub use types::*;
