//! Transport-agnostic control protocol.
//!
//! Line-oriented text protocol for one remote peer.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Control protocol stack                   │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │ Listener │──▶│  Codec   │──▶│  Engine (dispatcher)  │   │
//! │  │ (trait)  │   │ (lines)  │   │  → ConfigStore        │   │
//! │  └──────────┘   └──────────┘   └───────────────────────┘   │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌──────────┐   ┌───────────┐                              │
//! │  │Transport │◀──│RemoteLink │   (Team:/TO: event lines)    │
//! │  │ (write)  │   │ (send)    │                              │
//! │  └──────────┘   └───────────┘                              │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod engine;
pub mod transport;
