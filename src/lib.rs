//! # chat-engine - Chat Queue & Agent Allocation
//!
//! This crate admits incoming chat requests into a bounded queue, assigns
//! them to human agents drawn from shift-scheduled teams, and evicts
//! sessions whose clients stop sending liveness signals. All state is
//! in-memory and process-scoped; a single process owns the queue and team
//! state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Transport layer (external)                  │
//! │        admit(user)  /  record_poll(id)  /  list chats       │
//! └───────────────────────────┬─────────────────────────────────┘
//!                             │
//! ┌───────────────────────────▼─────────────────────────────────┐
//! │                        ChatEngine                           │
//! │  ┌──────────────┐  ┌───────────────┐  ┌──────────────────┐  │
//! │  │ TeamDirectory│  │   Capacity    │  │    ChatQueue     │  │
//! │  │ shift resolve│─▶│  calculator   │─▶│  FIFO + roster   │  │
//! │  └──────────────┘  └───────────────┘  └──────────────────┘  │
//! └───────────┬─────────────────────────────────────┬───────────┘
//!             │                                     │
//!   ┌─────────▼─────────┐                 ┌─────────▼─────────┐
//!   │  Allocator loop   │                 │ Liveness monitor  │
//!   │ dequeue → bind    │                 │ sweep → evict     │
//!   │ agent (1s tick)   │                 │ + release (1s)    │
//!   └───────────────────┘                 └───────────────────┘
//! ```
//!
//! The two background loops and the admission entry point run in parallel
//! against shared state: the FIFO is internally synchronized, per-session
//! updates are serialized by the roster's entry locks, and agent load is an
//! atomic counter. See the module docs for the exact guarantees.
//!
//! ## Quick Start
//!
//! ```rust
//! use chat_engine::prelude::*;
//! use chrono::NaiveTime;
//!
//! let engine = ChatEngine::new(EngineConfig::default()).unwrap();
//!
//! let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
//! match engine.admit_at("customer-42", noon) {
//!     AdmissionDecision::Admitted(id) => {
//!         // the client polls to stay alive
//!         engine.record_poll(&id);
//!     }
//!     AdmissionDecision::Rejected => {
//!         // queue at capacity, no overflow applicable
//!     }
//! }
//! ```
//!
//! ## Running the Full Server
//!
//! ```rust,no_run
//! use chat_engine::prelude::*;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mut server = ChatCenterServerBuilder::new()
//!     .with_config(EngineConfig::default())
//!     .build()?;
//!
//! server.start().await?;   // spawns allocator + liveness monitor
//! // ... serve traffic through server.engine() ...
//! server.stop().await?;    // cooperative shutdown
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod allocator;
pub mod capacity;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod queue;
pub mod server;
pub mod shift;
pub mod team;

// Export the main engine and server types
pub use engine::{ChatEngine, EngineStats};
pub use server::{ChatCenterServer, ChatCenterServerBuilder};

// Export core domain types
pub use agent::{Agent, AgentId, AgentLevel};
pub use config::EngineConfig;
pub use error::{ChatEngineError, Result};
pub use queue::{AdmissionDecision, ChatSession, SessionId};
pub use shift::{Shift, ShiftType};
pub use team::{Team, TeamDirectory};

/// Commonly used types in one import
pub mod prelude {
    pub use crate::agent::{Agent, AgentId, AgentLevel};
    pub use crate::allocator::AllocatorLoop;
    pub use crate::config::{EngineConfig, GeneralConfig, TeamConfig, TeamsConfig};
    pub use crate::engine::{ChatEngine, EngineStats};
    pub use crate::error::{ChatEngineError, Result};
    pub use crate::monitor::LivenessMonitor;
    pub use crate::queue::{AdmissionDecision, ChatQueue, ChatSession, QueueStats, SessionId};
    pub use crate::server::{ChatCenterServer, ChatCenterServerBuilder};
    pub use crate::shift::{Shift, ShiftType};
    pub use crate::team::{Team, TeamDirectory};
}
