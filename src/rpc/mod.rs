//! Transaction-correlated RPC layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        RPC Stack                             │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────────────────────┐  │
//! │  │ Gateway  │──▶│ Registry │   │ Link (trait)             │  │
//! │  │ send     │   │ tid → cb │   │  └ FramedLink<Transport> │  │
//! │  │ on_recv  │◀──│          │   │      └ codec (framing)   │  │
//! │  └──────────┘   └──────────┘   └──────────────────────────┘  │
//! │       ▲                                    │                 │
//! │       │   ┌──────────────┐   ┌─────────────┘                 │
//! │       └───│ InboundQueue │◀──│ reader thread (io_task)       │
//! │           └──────────────┘   └───────────────                │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod dict;
pub mod gateway;
pub mod io_task;
pub mod protocol;
pub mod registry;
pub mod transport;
