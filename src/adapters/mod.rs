//! Adapters: concrete implementations of the port and transport traits.
//!
//! | Adapter        | Implements  | Connects to                     |
//! |----------------|-------------|---------------------------------|
//! | `log_sink`     | EventSink   | `log` facade                    |
//! | `framed_link`  | Link        | any byte `Transport`            |
//! | `io_transport` | Transport   | `std::io::Write` (stdout, pipe) |

pub mod framed_link;
pub mod io_transport;
pub mod log_sink;
