//! Configuration section definitions.
//!
//! Each module corresponds to a section in `htmlcomb.toml`:
//!
//! | Module    | TOML Section | Purpose                         |
//! |-----------|--------------|---------------------------------|
//! | `serve`   | `[serve]`    | Local server (interface, port)  |
//! | `combine` | `[combine]`  | Combine defaults (title, mode)  |

mod combine;
mod serve;

pub use combine::CombineConfig;
pub use serve::ServeConfig;
