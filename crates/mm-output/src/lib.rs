//! `mm-output` — the line-oriented file formats of the toolkit.
//!
//! Both formats interleave `#`-led group-header rows with data rows, so
//! one file holds many trajectories or paths:
//!
//! ```text
//! #,taxi9_20080202120000_20080202120020,taxi9,2008/02/02 12:00:00,2008/02/02 12:00:20,0.222 km
//! 2008/02/02 12:00:00,0.00005,0,1,0,0,5.56,0
//! ...
//! ```
//!
//! Floats are written in Rust's shortest round-trip form, so candidate
//! errors and offsets survive a store/parse cycle bit-exactly.
//!
//! | Module        | Contents                                                |
//! |---------------|---------------------------------------------------------|
//! | [`traj_file`] | Raw and matched trajectory files                        |
//! | [`path_file`] | Timed-path files                                        |
//! | [`error`]     | `OutputError`, `OutputResult<T>`                        |

pub mod error;
pub mod path_file;
pub mod traj_file;


pub use error::{OutputError, OutputResult};
pub use path_file::{parse_paths, parse_paths_from_path, store_paths, store_paths_to_path};
pub use traj_file::{
    TrajFormat, parse_trajs, parse_trajs_from_path, store_trajs, store_trajs_to_path,
};
