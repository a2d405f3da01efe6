//! OpenGL bindings generated at build time (`gl_generator`, struct style).
//!
//! The `Gl` struct is a per-context function-pointer table loaded through the
//! context's `get_proc_address`; all GL calls go through a loaded table, never
//! through global linkage.

#![allow(clippy::all)]
#![allow(bad_style)]
#![allow(unused)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
