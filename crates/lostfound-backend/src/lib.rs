//! Backend service implementations for the lost-and-found client.
//!
//! - [`SupabaseBackend`] talks to a Supabase project over HTTP (GoTrue auth,
//!   PostgREST tables, Storage buckets).
//! - [`MemoryBackend`] keeps everything in process; used by tests and for
//!   offline demos.

mod memory;
mod supabase;

pub use memory::MemoryBackend;
pub use supabase::{SupabaseBackend, SupabaseConfig};

#[cfg(test)]
mod tests;
