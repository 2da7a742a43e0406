// Saved jobs: bookmark, list, remove. Parameter-less list responses live
// under the logical `user:{id}:saved-jobs` cache key.

pub mod handlers;
