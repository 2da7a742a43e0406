// Job applications: apply, list, status transitions, withdrawal.
// List responses for parameter-less requests live under the logical
// `user:{id}:applications` cache key.

pub mod handlers;
